//! exprsheet - Terminal Spreadsheet
//!
//! A terminal grid of cells holding text or arithmetic formulas that reference
//! other cells. Edits propagate to every dependent cell immediately.

use std::io;
use std::path::PathBuf;

use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use exprsheet::application::{App, AppMode};
use exprsheet::domain::{SheetConfig, Spreadsheet};
use exprsheet::infrastructure::{logging, FileRepository};
use exprsheet::presentation::{render_ui, InputHandler};

#[derive(Parser, Debug)]
#[command(name = "exprsheet")]
#[command(version, about = "A terminal spreadsheet with live formula propagation")]
struct Cli {
    /// Sheet file to open (created on first save if it does not exist)
    file: Option<PathBuf>,

    /// Number of rows (default 50)
    #[arg(long)]
    rows: Option<usize>,

    /// Number of columns (default 26)
    #[arg(long)]
    cols: Option<usize>,

    /// Write logs to this file (filtered by RUST_LOG)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn sheet_config(&self) -> Option<SheetConfig> {
        if self.rows.is_none() && self.cols.is_none() {
            return None;
        }
        let defaults = SheetConfig::default();
        Some(SheetConfig {
            rows: self.rows.unwrap_or(defaults.rows).max(1),
            cols: self.cols.unwrap_or(defaults.cols).max(1),
        })
    }
}

/// Builds the starting state: the requested file if it exists, else an empty sheet.
///
/// An explicit `--rows`/`--cols` wins over the dimensions stored in the file.
fn initial_app(cli: &Cli) -> Result<App, Box<dyn std::error::Error>> {
    let config = cli.sheet_config();
    if let Some(config) = config {
        config.validate()?;
    }
    let Some(path) = cli.file.as_deref() else {
        return Ok(App::new(Spreadsheet::with_config(config.unwrap_or_default())));
    };
    let filename = path.to_string_lossy().into_owned();

    let spreadsheet = if !path.exists() {
        Spreadsheet::with_config(config.unwrap_or_default())
    } else if let Some(config) = config {
        let mut spreadsheet = Spreadsheet::with_config(config);
        FileRepository::load_into(&mut spreadsheet, &filename)?;
        spreadsheet
    } else {
        FileRepository::load_spreadsheet(&filename)?.0
    };

    let mut app = App::new(spreadsheet);
    app.filename = Some(filename);
    Ok(app)
}

/// Entry point for the exprsheet terminal spreadsheet.
///
/// # Errors
///
/// Returns an error if the start file cannot be loaded, if terminal setup
/// fails, or if the terminal fails during runtime.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    if let Some(log_file) = cli.log_file.as_deref() {
        logging::init_file(log_file)?;
    }

    let mut app = initial_app(&cli)?;
    tracing::info!(
        rows = app.spreadsheet.rows(),
        cols = app.spreadsheet.cols(),
        file = ?app.filename,
        "starting exprsheet"
    );

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "terminal loop failed");
        eprintln!("{err:?}");
    }

    Ok(())
}

/// Main application event loop.
///
/// Renders, then feeds each key press to the input handler until the user
/// presses 'q' in normal mode.
fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| render_ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                match key.code {
                    KeyCode::Char('q') if app.mode == AppMode::Normal => return Ok(()),
                    _ => InputHandler::handle_key_event(app, key.code, key.modifiers),
                }
            }
        }
    }
}
