use crate::application::{App, AppMode};
use crate::domain::{CellPosition, DEFAULT_BG_COLOR};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};

pub fn render_ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    render_spreadsheet(f, app, chunks[1]);
    render_status_bar(f, app, chunks[2]);

    if app.mode == AppMode::Help {
        render_help_popup(f, app.help_scroll);
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let position = app.selected_position();
    let text = app
        .spreadsheet
        .cell(position)
        .map(|cell| cell.text().to_string())
        .unwrap_or_default();
    let header = Paragraph::new(format!("exprsheet | Cell: {} | {}", position, text))
        .style(Style::default().fg(Color::Cyan));
    f.render_widget(header, area);
}

/// Terminal colour for a cell background, or `None` for the default white.
fn background(argb: u32) -> Option<Color> {
    if argb == DEFAULT_BG_COLOR {
        return None;
    }
    let [_, r, g, b] = argb.to_be_bytes();
    Some(Color::Rgb(r, g, b))
}

/// Black or white, whichever reads better on the given background.
fn foreground(bg: Color) -> Color {
    match bg {
        Color::Rgb(r, g, b) => {
            let luma = 299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b);
            if luma > 128_000 { Color::Black } else { Color::White }
        }
        _ => Color::Reset,
    }
}

fn render_spreadsheet(f: &mut Frame, app: &mut App, area: Rect) {
    // Borders and the column header row.
    let visible_rows = (area.height as usize).saturating_sub(3);

    let mut total_width = 6;
    let mut visible_cols = 0;
    let available_width = area.width as usize;

    for col in app.scroll_col..app.spreadsheet.cols() {
        let col_width = app.spreadsheet.get_column_width(col);
        if total_width + col_width + 1 > available_width {
            break;
        }
        total_width += col_width + 1;
        visible_cols += 1;
    }
    app.update_viewport_size(visible_rows, visible_cols);

    let mut headers = vec![Cell::from("")];
    for col in app.scroll_col..app.scroll_col + visible_cols {
        let header_style = if col == app.selected_col {
            Style::default().bg(Color::LightBlue).fg(Color::Black)
        } else {
            Style::default().fg(Color::Yellow)
        };
        headers.push(Cell::from(CellPosition::column_label(col)).style(header_style));
    }

    let mut rows = vec![Row::new(headers).height(1)];

    let last_row = (app.scroll_row + visible_rows).min(app.spreadsheet.rows());
    for row in app.scroll_row..last_row {
        let row_number_style = if row == app.selected_row {
            Style::default().bg(Color::LightBlue).fg(Color::Black)
        } else {
            Style::default().fg(Color::Yellow)
        };
        let mut cells = vec![Cell::from(format!("{}", row + 1)).style(row_number_style)];

        for col in app.scroll_col..app.scroll_col + visible_cols {
            let Some(cell) = app.spreadsheet.get_cell(row, col) else {
                continue;
            };
            let value = if cell.value().is_empty() { " " } else { cell.value() };

            let style = if row == app.selected_row && col == app.selected_col {
                Style::default().bg(Color::Blue).fg(Color::White)
            } else if app.is_cell_selected(row, col) {
                Style::default().bg(Color::DarkGray).fg(Color::White)
            } else if let Some(bg) = background(cell.bg_color()) {
                Style::default().bg(bg).fg(foreground(bg))
            } else {
                Style::default()
            };

            cells.push(Cell::from(value.to_string()).style(style));
        }

        rows.push(Row::new(cells).height(1));
    }

    let mut widths = vec![Constraint::Length(5)];
    for col in app.scroll_col..app.scroll_col + visible_cols {
        widths.push(Constraint::Length(app.spreadsheet.get_column_width(col) as u16));
    }
    let table = Table::new(rows, widths)
        .block(Block::default().borders(Borders::ALL).title("Spreadsheet"))
        .column_spacing(1);

    f.render_widget(table, area);
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let input_text = match app.mode {
        AppMode::Normal => {
            if let Some(ref status) = app.status_message {
                status.clone()
            } else {
                let filename = app.filename.as_deref().unwrap_or("unsaved");
                format!(
                    "File: {} | Ctrl+Z: {} | Ctrl+Y: {} | Ctrl+B: color | F1/?: help | q: quit",
                    filename,
                    app.history.undo_label(),
                    app.history.redo_label()
                )
            }
        }
        AppMode::Editing => format!("Editing: {} (Enter to save, Esc to cancel)", app.input),
        AppMode::PickColor => format!("Background color (RRGGBB): {} (Enter to apply, Esc to cancel)", app.input),
        AppMode::Help => "↑↓/jk: scroll | PgUp/PgDn: fast scroll | Home: top | Esc/q: close help".to_string(),
        AppMode::SaveAs => format!("Save as: {} (Enter to save, Esc to cancel)", app.filename_input),
        AppMode::LoadFile => format!("Load file: {} (Enter to load, Esc to cancel)", app.filename_input),
        AppMode::ExportCsv => format!("Export CSV as: {} (Enter to export, Esc to cancel)", app.filename_input),
    };

    let input = Paragraph::new(input_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(match app.mode {
            AppMode::Normal => Style::default(),
            AppMode::Editing => Style::default().fg(Color::Green),
            AppMode::PickColor => Style::default().fg(Color::LightRed),
            AppMode::Help => Style::default().fg(Color::Cyan),
            AppMode::SaveAs | AppMode::LoadFile => Style::default().fg(Color::Yellow),
            AppMode::ExportCsv => Style::default().fg(Color::Magenta),
        });
    f.render_widget(input, area);
}

fn render_help_popup(f: &mut Frame, scroll: usize) {
    let area = f.area();
    let popup_area = Rect {
        x: area.width / 10,
        y: area.height / 10,
        width: area.width * 4 / 5,
        height: area.height * 4 / 5,
    };

    f.render_widget(Clear, popup_area);

    let help_lines: Vec<&str> = HELP_TEXT.lines().collect();
    let visible_height = popup_area.height.saturating_sub(2) as usize;

    let start_line = scroll.min(help_lines.len().saturating_sub(visible_height));
    let end_line = (start_line + visible_height).min(help_lines.len());

    let visible_text = help_lines[start_line..end_line].join("\n");

    let help_widget = Paragraph::new(visible_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("exprsheet Help (Line {}/{})", start_line + 1, help_lines.len()))
                .style(Style::default().fg(Color::Cyan)),
        )
        .style(Style::default().fg(Color::White));

    f.render_widget(help_widget, popup_area);
}

const HELP_TEXT: &str = r#"EXPRSHEET FORMULA REFERENCE

=== BASIC CONCEPTS ===
• Formulas start with = (equals sign); anything else is shown as typed
• Cell references use column letters + row number (A1, B2, Z50, AA1)
• Cell references are case insensitive (a1 is A1)
• Numbers are integers or decimals (42, 3.14)
• A referenced cell that does not hold a number counts as 0

=== OPERATORS ===
+       Addition                    =5+3 → 8, =A1+B1
-       Subtraction                 =10-3 → 7, =A1-5
*       Multiplication              =4*3 → 12, =A1*B1
/       Division                    =15/3 → 5, =1/0 → Infinity
( )     Grouping                    =(2+3)/(3-1)+4 → 6.5

* and / bind tighter than + and -; equal operators group left to right.

=== ERROR VALUES ===
!(Self Reference)       The formula refers to its own cell
!(Circular Reference)   The formula closes a loop of references
!(Bad Reference)        Unknown cell, cell outside the grid, or bad syntax

=== EDITING ===
Enter/F2        Edit the selected cell (shows its formula)
Enter           Commit the edit and move down
Esc             Cancel the edit
Backspace/Del   Clear the selected cells
Shift+Arrows    Extend the selection
Ctrl+B          Set background color of the selection (RRGGBB)
Ctrl+Z          Undo
Ctrl+Y          Redo

=== FILE OPERATIONS ===
Ctrl+S          Save spreadsheet to file
Ctrl+O          Load spreadsheet from file
Ctrl+E          Export display values to a CSV file
                Files are saved as "spreadsheet.exprsheet" in JSON format
                Loading replaces the sheet and clears undo history

=== NAVIGATION SHORTCUTS ===
F1 or ?         Show this help (scroll with ↑↓, PgUp/PgDn, Home)
Arrow keys      Navigate cells (hjkl also work)
= key           Auto-resize column to fit content
+ key           Auto-resize all columns to fit content
- / _ keys      Manually shrink/grow column width
q               Quit application

=== HELP NAVIGATION ===
↑↓ or j/k       Scroll help text up/down one line
Page Up/Down    Scroll help text up/down 5 lines
Home            Jump to top of help text
Esc/F1/?/q      Close this help window"#;

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_background_colors() {
        assert_eq!(background(DEFAULT_BG_COLOR), None);
        assert_eq!(background(0xFF10_2030), Some(Color::Rgb(0x10, 0x20, 0x30)));
        assert_eq!(foreground(Color::Rgb(250, 250, 250)), Color::Black);
        assert_eq!(foreground(Color::Rgb(10, 10, 60)), Color::White);
    }

    #[test]
    fn test_render_shows_values_and_status() {
        let mut app = App::default();
        app.spreadsheet.set_text_at("A1", "=6*7").unwrap();

        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|f| render_ui(f, &mut app)).unwrap();

        let buffer = terminal.backend().buffer();
        let screen: String = buffer.content().iter().map(|cell| cell.symbol()).collect();
        assert!(screen.contains("42"));
        assert!(screen.contains("=6*7"));
        assert!(screen.contains("No undo available"));
        assert_eq!(app.viewport_rows, 13);
    }

    #[test]
    fn test_render_help_popup() {
        let mut app = App::default();
        app.mode = AppMode::Help;

        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|f| render_ui(f, &mut app)).unwrap();

        let screen: String = terminal.backend().buffer().content().iter().map(|cell| cell.symbol()).collect();
        assert!(screen.contains("EXPRSHEET FORMULA REFERENCE"));
    }
}
