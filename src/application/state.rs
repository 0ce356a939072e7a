//! Application state management for the terminal spreadsheet.
//!
//! This module contains the main application state and mode management
//! for the terminal user interface. Every edit goes through the
//! [`CommandHistory`] so it can be undone.

use super::history::{Command, CommandHistory};
use crate::domain::{CellPosition, Spreadsheet};
use crate::infrastructure::{PersistenceResult, DEFAULT_FILENAME};

/// Represents the current mode of the application.
///
/// The application can be in different modes that determine how user input
/// is interpreted and what UI elements are displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// Normal navigation mode - arrow keys move selection, shortcuts available
    Normal,
    /// Cell editing mode - user is typing the raw text of a cell
    Editing,
    /// Help screen is displayed
    Help,
    /// Save dialog is open
    SaveAs,
    /// Load dialog is open
    LoadFile,
    /// CSV export dialog is open
    ExportCsv,
    /// Background colour prompt is open
    PickColor,
}

/// Main application state containing the spreadsheet and UI state.
///
/// # Examples
///
/// ```
/// use exprsheet::application::App;
///
/// let app = App::default();
/// assert_eq!(app.selected_row, 0);
/// assert_eq!(app.selected_col, 0);
/// ```
#[derive(Debug)]
pub struct App {
    /// The spreadsheet being edited
    pub spreadsheet: Spreadsheet,
    /// Undo/redo stacks
    pub history: CommandHistory,
    /// Currently selected row (zero-based)
    pub selected_row: usize,
    /// Currently selected column (zero-based)
    pub selected_col: usize,
    /// Top-left row visible in the viewport
    pub scroll_row: usize,
    /// Left-most column visible in the viewport
    pub scroll_col: usize,
    /// Current application mode
    pub mode: AppMode,
    /// Input buffer for editing and colour entry
    pub input: String,
    /// Cursor position within the active input buffer
    pub cursor_position: usize,
    /// Current filename (if file has been saved/loaded)
    pub filename: Option<String>,
    /// Scroll position in help text
    pub help_scroll: usize,
    /// Temporary status message to display
    pub status_message: Option<String>,
    /// Input buffer for filename entry
    pub filename_input: String,
    pub selection_start: Option<(usize, usize)>,
    pub selection_end: Option<(usize, usize)>,
    /// Whether shift-selection is in progress
    pub selecting: bool,
    /// Viewport height in rows (for scrolling calculations)
    pub viewport_rows: usize,
    /// Viewport width in columns (for scrolling calculations)
    pub viewport_cols: usize,
}

impl Default for App {
    fn default() -> Self {
        Self::new(Spreadsheet::default())
    }
}

impl App {
    pub fn new(spreadsheet: Spreadsheet) -> Self {
        Self {
            spreadsheet,
            history: CommandHistory::new(),
            selected_row: 0,
            selected_col: 0,
            scroll_row: 0,
            scroll_col: 0,
            mode: AppMode::Normal,
            input: String::new(),
            cursor_position: 0,
            filename: None,
            help_scroll: 0,
            status_message: None,
            filename_input: String::new(),
            selection_start: None,
            selection_end: None,
            selecting: false,
            viewport_rows: 20,
            viewport_cols: 8,
        }
    }

    pub fn selected_position(&self) -> CellPosition {
        CellPosition::new(self.selected_row, self.selected_col)
    }

    /// Switches to editing mode with the raw text of the selected cell.
    pub fn start_editing(&mut self) {
        self.mode = AppMode::Editing;
        self.input = self
            .spreadsheet
            .cell(self.selected_position())
            .map(|cell| cell.text().to_string())
            .unwrap_or_default();
        self.cursor_position = self.input.len();
    }

    /// Commits the input as the cell's new text and moves down one row.
    ///
    /// Nothing is recorded when the text did not change.
    pub fn finish_editing(&mut self) {
        let position = self.selected_position();
        let unchanged = self
            .spreadsheet
            .cell(position)
            .is_some_and(|cell| cell.text() == self.input);

        if !unchanged {
            let command = Command::set_text(&self.spreadsheet, position, self.input.clone());
            self.execute(command);
        }

        if self.selected_row + 1 < self.spreadsheet.rows() {
            self.selected_row += 1;
            self.ensure_cursor_visible();
        }

        self.mode = AppMode::Normal;
        self.input.clear();
        self.cursor_position = 0;
    }

    /// Cancels editing and returns to normal mode without saving changes.
    pub fn cancel_editing(&mut self) {
        self.mode = AppMode::Normal;
        self.input.clear();
        self.cursor_position = 0;
    }

    fn execute(&mut self, command: Command) {
        if let Err(err) = self.history.execute(command, &mut self.spreadsheet) {
            self.status_message = Some(format!("Edit failed: {}", err));
        }
    }

    pub fn undo(&mut self) {
        match self.history.undo(&mut self.spreadsheet) {
            Ok(()) => self.status_message = None,
            Err(err) => self.status_message = Some(format!("Undo failed: {}", err)),
        }
    }

    pub fn redo(&mut self) {
        match self.history.redo(&mut self.spreadsheet) {
            Ok(()) => self.status_message = None,
            Err(err) => self.status_message = Some(format!("Redo failed: {}", err)),
        }
    }

    /// Cells the next bulk action applies to: the selection, or the cursor cell.
    pub fn target_positions(&self) -> Vec<CellPosition> {
        match self.get_selection_range() {
            Some(((min_row, min_col), (max_row, max_col))) => (min_row..=max_row)
                .flat_map(|row| (min_col..=max_col).map(move |col| CellPosition::new(row, col)))
                .collect(),
            None => vec![self.selected_position()],
        }
    }

    /// Empties the text of every targeted cell as one undoable step.
    pub fn clear_cells_with_undo(&mut self) {
        let commands: Vec<Command> = self
            .target_positions()
            .into_iter()
            .filter(|position| self.spreadsheet.cell(*position).is_some_and(|cell| !cell.text().is_empty()))
            .map(|position| Command::set_text(&self.spreadsheet, position, ""))
            .collect();

        if !commands.is_empty() {
            self.execute(Command::Group(commands));
        }
    }

    /// Opens the colour prompt, prefilled with the selected cell's colour.
    pub fn start_color_pick(&mut self) {
        self.mode = AppMode::PickColor;
        let color = self
            .spreadsheet
            .cell(self.selected_position())
            .map(|cell| cell.bg_color())
            .unwrap_or(crate::domain::DEFAULT_BG_COLOR);
        self.input = format!("#{:06X}", color & 0x00FF_FFFF);
        self.cursor_position = self.input.len();
        self.status_message = None;
    }

    /// Applies the entered colour to every targeted cell as one undoable step.
    pub fn finish_color_pick(&mut self) {
        match parse_color(&self.input) {
            Some(color) => {
                let commands: Vec<Command> = self
                    .target_positions()
                    .into_iter()
                    .map(|position| Command::set_color(&self.spreadsheet, position, color))
                    .collect();
                self.execute(Command::Group(commands));
            }
            None => {
                self.status_message = Some(format!("Invalid color: {} (use RRGGBB)", self.input));
            }
        }

        self.mode = AppMode::Normal;
        self.input.clear();
        self.cursor_position = 0;
    }

    pub fn cancel_color_pick(&mut self) {
        self.cancel_editing();
    }

    /// Switches to save-as mode to prompt for a filename.
    pub fn start_save_as(&mut self) {
        self.mode = AppMode::SaveAs;
        self.filename_input = self.filename.clone().unwrap_or_else(|| DEFAULT_FILENAME.to_string());
        self.cursor_position = self.filename_input.len();
        self.status_message = None;
    }

    /// Switches to load-file mode to prompt for a filename.
    pub fn start_load_file(&mut self) {
        self.mode = AppMode::LoadFile;
        self.filename_input = self.filename.clone().unwrap_or_else(|| DEFAULT_FILENAME.to_string());
        self.cursor_position = self.filename_input.len();
        self.status_message = None;
    }

    /// Cancels filename input and returns to normal mode.
    pub fn cancel_filename_input(&mut self) {
        self.mode = AppMode::Normal;
        self.filename_input.clear();
        self.cursor_position = 0;
    }

    /// Processes the result of a save operation.
    ///
    /// # Arguments
    ///
    /// * `result` - Saved filename, or the reason saving failed
    pub fn set_save_result(&mut self, result: PersistenceResult<String>) {
        match result {
            Ok(filename) => {
                self.status_message = Some(format!("Saved to {}", filename));
                self.filename = Some(filename);
            }
            Err(error) => {
                self.status_message = Some(format!("Save failed: {}", error));
            }
        }

        self.cancel_filename_input();
    }

    /// Processes the result of a load operation.
    ///
    /// A successful load replaces the sheet, resets the view and empties the
    /// undo history.
    pub fn set_load_result(&mut self, result: PersistenceResult<(Spreadsheet, String)>) {
        match result {
            Ok((spreadsheet, filename)) => {
                self.spreadsheet = spreadsheet;
                self.history.clear();
                self.clear_selection();
                self.selected_row = 0;
                self.selected_col = 0;
                self.scroll_row = 0;
                self.scroll_col = 0;
                self.status_message = Some(format!("Loaded from {}", filename));
                self.filename = Some(filename);
            }
            Err(error) => {
                self.status_message = Some(format!("Load failed: {}", error));
            }
        }

        self.cancel_filename_input();
    }

    /// The filename input, or the default name when it is empty.
    pub fn get_save_filename(&self) -> String {
        if self.filename_input.is_empty() {
            DEFAULT_FILENAME.to_string()
        } else {
            self.filename_input.clone()
        }
    }

    pub fn get_load_filename(&self) -> String {
        self.get_save_filename()
    }

    /// Switches to CSV export mode, suggesting a name next to the current file.
    pub fn start_csv_export(&mut self) {
        self.mode = AppMode::ExportCsv;
        self.filename_input = self
            .filename
            .as_ref()
            .map(|f| f.replace(".exprsheet", ".csv"))
            .unwrap_or_else(|| "spreadsheet.csv".to_string());
        self.cursor_position = self.filename_input.len();
        self.status_message = None;
    }

    pub fn get_csv_export_filename(&self) -> String {
        if self.filename_input.is_empty() {
            "spreadsheet.csv".to_string()
        } else {
            self.filename_input.clone()
        }
    }

    pub fn set_csv_export_result(&mut self, result: PersistenceResult<String>) {
        match result {
            Ok(filename) => {
                self.status_message = Some(format!("Exported to {}", filename));
            }
            Err(error) => {
                self.status_message = Some(format!("Export failed: {}", error));
            }
        }

        self.cancel_filename_input();
    }

    /// Starts selection at the current position
    pub fn start_selection(&mut self) {
        self.selection_start = Some((self.selected_row, self.selected_col));
        self.selection_end = Some((self.selected_row, self.selected_col));
        self.selecting = true;
    }

    pub fn update_selection(&mut self, row: usize, col: usize) {
        if self.selecting {
            self.selection_end = Some((row, col));
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection_start = None;
        self.selection_end = None;
        self.selecting = false;
    }

    /// Gets the normalized selection range (top-left to bottom-right)
    pub fn get_selection_range(&self) -> Option<((usize, usize), (usize, usize))> {
        let (start, end) = (self.selection_start?, self.selection_end?);
        Some((
            (start.0.min(end.0), start.1.min(end.1)),
            (start.0.max(end.0), start.1.max(end.1)),
        ))
    }

    pub fn is_cell_selected(&self, row: usize, col: usize) -> bool {
        self.get_selection_range()
            .is_some_and(|((min_row, min_col), (max_row, max_col))| {
                (min_row..=max_row).contains(&row) && (min_col..=max_col).contains(&col)
            })
    }

    /// Moves the cursor by the given offsets, clamped to the grid.
    ///
    /// With `extend` the selection grows to follow the cursor; without it
    /// any selection is dropped.
    pub fn move_cursor(&mut self, row_delta: isize, col_delta: isize, extend: bool) {
        if extend {
            if !self.selecting {
                self.start_selection();
            }
        } else {
            self.clear_selection();
        }

        let max_row = self.spreadsheet.rows().saturating_sub(1);
        let max_col = self.spreadsheet.cols().saturating_sub(1);
        self.selected_row = self.selected_row.saturating_add_signed(row_delta).min(max_row);
        self.selected_col = self.selected_col.saturating_add_signed(col_delta).min(max_col);
        self.ensure_cursor_visible();

        if extend {
            self.update_selection(self.selected_row, self.selected_col);
        }
    }

    /// Updates the viewport size for proper scrolling calculations.
    pub fn update_viewport_size(&mut self, rows: usize, cols: usize) {
        self.viewport_rows = rows.max(1);
        self.viewport_cols = cols.max(1);
    }

    /// Ensures the selected cell is visible by adjusting scroll position.
    pub fn ensure_cursor_visible(&mut self) {
        if self.selected_row < self.scroll_row {
            self.scroll_row = self.selected_row;
        } else if self.selected_row >= self.scroll_row + self.viewport_rows {
            self.scroll_row = self.selected_row + 1 - self.viewport_rows;
        }

        if self.selected_col < self.scroll_col {
            self.scroll_col = self.selected_col;
        } else if self.selected_col >= self.scroll_col + self.viewport_cols {
            self.scroll_col = self.selected_col + 1 - self.viewport_cols;
        }
    }
}

/// Parses `RRGGBB` or `#RRGGBB` into an opaque ARGB colour.
pub fn parse_color(input: &str) -> Option<u32> {
    let hex = input.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok().map(|rgb| 0xFF00_0000 | rgb)
}
