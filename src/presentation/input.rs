use crate::application::{App, AppMode};
use crate::infrastructure::{CsvExporter, FileRepository};
use crossterm::event::{KeyCode, KeyModifiers};

pub struct InputHandler;

#[derive(Debug, Clone, Copy)]
enum FileAction {
    Save,
    Load,
    ExportCsv,
}

impl InputHandler {
    pub fn handle_key_event(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        match app.mode {
            AppMode::Normal => Self::handle_normal_mode(app, key, modifiers),
            AppMode::Editing => Self::handle_text_input(app, key),
            AppMode::PickColor => Self::handle_text_input(app, key),
            AppMode::Help => Self::handle_help_mode(app, key),
            AppMode::SaveAs => Self::handle_filename_input_mode(app, key, FileAction::Save),
            AppMode::LoadFile => Self::handle_filename_input_mode(app, key, FileAction::Load),
            AppMode::ExportCsv => Self::handle_filename_input_mode(app, key, FileAction::ExportCsv),
        }
    }

    fn handle_normal_mode(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL) {
            match key {
                KeyCode::Char('s') => app.start_save_as(),
                KeyCode::Char('o') => app.start_load_file(),
                KeyCode::Char('e') => app.start_csv_export(),
                KeyCode::Char('z') => app.undo(),
                KeyCode::Char('y') => app.redo(),
                KeyCode::Char('b') => app.start_color_pick(),
                _ => {}
            }
            return;
        }

        let extend = modifiers.contains(KeyModifiers::SHIFT);
        app.status_message = None;

        match key {
            KeyCode::Up | KeyCode::Char('k') => app.move_cursor(-1, 0, extend),
            KeyCode::Down | KeyCode::Char('j') => app.move_cursor(1, 0, extend),
            KeyCode::Left | KeyCode::Char('h') => app.move_cursor(0, -1, extend),
            KeyCode::Right | KeyCode::Char('l') => app.move_cursor(0, 1, extend),
            KeyCode::Enter | KeyCode::F(2) => app.start_editing(),
            KeyCode::Char('=') => app.spreadsheet.auto_resize_column(app.selected_col),
            KeyCode::Char('+') => app.spreadsheet.auto_resize_all_columns(),
            KeyCode::Char('-') => {
                let current_width = app.spreadsheet.get_column_width(app.selected_col);
                app.spreadsheet.set_column_width(app.selected_col, current_width.saturating_sub(1));
            }
            KeyCode::Char('_') => {
                let current_width = app.spreadsheet.get_column_width(app.selected_col);
                app.spreadsheet.set_column_width(app.selected_col, current_width + 1);
            }
            KeyCode::F(1) | KeyCode::Char('?') => {
                app.mode = AppMode::Help;
                app.help_scroll = 0;
            }
            KeyCode::Backspace | KeyCode::Delete => app.clear_cells_with_undo(),
            KeyCode::Esc => app.clear_selection(),
            // 'q' is handled by the main loop
            _ => {}
        }
    }

    /// Line editing shared by cell editing and the colour prompt.
    fn handle_text_input(app: &mut App, key: KeyCode) {
        let picking = app.mode == AppMode::PickColor;
        match key {
            KeyCode::Enter if picking => app.finish_color_pick(),
            KeyCode::Enter => app.finish_editing(),
            KeyCode::Esc if picking => app.cancel_color_pick(),
            KeyCode::Esc => app.cancel_editing(),
            other => edit_buffer(&mut app.input, &mut app.cursor_position, other),
        }
    }

    fn handle_help_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('?') | KeyCode::Char('q') => {
                app.mode = AppMode::Normal;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                app.help_scroll = app.help_scroll.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.help_scroll += 1;
            }
            KeyCode::PageUp => {
                app.help_scroll = app.help_scroll.saturating_sub(5);
            }
            KeyCode::PageDown => {
                app.help_scroll += 5;
            }
            KeyCode::Home => {
                app.help_scroll = 0;
            }
            _ => {}
        }
    }

    fn handle_filename_input_mode(app: &mut App, key: KeyCode, action: FileAction) {
        match key {
            KeyCode::Enter => match action {
                FileAction::Save => {
                    let filename = app.get_save_filename();
                    let result = FileRepository::save_spreadsheet(&app.spreadsheet, &filename);
                    app.set_save_result(result);
                }
                FileAction::Load => {
                    let filename = app.get_load_filename();
                    let result = FileRepository::load_spreadsheet(&filename);
                    app.set_load_result(result);
                }
                FileAction::ExportCsv => {
                    let filename = app.get_csv_export_filename();
                    let result = CsvExporter::export_to_csv(&app.spreadsheet, &filename);
                    app.set_csv_export_result(result);
                }
            },
            KeyCode::Esc => app.cancel_filename_input(),
            other => edit_buffer(&mut app.filename_input, &mut app.cursor_position, other),
        }
    }
}

/// Applies a cursor or character key to a single-line buffer.
///
/// `cursor` is a byte offset and always lands on a char boundary.
fn edit_buffer(buffer: &mut String, cursor: &mut usize, key: KeyCode) {
    match key {
        KeyCode::Backspace if *cursor > 0 => {
            let start = previous_boundary(buffer, *cursor);
            buffer.replace_range(start..*cursor, "");
            *cursor = start;
        }
        KeyCode::Delete if *cursor < buffer.len() => {
            let end = next_boundary(buffer, *cursor);
            buffer.replace_range(*cursor..end, "");
        }
        KeyCode::Left => *cursor = previous_boundary(buffer, *cursor),
        KeyCode::Right => *cursor = next_boundary(buffer, *cursor),
        KeyCode::Home => *cursor = 0,
        KeyCode::End => *cursor = buffer.len(),
        KeyCode::Char(c) => {
            buffer.insert(*cursor, c);
            *cursor += c.len_utf8();
        }
        _ => {}
    }
}

fn previous_boundary(buffer: &str, at: usize) -> usize {
    buffer[..at].chars().next_back().map_or(0, |c| at - c.len_utf8())
}

fn next_boundary(buffer: &str, at: usize) -> usize {
    buffer[at..].chars().next().map_or(at, |c| at + c.len_utf8())
}
