//! Undo/redo history for sheet edits.
//!
//! Every user edit is expressed as a [`Command`] that knows how to apply
//! itself to a [`Spreadsheet`] and how to revert it. [`CommandHistory`]
//! executes commands and keeps the undo and redo stacks.

use std::collections::VecDeque;

use thiserror::Error;

use crate::domain::{CellPosition, DomainError, Spreadsheet};

/// Most commands kept on the undo stack; older ones are dropped.
pub const MAX_UNDO_STACK_SIZE: usize = 100;

/// A reversible edit.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetText {
        position: CellPosition,
        old: String,
        new: String,
    },
    SetColor {
        position: CellPosition,
        old: u32,
        new: u32,
    },
    /// Several commands undone and redone as one step.
    Group(Vec<Command>),
}

impl Command {
    /// A text change capturing the cell's current text as the undo state.
    pub fn set_text(sheet: &Spreadsheet, position: CellPosition, new: impl Into<String>) -> Self {
        let old = sheet.cell(position).map(|cell| cell.text().to_string()).unwrap_or_default();
        Command::SetText { position, old, new: new.into() }
    }

    /// A colour change capturing the cell's current colour as the undo state.
    pub fn set_color(sheet: &Spreadsheet, position: CellPosition, new: u32) -> Self {
        let old = sheet
            .cell(position)
            .map(|cell| cell.bg_color())
            .unwrap_or(crate::domain::DEFAULT_BG_COLOR);
        Command::SetColor { position, old, new }
    }

    pub fn apply(&self, sheet: &mut Spreadsheet) -> Result<(), DomainError> {
        match self {
            Command::SetText { position, new, .. } => {
                sheet.set_cell_text(position.row, position.col, new)?;
            }
            Command::SetColor { position, new, .. } => {
                sheet.set_cell_color(position.row, position.col, *new)?;
            }
            Command::Group(commands) => {
                for command in commands {
                    command.apply(sheet)?;
                }
            }
        }
        Ok(())
    }

    pub fn revert(&self, sheet: &mut Spreadsheet) -> Result<(), DomainError> {
        match self {
            Command::SetText { position, old, .. } => {
                sheet.set_cell_text(position.row, position.col, old)?;
            }
            Command::SetColor { position, old, .. } => {
                sheet.set_cell_color(position.row, position.col, *old)?;
            }
            Command::Group(commands) => {
                for command in commands.iter().rev() {
                    command.revert(sheet)?;
                }
            }
        }
        Ok(())
    }

    /// Short description used in undo/redo labels.
    pub fn description(&self) -> &'static str {
        match self {
            Command::SetText { .. } => "text change",
            Command::SetColor { .. } => "color change",
            Command::Group(commands) => match commands.first() {
                Some(Command::SetColor { .. }) => "color change",
                Some(Command::SetText { .. }) => "text change",
                _ => "changes",
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,

    #[error(transparent)]
    Sheet(#[from] DomainError),
}

/// Executed commands, most recent last.
#[derive(Debug, Default)]
pub struct CommandHistory {
    undo_stack: VecDeque<Command>,
    redo_stack: Vec<Command>,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `command` and pushes it on the undo stack.
    ///
    /// Any redo history is discarded. When the command fails it is not
    /// recorded.
    pub fn execute(&mut self, command: Command, sheet: &mut Spreadsheet) -> Result<(), HistoryError> {
        command.apply(sheet)?;
        tracing::debug!(command = command.description(), "command executed");

        self.undo_stack.push_back(command);
        if self.undo_stack.len() > MAX_UNDO_STACK_SIZE {
            self.undo_stack.pop_front();
        }
        self.redo_stack.clear();
        Ok(())
    }

    pub fn undo(&mut self, sheet: &mut Spreadsheet) -> Result<(), HistoryError> {
        let command = self.undo_stack.pop_back().ok_or(HistoryError::NothingToUndo)?;
        command.revert(sheet)?;
        tracing::debug!(command = command.description(), "command undone");
        self.redo_stack.push(command);
        Ok(())
    }

    pub fn redo(&mut self, sheet: &mut Spreadsheet) -> Result<(), HistoryError> {
        let command = self.redo_stack.pop().ok_or(HistoryError::NothingToRedo)?;
        command.apply(sheet)?;
        tracing::debug!(command = command.description(), "command redone");
        self.undo_stack.push_back(command);
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_label(&self) -> String {
        match self.undo_stack.back() {
            Some(command) => format!("Undo {}", command.description()),
            None => "No undo available".to_string(),
        }
    }

    pub fn redo_label(&self) -> String {
        match self.redo_stack.last() {
            Some(command) => format!("Redo {}", command.description()),
            None => "No redo available".to_string(),
        }
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn b2() -> CellPosition {
        CellPosition::new(1, 1)
    }

    #[test]
    fn test_undo_text_change() {
        let mut sheet = Spreadsheet::default();
        let mut history = CommandHistory::new();

        let command = Command::set_text(&sheet, b2(), "10");
        history.execute(command, &mut sheet).unwrap();
        assert_eq!(sheet.cell(b2()).unwrap().text(), "10");

        history.undo(&mut sheet).unwrap();
        assert_eq!(sheet.cell(b2()).unwrap().text(), "");
    }

    #[test]
    fn test_redo_after_undo() {
        let mut sheet = Spreadsheet::default();
        let mut history = CommandHistory::new();

        history.execute(Command::set_text(&sheet, b2(), "10"), &mut sheet).unwrap();
        history.undo(&mut sheet).unwrap();
        history.redo(&mut sheet).unwrap();
        assert_eq!(sheet.cell(b2()).unwrap().text(), "10");
    }

    #[test]
    fn test_new_command_clears_redo() {
        let mut sheet = Spreadsheet::default();
        let mut history = CommandHistory::new();

        history.execute(Command::set_text(&sheet, b2(), "10"), &mut sheet).unwrap();
        history.undo(&mut sheet).unwrap();
        history.execute(Command::set_text(&sheet, b2(), "20"), &mut sheet).unwrap();

        assert_eq!(sheet.cell(b2()).unwrap().text(), "20");
        assert!(!history.can_redo());
        assert!(matches!(history.redo(&mut sheet), Err(HistoryError::NothingToRedo)));
    }

    #[test]
    fn test_undo_on_empty_stack() {
        let mut sheet = Spreadsheet::default();
        let mut history = CommandHistory::new();

        history.execute(Command::set_text(&sheet, b2(), "10"), &mut sheet).unwrap();
        history.undo(&mut sheet).unwrap();
        assert!(matches!(history.undo(&mut sheet), Err(HistoryError::NothingToUndo)));
    }

    #[test]
    fn test_undo_propagates_to_dependents() {
        let mut sheet = Spreadsheet::default();
        let mut history = CommandHistory::new();
        sheet.set_text_at("A1", "2").unwrap();
        sheet.set_text_at("A2", "=A1*10").unwrap();

        let a1 = CellPosition::new(0, 0);
        history.execute(Command::set_text(&sheet, a1, "3"), &mut sheet).unwrap();
        assert_eq!(sheet.cell_at("A2").unwrap().value(), "30");

        history.undo(&mut sheet).unwrap();
        assert_eq!(sheet.cell_at("A2").unwrap().value(), "20");
    }

    #[test]
    fn test_color_and_group_commands() {
        let mut sheet = Spreadsheet::default();
        let mut history = CommandHistory::new();

        let group = Command::Group(vec![
            Command::set_color(&sheet, CellPosition::new(0, 0), 0xFF11_2233),
            Command::set_color(&sheet, CellPosition::new(0, 1), 0xFF11_2233),
        ]);
        history.execute(group, &mut sheet).unwrap();
        assert_eq!(sheet.get_cell(0, 1).unwrap().bg_color(), 0xFF11_2233);
        assert_eq!(history.undo_label(), "Undo color change");

        history.undo(&mut sheet).unwrap();
        assert_eq!(sheet.get_cell(0, 0).unwrap().bg_color(), crate::domain::DEFAULT_BG_COLOR);
        assert_eq!(sheet.get_cell(0, 1).unwrap().bg_color(), crate::domain::DEFAULT_BG_COLOR);
        assert_eq!(history.redo_label(), "Redo color change");
    }

    #[test]
    fn test_group_reverts_in_reverse_order() {
        let mut sheet = Spreadsheet::default();
        let mut history = CommandHistory::new();
        let a1 = CellPosition::new(0, 0);

        let group = Command::Group(vec![
            Command::SetText { position: a1, old: String::new(), new: "1".to_string() },
            Command::SetText { position: a1, old: "1".to_string(), new: "2".to_string() },
        ]);
        history.execute(group, &mut sheet).unwrap();
        assert_eq!(sheet.cell(a1).unwrap().text(), "2");

        history.undo(&mut sheet).unwrap();
        assert_eq!(sheet.cell(a1).unwrap().text(), "");
    }

    #[test]
    fn test_labels() {
        let mut sheet = Spreadsheet::default();
        let mut history = CommandHistory::new();
        assert_eq!(history.undo_label(), "No undo available");
        assert_eq!(history.redo_label(), "No redo available");

        history.execute(Command::set_text(&sheet, b2(), "x"), &mut sheet).unwrap();
        assert_eq!(history.undo_label(), "Undo text change");
    }

    #[test]
    fn test_undo_stack_is_bounded() {
        let mut sheet = Spreadsheet::default();
        let mut history = CommandHistory::new();
        for i in 0..(MAX_UNDO_STACK_SIZE + 20) {
            history.execute(Command::set_text(&sheet, b2(), i.to_string()), &mut sheet).unwrap();
        }
        assert_eq!(history.undo_len(), MAX_UNDO_STACK_SIZE);
    }

    #[test]
    fn test_failed_command_is_not_recorded() {
        let mut sheet = Spreadsheet::default();
        let mut history = CommandHistory::new();
        let outside = CellPosition::new(500, 0);
        let command = Command::SetText { position: outside, old: String::new(), new: "1".to_string() };
        assert!(history.execute(command, &mut sheet).is_err());
        assert!(!history.can_undo());
    }

    #[test]
    fn test_clear() {
        let mut sheet = Spreadsheet::default();
        let mut history = CommandHistory::new();
        history.execute(Command::set_text(&sheet, b2(), "x"), &mut sheet).unwrap();
        history.undo(&mut sheet).unwrap();
        history.clear();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }
}
