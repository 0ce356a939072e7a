//! Cell re-evaluation and change propagation.
//!
//! Editing a cell re-evaluates it and then walks a FIFO worklist of the cells
//! that read from it. Every evaluated cell notifies its dependents unless it
//! shows the circular-reference marker. A cell evaluated again within the same
//! cascade only notifies when its display value changed, so a cascade drains
//! even through cycles of cells that failed for other reasons.

use std::collections::{HashSet, VecDeque};

use super::cycle::has_circular_reference;
use super::errors::{DomainError, DomainResult, CIRCULAR_REFERENCE_MARKER};
use super::expression::ExpressionTree;
use super::models::{CellPosition, Spreadsheet, FORMULA_MARKER};

/// Renders an evaluation result the way cells display it.
///
/// Finite numbers use the shortest representation that round-trips, so
/// `7.0` shows as `7` and `6.5` as `6.5`. Negative zero shows as `0`.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "Infinity".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if value == 0.0 {
        "0".to_string()
    } else {
        value.to_string()
    }
}

impl Spreadsheet {
    /// Sets the raw text of a cell and brings every dependent cell up to date.
    ///
    /// Evaluation failures never surface here: they become the cell's display
    /// value (one of the error markers). The only error is addressing a cell
    /// outside the grid.
    ///
    /// # Returns
    ///
    /// The positions that were evaluated, in evaluation order. The edited cell
    /// always comes first.
    ///
    /// # Examples
    ///
    /// ```
    /// use exprsheet::domain::Spreadsheet;
    ///
    /// let mut sheet = Spreadsheet::default();
    /// sheet.set_cell_text(0, 1, "10").unwrap();
    /// sheet.set_cell_text(1, 1, "=B1*2").unwrap();
    /// assert_eq!(sheet.get_cell(1, 1).unwrap().value(), "20");
    ///
    /// sheet.set_cell_text(0, 1, "5").unwrap();
    /// assert_eq!(sheet.get_cell(1, 1).unwrap().value(), "10");
    /// ```
    pub fn set_cell_text(&mut self, row: usize, col: usize, text: &str) -> DomainResult<Vec<CellPosition>> {
        let position = CellPosition::new(row, col);
        let cell = self
            .cell_mut(position)
            .ok_or_else(|| DomainError::InvalidCellReference(position.to_string()))?;
        cell.text = text.to_string();

        tracing::debug!(cell = %position, text, "cell text changed");
        Ok(self.propagate_from(position))
    }

    /// Same as [`Spreadsheet::set_cell_text`], addressing the cell by location.
    pub fn set_text_at(&mut self, location: &str, text: &str) -> DomainResult<Vec<CellPosition>> {
        let position = self.resolve(location)?;
        self.set_cell_text(position.row, position.col, text)
    }

    /// Empties a cell's text; dependents see it as `0`.
    pub fn clear_cell(&mut self, row: usize, col: usize) -> DomainResult<Vec<CellPosition>> {
        self.set_cell_text(row, col, "")
    }

    fn propagate_from(&mut self, start: CellPosition) -> Vec<CellPosition> {
        let mut evaluated = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([start]);
        let mut pending = HashSet::from([start]);

        while let Some(position) = queue.pop_front() {
            pending.remove(&position);
            let changed = self.evaluate_cell(position);
            let first_visit = seen.insert(position);
            evaluated.push(position);

            if !(changed || first_visit) || self.value_of(position) == CIRCULAR_REFERENCE_MARKER {
                continue;
            }

            for dependent in self.dependents_of(position).collect::<Vec<_>>() {
                if pending.insert(dependent) {
                    tracing::trace!(from = %position, to = %dependent, "scheduling dependent");
                    queue.push_back(dependent);
                }
            }
        }

        tracing::debug!(cell = %start, evaluated = evaluated.len(), "propagation finished");
        evaluated
    }

    fn value_of(&self, position: CellPosition) -> &str {
        self.cell(position).map(|cell| cell.value.as_str()).unwrap_or_default()
    }

    /// Re-evaluates one cell from its text. Returns whether its display value changed.
    fn evaluate_cell(&mut self, position: CellPosition) -> bool {
        self.unlink(position);

        let Some(text) = self.cell(position).map(|cell| cell.text.clone()) else {
            return false;
        };

        let value = match text.strip_prefix(FORMULA_MARKER) {
            Some(formula) => match self.evaluate_formula(position, formula) {
                Ok(value) => value,
                Err(err) => {
                    tracing::debug!(cell = %position, error = %err, "formula evaluation failed");
                    err.marker().to_string()
                }
            },
            None => text,
        };

        let Some(cell) = self.cell_mut(position) else {
            return false;
        };
        let changed = cell.value != value;
        tracing::debug!(cell = %position, value = %value, changed, "cell evaluated");
        cell.value = value;
        changed
    }

    /// Drops every outgoing edge of a cell along with its reverse entries.
    fn unlink(&mut self, position: CellPosition) {
        let Some(cell) = self.cell_mut(position) else {
            return;
        };
        let references = std::mem::take(&mut cell.references);
        for referenced in references {
            if let Some(subscribers) = self.dependents.get_mut(&referenced) {
                subscribers.remove(&position);
                if subscribers.is_empty() {
                    self.dependents.remove(&referenced);
                }
            }
        }
    }

    fn link(&mut self, from: CellPosition, to: CellPosition) {
        if let Some(cell) = self.cell_mut(from) {
            cell.references.insert(to);
        }
        self.dependents.entry(to).or_default().insert(from);
    }

    /// Parses, binds and evaluates a formula for the cell at `position`.
    ///
    /// References are linked as they resolve, so a failure part-way keeps the
    /// edges recorded before it.
    fn evaluate_formula(&mut self, position: CellPosition, formula: &str) -> DomainResult<String> {
        let mut tree = ExpressionTree::new(formula)?;

        for name in tree.variable_names() {
            let referenced = self.resolve(&name)?;
            if referenced == position {
                return Err(DomainError::SelfReference);
            }
            tree.set_variable(&name, self.numeric_value(referenced));
            self.link(position, referenced);
        }

        let result = format_number(tree.evaluate()?);

        if has_circular_reference(self, position) {
            return Err(DomainError::CircularReference);
        }
        Ok(result)
    }
}
