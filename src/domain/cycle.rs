//! Circular reference detection over the cell dependency graph.

use std::collections::HashSet;

use super::models::{CellPosition, Spreadsheet};

/// Reports whether following outgoing references from `start` leads back to it.
///
/// Walks depth-first with an explicit stack. Cells already visited are not
/// expanded again; any cycle through them was explored on the first visit.
pub fn has_circular_reference(sheet: &Spreadsheet, start: CellPosition) -> bool {
    let mut visited = HashSet::from([start]);
    let mut stack = vec![start];

    while let Some(position) = stack.pop() {
        let Some(cell) = sheet.cell(position) else {
            continue;
        };
        for &next in cell.dependencies() {
            if next == start {
                tracing::debug!(cell = %start, via = %position, "circular reference detected");
                return true;
            }
            if visited.insert(next) {
                stack.push(next);
            }
        }
    }

    false
}
