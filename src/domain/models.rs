use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::{DomainError, DomainResult};

/// Background colour of a cell nobody has painted (opaque white, ARGB).
pub const DEFAULT_BG_COLOR: u32 = 0xFFFF_FFFF;

/// Zero-based coordinates of a cell.
///
/// Displayed and parsed as a location string: column letters followed by the
/// 1-based row number, e.g. `B12` is row 11, column 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellPosition {
    pub row: usize,
    pub col: usize,
}

impl CellPosition {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Column label for a zero-based column index (`0` is `A`, `26` is `AA`).
    pub fn column_label(col: usize) -> String {
        let mut result = String::new();
        let mut c = col;
        loop {
            result.insert(0, char::from(b'A' + (c % 26) as u8));
            if c < 26 {
                break;
            }
            c = c / 26 - 1;
        }
        result
    }

    /// Parses a location such as `A1` or `aa10`.
    ///
    /// Returns `None` unless the text is one or more ASCII letters followed by
    /// a positive row number and nothing else.
    pub fn parse(location: &str) -> Option<Self> {
        let split = location.find(|ch: char| !ch.is_ascii_alphabetic())?;
        let (letters, digits) = location.split_at(split);
        if letters.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let mut col: usize = 0;
        for ch in letters.chars() {
            let digit = (ch.to_ascii_uppercase() as usize) - ('A' as usize) + 1;
            col = col.checked_mul(26)?.checked_add(digit)?;
        }
        let row = digits.parse::<usize>().ok()?.checked_sub(1)?;

        Some(Self::new(row, col - 1))
    }
}

impl fmt::Display for CellPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::column_label(self.col), self.row + 1)
    }
}

impl FromStr for CellPosition {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| DomainError::InvalidCellReference(s.to_string()))
    }
}

/// One cell of the grid.
///
/// `text` is what the user typed, `value` is what gets displayed. The cell
/// also records which cells its current formula reads from.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    position: CellPosition,
    pub(crate) text: String,
    pub(crate) value: String,
    pub(crate) bg_color: u32,
    pub(crate) references: BTreeSet<CellPosition>,
}

impl Cell {
    pub fn new(position: CellPosition) -> Self {
        Self {
            position,
            text: String::new(),
            value: String::new(),
            bg_color: DEFAULT_BG_COLOR,
            references: BTreeSet::new(),
        }
    }

    pub fn position(&self) -> CellPosition {
        self.position
    }

    pub fn location(&self) -> String {
        self.position.to_string()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn bg_color(&self) -> u32 {
        self.bg_color
    }

    /// Cells the current formula reads from.
    pub fn dependencies(&self) -> &BTreeSet<CellPosition> {
        &self.references
    }

    /// Whether the cell is indistinguishable from a freshly created one in anything worth saving.
    pub fn is_default(&self) -> bool {
        self.text.is_empty() && self.bg_color == DEFAULT_BG_COLOR
    }
}

/// Text starting with this character is a formula.
pub const FORMULA_MARKER: char = '=';

/// Everything needed to restore one cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    pub location: String,
    pub text: String,
    pub bg_color: u32,
}

/// Serializable form of a whole sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetDocument {
    pub rows: usize,
    pub cols: usize,
    pub cells: Vec<CellRecord>,
}

/// Largest grid, in cells, a sheet may be built with from outside input.
pub const MAX_CELLS: usize = 1 << 20;

/// Grid dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetConfig {
    pub rows: usize,
    pub cols: usize,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self { rows: 50, cols: 26 }
    }
}

impl SheetConfig {
    /// Rejects empty grids and grids larger than [`MAX_CELLS`].
    pub fn validate(&self) -> DomainResult<()> {
        match self.rows.checked_mul(self.cols) {
            Some(cells) if cells > 0 && cells <= MAX_CELLS => Ok(()),
            _ => Err(DomainError::InvalidDimensions { rows: self.rows, cols: self.cols }),
        }
    }
}

/// The grid of cells and the dependency graph between them.
///
/// Cells are stored densely and addressed by [`CellPosition`]. Each cell
/// keeps its outgoing edges (the cells it reads); the sheet keeps the
/// reverse index used to find who must be re-evaluated after a change.
#[derive(Debug, Clone)]
pub struct Spreadsheet {
    rows: usize,
    cols: usize,
    pub(crate) cells: Vec<Cell>,
    pub(crate) dependents: HashMap<CellPosition, BTreeSet<CellPosition>>,
    column_widths: HashMap<usize, usize>,
    default_column_width: usize,
}

impl Default for Spreadsheet {
    fn default() -> Self {
        Self::with_config(SheetConfig::default())
    }
}

impl Spreadsheet {
    pub fn new(rows: usize, cols: usize) -> Self {
        let mut cells = Vec::with_capacity(rows.saturating_mul(cols).min(MAX_CELLS));
        for row in 0..rows {
            for col in 0..cols {
                cells.push(Cell::new(CellPosition::new(row, col)));
            }
        }

        Self {
            rows,
            cols,
            cells,
            dependents: HashMap::new(),
            column_widths: HashMap::new(),
            default_column_width: 10,
        }
    }

    pub fn with_config(config: SheetConfig) -> Self {
        Self::new(config.rows, config.cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub(crate) fn index_of(&self, position: CellPosition) -> Option<usize> {
        (position.row < self.rows && position.col < self.cols)
            .then(|| position.row * self.cols + position.col)
    }

    pub fn contains(&self, position: CellPosition) -> bool {
        self.index_of(position).is_some()
    }

    /// The cell at `(row, col)`, or `None` outside the grid.
    pub fn get_cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cell(CellPosition::new(row, col))
    }

    pub fn cell(&self, position: CellPosition) -> Option<&Cell> {
        self.index_of(position).map(|index| &self.cells[index])
    }

    pub(crate) fn cell_mut(&mut self, position: CellPosition) -> Option<&mut Cell> {
        self.index_of(position).map(move |index| &mut self.cells[index])
    }

    /// Resolves a location string such as `B12` to a position inside the grid.
    pub fn resolve(&self, location: &str) -> DomainResult<CellPosition> {
        let position: CellPosition = location.parse()?;
        if self.contains(position) {
            Ok(position)
        } else {
            Err(DomainError::InvalidCellReference(location.to_string()))
        }
    }

    /// The cell at a location string such as `B12`.
    pub fn cell_at(&self, location: &str) -> DomainResult<&Cell> {
        let position = self.resolve(location)?;
        self.cell(position)
            .ok_or_else(|| DomainError::InvalidCellReference(location.to_string()))
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Cells whose formulas currently read from `position`.
    pub fn dependents_of(&self, position: CellPosition) -> impl Iterator<Item = CellPosition> + '_ {
        self.dependents
            .get(&position)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Value of a cell as seen by a formula: its display value if numeric, else `0.0`.
    pub fn numeric_value(&self, position: CellPosition) -> f64 {
        self.cell(position)
            .and_then(|cell| cell.value.trim().parse::<f64>().ok())
            .unwrap_or(0.0)
    }

    /// Changes the background colour of a cell. Colour never affects values.
    pub fn set_cell_color(&mut self, row: usize, col: usize, color: u32) -> DomainResult<()> {
        let position = CellPosition::new(row, col);
        let cell = self
            .cell_mut(position)
            .ok_or_else(|| DomainError::InvalidCellReference(position.to_string()))?;
        cell.bg_color = color;
        Ok(())
    }

    pub fn set_color_at(&mut self, location: &str, color: u32) -> DomainResult<()> {
        let position = self.resolve(location)?;
        self.set_cell_color(position.row, position.col, color)
    }

    /// Records for every cell that has text or a non-default colour, row-major.
    pub fn to_records(&self) -> Vec<CellRecord> {
        self.cells
            .iter()
            .filter(|cell| !cell.is_default())
            .map(|cell| CellRecord {
                location: cell.location(),
                text: cell.text.clone(),
                bg_color: cell.bg_color,
            })
            .collect()
    }

    pub fn to_document(&self) -> SheetDocument {
        SheetDocument {
            rows: self.rows,
            cols: self.cols,
            cells: self.to_records(),
        }
    }

    /// Replaces the sheet contents with `records`.
    ///
    /// Every location is checked before anything changes. Then every cell is
    /// reset to empty text and the default colour, and the records are applied
    /// in order, so formulas see the values loaded before and after them.
    pub fn load_records(&mut self, records: &[CellRecord]) -> DomainResult<()> {
        let mut positions = Vec::with_capacity(records.len());
        let mut seen = HashSet::new();
        for record in records {
            let position = self.resolve(&record.location)?;
            seen.insert(position);
            positions.push(position);
        }

        for cell in &mut self.cells {
            cell.text.clear();
            cell.value.clear();
            cell.bg_color = DEFAULT_BG_COLOR;
            cell.references.clear();
        }
        self.dependents.clear();

        for (record, position) in records.iter().zip(positions) {
            self.set_cell_color(position.row, position.col, record.bg_color)?;
            self.set_cell_text(position.row, position.col, &record.text)?;
        }

        tracing::info!(cells = seen.len(), "loaded sheet records");
        Ok(())
    }

    pub fn get_column_width(&self, col: usize) -> usize {
        self.column_widths.get(&col).copied().unwrap_or(self.default_column_width)
    }

    pub fn set_column_width(&mut self, col: usize, width: usize) {
        self.column_widths.insert(col, width.clamp(3, 50));
    }

    /// Widens a column so every display value in it fits.
    pub fn auto_resize_column(&mut self, col: usize) {
        let label_width = CellPosition::column_label(col).len();
        let content_width = (0..self.rows)
            .filter_map(|row| self.get_cell(row, col))
            .map(|cell| cell.value.chars().count())
            .max()
            .unwrap_or(0);
        let needed = content_width.max(label_width);
        if needed > self.get_column_width(col) {
            self.set_column_width(col, needed);
        }
    }

    pub fn auto_resize_all_columns(&mut self) {
        for col in 0..self.cols {
            self.auto_resize_column(col);
        }
    }
}
