use thiserror::Error;

/// Display value shown when a formula references its own cell.
pub const SELF_REFERENCE_MARKER: &str = "!(Self Reference)";
/// Display value shown on the cell that closes a reference cycle.
pub const CIRCULAR_REFERENCE_MARKER: &str = "!(Circular Reference)";
/// Display value shown for every other evaluation failure.
pub const BAD_REFERENCE_MARKER: &str = "!(Bad Reference)";

/// Which side of a parenthesis pair is missing its partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unbalanced {
    Opening,
    Closing,
}

impl std::fmt::Display for Unbalanced {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unbalanced::Opening => write!(f, "opening"),
            Unbalanced::Closing => write!(f, "closing"),
        }
    }
}

/// Failures raised while turning formula text into an expression tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("unmatched {0} parenthesis")]
    ParenthesisMismatch(Unbalanced),

    #[error("malformed expression: {0}")]
    MalformedExpression(String),

    #[error("no value bound for variable {0}")]
    UnboundVariable(String),
}

/// Failures raised while evaluating a cell against the grid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("a cell cannot reference itself")]
    SelfReference,

    #[error("circular reference detected")]
    CircularReference,

    #[error("invalid cell reference: {0}")]
    InvalidCellReference(String),

    #[error("invalid sheet dimensions {rows}x{cols}")]
    InvalidDimensions { rows: usize, cols: usize },

    #[error(transparent)]
    Formula(#[from] FormulaError),
}

impl DomainError {
    /// The display value a cell shows when its evaluation fails with this error.
    pub fn marker(&self) -> &'static str {
        match self {
            DomainError::SelfReference => SELF_REFERENCE_MARKER,
            DomainError::CircularReference => CIRCULAR_REFERENCE_MARKER,
            DomainError::InvalidCellReference(_)
            | DomainError::InvalidDimensions { .. }
            | DomainError::Formula(_) => BAD_REFERENCE_MARKER,
        }
    }
}

pub type FormulaResult<T> = Result<T, FormulaError>;
pub type DomainResult<T> = Result<T, DomainError>;
