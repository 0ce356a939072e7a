pub mod errors;
pub mod operators;
pub mod tokenizer;
pub mod postfix;
pub mod expression;
pub mod models;
pub mod recalc;
pub mod cycle;

pub use errors::*;
pub use operators::{OperatorRegistry, OperatorSpec, BUILTIN_OPERATORS};
pub use tokenizer::{tokenize, Token};
pub use postfix::to_postfix;
pub use expression::{ExpressionNode, ExpressionTree};
pub use models::*;
pub use recalc::format_number;
pub use cycle::has_circular_reference;
