//! Application layer managing editor state and undoable edits.
//!
//! This module coordinates between the domain layer and presentation layer.

pub mod history;
pub mod state;

pub use history::*;
pub use state::*;
