//! exprsheet - Terminal Spreadsheet Library
//!
//! Formula evaluation and dependency propagation for a grid of named cells,
//! with a terminal editor built on top.

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
pub use application::*;
