//! Infrastructure layer providing external service integrations.
//!
//! File persistence, CSV export and log output.

pub mod persistence;
pub mod csv_export;
pub mod logging;

pub use persistence::*;
pub use csv_export::*;
