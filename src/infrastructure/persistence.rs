use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::domain::{DomainError, SheetConfig, SheetDocument, Spreadsheet};

/// Default file name offered by the save and load dialogs.
pub const DEFAULT_FILENAME: &str = "spreadsheet.exprsheet";

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("invalid file format - {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Sheet(#[from] DomainError),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Reads and writes sheets as pretty-printed JSON documents.
///
/// Only the cell records are stored; display values are recomputed on load.
pub struct FileRepository;

impl FileRepository {
    pub fn save_spreadsheet(spreadsheet: &Spreadsheet, filename: &str) -> PersistenceResult<String> {
        let document = spreadsheet.to_document();
        let json = serde_json::to_string_pretty(&document)?;
        fs::write(filename, json)?;

        tracing::info!(file = filename, cells = document.cells.len(), "saved sheet");
        Ok(filename.to_string())
    }

    /// Loads a document into a fresh sheet of the document's own dimensions.
    pub fn load_spreadsheet(filename: &str) -> PersistenceResult<(Spreadsheet, String)> {
        let document = Self::read_document(filename)?;
        let mut spreadsheet = Spreadsheet::new(document.rows, document.cols);
        Self::apply(&mut spreadsheet, &document, filename)?;
        Ok((spreadsheet, filename.to_string()))
    }

    /// Loads a document into an existing sheet, replacing its contents.
    ///
    /// The sheet keeps its dimensions; any record outside them rejects the
    /// whole load and leaves the sheet untouched.
    pub fn load_into(spreadsheet: &mut Spreadsheet, filename: &str) -> PersistenceResult<()> {
        let document = Self::read_document(filename)?;
        Self::apply(spreadsheet, &document, filename)
    }

    fn read_document(filename: &str) -> PersistenceResult<SheetDocument> {
        let content = fs::read_to_string(Path::new(filename))?;
        let document = serde_json::from_str::<SheetDocument>(&content)?;

        let config = SheetConfig { rows: document.rows, cols: document.cols };
        if let Err(err) = config.validate() {
            tracing::warn!(file = filename, error = %err, "rejected sheet document");
            return Err(err.into());
        }
        Ok(document)
    }

    fn apply(spreadsheet: &mut Spreadsheet, document: &SheetDocument, filename: &str) -> PersistenceResult<()> {
        if let Err(err) = spreadsheet.load_records(&document.cells) {
            tracing::warn!(file = filename, error = %err, "rejected sheet document");
            return Err(err.into());
        }
        tracing::info!(file = filename, "loaded sheet");
        Ok(())
    }
}
