use std::fs::File;
use std::io::Write;

use crate::domain::Spreadsheet;

use super::persistence::PersistenceResult;

/// Writes display values as CSV.
pub struct CsvExporter;

impl CsvExporter {
    pub fn export_to_csv(spreadsheet: &Spreadsheet, filename: &str) -> PersistenceResult<String> {
        let file = File::create(filename)?;
        let rows = Self::write(spreadsheet, file)?;
        tracing::info!(file = filename, rows, "exported CSV");
        Ok(filename.to_string())
    }

    /// Writes the rectangle from `A1` to the last non-empty cell. Returns the
    /// number of rows written.
    pub fn write<W: Write>(spreadsheet: &Spreadsheet, writer: W) -> PersistenceResult<usize> {
        let (max_row, max_col) = spreadsheet
            .cells()
            .filter(|cell| !cell.value().is_empty())
            .fold(None, |extent: Option<(usize, usize)>, cell| {
                let position = cell.position();
                Some(match extent {
                    Some((row, col)) => (row.max(position.row), col.max(position.col)),
                    None => (position.row, position.col),
                })
            })
            .map_or((0, 0), |(row, col)| (row + 1, col + 1));

        let mut csv_writer = csv::WriterBuilder::new().flexible(false).from_writer(writer);
        for row in 0..max_row {
            let record: Vec<&str> = (0..max_col)
                .map(|col| spreadsheet.get_cell(row, col).map_or("", |cell| cell.value()))
                .collect();
            csv_writer.write_record(&record)?;
        }
        csv_writer.flush()?;

        Ok(max_row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn export(sheet: &Spreadsheet) -> String {
        let mut buffer = Vec::new();
        CsvExporter::write(sheet, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_export_values_not_formulas() {
        let mut sheet = Spreadsheet::default();
        sheet.set_text_at("A1", "3").unwrap();
        sheet.set_text_at("B1", "=A1*2").unwrap();
        sheet.set_text_at("A2", "hello, world").unwrap();

        assert_eq!(export(&sheet), "3,6\n\"hello, world\",\n");
    }

    #[test]
    fn test_export_empty_sheet() {
        assert_eq!(export(&Spreadsheet::default()), "");
    }

    #[test]
    fn test_export_to_file() {
        let mut sheet = Spreadsheet::default();
        sheet.set_text_at("B2", "x").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let name = CsvExporter::export_to_csv(&sheet, path.to_str().unwrap()).unwrap();

        assert_eq!(name, path.to_str().unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), ",\n,x\n");
    }
}
