use exprsheet::application::{Command, CommandHistory};
use exprsheet::domain::{
    CellPosition, CellRecord, DomainError, ExpressionTree, FormulaError, Spreadsheet, Unbalanced,
    BAD_REFERENCE_MARKER, CIRCULAR_REFERENCE_MARKER, DEFAULT_BG_COLOR, SELF_REFERENCE_MARKER,
};
use exprsheet::infrastructure::{CsvExporter, FileRepository, PersistenceError};
use pretty_assertions::assert_eq;

fn value(sheet: &Spreadsheet, location: &str) -> String {
    sheet.cell_at(location).unwrap().value().to_string()
}

#[test]
fn constant_formulas_follow_precedence() {
    for (formula, expected) in [("1+2*3", 7.0), ("(1+2)*3", 9.0), ("(2+3)/(3-1)+4", 6.5), ("8-4-2", 2.0)] {
        assert_eq!(ExpressionTree::new(formula).unwrap().evaluate().unwrap(), expected, "{formula}");
    }
}

#[test]
fn free_variables_are_listed_once() {
    let tree = ExpressionTree::new("a+a*b-a").unwrap();
    assert_eq!(tree.variable_names(), vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn tree_failures_are_distinct_kinds() {
    assert_eq!(
        ExpressionTree::new("(4+3").unwrap_err(),
        FormulaError::ParenthesisMismatch(Unbalanced::Opening)
    );
    assert_eq!(
        ExpressionTree::new("4+3)").unwrap_err(),
        FormulaError::ParenthesisMismatch(Unbalanced::Closing)
    );
    for input in ["+2+2", "2+2+", "2+2++2", "2+2A+2"] {
        assert!(matches!(
            ExpressionTree::new(input),
            Err(FormulaError::MalformedExpression(_))
        ));
    }
}

#[test]
fn edits_propagate_without_touching_dependents() {
    let mut sheet = Spreadsheet::default();
    sheet.set_text_at("B1", "10").unwrap();
    sheet.set_text_at("B2", "=B1*2").unwrap();
    assert_eq!(value(&sheet, "B2"), "20");

    sheet.set_text_at("B1", "5").unwrap();
    assert_eq!(value(&sheet, "B2"), "10");
}

#[test]
fn error_markers_are_bit_exact() {
    let mut sheet = Spreadsheet::default();
    sheet.set_text_at("A1", "=A1").unwrap();
    assert_eq!(value(&sheet, "A1"), "!(Self Reference)");
    assert_eq!(SELF_REFERENCE_MARKER, "!(Self Reference)");

    sheet.set_text_at("C1", "=D1").unwrap();
    sheet.set_text_at("D1", "=C1").unwrap();
    assert_eq!(value(&sheet, "D1"), "!(Circular Reference)");
    assert_eq!(CIRCULAR_REFERENCE_MARKER, "!(Circular Reference)");

    sheet.set_text_at("E1", "=nonsense").unwrap();
    assert_eq!(value(&sheet, "E1"), "!(Bad Reference)");
    assert_eq!(BAD_REFERENCE_MARKER, "!(Bad Reference)");
}

#[test]
fn three_cell_cycle_marks_the_closing_cell() {
    let mut sheet = Spreadsheet::default();
    sheet.set_text_at("A1", "=B1*3+C1+4").unwrap();
    sheet.set_text_at("B1", "=C1+100").unwrap();
    sheet.set_text_at("C1", "=100*(3/2+A1)-B1*2").unwrap();
    assert_eq!(value(&sheet, "C1"), CIRCULAR_REFERENCE_MARKER);
}

#[test]
fn breaking_a_cycle_with_an_unchanged_value_clears_the_marker() {
    let mut sheet = Spreadsheet::default();
    sheet.set_text_at("A1", "=B1").unwrap();
    sheet.set_text_at("B1", "=A1").unwrap();
    assert_eq!(value(&sheet, "B1"), CIRCULAR_REFERENCE_MARKER);

    sheet.set_text_at("A1", "0").unwrap();
    assert_eq!(value(&sheet, "A1"), "0");
    assert_eq!(value(&sheet, "B1"), "0");
}

#[test]
fn values_match_texts_after_a_three_cell_cycle_is_broken() {
    let mut sheet = Spreadsheet::default();
    sheet.set_text_at("A1", "=B1").unwrap();
    sheet.set_text_at("B1", "=C1").unwrap();
    sheet.set_text_at("C1", "=A1").unwrap();
    assert_eq!(value(&sheet, "C1"), CIRCULAR_REFERENCE_MARKER);

    sheet.set_text_at("B1", "0").unwrap();
    for location in ["A1", "B1", "C1"] {
        assert_eq!(value(&sheet, location), "0", "{location}");
    }
}

#[test]
fn non_numeric_reference_binds_zero() {
    let mut sheet = Spreadsheet::default();
    sheet.set_text_at("A1", "text").unwrap();
    sheet.set_text_at("B1", "=A1+4").unwrap();
    assert_eq!(value(&sheet, "B1"), "4");
}

#[test]
fn edit_reports_cells_in_evaluation_order() {
    let mut sheet = Spreadsheet::default();
    sheet.set_text_at("A1", "1").unwrap();
    sheet.set_text_at("A2", "=A1+1").unwrap();
    sheet.set_text_at("A3", "=A2+1").unwrap();

    let evaluated = sheet.set_text_at("A1", "5").unwrap();
    assert_eq!(
        evaluated,
        vec![CellPosition::new(0, 0), CellPosition::new(1, 0), CellPosition::new(2, 0)]
    );
}

#[test]
fn out_of_grid_edit_is_rejected() {
    let mut sheet = Spreadsheet::new(5, 5);
    assert!(matches!(
        sheet.set_text_at("F1", "1"),
        Err(DomainError::InvalidCellReference(_))
    ));
}

#[test]
fn records_reconstruct_the_sheet() {
    let mut original = Spreadsheet::default();
    original.set_text_at("A1", "3").unwrap();
    original.set_text_at("A2", "=A1*A1").unwrap();
    original.set_color_at("B5", 0xFF80_8080).unwrap();
    let records = original.to_records();

    let mut restored = Spreadsheet::default();
    restored.set_text_at("Z50", "stale").unwrap();
    restored.load_records(&records).unwrap();

    assert_eq!(value(&restored, "A2"), "9");
    assert_eq!(value(&restored, "Z50"), "");
    assert_eq!(restored.cell_at("B5").unwrap().bg_color(), 0xFF80_8080);
    assert_eq!(restored.to_records(), records);
}

#[test]
fn record_with_bad_location_is_rejected() {
    let mut sheet = Spreadsheet::default();
    let records = vec![CellRecord {
        location: "A0".to_string(),
        text: "1".to_string(),
        bg_color: DEFAULT_BG_COLOR,
    }];
    assert!(sheet.load_records(&records).is_err());
}

#[test]
fn file_round_trip_and_csv_export() {
    let dir = tempfile::tempdir().unwrap();
    let sheet_path = dir.path().join("book.exprsheet");
    let csv_path = dir.path().join("book.csv");

    let mut sheet = Spreadsheet::default();
    let mut history = CommandHistory::new();
    let a1 = CellPosition::new(0, 0);
    let b1 = CellPosition::new(0, 1);
    history.execute(Command::set_text(&sheet, a1, "2"), &mut sheet).unwrap();
    history.execute(Command::set_text(&sheet, b1, "=A1/4"), &mut sheet).unwrap();
    history.execute(Command::set_color(&sheet, b1, 0xFF00_00FF), &mut sheet).unwrap();

    FileRepository::save_spreadsheet(&sheet, sheet_path.to_str().unwrap()).unwrap();
    let (loaded, _) = FileRepository::load_spreadsheet(sheet_path.to_str().unwrap()).unwrap();
    assert_eq!(value(&loaded, "B1"), "0.5");
    assert_eq!(loaded.cell_at("B1").unwrap().bg_color(), 0xFF00_00FF);

    CsvExporter::export_to_csv(&loaded, csv_path.to_str().unwrap()).unwrap();
    assert_eq!(std::fs::read_to_string(&csv_path).unwrap(), "2,0.5\n");
}

#[test]
fn load_into_smaller_sheet_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wide.exprsheet");

    let mut wide = Spreadsheet::default();
    wide.set_text_at("Z1", "far").unwrap();
    FileRepository::save_spreadsheet(&wide, path.to_str().unwrap()).unwrap();

    let mut narrow = Spreadsheet::new(10, 5);
    narrow.set_text_at("A1", "mine").unwrap();
    let result = FileRepository::load_into(&mut narrow, path.to_str().unwrap());
    assert!(matches!(result, Err(PersistenceError::Sheet(_))));
    assert_eq!(value(&narrow, "A1"), "mine");
}
