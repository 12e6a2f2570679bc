mod support;

use factor_dash::api::{
    format_dataset, format_table, CellValue, DisplayLength, PREVIEW_ROWS,
};
use support::{numbered_table, pca_dataset};

#[test]
fn head_keeps_the_first_rows_of_a_long_table() {
    let table = numbered_table(20);
    let display = format_table(&table, DisplayLength::Head, false, "Individuals");

    assert_eq!(display.len(), PREVIEW_ROWS);
    assert_eq!(display.row_labels(), vec!["row1", "row2", "row3", "row4", "row5"]);
    assert_eq!(display.total_rows, 20);
    assert_eq!(display.row_header, "Individuals");
}

#[test]
fn tail_keeps_the_last_rows_in_order() {
    let table = numbered_table(20);
    let display = format_table(&table, DisplayLength::Tail, false, "Rows");

    assert_eq!(
        display.row_labels(),
        vec!["row16", "row17", "row18", "row19", "row20"]
    );
}

#[test]
fn all_keeps_every_row_and_short_tables_are_not_padded() {
    let long = format_table(&numbered_table(20), DisplayLength::All, true, "Rows");
    assert_eq!(long.len(), 20);
    assert!(long.filter);

    let short = numbered_table(3);
    assert_eq!(format_table(&short, DisplayLength::Head, false, "Rows").len(), 3);
    assert_eq!(format_table(&short, DisplayLength::Tail, false, "Rows").len(), 3);
}

#[test]
fn formatting_leaves_the_source_table_untouched() {
    let table = numbered_table(8);
    let before = table.clone();
    let _ = format_table(&table, DisplayLength::Tail, true, "Rows");
    assert_eq!(table, before);
}

#[test]
fn cells_are_rounded_and_missing_values_become_empty() {
    assert_eq!(CellValue::number(0.123_456_7), CellValue::Number(0.1235));
    assert_eq!(CellValue::number(f64::NAN), CellValue::Missing);
    assert_eq!(CellValue::number(f64::INFINITY), CellValue::Missing);
}

#[test]
fn head_display_is_unchanged_when_shown_in_full() {
    let head = format_table(&numbered_table(20), DisplayLength::Head, false, "Rows");
    let all = head.reformat(DisplayLength::All, false);
    assert_eq!(all.rows, head.rows);
    assert_eq!(all.row_labels(), vec!["row1", "row2", "row3", "row4", "row5"]);
}

#[test]
fn reformat_applies_a_new_length_policy() {
    let display = format_table(&numbered_table(12), DisplayLength::All, false, "Rows");
    let tail = display.reformat(DisplayLength::Tail, true);
    assert_eq!(tail.row_labels().first().copied(), Some("row8"));
    assert_eq!(tail.total_rows, 12);
}

#[test]
fn dataset_display_joins_both_column_kinds() {
    let data = pca_dataset();
    let display = format_dataset(
        data.quantitative.as_ref(),
        data.qualitative.as_ref(),
        DisplayLength::All,
        false,
    );

    assert_eq!(display.columns, vec!["height", "weight", "age", "sex"]);
    assert_eq!(display.len(), 5);
    assert_eq!(display.rows[1].cells[3], CellValue::Text("F".to_owned()));
    assert_eq!(display.rows[0].cells[0], CellValue::Number(180.0));
}

#[test]
fn display_length_codes_parse() {
    assert_eq!(DisplayLength::from_code("tail").expect("tail"), DisplayLength::Tail);
    assert!(DisplayLength::from_code("middle").is_err());
}
