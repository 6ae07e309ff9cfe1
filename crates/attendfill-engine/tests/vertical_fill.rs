//! Filling vertical (one row per day) templates

use attendfill_core::input::NumberOrText;
use attendfill_core::{
    AttendanceInput, AttendanceRow, CellAddress, Color, DiagnosticCode, Fill, FillConfig, Limits,
    Period,
};
use attendfill_engine::{fill_template, FillOutput, OrientationMode};
use attendfill_templates::VerticalTemplate;
use attendfill_xlsx::{CellValue, Workbook};
use pretty_assertions::assert_eq;

fn input(year: i32, month: u32, rows: &[(u32, &str)]) -> AttendanceInput {
    let period = Period::new(year, month).unwrap();
    AttendanceInput {
        company: "Acme Ltd".into(),
        employee_name: "Ravi Kumar".into(),
        employee_id: "A-17".into(),
        month: NumberOrText::Text(month.to_string()),
        year: NumberOrText::Text(year.to_string()),
        attendance_rows: rows
            .iter()
            .map(|(day, status)| AttendanceRow {
                date: period.date(*day).unwrap().to_string(),
                status: (*status).to_string(),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}

fn fill(template: &[u8], input: &AttendanceInput) -> (FillOutput, Workbook) {
    let output = fill_template(template, input, &FillConfig::default()).unwrap();
    let workbook = Workbook::load(&output.bytes, &Limits::default()).unwrap();
    (output, workbook)
}

fn at(a1: &str) -> CellAddress {
    a1.parse().unwrap()
}

fn has(output: &FillOutput, code: DiagnosticCode) -> bool {
    output.diagnostics.iter().any(|d| d.code == code)
}

fn message(output: &FillOutput, code: DiagnosticCode) -> &str {
    &output.diagnostics.iter().find(|d| d.code == code).unwrap().message
}

/// Header labels on row 9, `data_rows` bordered rows under them, and
/// free text at 1-based `(row, col)`
fn custom_template(header: &[&str], data_rows: u32, text: &[(u32, u16, &str)]) -> Vec<u8> {
    use rust_xlsxwriter::{Format, FormatBorder};

    let boxed = Format::new().set_border(FormatBorder::Thin);
    let mut book = rust_xlsxwriter::Workbook::new();
    let sheet = book.add_worksheet();
    for (col, label) in header.iter().enumerate() {
        sheet.write_with_format(8, col as u16, *label, &boxed).unwrap();
    }
    for row in 9..9 + data_rows {
        for col in 0..header.len() as u16 {
            sheet.write_blank(row, col, &boxed).unwrap();
        }
    }
    for (row, col, value) in text {
        sheet.write(row - 1, col - 1, *value).unwrap();
    }
    book.save_to_buffer().unwrap()
}

fn vertical(date_col: u32, day_col: u32, status_col: u32, template_rows: u32) -> OrientationMode {
    OrientationMode::Vertical {
        header_row: 9,
        data_start_row: 10,
        date_col,
        day_col,
        status_col,
        template_rows,
    }
}

// =============================================================================
// Scenario: November 2025 on the default vertical template
// =============================================================================

#[test]
fn november_on_vertical_template() {
    let template = VerticalTemplate::new().build().unwrap();
    let rows = [(3, "P"), (4, "P"), (5, "L"), (6, "P"), (7, "C")];
    let (output, workbook) = fill(&template, &input(2025, 11, &rows));
    let sheet = workbook.first_sheet();

    assert_eq!(
        output.orientation,
        OrientationMode::Vertical {
            header_row: 9,
            data_start_row: 10,
            date_col: 1,
            day_col: 2,
            status_col: 3,
            template_rows: 31,
        }
    );

    // Header fields land right of their labels
    assert_eq!(sheet.text(at("B1")), "Acme Ltd");
    assert_eq!(sheet.text(at("B2")), "Ravi Kumar");
    assert_eq!(sheet.text(at("B3")), "A-17");
    assert_eq!(sheet.text(at("B4")), "November 2025");

    // Day 1 is a Saturday: inferred ST, greyed date and day cells
    let period = Period::new(2025, 11).unwrap();
    assert_eq!(*sheet.value(at("A10")), CellValue::Date(period.date(1).unwrap()));
    assert_eq!(sheet.text(at("B10")), "Sat");
    assert_eq!(sheet.text(at("C10")), "ST");
    let grey = Fill::Solid(Color::rgb("D9D9D9"));
    assert_eq!(sheet.style(at("A10")).fill, grey);
    assert_eq!(sheet.style(at("B10")).fill, grey);

    // Day 3 onwards
    assert_eq!(sheet.text(at("B12")), "Mon");
    assert_eq!(sheet.text(at("C12")), "P");
    assert_eq!(sheet.style(at("C12")).fill, Fill::Solid(Color::rgb("92D050")));
    assert_eq!(sheet.text(at("C14")), "L");
    assert_eq!(sheet.style(at("C14")).fill, Fill::Solid(Color::rgb("FFC000")));
    assert!(!sheet.style(at("A12")).fill.is_visible());
    assert_eq!(sheet.style(at("A12")).number_format.as_deref(), Some("dd-mmm-yyyy"));

    // A weekday without a record is blank
    assert!(sheet.value(at("C19")).is_empty());
    assert!(sheet.style(at("C19")).border.bottom.is_some());

    // Day 30 is a Sunday; row 40 (day 31) is blanked
    assert_eq!(sheet.text(at("C39")), "SU");
    assert!(sheet.value(at("A40")).is_empty());
    assert!(sheet.style(at("A40")).border.is_empty());

    // Summary block
    assert_eq!(*sheet.value(at("E2")), CellValue::Number(30.0));
    assert_eq!(*sheet.value(at("E3")), CellValue::Number(3.0));
    assert_eq!(*sheet.value(at("E4")), CellValue::Number(1.0));
    assert_eq!(*sheet.value(at("E5")), CellValue::Number(1.0));
    assert_eq!(*sheet.value(at("E6")), CellValue::Number(0.0));
    assert_eq!(*sheet.value(at("E7")), CellValue::Number(30.0));
    assert_eq!(*sheet.value(at("E8")), CellValue::Number(10.0));

    // Legend and footer untouched
    assert_eq!(sheet.text(at("G2")), "P");
    assert_eq!(sheet.text(at("A42")), "Employee Signature");
    assert!(!has(&output, DiagnosticCode::W004PlaceholderUnresolved));
    assert!(!has(&output, DiagnosticCode::W010SummaryUnresolved));
}

#[test]
fn short_template_rows_get_the_first_rows_format() {
    let template = VerticalTemplate::new().data_rows(1).no_footer().build().unwrap();
    let (output, workbook) = fill(&template, &input(2025, 11, &[(3, "P")]));
    let sheet = workbook.first_sheet();

    for row in 10..=39 {
        let style = sheet.style(CellAddress::new(row, 1));
        assert!(style.border.bottom.is_some(), "row {row}");
        assert_eq!(style.number_format.as_deref(), Some("dd-mmm-yyyy"), "row {row}");
        assert!(sheet.style(CellAddress::new(row, 3)).border.left.is_some(), "row {row}");
    }
    assert_eq!(sheet.text(at("C12")), "P");
    assert!(!has(&output, DiagnosticCode::I002RowsInserted));
}

#[test]
fn cloned_rows_keep_every_bordered_column() {
    let template = custom_template(
        &["Date", "Day", "Status", "Remarks"],
        1,
        &[(12, 1, "Employee Signature")],
    );
    let (output, workbook) = fill(&template, &input(2025, 11, &[(3, "P")]));
    let sheet = workbook.first_sheet();

    assert_eq!(output.orientation, vertical(1, 2, 3, 1));
    for row in 10..=39 {
        let remarks = sheet.style(CellAddress::new(row, 4));
        assert!(remarks.border.bottom.is_some(), "D{row}");
        assert!(remarks.border.left.is_some(), "D{row}");
        assert!(sheet.value(CellAddress::new(row, 4)).is_empty(), "D{row}");
    }
    assert_eq!(sheet.text(at("C12")), "P");

    // Row 11 was already blank, so only 28 rows are needed
    assert_eq!(
        message(&output, DiagnosticCode::I002RowsInserted),
        "inserted 28 row(s) at row 12 to fit 30 days"
    );
    assert_eq!(sheet.text(at("A40")), "Employee Signature");
    assert!(sheet.style(at("D40")).border.is_empty());
}

#[test]
fn long_month_pushes_the_footer_down() {
    let template = VerticalTemplate::new().data_rows(28).build().unwrap();
    let (output, workbook) = fill(&template, &input(2025, 12, &[(31, "P")]));
    let sheet = workbook.first_sheet();

    let period = Period::new(2025, 12).unwrap();
    for day in 29..=31 {
        let row = 9 + day;
        assert_eq!(
            *sheet.value(CellAddress::new(row, 1)),
            CellValue::Date(period.date(day).unwrap())
        );
    }
    assert_eq!(sheet.text(at("C40")), "P");
    assert_eq!(sheet.text(at("A41")), "Employee Signature");
    assert_eq!(sheet.text(at("D41")), "Manager Signature");
    assert!(sheet.style(at("A38")).border.bottom.is_some());

    // The spare row under the block takes day 29
    assert_eq!(
        message(&output, DiagnosticCode::I002RowsInserted),
        "inserted 2 row(s) at row 39 to fit 31 days"
    );
}

#[test]
fn blank_rows_above_the_footer_are_used_before_inserting() {
    let template = custom_template(&["Date", "Day", "Status"], 5, &[(30, 1, "Employee Signature")]);
    let (output, workbook) = fill(&template, &input(2025, 11, &[(20, "L")]));
    let sheet = workbook.first_sheet();

    assert_eq!(output.orientation, vertical(1, 2, 3, 5));
    assert_eq!(
        message(&output, DiagnosticCode::I002RowsInserted),
        "inserted 10 row(s) at row 30 to fit 30 days"
    );
    assert_eq!(sheet.text(at("C29")), "L");
    assert_eq!(sheet.text(at("C39")), "SU");
    assert!(sheet.style(at("B22")).border.bottom.is_some());
    assert_eq!(sheet.text(at("A40")), "Employee Signature");
    assert!(sheet.value(at("A41")).is_empty());
}

#[test]
fn february_blanks_the_leftover_rows() {
    let template = VerticalTemplate::new().build().unwrap();
    let (_, workbook) = fill(&template, &input(2025, 2, &[(28, "P")]));
    let sheet = workbook.first_sheet();

    assert_eq!(sheet.text(at("C37")), "P");
    for row in 38..=40 {
        for col in 1..=3 {
            let addr = CellAddress::new(row, col);
            assert!(sheet.value(addr).is_empty(), "{addr}");
            assert!(sheet.style(addr).border.is_empty(), "{addr}");
        }
    }
}

// =============================================================================
// Header detection
// =============================================================================

#[test]
fn title_mentioning_status_and_date_is_not_the_header() {
    let template = custom_template(&["Date", "Day", "Status"], 1, &[(1, 1, "Attendance status by date")]);
    let (output, workbook) = fill(&template, &input(2025, 11, &[(3, "P")]));
    let sheet = workbook.first_sheet();

    assert_eq!(output.orientation, vertical(1, 2, 3, 1));
    assert!(!has(&output, DiagnosticCode::W001OrientationUndetected));
    let period = Period::new(2025, 11).unwrap();
    assert_eq!(*sheet.value(at("A12")), CellValue::Date(period.date(3).unwrap()));
    assert_eq!(sheet.text(at("B12")), "Mon");
    assert_eq!(sheet.text(at("C12")), "P");
    assert_eq!(sheet.text(at("A1")), "Attendance status by date");
}

#[test]
fn reordered_columns_follow_their_labels() {
    let template = custom_template(&["Status", "Weekday", "Date"], 1, &[]);
    let (output, workbook) = fill(&template, &input(2025, 11, &[(3, "P")]));
    let sheet = workbook.first_sheet();

    assert_eq!(output.orientation, vertical(3, 2, 1, 1));
    let period = Period::new(2025, 11).unwrap();
    assert_eq!(sheet.text(at("A12")), "P");
    assert_eq!(sheet.style(at("A12")).fill, Fill::Solid(Color::rgb("92D050")));
    assert_eq!(sheet.text(at("B12")), "Mon");
    assert_eq!(*sheet.value(at("C12")), CellValue::Date(period.date(3).unwrap()));
    assert_eq!(sheet.style(at("C12")).number_format.as_deref(), Some("dd-mmm-yyyy"));
}

#[test]
fn missing_day_label_takes_the_next_free_column() {
    let template = custom_template(&["Status", "Date"], 1, &[]);
    let (output, workbook) = fill(&template, &input(2025, 11, &[(3, "P")]));
    let sheet = workbook.first_sheet();

    assert_eq!(output.orientation, vertical(2, 3, 1, 1));
    let period = Period::new(2025, 11).unwrap();
    assert_eq!(sheet.text(at("A12")), "P");
    assert_eq!(*sheet.value(at("B12")), CellValue::Date(period.date(3).unwrap()));
    assert_eq!(sheet.text(at("C12")), "Mon");
}

// =============================================================================
// Fallback layout
// =============================================================================

#[test]
fn blank_sheet_uses_the_configured_layout() {
    let mut book = rust_xlsxwriter::Workbook::new();
    book.add_worksheet().write(0, 0, "Timesheet").unwrap();
    let template = book.save_to_buffer().unwrap();

    let (output, workbook) = fill(&template, &input(2025, 11, &[(3, "P")]));
    let sheet = workbook.first_sheet();

    assert!(has(&output, DiagnosticCode::W001OrientationUndetected));
    assert!(has(&output, DiagnosticCode::W002LegendMissing));
    let period = Period::new(2025, 11).unwrap();
    assert_eq!(*sheet.value(at("A12")), CellValue::Date(period.date(3).unwrap()));
    assert_eq!(sheet.text(at("B12")), "Mon");
    assert_eq!(sheet.text(at("C12")), "P");
    assert_eq!(sheet.style(at("C12")).fill, Fill::Solid(Color::rgb("92D050")));
    assert_eq!(sheet.style(at("A12")).number_format.as_deref(), Some("dd-mmm-yyyy"));

    // Fixed fallback cells for the header fields
    assert_eq!(sheet.text(at("B2")), "Acme Ltd");
    assert_eq!(sheet.text(at("B5")), "November 2025");
}
