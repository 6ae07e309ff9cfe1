//! Filling horizontal (days across columns) templates
//!
//! Every test fills a freshly generated template and reads the result back
//! through the document model.

use attendfill_core::input::NumberOrText;
use attendfill_core::{
    AttendanceInput, AttendanceRow, CellAddress, Color, DiagnosticCode, Fill, FillConfig, Limits,
    Period,
};
use attendfill_engine::{fill_template, FillOutput, OrientationMode};
use attendfill_templates::{BuiltinTemplate, HorizontalTemplate, LegendSwatch};
use attendfill_xlsx::{CellValue, Workbook, Worksheet};
use pretty_assertions::assert_eq;

fn input(year: i32, month: u32, rows: &[(u32, &str)]) -> AttendanceInput {
    let period = Period::new(year, month).unwrap();
    AttendanceInput {
        company: "SKP Tech".into(),
        employee_name: "Jane Doe".into(),
        employee_id: "E-042".into(),
        month: NumberOrText::Text(period.month_name().into()),
        year: NumberOrText::Number(f64::from(year)),
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

fn solid(hex: &str) -> Fill {
    Fill::Solid(Color::rgb(hex))
}

fn skp() -> Vec<u8> {
    BuiltinTemplate::SkpDefault.build().unwrap()
}

/// Day `d` sits in column `d + 1` of the SKP template
fn status_cell(day: u32) -> CellAddress {
    CellAddress::new(2, day + 1)
}

fn header_cell(day: u32) -> CellAddress {
    CellAddress::new(1, day + 1)
}

fn assert_blank(sheet: &Worksheet, addr: CellAddress) {
    assert!(sheet.value(addr).is_empty(), "{addr} should be empty");
    assert!(!sheet.style(addr).fill.is_visible(), "{addr} should have no fill");
}

// =============================================================================
// Scenario: November 2025 on the SKP template
// =============================================================================

#[test]
fn november_on_skp() {
    let input = input(2025, 11, &[(1, "P"), (2, "SU"), (15, "L"), (30, "H")]);
    let (output, workbook) = fill(&skp(), &input);
    let sheet = workbook.first_sheet();

    assert!(matches!(output.orientation, OrientationMode::Horizontal { header_row: 1, data_row: 2, .. }));
    assert_eq!(output.filename, "SKPTech_JaneDoe_November2025_Timesheet.xlsx");

    // Day 1: Present, canonical green even on a Saturday
    let day1 = sheet.style(status_cell(1));
    assert_eq!(sheet.text(status_cell(1)), "P");
    assert_eq!(day1.fill, solid("92D050"));
    assert_eq!(day1.font.color, Some(Color::rgb("006100")));
    assert!(day1.font.bold);

    // Day 2: Sunday off in the legend's weekend grey
    assert_eq!(sheet.text(status_cell(2)), "SU");
    assert_eq!(sheet.style(status_cell(2)).fill, solid("D9D9D9"));

    // Day 8: Saturday without a record is inferred
    assert_eq!(sheet.text(status_cell(8)), "ST");
    assert_eq!(sheet.style(status_cell(8)).fill, solid("D9D9D9"));

    assert_eq!(sheet.text(status_cell(15)), "L");
    assert_eq!(sheet.style(status_cell(15)).fill, solid("FFC000"));
    assert_eq!(sheet.text(status_cell(30)), "H");
    assert_eq!(sheet.style(status_cell(30)).fill, solid("BFBFBF"));

    // Day 3: a Monday with no record stays blank but keeps its border
    assert_blank(sheet, status_cell(3));
    assert!(sheet.style(status_cell(3)).border.left.is_some());

    // Header dates, weekend headers greyed
    let period = Period::new(2025, 11).unwrap();
    assert_eq!(*sheet.value(header_cell(1)), CellValue::Date(period.date(1).unwrap()));
    assert_eq!(sheet.style(header_cell(1)).fill, solid("D9D9D9"));
    assert!(!sheet.style(header_cell(3)).fill.is_visible());
    assert_eq!(sheet.style(header_cell(3)).number_format.as_deref(), Some("d-mmm-yy"));
    assert_eq!(sheet.style(header_cell(3)).alignment.text_rotation, Some(90));

    // Header fields and the day count
    assert_eq!(sheet.text(at("A1")), "Attendance Details for November - 2025");
    assert_eq!(sheet.text(at("A2")), "Jane Doe");
    assert_eq!(*sheet.value(at("AF2")), CellValue::Number(1.0));
    assert_eq!(sheet.text(at("AF1")), "No.of days");

    // Legend untouched, rules gone
    assert_eq!(sheet.text(at("AF3")), "P");
    assert_eq!(sheet.conditional_format_count(), 0);

    let codes: Vec<_> = output.diagnostics.iter().map(|d| d.code).collect();
    assert!(codes.contains(&DiagnosticCode::I003ConditionalFormattingCleared));
    assert!(!codes.contains(&DiagnosticCode::W005DayUnplaceable));
    assert!(!codes.contains(&DiagnosticCode::W001OrientationUndetected));
}

// =============================================================================
// Month lengths
// =============================================================================

fn all_present(year: i32, month: u32) -> AttendanceInput {
    let days = Period::new(year, month).unwrap().days_in_month();
    let rows: Vec<(u32, &str)> = (1..=days).map(|d| (d, "P")).collect();
    input(year, month, &rows)
}

#[test]
fn every_month_length_writes_each_day_once() {
    for (year, month) in [(2025, 2), (2024, 2), (2025, 11), (2025, 12)] {
        let period = Period::new(year, month).unwrap();
        let days = period.days_in_month();
        let (output, workbook) = fill(&skp(), &all_present(year, month));
        let sheet = workbook.first_sheet();

        for day in 1..=days {
            assert_eq!(
                *sheet.value(header_cell(day)),
                CellValue::Date(period.date(day).unwrap()),
                "{period} day {day}"
            );
            assert_eq!(sheet.text(status_cell(day)), "P", "{period} day {day}");
        }
        for day in days + 1..=30 {
            assert_blank(sheet, header_cell(day));
            assert_blank(sheet, status_cell(day));
            assert!(sheet.style(status_cell(day)).border.is_empty());
        }
        assert_eq!(output.totals.total_present, days);
    }
}

#[test]
fn thirty_first_day_moves_the_day_count() {
    let (output, workbook) = fill(&skp(), &all_present(2025, 12));
    let sheet = workbook.first_sheet();

    assert_eq!(sheet.text(status_cell(31)), "P");
    assert_eq!(sheet.style(status_cell(31)).fill, solid("92D050"));
    assert_eq!(sheet.text(at("AG1")), "No.of days");
    assert_eq!(*sheet.value(at("AG2")), CellValue::Number(31.0));

    // The legend below keeps its place
    assert_eq!(sheet.text(at("AF3")), "P");
    assert_eq!(sheet.text(at("AG3")), "Present");

    let relocated = output
        .diagnostics
        .iter()
        .find(|d| d.code == DiagnosticCode::I001SummaryRelocated)
        .unwrap();
    assert_eq!(relocated.cell, Some(at("AG1")));
}

#[test]
fn refilling_a_long_month_with_a_shorter_one() {
    let (december, _) = fill(&skp(), &all_present(2025, 12));
    let (output, workbook) = fill(&december.bytes, &input(2025, 11, &[(3, "P"), (4, "P")]));
    let sheet = workbook.first_sheet();

    let period = Period::new(2025, 11).unwrap();
    assert_eq!(*sheet.value(header_cell(30)), CellValue::Date(period.date(30).unwrap()));
    assert_eq!(sheet.text(status_cell(30)), "SU");
    assert_eq!(sheet.text(status_cell(3)), "P");

    // December's stale entries are gone
    assert_blank(sheet, status_cell(5));
    assert_blank(sheet, header_cell(31));
    assert_blank(sheet, status_cell(31));
    assert!(sheet.style(status_cell(31)).border.is_empty());

    // The relocated day count stays where December put it
    assert_eq!(sheet.text(at("AG1")), "No.of days");
    assert_eq!(*sheet.value(at("AG2")), CellValue::Number(2.0));
    assert_eq!(output.totals.total_present, 2);
    assert_eq!(sheet.text(at("AF3")), "P");
}

#[test]
fn thirty_one_column_template_needs_no_move() {
    let template = HorizontalTemplate::new().day_columns(31).build().unwrap();
    let (output, workbook) = fill(&template, &all_present(2025, 12));
    let sheet = workbook.first_sheet();

    assert_eq!(sheet.text(status_cell(31)), "P");
    assert_eq!(*sheet.value(at("AG2")), CellValue::Number(31.0));
    assert!(!output
        .diagnostics
        .iter()
        .any(|d| d.code == DiagnosticCode::I001SummaryRelocated));
}

#[test]
fn header_dates_round_trip() {
    let period = Period::new(2024, 2).unwrap();
    let (_, workbook) = fill(&skp(), &all_present(2024, 2));
    let sheet = workbook.first_sheet();
    let dates: Vec<_> = (1..=29)
        .map(|day| match sheet.value(header_cell(day)) {
            CellValue::Date(date) => *date,
            other => panic!("day {day}: {other:?}"),
        })
        .collect();
    let expected: Vec<_> = (1..=29).map(|day| period.date(day).unwrap()).collect();
    assert_eq!(dates, expected);
}

// =============================================================================
// Styles
// =============================================================================

#[test]
fn present_is_green_with_a_custom_legend() {
    let template = HorizontalTemplate::new()
        .legend(vec![
            LegendSwatch::new("P", "Present", 0xFF0000).font_color(0xFFFFFF),
            LegendSwatch::new("L", "Leave", 0x7030A0),
        ])
        .build()
        .unwrap();
    let (_, workbook) = fill(&template, &input(2025, 11, &[(3, "P"), (4, "L")]));
    let sheet = workbook.first_sheet();

    let present = sheet.style(status_cell(3));
    assert_eq!(present.fill, solid("92D050"));
    assert_eq!(present.font.color, Some(Color::rgb("006100")));
    assert_eq!(sheet.style(status_cell(4)).fill, solid("7030A0"));
}

#[test]
fn present_is_green_without_a_legend() {
    let template = HorizontalTemplate::new().no_legend().build().unwrap();
    let (output, workbook) = fill(&template, &input(2025, 11, &[(3, "P"), (4, "C"), (5, "A")]));
    let sheet = workbook.first_sheet();

    assert_eq!(sheet.style(status_cell(3)).fill, solid("92D050"));
    assert_eq!(sheet.style(status_cell(4)).fill, solid("00B0F0"));
    assert_eq!(sheet.style(status_cell(5)).fill, solid("FF7C80"));
    // Weekend falls back to the configured grey
    assert_eq!(sheet.style(status_cell(1)).fill, solid("BFBFBF"));
    assert!(output
        .diagnostics
        .iter()
        .any(|d| d.code == DiagnosticCode::W002LegendMissing));
}

#[test]
fn unknown_codes_are_left_unset() {
    let (output, workbook) = fill(&skp(), &input(2025, 11, &[(3, "X"), (4, "p")]));
    let sheet = workbook.first_sheet();

    assert_blank(sheet, status_cell(3));
    assert_eq!(sheet.text(status_cell(4)), "P");
    assert!(output
        .diagnostics
        .iter()
        .any(|d| d.code == DiagnosticCode::W006UnknownStatusCode));
}

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn filling_twice_gives_identical_workbooks() {
    let template = skp();
    let input = input(2025, 11, &[(1, "P"), (3, "L"), (4, "C")]);
    let first = fill_template(&template, &input, &FillConfig::default()).unwrap();
    let second = fill_template(&template, &input, &FillConfig::default()).unwrap();
    assert_eq!(first.bytes, second.bytes);
    assert_eq!(first.diagnostics, second.diagnostics);
}
