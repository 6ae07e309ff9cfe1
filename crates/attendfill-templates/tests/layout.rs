//! The generated templates, read back through the document model

use attendfill_core::{CellAddress, Color, Fill, Limits};
use attendfill_templates::{BuiltinTemplate, HorizontalTemplate, LegendSwatch, VerticalTemplate};
use attendfill_xlsx::{CellValue, Workbook};
use pretty_assertions::assert_eq;

fn load(bytes: &[u8]) -> Workbook {
    Workbook::load(bytes, &Limits::default()).unwrap()
}

fn at(a1: &str) -> CellAddress {
    a1.parse().unwrap()
}

#[test]
fn skp_layout() {
    let workbook = load(&BuiltinTemplate::SkpDefault.build().unwrap());
    let sheet = workbook.first_sheet();

    assert_eq!(sheet.text(at("A1")), "Attendance Details for {{month}} - {{year}}");
    assert_eq!(sheet.text(at("A2")), "{{employeename}}");
    assert_eq!(*sheet.value(at("B1")), CellValue::Number(1.0));
    assert_eq!(*sheet.value(at("AE1")), CellValue::Number(30.0));
    assert_eq!(sheet.style(at("B1")).alignment.text_rotation, Some(90));
    assert!(sheet.style(at("C2")).border.left.is_some());

    assert_eq!(sheet.text(at("AF1")), "No.of days");
    assert_eq!(sheet.text(at("AF2")), "{{totalpresent}}");
    assert_eq!(sheet.text(at("AF3")), "P");
    assert_eq!(sheet.style(at("AF3")).fill, Fill::Solid(Color::rgb("92D050")));
    assert_eq!(sheet.text(at("AG5")), "Leave");
    assert_eq!(sheet.text(at("AF8")), "SU");

    assert_eq!(sheet.conditional_format_count(), 2);
}

#[test]
fn horizontal_options() {
    let bytes = HorizontalTemplate::new()
        .day_columns(31)
        .legend(vec![LegendSwatch::new("P", "Present", 0xFF0000).font_color(0xFFFFFF)])
        .without_weekend_rules()
        .build()
        .unwrap();
    let workbook = load(&bytes);
    let sheet = workbook.first_sheet();

    assert_eq!(*sheet.value(at("AF1")), CellValue::Number(31.0));
    assert_eq!(sheet.text(at("AG1")), "No.of days");
    assert_eq!(sheet.text(at("AG3")), "P");
    assert_eq!(sheet.style(at("AG3")).font.color, Some(Color::rgb("FFFFFF")));
    assert_eq!(sheet.text(at("AG4")), "");
    assert_eq!(sheet.conditional_format_count(), 0);
}

#[test]
fn vertical_layout() {
    let template = VerticalTemplate::new();
    let workbook = load(&template.build().unwrap());
    let sheet = workbook.first_sheet();

    assert_eq!(sheet.name(), "Attendance");
    assert_eq!(sheet.text(at("A1")), "Company Name");
    assert_eq!(sheet.text(at("A4")), "Month");
    assert_eq!(sheet.text(at("D3")), "Total Present");
    assert_eq!(sheet.text(at("D8")), "Attendance %");
    assert!(sheet.style(at("E3")).border.left.is_some());
    assert_eq!(sheet.text(at("G2")), "P");

    assert_eq!(sheet.text(at("A9")), "Date");
    assert_eq!(sheet.text(at("B9")), "Day");
    assert_eq!(sheet.text(at("C9")), "Status");
    for row in [10, 40] {
        let style = sheet.style(CellAddress::new(row, 1));
        assert!(style.border.bottom.is_some());
        assert_eq!(style.number_format.as_deref(), Some("dd-mmm-yyyy"));
    }
    assert!(sheet.get(CellAddress::new(41, 1)).is_none());
    assert_eq!(sheet.text(at("A42")), "Employee Signature");
}
