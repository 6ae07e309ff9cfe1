//! Tolerant day-of-month recognition for header cells

use attendfill_core::style::is_date_format;
use attendfill_core::Period;
use attendfill_xlsx::{serial_to_date, Cell, CellValue};
use chrono::Datelike;

/// Reads a day of month (1–31) out of whatever a template put in a header cell
///
/// Accepted: integers and zero-padded integer text (`7`, `"07"`), integral
/// numbers, `D-Mon` text (`"1-Nov"`, `"01-Nov-25"`, `"1 Nov"`), native dates
/// and date-formatted serials, including formula results.
#[derive(Clone, Copy, Debug, Default)]
pub struct DayNumberParser;

impl DayNumberParser {
    pub fn parse(cell: &Cell) -> Option<u32> {
        let dated = cell
            .style
            .number_format
            .as_deref()
            .is_some_and(is_date_format);
        match &cell.value {
            CellValue::Date(date) => Some(date.day()),
            CellValue::Text(text) => Self::parse_text(text),
            value => {
                let number = value.as_number()?;
                if dated {
                    return serial_to_date(number).map(|d| d.day());
                }
                Self::from_number(number)
            }
        }
    }

    pub fn parse_text(text: &str) -> Option<u32> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if text.chars().all(|c| c.is_ascii_digit()) {
            return text.parse().ok().filter(|d| (1..=31).contains(d));
        }

        // D-Mon[-YY]
        let mut parts = text.split(|c: char| c == '-' || c == ' ' || c == '/');
        let day = parts.next()?;
        let month = parts.next()?;
        if day.is_empty() || day.len() > 2 || !day.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        if !month.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        Period::parse_month(month)?;
        day.parse().ok().filter(|d| (1..=31).contains(d))
    }

    fn from_number(number: f64) -> Option<u32> {
        if number.fract() != 0.0 || !(1.0..=31.0).contains(&number) {
            return None;
        }
        Some(number as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attendfill_core::Style;
    use chrono::NaiveDate;

    fn cell(value: CellValue) -> Cell {
        Cell::new(value, Style::default())
    }

    #[test]
    fn numbers_and_padded_text() {
        assert_eq!(DayNumberParser::parse(&cell(CellValue::Number(7.0))), Some(7));
        assert_eq!(DayNumberParser::parse(&cell(CellValue::text("07"))), Some(7));
        assert_eq!(DayNumberParser::parse(&cell(CellValue::text(" 31 "))), Some(31));
        assert_eq!(DayNumberParser::parse(&cell(CellValue::Number(7.5))), None);
        assert_eq!(DayNumberParser::parse(&cell(CellValue::Number(32.0))), None);
        assert_eq!(DayNumberParser::parse(&cell(CellValue::text("0"))), None);
    }

    #[test]
    fn day_month_text() {
        assert_eq!(DayNumberParser::parse_text("1-Nov"), Some(1));
        assert_eq!(DayNumberParser::parse_text("01-Nov-25"), Some(1));
        assert_eq!(DayNumberParser::parse_text("15 November"), Some(15));
        assert_eq!(DayNumberParser::parse_text("1-Foo"), None);
        assert_eq!(DayNumberParser::parse_text("Total"), None);
        assert_eq!(DayNumberParser::parse_text("No.of days"), None);
    }

    #[test]
    fn dates_and_date_serials() {
        let date = NaiveDate::from_ymd_opt(2025, 11, 14).unwrap();
        assert_eq!(DayNumberParser::parse(&cell(CellValue::Date(date))), Some(14));

        let serial = Cell::new(
            CellValue::Formula {
                formula: "B1+1".into(),
                cached: Some("45975".into()),
            },
            Style::default().with_number_format("d-mmm"),
        );
        assert_eq!(DayNumberParser::parse(&serial), Some(14));
    }
}
