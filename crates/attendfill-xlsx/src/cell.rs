//! Cell values

use attendfill_core::Style;
use chrono::{Duration, NaiveDate};
use std::fmt;

/// Day zero of the 1900 date system, accounting for the 1900 leap-year bug
fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default()
}

/// Serial number of a date in the 1900 date system
pub fn date_to_serial(date: NaiveDate) -> f64 {
    (date - epoch()).num_days() as f64
}

/// Date of a whole serial number; `None` for fractions and pre-1900-03-01 values
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if serial.fract() != 0.0 || !(61.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    epoch().checked_add_signed(Duration::days(serial as i64))
}

/// The content of one cell
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    /// A whole-day serial displayed with a date number format
    Date(NaiveDate),
    Bool(bool),
    /// Error literal such as `#N/A`
    Error(String),
    Formula {
        formula: String,
        /// Cached result as stored in the file
        cached: Option<String>,
    },
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(t) => t.is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Formula { cached: Some(c), .. } => c.parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(t) => f.write_str(t),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            CellValue::Error(e) => f.write_str(e),
            CellValue::Formula { cached, .. } => f.write_str(cached.as_deref().unwrap_or("")),
        }
    }
}

/// How a cell was stored in the template; reused verbatim while unchanged
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct CellOrigin {
    pub value: CellValue,
    pub type_attr: Option<String>,
    pub inner_xml: String,
    pub xf: u32,
    pub style: Style,
}

/// One cell: value plus its full style
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub style: Style,
    pub(crate) origin: Option<Box<CellOrigin>>,
}

impl Cell {
    pub fn new(value: CellValue, style: Style) -> Self {
        Self {
            value,
            style,
            origin: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Text content, if the cell holds text
    pub fn text(&self) -> Option<&str> {
        self.value.as_text()
    }

    /// Value rendered as plain text (numbers unformatted)
    pub fn display(&self) -> String {
        self.value.to_string()
    }
}
