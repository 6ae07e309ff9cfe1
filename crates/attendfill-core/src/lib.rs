//! # attendfill-core
//!
//! Core domain model for the attendfill template fill engine.
//!
//! This crate provides:
//! - Domain types: `StatusCode`, `AttendanceRecord`, `HeaderFields`,
//!   `SummaryTotals`, `Period`
//! - Cell addressing (`CellAddress`, `CellRange`) and the `Style` value type
//! - The immutable per-call `FillConfig`
//! - Diagnostics: `Diagnostic`, `DiagnosticEmitter`, `CollectingEmitter`
//! - Caller input (`AttendanceInput`) and its normalization
//!
//! ## Example
//!
//! ```rust
//! use attendfill_core::{Period, StatusCode, SummaryTotals, AttendanceRecord};
//! use std::collections::BTreeMap;
//!
//! let period = Period::new(2025, 11).unwrap();
//! let mut records = BTreeMap::new();
//! records.insert(1, AttendanceRecord::new(period.date(1).unwrap(), Some(StatusCode::Present)));
//! records.insert(2, AttendanceRecord::new(period.date(2).unwrap(), Some(StatusCode::SundayOff)));
//!
//! let totals = SummaryTotals::compute(&period, &records);
//! assert_eq!(totals.total_present, 1);
//! assert_eq!(totals.working_days, 29);
//! ```

pub mod address;
pub mod config;
pub mod diagnostic;
pub mod input;
pub mod style;

pub use address::{column_index, column_letters, AddressParseError, CellAddress, CellRange};
pub use config::{ConfigError, FillConfig, Limits, StyleSpec};
pub use diagnostic::{CollectingEmitter, Diagnostic, DiagnosticCode, DiagnosticEmitter, Severity};
pub use input::{AttendanceInput, AttendanceRow, InputError, NormalizedInput};
pub use style::{Alignment, Border, BorderEdge, Color, Fill, Font, Style, StyleFacet};

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Fill color every Present cell renders with
pub const PRESENT_FILL: &str = "FF92D050";

/// Font color every Present cell renders with
pub const PRESENT_FONT: &str = "FF006100";

// ============================================================================
// Status Codes
// ============================================================================

/// Attendance status vocabulary
///
/// An unset day is represented as `Option::<StatusCode>::None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StatusCode {
    #[serde(rename = "P")]
    Present,
    #[serde(rename = "C")]
    CompOff,
    #[serde(rename = "L")]
    Leave,
    #[serde(rename = "H")]
    Holiday,
    #[serde(rename = "A")]
    Absent,
    #[serde(rename = "HD")]
    HalfDay,
    #[serde(rename = "ST")]
    SaturdayOff,
    #[serde(rename = "SU")]
    SundayOff,
}

impl StatusCode {
    pub const ALL: [StatusCode; 8] = [
        StatusCode::Present,
        StatusCode::CompOff,
        StatusCode::Leave,
        StatusCode::Holiday,
        StatusCode::Absent,
        StatusCode::HalfDay,
        StatusCode::SaturdayOff,
        StatusCode::SundayOff,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCode::Present => "P",
            StatusCode::CompOff => "C",
            StatusCode::Leave => "L",
            StatusCode::Holiday => "H",
            StatusCode::Absent => "A",
            StatusCode::HalfDay => "HD",
            StatusCode::SaturdayOff => "ST",
            StatusCode::SundayOff => "SU",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            StatusCode::Present => "Present",
            StatusCode::CompOff => "Comp-off",
            StatusCode::Leave => "Leave",
            StatusCode::Holiday => "Holiday",
            StatusCode::Absent => "Absent",
            StatusCode::HalfDay => "Half-day",
            StatusCode::SaturdayOff => "Saturday off",
            StatusCode::SundayOff => "Sunday off",
        }
    }

    /// Counted as a non-working day in the summary
    pub fn is_holiday(&self) -> bool {
        matches!(
            self,
            StatusCode::Holiday | StatusCode::SaturdayOff | StatusCode::SundayOff
        )
    }

    pub fn is_weekend_off(&self) -> bool {
        matches!(self, StatusCode::SaturdayOff | StatusCode::SundayOff)
    }

    /// Style used when neither the legend nor the configuration has one
    pub fn builtin_style(&self) -> StyleSpec {
        match self {
            StatusCode::Present => StyleSpec::new("92D050", "006100"),
            StatusCode::CompOff => StyleSpec::new("00B0F0", "000000"),
            StatusCode::Leave => StyleSpec::new("FFC000", "9C0006"),
            StatusCode::Holiday => StyleSpec::new("FFEB9C", "9C6500"),
            StatusCode::Absent => StyleSpec::new("FF7C80", "630006"),
            StatusCode::HalfDay => StyleSpec::new("D8E4BC", "3F3F3F"),
            StatusCode::SaturdayOff | StatusCode::SundayOff => StyleSpec::new("BFBFBF", "000000"),
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status text outside the vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown status code: {0:?}")]
pub struct UnknownStatusCode(pub String);

impl FromStr for StatusCode {
    type Err = UnknownStatusCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        StatusCode::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == code)
            .ok_or_else(|| UnknownStatusCode(s.to_string()))
    }
}

/// The canonical Present style
pub fn present_style() -> Style {
    Style::default()
        .with_fill(Fill::Solid(Color::Rgb(PRESENT_FILL.into())))
        .with_font(Font {
            bold: true,
            color: Some(Color::Rgb(PRESENT_FONT.into())),
            ..Default::default()
        })
}

// ============================================================================
// Weekend
// ============================================================================

/// Caller-supplied weekend marker
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekendFlag {
    #[serde(rename = "sat")]
    Saturday,
    #[serde(rename = "sun")]
    Sunday,
}

impl WeekendFlag {
    pub fn from_weekday(weekday: Weekday) -> Option<Self> {
        match weekday {
            Weekday::Sat => Some(WeekendFlag::Saturday),
            Weekday::Sun => Some(WeekendFlag::Sunday),
            _ => None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            WeekendFlag::Saturday => StatusCode::SaturdayOff,
            WeekendFlag::Sunday => StatusCode::SundayOff,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WeekendFlag::Saturday => "sat",
            WeekendFlag::Sunday => "sun",
        }
    }
}

impl FromStr for WeekendFlag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sat" | "saturday" => Ok(WeekendFlag::Saturday),
            "sun" | "sunday" => Ok(WeekendFlag::Sunday),
            other => Err(format!("not a weekend marker: {other:?}")),
        }
    }
}

// ============================================================================
// Period
// ============================================================================

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// One calendar month of one year
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    /// 1-12
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn days_in_month(&self) -> u32 {
        let (y, m) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(y, m, 1)
            .and_then(|next| next.pred_opt())
            .map(|last| last.day())
            .unwrap_or(31)
    }

    /// Date of a day of this month, `None` past the month end
    pub fn date(&self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[(self.month as usize).saturating_sub(1) % 12]
    }

    /// Parse a month given as a full name, a three-letter abbreviation or a number
    pub fn parse_month(text: &str) -> Option<u32> {
        let text = text.trim();
        if let Ok(n) = text.parse::<u32>() {
            return (1..=12).contains(&n).then_some(n);
        }
        let lower = text.to_ascii_lowercase();
        if lower.len() < 3 {
            return None;
        }
        MONTH_NAMES
            .iter()
            .position(|name| {
                let name = name.to_ascii_lowercase();
                name == lower || (lower.len() == 3 && name.starts_with(&lower))
            })
            .map(|i| i as u32 + 1)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.month_name(), self.year)
    }
}

// ============================================================================
// Records
// ============================================================================

/// Attendance for one calendar day
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub date: NaiveDate,
    pub status: Option<StatusCode>,
    /// Day name supplied by the caller
    pub day: Option<String>,
    pub weekend: Option<WeekendFlag>,
}

impl AttendanceRecord {
    pub fn new(date: NaiveDate, status: Option<StatusCode>) -> Self {
        Self {
            date,
            status,
            day: None,
            weekend: None,
        }
    }

    pub fn with_weekend(mut self, weekend: WeekendFlag) -> Self {
        self.weekend = Some(weekend);
        self
    }

    pub fn with_day(mut self, day: impl Into<String>) -> Self {
        self.day = Some(day.into());
        self
    }

    /// Short day name: the caller's if given, else derived from the date
    pub fn day_name(&self) -> String {
        self.day
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| self.date.format("%a").to_string())
    }

    /// Whether the day is rendered as a weekend
    pub fn is_weekend(&self) -> bool {
        self.weekend.is_some() || WeekendFlag::from_weekday(self.date.weekday()).is_some()
    }

    /// Status to render: explicit, else the weekend flag, else inferred from the weekday
    pub fn effective_status(&self) -> Option<StatusCode> {
        self.status
            .or_else(|| self.weekend.map(|w| w.status()))
            .or_else(|| WeekendFlag::from_weekday(self.date.weekday()).map(|w| w.status()))
    }
}

/// Effective status of a day that may have no record
pub fn effective_status_for(date: NaiveDate, record: Option<&AttendanceRecord>) -> Option<StatusCode> {
    match record {
        Some(record) => record.effective_status(),
        None => WeekendFlag::from_weekday(date.weekday()).map(|w| w.status()),
    }
}

/// Free-text header values supplied by the caller
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderFields {
    pub company: String,
    pub employee_name: String,
    pub employee_id: String,
    /// Full month name
    pub month: String,
    pub year: String,
}

impl HeaderFields {
    /// "November 2025"
    pub fn period_label(&self) -> String {
        format!("{} {}", self.month, self.year).trim().to_string()
    }
}

// ============================================================================
// Summary
// ============================================================================

/// Totals recomputed from the record set
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryTotals {
    pub total_present: u32,
    pub total_leave: u32,
    pub total_holiday: u32,
    pub total_comp_off: u32,
    pub total_absent: u32,
    pub total_half_day: u32,
    pub working_days: u32,
    pub days_in_month: u32,
    /// Present over working days, percent, one decimal
    pub attendance_percent: f64,
}

impl SummaryTotals {
    /// Count explicit statuses; holidays include Saturday and Sunday offs
    pub fn compute(period: &Period, records: &BTreeMap<u32, AttendanceRecord>) -> Self {
        let days = period.days_in_month();
        let mut totals = SummaryTotals {
            days_in_month: days,
            ..Default::default()
        };
        for record in records.range(1..=days).map(|(_, r)| r) {
            match record.status {
                Some(StatusCode::Present) => totals.total_present += 1,
                Some(StatusCode::Leave) => totals.total_leave += 1,
                Some(StatusCode::CompOff) => totals.total_comp_off += 1,
                Some(StatusCode::Absent) => totals.total_absent += 1,
                Some(StatusCode::HalfDay) => totals.total_half_day += 1,
                Some(code) if code.is_holiday() => totals.total_holiday += 1,
                _ => {}
            }
        }
        totals.working_days = days.saturating_sub(totals.total_holiday);
        totals.attendance_percent = if totals.working_days > 0 {
            let raw = f64::from(totals.total_present) / f64::from(totals.working_days) * 100.0;
            (raw * 10.0).round() / 10.0
        } else {
            0.0
        };
        totals
    }

    pub fn percent_text(&self) -> String {
        format!("{:.1}", self.attendance_percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn nov_2025() -> Period {
        Period::new(2025, 11).unwrap()
    }

    #[test]
    fn status_code_parse() {
        assert_eq!("p".parse::<StatusCode>(), Ok(StatusCode::Present));
        assert_eq!(" hd ".parse::<StatusCode>(), Ok(StatusCode::HalfDay));
        assert_eq!("SU".parse::<StatusCode>(), Ok(StatusCode::SundayOff));
        assert!("X".parse::<StatusCode>().is_err());
        assert!("".parse::<StatusCode>().is_err());
    }

    #[test]
    fn days_in_month_all_lengths() {
        assert_eq!(Period::new(2025, 2).unwrap().days_in_month(), 28);
        assert_eq!(Period::new(2024, 2).unwrap().days_in_month(), 29);
        assert_eq!(Period::new(2025, 11).unwrap().days_in_month(), 30);
        assert_eq!(Period::new(2025, 12).unwrap().days_in_month(), 31);
        assert!(Period::new(2025, 13).is_none());
    }

    #[test]
    fn parse_month_forms() {
        assert_eq!(Period::parse_month("November"), Some(11));
        assert_eq!(Period::parse_month("nov"), Some(11));
        assert_eq!(Period::parse_month("11"), Some(11));
        assert_eq!(Period::parse_month("Novem"), None);
        assert_eq!(Period::parse_month("13"), None);
        assert_eq!(Period::parse_month("Ma"), None);
    }

    #[test]
    fn effective_status_infers_weekends() {
        let period = nov_2025();
        // 2025-11-01 is a Saturday, 2025-11-03 a Monday
        let sat = AttendanceRecord::new(period.date(1).unwrap(), None);
        assert_eq!(sat.effective_status(), Some(StatusCode::SaturdayOff));
        let mon = AttendanceRecord::new(period.date(3).unwrap(), None);
        assert_eq!(mon.effective_status(), None);
        let flagged = mon.clone().with_weekend(WeekendFlag::Sunday);
        assert_eq!(flagged.effective_status(), Some(StatusCode::SundayOff));
        let explicit = AttendanceRecord::new(period.date(1).unwrap(), Some(StatusCode::Present));
        assert_eq!(explicit.effective_status(), Some(StatusCode::Present));
        assert_eq!(explicit.day_name(), "Sat");
    }

    #[test]
    fn totals_follow_holiday_rule() {
        let period = nov_2025();
        let mut records = BTreeMap::new();
        for day in 1..=30 {
            let status = match day {
                1 => Some(StatusCode::SaturdayOff),
                2 => Some(StatusCode::SundayOff),
                15 => Some(StatusCode::Leave),
                30 => Some(StatusCode::Holiday),
                _ => Some(StatusCode::Present),
            };
            records.insert(day, AttendanceRecord::new(period.date(day).unwrap(), status));
        }
        let totals = SummaryTotals::compute(&period, &records);
        assert_eq!(totals.total_present, 26);
        assert_eq!(totals.total_leave, 1);
        assert_eq!(totals.total_holiday, 3);
        assert_eq!(totals.working_days, 27);
        assert_eq!(totals.percent_text(), "96.3");
    }

    #[test]
    fn present_style_is_canonical_green() {
        let style = present_style();
        assert_eq!(style.fill, Fill::Solid(Color::rgb("92D050")));
        assert_eq!(style.font.color, Some(Color::rgb("006100")));
        assert!(style.font.bold);
    }
}
