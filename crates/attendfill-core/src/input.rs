//! Caller input and its normalization
//!
//! [`AttendanceInput`] mirrors the JSON request body. [`AttendanceInput::normalize`]
//! validates the period, parses every row and recomputes the summary totals;
//! anything recoverable becomes a diagnostic rather than an error.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::diagnostic::{Diagnostic, DiagnosticCode};
use crate::{AttendanceRecord, HeaderFields, Period, StatusCode, SummaryTotals, WeekendFlag};

/// Fatal input problems
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Invalid month: {0:?}")]
    InvalidMonth(String),

    #[error("Invalid year: {0:?}")]
    InvalidYear(String),
}

/// A JSON value that may arrive as a number or as text
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NumberOrText::Number(n) => Some(*n),
            NumberOrText::Text(t) => t.trim().trim_end_matches('%').trim().parse().ok(),
        }
    }

    fn as_text(&self) -> String {
        match self {
            NumberOrText::Number(n) if n.fract() == 0.0 => format!("{}", *n as i64),
            NumberOrText::Number(n) => n.to_string(),
            NumberOrText::Text(t) => t.trim().to_string(),
        }
    }
}

impl Default for NumberOrText {
    fn default() -> Self {
        NumberOrText::Text(String::new())
    }
}

/// One row of the request
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRow {
    /// ISO date (`2025-11-01`)
    pub date: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub day: Option<String>,
    #[serde(default)]
    pub is_weekend: Option<String>,
}

/// Totals as computed by the caller
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryInput {
    pub total_present: Option<NumberOrText>,
    pub total_leave: Option<NumberOrText>,
    pub total_holiday: Option<NumberOrText>,
    pub attendance_percent: Option<NumberOrText>,
}

/// Request body for one fill
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceInput {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub employee_name: String,
    #[serde(default)]
    pub employee_id: String,
    #[serde(default)]
    pub month: NumberOrText,
    #[serde(default)]
    pub year: NumberOrText,
    #[serde(default)]
    pub attendance_rows: Vec<AttendanceRow>,
    #[serde(default)]
    pub summary: Option<SummaryInput>,
    #[serde(default)]
    pub template_id: Option<String>,
}

/// Validated input, ready for the fill pipeline
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedInput {
    pub header: HeaderFields,
    pub period: Period,
    /// Keyed by day of month
    pub records: BTreeMap<u32, AttendanceRecord>,
    pub totals: SummaryTotals,
    pub diagnostics: Vec<Diagnostic>,
}

impl AttendanceInput {
    pub fn period(&self) -> Result<Period, InputError> {
        let month_text = self.month.as_text();
        let month = Period::parse_month(&month_text)
            .ok_or_else(|| InputError::InvalidMonth(month_text.clone()))?;
        let year_text = self.year.as_text();
        let year: i32 = year_text
            .parse()
            .ok()
            .filter(|y| (1900..=9999).contains(y))
            .ok_or_else(|| InputError::InvalidYear(year_text.clone()))?;
        Period::new(year, month).ok_or(InputError::InvalidMonth(month_text))
    }

    pub fn normalize(&self) -> Result<NormalizedInput, InputError> {
        let period = self.period()?;
        let mut diagnostics = Vec::new();
        let mut records = BTreeMap::new();

        for (index, row) in self.attendance_rows.iter().enumerate() {
            let Some(date) = parse_iso_date(&row.date) else {
                diagnostics.push(Diagnostic::new(
                    DiagnosticCode::W007DateOutOfPeriod,
                    format!("row {}: {:?} is not an ISO date", index + 1, row.date),
                ));
                continue;
            };
            if !period.contains(date) {
                diagnostics.push(Diagnostic::new(
                    DiagnosticCode::W007DateOutOfPeriod,
                    format!("row {}: {date} is outside {period}", index + 1),
                ));
                continue;
            }
            let day = chrono::Datelike::day(&date);
            if records.contains_key(&day) {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::W008DuplicateDate,
                        format!("row {}: {date} appears more than once", index + 1),
                    )
                    .with_note("the first row for a date is used"),
                );
                continue;
            }

            let status = if row.status.trim().is_empty() {
                None
            } else {
                match row.status.parse::<StatusCode>() {
                    Ok(code) => Some(code),
                    Err(_) => {
                        diagnostics.push(
                            Diagnostic::new(
                                DiagnosticCode::W006UnknownStatusCode,
                                format!("{date}: unknown status {:?}", row.status),
                            )
                            .with_note("the day is treated as unset"),
                        );
                        None
                    }
                }
            };
            let weekend = row
                .is_weekend
                .as_deref()
                .and_then(|flag| flag.parse::<WeekendFlag>().ok());

            records.insert(
                day,
                AttendanceRecord {
                    date,
                    status,
                    day: row.day.clone().filter(|d| !d.trim().is_empty()),
                    weekend,
                },
            );
        }

        let totals = SummaryTotals::compute(&period, &records);
        if let Some(summary) = &self.summary {
            check_summary(summary, &totals, &mut diagnostics);
        }

        let header = HeaderFields {
            company: self.company.trim().to_string(),
            employee_name: self.employee_name.trim().to_string(),
            employee_id: self.employee_id.trim().to_string(),
            month: period.month_name().to_string(),
            year: period.year.to_string(),
        };

        Ok(NormalizedInput {
            header,
            period,
            records,
            totals,
            diagnostics,
        })
    }
}

fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    // Accept full timestamps ("2025-11-01T00:00:00Z") by their date part
    let date_part = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

fn check_summary(summary: &SummaryInput, totals: &SummaryTotals, out: &mut Vec<Diagnostic>) {
    let checks = [
        ("totalPresent", &summary.total_present, f64::from(totals.total_present)),
        ("totalLeave", &summary.total_leave, f64::from(totals.total_leave)),
        ("totalHoliday", &summary.total_holiday, f64::from(totals.total_holiday)),
        ("attendancePercent", &summary.attendance_percent, totals.attendance_percent),
    ];
    for (name, supplied, computed) in checks {
        let Some(value) = supplied.as_ref().and_then(NumberOrText::as_f64) else {
            continue;
        };
        if (value - computed).abs() > 0.05 {
            out.push(
                Diagnostic::new(
                    DiagnosticCode::W009SummaryMismatch,
                    format!("{name} was {value} but the records give {computed}"),
                )
                .with_note("recomputed totals are written"),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn input(month: NumberOrText, year: NumberOrText) -> AttendanceInput {
        AttendanceInput {
            company: " Acme ".into(),
            employee_name: "Jane Doe".into(),
            month,
            year,
            ..Default::default()
        }
    }

    #[test]
    fn period_accepts_names_and_numbers() {
        let a = input(NumberOrText::Text("Nov".into()), NumberOrText::Number(2025.0));
        assert_eq!(a.period(), Ok(Period::new(2025, 11).unwrap()));
        let b = input(NumberOrText::Number(2.0), NumberOrText::Text("2024".into()));
        assert_eq!(b.period().unwrap().days_in_month(), 29);
    }

    #[test]
    fn invalid_period_is_fatal() {
        let bad_month = input(NumberOrText::Text("Smarch".into()), NumberOrText::Number(2025.0));
        assert_eq!(
            bad_month.normalize().unwrap_err(),
            InputError::InvalidMonth("Smarch".into())
        );
        let bad_year = input(NumberOrText::Text("May".into()), NumberOrText::Text("soon".into()));
        assert!(matches!(bad_year.normalize(), Err(InputError::InvalidYear(_))));
    }

    #[test]
    fn rows_become_records_with_diagnostics() {
        let mut a = input(NumberOrText::Text("November".into()), NumberOrText::Number(2025.0));
        a.attendance_rows = vec![
            AttendanceRow {
                date: "2025-11-01".into(),
                status: "p".into(),
                ..Default::default()
            },
            AttendanceRow {
                date: "2025-11-01".into(),
                status: "L".into(),
                ..Default::default()
            },
            AttendanceRow {
                date: "2025-11-02".into(),
                status: "ZZ".into(),
                is_weekend: Some("sun".into()),
                ..Default::default()
            },
            AttendanceRow {
                date: "2025-12-01".into(),
                status: "P".into(),
                ..Default::default()
            },
        ];

        let n = a.normalize().unwrap();
        assert_eq!(n.header.company, "Acme");
        assert_eq!(n.header.month, "November");
        assert_eq!(n.records.len(), 2);
        assert_eq!(n.records[&1].status, Some(StatusCode::Present));
        assert_eq!(n.records[&2].status, None);
        assert_eq!(n.records[&2].weekend, Some(WeekendFlag::Sunday));

        let codes: Vec<_> = n.diagnostics.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(codes, vec!["W008", "W006", "W007"]);
    }

    #[test]
    fn deserializes_camel_case_json_shape() {
        let a: AttendanceInput = serde_json::from_str(
            r#"{
                "company": "Acme",
                "employeeName": "Jane",
                "employeeId": "E-7",
                "month": "November",
                "year": 2025,
                "attendanceRows": [{"date": "2025-11-03", "status": "P", "isWeekend": null}],
                "summary": {"totalPresent": 5, "attendancePercent": "50.0"},
                "templateId": "skp-default"
            }"#,
        )
        .unwrap();
        let n = a.normalize().unwrap();
        assert_eq!(n.totals.total_present, 1);
        assert_eq!(a.template_id.as_deref(), Some("skp-default"));
        assert_eq!(
            n.diagnostics
                .iter()
                .filter(|d| d.code == DiagnosticCode::W009SummaryMismatch)
                .count(),
            2
        );
    }
}
