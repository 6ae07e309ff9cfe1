//! Summary totals: `{{token}}` substitution, then label-driven slots
//!
//! A label such as `Total Present` gets its value in the cell to its right
//! or below it. The slot is picked by one rule, in order:
//!
//! 1. a candidate already holding a number or a token
//! 2. a styled empty candidate (border or fill) over an unstyled one
//! 3. below for a label in the day-header row, right for any other label
//!
//! Label cells, legend cells and day cells are never candidates.

use attendfill_core::{
    CellAddress, Diagnostic, DiagnosticCode, DiagnosticEmitter, FillConfig, SummaryTotals,
};
use attendfill_xlsx::{Cell, CellValue, Worksheet};
use serde::Serialize;
use tracing::debug;

use crate::legend::Legend;
use crate::orientation::Layout;
use crate::placeholder::{normalize_label, replace_ignore_case};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SummaryField {
    TotalPresent,
    TotalLeave,
    TotalHoliday,
    TotalCompOff,
    AttendancePercent,
    WorkingDays,
    DaysInMonth,
}

impl SummaryField {
    pub const ALL: [SummaryField; 7] = [
        SummaryField::TotalPresent,
        SummaryField::TotalLeave,
        SummaryField::TotalHoliday,
        SummaryField::TotalCompOff,
        SummaryField::AttendancePercent,
        SummaryField::WorkingDays,
        SummaryField::DaysInMonth,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            SummaryField::TotalPresent => "{{totalpresent}}",
            SummaryField::TotalLeave => "{{totalleave}}",
            SummaryField::TotalHoliday => "{{totalholiday}}",
            SummaryField::TotalCompOff => "{{totalcompoff}}",
            SummaryField::AttendancePercent => "{{attendancepercent}}",
            SummaryField::WorkingDays => "{{workingdays}}",
            SummaryField::DaysInMonth => "{{daysinmonth}}",
        }
    }

    pub fn number(&self, totals: &SummaryTotals) -> f64 {
        match self {
            SummaryField::TotalPresent => f64::from(totals.total_present),
            SummaryField::TotalLeave => f64::from(totals.total_leave),
            SummaryField::TotalHoliday => f64::from(totals.total_holiday),
            SummaryField::TotalCompOff => f64::from(totals.total_comp_off),
            SummaryField::AttendancePercent => totals.attendance_percent,
            SummaryField::WorkingDays => f64::from(totals.working_days),
            SummaryField::DaysInMonth => f64::from(totals.days_in_month),
        }
    }

    /// Text used when a token sits inside a longer string
    pub fn text(&self, totals: &SummaryTotals) -> String {
        match self {
            SummaryField::AttendancePercent => totals.percent_text(),
            other => format!("{}", other.number(totals)),
        }
    }

    /// Field a summary label names, if any
    pub fn from_label(text: &str) -> Option<Self> {
        if is_day_count_label(text) {
            return Some(SummaryField::TotalPresent);
        }
        let label = normalize_label(text);
        let starts = |prefixes: &[&str]| prefixes.iter().any(|p| label.starts_with(p));
        if starts(&["total present"]) {
            Some(SummaryField::TotalPresent)
        } else if starts(&["total leave"]) {
            Some(SummaryField::TotalLeave)
        } else if starts(&["total holiday"]) {
            Some(SummaryField::TotalHoliday)
        } else if starts(&["total comp-off", "total comp off", "total compoff"]) {
            Some(SummaryField::TotalCompOff)
        } else if starts(&["working days"]) {
            Some(SummaryField::WorkingDays)
        } else if starts(&["total days in month"]) {
            Some(SummaryField::DaysInMonth)
        } else if label.contains("attendance") && label.contains('%') {
            Some(SummaryField::AttendancePercent)
        } else {
            None
        }
    }
}

/// `No.of days` / `No. of days`
pub fn is_day_count_label(text: &str) -> bool {
    matches!(normalize_label(text).as_str(), "no.of days" | "no. of days")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarySource {
    Token,
    Label,
}

/// A written summary value
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SummaryPlacement {
    pub field: SummaryField,
    pub cell: CellAddress,
    pub source: SummarySource,
}

/// Write the totals into every token and labelled slot
pub fn write(
    sheet: &mut Worksheet,
    layout: &Layout,
    legend: &Legend,
    totals: &SummaryTotals,
    config: &FillConfig,
    emitter: &mut dyn DiagnosticEmitter,
) -> Vec<SummaryPlacement> {
    let mut placements = substitute_tokens(sheet, layout, legend, totals);

    let labels: Vec<(CellAddress, SummaryField)> = sheet
        .cells()
        .take_while(|(addr, _)| addr.row <= config.summary.scan_rows)
        .filter(|(addr, _)| !legend.is_legend_cell(*addr) && !layout.is_day_cell(*addr))
        .filter_map(|(addr, cell)| cell.text().and_then(SummaryField::from_label).map(|f| (addr, f)))
        .collect();
    let is_label = |addr: CellAddress| labels.iter().any(|(a, _)| *a == addr);

    for (label, field) in &labels {
        let eligible = |addr: CellAddress| {
            !is_label(addr) && !legend.is_legend_cell(addr) && !layout.is_day_cell(addr)
        };
        let in_header_row = layout.horizontal_header_row() == Some(label.row);
        match choose_slot(sheet, *label, in_header_row, &eligible) {
            Some(slot) => {
                sheet.set_value(slot, CellValue::Number(field.number(totals)));
                placements.push(SummaryPlacement {
                    field: *field,
                    cell: slot,
                    source: SummarySource::Label,
                });
            }
            None => emitter.emit(
                Diagnostic::new(
                    DiagnosticCode::W010SummaryUnresolved,
                    format!("no value cell next to the summary label {:?}", sheet.text(*label)),
                )
                .with_cell(*label),
            ),
        }
    }

    debug!(placed = placements.len(), "summary written");
    placements
}

/// Pick the value cell for a label, see the module docs
fn choose_slot(
    sheet: &Worksheet,
    label: CellAddress,
    in_header_row: bool,
    eligible: &dyn Fn(CellAddress) -> bool,
) -> Option<CellAddress> {
    let candidates: Vec<(CellAddress, Option<&Cell>)> = [label.right(), label.below()]
        .into_iter()
        .filter(|addr| eligible(*addr))
        .map(|addr| (addr, sheet.get(addr)))
        .filter(|(_, cell)| cell.map_or(true, |c| holds_slot_value(&c.value)))
        .collect();

    let holding = candidates
        .iter()
        .find(|(_, cell)| cell.is_some_and(|c| !c.value.is_empty()));
    if let Some((addr, _)) = holding {
        return Some(*addr);
    }

    let styled = candidates.iter().find(|(_, cell)| {
        cell.is_some_and(|c| !c.style.border.is_empty() || c.style.fill.is_visible())
    });
    if let Some((addr, _)) = styled {
        return Some(*addr);
    }

    let preferred = if in_header_row {
        [label.below(), label.right()]
    } else {
        [label.right(), label.below()]
    };
    preferred
        .into_iter()
        .find(|addr| candidates.iter().any(|(a, _)| a == addr))
}

/// Values a summary slot may already hold: nothing, a number or a token
fn holds_slot_value(value: &CellValue) -> bool {
    match value {
        CellValue::Empty | CellValue::Number(_) => true,
        CellValue::Text(text) => text.trim().is_empty() || text.contains("{{"),
        _ => false,
    }
}

fn substitute_tokens(
    sheet: &mut Worksheet,
    layout: &Layout,
    legend: &Legend,
    totals: &SummaryTotals,
) -> Vec<SummaryPlacement> {
    let candidates: Vec<(CellAddress, String)> = sheet
        .cells()
        .filter(|(addr, _)| !legend.is_legend_cell(*addr) && !layout.is_day_cell(*addr))
        .filter_map(|(addr, cell)| cell.text().filter(|t| t.contains("{{")).map(|t| (addr, t.to_string())))
        .collect();

    let mut placements = Vec::new();
    for (addr, original) in candidates {
        let exact = SummaryField::ALL
            .into_iter()
            .find(|f| original.trim().eq_ignore_ascii_case(f.token()));
        if let Some(field) = exact {
            sheet.set_value(addr, CellValue::Number(field.number(totals)));
            placements.push(SummaryPlacement {
                field,
                cell: addr,
                source: SummarySource::Token,
            });
            continue;
        }

        let mut text = original.clone();
        for field in SummaryField::ALL {
            if let Some(replaced) = replace_ignore_case(&text, field.token(), &field.text(totals)) {
                text = replaced;
                placements.push(SummaryPlacement {
                    field,
                    cell: addr,
                    source: SummarySource::Token,
                });
            }
        }
        if text != original {
            sheet.set_value(addr, CellValue::Text(text));
        }
    }
    placements
}
