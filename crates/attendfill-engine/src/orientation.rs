//! Layout inference: which way the days run and where each one is written
//!
//! A row with more than `day_threshold` day numbers is a horizontal day
//! header; otherwise the first row naming both a date and a status column is
//! a vertical header. Failing both, the configured vertical layout is used.

use attendfill_core::address::MAX_ROW;
use attendfill_core::config::VerticalDefaults;
use attendfill_core::{CellAddress, CellRange, Diagnostic, DiagnosticCode, DiagnosticEmitter, FillConfig, StatusCode};
use attendfill_xlsx::{CellValue, Worksheet};
use chrono::Weekday;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::day::DayNumberParser;

/// The two template families
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum OrientationMode {
    /// Days across columns
    Horizontal {
        header_row: u32,
        data_row: u32,
        /// Day number to column, as printed in the template's header row
        columns: BTreeMap<u32, u32>,
    },
    /// Days down rows
    Vertical {
        header_row: u32,
        data_start_row: u32,
        date_col: u32,
        day_col: u32,
        status_col: u32,
        /// Pre-formatted data rows the template provides
        template_rows: u32,
    },
}

impl OrientationMode {
    pub fn name(&self) -> &'static str {
        match self {
            OrientationMode::Horizontal { .. } => "horizontal",
            OrientationMode::Vertical { .. } => "vertical",
        }
    }

    pub fn is_horizontal(&self) -> bool {
        matches!(self, OrientationMode::Horizontal { .. })
    }
}

/// Where one day of the month is written
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DaySlot {
    pub day: u32,
    /// Header cell (horizontal) or date cell (vertical)
    pub date: CellAddress,
    pub status: CellAddress,
    /// Day-name cell, vertical only
    pub day_name: Option<CellAddress>,
    /// The template has no cell for this day; its column was extrapolated
    pub extended: bool,
}

impl DaySlot {
    pub fn cells(&self) -> impl Iterator<Item = CellAddress> {
        [Some(self.date), Some(self.status), self.day_name].into_iter().flatten()
    }
}

/// Detected orientation plus the day-to-address map for one month
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Layout {
    pub mode: OrientationMode,
    /// Days 1..=days-in-month that have a slot
    pub slots: BTreeMap<u32, DaySlot>,
    /// Template slots for days past the month end
    pub surplus: Vec<DaySlot>,
    /// Days with no usable slot
    pub unplaced: Vec<u32>,
    /// False when the configured fallback layout was used
    pub detected: bool,
}

impl Layout {
    /// Every cell the day grid owns, including surplus slots
    pub fn day_cells(&self) -> BTreeSet<CellAddress> {
        self.slots
            .values()
            .chain(self.surplus.iter())
            .flat_map(DaySlot::cells)
            .collect()
    }

    pub fn is_day_cell(&self, addr: CellAddress) -> bool {
        self.slots
            .values()
            .chain(self.surplus.iter())
            .any(|slot| slot.cells().any(|c| c == addr))
    }

    /// Bounding box of the day grid
    pub fn grid(&self) -> Option<CellRange> {
        let cells = self.day_cells();
        let first = cells.iter().next()?;
        let (mut r0, mut c0, mut r1, mut c1) = (first.row, first.col, first.row, first.col);
        for c in &cells {
            r0 = r0.min(c.row);
            c0 = c0.min(c.col);
            r1 = r1.max(c.row);
            c1 = c1.max(c.col);
        }
        Some(CellRange::new(CellAddress::new(r0, c0), CellAddress::new(r1, c1)))
    }

    /// The day-header row of a horizontal template
    pub fn horizontal_header_row(&self) -> Option<u32> {
        match &self.mode {
            OrientationMode::Horizontal { header_row, .. } => Some(*header_row),
            OrientationMode::Vertical { .. } => None,
        }
    }

    /// Column immediately right of the template's printed day numbers
    pub fn legend_column(&self) -> Option<u32> {
        match &self.mode {
            OrientationMode::Horizontal { columns, .. } => columns.values().max().map(|c| c + 1),
            OrientationMode::Vertical { .. } => None,
        }
    }
}

/// Detect the layout of `sheet` for a month of `days` days
pub fn detect(
    sheet: &Worksheet,
    days: u32,
    config: &FillConfig,
    emitter: &mut dyn DiagnosticEmitter,
) -> Layout {
    if let Some((header_row, columns)) = find_day_header(sheet, config.orientation.day_threshold) {
        debug!(header_row, days_found = columns.len(), "horizontal day header");
        return horizontal_layout(header_row, columns, days, emitter);
    }

    let (defaults, detected) = match find_vertical_header(sheet, &config.orientation.vertical) {
        Some(found) => (found, true),
        None => {
            emitter.emit(
                Diagnostic::new(
                    DiagnosticCode::W001OrientationUndetected,
                    "no day-number row and no Date/Status header found",
                )
                .with_note(format!(
                    "using a vertical layout with data from row {}",
                    config.orientation.vertical.data_start_row
                )),
            );
            (config.orientation.vertical.clone(), false)
        }
    };
    debug!(header_row = defaults.header_row, detected, "vertical layout");
    vertical_layout(sheet, &defaults, days, detected, emitter)
}

// ============================================================================
// Horizontal
// ============================================================================

fn find_day_header(sheet: &Worksheet, threshold: usize) -> Option<(u32, BTreeMap<u32, u32>)> {
    let rows: BTreeSet<u32> = sheet.cells().map(|(addr, _)| addr.row).collect();
    for row in rows {
        let mut columns = BTreeMap::new();
        let mut count = 0usize;
        for (addr, cell) in sheet.row_cells(row) {
            if let Some(day) = DayNumberParser::parse(cell) {
                count += 1;
                columns.entry(day).or_insert(addr.col);
            }
        }
        if count > threshold {
            return Some((row, columns));
        }
    }
    None
}

fn horizontal_layout(
    header_row: u32,
    columns: BTreeMap<u32, u32>,
    days: u32,
    emitter: &mut dyn DiagnosticEmitter,
) -> Layout {
    let data_row = header_row + 1;
    let slot = |day: u32, col: u32, extended: bool| DaySlot {
        day,
        date: CellAddress::new(header_row, col),
        status: CellAddress::new(data_row, col),
        day_name: None,
        extended,
    };

    let mut used: BTreeSet<u32> = columns.values().copied().collect();
    let last = columns.iter().next_back().map(|(d, c)| (*d, *c));
    let mut slots = BTreeMap::new();
    let mut unplaced = Vec::new();

    for day in 1..=days {
        if let Some(&col) = columns.get(&day) {
            slots.insert(day, slot(day, col, false));
            continue;
        }
        let extended = last
            .filter(|(last_day, _)| day > *last_day)
            .map(|(last_day, last_col)| last_col + (day - last_day))
            .filter(|col| !used.contains(col));
        match extended {
            Some(col) => {
                used.insert(col);
                slots.insert(day, slot(day, col, true));
            }
            None => {
                unplaced.push(day);
                emitter.emit(Diagnostic::new(
                    DiagnosticCode::W005DayUnplaceable,
                    format!("day {day} has no column in the day header"),
                ));
            }
        }
    }

    let surplus = columns
        .iter()
        .filter(|(day, _)| **day > days)
        .map(|(day, col)| slot(*day, *col, false))
        .collect();

    Layout {
        mode: OrientationMode::Horizontal {
            header_row,
            data_row,
            columns,
        },
        slots,
        surplus,
        unplaced,
        detected: true,
    }
}

// ============================================================================
// Vertical
// ============================================================================

fn find_vertical_header(sheet: &Worksheet, defaults: &VerticalDefaults) -> Option<VerticalDefaults> {
    let rows: BTreeSet<u32> = sheet.cells().map(|(addr, _)| addr.row).collect();
    for row in rows {
        let labels: Vec<(u32, String)> = sheet
            .row_cells(row)
            .filter_map(|(addr, cell)| cell.text().map(|t| (addr.col, t.trim().to_lowercase())))
            .filter(|(_, t)| !t.is_empty())
            .collect();
        // A label naming two roles ("Attendance status by date") names neither
        let role = |word: &str, others: &[&str]| {
            labels
                .iter()
                .find(|(_, t)| t.contains(word) && !others.iter().any(|o| t.contains(o)))
                .map(|(c, _)| *c)
        };
        let (Some(date_col), Some(status_col)) = (role("date", &["status"]), role("status", &["date"])) else {
            continue;
        };
        let day = role("day", &["date", "status"]);

        let day_col = match day {
            Some(col) => col,
            None => {
                let mut col = defaults.day_col;
                while col == date_col || col == status_col {
                    col += 1;
                }
                col
            }
        };

        return Some(VerticalDefaults {
            header_row: row,
            data_start_row: row + 1,
            date_col,
            day_col,
            status_col,
        });
    }
    None
}

fn vertical_layout(
    sheet: &Worksheet,
    v: &VerticalDefaults,
    days: u32,
    detected: bool,
    emitter: &mut dyn DiagnosticEmitter,
) -> Layout {
    let template_rows = count_template_rows(sheet, v);
    let slot = |day: u32| {
        let row = v.data_start_row + day - 1;
        DaySlot {
            day,
            date: CellAddress::new(row, v.date_col),
            status: CellAddress::new(row, v.status_col),
            day_name: Some(CellAddress::new(row, v.day_col)),
            extended: day > template_rows,
        }
    };

    let mut slots = BTreeMap::new();
    let mut unplaced = Vec::new();
    for day in 1..=days {
        if v.data_start_row + day - 1 > MAX_ROW {
            unplaced.push(day);
            emitter.emit(Diagnostic::new(
                DiagnosticCode::W005DayUnplaceable,
                format!("day {day} would fall past the last worksheet row"),
            ));
            continue;
        }
        slots.insert(day, slot(day));
    }
    let surplus = (days + 1..=template_rows.min(31)).map(slot).collect();

    Layout {
        mode: OrientationMode::Vertical {
            header_row: v.header_row,
            data_start_row: v.data_start_row,
            date_col: v.date_col,
            day_col: v.day_col,
            status_col: v.status_col,
            template_rows,
        },
        slots,
        surplus,
        unplaced,
        detected,
    }
}

/// Consecutive rows from the data start that look like day rows
fn count_template_rows(sheet: &Worksheet, v: &VerticalDefaults) -> u32 {
    let roles = [v.date_col, v.day_col, v.status_col];
    let mut count = 0;
    loop {
        let row = v.data_start_row + count;
        let cells: Vec<_> = roles
            .iter()
            .filter_map(|col| sheet.get(CellAddress::new(row, *col)))
            .collect();
        if cells.is_empty() || !cells.iter().all(|c| is_day_row_value(&c.value)) {
            return count;
        }
        count += 1;
    }
}

/// Values a filled or blank day row can hold
pub(crate) fn is_day_row_value(value: &CellValue) -> bool {
    match value {
        CellValue::Empty | CellValue::Date(_) | CellValue::Number(_) | CellValue::Formula { .. } => true,
        CellValue::Text(text) => {
            let text = text.trim();
            text.is_empty()
                || text.parse::<StatusCode>().is_ok()
                || text.parse::<Weekday>().is_ok()
                || (text.chars().any(|c| c.is_ascii_digit())
                    && text.chars().all(|c| c.is_ascii_alphanumeric() || "-/. ".contains(c)))
        }
        CellValue::Bool(_) | CellValue::Error(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attendfill_core::CollectingEmitter;
    use pretty_assertions::assert_eq;

    #[test]
    fn day_row_values() {
        assert!(is_day_row_value(&CellValue::Empty));
        assert!(is_day_row_value(&CellValue::text("P")));
        assert!(is_day_row_value(&CellValue::text("Sat")));
        assert!(is_day_row_value(&CellValue::text("11/1/2025")));
        assert!(!is_day_row_value(&CellValue::text("Employee Signature")));
        assert!(!is_day_row_value(&CellValue::text("Total")));
    }

    #[test]
    fn extends_trailing_days_and_reports_gaps() {
        let mut columns = BTreeMap::new();
        for day in 1..=30 {
            if day != 12 {
                columns.insert(day, day + 1);
            }
        }
        let mut emitter = CollectingEmitter::new();
        let layout = horizontal_layout(1, columns, 31, &mut emitter);

        assert_eq!(layout.slots[&31].status, CellAddress::new(2, 32));
        assert!(layout.slots[&31].extended);
        assert!(!layout.slots[&30].extended);
        assert_eq!(layout.unplaced, vec![12]);
        assert!(emitter.has_code(DiagnosticCode::W005DayUnplaceable));
        assert_eq!(layout.legend_column(), Some(32));
    }

    #[test]
    fn surplus_columns_past_month_end() {
        let columns: BTreeMap<u32, u32> = (1..=31).map(|d| (d, d + 1)).collect();
        let mut emitter = CollectingEmitter::new();
        let layout = horizontal_layout(1, columns, 28, &mut emitter);
        let surplus: Vec<u32> = layout.surplus.iter().map(|s| s.day).collect();
        assert_eq!(surplus, vec![29, 30, 31]);
        assert_eq!(layout.slots.len(), 28);
        assert!(emitter.diagnostics.is_empty());
    }
}
