//! Attendance grid writer
//!
//! Writes one date and one status per day into the slots the layout found.
//! Status styles come from the legend, laid over the template's own cell
//! style; Present always renders in the canonical green.

use attendfill_core::style::is_date_format;
use attendfill_core::{
    present_style, AttendanceRecord, Border, CellAddress, Diagnostic, DiagnosticCode,
    DiagnosticEmitter, Fill, FillConfig, Period, StatusCode, Style, StyleFacet, WeekendFlag,
};
use attendfill_xlsx::{CellValue, Worksheet};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use tracing::debug;

use crate::legend::Legend;
use crate::orientation::{DaySlot, Layout, OrientationMode};
use crate::summary::is_day_count_label;

/// What the writer did
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub days_written: u32,
    pub days_blanked: u32,
    pub rows_inserted: u32,
    /// New header cell of a relocated "No. of days" pair
    pub relocated: Option<CellAddress>,
}

/// Everything the writer needs about the month
pub struct MonthData<'a> {
    pub period: Period,
    pub records: &'a BTreeMap<u32, AttendanceRecord>,
}

impl MonthData<'_> {
    fn record(&self, day: u32) -> Option<&AttendanceRecord> {
        self.records.get(&day)
    }

    fn status(&self, day: u32, date: NaiveDate) -> Option<StatusCode> {
        attendfill_core::effective_status_for(date, self.record(day))
    }

    fn is_weekend(&self, day: u32, date: NaiveDate, status: Option<StatusCode>) -> bool {
        let flagged = match self.record(day) {
            Some(record) => record.is_weekend(),
            None => WeekendFlag::from_weekday(date.weekday()).is_some(),
        };
        flagged || status.is_some_and(|s| s.is_weekend_off())
    }

    fn day_name(&self, day: u32, date: NaiveDate) -> String {
        self.record(day)
            .map_or_else(|| date.format("%a").to_string(), AttendanceRecord::day_name)
    }
}

/// Write the month into the sheet
pub fn write(
    sheet: &mut Worksheet,
    layout: &mut Layout,
    legend: &Legend,
    month: &MonthData<'_>,
    config: &FillConfig,
    emitter: &mut dyn DiagnosticEmitter,
) -> WriteReport {
    let report = match layout.mode.clone() {
        OrientationMode::Horizontal {
            header_row,
            data_row,
            columns,
        } => {
            let bases = HorizontalBases::capture(sheet, header_row, data_row, &columns);
            let mut report = WriteReport::default();
            make_room(sheet, layout, legend, &mut report, emitter);
            write_horizontal(sheet, layout, legend, month, config, &bases, &mut report);
            report
        }
        OrientationMode::Vertical {
            data_start_row,
            date_col,
            day_col,
            status_col,
            template_rows,
            ..
        } => {
            let pristine = VerticalBases::capture(sheet, data_start_row, [date_col, day_col, status_col]);
            let mut report = WriteReport {
                rows_inserted: insert_rows_if_needed(
                    sheet,
                    data_start_row,
                    template_rows,
                    month.period.days_in_month(),
                    emitter,
                ),
                ..Default::default()
            };
            write_vertical(sheet, layout, legend, month, config, &pristine, &mut report);
            report
        }
    };
    debug!(
        written = report.days_written,
        blanked = report.days_blanked,
        inserted = report.rows_inserted,
        "attendance written"
    );
    report
}

/// Style for a status cell: legend entry over the template's base style
pub fn status_style(base: &Style, code: StatusCode, legend: &Legend) -> Style {
    let entry = legend.style(code);
    let mut style = base.clone();
    let mut exclude = vec![StyleFacet::Border, StyleFacet::NumberFormat];
    if entry.alignment == Default::default() {
        exclude.push(StyleFacet::Alignment);
    }
    style.copy_from(entry, &exclude);
    if style.font.name.is_none() {
        style.font.name.clone_from(&base.font.name);
    }
    if style.font.size.is_none() {
        style.font.size = base.font.size;
    }

    if code == StatusCode::Present {
        let canonical = present_style();
        style.fill = canonical.fill;
        style.font.bold = true;
        style.font.color = canonical.font.color;
    } else if code.is_weekend_off() && !style.fill.is_visible() {
        style.fill = legend.weekend_fill().clone();
    }
    style
}

/// Status text and style for one day, or a cleared cell
fn write_status(
    sheet: &mut Worksheet,
    addr: CellAddress,
    base: &Style,
    status: Option<StatusCode>,
    legend: &Legend,
) {
    match status {
        Some(code) => {
            sheet.set_value(addr, CellValue::text(code.as_str()));
            sheet.set_style(addr, status_style(base, code, legend));
        }
        None => {
            sheet.set_value(addr, CellValue::Empty);
            sheet.set_style(addr, base.clone().with_fill(Fill::Empty));
        }
    }
}

fn date_style(base: &Style, fallback_format: &str, weekend: Option<&Fill>) -> Style {
    let mut style = base.clone();
    if !style.number_format.as_deref().is_some_and(is_date_format) {
        style.number_format = Some(fallback_format.to_string());
    }
    if let Some(fill) = weekend {
        style.fill = fill.clone();
    }
    style
}

/// Remove value, fill and border from a slot the month does not reach
fn blank(sheet: &mut Worksheet, addr: CellAddress) {
    if sheet.get(addr).is_none() {
        return;
    }
    let style = sheet.style(addr).with_fill(Fill::Empty).with_border(Border::default());
    sheet.set_value(addr, CellValue::Empty);
    sheet.set_style(addr, style);
}

/// Most common style among `styles`; ties go to the first seen
fn dominant_style(styles: impl IntoIterator<Item = Style>) -> Option<Style> {
    let mut counts: Vec<(Style, usize)> = Vec::new();
    for style in styles {
        match counts.iter_mut().find(|(s, _)| *s == style) {
            Some((_, n)) => *n += 1,
            None => counts.push((style, 1)),
        }
    }
    let best = counts.iter().map(|(_, n)| *n).max()?;
    counts.into_iter().find(|(_, n)| *n == best).map(|(s, _)| s)
}

// ============================================================================
// Horizontal
// ============================================================================

struct HorizontalBases {
    header: Style,
    data: Style,
}

impl HorizontalBases {
    fn capture(sheet: &Worksheet, header_row: u32, data_row: u32, columns: &BTreeMap<u32, u32>) -> Self {
        let at = |row: u32| {
            dominant_style(columns.values().map(|col| sheet.style(CellAddress::new(row, *col))))
                .unwrap_or_else(|| sheet.default_style().clone())
        };
        Self {
            header: at(header_row),
            data: at(data_row),
        }
    }
}

/// Clear the way for extrapolated day columns
///
/// A "No. of days" pair sitting where the next day goes moves one column
/// right; any other collision drops the day.
fn make_room(
    sheet: &mut Worksheet,
    layout: &mut Layout,
    legend: &Legend,
    report: &mut WriteReport,
    emitter: &mut dyn DiagnosticEmitter,
) {
    let extended: Vec<DaySlot> = layout.slots.values().filter(|s| s.extended).copied().collect();
    for slot in extended {
        if slot.cells().any(|c| legend.is_legend_cell(c)) {
            drop_day(layout, slot, "overlaps the legend", emitter);
            continue;
        }
        if !slot.cells().any(|c| occupied(sheet, c)) {
            continue;
        }

        let (header, value) = (slot.date, slot.status);
        let (new_header, new_value) = (header.right(), value.right());
        let movable = is_day_count_label(sheet.text(header))
            && ![new_header, new_value]
                .iter()
                .any(|c| occupied(sheet, *c) || legend.is_legend_cell(*c) || layout.is_day_cell(*c));
        if !movable {
            drop_day(layout, slot, "collides with existing content", emitter);
            continue;
        }

        for (from, to) in [(header, new_header), (value, new_value)] {
            let cell = sheet.cell(from);
            sheet.set_value(to, cell.value);
            sheet.set_style(to, cell.style);
            sheet.clear(from);
        }
        report.relocated = Some(new_header);
        emitter.emit(
            Diagnostic::new(
                DiagnosticCode::I001SummaryRelocated,
                format!("moved the day count from {header} to {new_header} to make room for day {}", slot.day),
            )
            .with_cell(new_header),
        );
    }
}

fn occupied(sheet: &Worksheet, addr: CellAddress) -> bool {
    !sheet.value(addr).is_empty()
}

fn drop_day(layout: &mut Layout, slot: DaySlot, reason: &str, emitter: &mut dyn DiagnosticEmitter) {
    layout.slots.remove(&slot.day);
    layout.unplaced.push(slot.day);
    emitter.emit(
        Diagnostic::new(
            DiagnosticCode::W005DayUnplaceable,
            format!("day {} at {} {reason}", slot.day, slot.status),
        )
        .with_cell(slot.status),
    );
}

fn write_horizontal(
    sheet: &mut Worksheet,
    layout: &Layout,
    legend: &Legend,
    month: &MonthData<'_>,
    config: &FillConfig,
    bases: &HorizontalBases,
    report: &mut WriteReport,
) {
    for slot in layout.slots.values() {
        let Some(date) = month.period.date(slot.day) else { continue };
        let status = month.status(slot.day, date);
        let weekend = month.is_weekend(slot.day, date, status).then(|| legend.weekend_fill());

        sheet.set_value(slot.date, CellValue::Date(date));
        sheet.set_style(slot.date, date_style(&bases.header, &config.date_formats.header, weekend));
        write_status(sheet, slot.status, &bases.data, status, legend);
        report.days_written += 1;
    }

    for slot in &layout.surplus {
        for addr in slot.cells() {
            blank(sheet, addr);
        }
        report.days_blanked += 1;
    }
}

// ============================================================================
// Vertical
// ============================================================================

/// Styles of the first data row before anything was written
struct VerticalBases {
    row: u32,
    date: Style,
    day: Style,
    status: Style,
    /// Every styled cell of the row, by column
    row_styles: Vec<(u32, Style)>,
}

impl VerticalBases {
    fn capture(sheet: &Worksheet, row: u32, [date, day, status]: [u32; 3]) -> Self {
        let at = |col| sheet.style(CellAddress::new(row, col));
        let row_styles = sheet
            .row_cells(row)
            .filter(|(_, cell)| cell.style != *sheet.default_style())
            .map(|(addr, cell)| (addr.col, cell.style.clone()))
            .collect();
        Self {
            row,
            date: at(date),
            day: at(day),
            status: at(status),
            row_styles,
        }
    }

    /// Give `row` the first data row's formatting, values untouched
    fn apply(&self, sheet: &mut Worksheet, row: u32, legend: &Legend) {
        sheet.copy_row_format(self.row, row);
        for (col, style) in &self.row_styles {
            let addr = CellAddress::new(row, *col);
            if !legend.is_legend_cell(addr) {
                sheet.set_style(addr, style.clone());
            }
        }
    }
}

/// Make room below a short data block; returns the number of rows inserted
fn insert_rows_if_needed(
    sheet: &mut Worksheet,
    data_start: u32,
    allotment: u32,
    days: u32,
    emitter: &mut dyn DiagnosticEmitter,
) -> u32 {
    if days <= allotment {
        return 0;
    }
    let after_block = data_start + allotment;
    let next_content = sheet
        .cells()
        .filter(|(addr, cell)| addr.row >= after_block && !cell.is_empty())
        .map(|(addr, _)| addr.row)
        .min();
    let Some(first_below) = next_content else { return 0 };
    if data_start + days - 1 < first_below {
        return 0;
    }

    // Blank rows between the block and the content below are used first
    let count = data_start + days - first_below;
    sheet.insert_rows(first_below, count);
    emitter.emit(
        Diagnostic::new(
            DiagnosticCode::I002RowsInserted,
            format!("inserted {count} row(s) at row {first_below} to fit {days} days"),
        )
        .with_note(format!("the template provides {allotment} day row(s)")),
    );
    count
}

fn write_vertical(
    sheet: &mut Worksheet,
    layout: &Layout,
    legend: &Legend,
    month: &MonthData<'_>,
    config: &FillConfig,
    bases: &VerticalBases,
    report: &mut WriteReport,
) {
    for slot in layout.slots.values() {
        let Some(date) = month.period.date(slot.day) else { continue };
        let status = month.status(slot.day, date);
        let weekend = month.is_weekend(slot.day, date, status).then(|| legend.weekend_fill());
        let row = slot.date.row;
        if row != bases.row {
            bases.apply(sheet, row, legend);
        }

        sheet.set_value(slot.date, CellValue::Date(date));
        sheet.set_style(slot.date, date_style(&bases.date, &config.date_formats.vertical, weekend));

        if let Some(day_cell) = slot.day_name {
            let mut style = bases.day.clone();
            if let Some(fill) = weekend {
                style.fill = fill.clone();
            }
            sheet.set_value(day_cell, CellValue::Text(month.day_name(slot.day, date)));
            sheet.set_style(day_cell, style);
        }

        write_status(sheet, slot.status, &bases.status, status, legend);
        report.days_written += 1;
    }

    for slot in &layout.surplus {
        for addr in slot.cells() {
            blank(sheet, addr);
        }
        report.days_blanked += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attendfill_core::{Color, Font};
    use pretty_assertions::assert_eq;

    #[test]
    fn dominant_style_prefers_majority_then_first() {
        let a = Style::default().with_number_format("0");
        let b = Style::default().with_border(Border::thin_box());
        assert_eq!(dominant_style([a.clone(), b.clone(), b.clone()]), Some(b.clone()));
        assert_eq!(dominant_style([a.clone(), b]), Some(a));
        assert_eq!(dominant_style(Vec::new()), None);
    }

    #[test]
    fn date_style_keeps_date_formats() {
        let dated = Style::default().with_number_format("d-mmm");
        assert_eq!(date_style(&dated, "d-mmm-yy", None).number_format.as_deref(), Some("d-mmm"));
        let general = Style::default().with_number_format("0");
        assert_eq!(date_style(&general, "d-mmm-yy", None).number_format.as_deref(), Some("d-mmm-yy"));

        let grey = Fill::Solid(Color::rgb("BFBFBF"));
        assert_eq!(date_style(&general, "d-mmm-yy", Some(&grey)).fill, grey);
    }

    #[test]
    fn base_font_survives_a_bare_legend_entry() {
        let base = Style::default().with_font(Font {
            name: Some("Calibri".into()),
            size: Some(9.0),
            ..Default::default()
        });
        let legend = Legend::defaults_only(&FillConfig::default());

        let style = status_style(&base, StatusCode::Present, &legend);
        assert_eq!(style.font.name.as_deref(), Some("Calibri"));
        assert_eq!(style.font.size, Some(9.0));
        assert_eq!(style.fill, Fill::Solid(Color::rgb("92D050")));
        assert_eq!(style.font.color, Some(Color::rgb("006100")));
        assert!(style.font.bold);
    }
}
