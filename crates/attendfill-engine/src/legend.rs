//! Status styles read from the template's own legend

use attendfill_core::{
    CellAddress, Diagnostic, DiagnosticCode, DiagnosticEmitter, Fill, FillConfig, StatusCode, Style,
};
use attendfill_xlsx::Worksheet;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::orientation::Layout;

/// Resolved style per status code
#[derive(Clone, Debug, PartialEq)]
pub struct Legend {
    found: BTreeMap<StatusCode, (CellAddress, Style)>,
    defaults: BTreeMap<StatusCode, Style>,
    weekend_fill: Fill,
}

impl Legend {
    /// Style for a status: the legend cell's, else the configured default
    pub fn style(&self, code: StatusCode) -> &Style {
        match self.found.get(&code) {
            Some((_, style)) => style,
            // `defaults` covers every code
            None => &self.defaults[&code],
        }
    }

    pub fn cell(&self, code: StatusCode) -> Option<CellAddress> {
        self.found.get(&code).map(|(addr, _)| *addr)
    }

    /// Legend cells are never written
    pub fn is_legend_cell(&self, addr: CellAddress) -> bool {
        self.found.values().any(|(a, _)| *a == addr)
    }

    pub fn found_codes(&self) -> impl Iterator<Item = StatusCode> + '_ {
        self.found.keys().copied()
    }

    pub fn weekend_fill(&self) -> &Fill {
        &self.weekend_fill
    }

    /// A legend with no template entries
    pub fn defaults_only(config: &FillConfig) -> Self {
        Self::with_entries(BTreeMap::new(), config)
    }

    fn with_entries(found: BTreeMap<StatusCode, (CellAddress, Style)>, config: &FillConfig) -> Self {
        let weekend_fill = [StatusCode::SaturdayOff, StatusCode::SundayOff]
            .iter()
            .filter_map(|code| found.get(code))
            .map(|(_, style)| &style.fill)
            .find(|fill| fill.is_visible())
            .cloned()
            .unwrap_or_else(|| config.weekend_fill());
        let defaults = StatusCode::ALL
            .iter()
            .map(|code| (*code, config.default_style(*code)))
            .collect();
        Self {
            found,
            defaults,
            weekend_fill,
        }
    }
}

/// Locate the legend and resolve a style for every status code
pub fn extract(
    sheet: &Worksheet,
    layout: &Layout,
    config: &FillConfig,
    emitter: &mut dyn DiagnosticEmitter,
) -> Legend {
    let mut found = match layout.legend_column() {
        Some(col) => scan_column(sheet, col, config.legend.first_row, config.legend.last_row),
        None => BTreeMap::new(),
    };
    if found.is_empty() {
        found = scan_sheet(sheet, layout);
    }
    debug!(codes = found.len(), "legend entries");

    if found.is_empty() {
        emitter.emit(
            Diagnostic::new(DiagnosticCode::W002LegendMissing, "no legend found in the template")
                .with_note("all status codes use the configured styles"),
        );
    } else {
        let missing: Vec<&str> = StatusCode::ALL
            .iter()
            .filter(|c| !found.contains_key(c))
            .map(StatusCode::as_str)
            .collect();
        if !missing.is_empty() {
            emitter.emit(Diagnostic::new(
                DiagnosticCode::W003LegendDefaulted,
                format!("legend has no entry for {}", missing.join(", ")),
            ));
        }
    }

    Legend::with_entries(found, config)
}

/// Codes stacked in the column right of the day grid
fn scan_column(
    sheet: &Worksheet,
    col: u32,
    first_row: u32,
    last_row: u32,
) -> BTreeMap<StatusCode, (CellAddress, Style)> {
    let mut found = BTreeMap::new();
    for row in first_row..=last_row {
        let addr = CellAddress::new(row, col);
        let Some(cell) = sheet.get(addr) else { continue };
        if let Some(code) = cell.text().and_then(|t| t.parse::<StatusCode>().ok()) {
            found.entry(code).or_insert((addr, cell.style.clone()));
        }
    }
    found
}

/// Any filled cell outside the day grid whose text is a status code
fn scan_sheet(sheet: &Worksheet, layout: &Layout) -> BTreeMap<StatusCode, (CellAddress, Style)> {
    let day_cells: BTreeSet<CellAddress> = layout.day_cells();
    let mut found = BTreeMap::new();
    for (addr, cell) in sheet.cells() {
        if day_cells.contains(&addr) || !cell.style.fill.is_visible() {
            continue;
        }
        if let Some(code) = cell.text().and_then(|t| t.parse::<StatusCode>().ok()) {
            found.entry(code).or_insert((addr, cell.style.clone()));
        }
    }
    found
}
