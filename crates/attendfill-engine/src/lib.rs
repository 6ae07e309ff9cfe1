//! # attendfill-engine
//!
//! Fills an attendance template workbook with one employee's month.
//!
//! The pipeline runs on the first worksheet, in order:
//!
//! 1. [`orientation::detect`]: days across columns or down rows
//! 2. [`legend::extract`]: status styles from the template's legend
//! 3. [`placeholder::resolve`]: company, employee and period
//! 4. [`sanitize::clear_conditional_formats`]
//! 5. [`writer::write`]: dates, statuses and their styles
//! 6. [`summary::write`]: recomputed totals
//!
//! Only an unreadable template, an invalid month/year or a serialization
//! failure abort; everything else is reported as a [`Diagnostic`].
//!
//! ## Example
//!
//! ```rust
//! use attendfill_core::{AttendanceInput, FillConfig};
//! use attendfill_engine::{fill_template, OrientationMode};
//! use attendfill_templates::BuiltinTemplate;
//!
//! let template = BuiltinTemplate::SkpDefault.build().unwrap();
//! let input: AttendanceInput = serde_json::from_str(r#"{
//!     "company": "SKP", "employeeName": "Jane Doe", "employeeId": "E1",
//!     "month": "November", "year": 2025,
//!     "attendanceRows": [{ "date": "2025-11-03", "status": "P" }]
//! }"#).unwrap();
//!
//! let output = fill_template(&template, &input, &FillConfig::default()).unwrap();
//! assert_eq!(output.filename, "SKP_JaneDoe_November2025_Timesheet.xlsx");
//! assert!(matches!(output.orientation, OrientationMode::Horizontal { .. }));
//! assert_eq!(output.totals.total_present, 1);
//! ```

pub mod catalog;
pub mod day;
pub mod export;
pub mod legend;
pub mod orientation;
pub mod placeholder;
pub mod sanitize;
pub mod summary;
pub mod writer;

pub use catalog::{BuiltinCatalog, CatalogError, DirectoryCatalog, LayeredCatalog, TemplateCatalog};
pub use day::DayNumberParser;
pub use export::{content_disposition, export_filename};
pub use legend::Legend;
pub use orientation::{DaySlot, Layout, OrientationMode};
pub use placeholder::{HeaderField, Placement, Strategy};
pub use summary::{SummaryField, SummaryPlacement};

use attendfill_core::{
    AttendanceInput, CellAddress, CollectingEmitter, Diagnostic, DiagnosticEmitter, FillConfig,
    HeaderFields, InputError, Period, Severity, StatusCode, SummaryTotals,
};
use attendfill_xlsx::{SerializeError, TemplateParseError, Workbook};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Fatal fill failures
#[derive(Debug, Error)]
pub enum FillError {
    #[error(transparent)]
    TemplateParse(#[from] TemplateParseError),

    #[error(transparent)]
    InvalidInput(#[from] InputError),

    #[error(transparent)]
    Serialize(#[from] SerializeError),
}

/// A filled workbook plus everything learned while filling it
#[derive(Clone, Debug)]
pub struct FillOutput {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub orientation: OrientationMode,
    pub totals: SummaryTotals,
    pub diagnostics: Vec<Diagnostic>,
}

impl FillOutput {
    pub fn content_disposition(&self) -> String {
        content_disposition(&self.filename)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Warning)
    }
}

/// Fill `template` with `input`
pub fn fill_template(
    template: &[u8],
    input: &AttendanceInput,
    config: &FillConfig,
) -> Result<FillOutput, FillError> {
    let normalized = input.normalize()?;
    let mut workbook = Workbook::load(template, &config.limits)?;
    let mut emitter = CollectingEmitter::new();
    for diagnostic in normalized.diagnostics {
        emitter.emit(diagnostic);
    }

    let period = normalized.period;
    debug!(%period, rows = normalized.records.len(), "filling template");

    let sheet = workbook.first_sheet_mut();
    let mut layout = orientation::detect(sheet, period.days_in_month(), config, &mut emitter);
    let legend = legend::extract(sheet, &layout, config, &mut emitter);
    placeholder::resolve(sheet, &normalized.header, &layout, &legend, config, &mut emitter);
    sanitize::clear_conditional_formats(sheet, &mut emitter);
    let month = writer::MonthData {
        period,
        records: &normalized.records,
    };
    writer::write(sheet, &mut layout, &legend, &month, config, &mut emitter);
    summary::write(sheet, &layout, &legend, &normalized.totals, config, &mut emitter);

    let bytes = workbook.to_bytes()?;
    let filename = export_filename(&normalized.header);
    let diagnostics = emitter.into_diagnostics();
    log_diagnostics(&diagnostics);
    info!(%filename, orientation = layout.mode.name(), diagnostics = diagnostics.len(), "template filled");

    Ok(FillOutput {
        bytes,
        filename,
        orientation: layout.mode,
        totals: normalized.totals,
        diagnostics,
    })
}

fn log_diagnostics(diagnostics: &[Diagnostic]) {
    for d in diagnostics {
        match d.severity {
            Severity::Error | Severity::Warning => warn!(code = d.code.as_str(), "{}", d.message),
            Severity::Info => info!(code = d.code.as_str(), "{}", d.message),
            Severity::Hint => debug!(code = d.code.as_str(), "{}", d.message),
        }
    }
}

// ============================================================================
// Inspection
// ============================================================================

/// A legend cell as found in the template
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LegendCell {
    pub code: StatusCode,
    pub cell: CellAddress,
}

/// What the engine would do with a template, without writing anything
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inspection {
    pub sheet: String,
    pub layout: Layout,
    pub legend: Vec<LegendCell>,
    pub placements: Vec<Placement>,
    pub conditional_formats: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Run the read-only stages on `template`
///
/// Without a period the layout is sized for 31 days.
pub fn inspect_template(
    template: &[u8],
    period: Option<Period>,
    config: &FillConfig,
) -> Result<Inspection, FillError> {
    let workbook = Workbook::load(template, &config.limits)?;
    let mut sheet = workbook.first_sheet().clone();
    let mut emitter = CollectingEmitter::new();

    let days = period.map_or(31, |p| p.days_in_month());
    let layout = orientation::detect(&sheet, days, config, &mut emitter);
    let legend = legend::extract(&sheet, &layout, config, &mut emitter);
    let sample = HeaderFields {
        company: "Company".into(),
        employee_name: "Employee".into(),
        employee_id: "ID".into(),
        month: period.map_or_else(|| "Month".into(), |p| p.month_name().to_string()),
        year: period.map_or_else(|| "Year".into(), |p| p.year.to_string()),
    };
    let placements = placeholder::resolve(&mut sheet, &sample, &layout, &legend, config, &mut emitter);

    let legend_cells = StatusCode::ALL
        .iter()
        .filter_map(|code| legend.cell(*code).map(|cell| LegendCell { code: *code, cell }))
        .collect();

    Ok(Inspection {
        sheet: sheet.name().to_string(),
        conditional_formats: sheet.conditional_format_count(),
        layout,
        legend: legend_cells,
        placements,
        diagnostics: emitter.into_diagnostics(),
    })
}
