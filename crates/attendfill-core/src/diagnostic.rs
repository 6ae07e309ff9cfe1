//! Non-fatal fill diagnostics
//!
//! Every stage of the fill pipeline reports recoverable problems through a
//! [`DiagnosticEmitter`] instead of failing. The engine collects them with a
//! [`CollectingEmitter`] and returns them alongside the filled workbook; the
//! CLI renders them rustc-style or as JSON.
//!
//! Codes are stable: `W` codes are warnings, `I` codes are informational.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::address::CellAddress;

// ============================================================================
// Severity
// ============================================================================

/// How serious a diagnostic is
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Hint,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Hint => "hint",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Diagnostic Codes
// ============================================================================

/// Stable diagnostic identifiers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// Neither a day-number header row nor a Date/Status header was found
    W001OrientationUndetected,
    /// No legend cell was found; every status uses the built-in style
    W002LegendMissing,
    /// Some status codes were missing from the legend
    W003LegendDefaulted,
    /// A header field could not be placed anywhere
    W004PlaceholderUnresolved,
    /// A day of the month has no writable cell
    W005DayUnplaceable,
    /// An input row carries a status outside the vocabulary
    W006UnknownStatusCode,
    /// An input row's date is not in the requested month
    W007DateOutOfPeriod,
    /// Two input rows share a date; the first wins
    W008DuplicateDate,
    /// Caller-supplied totals disagree with the recomputed ones
    W009SummaryMismatch,
    /// A summary label was found but no value slot could be chosen
    W010SummaryUnresolved,
    /// The "No. of days" pair was moved to make room for day 31
    I001SummaryRelocated,
    /// Rows were inserted to fit a long month into a vertical template
    I002RowsInserted,
    /// Conditional formatting rules were removed from the sheet
    I003ConditionalFormattingCleared,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::W001OrientationUndetected => "W001",
            DiagnosticCode::W002LegendMissing => "W002",
            DiagnosticCode::W003LegendDefaulted => "W003",
            DiagnosticCode::W004PlaceholderUnresolved => "W004",
            DiagnosticCode::W005DayUnplaceable => "W005",
            DiagnosticCode::W006UnknownStatusCode => "W006",
            DiagnosticCode::W007DateOutOfPeriod => "W007",
            DiagnosticCode::W008DuplicateDate => "W008",
            DiagnosticCode::W009SummaryMismatch => "W009",
            DiagnosticCode::W010SummaryUnresolved => "W010",
            DiagnosticCode::I001SummaryRelocated => "I001",
            DiagnosticCode::I002RowsInserted => "I002",
            DiagnosticCode::I003ConditionalFormattingCleared => "I003",
        }
    }

    /// Human-readable name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            DiagnosticCode::W001OrientationUndetected => "orientation-undetected",
            DiagnosticCode::W002LegendMissing => "legend-missing",
            DiagnosticCode::W003LegendDefaulted => "legend-defaulted",
            DiagnosticCode::W004PlaceholderUnresolved => "placeholder-unresolved",
            DiagnosticCode::W005DayUnplaceable => "day-unplaceable",
            DiagnosticCode::W006UnknownStatusCode => "unknown-status-code",
            DiagnosticCode::W007DateOutOfPeriod => "date-out-of-period",
            DiagnosticCode::W008DuplicateDate => "duplicate-date",
            DiagnosticCode::W009SummaryMismatch => "summary-mismatch",
            DiagnosticCode::W010SummaryUnresolved => "summary-unresolved",
            DiagnosticCode::I001SummaryRelocated => "summary-relocated",
            DiagnosticCode::I002RowsInserted => "rows-inserted",
            DiagnosticCode::I003ConditionalFormattingCleared => "conditional-formatting-cleared",
        }
    }

    /// Informational codes are `Info`; a partially defaulted legend is only a hint
    pub fn default_severity(&self) -> Severity {
        match self {
            DiagnosticCode::W003LegendDefaulted => Severity::Hint,
            _ if self.as_str().starts_with('I') => Severity::Info,
            _ => Severity::Warning,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Diagnostic
// ============================================================================

/// One reported condition
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    /// Worksheet cell the diagnostic is about, if any
    pub cell: Option<CellAddress>,
    pub notes: Vec<String>,
    pub hints: Vec<String>,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: code.default_severity(),
            message: message.into(),
            cell: None,
            notes: Vec::new(),
            hints: Vec::new(),
        }
    }

    pub fn with_cell(mut self, cell: CellAddress) -> Self {
        self.cell = Some(cell);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)?;
        if let Some(cell) = self.cell {
            write!(f, " (at {cell})")?;
        }
        Ok(())
    }
}

// ============================================================================
// Emitters
// ============================================================================

/// Sink for diagnostics
pub trait DiagnosticEmitter {
    fn emit(&mut self, diagnostic: Diagnostic);
}

/// Emitter that keeps every diagnostic in memory
#[derive(Debug, Default)]
pub struct CollectingEmitter {
    pub diagnostics: Vec<Diagnostic>,
}

impl CollectingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_code(&self, code: DiagnosticCode) -> bool {
        self.diagnostics.iter().any(|d| d.code == code)
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl DiagnosticEmitter for CollectingEmitter {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}
