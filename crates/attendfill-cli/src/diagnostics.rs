//! Diagnostic formatting for CLI output
//!
//! Two emitters:
//! - `TerminalEmitter`: rustc-style output to stderr
//! - `JsonEmitter`: machine-readable JSON output
//!
//! Both honour `--strict` (warnings become errors, hints become warnings)
//! and `--quiet` (only errors are shown).
//!
//! ## Exit Code Semantics
//!
//! | Exit Code | Meaning |
//! |-----------|---------|
//! | 0 | Success: no errors (warnings/hints/info allowed) |
//! | 1 | Failure: one or more errors emitted |
//!
//! `--quiet` never changes the exit code, and `--format=json` exits exactly
//! like text mode. The code is decided by the highest effective severity
//! after the strict policy is applied.

use std::io::Write;
use std::process;

use attendfill_core::{Diagnostic, DiagnosticEmitter, Severity};
use serde::Serialize;

// ============================================================================
// Exit Code
// ============================================================================

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// No errors (warnings/hints/info allowed)
    Success = 0,
    /// One or more errors emitted
    Failure = 1,
}

impl ExitCode {
    /// The count should already reflect strict-mode escalation.
    pub fn from_error_count(count: usize) -> Self {
        if count > 0 {
            ExitCode::Failure
        } else {
            ExitCode::Success
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Success)
    }

    pub fn is_failure(self) -> bool {
        matches!(self, ExitCode::Failure)
    }

    pub fn code(self) -> i32 {
        self as i32
    }
}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        process::ExitCode::from(code as u8)
    }
}

// ============================================================================
// Diagnostic Config
// ============================================================================

/// Configuration for diagnostic output
#[derive(Debug, Clone, Default)]
pub struct DiagnosticConfig {
    /// Escalate severities: warnings become errors, hints become warnings
    pub strict: bool,
    /// Suppress all output except errors
    pub quiet: bool,
    /// Worksheet name used to qualify cell locations (`Sheet1!B2`)
    pub sheet: Option<String>,
}

impl DiagnosticConfig {
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Default::default()
        }
    }

    pub fn quiet() -> Self {
        Self {
            quiet: true,
            ..Default::default()
        }
    }

    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    /// Escalate severity according to strict mode rules
    pub fn effective_severity(&self, severity: Severity) -> Severity {
        if self.strict {
            match severity {
                Severity::Warning => Severity::Error,
                Severity::Hint => Severity::Warning,
                s => s,
            }
        } else {
            severity
        }
    }

    pub fn should_show(&self, severity: Severity) -> bool {
        if self.quiet {
            matches!(self.effective_severity(severity), Severity::Error)
        } else {
            true
        }
    }

    /// `Sheet1!B2`, or just `B2` without a sheet name
    pub fn location(&self, diagnostic: &Diagnostic) -> Option<String> {
        let cell = diagnostic.cell?;
        Some(match &self.sheet {
            Some(sheet) => format!("{sheet}!{cell}"),
            None => cell.to_string(),
        })
    }
}

// ============================================================================
// Terminal
// ============================================================================

/// Rustc-style diagnostics on any writer
pub struct TerminalEmitter<W: Write> {
    writer: W,
    config: DiagnosticConfig,
    error_count: usize,
    warning_count: usize,
}

impl<W: Write> TerminalEmitter<W> {
    pub fn new(writer: W, config: DiagnosticConfig) -> Self {
        Self {
            writer,
            config,
            error_count: 0,
            warning_count: 0,
        }
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from_error_count(self.error_count)
    }

    fn write_diagnostic(&mut self, diagnostic: &Diagnostic) -> std::io::Result<()> {
        let severity = self.config.effective_severity(diagnostic.severity);
        match severity {
            Severity::Error => self.error_count += 1,
            Severity::Warning => self.warning_count += 1,
            _ => {}
        }
        if !self.config.should_show(diagnostic.severity) {
            return Ok(());
        }

        writeln!(
            self.writer,
            "{}[{}]: {}",
            severity.as_str(),
            diagnostic.code.as_str(),
            diagnostic.message
        )?;
        if let Some(location) = self.config.location(diagnostic) {
            writeln!(self.writer, "  --> {location}")?;
        }
        if !diagnostic.notes.is_empty() {
            writeln!(self.writer, "   |")?;
            for note in &diagnostic.notes {
                writeln!(self.writer, "   = {note}")?;
            }
        }
        for hint in &diagnostic.hints {
            writeln!(self.writer, "   = hint: {hint}")?;
        }
        writeln!(self.writer)
    }
}

impl<W: Write> DiagnosticEmitter for TerminalEmitter<W> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        // stderr may be closed
        let _ = self.write_diagnostic(&diagnostic);
    }
}

// ============================================================================
// JSON
// ============================================================================

/// Collects diagnostics for a JSON report
pub struct JsonEmitter {
    diagnostics: Vec<JsonDiagnostic>,
    config: DiagnosticConfig,
    error_count: usize,
}

#[derive(Debug, Serialize)]
pub struct JsonDiagnostic {
    pub code: String,
    pub severity: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell: Option<String>,
    pub notes: Vec<String>,
    pub hints: Vec<String>,
}

impl JsonEmitter {
    pub fn new(config: DiagnosticConfig) -> Self {
        Self {
            diagnostics: Vec::new(),
            config,
            error_count: 0,
        }
    }

    pub fn diagnostics(&self) -> &[JsonDiagnostic] {
        &self.diagnostics
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from_error_count(self.error_count)
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::to_value(&self.diagnostics).unwrap_or(serde_json::Value::Null)
    }
}

impl DiagnosticEmitter for JsonEmitter {
    fn emit(&mut self, diagnostic: Diagnostic) {
        let severity = self.config.effective_severity(diagnostic.severity);
        if severity == Severity::Error {
            self.error_count += 1;
        }
        if !self.config.should_show(diagnostic.severity) {
            return;
        }

        self.diagnostics.push(JsonDiagnostic {
            code: diagnostic.code.as_str().to_string(),
            severity: severity.as_str().to_string(),
            cell: self.config.location(&diagnostic),
            message: diagnostic.message,
            notes: diagnostic.notes,
            hints: diagnostic.hints,
        });
    }
}
