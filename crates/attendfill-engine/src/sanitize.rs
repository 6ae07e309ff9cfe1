//! Conditional formatting removal
//!
//! Rules such as "grey out ST" fight the written status styles; all of them
//! are dropped before filling.

use attendfill_core::{Diagnostic, DiagnosticCode, DiagnosticEmitter};
use attendfill_xlsx::Worksheet;
use tracing::debug;

/// Remove all conditional formatting; returns the number of rules removed
pub fn clear_conditional_formats(sheet: &mut Worksheet, emitter: &mut dyn DiagnosticEmitter) -> usize {
    let removed = sheet.clear_conditional_formats();
    debug!(removed, sheet = sheet.name(), "conditional formatting cleared");
    if removed > 0 {
        emitter.emit(Diagnostic::new(
            DiagnosticCode::I003ConditionalFormattingCleared,
            format!("removed {removed} conditional formatting rule(s)"),
        ));
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use attendfill_core::{CollectingEmitter, Limits};
    use attendfill_templates::HorizontalTemplate;
    use attendfill_xlsx::Workbook;

    #[test]
    fn reports_only_when_something_was_removed() {
        let bytes = HorizontalTemplate::new().build().unwrap();
        let mut workbook = Workbook::load(&bytes, &Limits::default()).unwrap();
        let mut emitter = CollectingEmitter::new();

        assert_eq!(clear_conditional_formats(workbook.first_sheet_mut(), &mut emitter), 2);
        assert!(emitter.has_code(DiagnosticCode::I003ConditionalFormattingCleared));

        let mut again = CollectingEmitter::new();
        assert_eq!(clear_conditional_formats(workbook.first_sheet_mut(), &mut again), 0);
        assert!(again.diagnostics.is_empty());
    }
}
