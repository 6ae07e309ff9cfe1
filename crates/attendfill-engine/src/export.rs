//! Download naming

use attendfill_core::HeaderFields;

/// `{company}_{employee}_{month}{year}_Timesheet.xlsx`
///
/// Characters outside `[A-Za-z0-9_-]` are dropped from each part; an empty
/// company or employee falls back to `Company` / `Employee`.
pub fn export_filename(header: &HeaderFields) -> String {
    let part = |text: &str, fallback: &str| {
        let cleaned = sanitize(text);
        if cleaned.is_empty() {
            fallback.to_string()
        } else {
            cleaned
        }
    };
    format!(
        "{}_{}_{}{}_Timesheet.xlsx",
        part(&header.company, "Company"),
        part(&header.employee_name, "Employee"),
        sanitize(&header.month),
        sanitize(&header.year),
    )
}

/// `Content-Disposition` header value for a download
pub fn content_disposition(filename: &str) -> String {
    format!("attachment; filename=\"{filename}\"")
}

fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}
