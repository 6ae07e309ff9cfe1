//! Header field placement: company, employee, period
//!
//! Each field is placed by the first strategy that works:
//!
//! 1. `{{token}}` substitution inside any text cell
//! 2. the cell right of a label such as `Employee Name:`
//! 3. a fixed fallback address from the configuration

use attendfill_core::{
    CellAddress, Diagnostic, DiagnosticCode, DiagnosticEmitter, FillConfig, HeaderFields,
};
use attendfill_xlsx::{CellValue, Worksheet};
use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::legend::Legend;
use crate::orientation::Layout;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HeaderField {
    Company,
    EmployeeName,
    EmployeeId,
    Period,
}

impl HeaderField {
    pub const ALL: [HeaderField; 4] = [
        HeaderField::Company,
        HeaderField::EmployeeName,
        HeaderField::EmployeeId,
        HeaderField::Period,
    ];

    fn label_prefixes(&self) -> &'static [&'static str] {
        match self {
            HeaderField::Company => &["company"],
            HeaderField::EmployeeName => &["employee name"],
            HeaderField::EmployeeId => &["employee id"],
            HeaderField::Period => &["month", "period"],
        }
    }

    fn fixed_cell(&self, config: &FillConfig) -> Option<CellAddress> {
        let p = &config.placeholders;
        match self {
            HeaderField::Company => p.company,
            HeaderField::EmployeeName => p.employee_name,
            HeaderField::EmployeeId => p.employee_id,
            HeaderField::Period => p.period,
        }
    }

    /// Value written by the label and fixed strategies
    fn value(&self, header: &HeaderFields) -> String {
        match self {
            HeaderField::Company => header.company.trim().to_string(),
            HeaderField::EmployeeName => header.employee_name.trim().to_string(),
            HeaderField::EmployeeId => header.employee_id.trim().to_string(),
            HeaderField::Period => header.period_label(),
        }
    }

    /// Token spellings with their replacement text
    fn tokens(&self, header: &HeaderFields) -> Vec<(&'static str, String)> {
        let value = self.value(header);
        match self {
            HeaderField::Company => vec![("{{company}}", value)],
            HeaderField::EmployeeName => vec![
                ("{{employeename}}", value.clone()),
                ("{{employee_name}}", value),
            ],
            HeaderField::EmployeeId => vec![
                ("{{employee_id}}", value.clone()),
                ("{{employeeid}}", value),
            ],
            HeaderField::Period => vec![
                ("{{month}}", header.month.trim().to_string()),
                ("{{year}}", header.year.trim().to_string()),
                ("{{monthyear}}", value.clone()),
                ("{{period}}", value),
            ],
        }
    }
}

impl fmt::Display for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HeaderField::Company => "company",
            HeaderField::EmployeeName => "employee name",
            HeaderField::EmployeeId => "employee id",
            HeaderField::Period => "period",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Token,
    Label,
    Fixed,
}

/// Where a header field ended up
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub field: HeaderField,
    pub cell: CellAddress,
    pub strategy: Strategy,
}

/// Write the header fields into the sheet
pub fn resolve(
    sheet: &mut Worksheet,
    header: &HeaderFields,
    layout: &Layout,
    legend: &Legend,
    config: &FillConfig,
    emitter: &mut dyn DiagnosticEmitter,
) -> Vec<Placement> {
    let grid = layout.grid();
    let writable = |addr: CellAddress| {
        !legend.is_legend_cell(addr) && !grid.is_some_and(|g| g.contains(addr))
    };

    let mut placements = substitute_tokens(sheet, header, legend);

    for field in HeaderField::ALL {
        if placements.iter().any(|p| p.field == field) {
            continue;
        }
        let value = field.value(header);
        if value.is_empty() {
            continue;
        }

        if let Some(target) = find_label_target(sheet, field, &writable) {
            sheet.set_value(target, CellValue::Text(value));
            placements.push(Placement {
                field,
                cell: target,
                strategy: Strategy::Label,
            });
            continue;
        }

        match field.fixed_cell(config).filter(|addr| writable(*addr)) {
            Some(target) => {
                sheet.set_value(target, CellValue::Text(value));
                placements.push(Placement {
                    field,
                    cell: target,
                    strategy: Strategy::Fixed,
                });
            }
            None => emitter.emit(
                Diagnostic::new(
                    DiagnosticCode::W004PlaceholderUnresolved,
                    format!("no cell found for the {field}"),
                )
                .with_hint(format!("add a {{{{{}}}}} token or a label to the template", token_hint(field))),
            ),
        }
    }

    for placement in &placements {
        debug!(field = %placement.field, cell = %placement.cell, strategy = ?placement.strategy, "header field placed");
    }
    placements
}

fn token_hint(field: HeaderField) -> &'static str {
    match field {
        HeaderField::Company => "company",
        HeaderField::EmployeeName => "employeename",
        HeaderField::EmployeeId => "employee_id",
        HeaderField::Period => "monthyear",
    }
}

/// Replace header tokens in every text cell outside the legend
fn substitute_tokens(sheet: &mut Worksheet, header: &HeaderFields, legend: &Legend) -> Vec<Placement> {
    let candidates: Vec<(CellAddress, String)> = sheet
        .cells()
        .filter(|(addr, _)| !legend.is_legend_cell(*addr))
        .filter_map(|(addr, cell)| cell.text().filter(|t| t.contains("{{")).map(|t| (addr, t.to_string())))
        .collect();

    let mut placements = Vec::new();
    for (addr, original) in candidates {
        let mut text = original.clone();
        for field in HeaderField::ALL {
            let mut hit = false;
            for (token, value) in field.tokens(header) {
                if let Some(replaced) = replace_ignore_case(&text, token, &value) {
                    text = replaced;
                    hit = true;
                }
            }
            if hit {
                placements.push(Placement {
                    field,
                    cell: addr,
                    strategy: Strategy::Token,
                });
            }
        }
        if text != original {
            sheet.set_value(addr, CellValue::Text(text));
        }
    }
    placements
}

fn find_label_target(
    sheet: &Worksheet,
    field: HeaderField,
    writable: &dyn Fn(CellAddress) -> bool,
) -> Option<CellAddress> {
    sheet
        .cells()
        .filter(|(_, cell)| {
            cell.text()
                .map(normalize_label)
                .is_some_and(|label| field.label_prefixes().iter().any(|p| label.starts_with(p)))
        })
        .map(|(addr, _)| addr.right())
        .find(|target| writable(*target))
}

/// Lowercase, collapse whitespace, drop a trailing colon
pub(crate) fn normalize_label(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    collapsed.trim_end_matches(':').trim_end().to_string()
}

/// Replace every ASCII-case-insensitive occurrence of `token`
///
/// Returns `None` when `token` does not occur.
pub(crate) fn replace_ignore_case(text: &str, token: &str, value: &str) -> Option<String> {
    let haystack = text.to_ascii_lowercase();
    let needle = token.to_ascii_lowercase();
    if !haystack.contains(&needle) {
        return None;
    }
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (start, _) in haystack.match_indices(&needle) {
        out.push_str(&text[last..start]);
        out.push_str(value);
        last = start + needle.len();
    }
    out.push_str(&text[last..]);
    Some(out)
}
