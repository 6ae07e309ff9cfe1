//! # attendfill-templates
//!
//! Built-in attendance templates, generated with `rust_xlsxwriter`.
//!
//! This crate provides:
//! - [`HorizontalTemplate`]: days across columns, legend beside the grid
//! - [`VerticalTemplate`]: one row per day under a Date/Day/Status header
//! - [`BuiltinTemplate`]: the named templates served by the built-in catalog
//!
//! ## Example
//!
//! ```rust
//! use attendfill_templates::{BuiltinTemplate, HorizontalTemplate};
//!
//! let skp = BuiltinTemplate::from_id("skp-default").unwrap().build().unwrap();
//! assert!(skp.starts_with(b"PK"));
//!
//! let custom = HorizontalTemplate::new().day_columns(31).no_legend().build().unwrap();
//! assert!(!custom.is_empty());
//! ```

mod horizontal;
mod vertical;

pub use horizontal::HorizontalTemplate;
pub use vertical::VerticalTemplate;

use std::fmt;
use thiserror::Error;

/// Failure to generate a template workbook
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Failed to build template: {0}")]
    Build(String),
}

impl From<rust_xlsxwriter::XlsxError> for TemplateError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        TemplateError::Build(err.to_string())
    }
}

// ============================================================================
// Legend
// ============================================================================

/// One legend cell: a status code on a colored background
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegendSwatch {
    pub code: String,
    pub description: String,
    /// Background as `0xRRGGBB`
    pub fill: u32,
    /// Font color as `0xRRGGBB`, `None` for automatic
    pub font_color: Option<u32>,
}

impl LegendSwatch {
    pub fn new(code: impl Into<String>, description: impl Into<String>, fill: u32) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            fill,
            font_color: None,
        }
    }

    pub fn font_color(mut self, color: u32) -> Self {
        self.font_color = Some(color);
        self
    }
}

/// The legend printed on the built-in templates
pub fn standard_legend() -> Vec<LegendSwatch> {
    vec![
        LegendSwatch::new("P", "Present", 0x92D050),
        LegendSwatch::new("C", "Comp-off", 0x00B0F0),
        LegendSwatch::new("L", "Leave", 0xFFC000),
        LegendSwatch::new("H", "Holiday", 0xBFBFBF),
        LegendSwatch::new("ST", "Saturday off", 0xD9D9D9),
        LegendSwatch::new("SU", "Sunday off", 0xD9D9D9),
    ]
}

// ============================================================================
// Named templates
// ============================================================================

/// Templates addressable by catalog id
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuiltinTemplate {
    /// Horizontal "SKP" timesheet: 30 day columns, "No.of days" beside them
    SkpDefault,
    /// Vertical timesheet with header fields, summary block and legend
    VerticalDefault,
}

impl BuiltinTemplate {
    pub const ALL: [BuiltinTemplate; 2] = [BuiltinTemplate::SkpDefault, BuiltinTemplate::VerticalDefault];

    pub fn id(&self) -> &'static str {
        match self {
            BuiltinTemplate::SkpDefault => "skp-default",
            BuiltinTemplate::VerticalDefault => "vertical-default",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BuiltinTemplate::SkpDefault => "days across columns, legend beside the grid",
            BuiltinTemplate::VerticalDefault => "one row per day below a Date/Day/Status header",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim();
        Self::ALL.into_iter().find(|t| t.id().eq_ignore_ascii_case(id))
    }

    /// Generate the workbook bytes
    pub fn build(&self) -> Result<Vec<u8>, TemplateError> {
        match self {
            BuiltinTemplate::SkpDefault => HorizontalTemplate::new().build(),
            BuiltinTemplate::VerticalDefault => VerticalTemplate::new().build(),
        }
    }
}

impl fmt::Display for BuiltinTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
