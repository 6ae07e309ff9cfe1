//! # attendfill-xlsx
//!
//! Part-preserving xlsx document model for the attendfill engine.
//!
//! This crate provides:
//! - `Workbook::load` / `Workbook::to_bytes` over the zip package
//! - `Worksheet`: a sparse `(row, col)` grid of `Cell`s with full `Style` values
//! - Row insertion, merged ranges and conditional formatting removal
//!
//! Parts the model does not understand (drawings, themes, defined names,
//! printer settings, ...) are written back byte-for-byte. The style table is
//! append-only, so existing style indices stay valid.
//!
//! ## Example
//!
//! ```rust,no_run
//! use attendfill_core::{CellAddress, Limits};
//! use attendfill_xlsx::{CellValue, Workbook};
//!
//! let bytes = std::fs::read("template.xlsx").unwrap();
//! let mut workbook = Workbook::load(&bytes, &Limits::default()).unwrap();
//! let sheet = workbook.first_sheet_mut();
//! sheet.set_value(CellAddress::new(2, 2), CellValue::text("Acme"));
//! let out = workbook.to_bytes().unwrap();
//! ```

mod cell;
mod package;
mod styles;
mod workbook;
mod worksheet;
mod xml;

pub use cell::{date_to_serial, serial_to_date, Cell, CellValue};
pub use workbook::Workbook;
pub use worksheet::Worksheet;

use thiserror::Error;

/// Failure to read a template package
#[derive(Debug, Error)]
pub enum TemplateParseError {
    #[error("Unreadable archive: {0}")]
    Archive(String),

    #[error("Malformed XML in {part}: {message}")]
    Xml { part: String, message: String },

    #[error("Missing part: {0}")]
    MissingPart(String),

    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),
}

/// Failure to write a workbook
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}
