//! Cell style value types
//!
//! A [`Style`] is a plain value: it owns its fill, font, border, alignment
//! and number format, and is compared structurally. The document model maps
//! styles to and from the workbook's shared style table; engine stages never
//! see style indices.
//!
//! Copying part of a style is done with [`Style::copy_from`] and an explicit
//! list of [`StyleFacet`]s to leave untouched:
//!
//! ```rust
//! use attendfill_core::style::{Color, Fill, Style, StyleFacet};
//!
//! let legend = Style::default().with_fill(Fill::Solid(Color::rgb("FFC000")));
//! let mut cell = Style::default();
//! cell.copy_from(&legend, &[StyleFacet::Border, StyleFacet::NumberFormat]);
//! assert_eq!(cell.fill, legend.fill);
//! ```

use serde::{Deserialize, Serialize};

/// A color reference as stored in the workbook
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Color {
    /// Explicit ARGB value, upper-case, eight hex digits (`FF92D050`)
    Rgb(String),
    /// Theme palette slot with optional tint
    Theme { theme: u32, tint: Option<f64> },
    /// Legacy indexed palette
    Indexed(u32),
    /// Automatic (system) color
    Auto,
}

impl Color {
    /// Build an RGB color from `RRGGBB`, `#RRGGBB` or `AARRGGBB`
    pub fn rgb(hex: &str) -> Self {
        let hex = hex.trim().trim_start_matches('#').to_ascii_uppercase();
        if hex.len() == 6 {
            Color::Rgb(format!("FF{hex}"))
        } else {
            Color::Rgb(hex)
        }
    }

    /// The ARGB string, if this is an explicit color
    pub fn as_argb(&self) -> Option<&str> {
        match self {
            Color::Rgb(argb) => Some(argb),
            _ => None,
        }
    }
}

/// Cell background
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Fill {
    /// No fill (pattern `none`)
    #[default]
    Empty,
    /// Solid pattern with a foreground color
    Solid(Color),
    /// Any other pattern fill
    Pattern {
        pattern: String,
        fg: Option<Color>,
        bg: Option<Color>,
    },
    /// Fill the model does not interpret (gradients); kept as raw XML
    Other(String),
}

impl Fill {
    /// Whether the fill paints anything
    pub fn is_visible(&self) -> bool {
        match self {
            Fill::Empty => false,
            Fill::Solid(_) | Fill::Other(_) => true,
            Fill::Pattern { pattern, .. } => pattern != "none",
        }
    }

    /// Foreground color of a solid fill
    pub fn solid_color(&self) -> Option<&Color> {
        match self {
            Fill::Solid(color) => Some(color),
            _ => None,
        }
    }
}

/// Font attributes
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Font {
    pub name: Option<String>,
    pub size: Option<f64>,
    pub bold: bool,
    pub italic: bool,
    pub strike: bool,
    /// Underline kind (`single`, `double`, ...)
    pub underline: Option<String>,
    pub color: Option<Color>,
    pub family: Option<u32>,
    pub scheme: Option<String>,
}

/// One side of a cell border
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BorderEdge {
    /// Line style (`thin`, `medium`, `dashed`, ...)
    pub style: String,
    pub color: Option<Color>,
}

impl BorderEdge {
    pub fn thin() -> Self {
        Self {
            style: "thin".into(),
            color: None,
        }
    }
}

/// Cell border
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Border {
    pub left: Option<BorderEdge>,
    pub right: Option<BorderEdge>,
    pub top: Option<BorderEdge>,
    pub bottom: Option<BorderEdge>,
}

impl Border {
    /// Thin line on all four sides
    pub fn thin_box() -> Self {
        Self {
            left: Some(BorderEdge::thin()),
            right: Some(BorderEdge::thin()),
            top: Some(BorderEdge::thin()),
            bottom: Some(BorderEdge::thin()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_none() && self.right.is_none() && self.top.is_none() && self.bottom.is_none()
    }
}

/// Text placement inside the cell
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Alignment {
    pub horizontal: Option<String>,
    pub vertical: Option<String>,
    pub wrap_text: bool,
    /// Degrees, 0-180 as in the file format (255 = vertical stacked)
    pub text_rotation: Option<u32>,
    pub indent: Option<u32>,
    pub shrink_to_fit: bool,
}

impl Alignment {
    pub fn centered() -> Self {
        Self {
            horizontal: Some("center".into()),
            vertical: Some("center".into()),
            ..Default::default()
        }
    }
}

/// Independently copyable parts of a [`Style`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StyleFacet {
    Fill,
    Font,
    Border,
    Alignment,
    NumberFormat,
}

/// Complete visual style of one cell
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub fill: Fill,
    pub font: Font,
    pub border: Border,
    pub alignment: Alignment,
    /// Number format code; `None` means General
    pub number_format: Option<String>,
}

impl Style {
    /// Copy every facet of `source` except those listed in `exclude`
    pub fn copy_from(&mut self, source: &Style, exclude: &[StyleFacet]) {
        if !exclude.contains(&StyleFacet::Fill) {
            self.fill = source.fill.clone();
        }
        if !exclude.contains(&StyleFacet::Font) {
            self.font = source.font.clone();
        }
        if !exclude.contains(&StyleFacet::Border) {
            self.border = source.border.clone();
        }
        if !exclude.contains(&StyleFacet::Alignment) {
            self.alignment = source.alignment.clone();
        }
        if !exclude.contains(&StyleFacet::NumberFormat) {
            self.number_format = source.number_format.clone();
        }
    }

    pub fn with_fill(mut self, fill: Fill) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_font(mut self, font: Font) -> Self {
        self.font = font;
        self
    }

    pub fn with_border(mut self, border: Border) -> Self {
        self.border = border;
        self
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_number_format(mut self, code: impl Into<String>) -> Self {
        self.number_format = Some(code.into());
        self
    }

    /// True for the workbook default (General, no fill, no border)
    pub fn is_default(&self) -> bool {
        *self == Style::default()
    }
}

/// Whether a number format code renders a calendar date
///
/// Quoted literals, bracketed sections (`[Red]`, `[$-409]`) and escaped
/// characters are skipped. Time-only formats (`h:mm`) are not dates.
pub fn is_date_format(code: &str) -> bool {
    let mut in_quotes = false;
    let mut in_brackets = false;
    let mut escaped = false;
    for c in code.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => in_quotes = !in_quotes,
            '[' if !in_quotes => in_brackets = true,
            ']' if !in_quotes => in_brackets = false,
            'd' | 'D' | 'y' | 'Y' if !in_quotes && !in_brackets => return true,
            _ => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_normalizes() {
        assert_eq!(Color::rgb("92d050"), Color::Rgb("FF92D050".into()));
        assert_eq!(Color::rgb("#92D050"), Color::Rgb("FF92D050".into()));
        assert_eq!(Color::rgb("FF00B0F0").as_argb(), Some("FF00B0F0"));
    }

    #[test]
    fn copy_respects_exclusions() {
        let source = Style::default()
            .with_fill(Fill::Solid(Color::rgb("92D050")))
            .with_border(Border::thin_box())
            .with_alignment(Alignment::centered());
        let mut target = Style::default().with_number_format("d-mmm");

        target.copy_from(&source, &[StyleFacet::Fill, StyleFacet::NumberFormat]);

        assert_eq!(target.fill, Fill::Empty);
        assert_eq!(target.border, Border::thin_box());
        assert_eq!(target.alignment, Alignment::centered());
        assert_eq!(target.number_format.as_deref(), Some("d-mmm"));
    }

    #[test]
    fn fill_visibility() {
        assert!(!Fill::Empty.is_visible());
        assert!(Fill::Solid(Color::Auto).is_visible());
        let none = Fill::Pattern {
            pattern: "none".into(),
            fg: None,
            bg: None,
        };
        assert!(!none.is_visible());
    }

    #[test]
    fn date_format_detection() {
        assert!(is_date_format("d-mmm-yy"));
        assert!(is_date_format("[$-409]dd/mm/yyyy"));
        assert!(is_date_format("mm-dd-yy"));
        assert!(!is_date_format("h:mm:ss"));
        assert!(!is_date_format("0.0%"));
        assert!(!is_date_format("\"day\" 0"));
        assert!(!is_date_format("General"));
    }
}
