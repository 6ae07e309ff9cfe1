//! Fill configuration
//!
//! All layout heuristics, fallbacks and parsing bounds live in one immutable
//! [`FillConfig`] passed to every fill call. Every field has a default, so a
//! TOML file only needs the keys it overrides:
//!
//! ```toml
//! [orientation]
//! day_threshold = 7
//!
//! [placeholders]
//! company = "C2"
//!
//! [styles.L]
//! fill = "F4B084"
//! font_color = "000000"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::address::CellAddress;
use crate::style::{Color, Fill, Font, Style};
use crate::StatusCode;

/// Error loading a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

// ============================================================================
// Sections
// ============================================================================

/// Layout detection thresholds
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientationConfig {
    /// A row with more than this many day numbers is a day-header row
    pub day_threshold: usize,
    /// Layout assumed when a vertical template has no recognizable header
    pub vertical: VerticalDefaults,
}

impl Default for OrientationConfig {
    fn default() -> Self {
        Self {
            day_threshold: 5,
            vertical: VerticalDefaults::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerticalDefaults {
    pub header_row: u32,
    pub data_start_row: u32,
    pub date_col: u32,
    pub day_col: u32,
    pub status_col: u32,
}

impl Default for VerticalDefaults {
    fn default() -> Self {
        Self {
            header_row: 9,
            data_start_row: 10,
            date_col: 1,
            day_col: 2,
            status_col: 3,
        }
    }
}

/// Legend scan window for horizontal templates
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendConfig {
    pub first_row: u32,
    pub last_row: u32,
}

impl Default for LegendConfig {
    fn default() -> Self {
        Self {
            first_row: 3,
            last_row: 11,
        }
    }
}

/// Fixed fallback cells for header fields
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderConfig {
    pub company: Option<CellAddress>,
    pub employee_name: Option<CellAddress>,
    pub employee_id: Option<CellAddress>,
    pub period: Option<CellAddress>,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            company: Some(CellAddress::new(2, 2)),
            employee_name: Some(CellAddress::new(3, 2)),
            employee_id: Some(CellAddress::new(4, 2)),
            period: Some(CellAddress::new(5, 2)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Number of rows from the top of the sheet searched for summary labels
    pub scan_rows: u32,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self { scan_rows: 20 }
    }
}

/// Number formats used when the template does not supply one
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateFormats {
    pub header: String,
    pub vertical: String,
}

impl Default for DateFormats {
    fn default() -> Self {
        Self {
            header: "d-mmm-yy".into(),
            vertical: "dd-mmm-yyyy".into(),
        }
    }
}

/// Bounds applied while loading a template package
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_template_bytes: usize,
    pub max_zip_entries: usize,
    pub max_part_bytes: u64,
    pub max_cells: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_template_bytes: 20 * 1024 * 1024,
            max_zip_entries: 2_000,
            max_part_bytes: 64 * 1024 * 1024,
            max_cells: 1_000_000,
        }
    }
}

/// Fill and font of a status code, as hex RGB
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StyleSpec {
    pub fill: String,
    pub font_color: String,
    #[serde(default = "default_bold")]
    pub bold: bool,
}

fn default_bold() -> bool {
    true
}

impl StyleSpec {
    pub fn new(fill: &str, font_color: &str) -> Self {
        Self {
            fill: fill.to_string(),
            font_color: font_color.to_string(),
            bold: true,
        }
    }

    pub fn to_style(&self) -> Style {
        Style::default()
            .with_fill(Fill::Solid(Color::rgb(&self.fill)))
            .with_font(Font {
                bold: self.bold,
                color: Some(Color::rgb(&self.font_color)),
                ..Default::default()
            })
    }

    fn validate(&self, code: &str) -> Result<(), ConfigError> {
        for hex in [&self.fill, &self.font_color] {
            let digits = hex.trim_start_matches('#');
            if !matches!(digits.len(), 6 | 8) || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(ConfigError::InvalidValue(format!(
                    "styles.{code}: {hex:?} is not a hex color"
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// FillConfig
// ============================================================================

/// Immutable per-call configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillConfig {
    pub orientation: OrientationConfig,
    pub legend: LegendConfig,
    pub placeholders: PlaceholderConfig,
    pub summary: SummaryConfig,
    pub date_formats: DateFormats,
    pub limits: Limits,
    /// Fill applied to weekend cells when the legend has no weekend style
    pub weekend_fill: String,
    /// Built-in style per status code, used where the legend is silent
    pub styles: BTreeMap<String, StyleSpec>,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            orientation: OrientationConfig::default(),
            legend: LegendConfig::default(),
            placeholders: PlaceholderConfig::default(),
            summary: SummaryConfig::default(),
            date_formats: DateFormats::default(),
            limits: Limits::default(),
            weekend_fill: "BFBFBF".into(),
            styles: default_style_table(),
        }
    }
}

impl FillConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document; missing keys keep their defaults
    ///
    /// Style entries are merged over the built-in table, so a file that
    /// overrides `L` still gets defaults for the other codes.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let mut config: FillConfig = toml::from_str(text)?;
        let mut merged = default_style_table();
        merged.append(&mut config.styles);
        config.styles = merged;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.legend.first_row == 0 || self.legend.first_row > self.legend.last_row {
            return Err(ConfigError::InvalidValue(format!(
                "legend rows {}..={} are not a valid window",
                self.legend.first_row, self.legend.last_row
            )));
        }
        let v = &self.orientation.vertical;
        if v.header_row == 0 || v.data_start_row <= v.header_row {
            return Err(ConfigError::InvalidValue(
                "vertical data rows must start below the header row".into(),
            ));
        }
        if [v.date_col, v.day_col, v.status_col].contains(&0) {
            return Err(ConfigError::InvalidValue("column indices are 1-based".into()));
        }
        for (code, spec) in &self.styles {
            if code.parse::<StatusCode>().is_err() {
                return Err(ConfigError::InvalidValue(format!(
                    "styles.{code}: unknown status code"
                )));
            }
            spec.validate(code)?;
        }
        StyleSpec::new(&self.weekend_fill, "000000").validate("weekend_fill")?;
        Ok(())
    }

    /// Built-in style for a status code
    pub fn default_style(&self, code: StatusCode) -> Style {
        self.styles
            .get(code.as_str())
            .map(StyleSpec::to_style)
            .unwrap_or_else(|| code.builtin_style().to_style())
    }

    pub fn weekend_fill(&self) -> Fill {
        Fill::Solid(Color::rgb(&self.weekend_fill))
    }
}

/// The default status style table
pub fn default_style_table() -> BTreeMap<String, StyleSpec> {
    StatusCode::ALL
        .iter()
        .map(|code| (code.as_str().to_string(), code.builtin_style()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_documented_values() {
        let config = FillConfig::default();
        assert_eq!(config.orientation.day_threshold, 5);
        assert_eq!(config.legend.first_row, 3);
        assert_eq!(config.legend.last_row, 11);
        assert_eq!(config.summary.scan_rows, 20);
        assert_eq!(config.placeholders.company, Some(CellAddress::new(2, 2)));
        assert_eq!(config.styles.len(), StatusCode::ALL.len());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn toml_overrides_merge_with_defaults() {
        let config = FillConfig::from_toml_str(
            r#"
            weekend_fill = "D9D9D9"

            [orientation]
            day_threshold = 7

            [placeholders]
            company = "C2"

            [styles.L]
            fill = "F4B084"
            font_color = "000000"
            "#,
        )
        .unwrap();

        assert_eq!(config.orientation.day_threshold, 7);
        assert_eq!(config.orientation.vertical.header_row, 9);
        assert_eq!(config.placeholders.company, Some(CellAddress::new(2, 3)));
        assert_eq!(config.placeholders.employee_name, Some(CellAddress::new(3, 2)));
        assert_eq!(config.styles["L"].fill, "F4B084");
        assert_eq!(config.styles["P"].fill, "92D050");
        assert_eq!(
            config.weekend_fill(),
            Fill::Solid(Color::Rgb("FFD9D9D9".into()))
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert!(FillConfig::from_toml_str("[styles.X]\nfill = \"000000\"\nfont_color = \"000000\"").is_err());
        assert!(FillConfig::from_toml_str("[styles.P]\nfill = \"green\"\nfont_color = \"000000\"").is_err());
        assert!(FillConfig::from_toml_str("[legend]\nfirst_row = 12\nlast_row = 3").is_err());
        assert!(FillConfig::from_toml_str("[placeholders]\ncompany = \"not a cell\"").is_err());
    }

    #[test]
    fn default_style_for_leave() {
        let style = FillConfig::default().default_style(StatusCode::Leave);
        assert_eq!(style.fill, Fill::Solid(Color::Rgb("FFFFC000".into())));
        assert!(style.font.bold);
        assert_eq!(style.font.color, Some(Color::Rgb("FF9C0006".into())));
    }
}
