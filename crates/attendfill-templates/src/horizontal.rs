//! Horizontal template: day numbers across row 1, statuses in row 2
//!
//! ```text
//!      A                    B  C  ...  AE   AF           AG
//!   1  Attendance title     1  2  ...  30   No.of days
//!   2  {{employeename}}     .  .  ...  .    {{totalpresent}}
//!   3                                       P            Present
//!   4                                       C            Comp-off
//! ```
//!
//! With 30 day columns the "No.of days" pair sits where day 31 would go.

use rust_xlsxwriter::{
    ConditionalFormatCell, ConditionalFormatCellRule, Format, FormatAlign, FormatBorder, Workbook,
};

use crate::{standard_legend, LegendSwatch, TemplateError};

/// Builder for a horizontal attendance template
#[derive(Clone, Debug)]
pub struct HorizontalTemplate {
    /// Number of day-number columns starting at column B
    pub day_columns: u16,
    pub title: String,
    pub legend: Vec<LegendSwatch>,
    /// Add conditional formatting that greys out ST/SU cells
    pub weekend_rules: bool,
    pub sheet_name: String,
}

impl Default for HorizontalTemplate {
    fn default() -> Self {
        Self {
            day_columns: 30,
            title: "Attendance Details for {{month}} - {{year}}".into(),
            legend: standard_legend(),
            weekend_rules: true,
            sheet_name: "Sheet1".into(),
        }
    }
}

struct Formats {
    title: Format,
    day_header: Format,
    name: Format,
    status: Format,
    count_header: Format,
    count_value: Format,
    description: Format,
    weekend_rule: Format,
}

impl HorizontalTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn day_columns(mut self, columns: u16) -> Self {
        self.day_columns = columns.clamp(1, 31);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn legend(mut self, legend: Vec<LegendSwatch>) -> Self {
        self.legend = legend;
        self
    }

    pub fn no_legend(mut self) -> Self {
        self.legend.clear();
        self
    }

    pub fn without_weekend_rules(mut self) -> Self {
        self.weekend_rules = false;
        self
    }

    fn formats() -> Formats {
        let boxed = Format::new().set_border(FormatBorder::Thin);
        Formats {
            title: Format::new()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_text_wrap(),
            day_header: boxed
                .clone()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_rotation(90),
            name: boxed
                .clone()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter),
            status: boxed
                .clone()
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter),
            count_header: boxed
                .clone()
                .set_background_color(0xBDD7EE)
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_text_wrap(),
            count_value: boxed
                .clone()
                .set_bold()
                .set_font_size(12)
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter),
            description: boxed.set_align(FormatAlign::Left).set_align(FormatAlign::VerticalCenter),
            weekend_rule: Format::new().set_background_color(0xD9D9D9),
        }
    }

    /// Generate the workbook bytes
    pub fn build(&self) -> Result<Vec<u8>, TemplateError> {
        let formats = Self::formats();
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(self.sheet_name.as_str())?;

        let last_day_col = self.day_columns;
        let count_col = last_day_col + 1;

        sheet.set_column_width(0, 25)?;
        for col in 1..=last_day_col {
            sheet.set_column_width(col, 5)?;
        }
        sheet.set_column_width(count_col, 12)?;
        sheet.set_column_width(count_col + 1, 15)?;

        sheet.write_with_format(0, 0, self.title.as_str(), &formats.title)?;
        sheet.write_with_format(1, 0, "{{employeename}}", &formats.name)?;

        for col in 1..=last_day_col {
            sheet.write_with_format(0, col, f64::from(col), &formats.day_header)?;
            sheet.write_blank(1, col, &formats.status)?;
        }

        sheet.write_with_format(0, count_col, "No.of days", &formats.count_header)?;
        sheet.write_with_format(1, count_col, "{{totalpresent}}", &formats.count_value)?;

        for (offset, swatch) in self.legend.iter().enumerate() {
            let row = 2 + offset as u32;
            let mut code_format = Format::new()
                .set_border(FormatBorder::Thin)
                .set_background_color(swatch.fill)
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter);
            if let Some(color) = swatch.font_color {
                code_format = code_format.set_font_color(color);
            }
            sheet.write_with_format(row, count_col, swatch.code.as_str(), &code_format)?;
            sheet.write_with_format(row, count_col + 1, swatch.description.as_str(), &formats.description)?;
        }

        if self.weekend_rules {
            for code in ["ST", "SU"] {
                let rule = ConditionalFormatCell::new()
                    .set_rule(ConditionalFormatCellRule::EqualTo(format!("\"{code}\"").as_str()))
                    .set_format(&formats.weekend_rule);
                sheet.add_conditional_format(1, 1, 1, last_day_col, &rule)?;
            }
        }

        Ok(workbook.save_to_buffer()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_zip_package() {
        let bytes = HorizontalTemplate::new().build().unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn day_columns_are_clamped() {
        assert_eq!(HorizontalTemplate::new().day_columns(40).day_columns, 31);
        assert_eq!(HorizontalTemplate::new().day_columns(0).day_columns, 1);
    }
}
