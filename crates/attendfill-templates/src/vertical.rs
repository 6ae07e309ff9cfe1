//! Vertical template: one row per day
//!
//! ```text
//!      A              B        C        D                    E       G   H
//!   1  Company Name   ___               Summary              Value   Legend
//!   2  Employee Name  ___               Total Days in Month  ___     P   Present
//!   3  Employee ID    ___               Total Present        ___     C   Comp-off
//!   4  Month          ___               Total Leave          ___     ...
//!   ...
//!   9  Date           Day      Status
//!  10  (data rows)
//! ```

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, FormatUnderline, Workbook};

use crate::{standard_legend, LegendSwatch, TemplateError};

/// Row (1-based) holding the Date/Day/Status header
pub const HEADER_ROW: u32 = 9;

const HEADER_LABELS: [&str; 4] = ["Company Name", "Employee Name", "Employee ID", "Month"];

const SUMMARY_LABELS: [&str; 7] = [
    "Total Days in Month",
    "Total Present",
    "Total Leave",
    "Total Comp-off",
    "Total Holiday",
    "Working Days",
    "Attendance %",
];

/// Builder for a vertical attendance template
#[derive(Clone, Debug)]
pub struct VerticalTemplate {
    /// Pre-formatted data rows below the header
    pub data_rows: u32,
    pub legend: Vec<LegendSwatch>,
    /// Signature line two rows below the data block
    pub footer: bool,
    pub sheet_name: String,
}

impl Default for VerticalTemplate {
    fn default() -> Self {
        Self {
            data_rows: 31,
            legend: standard_legend(),
            footer: true,
            sheet_name: "Attendance".into(),
        }
    }
}

impl VerticalTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data_rows(mut self, rows: u32) -> Self {
        self.data_rows = rows.max(1);
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

    pub fn no_footer(mut self) -> Self {
        self.footer = false;
        self
    }

    /// Row (1-based) of the signature line, if any
    pub fn footer_row(&self) -> Option<u32> {
        self.footer.then_some(HEADER_ROW + self.data_rows + 2)
    }

    /// Generate the workbook bytes
    pub fn build(&self) -> Result<Vec<u8>, TemplateError> {
        let label = Format::new().set_bold();
        let blank = Format::new().set_border_bottom(FormatBorder::Thin);
        let boxed = Format::new().set_border(FormatBorder::Thin);
        let table_header = boxed
            .clone()
            .set_bold()
            .set_background_color(0xFFF2CC)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter);
        let date_cell = boxed.clone().set_num_format("dd-mmm-yyyy").set_align(FormatAlign::Center);
        let day_cell = boxed.clone().set_align(FormatAlign::Center);
        let status_cell = boxed.clone().set_bold().set_align(FormatAlign::Center);

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(self.sheet_name.as_str())?;

        for (col, width) in [(0, 16), (1, 10), (2, 10), (3, 22), (4, 10), (5, 3), (6, 6), (7, 14)] {
            sheet.set_column_width(col, width)?;
        }

        // Header fields: label in A, value slot in B
        for (row, text) in HEADER_LABELS.iter().enumerate() {
            let row = row as u32;
            sheet.write_with_format(row, 0, *text, &label)?;
            sheet.write_blank(row, 1, &blank)?;
        }

        // Summary block: label in D, value slot in E
        sheet.write_with_format(0, 3, "Summary", &table_header)?;
        sheet.write_with_format(0, 4, "Value", &table_header)?;
        for (offset, text) in SUMMARY_LABELS.iter().enumerate() {
            let row = 1 + offset as u32;
            sheet.write_with_format(row, 3, *text, &boxed)?;
            sheet.write_blank(row, 4, &day_cell)?;
        }

        if !self.legend.is_empty() {
            sheet.write_with_format(0, 6, "Legend", &label)?;
        }
        for (offset, swatch) in self.legend.iter().enumerate() {
            let row = 1 + offset as u32;
            let mut code_format = boxed
                .clone()
                .set_bold()
                .set_background_color(swatch.fill)
                .set_align(FormatAlign::Center);
            if let Some(color) = swatch.font_color {
                code_format = code_format.set_font_color(color);
            }
            sheet.write_with_format(row, 6, swatch.code.as_str(), &code_format)?;
            sheet.write(row, 7, swatch.description.as_str())?;
        }

        let header = HEADER_ROW - 1;
        for (col, text) in ["Date", "Day", "Status"].into_iter().enumerate() {
            sheet.write_with_format(header, col as u16, text, &table_header)?;
        }
        for offset in 0..self.data_rows {
            let row = header + 1 + offset;
            sheet.write_blank(row, 0, &date_cell)?;
            sheet.write_blank(row, 1, &day_cell)?;
            sheet.write_blank(row, 2, &status_cell)?;
        }

        if let Some(footer) = self.footer_row() {
            let signature = Format::new().set_underline(FormatUnderline::Single);
            sheet.write_with_format(footer - 1, 0, "Employee Signature", &signature)?;
            sheet.write_with_format(footer - 1, 3, "Manager Signature", &signature)?;
        }

        Ok(workbook.save_to_buffer()?)
    }
}
