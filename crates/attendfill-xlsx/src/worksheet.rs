//! Worksheet parts
//!
//! Only `<sheetData>`, `<mergeCells>`, `<dimension>` and the conditional
//! formatting blocks are modelled. Every other element before or after the
//! cell grid is kept as raw XML and written back unchanged.

use attendfill_core::style::is_date_format;
use attendfill_core::{CellAddress, CellRange, Limits, Style};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::BTreeMap;
use std::ops::Range;

use crate::cell::{date_to_serial, serial_to_date, Cell, CellOrigin, CellValue};
use crate::styles::StyleTable;
use crate::xml::{attr, attr_u32, attrs, escape, local_name, splice, tag_start};
use crate::{SerializeError, TemplateParseError};

/// Raw XML after `</sheetData>`, split around the parts we rewrite
#[derive(Clone, Debug)]
enum Segment {
    Raw(String),
    MergeCells,
    ConditionalFormatting {
        raw: String,
        rules: usize,
    },
    /// `<extLst>` with the byte ranges of its conditional-formatting `<ext>`s
    Extensions {
        raw: String,
        cf_exts: Vec<Range<usize>>,
        ext_count: usize,
        rules: usize,
    },
}

/// One worksheet: a sparse cell grid plus preserved surroundings
#[derive(Clone, Debug)]
pub struct Worksheet {
    name: String,
    pub(crate) part: String,
    head: String,
    dimension: Option<Range<usize>>,
    cells: BTreeMap<(u32, u32), Cell>,
    rows: BTreeMap<u32, Vec<(String, String)>>,
    tail: Vec<Segment>,
    merges: Vec<CellRange>,
    default_style: Style,
}

impl Worksheet {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Style of a cell that has never been written
    pub fn default_style(&self) -> &Style {
        &self.default_style
    }

    // ------------------------------------------------------------------------
    // Cell access
    // ------------------------------------------------------------------------

    /// The cell at an address; absent cells come back empty with the default style
    pub fn cell(&self, addr: CellAddress) -> Cell {
        self.cells
            .get(&(addr.row, addr.col))
            .cloned()
            .unwrap_or_else(|| Cell::new(CellValue::Empty, self.default_style.clone()))
    }

    pub fn get(&self, addr: CellAddress) -> Option<&Cell> {
        self.cells.get(&(addr.row, addr.col))
    }

    pub fn value(&self, addr: CellAddress) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.get(addr).map_or(&EMPTY, |c| &c.value)
    }

    pub fn style(&self, addr: CellAddress) -> Style {
        self.get(addr)
            .map_or_else(|| self.default_style.clone(), |c| c.style.clone())
    }

    /// Trimmed text of a cell, empty for non-text cells
    pub fn text(&self, addr: CellAddress) -> &str {
        self.value(addr).as_text().map_or("", str::trim)
    }

    pub fn set_value(&mut self, addr: CellAddress, value: CellValue) {
        self.entry(addr).value = value;
    }

    pub fn set_style(&mut self, addr: CellAddress, style: Style) {
        self.entry(addr).style = style;
    }

    /// Remove value and style
    pub fn clear(&mut self, addr: CellAddress) {
        self.cells.remove(&(addr.row, addr.col));
    }

    /// Remove the value, keep the style
    pub fn clear_value(&mut self, addr: CellAddress) {
        if let Some(cell) = self.cells.get_mut(&(addr.row, addr.col)) {
            cell.value = CellValue::Empty;
        }
    }

    fn entry(&mut self, addr: CellAddress) -> &mut Cell {
        let default_style = &self.default_style;
        self.cells
            .entry((addr.row, addr.col))
            .or_insert_with(|| Cell::new(CellValue::Empty, default_style.clone()))
    }

    /// Stored cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = (CellAddress, &Cell)> {
        self.cells
            .iter()
            .map(|(&(row, col), cell)| (CellAddress::new(row, col), cell))
    }

    pub fn row_cells(&self, row: u32) -> impl Iterator<Item = (CellAddress, &Cell)> {
        self.cells
            .range((row, 0)..=(row, u32::MAX))
            .map(|(&(row, col), cell)| (CellAddress::new(row, col), cell))
    }

    /// Last row holding a non-empty value
    pub fn max_row(&self) -> u32 {
        self.cells
            .iter()
            .filter(|(_, c)| !c.is_empty())
            .map(|(&(row, _), _)| row)
            .max()
            .unwrap_or(0)
    }

    pub fn max_col(&self) -> u32 {
        self.cells
            .iter()
            .filter(|(_, c)| !c.is_empty())
            .map(|(&(_, col), _)| col)
            .max()
            .unwrap_or(0)
    }

    // ------------------------------------------------------------------------
    // Rows and merges
    // ------------------------------------------------------------------------

    pub fn merged_ranges(&self) -> &[CellRange] {
        &self.merges
    }

    pub fn merge_at(&self, addr: CellAddress) -> Option<CellRange> {
        self.merges.iter().copied().find(|m| m.contains(addr))
    }

    /// Custom row height, if the row sets one
    pub fn row_height(&self, row: u32) -> Option<f64> {
        self.rows
            .get(&row)?
            .iter()
            .find(|(k, _)| k == "ht")
            .and_then(|(_, v)| v.parse().ok())
    }

    /// Give `dst` the same row properties (height, row style) as `src`
    pub fn copy_row_format(&mut self, src: u32, dst: u32) {
        match self.rows.get(&src).cloned() {
            Some(props) => {
                self.rows.insert(dst, props);
            }
            None => {
                self.rows.remove(&dst);
            }
        }
    }

    /// Insert `count` empty rows before row `at`
    ///
    /// Cells, row properties and merged ranges at or below `at` move down;
    /// merges spanning `at` grow.
    pub fn insert_rows(&mut self, at: u32, count: u32) {
        if count == 0 {
            return;
        }
        let moved: Vec<((u32, u32), Cell)> = {
            let keys: Vec<(u32, u32)> = self.cells.range((at, 0)..).map(|(k, _)| *k).collect();
            keys.into_iter()
                .filter_map(|k| self.cells.remove(&k).map(|c| (k, c)))
                .collect()
        };
        for ((row, col), cell) in moved {
            self.cells.insert((row + count, col), cell);
        }

        let moved_rows: Vec<u32> = self.rows.range(at..).map(|(r, _)| *r).collect();
        for row in moved_rows.into_iter().rev() {
            if let Some(props) = self.rows.remove(&row) {
                self.rows.insert(row + count, props);
            }
        }

        for merge in &mut self.merges {
            if merge.first.row >= at {
                merge.first.row += count;
                merge.last.row += count;
            } else if merge.last.row >= at {
                merge.last.row += count;
            }
        }
    }

    // ------------------------------------------------------------------------
    // Conditional formatting
    // ------------------------------------------------------------------------

    /// Number of conditional formatting rules, including `x14` extension rules
    pub fn conditional_format_count(&self) -> usize {
        self.tail
            .iter()
            .map(|segment| match segment {
                Segment::ConditionalFormatting { rules, .. } | Segment::Extensions { rules, .. } => *rules,
                _ => 0,
            })
            .sum()
    }

    /// Remove every conditional formatting rule; returns how many were removed
    pub fn clear_conditional_formats(&mut self) -> usize {
        let removed = self.conditional_format_count();
        let mut tail = Vec::with_capacity(self.tail.len());
        for segment in std::mem::take(&mut self.tail) {
            match segment {
                Segment::ConditionalFormatting { .. } => {}
                Segment::Extensions {
                    raw,
                    cf_exts,
                    ext_count,
                    ..
                } if !cf_exts.is_empty() => {
                    if cf_exts.len() < ext_count {
                        let edits = cf_exts.into_iter().map(|r| (r, String::new())).collect();
                        tail.push(Segment::Raw(splice(&raw, edits)));
                    }
                }
                other => tail.push(other),
            }
        }
        self.tail = tail;
        removed
    }

    // ------------------------------------------------------------------------
    // Parsing
    // ------------------------------------------------------------------------

    pub(crate) fn parse(
        xml: &str,
        name: &str,
        part: &str,
        styles: &StyleTable,
        shared_strings: &[String],
        limits: &Limits,
        cell_budget: &mut usize,
    ) -> Result<Self, TemplateParseError> {
        let err = |message: String| TemplateParseError::Xml {
            part: part.to_string(),
            message,
        };

        let mut sheet = Worksheet {
            name: name.to_string(),
            part: part.to_string(),
            head: String::new(),
            dimension: None,
            cells: BTreeMap::new(),
            rows: BTreeMap::new(),
            tail: Vec::new(),
            merges: Vec::new(),
            default_style: styles.style(0),
        };

        let mut reader = Reader::from_str(xml);
        let mut depth = 0usize;
        let mut sheet_data: Option<Range<usize>> = None;
        let mut in_sheet_data = false;

        // Row and cell state inside <sheetData>
        let mut row_num = 0u32;
        let mut col_num = 0u32;
        let mut pending: Option<PendingCell> = None;
        let mut text_target = TextTarget::None;
        let mut in_phonetic = false;

        // Tail state
        let mut tail_cursor: Option<usize> = None;
        let mut child: Option<TailChild> = None;

        loop {
            let before = reader.buffer_position();
            let event = reader.read_event().map_err(|e| err(e.to_string()))?;
            let after = reader.buffer_position();

            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let empty = matches!(event, Event::Empty(_));
                    let lname = local_name(e);
                    let start = tag_start(xml, before, after);

                    if in_sheet_data {
                        match lname.as_str() {
                            "row" => {
                                row_num = attr_u32(e, "r").unwrap_or(row_num + 1);
                                col_num = 0;
                                let props: Vec<(String, String)> = attrs(e)
                                    .into_iter()
                                    .filter(|(k, _)| k != "r" && k != "spans")
                                    .collect();
                                if !props.is_empty() {
                                    sheet.rows.insert(row_num, props);
                                }
                            }
                            "c" => {
                                let addr = attr(e, "r")
                                    .and_then(|r| r.parse::<CellAddress>().ok())
                                    .unwrap_or(CellAddress::new(row_num.max(1), col_num + 1));
                                col_num = addr.col;
                                let cell = PendingCell {
                                    addr,
                                    xf: attr_u32(e, "s").unwrap_or(0),
                                    type_attr: attr(e, "t"),
                                    inner_start: after,
                                    v: None,
                                    f: None,
                                    inline: None,
                                };
                                if empty {
                                    sheet.push_cell(cell, String::new(), styles, shared_strings, limits, cell_budget)?;
                                } else {
                                    pending = Some(cell);
                                }
                            }
                            "v" if !empty => text_target = TextTarget::Value,
                            "f" => {
                                if let Some(cell) = pending.as_mut() {
                                    cell.f.get_or_insert_with(String::new);
                                }
                                if !empty {
                                    text_target = TextTarget::Formula;
                                }
                            }
                            "is" => {
                                if let Some(cell) = pending.as_mut() {
                                    cell.inline.get_or_insert_with(String::new);
                                }
                            }
                            "rPh" if !empty => in_phonetic = true,
                            "t" if !empty && !in_phonetic => text_target = TextTarget::Inline,
                            _ => {}
                        }
                    } else if depth == 1 {
                        match lname.as_str() {
                            "sheetData" if sheet_data.is_none() => {
                                if empty {
                                    sheet_data = Some(start..after);
                                    tail_cursor = Some(after);
                                } else {
                                    sheet_data = Some(start..start);
                                    in_sheet_data = true;
                                }
                            }
                            "dimension" if sheet_data.is_none() => {
                                sheet.dimension = Some(start..after);
                            }
                            _ if tail_cursor.is_some() => {
                                let mut c = TailChild::new(&lname, start);
                                if empty {
                                    c.end = after;
                                    sheet.finish_tail_child(xml, c, &mut tail_cursor);
                                } else {
                                    child = Some(c);
                                }
                            }
                            _ => {}
                        }
                    } else if let Some(c) = child.as_mut() {
                        c.observe_start(&lname, e, depth, start, empty, &mut sheet.merges);
                    }

                    if !empty {
                        depth += 1;
                    }
                }
                Event::End(ref e) => {
                    depth = depth.saturating_sub(1);
                    let lname = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    if in_sheet_data {
                        match lname.as_str() {
                            "sheetData" if depth == 1 => {
                                in_sheet_data = false;
                                if let Some(range) = sheet_data.as_mut() {
                                    range.end = after;
                                }
                                tail_cursor = Some(after);
                            }
                            "c" => {
                                if let Some(cell) = pending.take() {
                                    let inner_end = tag_start(xml, before, after);
                                    let inner = xml[cell.inner_start..inner_end].to_string();
                                    sheet.push_cell(cell, inner, styles, shared_strings, limits, cell_budget)?;
                                }
                            }
                            "v" | "f" | "t" => text_target = TextTarget::None,
                            "rPh" => in_phonetic = false,
                            _ => {}
                        }
                    } else if let Some(c) = child.as_mut() {
                        if depth == 1 {
                            if let Some(mut c) = child.take() {
                                c.end = after;
                                sheet.finish_tail_child(xml, c, &mut tail_cursor);
                            }
                        } else {
                            c.observe_end(&lname, depth, after);
                        }
                    }
                }
                Event::Text(ref t) if text_target != TextTarget::None => {
                    let text = t.unescape().map_err(|e| err(e.to_string()))?;
                    if let Some(cell) = pending.as_mut() {
                        cell.push_text(text_target, &text);
                    }
                }
                Event::CData(ref t) if text_target != TextTarget::None => {
                    let text = String::from_utf8_lossy(t).into_owned();
                    if let Some(cell) = pending.as_mut() {
                        cell.push_text(text_target, &text);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        let Some(data) = sheet_data else {
            return Err(err("worksheet has no <sheetData>".into()));
        };
        sheet.head = xml[..data.start].to_string();
        if let Some(cursor) = tail_cursor {
            sheet.tail.push(Segment::Raw(xml[cursor..].to_string()));
        }
        Ok(sheet)
    }

    fn push_cell(
        &mut self,
        cell: PendingCell,
        inner_xml: String,
        styles: &StyleTable,
        shared_strings: &[String],
        limits: &Limits,
        cell_budget: &mut usize,
    ) -> Result<(), TemplateParseError> {
        *cell_budget += 1;
        if *cell_budget > limits.max_cells {
            return Err(TemplateParseError::LimitExceeded(format!(
                "workbook has more than {} cells",
                limits.max_cells
            )));
        }
        let style = styles.style(cell.xf);
        let value = cell.decode(&style, shared_strings);
        let origin = CellOrigin {
            value: value.clone(),
            type_attr: cell.type_attr,
            inner_xml,
            xf: cell.xf,
            style: style.clone(),
        };
        self.cells.insert(
            (cell.addr.row, cell.addr.col),
            Cell {
                value,
                style,
                origin: Some(Box::new(origin)),
            },
        );
        Ok(())
    }

    fn finish_tail_child(&mut self, xml: &str, child: TailChild, cursor: &mut Option<usize>) {
        if let Some(from) = *cursor {
            if from < child.start {
                self.tail.push(Segment::Raw(xml[from..child.start].to_string()));
            }
        }
        let raw = xml[child.start..child.end].to_string();
        let segment = match child.name.as_str() {
            "mergeCells" => Segment::MergeCells,
            "conditionalFormatting" => Segment::ConditionalFormatting {
                raw,
                rules: child.rules,
            },
            "extLst" => Segment::Extensions {
                cf_exts: child
                    .cf_exts
                    .iter()
                    .map(|r| (r.start - child.start)..(r.end - child.start))
                    .collect(),
                ext_count: child.ext_count,
                rules: child.rules,
                raw,
            },
            _ => Segment::Raw(raw),
        };
        self.tail.push(segment);
        *cursor = Some(child.end);
    }

    // ------------------------------------------------------------------------
    // Writing
    // ------------------------------------------------------------------------

    pub(crate) fn serialize(&self, styles: &mut StyleTable) -> Result<String, SerializeError> {
        let mut out = String::with_capacity(self.head.len() + self.cells.len() * 48 + 1024);

        match &self.dimension {
            Some(range) => out.push_str(&splice(
                &self.head,
                vec![(range.clone(), format!(r#"<dimension ref="{}"/>"#, self.used_range()))],
            )),
            None => out.push_str(&self.head),
        }

        out.push_str("<sheetData>");
        let mut row_keys: Vec<u32> = self.rows.keys().copied().collect();
        row_keys.extend(self.cells.keys().map(|(row, _)| *row));
        row_keys.sort_unstable();
        row_keys.dedup();

        for row in row_keys {
            let mut body = String::new();
            for (addr, cell) in self.row_cells(row) {
                write_cell(&mut body, addr, cell, styles)?;
            }
            let props = self.rows.get(&row);
            if body.is_empty() && props.is_none() {
                continue;
            }
            out.push_str(&format!(r#"<row r="{row}""#));
            for (key, value) in props.into_iter().flatten() {
                out.push_str(&format!(r#" {key}="{}""#, escape(value)));
            }
            if body.is_empty() {
                out.push_str("/>");
            } else {
                out.push('>');
                out.push_str(&body);
                out.push_str("</row>");
            }
        }
        out.push_str("</sheetData>");

        for segment in &self.tail {
            match segment {
                Segment::Raw(raw) => out.push_str(raw),
                Segment::MergeCells if self.merges.is_empty() => {}
                Segment::MergeCells => {
                    out.push_str(&format!(r#"<mergeCells count="{}">"#, self.merges.len()));
                    for merge in &self.merges {
                        out.push_str(&format!(r#"<mergeCell ref="{merge}"/>"#));
                    }
                    out.push_str("</mergeCells>");
                }
                Segment::ConditionalFormatting { raw, .. } | Segment::Extensions { raw, .. } => {
                    out.push_str(raw);
                }
            }
        }
        Ok(out)
    }

    fn used_range(&self) -> String {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for &(row, col) in self.cells.keys() {
            bounds = Some(match bounds {
                None => (row, col, row, col),
                Some((r0, c0, r1, c1)) => (r0.min(row), c0.min(col), r1.max(row), c1.max(col)),
            });
        }
        match bounds {
            Some((r0, c0, r1, c1)) => {
                CellRange::new(CellAddress::new(r0, c0), CellAddress::new(r1, c1)).to_string()
            }
            None => "A1".to_string(),
        }
    }
}

fn write_cell(
    out: &mut String,
    addr: CellAddress,
    cell: &Cell,
    styles: &mut StyleTable,
) -> Result<(), SerializeError> {
    let xf = match &cell.origin {
        Some(origin) if origin.style == cell.style => origin.xf,
        _ => styles.intern(&cell.style),
    };
    let s_attr = if xf == 0 { String::new() } else { format!(r#" s="{xf}""#) };

    if let Some(origin) = cell.origin.as_ref().filter(|o| o.value == cell.value) {
        let t_attr = origin
            .type_attr
            .as_ref()
            .map(|t| format!(r#" t="{}""#, escape(t)))
            .unwrap_or_default();
        if origin.inner_xml.is_empty() {
            out.push_str(&format!(r#"<c r="{addr}"{s_attr}{t_attr}/>"#));
        } else {
            out.push_str(&format!(r#"<c r="{addr}"{s_attr}{t_attr}>{}</c>"#, origin.inner_xml));
        }
        return Ok(());
    }

    match &cell.value {
        CellValue::Empty => {
            if xf != 0 {
                out.push_str(&format!(r#"<c r="{addr}"{s_attr}/>"#));
            }
        }
        CellValue::Text(text) if text.is_empty() => {
            if xf != 0 {
                out.push_str(&format!(r#"<c r="{addr}"{s_attr}/>"#));
            }
        }
        CellValue::Text(text) => out.push_str(&format!(
            r#"<c r="{addr}"{s_attr} t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
            escape(text)
        )),
        CellValue::Number(n) if n.is_finite() => {
            out.push_str(&format!(r#"<c r="{addr}"{s_attr}><v>{n}</v></c>"#));
        }
        CellValue::Number(_) => {
            return Err(SerializeError::InvalidValue(format!("{addr}: number is not finite")));
        }
        CellValue::Date(date) => out.push_str(&format!(
            r#"<c r="{addr}"{s_attr}><v>{}</v></c>"#,
            date_to_serial(*date)
        )),
        CellValue::Bool(b) => out.push_str(&format!(
            r#"<c r="{addr}"{s_attr} t="b"><v>{}</v></c>"#,
            u8::from(*b)
        )),
        CellValue::Error(e) => out.push_str(&format!(
            r#"<c r="{addr}"{s_attr} t="e"><v>{}</v></c>"#,
            escape(e)
        )),
        CellValue::Formula { formula, cached } => {
            let numeric = cached.as_deref().is_some_and(|c| c.parse::<f64>().is_ok());
            let t_attr = if cached.is_some() && !numeric { r#" t="str""# } else { "" };
            let v = cached
                .as_deref()
                .map(|c| format!("<v>{}</v>", escape(c)))
                .unwrap_or_default();
            out.push_str(&format!(
                r#"<c r="{addr}"{s_attr}{t_attr}><f>{}</f>{v}</c>"#,
                escape(formula)
            ));
        }
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TextTarget {
    None,
    Value,
    Formula,
    Inline,
}

struct PendingCell {
    addr: CellAddress,
    xf: u32,
    type_attr: Option<String>,
    inner_start: usize,
    v: Option<String>,
    f: Option<String>,
    inline: Option<String>,
}

impl PendingCell {
    fn push_text(&mut self, target: TextTarget, text: &str) {
        let slot = match target {
            TextTarget::Value => &mut self.v,
            TextTarget::Formula => &mut self.f,
            TextTarget::Inline => &mut self.inline,
            TextTarget::None => return,
        };
        slot.get_or_insert_with(String::new).push_str(text);
    }

    fn decode(&self, style: &Style, shared_strings: &[String]) -> CellValue {
        let v = self.v.as_deref().map(str::trim);
        if let Some(formula) = &self.f {
            return CellValue::Formula {
                formula: formula.clone(),
                cached: self.v.clone(),
            };
        }
        match self.type_attr.as_deref() {
            Some("s") => v
                .and_then(|i| i.parse::<usize>().ok())
                .and_then(|i| shared_strings.get(i))
                .map_or(CellValue::Empty, |s| CellValue::Text(s.clone())),
            Some("inlineStr") => self
                .inline
                .clone()
                .map_or(CellValue::Empty, CellValue::Text),
            Some("str") => self.v.clone().map_or(CellValue::Empty, CellValue::Text),
            Some("b") => v.map_or(CellValue::Empty, |b| CellValue::Bool(b == "1" || b == "true")),
            Some("e") => v.map_or(CellValue::Empty, |e| CellValue::Error(e.to_string())),
            Some("d") => v
                .and_then(|d| chrono::NaiveDate::parse_from_str(d.get(..10).unwrap_or(d), "%Y-%m-%d").ok())
                .map_or_else(
                    || v.map_or(CellValue::Empty, |d| CellValue::Text(d.to_string())),
                    CellValue::Date,
                ),
            _ => match v.and_then(|n| n.parse::<f64>().ok()) {
                None => CellValue::Empty,
                Some(n) => {
                    let dated = style.number_format.as_deref().is_some_and(is_date_format);
                    match serial_to_date(n) {
                        Some(date) if dated => CellValue::Date(date),
                        _ => CellValue::Number(n),
                    }
                }
            },
        }
    }
}

/// A top-level element after `</sheetData>` being scanned
struct TailChild {
    name: String,
    start: usize,
    end: usize,
    rules: usize,
    ext_count: usize,
    cf_exts: Vec<Range<usize>>,
    current_ext: Option<(usize, bool)>,
}

impl TailChild {
    fn new(name: &str, start: usize) -> Self {
        Self {
            name: name.to_string(),
            start,
            end: start,
            rules: 0,
            ext_count: 0,
            cf_exts: Vec::new(),
            current_ext: None,
        }
    }

    fn observe_start(
        &mut self,
        name: &str,
        e: &quick_xml::events::BytesStart<'_>,
        depth: usize,
        start: usize,
        empty: bool,
        merges: &mut Vec<CellRange>,
    ) {
        match name {
            "cfRule" => {
                self.rules += 1;
                if let Some((_, cf)) = self.current_ext.as_mut() {
                    *cf = true;
                }
            }
            "mergeCell" if self.name == "mergeCells" => {
                if let Some(range) = attr(e, "ref").and_then(|r| r.parse::<CellRange>().ok()) {
                    merges.push(range);
                }
            }
            "ext" if depth == 2 && self.name == "extLst" => {
                self.ext_count += 1;
                if !empty {
                    self.current_ext = Some((start, false));
                }
            }
            "conditionalFormattings" => {
                if let Some((_, cf)) = self.current_ext.as_mut() {
                    *cf = true;
                }
            }
            _ => {}
        }
    }

    fn observe_end(&mut self, name: &str, depth: usize, after: usize) {
        if name == "ext" && depth == 2 {
            if let Some((start, true)) = self.current_ext.take() {
                self.cf_exts.push(start..after);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const STYLES: &str = concat!(
        r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        r#"<numFmts count="1"><numFmt numFmtId="164" formatCode="d-mmm"/></numFmts>"#,
        r#"<fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>"#,
        r#"<fills count="2"><fill><patternFill/></fill><fill><patternFill patternType="gray125"/></fill></fills>"#,
        r#"<borders count="1"><border/></borders>"#,
        r#"<cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>"#,
        r#"<xf numFmtId="164" fontId="0" fillId="0" borderId="0" applyNumberFormat="1"/></cellXfs>"#,
        r#"</styleSheet>"#
    );

    const SHEET: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
        r#"xmlns:x14="http://schemas.microsoft.com/office/spreadsheetml/2009/9/main">"#,
        r#"<dimension ref="A1:C3"/><sheetViews><sheetView workbookViewId="0"/></sheetViews>"#,
        r#"<sheetData>"#,
        r#"<row r="1" spans="1:3" ht="30" customHeight="1"><c r="A1" t="s"><v>0</v></c><c r="B1" s="1"><v>45962</v></c>"#,
        r#"<c r="C1" t="inlineStr"><is><r><t>Rich </t></r><r><rPr><b/></rPr><t>text</t></r></is></c></row>"#,
        r#"<row r="3"><c r="A3"><f>SUM(1,2)</f><v>3</v></c><c r="B3" t="b"><v>1</v></c><c r="C3" s="1"/></row>"#,
        r#"</sheetData>"#,
        r#"<mergeCells count="1"><mergeCell ref="A5:C5"/></mergeCells>"#,
        r#"<conditionalFormatting sqref="B2:AF2"><cfRule type="cellIs" dxfId="0" priority="1" operator="equal"><formula>"P"</formula></cfRule></conditionalFormatting>"#,
        r#"<pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/>"#,
        r#"<extLst><ext uri="{78C0D931-6437-407d-A8EE-F0AAD7539E65}"><x14:conditionalFormattings>"#,
        r#"<x14:conditionalFormatting><x14:cfRule type="expression" priority="2" id="{1}"/></x14:conditionalFormatting>"#,
        r#"</x14:conditionalFormattings></ext><ext uri="{CCE6A557-97BC-4b89-ADB6-D9C93CAAB3DF}"><x14:dataValidations count="0"/></ext></extLst>"#,
        r#"</worksheet>"#
    );

    fn load() -> (Worksheet, StyleTable) {
        let styles = StyleTable::parse(STYLES, "xl/styles.xml").unwrap();
        let mut budget = 0;
        let sheet = Worksheet::parse(
            SHEET,
            "Sheet1",
            "xl/worksheets/sheet1.xml",
            &styles,
            &["Attendance".to_string()],
            &Limits::default(),
            &mut budget,
        )
        .unwrap();
        (sheet, styles)
    }

    #[test]
    fn decodes_values() {
        let (sheet, _) = load();
        assert_eq!(sheet.text(CellAddress::new(1, 1)), "Attendance");
        assert_eq!(
            *sheet.value(CellAddress::new(1, 2)),
            CellValue::Date(chrono::NaiveDate::from_ymd_opt(2025, 11, 1).unwrap())
        );
        assert_eq!(sheet.text(CellAddress::new(1, 3)), "Rich text");
        assert_eq!(
            *sheet.value(CellAddress::new(3, 1)),
            CellValue::Formula {
                formula: "SUM(1,2)".into(),
                cached: Some("3".into())
            }
        );
        assert_eq!(*sheet.value(CellAddress::new(3, 2)), CellValue::Bool(true));
        assert_eq!(*sheet.value(CellAddress::new(9, 9)), CellValue::Empty);
        assert_eq!(sheet.row_height(1), Some(30.0));
        assert_eq!(sheet.merged_ranges().len(), 1);
        assert_eq!(sheet.conditional_format_count(), 2);
    }

    #[test]
    fn untouched_cells_keep_their_xml() {
        let (sheet, mut styles) = load();
        let xml = sheet.serialize(&mut styles).unwrap();
        assert!(xml.contains(r#"<c r="A1" t="s"><v>0</v></c>"#));
        assert!(xml.contains(r#"<r><rPr><b/></rPr><t>text</t></r>"#));
        assert!(xml.contains(r#"<dimension ref="A1:C3"/>"#));
        assert!(xml.contains(r#"<row r="1" ht="30" customHeight="1">"#));
        assert!(xml.contains("<pageMargins"));
        assert_eq!(styles.serialize().unwrap(), None);
    }

    #[test]
    fn cleared_conditional_formats_leave_other_extensions() {
        let (mut sheet, mut styles) = load();
        assert_eq!(sheet.clear_conditional_formats(), 2);
        assert_eq!(sheet.conditional_format_count(), 0);
        let xml = sheet.serialize(&mut styles).unwrap();
        assert!(!xml.contains("conditionalFormatting"));
        assert!(!xml.contains("cfRule"));
        assert!(xml.contains("x14:dataValidations"));
        assert!(xml.ends_with("</worksheet>"));
    }

    #[test]
    fn writes_new_values() {
        let (mut sheet, mut styles) = load();
        let a1 = CellAddress::new(1, 1);
        sheet.set_value(a1, CellValue::text("Tom & Jerry"));
        sheet.set_value(CellAddress::new(2, 4), CellValue::Number(12.5));
        let xml = sheet.serialize(&mut styles).unwrap();
        assert!(xml.contains(
            r#"<c r="A1" t="inlineStr"><is><t xml:space="preserve">Tom &amp; Jerry</t></is></c>"#
        ));
        assert!(xml.contains(r#"<row r="2"><c r="D2"><v>12.5</v></c></row>"#));
        assert!(xml.contains(r#"<dimension ref="A1:D3"/>"#));
    }

    #[test]
    fn insert_rows_shifts_cells_rows_and_merges() {
        let (mut sheet, _) = load();
        sheet.insert_rows(2, 2);
        assert_eq!(*sheet.value(CellAddress::new(5, 2)), CellValue::Bool(true));
        assert_eq!(sheet.text(CellAddress::new(1, 1)), "Attendance");
        assert_eq!(sheet.merged_ranges()[0].to_string(), "A7:C7");
        assert_eq!(sheet.row_height(1), Some(30.0));
    }
}
