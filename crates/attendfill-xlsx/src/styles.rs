//! Shared style table (`xl/styles.xml`)
//!
//! Fonts, fills, borders, number formats and cell formats (`cellXfs`) are
//! parsed into [`Style`] values. New styles are appended after the existing
//! entries, so every index the template already uses stays valid and an
//! untouched table is written back unchanged.

use attendfill_core::style::{Alignment, Border, BorderEdge, Color, Fill, Font, Style};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;
use std::ops::Range;

use crate::xml::{attr, attr_bool, attr_u32, escape, local_name, set_attr, splice, tag_start};
use crate::{SerializeError, TemplateParseError};

/// First id available for custom number formats
const FIRST_CUSTOM_NUM_FMT: u32 = 164;

/// Minimal stylesheet used when the package has none
pub(crate) const MINIMAL_STYLES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    r#"<fonts count="1"><font><sz val="11"/><name val="Calibri"/><family val="2"/></font></fonts>"#,
    r#"<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>"#,
    r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#,
    r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
    r#"<cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs>"#,
    r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
    r#"</styleSheet>"#
);

/// Built-in number format codes by id
pub(crate) fn builtin_num_fmt(id: u32) -> Option<&'static str> {
    Some(match id {
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "mm-dd-yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        37 => "#,##0 ;(#,##0)",
        38 => "#,##0 ;[Red](#,##0)",
        39 => "#,##0.00;(#,##0.00)",
        40 => "#,##0.00;[Red](#,##0.00)",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mmss.0",
        48 => "##0.0E+0",
        49 => "@",
        // Locale-dependent date formats
        27..=36 | 50..=58 => "yyyy-mm-dd",
        _ => return None,
    })
}

fn builtin_id_for(code: &str) -> Option<u32> {
    (1..=49).find(|&id| builtin_num_fmt(id) == Some(code) && !(27..=36).contains(&id))
}

#[derive(Clone, Debug)]
struct Xf {
    num_fmt_id: u32,
    font_id: usize,
    fill_id: usize,
    border_id: usize,
    style: Style,
}

/// Byte ranges of one collection element in the original XML
#[derive(Clone, Debug)]
struct Section {
    /// The start tag (or the whole element if it was self-closing)
    open: Range<usize>,
    self_closing: bool,
    /// Where new children are inserted
    insert_at: usize,
}

#[derive(Clone, Debug)]
pub(crate) struct StyleTable {
    source: String,
    fonts: Vec<Font>,
    fills: Vec<Fill>,
    borders: Vec<Border>,
    num_fmts: BTreeMap<u32, String>,
    xfs: Vec<Xf>,
    original: [usize; 4],
    original_num_fmts: usize,
    sections: BTreeMap<&'static str, Section>,
    /// End of the `<styleSheet ...>` start tag
    root_open_end: usize,
    pub synthesized: bool,
}

impl StyleTable {
    pub fn parse(xml: &str, part: &str) -> Result<Self, TemplateParseError> {
        let mut table = StyleTable {
            source: xml.to_string(),
            fonts: Vec::new(),
            fills: Vec::new(),
            borders: Vec::new(),
            num_fmts: BTreeMap::new(),
            xfs: Vec::new(),
            original: [0; 4],
            original_num_fmts: 0,
            sections: BTreeMap::new(),
            root_open_end: 0,
            synthesized: false,
        };

        let err = |message: String| TemplateParseError::Xml {
            part: part.to_string(),
            message,
        };

        let mut reader = Reader::from_str(xml);
        let mut path: Vec<String> = Vec::new();
        let mut font: Option<Font> = None;
        let mut fill: Option<FillBuilder> = None;
        let mut border: Option<Border> = None;
        let mut edge: Option<(String, BorderEdge)> = None;
        let mut xf: Option<(Xf, Alignment)> = None;
        let mut raw_fill_start: Option<usize> = None;

        loop {
            let before = reader.buffer_position();
            let event = reader.read_event().map_err(|e| err(e.to_string()))?;
            let after = reader.buffer_position();
            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let empty = matches!(event, Event::Empty(_));
                    let name = local_name(e);
                    let parent = path.last().map(String::as_str).unwrap_or("");
                    match (parent, name.as_str()) {
                        ("", "styleSheet") => table.root_open_end = after,
                        ("styleSheet", section @ ("numFmts" | "fonts" | "fills" | "borders" | "cellXfs")) => {
                            let start = tag_start(xml, before, after);
                            let key: &'static str = match section {
                                "numFmts" => "numFmts",
                                "fonts" => "fonts",
                                "fills" => "fills",
                                "borders" => "borders",
                                _ => "cellXfs",
                            };
                            table.sections.insert(
                                key,
                                Section {
                                    open: start..after,
                                    self_closing: empty,
                                    insert_at: after,
                                },
                            );
                        }
                        ("numFmts", "numFmt") => {
                            if let (Some(id), Some(code)) = (attr_u32(e, "numFmtId"), attr(e, "formatCode")) {
                                table.num_fmts.insert(id, code);
                            }
                        }
                        ("fonts", "font") => {
                            font = Some(Font::default());
                        }
                        ("font", child) => {
                            if let Some(f) = font.as_mut() {
                                apply_font_child(f, child, e);
                            }
                        }
                        ("fills", "fill") => {
                            fill = Some(FillBuilder::default());
                            raw_fill_start = Some(tag_start(xml, before, after));
                        }
                        ("fill", "patternFill") => {
                            if let Some(f) = fill.as_mut() {
                                f.pattern = Some(attr(e, "patternType").unwrap_or_else(|| "none".into()));
                            }
                        }
                        ("fill", "gradientFill") => {
                            if let Some(f) = fill.as_mut() {
                                f.gradient = true;
                            }
                        }
                        ("patternFill", "fgColor") => {
                            if let Some(f) = fill.as_mut() {
                                f.fg = parse_color(e);
                            }
                        }
                        ("patternFill", "bgColor") => {
                            if let Some(f) = fill.as_mut() {
                                f.bg = parse_color(e);
                            }
                        }
                        ("borders", "border") => border = Some(Border::default()),
                        ("border", side @ ("left" | "right" | "top" | "bottom")) => {
                            if let Some(style) = attr(e, "style") {
                                edge = Some((side.to_string(), BorderEdge { style, color: None }));
                                if empty {
                                    if let (Some(b), Some((side, edge))) = (border.as_mut(), edge.take()) {
                                        set_edge(b, &side, edge);
                                    }
                                }
                            }
                        }
                        ("left" | "right" | "top" | "bottom", "color") => {
                            if let Some((_, edge)) = edge.as_mut() {
                                edge.color = parse_color(e);
                            }
                        }
                        ("cellXfs", "xf") => {
                            let new_xf = Xf {
                                num_fmt_id: attr_u32(e, "numFmtId").unwrap_or(0),
                                font_id: attr_u32(e, "fontId").unwrap_or(0) as usize,
                                fill_id: attr_u32(e, "fillId").unwrap_or(0) as usize,
                                border_id: attr_u32(e, "borderId").unwrap_or(0) as usize,
                                style: Style::default(),
                            };
                            if empty {
                                table.xfs.push(new_xf);
                            } else {
                                xf = Some((new_xf, Alignment::default()));
                            }
                        }
                        ("xf", "alignment") => {
                            if let Some((_, alignment)) = xf.as_mut() {
                                *alignment = parse_alignment(e);
                            }
                        }
                        _ => {}
                    }
                    if !empty {
                        path.push(name);
                    } else if name == "font" && parent == "fonts" {
                        if let Some(f) = font.take() {
                            table.fonts.push(f);
                        }
                    } else if name == "fill" && parent == "fills" {
                        table.fills.push(Fill::Empty);
                        fill = None;
                    } else if name == "border" && parent == "borders" {
                        if let Some(b) = border.take() {
                            table.borders.push(b);
                        }
                    }
                }
                Event::End(ref e) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    path.pop();
                    let parent = path.last().map(String::as_str).unwrap_or("");
                    match (parent, name.as_str()) {
                        ("styleSheet", section) => {
                            let key = match section {
                                "numFmts" => Some("numFmts"),
                                "fonts" => Some("fonts"),
                                "fills" => Some("fills"),
                                "borders" => Some("borders"),
                                "cellXfs" => Some("cellXfs"),
                                _ => None,
                            };
                            if let Some(s) = key.and_then(|k| table.sections.get_mut(k)) {
                                s.insert_at = tag_start(xml, before, after);
                            }
                        }
                        ("fonts", "font") => {
                            if let Some(f) = font.take() {
                                table.fonts.push(f);
                            }
                        }
                        ("fills", "fill") => {
                            if let Some(f) = fill.take() {
                                let raw = raw_fill_start
                                    .take()
                                    .map(|start| xml[start..after].to_string())
                                    .unwrap_or_default();
                                table.fills.push(f.build(raw));
                            }
                        }
                        ("border", "left" | "right" | "top" | "bottom") => {
                            if let (Some(b), Some((side, edge))) = (border.as_mut(), edge.take()) {
                                set_edge(b, &side, edge);
                            }
                        }
                        ("borders", "border") => {
                            if let Some(b) = border.take() {
                                table.borders.push(b);
                            }
                        }
                        ("cellXfs", "xf") => {
                            if let Some((mut x, alignment)) = xf.take() {
                                x.style.alignment = alignment;
                                table.xfs.push(x);
                            }
                        }
                        _ => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if table.fonts.is_empty() {
            table.fonts.push(Font::default());
        }
        if table.xfs.is_empty() {
            return Err(err("stylesheet has no cellXfs".into()));
        }
        table.original = [
            table.fonts.len(),
            table.fills.len(),
            table.borders.len(),
            table.xfs.len(),
        ];
        table.original_num_fmts = table.num_fmts.len();
        for index in 0..table.xfs.len() {
            let alignment = table.xfs[index].style.alignment.clone();
            let resolved = table.compose(&table.xfs[index], alignment);
            table.xfs[index].style = resolved;
        }
        Ok(table)
    }

    pub fn minimal() -> Self {
        let mut table = match Self::parse(MINIMAL_STYLES, "xl/styles.xml") {
            Ok(table) => table,
            Err(_) => unreachable!("built-in stylesheet parses"),
        };
        table.synthesized = true;
        table
    }

    fn compose(&self, xf: &Xf, alignment: Alignment) -> Style {
        Style {
            fill: self.fills.get(xf.fill_id).cloned().unwrap_or_default(),
            font: self.fonts.get(xf.font_id).cloned().unwrap_or_default(),
            border: self.borders.get(xf.border_id).cloned().unwrap_or_default(),
            alignment,
            number_format: self.num_fmt_code(xf.num_fmt_id),
        }
    }

    fn num_fmt_code(&self, id: u32) -> Option<String> {
        if id == 0 {
            return None;
        }
        self.num_fmts
            .get(&id)
            .cloned()
            .or_else(|| builtin_num_fmt(id).map(str::to_string))
    }

    /// Resolved style of a cell format index
    pub fn style(&self, xf: u32) -> Style {
        self.xfs
            .get(xf as usize)
            .or_else(|| self.xfs.first())
            .map(|x| x.style.clone())
            .unwrap_or_default()
    }

    /// Cell format index for a style, appending entries as needed
    pub fn intern(&mut self, style: &Style) -> u32 {
        let mut style = style.clone();
        if style.font.name.is_none() {
            let base = self.fonts.first().cloned().unwrap_or_default();
            style.font.name = base.name;
            style.font.size = style.font.size.or(base.size);
            style.font.family = style.font.family.or(base.family);
            style.font.scheme = style.font.scheme.or(base.scheme);
        }
        if let Some(index) = self.xfs.iter().position(|x| x.style == style) {
            return index as u32;
        }

        let font_id = find_or_push(&mut self.fonts, &style.font);
        let fill_id = find_or_push(&mut self.fills, &style.fill);
        let border_id = find_or_push(&mut self.borders, &style.border);
        let num_fmt_id = match style.number_format.as_deref() {
            None | Some("General") => 0,
            Some(code) => builtin_id_for(code)
                .or_else(|| {
                    self.num_fmts
                        .iter()
                        .find(|(_, c)| c.as_str() == code)
                        .map(|(id, _)| *id)
                })
                .unwrap_or_else(|| {
                    let id = self
                        .num_fmts
                        .keys()
                        .max()
                        .map_or(FIRST_CUSTOM_NUM_FMT, |max| (max + 1).max(FIRST_CUSTOM_NUM_FMT));
                    self.num_fmts.insert(id, code.to_string());
                    id
                }),
        };

        self.xfs.push(Xf {
            num_fmt_id,
            font_id,
            fill_id,
            border_id,
            style,
        });
        (self.xfs.len() - 1) as u32
    }

    fn is_modified(&self) -> bool {
        self.original
            != [
                self.fonts.len(),
                self.fills.len(),
                self.borders.len(),
                self.xfs.len(),
            ]
            || self.num_fmts.len() != self.original_num_fmts
    }

    /// The stylesheet XML, or `None` when nothing was appended
    pub fn serialize(&self) -> Result<Option<String>, SerializeError> {
        if !self.is_modified() && !self.synthesized {
            return Ok(None);
        }
        let mut edits: Vec<(Range<usize>, String)> = Vec::new();

        if self.num_fmts.len() != self.original_num_fmts {
            let body: String = self
                .num_fmts
                .iter()
                .map(|(id, code)| format!(r#"<numFmt numFmtId="{id}" formatCode="{}"/>"#, escape(code)))
                .collect();
            let element = format!(r#"<numFmts count="{}">{body}</numFmts>"#, self.num_fmts.len());
            match self.sections.get("numFmts") {
                // Rewrite the whole collection; custom formats keep their ids
                Some(section) => {
                    let end = if section.self_closing {
                        section.open.end
                    } else {
                        self.source[section.insert_at..]
                            .find('>')
                            .map_or(section.insert_at, |i| section.insert_at + i + 1)
                    };
                    edits.push((section.open.start..end, element));
                }
                None => edits.push((self.root_open_end..self.root_open_end, element)),
            }
        }

        let [fonts, fills, borders, xfs] = self.original;
        self.section_edit(&mut edits, "fonts", self.fonts.len(), self.fonts[fonts..].iter().map(font_xml))?;
        self.section_edit(&mut edits, "fills", self.fills.len(), self.fills[fills..].iter().map(fill_xml))?;
        self.section_edit(
            &mut edits,
            "borders",
            self.borders.len(),
            self.borders[borders..].iter().map(border_xml),
        )?;
        self.section_edit(&mut edits, "cellXfs", self.xfs.len(), self.xfs[xfs..].iter().map(xf_xml))?;

        Ok(Some(splice(&self.source, edits)))
    }

    fn section_edit(
        &self,
        edits: &mut Vec<(Range<usize>, String)>,
        key: &str,
        count: usize,
        added: impl Iterator<Item = String>,
    ) -> Result<(), SerializeError> {
        let body: String = added.collect();
        if body.is_empty() {
            return Ok(());
        }
        let section = self
            .sections
            .get(key)
            .ok_or_else(|| SerializeError::Xml(format!("stylesheet has no <{key}> collection")))?;
        let open_tag = &self.source[section.open.clone()];
        if section.self_closing {
            let open = set_attr(open_tag.trim_end_matches("/>"), "count", &count.to_string());
            edits.push((section.open.clone(), format!("{open}>{body}</{key}>")));
        } else {
            edits.push((section.open.clone(), set_attr(open_tag, "count", &count.to_string())));
            edits.push((section.insert_at..section.insert_at, body));
        }
        Ok(())
    }
}

fn find_or_push<T: Clone + PartialEq>(items: &mut Vec<T>, item: &T) -> usize {
    match items.iter().position(|existing| existing == item) {
        Some(index) => index,
        None => {
            items.push(item.clone());
            items.len() - 1
        }
    }
}

// ============================================================================
// Parsing
// ============================================================================

#[derive(Default)]
struct FillBuilder {
    pattern: Option<String>,
    fg: Option<Color>,
    bg: Option<Color>,
    gradient: bool,
}

impl FillBuilder {
    fn build(self, raw: String) -> Fill {
        if self.gradient {
            return Fill::Other(raw);
        }
        match self.pattern.as_deref() {
            None | Some("none") => Fill::Empty,
            Some("solid") if self.fg.is_some() => Fill::Solid(self.fg.unwrap_or(Color::Auto)),
            Some(pattern) => Fill::Pattern {
                pattern: pattern.to_string(),
                fg: self.fg,
                bg: self.bg,
            },
        }
    }
}

fn parse_color(e: &BytesStart<'_>) -> Option<Color> {
    if let Some(rgb) = attr(e, "rgb") {
        return Some(Color::rgb(&rgb));
    }
    if let Some(theme) = attr_u32(e, "theme") {
        let tint = attr(e, "tint").and_then(|t| t.parse().ok());
        return Some(Color::Theme { theme, tint });
    }
    if let Some(indexed) = attr_u32(e, "indexed") {
        return Some(Color::Indexed(indexed));
    }
    attr_bool(e, "auto", false).then_some(Color::Auto)
}

fn apply_font_child(font: &mut Font, child: &str, e: &BytesStart<'_>) {
    match child {
        "b" => font.bold = attr_bool(e, "val", true),
        "i" => font.italic = attr_bool(e, "val", true),
        "strike" => font.strike = attr_bool(e, "val", true),
        "u" => font.underline = Some(attr(e, "val").unwrap_or_else(|| "single".into())),
        "sz" => font.size = attr(e, "val").and_then(|v| v.parse().ok()),
        "color" => font.color = parse_color(e),
        "name" | "rFont" => font.name = attr(e, "val"),
        "family" => font.family = attr_u32(e, "val"),
        "scheme" => font.scheme = attr(e, "val"),
        _ => {}
    }
}

fn set_edge(border: &mut Border, side: &str, edge: BorderEdge) {
    match side {
        "left" => border.left = Some(edge),
        "right" => border.right = Some(edge),
        "top" => border.top = Some(edge),
        _ => border.bottom = Some(edge),
    }
}

fn parse_alignment(e: &BytesStart<'_>) -> Alignment {
    Alignment {
        horizontal: attr(e, "horizontal"),
        vertical: attr(e, "vertical"),
        wrap_text: attr_bool(e, "wrapText", false),
        text_rotation: attr_u32(e, "textRotation").filter(|r| *r != 0),
        indent: attr_u32(e, "indent").filter(|i| *i != 0),
        shrink_to_fit: attr_bool(e, "shrinkToFit", false),
    }
}

// ============================================================================
// Writing
// ============================================================================

fn color_xml(tag: &str, color: &Color) -> String {
    match color {
        Color::Rgb(argb) => format!(r#"<{tag} rgb="{}"/>"#, escape(argb)),
        Color::Theme { theme, tint: Some(tint) } => format!(r#"<{tag} theme="{theme}" tint="{tint}"/>"#),
        Color::Theme { theme, tint: None } => format!(r#"<{tag} theme="{theme}"/>"#),
        Color::Indexed(i) => format!(r#"<{tag} indexed="{i}"/>"#),
        Color::Auto => format!(r#"<{tag} auto="1"/>"#),
    }
}

fn font_xml(font: &Font) -> String {
    let mut out = String::from("<font>");
    if font.bold {
        out.push_str("<b/>");
    }
    if font.italic {
        out.push_str("<i/>");
    }
    if font.strike {
        out.push_str("<strike/>");
    }
    if let Some(u) = &font.underline {
        out.push_str(&format!(r#"<u val="{}"/>"#, escape(u)));
    }
    if let Some(size) = font.size {
        out.push_str(&format!(r#"<sz val="{size}"/>"#));
    }
    if let Some(color) = &font.color {
        out.push_str(&color_xml("color", color));
    }
    if let Some(name) = &font.name {
        out.push_str(&format!(r#"<name val="{}"/>"#, escape(name)));
    }
    if let Some(family) = font.family {
        out.push_str(&format!(r#"<family val="{family}"/>"#));
    }
    if let Some(scheme) = &font.scheme {
        out.push_str(&format!(r#"<scheme val="{}"/>"#, escape(scheme)));
    }
    out.push_str("</font>");
    out
}

fn fill_xml(fill: &Fill) -> String {
    match fill {
        Fill::Empty => r#"<fill><patternFill patternType="none"/></fill>"#.to_string(),
        Fill::Solid(color) => format!(
            r#"<fill><patternFill patternType="solid">{}<bgColor indexed="64"/></patternFill></fill>"#,
            color_xml("fgColor", color)
        ),
        Fill::Pattern { pattern, fg, bg } => {
            let fg = fg.as_ref().map(|c| color_xml("fgColor", c)).unwrap_or_default();
            let bg = bg.as_ref().map(|c| color_xml("bgColor", c)).unwrap_or_default();
            format!(
                r#"<fill><patternFill patternType="{}">{fg}{bg}</patternFill></fill>"#,
                escape(pattern)
            )
        }
        Fill::Other(raw) => raw.clone(),
    }
}

fn border_xml(border: &Border) -> String {
    let edge = |tag: &str, edge: &Option<BorderEdge>| match edge {
        Some(e) => {
            let color = e.color.as_ref().map(|c| color_xml("color", c)).unwrap_or_default();
            format!(r#"<{tag} style="{}">{color}</{tag}>"#, escape(&e.style))
        }
        None => format!("<{tag}/>"),
    };
    format!(
        "<border>{}{}{}{}<diagonal/></border>",
        edge("left", &border.left),
        edge("right", &border.right),
        edge("top", &border.top),
        edge("bottom", &border.bottom)
    )
}

fn xf_xml(xf: &Xf) -> String {
    let a = &xf.style.alignment;
    let mut out = format!(
        r#"<xf numFmtId="{}" fontId="{}" fillId="{}" borderId="{}" xfId="0" applyNumberFormat="1" applyFont="1" applyFill="1" applyBorder="1""#,
        xf.num_fmt_id, xf.font_id, xf.fill_id, xf.border_id
    );
    if *a == Alignment::default() {
        out.push_str("/>");
        return out;
    }
    out.push_str(r#" applyAlignment="1"><alignment"#);
    if let Some(h) = &a.horizontal {
        out.push_str(&format!(r#" horizontal="{}""#, escape(h)));
    }
    if let Some(v) = &a.vertical {
        out.push_str(&format!(r#" vertical="{}""#, escape(v)));
    }
    if let Some(r) = a.text_rotation {
        out.push_str(&format!(r#" textRotation="{r}""#));
    }
    if a.wrap_text {
        out.push_str(r#" wrapText="1""#);
    }
    if let Some(i) = a.indent {
        out.push_str(&format!(r#" indent="{i}""#));
    }
    if a.shrink_to_fit {
        out.push_str(r#" shrinkToFit="1""#);
    }
    out.push_str("/></xf>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8"?>"#,
        r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        r#"<numFmts count="1"><numFmt numFmtId="164" formatCode="d\-mmm"/></numFmts>"#,
        r#"<fonts count="2"><font><sz val="11"/><name val="Calibri"/></font>"#,
        r#"<font><b/><sz val="11"/><color rgb="FF006100"/><name val="Calibri"/></font></fonts>"#,
        r#"<fills count="3"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill>"#,
        r#"<fill><patternFill patternType="solid"><fgColor rgb="FF92D050"/><bgColor indexed="64"/></patternFill></fill></fills>"#,
        r#"<borders count="2"><border><left/><right/><top/><bottom/><diagonal/></border>"#,
        r#"<border><left style="thin"><color indexed="64"/></left><right style="thin"/><top style="thin"/><bottom style="thin"/><diagonal/></border></borders>"#,
        r#"<cellXfs count="3"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#,
        r#"<xf numFmtId="0" fontId="1" fillId="2" borderId="1" xfId="0"><alignment horizontal="center" textRotation="90"/></xf>"#,
        r#"<xf numFmtId="164" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs>"#,
        r#"</styleSheet>"#
    );

    #[test]
    fn resolves_existing_formats() {
        let table = StyleTable::parse(SAMPLE, "xl/styles.xml").unwrap();
        let green = table.style(1);
        assert_eq!(green.fill, Fill::Solid(Color::rgb("92D050")));
        assert!(green.font.bold);
        assert_eq!(green.alignment.text_rotation, Some(90));
        assert_eq!(
            green.border.left.as_ref().and_then(|e| e.color.clone()),
            Some(Color::Indexed(64))
        );
        assert!(green.border.right.is_some());
        assert_eq!(table.style(2).number_format.as_deref(), Some("d\\-mmm"));
        assert_eq!(table.style(99), table.style(0));
    }

    #[test]
    fn unchanged_table_is_not_rewritten() {
        let mut table = StyleTable::parse(SAMPLE, "xl/styles.xml").unwrap();
        let existing = table.style(1);
        assert_eq!(table.intern(&existing), 1);
        assert_eq!(table.serialize().unwrap(), None);
    }

    #[test]
    fn new_styles_are_appended() {
        let mut table = StyleTable::parse(SAMPLE, "xl/styles.xml").unwrap();
        let orange = table
            .style(1)
            .with_fill(Fill::Solid(Color::rgb("FFC000")))
            .with_number_format("dd/mm/yyyy");
        let index = table.intern(&orange);
        assert_eq!(index, 3);
        assert_eq!(table.intern(&orange), 3);

        let xml = table.serialize().unwrap().unwrap();
        assert!(xml.contains(r#"<fills count="4">"#));
        assert!(xml.contains(r#"<cellXfs count="4">"#));
        assert!(xml.contains(r#"<fonts count="2">"#));
        assert!(xml.contains(r#"<numFmt numFmtId="165" formatCode="dd/mm/yyyy"/>"#));
        assert!(xml.contains(r#"<numFmt numFmtId="164" formatCode="d\-mmm"/>"#));

        let reparsed = StyleTable::parse(&xml, "xl/styles.xml").unwrap();
        assert_eq!(reparsed.style(3), table.style(3));
        assert_eq!(reparsed.style(1), table.style(1));
    }

    #[test]
    fn builtin_formats_reuse_ids() {
        let mut table = StyleTable::parse(SAMPLE, "xl/styles.xml").unwrap();
        let dated = table.style(0).with_number_format("d-mmm-yy");
        let index = table.intern(&dated);
        assert_eq!(table.xfs[index as usize].num_fmt_id, 15);
    }
}
