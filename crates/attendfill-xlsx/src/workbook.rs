//! Workbook: the package, its style table and its worksheets

use attendfill_core::Limits;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::package::{
    Package, Relationship, CONTENT_TYPES, REL_CALC_CHAIN, REL_OFFICE_DOCUMENT, REL_SHARED_STRINGS,
    REL_STYLES, REL_WORKSHEET,
};
use crate::styles::StyleTable;
use crate::worksheet::Worksheet;
use crate::xml::{attr, local_name, set_attr, splice, tag_start};
use crate::{SerializeError, TemplateParseError};

const STYLES_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
const STYLES_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

/// An xlsx workbook loaded for in-place editing
#[derive(Clone, Debug)]
pub struct Workbook {
    package: Package,
    workbook_part: String,
    styles_part: String,
    styles: StyleTable,
    sheets: Vec<Worksheet>,
}

impl Workbook {
    /// Parse an xlsx package
    ///
    /// Fails on a corrupt archive, a missing workbook or worksheet part, and
    /// when any bound in `limits` is exceeded.
    pub fn load(bytes: &[u8], limits: &Limits) -> Result<Self, TemplateParseError> {
        let package = Package::read(bytes, limits)?;

        let workbook_part = package
            .relationships("")?
            .into_iter()
            .find(|r| r.rel_type.ends_with(REL_OFFICE_DOCUMENT))
            .map(|r| r.target)
            .unwrap_or_else(|| "xl/workbook.xml".to_string());
        let workbook_xml = package
            .text(&workbook_part)?
            .ok_or_else(|| TemplateParseError::MissingPart(workbook_part.clone()))?;
        let rels = package.relationships(&workbook_part)?;

        let styles_part = find_rel(&rels, REL_STYLES)
            .map(|r| r.target.clone())
            .unwrap_or_else(|| "xl/styles.xml".to_string());
        let styles = match package.text(&styles_part)? {
            Some(xml) => StyleTable::parse(&xml, &styles_part)?,
            None => StyleTable::minimal(),
        };

        let shared_strings = match find_rel(&rels, REL_SHARED_STRINGS) {
            Some(rel) => match package.text(&rel.target)? {
                Some(xml) => parse_shared_strings(&xml, &rel.target)?,
                None => Vec::new(),
            },
            None => Vec::new(),
        };

        let mut sheets = Vec::new();
        let mut cell_budget = 0usize;
        for (name, rel_id) in parse_sheet_list(&workbook_xml, &workbook_part)? {
            let Some(rel) = rels.iter().find(|r| r.id == rel_id) else {
                return Err(TemplateParseError::MissingPart(format!(
                    "relationship {rel_id} for sheet {name:?}"
                )));
            };
            if !rel.rel_type.ends_with(REL_WORKSHEET) {
                continue;
            }
            let xml = package
                .text(&rel.target)?
                .ok_or_else(|| TemplateParseError::MissingPart(rel.target.clone()))?;
            sheets.push(Worksheet::parse(
                &xml,
                &name,
                &rel.target,
                &styles,
                &shared_strings,
                limits,
                &mut cell_budget,
            )?);
        }
        if sheets.is_empty() {
            return Err(TemplateParseError::MissingPart("worksheet".into()));
        }

        Ok(Self {
            package,
            workbook_part,
            styles_part,
            styles,
            sheets,
        })
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(Worksheet::name).collect()
    }

    pub fn sheets(&self) -> &[Worksheet] {
        &self.sheets
    }

    pub fn sheet(&self, index: usize) -> Option<&Worksheet> {
        self.sheets.get(index)
    }

    pub fn sheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.sheets.get_mut(index)
    }

    pub fn sheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.sheets.iter().find(|s| s.name() == name)
    }

    /// The first worksheet; a loaded workbook always has one
    pub fn first_sheet(&self) -> &Worksheet {
        &self.sheets[0]
    }

    pub fn first_sheet_mut(&mut self) -> &mut Worksheet {
        &mut self.sheets[0]
    }

    /// Names of every part in the package
    pub fn part_names(&self) -> Vec<&str> {
        self.package.part_names().collect()
    }

    /// Serialize the workbook
    ///
    /// Worksheets are regenerated from the model and the style table gains
    /// any new styles; all other parts are copied byte-for-byte. The
    /// calculation chain is dropped and a full recalculation requested, so
    /// formulas over rewritten cells are refreshed when the file is opened.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SerializeError> {
        let mut package = self.package.clone();
        let mut styles = self.styles.clone();

        for sheet in &self.sheets {
            let xml = sheet.serialize(&mut styles)?;
            package.set(&sheet.part, xml.into_bytes());
        }

        if let Some(xml) = styles.serialize()? {
            package.set(&self.styles_part, xml.into_bytes());
            if styles.synthesized {
                register_styles(&mut package, &self.workbook_part, &self.styles_part)?;
            }
        }

        let rels = package
            .relationships(&self.workbook_part)
            .map_err(|e| SerializeError::Xml(e.to_string()))?;
        if let Some(calc_chain) = find_rel(&rels, REL_CALC_CHAIN) {
            let target = calc_chain.target.clone();
            package.purge(&target, &self.workbook_part)?;
        }

        let workbook_xml = package
            .text(&self.workbook_part)
            .map_err(|e| SerializeError::Xml(e.to_string()))?
            .ok_or_else(|| SerializeError::Xml(format!("{} disappeared", self.workbook_part)))?;
        package.set(&self.workbook_part, request_full_calc(&workbook_xml)?.into_bytes());

        package.write()
    }
}

fn find_rel<'a>(rels: &'a [Relationship], suffix: &str) -> Option<&'a Relationship> {
    rels.iter().find(|r| r.rel_type.ends_with(suffix))
}

/// `(name, r:id)` for every `<sheet>` in workbook order
fn parse_sheet_list(xml: &str, part: &str) -> Result<Vec<(String, String)>, TemplateParseError> {
    let mut reader = Reader::from_str(xml);
    let mut out = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e) | Event::Empty(e)) if local_name(&e) == "sheet" => {
                let name = attr(&e, "name").unwrap_or_default();
                let id = e
                    .attributes()
                    .flatten()
                    .find(|a| a.key.local_name().as_ref() == b"id")
                    .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()));
                if let Some(id) = id {
                    out.push((name, id));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(TemplateParseError::Xml {
                    part: part.to_string(),
                    message: e.to_string(),
                })
            }
            _ => {}
        }
    }
    Ok(out)
}

fn parse_shared_strings(xml: &str, part: &str) -> Result<Vec<String>, TemplateParseError> {
    let err = |message: String| TemplateParseError::Xml {
        part: part.to_string(),
        message,
    };
    let mut reader = Reader::from_str(xml);
    let mut out = Vec::new();
    let mut current: Option<String> = None;
    let mut in_t = false;
    let mut in_phonetic = false;
    loop {
        match reader.read_event().map_err(|e| err(e.to_string()))? {
            Event::Start(e) => match local_name(&e).as_str() {
                "si" => current = Some(String::new()),
                "rPh" => in_phonetic = true,
                "t" if !in_phonetic => in_t = true,
                _ => {}
            },
            Event::Empty(e) if local_name(&e) == "si" => out.push(String::new()),
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => out.push(current.take().unwrap_or_default()),
                b"rPh" => in_phonetic = false,
                b"t" => in_t = false,
                _ => {}
            },
            Event::Text(t) if in_t => {
                let text = t.unescape().map_err(|e| err(e.to_string()))?;
                if let Some(s) = current.as_mut() {
                    s.push_str(&text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(out)
}

/// Add `fullCalcOnLoad="1"` to `<calcPr>`, creating the element if needed
fn request_full_calc(xml: &str) -> Result<String, SerializeError> {
    let mut reader = Reader::from_str(xml);
    let mut after_sheets: Option<usize> = None;
    let mut after_defined_names: Option<usize> = None;
    loop {
        let before = reader.buffer_position();
        let event = reader
            .read_event()
            .map_err(|e| SerializeError::Xml(e.to_string()))?;
        let after = reader.buffer_position();
        match event {
            Event::Empty(ref e) | Event::Start(ref e) if local_name(e) == "calcPr" => {
                let start = tag_start(xml, before, after);
                let tag = set_attr(&xml[start..after], "fullCalcOnLoad", "1");
                return Ok(splice(xml, vec![(start..after, tag)]));
            }
            Event::End(ref e) if e.local_name().as_ref() == b"sheets" => after_sheets = Some(after),
            Event::Empty(ref e) if local_name(e) == "sheets" => after_sheets = Some(after),
            Event::End(ref e) if e.local_name().as_ref() == b"definedNames" => {
                after_defined_names = Some(after);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    match after_defined_names.or(after_sheets) {
        Some(at) => Ok(splice(xml, vec![(at..at, r#"<calcPr fullCalcOnLoad="1"/>"#.to_string())])),
        None => Ok(xml.to_string()),
    }
}

/// Declare a newly created styles part in the content types and workbook rels
fn register_styles(package: &mut Package, workbook_part: &str, styles_part: &str) -> Result<(), SerializeError> {
    if let Some(xml) = package
        .text(CONTENT_TYPES)
        .map_err(|e| SerializeError::Xml(e.to_string()))?
    {
        if !xml.contains(STYLES_CONTENT_TYPE) {
            let entry = format!(r#"<Override PartName="/{styles_part}" ContentType="{STYLES_CONTENT_TYPE}"/>"#);
            let updated = insert_before_close(&xml, "</Types>", &entry)?;
            package.set(CONTENT_TYPES, updated.into_bytes());
        }
    }
    let rels_part = crate::package::rels_part_for(workbook_part);
    if let Some(xml) = package
        .text(&rels_part)
        .map_err(|e| SerializeError::Xml(e.to_string()))?
    {
        let mut id = 1;
        while xml.contains(&format!("Id=\"rId{id}\"")) {
            id += 1;
        }
        let base = crate::package::parent_dir(workbook_part);
        let target = styles_part.strip_prefix(base.as_str()).unwrap_or(styles_part);
        let entry = format!(r#"<Relationship Id="rId{id}" Type="{STYLES_REL_TYPE}" Target="{target}"/>"#);
        let updated = insert_before_close(&xml, "</Relationships>", &entry)?;
        package.set(&rels_part, updated.into_bytes());
    }
    Ok(())
}

fn insert_before_close(xml: &str, close: &str, entry: &str) -> Result<String, SerializeError> {
    let at = xml
        .rfind(close)
        .ok_or_else(|| SerializeError::Xml(format!("missing {close}")))?;
    Ok(splice(xml, vec![(at..at, entry.to_string())]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_calc_is_added_after_defined_names() {
        let xml = r#"<workbook><sheets><sheet name="A" sheetId="1" r:id="rId1"/></sheets><definedNames><definedName name="x">A!$A$1</definedName></definedNames><extLst/></workbook>"#;
        let out = request_full_calc(xml).unwrap();
        assert!(out.contains(r#"</definedNames><calcPr fullCalcOnLoad="1"/><extLst/>"#));
    }

    #[test]
    fn full_calc_updates_existing_calc_pr() {
        let xml = r#"<workbook><sheets/><calcPr calcId="191029"/></workbook>"#;
        let out = request_full_calc(xml).unwrap();
        assert_eq!(
            out,
            r#"<workbook><sheets/><calcPr fullCalcOnLoad="1" calcId="191029"/></workbook>"#
        );
    }

    #[test]
    fn shared_strings_skip_phonetic_runs() {
        let xml = r#"<sst><si><t>Date</t></si><si><r><t>Sta</t></r><r><t>tus</t></r><rPh><t>x</t></rPh></si><si/></sst>"#;
        let strings = parse_shared_strings(xml, "xl/sharedStrings.xml").unwrap();
        assert_eq!(strings, vec!["Date", "Status", ""]);
    }
}
