//! OPC package: the zip container and its relationship graph

use attendfill_core::Limits;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read, Write};
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::{CompressionMethod, ZipArchive};

use crate::xml::{attr, local_name, splice, tag_start};
use crate::{SerializeError, TemplateParseError};

pub(crate) const CONTENT_TYPES: &str = "[Content_Types].xml";
pub(crate) const REL_OFFICE_DOCUMENT: &str = "/officeDocument";
pub(crate) const REL_WORKSHEET: &str = "/worksheet";
pub(crate) const REL_STYLES: &str = "/styles";
pub(crate) const REL_SHARED_STRINGS: &str = "/sharedStrings";
pub(crate) const REL_CALC_CHAIN: &str = "/calcChain";

/// One relationship from a `.rels` part
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Relationship {
    pub id: String,
    pub rel_type: String,
    /// Resolved absolute part name (no leading slash)
    pub target: String,
}

/// All parts of the package, in archive order
#[derive(Clone, Debug, Default)]
pub(crate) struct Package {
    parts: Vec<(String, Vec<u8>)>,
}

impl Package {
    pub fn read(bytes: &[u8], limits: &Limits) -> Result<Self, TemplateParseError> {
        if bytes.len() > limits.max_template_bytes {
            return Err(TemplateParseError::LimitExceeded(format!(
                "template is {} bytes, limit is {}",
                bytes.len(),
                limits.max_template_bytes
            )));
        }
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| TemplateParseError::Archive(e.to_string()))?;
        if archive.len() > limits.max_zip_entries {
            return Err(TemplateParseError::LimitExceeded(format!(
                "package has {} entries, limit is {}",
                archive.len(),
                limits.max_zip_entries
            )));
        }

        let mut parts = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let file = archive
                .by_index(index)
                .map_err(|e| TemplateParseError::Archive(e.to_string()))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            if file.size() > limits.max_part_bytes {
                return Err(TemplateParseError::LimitExceeded(format!(
                    "part {name} expands to {} bytes, limit is {}",
                    file.size(),
                    limits.max_part_bytes
                )));
            }
            let mut data = Vec::new();
            // The header size can lie; never read past the bound
            file.take(limits.max_part_bytes + 1)
                .read_to_end(&mut data)
                .map_err(|e| TemplateParseError::Archive(format!("{name}: {e}")))?;
            if data.len() as u64 > limits.max_part_bytes {
                return Err(TemplateParseError::LimitExceeded(format!(
                    "part {name} exceeds {} bytes",
                    limits.max_part_bytes
                )));
            }
            parts.push((name, data));
        }
        Ok(Self { parts })
    }

    pub fn write(&self) -> Result<Vec<u8>, SerializeError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        // Fixed timestamps keep the output a pure function of the input
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());
        for (name, data) in &self.parts {
            writer
                .start_file(name.as_str(), options)
                .map_err(|e| SerializeError::Archive(e.to_string()))?;
            writer.write_all(data)?;
        }
        let cursor = writer
            .finish()
            .map_err(|e| SerializeError::Archive(e.to_string()))?;
        Ok(cursor.into_inner())
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, data)| data.as_slice())
    }

    pub fn text(&self, name: &str) -> Result<Option<String>, TemplateParseError> {
        self.get(name)
            .map(|data| {
                String::from_utf8(strip_bom(data).to_vec()).map_err(|_| TemplateParseError::Xml {
                    part: name.to_string(),
                    message: "part is not UTF-8".into(),
                })
            })
            .transpose()
    }

    pub fn set(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some(entry) => entry.1 = data,
            None => self.parts.push((name.to_string(), data)),
        }
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.parts.len();
        self.parts.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        before != self.parts.len()
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(n, _)| n.as_str())
    }

    /// Relationships declared by `source` (`""` for the package root)
    pub fn relationships(&self, source: &str) -> Result<Vec<Relationship>, TemplateParseError> {
        let rels_name = rels_part_for(source);
        let Some(xml) = self.text(&rels_name)? else {
            return Ok(Vec::new());
        };
        let base = parent_dir(source);
        let mut reader = Reader::from_str(&xml);
        let mut out = Vec::new();
        loop {
            match reader.read_event() {
                Ok(Event::Start(e) | Event::Empty(e)) if local_name(&e) == "Relationship" => {
                    if attr(&e, "TargetMode").as_deref() == Some("External") {
                        continue;
                    }
                    let (Some(id), Some(rel_type), Some(target)) =
                        (attr(&e, "Id"), attr(&e, "Type"), attr(&e, "Target"))
                    else {
                        continue;
                    };
                    out.push(Relationship {
                        id,
                        rel_type,
                        target: resolve_target(&base, &target),
                    });
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(TemplateParseError::Xml {
                        part: rels_name,
                        message: e.to_string(),
                    })
                }
                _ => {}
            }
        }
        Ok(out)
    }

    /// Drop a part together with its content-type override and the
    /// relationship pointing at it from `owner`
    pub fn purge(&mut self, part: &str, owner: &str) -> Result<(), SerializeError> {
        if !self.remove(part) {
            return Ok(());
        }
        let abs = format!("/{part}");
        if let Some(xml) = self.text(CONTENT_TYPES).map_err(|e| SerializeError::Xml(e.to_string()))? {
            let updated = remove_elements(&xml, "Override", |e| {
                attr(e, "PartName").is_some_and(|p| p.eq_ignore_ascii_case(&abs))
            })?;
            self.set(CONTENT_TYPES, updated.into_bytes());
        }
        let rels_name = rels_part_for(owner);
        if let Some(xml) = self.text(&rels_name).map_err(|e| SerializeError::Xml(e.to_string()))? {
            let base = parent_dir(owner);
            let updated = remove_elements(&xml, "Relationship", |e| {
                attr(e, "Target").is_some_and(|t| resolve_target(&base, &t).eq_ignore_ascii_case(part))
            })?;
            self.set(&rels_name, updated.into_bytes());
        }
        Ok(())
    }
}

fn strip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data)
}

/// `xl/workbook.xml` -> `xl/_rels/workbook.xml.rels`
pub(crate) fn rels_part_for(source: &str) -> String {
    match source.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None if source.is_empty() => "_rels/.rels".to_string(),
        None => format!("_rels/{source}.rels"),
    }
}

pub(crate) fn parent_dir(part: &str) -> String {
    part.rsplit_once('/')
        .map(|(dir, _)| format!("{dir}/"))
        .unwrap_or_default()
}

/// Resolve a relationship target against the source part's directory
pub(crate) fn resolve_target(base_dir: &str, target: &str) -> String {
    let joined = match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("{base_dir}{target}"),
    };
    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Remove every element named `name` (start..end or empty) matching `pred`
pub(crate) fn remove_elements(
    xml: &str,
    name: &str,
    pred: impl Fn(&quick_xml::events::BytesStart<'_>) -> bool,
) -> Result<String, SerializeError> {
    let mut reader = Reader::from_str(xml);
    let mut edits = Vec::new();
    let mut open: Option<usize> = None;
    loop {
        let before = reader.buffer_position();
        match reader.read_event() {
            Ok(Event::Empty(e)) if local_name(&e) == name && pred(&e) => {
                let start = tag_start(xml, before, reader.buffer_position());
                edits.push((start..reader.buffer_position(), String::new()));
            }
            Ok(Event::Start(e)) if local_name(&e) == name && pred(&e) => {
                open = Some(tag_start(xml, before, reader.buffer_position()));
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == name.as_bytes() => {
                if let Some(start) = open.take() {
                    edits.push((start..reader.buffer_position(), String::new()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(SerializeError::Xml(e.to_string())),
            _ => {}
        }
    }
    Ok(splice(xml, edits))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rels_names() {
        assert_eq!(rels_part_for(""), "_rels/.rels");
        assert_eq!(rels_part_for("xl/workbook.xml"), "xl/_rels/workbook.xml.rels");
    }

    #[test]
    fn targets_resolve_relative_and_absolute() {
        assert_eq!(resolve_target("xl/", "worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(resolve_target("xl/", "/xl/styles.xml"), "xl/styles.xml");
        assert_eq!(resolve_target("xl/worksheets/", "../drawings/d1.xml"), "xl/drawings/d1.xml");
        assert_eq!(resolve_target("", "xl/workbook.xml"), "xl/workbook.xml");
    }

    #[test]
    fn remove_elements_drops_matching_only() {
        let xml = r#"<Types><Override PartName="/xl/calcChain.xml" ContentType="a"/><Override PartName="/xl/styles.xml" ContentType="b"/></Types>"#;
        let out = remove_elements(xml, "Override", |e| {
            attr(e, "PartName").as_deref() == Some("/xl/calcChain.xml")
        })
        .unwrap();
        assert_eq!(out, r#"<Types><Override PartName="/xl/styles.xml" ContentType="b"/></Types>"#);
    }
}
