//! Small XML helpers shared by the part parsers
//!
//! Parts are read with `quick-xml` events; writes are done by splicing
//! byte ranges of the original text so that everything the model does not
//! touch stays byte-identical.

use quick_xml::events::BytesStart;
use std::borrow::Cow;
use std::ops::Range;

/// Attribute value by qualified name (`r:id`, `count`, ...)
pub(crate) fn attr(e: &BytesStart<'_>, name: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name.as_bytes())
        .and_then(|a| a.unescape_value().ok().map(Cow::into_owned))
}

/// All attributes in document order
pub(crate) fn attrs(e: &BytesStart<'_>) -> Vec<(String, String)> {
    e.attributes()
        .flatten()
        .filter_map(|a| {
            let key = std::str::from_utf8(a.key.as_ref()).ok()?.to_string();
            let value = a.unescape_value().ok()?.into_owned();
            Some((key, value))
        })
        .collect()
}

pub(crate) fn attr_u32(e: &BytesStart<'_>, name: &str) -> Option<u32> {
    attr(e, name).and_then(|v| v.trim().parse().ok())
}

/// OOXML boolean attribute; absent means `default`
pub(crate) fn attr_bool(e: &BytesStart<'_>, name: &str, default: bool) -> bool {
    match attr(e, name).as_deref() {
        Some("0" | "false") => false,
        Some(_) => true,
        None => default,
    }
}

pub(crate) fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

pub(crate) fn escape(text: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(text)
}

/// Start offset of the tag inside `xml[from..to]`, skipping leading text
pub(crate) fn tag_start(xml: &str, from: usize, to: usize) -> usize {
    xml[from..to].find('<').map_or(from, |i| from + i)
}

/// Replace or insert an attribute inside a single start tag
pub(crate) fn set_attr(tag: &str, name: &str, value: &str) -> String {
    let needle = format!(" {name}=\"");
    if let Some(pos) = tag.find(&needle) {
        let value_start = pos + needle.len();
        if let Some(len) = tag[value_start..].find('"') {
            return format!(
                "{}{}{}",
                &tag[..value_start],
                escape(value),
                &tag[value_start + len..]
            );
        }
    }
    let insert_at = tag
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .filter(|&i| i > 0)
        .unwrap_or(tag.len());
    format!(
        "{} {name}=\"{}\"{}",
        &tag[..insert_at],
        escape(value),
        &tag[insert_at..]
    )
}

/// Apply non-overlapping edits (sorted by start) to `source`
pub(crate) fn splice(source: &str, mut edits: Vec<(Range<usize>, String)>) -> String {
    edits.sort_by_key(|(range, _)| range.start);
    let mut out = String::with_capacity(source.len() + 256);
    let mut cursor = 0;
    for (range, replacement) in edits {
        if range.start < cursor {
            continue;
        }
        out.push_str(&source[cursor..range.start]);
        out.push_str(&replacement);
        cursor = range.end;
    }
    out.push_str(&source[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_attr_replaces_and_inserts() {
        assert_eq!(
            set_attr(r#"<fonts count="2" x14ac:knownFonts="1">"#, "count", "3"),
            r#"<fonts count="3" x14ac:knownFonts="1">"#
        );
        assert_eq!(set_attr("<cellXfs>", "count", "1"), r#"<cellXfs count="1">"#);
        assert_eq!(set_attr("<calcPr/>", "fullCalcOnLoad", "1"), r#"<calcPr fullCalcOnLoad="1"/>"#);
    }

    #[test]
    fn splice_applies_in_order() {
        let out = splice(
            "abcdef",
            vec![(4..5, "E".into()), (0..1, "A".into()), (2..2, "+".into())],
        );
        assert_eq!(out, "Ab+cdEf");
    }
}
