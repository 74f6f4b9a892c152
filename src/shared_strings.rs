//! Workbook-wide shared string table (`xl/sharedStrings.xml`).

use std::collections::HashMap;
use std::rc::Rc;

use crate::xml::{escape_data_into, XmlWriter, NS_SPREADSHEETML};

/// One entry of the table. Rich entries hold pre-rendered `<r>` run XML.
#[derive(Debug, Clone, PartialEq)]
pub enum SharedString {
    Plain(Rc<str>),
    Rich(Rc<str>),
}

/// Interns strings to stable indices, first-seen order.
///
/// `count` tracks every reference (what Excel calls `count`), the vector
/// length is the `uniqueCount`.
#[derive(Debug, Default)]
pub struct SharedStrings {
    plain: HashMap<Rc<str>, u32>,
    rich: HashMap<Rc<str>, u32>,
    entries: Vec<SharedString>,
    count: u32,
}

impl SharedStrings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index for `text`, adding it on first sight.
    pub fn intern(&mut self, text: &str) -> u32 {
        self.count += 1;
        if let Some(&idx) = self.plain.get(text) {
            return idx;
        }
        let idx = self.entries.len() as u32;
        let key: Rc<str> = Rc::from(text);
        self.plain.insert(Rc::clone(&key), idx);
        self.entries.push(SharedString::Plain(key));
        idx
    }

    /// Index for a rich string given as its run XML.
    pub fn intern_rich(&mut self, runs_xml: &str) -> u32 {
        self.count += 1;
        if let Some(&idx) = self.rich.get(runs_xml) {
            return idx;
        }
        let idx = self.entries.len() as u32;
        let key: Rc<str> = Rc::from(runs_xml);
        self.rich.insert(Rc::clone(&key), idx);
        self.entries.push(SharedString::Rich(key));
        idx
    }

    pub fn get(&self, index: u32) -> Option<&SharedString> {
        self.entries.get(index as usize)
    }

    /// Plain text at `index`; rich strings have none.
    pub fn plain_text(&self, index: u32) -> Option<&str> {
        match self.get(index)? {
            SharedString::Plain(s) => Some(s),
            SharedString::Rich(_) => None,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn unique_count(&self) -> u32 {
        self.entries.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_xml(&self) -> Vec<u8> {
        let mut xml = XmlWriter::with_capacity(256 + self.entries.len() * 32);
        xml.declaration();
        let count = self.count.to_string();
        let unique = self.unique_count().to_string();
        xml.start_with(
            "sst",
            &[("xmlns", NS_SPREADSHEETML), ("count", &count), ("uniqueCount", &unique)],
        );
        for entry in &self.entries {
            match entry {
                SharedString::Plain(text) => {
                    xml.raw("<si>");
                    write_text_element(xml.buffer_mut(), text);
                    xml.raw("</si>");
                }
                SharedString::Rich(runs) => {
                    xml.raw("<si>");
                    xml.raw(runs);
                    xml.raw("</si>");
                }
            }
        }
        xml.end("sst");
        xml.into_bytes()
    }
}

/// `<t>` with `xml:space="preserve"` when leading/trailing whitespace
/// would otherwise be dropped, and control characters in `_xHHHH_` form.
pub(crate) fn write_text_element(buf: &mut Vec<u8>, text: &str) {
    let preserve = text.starts_with([' ', '\t', '\n']) || text.ends_with([' ', '\t', '\n']);
    if preserve {
        buf.extend_from_slice(b"<t xml:space=\"preserve\">");
    } else {
        buf.extend_from_slice(b"<t>");
    }
    let encoded = encode_control_chars(text);
    escape_data_into(encoded.as_bytes(), buf);
    buf.extend_from_slice(b"</t>");
}

fn encode_control_chars(text: &str) -> std::borrow::Cow<'_, str> {
    let needs = text
        .bytes()
        .any(|b| (b < 0x20 && b != b'\t' && b != b'\n') || b == b'_');
    if !needs {
        return std::borrow::Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if (c as u32) < 0x20 && c != '\t' && c != '\n' {
            out.push_str(&format!("_x{:04X}_", c as u32));
        } else if c == '_' && looks_like_escape(&chars[i..]) {
            // A literal "_xHHHH_" must itself be escaped.
            out.push_str("_x005F_");
        } else {
            out.push(c);
        }
        i += 1;
    }
    std::borrow::Cow::Owned(out)
}

fn looks_like_escape(chars: &[char]) -> bool {
    chars.len() >= 7
        && chars[1] == 'x'
        && chars[2..6].iter().all(|c| c.is_ascii_hexdigit())
        && chars[6] == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_dedupes_and_counts() {
        let mut sst = SharedStrings::new();
        assert_eq!(sst.intern("foo"), 0);
        assert_eq!(sst.intern("bar"), 1);
        assert_eq!(sst.intern("foo"), 0);
        assert_eq!(sst.count(), 3);
        assert_eq!(sst.unique_count(), 2);
        assert_eq!(sst.plain_text(1), Some("bar"));
    }

    #[test]
    fn test_rich_and_plain_do_not_collide() {
        let mut sst = SharedStrings::new();
        let plain = sst.intern("<r><t>x</t></r>");
        let rich = sst.intern_rich("<r><t>x</t></r>");
        assert_ne!(plain, rich);
        assert_eq!(sst.plain_text(rich), None);
    }

    #[test]
    fn test_sst_xml() {
        let mut sst = SharedStrings::new();
        sst.intern("Hello");
        sst.intern(" padded ");
        sst.intern("a & b");
        sst.intern("Hello");
        let xml = String::from_utf8(sst.to_xml()).unwrap();
        assert!(xml.contains("count=\"4\" uniqueCount=\"3\""));
        assert!(xml.contains("<si><t>Hello</t></si>"));
        assert!(xml.contains("<si><t xml:space=\"preserve\"> padded </t></si>"));
        assert!(xml.contains("<si><t>a &amp; b</t></si>"));
    }

    #[test]
    fn test_control_characters_are_encoded() {
        let mut buf = Vec::new();
        write_text_element(&mut buf, "a\u{1}b_x0041_");
        assert_eq!(String::from_utf8(buf).unwrap(), "<t>a_x0001_b_x005F_x0041_</t>");
    }
}
