//! Byte-buffer XML writing shared by every part generator, plus the
//! package plumbing parts (`[Content_Types].xml` and `.rels` files).

pub(crate) const XML_DECLARATION: &[u8] =
    b"<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";

pub(crate) const NS_SPREADSHEETML: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
pub(crate) const NS_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(crate) const NS_PACKAGE_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
pub(crate) const NS_DRAWINGML: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub(crate) const NS_CHART: &str = "http://schemas.openxmlformats.org/drawingml/2006/chart";
pub(crate) const NS_SPREADSHEET_DRAWING: &str =
    "http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing";

/// SIMD-accelerated escaping for element text.
#[inline(always)]
pub fn escape_data_into(input: &[u8], output: &mut Vec<u8>) {
    if memchr::memchr3(b'&', b'<', b'>', input).is_none() {
        output.extend_from_slice(input);
        return;
    }

    let mut last = 0;
    for (pos, &byte) in input.iter().enumerate() {
        let escape: &[u8] = match byte {
            b'&' => b"&amp;",
            b'<' => b"&lt;",
            b'>' => b"&gt;",
            _ => continue,
        };
        output.extend_from_slice(&input[last..pos]);
        output.extend_from_slice(escape);
        last = pos + 1;
    }
    output.extend_from_slice(&input[last..]);
}

/// SIMD-accelerated escaping for attribute values.
#[inline(always)]
pub fn escape_attr_into(input: &[u8], output: &mut Vec<u8>) {
    let needs_escape = memchr::memchr3(b'&', b'<', b'>', input).is_some()
        || memchr::memchr2(b'"', b'\n', input).is_some();

    if !needs_escape {
        output.extend_from_slice(input);
        return;
    }

    let mut last = 0;
    for (pos, &byte) in input.iter().enumerate() {
        let escape: &[u8] = match byte {
            b'&' => b"&amp;",
            b'<' => b"&lt;",
            b'>' => b"&gt;",
            b'"' => b"&quot;",
            b'\n' => b"&#xA;",
            _ => continue,
        };
        output.extend_from_slice(&input[last..pos]);
        output.extend_from_slice(escape);
        last = pos + 1;
    }
    output.extend_from_slice(&input[last..]);
}

pub fn escape_data(input: &str) -> String {
    let mut out = Vec::with_capacity(input.len() + 8);
    escape_data_into(input.as_bytes(), &mut out);
    String::from_utf8(out).unwrap_or_default()
}

pub fn escape_attr(input: &str) -> String {
    let mut out = Vec::with_capacity(input.len() + 8);
    escape_attr_into(input.as_bytes(), &mut out);
    String::from_utf8(out).unwrap_or_default()
}

/// Growable XML buffer. Tag and attribute names are trusted, values are
/// escaped on the way in.
#[derive(Debug, Default)]
pub(crate) struct XmlWriter {
    buf: Vec<u8>,
}

impl XmlWriter {
    pub fn new() -> Self {
        Self { buf: Vec::with_capacity(4096) }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: Vec::with_capacity(capacity) }
    }

    pub fn declaration(&mut self) {
        self.buf.extend_from_slice(XML_DECLARATION);
    }

    #[inline]
    fn open(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.buf.push(b'<');
        self.buf.extend_from_slice(tag.as_bytes());
        for (key, value) in attrs {
            self.buf.push(b' ');
            self.buf.extend_from_slice(key.as_bytes());
            self.buf.extend_from_slice(b"=\"");
            escape_attr_into(value.as_bytes(), &mut self.buf);
            self.buf.push(b'"');
        }
    }

    pub fn start(&mut self, tag: &str) {
        self.start_with(tag, &[]);
    }

    pub fn start_with(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.open(tag, attrs);
        self.buf.push(b'>');
    }

    pub fn empty(&mut self, tag: &str) {
        self.empty_with(tag, &[]);
    }

    pub fn empty_with(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.open(tag, attrs);
        self.buf.extend_from_slice(b"/>");
    }

    /// `<tag val="value"/>`, the most common shape in DrawingML.
    pub fn val(&mut self, tag: &str, value: &str) {
        self.empty_with(tag, &[("val", value)]);
    }

    pub fn end(&mut self, tag: &str) {
        self.buf.extend_from_slice(b"</");
        self.buf.extend_from_slice(tag.as_bytes());
        self.buf.push(b'>');
    }

    pub fn data(&mut self, tag: &str, text: &str) {
        self.data_with(tag, &[], text);
    }

    pub fn data_with(&mut self, tag: &str, attrs: &[(&str, &str)], text: &str) {
        self.start_with(tag, attrs);
        escape_data_into(text.as_bytes(), &mut self.buf);
        self.end(tag);
    }

    pub fn text(&mut self, text: &str) {
        escape_data_into(text.as_bytes(), &mut self.buf);
    }

    pub fn raw(&mut self, xml: &str) {
        self.buf.extend_from_slice(xml.as_bytes());
    }

    pub fn buffer_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn into_string(self) -> String {
        String::from_utf8(self.buf)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
    }
}

// ============================================================================
// Relationships
// ============================================================================

#[derive(Debug, Clone)]
struct Relationship {
    rel_type: String,
    target: String,
    external: bool,
}

/// A `.rels` part. Ids are handed out as `rId1`, `rId2`, ... in insertion
/// order.
#[derive(Debug, Default, Clone)]
pub(crate) struct Relationships {
    rels: Vec<Relationship>,
}

impl Relationships {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an officeDocument relationship (`type` is the last path segment).
    pub fn add_document(&mut self, rel_type: &str, target: &str) -> String {
        self.push(format!("{}/{}", NS_RELATIONSHIPS, rel_type), target, false)
    }

    pub fn add_external(&mut self, rel_type: &str, target: &str) -> String {
        self.push(format!("{}/{}", NS_RELATIONSHIPS, rel_type), target, true)
    }

    /// Add a relationship with a fully-qualified type URI.
    pub fn add_raw(&mut self, rel_type: &str, target: &str) -> String {
        self.push(rel_type.to_string(), target, false)
    }

    fn push(&mut self, rel_type: String, target: &str, external: bool) -> String {
        self.rels.push(Relationship {
            rel_type,
            target: target.to_string(),
            external,
        });
        format!("rId{}", self.rels.len())
    }

    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rels.len()
    }

    pub fn to_xml(&self) -> Vec<u8> {
        let mut xml = XmlWriter::with_capacity(256 + self.rels.len() * 160);
        xml.declaration();
        xml.start_with("Relationships", &[("xmlns", NS_PACKAGE_RELS)]);
        for (idx, rel) in self.rels.iter().enumerate() {
            let id = format!("rId{}", idx + 1);
            if rel.external {
                xml.empty_with(
                    "Relationship",
                    &[
                        ("Id", &id),
                        ("Type", &rel.rel_type),
                        ("Target", &rel.target),
                        ("TargetMode", "External"),
                    ],
                );
            } else {
                xml.empty_with(
                    "Relationship",
                    &[("Id", &id), ("Type", &rel.rel_type), ("Target", &rel.target)],
                );
            }
        }
        xml.end("Relationships");
        xml.into_bytes()
    }
}

/// Root `_rels/.rels`.
pub(crate) fn generate_root_rels() -> Vec<u8> {
    let mut rels = Relationships::new();
    rels.add_document("officeDocument", "xl/workbook.xml");
    rels.add_raw(
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties",
        "docProps/core.xml",
    );
    rels.add_document("extended-properties", "docProps/app.xml");
    rels.to_xml()
}

// ============================================================================
// Content types
// ============================================================================

const CT_PREFIX: &str = "application/vnd.openxmlformats-officedocument.";

#[derive(Debug, Clone)]
pub(crate) struct ContentTypes {
    defaults: Vec<(String, String)>,
    overrides: Vec<(String, String)>,
}

impl ContentTypes {
    pub fn new() -> Self {
        let mut ct = Self {
            defaults: Vec::new(),
            overrides: Vec::new(),
        };
        ct.add_default("rels", "application/vnd.openxmlformats-package.relationships+xml");
        ct.add_default("xml", "application/xml");
        ct.add_override("/docProps/app.xml", &format!("{}extended-properties+xml", CT_PREFIX));
        ct.add_override(
            "/docProps/core.xml",
            "application/vnd.openxmlformats-package.core-properties+xml",
        );
        ct.add_override(
            "/xl/workbook.xml",
            &format!("{}spreadsheetml.sheet.main+xml", CT_PREFIX),
        );
        ct.add_override("/xl/styles.xml", &format!("{}spreadsheetml.styles+xml", CT_PREFIX));
        ct
    }

    pub fn add_default(&mut self, extension: &str, content_type: &str) {
        if !self.defaults.iter().any(|(ext, _)| ext == extension) {
            self.defaults.push((extension.to_string(), content_type.to_string()));
        }
    }

    pub fn add_override(&mut self, part_name: &str, content_type: &str) {
        self.overrides.push((part_name.to_string(), content_type.to_string()));
    }

    pub fn add_worksheet(&mut self, index: usize) {
        self.add_override(
            &format!("/xl/worksheets/sheet{}.xml", index),
            &format!("{}spreadsheetml.worksheet+xml", CT_PREFIX),
        );
    }

    pub fn add_chartsheet(&mut self, index: usize) {
        self.add_override(
            &format!("/xl/chartsheets/sheet{}.xml", index),
            &format!("{}spreadsheetml.chartsheet+xml", CT_PREFIX),
        );
    }

    pub fn add_chart(&mut self, index: usize) {
        self.add_override(
            &format!("/xl/charts/chart{}.xml", index),
            &format!("{}drawingml.chart+xml", CT_PREFIX),
        );
    }

    pub fn add_drawing(&mut self, index: usize) {
        self.add_override(
            &format!("/xl/drawings/drawing{}.xml", index),
            &format!("{}drawing+xml", CT_PREFIX),
        );
    }

    pub fn add_table(&mut self, index: usize) {
        self.add_override(
            &format!("/xl/tables/table{}.xml", index),
            &format!("{}spreadsheetml.table+xml", CT_PREFIX),
        );
    }

    pub fn add_comments(&mut self, index: usize) {
        self.add_override(
            &format!("/xl/comments{}.xml", index),
            &format!("{}spreadsheetml.comments+xml", CT_PREFIX),
        );
    }

    pub fn add_vml(&mut self) {
        self.add_default("vml", &format!("{}vmlDrawing", CT_PREFIX));
    }

    pub fn add_shared_strings(&mut self) {
        self.add_override(
            "/xl/sharedStrings.xml",
            &format!("{}spreadsheetml.sharedStrings+xml", CT_PREFIX),
        );
    }

    pub fn add_metadata(&mut self) {
        self.add_override(
            "/xl/metadata.xml",
            &format!("{}spreadsheetml.sheetMetadata+xml", CT_PREFIX),
        );
    }

    pub fn add_rich_data(&mut self) {
        self.add_override(
            "/xl/richData/rdrichvalue.xml",
            "application/vnd.ms-excel.rdrichvalue+xml",
        );
        self.add_override(
            "/xl/richData/rdrichvaluestructure.xml",
            "application/vnd.ms-excel.rdrichvaluestructure+xml",
        );
        self.add_override(
            "/xl/richData/rdRichValueTypes.xml",
            "application/vnd.ms-excel.rdrichvaluetypes+xml",
        );
        self.add_override(
            "/xl/richData/richValueRel.xml",
            "application/vnd.ms-excel.richvaluerel+xml",
        );
    }

    pub fn add_image_extension(&mut self, extension: &str) {
        self.add_default(extension, &format!("image/{}", extension));
    }

    pub fn to_xml(&self) -> Vec<u8> {
        let mut xml = XmlWriter::with_capacity(1024 + self.overrides.len() * 160);
        xml.declaration();
        xml.start_with(
            "Types",
            &[("xmlns", "http://schemas.openxmlformats.org/package/2006/content-types")],
        );
        for (ext, ct) in &self.defaults {
            xml.empty_with("Default", &[("Extension", ext), ("ContentType", ct)]);
        }
        for (part, ct) in &self.overrides {
            xml.empty_with("Override", &[("PartName", part), ("ContentType", ct)]);
        }
        xml.end("Types");
        xml.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_escape_data() {
        assert_eq!(escape_data("a < b & c > d"), "a &lt; b &amp; c &gt; d");
        assert_eq!(escape_data("plain \"quoted\""), "plain \"quoted\"");
    }

    #[test]
    fn test_escape_attr() {
        assert_eq!(escape_attr("say \"hi\"\n&"), "say &quot;hi&quot;&#xA;&amp;");
        assert_eq!(escape_attr("no escapes"), "no escapes");
    }

    #[test]
    fn test_writer_elements() {
        let mut xml = XmlWriter::new();
        xml.start_with("a", &[("x", "1 & 2")]);
        xml.val("b", "3");
        xml.data("c", "<t>");
        xml.end("a");
        assert_eq!(
            xml.into_string(),
            "<a x=\"1 &amp; 2\"><b val=\"3\"/><c>&lt;t&gt;</c></a>"
        );
    }

    #[test]
    fn test_relationship_ids_are_sequential() {
        let mut rels = Relationships::new();
        assert_eq!(rels.add_external("hyperlink", "https://example.com"), "rId1");
        assert_eq!(rels.add_document("drawing", "../drawings/drawing1.xml"), "rId2");
        let xml = String::from_utf8(rels.to_xml()).unwrap();
        assert!(xml.contains(
            "<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink\" Target=\"https://example.com\" TargetMode=\"External\"/>"
        ));
        assert!(xml.contains("Id=\"rId2\""));
    }

    #[test]
    fn test_content_types_dedupe_defaults() {
        let mut ct = ContentTypes::new();
        ct.add_image_extension("png");
        ct.add_image_extension("png");
        ct.add_worksheet(1);
        let xml = String::from_utf8(ct.to_xml()).unwrap();
        assert_eq!(xml.matches("Extension=\"png\"").count(), 1);
        assert!(xml.contains("/xl/worksheets/sheet1.xml"));
    }
}
