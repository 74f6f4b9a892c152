//! Document properties: `docProps/core.xml` and `docProps/app.xml`.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::xml::XmlWriter;

const NS_CORE: &str = "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";
const NS_EXTENDED: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties";
const NS_VTYPES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes";

/// Metadata shown in Excel's File > Info pane.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocProperties {
    pub(crate) title: String,
    pub(crate) subject: String,
    pub(crate) author: String,
    pub(crate) manager: String,
    pub(crate) company: String,
    pub(crate) category: String,
    pub(crate) keywords: String,
    pub(crate) comment: String,
    pub(crate) status: String,
    pub(crate) hyperlink_base: String,
    pub(crate) created: Option<DateTime<Utc>>,
}

impl DocProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn set_subject(mut self, subject: &str) -> Self {
        self.subject = subject.to_string();
        self
    }

    pub fn set_author(mut self, author: &str) -> Self {
        self.author = author.to_string();
        self
    }

    pub fn set_manager(mut self, manager: &str) -> Self {
        self.manager = manager.to_string();
        self
    }

    pub fn set_company(mut self, company: &str) -> Self {
        self.company = company.to_string();
        self
    }

    pub fn set_category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    pub fn set_keywords(mut self, keywords: &str) -> Self {
        self.keywords = keywords.to_string();
        self
    }

    pub fn set_comment(mut self, comment: &str) -> Self {
        self.comment = comment.to_string();
        self
    }

    pub fn set_status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }

    pub fn set_hyperlink_base(mut self, base: &str) -> Self {
        self.hyperlink_base = base.to_string();
        self
    }

    /// Fix the creation time. Without it the time of saving is used, which
    /// makes output differ between runs.
    pub fn set_creation_datetime(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }

    pub(crate) fn core_xml(&self) -> Vec<u8> {
        let created = self
            .created
            .unwrap_or_else(Utc::now)
            .to_rfc3339_opts(SecondsFormat::Secs, true);

        let mut xml = XmlWriter::with_capacity(1024);
        xml.declaration();
        xml.start_with(
            "cp:coreProperties",
            &[
                ("xmlns:cp", NS_CORE),
                ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
                ("xmlns:dcterms", "http://purl.org/dc/terms/"),
                ("xmlns:dcmitype", "http://purl.org/dc/dcmitype/"),
                ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
            ],
        );
        for (tag, value) in [("dc:title", &self.title), ("dc:subject", &self.subject)] {
            if !value.is_empty() {
                xml.data(tag, value);
            }
        }
        xml.data("dc:creator", &self.author);
        for (tag, value) in [
            ("cp:keywords", &self.keywords),
            ("dc:description", &self.comment),
        ] {
            if !value.is_empty() {
                xml.data(tag, value);
            }
        }
        xml.data("cp:lastModifiedBy", &self.author);
        xml.data_with("dcterms:created", &[("xsi:type", "dcterms:W3CDTF")], &created);
        xml.data_with("dcterms:modified", &[("xsi:type", "dcterms:W3CDTF")], &created);
        for (tag, value) in [
            ("cp:category", &self.category),
            ("cp:contentStatus", &self.status),
        ] {
            if !value.is_empty() {
                xml.data(tag, value);
            }
        }
        xml.end("cp:coreProperties");
        xml.into_bytes()
    }

    /// `headings` pairs a group label ("Worksheets", "Charts", "Named
    /// Ranges") with the part titles in that group; empty groups are left
    /// out.
    pub(crate) fn app_xml(&self, headings: &[(&str, Vec<String>)]) -> Vec<u8> {
        let headings: Vec<&(&str, Vec<String>)> =
            headings.iter().filter(|(_, parts)| !parts.is_empty()).collect();
        let mut int = itoa::Buffer::new();

        let mut xml = XmlWriter::with_capacity(1024);
        xml.declaration();
        xml.start_with("Properties", &[("xmlns", NS_EXTENDED), ("xmlns:vt", NS_VTYPES)]);
        xml.data("Application", "Microsoft Excel");
        xml.data("DocSecurity", "0");
        xml.data("ScaleCrop", "false");

        xml.start("HeadingPairs");
        xml.start_with(
            "vt:vector",
            &[("size", int.format(headings.len() * 2)), ("baseType", "variant")],
        );
        for (label, parts) in &headings {
            xml.start("vt:variant");
            xml.data("vt:lpstr", label);
            xml.end("vt:variant");
            xml.start("vt:variant");
            xml.data("vt:i4", int.format(parts.len()));
            xml.end("vt:variant");
        }
        xml.end("vt:vector");
        xml.end("HeadingPairs");

        let total: usize = headings.iter().map(|(_, parts)| parts.len()).sum();
        xml.start("TitlesOfParts");
        xml.start_with("vt:vector", &[("size", int.format(total)), ("baseType", "lpstr")]);
        for (_, parts) in &headings {
            for part in parts {
                xml.data("vt:lpstr", part);
            }
        }
        xml.end("vt:vector");
        xml.end("TitlesOfParts");

        if !self.manager.is_empty() {
            xml.data("Manager", &self.manager);
        }
        xml.data("Company", &self.company);
        xml.data("LinksUpToDate", "false");
        xml.data("SharedDoc", "false");
        if !self.hyperlink_base.is_empty() {
            xml.data("HyperlinkBase", &self.hyperlink_base);
        }
        xml.data("HyperlinksChanged", "false");
        xml.data("AppVersion", "12.0000");
        xml.end("Properties");
        xml.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_core_xml() {
        let created = Utc.with_ymd_and_hms(2024, 3, 5, 9, 30, 0).unwrap();
        let props = DocProperties::new()
            .set_title("Q1 <report>")
            .set_author("Finance")
            .set_creation_datetime(created);
        let xml = String::from_utf8(props.core_xml()).unwrap();
        assert!(xml.contains("<dc:title>Q1 &lt;report&gt;</dc:title>"));
        assert!(xml.contains("<dc:creator>Finance</dc:creator>"));
        assert!(xml.contains(
            "<dcterms:created xsi:type=\"dcterms:W3CDTF\">2024-03-05T09:30:00Z</dcterms:created>"
        ));
        assert!(!xml.contains("dc:subject"));
    }

    #[test]
    fn test_app_xml_groups() {
        let xml = DocProperties::new().set_company("Acme").app_xml(&[
            ("Worksheets", vec!["Sheet1".to_string(), "Data".to_string()]),
            ("Charts", Vec::new()),
            ("Named Ranges", vec!["Sheet1!Print_Area".to_string()]),
        ]);
        let xml = String::from_utf8(xml).unwrap();
        assert!(xml.contains("<HeadingPairs><vt:vector size=\"4\" baseType=\"variant\">"));
        assert!(xml.contains("<vt:lpstr>Worksheets</vt:lpstr></vt:variant><vt:variant><vt:i4>2</vt:i4>"));
        assert!(!xml.contains("Charts"));
        assert!(xml.contains(
            "<vt:vector size=\"3\" baseType=\"lpstr\"><vt:lpstr>Sheet1</vt:lpstr><vt:lpstr>Data</vt:lpstr>\
<vt:lpstr>Sheet1!Print_Area</vt:lpstr></vt:vector>"
        ));
        assert!(xml.contains("<Company>Acme</Company>"));
    }
}
