//! Cell metadata and rich-value parts.
//!
//! `xl/metadata.xml` carries two kinds of block: `XLDAPR` cell metadata
//! that marks a formula as a dynamic array (`cm="1"`), and `XLRICHVALUE`
//! value metadata that binds an error-typed cell (`vm="N"`) to a rich value.
//! Each rich value in `xl/richData/rdrichvalue.xml` is a `_localImage`
//! whose first key indexes `richValueRel.xml`, which in turn points at the
//! picture under `xl/media/`.

use crate::xml::{Relationships, XmlWriter, NS_RELATIONSHIPS, NS_SPREADSHEETML};

const NS_RICHDATA: &str = "http://schemas.microsoft.com/office/spreadsheetml/2017/richdata";
const NS_RICHDATA2: &str = "http://schemas.microsoft.com/office/spreadsheetml/2017/richdata2";
const NS_DYNAMIC_ARRAY: &str =
    "http://schemas.microsoft.com/office/spreadsheetml/2017/dynamicarray";
const NS_RICH_VALUE_REL: &str =
    "http://schemas.microsoft.com/office/2022/10/spreadsheetml/richvaluerelationships";

const EXT_DYNAMIC_ARRAY: &str = "{bdbb8cdc-fa1e-496e-a857-3c3f30c029c3}";
const EXT_RICH_VALUE: &str = "{3e2802c4-a4d2-4d8b-9148-e3be6c30e623}";

/// Workbook relationship types for the rich-value parts, paired with their
/// targets relative to `xl/`.
pub(crate) const WORKBOOK_RELS: [(&str, &str); 4] = [
    (
        "http://schemas.microsoft.com/office/2022/10/relationships/richValueRel",
        "richData/richValueRel.xml",
    ),
    (
        "http://schemas.microsoft.com/office/2017/06/relationships/rdRichValue",
        "richData/rdrichvalue.xml",
    ),
    (
        "http://schemas.microsoft.com/office/2017/06/relationships/rdRichValueStructure",
        "richData/rdrichvaluestructure.xml",
    ),
    (
        "http://schemas.microsoft.com/office/2017/06/relationships/rdRichValueTypes",
        "richData/rdRichValueTypes.xml",
    ),
];

/// Value of `CalcOrigin` for a picture placed by the user.
const CALC_ORIGIN_LOCAL: &str = "5";

/// Keys whose values Excel leaves out of calc comparisons.
const TYPE_KEYS: [&str; 10] = [
    "_Self",
    "_DisplayString",
    "_Flags",
    "_Format",
    "_SubLabel",
    "_Attribution",
    "_Icon",
    "_Display",
    "_CanonicalPropertyNames",
    "_ClassificationId",
];

const METADATA_TYPE_FLAGS: [(&str, &str); 11] = [
    ("minSupportedVersion", "120000"),
    ("copy", "1"),
    ("pasteAll", "1"),
    ("pasteValues", "1"),
    ("merge", "1"),
    ("splitFirst", "1"),
    ("rowColShift", "1"),
    ("clearFormats", "1"),
    ("clearComments", "1"),
    ("assign", "1"),
    ("coerce", "1"),
];

/// One picture embedded in a cell.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RichImage {
    /// Zero-based index into `richValueRel.xml`.
    pub rel_index: u32,
    pub alt_text: String,
    pub decorative: bool,
}

impl RichImage {
    fn has_text(&self) -> bool {
        !self.decorative && !self.alt_text.is_empty()
    }
}

/// All in-cell pictures of a workbook in `vm` order, plus the distinct
/// media targets they reference.
#[derive(Debug, Default, Clone)]
pub(crate) struct RichValues {
    pub images: Vec<RichImage>,
    /// Targets relative to `xl/richData/`, e.g. `../media/image1.png`.
    pub media: Vec<String>,
}

impl RichValues {
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// `xl/richData/rdrichvalue.xml`.
    pub fn rich_value_xml(&self) -> Vec<u8> {
        let mut int = itoa::Buffer::new();
        let mut xml = XmlWriter::with_capacity(256 + self.images.len() * 64);
        xml.declaration();
        let count = self.images.len().to_string();
        xml.start_with("rvData", &[("xmlns", NS_RICHDATA), ("count", &count)]);
        for image in &self.images {
            let structure = if image.has_text() { "1" } else { "0" };
            xml.start_with("rv", &[("s", structure)]);
            xml.data("v", int.format(image.rel_index));
            xml.data("v", CALC_ORIGIN_LOCAL);
            if image.has_text() {
                xml.data("v", &image.alt_text);
            }
            xml.end("rv");
        }
        xml.end("rvData");
        xml.into_bytes()
    }

    /// `xl/richData/rdrichvaluestructure.xml`. Structure 1 adds the alt
    /// text key and is always declared so indices stay fixed.
    pub fn structure_xml(&self) -> Vec<u8> {
        let mut xml = XmlWriter::with_capacity(512);
        xml.declaration();
        xml.start_with("rvStructures", &[("xmlns", NS_RICHDATA), ("count", "2")]);
        for with_text in [false, true] {
            xml.start_with("s", &[("t", "_localImage")]);
            xml.empty_with("k", &[("n", "_rvRel:LocalImageIdentifier"), ("t", "i")]);
            xml.empty_with("k", &[("n", "CalcOrigin"), ("t", "i")]);
            if with_text {
                xml.empty_with("k", &[("n", "Text"), ("t", "s")]);
            }
            xml.end("s");
        }
        xml.end("rvStructures");
        xml.into_bytes()
    }

    /// `xl/richData/richValueRel.xml`.
    pub fn rel_xml(&self) -> Vec<u8> {
        let mut xml = XmlWriter::with_capacity(256 + self.media.len() * 32);
        xml.declaration();
        xml.start_with(
            "richValueRel",
            &[("xmlns", NS_RICH_VALUE_REL), ("xmlns:r", NS_RELATIONSHIPS)],
        );
        for idx in 0..self.media.len() {
            let id = format!("rId{}", idx + 1);
            xml.empty_with("rel", &[("r:id", &id)]);
        }
        xml.end("richValueRel");
        xml.into_bytes()
    }

    /// `xl/richData/_rels/richValueRel.xml.rels`.
    pub fn rel_rels(&self) -> Relationships {
        let mut rels = Relationships::new();
        for target in &self.media {
            rels.add_document("image", target);
        }
        rels
    }
}

/// `xl/richData/rdRichValueTypes.xml`, identical in every workbook.
pub(crate) fn rich_value_types_xml() -> Vec<u8> {
    let mut xml = XmlWriter::with_capacity(1536);
    xml.declaration();
    xml.start_with(
        "rvTypesInfo",
        &[
            ("xmlns", NS_RICHDATA2),
            ("xmlns:mc", "http://schemas.openxmlformats.org/markup-compatibility/2006"),
            ("mc:Ignorable", "x"),
            ("xmlns:x", NS_SPREADSHEETML),
        ],
    );
    xml.start("global");
    xml.start("keyFlags");
    for key in TYPE_KEYS {
        xml.start_with("key", &[("name", key)]);
        if key == "_Self" {
            xml.empty_with("flag", &[("name", "ExcludeFromFile"), ("value", "1")]);
        }
        xml.empty_with("flag", &[("name", "ExcludeFromCalcComparison"), ("value", "1")]);
        xml.end("key");
    }
    xml.end("keyFlags");
    xml.end("global");
    xml.end("rvTypesInfo");
    xml.into_bytes()
}

/// `xl/metadata.xml`. `dynamic_arrays` adds the single `XLDAPR` block that
/// every `cm="1"` cell refers to; `rich_values` is the number of `vm`
/// entries, one per in-cell picture.
pub(crate) fn metadata_xml(dynamic_arrays: bool, rich_values: usize) -> Vec<u8> {
    let mut int = itoa::Buffer::new();
    let mut xml = XmlWriter::with_capacity(1024 + rich_values * 160);
    xml.declaration();

    let mut root = vec![("xmlns", NS_SPREADSHEETML)];
    if rich_values > 0 {
        root.push(("xmlns:xlrd", NS_RICHDATA));
    }
    if dynamic_arrays {
        root.push(("xmlns:xda", NS_DYNAMIC_ARRAY));
    }
    xml.start_with("metadata", &root);

    let type_count = dynamic_arrays as usize + (rich_values > 0) as usize;
    xml.start_with("metadataTypes", &[("count", int.format(type_count))]);
    if dynamic_arrays {
        let mut attrs = vec![("name", "XLDAPR")];
        attrs.extend_from_slice(&METADATA_TYPE_FLAGS);
        attrs.push(("cellMeta", "1"));
        xml.empty_with("metadataType", &attrs);
    }
    if rich_values > 0 {
        let mut attrs = vec![("name", "XLRICHVALUE")];
        attrs.extend_from_slice(&METADATA_TYPE_FLAGS);
        xml.empty_with("metadataType", &attrs);
    }
    xml.end("metadataTypes");

    if dynamic_arrays {
        xml.start_with("futureMetadata", &[("name", "XLDAPR"), ("count", "1")]);
        xml.start("bk");
        xml.start("extLst");
        xml.start_with("ext", &[("uri", EXT_DYNAMIC_ARRAY)]);
        xml.empty_with(
            "xda:dynamicArrayProperties",
            &[("fDynamic", "1"), ("fCollapsed", "0")],
        );
        xml.end("ext");
        xml.end("extLst");
        xml.end("bk");
        xml.end("futureMetadata");
    }

    if rich_values > 0 {
        let count = rich_values.to_string();
        xml.start_with("futureMetadata", &[("name", "XLRICHVALUE"), ("count", &count)]);
        for idx in 0..rich_values {
            xml.start("bk");
            xml.start("extLst");
            xml.start_with("ext", &[("uri", EXT_RICH_VALUE)]);
            xml.empty_with("xlrd:rvb", &[("i", int.format(idx))]);
            xml.end("ext");
            xml.end("extLst");
            xml.end("bk");
        }
        xml.end("futureMetadata");
    }

    if dynamic_arrays {
        xml.start_with("cellMetadata", &[("count", "1")]);
        xml.start("bk");
        xml.empty_with("rc", &[("t", "1"), ("v", "0")]);
        xml.end("bk");
        xml.end("cellMetadata");
    }

    if rich_values > 0 {
        // 1-based position of XLRICHVALUE in metadataTypes.
        let rich_type = if dynamic_arrays { "2" } else { "1" };
        let count = rich_values.to_string();
        xml.start_with("valueMetadata", &[("count", &count)]);
        for idx in 0..rich_values {
            let v = idx.to_string();
            xml.start("bk");
            xml.empty_with("rc", &[("t", rich_type), ("v", &v)]);
            xml.end("bk");
        }
        xml.end("valueMetadata");
    }

    xml.end("metadata");
    xml.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_metadata_dynamic_arrays_only() {
        let xml = text(metadata_xml(true, 0));
        assert!(xml.contains("<metadataTypes count=\"1\"><metadataType name=\"XLDAPR\""));
        assert!(xml.contains("<xda:dynamicArrayProperties fDynamic=\"1\" fCollapsed=\"0\"/>"));
        assert!(xml.contains("<cellMetadata count=\"1\"><bk><rc t=\"1\" v=\"0\"/></bk></cellMetadata>"));
        assert!(!xml.contains("XLRICHVALUE"));
        assert!(!xml.contains("valueMetadata"));
    }

    #[test]
    fn test_metadata_rich_values_after_dynamic_arrays() {
        let xml = text(metadata_xml(true, 2));
        assert!(xml.contains("<metadataTypes count=\"2\">"));
        assert!(xml.contains("<futureMetadata name=\"XLRICHVALUE\" count=\"2\">"));
        assert!(xml.contains("<xlrd:rvb i=\"1\"/>"));
        assert!(xml.contains(
            "<valueMetadata count=\"2\"><bk><rc t=\"2\" v=\"0\"/></bk><bk><rc t=\"2\" v=\"1\"/></bk></valueMetadata>"
        ));

        let images_only = text(metadata_xml(false, 1));
        assert!(images_only.contains("<rc t=\"1\" v=\"0\"/>"));
        assert!(!images_only.contains("cellMetadata"));
    }

    #[test]
    fn test_rich_value_parts() {
        let values = RichValues {
            images: vec![
                RichImage {
                    rel_index: 0,
                    alt_text: String::new(),
                    decorative: false,
                },
                RichImage {
                    rel_index: 0,
                    alt_text: "Logo & mark".to_string(),
                    decorative: false,
                },
            ],
            media: vec!["../media/image1.png".to_string()],
        };

        let rv = text(values.rich_value_xml());
        assert!(rv.contains("count=\"2\""));
        assert!(rv.contains("<rv s=\"0\"><v>0</v><v>5</v></rv>"));
        assert!(rv.contains("<rv s=\"1\"><v>0</v><v>5</v><v>Logo &amp; mark</v></rv>"));

        let structure = text(values.structure_xml());
        assert!(structure.contains("<k n=\"_rvRel:LocalImageIdentifier\" t=\"i\"/>"));
        assert!(structure.contains("<k n=\"Text\" t=\"s\"/>"));

        let rel = text(values.rel_xml());
        assert!(rel.contains("<rel r:id=\"rId1\"/></richValueRel>"));

        let rels = text(values.rel_rels().to_xml());
        assert!(rels.contains("relationships/image\" Target=\"../media/image1.png\""));
    }

    #[test]
    fn test_rich_value_types() {
        let xml = text(rich_value_types_xml());
        assert!(xml.contains(
            "<key name=\"_Self\"><flag name=\"ExcludeFromFile\" value=\"1\"/>\
<flag name=\"ExcludeFromCalcComparison\" value=\"1\"/></key>"
        ));
        assert_eq!(xml.matches("<key ").count(), 10);
    }
}
