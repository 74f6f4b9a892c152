//! Style bookkeeping.
//!
//! [`FormatTable`] hands out stable xf/dxf indices while cells are written.
//! At save time [`StyleRegistry`] splits those formats into deduplicated
//! font, fill, border and number-format tables and renders `styles.xml`.

use std::collections::HashMap;

use crate::error::{Result, WriteError};
use crate::format::{Alignment, Border, BorderSide, Color, Fill, Font, Format, FormatAlign,
    FormatDiagonalBorder, FormatPattern, FormatScript};
use crate::xml::{XmlWriter, NS_SPREADSHEETML};

/// Excel's built-in number formats; anything else gets an id from 164 up.
const BUILTIN_NUM_FORMATS: &[(u16, &str)] = &[
    (0, "General"),
    (1, "0"),
    (2, "0.00"),
    (3, "#,##0"),
    (4, "#,##0.00"),
    (5, "($#,##0_);($#,##0)"),
    (6, "($#,##0_);[Red]($#,##0)"),
    (7, "($#,##0.00_);($#,##0.00)"),
    (8, "($#,##0.00_);[Red]($#,##0.00)"),
    (9, "0%"),
    (10, "0.00%"),
    (11, "0.00E+00"),
    (12, "# ?/?"),
    (13, "# ??/??"),
    (14, "m/d/yy"),
    (15, "d-mmm-yy"),
    (16, "d-mmm"),
    (17, "mmm-yy"),
    (18, "h:mm AM/PM"),
    (19, "h:mm:ss AM/PM"),
    (20, "h:mm"),
    (21, "h:mm:ss"),
    (22, "m/d/yy h:mm"),
    (37, "(#,##0_);(#,##0)"),
    (38, "(#,##0_);[Red](#,##0)"),
    (39, "(#,##0.00_);(#,##0.00)"),
    (40, "(#,##0.00_);[Red](#,##0.00)"),
    (41, "_(* #,##0_);_(* (#,##0);_(* \"-\"_);_(@_)"),
    (42, "_($* #,##0_);_($* (#,##0);_($* \"-\"_);_(@_)"),
    (43, "_(* #,##0.00_);_(* (#,##0.00);_(* \"-\"??_);_(@_)"),
    (44, "_($* #,##0.00_);_($* (#,##0.00);_($* \"-\"??_);_(@_)"),
    (45, "mm:ss"),
    (46, "[h]:mm:ss"),
    (47, "mm:ss.0"),
    (48, "##0.0E+0"),
    (49, "@"),
];

const FIRST_CUSTOM_NUM_FMT: u16 = 164;

fn builtin_num_format_id(code: &str) -> Option<u16> {
    BUILTIN_NUM_FORMATS
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(id, _)| *id)
}

// ============================================================================
// Palette
// ============================================================================

const DEFAULT_PALETTE: [u32; 56] = [
    0x000000, 0xFFFFFF, 0xFF0000, 0x00FF00, 0x0000FF, 0xFFFF00, 0xFF00FF, 0x00FFFF,
    0x800000, 0x008000, 0x000080, 0x808000, 0x800080, 0x008080, 0xC0C0C0, 0x808080,
    0x9999FF, 0x993366, 0xFFFFCC, 0xCCFFFF, 0x660066, 0xFF8080, 0x0066CC, 0xCCCCFF,
    0x000080, 0xFF00FF, 0xFFFF00, 0x00FFFF, 0x800080, 0x800000, 0x008080, 0x0000FF,
    0x00CCFF, 0xCCFFFF, 0xCCFFCC, 0xFFFF99, 0x99CCFF, 0xFF99CC, 0xCC99FF, 0xFFCC99,
    0x3366FF, 0x33CCCC, 0x99CC00, 0xFFCC00, 0xFF9900, 0xFF6600, 0x666699, 0x969696,
    0x003366, 0x339966, 0x003300, 0x333300, 0x993300, 0x993366, 0x333399, 0x333333,
];

/// The legacy 64-slot indexed color palette. Slots 8..=63 are editable;
/// 0..=7 mirror 8..=15.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    colors: [u32; 56],
}

impl Default for Palette {
    fn default() -> Self {
        Self { colors: DEFAULT_PALETTE }
    }
}

impl Palette {
    pub fn set(&mut self, index: u8, rgb: u32) -> Result<()> {
        if !(8..=63).contains(&index) {
            return Err(WriteError::Parameter(format!(
                "palette index {} is outside 8..=63",
                index
            )));
        }
        self.colors[(index - 8) as usize] = rgb & 0xFFFFFF;
        Ok(())
    }

    pub fn rgb(&self, index: u8) -> u32 {
        match index {
            0..=7 => self.colors[index as usize],
            8..=63 => self.colors[(index - 8) as usize],
            _ => 0x000000,
        }
    }

    pub fn is_modified(&self) -> bool {
        self.colors != DEFAULT_PALETTE
    }

    /// Resolve indexed colors to RGB for parts (DrawingML) that can't
    /// reference the palette.
    pub fn resolve(&self, color: Color) -> Color {
        match color {
            Color::Indexed(idx) => Color::Rgb(self.rgb(idx)),
            other => other,
        }
    }
}

// ============================================================================
// FormatTable
// ============================================================================

/// Deduplicating store of cell formats (xf) and differential formats (dxf).
///
/// Index 0 is always the default format.
#[derive(Debug)]
pub struct FormatTable {
    xf_index: HashMap<String, u32>,
    xf_formats: Vec<Format>,
    dxf_index: HashMap<String, u32>,
    dxf_formats: Vec<Format>,
}

impl Default for FormatTable {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatTable {
    pub fn new() -> Self {
        let mut table = Self {
            xf_index: HashMap::new(),
            xf_formats: Vec::new(),
            dxf_index: HashMap::new(),
            dxf_formats: Vec::new(),
        };
        table.resolve(&Format::default());
        table
    }

    /// Style index for `format`; equal formats always map to the same index.
    pub fn resolve(&mut self, format: &Format) -> u32 {
        let key = format.key();
        if let Some(&idx) = self.xf_index.get(&key) {
            return idx;
        }
        let idx = self.xf_formats.len() as u32;
        self.xf_index.insert(key, idx);
        self.xf_formats.push(format.clone());
        idx
    }

    /// Differential format index, used by conditional formats and tables.
    pub fn resolve_dxf(&mut self, format: &Format) -> u32 {
        let key = format.key();
        if let Some(&idx) = self.dxf_index.get(&key) {
            return idx;
        }
        let idx = self.dxf_formats.len() as u32;
        self.dxf_index.insert(key, idx);
        self.dxf_formats.push(format.clone());
        idx
    }

    pub fn xf_count(&self) -> usize {
        self.xf_formats.len()
    }

    pub fn dxf_count(&self) -> usize {
        self.dxf_formats.len()
    }
}

// ============================================================================
// StyleRegistry
// ============================================================================

#[derive(Debug, Clone)]
struct CellXfEntry {
    num_fmt_id: u16,
    font_id: u32,
    fill_id: u32,
    border_id: u32,
    alignment: Alignment,
    locked: bool,
    hidden: bool,
    quote_prefix: bool,
}

#[derive(Debug, Clone)]
struct DxfEntry {
    format: Format,
    num_fmt_id: Option<u16>,
}

/// Save-time split of the format table into the component tables Excel
/// stores separately.
#[derive(Debug)]
pub struct StyleRegistry {
    fonts: Vec<Font>,
    font_ids: HashMap<String, u32>,
    fills: Vec<Fill>,
    fill_ids: HashMap<String, u32>,
    borders: Vec<Border>,
    border_ids: HashMap<String, u32>,
    num_fmts: Vec<(u16, String)>,
    cell_xfs: Vec<CellXfEntry>,
    dxfs: Vec<DxfEntry>,
    palette: Option<Palette>,
}

impl StyleRegistry {
    pub fn new(table: &FormatTable, palette: &Palette) -> Self {
        let mut registry = Self {
            fonts: Vec::new(),
            font_ids: HashMap::new(),
            fills: Vec::new(),
            fill_ids: HashMap::new(),
            borders: Vec::new(),
            border_ids: HashMap::new(),
            num_fmts: Vec::new(),
            cell_xfs: Vec::with_capacity(table.xf_count()),
            dxfs: Vec::with_capacity(table.dxf_count()),
            palette: palette.is_modified().then(|| palette.clone()),
        };

        registry.get_or_add_font(&Font::default());
        registry.get_or_add_fill(&Fill::default());
        registry.get_or_add_fill(&Fill {
            pattern: FormatPattern::Gray125,
            ..Fill::default()
        });
        registry.get_or_add_border(&Border::default());

        for format in &table.xf_formats {
            registry.register_cell_xf(format);
        }
        for format in &table.dxf_formats {
            registry.register_dxf(format);
        }
        registry
    }

    fn register_cell_xf(&mut self, format: &Format) {
        let entry = CellXfEntry {
            num_fmt_id: self.num_format_id(format),
            font_id: self.get_or_add_font(&format.font),
            fill_id: self.get_or_add_fill(&format.fill.normalized()),
            border_id: self.get_or_add_border(&format.border),
            alignment: format.alignment.clone(),
            locked: format.locked,
            hidden: format.hidden,
            quote_prefix: format.quote_prefix,
        };
        self.cell_xfs.push(entry);
    }

    fn register_dxf(&mut self, format: &Format) {
        let has_num_fmt = format.num_format_index.is_some() || !format.num_format.is_empty();
        let num_fmt_id = has_num_fmt.then(|| self.num_format_id(format));
        self.dxfs.push(DxfEntry {
            format: format.clone(),
            num_fmt_id,
        });
    }

    fn num_format_id(&mut self, format: &Format) -> u16 {
        if let Some(idx) = format.num_format_index {
            return idx;
        }
        if format.num_format.is_empty() {
            return 0;
        }
        if let Some(id) = builtin_num_format_id(&format.num_format) {
            return id;
        }
        if let Some((id, _)) = self.num_fmts.iter().find(|(_, code)| *code == format.num_format) {
            return *id;
        }
        let id = FIRST_CUSTOM_NUM_FMT + self.num_fmts.len() as u16;
        self.num_fmts.push((id, format.num_format.clone()));
        id
    }

    fn get_or_add_font(&mut self, font: &Font) -> u32 {
        let key = font.key();
        if let Some(&id) = self.font_ids.get(&key) {
            return id;
        }
        let id = self.fonts.len() as u32;
        self.font_ids.insert(key, id);
        self.fonts.push(font.clone());
        id
    }

    fn get_or_add_fill(&mut self, fill: &Fill) -> u32 {
        let key = fill.key();
        if let Some(&id) = self.fill_ids.get(&key) {
            return id;
        }
        let id = self.fills.len() as u32;
        self.fill_ids.insert(key, id);
        self.fills.push(fill.clone());
        id
    }

    fn get_or_add_border(&mut self, border: &Border) -> u32 {
        let key = border.key();
        if let Some(&id) = self.border_ids.get(&key) {
            return id;
        }
        let id = self.borders.len() as u32;
        self.border_ids.insert(key, id);
        self.borders.push(border.clone());
        id
    }

    pub fn font_count(&self) -> usize {
        self.fonts.len()
    }

    pub fn fill_count(&self) -> usize {
        self.fills.len()
    }

    pub fn border_count(&self) -> usize {
        self.borders.len()
    }

    pub fn custom_num_formats(&self) -> impl Iterator<Item = (u16, &str)> {
        self.num_fmts.iter().map(|(id, code)| (*id, code.as_str()))
    }
}

// ============================================================================
// styles.xml
// ============================================================================

pub fn generate_styles_xml(registry: &StyleRegistry) -> Vec<u8> {
    let mut xml = XmlWriter::with_capacity(2000 + registry.fonts.len() * 200);
    xml.declaration();
    xml.start_with("styleSheet", &[("xmlns", NS_SPREADSHEETML)]);

    if !registry.num_fmts.is_empty() {
        xml.start_with("numFmts", &[("count", &registry.num_fmts.len().to_string())]);
        for (id, code) in &registry.num_fmts {
            xml.empty_with("numFmt", &[("numFmtId", &id.to_string()), ("formatCode", code)]);
        }
        xml.end("numFmts");
    }

    xml.start_with("fonts", &[("count", &registry.fonts.len().to_string())]);
    for font in &registry.fonts {
        write_font(&mut xml, font, false);
    }
    xml.end("fonts");

    xml.start_with("fills", &[("count", &registry.fills.len().to_string())]);
    for fill in &registry.fills {
        write_fill(&mut xml, fill, false);
    }
    xml.end("fills");

    xml.start_with("borders", &[("count", &registry.borders.len().to_string())]);
    for border in &registry.borders {
        write_border(&mut xml, border, false);
    }
    xml.end("borders");

    xml.start_with("cellStyleXfs", &[("count", "1")]);
    xml.empty_with(
        "xf",
        &[("numFmtId", "0"), ("fontId", "0"), ("fillId", "0"), ("borderId", "0")],
    );
    xml.end("cellStyleXfs");

    xml.start_with("cellXfs", &[("count", &registry.cell_xfs.len().to_string())]);
    for xf in &registry.cell_xfs {
        write_cell_xf(&mut xml, xf);
    }
    xml.end("cellXfs");

    xml.start_with("cellStyles", &[("count", "1")]);
    xml.empty_with("cellStyle", &[("name", "Normal"), ("xfId", "0"), ("builtinId", "0")]);
    xml.end("cellStyles");

    xml.start_with("dxfs", &[("count", &registry.dxfs.len().to_string())]);
    for dxf in &registry.dxfs {
        write_dxf(&mut xml, dxf);
    }
    xml.end("dxfs");

    xml.empty_with(
        "tableStyles",
        &[
            ("count", "0"),
            ("defaultTableStyle", "TableStyleMedium9"),
            ("defaultPivotStyle", "PivotStyleLight16"),
        ],
    );

    if let Some(palette) = &registry.palette {
        xml.start("colors");
        xml.start("indexedColors");
        for idx in 0..64u8 {
            let argb = format!("FF{:06X}", palette.rgb(idx));
            xml.empty_with("rgbColor", &[("rgb", &argb)]);
        }
        xml.end("indexedColors");
        xml.end("colors");
    }

    xml.end("styleSheet");
    xml.into_bytes()
}

fn write_color(xml: &mut XmlWriter, tag: &str, color: &Color) {
    let attrs = color.style_attributes();
    let borrowed: Vec<(&str, &str)> = attrs.iter().map(|(k, v)| (*k, v.as_str())).collect();
    xml.empty_with(tag, &borrowed);
}

fn write_font(xml: &mut XmlWriter, font: &Font, is_dxf: bool) {
    xml.start("font");
    if font.bold {
        xml.empty("b");
    }
    if font.italic {
        xml.empty("i");
    }
    if font.strikethrough {
        xml.empty("strike");
    }
    if font.outline {
        xml.empty("outline");
    }
    if font.shadow {
        xml.empty("shadow");
    }
    if let Some(u) = font.underline.val() {
        if u == "single" {
            xml.empty("u");
        } else {
            xml.val("u", u);
        }
    }
    match font.script {
        FormatScript::Superscript => xml.val("vertAlign", "superscript"),
        FormatScript::Subscript => xml.val("vertAlign", "subscript"),
        FormatScript::None => {}
    }
    if !is_dxf {
        xml.val("sz", &crate::utility::format_number(font.size));
    }
    if !font.color.is_default() {
        write_color(xml, "color", &font.color);
    }
    if !is_dxf {
        xml.val("name", &font.name);
        if font.family > 0 {
            xml.val("family", &font.family.to_string());
        }
        if !font.scheme.is_empty() {
            xml.val("scheme", &font.scheme);
        }
    }
    xml.end("font");
}

/// `<rPr>` for one run of a rich string. Same children as `<font>` but
/// the face is `rFont`.
pub(crate) fn write_run_properties(xml: &mut XmlWriter, font: &Font) {
    xml.start("rPr");
    if font.bold {
        xml.empty("b");
    }
    if font.italic {
        xml.empty("i");
    }
    if font.strikethrough {
        xml.empty("strike");
    }
    if font.outline {
        xml.empty("outline");
    }
    if font.shadow {
        xml.empty("shadow");
    }
    if let Some(u) = font.underline.val() {
        if u == "single" {
            xml.empty("u");
        } else {
            xml.val("u", u);
        }
    }
    match font.script {
        FormatScript::Superscript => xml.val("vertAlign", "superscript"),
        FormatScript::Subscript => xml.val("vertAlign", "subscript"),
        FormatScript::None => {}
    }
    xml.val("sz", &crate::utility::format_number(font.size));
    if font.color.is_default() {
        xml.empty_with("color", &[("theme", "1")]);
    } else {
        write_color(xml, "color", &font.color);
    }
    xml.val("rFont", &font.name);
    if font.family > 0 {
        xml.val("family", &font.family.to_string());
    }
    if !font.scheme.is_empty() {
        xml.val("scheme", &font.scheme);
    }
    xml.end("rPr");
}

fn write_fill(xml: &mut XmlWriter, fill: &Fill, is_dxf: bool) {
    xml.start("fill");
    if is_dxf {
        // Differential solid fills carry the color as bgColor and no type.
        let solid = matches!(fill.pattern, FormatPattern::Solid | FormatPattern::None);
        if solid {
            xml.start("patternFill");
            let color = if fill.foreground.is_default() { fill.background } else { fill.foreground };
            write_color(xml, "bgColor", &color);
        } else {
            xml.start_with("patternFill", &[("patternType", fill.pattern.val())]);
            if !fill.foreground.is_default() {
                write_color(xml, "fgColor", &fill.foreground);
            }
            if !fill.background.is_default() {
                write_color(xml, "bgColor", &fill.background);
            }
        }
        xml.end("patternFill");
        xml.end("fill");
        return;
    }

    let has_colors = !fill.foreground.is_default() || !fill.background.is_default();
    if !has_colors && fill.pattern != FormatPattern::Solid {
        xml.empty_with("patternFill", &[("patternType", fill.pattern.val())]);
    } else {
        xml.start_with("patternFill", &[("patternType", fill.pattern.val())]);
        if !fill.foreground.is_default() {
            write_color(xml, "fgColor", &fill.foreground);
        }
        if !fill.background.is_default() {
            write_color(xml, "bgColor", &fill.background);
        } else {
            xml.empty_with("bgColor", &[("indexed", "64")]);
        }
        xml.end("patternFill");
    }
    xml.end("fill");
}

fn write_border_side(xml: &mut XmlWriter, side: &str, border: &BorderSide) {
    match border.style.val() {
        Some(style) => {
            xml.start_with(side, &[("style", style)]);
            if border.color.is_default() {
                xml.empty_with("color", &[("auto", "1")]);
            } else {
                write_color(xml, "color", &border.color);
            }
            xml.end(side);
        }
        None => xml.empty(side),
    }
}

fn write_border(xml: &mut XmlWriter, border: &Border, is_dxf: bool) {
    match border.diagonal_type {
        FormatDiagonalBorder::None => xml.start("border"),
        FormatDiagonalBorder::BorderUp => xml.start_with("border", &[("diagonalUp", "1")]),
        FormatDiagonalBorder::BorderDown => xml.start_with("border", &[("diagonalDown", "1")]),
        FormatDiagonalBorder::BorderUpDown => {
            xml.start_with("border", &[("diagonalUp", "1"), ("diagonalDown", "1")])
        }
    }
    write_border_side(xml, "left", &border.left);
    write_border_side(xml, "right", &border.right);
    write_border_side(xml, "top", &border.top);
    write_border_side(xml, "bottom", &border.bottom);
    if !is_dxf {
        write_border_side(xml, "diagonal", &border.diagonal);
    }
    xml.end("border");
}

fn horizontal_val(align: FormatAlign) -> Option<&'static str> {
    match align {
        FormatAlign::Left => Some("left"),
        FormatAlign::Center => Some("center"),
        FormatAlign::Right => Some("right"),
        FormatAlign::Fill => Some("fill"),
        FormatAlign::Justify => Some("justify"),
        FormatAlign::CenterAcross => Some("centerContinuous"),
        FormatAlign::Distributed => Some("distributed"),
        _ => None,
    }
}

fn vertical_val(align: FormatAlign) -> Option<&'static str> {
    match align {
        FormatAlign::Top => Some("top"),
        FormatAlign::VerticalCenter => Some("center"),
        FormatAlign::Bottom => Some("bottom"),
        FormatAlign::VerticalJustify => Some("justify"),
        FormatAlign::VerticalDistributed => Some("distributed"),
        _ => None,
    }
}

fn write_alignment(xml: &mut XmlWriter, align: &Alignment) {
    let rotation = align.rotation.to_string();
    let indent = align.indent.to_string();
    let reading = align.reading_direction.to_string();
    let mut attrs: Vec<(&str, &str)> = Vec::new();
    if let Some(h) = horizontal_val(align.horizontal) {
        attrs.push(("horizontal", h));
    }
    if let Some(v) = vertical_val(align.vertical) {
        attrs.push(("vertical", v));
    }
    if align.rotation != 0 {
        attrs.push(("textRotation", rotation.as_str()));
    }
    if align.text_wrap {
        attrs.push(("wrapText", "1"));
    }
    if align.indent > 0 {
        attrs.push(("indent", indent.as_str()));
    }
    if align.shrink {
        attrs.push(("shrinkToFit", "1"));
    }
    if align.reading_direction > 0 {
        attrs.push(("readingOrder", reading.as_str()));
    }
    xml.empty_with("alignment", &attrs);
}

fn write_cell_xf(xml: &mut XmlWriter, xf: &CellXfEntry) {
    let num_fmt_id = xf.num_fmt_id.to_string();
    let font_id = xf.font_id.to_string();
    let fill_id = xf.fill_id.to_string();
    let border_id = xf.border_id.to_string();
    let mut attrs: Vec<(&str, &str)> = vec![
        ("numFmtId", &num_fmt_id),
        ("fontId", &font_id),
        ("fillId", &fill_id),
        ("borderId", &border_id),
        ("xfId", "0"),
    ];
    if xf.quote_prefix {
        attrs.push(("quotePrefix", "1"));
    }
    if xf.num_fmt_id > 0 {
        attrs.push(("applyNumberFormat", "1"));
    }
    if xf.font_id > 0 {
        attrs.push(("applyFont", "1"));
    }
    if xf.fill_id > 0 {
        attrs.push(("applyFill", "1"));
    }
    if xf.border_id > 0 {
        attrs.push(("applyBorder", "1"));
    }
    let has_alignment = !xf.alignment.is_default();
    let has_protection = !xf.locked || xf.hidden;
    if has_alignment {
        attrs.push(("applyAlignment", "1"));
    }
    if has_protection {
        attrs.push(("applyProtection", "1"));
    }

    if !has_alignment && !has_protection {
        xml.empty_with("xf", &attrs);
        return;
    }
    xml.start_with("xf", &attrs);
    if has_alignment {
        write_alignment(xml, &xf.alignment);
    }
    if has_protection {
        let mut prot: Vec<(&str, &str)> = Vec::new();
        if !xf.locked {
            prot.push(("locked", "0"));
        }
        if xf.hidden {
            prot.push(("hidden", "1"));
        }
        xml.empty_with("protection", &prot);
    }
    xml.end("xf");
}

// OOXML order inside <dxf>: font, numFmt, fill, alignment, border.
fn write_dxf(xml: &mut XmlWriter, dxf: &DxfEntry) {
    let format = &dxf.format;
    xml.start("dxf");
    let font = &format.font;
    let font_set = font.bold
        || font.italic
        || font.strikethrough
        || font.underline.val().is_some()
        || !font.color.is_default();
    if font_set {
        write_font(xml, font, true);
    }
    if let Some(id) = dxf.num_fmt_id {
        let code = if format.num_format.is_empty() {
            BUILTIN_NUM_FORMATS
                .iter()
                .find(|(bid, _)| *bid == id)
                .map(|(_, c)| c.to_string())
                .unwrap_or_default()
        } else {
            format.num_format.clone()
        };
        xml.empty_with("numFmt", &[("numFmtId", &id.to_string()), ("formatCode", &code)]);
    }
    if !format.fill.is_default() {
        write_fill(xml, &format.fill, true);
    }
    if !format.alignment.is_default() {
        write_alignment(xml, &format.alignment);
    }
    if !format.border.is_default() {
        write_border(xml, &format.border, true);
    }
    xml.end("dxf");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{FormatBorder, FormatUnderline};

    fn styles_string(table: &FormatTable) -> String {
        let registry = StyleRegistry::new(table, &Palette::default());
        String::from_utf8(generate_styles_xml(&registry)).unwrap()
    }

    #[test]
    fn test_default_format_is_index_zero() {
        let mut table = FormatTable::new();
        assert_eq!(table.resolve(&Format::new()), 0);
        assert_eq!(table.xf_count(), 1);
    }

    #[test]
    fn test_resolve_dedupes_equal_formats() {
        let mut table = FormatTable::new();
        let bold = Format::new().set_bold();
        let a = table.resolve(&bold);
        let b = table.resolve(&Format::new().set_bold());
        let c = table.resolve(&Format::new().set_italic());
        assert_eq!(a, 1);
        assert_eq!(a, b);
        assert_eq!(c, 2);
        assert_eq!(table.xf_count(), 3);
    }

    #[test]
    fn test_dxf_table_is_separate() {
        let mut table = FormatTable::new();
        let red = Format::new().set_font_color(Color::RED);
        assert_eq!(table.resolve_dxf(&red), 0);
        assert_eq!(table.resolve_dxf(&red), 0);
        assert_eq!(table.xf_count(), 1);
        assert_eq!(table.dxf_count(), 1);
    }

    #[test]
    fn test_registry_default_fills_and_dedup() {
        let mut table = FormatTable::new();
        table.resolve(&Format::new().set_bold());
        table.resolve(&Format::new().set_bold().set_border(FormatBorder::Thin));
        let registry = StyleRegistry::new(&table, &Palette::default());
        assert_eq!(registry.font_count(), 2);
        assert_eq!(registry.fill_count(), 2);
        assert_eq!(registry.border_count(), 2);
    }

    #[test]
    fn test_custom_num_formats_start_at_164() {
        let mut table = FormatTable::new();
        table.resolve(&Format::new().set_num_format("0.000"));
        table.resolve(&Format::new().set_num_format("0.00"));
        table.resolve(&Format::new().set_num_format("yyyy-mm-dd"));
        let registry = StyleRegistry::new(&table, &Palette::default());
        let custom: Vec<_> = registry.custom_num_formats().collect();
        assert_eq!(custom, vec![(164, "0.000"), (165, "yyyy-mm-dd")]);
    }

    #[test]
    fn test_styles_xml_contents() {
        let mut table = FormatTable::new();
        table.resolve(
            &Format::new()
                .set_bold()
                .set_underline(FormatUnderline::Single)
                .set_background_color(Color::YELLOW)
                .set_num_format("0.0%"),
        );
        let xml = styles_string(&table);
        assert!(xml.contains("<numFmt numFmtId=\"164\" formatCode=\"0.0%\"/>"));
        assert!(xml.contains("<fills count=\"3\">"));
        assert!(xml.contains("<fill><patternFill patternType=\"gray125\"/></fill>"));
        assert!(xml.contains("<fgColor rgb=\"FFFFFF00\"/><bgColor indexed=\"64\"/>"));
        assert!(xml.contains("<font><b/><u/><sz val=\"11\"/>"));
        assert!(xml.contains("<cellXfs count=\"2\">"));
        assert!(xml.contains("applyNumberFormat=\"1\" applyFont=\"1\" applyFill=\"1\""));
        assert!(!xml.contains("<colors>"));
    }

    #[test]
    fn test_dxf_solid_fill_uses_bg_color() {
        let mut table = FormatTable::new();
        table.resolve_dxf(&Format::new().set_background_color(Color::Rgb(0xFFC7CE)));
        let xml = styles_string(&table);
        assert!(xml.contains(
            "<dxf><fill><patternFill><bgColor rgb=\"FFFFC7CE\"/></patternFill></fill></dxf>"
        ));
    }

    #[test]
    fn test_palette_written_only_when_modified() {
        let mut palette = Palette::default();
        assert!(palette.set(7, 0x123456).is_err());
        palette.set(8, 0x123456).unwrap();
        assert_eq!(palette.rgb(0), 0x123456);
        let registry = StyleRegistry::new(&FormatTable::new(), &palette);
        let xml = String::from_utf8(generate_styles_xml(&registry)).unwrap();
        assert!(xml.contains("<indexedColors><rgbColor rgb=\"FF123456\"/>"));
        assert_eq!(xml.matches("<rgbColor ").count(), 64);
    }

    #[test]
    fn test_protection_and_alignment() {
        let mut table = FormatTable::new();
        table.resolve(
            &Format::new()
                .set_unlocked()
                .set_align(FormatAlign::Center)
                .set_text_wrap(),
        );
        let xml = styles_string(&table);
        assert!(xml.contains(
            "<alignment horizontal=\"center\" wrapText=\"1\"/><protection locked=\"0\"/></xf>"
        ));
    }
}
