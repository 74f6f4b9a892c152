//! Line, fill and font formatting shared by every formattable chart element,
//! and the DrawingML writers for `spPr` / `txPr`.

use crate::error::{Result, WriteError};
use crate::format::Color;
use crate::styles::Palette;
use crate::xml::XmlWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartLineDashType {
    #[default]
    Solid,
    RoundDot,
    SquareDot,
    Dash,
    DashDot,
    LongDash,
    LongDashDot,
    LongDashDotDot,
}

impl ChartLineDashType {
    const fn xml_value(&self) -> &'static str {
        match self {
            Self::Solid => "solid",
            Self::RoundDot => "sysDot",
            Self::SquareDot => "sysDash",
            Self::Dash => "dash",
            Self::DashDot => "dashDot",
            Self::LongDash => "lgDash",
            Self::LongDashDot => "lgDashDot",
            Self::LongDashDotDot => "lgDashDotDot",
        }
    }
}

/// Border / line properties.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartLine {
    pub(crate) color: Color,
    /// Points.
    pub(crate) width: Option<f64>,
    pub(crate) dash_type: ChartLineDashType,
    pub(crate) transparency: u8,
}

impl ChartLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn set_width(mut self, width: f64) -> Self {
        if width > 0.0 {
            self.width = Some(width.min(1584.0));
        }
        self
    }

    pub fn set_dash_type(mut self, dash_type: ChartLineDashType) -> Self {
        self.dash_type = dash_type;
        self
    }

    pub fn set_transparency(mut self, transparency: u8) -> Self {
        self.transparency = transparency.min(100);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartSolidFill {
    pub(crate) color: Color,
    pub(crate) transparency: u8,
}

impl ChartSolidFill {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn set_transparency(mut self, transparency: u8) -> Self {
        self.transparency = transparency.min(100);
        self
    }
}

/// DrawingML preset patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartPatternFillType {
    Percent5,
    Percent10,
    Percent20,
    Percent25,
    Percent30,
    Percent40,
    Percent50,
    Percent60,
    Percent70,
    Percent75,
    Percent80,
    Percent90,
    LightDownwardDiagonal,
    LightUpwardDiagonal,
    DarkDownwardDiagonal,
    DarkUpwardDiagonal,
    WideDownwardDiagonal,
    WideUpwardDiagonal,
    LightVertical,
    LightHorizontal,
    NarrowVertical,
    NarrowHorizontal,
    DarkVertical,
    DarkHorizontal,
    DashedDownwardDiagonal,
    DashedUpwardDiagonal,
    DashedHorizontal,
    DashedVertical,
    SmallConfetti,
    LargeConfetti,
    Zigzag,
    Wave,
    DiagonalBrick,
    HorizontalBrick,
    Weave,
    Plaid,
    Divot,
    DottedGrid,
    DottedDiamond,
    Shingle,
    Trellis,
    Sphere,
    SmallGrid,
    LargeGrid,
    SmallCheck,
    LargeCheck,
    OutlinedDiamond,
    SolidDiamond,
}

impl ChartPatternFillType {
    const fn xml_value(&self) -> &'static str {
        match self {
            Self::Percent5 => "pct5",
            Self::Percent10 => "pct10",
            Self::Percent20 => "pct20",
            Self::Percent25 => "pct25",
            Self::Percent30 => "pct30",
            Self::Percent40 => "pct40",
            Self::Percent50 => "pct50",
            Self::Percent60 => "pct60",
            Self::Percent70 => "pct70",
            Self::Percent75 => "pct75",
            Self::Percent80 => "pct80",
            Self::Percent90 => "pct90",
            Self::LightDownwardDiagonal => "ltDnDiag",
            Self::LightUpwardDiagonal => "ltUpDiag",
            Self::DarkDownwardDiagonal => "dkDnDiag",
            Self::DarkUpwardDiagonal => "dkUpDiag",
            Self::WideDownwardDiagonal => "wdDnDiag",
            Self::WideUpwardDiagonal => "wdUpDiag",
            Self::LightVertical => "ltVert",
            Self::LightHorizontal => "ltHorz",
            Self::NarrowVertical => "narVert",
            Self::NarrowHorizontal => "narHorz",
            Self::DarkVertical => "dkVert",
            Self::DarkHorizontal => "dkHorz",
            Self::DashedDownwardDiagonal => "dashDnDiag",
            Self::DashedUpwardDiagonal => "dashUpDiag",
            Self::DashedHorizontal => "dashHorz",
            Self::DashedVertical => "dashVert",
            Self::SmallConfetti => "smConfetti",
            Self::LargeConfetti => "lgConfetti",
            Self::Zigzag => "zigZag",
            Self::Wave => "wave",
            Self::DiagonalBrick => "diagBrick",
            Self::HorizontalBrick => "horzBrick",
            Self::Weave => "weave",
            Self::Plaid => "plaid",
            Self::Divot => "divot",
            Self::DottedGrid => "dotGrid",
            Self::DottedDiamond => "dotDmnd",
            Self::Shingle => "shingle",
            Self::Trellis => "trellis",
            Self::Sphere => "sphere",
            Self::SmallGrid => "smGrid",
            Self::LargeGrid => "lgGrid",
            Self::SmallCheck => "smCheck",
            Self::LargeCheck => "lgCheck",
            Self::OutlinedDiamond => "openDmnd",
            Self::SolidDiamond => "solidDmnd",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartPatternFill {
    pub(crate) pattern: ChartPatternFillType,
    pub(crate) foreground: Color,
    pub(crate) background: Color,
}

impl ChartPatternFill {
    /// A pattern needs an explicit foreground color; the background
    /// defaults to white.
    pub fn new(pattern: ChartPatternFillType, foreground: Color) -> Result<Self> {
        if foreground.is_default() {
            return Err(WriteError::Pattern(
                "pattern fill requires a foreground color".to_string(),
            ));
        }
        Ok(Self {
            pattern,
            foreground,
            background: Color::WHITE,
        })
    }

    pub fn set_background_color(mut self, color: Color) -> Self {
        self.background = color;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartGradientFillType {
    #[default]
    Linear,
    Radial,
    Rectangular,
    Path,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartGradientStop {
    pub(crate) color: Color,
    /// 0..=100 percent along the gradient.
    pub(crate) position: u8,
}

impl ChartGradientStop {
    pub fn new(color: Color, position: u8) -> Self {
        Self { color, position }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartGradientFill {
    pub(crate) gradient_type: ChartGradientFillType,
    pub(crate) stops: Vec<ChartGradientStop>,
    pub(crate) angle: u16,
}

impl ChartGradientFill {
    /// Between 2 and 10 stops, each at a position in 0..=100.
    pub fn new(stops: &[ChartGradientStop]) -> Result<Self> {
        if !(2..=10).contains(&stops.len()) {
            return Err(WriteError::Gradient(format!(
                "gradient needs 2 to 10 stops, got {}",
                stops.len()
            )));
        }
        if let Some(stop) = stops.iter().find(|s| s.position > 100) {
            return Err(WriteError::Gradient(format!(
                "gradient stop position {} outside 0-100",
                stop.position
            )));
        }
        Ok(Self {
            gradient_type: ChartGradientFillType::Linear,
            stops: stops.to_vec(),
            angle: 90,
        })
    }

    pub fn set_type(mut self, gradient_type: ChartGradientFillType) -> Self {
        self.gradient_type = gradient_type;
        self
    }

    /// Linear gradients only; 0..360 degrees.
    pub fn set_angle(mut self, angle: u16) -> Result<Self> {
        if angle >= 360 {
            return Err(WriteError::Gradient(format!(
                "gradient angle {} outside 0-359",
                angle
            )));
        }
        self.angle = angle;
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) enum ChartFill {
    #[default]
    Automatic,
    None,
    Solid(ChartSolidFill),
    Pattern(ChartPatternFill),
    Gradient(ChartGradientFill),
}

/// Line and area formatting for one chart element.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartFormat {
    pub(crate) line: Option<ChartLine>,
    pub(crate) no_line: bool,
    pub(crate) fill: ChartFill,
}

impl ChartFormat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.line.is_none() && !self.no_line && self.fill == ChartFill::Automatic
    }
}

/// Uniform access to the line / fill / pattern / gradient of any chart
/// element that can be formatted.
pub trait HasFormatting {
    fn format(&self) -> &ChartFormat;

    fn format_mut(&mut self) -> &mut ChartFormat;

    fn line(&self) -> Option<&ChartLine> {
        self.format().line.as_ref()
    }

    fn fill(&self) -> Option<&ChartSolidFill> {
        match &self.format().fill {
            ChartFill::Solid(fill) => Some(fill),
            _ => None,
        }
    }

    fn pattern(&self) -> Option<&ChartPatternFill> {
        match &self.format().fill {
            ChartFill::Pattern(pattern) => Some(pattern),
            _ => None,
        }
    }

    fn gradient(&self) -> Option<&ChartGradientFill> {
        match &self.format().fill {
            ChartFill::Gradient(gradient) => Some(gradient),
            _ => None,
        }
    }

    fn set_line(&mut self, line: ChartLine) -> &mut Self {
        let format = self.format_mut();
        format.line = Some(line);
        format.no_line = false;
        self
    }

    fn set_no_line(&mut self) -> &mut Self {
        let format = self.format_mut();
        format.line = None;
        format.no_line = true;
        self
    }

    fn set_solid_fill(&mut self, fill: ChartSolidFill) -> &mut Self {
        self.format_mut().fill = ChartFill::Solid(fill);
        self
    }

    fn set_no_fill(&mut self) -> &mut Self {
        self.format_mut().fill = ChartFill::None;
        self
    }

    fn set_pattern_fill(&mut self, pattern: ChartPatternFill) -> &mut Self {
        self.format_mut().fill = ChartFill::Pattern(pattern);
        self
    }

    fn set_gradient_fill(&mut self, gradient: ChartGradientFill) -> &mut Self {
        self.format_mut().fill = ChartFill::Gradient(gradient);
        self
    }
}

impl HasFormatting for ChartFormat {
    fn format(&self) -> &ChartFormat {
        self
    }

    fn format_mut(&mut self) -> &mut ChartFormat {
        self
    }
}

/// Font for titles, axis labels, data labels and legends.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartFont {
    pub(crate) name: Option<String>,
    /// Points.
    pub(crate) size: Option<f64>,
    pub(crate) bold: Option<bool>,
    pub(crate) italic: bool,
    pub(crate) underline: bool,
    pub(crate) color: Color,
    /// Degrees, -90..=90.
    pub(crate) rotation: Option<i16>,
}

impl ChartFont {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn set_size(mut self, size: f64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn set_bold(mut self) -> Self {
        self.bold = Some(true);
        self
    }

    /// Titles are bold by default; this turns that off.
    pub fn unset_bold(mut self) -> Self {
        self.bold = Some(false);
        self
    }

    pub fn set_italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn set_underline(mut self) -> Self {
        self.underline = true;
        self
    }

    pub fn set_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn set_rotation(mut self, rotation: i16) -> Self {
        self.rotation = Some(rotation.clamp(-90, 90));
        self
    }

    pub(crate) fn is_empty(&self) -> bool {
        *self == ChartFont::default()
    }
}

// ============================================================================
// Writers
// ============================================================================

const THEME_NAMES: [&str; 10] = [
    "bg1", "tx1", "bg2", "tx2", "accent1", "accent2", "accent3", "accent4", "accent5", "accent6",
];

fn write_alpha(xml: &mut XmlWriter, transparency: u8) {
    if transparency > 0 {
        let alpha = ((100 - transparency.min(100)) as u32 * 1000).to_string();
        xml.val("a:alpha", &alpha);
    }
}

pub(crate) fn write_color(xml: &mut XmlWriter, color: Color, transparency: u8) {
    match color {
        Color::Theme(theme, shade) => {
            let name = THEME_NAMES.get(theme as usize).copied().unwrap_or("accent1");
            xml.start_with("a:schemeClr", &[("val", name)]);
            let (lum_mod, lum_off) = match shade {
                1 => (Some("20000"), Some("80000")),
                2 => (Some("40000"), Some("60000")),
                3 => (Some("60000"), Some("40000")),
                4 => (Some("75000"), None),
                5 => (Some("50000"), None),
                _ => (None, None),
            };
            if let Some(m) = lum_mod {
                xml.val("a:lumMod", m);
            }
            if let Some(o) = lum_off {
                xml.val("a:lumOff", o);
            }
            write_alpha(xml, transparency);
            xml.end("a:schemeClr");
        }
        other => {
            let rgb = match other {
                Color::Rgb(rgb) => rgb,
                Color::Indexed(idx) => Palette::default().rgb(idx),
                _ => 0,
            };
            let hex = format!("{:06X}", rgb & 0xFFFFFF);
            if transparency > 0 {
                xml.start_with("a:srgbClr", &[("val", &hex)]);
                write_alpha(xml, transparency);
                xml.end("a:srgbClr");
            } else {
                xml.val("a:srgbClr", &hex);
            }
        }
    }
}

fn write_solid_fill(xml: &mut XmlWriter, color: Color, transparency: u8) {
    xml.start("a:solidFill");
    write_color(xml, color, transparency);
    xml.end("a:solidFill");
}

fn write_fill(xml: &mut XmlWriter, fill: &ChartFill) {
    match fill {
        ChartFill::Automatic => {}
        ChartFill::None => xml.empty("a:noFill"),
        ChartFill::Solid(solid) => write_solid_fill(xml, solid.color, solid.transparency),
        ChartFill::Pattern(pattern) => {
            xml.start_with("a:pattFill", &[("prst", pattern.pattern.xml_value())]);
            xml.start("a:fgClr");
            write_color(xml, pattern.foreground, 0);
            xml.end("a:fgClr");
            xml.start("a:bgClr");
            write_color(xml, pattern.background, 0);
            xml.end("a:bgClr");
            xml.end("a:pattFill");
        }
        ChartFill::Gradient(gradient) => write_gradient(xml, gradient),
    }
}

fn write_gradient(xml: &mut XmlWriter, gradient: &ChartGradientFill) {
    match gradient.gradient_type {
        ChartGradientFillType::Linear => xml.start("a:gradFill"),
        _ => xml.start_with("a:gradFill", &[("flip", "none"), ("rotWithShape", "1")]),
    }
    xml.start("a:gsLst");
    for stop in &gradient.stops {
        let pos = (stop.position as u32 * 1000).to_string();
        xml.start_with("a:gs", &[("pos", &pos)]);
        write_color(xml, stop.color, 0);
        xml.end("a:gs");
    }
    xml.end("a:gsLst");
    match gradient.gradient_type {
        ChartGradientFillType::Linear => {
            let angle = (gradient.angle as u32 * 60_000).to_string();
            xml.empty_with("a:lin", &[("ang", &angle), ("scaled", "0")]);
        }
        other => {
            let path = match other {
                ChartGradientFillType::Radial => "circle",
                ChartGradientFillType::Rectangular => "rect",
                _ => "shape",
            };
            xml.start_with("a:path", &[("path", path)]);
            xml.empty_with(
                "a:fillToRect",
                &[("l", "50000"), ("t", "50000"), ("r", "50000"), ("b", "50000")],
            );
            xml.end("a:path");
            xml.start("a:tileRect");
            xml.end("a:tileRect");
        }
    }
    xml.end("a:gradFill");
}

fn write_line(xml: &mut XmlWriter, format: &ChartFormat) {
    if format.no_line {
        xml.start("a:ln");
        xml.empty("a:noFill");
        xml.end("a:ln");
        return;
    }
    let Some(line) = &format.line else {
        return;
    };
    let width = line.width.map(|w| ((w * 12_700.0) + 0.5).floor() as u64);
    match width {
        Some(w) => xml.start_with("a:ln", &[("w", &w.to_string())]),
        None => xml.start("a:ln"),
    }
    if !line.color.is_default() {
        write_solid_fill(xml, line.color, line.transparency);
    }
    if line.dash_type != ChartLineDashType::Solid {
        xml.val("a:prstDash", line.dash_type.xml_value());
    }
    xml.end("a:ln");
}

/// Fill and line children of an `spPr` element.
pub(crate) fn write_fill_and_line(xml: &mut XmlWriter, format: &ChartFormat) {
    write_fill(xml, &format.fill);
    write_line(xml, format);
}

/// `<c:spPr>` for a chart element, omitted when nothing is set.
pub(crate) fn write_sp_pr(xml: &mut XmlWriter, format: &ChartFormat) {
    if format.is_empty() {
        return;
    }
    xml.start("c:spPr");
    write_fill_and_line(xml, format);
    xml.end("c:spPr");
}

/// `<a:defRPr>` / `<a:rPr>` attributes and children for a font.
pub(crate) fn write_run_properties(xml: &mut XmlWriter, tag: &str, font: &ChartFont, default_bold: bool) {
    let size = font.size.map(|s| ((s * 100.0) as u32).to_string());
    let bold = font.bold.unwrap_or(default_bold);
    let mut attrs: Vec<(&str, &str)> = Vec::new();
    if tag == "a:rPr" {
        attrs.push(("lang", "en-US"));
    }
    if let Some(size) = &size {
        attrs.push(("sz", size));
    }
    attrs.push(("b", if bold { "1" } else { "0" }));
    if font.italic {
        attrs.push(("i", "1"));
    }
    if font.underline {
        attrs.push(("u", "sng"));
    }
    if tag == "a:rPr" {
        attrs.push(("baseline", "0"));
    }

    if font.color.is_default() && font.name.is_none() {
        xml.empty_with(tag, &attrs);
        return;
    }
    xml.start_with(tag, &attrs);
    if !font.color.is_default() {
        write_solid_fill(xml, font.color, 0);
    }
    if let Some(name) = &font.name {
        xml.empty_with("a:latin", &[("typeface", name), ("pitchFamily", "34"), ("charset", "0")]);
    }
    xml.end(tag);
}

fn write_body_pr(xml: &mut XmlWriter, rotation: Option<i16>) {
    match rotation {
        Some(rot) => {
            let rot = (rot as i32 * 60_000).to_string();
            xml.empty_with("a:bodyPr", &[("rot", &rot), ("vert", "horz")]);
        }
        None => xml.empty("a:bodyPr"),
    }
}

/// `<c:txPr>` for axis labels, data labels and legends.
pub(crate) fn write_tx_pr(xml: &mut XmlWriter, font: &ChartFont) {
    if font.is_empty() {
        return;
    }
    xml.start("c:txPr");
    write_body_pr(xml, font.rotation);
    xml.empty("a:lstStyle");
    xml.start("a:p");
    xml.start("a:pPr");
    write_run_properties(xml, "a:defRPr", font, false);
    xml.end("a:pPr");
    xml.empty_with("a:endParaRPr", &[("lang", "en-US")]);
    xml.end("a:p");
    xml.end("c:txPr");
}

/// `<c:rich>` body with a single run, used by titles.
pub(crate) fn write_rich_text(xml: &mut XmlWriter, text: &str, font: &ChartFont, default_bold: bool) {
    xml.start("c:rich");
    write_body_pr(xml, font.rotation);
    xml.empty("a:lstStyle");
    xml.start("a:p");
    xml.start("a:pPr");
    write_run_properties(xml, "a:defRPr", font, default_bold);
    xml.end("a:pPr");
    xml.start("a:r");
    write_run_properties(xml, "a:rPr", font, default_bold);
    xml.data("a:t", text);
    xml.end("a:r");
    xml.end("a:p");
    xml.end("c:rich");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sp_pr(format: &ChartFormat) -> String {
        let mut xml = XmlWriter::new();
        write_sp_pr(&mut xml, format);
        xml.into_string()
    }

    #[test]
    fn test_empty_format_writes_nothing() {
        assert_eq!(sp_pr(&ChartFormat::new()), "");
    }

    #[test]
    fn test_solid_fill_and_line() {
        let mut format = ChartFormat::new();
        format
            .set_solid_fill(ChartSolidFill::new().set_color(Color::RED).set_transparency(25))
            .set_line(ChartLine::new().set_color(Color::BLUE).set_width(1.5));
        assert_eq!(
            sp_pr(&format),
            "<c:spPr><a:solidFill><a:srgbClr val=\"FF0000\"><a:alpha val=\"75000\"/></a:srgbClr></a:solidFill>\
<a:ln w=\"19050\"><a:solidFill><a:srgbClr val=\"0000FF\"/></a:solidFill></a:ln></c:spPr>"
        );
    }

    #[test]
    fn test_no_line_no_fill() {
        let mut format = ChartFormat::new();
        format.set_no_fill().set_no_line();
        assert_eq!(
            sp_pr(&format),
            "<c:spPr><a:noFill/><a:ln><a:noFill/></a:ln></c:spPr>"
        );
    }

    #[test]
    fn test_gradient_validation() {
        let one = [ChartGradientStop::new(Color::RED, 0)];
        assert!(matches!(ChartGradientFill::new(&one), Err(WriteError::Gradient(_))));
        let bad_pos = [
            ChartGradientStop::new(Color::RED, 0),
            ChartGradientStop::new(Color::BLUE, 101),
        ];
        assert!(ChartGradientFill::new(&bad_pos).is_err());
        let eleven: Vec<_> = (0..11).map(|i| ChartGradientStop::new(Color::RED, i * 10)).collect();
        assert!(ChartGradientFill::new(&eleven).is_err());
        let ok = [
            ChartGradientStop::new(Color::RED, 0),
            ChartGradientStop::new(Color::BLUE, 100),
        ];
        let gradient = ChartGradientFill::new(&ok).unwrap();
        assert!(gradient.clone().set_angle(360).is_err());

        let mut format = ChartFormat::new();
        format.set_gradient_fill(gradient);
        let xml = sp_pr(&format);
        assert!(xml.contains("<a:gs pos=\"0\"><a:srgbClr val=\"FF0000\"/></a:gs>"));
        assert!(xml.contains("<a:gs pos=\"100000\">"));
        assert!(xml.contains("<a:lin ang=\"5400000\" scaled=\"0\"/>"));
    }

    #[test]
    fn test_pattern_requires_foreground() {
        assert!(matches!(
            ChartPatternFill::new(ChartPatternFillType::Percent5, Color::Default),
            Err(WriteError::Pattern(_))
        ));
        let pattern = ChartPatternFill::new(ChartPatternFillType::Weave, Color::RED).unwrap();
        let mut format = ChartFormat::new();
        format.set_pattern_fill(pattern);
        assert!(sp_pr(&format).contains("<a:pattFill prst=\"weave\"><a:fgClr><a:srgbClr val=\"FF0000\"/></a:fgClr><a:bgClr><a:srgbClr val=\"FFFFFF\"/></a:bgClr></a:pattFill>"));
    }

    #[test]
    fn test_trait_accessors() {
        let mut format = ChartFormat::new();
        assert!(format.fill().is_none());
        format.set_solid_fill(ChartSolidFill::new().set_color(Color::GREEN));
        assert_eq!(format.fill().map(|f| f.color), Some(Color::GREEN));
        assert!(format.pattern().is_none());
        assert!(format.gradient().is_none());
        format.set_line(ChartLine::new().set_dash_type(ChartLineDashType::Dash));
        assert_eq!(format.line().map(|l| l.dash_type), Some(ChartLineDashType::Dash));
    }

    #[test]
    fn test_theme_color_shades() {
        let mut xml = XmlWriter::new();
        write_color(&mut xml, Color::Theme(4, 4), 0);
        assert_eq!(
            xml.into_string(),
            "<a:schemeClr val=\"accent1\"><a:lumMod val=\"75000\"/></a:schemeClr>"
        );
    }

    #[test]
    fn test_font_tx_pr() {
        let mut xml = XmlWriter::new();
        write_tx_pr(&mut xml, &ChartFont::new().set_size(9.0).set_rotation(-45));
        assert_eq!(
            xml.into_string(),
            "<c:txPr><a:bodyPr rot=\"-2700000\" vert=\"horz\"/><a:lstStyle/><a:p><a:pPr><a:defRPr sz=\"900\" b=\"0\"/></a:pPr><a:endParaRPr lang=\"en-US\"/></a:p></c:txPr>"
        );
    }
}
