//! Cell formatting: fonts, fills, borders, alignment, number formats and
//! protection flags, built fluently and deduplicated by
//! [`FormatTable`](crate::styles::FormatTable).

use crate::error::{Result, WriteError};

// ============================================================================
// Colors
// ============================================================================

/// A color reference as Excel stores it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Color {
    /// Leave the attribute out and let Excel choose.
    #[default]
    Default,
    Automatic,
    /// 0xRRGGBB.
    Rgb(u32),
    /// Theme color slot and tint/shade step (0..=5).
    Theme(u8, u8),
    /// Legacy palette index, see [`Palette`](crate::styles::Palette).
    Indexed(u8),
}

impl Color {
    pub const BLACK: Color = Color::Rgb(0x000000);
    pub const WHITE: Color = Color::Rgb(0xFFFFFF);
    pub const RED: Color = Color::Rgb(0xFF0000);
    pub const GREEN: Color = Color::Rgb(0x008000);
    pub const BLUE: Color = Color::Rgb(0x0000FF);
    pub const YELLOW: Color = Color::Rgb(0xFFFF00);
    pub const ORANGE: Color = Color::Rgb(0xFFA500);
    pub const PURPLE: Color = Color::Rgb(0x800080);
    pub const GRAY: Color = Color::Rgb(0x808080);
    pub const SILVER: Color = Color::Rgb(0xC0C0C0);
    pub const NAVY: Color = Color::Rgb(0x000080);
    pub const BROWN: Color = Color::Rgb(0x800000);
    pub const CYAN: Color = Color::Rgb(0x00FFFF);
    pub const MAGENTA: Color = Color::Rgb(0xFF00FF);
    pub const LIME: Color = Color::Rgb(0x00FF00);

    /// Parse "#RRGGBB" or "RRGGBB".
    pub fn from_hex(hex: &str) -> Result<Color> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 {
            return Err(WriteError::Parameter(format!("invalid hex color '{}'", hex)));
        }
        u32::from_str_radix(digits, 16)
            .map(Color::Rgb)
            .map_err(|_| WriteError::Parameter(format!("invalid hex color '{}'", hex)))
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Color::Default)
    }

    /// "FFRRGGBB" for styles.xml; `None` for non-RGB colors.
    pub fn argb_hex(&self) -> Option<String> {
        match self {
            Color::Rgb(rgb) => Some(format!("FF{:06X}", rgb & 0xFFFFFF)),
            _ => None,
        }
    }

    /// "RRGGBB" for DrawingML.
    pub fn rgb_hex(&self) -> Option<String> {
        match self {
            Color::Rgb(rgb) => Some(format!("{:06X}", rgb & 0xFFFFFF)),
            _ => None,
        }
    }

    /// Attribute pair for `<color>`-like elements in styles.xml.
    pub(crate) fn style_attributes(&self) -> Vec<(&'static str, String)> {
        match self {
            Color::Default => Vec::new(),
            Color::Automatic => vec![("auto", "1".to_string())],
            Color::Rgb(_) => vec![("rgb", self.argb_hex().unwrap_or_default())],
            Color::Theme(theme, shade) => {
                let mut attrs = vec![("theme", theme.to_string())];
                if let Some(tint) = theme_tint(*shade) {
                    attrs.push(("tint", tint.to_string()));
                }
                attrs
            }
            Color::Indexed(idx) => vec![("indexed", idx.to_string())],
        }
    }

    pub(crate) fn key(&self) -> String {
        match self {
            Color::Default => String::new(),
            Color::Automatic => "auto".to_string(),
            Color::Rgb(rgb) => format!("{:06X}", rgb),
            Color::Theme(t, s) => format!("t{}.{}", t, s),
            Color::Indexed(i) => format!("i{}", i),
        }
    }
}

fn theme_tint(shade: u8) -> Option<f64> {
    match shade {
        1 => Some(0.79998168889431442),
        2 => Some(0.59999389629810485),
        3 => Some(0.39997558519241921),
        4 => Some(-0.249977111117893),
        5 => Some(-0.499984740745262),
        _ => None,
    }
}

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatUnderline {
    #[default]
    None,
    Single,
    Double,
    SingleAccounting,
    DoubleAccounting,
}

impl FormatUnderline {
    pub(crate) fn val(&self) -> Option<&'static str> {
        match self {
            FormatUnderline::None => None,
            FormatUnderline::Single => Some("single"),
            FormatUnderline::Double => Some("double"),
            FormatUnderline::SingleAccounting => Some("singleAccounting"),
            FormatUnderline::DoubleAccounting => Some("doubleAccounting"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatScript {
    #[default]
    None,
    Superscript,
    Subscript,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatPattern {
    #[default]
    None,
    Solid,
    MediumGray,
    DarkGray,
    LightGray,
    DarkHorizontal,
    DarkVertical,
    DarkDown,
    DarkUp,
    DarkGrid,
    DarkTrellis,
    LightHorizontal,
    LightVertical,
    LightDown,
    LightUp,
    LightGrid,
    LightTrellis,
    Gray125,
    Gray0625,
}

impl FormatPattern {
    pub(crate) fn val(&self) -> &'static str {
        match self {
            FormatPattern::None => "none",
            FormatPattern::Solid => "solid",
            FormatPattern::MediumGray => "mediumGray",
            FormatPattern::DarkGray => "darkGray",
            FormatPattern::LightGray => "lightGray",
            FormatPattern::DarkHorizontal => "darkHorizontal",
            FormatPattern::DarkVertical => "darkVertical",
            FormatPattern::DarkDown => "darkDown",
            FormatPattern::DarkUp => "darkUp",
            FormatPattern::DarkGrid => "darkGrid",
            FormatPattern::DarkTrellis => "darkTrellis",
            FormatPattern::LightHorizontal => "lightHorizontal",
            FormatPattern::LightVertical => "lightVertical",
            FormatPattern::LightDown => "lightDown",
            FormatPattern::LightUp => "lightUp",
            FormatPattern::LightGrid => "lightGrid",
            FormatPattern::LightTrellis => "lightTrellis",
            FormatPattern::Gray125 => "gray125",
            FormatPattern::Gray0625 => "gray0625",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatBorder {
    #[default]
    None,
    Thin,
    Medium,
    Dashed,
    Dotted,
    Thick,
    Double,
    Hair,
    MediumDashed,
    DashDot,
    MediumDashDot,
    DashDotDot,
    MediumDashDotDot,
    SlantDashDot,
}

impl FormatBorder {
    pub(crate) fn val(&self) -> Option<&'static str> {
        match self {
            FormatBorder::None => None,
            FormatBorder::Thin => Some("thin"),
            FormatBorder::Medium => Some("medium"),
            FormatBorder::Dashed => Some("dashed"),
            FormatBorder::Dotted => Some("dotted"),
            FormatBorder::Thick => Some("thick"),
            FormatBorder::Double => Some("double"),
            FormatBorder::Hair => Some("hair"),
            FormatBorder::MediumDashed => Some("mediumDashed"),
            FormatBorder::DashDot => Some("dashDot"),
            FormatBorder::MediumDashDot => Some("mediumDashDot"),
            FormatBorder::DashDotDot => Some("dashDotDot"),
            FormatBorder::MediumDashDotDot => Some("mediumDashDotDot"),
            FormatBorder::SlantDashDot => Some("slantDashDot"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatDiagonalBorder {
    #[default]
    None,
    BorderUp,
    BorderDown,
    BorderUpDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatAlign {
    #[default]
    General,
    Left,
    Center,
    Right,
    Fill,
    Justify,
    CenterAcross,
    Distributed,
    Top,
    VerticalCenter,
    Bottom,
    VerticalJustify,
    VerticalDistributed,
}

// ============================================================================
// Format components
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub(crate) bold: bool,
    pub(crate) italic: bool,
    pub(crate) underline: FormatUnderline,
    pub(crate) strikethrough: bool,
    pub(crate) size: f64,
    pub(crate) color: Color,
    pub(crate) name: String,
    pub(crate) family: u8,
    pub(crate) scheme: String,
    pub(crate) script: FormatScript,
    pub(crate) outline: bool,
    pub(crate) shadow: bool,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            bold: false,
            italic: false,
            underline: FormatUnderline::None,
            strikethrough: false,
            size: 11.0,
            color: Color::Default,
            name: "Calibri".to_string(),
            family: 2,
            scheme: "minor".to_string(),
            script: FormatScript::None,
            outline: false,
            shadow: false,
        }
    }
}

impl Font {
    pub(crate) fn key(&self) -> String {
        format!(
            "{}:{}:{:?}:{}:{}:{}:{}:{}:{}:{:?}:{}:{}",
            self.bold,
            self.italic,
            self.underline,
            self.strikethrough,
            self.size,
            self.color.key(),
            self.name,
            self.family,
            self.scheme,
            self.script,
            self.outline,
            self.shadow
        )
    }

    pub(crate) fn is_default(&self) -> bool {
        *self == Font::default()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fill {
    pub(crate) pattern: FormatPattern,
    pub(crate) foreground: Color,
    pub(crate) background: Color,
}

impl Fill {
    /// Excel's quirk: a solid fill set only through the background color
    /// is stored with the color as the foreground.
    pub(crate) fn normalized(&self) -> Fill {
        let mut fill = self.clone();
        if fill.pattern == FormatPattern::None || fill.pattern == FormatPattern::Solid {
            if !fill.background.is_default() && fill.foreground.is_default() {
                fill.foreground = fill.background;
                fill.background = Color::Default;
                fill.pattern = FormatPattern::Solid;
            } else if !fill.foreground.is_default() {
                fill.pattern = FormatPattern::Solid;
            }
        }
        fill
    }

    pub(crate) fn key(&self) -> String {
        format!(
            "{:?}:{}:{}",
            self.pattern,
            self.foreground.key(),
            self.background.key()
        )
    }

    pub(crate) fn is_default(&self) -> bool {
        *self == Fill::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BorderSide {
    pub(crate) style: FormatBorder,
    pub(crate) color: Color,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Border {
    pub(crate) left: BorderSide,
    pub(crate) right: BorderSide,
    pub(crate) top: BorderSide,
    pub(crate) bottom: BorderSide,
    pub(crate) diagonal: BorderSide,
    pub(crate) diagonal_type: FormatDiagonalBorder,
}

impl Border {
    pub(crate) fn key(&self) -> String {
        let side = |s: &BorderSide| format!("{:?}/{}", s.style, s.color.key());
        format!(
            "{}:{}:{}:{}:{}:{:?}",
            side(&self.left),
            side(&self.right),
            side(&self.top),
            side(&self.bottom),
            side(&self.diagonal),
            self.diagonal_type
        )
    }

    pub(crate) fn is_default(&self) -> bool {
        *self == Border::default()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Alignment {
    pub(crate) horizontal: FormatAlign,
    pub(crate) vertical: FormatAlign,
    pub(crate) text_wrap: bool,
    pub(crate) rotation: i16,
    pub(crate) indent: u8,
    pub(crate) shrink: bool,
    pub(crate) reading_direction: u8,
}

impl Alignment {
    pub(crate) fn is_default(&self) -> bool {
        *self == Alignment::default()
    }

    pub(crate) fn key(&self) -> String {
        format!(
            "{:?}:{:?}:{}:{}:{}:{}:{}",
            self.horizontal,
            self.vertical,
            self.text_wrap,
            self.rotation,
            self.indent,
            self.shrink,
            self.reading_direction
        )
    }
}

// ============================================================================
// Format
// ============================================================================

/// A cell format. Build with the `set_*` methods, then pass by reference to
/// the worksheet write calls.
///
/// ```
/// use oxlsx::{Color, Format, FormatBorder};
///
/// let header = Format::new()
///     .set_bold()
///     .set_background_color(Color::Rgb(0xD9E1F2))
///     .set_border(FormatBorder::Thin);
/// # let _ = header;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Format {
    pub(crate) font: Font,
    pub(crate) fill: Fill,
    pub(crate) border: Border,
    pub(crate) alignment: Alignment,
    pub(crate) num_format: String,
    pub(crate) num_format_index: Option<u16>,
    pub(crate) locked: bool,
    pub(crate) hidden: bool,
    pub(crate) quote_prefix: bool,
}

impl Default for Format {
    fn default() -> Self {
        Self {
            font: Font::default(),
            fill: Fill::default(),
            border: Border::default(),
            alignment: Alignment::default(),
            num_format: String::new(),
            num_format_index: None,
            locked: true,
            hidden: false,
            quote_prefix: false,
        }
    }
}

impl Format {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity used for deduplication. Two formats with equal keys share a
    /// style index.
    pub fn key(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{:?}|{}|{}|{}",
            self.font.key(),
            self.fill.normalized().key(),
            self.border.key(),
            self.alignment.key(),
            self.num_format,
            self.num_format_index,
            self.locked,
            self.hidden,
            self.quote_prefix
        )
    }

    // ---- font ----

    pub fn set_bold(mut self) -> Self {
        self.font.bold = true;
        self
    }

    pub fn set_italic(mut self) -> Self {
        self.font.italic = true;
        self
    }

    pub fn set_underline(mut self, underline: FormatUnderline) -> Self {
        self.font.underline = underline;
        self
    }

    pub fn set_font_strikethrough(mut self) -> Self {
        self.font.strikethrough = true;
        self
    }

    pub fn set_font_size(mut self, size: f64) -> Self {
        self.font.size = size;
        self
    }

    pub fn set_font_color(mut self, color: Color) -> Self {
        self.font.color = color;
        self
    }

    /// Non-Calibri fonts drop the "minor" scheme so Excel keeps the name.
    pub fn set_font_name(mut self, name: &str) -> Self {
        self.font.name = name.to_string();
        if name != "Calibri" {
            self.font.scheme = String::new();
        }
        self
    }

    pub fn set_font_family(mut self, family: u8) -> Self {
        self.font.family = family;
        self
    }

    pub fn set_font_script(mut self, script: FormatScript) -> Self {
        self.font.script = script;
        self
    }

    pub fn set_font_outline(mut self) -> Self {
        self.font.outline = true;
        self
    }

    pub fn set_font_shadow(mut self) -> Self {
        self.font.shadow = true;
        self
    }

    // ---- number format ----

    /// Custom or built-in number format code, e.g. `"0.00%"`.
    pub fn set_num_format(mut self, num_format: &str) -> Self {
        self.num_format = num_format.to_string();
        self.num_format_index = None;
        self
    }

    /// One of Excel's built-in number formats by index (0..=49).
    pub fn set_num_format_index(mut self, index: u8) -> Self {
        self.num_format_index = Some(index as u16);
        self.num_format.clear();
        self
    }

    // ---- fill ----

    pub fn set_pattern(mut self, pattern: FormatPattern) -> Self {
        self.fill.pattern = pattern;
        self
    }

    pub fn set_background_color(mut self, color: Color) -> Self {
        self.fill.background = color;
        self
    }

    pub fn set_foreground_color(mut self, color: Color) -> Self {
        self.fill.foreground = color;
        self
    }

    // ---- borders ----

    pub fn set_border(mut self, style: FormatBorder) -> Self {
        self.border.left.style = style;
        self.border.right.style = style;
        self.border.top.style = style;
        self.border.bottom.style = style;
        self
    }

    pub fn set_border_color(mut self, color: Color) -> Self {
        self.border.left.color = color;
        self.border.right.color = color;
        self.border.top.color = color;
        self.border.bottom.color = color;
        self
    }

    pub fn set_border_left(mut self, style: FormatBorder) -> Self {
        self.border.left.style = style;
        self
    }

    pub fn set_border_right(mut self, style: FormatBorder) -> Self {
        self.border.right.style = style;
        self
    }

    pub fn set_border_top(mut self, style: FormatBorder) -> Self {
        self.border.top.style = style;
        self
    }

    pub fn set_border_bottom(mut self, style: FormatBorder) -> Self {
        self.border.bottom.style = style;
        self
    }

    pub fn set_border_left_color(mut self, color: Color) -> Self {
        self.border.left.color = color;
        self
    }

    pub fn set_border_right_color(mut self, color: Color) -> Self {
        self.border.right.color = color;
        self
    }

    pub fn set_border_top_color(mut self, color: Color) -> Self {
        self.border.top.color = color;
        self
    }

    pub fn set_border_bottom_color(mut self, color: Color) -> Self {
        self.border.bottom.color = color;
        self
    }

    pub fn set_border_diagonal(mut self, style: FormatBorder) -> Self {
        self.border.diagonal.style = style;
        self
    }

    pub fn set_border_diagonal_color(mut self, color: Color) -> Self {
        self.border.diagonal.color = color;
        self
    }

    pub fn set_border_diagonal_type(mut self, diagonal: FormatDiagonalBorder) -> Self {
        self.border.diagonal_type = diagonal;
        self
    }

    // ---- alignment ----

    /// Horizontal or vertical alignment, depending on the variant.
    pub fn set_align(mut self, align: FormatAlign) -> Self {
        match align {
            FormatAlign::Top
            | FormatAlign::VerticalCenter
            | FormatAlign::Bottom
            | FormatAlign::VerticalJustify
            | FormatAlign::VerticalDistributed => self.alignment.vertical = align,
            _ => self.alignment.horizontal = align,
        }
        self
    }

    pub fn set_text_wrap(mut self) -> Self {
        self.alignment.text_wrap = true;
        self
    }

    /// Text rotation in degrees (-90..=90) or 270 for stacked text.
    pub fn set_rotation(mut self, rotation: i16) -> Self {
        self.alignment.rotation = match rotation {
            270 => 255,
            -90..=-1 => 90 - rotation,
            0..=90 => rotation,
            _ => {
                log::warn!("ignoring rotation {} outside -90..=90 or 270", rotation);
                self.alignment.rotation
            }
        };
        self
    }

    pub fn set_indent(mut self, indent: u8) -> Self {
        self.alignment.indent = indent;
        self
    }

    pub fn set_shrink(mut self) -> Self {
        self.alignment.shrink = true;
        self
    }

    pub fn set_reading_direction(mut self, direction: u8) -> Self {
        self.alignment.reading_direction = direction.min(2);
        self
    }

    // ---- protection ----

    pub fn set_unlocked(mut self) -> Self {
        self.locked = false;
        self
    }

    pub fn set_hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn set_quote_prefix(mut self) -> Self {
        self.quote_prefix = true;
        self
    }

    pub(crate) fn has_protection(&self) -> bool {
        !self.locked || self.hidden
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_formats_share_key() {
        let a = Format::new().set_bold().set_font_color(Color::RED);
        let b = Format::new().set_font_color(Color::RED).set_bold();
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), Format::new().key());
    }

    #[test]
    fn test_background_only_fill_becomes_solid() {
        let fill = Format::new().set_background_color(Color::YELLOW).fill.normalized();
        assert_eq!(fill.pattern, FormatPattern::Solid);
        assert_eq!(fill.foreground, Color::YELLOW);
        assert_eq!(fill.background, Color::Default);
    }

    #[test]
    fn test_color_from_hex() {
        assert_eq!(Color::from_hex("#FF8000").unwrap(), Color::Rgb(0xFF8000));
        assert_eq!(Color::RED.argb_hex().unwrap(), "FFFF0000");
        assert!(Color::from_hex("#FFF").is_err());
    }

    #[test]
    fn test_rotation_mapping() {
        assert_eq!(Format::new().set_rotation(-45).alignment.rotation, 135);
        assert_eq!(Format::new().set_rotation(270).alignment.rotation, 255);
        assert_eq!(Format::new().set_rotation(30).alignment.rotation, 30);
    }

    #[test]
    fn test_align_routes_vertical_variants() {
        let f = Format::new()
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter);
        assert_eq!(f.alignment.horizontal, FormatAlign::Center);
        assert_eq!(f.alignment.vertical, FormatAlign::VerticalCenter);
    }
}
