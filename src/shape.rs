//! Text boxes and simple preset shapes placed in a worksheet drawing.

use crate::chart::format::{write_run_properties, ChartFont, ChartFormat, HasFormatting};
use crate::drawing::ObjectMovement;
use crate::xml::XmlWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShapeType {
    #[default]
    TextBox,
    Rectangle,
    RoundedRectangle,
    Ellipse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShapeTextHorizontalAlignment {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShapeTextVerticalAlignment {
    #[default]
    Top,
    Middle,
    Bottom,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub(crate) shape_type: ShapeType,
    pub(crate) text: String,
    pub(crate) font: ChartFont,
    pub(crate) format: ChartFormat,
    pub(crate) width: f64,
    pub(crate) height: f64,
    pub(crate) horizontal: ShapeTextHorizontalAlignment,
    pub(crate) vertical: ShapeTextVerticalAlignment,
    pub(crate) movement: ObjectMovement,
    pub(crate) alt_text: String,
    pub(crate) decorative: bool,
}

impl Default for Shape {
    fn default() -> Self {
        Self {
            shape_type: ShapeType::TextBox,
            text: String::new(),
            font: ChartFont::default(),
            format: ChartFormat::default(),
            width: 192.0,
            height: 120.0,
            horizontal: ShapeTextHorizontalAlignment::Left,
            vertical: ShapeTextVerticalAlignment::Top,
            movement: ObjectMovement::MoveAndSizeWithCells,
            alt_text: String::new(),
            decorative: false,
        }
    }
}

impl Shape {
    pub fn textbox() -> Self {
        Self::default()
    }

    pub fn new(shape_type: ShapeType) -> Self {
        Self {
            shape_type,
            ..Self::default()
        }
    }

    pub fn set_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn set_font(mut self, font: ChartFont) -> Self {
        self.font = font;
        self
    }

    /// Size in pixels.
    pub fn set_size(mut self, width: f64, height: f64) -> Self {
        if width > 0.0 && height > 0.0 {
            self.width = width;
            self.height = height;
        }
        self
    }

    pub fn set_text_alignment(
        mut self,
        horizontal: ShapeTextHorizontalAlignment,
        vertical: ShapeTextVerticalAlignment,
    ) -> Self {
        self.horizontal = horizontal;
        self.vertical = vertical;
        self
    }

    pub fn set_object_movement(mut self, movement: ObjectMovement) -> Self {
        self.movement = movement;
        self
    }

    pub fn set_alt_text(mut self, alt_text: &str) -> Self {
        self.alt_text = alt_text.to_string();
        self
    }

    pub fn set_decorative(mut self, decorative: bool) -> Self {
        self.decorative = decorative;
        self
    }

    pub(crate) fn is_text_box(&self) -> bool {
        self.shape_type == ShapeType::TextBox
    }

    pub(crate) fn preset(&self) -> &'static str {
        match self.shape_type {
            ShapeType::TextBox | ShapeType::Rectangle => "rect",
            ShapeType::RoundedRectangle => "roundRect",
            ShapeType::Ellipse => "ellipse",
        }
    }

    pub(crate) fn write_text_body(&self, xml: &mut XmlWriter) {
        let anchor = match self.vertical {
            ShapeTextVerticalAlignment::Top => "t",
            ShapeTextVerticalAlignment::Middle => "ctr",
            ShapeTextVerticalAlignment::Bottom => "b",
        };
        let algn = match self.horizontal {
            ShapeTextHorizontalAlignment::Left => "l",
            ShapeTextHorizontalAlignment::Center => "ctr",
            ShapeTextHorizontalAlignment::Right => "r",
        };
        xml.start("xdr:txBody");
        xml.empty_with(
            "a:bodyPr",
            &[
                ("vertOverflow", "clip"),
                ("wrap", "square"),
                ("lIns", "27432"),
                ("tIns", "22860"),
                ("rIns", "27432"),
                ("bIns", "22860"),
                ("anchor", anchor),
                ("upright", "1"),
            ],
        );
        xml.empty("a:lstStyle");
        if self.text.is_empty() {
            xml.start("a:p");
            xml.empty_with("a:pPr", &[("algn", algn)]);
            xml.empty_with("a:endParaRPr", &[("lang", "en-US"), ("sz", "1100")]);
            xml.end("a:p");
        }
        let font = if self.font.size.is_none() {
            self.font.clone().set_size(11.0)
        } else {
            self.font.clone()
        };
        for line in self.text.lines() {
            xml.start("a:p");
            xml.empty_with("a:pPr", &[("algn", algn)]);
            if !line.is_empty() {
                xml.start("a:r");
                write_run_properties(xml, "a:rPr", &font, false);
                xml.data("a:t", line);
                xml.end("a:r");
            }
            xml.end("a:p");
        }
        xml.end("xdr:txBody");
    }
}

impl HasFormatting for Shape {
    fn format(&self) -> &ChartFormat {
        &self.format
    }

    fn format_mut(&mut self) -> &mut ChartFormat {
        &mut self.format
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::format::ChartSolidFill;
    use crate::format::Color;

    #[test]
    fn test_text_body_paragraphs() {
        let shape = Shape::textbox()
            .set_text("Line one\nLine two & more")
            .set_text_alignment(ShapeTextHorizontalAlignment::Center, ShapeTextVerticalAlignment::Middle);
        let mut xml = XmlWriter::new();
        shape.write_text_body(&mut xml);
        let xml = xml.into_string();
        assert!(xml.contains("anchor=\"ctr\""));
        assert_eq!(xml.matches("<a:p>").count(), 2);
        assert!(xml.contains("<a:t>Line two &amp; more</a:t>"));
        assert!(xml.contains("<a:rPr lang=\"en-US\" sz=\"1100\" b=\"0\" baseline=\"0\"/>"));
    }

    #[test]
    fn test_shape_formatting_via_trait() {
        let mut shape = Shape::new(ShapeType::Ellipse);
        shape.set_solid_fill(ChartSolidFill::new().set_color(Color::YELLOW));
        assert_eq!(shape.preset(), "ellipse");
        assert!(!shape.is_text_box());
        assert!(shape.fill().is_some());
    }
}
