//! Cell notes: `xl/commentsN.xml` holds the text and authors, the legacy
//! VML drawing holds the yellow pop-up boxes Excel shows on hover.

use crate::drawing::{position_object_pixels, ObjectMovement, ObjectPosition, SheetGeometry};
use crate::error::{Result, WriteError};
use crate::format::Color;
use crate::utility::{cell_ref, format_number};
use crate::validation::{validate_string_length, MAX_COLS, MAX_ROWS};
use crate::xml::{XmlWriter, NS_SPREADSHEETML};

const NOTE_WIDTH: f64 = 128.0;
const NOTE_HEIGHT: f64 = 74.0;
const NOTE_FILL: u32 = 0xFFFFE1;

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub(crate) text: String,
    pub(crate) author: Option<String>,
    pub(crate) visible: bool,
    pub(crate) width: f64,
    pub(crate) height: f64,
    pub(crate) background: Color,
    pub(crate) font_name: String,
    pub(crate) font_size: f64,
}

impl Note {
    pub fn new(text: &str) -> Result<Self> {
        validate_string_length(text)?;
        Ok(Self {
            text: text.to_string(),
            author: None,
            visible: false,
            width: NOTE_WIDTH,
            height: NOTE_HEIGHT,
            background: Color::Rgb(NOTE_FILL),
            font_name: "Tahoma".to_string(),
            font_size: 8.0,
        })
    }

    pub fn set_author(mut self, author: &str) -> Self {
        self.author = Some(author.to_string());
        self
    }

    /// Keep the note box open instead of showing it on hover.
    pub fn set_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Box size in pixels.
    pub fn set_size(mut self, width: f64, height: f64) -> Result<Self> {
        if width <= 0.0 || height <= 0.0 {
            return Err(WriteError::Parameter(format!(
                "note size {}x{} must be positive",
                width, height
            )));
        }
        self.width = width;
        self.height = height;
        Ok(self)
    }

    pub fn set_background_color(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    pub fn set_font_name(mut self, name: &str) -> Self {
        self.font_name = name.to_string();
        self
    }

    pub fn set_font_size(mut self, size: f64) -> Self {
        if size > 0.0 {
            self.font_size = size;
        }
        self
    }

    /// Excel opens the box one column right and one row up from the
    /// cell, pulled back in at the right and bottom sheet edges.
    pub(crate) fn position<G: SheetGeometry + ?Sized>(&self, geometry: &G, row: u32, col: u16) -> ObjectPosition {
        let last_col = (MAX_COLS - 1) as u16;
        let last_row = (MAX_ROWS - 1) as u32;
        let col_start = if col >= last_col - 3 { last_col - 3 } else { col + 1 };
        let (row_start, y1) = match row {
            0 => (0, 2.0),
            r if r >= last_row - 3 => (last_row - 4, 10.0),
            r => (r - 1, 10.0),
        };
        position_object_pixels(
            geometry,
            row_start,
            col_start,
            15.0,
            y1,
            self.width,
            self.height,
            ObjectMovement::MoveAndSizeWithCells,
        )
    }
}

/// A note ready to serialize: its cell, author slot and box position.
#[derive(Debug, Clone)]
pub(crate) struct PlacedNote<'a> {
    pub row: u32,
    pub col: u16,
    pub note: &'a Note,
    pub position: ObjectPosition,
}

fn note_author<'a>(note: &'a Note, default_author: &'a str) -> &'a str {
    note.author.as_deref().unwrap_or(default_author)
}

/// `xl/commentsN.xml`. Authors are listed in first-use order.
pub(crate) fn comments_xml(notes: &[PlacedNote], default_author: &str) -> Vec<u8> {
    let mut authors: Vec<&str> = Vec::new();
    for placed in notes {
        let author = note_author(placed.note, default_author);
        if !authors.contains(&author) {
            authors.push(author);
        }
    }

    let mut xml = XmlWriter::with_capacity(512 + notes.len() * 256);
    xml.declaration();
    xml.start_with("comments", &[("xmlns", NS_SPREADSHEETML)]);
    xml.start("authors");
    for author in &authors {
        xml.data("author", author);
    }
    xml.end("authors");

    xml.start("commentList");
    for placed in notes {
        let author = note_author(placed.note, default_author);
        let author_id = authors.iter().position(|a| *a == author).unwrap_or(0).to_string();
        let reference = cell_ref(placed.row, placed.col);
        xml.start_with("comment", &[("ref", &reference), ("authorId", &author_id)]);
        xml.start("text");
        xml.start("r");
        xml.start("rPr");
        xml.val("sz", &format_number(placed.note.font_size));
        xml.empty_with("color", &[("indexed", "81")]);
        xml.val("rFont", &placed.note.font_name);
        xml.val("family", "2");
        xml.end("rPr");
        crate::shared_strings::write_text_element(xml.buffer_mut(), &placed.note.text);
        xml.end("r");
        xml.end("text");
        xml.end("comment");
    }
    xml.end("commentList");
    xml.end("comments");
    xml.into_bytes()
}

fn points(pixels: f64) -> String {
    format_number(pixels * 0.75)
}

/// `xl/drawings/vmlDrawingN.vml`. `vml_id` is the sheet's 1-based VML
/// index; shape ids live in the block of 1024 that it reserves.
pub(crate) fn vml_drawing(notes: &[PlacedNote], vml_id: u32) -> Vec<u8> {
    let mut xml = XmlWriter::with_capacity(1024 + notes.len() * 1024);
    xml.start_with(
        "xml",
        &[
            ("xmlns:v", "urn:schemas-microsoft-com:vml"),
            ("xmlns:o", "urn:schemas-microsoft-com:office:office"),
            ("xmlns:x", "urn:schemas-microsoft-com:office:excel"),
        ],
    );
    xml.start_with("o:shapelayout", &[("v:ext", "edit")]);
    xml.empty_with("o:idmap", &[("v:ext", "edit"), ("data", &vml_id.to_string())]);
    xml.end("o:shapelayout");

    xml.start_with(
        "v:shapetype",
        &[
            ("id", "_x0000_t202"),
            ("coordsize", "21600,21600"),
            ("o:spt", "202"),
            ("path", "m,l,21600r21600,l21600,xe"),
        ],
    );
    xml.empty_with("v:stroke", &[("joinstyle", "miter")]);
    xml.empty_with("v:path", &[("gradientshapeok", "t"), ("o:connecttype", "rect")]);
    xml.end("v:shapetype");

    for (idx, placed) in notes.iter().enumerate() {
        let pos = &placed.position;
        let shape_id = format!("_x0000_s{}", vml_id * 1024 + 1 + idx as u32);
        let visibility = if placed.note.visible { "visible" } else { "hidden" };
        let style = format!(
            "position:absolute;margin-left:{}pt;margin-top:{}pt;width:{}pt;height:{}pt;z-index:{};visibility:{}",
            points(pos.x_abs),
            points(pos.y_abs),
            points(pos.width),
            points(pos.height),
            idx + 1,
            visibility
        );
        let fill = placed
            .note
            .background
            .rgb_hex()
            .map(|hex| format!("#{}", hex.to_lowercase()))
            .unwrap_or_else(|| "#ffffe1".to_string());

        xml.start_with(
            "v:shape",
            &[
                ("id", &shape_id),
                ("type", "#_x0000_t202"),
                ("style", &style),
                ("fillcolor", &fill),
                ("o:insetmode", "auto"),
            ],
        );
        xml.empty_with("v:fill", &[("color2", &fill)]);
        xml.empty_with("v:shadow", &[("on", "t"), ("color", "black"), ("obscured", "t")]);
        xml.empty_with("v:path", &[("o:connecttype", "none")]);
        xml.start_with("v:textbox", &[("style", "mso-direction-alt:auto")]);
        xml.empty_with("div", &[("style", "text-align:left")]);
        xml.end("v:textbox");

        xml.start_with("x:ClientData", &[("ObjectType", "Note")]);
        xml.empty("x:MoveWithCells");
        xml.empty("x:SizeWithCells");
        let anchor = format!(
            "{}, {}, {}, {}, {}, {}, {}, {}",
            pos.col_start, pos.x1, pos.row_start, pos.y1, pos.col_end, pos.x2, pos.row_end, pos.y2
        );
        xml.data("x:Anchor", &anchor);
        xml.data("x:AutoFill", "False");
        xml.data("x:Row", &placed.row.to_string());
        xml.data("x:Column", &placed.col.to_string());
        if placed.note.visible {
            xml.empty("x:Visible");
        }
        xml.end("x:ClientData");
        xml.end("v:shape");
    }

    xml.end("xml");
    xml.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::DefaultGeometry;

    fn placed(note: &Note, row: u32, col: u16) -> PlacedNote<'_> {
        PlacedNote {
            row,
            col,
            note,
            position: note.position(&DefaultGeometry, row, col),
        }
    }

    #[test]
    fn test_note_position_defaults() {
        let note = Note::new("hi").unwrap();
        let pos = note.position(&DefaultGeometry, 2, 1);
        assert_eq!((pos.col_start, pos.row_start), (2, 1));
        assert_eq!((pos.x1, pos.y1), (15.0, 10.0));
        // 15 + 128 = 143 px spans two full 64 px columns plus 15.
        assert_eq!((pos.col_end, pos.x2), (4, 15.0));

        let top = note.position(&DefaultGeometry, 0, 0);
        assert_eq!((top.row_start, top.y1), (0, 2.0));
    }

    #[test]
    fn test_comments_author_table() {
        let a = Note::new("first").unwrap().set_author("Ann");
        let b = Note::new("second").unwrap();
        let c = Note::new(" third ").unwrap().set_author("Ann");
        let notes = vec![placed(&a, 0, 0), placed(&b, 1, 0), placed(&c, 2, 3)];
        let xml = String::from_utf8(comments_xml(&notes, "Author")).unwrap();
        assert!(xml.contains("<authors><author>Ann</author><author>Author</author></authors>"));
        assert!(xml.contains("<comment ref=\"A2\" authorId=\"1\">"));
        assert!(xml.contains("<comment ref=\"D3\" authorId=\"0\">"));
        assert!(xml.contains("<t xml:space=\"preserve\"> third </t>"));
        assert!(xml.contains("<sz val=\"8\"/><color indexed=\"81\"/><rFont val=\"Tahoma\"/>"));
    }

    #[test]
    fn test_vml_shapes() {
        let hidden = Note::new("a").unwrap();
        let shown = Note::new("b").unwrap().set_visible(true).set_background_color(Color::WHITE);
        let notes = vec![placed(&hidden, 0, 0), placed(&shown, 4, 2)];
        let xml = String::from_utf8(vml_drawing(&notes, 1)).unwrap();
        assert!(xml.contains("<o:idmap v:ext=\"edit\" data=\"1\"/>"));
        assert!(xml.contains("id=\"_x0000_s1025\""));
        assert!(xml.contains("id=\"_x0000_s1026\""));
        assert!(xml.contains("margin-left:59.25pt;margin-top:1.5pt;width:96pt;height:55.5pt;z-index:1;visibility:hidden"));
        assert!(xml.contains("fillcolor=\"#ffffff\""));
        assert!(xml.contains("<x:Anchor>1, 15, 0, 2, 3, 15, 3, 16</x:Anchor>"));
        assert!(xml.contains("<x:Row>4</x:Row><x:Column>2</x:Column><x:Visible/>"));
    }

    #[test]
    fn test_note_size_validation() {
        assert!(Note::new("x").unwrap().set_size(0.0, 10.0).is_err());
        assert!(Note::new(&"x".repeat(32_768)).is_err());
    }
}
