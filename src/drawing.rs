//! Floating objects: the pixel position engine that converts a cell anchor
//! plus size into two-cell anchor coordinates, and the
//! `xl/drawings/drawingN.xml` writer for pictures, charts and shapes.

use crate::chart::format::{write_fill_and_line, HasFormatting};
use crate::shape::Shape;
use crate::utility::{pixels_to_emu, DEFAULT_COL_PIXELS, DEFAULT_ROW_PIXELS};
use crate::validation::{MAX_COLS, MAX_ROWS};
use crate::xml::{XmlWriter, NS_CHART, NS_DRAWINGML, NS_RELATIONSHIPS, NS_SPREADSHEET_DRAWING};

/// How an object follows the cells underneath it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectMovement {
    #[default]
    MoveAndSizeWithCells,
    MoveButDontSizeWithCells,
    DontMoveOrSizeWithCells,
    /// Like `MoveAndSizeWithCells`, but hidden rows and columns keep their
    /// size when positioning, so the object survives later unhiding.
    MoveAndSizeWithCellsAfter,
}

impl ObjectMovement {
    fn edit_as(&self) -> Option<&'static str> {
        match self {
            ObjectMovement::MoveButDontSizeWithCells => Some("oneCell"),
            ObjectMovement::DontMoveOrSizeWithCells => Some("absolute"),
            _ => None,
        }
    }
}

/// Row and column sizes as the position engine sees them.
pub trait SheetGeometry {
    /// Pixel width of `col`; hidden columns report 0 unless `movement`
    /// is `MoveAndSizeWithCellsAfter`.
    fn column_pixels(&self, col: u16, movement: ObjectMovement) -> f64;

    fn row_pixels(&self, row: u32, movement: ObjectMovement) -> f64;

    /// Sum of the widths of columns `0..col`.
    fn columns_offset(&self, col: u16, movement: ObjectMovement) -> f64 {
        (0..col).map(|c| self.column_pixels(c, movement)).sum()
    }

    /// Sum of the heights of rows `0..row`.
    fn rows_offset(&self, row: u32, movement: ObjectMovement) -> f64 {
        (0..row).map(|r| self.row_pixels(r, movement)).sum()
    }
}

/// Geometry of a sheet where every row and column has its default size.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultGeometry;

impl SheetGeometry for DefaultGeometry {
    fn column_pixels(&self, _col: u16, _movement: ObjectMovement) -> f64 {
        DEFAULT_COL_PIXELS
    }

    fn row_pixels(&self, _row: u32, _movement: ObjectMovement) -> f64 {
        DEFAULT_ROW_PIXELS
    }

    fn columns_offset(&self, col: u16, _movement: ObjectMovement) -> f64 {
        col as f64 * DEFAULT_COL_PIXELS
    }

    fn rows_offset(&self, row: u32, _movement: ObjectMovement) -> f64 {
        row as f64 * DEFAULT_ROW_PIXELS
    }
}

/// Two-cell anchor for an object, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectPosition {
    pub col_start: u16,
    pub row_start: u32,
    pub x1: f64,
    pub y1: f64,
    pub col_end: u16,
    pub row_end: u32,
    pub x2: f64,
    pub y2: f64,
    /// Absolute offset of the top-left corner from A1.
    pub x_abs: f64,
    pub y_abs: f64,
    pub width: f64,
    pub height: f64,
}

/// Place a `width` x `height` pixel object whose top-left corner sits at
/// (`x1`, `y1`) pixels inside cell (`row_start`, `col_start`).
///
/// Offsets may be negative or larger than the anchor cell; the anchor is
/// walked back or forward until the offset lies inside a cell.
#[allow(clippy::too_many_arguments)]
pub fn position_object_pixels<G: SheetGeometry + ?Sized>(
    geometry: &G,
    mut row_start: u32,
    mut col_start: u16,
    mut x1: f64,
    mut y1: f64,
    width: f64,
    height: f64,
    movement: ObjectMovement,
) -> ObjectPosition {
    let size_col = |c: u16| geometry.column_pixels(c, movement);
    let size_row = |r: u32| geometry.row_pixels(r, movement);
    let last_col = (MAX_COLS - 1) as u16;
    let last_row = (MAX_ROWS - 1) as u32;

    while x1 < 0.0 && col_start > 0 {
        x1 += size_col(col_start - 1);
        col_start -= 1;
    }
    while y1 < 0.0 && row_start > 0 {
        y1 += size_row(row_start - 1);
        row_start -= 1;
    }
    x1 = x1.max(0.0);
    y1 = y1.max(0.0);

    let x_abs = geometry.columns_offset(col_start, movement) + x1;
    let y_abs = geometry.rows_offset(row_start, movement) + y1;

    while x1 >= size_col(col_start) && col_start < last_col {
        x1 -= size_col(col_start);
        col_start += 1;
    }
    while y1 >= size_row(row_start) && row_start < last_row {
        y1 -= size_row(row_start);
        row_start += 1;
    }

    let mut col_end = col_start;
    let mut row_end = row_start;
    let mut remaining_w = width;
    let mut remaining_h = height;

    // Hidden start cells don't offset the object.
    if size_col(col_start) > 0.0 {
        remaining_w += x1;
    }
    if size_row(row_start) > 0.0 {
        remaining_h += y1;
    }

    while remaining_w >= size_col(col_end) && col_end < last_col {
        remaining_w -= size_col(col_end);
        col_end += 1;
    }
    while remaining_h >= size_row(row_end) && row_end < last_row {
        remaining_h -= size_row(row_end);
        row_end += 1;
    }

    ObjectPosition {
        col_start,
        row_start,
        x1,
        y1,
        col_end,
        row_end,
        x2: remaining_w,
        y2: remaining_h,
        x_abs,
        y_abs,
        width,
        height,
    }
}

// ============================================================================
// Drawing part
// ============================================================================

#[derive(Debug, Clone)]
pub(crate) enum DrawingKind {
    Image { rel_id: String },
    Chart { rel_id: String },
    Shape(Box<Shape>),
}

#[derive(Debug, Clone)]
pub(crate) struct DrawingObject {
    pub kind: DrawingKind,
    pub position: ObjectPosition,
    pub movement: ObjectMovement,
    pub name: String,
    pub description: String,
    pub decorative: bool,
}

/// The contents of one `drawingN.xml`.
#[derive(Debug, Clone, Default)]
pub(crate) struct Drawing {
    pub objects: Vec<DrawingObject>,
    /// Chartsheets hold a single chart on an absolute anchor.
    pub absolute: bool,
}

// Chartsheet chart extent used by Excel for a default page.
const CHARTSHEET_CX: u64 = 9_308_969;
const CHARTSHEET_CY: u64 = 6_078_325;

impl Drawing {
    pub fn to_xml(&self) -> Vec<u8> {
        let mut xml = XmlWriter::with_capacity(1024 + self.objects.len() * 1024);
        xml.declaration();
        xml.start_with(
            "xdr:wsDr",
            &[("xmlns:xdr", NS_SPREADSHEET_DRAWING), ("xmlns:a", NS_DRAWINGML)],
        );
        for (idx, object) in self.objects.iter().enumerate() {
            let shape_id = idx as u32 + 2;
            if self.absolute {
                write_absolute_anchor(&mut xml, object, shape_id);
            } else {
                write_two_cell_anchor(&mut xml, object, shape_id);
            }
        }
        xml.end("xdr:wsDr");
        xml.into_bytes()
    }
}

fn write_marker(xml: &mut XmlWriter, tag: &str, col: u16, col_off: u64, row: u32, row_off: u64) {
    xml.start(tag);
    xml.data("xdr:col", &col.to_string());
    xml.data("xdr:colOff", &col_off.to_string());
    xml.data("xdr:row", &row.to_string());
    xml.data("xdr:rowOff", &row_off.to_string());
    xml.end(tag);
}

fn write_two_cell_anchor(xml: &mut XmlWriter, object: &DrawingObject, shape_id: u32) {
    let pos = &object.position;
    match object.movement.edit_as() {
        Some(edit_as) => xml.start_with("xdr:twoCellAnchor", &[("editAs", edit_as)]),
        None => xml.start("xdr:twoCellAnchor"),
    }
    write_marker(xml, "xdr:from", pos.col_start, pixels_to_emu(pos.x1), pos.row_start, pixels_to_emu(pos.y1));
    write_marker(xml, "xdr:to", pos.col_end, pixels_to_emu(pos.x2), pos.row_end, pixels_to_emu(pos.y2));
    let off = (pixels_to_emu(pos.x_abs), pixels_to_emu(pos.y_abs));
    let ext = (pixels_to_emu(pos.width), pixels_to_emu(pos.height));
    write_object_body(xml, object, shape_id, off, ext);
    xml.empty("xdr:clientData");
    xml.end("xdr:twoCellAnchor");
}

fn write_absolute_anchor(xml: &mut XmlWriter, object: &DrawingObject, shape_id: u32) {
    xml.start("xdr:absoluteAnchor");
    xml.empty_with("xdr:pos", &[("x", "0"), ("y", "0")]);
    let cx = CHARTSHEET_CX.to_string();
    let cy = CHARTSHEET_CY.to_string();
    xml.empty_with("xdr:ext", &[("cx", &cx), ("cy", &cy)]);
    write_object_body(xml, object, shape_id, (0, 0), (CHARTSHEET_CX, CHARTSHEET_CY));
    xml.empty("xdr:clientData");
    xml.end("xdr:absoluteAnchor");
}

fn write_object_body(
    xml: &mut XmlWriter,
    object: &DrawingObject,
    shape_id: u32,
    off: (u64, u64),
    ext: (u64, u64),
) {
    match &object.kind {
        DrawingKind::Chart { rel_id } => write_graphic_frame(xml, object, shape_id, rel_id),
        DrawingKind::Image { rel_id } => write_pic(xml, object, shape_id, rel_id, off, ext),
        DrawingKind::Shape(shape) => write_shape(xml, object, shape, shape_id, off, ext),
    }
}

fn write_c_nv_pr(xml: &mut XmlWriter, object: &DrawingObject, shape_id: u32) {
    let id = shape_id.to_string();
    let mut attrs: Vec<(&str, &str)> = vec![("id", id.as_str()), ("name", object.name.as_str())];
    if !object.description.is_empty() && !object.decorative {
        attrs.push(("descr", object.description.as_str()));
    }
    if !object.decorative {
        xml.empty_with("xdr:cNvPr", &attrs);
        return;
    }
    xml.start_with("xdr:cNvPr", &attrs);
    xml.start("a:extLst");
    xml.start_with("a:ext", &[("uri", "{C183D7F6-B498-43B3-948B-1728B52AA6E4}")]);
    xml.empty_with(
        "adec:decorative",
        &[
            ("xmlns:adec", "http://schemas.microsoft.com/office/drawing/2017/decorative"),
            ("val", "1"),
        ],
    );
    xml.end("a:ext");
    xml.end("a:extLst");
    xml.end("xdr:cNvPr");
}

fn write_xfrm(xml: &mut XmlWriter, tag: &str, off: (u64, u64), ext: (u64, u64)) {
    xml.start(tag);
    xml.empty_with("a:off", &[("x", &off.0.to_string()), ("y", &off.1.to_string())]);
    xml.empty_with("a:ext", &[("cx", &ext.0.to_string()), ("cy", &ext.1.to_string())]);
    xml.end(tag);
}

fn write_graphic_frame(xml: &mut XmlWriter, object: &DrawingObject, shape_id: u32, rel_id: &str) {
    xml.start_with("xdr:graphicFrame", &[("macro", "")]);
    xml.start("xdr:nvGraphicFramePr");
    write_c_nv_pr(xml, object, shape_id);
    xml.empty("xdr:cNvGraphicFramePr");
    xml.end("xdr:nvGraphicFramePr");
    write_xfrm(xml, "xdr:xfrm", (0, 0), (0, 0));
    xml.start("a:graphic");
    xml.start_with("a:graphicData", &[("uri", NS_CHART)]);
    xml.empty_with(
        "c:chart",
        &[("xmlns:c", NS_CHART), ("xmlns:r", NS_RELATIONSHIPS), ("r:id", rel_id)],
    );
    xml.end("a:graphicData");
    xml.end("a:graphic");
    xml.end("xdr:graphicFrame");
}

fn write_pic(
    xml: &mut XmlWriter,
    object: &DrawingObject,
    shape_id: u32,
    rel_id: &str,
    off: (u64, u64),
    ext: (u64, u64),
) {
    xml.start("xdr:pic");
    xml.start("xdr:nvPicPr");
    write_c_nv_pr(xml, object, shape_id);
    xml.start("xdr:cNvPicPr");
    xml.empty_with("a:picLocks", &[("noChangeAspect", "1")]);
    xml.end("xdr:cNvPicPr");
    xml.end("xdr:nvPicPr");
    xml.start("xdr:blipFill");
    xml.empty_with("a:blip", &[("xmlns:r", NS_RELATIONSHIPS), ("r:embed", rel_id)]);
    xml.start("a:stretch");
    xml.empty("a:fillRect");
    xml.end("a:stretch");
    xml.end("xdr:blipFill");
    xml.start("xdr:spPr");
    write_xfrm(xml, "a:xfrm", off, ext);
    xml.start_with("a:prstGeom", &[("prst", "rect")]);
    xml.empty("a:avLst");
    xml.end("a:prstGeom");
    xml.end("xdr:spPr");
    xml.end("xdr:pic");
}

fn write_shape(
    xml: &mut XmlWriter,
    object: &DrawingObject,
    shape: &Shape,
    shape_id: u32,
    off: (u64, u64),
    ext: (u64, u64),
) {
    xml.start_with("xdr:sp", &[("macro", ""), ("textlink", "")]);
    xml.start("xdr:nvSpPr");
    write_c_nv_pr(xml, object, shape_id);
    if shape.is_text_box() {
        xml.empty_with("xdr:cNvSpPr", &[("txBox", "1")]);
    } else {
        xml.empty("xdr:cNvSpPr");
    }
    xml.end("xdr:nvSpPr");

    xml.start("xdr:spPr");
    write_xfrm(xml, "a:xfrm", off, ext);
    xml.start_with("a:prstGeom", &[("prst", shape.preset())]);
    xml.empty("a:avLst");
    xml.end("a:prstGeom");
    write_sp_pr_body(xml, shape);
    xml.end("xdr:spPr");

    shape.write_text_body(xml);
    xml.end("xdr:sp");
}

// Shapes default to a white fill with a thin dark border when unformatted.
fn write_sp_pr_body(xml: &mut XmlWriter, shape: &Shape) {
    let format = shape.format();
    if format.is_empty() {
        xml.start("a:solidFill");
        xml.empty_with("a:srgbClr", &[("val", "FFFFFF")]);
        xml.end("a:solidFill");
        xml.start_with("a:ln", &[("w", "9525"), ("cmpd", "sng")]);
        xml.start("a:solidFill");
        xml.empty_with("a:srgbClr", &[("val", "000000")]);
        xml.end("a:solidFill");
        xml.end("a:ln");
        return;
    }
    write_fill_and_line(xml, format);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    struct TestGeometry {
        widths: HashMap<u16, f64>,
        heights: HashMap<u32, f64>,
        hidden_cols: HashSet<u16>,
    }

    impl SheetGeometry for TestGeometry {
        fn column_pixels(&self, col: u16, movement: ObjectMovement) -> f64 {
            if self.hidden_cols.contains(&col) && movement != ObjectMovement::MoveAndSizeWithCellsAfter {
                return 0.0;
            }
            *self.widths.get(&col).unwrap_or(&DEFAULT_COL_PIXELS)
        }

        fn row_pixels(&self, row: u32, _movement: ObjectMovement) -> f64 {
            *self.heights.get(&row).unwrap_or(&DEFAULT_ROW_PIXELS)
        }
    }

    fn place(row: u32, col: u16, x: f64, y: f64, w: f64, h: f64) -> ObjectPosition {
        position_object_pixels(&DefaultGeometry, row, col, x, y, w, h, ObjectMovement::default())
    }

    #[test]
    fn test_default_cell_sized_object_ends_at_next_cell() {
        let pos = place(0, 0, 0.0, 0.0, 64.0, 20.0);
        assert_eq!((pos.col_start, pos.row_start, pos.x1, pos.y1), (0, 0, 0.0, 0.0));
        assert_eq!((pos.col_end, pos.row_end, pos.x2, pos.y2), (1, 1, 0.0, 0.0));
        assert_eq!(pixels_to_emu(pos.width), 609_600);
        assert_eq!(pixels_to_emu(pos.height), 190_500);
    }

    #[test]
    fn test_default_chart_at_e9() {
        // 480x288 chart inserted at E9 with no offset.
        let pos = place(8, 4, 0.0, 0.0, 480.0, 288.0);
        assert_eq!((pos.col_end, pos.x2), (11, 32.0));
        assert_eq!((pos.row_end, pos.y2), (22, 8.0));
        assert_eq!((pos.x_abs, pos.y_abs), (256.0, 160.0));
    }

    #[test]
    fn test_large_offsets_move_anchor_forward() {
        let pos = place(0, 0, 130.0, 45.0, 10.0, 10.0);
        assert_eq!((pos.col_start, pos.x1), (2, 2.0));
        assert_eq!((pos.row_start, pos.y1), (2, 5.0));
        assert_eq!((pos.x_abs, pos.y_abs), (130.0, 45.0));
    }

    #[test]
    fn test_negative_offsets_move_anchor_back() {
        let pos = place(3, 3, -10.0, -5.0, 10.0, 10.0);
        assert_eq!((pos.col_start, pos.x1), (2, 54.0));
        assert_eq!((pos.row_start, pos.y1), (2, 15.0));
    }

    #[test]
    fn test_negative_offset_clamps_at_origin() {
        let pos = place(0, 0, -10.0, -10.0, 10.0, 10.0);
        assert_eq!((pos.col_start, pos.row_start, pos.x1, pos.y1), (0, 0, 0.0, 0.0));
    }

    #[test]
    fn test_hidden_columns_are_skipped_unless_after_mode() {
        let geometry = TestGeometry {
            widths: HashMap::new(),
            heights: HashMap::new(),
            hidden_cols: [1u16].into_iter().collect(),
        };
        let pos = position_object_pixels(&geometry, 0, 0, 0.0, 0.0, 100.0, 10.0, ObjectMovement::default());
        assert_eq!((pos.col_end, pos.x2), (2, 36.0));

        let pos = position_object_pixels(
            &geometry,
            0,
            0,
            0.0,
            0.0,
            100.0,
            10.0,
            ObjectMovement::MoveAndSizeWithCellsAfter,
        );
        assert_eq!((pos.col_end, pos.x2), (1, 36.0));
    }

    #[test]
    fn test_custom_sizes_are_used() {
        let geometry = TestGeometry {
            widths: [(0u16, 145.0)].into_iter().collect(),
            heights: [(0u32, 40.0)].into_iter().collect(),
            hidden_cols: HashSet::new(),
        };
        let pos = position_object_pixels(&geometry, 0, 0, 0.0, 0.0, 150.0, 50.0, ObjectMovement::default());
        assert_eq!((pos.col_end, pos.x2), (1, 5.0));
        assert_eq!((pos.row_end, pos.y2), (1, 10.0));
    }

    #[test]
    fn test_drawing_xml_for_chart_and_image() {
        let drawing = Drawing {
            objects: vec![
                DrawingObject {
                    kind: DrawingKind::Chart { rel_id: "rId1".into() },
                    position: place(8, 4, 0.0, 0.0, 480.0, 288.0),
                    movement: ObjectMovement::MoveAndSizeWithCells,
                    name: "Chart 1".into(),
                    description: String::new(),
                    decorative: false,
                },
                DrawingObject {
                    kind: DrawingKind::Image { rel_id: "rId2".into() },
                    position: place(0, 0, 0.0, 0.0, 64.0, 20.0),
                    movement: ObjectMovement::MoveButDontSizeWithCells,
                    name: "Picture 2".into(),
                    description: "logo".into(),
                    decorative: false,
                },
            ],
            absolute: false,
        };
        let xml = String::from_utf8(drawing.to_xml()).unwrap();
        assert!(xml.contains(
            "<xdr:from><xdr:col>4</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>8</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>"
        ));
        assert!(xml.contains(
            "<xdr:to><xdr:col>11</xdr:col><xdr:colOff>304800</xdr:colOff><xdr:row>22</xdr:row><xdr:rowOff>76200</xdr:rowOff></xdr:to>"
        ));
        assert!(xml.contains("<xdr:cNvPr id=\"2\" name=\"Chart 1\"/>"));
        assert!(xml.contains("<xdr:twoCellAnchor editAs=\"oneCell\">"));
        assert!(xml.contains("<xdr:cNvPr id=\"3\" name=\"Picture 2\" descr=\"logo\"/>"));
        assert!(xml.contains("<a:blip xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\" r:embed=\"rId2\"/>"));
        assert!(xml.contains("<a:ext cx=\"609600\" cy=\"190500\"/>"));
    }
}
