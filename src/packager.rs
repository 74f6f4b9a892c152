//! Turns a prepared [`Workbook`] into named parts and zips them.
//!
//! Numbering that spans sheets lives here: worksheet and chartsheet part
//! numbers, chart and drawing ids, comment parts, media files and the
//! rich-value list for in-cell pictures. Relationship ids inside each sheet
//! are handed out in a fixed order (external hyperlinks, drawing, VML,
//! comments, tables).

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

use mtzip::{level::CompressionLevel, ZipArchive};

use crate::chart::ChartWriter;
use crate::chartsheet::Chartsheet;
use crate::comment::{comments_xml, vml_drawing, PlacedNote};
use crate::drawing::{
    position_object_pixels, DefaultGeometry, Drawing, DrawingKind, DrawingObject, ObjectMovement,
};
use crate::error::{Result, WriteError};
use crate::image::Image;
use crate::rich_value::{metadata_xml, rich_value_types_xml, RichImage, RichValues, WORKBOOK_RELS};
use crate::sheet_xml::SheetLinks;
use crate::styles::{generate_styles_xml, StyleRegistry};
use crate::workbook::{Sheet, Workbook};
use crate::worksheet::{FloatingObject, HyperlinkTarget, Worksheet};
use crate::xml::{generate_root_rels, ContentTypes, Relationships};

/// One archive entry: path inside the package and its bytes.
pub(crate) type Part = (String, Vec<u8>);

/// Distinct pictures, stored once each as `xl/media/imageN.ext`.
#[derive(Debug, Default)]
struct MediaStore {
    by_hash: HashMap<String, String>,
    files: Vec<Part>,
}

impl MediaStore {
    /// File name (`image3.png`) for `image`, adding it on first sight.
    fn add(&mut self, image: &Image, content_types: &mut ContentTypes) -> String {
        if let Some(name) = self.by_hash.get(&image.hash) {
            return name.clone();
        }
        let ext = image.image_type.extension();
        let name = format!("image{}.{}", self.files.len() + 1, ext);
        content_types.add_image_extension(ext);
        self.files.push((format!("xl/media/{}", name), image.data.clone()));
        self.by_hash.insert(image.hash.clone(), name.clone());
        name
    }
}

/// Running counters and collected output for one save.
struct Packager<'a> {
    workbook: &'a Workbook,
    parts: Vec<Part>,
    content_types: ContentTypes,
    media: MediaStore,
    chart_count: usize,
    drawing_count: usize,
    comments_count: usize,
    rich: RichValues,
    rich_media: HashMap<String, u32>,
}

/// Every part of the package, `[Content_Types].xml` first.
pub(crate) fn assemble_parts(workbook: &Workbook) -> Result<Vec<Part>> {
    Packager {
        workbook,
        parts: Vec::new(),
        content_types: ContentTypes::new(),
        media: MediaStore::default(),
        chart_count: 0,
        drawing_count: 0,
        comments_count: 0,
        rich: RichValues::default(),
        rich_media: HashMap::new(),
    }
    .assemble()
}

impl<'a> Packager<'a> {
    fn push(&mut self, path: String, data: Vec<u8>) {
        self.parts.push((path, data));
    }

    fn assemble(mut self) -> Result<Vec<Part>> {
        let wb = self.workbook;
        let names = wb.defined_names()?;
        let mut workbook_rels = Relationships::new();
        let mut worksheet_names = Vec::new();
        let mut chartsheet_names = Vec::new();
        let mut image_vm_base = 0u32;

        for (idx, sheet) in wb.sheets.iter().enumerate() {
            let tab_selected = wb.is_tab_selected(idx);
            match sheet {
                Sheet::Worksheet(ws) => {
                    worksheet_names.push(ws.name.clone());
                    let number = worksheet_names.len();
                    workbook_rels.add_document("worksheet", &format!("worksheets/sheet{}.xml", number));
                    self.content_types.add_worksheet(number);
                    self.worksheet(ws, number, tab_selected, image_vm_base)?;
                    image_vm_base += ws.embedded_images.len() as u32;
                }
                Sheet::Chartsheet(cs) => {
                    chartsheet_names.push(cs.name.clone());
                    let number = chartsheet_names.len();
                    workbook_rels.add_document("chartsheet", &format!("chartsheets/sheet{}.xml", number));
                    self.content_types.add_chartsheet(number);
                    self.chartsheet(cs, number, tab_selected)?;
                }
            }
        }

        workbook_rels.add_document("styles", "styles.xml");
        let styles = {
            let shared = wb.shared.borrow();
            let registry = StyleRegistry::new(&shared.formats, &wb.palette);
            log::debug!(
                "styles: {} xf, {} fonts, {} fills, {} borders",
                shared.formats.xf_count(),
                registry.font_count(),
                registry.fill_count(),
                registry.border_count()
            );
            generate_styles_xml(&registry)
        };
        self.push("xl/styles.xml".to_string(), styles);

        let strings = {
            let shared = wb.shared.borrow();
            (!shared.strings.is_empty()).then(|| shared.strings.to_xml())
        };
        if let Some(strings) = strings {
            workbook_rels.add_document("sharedStrings", "sharedStrings.xml");
            self.content_types.add_shared_strings();
            self.push("xl/sharedStrings.xml".to_string(), strings);
        }

        let dynamic_arrays = wb.sheets.iter().any(|s| match s {
            Sheet::Worksheet(ws) => ws.has_dynamic_arrays(),
            Sheet::Chartsheet(_) => false,
        });
        if dynamic_arrays || !self.rich.is_empty() {
            workbook_rels.add_document("sheetMetadata", "metadata.xml");
            self.content_types.add_metadata();
            let metadata = metadata_xml(dynamic_arrays, self.rich.images.len());
            self.push("xl/metadata.xml".to_string(), metadata);
        }
        if !self.rich.is_empty() {
            for (rel_type, target) in WORKBOOK_RELS {
                workbook_rels.add_raw(rel_type, target);
            }
            self.content_types.add_rich_data();
            let parts = [
                ("xl/richData/rdrichvalue.xml", self.rich.rich_value_xml()),
                ("xl/richData/rdrichvaluestructure.xml", self.rich.structure_xml()),
                ("xl/richData/rdRichValueTypes.xml", rich_value_types_xml()),
                ("xl/richData/richValueRel.xml", self.rich.rel_xml()),
                ("xl/richData/_rels/richValueRel.xml.rels", self.rich.rel_rels().to_xml()),
            ];
            for (path, data) in parts {
                self.push(path.to_string(), data);
            }
        }

        self.push("xl/workbook.xml".to_string(), wb.workbook_xml(&names));
        self.push("xl/_rels/workbook.xml.rels".to_string(), workbook_rels.to_xml());
        self.push("_rels/.rels".to_string(), generate_root_rels());
        self.push("docProps/core.xml".to_string(), wb.properties.core_xml());
        let app = wb.properties.app_xml(&[
            ("Worksheets", worksheet_names),
            ("Charts", chartsheet_names),
            ("Named Ranges", wb.named_range_titles(&names)),
        ]);
        self.push("docProps/app.xml".to_string(), app);

        let media = std::mem::take(&mut self.media.files);
        self.parts.extend(media);
        self.parts.insert(0, ("[Content_Types].xml".to_string(), self.content_types.to_xml()));
        log::debug!("assembled {} package parts", self.parts.len());
        Ok(self.parts)
    }

    fn worksheet(&mut self, ws: &Worksheet, number: usize, tab_selected: bool, image_vm_base: u32) -> Result<()> {
        let mut rels = Relationships::new();
        let mut links = SheetLinks {
            image_vm_base,
            tab_selected,
            ..SheetLinks::default()
        };

        for link in ws.hyperlinks.values() {
            if let HyperlinkTarget::External { url, .. } = &link.target {
                links.hyperlinks.push(rels.add_external("hyperlink", url));
            }
        }

        if ws.has_drawing() {
            self.drawing_count += 1;
            let drawing_id = self.drawing_count;
            links.drawing = Some(rels.add_document("drawing", &format!("../drawings/drawing{}.xml", drawing_id)));
            let (drawing, drawing_rels) = self.worksheet_drawing(ws)?;
            self.content_types.add_drawing(drawing_id);
            self.push(format!("xl/drawings/drawing{}.xml", drawing_id), drawing.to_xml());
            self.push(
                format!("xl/drawings/_rels/drawing{}.xml.rels", drawing_id),
                drawing_rels.to_xml(),
            );
        }

        if !ws.notes.is_empty() {
            self.comments_count += 1;
            let id = self.comments_count;
            links.vml = Some(rels.add_document("vmlDrawing", &format!("../drawings/vmlDrawing{}.vml", id)));
            rels.add_document("comments", &format!("../comments{}.xml", id));
            let placed: Vec<PlacedNote> = ws
                .notes
                .iter()
                .map(|(&(row, col), note)| PlacedNote {
                    row,
                    col,
                    note,
                    position: note.position(ws, row, col),
                })
                .collect();
            self.content_types.add_comments(id);
            self.content_types.add_vml();
            self.push(format!("xl/comments{}.xml", id), comments_xml(&placed, &ws.default_note_author));
            self.push(format!("xl/drawings/vmlDrawing{}.vml", id), vml_drawing(&placed, id as u32));
        }

        for table in &ws.tables {
            let id = table.id as usize;
            links.tables.push(rels.add_document("table", &format!("../tables/table{}.xml", id)));
            self.content_types.add_table(id);
            self.push(format!("xl/tables/table{}.xml", id), table.to_xml());
        }

        for image in &ws.embedded_images {
            let name = self.media.add(image, &mut self.content_types);
            let next = self.rich_media.len() as u32;
            let rel_index = *self.rich_media.entry(name.clone()).or_insert_with(|| {
                self.rich.media.push(format!("../media/{}", name));
                next
            });
            self.rich.images.push(RichImage {
                rel_index,
                alt_text: image.alt_text.clone(),
                decorative: image.decorative,
            });
        }

        self.push(format!("xl/worksheets/sheet{}.xml", number), ws.assemble_xml(&links));
        if !rels.is_empty() {
            self.push(format!("xl/worksheets/_rels/sheet{}.xml.rels", number), rels.to_xml());
        }
        log::debug!("serialized worksheet '{}' as sheet{}.xml", ws.name, number);
        Ok(())
    }

    /// Anchors for every floating object of `ws`, with their charts and
    /// pictures written out along the way.
    fn worksheet_drawing(&mut self, ws: &Worksheet) -> Result<(Drawing, Relationships)> {
        let mut drawing = Drawing::default();
        let mut rels = Relationships::new();
        let mut image_rels: HashMap<String, String> = HashMap::new();

        for (idx, placed) in ws.objects.iter().enumerate() {
            let n = idx + 1;
            let anchor = |width: f64, height: f64, movement: ObjectMovement| {
                position_object_pixels(
                    ws,
                    placed.row,
                    placed.col,
                    placed.x_offset,
                    placed.y_offset,
                    width,
                    height,
                    movement,
                )
            };

            let object = match &placed.object {
                FloatingObject::Image(image) => {
                    let name = self.media.add(image, &mut self.content_types);
                    let rel_id = match image_rels.get(&name) {
                        Some(id) => id.clone(),
                        None => {
                            let id = rels.add_document("image", &format!("../media/{}", name));
                            image_rels.insert(name, id.clone());
                            id
                        }
                    };
                    let (width, height) = image.display_size();
                    DrawingObject {
                        kind: DrawingKind::Image { rel_id },
                        position: anchor(width, height, image.movement),
                        movement: image.movement,
                        name: if image.name.is_empty() {
                            format!("Picture {}", n)
                        } else {
                            image.name.clone()
                        },
                        description: image.alt_text.clone(),
                        decorative: image.decorative,
                    }
                }
                FloatingObject::Chart(chart) => {
                    let rel_id = self.write_chart(chart, &mut rels)?;
                    let (width, height) = chart.display_size();
                    DrawingObject {
                        kind: DrawingKind::Chart { rel_id },
                        position: anchor(width, height, chart.movement),
                        movement: chart.movement,
                        name: if chart.name.is_empty() {
                            format!("Chart {}", n)
                        } else {
                            chart.name.clone()
                        },
                        description: chart.alt_text.clone(),
                        decorative: chart.decorative,
                    }
                }
                FloatingObject::Shape(shape) => DrawingObject {
                    position: anchor(shape.width, shape.height, shape.movement),
                    movement: shape.movement,
                    name: if shape.is_text_box() {
                        format!("TextBox {}", n)
                    } else {
                        format!("Shape {}", n)
                    },
                    description: shape.alt_text.clone(),
                    decorative: shape.decorative,
                    kind: DrawingKind::Shape(shape.clone()),
                },
            };
            drawing.objects.push(object);
        }
        Ok((drawing, rels))
    }

    /// Write `xl/charts/chartN.xml` and link it from a drawing.
    fn write_chart(&mut self, chart: &crate::chart::Chart, rels: &mut Relationships) -> Result<String> {
        self.chart_count += 1;
        let chart_id = self.chart_count;
        let cache = self.workbook.chart_cache(chart)?;
        let xml = ChartWriter::new(chart, chart_id as u32, &cache).write();
        self.content_types.add_chart(chart_id);
        self.push(format!("xl/charts/chart{}.xml", chart_id), xml);
        Ok(rels.add_document("chart", &format!("../charts/chart{}.xml", chart_id)))
    }

    fn chartsheet(&mut self, cs: &Chartsheet, number: usize, tab_selected: bool) -> Result<()> {
        let chart = cs.chart_or_err()?;
        let mut drawing_rels = Relationships::new();
        let rel_id = self.write_chart(chart, &mut drawing_rels)?;

        let (width, height) = chart.display_size();
        let drawing = Drawing {
            objects: vec![DrawingObject {
                kind: DrawingKind::Chart { rel_id },
                position: position_object_pixels(
                    &DefaultGeometry,
                    0,
                    0,
                    0.0,
                    0.0,
                    width,
                    height,
                    chart.movement,
                ),
                movement: chart.movement,
                name: if chart.name.is_empty() {
                    "Chart 1".to_string()
                } else {
                    chart.name.clone()
                },
                description: chart.alt_text.clone(),
                decorative: chart.decorative,
            }],
            absolute: true,
        };

        self.drawing_count += 1;
        let drawing_id = self.drawing_count;
        self.content_types.add_drawing(drawing_id);
        self.push(format!("xl/drawings/drawing{}.xml", drawing_id), drawing.to_xml());
        self.push(
            format!("xl/drawings/_rels/drawing{}.xml.rels", drawing_id),
            drawing_rels.to_xml(),
        );

        let mut rels = Relationships::new();
        let drawing_rel = rels.add_document("drawing", &format!("../drawings/drawing{}.xml", drawing_id));
        self.push(
            format!("xl/chartsheets/sheet{}.xml", number),
            cs.assemble_xml(&drawing_rel, tab_selected),
        );
        self.push(format!("xl/chartsheets/_rels/sheet{}.xml.rels", number), rels.to_xml());
        log::debug!("serialized chartsheet '{}' as sheet{}.xml", cs.name, number);
        Ok(())
    }
}

/// Zip `parts` into `writer`.
pub(crate) fn write_archive<W: Write + Seek>(parts: Vec<Part>, writer: &mut W) -> Result<()> {
    let mut zipper = ZipArchive::new();
    for (path, data) in parts {
        zipper
            .add_file_from_memory(data, path)
            .compression_level(CompressionLevel::fast())
            .done();
    }
    zipper.write(writer).map_err(|e| WriteError::Zip(e.to_string()))?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workbook.xlsx".to_string());
    path.with_file_name(format!(".{}.{}.tmp", name, std::process::id()))
}

/// Write the archive beside `path` and rename it into place. The temporary
/// file is removed if anything fails.
pub(crate) fn write_file_atomic(parts: Vec<Part>, path: &Path) -> Result<()> {
    let temp = temp_path(path);
    let result = (|| -> Result<()> {
        let mut file = File::create(&temp)?;
        write_archive(parts, &mut file)?;
        file.flush()?;
        file.sync_all()?;
        drop(file);
        fs::rename(&temp, path)?;
        Ok(())
    })();
    if result.is_err() {
        if let Err(e) = fs::remove_file(&temp) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("could not remove temporary file {}: {}", temp.display(), e);
            }
        }
    } else {
        log::debug!("wrote {}", path.display());
    }
    result
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::image::tests::tiny_png;

    #[test]
    fn test_media_store_dedupes_by_hash() {
        let mut content_types = ContentTypes::new();
        let mut media = MediaStore::default();
        let a = Image::new_from_buffer(&tiny_png(None)).unwrap();
        let b = Image::new_from_buffer(&tiny_png(Some(3780))).unwrap();
        assert_eq!(media.add(&a, &mut content_types), "image1.png");
        assert_eq!(media.add(&b, &mut content_types), "image2.png");
        assert_eq!(media.add(&a, &mut content_types), "image1.png");
        assert_eq!(media.files.len(), 2);
        let ct = String::from_utf8(content_types.to_xml()).unwrap();
        assert_eq!(ct.matches("Extension=\"png\"").count(), 1);
    }

    #[test]
    fn test_archive_round_trips_part_names() {
        let parts = vec![
            ("a.xml".to_string(), b"<a/>".to_vec()),
            ("dir/b.xml".to_string(), b"<b/>".to_vec()),
        ];
        let mut cursor = Cursor::new(Vec::new());
        write_archive(parts, &mut cursor).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(cursor.into_inner())).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort_unstable();
        assert_eq!(names, vec!["a.xml", "dir/b.xml"]);
    }

    #[test]
    fn test_temp_file_cleaned_up_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing").join("out.xlsx");
        let err = write_file_atomic(vec![("a.xml".to_string(), Vec::new())], &target);
        assert!(err.is_err());
        assert!(!temp_path(&target).exists());
    }
}
