//! End-to-end checks: save a workbook, open the archive, inspect the parts.

use std::io::{Cursor, Read};
use std::sync::Arc;

use arrow_array::{ArrayRef, Float64Array, Int32Array, RecordBatch, StringArray};
use oxlsx::{
    Chart, Color, DocProperties, Format, FormatAlign, Image, Note, Shape, ShapeType, Table, TableColumn,
    TableFunction, Workbook, WriteError,
};
use pretty_assertions::assert_eq;

fn open(bytes: Vec<u8>) -> zip::ZipArchive<Cursor<Vec<u8>>> {
    zip::ZipArchive::new(Cursor::new(bytes)).unwrap()
}

fn part(archive: &mut zip::ZipArchive<Cursor<Vec<u8>>>, name: &str) -> String {
    let mut file = archive
        .by_name(name)
        .unwrap_or_else(|_| panic!("missing part {}", name));
    let mut text = String::new();
    file.read_to_string(&mut text).unwrap();
    text
}

fn names(archive: &zip::ZipArchive<Cursor<Vec<u8>>>) -> Vec<String> {
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    names
}

fn png() -> Vec<u8> {
    let pixels = image::RgbImage::from_pixel(4, 3, image::Rgb([200, 30, 30]));
    let mut out = Cursor::new(Vec::new());
    pixels.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

#[test]
fn test_minimal_workbook_parts() {
    let mut workbook = Workbook::new();
    workbook.add_worksheet().write(0, 0, "hello").unwrap();
    let mut archive = open(workbook.save_to_buffer().unwrap());

    assert_eq!(
        names(&archive),
        vec![
            "[Content_Types].xml",
            "_rels/.rels",
            "docProps/app.xml",
            "docProps/core.xml",
            "xl/_rels/workbook.xml.rels",
            "xl/sharedStrings.xml",
            "xl/styles.xml",
            "xl/workbook.xml",
            "xl/worksheets/sheet1.xml",
        ]
    );
    let sheet = part(&mut archive, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("<c r=\"A1\" t=\"s\"><v>0</v></c>"));
    let strings = part(&mut archive, "xl/sharedStrings.xml");
    assert!(strings.contains("count=\"1\" uniqueCount=\"1\""));
    assert!(strings.contains("<si><t>hello</t></si>"));
    let rels = part(&mut archive, "xl/_rels/workbook.xml.rels");
    assert!(rels.contains("Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"worksheets/sheet1.xml\""));
}

#[test]
fn test_empty_workbook_gets_default_sheet() {
    let mut workbook = Workbook::new();
    let mut archive = open(workbook.save_to_buffer().unwrap());
    let xml = part(&mut archive, "xl/workbook.xml");
    assert!(xml.contains("<sheet name=\"Sheet1\" sheetId=\"1\" r:id=\"rId1\"/>"));
    assert!(archive.by_name("xl/sharedStrings.xml").is_err());
}

#[test]
fn test_equal_columns_share_one_col_element() {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_column_range_width(0, 15, 20.0).unwrap();
    sheet.write(0, 0, "wide").unwrap();

    let mut archive = open(workbook.save_to_buffer().unwrap());
    let xml = part(&mut archive, "xl/worksheets/sheet1.xml");
    assert_eq!(xml.matches("<col ").count(), 1);
    assert!(xml.contains(
        "<cols><col min=\"1\" max=\"16\" width=\"20.7109375\" customWidth=\"1\"/></cols>"
    ));
}

#[test]
fn test_equal_fonts_and_fills_are_shared() {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let base = Format::new().set_bold().set_background_color(Color::YELLOW);
    let centered = base.clone().set_align(FormatAlign::Center);
    sheet.write_with_format(0, 0, "a", &base).unwrap();
    sheet.write_with_format(1, 0, "b", &base.clone()).unwrap();
    sheet.write_with_format(2, 0, "c", &centered).unwrap();

    let mut archive = open(workbook.save_to_buffer().unwrap());
    let styles = part(&mut archive, "xl/styles.xml");
    assert!(styles.contains("<fonts count=\"2\">"));
    assert!(styles.contains("<fills count=\"3\">"));
    assert!(styles.contains("<cellXfs count=\"3\">"));
    let sheet = part(&mut archive, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("<c r=\"A1\" s=\"1\""));
    assert!(sheet.contains("<c r=\"A2\" s=\"1\""));
    assert!(sheet.contains("<c r=\"A3\" s=\"2\""));
}

#[test]
fn test_content_types_cover_every_part() {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write(0, 0, "Region").unwrap();
    sheet.write(1, 0, 10.0).unwrap();
    sheet.write(2, 0, 20.0).unwrap();
    sheet.insert_note(0, 0, &Note::new("check totals").unwrap()).unwrap();
    let mut chart = Chart::new_column();
    chart.add_series().unwrap().set_values("Sheet1!$A$2:$A$3");
    sheet.insert_chart(4, 2, chart).unwrap();
    sheet
        .add_table(0, 3, 2, 4, &Table::new())
        .unwrap();

    let mut archive = open(workbook.save_to_buffer().unwrap());
    let types = part(&mut archive, "[Content_Types].xml");
    for name in names(&archive) {
        if name.ends_with(".rels") || name.ends_with(".vml") || name == "[Content_Types].xml" {
            continue;
        }
        assert!(
            types.contains(&format!("PartName=\"/{}\"", name)),
            "{} has no content type",
            name
        );
    }
    assert!(types.contains("<Default Extension=\"vml\""));
    assert!(archive.by_name("xl/comments1.xml").is_ok());
    assert!(archive.by_name("xl/drawings/vmlDrawing1.vml").is_ok());
    assert!(archive.by_name("xl/tables/table1.xml").is_ok());
    assert!(archive.by_name("xl/charts/chart1.xml").is_ok());
}

#[test]
fn test_sheet_relationship_order() {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_url(0, 0, "https://example.com/").unwrap();
    sheet.write_url(1, 0, "internal:Sheet1!B2").unwrap();
    sheet.insert_note(2, 0, &Note::new("n").unwrap()).unwrap();
    sheet
        .insert_shape(3, 3, Shape::new(ShapeType::Rectangle).set_text("box"))
        .unwrap();
    sheet.write(5, 5, 1).unwrap();
    sheet.write(6, 5, 2).unwrap();
    sheet.add_table(5, 5, 6, 5, &Table::new()).unwrap();

    let mut archive = open(workbook.save_to_buffer().unwrap());
    let rels = part(&mut archive, "xl/worksheets/_rels/sheet1.xml.rels");
    let order: Vec<&str> = ["hyperlink", "drawing", "vmlDrawing", "comments", "table"]
        .iter()
        .map(|kind| {
            let at = rels
                .find(&format!("relationships/{}\"", kind))
                .unwrap_or_else(|| panic!("no {} relationship", kind));
            &rels[rels[..at].rfind("Id=\"").unwrap()..at]
        })
        .collect();
    assert!(order[0].starts_with("Id=\"rId1\""));
    assert!(order[1].starts_with("Id=\"rId2\""));
    assert!(order[2].starts_with("Id=\"rId3\""));
    assert!(order[3].starts_with("Id=\"rId4\""));
    assert!(order[4].starts_with("Id=\"rId5\""));
    assert!(rels.contains("TargetMode=\"External\""));

    let sheet = part(&mut archive, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("<hyperlink ref=\"A1\" r:id=\"rId1\"/>"));
    assert!(sheet.contains("location=\"Sheet1!B2\""));
    assert!(sheet.contains("<drawing r:id=\"rId2\"/>"));
    assert!(sheet.contains("<legacyDrawing r:id=\"rId3\"/>"));
    assert!(sheet.contains("<tablePart r:id=\"rId5\"/>"));
}

#[test]
fn test_chart_cache_and_chartsheet() {
    let mut workbook = Workbook::new();
    let data = workbook.add_worksheet_with_name("Data").unwrap();
    data.write(0, 0, "Q1").unwrap();
    data.write(1, 0, "Q2").unwrap();
    data.write(0, 1, 5).unwrap();
    data.write(1, 1, 7.5).unwrap();

    let mut chart = Chart::new_pie();
    chart
        .add_series()
        .unwrap()
        .set_categories("Data!$A$1:$A$2")
        .set_values("Data!$B$1:$B$2");
    workbook.add_chartsheet().set_chart(chart).unwrap();

    let mut archive = open(workbook.save_to_buffer().unwrap());
    let chart = part(&mut archive, "xl/charts/chart1.xml");
    assert!(chart.contains("<c:f>Data!$B$1:$B$2</c:f>"));
    assert!(chart.contains("<c:pt idx=\"1\"><c:v>7.5</c:v></c:pt>"));
    assert!(chart.contains("<c:pt idx=\"0\"><c:v>Q1</c:v></c:pt>"));

    let chartsheet = part(&mut archive, "xl/chartsheets/sheet1.xml");
    assert!(chartsheet.contains("<drawing r:id=\"rId1\"/>"));
    let drawing = part(&mut archive, "xl/drawings/drawing1.xml");
    assert!(drawing.contains("<xdr:absoluteAnchor>"));
    let workbook_xml = part(&mut archive, "xl/workbook.xml");
    assert!(workbook_xml.contains("<sheet name=\"Chart1\" sheetId=\"2\" r:id=\"rId2\"/>"));
    let app = part(&mut archive, "docProps/app.xml");
    assert!(app.contains("<vt:lpstr>Charts</vt:lpstr>"));
}

#[test]
fn test_chart_referencing_missing_sheet_fails() {
    let mut workbook = Workbook::new();
    let mut chart = Chart::new_line();
    chart.add_series().unwrap().set_values("Nowhere!$A$1:$A$3");
    workbook.add_worksheet().insert_chart(0, 0, chart).unwrap();
    let err = workbook.save_to_buffer().unwrap_err();
    assert!(matches!(err, WriteError::UnknownWorksheetReference { .. }));
}

#[test]
fn test_images_share_one_media_file() {
    let bytes = png();
    let image = Image::new_from_buffer(&bytes).unwrap().set_alt_text("logo");
    let mut workbook = Workbook::new();
    workbook.add_worksheet().insert_image(0, 0, &image).unwrap();
    let second = workbook.add_worksheet();
    second.insert_image(2, 2, &image).unwrap();
    second.write_image_in_cell(0, 0, &image).unwrap();

    let mut archive = open(workbook.save_to_buffer().unwrap());
    let media: Vec<String> = names(&archive)
        .into_iter()
        .filter(|n| n.starts_with("xl/media/"))
        .collect();
    assert_eq!(media, vec!["xl/media/image1.png".to_string()]);
    let drawing = part(&mut archive, "xl/drawings/drawing2.xml");
    assert!(drawing.contains("descr=\"logo\""));

    let sheet = part(&mut archive, "xl/worksheets/sheet2.xml");
    assert!(sheet.contains("<c r=\"A1\" t=\"e\" vm=\"1\"><v>#VALUE!</v></c>"));
    let rels = part(&mut archive, "xl/richData/_rels/richValueRel.xml.rels");
    assert!(rels.contains("Target=\"../media/image1.png\""));
    let metadata = part(&mut archive, "xl/metadata.xml");
    assert!(metadata.contains("XLRICHVALUE"));
}

#[test]
fn test_defined_names_and_print_titles() {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_repeat_rows(0, 1).unwrap();
    sheet.set_print_area(0, 0, 9, 3).unwrap();
    workbook.define_name("Rate", "=Sheet1!$B$1").unwrap();

    let mut archive = open(workbook.save_to_buffer().unwrap());
    let xml = part(&mut archive, "xl/workbook.xml");
    assert!(xml.contains(
        "<definedName name=\"_xlnm.Print_Area\" localSheetId=\"0\">Sheet1!$A$1:$D$10</definedName>"
    ));
    assert!(xml.contains(
        "<definedName name=\"_xlnm.Print_Titles\" localSheetId=\"0\">Sheet1!$1:$2</definedName>"
    ));
    assert!(xml.contains("<definedName name=\"Rate\">Sheet1!$B$1</definedName>"));
}

#[test]
fn test_table_with_totals() {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write(0, 0, "Item").unwrap();
    sheet.write(0, 1, "Cost").unwrap();
    sheet.write(1, 0, "Pen").unwrap();
    sheet.write(1, 1, 2.5).unwrap();
    let table = Table::new().set_total_row(true).set_columns(&[
        TableColumn::new().set_header("Item").set_total_label("Total"),
        TableColumn::new()
            .set_header("Cost")
            .set_total_function(TableFunction::Sum),
    ]);
    sheet.add_table(0, 0, 2, 1, &table).unwrap();

    let mut archive = open(workbook.save_to_buffer().unwrap());
    let xml = part(&mut archive, "xl/tables/table1.xml");
    assert!(xml.contains("ref=\"A1:B3\""));
    assert!(xml.contains("totalsRowCount=\"1\""));
    assert!(xml.contains("totalsRowFunction=\"sum\""));
    let sheet = part(&mut archive, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("SUBTOTAL(109,[Cost])"));
}

#[test]
fn test_record_batch_round_trip_through_package() {
    let batch = RecordBatch::try_from_iter(vec![
        ("name", Arc::new(StringArray::from(vec![Some("a"), None])) as ArrayRef),
        ("qty", Arc::new(Int32Array::from(vec![3, 4])) as ArrayRef),
        ("price", Arc::new(Float64Array::from(vec![1.5, 2.25])) as ArrayRef),
    ])
    .unwrap();
    let bold = Format::new().set_bold();
    let mut workbook = Workbook::new();
    workbook
        .add_worksheet()
        .write_record_batch(0, 0, &batch, Some(&bold))
        .unwrap();

    let mut archive = open(workbook.save_to_buffer().unwrap());
    let sheet = part(&mut archive, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("<dimension ref=\"A1:C3\"/>"));
    assert!(sheet.contains("<c r=\"B2\"><v>3</v></c>"));
    assert!(sheet.contains("<c r=\"C3\"><v>2.25</v></c>"));
    assert!(!sheet.contains("r=\"A3\""));
    let styles = part(&mut archive, "xl/styles.xml");
    assert!(styles.contains("<b/>"));
}

#[test]
fn test_properties_and_protection() {
    let created = chrono::DateTime::parse_from_rfc3339("2024-01-02T03:04:05Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    let mut workbook = Workbook::new();
    workbook
        .set_properties(DocProperties::new().set_title("Budget").set_creation_datetime(created))
        .protect(Some("secret"), true);
    workbook
        .add_worksheet()
        .set_tab_color(Color::RED)
        .protect_with_password("pw");

    let mut archive = open(workbook.save_to_buffer().unwrap());
    let core = part(&mut archive, "docProps/core.xml");
    assert!(core.contains("<dc:title>Budget</dc:title>"));
    assert!(core.contains("2024-01-02T03:04:05Z"));
    let xml = part(&mut archive, "xl/workbook.xml");
    assert!(xml.contains("workbookAlgorithmName=\"SHA-512\""));
    assert!(xml.contains("lockStructure=\"1\" lockWindows=\"1\""));
    let sheet = part(&mut archive, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("<sheetProtection password="));
}

#[test]
fn test_save_to_disk_replaces_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.xlsx");
    std::fs::write(&path, b"old").unwrap();

    let mut workbook = Workbook::new();
    workbook.add_worksheet().write(0, 0, 1).unwrap();
    workbook.save(&path).unwrap();

    let archive = open(std::fs::read(&path).unwrap());
    assert!(archive.file_names().any(|n| n == "xl/workbook.xml"));
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_hidden_sheets_need_a_visible_one() {
    let mut workbook = Workbook::new();
    workbook.add_worksheet().set_hidden(true);
    assert!(matches!(workbook.save_to_buffer(), Err(WriteError::Parameter(_))));
}
