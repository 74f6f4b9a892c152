use std::collections::HashSet;
use std::io::{Cursor, Read};

use oxlsx::Workbook;
use proptest::prelude::*;

fn read_part(bytes: Vec<u8>, name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut text = String::new();
    archive.by_name(name).unwrap().read_to_string(&mut text).unwrap();
    text
}

fn attr<'a>(xml: &'a str, name: &str) -> &'a str {
    let key = format!(" {}=\"", name);
    let start = xml.find(&key).unwrap() + key.len();
    let end = start + xml[start..].find('"').unwrap();
    &xml[start..end]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_shared_string_counts(texts in prop::collection::vec("[a-c <&>]{1,4}", 1..40)) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (row, text) in texts.iter().enumerate() {
            sheet.write_string(row as u32, 0, text).unwrap();
        }
        let xml = read_part(workbook.save_to_buffer().unwrap(), "xl/sharedStrings.xml");
        let distinct: HashSet<&String> = texts.iter().collect();
        prop_assert_eq!(attr(&xml, "count"), texts.len().to_string());
        prop_assert_eq!(attr(&xml, "uniqueCount"), distinct.len().to_string());
        prop_assert_eq!(xml.matches("<si>").count(), distinct.len());
        prop_assert!(!xml.contains("<>"));
    }

    #[test]
    fn test_numbers_keep_their_value(values in prop::collection::vec(-1.0e12f64..1.0e12, 1..20)) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (row, value) in values.iter().enumerate() {
            sheet.write_number(row as u32, 1, *value).unwrap();
        }
        let xml = read_part(workbook.save_to_buffer().unwrap(), "xl/worksheets/sheet1.xml");
        let parsed: Vec<f64> = xml
            .split("<v>")
            .skip(1)
            .map(|rest| rest[..rest.find("</v>").unwrap()].parse().unwrap())
            .collect();
        prop_assert_eq!(parsed, values);
    }

    #[test]
    fn test_dimension_covers_written_cells(cells in prop::collection::vec((0u32..500, 0u16..60), 1..30)) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for &(row, col) in &cells {
            sheet.write_number(row, col, 1.0).unwrap();
        }
        let xml = read_part(workbook.save_to_buffer().unwrap(), "xl/worksheets/sheet1.xml");
        let max_row = cells.iter().map(|c| c.0).max().unwrap();
        let min_row = cells.iter().map(|c| c.0).min().unwrap();
        let max_col = cells.iter().map(|c| c.1).max().unwrap();
        let min_col = cells.iter().map(|c| c.1).min().unwrap();
        let expected = if (min_row, min_col) == (max_row, max_col) {
            oxlsx::utility::cell_ref(min_row, min_col)
        } else {
            oxlsx::utility::range_ref(min_row, min_col, max_row, max_col)
        };
        prop_assert_eq!(attr(&xml, "ref"), expected);
    }
}
