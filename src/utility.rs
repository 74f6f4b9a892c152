//! Cell reference helpers, date serials and the pixel/EMU conversions shared
//! by the worksheet, drawing and chart writers.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::validation::{MAX_COLS, MAX_ROWS};

/// Pixel width of a column that has no explicit width.
pub const DEFAULT_COL_PIXELS: f64 = 64.0;
/// Pixel height of a row that has no explicit height.
pub const DEFAULT_ROW_PIXELS: f64 = 20.0;
pub const DEFAULT_COL_WIDTH: f64 = 8.43;
pub const DEFAULT_ROW_HEIGHT: f64 = 15.0;
pub const EMU_PER_PIXEL: f64 = 9525.0;

const MAX_DIGIT_WIDTH: f64 = 7.0;
const COLUMN_PADDING: f64 = 5.0;

/// Zero-allocation column letter writing - returns length written
#[inline(always)]
pub fn write_col_letter(col: u16, buf: &mut [u8; 4]) -> usize {
    let mut col = col as u32;
    if col < 26 {
        buf[0] = b'A' + col as u8;
        return 1;
    }

    let mut stack = [0u8; 4];
    let mut stack_len = 0;

    while col >= 26 {
        stack[stack_len] = b'A' + (col % 26) as u8;
        stack_len += 1;
        col = col / 26 - 1;
    }
    stack[stack_len] = b'A' + col as u8;
    stack_len += 1;

    for i in 0..stack_len {
        buf[i] = stack[stack_len - 1 - i];
    }

    stack_len
}

/// Column letters for a zero-based column, e.g. 0 -> "A", 26 -> "AA".
pub fn col_to_name(col: u16) -> String {
    let mut buf = [0u8; 4];
    let len = write_col_letter(col, &mut buf);
    String::from_utf8_lossy(&buf[..len]).into_owned()
}

/// Zero-based column for a run of column letters. Case-insensitive.
pub fn name_to_col(name: &str) -> Option<u16> {
    if name.is_empty() || name.len() > 3 {
        return None;
    }
    let mut col: u32 = 0;
    for b in name.bytes() {
        let b = b.to_ascii_uppercase();
        if !b.is_ascii_uppercase() {
            return None;
        }
        col = col * 26 + (b - b'A' + 1) as u32;
    }
    let col = col - 1;
    if col as usize >= MAX_COLS {
        return None;
    }
    Some(col as u16)
}

/// Memoized column letters for the serializer's hot loop.
///
/// Owned by whoever is writing a sheet; nothing global is shared.
#[derive(Debug, Default)]
pub struct ColumnNameCache {
    names: Vec<Option<Box<str>>>,
}

impl ColumnNameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, col: u16) -> &str {
        let idx = col as usize;
        if idx >= self.names.len() {
            self.names.resize(idx + 1, None);
        }
        self.names[idx].get_or_insert_with(|| col_to_name(col).into_boxed_str())
    }

    /// Append "A1"-style reference bytes to `buf`.
    pub fn write_cell_ref(&mut self, row: u32, col: u16, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.get(col).as_bytes());
        buf.extend_from_slice(itoa::Buffer::new().format(row + 1).as_bytes());
    }
}

/// "A1" style reference for a zero-based row and column.
pub fn cell_ref(row: u32, col: u16) -> String {
    let mut s = col_to_name(col);
    s.push_str(itoa::Buffer::new().format(row + 1));
    s
}

/// "$A$1" style reference.
pub fn cell_ref_abs(row: u32, col: u16) -> String {
    format!("${}${}", col_to_name(col), row + 1)
}

/// "A1:B2", collapsing to "A1" when the range is a single cell.
pub fn range_ref(first_row: u32, first_col: u16, last_row: u32, last_col: u16) -> String {
    if first_row == last_row && first_col == last_col {
        cell_ref(first_row, first_col)
    } else {
        format!("{}:{}", cell_ref(first_row, first_col), cell_ref(last_row, last_col))
    }
}

/// "$A$1:$B$2", collapsing to "$A$1" when the range is a single cell.
pub fn range_ref_abs(first_row: u32, first_col: u16, last_row: u32, last_col: u16) -> String {
    if first_row == last_row && first_col == last_col {
        cell_ref_abs(first_row, first_col)
    } else {
        format!(
            "{}:{}",
            cell_ref_abs(first_row, first_col),
            cell_ref_abs(last_row, last_col)
        )
    }
}

/// Parse "B3" or "$B$3" into zero-based (row, col).
pub fn parse_cell_ref(cell: &str) -> Option<(u32, u16)> {
    let cell = cell.trim();
    let bytes = cell.as_bytes();
    let mut pos = 0;
    if bytes.first() == Some(&b'$') {
        pos += 1;
    }
    let letters_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
        pos += 1;
    }
    let col = name_to_col(&cell[letters_start..pos])?;
    if bytes.get(pos) == Some(&b'$') {
        pos += 1;
    }
    let digits = &cell[pos..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let row: u32 = digits.parse().ok()?;
    if row == 0 || row as usize > MAX_ROWS {
        return None;
    }
    Some((row - 1, col))
}

/// Parse "A1:C5" (or a single cell) into a normalized zero-based range.
pub fn parse_range_ref(range: &str) -> Option<(u32, u16, u32, u16)> {
    match range.split_once(':') {
        Some((a, b)) => {
            let (r1, c1) = parse_cell_ref(a)?;
            let (r2, c2) = parse_cell_ref(b)?;
            Some((r1.min(r2), c1.min(c2), r1.max(r2), c1.max(c2)))
        }
        None => {
            let (r, c) = parse_cell_ref(range)?;
            Some((r, c, r, c))
        }
    }
}

/// Quote a sheet name for use in a formula when Excel requires it.
/// Example: "My Sheet" -> "'My Sheet'"
///          "Quote's Sheet" -> "'Quote''s Sheet'"
pub fn quote_sheet_name(name: &str) -> String {
    if name.starts_with('\'') && name.ends_with('\'') && name.len() > 1 {
        return name.to_string();
    }
    let needs_quoting = name.chars().next().is_some_and(|c| c.is_ascii_digit())
        || name.chars().any(|c| !c.is_alphanumeric() && c != '_' && c != '.');

    if needs_quoting {
        format!("'{}'", name.replace('\'', "''"))
    } else {
        name.to_string()
    }
}

/// Strip quoting added by [`quote_sheet_name`].
pub fn unquote_sheet_name(name: &str) -> String {
    if name.len() >= 2 && name.starts_with('\'') && name.ends_with('\'') {
        name[1..name.len() - 1].replace("''", "'")
    } else {
        name.to_string()
    }
}

// ============================================================================
// Dates
// ============================================================================

fn excel_epoch() -> NaiveDate {
    // 1899-12-30 absorbs Excel's phantom 1900-02-29.
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default()
}

#[inline(always)]
pub fn datetime_to_excel_serial(dt: &NaiveDateTime) -> f64 {
    let days = (dt.date() - excel_epoch()).num_days() as f64;
    days + time_to_excel_fraction(&dt.time())
}

pub fn date_to_excel_serial(date: &NaiveDate) -> f64 {
    (*date - excel_epoch()).num_days() as f64
}

pub fn time_to_excel_fraction(time: &NaiveTime) -> f64 {
    let secs = (time.hour() * 3600 + time.minute() * 60 + time.second()) as f64
        + time.nanosecond() as f64 / 1e9;
    secs / 86400.0
}

/// Parse an ISO 8601 date, datetime or time string into an Excel serial.
pub fn parse_date_string(s: &str) -> Option<f64> {
    let s = s.trim();
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s.trim_end_matches('Z'), fmt) {
            return Some(datetime_to_excel_serial(&dt));
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date_to_excel_serial(&d));
    }
    for fmt in ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"] {
        if let Ok(t) = NaiveTime::parse_from_str(s, fmt) {
            return Some(time_to_excel_fraction(&t));
        }
    }
    None
}

// ============================================================================
// Numbers
// ============================================================================

/// Append a cell number the way Excel writes it: integral values without a
/// fractional part, everything else via ryu.
#[inline(always)]
pub fn push_number(buf: &mut Vec<u8>, n: f64) {
    if n.fract() == 0.0 && n.abs() < 9007199254740992.0 {
        buf.extend_from_slice(itoa::Buffer::new().format(n as i64).as_bytes());
    } else {
        buf.extend_from_slice(ryu::Buffer::new().format(n).as_bytes());
    }
}

pub fn format_number(n: f64) -> String {
    let mut buf = Vec::with_capacity(24);
    push_number(&mut buf, n);
    String::from_utf8(buf).unwrap_or_default()
}

// ============================================================================
// Pixels
// ============================================================================

/// Column width in character units to pixels.
pub fn col_width_to_pixels(width: f64) -> f64 {
    if width < 1.0 {
        (width * (MAX_DIGIT_WIDTH + COLUMN_PADDING) + 0.5).floor()
    } else {
        (width * MAX_DIGIT_WIDTH + 0.5).floor() + COLUMN_PADDING
    }
}

/// Pixels back to the character width Excel stores in `<col width>`.
pub fn pixels_to_col_width(pixels: f64) -> f64 {
    if pixels <= 12.0 {
        pixels / (MAX_DIGIT_WIDTH + COLUMN_PADDING)
    } else {
        (pixels - COLUMN_PADDING) / MAX_DIGIT_WIDTH
    }
}

/// Width as serialized in `<col width="..">`, truncated to 1/256 of a
/// character like Excel does.
pub fn col_width_for_xml(width: f64) -> f64 {
    if width <= 0.0 {
        return 0.0;
    }
    let pixels = col_width_to_pixels(width);
    let stored = if width < 1.0 {
        pixels / (MAX_DIGIT_WIDTH + COLUMN_PADDING)
    } else {
        pixels / MAX_DIGIT_WIDTH
    };
    (stored * 256.0).floor() / 256.0
}

/// Row height in points to pixels.
pub fn row_height_to_pixels(height: f64) -> f64 {
    (4.0 * height / 3.0).floor()
}

pub fn pixels_to_row_height(pixels: f64) -> f64 {
    pixels * 0.75
}

/// Pixels to English Metric Units, rounded half-up.
pub fn pixels_to_emu(pixels: f64) -> u64 {
    (pixels * EMU_PER_PIXEL + 0.5).floor().max(0.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letters() {
        assert_eq!(col_to_name(0), "A");
        assert_eq!(col_to_name(25), "Z");
        assert_eq!(col_to_name(26), "AA");
        assert_eq!(col_to_name(701), "ZZ");
        assert_eq!(col_to_name(702), "AAA");
        assert_eq!(col_to_name(16_383), "XFD");
    }

    #[test]
    fn test_column_letters_reverse() {
        let mut cache = ColumnNameCache::new();
        for col in 0..16_384u16 {
            let name = col_to_name(col);
            assert_eq!(name_to_col(&name), Some(col), "{}", name);
            assert_eq!(parse_cell_ref(&format!("{}1", name)), Some((0, col)));
            assert_eq!(cache.get(col), name);
        }
        assert_eq!(name_to_col("XFE"), None);
        assert_eq!(name_to_col("a1"), None);
    }

    #[test]
    fn test_column_cache_reuses_names() {
        let mut cache = ColumnNameCache::new();
        assert_eq!(cache.get(27), "AB");
        assert_eq!(cache.get(0), "A");
        let mut buf = Vec::new();
        cache.write_cell_ref(9, 27, &mut buf);
        assert_eq!(buf, b"AB10");
    }

    #[test]
    fn test_cell_and_range_refs() {
        assert_eq!(cell_ref(0, 0), "A1");
        assert_eq!(cell_ref_abs(4, 1), "$B$5");
        assert_eq!(range_ref(0, 0, 0, 0), "A1");
        assert_eq!(range_ref(0, 0, 9, 2), "A1:C10");
        assert_eq!(range_ref_abs(1, 0, 5, 0), "$A$2:$A$6");
    }

    #[test]
    fn test_parse_refs() {
        assert_eq!(parse_cell_ref("B3"), Some((2, 1)));
        assert_eq!(parse_cell_ref("$B$3"), Some((2, 1)));
        assert_eq!(parse_cell_ref("A0"), None);
        assert_eq!(parse_cell_ref("3B"), None);
        assert_eq!(parse_range_ref("C5:A1"), Some((0, 0, 4, 2)));
        assert_eq!(parse_range_ref("D4"), Some((3, 3, 3, 3)));
    }

    #[test]
    fn test_quote_sheet_name() {
        assert_eq!(quote_sheet_name("Sheet1"), "Sheet1");
        assert_eq!(quote_sheet_name("My Sheet"), "'My Sheet'");
        assert_eq!(quote_sheet_name("Quote's"), "'Quote''s'");
        assert_eq!(quote_sheet_name("Sheet!"), "'Sheet!'");
        assert_eq!(quote_sheet_name("'Already'"), "'Already'");
        assert_eq!(unquote_sheet_name("'Quote''s'"), "Quote's");
    }

    #[test]
    fn test_excel_serials() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(date_to_excel_serial(&d), 45292.0);
        let dt = d.and_hms_opt(12, 0, 0).unwrap();
        assert_eq!(datetime_to_excel_serial(&dt), 45292.5);
        assert_eq!(parse_date_string("2024-01-01"), Some(45292.0));
        assert_eq!(parse_date_string("2024-01-01T12:00:00"), Some(45292.5));
        assert_eq!(parse_date_string("06:00"), Some(0.25));
        assert_eq!(parse_date_string("not a date"), None);
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(0.1), "0.1");
    }

    #[test]
    fn test_pixel_conversions() {
        assert_eq!(col_width_to_pixels(DEFAULT_COL_WIDTH), DEFAULT_COL_PIXELS);
        assert_eq!(col_width_to_pixels(0.5), 6.0);
        assert_eq!(col_width_to_pixels(20.0), 145.0);
        assert_eq!(row_height_to_pixels(DEFAULT_ROW_HEIGHT), DEFAULT_ROW_PIXELS);
        assert_eq!(row_height_to_pixels(30.0), 40.0);
        assert_eq!(pixels_to_emu(64.0), 609_600);
        assert_eq!(pixels_to_emu(0.5), 4763);
        assert_eq!(col_width_for_xml(20.0), 20.7109375);
    }
}
