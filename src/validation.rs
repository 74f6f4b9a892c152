//! Excel limits and the name, range and length checks built on them.

use std::collections::HashSet;

use crate::error::{Result, WriteError};
use crate::utility::parse_cell_ref;

// Excel hard limits
pub const MAX_ROWS: usize = 1_048_576;
pub const MAX_COLS: usize = 16_384;
pub const MAX_STRING_LEN: usize = 32_767;
pub const MAX_URL_LEN: usize = 2_079;
pub const MAX_HYPERLINKS: usize = 65_530;
pub const MAX_HEADER_FOOTER_LEN: usize = 255;
pub const MAX_CHART_SERIES: usize = 255;
const MAX_SHEET_NAME_LEN: usize = 31;
const MAX_ROW_HEIGHT: f64 = 409.0;
const MAX_COL_WIDTH: f64 = 255.0;
const INVALID_SHEET_CHARS: &str = "[]:*?/\\";

/// Validate cell coordinates are within Excel limits
#[inline]
pub fn check_dimensions(row: u32, col: u16) -> Result<()> {
    if row as usize >= MAX_ROWS || col as usize >= MAX_COLS {
        return Err(WriteError::Dimension {
            row,
            col: col as u32,
        });
    }
    Ok(())
}

/// Validate both corners of a range.
pub fn check_range(first_row: u32, first_col: u16, last_row: u32, last_col: u16) -> Result<()> {
    check_dimensions(first_row, first_col)?;
    check_dimensions(last_row, last_col)
}

/// Validate sheet name meets Excel requirements
pub fn validate_sheet_name(name: &str) -> Result<()> {
    let fail = |reason: String| {
        Err(WriteError::SheetName {
            name: name.to_string(),
            reason,
        })
    };

    if name.is_empty() {
        return fail("sheet name cannot be empty".to_string());
    }

    let len = name.chars().count();
    if len > MAX_SHEET_NAME_LEN {
        return fail(format!(
            "exceeds {} characters (has {})",
            MAX_SHEET_NAME_LEN, len
        ));
    }

    if let Some(c) = name.chars().find(|c| INVALID_SHEET_CHARS.contains(*c)) {
        return fail(format!("contains invalid character '{}'", c));
    }

    if name.starts_with('\'') || name.ends_with('\'') {
        return fail("cannot start or end with an apostrophe".to_string());
    }

    if name.chars().any(|c| c.is_control()) {
        return fail("contains control characters".to_string());
    }

    if name.eq_ignore_ascii_case("History") {
        return fail("'History' is reserved by Excel".to_string());
    }

    Ok(())
}

/// Validate all sheet names in a workbook, including case-insensitive
/// duplicates.
pub fn validate_sheet_names(names: &[&str]) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        validate_sheet_name(name)?;
        if !seen.insert(name.to_lowercase()) {
            return Err(WriteError::DuplicateSheetName(name.to_string()));
        }
    }
    Ok(())
}

/// Names that Excel would read as a cell reference ("A1", "R1C1").
fn looks_like_cell_reference(name: &str) -> bool {
    if parse_cell_ref(name).is_some() {
        return true;
    }
    let upper = name.to_ascii_uppercase();
    if let Some(rest) = upper.strip_prefix('R') {
        let digits_then_c = rest.trim_start_matches(|c: char| c.is_ascii_digit());
        if let Some(cols) = digits_then_c.strip_prefix('C') {
            return cols.chars().all(|c| c.is_ascii_digit());
        }
        return rest.is_empty() || rest.chars().all(|c| c.is_ascii_digit());
    }
    upper == "C"
}

/// Validate an identifier used for a table or defined name.
fn validate_identifier(name: &str) -> std::result::Result<(), String> {
    let Some(first) = name.chars().next() else {
        return Err("name cannot be empty".to_string());
    };
    if name.chars().count() > 255 {
        return Err("name exceeds 255 characters".to_string());
    }
    if !(first.is_alphabetic() || first == '_' || first == '\\') {
        return Err("name must start with a letter, underscore or backslash".to_string());
    }
    if !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.' || c == '\\') {
        return Err("name contains invalid characters".to_string());
    }
    if looks_like_cell_reference(name) {
        return Err("name looks like a cell reference".to_string());
    }
    Ok(())
}

/// Validate table configuration names
pub fn validate_table_name(name: &str) -> Result<()> {
    validate_identifier(name)
        .map_err(|reason| WriteError::Table(format!("'{}': {}", name, reason)))
}

/// Validate a workbook or sheet scoped defined name. Built-in `_xlnm.`
/// names are accepted as-is.
pub fn validate_defined_name(name: &str) -> Result<()> {
    if name.starts_with("_xlnm.") {
        return Ok(());
    }
    validate_identifier(name).map_err(|_| WriteError::DefinedName(name.to_string()))
}

pub fn validate_row_height(height: f64) -> Result<()> {
    if !(0.0..=MAX_ROW_HEIGHT).contains(&height) {
        return Err(WriteError::Parameter(format!(
            "row height {} out of range (0-{})",
            height, MAX_ROW_HEIGHT
        )));
    }
    Ok(())
}

pub fn validate_column_width(width: f64) -> Result<()> {
    if !(0.0..=MAX_COL_WIDTH).contains(&width) {
        return Err(WriteError::Parameter(format!(
            "column width {} out of range (0-{})",
            width, MAX_COL_WIDTH
        )));
    }
    Ok(())
}

pub fn validate_string_length(text: &str) -> Result<()> {
    // Byte length is a cheap upper bound on the character count.
    if text.len() > MAX_STRING_LEN && text.chars().count() > MAX_STRING_LEN {
        return Err(WriteError::StringTooLong);
    }
    Ok(())
}

pub fn validate_header_footer(text: &str) -> Result<()> {
    if has_image_placeholder(text) {
        return Err(WriteError::Parameter(
            "header/footer image placeholders (&G, &[Picture]) are not supported".to_string(),
        ));
    }
    if text.chars().count() > MAX_HEADER_FOOTER_LEN {
        return Err(WriteError::HeaderFooterTooLong);
    }
    Ok(())
}

/// `&G` or `&[Picture]` outside an escaped `&&`.
fn has_image_placeholder(text: &str) -> bool {
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        let after = &rest[pos + 1..];
        if after.starts_with('G') || after.starts_with("[Picture]") {
            return true;
        }
        rest = after.strip_prefix('&').unwrap_or(after);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sheet_name() {
        assert!(validate_sheet_name("Sheet1").is_ok());
        assert!(validate_sheet_name("Données 2024").is_ok());
        assert!(validate_sheet_name("").is_err());
        assert!(validate_sheet_name(&"A".repeat(32)).is_err());
        assert!(validate_sheet_name(&"é".repeat(31)).is_ok());
        assert!(validate_sheet_name("Invalid:Name").is_err());
        assert!(validate_sheet_name("'quoted").is_err());
        assert!(validate_sheet_name("history").is_err());
    }

    #[test]
    fn test_duplicate_sheet_names() {
        let err = validate_sheet_names(&["Sheet1", "sheet1"]).unwrap_err();
        assert!(matches!(err, WriteError::DuplicateSheetName(name) if name == "sheet1"));
        assert!(validate_sheet_names(&["Sheet1", "Sheet2"]).is_ok());
    }

    #[test]
    fn test_cell_coords_overflow() {
        assert!(check_dimensions(MAX_ROWS as u32, 0).is_err());
        assert!(check_dimensions(0, MAX_COLS as u16).is_err());
        assert!(check_dimensions(MAX_ROWS as u32 - 1, MAX_COLS as u16 - 1).is_ok());
    }

    #[test]
    fn test_identifiers() {
        assert!(validate_table_name("Sales_2024").is_ok());
        assert!(validate_table_name("2024Sales").is_err());
        assert!(validate_table_name("A1").is_err());
        assert!(validate_table_name("R1C1").is_err());
        assert!(validate_table_name("has space").is_err());
        assert!(validate_defined_name("_xlnm.Print_Area").is_ok());
        assert!(validate_defined_name("Exchange_Rate").is_ok());
        assert!(validate_defined_name("").is_err());
    }

    #[test]
    fn test_length_limits() {
        assert!(validate_string_length(&"x".repeat(MAX_STRING_LEN)).is_ok());
        assert!(matches!(
            validate_string_length(&"x".repeat(MAX_STRING_LEN + 1)),
            Err(WriteError::StringTooLong)
        ));
        assert!(validate_header_footer(&"h".repeat(255)).is_ok());
        assert!(matches!(
            validate_header_footer(&"h".repeat(256)),
            Err(WriteError::HeaderFooterTooLong)
        ));
    }

    #[test]
    fn test_header_footer_image_placeholders_rejected() {
        for text in ["&L&G", "&C&[Picture]", "&R&G&P"] {
            assert!(matches!(validate_header_footer(text), Err(WriteError::Parameter(_))), "{}", text);
        }
        assert!(validate_header_footer("&LR&&G Ltd").is_ok());
        assert!(validate_header_footer("&CPage &P of &N").is_ok());
    }

    #[test]
    fn test_row_and_column_sizes() {
        assert!(validate_row_height(30.0).is_ok());
        assert!(validate_row_height(500.0).is_err());
        assert!(validate_column_width(-1.0).is_err());
    }
}
