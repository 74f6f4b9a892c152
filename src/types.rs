use crate::utility::{range_ref, range_ref_abs};

/// What a formula cell reports before Excel recalculates it.
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaResult {
    Number(f64),
    String(String),
    Boolean(bool),
    Error(String),
}

impl Default for FormulaResult {
    fn default() -> Self {
        FormulaResult::Number(0.0)
    }
}

impl FormulaResult {
    /// Type a user-supplied cached value the way Excel would display it.
    pub fn from_text(text: &str) -> Self {
        match text {
            "TRUE" => FormulaResult::Boolean(true),
            "FALSE" => FormulaResult::Boolean(false),
            t if t.starts_with('#') => FormulaResult::Error(t.to_string()),
            t => match t.parse::<f64>() {
                Ok(n) => FormulaResult::Number(n),
                Err(_) => FormulaResult::String(t.to_string()),
            },
        }
    }
}

/// The value stored in one worksheet cell. `xf` is the style index from
/// the workbook format table; `None` means the default style.
#[derive(Debug, Clone, PartialEq)]
pub enum CellData {
    Number {
        value: f64,
        xf: Option<u32>,
    },
    String {
        index: u32,
        raw: Box<str>,
        xf: Option<u32>,
    },
    RichString {
        index: u32,
        raw: Box<str>,
        xf: Option<u32>,
    },
    Blank {
        xf: Option<u32>,
    },
    Boolean {
        value: bool,
        xf: Option<u32>,
    },
    Formula {
        formula: String,
        result: FormulaResult,
        xf: Option<u32>,
    },
    ArrayFormula {
        formula: String,
        range: CellRange,
        dynamic: bool,
        result: FormulaResult,
        xf: Option<u32>,
    },
    DateTime {
        serial: f64,
        xf: Option<u32>,
    },
    Error {
        value: String,
        xf: Option<u32>,
    },
    /// Picture placed in the cell itself, by index into the sheet's
    /// embedded image list.
    EmbeddedImage {
        index: u32,
        xf: Option<u32>,
    },
}

impl CellData {
    pub fn xf(&self) -> Option<u32> {
        match self {
            CellData::Number { xf, .. }
            | CellData::String { xf, .. }
            | CellData::RichString { xf, .. }
            | CellData::Blank { xf }
            | CellData::Boolean { xf, .. }
            | CellData::Formula { xf, .. }
            | CellData::ArrayFormula { xf, .. }
            | CellData::DateTime { xf, .. }
            | CellData::Error { xf, .. }
            | CellData::EmbeddedImage { xf, .. } => *xf,
        }
    }

    /// Text used to estimate column widths.
    pub(crate) fn display_len(&self) -> usize {
        match self {
            CellData::String { raw, .. } | CellData::RichString { raw, .. } => {
                raw.lines().map(|l| l.chars().count()).max().unwrap_or(0)
            }
            CellData::Number { value, .. } => crate::utility::format_number(*value).len(),
            CellData::Boolean { value, .. } => {
                if *value {
                    4
                } else {
                    5
                }
            }
            CellData::Formula { result, .. } | CellData::ArrayFormula { result, .. } => match result
            {
                FormulaResult::Number(n) if *n != 0.0 => crate::utility::format_number(*n).len(),
                FormulaResult::String(s) => s.chars().count(),
                _ => 0,
            },
            CellData::DateTime { .. } => 10,
            CellData::Error { value, .. } => value.len(),
            CellData::Blank { .. } | CellData::EmbeddedImage { .. } => 0,
        }
    }
}

/// An inclusive, zero-based rectangle of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    pub first_row: u32,
    pub first_col: u16,
    pub last_row: u32,
    pub last_col: u16,
}

impl CellRange {
    /// Normalizes so first <= last in both directions.
    pub fn new(first_row: u32, first_col: u16, last_row: u32, last_col: u16) -> Self {
        Self {
            first_row: first_row.min(last_row),
            first_col: first_col.min(last_col),
            last_row: first_row.max(last_row),
            last_col: first_col.max(last_col),
        }
    }

    pub fn is_single_cell(&self) -> bool {
        self.first_row == self.last_row && self.first_col == self.last_col
    }

    pub fn overlaps(&self, other: &CellRange) -> bool {
        !(self.last_row < other.first_row
            || self.first_row > other.last_row
            || self.last_col < other.first_col
            || self.first_col > other.last_col)
    }

    pub fn contains(&self, row: u32, col: u16) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_col..=self.last_col).contains(&col)
    }

    pub fn to_a1(&self) -> String {
        range_ref(self.first_row, self.first_col, self.last_row, self.last_col)
    }

    pub fn to_a1_abs(&self) -> String {
        range_ref_abs(self.first_row, self.first_col, self.last_row, self.last_col)
    }

    pub fn row_count(&self) -> u32 {
        self.last_row - self.first_row + 1
    }

    pub fn col_count(&self) -> u16 {
        self.last_col - self.first_col + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formula_result_typing() {
        assert_eq!(FormulaResult::from_text("42"), FormulaResult::Number(42.0));
        assert_eq!(FormulaResult::from_text("TRUE"), FormulaResult::Boolean(true));
        assert_eq!(FormulaResult::from_text("#N/A"), FormulaResult::Error("#N/A".into()));
        assert_eq!(FormulaResult::from_text("abc"), FormulaResult::String("abc".into()));
    }

    #[test]
    fn test_range_normalizes_and_overlaps() {
        let a = CellRange::new(3, 2, 1, 0);
        assert_eq!((a.first_row, a.first_col, a.last_row, a.last_col), (1, 0, 3, 2));
        assert_eq!(a.to_a1(), "A2:C4");
        let b = CellRange::new(2, 1, 4, 3);
        assert!(a.overlaps(&b));
        let c = CellRange::new(5, 0, 7, 2);
        assert!(!a.overlaps(&c));
        assert!(CellRange::new(0, 0, 0, 0).is_single_cell());
    }
}
