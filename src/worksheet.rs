//! The worksheet: a sparse grid of [`CellData`] plus everything Excel
//! hangs off a sheet (row/column metadata, merges, links, notes, floating
//! objects, rules and print settings).
//!
//! Writes validate bounds, intern strings and formats into the workbook's
//! shared tables, and track the used range. Serialization lives in
//! `sheet_xml.rs`.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::autofilter::FilterCondition;
use crate::chart::Chart;
use crate::comment::Note;
use crate::conditional_format::ConditionalFormat;
use crate::data_validation::DataValidation;
use crate::drawing::{ObjectMovement, SheetGeometry};
use crate::error::{Result, WriteError};
use crate::format::{Color, Format, FormatUnderline};
use crate::formula::{has_dynamic_function, prepare_formula};
use crate::image::Image;
use crate::page_setup::PageSetup;
use crate::protection::{PasswordHash, ProtectionOptions};
use crate::shape::Shape;
use crate::sparkline::Sparkline;
use crate::table::Table;
use crate::types::{CellData, CellRange, FormulaResult};
use crate::utility::{
    col_width_to_pixels, date_to_excel_serial, datetime_to_excel_serial, parse_date_string,
    pixels_to_col_width, pixels_to_row_height, row_height_to_pixels, time_to_excel_fraction,
    DEFAULT_COL_PIXELS, DEFAULT_ROW_HEIGHT, DEFAULT_ROW_PIXELS,
};
use crate::validation::{
    check_dimensions, check_range, validate_column_width, validate_row_height,
    validate_sheet_name, validate_string_length, MAX_HYPERLINKS, MAX_URL_LEN,
};
use crate::workbook::SharedTables;
use crate::xml::XmlWriter;

const MAX_OUTLINE_LEVEL: u8 = 7;
const MAX_COLUMN_WIDTH: f64 = 255.0;

const ERROR_VALUES: &[&str] = &[
    "#DIV/0!",
    "#N/A",
    "#NAME?",
    "#NULL!",
    "#NUM!",
    "#REF!",
    "#VALUE!",
    "#GETTING_DATA",
    "#SPILL!",
    "#CALC!",
];

/// Sheet tab visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetVisibility {
    #[default]
    Visible,
    Hidden,
    /// Only unhideable through VBA.
    VeryHidden,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct RowOptions {
    pub height: Option<f64>,
    pub xf: Option<u32>,
    pub hidden: bool,
    pub level: u8,
    pub collapsed: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct ColumnOptions {
    pub width: Option<f64>,
    pub xf: Option<u32>,
    pub hidden: bool,
    pub level: u8,
    pub collapsed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum HyperlinkTarget {
    /// Web, mail or file link stored as an external relationship, with an
    /// optional location inside the target document.
    External { url: String, location: Option<String> },
    /// Cell or name in this workbook, e.g. `Sheet2!A1`.
    Internal(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Hyperlink {
    pub target: HyperlinkTarget,
    pub display: String,
    pub tooltip: Option<String>,
}

impl Hyperlink {
    fn parse(url: &str) -> Result<Self> {
        if url.chars().count() > MAX_URL_LEN {
            return Err(WriteError::UrlTooLong(url.to_string()));
        }
        let target = if let Some(location) = url.strip_prefix("internal:").or_else(|| url.strip_prefix('#')) {
            HyperlinkTarget::Internal(location.to_string())
        } else if let Some(path) = url.strip_prefix("external:") {
            let (path, location) = match path.split_once('#') {
                Some((p, l)) => (p, Some(l.to_string())),
                None => (path, None),
            };
            let is_absolute = path.contains(':') || path.starts_with('\\') || path.starts_with('/');
            let url = if is_absolute && !path.starts_with("file:") {
                format!("file:///{}", path)
            } else {
                path.to_string()
            };
            HyperlinkTarget::External { url: url.replace(' ', "%20"), location }
        } else if ["http://", "https://", "ftp://", "ftps://", "mailto:", "file://"]
            .iter()
            .any(|scheme| url.starts_with(scheme))
        {
            HyperlinkTarget::External {
                url: url.replace(' ', "%20"),
                location: None,
            }
        } else {
            return Err(WriteError::Parameter(format!("unrecognized url scheme in '{}'", url)));
        };

        let display = url
            .strip_prefix("internal:")
            .or_else(|| url.strip_prefix("external:"))
            .or_else(|| url.strip_prefix("mailto:"))
            .unwrap_or(url)
            .to_string();
        Ok(Self {
            target,
            display,
            tooltip: None,
        })
    }
}

/// Image, chart or shape floating over the grid, anchored to a cell.
#[derive(Debug, Clone)]
pub(crate) enum FloatingObject {
    Image(Image),
    Chart(Box<Chart>),
    Shape(Box<Shape>),
}

#[derive(Debug, Clone)]
pub(crate) struct PlacedObject {
    pub row: u32,
    pub col: u16,
    pub x_offset: f64,
    pub y_offset: f64,
    pub object: FloatingObject,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SheetProtection {
    pub options: ProtectionOptions,
    pub password: Option<PasswordHash>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Panes {
    pub freeze_row: u32,
    pub freeze_col: u16,
    pub top_row: u32,
    pub left_col: u16,
}

/// Date and time types accepted by [`Worksheet::write_datetime`].
pub trait IntoExcelDateTime {
    fn to_excel_serial(&self) -> f64;

    /// Number format applied when the caller supplies none.
    fn default_num_format(&self) -> &'static str;
}

impl IntoExcelDateTime for NaiveDateTime {
    fn to_excel_serial(&self) -> f64 {
        datetime_to_excel_serial(self)
    }

    fn default_num_format(&self) -> &'static str {
        "yyyy-mm-dd hh:mm:ss"
    }
}

impl IntoExcelDateTime for NaiveDate {
    fn to_excel_serial(&self) -> f64 {
        date_to_excel_serial(self)
    }

    fn default_num_format(&self) -> &'static str {
        "yyyy-mm-dd"
    }
}

impl IntoExcelDateTime for NaiveTime {
    fn to_excel_serial(&self) -> f64 {
        time_to_excel_fraction(self)
    }

    fn default_num_format(&self) -> &'static str {
        "hh:mm:ss"
    }
}

/// Values accepted by the generic [`Worksheet::write`].
pub trait IntoCellValue {
    fn write_cell(self, worksheet: &mut Worksheet, row: u32, col: u16, format: Option<&Format>) -> Result<()>;
}

macro_rules! number_cell_value {
    ($($t:ty),*) => {
        $(
            impl IntoCellValue for $t {
                fn write_cell(self, worksheet: &mut Worksheet, row: u32, col: u16, format: Option<&Format>) -> Result<()> {
                    worksheet.store_number(row, col, self as f64, format)
                }
            }
        )*
    };
}

number_cell_value!(f64, f32, i8, i16, i32, i64, u8, u16, u32, u64);

impl IntoCellValue for bool {
    fn write_cell(self, worksheet: &mut Worksheet, row: u32, col: u16, format: Option<&Format>) -> Result<()> {
        let xf = worksheet.xf(format);
        worksheet.store(row, col, CellData::Boolean { value: self, xf })
    }
}

impl IntoCellValue for &str {
    fn write_cell(self, worksheet: &mut Worksheet, row: u32, col: u16, format: Option<&Format>) -> Result<()> {
        worksheet.store_string(row, col, self, format)
    }
}

impl IntoCellValue for &String {
    fn write_cell(self, worksheet: &mut Worksheet, row: u32, col: u16, format: Option<&Format>) -> Result<()> {
        worksheet.store_string(row, col, self, format)
    }
}

impl IntoCellValue for String {
    fn write_cell(self, worksheet: &mut Worksheet, row: u32, col: u16, format: Option<&Format>) -> Result<()> {
        worksheet.store_string(row, col, &self, format)
    }
}

impl IntoCellValue for &NaiveDateTime {
    fn write_cell(self, worksheet: &mut Worksheet, row: u32, col: u16, format: Option<&Format>) -> Result<()> {
        worksheet.store_datetime(row, col, self, format)
    }
}

impl IntoCellValue for &NaiveDate {
    fn write_cell(self, worksheet: &mut Worksheet, row: u32, col: u16, format: Option<&Format>) -> Result<()> {
        worksheet.store_datetime(row, col, self, format)
    }
}

impl IntoCellValue for &NaiveTime {
    fn write_cell(self, worksheet: &mut Worksheet, row: u32, col: u16, format: Option<&Format>) -> Result<()> {
        worksheet.store_datetime(row, col, self, format)
    }
}

/// `None` writes nothing unless a format is given, then a formatted blank.
impl<T: IntoCellValue> IntoCellValue for Option<T> {
    fn write_cell(self, worksheet: &mut Worksheet, row: u32, col: u16, format: Option<&Format>) -> Result<()> {
        match self {
            Some(value) => value.write_cell(worksheet, row, col, format),
            None => match format {
                Some(format) => {
                    let xf = worksheet.xf(Some(format));
                    worksheet.store(row, col, CellData::Blank { xf })
                }
                None => check_dimensions(row, col),
            },
        }
    }
}

/// One sheet of a workbook. Created through
/// [`Workbook::add_worksheet`](crate::Workbook::add_worksheet).
#[derive(Debug)]
pub struct Worksheet {
    pub(crate) name: String,
    shared: Rc<RefCell<SharedTables>>,
    pub(crate) cells: BTreeMap<u32, BTreeMap<u16, CellData>>,
    pub(crate) dimensions: Option<CellRange>,
    pub(crate) rows: BTreeMap<u32, RowOptions>,
    pub(crate) cols: BTreeMap<u16, ColumnOptions>,
    pub(crate) default_row_height: Option<f64>,
    pub(crate) merges: Vec<CellRange>,
    pub(crate) autofilter: Option<CellRange>,
    pub(crate) filter_columns: BTreeMap<u16, FilterCondition>,
    pub(crate) validations: Vec<(CellRange, DataValidation)>,
    pub(crate) conditional_formats: Vec<(CellRange, ConditionalFormat)>,
    pub(crate) hyperlinks: BTreeMap<(u32, u16), Hyperlink>,
    pub(crate) notes: BTreeMap<(u32, u16), Note>,
    pub(crate) default_note_author: String,
    pub(crate) objects: Vec<PlacedObject>,
    pub(crate) embedded_images: Vec<Image>,
    pub(crate) sparklines: Vec<(u32, u16, Sparkline)>,
    pub(crate) tables: Vec<Table>,
    pub(crate) page_setup: PageSetup,
    pub(crate) print_area: Option<CellRange>,
    pub(crate) repeat_rows: Option<(u32, u32)>,
    pub(crate) repeat_cols: Option<(u16, u16)>,
    pub(crate) protection: Option<SheetProtection>,
    pub(crate) panes: Option<Panes>,
    pub(crate) selection: Option<CellRange>,
    pub(crate) zoom: u16,
    pub(crate) show_gridlines: bool,
    pub(crate) right_to_left: bool,
    pub(crate) tab_color: Color,
    pub(crate) visibility: SheetVisibility,
    pub(crate) active: bool,
    pub(crate) selected: bool,
}

impl Worksheet {
    pub(crate) fn new(name: &str, shared: Rc<RefCell<SharedTables>>) -> Self {
        Self {
            name: name.to_string(),
            shared,
            cells: BTreeMap::new(),
            dimensions: None,
            rows: BTreeMap::new(),
            cols: BTreeMap::new(),
            default_row_height: None,
            merges: Vec::new(),
            autofilter: None,
            filter_columns: BTreeMap::new(),
            validations: Vec::new(),
            conditional_formats: Vec::new(),
            hyperlinks: BTreeMap::new(),
            notes: BTreeMap::new(),
            default_note_author: "Author".to_string(),
            objects: Vec::new(),
            embedded_images: Vec::new(),
            sparklines: Vec::new(),
            tables: Vec::new(),
            page_setup: PageSetup::new(),
            print_area: None,
            repeat_rows: None,
            repeat_cols: None,
            protection: None,
            panes: None,
            selection: None,
            zoom: 100,
            show_gridlines: true,
            right_to_left: false,
            tab_color: Color::Default,
            visibility: SheetVisibility::Visible,
            active: false,
            selected: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the sheet. Uniqueness is checked again when the workbook is
    /// saved.
    pub fn set_name(&mut self, name: &str) -> Result<&mut Worksheet> {
        validate_sheet_name(name)?;
        self.name = name.to_string();
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Storage
    // ------------------------------------------------------------------

    pub(crate) fn xf(&self, format: Option<&Format>) -> Option<u32> {
        format.map(|f| self.shared.borrow_mut().formats.resolve(f))
    }

    /// Insert or replace one cell and grow the used range.
    pub(crate) fn store(&mut self, row: u32, col: u16, data: CellData) -> Result<()> {
        check_dimensions(row, col)?;
        self.touch(row, col);
        self.cells.entry(row).or_default().insert(col, data);
        Ok(())
    }

    fn touch(&mut self, row: u32, col: u16) {
        self.dimensions = Some(match self.dimensions {
            None => CellRange::new(row, col, row, col),
            Some(d) => CellRange {
                first_row: d.first_row.min(row),
                first_col: d.first_col.min(col),
                last_row: d.last_row.max(row),
                last_col: d.last_col.max(col),
            },
        });
    }

    pub(crate) fn cell(&self, row: u32, col: u16) -> Option<&CellData> {
        self.cells.get(&row).and_then(|r| r.get(&col))
    }

    pub(crate) fn store_number(&mut self, row: u32, col: u16, value: f64, format: Option<&Format>) -> Result<()> {
        let xf = self.xf(format);
        self.store(row, col, CellData::Number { value, xf })
    }

    pub(crate) fn store_string(&mut self, row: u32, col: u16, text: &str, format: Option<&Format>) -> Result<()> {
        check_dimensions(row, col)?;
        validate_string_length(text)?;
        let index = self.shared.borrow_mut().strings.intern(text);
        let xf = self.xf(format);
        self.store(
            row,
            col,
            CellData::String {
                index,
                raw: text.into(),
                xf,
            },
        )
    }

    pub(crate) fn store_datetime<T: IntoExcelDateTime + ?Sized>(
        &mut self,
        row: u32,
        col: u16,
        value: &T,
        format: Option<&Format>,
    ) -> Result<()> {
        let xf = match format {
            Some(f) => self.xf(Some(f)),
            None => self.xf(Some(&Format::new().set_num_format(value.default_num_format()))),
        };
        self.store(
            row,
            col,
            CellData::DateTime {
                serial: value.to_excel_serial(),
                xf,
            },
        )
    }

    fn store_formula(
        &mut self,
        row: u32,
        col: u16,
        formula: &str,
        result: FormulaResult,
        format: Option<&Format>,
    ) -> Result<()> {
        let formula = prepare_formula(formula);
        let xf = self.xf(format);
        let data = if has_dynamic_function(&formula) {
            CellData::ArrayFormula {
                formula,
                range: CellRange::new(row, col, row, col),
                dynamic: true,
                result,
                xf,
            }
        } else {
            CellData::Formula { formula, result, xf }
        };
        self.store(row, col, data)
    }

    fn store_array_formula(
        &mut self,
        range: CellRange,
        formula: &str,
        dynamic: bool,
        format: Option<&Format>,
    ) -> Result<()> {
        check_range(range.first_row, range.first_col, range.last_row, range.last_col)?;
        let xf = self.xf(format);
        for row in range.first_row..=range.last_row {
            for col in range.first_col..=range.last_col {
                if (row, col) != (range.first_row, range.first_col) {
                    self.store(row, col, CellData::Number { value: 0.0, xf })?;
                }
            }
        }
        self.store(
            range.first_row,
            range.first_col,
            CellData::ArrayFormula {
                formula: prepare_formula(formula),
                range,
                dynamic,
                result: FormulaResult::default(),
                xf,
            },
        )
    }

    // ------------------------------------------------------------------
    // Cell writes
    // ------------------------------------------------------------------

    /// Write any supported value, dispatching on its type.
    pub fn write<T: IntoCellValue>(&mut self, row: u32, col: u16, value: T) -> Result<&mut Worksheet> {
        value.write_cell(self, row, col, None)?;
        Ok(self)
    }

    pub fn write_with_format<T: IntoCellValue>(
        &mut self,
        row: u32,
        col: u16,
        value: T,
        format: &Format,
    ) -> Result<&mut Worksheet> {
        value.write_cell(self, row, col, Some(format))?;
        Ok(self)
    }

    pub fn write_number(&mut self, row: u32, col: u16, number: impl Into<f64>) -> Result<&mut Worksheet> {
        self.store_number(row, col, number.into(), None)?;
        Ok(self)
    }

    pub fn write_number_with_format(
        &mut self,
        row: u32,
        col: u16,
        number: impl Into<f64>,
        format: &Format,
    ) -> Result<&mut Worksheet> {
        self.store_number(row, col, number.into(), Some(format))?;
        Ok(self)
    }

    /// Write text through the shared string table. Longer than 32,767
    /// characters is an error.
    pub fn write_string(&mut self, row: u32, col: u16, text: &str) -> Result<&mut Worksheet> {
        self.store_string(row, col, text, None)?;
        Ok(self)
    }

    pub fn write_string_with_format(
        &mut self,
        row: u32,
        col: u16,
        text: &str,
        format: &Format,
    ) -> Result<&mut Worksheet> {
        self.store_string(row, col, text, Some(format))?;
        Ok(self)
    }

    /// Write text made of differently formatted fragments.
    pub fn write_rich_string(&mut self, row: u32, col: u16, fragments: &[(&Format, &str)]) -> Result<&mut Worksheet> {
        self.store_rich_string(row, col, fragments, None)?;
        Ok(self)
    }

    pub fn write_rich_string_with_format(
        &mut self,
        row: u32,
        col: u16,
        fragments: &[(&Format, &str)],
        format: &Format,
    ) -> Result<&mut Worksheet> {
        self.store_rich_string(row, col, fragments, Some(format))?;
        Ok(self)
    }

    fn store_rich_string(
        &mut self,
        row: u32,
        col: u16,
        fragments: &[(&Format, &str)],
        format: Option<&Format>,
    ) -> Result<()> {
        check_dimensions(row, col)?;
        let fragments: Vec<&(&Format, &str)> = fragments.iter().filter(|(_, t)| !t.is_empty()).collect();
        if fragments.is_empty() {
            return Err(WriteError::Parameter("rich string has no text".to_string()));
        }
        let raw: String = fragments.iter().map(|(_, text)| *text).collect();
        validate_string_length(&raw)?;

        let mut xml = XmlWriter::with_capacity(raw.len() + fragments.len() * 128);
        for (fragment_format, text) in &fragments {
            xml.start("r");
            if !fragment_format.font.is_default() {
                crate::styles::write_run_properties(&mut xml, &fragment_format.font);
            }
            crate::shared_strings::write_text_element(xml.buffer_mut(), text);
            xml.end("r");
        }
        let index = self.shared.borrow_mut().strings.intern_rich(&xml.into_string());
        let xf = self.xf(format);
        self.store(
            row,
            col,
            CellData::RichString {
                index,
                raw: raw.into(),
                xf,
            },
        )
    }

    /// Write a formula. A leading `=` is optional; newer functions get
    /// their `_xlfn.` prefix and dynamic-array functions are stored as
    /// single-cell dynamic arrays.
    pub fn write_formula(&mut self, row: u32, col: u16, formula: &str) -> Result<&mut Worksheet> {
        self.store_formula(row, col, formula, FormulaResult::default(), None)?;
        Ok(self)
    }

    pub fn write_formula_with_format(
        &mut self,
        row: u32,
        col: u16,
        formula: &str,
        format: &Format,
    ) -> Result<&mut Worksheet> {
        self.store_formula(row, col, formula, FormulaResult::default(), Some(format))?;
        Ok(self)
    }

    /// Formula with the value shown before Excel recalculates, e.g. for
    /// viewers that never calculate.
    pub fn write_formula_with_result(
        &mut self,
        row: u32,
        col: u16,
        formula: &str,
        result: &str,
    ) -> Result<&mut Worksheet> {
        self.store_formula(row, col, formula, FormulaResult::from_text(result), None)?;
        Ok(self)
    }

    /// Legacy CSE array formula over a range. Non-anchor cells hold zero.
    pub fn write_array_formula(
        &mut self,
        first_row: u32,
        first_col: u16,
        last_row: u32,
        last_col: u16,
        formula: &str,
    ) -> Result<&mut Worksheet> {
        let range = CellRange::new(first_row, first_col, last_row, last_col);
        self.store_array_formula(range, formula, false, None)?;
        Ok(self)
    }

    pub fn write_array_formula_with_format(
        &mut self,
        first_row: u32,
        first_col: u16,
        last_row: u32,
        last_col: u16,
        formula: &str,
        format: &Format,
    ) -> Result<&mut Worksheet> {
        let range = CellRange::new(first_row, first_col, last_row, last_col);
        self.store_array_formula(range, formula, false, Some(format))?;
        Ok(self)
    }

    /// Spilled dynamic array formula covering a range.
    pub fn write_dynamic_array_formula(
        &mut self,
        first_row: u32,
        first_col: u16,
        last_row: u32,
        last_col: u16,
        formula: &str,
    ) -> Result<&mut Worksheet> {
        let range = CellRange::new(first_row, first_col, last_row, last_col);
        self.store_array_formula(range, formula, true, None)?;
        Ok(self)
    }

    pub fn write_dynamic_array_formula_with_format(
        &mut self,
        first_row: u32,
        first_col: u16,
        last_row: u32,
        last_col: u16,
        formula: &str,
        format: &Format,
    ) -> Result<&mut Worksheet> {
        let range = CellRange::new(first_row, first_col, last_row, last_col);
        self.store_array_formula(range, formula, true, Some(format))?;
        Ok(self)
    }

    /// A formatted cell without a value.
    pub fn write_blank(&mut self, row: u32, col: u16, format: &Format) -> Result<&mut Worksheet> {
        let xf = self.xf(Some(format));
        self.store(row, col, CellData::Blank { xf })?;
        Ok(self)
    }

    pub fn write_boolean(&mut self, row: u32, col: u16, value: bool) -> Result<&mut Worksheet> {
        self.store(row, col, CellData::Boolean { value, xf: None })?;
        Ok(self)
    }

    pub fn write_boolean_with_format(
        &mut self,
        row: u32,
        col: u16,
        value: bool,
        format: &Format,
    ) -> Result<&mut Worksheet> {
        let xf = self.xf(Some(format));
        self.store(row, col, CellData::Boolean { value, xf })?;
        Ok(self)
    }

    /// Date, datetime or time as an Excel serial. Without a format the
    /// cell gets an ISO-style number format so it doesn't show as a number.
    pub fn write_datetime<T: IntoExcelDateTime>(&mut self, row: u32, col: u16, datetime: &T) -> Result<&mut Worksheet> {
        self.store_datetime(row, col, datetime, None)?;
        Ok(self)
    }

    pub fn write_datetime_with_format<T: IntoExcelDateTime>(
        &mut self,
        row: u32,
        col: u16,
        datetime: &T,
        format: &Format,
    ) -> Result<&mut Worksheet> {
        self.store_datetime(row, col, datetime, Some(format))?;
        Ok(self)
    }

    /// Parse an ISO 8601 date, datetime or time string. Text that doesn't
    /// parse is stored as a plain string.
    pub fn write_date_string(&mut self, row: u32, col: u16, text: &str, format: &Format) -> Result<&mut Worksheet> {
        match parse_date_string(text) {
            Some(serial) => {
                let xf = self.xf(Some(format));
                self.store(row, col, CellData::DateTime { serial, xf })?;
            }
            None => {
                log::warn!("'{}' is not a recognized date; writing it as text", text);
                self.store_string(row, col, text, Some(format))?;
            }
        }
        Ok(self)
    }

    /// An error literal such as `#N/A`.
    pub fn write_error(&mut self, row: u32, col: u16, error: &str) -> Result<&mut Worksheet> {
        if !ERROR_VALUES.contains(&error) {
            return Err(WriteError::Parameter(format!("'{}' is not an Excel error value", error)));
        }
        self.store(
            row,
            col,
            CellData::Error {
                value: error.to_string(),
                xf: None,
            },
        )?;
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Hyperlinks
    // ------------------------------------------------------------------

    /// Write a link showing the url itself. `internal:Sheet2!A1` and
    /// `#Sheet2!A1` jump inside the workbook, `external:` links files.
    pub fn write_url(&mut self, row: u32, col: u16, url: &str) -> Result<&mut Worksheet> {
        self.store_url(row, col, url, None, None, None)?;
        Ok(self)
    }

    pub fn write_url_with_text(&mut self, row: u32, col: u16, url: &str, text: &str) -> Result<&mut Worksheet> {
        self.store_url(row, col, url, Some(text), None, None)?;
        Ok(self)
    }

    pub fn write_url_with_options(
        &mut self,
        row: u32,
        col: u16,
        url: &str,
        text: &str,
        tooltip: &str,
        format: Option<&Format>,
    ) -> Result<&mut Worksheet> {
        let tooltip = (!tooltip.is_empty()).then_some(tooltip);
        let text = (!text.is_empty()).then_some(text);
        self.store_url(row, col, url, text, tooltip, format)?;
        Ok(self)
    }

    fn store_url(
        &mut self,
        row: u32,
        col: u16,
        url: &str,
        text: Option<&str>,
        tooltip: Option<&str>,
        format: Option<&Format>,
    ) -> Result<()> {
        check_dimensions(row, col)?;
        if self.hyperlinks.len() >= MAX_HYPERLINKS && !self.hyperlinks.contains_key(&(row, col)) {
            return Err(WriteError::TooManyHyperlinks);
        }
        let mut link = Hyperlink::parse(url)?;
        if let Some(text) = text {
            link.display = text.to_string();
        }
        if let Some(tooltip) = tooltip {
            if tooltip.chars().count() > 255 {
                return Err(WriteError::Parameter("hyperlink tooltip exceeds 255 characters".to_string()));
            }
            link.tooltip = Some(tooltip.to_string());
        }
        let default_format;
        let format = match format {
            Some(f) => f,
            None => {
                default_format = hyperlink_format();
                &default_format
            }
        };
        let display = link.display.clone();
        self.store_string(row, col, &display, Some(format))?;
        self.hyperlinks.insert((row, col), link);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Merges and filters
    // ------------------------------------------------------------------

    /// Merge a range, writing `text` to the top-left cell and formatted
    /// blanks elsewhere so borders cover the whole block.
    pub fn merge_range(
        &mut self,
        first_row: u32,
        first_col: u16,
        last_row: u32,
        last_col: u16,
        text: &str,
        format: &Format,
    ) -> Result<&mut Worksheet> {
        check_range(first_row, first_col, last_row, last_col)?;
        let range = CellRange::new(first_row, first_col, last_row, last_col);
        if range.is_single_cell() {
            return Err(WriteError::MergeSingleCell(range.to_a1()));
        }
        if let Some(existing) = self.merges.iter().find(|m| m.overlaps(&range)) {
            return Err(WriteError::MergeOverlap {
                new: range.to_a1(),
                existing: existing.to_a1(),
            });
        }
        if self.cell(range.first_row, range.first_col).is_some() {
            log::warn!("merge {} overwrites the value in its anchor cell", range.to_a1());
        }

        self.store_string(range.first_row, range.first_col, text, Some(format))?;
        let xf = self.xf(Some(format));
        for row in range.first_row..=range.last_row {
            for col in range.first_col..=range.last_col {
                if (row, col) != (range.first_row, range.first_col) {
                    self.store(row, col, CellData::Blank { xf })?;
                }
            }
        }
        self.merges.push(range);
        Ok(self)
    }

    /// Filter dropdowns over a range whose first row holds the headers.
    pub fn autofilter(&mut self, first_row: u32, first_col: u16, last_row: u32, last_col: u16) -> Result<&mut Worksheet> {
        check_range(first_row, first_col, last_row, last_col)?;
        self.autofilter = Some(CellRange::new(first_row, first_col, last_row, last_col));
        self.filter_columns.clear();
        Ok(self)
    }

    /// Criteria for one column of the autofilter. List filters also hide
    /// the rows they exclude.
    pub fn filter_column(&mut self, col: u16, condition: &FilterCondition) -> Result<&mut Worksheet> {
        let range = self
            .autofilter
            .ok_or_else(|| WriteError::Parameter("filter_column needs an autofilter range".to_string()))?;
        if col < range.first_col || col > range.last_col {
            return Err(WriteError::Parameter(format!(
                "column {} is outside the autofilter range {}",
                col,
                range.to_a1()
            )));
        }
        self.filter_columns.insert(col, condition.clone());
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Rows and columns
    // ------------------------------------------------------------------

    /// Width in character units of the default font.
    pub fn set_column_width(&mut self, col: u16, width: f64) -> Result<&mut Worksheet> {
        self.set_column_range_width(col, col, width)
    }

    pub fn set_column_range_width(&mut self, first_col: u16, last_col: u16, width: f64) -> Result<&mut Worksheet> {
        validate_column_width(width)?;
        check_dimensions(0, first_col.max(last_col))?;
        for col in first_col.min(last_col)..=first_col.max(last_col) {
            self.cols.entry(col).or_default().width = Some(width);
        }
        Ok(self)
    }

    pub fn set_column_width_pixels(&mut self, col: u16, pixels: u16) -> Result<&mut Worksheet> {
        self.set_column_width(col, pixels_to_col_width(pixels as f64))
    }

    pub fn set_column_format(&mut self, col: u16, format: &Format) -> Result<&mut Worksheet> {
        check_dimensions(0, col)?;
        let xf = self.xf(Some(format));
        self.cols.entry(col).or_default().xf = xf;
        Ok(self)
    }

    pub fn set_column_hidden(&mut self, col: u16) -> Result<&mut Worksheet> {
        check_dimensions(0, col)?;
        self.cols.entry(col).or_default().hidden = true;
        Ok(self)
    }

    /// Add one outline level to a run of columns.
    pub fn group_columns(&mut self, first_col: u16, last_col: u16) -> Result<&mut Worksheet> {
        check_dimensions(0, first_col.max(last_col))?;
        for col in first_col.min(last_col)..=first_col.max(last_col) {
            let opts = self.cols.entry(col).or_default();
            opts.level = (opts.level + 1).min(MAX_OUTLINE_LEVEL);
        }
        Ok(self)
    }

    /// Group columns and collapse the group: the columns are hidden and
    /// the column after them carries the collapsed marker.
    pub fn group_columns_collapsed(&mut self, first_col: u16, last_col: u16) -> Result<&mut Worksheet> {
        self.group_columns(first_col, last_col)?;
        let (first, last) = (first_col.min(last_col), first_col.max(last_col));
        for col in first..=last {
            self.cols.entry(col).or_default().hidden = true;
        }
        if let Some(next) = last.checked_add(1).filter(|c| check_dimensions(0, *c).is_ok()) {
            self.cols.entry(next).or_default().collapsed = true;
        }
        Ok(self)
    }

    /// Height in points.
    pub fn set_row_height(&mut self, row: u32, height: f64) -> Result<&mut Worksheet> {
        validate_row_height(height)?;
        check_dimensions(row, 0)?;
        self.rows.entry(row).or_default().height = Some(height);
        Ok(self)
    }

    pub fn set_row_height_pixels(&mut self, row: u32, pixels: u16) -> Result<&mut Worksheet> {
        self.set_row_height(row, pixels_to_row_height(pixels as f64))
    }

    pub fn set_row_format(&mut self, row: u32, format: &Format) -> Result<&mut Worksheet> {
        check_dimensions(row, 0)?;
        let xf = self.xf(Some(format));
        self.rows.entry(row).or_default().xf = xf;
        Ok(self)
    }

    pub fn set_row_hidden(&mut self, row: u32) -> Result<&mut Worksheet> {
        check_dimensions(row, 0)?;
        self.rows.entry(row).or_default().hidden = true;
        Ok(self)
    }

    pub fn group_rows(&mut self, first_row: u32, last_row: u32) -> Result<&mut Worksheet> {
        check_dimensions(first_row.max(last_row), 0)?;
        for row in first_row.min(last_row)..=first_row.max(last_row) {
            let opts = self.rows.entry(row).or_default();
            opts.level = (opts.level + 1).min(MAX_OUTLINE_LEVEL);
        }
        Ok(self)
    }

    pub fn group_rows_collapsed(&mut self, first_row: u32, last_row: u32) -> Result<&mut Worksheet> {
        self.group_rows(first_row, last_row)?;
        let (first, last) = (first_row.min(last_row), first_row.max(last_row));
        for row in first..=last {
            self.rows.entry(row).or_default().hidden = true;
        }
        if check_dimensions(last + 1, 0).is_ok() {
            self.rows.entry(last + 1).or_default().collapsed = true;
        }
        Ok(self)
    }

    /// Default height for rows without an explicit height, in points.
    pub fn set_default_row_height(&mut self, height: f64) -> Result<&mut Worksheet> {
        validate_row_height(height)?;
        self.default_row_height = (height != DEFAULT_ROW_HEIGHT).then_some(height);
        Ok(self)
    }

    /// Estimate column widths from the text of the cells written so far.
    /// Explicit widths are overwritten for columns that hold data.
    pub fn autofit(&mut self) -> &mut Worksheet {
        let mut longest: BTreeMap<u16, usize> = BTreeMap::new();
        for row in self.cells.values() {
            for (col, cell) in row {
                let len = cell.display_len();
                let entry = longest.entry(*col).or_insert(0);
                *entry = (*entry).max(len);
            }
        }
        for (col, len) in longest {
            if len == 0 {
                continue;
            }
            let width = ((len as f64 * 1.2) + 2.0).min(MAX_COLUMN_WIDTH);
            if width > crate::utility::DEFAULT_COL_WIDTH {
                self.cols.entry(col).or_default().width = Some(width);
            }
        }
        self
    }

    // ------------------------------------------------------------------
    // View
    // ------------------------------------------------------------------

    /// Freeze the rows above `row` and the columns left of `col`.
    pub fn set_freeze_panes(&mut self, row: u32, col: u16) -> Result<&mut Worksheet> {
        self.set_freeze_panes_top_cell(row, col, row, col)
    }

    /// Freeze panes with the scrollable area scrolled to (`top_row`,
    /// `left_col`).
    pub fn set_freeze_panes_top_cell(
        &mut self,
        row: u32,
        col: u16,
        top_row: u32,
        left_col: u16,
    ) -> Result<&mut Worksheet> {
        check_dimensions(row, col)?;
        check_dimensions(top_row, left_col)?;
        self.panes = if row == 0 && col == 0 {
            None
        } else {
            Some(Panes {
                freeze_row: row,
                freeze_col: col,
                top_row,
                left_col,
            })
        };
        Ok(self)
    }

    /// Zoom in percent, 10 to 400.
    pub fn set_zoom(&mut self, zoom: u16) -> &mut Worksheet {
        if (10..=400).contains(&zoom) {
            self.zoom = zoom;
        } else {
            log::warn!("zoom {} is outside 10..=400 and was ignored", zoom);
        }
        self
    }

    pub fn set_selection(
        &mut self,
        first_row: u32,
        first_col: u16,
        last_row: u32,
        last_col: u16,
    ) -> Result<&mut Worksheet> {
        check_range(first_row, first_col, last_row, last_col)?;
        self.selection = Some(CellRange::new(first_row, first_col, last_row, last_col));
        Ok(self)
    }

    pub fn set_tab_color(&mut self, color: Color) -> &mut Worksheet {
        self.tab_color = color;
        self
    }

    pub fn set_hidden(&mut self, hidden: bool) -> &mut Worksheet {
        self.visibility = if hidden {
            SheetVisibility::Hidden
        } else {
            SheetVisibility::Visible
        };
        self
    }

    pub fn set_very_hidden(&mut self, hidden: bool) -> &mut Worksheet {
        self.visibility = if hidden {
            SheetVisibility::VeryHidden
        } else {
            SheetVisibility::Visible
        };
        self
    }

    pub fn set_screen_gridlines(&mut self, enable: bool) -> &mut Worksheet {
        self.show_gridlines = enable;
        self
    }

    pub fn set_right_to_left(&mut self, enable: bool) -> &mut Worksheet {
        self.right_to_left = enable;
        self
    }

    /// Make this the sheet shown when the file opens.
    pub fn set_active(&mut self, enable: bool) -> &mut Worksheet {
        self.active = enable;
        self
    }

    /// Select the tab along with the active one.
    pub fn set_selected(&mut self, enable: bool) -> &mut Worksheet {
        self.selected = enable;
        self
    }

    // ------------------------------------------------------------------
    // Printing
    // ------------------------------------------------------------------

    pub fn page_setup(&mut self) -> &mut PageSetup {
        &mut self.page_setup
    }

    pub fn set_print_area(
        &mut self,
        first_row: u32,
        first_col: u16,
        last_row: u32,
        last_col: u16,
    ) -> Result<&mut Worksheet> {
        check_range(first_row, first_col, last_row, last_col)?;
        self.print_area = Some(CellRange::new(first_row, first_col, last_row, last_col));
        Ok(self)
    }

    /// Rows repeated at the top of every printed page.
    pub fn set_repeat_rows(&mut self, first_row: u32, last_row: u32) -> Result<&mut Worksheet> {
        check_dimensions(first_row.max(last_row), 0)?;
        self.repeat_rows = Some((first_row.min(last_row), first_row.max(last_row)));
        Ok(self)
    }

    pub fn set_repeat_columns(&mut self, first_col: u16, last_col: u16) -> Result<&mut Worksheet> {
        check_dimensions(0, first_col.max(last_col))?;
        self.repeat_cols = Some((first_col.min(last_col), first_col.max(last_col)));
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Protection
    // ------------------------------------------------------------------

    /// Protect the sheet with Excel's default permissions and no password.
    pub fn protect(&mut self) -> &mut Worksheet {
        self.protection = Some(SheetProtection {
            options: ProtectionOptions::default(),
            password: None,
        });
        self
    }

    pub fn protect_with_password(&mut self, password: &str) -> &mut Worksheet {
        self.protection = Some(SheetProtection {
            options: ProtectionOptions::default(),
            password: (!password.is_empty()).then(|| PasswordHash::legacy(password)),
        });
        self
    }

    pub fn protect_with_options(&mut self, options: &ProtectionOptions, password: Option<&str>) -> &mut Worksheet {
        self.protection = Some(SheetProtection {
            options: *options,
            password: password.filter(|p| !p.is_empty()).map(PasswordHash::legacy),
        });
        self
    }

    // ------------------------------------------------------------------
    // Floating objects
    // ------------------------------------------------------------------

    pub fn insert_image(&mut self, row: u32, col: u16, image: &Image) -> Result<&mut Worksheet> {
        self.insert_image_with_offset(row, col, image, 0, 0)
    }

    /// Pixel offsets may be negative or exceed the anchor cell.
    pub fn insert_image_with_offset(
        &mut self,
        row: u32,
        col: u16,
        image: &Image,
        x_offset: i32,
        y_offset: i32,
    ) -> Result<&mut Worksheet> {
        self.place(row, col, x_offset, y_offset, FloatingObject::Image(image.clone()))?;
        Ok(self)
    }

    /// Embed a chart. The chart is consumed: each chart lives in exactly
    /// one place.
    pub fn insert_chart(&mut self, row: u32, col: u16, chart: Chart) -> Result<&mut Worksheet> {
        self.insert_chart_with_offset(row, col, chart, 0, 0)
    }

    pub fn insert_chart_with_offset(
        &mut self,
        row: u32,
        col: u16,
        chart: Chart,
        x_offset: i32,
        y_offset: i32,
    ) -> Result<&mut Worksheet> {
        chart.validate()?;
        self.place(row, col, x_offset, y_offset, FloatingObject::Chart(Box::new(chart)))?;
        Ok(self)
    }

    pub fn insert_shape(&mut self, row: u32, col: u16, shape: Shape) -> Result<&mut Worksheet> {
        self.insert_shape_with_offset(row, col, shape, 0, 0)
    }

    pub fn insert_shape_with_offset(
        &mut self,
        row: u32,
        col: u16,
        shape: Shape,
        x_offset: i32,
        y_offset: i32,
    ) -> Result<&mut Worksheet> {
        self.place(row, col, x_offset, y_offset, FloatingObject::Shape(Box::new(shape)))?;
        Ok(self)
    }

    fn place(&mut self, row: u32, col: u16, x_offset: i32, y_offset: i32, object: FloatingObject) -> Result<()> {
        check_dimensions(row, col)?;
        self.objects.push(PlacedObject {
            row,
            col,
            x_offset: x_offset as f64,
            y_offset: y_offset as f64,
            object,
        });
        Ok(())
    }

    /// Put a picture inside a cell, scaled by Excel to the cell size.
    pub fn write_image_in_cell(&mut self, row: u32, col: u16, image: &Image) -> Result<&mut Worksheet> {
        check_dimensions(row, col)?;
        let index = self.embedded_images.len() as u32;
        self.embedded_images.push(image.clone());
        self.store(row, col, CellData::EmbeddedImage { index, xf: None })?;
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Rules, tables, sparklines, notes
    // ------------------------------------------------------------------

    pub fn add_data_validation(
        &mut self,
        first_row: u32,
        first_col: u16,
        last_row: u32,
        last_col: u16,
        validation: &DataValidation,
    ) -> Result<&mut Worksheet> {
        check_range(first_row, first_col, last_row, last_col)?;
        let range = CellRange::new(first_row, first_col, last_row, last_col);
        self.validations.push((range, validation.clone()));
        Ok(self)
    }

    /// Add a rule. Its highlight format is registered as a differential
    /// format here, so later edits to the caller's copy have no effect.
    pub fn add_conditional_format(
        &mut self,
        first_row: u32,
        first_col: u16,
        last_row: u32,
        last_col: u16,
        rule: &ConditionalFormat,
    ) -> Result<&mut Worksheet> {
        check_range(first_row, first_col, last_row, last_col)?;
        let range = CellRange::new(first_row, first_col, last_row, last_col);
        let mut rule = rule.clone();
        if rule.uses_format() {
            if let Some(format) = &rule.format {
                rule.dxf_index = Some(self.shared.borrow_mut().formats.resolve_dxf(format));
            }
        }
        self.conditional_formats.push((range, rule));
        Ok(self)
    }

    /// Turn a range into an Excel table. Header and totals cells are
    /// written from the table's column definitions.
    pub fn add_table(
        &mut self,
        first_row: u32,
        first_col: u16,
        last_row: u32,
        last_col: u16,
        table: &Table,
    ) -> Result<&mut Worksheet> {
        check_range(first_row, first_col, last_row, last_col)?;
        let range = CellRange::new(first_row, first_col, last_row, last_col);
        if let Some(other) = self.tables.iter().find(|t| t.range.overlaps(&range)) {
            return Err(WriteError::Table(format!(
                "range {} overlaps table {}",
                range.to_a1(),
                other.range.to_a1()
            )));
        }
        if let Some(merge) = self.merges.iter().find(|m| m.overlaps(&range)) {
            return Err(WriteError::Table(format!(
                "range {} overlaps merged range {}",
                range.to_a1(),
                merge.to_a1()
            )));
        }

        let mut table = table.clone();
        table.place(range)?;

        let columns = table.columns.clone();
        if let Some(header_row) = table.header_row() {
            for (offset, column) in columns.iter().enumerate() {
                let col = range.first_col + offset as u16;
                self.store_string(header_row, col, &column.header, column.header_format.as_ref())?;
            }
        }
        let (first_data, last_data) = table.data_rows();
        for (offset, column) in columns.iter().enumerate() {
            if let Some(formula) = &column.formula {
                let col = range.first_col + offset as u16;
                for row in first_data..=last_data {
                    self.store_formula(row, col, formula, FormulaResult::default(), None)?;
                }
            }
        }
        if let Some(totals_row) = table.totals_row() {
            for (offset, column) in columns.iter().enumerate() {
                let col = range.first_col + offset as u16;
                if let Some(label) = &column.total_label {
                    self.store_string(totals_row, col, label, None)?;
                } else if let Some(formula) = Table::total_formula(column) {
                    self.store_formula(totals_row, col, &formula, FormulaResult::default(), None)?;
                }
            }
        }

        self.tables.push(table);
        Ok(self)
    }

    pub fn add_sparkline(&mut self, row: u32, col: u16, sparkline: &Sparkline) -> Result<&mut Worksheet> {
        check_dimensions(row, col)?;
        if sparkline.range.is_empty() {
            return Err(WriteError::Parameter("sparkline needs a data range".to_string()));
        }
        self.sparklines.push((row, col, sparkline.clone()));
        Ok(self)
    }

    /// Attach a note to a cell, replacing any earlier note there.
    pub fn insert_note(&mut self, row: u32, col: u16, note: &Note) -> Result<&mut Worksheet> {
        check_dimensions(row, col)?;
        self.notes.insert((row, col), note.clone());
        Ok(self)
    }

    /// Author used for notes that don't name one.
    pub fn set_default_note_author(&mut self, author: &str) -> &mut Worksheet {
        self.default_note_author = author.to_string();
        self
    }

    // ------------------------------------------------------------------
    // Queries used while packaging
    // ------------------------------------------------------------------

    pub(crate) fn has_drawing(&self) -> bool {
        !self.objects.is_empty()
    }

    pub(crate) fn has_dynamic_arrays(&self) -> bool {
        self.cells
            .values()
            .flat_map(|row| row.values())
            .any(|cell| matches!(cell, CellData::ArrayFormula { dynamic: true, .. }))
    }

    pub(crate) fn is_hidden(&self) -> bool {
        self.visibility != SheetVisibility::Visible
    }
}

fn hyperlink_format() -> Format {
    Format::new()
        .set_font_color(Color::Rgb(0x0563C1))
        .set_underline(FormatUnderline::Single)
}

impl SheetGeometry for Worksheet {
    fn column_pixels(&self, col: u16, movement: ObjectMovement) -> f64 {
        match self.cols.get(&col) {
            Some(opts) if opts.hidden && movement != ObjectMovement::MoveAndSizeWithCellsAfter => 0.0,
            Some(opts) => opts.width.map(col_width_to_pixels).unwrap_or(DEFAULT_COL_PIXELS),
            None => DEFAULT_COL_PIXELS,
        }
    }

    fn row_pixels(&self, row: u32, movement: ObjectMovement) -> f64 {
        let default = self.default_row_height.map(row_height_to_pixels).unwrap_or(DEFAULT_ROW_PIXELS);
        match self.rows.get(&row) {
            Some(opts) if opts.hidden && movement != ObjectMovement::MoveAndSizeWithCellsAfter => 0.0,
            Some(opts) => opts.height.map(row_height_to_pixels).unwrap_or(default),
            None => default,
        }
    }

    fn columns_offset(&self, col: u16, movement: ObjectMovement) -> f64 {
        let adjust: f64 = self
            .cols
            .range(..col)
            .map(|(c, _)| self.column_pixels(*c, movement) - DEFAULT_COL_PIXELS)
            .sum();
        col as f64 * DEFAULT_COL_PIXELS + adjust
    }

    fn rows_offset(&self, row: u32, movement: ObjectMovement) -> f64 {
        let default = self.default_row_height.map(row_height_to_pixels).unwrap_or(DEFAULT_ROW_PIXELS);
        let adjust: f64 = self
            .rows
            .range(..row)
            .map(|(r, _)| self.row_pixels(*r, movement) - default)
            .sum();
        row as f64 * default + adjust
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::drawing::{position_object_pixels, DefaultGeometry};
    use crate::workbook::SharedTables;

    pub(crate) fn sheet() -> Worksheet {
        Worksheet::new("Sheet1", Rc::new(RefCell::new(SharedTables::new())))
    }

    #[test]
    fn test_write_tracks_dimensions() {
        let mut ws = sheet();
        assert!(ws.dimensions.is_none());
        ws.write_number(3, 2, 1.5).unwrap();
        ws.write_string(1, 5, "x").unwrap();
        ws.write_blank(7, 0, &Format::new().set_bold()).unwrap();
        assert_eq!(ws.dimensions, Some(CellRange::new(1, 0, 7, 5)));
    }

    #[test]
    fn test_bounds_are_enforced() {
        let mut ws = sheet();
        assert!(matches!(
            ws.write_number(1_048_576, 0, 1.0),
            Err(WriteError::Dimension { .. })
        ));
        assert!(matches!(ws.write_string(0, 16_384, "x"), Err(WriteError::Dimension { .. })));
        assert!(ws.write_number(1_048_575, 16_383, 1.0).is_ok());
    }

    #[test]
    fn test_rewrite_replaces_value() {
        let mut ws = sheet();
        ws.write_number(0, 0, 1.0).unwrap();
        ws.write_string(0, 0, "now text").unwrap();
        assert!(matches!(ws.cell(0, 0), Some(CellData::String { .. })));
        assert_eq!(ws.cells[&0].len(), 1);
    }

    #[test]
    fn test_strings_are_interned() {
        let mut ws = sheet();
        ws.write_string(0, 0, "same").unwrap();
        ws.write_string(1, 0, "same").unwrap();
        ws.write_string(2, 0, "other").unwrap();
        let shared = ws.shared.borrow();
        assert_eq!(shared.strings.unique_count(), 2);
        assert_eq!(shared.strings.count(), 3);
        assert!(matches!(ws.cell(1, 0), Some(CellData::String { index: 0, .. })));
    }

    #[test]
    fn test_long_string_rejected() {
        let mut ws = sheet();
        let long = "a".repeat(32_768);
        assert!(matches!(ws.write_string(0, 0, &long), Err(WriteError::StringTooLong)));
        assert!(ws.write_string(0, 0, &long[1..]).is_ok());
    }

    #[test]
    fn test_generic_write_dispatch() {
        let mut ws = sheet();
        ws.write(0, 0, 42).unwrap();
        ws.write(0, 1, "text").unwrap();
        ws.write(0, 2, true).unwrap();
        ws.write(0, 3, &NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()).unwrap();
        ws.write(0, 4, None::<f64>).unwrap();
        assert!(matches!(ws.cell(0, 0), Some(CellData::Number { value, .. }) if *value == 42.0));
        assert!(matches!(ws.cell(0, 1), Some(CellData::String { .. })));
        assert!(matches!(ws.cell(0, 2), Some(CellData::Boolean { value: true, .. })));
        assert!(matches!(ws.cell(0, 3), Some(CellData::DateTime { serial, xf: Some(_) }) if *serial == 45292.0));
        assert!(ws.cell(0, 4).is_none());
    }

    #[test]
    fn test_formula_rewriting_and_dynamic_detection() {
        let mut ws = sheet();
        ws.write_formula(0, 0, "=SUM(A2:A5)").unwrap();
        ws.write_formula(1, 0, "=UNIQUE(B1:B9)").unwrap();
        match ws.cell(0, 0) {
            Some(CellData::Formula { formula, .. }) => assert_eq!(formula, "SUM(A2:A5)"),
            other => panic!("unexpected {:?}", other),
        }
        match ws.cell(1, 0) {
            Some(CellData::ArrayFormula { formula, dynamic, .. }) => {
                assert_eq!(formula, "_xlfn.UNIQUE(B1:B9)");
                assert!(dynamic);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(ws.has_dynamic_arrays());
    }

    #[test]
    fn test_array_formula_fills_range_with_zero() {
        let mut ws = sheet();
        let bold = Format::new().set_bold();
        ws.write_array_formula_with_format(0, 0, 2, 0, "{=TREND(B1:B3)}", &bold).unwrap();
        let anchor_xf = match ws.cell(0, 0) {
            Some(CellData::ArrayFormula { formula, range, dynamic, xf, .. }) => {
                assert_eq!(formula, "TREND(B1:B3)");
                assert_eq!(range.to_a1(), "A1:A3");
                assert!(!dynamic);
                *xf
            }
            other => panic!("unexpected {:?}", other),
        };
        for row in 1..=2 {
            assert_eq!(
                ws.cell(row, 0),
                Some(&CellData::Number { value: 0.0, xf: anchor_xf })
            );
        }
    }

    #[test]
    fn test_merge_rules() {
        let mut ws = sheet();
        let fmt = Format::new().set_bold();
        ws.merge_range(0, 0, 1, 2, "Title", &fmt).unwrap();
        assert!(matches!(ws.cell(0, 0), Some(CellData::String { .. })));
        assert!(matches!(ws.cell(1, 2), Some(CellData::Blank { xf: Some(_) })));
        assert!(matches!(
            ws.merge_range(1, 1, 3, 3, "x", &fmt),
            Err(WriteError::MergeOverlap { .. })
        ));
        assert!(matches!(
            ws.merge_range(5, 5, 5, 5, "x", &fmt),
            Err(WriteError::MergeSingleCell(_))
        ));
        assert!(ws.merge_range(2, 0, 2, 1, "ok", &fmt).is_ok());
    }

    #[test]
    fn test_url_parsing() {
        let mut ws = sheet();
        ws.write_url(0, 0, "https://example.com/a b").unwrap();
        ws.write_url_with_text(1, 0, "internal:Sheet2!A1", "Go").unwrap();
        ws.write_url(2, 0, "mailto:me@example.com").unwrap();
        match &ws.hyperlinks[&(0, 0)].target {
            HyperlinkTarget::External { url, .. } => assert_eq!(url, "https://example.com/a%20b"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            ws.hyperlinks[&(1, 0)].target,
            HyperlinkTarget::Internal("Sheet2!A1".to_string())
        );
        assert_eq!(ws.hyperlinks[&(2, 0)].display, "me@example.com");
        assert!(matches!(ws.write_url(3, 0, "nonsense"), Err(WriteError::Parameter(_))));
        let long = format!("https://example.com/{}", "x".repeat(2100));
        assert!(matches!(ws.write_url(3, 0, &long), Err(WriteError::UrlTooLong(_))));
    }

    #[test]
    fn test_external_file_links() {
        let link = Hyperlink::parse("external:c:\\temp\\book.xlsx#Sheet1!A1").unwrap();
        assert_eq!(
            link.target,
            HyperlinkTarget::External {
                url: "file:///c:\\temp\\book.xlsx".to_string(),
                location: Some("Sheet1!A1".to_string()),
            }
        );
        let relative = Hyperlink::parse("external:other.xlsx").unwrap();
        assert_eq!(
            relative.target,
            HyperlinkTarget::External {
                url: "other.xlsx".to_string(),
                location: None
            }
        );
    }

    #[test]
    fn test_error_and_date_string() {
        let mut ws = sheet();
        ws.write_error(0, 0, "#N/A").unwrap();
        assert!(ws.write_error(0, 1, "#BOGUS").is_err());
        let fmt = Format::new().set_num_format("yyyy-mm-dd");
        ws.write_date_string(1, 0, "2024-01-01", &fmt).unwrap();
        ws.write_date_string(2, 0, "not a date", &fmt).unwrap();
        assert!(matches!(ws.cell(1, 0), Some(CellData::DateTime { serial, .. }) if *serial == 45292.0));
        assert!(matches!(ws.cell(2, 0), Some(CellData::String { .. })));
    }

    #[test]
    fn test_rich_string_runs() {
        let mut ws = sheet();
        let bold = Format::new().set_bold();
        let plain = Format::new();
        ws.write_rich_string(0, 0, &[(&plain, "This is "), (&bold, "bold")]).unwrap();
        match ws.cell(0, 0) {
            Some(CellData::RichString { raw, index, .. }) => {
                assert_eq!(&**raw, "This is bold");
                let shared = ws.shared.borrow();
                match shared.strings.get(*index) {
                    Some(crate::shared_strings::SharedString::Rich(runs)) => {
                        assert!(runs.starts_with("<r><t xml:space=\"preserve\">This is </t></r><r><rPr><b/>"));
                        assert!(runs.ends_with("<t>bold</t></r>"));
                    }
                    other => panic!("unexpected {:?}", other),
                }
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(ws.write_rich_string(1, 0, &[(&bold, "")]).is_err());
    }

    #[test]
    fn test_outline_grouping() {
        let mut ws = sheet();
        ws.group_rows(1, 3).unwrap();
        ws.group_rows_collapsed(2, 3).unwrap();
        assert_eq!(ws.rows[&1].level, 1);
        assert_eq!(ws.rows[&2].level, 2);
        assert!(ws.rows[&3].hidden);
        assert!(ws.rows[&4].collapsed);
        ws.group_columns(0, 1).unwrap();
        assert_eq!(ws.cols[&1].level, 1);
    }

    #[test]
    fn test_geometry_uses_row_and_column_sizes() {
        let mut ws = sheet();
        ws.set_column_width(1, 20.0).unwrap();
        ws.set_row_height(0, 30.0).unwrap();
        ws.set_column_hidden(2).unwrap();
        assert_eq!(ws.column_pixels(1, ObjectMovement::default()), 145.0);
        assert_eq!(ws.column_pixels(2, ObjectMovement::default()), 0.0);
        assert_eq!(ws.column_pixels(2, ObjectMovement::MoveAndSizeWithCellsAfter), 64.0);
        assert_eq!(ws.row_pixels(0, ObjectMovement::default()), 40.0);
        assert_eq!(ws.columns_offset(3, ObjectMovement::default()), 64.0 + 145.0);
        assert_eq!(ws.rows_offset(2, ObjectMovement::default()), 60.0);

        let plain = sheet();
        let a = position_object_pixels(&plain, 3, 2, 10.0, 5.0, 100.0, 50.0, ObjectMovement::default());
        let b = position_object_pixels(&DefaultGeometry, 3, 2, 10.0, 5.0, 100.0, 50.0, ObjectMovement::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_autofit_uses_longest_text() {
        let mut ws = sheet();
        ws.write_string(0, 0, "a fairly long header").unwrap();
        ws.write_string(1, 0, "short").unwrap();
        ws.write_number(0, 1, 1.0).unwrap();
        ws.autofit();
        assert_eq!(ws.cols[&0].width, Some(20.0 * 1.2 + 2.0));
        assert!(!ws.cols.contains_key(&1));
    }

    #[test]
    fn test_conditional_format_registers_dxf() {
        let mut ws = sheet();
        let rule = ConditionalFormat::cell(crate::conditional_format::ConditionalFormatCellRule::greater_than(5))
            .set_format(Format::new().set_bold());
        ws.add_conditional_format(0, 0, 9, 0, &rule).unwrap();
        ws.add_conditional_format(0, 1, 9, 1, &ConditionalFormat::data_bar()).unwrap();
        assert_eq!(ws.conditional_formats[0].1.dxf_index, Some(0));
        assert_eq!(ws.conditional_formats[1].1.dxf_index, None);
    }

    #[test]
    fn test_table_writes_headers_and_totals() {
        use crate::table::{TableColumn, TableFunction};
        let mut ws = sheet();
        let table = Table::new().set_total_row(true).set_columns(&[
            TableColumn::new().set_header("Item").set_total_label("Total"),
            TableColumn::new().set_header("Cost").set_total_function(TableFunction::Sum),
        ]);
        ws.add_table(0, 0, 3, 1, &table).unwrap();
        assert!(matches!(ws.cell(0, 1), Some(CellData::String { raw, .. }) if &**raw == "Cost"));
        match ws.cell(3, 1) {
            Some(CellData::Formula { formula, .. }) => assert_eq!(formula, "SUBTOTAL(109,[Cost])"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(ws.add_table(2, 1, 5, 2, &Table::new()), Err(WriteError::Table(_))));
    }

    #[test]
    fn test_filter_column_requires_range() {
        let mut ws = sheet();
        let cond = FilterCondition::new().add_list_filter("x");
        assert!(ws.filter_column(0, &cond).is_err());
        ws.autofilter(0, 0, 10, 3).unwrap();
        assert!(ws.filter_column(4, &cond).is_err());
        assert!(ws.filter_column(3, &cond).is_ok());
    }

    #[test]
    fn test_chart_insert_validates() {
        let mut ws = sheet();
        assert!(ws.insert_chart(0, 0, Chart::new_column()).is_err());
        let mut chart = Chart::new_column();
        chart.add_series().unwrap().set_values("Sheet1!$A$1:$A$3");
        ws.insert_chart(0, 0, chart).unwrap();
        assert!(ws.has_drawing());
    }
}
