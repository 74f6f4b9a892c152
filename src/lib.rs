//! oxlsx writes Excel 2007+ `.xlsx` workbooks.
//!
//! A [`Workbook`] owns its sheets. Cells, formats, tables, charts, pictures
//! and notes are added through [`Worksheet`]; whole Arrow record batches can
//! be written in one call with [`Worksheet::write_record_batch`]. Saving
//! assembles every package part and zips it with `mtzip`.
//!
//! ```no_run
//! use oxlsx::{Format, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let bold = Format::new().set_bold();
//! let sheet = workbook.add_worksheet();
//! sheet.write_with_format(0, 0, "Region", &bold)?;
//! sheet.write(1, 0, "North")?;
//! sheet.write(1, 1, 1250.5)?;
//! workbook.save("report.xlsx")?;
//! # Ok::<(), oxlsx::WriteError>(())
//! ```

mod autofilter;
pub mod chart;
mod chartsheet;
mod comment;
mod conditional_format;
mod data_validation;
mod docprops;
mod drawing;
mod error;
mod format;
pub mod formula;
mod image;
mod packager;
mod page_setup;
mod protection;
mod record_batch;
mod rich_value;
mod shape;
mod shared_strings;
mod sheet_xml;
mod sparkline;
mod styles;
mod table;
mod types;
pub mod utility;
pub mod validation;
mod workbook;
mod worksheet;
mod xml;

pub use autofilter::{FilterCondition, FilterCriteria};
pub use chart::{
    Chart, ChartAxis, ChartAxisCrossing, ChartAxisLabelPosition, ChartAxisTickType,
    ChartDataLabelPosition, ChartDataLabels, ChartDataTable, ChartEmptyCells, ChartErrorBars,
    ChartErrorBarsDirection, ChartErrorBarsType, ChartFont, ChartFormat, ChartGradientFill,
    ChartGradientFillType, ChartGradientStop, ChartKind, ChartLegend, ChartLegendPosition,
    ChartLine, ChartLineDashType, ChartMarker, ChartMarkerType, ChartPatternFill,
    ChartPatternFillType, ChartPoint, ChartRange, ChartSeries, ChartSolidFill, ChartTitle,
    ChartTrendline, ChartTrendlineType, ChartType, HasFormatting,
};
pub use chartsheet::Chartsheet;
pub use comment::Note;
pub use conditional_format::{
    ConditionalFormat, ConditionalFormatAverageRule, ConditionalFormatCellRule,
    ConditionalFormatTextRule, ConditionalFormatValue,
};
pub use data_validation::{
    DataValidation, DataValidationCriteria, DataValidationErrorStyle, DataValidationRule,
    IntoRuleValue,
};
pub use docprops::DocProperties;
pub use drawing::{ObjectMovement, ObjectPosition, SheetGeometry};
pub use error::{Result, WriteError};
pub use format::{
    Alignment, Border, BorderSide, Color, Fill, Font, Format, FormatAlign, FormatBorder,
    FormatDiagonalBorder, FormatPattern, FormatScript, FormatUnderline,
};
pub use image::{Image, ImageType};
pub use page_setup::{PageMargins, PageOrientation, PageSetup};
pub use protection::{legacy_password_hash, sha512_password_hash, ProtectionOptions};
pub use shape::{Shape, ShapeTextHorizontalAlignment, ShapeTextVerticalAlignment, ShapeType};
pub use sparkline::{Sparkline, SparklineAxisBound, SparklineColors, SparklineType};
pub use table::{Table, TableColumn, TableFunction, TableStyle};
pub use types::{CellData, CellRange, FormulaResult};
pub use workbook::Workbook;
pub use worksheet::{IntoCellValue, IntoExcelDateTime, SheetVisibility, Worksheet};
