//! Columnar ingestion: write an Arrow [`RecordBatch`] as a block of cells.
//!
//! Each column is dispatched once on its Arrow type and then walked row by
//! row. Values go through the same [`CellData`] storage as single-cell
//! writes, so shared strings, formats and dimensions stay consistent.

use arrow_array::{
    Array, BooleanArray, Date32Array, Date64Array, Float32Array, Float64Array, Int16Array,
    Int32Array, Int64Array, Int8Array, LargeStringArray, RecordBatch, StringArray,
    StringViewArray, TimestampMicrosecondArray, TimestampMillisecondArray,
    TimestampNanosecondArray, TimestampSecondArray, UInt16Array, UInt32Array, UInt64Array,
    UInt8Array,
};
use arrow_schema::{DataType, TimeUnit};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::{Result, WriteError};
use crate::format::Format;
use crate::types::CellData;
use crate::utility::{date_to_excel_serial, datetime_to_excel_serial};
use crate::validation::check_dimensions;
use crate::worksheet::Worksheet;

const DATE_FORMAT: &str = "yyyy-mm-dd";
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

fn downcast<T: 'static>(array: &dyn Array) -> Result<&T> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        WriteError::Parameter(format!("array does not match its data type {}", array.data_type()))
    })
}

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

fn timestamp(unit: &TimeUnit, value: i64) -> Option<NaiveDateTime> {
    let dt = match unit {
        TimeUnit::Second => DateTime::from_timestamp(value, 0),
        TimeUnit::Millisecond => DateTime::from_timestamp_millis(value),
        TimeUnit::Microsecond => DateTime::from_timestamp_micros(value),
        TimeUnit::Nanosecond => Some(DateTime::from_timestamp_nanos(value)),
    };
    dt.map(|d| d.naive_utc())
}

/// Column values reduced to what a cell can hold.
enum Column<'a> {
    Utf8(&'a StringArray),
    LargeUtf8(&'a LargeStringArray),
    Utf8View(&'a StringViewArray),
    Number(Box<dyn Fn(usize) -> f64 + 'a>),
    Boolean(&'a BooleanArray),
    /// Excel serial per row; `None` for values outside chrono's range.
    Serial(Box<dyn Fn(usize) -> Option<f64> + 'a>),
    Unsupported,
}

fn classify(array: &dyn Array) -> Result<Column<'_>> {
    macro_rules! number {
        ($t:ty) => {{
            let arr = downcast::<$t>(array)?;
            Column::Number(Box::new(move |i| arr.value(i) as f64))
        }};
    }

    Ok(match array.data_type() {
        DataType::Utf8 => Column::Utf8(downcast(array)?),
        DataType::LargeUtf8 => Column::LargeUtf8(downcast(array)?),
        DataType::Utf8View => Column::Utf8View(downcast(array)?),
        DataType::Int8 => number!(Int8Array),
        DataType::Int16 => number!(Int16Array),
        DataType::Int32 => number!(Int32Array),
        DataType::Int64 => number!(Int64Array),
        DataType::UInt8 => number!(UInt8Array),
        DataType::UInt16 => number!(UInt16Array),
        DataType::UInt32 => number!(UInt32Array),
        DataType::UInt64 => number!(UInt64Array),
        DataType::Float32 => number!(Float32Array),
        DataType::Float64 => number!(Float64Array),
        DataType::Boolean => Column::Boolean(downcast(array)?),
        DataType::Date32 => {
            let arr = downcast::<Date32Array>(array)?;
            Column::Serial(Box::new(move |i| {
                epoch()
                    .checked_add_signed(chrono::Duration::days(arr.value(i) as i64))
                    .map(|d| date_to_excel_serial(&d))
            }))
        }
        DataType::Date64 => {
            let arr = downcast::<Date64Array>(array)?;
            Column::Serial(Box::new(move |i| {
                DateTime::from_timestamp_millis(arr.value(i)).map(|d| datetime_to_excel_serial(&d.naive_utc()))
            }))
        }
        DataType::Timestamp(unit, _) => {
            let unit = unit.clone();
            let values: Box<dyn Fn(usize) -> i64 + '_> = match unit {
                TimeUnit::Second => {
                    let arr = downcast::<TimestampSecondArray>(array)?;
                    Box::new(move |i| arr.value(i))
                }
                TimeUnit::Millisecond => {
                    let arr = downcast::<TimestampMillisecondArray>(array)?;
                    Box::new(move |i| arr.value(i))
                }
                TimeUnit::Microsecond => {
                    let arr = downcast::<TimestampMicrosecondArray>(array)?;
                    Box::new(move |i| arr.value(i))
                }
                TimeUnit::Nanosecond => {
                    let arr = downcast::<TimestampNanosecondArray>(array)?;
                    Box::new(move |i| arr.value(i))
                }
            };
            Column::Serial(Box::new(move |i| {
                timestamp(&unit, values(i)).map(|dt| datetime_to_excel_serial(&dt))
            }))
        }
        _ => Column::Unsupported,
    })
}

impl Worksheet {
    /// Write `batch` with its top-left corner at (`row`, `col`): one header
    /// row of field names, then one row per record. Nulls leave the cell
    /// empty. Dates and timestamps get a date number format; columns of
    /// other Arrow types are skipped with a warning.
    pub fn write_record_batch(
        &mut self,
        row: u32,
        col: u16,
        batch: &RecordBatch,
        header_format: Option<&Format>,
    ) -> Result<&mut Worksheet> {
        let schema = batch.schema();
        let num_cols = schema.fields().len();
        if num_cols == 0 {
            return Ok(self);
        }
        let last_col = col as usize + num_cols - 1;
        let last_row = row as u64 + batch.num_rows() as u64;
        if last_col > u16::MAX as usize || last_row > u32::MAX as u64 {
            return Err(WriteError::Dimension {
                row: last_row.min(u32::MAX as u64) as u32,
                col: last_col.min(u32::MAX as usize) as u32,
            });
        }
        check_dimensions(last_row as u32, last_col as u16)?;

        for (offset, field) in schema.fields().iter().enumerate() {
            self.store_string(row, col + offset as u16, field.name(), header_format)?;
        }

        let date_xf = self.xf(Some(&Format::new().set_num_format(DATE_FORMAT)));
        let datetime_xf = self.xf(Some(&Format::new().set_num_format(DATETIME_FORMAT)));

        for (offset, array) in batch.columns().iter().enumerate() {
            let target_col = col + offset as u16;
            let array = array.as_ref();
            let column = classify(array)?;
            let serial_xf = match array.data_type() {
                DataType::Date32 => date_xf,
                _ => datetime_xf,
            };
            if matches!(column, Column::Unsupported) {
                log::warn!(
                    "skipping column '{}': arrow type {} has no cell representation",
                    schema.field(offset).name(),
                    array.data_type()
                );
                continue;
            }

            for idx in 0..array.len() {
                if array.is_null(idx) {
                    continue;
                }
                let target_row = row + 1 + idx as u32;
                match &column {
                    Column::Utf8(arr) => self.store_string(target_row, target_col, arr.value(idx), None)?,
                    Column::LargeUtf8(arr) => self.store_string(target_row, target_col, arr.value(idx), None)?,
                    Column::Utf8View(arr) => self.store_string(target_row, target_col, arr.value(idx), None)?,
                    Column::Number(value) => self.store(
                        target_row,
                        target_col,
                        CellData::Number {
                            value: value(idx),
                            xf: None,
                        },
                    )?,
                    Column::Boolean(arr) => self.store(
                        target_row,
                        target_col,
                        CellData::Boolean {
                            value: arr.value(idx),
                            xf: None,
                        },
                    )?,
                    Column::Serial(serial) => match serial(idx) {
                        Some(serial) => self.store(target_row, target_col, CellData::DateTime { serial, xf: serial_xf })?,
                        None => log::warn!("date value at row {} is out of range; cell left empty", target_row),
                    },
                    Column::Unsupported => {}
                }
            }
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow_array::ArrayRef;
    use arrow_schema::{Field, Schema};

    use super::*;
    use crate::worksheet::tests::sheet;

    fn batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("name", DataType::Utf8, true),
            Field::new("qty", DataType::Int32, false),
            Field::new("ok", DataType::Boolean, false),
            Field::new("day", DataType::Date32, false),
            Field::new("at", DataType::Timestamp(TimeUnit::Millisecond, None), false),
        ]));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(vec![Some("apple"), None])),
            Arc::new(Int32Array::from(vec![3, -4])),
            Arc::new(BooleanArray::from(vec![true, false])),
            // 2024-01-01 is day 19723 after the epoch.
            Arc::new(Date32Array::from(vec![19723, 0])),
            Arc::new(TimestampMillisecondArray::from(vec![43_200_000, 0])),
        ];
        RecordBatch::try_new(schema, columns).unwrap()
    }

    #[test]
    fn test_record_batch_cells() {
        let mut ws = sheet();
        let bold = Format::new().set_bold();
        ws.write_record_batch(1, 1, &batch(), Some(&bold)).unwrap();

        assert!(matches!(ws.cell(1, 1), Some(CellData::String { raw, xf: Some(_), .. }) if &**raw == "name"));
        assert!(matches!(ws.cell(2, 1), Some(CellData::String { raw, .. }) if &**raw == "apple"));
        assert!(ws.cell(3, 1).is_none());
        assert_eq!(ws.cell(3, 2), Some(&CellData::Number { value: -4.0, xf: None }));
        assert_eq!(ws.cell(2, 3), Some(&CellData::Boolean { value: true, xf: None }));
        assert!(matches!(ws.cell(2, 4), Some(CellData::DateTime { serial, xf: Some(_) }) if *serial == 45292.0));
        assert!(matches!(ws.cell(3, 4), Some(CellData::DateTime { serial, .. }) if *serial == 25569.0));
        assert!(matches!(ws.cell(2, 5), Some(CellData::DateTime { serial, .. }) if *serial == 25569.5));
        assert_eq!(ws.dimensions, Some(crate::types::CellRange::new(1, 1, 3, 5)));
    }

    #[test]
    fn test_record_batch_bounds() {
        let mut ws = sheet();
        let err = ws.write_record_batch(1_048_575, 0, &batch(), None);
        assert!(matches!(err, Err(WriteError::Dimension { .. })));
        assert!(ws.cells.is_empty());
    }

    #[test]
    fn test_unsupported_column_skipped() {
        let schema = Arc::new(Schema::new(vec![Field::new(
            "raw",
            DataType::Binary,
            false,
        )]));
        let columns: Vec<ArrayRef> = vec![Arc::new(arrow_array::BinaryArray::from(vec![b"x".as_ref()]))];
        let batch = RecordBatch::try_new(schema, columns).unwrap();
        let mut ws = sheet();
        ws.write_record_batch(0, 0, &batch, None).unwrap();
        assert!(ws.cell(0, 0).is_some());
        assert!(ws.cell(1, 0).is_none());
    }
}
