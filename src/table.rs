//! Worksheet tables (`xl/tables/tableN.xml`): a named range with a header
//! row, optional totals row, autofilter buttons and a built-in style.

use crate::error::{Result, WriteError};
use crate::format::Format;
use crate::types::CellRange;
use crate::validation::validate_table_name;
use crate::xml::{XmlWriter, NS_SPREADSHEETML};

/// Aggregate shown in the totals row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableFunction {
    Average,
    Count,
    CountNumbers,
    Max,
    Min,
    StdDev,
    Sum,
    Var,
    /// Any formula, written as-is.
    Custom(String),
}

impl TableFunction {
    fn xml_name(&self) -> &'static str {
        match self {
            TableFunction::Average => "average",
            TableFunction::Count => "count",
            TableFunction::CountNumbers => "countNums",
            TableFunction::Max => "max",
            TableFunction::Min => "min",
            TableFunction::StdDev => "stdDev",
            TableFunction::Sum => "sum",
            TableFunction::Var => "var",
            TableFunction::Custom(_) => "custom",
        }
    }

    /// SUBTOTAL code that ignores hidden rows.
    fn subtotal_code(&self) -> Option<u16> {
        match self {
            TableFunction::Average => Some(101),
            TableFunction::CountNumbers => Some(102),
            TableFunction::Count => Some(103),
            TableFunction::Max => Some(104),
            TableFunction::Min => Some(105),
            TableFunction::StdDev => Some(107),
            TableFunction::Sum => Some(109),
            TableFunction::Var => Some(110),
            TableFunction::Custom(_) => None,
        }
    }
}

/// Built-in table styles. `Light(n)` is TableStyleLightN and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStyle {
    None,
    Light(u8),
    Medium(u8),
    Dark(u8),
}

impl Default for TableStyle {
    fn default() -> Self {
        TableStyle::Medium(9)
    }
}

impl TableStyle {
    fn name(&self) -> Option<String> {
        match self {
            TableStyle::None => None,
            TableStyle::Light(n) => Some(format!("TableStyleLight{}", n)),
            TableStyle::Medium(n) => Some(format!("TableStyleMedium{}", n)),
            TableStyle::Dark(n) => Some(format!("TableStyleDark{}", n)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableColumn {
    pub(crate) header: String,
    pub(crate) total_function: Option<TableFunction>,
    pub(crate) total_label: Option<String>,
    pub(crate) formula: Option<String>,
    pub(crate) header_format: Option<Format>,
}

impl TableColumn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_header(mut self, header: &str) -> Self {
        self.header = header.to_string();
        self
    }

    pub fn set_total_function(mut self, function: TableFunction) -> Self {
        self.total_function = Some(function);
        self
    }

    pub fn set_total_label(mut self, label: &str) -> Self {
        self.total_label = Some(label.to_string());
        self
    }

    /// Calculated column formula, usually with structured references
    /// such as `[@Price]*[@Qty]`.
    pub fn set_formula(mut self, formula: &str) -> Self {
        self.formula = Some(formula.trim_start_matches('=').to_string());
        self
    }

    pub fn set_header_format(mut self, format: Format) -> Self {
        self.header_format = Some(format);
        self
    }
}

/// Table options. Add it to a sheet with
/// [`Worksheet::add_table`](crate::Worksheet::add_table).
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub(crate) name: String,
    pub(crate) columns: Vec<TableColumn>,
    pub(crate) style: TableStyle,
    pub(crate) show_header_row: bool,
    pub(crate) show_totals_row: bool,
    pub(crate) show_first_column: bool,
    pub(crate) show_last_column: bool,
    pub(crate) show_banded_rows: bool,
    pub(crate) show_banded_columns: bool,
    pub(crate) show_autofilter: bool,
    pub(crate) range: CellRange,
    pub(crate) id: u32,
}

impl Default for Table {
    fn default() -> Self {
        Self {
            name: String::new(),
            columns: Vec::new(),
            style: TableStyle::default(),
            show_header_row: true,
            show_totals_row: false,
            show_first_column: false,
            show_last_column: false,
            show_banded_rows: true,
            show_banded_columns: false,
            show_autofilter: true,
            range: CellRange::new(0, 0, 0, 0),
            id: 0,
        }
    }
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_name(mut self, name: &str) -> Result<Self> {
        validate_table_name(name)?;
        self.name = name.to_string();
        Ok(self)
    }

    pub fn set_columns(mut self, columns: &[TableColumn]) -> Self {
        self.columns = columns.to_vec();
        self
    }

    pub fn set_style(mut self, style: TableStyle) -> Self {
        self.style = style;
        self
    }

    pub fn set_header_row(mut self, enable: bool) -> Self {
        self.show_header_row = enable;
        self
    }

    pub fn set_total_row(mut self, enable: bool) -> Self {
        self.show_totals_row = enable;
        self
    }

    pub fn set_first_column(mut self, enable: bool) -> Self {
        self.show_first_column = enable;
        self
    }

    pub fn set_last_column(mut self, enable: bool) -> Self {
        self.show_last_column = enable;
        self
    }

    pub fn set_banded_rows(mut self, enable: bool) -> Self {
        self.show_banded_rows = enable;
        self
    }

    pub fn set_banded_columns(mut self, enable: bool) -> Self {
        self.show_banded_columns = enable;
        self
    }

    pub fn set_autofilter(mut self, enable: bool) -> Self {
        self.show_autofilter = enable;
        self
    }

    /// Fix the table to `range`: pad or trim the column list, fill in
    /// default headers and reject duplicate header names.
    pub(crate) fn place(&mut self, range: CellRange) -> Result<()> {
        let min_rows = 1 + u32::from(self.show_header_row) + u32::from(self.show_totals_row);
        if range.row_count() < min_rows {
            return Err(WriteError::Table(format!(
                "range {} is too small for a header, totals row and one data row",
                range.to_a1()
            )));
        }

        let width = range.col_count() as usize;
        self.columns.resize_with(width, TableColumn::default);
        let mut seen = std::collections::HashSet::new();
        for (idx, column) in self.columns.iter_mut().enumerate() {
            if column.header.is_empty() {
                column.header = format!("Column{}", idx + 1);
            }
            if !seen.insert(column.header.to_lowercase()) {
                return Err(WriteError::Table(format!(
                    "duplicate column header '{}'",
                    column.header
                )));
            }
        }
        self.range = range;
        Ok(())
    }

    pub(crate) fn header_row(&self) -> Option<u32> {
        self.show_header_row.then_some(self.range.first_row)
    }

    pub(crate) fn totals_row(&self) -> Option<u32> {
        self.show_totals_row.then_some(self.range.last_row)
    }

    /// First and last data rows.
    pub(crate) fn data_rows(&self) -> (u32, u32) {
        let first = self.range.first_row + u32::from(self.show_header_row);
        let last = self.range.last_row - u32::from(self.show_totals_row);
        (first, last)
    }

    /// Formula written into the totals row cell of a column.
    pub(crate) fn total_formula(column: &TableColumn) -> Option<String> {
        let function = column.total_function.as_ref()?;
        match function {
            TableFunction::Custom(formula) => Some(formula.trim_start_matches('=').to_string()),
            f => f.subtotal_code().map(|code| {
                format!("SUBTOTAL({},[{}])", code, escape_structured_name(&column.header))
            }),
        }
    }

    pub(crate) fn display_name(&self) -> String {
        if self.name.is_empty() {
            format!("Table{}", self.id)
        } else {
            self.name.clone()
        }
    }

    pub(crate) fn to_xml(&self) -> Vec<u8> {
        let mut xml = XmlWriter::with_capacity(1024);
        let name = self.display_name();
        let id = self.id.to_string();
        let reference = self.range.to_a1();

        xml.declaration();
        let mut attrs: Vec<(&str, &str)> = vec![
            ("xmlns", NS_SPREADSHEETML),
            ("id", id.as_str()),
            ("name", name.as_str()),
            ("displayName", name.as_str()),
            ("ref", reference.as_str()),
        ];
        if !self.show_header_row {
            attrs.push(("headerRowCount", "0"));
        }
        if self.show_totals_row {
            attrs.push(("totalsRowCount", "1"));
        } else {
            attrs.push(("totalsRowShown", "0"));
        }
        xml.start_with("table", &attrs);

        if self.show_header_row && self.show_autofilter {
            let filter = CellRange::new(
                self.range.first_row,
                self.range.first_col,
                self.range.last_row - u32::from(self.show_totals_row),
                self.range.last_col,
            );
            xml.empty_with("autoFilter", &[("ref", &filter.to_a1())]);
        }

        let count = self.columns.len().to_string();
        xml.start_with("tableColumns", &[("count", &count)]);
        for (idx, column) in self.columns.iter().enumerate() {
            let col_id = (idx + 1).to_string();
            let mut attrs: Vec<(&str, &str)> = vec![("id", col_id.as_str()), ("name", column.header.as_str())];
            if self.show_totals_row {
                if let Some(label) = &column.total_label {
                    attrs.push(("totalsRowLabel", label.as_str()));
                } else if let Some(function) = &column.total_function {
                    attrs.push(("totalsRowFunction", function.xml_name()));
                }
            }
            let custom_total = match (&column.total_function, self.show_totals_row) {
                (Some(TableFunction::Custom(f)), true) if column.total_label.is_none() => Some(f),
                _ => None,
            };
            if column.formula.is_none() && custom_total.is_none() {
                xml.empty_with("tableColumn", &attrs);
                continue;
            }
            xml.start_with("tableColumn", &attrs);
            if let Some(formula) = &column.formula {
                xml.data("calculatedColumnFormula", formula);
            }
            if let Some(formula) = custom_total {
                xml.data("totalsRowFormula", formula.trim_start_matches('='));
            }
            xml.end("tableColumn");
        }
        xml.end("tableColumns");

        if let Some(style) = self.style.name() {
            let flag = |on: bool| if on { "1" } else { "0" };
            xml.empty_with(
                "tableStyleInfo",
                &[
                    ("name", &style),
                    ("showFirstColumn", flag(self.show_first_column)),
                    ("showLastColumn", flag(self.show_last_column)),
                    ("showRowStripes", flag(self.show_banded_rows)),
                    ("showColumnStripes", flag(self.show_banded_columns)),
                ],
            );
        }
        xml.end("table");
        xml.into_bytes()
    }
}

/// Structured reference names escape `[`, `]`, `#` and `'` with a quote.
fn escape_structured_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if matches!(c, '[' | ']' | '#' | '\'') {
            out.push('\'');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placed(table: Table, range: CellRange, id: u32) -> Table {
        let mut table = table;
        table.place(range).unwrap();
        table.id = id;
        table
    }

    #[test]
    fn test_default_table_xml() {
        let table = placed(Table::new(), CellRange::new(0, 0, 4, 2), 1);
        let xml = String::from_utf8(table.to_xml()).unwrap();
        assert!(xml.contains(
            "id=\"1\" name=\"Table1\" displayName=\"Table1\" ref=\"A1:C5\" totalsRowShown=\"0\">"
        ));
        assert!(xml.contains("<autoFilter ref=\"A1:C5\"/>"));
        assert!(xml.contains("<tableColumn id=\"3\" name=\"Column3\"/>"));
        assert!(xml.contains(
            "<tableStyleInfo name=\"TableStyleMedium9\" showFirstColumn=\"0\" showLastColumn=\"0\" \
showRowStripes=\"1\" showColumnStripes=\"0\"/>"
        ));
    }

    #[test]
    fn test_totals_row() {
        let columns = [
            TableColumn::new().set_header("Region").set_total_label("Total"),
            TableColumn::new().set_header("Sales").set_total_function(TableFunction::Sum),
        ];
        let table = placed(
            Table::new().set_columns(&columns).set_total_row(true),
            CellRange::new(2, 1, 6, 2),
            3,
        );
        assert_eq!(table.data_rows(), (3, 5));
        assert_eq!(table.totals_row(), Some(6));
        assert_eq!(
            Table::total_formula(&table.columns[1]).as_deref(),
            Some("SUBTOTAL(109,[Sales])")
        );
        let xml = String::from_utf8(table.to_xml()).unwrap();
        assert!(xml.contains("ref=\"B3:C7\" totalsRowCount=\"1\">"));
        assert!(xml.contains("<autoFilter ref=\"B3:C6\"/>"));
        assert!(xml.contains("name=\"Region\" totalsRowLabel=\"Total\"/>"));
        assert!(xml.contains("name=\"Sales\" totalsRowFunction=\"sum\"/>"));
    }

    #[test]
    fn test_calculated_column_and_no_header() {
        let columns = [
            TableColumn::new().set_header("Qty"),
            TableColumn::new().set_header("Total").set_formula("=[@Qty]*2"),
        ];
        let table = placed(
            Table::new().set_columns(&columns).set_header_row(false).set_style(TableStyle::None),
            CellRange::new(0, 0, 1, 1),
            2,
        );
        let xml = String::from_utf8(table.to_xml()).unwrap();
        assert!(xml.contains("headerRowCount=\"0\""));
        assert!(!xml.contains("autoFilter"));
        assert!(!xml.contains("tableStyleInfo"));
        assert!(xml.contains("<calculatedColumnFormula>[@Qty]*2</calculatedColumnFormula>"));
    }

    #[test]
    fn test_place_rejects_duplicates_and_tiny_ranges() {
        let columns = [
            TableColumn::new().set_header("A"),
            TableColumn::new().set_header("a"),
        ];
        let mut table = Table::new().set_columns(&columns);
        assert!(matches!(table.place(CellRange::new(0, 0, 3, 1)), Err(WriteError::Table(_))));

        let mut table = Table::new().set_total_row(true);
        assert!(table.place(CellRange::new(0, 0, 1, 0)).is_err());
    }

    #[test]
    fn test_structured_name_escaping() {
        let column = TableColumn::new()
            .set_header("Q#1 [est]")
            .set_total_function(TableFunction::Average);
        assert_eq!(
            Table::total_formula(&column).as_deref(),
            Some("SUBTOTAL(101,[Q'#1 '[est']])")
        );
    }
}
