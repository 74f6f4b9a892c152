//! The workbook: owns the sheets and the tables they share, resolves
//! everything that spans sheets (names, ids, chart data) and hands the
//! result to the packager.

use std::cell::RefCell;
use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;
use std::rc::Rc;

use crate::chart::{Chart, ChartCache, ChartCacheValue};
use crate::chartsheet::Chartsheet;
use crate::docprops::DocProperties;
use crate::error::{Result, WriteError};
use crate::packager::{assemble_parts, write_archive, write_file_atomic};
use crate::protection::{write_workbook_protection, PasswordHash};
use crate::shared_strings::SharedStrings;
use crate::styles::{FormatTable, Palette};
use crate::types::{CellData, FormulaResult};
use crate::utility::{col_to_name, quote_sheet_name, range_ref_abs};
use crate::validation::{validate_defined_name, validate_sheet_name};
use crate::worksheet::Worksheet;
use crate::xml::{XmlWriter, NS_RELATIONSHIPS, NS_SPREADSHEETML};

/// String and format tables every sheet of one workbook writes into.
#[derive(Debug, Default)]
pub(crate) struct SharedTables {
    pub strings: SharedStrings,
    pub formats: FormatTable,
}

impl SharedTables {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug)]
pub(crate) enum Sheet {
    Worksheet(Worksheet),
    Chartsheet(Chartsheet),
}

impl Sheet {
    pub fn name(&self) -> &str {
        match self {
            Sheet::Worksheet(ws) => &ws.name,
            Sheet::Chartsheet(cs) => &cs.name,
        }
    }

    fn is_hidden(&self) -> bool {
        match self {
            Sheet::Worksheet(ws) => ws.is_hidden(),
            Sheet::Chartsheet(cs) => cs.is_hidden(),
        }
    }

    fn is_active(&self) -> bool {
        match self {
            Sheet::Worksheet(ws) => ws.active,
            Sheet::Chartsheet(cs) => cs.active,
        }
    }

    fn is_selected(&self) -> bool {
        match self {
            Sheet::Worksheet(ws) => ws.selected,
            Sheet::Chartsheet(cs) => cs.selected,
        }
    }

    fn state(&self) -> Option<&'static str> {
        use crate::worksheet::SheetVisibility;
        let visibility = match self {
            Sheet::Worksheet(ws) => ws.visibility,
            Sheet::Chartsheet(cs) => cs.visibility,
        };
        match visibility {
            SheetVisibility::Visible => None,
            SheetVisibility::Hidden => Some("hidden"),
            SheetVisibility::VeryHidden => Some("veryHidden"),
        }
    }
}

/// A `<definedName>` entry.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DefinedName {
    pub name: String,
    /// Sheet the name is local to, by index into the workbook's sheets.
    pub scope: Option<usize>,
    pub formula: String,
    pub hidden: bool,
}

impl DefinedName {
    /// Excel orders names without their `_xlnm.` prefix, ignoring case.
    fn sort_key(&self) -> (String, usize) {
        let bare = self.name.strip_prefix("_xlnm.").unwrap_or(&self.name);
        (bare.to_lowercase(), self.scope.map_or(0, |s| s + 1))
    }

    /// Title listed under "Named Ranges" in `app.xml`, if any.
    fn app_title(&self, sheets: &[Sheet]) -> Option<String> {
        if self.hidden {
            return None;
        }
        let bare = self.name.strip_prefix("_xlnm.").unwrap_or(&self.name);
        match self.scope.and_then(|s| sheets.get(s)) {
            Some(sheet) => Some(format!("{}!{}", quote_sheet_name(sheet.name()), bare)),
            None => Some(bare.to_string()),
        }
    }
}

/// A user-defined name waiting for its scope to be resolved at save.
#[derive(Debug, Clone, PartialEq)]
struct UserName {
    sheet: Option<String>,
    name: String,
    formula: String,
}

/// Sheet cells a chart range may read. Rows beyond this are not cached.
const MAX_CACHE_POINTS: usize = 1_000_000;

/// An in-memory `.xlsx` document.
///
/// ```no_run
/// use oxlsx::{Format, Workbook};
///
/// let mut workbook = Workbook::new();
/// let bold = Format::new().set_bold();
/// let sheet = workbook.add_worksheet();
/// sheet.write_string_with_format(0, 0, "Total", &bold)?;
/// sheet.write_number(0, 1, 1234.5)?;
/// workbook.save("report.xlsx")?;
/// # Ok::<(), oxlsx::WriteError>(())
/// ```
#[derive(Debug)]
pub struct Workbook {
    pub(crate) sheets: Vec<Sheet>,
    pub(crate) shared: Rc<RefCell<SharedTables>>,
    pub(crate) palette: Palette,
    pub(crate) properties: DocProperties,
    pub(crate) protection: Option<(Option<PasswordHash>, bool)>,
    user_names: Vec<UserName>,
    worksheet_count: usize,
    chartsheet_count: usize,
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Workbook {
    pub fn new() -> Self {
        Self {
            sheets: Vec::new(),
            shared: Rc::new(RefCell::new(SharedTables::new())),
            palette: Palette::default(),
            properties: DocProperties::default(),
            protection: None,
            user_names: Vec::new(),
            worksheet_count: 0,
            chartsheet_count: 0,
        }
    }

    fn default_name(&self, prefix: &str, mut n: usize) -> String {
        loop {
            let name = format!("{}{}", prefix, n);
            if self.find_sheet(&name).is_none() {
                return name;
            }
            n += 1;
        }
    }

    fn find_sheet(&self, name: &str) -> Option<usize> {
        let lower = name.to_lowercase();
        self.sheets.iter().position(|s| s.name().to_lowercase() == lower)
    }

    fn check_new_name(&self, name: &str) -> Result<()> {
        validate_sheet_name(name)?;
        if self.find_sheet(name).is_some() {
            return Err(WriteError::DuplicateSheetName(name.to_string()));
        }
        Ok(())
    }

    /// Add a worksheet named `SheetN`.
    pub fn add_worksheet(&mut self) -> &mut Worksheet {
        let name = self.default_name("Sheet", self.worksheet_count + 1);
        self.push_worksheet(name)
    }

    pub fn add_worksheet_with_name(&mut self, name: &str) -> Result<&mut Worksheet> {
        self.check_new_name(name)?;
        Ok(self.push_worksheet(name.to_string()))
    }

    fn push_worksheet(&mut self, name: String) -> &mut Worksheet {
        self.worksheet_count += 1;
        let ws = Worksheet::new(&name, Rc::clone(&self.shared));
        self.sheets.push(Sheet::Worksheet(ws));
        match self.sheets.last_mut() {
            Some(Sheet::Worksheet(ws)) => ws,
            _ => unreachable!("a worksheet was just pushed"),
        }
    }

    /// Add a chartsheet named `ChartN`.
    pub fn add_chartsheet(&mut self) -> &mut Chartsheet {
        let name = self.default_name("Chart", self.chartsheet_count + 1);
        self.push_chartsheet(name)
    }

    pub fn add_chartsheet_with_name(&mut self, name: &str) -> Result<&mut Chartsheet> {
        self.check_new_name(name)?;
        Ok(self.push_chartsheet(name.to_string()))
    }

    fn push_chartsheet(&mut self, name: String) -> &mut Chartsheet {
        self.chartsheet_count += 1;
        self.sheets.push(Sheet::Chartsheet(Chartsheet::new(&name)));
        match self.sheets.last_mut() {
            Some(Sheet::Chartsheet(cs)) => cs,
            _ => unreachable!("a chartsheet was just pushed"),
        }
    }

    /// Worksheet by position among all sheets.
    pub fn worksheet_from_index(&mut self, index: usize) -> Result<&mut Worksheet> {
        match self.sheets.get_mut(index) {
            Some(Sheet::Worksheet(ws)) => Ok(ws),
            _ => Err(WriteError::Parameter(format!("no worksheet at index {}", index))),
        }
    }

    pub fn worksheet_from_name(&mut self, name: &str) -> Result<&mut Worksheet> {
        let index = self
            .find_sheet(name)
            .ok_or_else(|| WriteError::Parameter(format!("no worksheet named '{}'", name)))?;
        self.worksheet_from_index(index)
    }

    pub fn chartsheet_from_name(&mut self, name: &str) -> Result<&mut Chartsheet> {
        match self.find_sheet(name).and_then(|i| self.sheets.get_mut(i)) {
            Some(Sheet::Chartsheet(cs)) => Ok(cs),
            _ => Err(WriteError::Parameter(format!("no chartsheet named '{}'", name))),
        }
    }

    pub fn set_properties(&mut self, properties: DocProperties) -> &mut Workbook {
        self.properties = properties;
        self
    }

    /// Replace legacy palette slot `index` (8..=63) with `rgb`. Indexed
    /// colors that use the slot pick up the new value.
    pub fn set_custom_color(&mut self, index: u8, rgb: u32) -> Result<&mut Workbook> {
        self.palette.set(index, rgb)?;
        Ok(self)
    }

    /// Define a workbook name (`"Rate"`) or a sheet-local one
    /// (`"Sheet1!Rate"`) for `formula` (`"=Sheet1!$B$1"`).
    pub fn define_name(&mut self, name: &str, formula: &str) -> Result<&mut Workbook> {
        let (sheet, bare) = match name.rsplit_once('!') {
            Some((sheet, bare)) => {
                let sheet = sheet.trim_matches('\'').replace("''", "'");
                (Some(sheet), bare)
            }
            None => (None, name),
        };
        validate_defined_name(bare)?;
        let duplicate = self.user_names.iter().any(|n| {
            n.name.eq_ignore_ascii_case(bare)
                && n.sheet.as_deref().map(str::to_lowercase) == sheet.as_deref().map(str::to_lowercase)
        });
        if duplicate {
            return Err(WriteError::DefinedName(name.to_string()));
        }
        let formula = formula.trim();
        self.user_names.push(UserName {
            sheet,
            name: bare.to_string(),
            formula: formula.strip_prefix('=').unwrap_or(formula).to_string(),
        });
        Ok(self)
    }

    /// Lock the sheet structure (no adding, moving or deleting sheets),
    /// optionally behind a password and with window positions fixed.
    pub fn protect(&mut self, password: Option<&str>, lock_windows: bool) -> &mut Workbook {
        let hash = password.filter(|p| !p.is_empty()).map(PasswordHash::sha512);
        self.protection = Some((hash, lock_windows));
        self
    }

    /// Write the package to `path`. The file is built next to its
    /// destination and renamed into place, so a failed save leaves any
    /// previous file intact.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.prepare()?;
        let parts = assemble_parts(self)?;
        write_file_atomic(parts, path.as_ref())
    }

    /// Build the package in memory.
    pub fn save_to_buffer(&mut self) -> Result<Vec<u8>> {
        self.prepare()?;
        let parts = assemble_parts(self)?;
        let mut cursor = Cursor::new(Vec::new());
        write_archive(parts, &mut cursor)?;
        Ok(cursor.into_inner())
    }

    // ------------------------------------------------------------------
    // Save-time resolution
    // ------------------------------------------------------------------

    /// Checks and numbering that need the whole workbook.
    fn prepare(&mut self) -> Result<()> {
        if self.sheets.is_empty() {
            log::debug!("empty workbook, adding a default worksheet");
            self.add_worksheet();
        }

        let names: Vec<&str> = self.sheets.iter().map(Sheet::name).collect();
        crate::validation::validate_sheet_names(&names)?;

        if self.sheets.iter().all(Sheet::is_hidden) {
            return Err(WriteError::Parameter(
                "a workbook needs at least one visible sheet".to_string(),
            ));
        }

        for sheet in &self.sheets {
            if let Sheet::Chartsheet(cs) = sheet {
                cs.chart_or_err()?;
            }
        }

        // Table ids run across the workbook in sheet order; names must be
        // unique ignoring case.
        let mut table_id = 0;
        let mut table_names = HashSet::new();
        for sheet in &mut self.sheets {
            if let Sheet::Worksheet(ws) = sheet {
                for table in &mut ws.tables {
                    table_id += 1;
                    table.id = table_id;
                    let name = table.display_name();
                    if !table_names.insert(name.to_lowercase()) {
                        return Err(WriteError::Table(format!("table name '{}' is already in use", name)));
                    }
                }
            }
        }
        Ok(())
    }

    /// Position of the active sheet: the last one marked active, else the
    /// first visible one. A hidden sheet can't be active.
    pub(crate) fn active_index(&self) -> usize {
        let first_visible = self.sheets.iter().position(|s| !s.is_hidden()).unwrap_or(0);
        match self.sheets.iter().rposition(Sheet::is_active) {
            Some(idx) if !self.sheets[idx].is_hidden() => idx,
            Some(idx) => {
                log::warn!(
                    "sheet '{}' is hidden and can't be active; using '{}'",
                    self.sheets[idx].name(),
                    self.sheets[first_visible].name()
                );
                first_visible
            }
            None => first_visible,
        }
    }

    /// Whether the sheet at `index` is drawn with a selected tab.
    pub(crate) fn is_tab_selected(&self, index: usize) -> bool {
        index == self.active_index() || self.sheets.get(index).is_some_and(Sheet::is_selected)
    }

    /// Literal values for every range a chart reads.
    pub(crate) fn chart_cache(&self, chart: &Chart) -> Result<ChartCache> {
        let mut cache = ChartCache::new();
        for range in chart.data_ranges() {
            let Some(cells) = range.range else {
                continue;
            };
            let sheet = self.find_sheet(&range.sheet).and_then(|i| match &self.sheets[i] {
                Sheet::Worksheet(ws) => Some(ws),
                Sheet::Chartsheet(_) => None,
            });
            let Some(ws) = sheet else {
                return Err(WriteError::UnknownWorksheetReference {
                    sheet: range.sheet.clone(),
                    formula: range.formula.clone(),
                });
            };

            let mut values = Vec::new();
            'rows: for row in cells.first_row..=cells.last_row {
                for col in cells.first_col..=cells.last_col {
                    if values.len() >= MAX_CACHE_POINTS {
                        break 'rows;
                    }
                    values.push(cache_value(ws.cell(row, col)));
                }
            }
            cache.insert(range.formula.clone(), values);
        }
        Ok(cache)
    }

    /// Built-in names for print areas, print titles and autofilters plus
    /// the user's names, in Excel's order.
    pub(crate) fn defined_names(&self) -> Result<Vec<DefinedName>> {
        let mut names = Vec::new();

        for user in &self.user_names {
            let scope = match &user.sheet {
                Some(sheet) => Some(self.find_sheet(sheet).ok_or_else(|| {
                    WriteError::DefinedName(format!("{}!{}", sheet, user.name))
                })?),
                None => None,
            };
            names.push(DefinedName {
                name: user.name.clone(),
                scope,
                formula: user.formula.clone(),
                hidden: false,
            });
        }

        for (idx, sheet) in self.sheets.iter().enumerate() {
            let Sheet::Worksheet(ws) = sheet else {
                continue;
            };
            let quoted = quote_sheet_name(&ws.name);

            if let Some(filter) = &ws.autofilter {
                names.push(DefinedName {
                    name: "_xlnm._FilterDatabase".to_string(),
                    scope: Some(idx),
                    formula: format!(
                        "{}!{}",
                        quoted,
                        range_ref_abs(filter.first_row, filter.first_col, filter.last_row, filter.last_col)
                    ),
                    hidden: true,
                });
            }

            if let Some(area) = &ws.print_area {
                names.push(DefinedName {
                    name: "_xlnm.Print_Area".to_string(),
                    scope: Some(idx),
                    formula: format!(
                        "{}!{}",
                        quoted,
                        range_ref_abs(area.first_row, area.first_col, area.last_row, area.last_col)
                    ),
                    hidden: false,
                });
            }

            let mut titles = Vec::new();
            if let Some((first, last)) = ws.repeat_cols {
                titles.push(format!("{}!${}:${}", quoted, col_to_name(first), col_to_name(last)));
            }
            if let Some((first, last)) = ws.repeat_rows {
                titles.push(format!("{}!${}:${}", quoted, first + 1, last + 1));
            }
            if !titles.is_empty() {
                names.push(DefinedName {
                    name: "_xlnm.Print_Titles".to_string(),
                    scope: Some(idx),
                    formula: titles.join(","),
                    hidden: false,
                });
            }
        }

        names.sort_by_key(DefinedName::sort_key);
        Ok(names)
    }

    /// "Named Ranges" titles for `app.xml`.
    pub(crate) fn named_range_titles(&self, names: &[DefinedName]) -> Vec<String> {
        names.iter().filter_map(|n| n.app_title(&self.sheets)).collect()
    }

    /// `xl/workbook.xml`. Sheet `n` (0-based) refers to relationship
    /// `rId{n+1}`.
    pub(crate) fn workbook_xml(&self, names: &[DefinedName]) -> Vec<u8> {
        let mut int = itoa::Buffer::new();
        let mut xml = XmlWriter::with_capacity(1024 + self.sheets.len() * 96);
        xml.declaration();
        xml.start_with("workbook", &[("xmlns", NS_SPREADSHEETML), ("xmlns:r", NS_RELATIONSHIPS)]);
        xml.empty_with(
            "fileVersion",
            &[("appName", "xl"), ("lastEdited", "4"), ("lowestEdited", "4"), ("rupBuild", "4505")],
        );
        xml.empty("workbookPr");

        if let Some((password, lock_windows)) = &self.protection {
            write_workbook_protection(&mut xml, password.as_ref(), *lock_windows);
        }

        let active = self.active_index().to_string();
        let first_sheet = self
            .sheets
            .iter()
            .position(|s| !s.is_hidden())
            .unwrap_or(0)
            .to_string();
        let mut view: Vec<(&str, &str)> = vec![
            ("xWindow", "240"),
            ("yWindow", "15"),
            ("windowWidth", "16095"),
            ("windowHeight", "9660"),
        ];
        if first_sheet != "0" {
            view.push(("firstSheet", &first_sheet));
        }
        if active != "0" {
            view.push(("activeTab", &active));
        }
        xml.start("bookViews");
        xml.empty_with("workbookView", &view);
        xml.end("bookViews");

        xml.start("sheets");
        for (idx, sheet) in self.sheets.iter().enumerate() {
            let sheet_id = (idx + 1).to_string();
            let rel_id = format!("rId{}", idx + 1);
            let mut attrs: Vec<(&str, &str)> =
                vec![("name", sheet.name()), ("sheetId", &sheet_id)];
            if let Some(state) = sheet.state() {
                attrs.push(("state", state));
            }
            attrs.push(("r:id", &rel_id));
            xml.empty_with("sheet", &attrs);
        }
        xml.end("sheets");

        if !names.is_empty() {
            xml.start("definedNames");
            for name in names {
                let mut attrs: Vec<(&str, &str)> = vec![("name", &name.name)];
                let scope = name.scope.map(|s| int.format(s).to_string());
                if let Some(scope) = &scope {
                    attrs.push(("localSheetId", scope));
                }
                if name.hidden {
                    attrs.push(("hidden", "1"));
                }
                xml.data_with("definedName", &attrs, &name.formula);
            }
            xml.end("definedNames");
        }

        xml.empty_with("calcPr", &[("calcId", "124519"), ("fullCalcOnLoad", "1")]);
        xml.end("workbook");
        xml.into_bytes()
    }
}

fn cache_value(cell: Option<&CellData>) -> ChartCacheValue {
    let from_result = |result: &FormulaResult| match result {
        FormulaResult::Number(n) => ChartCacheValue::Number(*n),
        FormulaResult::String(s) => ChartCacheValue::String(s.clone()),
        FormulaResult::Boolean(b) => ChartCacheValue::Number(if *b { 1.0 } else { 0.0 }),
        FormulaResult::Error(_) => ChartCacheValue::Empty,
    };
    match cell {
        Some(CellData::Number { value, .. }) => ChartCacheValue::Number(*value),
        Some(CellData::DateTime { serial, .. }) => ChartCacheValue::Number(*serial),
        Some(CellData::Boolean { value, .. }) => ChartCacheValue::Number(if *value { 1.0 } else { 0.0 }),
        Some(CellData::String { raw, .. }) => ChartCacheValue::String(raw.to_string()),
        // Rich text has no plain cached form.
        Some(CellData::RichString { .. }) => ChartCacheValue::String(String::new()),
        Some(CellData::Formula { result, .. }) | Some(CellData::ArrayFormula { result, .. }) => {
            from_result(result)
        }
        Some(CellData::Blank { .. })
        | Some(CellData::Error { .. })
        | Some(CellData::EmbeddedImage { .. })
        | None => ChartCacheValue::Empty,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::table::Table;

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_default_and_duplicate_sheet_names() {
        let mut wb = Workbook::new();
        assert_eq!(wb.add_worksheet().name(), "Sheet1");
        wb.add_worksheet_with_name("Data").unwrap();
        assert_eq!(wb.add_worksheet().name(), "Sheet3");
        assert_eq!(wb.add_chartsheet().name(), "Chart1");
        assert!(matches!(
            wb.add_worksheet_with_name("data"),
            Err(WriteError::DuplicateSheetName(_))
        ));
        assert!(matches!(
            wb.add_worksheet_with_name("bad[name]"),
            Err(WriteError::SheetName { .. })
        ));
    }

    #[test]
    fn test_renamed_duplicate_caught_at_save() {
        let mut wb = Workbook::new();
        wb.add_worksheet();
        wb.add_worksheet().set_name("SHEET1").unwrap();
        assert!(matches!(wb.save_to_buffer(), Err(WriteError::DuplicateSheetName(_))));
    }

    #[test]
    fn test_chart_cache_from_cells() {
        let mut wb = Workbook::new();
        let ws = wb.add_worksheet_with_name("My Data").unwrap();
        ws.write_string(0, 0, "Apples").unwrap();
        ws.write_number(1, 0, 3.0).unwrap();
        ws.write_formula_with_result(2, 0, "=A2*2", "6").unwrap();

        let mut chart = Chart::new_column();
        chart.add_series().unwrap().set_values("='My Data'!$A$1:$A$4");
        let cache = wb.chart_cache(&chart).unwrap();
        assert_eq!(
            cache.get("'My Data'!$A$1:$A$4"),
            Some(&vec![
                ChartCacheValue::String("Apples".to_string()),
                ChartCacheValue::Number(3.0),
                ChartCacheValue::Number(6.0),
                ChartCacheValue::Empty,
            ])
        );
    }

    #[test]
    fn test_chart_cache_rich_string_is_empty() {
        let mut wb = Workbook::new();
        let ws = wb.add_worksheet();
        let bold = crate::format::Format::new().set_bold();
        let plain = crate::format::Format::new();
        ws.write_rich_string(0, 0, &[(&bold, "North "), (&plain, "region")]).unwrap();
        ws.write_string(1, 0, "South").unwrap();
        ws.write_number(0, 1, 4.0).unwrap();
        ws.write_number(1, 1, 6.0).unwrap();

        let mut chart = Chart::new_bar();
        chart
            .add_series()
            .unwrap()
            .set_categories("Sheet1!$A$1:$A$2")
            .set_values("Sheet1!$B$1:$B$2");
        let cache = wb.chart_cache(&chart).unwrap();
        assert_eq!(
            cache.get("Sheet1!$A$1:$A$2"),
            Some(&vec![
                ChartCacheValue::String(String::new()),
                ChartCacheValue::String("South".to_string()),
            ])
        );
    }

    #[test]
    fn test_chart_unknown_sheet() {
        let mut wb = Workbook::new();
        wb.add_worksheet();
        let mut chart = Chart::new_line();
        chart.add_series().unwrap().set_values("=Sheet9!$A$1:$A$3");
        let err = wb.chart_cache(&chart).unwrap_err();
        assert!(matches!(err, WriteError::UnknownWorksheetReference { sheet, .. } if sheet == "Sheet9"));
    }

    #[test]
    fn test_defined_names_sorted_excel_style() {
        let mut wb = Workbook::new();
        let ws = wb.add_worksheet();
        ws.autofilter(0, 0, 10, 3).unwrap();
        ws.set_print_area(0, 0, 20, 5).unwrap();
        ws.set_repeat_rows(0, 1).unwrap();
        wb.add_worksheet_with_name("Other Sheet").unwrap();
        wb.define_name("Rate", "=Sheet1!$B$1").unwrap();
        wb.define_name("'Other Sheet'!Local", "=0.5").unwrap();
        wb.define_name("Alpha", "=10").unwrap();

        let names = wb.defined_names().unwrap();
        let order: Vec<&str> = names.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(
            order,
            vec!["_xlnm._FilterDatabase", "Alpha", "Local", "_xlnm.Print_Area", "_xlnm.Print_Titles", "Rate"]
        );
        assert_eq!(names[0].formula, "Sheet1!$A$1:$D$11");
        assert!(names[0].hidden);
        assert_eq!(names[2].scope, Some(1));
        assert_eq!(names[4].formula, "Sheet1!$1:$2");
        assert_eq!(
            wb.named_range_titles(&names),
            vec!["Alpha", "'Other Sheet'!Local", "Sheet1!Print_Area", "Sheet1!Print_Titles", "Rate"]
        );
    }

    #[test]
    fn test_define_name_errors() {
        let mut wb = Workbook::new();
        wb.add_worksheet();
        assert!(wb.define_name("A1", "=1").is_err());
        wb.define_name("Total", "=1").unwrap();
        assert!(matches!(wb.define_name("total", "=2"), Err(WriteError::DefinedName(_))));
        wb.define_name("Missing!Total", "=1").unwrap();
        assert!(matches!(wb.defined_names(), Err(WriteError::DefinedName(_))));
    }

    #[test]
    fn test_workbook_xml() {
        let mut wb = Workbook::new();
        wb.add_worksheet().set_hidden(true);
        wb.add_worksheet_with_name("Visible & Co").unwrap();
        let names = wb.defined_names().unwrap();
        let xml = text(wb.workbook_xml(&names));
        assert!(xml.contains("firstSheet=\"1\" activeTab=\"1\"/></bookViews>"));
        assert!(xml.contains("<sheet name=\"Sheet1\" sheetId=\"1\" state=\"hidden\" r:id=\"rId1\"/>"));
        assert!(xml.contains("<sheet name=\"Visible &amp; Co\" sheetId=\"2\" r:id=\"rId2\"/>"));
        assert!(!xml.contains("definedNames"));
        assert!(xml.ends_with("<calcPr calcId=\"124519\" fullCalcOnLoad=\"1\"/></workbook>"));
    }

    #[test]
    fn test_active_and_selected_tabs() {
        let mut wb = Workbook::new();
        wb.add_worksheet();
        wb.add_worksheet().set_active(true);
        wb.add_worksheet().set_selected(true);
        assert_eq!(wb.active_index(), 1);
        assert!(!wb.is_tab_selected(0));
        assert!(wb.is_tab_selected(1));
        assert!(wb.is_tab_selected(2));
    }

    #[test]
    fn test_all_hidden_rejected() {
        let mut wb = Workbook::new();
        wb.add_worksheet().set_hidden(true);
        assert!(matches!(wb.save_to_buffer(), Err(WriteError::Parameter(_))));
    }

    #[test]
    fn test_table_ids_and_names() {
        let mut wb = Workbook::new();
        let ws = wb.add_worksheet();
        ws.add_table(0, 0, 3, 1, &Table::new()).unwrap();
        ws.add_table(0, 3, 3, 4, &Table::new().set_name("Table1").unwrap()).unwrap();
        assert!(matches!(wb.prepare(), Err(WriteError::Table(_))));

        let mut wb = Workbook::new();
        let ws = wb.add_worksheet();
        ws.add_table(0, 0, 3, 1, &Table::new()).unwrap();
        wb.add_worksheet().add_table(0, 0, 3, 1, &Table::new()).unwrap();
        wb.prepare().unwrap();
        let ids: Vec<u32> = wb
            .sheets
            .iter()
            .filter_map(|s| match s {
                Sheet::Worksheet(ws) => ws.tables.first().map(|t| t.id),
                _ => None,
            })
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_chartsheet_needs_chart() {
        let mut wb = Workbook::new();
        wb.add_chartsheet();
        assert!(matches!(wb.save_to_buffer(), Err(WriteError::Parameter(_))));
    }
}
