//! `xl/worksheets/sheetN.xml` generation.
//!
//! Written straight into a byte buffer in schema order. Relationship ids
//! are assigned by the packager and handed in through [`SheetLinks`].

use std::collections::BTreeMap;

use crate::autofilter::write_autofilter;
use crate::conditional_format::write_conditional_formats;
use crate::data_validation::write_data_validations;
use crate::protection::write_sheet_protection;
use crate::sparkline::write_sparkline_ext;
use crate::types::{CellData, CellRange, FormulaResult};
use crate::utility::{col_width_for_xml, format_number, push_number, ColumnNameCache, DEFAULT_COL_WIDTH};
use crate::worksheet::{ColumnOptions, HyperlinkTarget, RowOptions, Worksheet};
use crate::xml::{escape_attr_into, escape_data_into, XmlWriter, NS_RELATIONSHIPS, NS_SPREADSHEETML, XML_DECLARATION};

/// Relationship ids and workbook-level facts the sheet XML refers to.
#[derive(Debug, Clone, Default)]
pub(crate) struct SheetLinks {
    /// One id per external hyperlink, in cell order.
    pub hyperlinks: Vec<String>,
    pub drawing: Option<String>,
    pub vml: Option<String>,
    pub tables: Vec<String>,
    /// Value-metadata index of this sheet's first in-cell image, 0-based.
    pub image_vm_base: u32,
    pub tab_selected: bool,
}

#[inline]
fn push_int(buf: &mut Vec<u8>, int: &mut itoa::Buffer, n: impl itoa::Integer) {
    buf.extend_from_slice(int.format(n).as_bytes());
}

#[inline]
fn push_attr(buf: &mut Vec<u8>, name: &[u8], value: &[u8]) {
    buf.push(b' ');
    buf.extend_from_slice(name);
    buf.extend_from_slice(b"=\"");
    buf.extend_from_slice(value);
    buf.push(b'"');
}

impl Worksheet {
    pub(crate) fn assemble_xml(&self, links: &SheetLinks) -> Vec<u8> {
        let cell_count: usize = self.cells.values().map(|r| r.len()).sum();
        let mut buf = Vec::with_capacity(4096 + cell_count * 40);

        buf.extend_from_slice(XML_DECLARATION);
        buf.extend_from_slice(b"<worksheet xmlns=\"");
        buf.extend_from_slice(NS_SPREADSHEETML.as_bytes());
        buf.extend_from_slice(b"\" xmlns:r=\"");
        buf.extend_from_slice(NS_RELATIONSHIPS.as_bytes());
        buf.extend_from_slice(b"\">");

        self.write_sheet_pr(&mut buf);

        // 1. DIMENSION
        buf.extend_from_slice(b"<dimension ref=\"");
        match self.dimensions {
            Some(d) => buf.extend_from_slice(d.to_a1().as_bytes()),
            None => buf.extend_from_slice(b"A1"),
        }
        buf.extend_from_slice(b"\"/>");

        // 2. SHEETVIEWS
        self.write_sheet_views(&mut buf, links.tab_selected);

        // 3. SHEETFORMATPR
        self.write_sheet_format_pr(&mut buf);

        // 4. COLS
        self.write_cols(&mut buf);

        // 5. SHEETDATA
        self.write_sheet_data(&mut buf, links.image_vm_base);

        if let Some(protection) = &self.protection {
            let mut xml = XmlWriter::new();
            write_sheet_protection(&mut xml, &protection.options, protection.password.as_ref());
            buf.extend_from_slice(&xml.into_bytes());
        }

        // 6. AUTOFILTER
        if let Some(range) = &self.autofilter {
            write_autofilter(&mut buf, range, &self.filter_columns);
        }

        // 7. MERGED CELLS
        if !self.merges.is_empty() {
            let mut int = itoa::Buffer::new();
            buf.extend_from_slice(b"<mergeCells count=\"");
            push_int(&mut buf, &mut int, self.merges.len());
            buf.extend_from_slice(b"\">");
            for merge in &self.merges {
                buf.extend_from_slice(b"<mergeCell ref=\"");
                buf.extend_from_slice(merge.to_a1().as_bytes());
                buf.extend_from_slice(b"\"/>");
            }
            buf.extend_from_slice(b"</mergeCells>");
        }

        // 8. CONDITIONAL FORMATTING
        write_conditional_formats(&mut buf, &self.conditional_formats);

        // 9. DATA VALIDATIONS
        write_data_validations(&mut buf, &self.validations);

        // 10. HYPERLINKS
        self.write_hyperlinks(&mut buf, &links.hyperlinks);

        // 11. PRINTING
        self.page_setup.write_print_options(&mut buf);
        self.page_setup.write_page_margins(&mut buf);
        self.page_setup.write_page_setup(&mut buf);
        self.page_setup.write_header_footer(&mut buf);
        self.page_setup.write_breaks(&mut buf);

        // 12. OBJECT PARTS
        if let Some(id) = &links.drawing {
            buf.extend_from_slice(b"<drawing r:id=\"");
            buf.extend_from_slice(id.as_bytes());
            buf.extend_from_slice(b"\"/>");
        }
        if let Some(id) = &links.vml {
            buf.extend_from_slice(b"<legacyDrawing r:id=\"");
            buf.extend_from_slice(id.as_bytes());
            buf.extend_from_slice(b"\"/>");
        }
        if !links.tables.is_empty() {
            let mut int = itoa::Buffer::new();
            buf.extend_from_slice(b"<tableParts count=\"");
            push_int(&mut buf, &mut int, links.tables.len());
            buf.extend_from_slice(b"\">");
            for id in &links.tables {
                buf.extend_from_slice(b"<tablePart r:id=\"");
                buf.extend_from_slice(id.as_bytes());
                buf.extend_from_slice(b"\"/>");
            }
            buf.extend_from_slice(b"</tableParts>");
        }

        // 13. EXTENSIONS
        if !self.sparklines.is_empty() {
            buf.extend_from_slice(b"<extLst>");
            write_sparkline_ext(&mut buf, &self.name, &self.sparklines);
            buf.extend_from_slice(b"</extLst>");
        }

        buf.extend_from_slice(b"</worksheet>");
        buf
    }

    fn write_sheet_pr(&self, buf: &mut Vec<u8>) {
        let filter_mode = self.filter_columns.values().any(|c| c.is_list() || !c.custom.is_empty());
        let fit_to_page = self.page_setup.fit_to_page();
        let has_outline = self.rows.values().any(|r| r.collapsed) || self.cols.values().any(|c| c.collapsed);
        if !filter_mode && !fit_to_page && !has_outline && self.tab_color.is_default() {
            return;
        }

        buf.extend_from_slice(b"<sheetPr");
        if filter_mode {
            buf.extend_from_slice(b" filterMode=\"1\"");
        }
        buf.push(b'>');
        if !self.tab_color.is_default() {
            buf.extend_from_slice(b"<tabColor");
            for (name, value) in self.tab_color.style_attributes() {
                push_attr(buf, name.as_bytes(), value.as_bytes());
            }
            buf.extend_from_slice(b"/>");
        }
        if has_outline {
            buf.extend_from_slice(b"<outlinePr summaryBelow=\"1\" summaryRight=\"1\"/>");
        }
        if fit_to_page {
            buf.extend_from_slice(b"<pageSetUpPr fitToPage=\"1\"/>");
        }
        buf.extend_from_slice(b"</sheetPr>");
    }

    fn write_sheet_views(&self, buf: &mut Vec<u8>, tab_selected: bool) {
        let mut int = itoa::Buffer::new();
        buf.extend_from_slice(b"<sheetViews><sheetView");
        if !self.show_gridlines {
            buf.extend_from_slice(b" showGridLines=\"0\"");
        }
        if self.right_to_left {
            buf.extend_from_slice(b" rightToLeft=\"1\"");
        }
        if tab_selected {
            buf.extend_from_slice(b" tabSelected=\"1\"");
        }
        if self.zoom != 100 {
            buf.extend_from_slice(b" zoomScale=\"");
            push_int(buf, &mut int, self.zoom);
            buf.extend_from_slice(b"\" zoomScaleNormal=\"");
            push_int(buf, &mut int, self.zoom);
            buf.push(b'"');
        }
        buf.extend_from_slice(b" workbookViewId=\"0\"");

        let selection = self.selection.filter(|s| !(s.first_row == 0 && s.first_col == 0 && s.is_single_cell()));
        if self.panes.is_none() && selection.is_none() {
            buf.extend_from_slice(b"/></sheetViews>");
            return;
        }
        buf.push(b'>');

        match self.panes {
            Some(panes) => {
                let active_pane: &[u8] = match (panes.freeze_row > 0, panes.freeze_col > 0) {
                    (true, true) => b"bottomRight",
                    (true, false) => b"bottomLeft",
                    _ => b"topRight",
                };
                buf.extend_from_slice(b"<pane");
                if panes.freeze_col > 0 {
                    buf.extend_from_slice(b" xSplit=\"");
                    push_int(buf, &mut int, panes.freeze_col);
                    buf.push(b'"');
                }
                if panes.freeze_row > 0 {
                    buf.extend_from_slice(b" ySplit=\"");
                    push_int(buf, &mut int, panes.freeze_row);
                    buf.push(b'"');
                }
                buf.extend_from_slice(b" topLeftCell=\"");
                ColumnNameCache::new().write_cell_ref(panes.top_row, panes.left_col, buf);
                buf.extend_from_slice(b"\" activePane=\"");
                buf.extend_from_slice(active_pane);
                buf.extend_from_slice(b"\" state=\"frozen\"/>");

                if panes.freeze_row > 0 && panes.freeze_col > 0 {
                    buf.extend_from_slice(b"<selection pane=\"topRight\"/><selection pane=\"bottomLeft\"/>");
                }
                buf.extend_from_slice(b"<selection pane=\"");
                buf.extend_from_slice(active_pane);
                buf.push(b'"');
                if let Some(sel) = selection {
                    write_selection_cells(buf, &sel);
                }
                buf.extend_from_slice(b"/>");
            }
            None => {
                if let Some(sel) = selection {
                    buf.extend_from_slice(b"<selection");
                    write_selection_cells(buf, &sel);
                    buf.extend_from_slice(b"/>");
                }
            }
        }
        buf.extend_from_slice(b"</sheetView></sheetViews>");
    }

    fn write_sheet_format_pr(&self, buf: &mut Vec<u8>) {
        let mut int = itoa::Buffer::new();
        let row_level = self.rows.values().map(|r| r.level).max().unwrap_or(0);
        let col_level = self.cols.values().map(|c| c.level).max().unwrap_or(0);

        buf.extend_from_slice(b"<sheetFormatPr defaultRowHeight=\"");
        match self.default_row_height {
            Some(height) => {
                buf.extend_from_slice(format_number(height).as_bytes());
                buf.extend_from_slice(b"\" customHeight=\"1\"");
            }
            None => buf.extend_from_slice(b"15\""),
        }
        if row_level > 0 {
            buf.extend_from_slice(b" outlineLevelRow=\"");
            push_int(buf, &mut int, row_level);
            buf.push(b'"');
        }
        if col_level > 0 {
            buf.extend_from_slice(b" outlineLevelCol=\"");
            push_int(buf, &mut int, col_level);
            buf.push(b'"');
        }
        buf.extend_from_slice(b"/>");
    }

    fn write_cols(&self, buf: &mut Vec<u8>) {
        if self.cols.is_empty() {
            return;
        }
        let mut int = itoa::Buffer::new();
        buf.extend_from_slice(b"<cols>");

        // Adjacent columns with identical settings share one <col> span.
        let mut spans: Vec<(u16, u16, &ColumnOptions)> = Vec::new();
        for (col, opts) in &self.cols {
            match spans.last_mut() {
                Some((_, last, prev)) if *last + 1 == *col && *prev == opts => *last = *col,
                _ => spans.push((*col, *col, opts)),
            }
        }

        for (first, last, opts) in spans {
            let width = match (opts.width, opts.hidden) {
                (_, true) if opts.width.is_none() => 0.0,
                (Some(w), _) => col_width_for_xml(w),
                (None, _) => col_width_for_xml(DEFAULT_COL_WIDTH),
            };
            buf.extend_from_slice(b"<col min=\"");
            push_int(buf, &mut int, first + 1);
            buf.extend_from_slice(b"\" max=\"");
            push_int(buf, &mut int, last + 1);
            buf.extend_from_slice(b"\" width=\"");
            buf.extend_from_slice(format_number(width).as_bytes());
            buf.push(b'"');
            if let Some(xf) = opts.xf.filter(|xf| *xf > 0) {
                buf.extend_from_slice(b" style=\"");
                push_int(buf, &mut int, xf);
                buf.push(b'"');
            }
            if opts.hidden {
                buf.extend_from_slice(b" hidden=\"1\"");
            }
            if opts.width.is_some() || opts.hidden {
                buf.extend_from_slice(b" customWidth=\"1\"");
            }
            if opts.level > 0 {
                buf.extend_from_slice(b" outlineLevel=\"");
                push_int(buf, &mut int, opts.level);
                buf.push(b'"');
            }
            if opts.collapsed {
                buf.extend_from_slice(b" collapsed=\"1\"");
            }
            buf.extend_from_slice(b"/>");
        }
        buf.extend_from_slice(b"</cols>");
    }

    /// Rows excluded by list filters, hidden so the saved view matches the
    /// filter Excel shows.
    fn filtered_rows(&self) -> Vec<u32> {
        let (Some(range), false) = (self.autofilter, self.filter_columns.is_empty()) else {
            return Vec::new();
        };
        if !self.filter_columns.values().any(|c| c.is_list()) {
            return Vec::new();
        }
        self.cells
            .range(range.first_row + 1..=range.last_row)
            .filter(|(_, cells)| {
                self.filter_columns.iter().any(|(col, condition)| {
                    let text = cells.get(col).and_then(cell_text);
                    !condition.shows(text.as_deref())
                })
            })
            .map(|(row, _)| *row)
            .collect()
    }

    /// Column spans per 16-row block, as Excel writes them for load-time
    /// allocation.
    fn row_spans(&self) -> BTreeMap<u32, (u16, u16)> {
        let mut spans: BTreeMap<u32, (u16, u16)> = BTreeMap::new();
        let mut widen = |row: u32, first: u16, last: u16| {
            let entry = spans.entry(row / 16).or_insert((first, last));
            entry.0 = entry.0.min(first);
            entry.1 = entry.1.max(last);
        };
        for (row, cells) in &self.cells {
            if let (Some(first), Some(last)) = (cells.keys().next(), cells.keys().next_back()) {
                widen(*row, *first, *last);
            }
        }
        for (row, col) in self.notes.keys() {
            widen(*row, *col, *col);
        }
        spans
    }

    fn write_sheet_data(&self, buf: &mut Vec<u8>, image_vm_base: u32) {
        if self.cells.is_empty() && self.rows.is_empty() {
            buf.extend_from_slice(b"<sheetData/>");
            return;
        }
        buf.extend_from_slice(b"<sheetData>");

        let spans = self.row_spans();
        let filtered = self.filtered_rows();
        let default_options = RowOptions::default();
        let mut names = ColumnNameCache::new();
        let mut int = itoa::Buffer::new();

        let mut row_numbers: Vec<u32> = self.cells.keys().chain(self.rows.keys()).copied().collect();
        row_numbers.sort_unstable();
        row_numbers.dedup();

        for row in row_numbers {
            let opts = self.rows.get(&row).unwrap_or(&default_options);
            let hidden = opts.hidden || filtered.binary_search(&row).is_ok();

            buf.extend_from_slice(b"<row r=\"");
            push_int(buf, &mut int, row + 1);
            buf.push(b'"');
            if let Some((first, last)) = spans.get(&(row / 16)) {
                buf.extend_from_slice(b" spans=\"");
                push_int(buf, &mut int, first + 1);
                buf.push(b':');
                push_int(buf, &mut int, last + 1);
                buf.push(b'"');
            }
            if let Some(xf) = opts.xf.filter(|xf| *xf > 0) {
                buf.extend_from_slice(b" s=\"");
                push_int(buf, &mut int, xf);
                buf.extend_from_slice(b"\" customFormat=\"1\"");
            }
            if let Some(height) = opts.height.or(self.default_row_height) {
                buf.extend_from_slice(b" ht=\"");
                buf.extend_from_slice(format_number(height).as_bytes());
                buf.push(b'"');
            }
            if hidden {
                buf.extend_from_slice(b" hidden=\"1\"");
            }
            if opts.height.is_some() {
                buf.extend_from_slice(b" customHeight=\"1\"");
            }
            if opts.level > 0 {
                buf.extend_from_slice(b" outlineLevel=\"");
                push_int(buf, &mut int, opts.level);
                buf.push(b'"');
            }
            if opts.collapsed {
                buf.extend_from_slice(b" collapsed=\"1\"");
            }

            match self.cells.get(&row) {
                Some(cells) if !cells.is_empty() => {
                    buf.push(b'>');
                    for (col, cell) in cells {
                        write_cell(buf, &mut names, &mut int, row, *col, cell, image_vm_base);
                    }
                    buf.extend_from_slice(b"</row>");
                }
                _ => buf.extend_from_slice(b"/>"),
            }
        }
        buf.extend_from_slice(b"</sheetData>");
    }

    fn write_hyperlinks(&self, buf: &mut Vec<u8>, rel_ids: &[String]) {
        if self.hyperlinks.is_empty() {
            return;
        }
        let mut names = ColumnNameCache::new();
        let mut external = rel_ids.iter();
        buf.extend_from_slice(b"<hyperlinks>");
        for ((row, col), link) in &self.hyperlinks {
            buf.extend_from_slice(b"<hyperlink ref=\"");
            names.write_cell_ref(*row, *col, buf);
            buf.push(b'"');
            match &link.target {
                HyperlinkTarget::External { location, .. } => {
                    if let Some(id) = external.next() {
                        push_attr(buf, b"r:id", id.as_bytes());
                    }
                    if let Some(location) = location {
                        buf.extend_from_slice(b" location=\"");
                        escape_attr_into(location.as_bytes(), buf);
                        buf.push(b'"');
                    }
                }
                HyperlinkTarget::Internal(location) => {
                    buf.extend_from_slice(b" location=\"");
                    escape_attr_into(location.as_bytes(), buf);
                    buf.extend_from_slice(b"\" display=\"");
                    escape_attr_into(link.display.as_bytes(), buf);
                    buf.push(b'"');
                }
            }
            if let Some(tooltip) = &link.tooltip {
                buf.extend_from_slice(b" tooltip=\"");
                escape_attr_into(tooltip.as_bytes(), buf);
                buf.push(b'"');
            }
            buf.extend_from_slice(b"/>");
        }
        buf.extend_from_slice(b"</hyperlinks>");
    }
}

fn write_selection_cells(buf: &mut Vec<u8>, selection: &CellRange) {
    let mut names = ColumnNameCache::new();
    buf.extend_from_slice(b" activeCell=\"");
    names.write_cell_ref(selection.first_row, selection.first_col, buf);
    buf.extend_from_slice(b"\" sqref=\"");
    buf.extend_from_slice(selection.to_a1().as_bytes());
    buf.push(b'"');
}

/// Text a list filter compares against.
fn cell_text(cell: &CellData) -> Option<String> {
    match cell {
        CellData::String { raw, .. } | CellData::RichString { raw, .. } => Some(raw.to_string()),
        CellData::Number { value, .. } | CellData::DateTime { serial: value, .. } => Some(format_number(*value)),
        CellData::Boolean { value, .. } => Some(if *value { "TRUE" } else { "FALSE" }.to_string()),
        CellData::Formula { result, .. } | CellData::ArrayFormula { result, .. } => match result {
            FormulaResult::Number(n) => Some(format_number(*n)),
            FormulaResult::String(s) | FormulaResult::Error(s) => Some(s.clone()),
            FormulaResult::Boolean(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        },
        CellData::Error { value, .. } => Some(value.clone()),
        CellData::Blank { .. } | CellData::EmbeddedImage { .. } => None,
    }
}

fn write_result(buf: &mut Vec<u8>, result: &FormulaResult) {
    buf.extend_from_slice(b"<v>");
    match result {
        FormulaResult::Number(n) => push_number(buf, *n),
        FormulaResult::String(s) | FormulaResult::Error(s) => escape_data_into(s.as_bytes(), buf),
        FormulaResult::Boolean(b) => buf.push(if *b { b'1' } else { b'0' }),
    }
    buf.extend_from_slice(b"</v>");
}

fn result_type(result: &FormulaResult) -> Option<&'static [u8]> {
    match result {
        FormulaResult::Number(_) => None,
        FormulaResult::String(_) => Some(b"str"),
        FormulaResult::Boolean(_) => Some(b"b"),
        FormulaResult::Error(_) => Some(b"e"),
    }
}

#[allow(clippy::too_many_arguments)]
#[inline(always)]
fn write_cell(
    buf: &mut Vec<u8>,
    names: &mut ColumnNameCache,
    int: &mut itoa::Buffer,
    row: u32,
    col: u16,
    cell: &CellData,
    image_vm_base: u32,
) {
    buf.extend_from_slice(b"<c r=\"");
    names.write_cell_ref(row, col, buf);
    buf.push(b'"');
    if let Some(xf) = cell.xf().filter(|xf| *xf > 0) {
        buf.extend_from_slice(b" s=\"");
        push_int(buf, int, xf);
        buf.push(b'"');
    }

    match cell {
        CellData::Number { value, .. } | CellData::DateTime { serial: value, .. } => {
            buf.extend_from_slice(b"><v>");
            push_number(buf, *value);
            buf.extend_from_slice(b"</v></c>");
        }
        CellData::String { index, .. } | CellData::RichString { index, .. } => {
            buf.extend_from_slice(b" t=\"s\"><v>");
            push_int(buf, int, *index);
            buf.extend_from_slice(b"</v></c>");
        }
        CellData::Blank { .. } => buf.extend_from_slice(b"/>"),
        CellData::Boolean { value, .. } => {
            buf.extend_from_slice(b" t=\"b\"><v>");
            buf.push(if *value { b'1' } else { b'0' });
            buf.extend_from_slice(b"</v></c>");
        }
        CellData::Formula { formula, result, .. } => {
            if let Some(t) = result_type(result) {
                push_attr(buf, b"t", t);
            }
            buf.extend_from_slice(b"><f>");
            escape_data_into(formula.as_bytes(), buf);
            buf.extend_from_slice(b"</f>");
            write_result(buf, result);
            buf.extend_from_slice(b"</c>");
        }
        CellData::ArrayFormula {
            formula,
            range,
            dynamic,
            result,
            ..
        } => {
            if let Some(t) = result_type(result) {
                push_attr(buf, b"t", t);
            }
            if *dynamic {
                buf.extend_from_slice(b" cm=\"1\"");
            }
            buf.extend_from_slice(b"><f t=\"array\" ref=\"");
            buf.extend_from_slice(range.to_a1().as_bytes());
            buf.extend_from_slice(b"\">");
            escape_data_into(formula.as_bytes(), buf);
            buf.extend_from_slice(b"</f>");
            write_result(buf, result);
            buf.extend_from_slice(b"</c>");
        }
        CellData::Error { value, .. } => {
            buf.extend_from_slice(b" t=\"e\"><v>");
            escape_data_into(value.as_bytes(), buf);
            buf.extend_from_slice(b"</v></c>");
        }
        CellData::EmbeddedImage { index, .. } => {
            buf.extend_from_slice(b" t=\"e\" vm=\"");
            push_int(buf, int, image_vm_base + index + 1);
            buf.extend_from_slice(b"\"><v>#VALUE!</v></c>");
        }
    }
}
