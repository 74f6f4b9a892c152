//! Print settings for a worksheet: paper, orientation, scaling, margins,
//! headers and footers, and manual page breaks.

use crate::error::Result;
use crate::utility::format_number;
use crate::validation::validate_header_footer;
use crate::xml::escape_attr_into;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageOrientation {
    #[default]
    Portrait,
    Landscape,
}

/// Margins in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageMargins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    pub header: f64,
    pub footer: f64,
}

impl Default for PageMargins {
    fn default() -> Self {
        Self {
            left: 0.7,
            right: 0.7,
            top: 0.75,
            bottom: 0.75,
            header: 0.3,
            footer: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageSetup {
    pub(crate) orientation: PageOrientation,
    pub(crate) paper_size: u8,
    pub(crate) scale: u16,
    pub(crate) fit_to: Option<(u16, u16)>,
    pub(crate) margins: PageMargins,
    pub(crate) center_horizontally: bool,
    pub(crate) center_vertically: bool,
    pub(crate) print_gridlines: bool,
    pub(crate) print_headings: bool,
    pub(crate) black_and_white: bool,
    pub(crate) first_page_number: Option<u16>,
    pub(crate) across_then_down: bool,
    pub(crate) header: String,
    pub(crate) footer: String,
    pub(crate) row_breaks: Vec<u32>,
    pub(crate) col_breaks: Vec<u16>,
}

impl PageSetup {
    pub fn new() -> Self {
        Self {
            scale: 100,
            ..Self::default()
        }
    }

    pub fn set_orientation(&mut self, orientation: PageOrientation) -> &mut Self {
        self.orientation = orientation;
        self
    }

    /// Excel paper code: 1 Letter, 9 A4, 5 Legal and so on. 0 keeps the
    /// printer default.
    pub fn set_paper_size(&mut self, paper_size: u8) -> &mut Self {
        self.paper_size = paper_size;
        self
    }

    /// Print scale in percent, 10 to 400. Ignored when fitting to pages.
    pub fn set_print_scale(&mut self, scale: u16) -> &mut Self {
        if (10..=400).contains(&scale) {
            self.scale = scale;
        }
        self
    }

    /// Fit the printout to `width` x `height` pages; 0 leaves that
    /// direction unconstrained.
    pub fn set_fit_to_pages(&mut self, width: u16, height: u16) -> &mut Self {
        self.fit_to = Some((width, height));
        self
    }

    pub fn set_margins(&mut self, margins: PageMargins) -> &mut Self {
        self.margins = margins;
        self
    }

    pub fn set_center_horizontally(&mut self, enable: bool) -> &mut Self {
        self.center_horizontally = enable;
        self
    }

    pub fn set_center_vertically(&mut self, enable: bool) -> &mut Self {
        self.center_vertically = enable;
        self
    }

    pub fn set_print_gridlines(&mut self, enable: bool) -> &mut Self {
        self.print_gridlines = enable;
        self
    }

    pub fn set_print_headings(&mut self, enable: bool) -> &mut Self {
        self.print_headings = enable;
        self
    }

    pub fn set_print_black_and_white(&mut self, enable: bool) -> &mut Self {
        self.black_and_white = enable;
        self
    }

    pub fn set_first_page_number(&mut self, number: u16) -> &mut Self {
        self.first_page_number = Some(number);
        self
    }

    pub fn set_page_order_across_then_down(&mut self, enable: bool) -> &mut Self {
        self.across_then_down = enable;
        self
    }

    /// Header text with Excel's `&L`, `&C`, `&R`, `&P` style codes.
    pub fn set_header(&mut self, header: &str) -> Result<&mut Self> {
        validate_header_footer(header)?;
        self.header = header.to_string();
        Ok(self)
    }

    pub fn set_footer(&mut self, footer: &str) -> Result<&mut Self> {
        validate_header_footer(footer)?;
        self.footer = footer.to_string();
        Ok(self)
    }

    /// Manual page breaks above the given zero-based rows.
    pub fn set_row_breaks(&mut self, rows: &[u32]) -> &mut Self {
        let mut rows: Vec<u32> = rows.iter().copied().filter(|r| *r > 0).collect();
        rows.sort_unstable();
        rows.dedup();
        // Excel's limit on manual breaks.
        rows.truncate(1023);
        self.row_breaks = rows;
        self
    }

    pub fn set_col_breaks(&mut self, cols: &[u16]) -> &mut Self {
        let mut cols: Vec<u16> = cols.iter().copied().filter(|c| *c > 0).collect();
        cols.sort_unstable();
        cols.dedup();
        cols.truncate(1023);
        self.col_breaks = cols;
        self
    }

    pub(crate) fn fit_to_page(&self) -> bool {
        self.fit_to.is_some()
    }

    fn has_page_setup(&self) -> bool {
        self.orientation != PageOrientation::Portrait
            || self.paper_size != 0
            || (self.scale != 100 && self.scale != 0)
            || self.fit_to.is_some()
            || self.first_page_number.is_some()
            || self.black_and_white
            || self.across_then_down
    }

    pub(crate) fn write_print_options(&self, buf: &mut Vec<u8>) {
        if !(self.center_horizontally
            || self.center_vertically
            || self.print_gridlines
            || self.print_headings)
        {
            return;
        }
        buf.extend_from_slice(b"<printOptions");
        if self.center_horizontally {
            buf.extend_from_slice(b" horizontalCentered=\"1\"");
        }
        if self.center_vertically {
            buf.extend_from_slice(b" verticalCentered=\"1\"");
        }
        if self.print_headings {
            buf.extend_from_slice(b" headings=\"1\"");
        }
        if self.print_gridlines {
            buf.extend_from_slice(b" gridLines=\"1\"");
        }
        buf.extend_from_slice(b"/>");
    }

    pub(crate) fn write_page_margins(&self, buf: &mut Vec<u8>) {
        let m = &self.margins;
        buf.extend_from_slice(b"<pageMargins");
        for (name, value) in [
            ("left", m.left),
            ("right", m.right),
            ("top", m.top),
            ("bottom", m.bottom),
            ("header", m.header),
            ("footer", m.footer),
        ] {
            buf.push(b' ');
            buf.extend_from_slice(name.as_bytes());
            buf.extend_from_slice(b"=\"");
            buf.extend_from_slice(format_number(value).as_bytes());
            buf.push(b'"');
        }
        buf.extend_from_slice(b"/>");
    }

    pub(crate) fn write_page_setup(&self, buf: &mut Vec<u8>) {
        if !self.has_page_setup() {
            return;
        }
        let mut int = itoa::Buffer::new();
        buf.extend_from_slice(b"<pageSetup");
        if self.paper_size != 0 {
            buf.extend_from_slice(b" paperSize=\"");
            buf.extend_from_slice(int.format(self.paper_size).as_bytes());
            buf.push(b'"');
        }
        if self.scale != 100 && self.scale != 0 && self.fit_to.is_none() {
            buf.extend_from_slice(b" scale=\"");
            buf.extend_from_slice(int.format(self.scale).as_bytes());
            buf.push(b'"');
        }
        if let Some(first) = self.first_page_number {
            buf.extend_from_slice(b" firstPageNumber=\"");
            buf.extend_from_slice(int.format(first).as_bytes());
            buf.push(b'"');
        }
        if let Some((width, height)) = self.fit_to {
            if width != 1 {
                buf.extend_from_slice(b" fitToWidth=\"");
                buf.extend_from_slice(int.format(width).as_bytes());
                buf.push(b'"');
            }
            if height != 1 {
                buf.extend_from_slice(b" fitToHeight=\"");
                buf.extend_from_slice(int.format(height).as_bytes());
                buf.push(b'"');
            }
        }
        if self.across_then_down {
            buf.extend_from_slice(b" pageOrder=\"overThenDown\"");
        }
        buf.extend_from_slice(match self.orientation {
            PageOrientation::Portrait => b" orientation=\"portrait\"".as_slice(),
            PageOrientation::Landscape => b" orientation=\"landscape\"".as_slice(),
        });
        if self.black_and_white {
            buf.extend_from_slice(b" blackAndWhite=\"1\"");
        }
        if self.first_page_number.is_some() {
            buf.extend_from_slice(b" useFirstPageNumber=\"1\"");
        }
        buf.extend_from_slice(b"/>");
    }

    pub(crate) fn write_header_footer(&self, buf: &mut Vec<u8>) {
        if self.header.is_empty() && self.footer.is_empty() {
            return;
        }
        buf.extend_from_slice(b"<headerFooter>");
        if !self.header.is_empty() {
            buf.extend_from_slice(b"<oddHeader>");
            crate::xml::escape_data_into(self.header.as_bytes(), buf);
            buf.extend_from_slice(b"</oddHeader>");
        }
        if !self.footer.is_empty() {
            buf.extend_from_slice(b"<oddFooter>");
            crate::xml::escape_data_into(self.footer.as_bytes(), buf);
            buf.extend_from_slice(b"</oddFooter>");
        }
        buf.extend_from_slice(b"</headerFooter>");
    }

    pub(crate) fn write_breaks(&self, buf: &mut Vec<u8>) {
        write_break_list(buf, b"rowBreaks", &self.row_breaks, 16_383);
        write_break_list(buf, b"colBreaks", &self.col_breaks, 1_048_575);
    }
}

fn write_break_list<T: itoa::Integer + Copy>(buf: &mut Vec<u8>, tag: &[u8], breaks: &[T], max: u32) {
    if breaks.is_empty() {
        return;
    }
    let mut int = itoa::Buffer::new();
    let count = int.format(breaks.len()).to_string();
    buf.push(b'<');
    buf.extend_from_slice(tag);
    buf.extend_from_slice(b" count=\"");
    buf.extend_from_slice(count.as_bytes());
    buf.extend_from_slice(b"\" manualBreakCount=\"");
    buf.extend_from_slice(count.as_bytes());
    buf.extend_from_slice(b"\">");
    for id in breaks {
        buf.extend_from_slice(b"<brk id=\"");
        escape_attr_into(int.format(*id).as_bytes(), buf);
        buf.extend_from_slice(b"\" max=\"");
        buf.extend_from_slice(int.format(max).as_bytes());
        buf.extend_from_slice(b"\" man=\"1\"/>");
    }
    buf.extend_from_slice(b"</");
    buf.extend_from_slice(tag);
    buf.push(b'>');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WriteError;

    fn render(setup: &PageSetup) -> String {
        let mut buf = Vec::new();
        setup.write_print_options(&mut buf);
        setup.write_page_margins(&mut buf);
        setup.write_page_setup(&mut buf);
        setup.write_header_footer(&mut buf);
        setup.write_breaks(&mut buf);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_default_only_writes_margins() {
        assert_eq!(
            render(&PageSetup::new()),
            "<pageMargins left=\"0.7\" right=\"0.7\" top=\"0.75\" bottom=\"0.75\" header=\"0.3\" footer=\"0.3\"/>"
        );
    }

    #[test]
    fn test_landscape_a4_fit_to_width() {
        let mut setup = PageSetup::new();
        setup
            .set_orientation(PageOrientation::Landscape)
            .set_paper_size(9)
            .set_print_scale(50)
            .set_fit_to_pages(1, 0)
            .set_print_gridlines(true);
        let xml = render(&setup);
        assert!(xml.starts_with("<printOptions gridLines=\"1\"/>"));
        assert!(xml.contains("<pageSetup paperSize=\"9\" fitToHeight=\"0\" orientation=\"landscape\"/>"));
        assert!(setup.fit_to_page());
    }

    #[test]
    fn test_header_footer_escaped_and_limited() {
        let mut setup = PageSetup::new();
        setup.set_header("&CSales & Costs").unwrap();
        setup.set_footer("&RPage &P of &N").unwrap();
        let xml = render(&setup);
        assert!(xml.contains("<headerFooter><oddHeader>&amp;CSales &amp; Costs</oddHeader>"));
        assert!(matches!(
            setup.set_header(&"x".repeat(256)),
            Err(WriteError::HeaderFooterTooLong)
        ));
        assert!(matches!(setup.set_footer("&C&G"), Err(WriteError::Parameter(_))));
        let xml = render(&setup);
        assert!(xml.contains("<oddFooter>&amp;RPage &amp;P of &amp;N</oddFooter>"));
    }

    #[test]
    fn test_page_breaks_sorted() {
        let mut setup = PageSetup::new();
        setup.set_row_breaks(&[20, 0, 10, 20]);
        setup.set_col_breaks(&[3]);
        let xml = render(&setup);
        assert!(xml.contains(
            "<rowBreaks count=\"2\" manualBreakCount=\"2\"><brk id=\"10\" max=\"16383\" man=\"1\"/>\
<brk id=\"20\" max=\"16383\" man=\"1\"/></rowBreaks>"
        ));
        assert!(xml.contains("<colBreaks count=\"1\" manualBreakCount=\"1\"><brk id=\"3\" max=\"1048575\" man=\"1\"/>"));
    }
}
