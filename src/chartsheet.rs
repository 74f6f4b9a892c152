//! Chartsheets: a workbook tab holding one full-page chart.

use crate::chart::Chart;
use crate::error::{Result, WriteError};
use crate::format::Color;
use crate::page_setup::{PageOrientation, PageSetup};
use crate::protection::PasswordHash;
use crate::validation::validate_sheet_name;
use crate::worksheet::SheetVisibility;
use crate::xml::{XmlWriter, NS_RELATIONSHIPS, NS_SPREADSHEETML};

#[derive(Debug)]
pub struct Chartsheet {
    pub(crate) name: String,
    pub(crate) chart: Option<Chart>,
    pub(crate) page_setup: PageSetup,
    pub(crate) protection: Option<Option<PasswordHash>>,
    pub(crate) tab_color: Color,
    pub(crate) zoom: u16,
    pub(crate) visibility: SheetVisibility,
    pub(crate) active: bool,
    pub(crate) selected: bool,
}

impl Chartsheet {
    pub(crate) fn new(name: &str) -> Self {
        let mut page_setup = PageSetup::new();
        page_setup.set_orientation(PageOrientation::Landscape);
        Self {
            name: name.to_string(),
            chart: None,
            page_setup,
            protection: None,
            tab_color: Color::Default,
            zoom: 100,
            visibility: SheetVisibility::Visible,
            active: false,
            selected: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) -> Result<&mut Chartsheet> {
        validate_sheet_name(name)?;
        self.name = name.to_string();
        Ok(self)
    }

    /// Place the chart on this sheet, replacing any earlier one. The chart
    /// is consumed.
    pub fn set_chart(&mut self, chart: Chart) -> Result<&mut Chartsheet> {
        chart.validate()?;
        self.chart = Some(chart);
        Ok(self)
    }

    pub fn page_setup(&mut self) -> &mut PageSetup {
        &mut self.page_setup
    }

    /// Lock the chart against edits, optionally behind a password.
    pub fn protect(&mut self, password: Option<&str>) -> &mut Chartsheet {
        self.protection = Some(password.filter(|p| !p.is_empty()).map(PasswordHash::legacy));
        self
    }

    pub fn set_tab_color(&mut self, color: Color) -> &mut Chartsheet {
        self.tab_color = color;
        self
    }

    pub fn set_zoom(&mut self, zoom: u16) -> &mut Chartsheet {
        if (10..=400).contains(&zoom) {
            self.zoom = zoom;
        } else {
            log::warn!("zoom {} is outside 10..=400 and was ignored", zoom);
        }
        self
    }

    pub fn set_hidden(&mut self, hidden: bool) -> &mut Chartsheet {
        self.visibility = if hidden {
            SheetVisibility::Hidden
        } else {
            SheetVisibility::Visible
        };
        self
    }

    pub fn set_active(&mut self, enable: bool) -> &mut Chartsheet {
        self.active = enable;
        self
    }

    pub fn set_selected(&mut self, enable: bool) -> &mut Chartsheet {
        self.selected = enable;
        self
    }

    pub(crate) fn is_hidden(&self) -> bool {
        self.visibility != SheetVisibility::Visible
    }

    pub(crate) fn chart_or_err(&self) -> Result<&Chart> {
        self.chart
            .as_ref()
            .ok_or_else(|| WriteError::Parameter(format!("chartsheet '{}' has no chart", self.name)))
    }

    /// `xl/chartsheets/sheetN.xml`; `drawing_rel` points at the drawing
    /// that holds the chart.
    pub(crate) fn assemble_xml(&self, drawing_rel: &str, tab_selected: bool) -> Vec<u8> {
        let mut xml = XmlWriter::with_capacity(1024);
        xml.declaration();
        xml.start_with(
            "chartsheet",
            &[("xmlns", NS_SPREADSHEETML), ("xmlns:r", NS_RELATIONSHIPS)],
        );

        if self.tab_color.is_default() {
            xml.empty("sheetPr");
        } else {
            xml.start("sheetPr");
            let attrs = self.tab_color.style_attributes();
            let attrs: Vec<(&str, &str)> = attrs.iter().map(|(k, v)| (*k, v.as_str())).collect();
            xml.empty_with("tabColor", &attrs);
            xml.end("sheetPr");
        }

        let zoom = self.zoom.to_string();
        let mut view: Vec<(&str, &str)> = Vec::new();
        if tab_selected {
            view.push(("tabSelected", "1"));
        }
        if self.zoom != 100 {
            view.push(("zoomScale", &zoom));
        }
        view.push(("zoomToFit", "1"));
        view.push(("workbookViewId", "0"));
        xml.start("sheetViews");
        xml.empty_with("sheetView", &view);
        xml.end("sheetViews");

        if let Some(password) = &self.protection {
            let hex = match password {
                Some(PasswordHash::Legacy(hash)) => Some(format!("{:X}", hash)),
                _ => None,
            };
            let mut attrs: Vec<(&str, &str)> = Vec::new();
            if let Some(hex) = &hex {
                attrs.push(("password", hex));
            }
            attrs.push(("content", "1"));
            attrs.push(("objects", "1"));
            xml.empty_with("sheetProtection", &attrs);
        }

        let mut buf = xml.into_bytes();
        self.page_setup.write_page_margins(&mut buf);
        self.page_setup.write_page_setup(&mut buf);
        self.page_setup.write_header_footer(&mut buf);
        buf.extend_from_slice(b"<drawing r:id=\"");
        buf.extend_from_slice(drawing_rel.as_bytes());
        buf.extend_from_slice(b"\"/></chartsheet>");
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chartsheet_xml() {
        let mut sheet = Chartsheet::new("Chart1");
        sheet.protect(Some("password")).set_tab_color(Color::BLUE);
        let xml = String::from_utf8(sheet.assemble_xml("rId1", true)).unwrap();
        assert!(xml.contains("<sheetPr><tabColor rgb=\"FF0000FF\"/></sheetPr>"));
        assert!(xml.contains("<sheetView tabSelected=\"1\" zoomToFit=\"1\" workbookViewId=\"0\"/>"));
        assert!(xml.contains("<sheetProtection password=\"83AF\" content=\"1\" objects=\"1\"/>"));
        assert!(xml.contains("<pageSetup orientation=\"landscape\"/>"));
        assert!(xml.ends_with("<drawing r:id=\"rId1\"/></chartsheet>"));
    }

    #[test]
    fn test_chart_is_required() {
        let mut sheet = Chartsheet::new("Chart1");
        assert!(sheet.chart_or_err().is_err());
        assert!(sheet.set_chart(Chart::new_pie()).is_err());
        let mut chart = Chart::new_pie();
        chart.add_series().unwrap().set_values("Sheet1!$A$1:$A$4");
        sheet.set_chart(chart).unwrap();
        assert!(sheet.chart_or_err().is_ok());
    }
}
