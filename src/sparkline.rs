//! In-cell sparklines, stored in the worksheet `extLst` as x14 sparkline
//! groups. Every sparkline added to a sheet becomes its own group.

use crate::chart::ChartEmptyCells;
use crate::error::{Result, WriteError};
use crate::format::Color;
use crate::utility::{cell_ref, format_number, parse_range_ref, quote_sheet_name};
use crate::xml::escape_data_into;

const SPARKLINE_EXT_URI: &str = "{05C60535-1F16-4fd2-B633-F4F36F0B64E0}";
const NS_X14: &str = "http://schemas.microsoft.com/office/spreadsheetml/2009/9/main";
const NS_XM: &str = "http://schemas.microsoft.com/office/excel/2006/main";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SparklineType {
    #[default]
    Line,
    Column,
    WinLose,
}

/// Vertical axis bound: each sparkline on its own, or a fixed value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SparklineAxisBound {
    #[default]
    Individual,
    Custom(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SparklineColors {
    pub series: Color,
    pub negative: Color,
    pub axis: Color,
    pub markers: Color,
    pub first: Color,
    pub last: Color,
    pub high: Color,
    pub low: Color,
}

impl Default for SparklineColors {
    fn default() -> Self {
        Self {
            series: Color::Theme(4, 5),
            negative: Color::Theme(5, 0),
            axis: Color::Rgb(0x000000),
            markers: Color::Theme(4, 5),
            first: Color::Theme(4, 3),
            last: Color::Theme(4, 3),
            high: Color::Theme(4, 0),
            low: Color::Theme(4, 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sparkline {
    pub(crate) range: String,
    pub(crate) sparkline_type: SparklineType,
    pub(crate) show_markers: bool,
    pub(crate) show_high_point: bool,
    pub(crate) show_low_point: bool,
    pub(crate) show_first_point: bool,
    pub(crate) show_last_point: bool,
    pub(crate) show_negative_points: bool,
    pub(crate) show_axis: bool,
    pub(crate) show_hidden_data: bool,
    pub(crate) show_empty_cells_as: ChartEmptyCells,
    pub(crate) right_to_left: bool,
    pub(crate) line_weight: Option<f64>,
    pub(crate) min: SparklineAxisBound,
    pub(crate) max: SparklineAxisBound,
    pub(crate) colors: SparklineColors,
}

impl Sparkline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source data, a single row or column such as `Sheet1!A1:E1`. An
    /// unqualified range refers to the sheet the sparkline is added to.
    pub fn set_range(mut self, range: &str) -> Result<Self> {
        let range = range.trim().trim_start_matches('=');
        let cells = range.rsplit_once('!').map_or(range, |(_, cells)| cells);
        let Some((r1, c1, r2, c2)) = parse_range_ref(cells) else {
            return Err(WriteError::Parameter(format!("invalid sparkline range '{}'", range)));
        };
        if r1 != r2 && c1 != c2 {
            return Err(WriteError::Parameter(format!(
                "sparkline range '{}' must be a single row or column",
                range
            )));
        }
        self.range = range.to_string();
        Ok(self)
    }

    pub fn set_type(mut self, sparkline_type: SparklineType) -> Self {
        self.sparkline_type = sparkline_type;
        self
    }

    pub fn show_markers(mut self, enable: bool) -> Self {
        self.show_markers = enable;
        self
    }

    pub fn show_high_point(mut self, enable: bool) -> Self {
        self.show_high_point = enable;
        self
    }

    pub fn show_low_point(mut self, enable: bool) -> Self {
        self.show_low_point = enable;
        self
    }

    pub fn show_first_point(mut self, enable: bool) -> Self {
        self.show_first_point = enable;
        self
    }

    pub fn show_last_point(mut self, enable: bool) -> Self {
        self.show_last_point = enable;
        self
    }

    pub fn show_negative_points(mut self, enable: bool) -> Self {
        self.show_negative_points = enable;
        self
    }

    pub fn show_axis(mut self, enable: bool) -> Self {
        self.show_axis = enable;
        self
    }

    pub fn show_hidden_data(mut self, enable: bool) -> Self {
        self.show_hidden_data = enable;
        self
    }

    pub fn show_empty_cells_as(mut self, option: ChartEmptyCells) -> Self {
        self.show_empty_cells_as = option;
        self
    }

    pub fn set_right_to_left(mut self, enable: bool) -> Self {
        self.right_to_left = enable;
        self
    }

    /// Line weight in points.
    pub fn set_line_weight(mut self, weight: f64) -> Self {
        if weight > 0.0 {
            self.line_weight = Some(weight);
        }
        self
    }

    pub fn set_custom_min(mut self, value: f64) -> Self {
        self.min = SparklineAxisBound::Custom(value);
        self
    }

    pub fn set_custom_max(mut self, value: f64) -> Self {
        self.max = SparklineAxisBound::Custom(value);
        self
    }

    pub fn set_colors(mut self, colors: SparklineColors) -> Self {
        self.colors = colors;
        self
    }

    pub fn set_series_color(mut self, color: Color) -> Self {
        self.colors.series = color;
        self
    }

    fn qualified_range(&self, sheet_name: &str) -> String {
        if self.range.contains('!') {
            self.range.clone()
        } else {
            format!("{}!{}", quote_sheet_name(sheet_name), self.range)
        }
    }
}

fn push_flag(buf: &mut Vec<u8>, name: &str, on: bool) {
    if on {
        buf.push(b' ');
        buf.extend_from_slice(name.as_bytes());
        buf.extend_from_slice(b"=\"1\"");
    }
}

fn push_color(buf: &mut Vec<u8>, tag: &str, color: &Color) {
    buf.extend_from_slice(b"<x14:");
    buf.extend_from_slice(tag.as_bytes());
    for (name, value) in color.style_attributes() {
        buf.push(b' ');
        buf.extend_from_slice(name.as_bytes());
        buf.extend_from_slice(b"=\"");
        buf.extend_from_slice(value.as_bytes());
        buf.push(b'"');
    }
    buf.extend_from_slice(b"/>");
}

/// The `<ext>` element holding every sparkline group of a sheet. The
/// caller wraps it in `<extLst>`.
pub(crate) fn write_sparkline_ext(buf: &mut Vec<u8>, sheet_name: &str, sparklines: &[(u32, u16, Sparkline)]) {
    if sparklines.is_empty() {
        return;
    }
    buf.extend_from_slice(b"<ext xmlns:x14=\"");
    buf.extend_from_slice(NS_X14.as_bytes());
    buf.extend_from_slice(b"\" uri=\"");
    buf.extend_from_slice(SPARKLINE_EXT_URI.as_bytes());
    buf.extend_from_slice(b"\"><x14:sparklineGroups xmlns:xm=\"");
    buf.extend_from_slice(NS_XM.as_bytes());
    buf.extend_from_slice(b"\">");

    // Excel lists groups newest first.
    for (row, col, sparkline) in sparklines.iter().rev() {
        buf.extend_from_slice(b"<x14:sparklineGroup");
        if let SparklineAxisBound::Custom(max) = sparkline.max {
            buf.extend_from_slice(b" manualMax=\"");
            buf.extend_from_slice(format_number(max).as_bytes());
            buf.push(b'"');
        }
        if let SparklineAxisBound::Custom(min) = sparkline.min {
            buf.extend_from_slice(b" manualMin=\"");
            buf.extend_from_slice(format_number(min).as_bytes());
            buf.push(b'"');
        }
        if let Some(weight) = sparkline.line_weight {
            buf.extend_from_slice(b" lineWeight=\"");
            buf.extend_from_slice(format_number(weight).as_bytes());
            buf.push(b'"');
        }
        match sparkline.sparkline_type {
            SparklineType::Line => {}
            SparklineType::Column => buf.extend_from_slice(b" type=\"column\""),
            SparklineType::WinLose => buf.extend_from_slice(b" type=\"stacked\""),
        }
        buf.extend_from_slice(b" displayEmptyCellsAs=\"");
        buf.extend_from_slice(sparkline.show_empty_cells_as.xml_value().as_bytes());
        buf.push(b'"');
        push_flag(buf, "markers", sparkline.show_markers);
        push_flag(buf, "high", sparkline.show_high_point);
        push_flag(buf, "low", sparkline.show_low_point);
        push_flag(buf, "first", sparkline.show_first_point);
        push_flag(buf, "last", sparkline.show_last_point);
        push_flag(buf, "negative", sparkline.show_negative_points);
        push_flag(buf, "displayXAxis", sparkline.show_axis);
        push_flag(buf, "displayHidden", sparkline.show_hidden_data);
        if matches!(sparkline.min, SparklineAxisBound::Custom(_)) {
            buf.extend_from_slice(b" minAxisType=\"custom\"");
        }
        if matches!(sparkline.max, SparklineAxisBound::Custom(_)) {
            buf.extend_from_slice(b" maxAxisType=\"custom\"");
        }
        push_flag(buf, "rightToLeft", sparkline.right_to_left);
        buf.push(b'>');

        let colors = &sparkline.colors;
        push_color(buf, "colorSeries", &colors.series);
        push_color(buf, "colorNegative", &colors.negative);
        push_color(buf, "colorAxis", &colors.axis);
        push_color(buf, "colorMarkers", &colors.markers);
        push_color(buf, "colorFirst", &colors.first);
        push_color(buf, "colorLast", &colors.last);
        push_color(buf, "colorHigh", &colors.high);
        push_color(buf, "colorLow", &colors.low);

        buf.extend_from_slice(b"<x14:sparklines><x14:sparkline><xm:f>");
        escape_data_into(sparkline.qualified_range(sheet_name).as_bytes(), buf);
        buf.extend_from_slice(b"</xm:f><xm:sqref>");
        buf.extend_from_slice(cell_ref(*row, *col).as_bytes());
        buf.extend_from_slice(b"</xm:sqref></x14:sparkline></x14:sparklines></x14:sparklineGroup>");
    }

    buf.extend_from_slice(b"</x14:sparklineGroups></ext>");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(sheet: &str, sparklines: Vec<(u32, u16, Sparkline)>) -> String {
        let mut buf = Vec::new();
        write_sparkline_ext(&mut buf, sheet, &sparklines);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_range_must_be_one_dimensional() {
        assert!(Sparkline::new().set_range("Sheet1!A1:E1").is_ok());
        assert!(Sparkline::new().set_range("A1:A9").is_ok());
        assert!(Sparkline::new().set_range("A1:B2").is_err());
        assert!(Sparkline::new().set_range("nonsense").is_err());
    }

    #[test]
    fn test_unqualified_range_uses_sheet_name() {
        let spark = Sparkline::new().set_range("A1:E1").unwrap();
        let xml = render("My Data", vec![(0, 5, spark)]);
        assert!(xml.contains("<xm:f>'My Data'!A1:E1</xm:f><xm:sqref>F1</xm:sqref>"));
        assert!(xml.contains("<x14:sparklineGroup displayEmptyCellsAs=\"gap\">"));
        assert!(xml.contains("<x14:colorSeries theme=\"4\" tint=\"-0.499984740745262\"/>"));
        assert!(xml.contains("<x14:colorAxis rgb=\"FF000000\"/>"));
    }

    #[test]
    fn test_group_attributes() {
        let spark = Sparkline::new()
            .set_range("Sheet1!A2:E2")
            .unwrap()
            .set_type(SparklineType::WinLose)
            .show_high_point(true)
            .show_negative_points(true)
            .set_custom_max(10.0)
            .set_line_weight(1.5);
        let xml = render("Sheet1", vec![(1, 5, spark)]);
        assert!(xml.contains(
            "<x14:sparklineGroup manualMax=\"10\" lineWeight=\"1.5\" type=\"stacked\" \
displayEmptyCellsAs=\"gap\" high=\"1\" negative=\"1\" maxAxisType=\"custom\">"
        ));
    }

    #[test]
    fn test_groups_newest_first() {
        let a = Sparkline::new().set_range("A1:C1").unwrap();
        let b = Sparkline::new().set_range("A2:C2").unwrap();
        let xml = render("S", vec![(0, 3, a), (1, 3, b)]);
        let first = xml.find("<xm:sqref>D2</xm:sqref>").unwrap();
        let second = xml.find("<xm:sqref>D1</xm:sqref>").unwrap();
        assert!(first < second);
    }
}
