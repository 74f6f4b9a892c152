//! Charts: a closed set of chart kinds sharing one skeleton (title, legend,
//! plot area, primary and secondary axes, up to 255 series and an optional
//! combined chart), serialized to `xl/charts/chartN.xml`.

pub mod format;
mod writer;

use std::collections::HashSet;

use crate::drawing::ObjectMovement;
use crate::error::{Result, WriteError};
use crate::types::CellRange;
use crate::utility::{parse_range_ref, quote_sheet_name, unquote_sheet_name};
use crate::validation::MAX_CHART_SERIES;

pub use format::{
    ChartFont, ChartFormat, ChartGradientFill, ChartGradientFillType, ChartGradientStop, ChartLine,
    ChartLineDashType, ChartPatternFill, ChartPatternFillType, ChartSolidFill, HasFormatting,
};
pub(crate) use writer::ChartWriter;

// ============================================================================
// Chart kinds
// ============================================================================

/// Chart type and subtype as offered to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartType {
    Area,
    AreaStacked,
    AreaPercentStacked,
    Bar,
    BarStacked,
    BarPercentStacked,
    Column,
    ColumnStacked,
    ColumnPercentStacked,
    Doughnut,
    Line,
    LineStacked,
    LinePercentStacked,
    Pie,
    Radar,
    RadarWithMarkers,
    RadarFilled,
    Scatter,
    ScatterStraight,
    ScatterStraightWithMarkers,
    ScatterSmooth,
    ScatterSmoothWithMarkers,
    Stock,
}

/// The chart family, which decides the XML shape of the plot area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Area,
    Bar,
    Column,
    Line,
    Pie,
    Doughnut,
    Radar,
    Scatter,
    Stock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChartGrouping {
    Standard,
    Clustered,
    Stacked,
    PercentStacked,
}

impl ChartGrouping {
    pub(crate) const fn xml_value(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Clustered => "clustered",
            Self::Stacked => "stacked",
            Self::PercentStacked => "percentStacked",
        }
    }
}

/// What differs between chart kinds: the plot element, axis layout and
/// which series decorations the schema allows.
#[derive(Debug)]
pub(crate) struct KindBehavior {
    pub element: &'static str,
    pub bar_direction: Option<&'static str>,
    pub has_axes: bool,
    /// Scatter charts use a value axis for X.
    pub x_is_value_axis: bool,
    pub x_axis_position: &'static str,
    pub y_axis_position: &'static str,
    pub cross_between: &'static str,
    pub markers: bool,
    pub gap_overlap: bool,
    pub error_bars: bool,
    pub trendlines: bool,
    pub vary_colors: bool,
    pub x_major_gridlines: bool,
    pub y_major_gridlines: bool,
}

const AREA: KindBehavior = KindBehavior {
    element: "c:areaChart",
    bar_direction: None,
    has_axes: true,
    x_is_value_axis: false,
    x_axis_position: "b",
    y_axis_position: "l",
    cross_between: "midCat",
    markers: false,
    gap_overlap: false,
    error_bars: true,
    trendlines: true,
    vary_colors: false,
    x_major_gridlines: false,
    y_major_gridlines: true,
};

const BAR: KindBehavior = KindBehavior {
    element: "c:barChart",
    bar_direction: Some("bar"),
    x_axis_position: "l",
    y_axis_position: "b",
    cross_between: "between",
    gap_overlap: true,
    x_major_gridlines: true,
    y_major_gridlines: false,
    ..AREA
};

const COLUMN: KindBehavior = KindBehavior {
    bar_direction: Some("col"),
    x_axis_position: "b",
    y_axis_position: "l",
    x_major_gridlines: false,
    y_major_gridlines: true,
    ..BAR
};

const LINE: KindBehavior = KindBehavior {
    element: "c:lineChart",
    cross_between: "between",
    markers: true,
    ..AREA
};

const PIE: KindBehavior = KindBehavior {
    element: "c:pieChart",
    bar_direction: None,
    has_axes: false,
    x_is_value_axis: false,
    x_axis_position: "b",
    y_axis_position: "l",
    cross_between: "between",
    markers: false,
    gap_overlap: false,
    error_bars: false,
    trendlines: false,
    vary_colors: true,
    x_major_gridlines: false,
    y_major_gridlines: false,
};

const DOUGHNUT: KindBehavior = KindBehavior {
    element: "c:doughnutChart",
    ..PIE
};

const RADAR: KindBehavior = KindBehavior {
    element: "c:radarChart",
    cross_between: "between",
    markers: true,
    error_bars: false,
    trendlines: false,
    x_major_gridlines: true,
    ..AREA
};

const SCATTER: KindBehavior = KindBehavior {
    element: "c:scatterChart",
    x_is_value_axis: true,
    cross_between: "midCat",
    markers: true,
    ..AREA
};

const STOCK: KindBehavior = KindBehavior {
    element: "c:stockChart",
    cross_between: "between",
    markers: true,
    error_bars: false,
    trendlines: true,
    ..AREA
};

impl ChartKind {
    pub(crate) fn behavior(&self) -> &'static KindBehavior {
        match self {
            ChartKind::Area => &AREA,
            ChartKind::Bar => &BAR,
            ChartKind::Column => &COLUMN,
            ChartKind::Line => &LINE,
            ChartKind::Pie => &PIE,
            ChartKind::Doughnut => &DOUGHNUT,
            ChartKind::Radar => &RADAR,
            ChartKind::Scatter => &SCATTER,
            ChartKind::Stock => &STOCK,
        }
    }
}

impl ChartType {
    pub fn kind(&self) -> ChartKind {
        use ChartType::*;
        match self {
            Area | AreaStacked | AreaPercentStacked => ChartKind::Area,
            Bar | BarStacked | BarPercentStacked => ChartKind::Bar,
            Column | ColumnStacked | ColumnPercentStacked => ChartKind::Column,
            Doughnut => ChartKind::Doughnut,
            Line | LineStacked | LinePercentStacked => ChartKind::Line,
            Pie => ChartKind::Pie,
            Radar | RadarWithMarkers | RadarFilled => ChartKind::Radar,
            Scatter | ScatterStraight | ScatterStraightWithMarkers | ScatterSmooth
            | ScatterSmoothWithMarkers => ChartKind::Scatter,
            Stock => ChartKind::Stock,
        }
    }

    pub(crate) fn grouping(&self) -> ChartGrouping {
        use ChartType::*;
        match self {
            AreaStacked | BarStacked | ColumnStacked | LineStacked => ChartGrouping::Stacked,
            AreaPercentStacked | BarPercentStacked | ColumnPercentStacked | LinePercentStacked => {
                ChartGrouping::PercentStacked
            }
            Bar | Column => ChartGrouping::Clustered,
            _ => ChartGrouping::Standard,
        }
    }

    /// Stacked bar/column charts overlap their series fully.
    pub(crate) fn default_overlap(&self) -> Option<i8> {
        match self.grouping() {
            ChartGrouping::Stacked | ChartGrouping::PercentStacked
                if matches!(self.kind(), ChartKind::Bar | ChartKind::Column) =>
            {
                Some(100)
            }
            _ => None,
        }
    }
}

// ============================================================================
// Ranges and cached data
// ============================================================================

/// A worksheet range used as chart data, e.g. `Sheet1!$A$2:$A$7`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartRange {
    pub(crate) sheet: String,
    pub(crate) range: Option<CellRange>,
    pub(crate) formula: String,
}

impl ChartRange {
    pub fn new_from_range(
        sheet: &str,
        first_row: u32,
        first_col: u16,
        last_row: u32,
        last_col: u16,
    ) -> Self {
        let range = CellRange::new(first_row, first_col, last_row, last_col);
        Self {
            sheet: sheet.to_string(),
            formula: format!("{}!{}", quote_sheet_name(sheet), range.to_a1_abs()),
            range: Some(range),
        }
    }

    /// Parse `=Sheet1!$A$1:$A$5` or `'My Sheet'!A1:A5`. Text that isn't a
    /// sheet-qualified range is kept as a formula without cached data.
    pub fn new_from_string(formula: &str) -> Self {
        let formula = formula.trim();
        let formula = formula.strip_prefix('=').unwrap_or(formula);
        let parsed = formula.rsplit_once('!').and_then(|(sheet, cells)| {
            let (r1, c1, r2, c2) = parse_range_ref(cells)?;
            Some((unquote_sheet_name(sheet), CellRange::new(r1, c1, r2, c2)))
        });
        match parsed {
            Some((sheet, range)) => Self {
                sheet,
                range: Some(range),
                formula: formula.to_string(),
            },
            None => Self {
                sheet: String::new(),
                range: None,
                formula: formula.to_string(),
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.formula.is_empty()
    }

    pub fn formula(&self) -> &str {
        &self.formula
    }
}

impl From<&str> for ChartRange {
    fn from(formula: &str) -> Self {
        ChartRange::new_from_string(formula)
    }
}

impl From<&String> for ChartRange {
    fn from(formula: &String) -> Self {
        ChartRange::new_from_string(formula)
    }
}

impl From<(&str, u32, u16, u32, u16)> for ChartRange {
    fn from(r: (&str, u32, u16, u32, u16)) -> Self {
        ChartRange::new_from_range(r.0, r.1, r.2, r.3, r.4)
    }
}

/// One cached point read back from a worksheet.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ChartCacheValue {
    Number(f64),
    String(String),
    Empty,
}

/// Cached values for every data range of a chart, keyed by formula.
pub(crate) type ChartCache = std::collections::HashMap<String, Vec<ChartCacheValue>>;

/// Text that is either literal or taken from a cell.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ChartText {
    Literal(String),
    Range(ChartRange),
}

impl ChartText {
    fn parse(text: &str) -> Self {
        if text.starts_with('=') {
            ChartText::Range(ChartRange::new_from_string(text))
        } else {
            ChartText::Literal(text.to_string())
        }
    }

    fn range(&self) -> Option<&ChartRange> {
        match self {
            ChartText::Range(r) => Some(r),
            ChartText::Literal(_) => None,
        }
    }
}

// ============================================================================
// Series decorations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartMarkerType {
    #[default]
    Automatic,
    None,
    Square,
    Diamond,
    Triangle,
    X,
    Star,
    ShortDash,
    LongDash,
    Circle,
    PlusSign,
}

impl ChartMarkerType {
    pub(crate) const fn xml_value(&self) -> &'static str {
        match self {
            Self::Automatic => "auto",
            Self::None => "none",
            Self::Square => "square",
            Self::Diamond => "diamond",
            Self::Triangle => "triangle",
            Self::X => "x",
            Self::Star => "star",
            Self::ShortDash => "dot",
            Self::LongDash => "dash",
            Self::Circle => "circle",
            Self::PlusSign => "plus",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartMarker {
    pub(crate) marker_type: ChartMarkerType,
    pub(crate) size: Option<u8>,
    pub(crate) format: ChartFormat,
}

impl ChartMarker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_type(&mut self, marker_type: ChartMarkerType) -> &mut Self {
        self.marker_type = marker_type;
        self
    }

    pub fn set_none(&mut self) -> &mut Self {
        self.marker_type = ChartMarkerType::None;
        self
    }

    /// 2..=72 points.
    pub fn set_size(&mut self, size: u8) -> &mut Self {
        self.size = Some(size.clamp(2, 72));
        self
    }
}

impl HasFormatting for ChartMarker {
    fn format(&self) -> &ChartFormat {
        &self.format
    }

    fn format_mut(&mut self) -> &mut ChartFormat {
        &mut self.format
    }
}

/// Formatting for a single data point (a bar, a pie slice).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartPoint {
    pub(crate) format: ChartFormat,
}

impl ChartPoint {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HasFormatting for ChartPoint {
    fn format(&self) -> &ChartFormat {
        &self.format
    }

    fn format_mut(&mut self) -> &mut ChartFormat {
        &mut self.format
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartDataLabelPosition {
    Center,
    Right,
    Left,
    Above,
    Below,
    InsideBase,
    InsideEnd,
    OutsideEnd,
    BestFit,
}

impl ChartDataLabelPosition {
    pub(crate) const fn xml_value(&self) -> &'static str {
        match self {
            Self::Center => "ctr",
            Self::Right => "r",
            Self::Left => "l",
            Self::Above => "t",
            Self::Below => "b",
            Self::InsideBase => "inBase",
            Self::InsideEnd => "inEnd",
            Self::OutsideEnd => "outEnd",
            Self::BestFit => "bestFit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartDataLabels {
    pub(crate) show_value: bool,
    pub(crate) show_category_name: bool,
    pub(crate) show_series_name: bool,
    pub(crate) show_percentage: bool,
    pub(crate) show_legend_key: bool,
    pub(crate) show_leader_lines: bool,
    pub(crate) position: Option<ChartDataLabelPosition>,
    pub(crate) separator: Option<char>,
    pub(crate) num_format: Option<String>,
    pub(crate) font: ChartFont,
    pub(crate) format: ChartFormat,
}

impl ChartDataLabels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show_value(&mut self) -> &mut Self {
        self.show_value = true;
        self
    }

    pub fn show_category_name(&mut self) -> &mut Self {
        self.show_category_name = true;
        self
    }

    pub fn show_series_name(&mut self) -> &mut Self {
        self.show_series_name = true;
        self
    }

    pub fn show_percentage(&mut self) -> &mut Self {
        self.show_percentage = true;
        self
    }

    pub fn show_legend_key(&mut self) -> &mut Self {
        self.show_legend_key = true;
        self
    }

    pub fn show_leader_lines(&mut self) -> &mut Self {
        self.show_leader_lines = true;
        self
    }

    pub fn set_position(&mut self, position: ChartDataLabelPosition) -> &mut Self {
        self.position = Some(position);
        self
    }

    /// One of `,` `;` `.` ` ` or newline.
    pub fn set_separator(&mut self, separator: char) -> Result<&mut Self> {
        if !matches!(separator, ',' | ';' | '.' | ' ' | '\n') {
            return Err(WriteError::Parameter(format!(
                "unsupported data label separator {:?}",
                separator
            )));
        }
        self.separator = Some(separator);
        Ok(self)
    }

    pub fn set_num_format(&mut self, num_format: &str) -> &mut Self {
        self.num_format = Some(num_format.to_string());
        self
    }

    pub fn set_font(&mut self, font: ChartFont) -> &mut Self {
        self.font = font;
        self
    }
}

impl HasFormatting for ChartDataLabels {
    fn format(&self) -> &ChartFormat {
        &self.format
    }

    fn format_mut(&mut self) -> &mut ChartFormat {
        &mut self.format
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChartTrendlineType {
    Exponential,
    Linear,
    Log,
    /// Period, 2 or more.
    MovingAverage(u8),
    /// Order, 2..=6.
    Polynomial(u8),
    Power,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartTrendline {
    pub(crate) trend_type: ChartTrendlineType,
    pub(crate) name: Option<String>,
    pub(crate) forward: Option<f64>,
    pub(crate) backward: Option<f64>,
    pub(crate) intercept: Option<f64>,
    pub(crate) display_r_squared: bool,
    pub(crate) display_equation: bool,
    pub(crate) format: ChartFormat,
}

impl ChartTrendline {
    pub fn new(trend_type: ChartTrendlineType) -> Result<Self> {
        match trend_type {
            ChartTrendlineType::MovingAverage(p) if p < 2 => {
                return Err(WriteError::Parameter(format!(
                    "moving average period {} must be at least 2",
                    p
                )));
            }
            ChartTrendlineType::Polynomial(o) if !(2..=6).contains(&o) => {
                return Err(WriteError::Parameter(format!(
                    "polynomial order {} outside 2-6",
                    o
                )));
            }
            _ => {}
        }
        Ok(Self {
            trend_type,
            name: None,
            forward: None,
            backward: None,
            intercept: None,
            display_r_squared: false,
            display_equation: false,
            format: ChartFormat::default(),
        })
    }

    pub fn set_name(&mut self, name: &str) -> &mut Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn set_forward_period(&mut self, period: f64) -> &mut Self {
        self.forward = Some(period);
        self
    }

    pub fn set_backward_period(&mut self, period: f64) -> &mut Self {
        self.backward = Some(period);
        self
    }

    pub fn set_intercept(&mut self, intercept: f64) -> &mut Self {
        self.intercept = Some(intercept);
        self
    }

    pub fn display_r_squared(&mut self) -> &mut Self {
        self.display_r_squared = true;
        self
    }

    pub fn display_equation(&mut self) -> &mut Self {
        self.display_equation = true;
        self
    }
}

impl HasFormatting for ChartTrendline {
    fn format(&self) -> &ChartFormat {
        &self.format
    }

    fn format_mut(&mut self) -> &mut ChartFormat {
        &mut self.format
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChartErrorBarsType {
    FixedValue(f64),
    Percentage(f64),
    StandardDeviation(f64),
    StandardError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartErrorBarsDirection {
    #[default]
    Both,
    Minus,
    Plus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartErrorBars {
    pub(crate) bar_type: ChartErrorBarsType,
    pub(crate) direction: ChartErrorBarsDirection,
    pub(crate) end_cap: bool,
    pub(crate) format: ChartFormat,
}

impl ChartErrorBars {
    pub fn new(bar_type: ChartErrorBarsType) -> Self {
        Self {
            bar_type,
            direction: ChartErrorBarsDirection::Both,
            end_cap: true,
            format: ChartFormat::default(),
        }
    }

    pub fn set_direction(&mut self, direction: ChartErrorBarsDirection) -> &mut Self {
        self.direction = direction;
        self
    }

    pub fn set_end_cap(&mut self, end_cap: bool) -> &mut Self {
        self.end_cap = end_cap;
        self
    }
}

impl HasFormatting for ChartErrorBars {
    fn format(&self) -> &ChartFormat {
        &self.format
    }

    fn format_mut(&mut self) -> &mut ChartFormat {
        &mut self.format
    }
}

// ============================================================================
// Series
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartSeries {
    pub(crate) name: Option<ChartText>,
    pub(crate) categories: ChartRange,
    pub(crate) values: ChartRange,
    pub(crate) format: ChartFormat,
    pub(crate) marker: Option<ChartMarker>,
    pub(crate) points: Vec<ChartPoint>,
    pub(crate) data_labels: Option<ChartDataLabels>,
    pub(crate) trendline: Option<ChartTrendline>,
    pub(crate) x_error_bars: Option<ChartErrorBars>,
    pub(crate) y_error_bars: Option<ChartErrorBars>,
    pub(crate) smooth: Option<bool>,
    pub(crate) secondary_axis: bool,
    pub(crate) invert_if_negative: bool,
    pub(crate) explosion: u8,
}

impl ChartSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_categories<T: Into<ChartRange>>(&mut self, range: T) -> &mut Self {
        self.categories = range.into();
        self
    }

    pub fn set_values<T: Into<ChartRange>>(&mut self, range: T) -> &mut Self {
        self.values = range.into();
        self
    }

    /// Literal name, or a cell reference when it starts with `=`.
    pub fn set_name(&mut self, name: &str) -> &mut Self {
        self.name = Some(ChartText::parse(name));
        self
    }

    pub fn set_marker(&mut self, marker: ChartMarker) -> &mut Self {
        self.marker = Some(marker);
        self
    }

    pub fn set_points(&mut self, points: &[ChartPoint]) -> &mut Self {
        self.points = points.to_vec();
        self
    }

    pub fn set_data_labels(&mut self, data_labels: ChartDataLabels) -> &mut Self {
        self.data_labels = Some(data_labels);
        self
    }

    pub fn set_trendline(&mut self, trendline: ChartTrendline) -> &mut Self {
        self.trendline = Some(trendline);
        self
    }

    pub fn set_x_error_bars(&mut self, error_bars: ChartErrorBars) -> &mut Self {
        self.x_error_bars = Some(error_bars);
        self
    }

    pub fn set_y_error_bars(&mut self, error_bars: ChartErrorBars) -> &mut Self {
        self.y_error_bars = Some(error_bars);
        self
    }

    pub fn set_smooth(&mut self, smooth: bool) -> &mut Self {
        self.smooth = Some(smooth);
        self
    }

    pub fn set_secondary_axis(&mut self, secondary: bool) -> &mut Self {
        self.secondary_axis = secondary;
        self
    }

    pub fn set_invert_if_negative(&mut self) -> &mut Self {
        self.invert_if_negative = true;
        self
    }

    /// Pie slice explosion, 0..=400 percent.
    pub fn set_explosion(&mut self, explosion: u8) -> &mut Self {
        self.explosion = explosion;
        self
    }
}

impl HasFormatting for ChartSeries {
    fn format(&self) -> &ChartFormat {
        &self.format
    }

    fn format_mut(&mut self) -> &mut ChartFormat {
        &mut self.format
    }
}

// ============================================================================
// Title, axes, legend
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartTitle {
    pub(crate) text: Option<ChartText>,
    pub(crate) font: ChartFont,
    pub(crate) format: ChartFormat,
    pub(crate) hidden: bool,
    pub(crate) overlay: bool,
}

impl ChartTitle {
    pub fn set_name(&mut self, name: &str) -> &mut Self {
        self.text = Some(ChartText::parse(name));
        self
    }

    pub fn set_font(&mut self, font: ChartFont) -> &mut Self {
        self.font = font;
        self
    }

    /// Suppress the automatic title Excel adds to single-series charts.
    pub fn set_hidden(&mut self) -> &mut Self {
        self.hidden = true;
        self
    }

    pub fn set_overlay(&mut self, overlay: bool) -> &mut Self {
        self.overlay = overlay;
        self
    }
}

impl HasFormatting for ChartTitle {
    fn format(&self) -> &ChartFormat {
        &self.format
    }

    fn format_mut(&mut self) -> &mut ChartFormat {
        &mut self.format
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartAxisTickType {
    None,
    Inside,
    Outside,
    Cross,
}

impl ChartAxisTickType {
    pub(crate) const fn xml_value(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Inside => "in",
            Self::Outside => "out",
            Self::Cross => "cross",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartAxisLabelPosition {
    #[default]
    NextTo,
    High,
    Low,
    None,
}

impl ChartAxisLabelPosition {
    pub(crate) const fn xml_value(&self) -> &'static str {
        match self {
            Self::NextTo => "nextTo",
            Self::High => "high",
            Self::Low => "low",
            Self::None => "none",
        }
    }
}

/// Where the other axis crosses this one.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ChartAxisCrossing {
    #[default]
    Automatic,
    Min,
    Max,
    /// A value on a value axis or a 1-based category index.
    AxisValue(f64),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartAxis {
    pub(crate) title: ChartTitle,
    pub(crate) format: ChartFormat,
    pub(crate) font: ChartFont,
    pub(crate) min: Option<f64>,
    pub(crate) max: Option<f64>,
    pub(crate) major_unit: Option<f64>,
    pub(crate) minor_unit: Option<f64>,
    pub(crate) log_base: Option<u16>,
    pub(crate) reverse: bool,
    pub(crate) hidden: bool,
    pub(crate) major_gridlines: Option<bool>,
    pub(crate) major_gridlines_line: Option<ChartLine>,
    pub(crate) minor_gridlines: bool,
    pub(crate) major_tick_mark: Option<ChartAxisTickType>,
    pub(crate) minor_tick_mark: Option<ChartAxisTickType>,
    pub(crate) label_position: ChartAxisLabelPosition,
    pub(crate) num_format: Option<String>,
    pub(crate) crossing: ChartAxisCrossing,
    pub(crate) position_between_ticks: Option<bool>,
    pub(crate) date_axis: bool,
}

impl ChartAxis {
    pub fn set_name(&mut self, name: &str) -> &mut Self {
        self.title.set_name(name);
        self
    }

    pub fn set_name_font(&mut self, font: ChartFont) -> &mut Self {
        self.title.font = font;
        self
    }

    pub fn set_font(&mut self, font: ChartFont) -> &mut Self {
        self.font = font;
        self
    }

    pub fn set_min(&mut self, min: f64) -> &mut Self {
        self.min = Some(min);
        self
    }

    pub fn set_max(&mut self, max: f64) -> &mut Self {
        self.max = Some(max);
        self
    }

    pub fn set_major_unit(&mut self, unit: f64) -> &mut Self {
        self.major_unit = Some(unit);
        self
    }

    pub fn set_minor_unit(&mut self, unit: f64) -> &mut Self {
        self.minor_unit = Some(unit);
        self
    }

    pub fn set_log_base(&mut self, base: u16) -> Result<&mut Self> {
        if !(2..=1000).contains(&base) {
            return Err(WriteError::Parameter(format!("log base {} outside 2-1000", base)));
        }
        self.log_base = Some(base);
        Ok(self)
    }

    pub fn set_reverse(&mut self) -> &mut Self {
        self.reverse = true;
        self
    }

    pub fn set_hidden(&mut self, hidden: bool) -> &mut Self {
        self.hidden = hidden;
        self
    }

    pub fn set_major_gridlines(&mut self, show: bool) -> &mut Self {
        self.major_gridlines = Some(show);
        self
    }

    pub fn set_major_gridlines_line(&mut self, line: ChartLine) -> &mut Self {
        self.major_gridlines = Some(true);
        self.major_gridlines_line = Some(line);
        self
    }

    pub fn set_minor_gridlines(&mut self, show: bool) -> &mut Self {
        self.minor_gridlines = show;
        self
    }

    pub fn set_major_tick_type(&mut self, tick: ChartAxisTickType) -> &mut Self {
        self.major_tick_mark = Some(tick);
        self
    }

    pub fn set_minor_tick_type(&mut self, tick: ChartAxisTickType) -> &mut Self {
        self.minor_tick_mark = Some(tick);
        self
    }

    pub fn set_label_position(&mut self, position: ChartAxisLabelPosition) -> &mut Self {
        self.label_position = position;
        self
    }

    pub fn set_num_format(&mut self, num_format: &str) -> &mut Self {
        self.num_format = Some(num_format.to_string());
        self
    }

    pub fn set_crossing(&mut self, crossing: ChartAxisCrossing) -> &mut Self {
        self.crossing = crossing;
        self
    }

    pub fn set_position_between_ticks(&mut self, between: bool) -> &mut Self {
        self.position_between_ticks = Some(between);
        self
    }

    /// Treat a category axis as dates.
    pub fn set_date_axis(&mut self, date_axis: bool) -> &mut Self {
        self.date_axis = date_axis;
        self
    }
}

impl HasFormatting for ChartAxis {
    fn format(&self) -> &ChartFormat {
        &self.format
    }

    fn format_mut(&mut self) -> &mut ChartFormat {
        &mut self.format
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartLegendPosition {
    #[default]
    Right,
    Left,
    Top,
    Bottom,
    TopRight,
}

impl ChartLegendPosition {
    pub(crate) const fn xml_value(&self) -> &'static str {
        match self {
            Self::Right => "r",
            Self::Left => "l",
            Self::Top => "t",
            Self::Bottom => "b",
            Self::TopRight => "tr",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartLegend {
    pub(crate) position: ChartLegendPosition,
    pub(crate) hidden: bool,
    pub(crate) overlay: bool,
    pub(crate) deleted_entries: Vec<usize>,
    pub(crate) font: ChartFont,
    pub(crate) format: ChartFormat,
}

impl ChartLegend {
    pub fn set_position(&mut self, position: ChartLegendPosition) -> &mut Self {
        self.position = position;
        self
    }

    pub fn set_hidden(&mut self) -> &mut Self {
        self.hidden = true;
        self
    }

    pub fn set_overlay(&mut self) -> &mut Self {
        self.overlay = true;
        self
    }

    /// Hide the legend entries for these series indices.
    pub fn delete_entries(&mut self, entries: &[usize]) -> &mut Self {
        self.deleted_entries = entries.to_vec();
        self
    }

    pub fn set_font(&mut self, font: ChartFont) -> &mut Self {
        self.font = font;
        self
    }
}

impl HasFormatting for ChartLegend {
    fn format(&self) -> &ChartFormat {
        &self.format
    }

    fn format_mut(&mut self) -> &mut ChartFormat {
        &mut self.format
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartEmptyCells {
    #[default]
    Gaps,
    Zero,
    Connected,
}

impl ChartEmptyCells {
    pub(crate) const fn xml_value(&self) -> &'static str {
        match self {
            Self::Gaps => "gap",
            Self::Zero => "zero",
            Self::Connected => "span",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartDataTable {
    pub(crate) horizontal_borders: bool,
    pub(crate) vertical_borders: bool,
    pub(crate) outline: bool,
    pub(crate) legend_keys: bool,
}

impl Default for ChartDataTable {
    fn default() -> Self {
        Self {
            horizontal_borders: true,
            vertical_borders: true,
            outline: true,
            legend_keys: false,
        }
    }
}

impl ChartDataTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show_legend_keys(mut self) -> Self {
        self.legend_keys = true;
        self
    }

    pub fn set_borders(mut self, horizontal: bool, vertical: bool, outline: bool) -> Self {
        self.horizontal_borders = horizontal;
        self.vertical_borders = vertical;
        self.outline = outline;
        self
    }
}

// ============================================================================
// Chart
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub(crate) chart_type: ChartType,
    pub(crate) series: Vec<ChartSeries>,
    pub(crate) title: ChartTitle,
    pub(crate) x_axis: ChartAxis,
    pub(crate) y_axis: ChartAxis,
    pub(crate) x2_axis: ChartAxis,
    pub(crate) y2_axis: ChartAxis,
    pub(crate) legend: ChartLegend,
    pub(crate) chart_area: ChartFormat,
    pub(crate) plot_area: ChartFormat,
    pub(crate) style: u8,
    pub(crate) width: f64,
    pub(crate) height: f64,
    pub(crate) scale_width: f64,
    pub(crate) scale_height: f64,
    pub(crate) combined: Option<Box<Chart>>,
    pub(crate) show_empty_cells_as: ChartEmptyCells,
    pub(crate) show_hidden_data: bool,
    pub(crate) data_table: Option<ChartDataTable>,
    pub(crate) hole_size: u8,
    pub(crate) first_slice_angle: u16,
    pub(crate) gap: Option<u16>,
    pub(crate) overlap: Option<i8>,
    pub(crate) drop_lines: Option<ChartFormat>,
    pub(crate) high_low_lines: Option<ChartFormat>,
    pub(crate) up_down_bars: bool,
    pub(crate) protect: bool,
    pub(crate) alt_text: String,
    pub(crate) name: String,
    pub(crate) decorative: bool,
    pub(crate) movement: ObjectMovement,
}

impl Chart {
    pub fn new(chart_type: ChartType) -> Self {
        let kind = chart_type.kind();
        let behavior = kind.behavior();
        let mut chart = Self {
            chart_type,
            series: Vec::new(),
            title: ChartTitle::default(),
            x_axis: ChartAxis::default(),
            y_axis: ChartAxis::default(),
            x2_axis: ChartAxis::default(),
            y2_axis: ChartAxis::default(),
            legend: ChartLegend::default(),
            chart_area: ChartFormat::default(),
            plot_area: ChartFormat::default(),
            style: 2,
            width: 480.0,
            height: 288.0,
            scale_width: 1.0,
            scale_height: 1.0,
            combined: None,
            show_empty_cells_as: ChartEmptyCells::Gaps,
            show_hidden_data: false,
            data_table: None,
            hole_size: 50,
            first_slice_angle: 0,
            gap: None,
            overlap: chart_type.default_overlap(),
            drop_lines: None,
            high_low_lines: None,
            up_down_bars: false,
            protect: false,
            alt_text: String::new(),
            name: String::new(),
            decorative: false,
            movement: ObjectMovement::MoveAndSizeWithCells,
        };
        chart.x_axis.major_gridlines = Some(behavior.x_major_gridlines);
        chart.y_axis.major_gridlines = Some(behavior.y_major_gridlines);
        // The secondary category axis is usually invisible and the secondary
        // value axis sits on the far side of the plot.
        chart.x2_axis.hidden = true;
        chart.x2_axis.crossing = ChartAxisCrossing::Max;
        if kind == ChartKind::Stock {
            chart.x_axis.date_axis = true;
            chart.x_axis.num_format = Some("dd/mm/yyyy".to_string());
            chart.high_low_lines = Some(ChartFormat::default());
        }
        chart
    }

    pub fn new_area() -> Self {
        Self::new(ChartType::Area)
    }

    pub fn new_bar() -> Self {
        Self::new(ChartType::Bar)
    }

    pub fn new_column() -> Self {
        Self::new(ChartType::Column)
    }

    pub fn new_doughnut() -> Self {
        Self::new(ChartType::Doughnut)
    }

    pub fn new_line() -> Self {
        Self::new(ChartType::Line)
    }

    pub fn new_pie() -> Self {
        Self::new(ChartType::Pie)
    }

    pub fn new_radar() -> Self {
        Self::new(ChartType::Radar)
    }

    pub fn new_scatter() -> Self {
        Self::new(ChartType::Scatter)
    }

    pub fn new_stock() -> Self {
        Self::new(ChartType::Stock)
    }

    pub fn chart_type(&self) -> ChartType {
        self.chart_type
    }

    pub fn kind(&self) -> ChartKind {
        self.chart_type.kind()
    }

    fn series_total(&self) -> usize {
        self.series.len() + self.combined.as_ref().map_or(0, |c| c.series.len())
    }

    /// Append an empty series and return it for configuration.
    pub fn add_series(&mut self) -> Result<&mut ChartSeries> {
        self.push_series(ChartSeries::new())?;
        let last = self.series.len() - 1;
        Ok(&mut self.series[last])
    }

    pub fn push_series(&mut self, series: ChartSeries) -> Result<&mut Chart> {
        if self.series_total() >= MAX_CHART_SERIES {
            return Err(WriteError::TooManySeries);
        }
        self.series.push(series);
        Ok(self)
    }

    pub fn series(&self) -> &[ChartSeries] {
        &self.series
    }

    pub fn title(&mut self) -> &mut ChartTitle {
        &mut self.title
    }

    pub fn x_axis(&mut self) -> &mut ChartAxis {
        &mut self.x_axis
    }

    pub fn y_axis(&mut self) -> &mut ChartAxis {
        &mut self.y_axis
    }

    pub fn x2_axis(&mut self) -> &mut ChartAxis {
        &mut self.x2_axis
    }

    pub fn y2_axis(&mut self) -> &mut ChartAxis {
        &mut self.y2_axis
    }

    pub fn legend(&mut self) -> &mut ChartLegend {
        &mut self.legend
    }

    pub fn chart_area(&mut self) -> &mut ChartFormat {
        &mut self.chart_area
    }

    pub fn plot_area(&mut self) -> &mut ChartFormat {
        &mut self.plot_area
    }

    /// Built-in chart style, 1..=48.
    pub fn set_style(&mut self, style: u8) -> &mut Chart {
        self.style = style.clamp(1, 48);
        self
    }

    /// Size in pixels.
    pub fn set_size(&mut self, width: f64, height: f64) -> &mut Chart {
        if width > 0.0 && height > 0.0 {
            self.width = width;
            self.height = height;
        }
        self
    }

    pub fn set_scale(&mut self, scale_width: f64, scale_height: f64) -> &mut Chart {
        if scale_width > 0.0 && scale_height > 0.0 {
            self.scale_width = scale_width;
            self.scale_height = scale_height;
        }
        self
    }

    /// Doughnut hole, 10..=90 percent.
    pub fn set_hole_size(&mut self, size: u8) -> &mut Chart {
        self.hole_size = size.clamp(10, 90);
        self
    }

    pub fn set_rotation(&mut self, angle: u16) -> &mut Chart {
        self.first_slice_angle = angle % 361;
        self
    }

    /// Bar/column gap between clusters, 0..=500 percent.
    pub fn set_gap(&mut self, gap: u16) -> &mut Chart {
        self.gap = Some(gap.min(500));
        self
    }

    /// Bar/column series overlap, -100..=100 percent.
    pub fn set_overlap(&mut self, overlap: i8) -> &mut Chart {
        self.overlap = Some(overlap.clamp(-100, 100));
        self
    }

    pub fn show_empty_cells_as(&mut self, option: ChartEmptyCells) -> &mut Chart {
        self.show_empty_cells_as = option;
        self
    }

    pub fn show_hidden_data(&mut self) -> &mut Chart {
        self.show_hidden_data = true;
        self
    }

    pub fn set_data_table(&mut self, table: ChartDataTable) -> &mut Chart {
        self.data_table = Some(table);
        self
    }

    pub fn set_drop_lines(&mut self, format: ChartFormat) -> &mut Chart {
        self.drop_lines = Some(format);
        self
    }

    pub fn set_high_low_lines(&mut self, format: ChartFormat) -> &mut Chart {
        self.high_low_lines = Some(format);
        self
    }

    pub fn set_up_down_bars(&mut self, enable: bool) -> &mut Chart {
        self.up_down_bars = enable;
        self
    }

    pub fn set_protect(&mut self, protect: bool) -> &mut Chart {
        self.protect = protect;
        self
    }

    pub fn set_name(&mut self, name: &str) -> &mut Chart {
        self.name = name.to_string();
        self
    }

    pub fn set_alt_text(&mut self, alt_text: &str) -> &mut Chart {
        self.alt_text = alt_text.to_string();
        self
    }

    pub fn set_decorative(&mut self, decorative: bool) -> &mut Chart {
        self.decorative = decorative;
        self
    }

    pub fn set_object_movement(&mut self, movement: ObjectMovement) -> &mut Chart {
        self.movement = movement;
        self
    }

    /// Draw a second chart in the same plot area. Pie and doughnut charts
    /// cannot be the secondary chart, and combined charts don't nest.
    pub fn combine(&mut self, chart: Chart) -> Result<&mut Chart> {
        if chart.combined.is_some() {
            return Err(WriteError::Parameter(
                "a combined chart cannot itself be combined".to_string(),
            ));
        }
        if matches!(chart.kind(), ChartKind::Pie | ChartKind::Doughnut) {
            return Err(WriteError::Parameter(
                "pie and doughnut charts cannot be combined".to_string(),
            ));
        }
        if self.series.len() + chart.series.len() > MAX_CHART_SERIES {
            return Err(WriteError::TooManySeries);
        }
        self.combined = Some(Box::new(chart));
        Ok(self)
    }

    /// Displayed size in pixels after scaling.
    pub(crate) fn display_size(&self) -> (f64, f64) {
        (self.width * self.scale_width, self.height * self.scale_height)
    }

    pub(crate) fn has_secondary_series(&self) -> bool {
        self.series.iter().any(|s| s.secondary_axis)
    }

    /// Every distinct worksheet range the chart reads, in first-use order.
    /// A range's position in this list is its data id.
    pub(crate) fn data_ranges<'a>(&'a self) -> Vec<&'a ChartRange> {
        let mut seen = HashSet::new();
        let mut ranges = Vec::new();
        let mut push = |r: Option<&'a ChartRange>| {
            if let Some(r) = r {
                if !r.is_empty() && seen.insert(r.formula.clone()) {
                    ranges.push(r);
                }
            }
        };
        self.collect_ranges(&mut push);
        ranges
    }

    fn collect_ranges<'a>(&'a self, push: &mut impl FnMut(Option<&'a ChartRange>)) {
        push(self.title.text.as_ref().and_then(ChartText::range));
        for series in &self.series {
            push(series.name.as_ref().and_then(ChartText::range));
            push(Some(&series.categories));
            push(Some(&series.values));
        }
        for axis in [&self.x_axis, &self.y_axis, &self.x2_axis, &self.y2_axis] {
            push(axis.title.text.as_ref().and_then(ChartText::range));
        }
        if let Some(combined) = &self.combined {
            combined.collect_ranges(push);
        }
    }

    /// Checks run before the chart is stored in a sheet.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.series_total() > MAX_CHART_SERIES {
            return Err(WriteError::TooManySeries);
        }
        if self.series.is_empty() {
            return Err(WriteError::Parameter(
                "chart must contain at least one series".to_string(),
            ));
        }
        for series in &self.series {
            if series.values.is_empty() {
                return Err(WriteError::Parameter(
                    "chart series must have a values range".to_string(),
                ));
            }
        }
        if self.kind() == ChartKind::Stock && self.series.len() < 3 {
            return Err(WriteError::Parameter(
                "stock charts need high, low and close series".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_table() {
        assert_eq!(ChartType::ColumnStacked.kind(), ChartKind::Column);
        assert_eq!(ChartType::ColumnStacked.grouping(), ChartGrouping::Stacked);
        assert_eq!(ChartType::ColumnStacked.default_overlap(), Some(100));
        assert_eq!(ChartType::LineStacked.default_overlap(), None);
        assert_eq!(ChartKind::Bar.behavior().bar_direction, Some("bar"));
        assert_eq!(ChartKind::Column.behavior().bar_direction, Some("col"));
        assert!(!ChartKind::Pie.behavior().has_axes);
        assert!(ChartKind::Scatter.behavior().x_is_value_axis);
        assert_eq!(ChartKind::Doughnut.behavior().element, "c:doughnutChart");
    }

    #[test]
    fn test_range_parsing() {
        let r = ChartRange::new_from_string("='Sales Data'!$B$2:$B$7");
        assert_eq!(r.sheet, "Sales Data");
        assert_eq!(r.range, Some(CellRange::new(1, 1, 6, 1)));
        assert_eq!(r.formula(), "'Sales Data'!$B$2:$B$7");

        let r: ChartRange = ("Sheet1", 0, 0, 4, 0).into();
        assert_eq!(r.formula(), "Sheet1!$A$1:$A$5");

        let r = ChartRange::new_from_string("not a range");
        assert!(r.range.is_none());
    }

    #[test]
    fn test_series_limit() {
        let mut chart = Chart::new_line();
        for _ in 0..MAX_CHART_SERIES {
            chart.add_series().unwrap().set_values("Sheet1!$A$1:$A$3");
        }
        assert!(matches!(chart.add_series(), Err(WriteError::TooManySeries)));
    }

    #[test]
    fn test_data_ids_deduplicate() {
        let mut chart = Chart::new_column();
        chart
            .add_series()
            .unwrap()
            .set_categories("Sheet1!$A$2:$A$4")
            .set_values("Sheet1!$B$2:$B$4")
            .set_name("=Sheet1!$B$1");
        chart
            .add_series()
            .unwrap()
            .set_categories("Sheet1!$A$2:$A$4")
            .set_values("Sheet1!$C$2:$C$4");
        let formulas: Vec<&str> = chart.data_ranges().iter().map(|r| r.formula()).collect();
        assert_eq!(
            formulas,
            ["Sheet1!$B$1", "Sheet1!$A$2:$A$4", "Sheet1!$B$2:$B$4", "Sheet1!$C$2:$C$4"]
        );
    }

    #[test]
    fn test_combine_rules() {
        let mut bar = Chart::new_column();
        assert!(bar.combine(Chart::new_pie()).is_err());
        assert!(bar.combine(Chart::new_line()).is_ok());
        let mut outer = Chart::new_area();
        assert!(outer.combine(bar).is_err());
    }

    #[test]
    fn test_validation() {
        let chart = Chart::new_pie();
        assert!(chart.validate().is_err());
        let mut stock = Chart::new_stock();
        stock.add_series().unwrap().set_values("Sheet1!$B$2:$B$5");
        assert!(stock.validate().is_err());
    }

    #[test]
    fn test_trendline_parameters() {
        assert!(ChartTrendline::new(ChartTrendlineType::Polynomial(7)).is_err());
        assert!(ChartTrendline::new(ChartTrendlineType::MovingAverage(1)).is_err());
        assert!(ChartTrendline::new(ChartTrendlineType::Linear).is_ok());
    }
}
