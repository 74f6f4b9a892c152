//! `xl/charts/chartN.xml` serialization. Element order inside every
//! DrawingML chart type is fixed by the schema, so each writer below emits
//! its children in one straight sequence.

use super::format::{write_rich_text, write_sp_pr, write_tx_pr, ChartFormat};
use super::{
    Chart, ChartAxis, ChartAxisCrossing, ChartCache, ChartCacheValue, ChartDataLabels,
    ChartErrorBars, ChartErrorBarsDirection, ChartErrorBarsType, ChartGrouping, ChartKind,
    ChartMarker, ChartMarkerType, ChartRange, ChartSeries, ChartText, ChartTitle,
    ChartTrendline, ChartTrendlineType, ChartType,
};
use crate::utility::format_number;
use crate::xml::{XmlWriter, NS_CHART, NS_DRAWINGML, NS_RELATIONSHIPS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AxisRole {
    Category,
    Date,
    Value,
}

/// Serializes one chart (plus its combined chart) against resolved cache
/// data. `chart_id` only seeds the axis ids, which must be unique per part.
pub(crate) struct ChartWriter<'a> {
    chart: &'a Chart,
    cache: &'a ChartCache,
    xml: XmlWriter,
    primary_ids: [u32; 2],
    secondary_ids: [u32; 2],
}

impl<'a> ChartWriter<'a> {
    pub(crate) fn new(chart: &'a Chart, chart_id: u32, cache: &'a ChartCache) -> Self {
        let base = (5001 + chart_id) * 10_000;
        Self {
            chart,
            cache,
            xml: XmlWriter::with_capacity(8192),
            primary_ids: [base + 1, base + 2],
            secondary_ids: [base + 3, base + 4],
        }
    }

    pub(crate) fn write(mut self) -> Vec<u8> {
        let chart = self.chart;
        self.xml.declaration();
        self.xml.start_with(
            "c:chartSpace",
            &[("xmlns:c", NS_CHART), ("xmlns:a", NS_DRAWINGML), ("xmlns:r", NS_RELATIONSHIPS)],
        );
        self.xml.val("c:lang", "en-US");
        if chart.style != 2 {
            self.xml.val("c:style", &chart.style.to_string());
        }
        if chart.protect {
            self.xml.empty("c:protection");
        }

        self.xml.start("c:chart");
        if chart.title.text.is_some() {
            self.write_title(&chart.title, 14.0, None);
        } else if chart.title.hidden {
            self.xml.val("c:autoTitleDeleted", "1");
        }
        self.write_plot_area();
        self.write_legend();
        self.xml.val("c:plotVisOnly", if chart.show_hidden_data { "0" } else { "1" });
        self.xml.val("c:dispBlanksAs", chart.show_empty_cells_as.xml_value());
        self.xml.end("c:chart");

        write_sp_pr(&mut self.xml, &chart.chart_area);
        self.write_print_settings();
        self.xml.end("c:chartSpace");
        self.xml.into_bytes()
    }

    fn cached(&self, range: &ChartRange) -> &'a [ChartCacheValue] {
        self.cache.get(&range.formula).map(Vec::as_slice).unwrap_or(&[])
    }

    // ------------------------------------------------------------------------
    // Titles
    // ------------------------------------------------------------------------

    fn write_title(&mut self, title: &ChartTitle, default_size: f64, rotation: Option<i16>) {
        let Some(text) = &title.text else {
            return;
        };
        let mut font = title.font.clone();
        if font.size.is_none() {
            font.size = Some(default_size);
        }
        if font.rotation.is_none() {
            font.rotation = rotation;
        }

        self.xml.start("c:title");
        match text {
            ChartText::Literal(text) => {
                self.xml.start("c:tx");
                write_rich_text(&mut self.xml, text, &font, true);
                self.xml.end("c:tx");
            }
            ChartText::Range(range) => {
                self.xml.start("c:tx");
                self.write_str_ref(range);
                self.xml.end("c:tx");
            }
        }
        self.xml.empty("c:layout");
        self.xml.val("c:overlay", if title.overlay { "1" } else { "0" });
        write_sp_pr(&mut self.xml, &title.format);
        if matches!(text, ChartText::Range(_)) {
            write_tx_pr(&mut self.xml, &font);
        }
        self.xml.end("c:title");
    }

    // ------------------------------------------------------------------------
    // Plot area
    // ------------------------------------------------------------------------

    fn write_plot_area(&mut self) {
        let chart = self.chart;
        let behavior = chart.kind().behavior();
        self.xml.start("c:plotArea");
        self.xml.empty("c:layout");

        // Primary groups first, then secondary, so Excel draws the secondary
        // series on top. With no primary series at all, the secondary ones
        // own the primary axes; an axis pair no group references is corrupt.
        let offset = chart.series.len();
        let primary = self.has_primary();
        if !primary {
            self.write_chart_group(chart, 0, true, self.primary_ids);
            if let Some(combined) = chart.combined.as_deref() {
                self.write_chart_group(combined, offset, true, self.primary_ids);
            }
        } else {
            self.write_chart_group(chart, 0, false, self.primary_ids);
            if let Some(combined) = chart.combined.as_deref() {
                self.write_chart_group(combined, offset, false, self.primary_ids);
            }
        }
        let secondary = primary && self.has_secondary();
        if secondary {
            self.write_chart_group(chart, 0, true, self.secondary_ids);
            if let Some(combined) = chart.combined.as_deref() {
                self.write_chart_group(combined, offset, true, self.secondary_ids);
            }
        }

        if behavior.has_axes {
            let ids = self.primary_ids;
            self.write_axes(&chart.x_axis, &chart.y_axis, ids, false);
            if secondary {
                let ids = self.secondary_ids;
                self.write_axes(&chart.x2_axis, &chart.y2_axis, ids, true);
            }
            self.write_data_table();
        }
        write_sp_pr(&mut self.xml, &chart.plot_area);
        self.xml.end("c:plotArea");
    }

    fn has_primary(&self) -> bool {
        let any_primary = |c: &Chart| c.series.iter().any(|s| !s.secondary_axis);
        any_primary(self.chart) || self.chart.combined.as_deref().is_some_and(any_primary)
    }

    fn has_secondary(&self) -> bool {
        self.chart.has_secondary_series()
            || self.chart.combined.as_deref().is_some_and(Chart::has_secondary_series)
    }

    /// One `<c:xxxChart>` element holding the series of `chart` that sit on
    /// the given axis pair. `idx_offset` keeps series indices unique across a
    /// combined chart.
    fn write_chart_group(&mut self, chart: &Chart, idx_offset: usize, secondary: bool, axis_ids: [u32; 2]) {
        let series: Vec<(usize, &ChartSeries)> = chart
            .series
            .iter()
            .enumerate()
            .filter(|(_, s)| s.secondary_axis == secondary)
            .map(|(i, s)| (i + idx_offset, s))
            .collect();
        if series.is_empty() {
            return;
        }

        let kind = chart.kind();
        let behavior = kind.behavior();
        let chart_type = chart.chart_type;
        self.xml.start(behavior.element);

        match kind {
            ChartKind::Bar | ChartKind::Column => {
                self.xml.val("c:barDir", behavior.bar_direction.unwrap_or("col"));
                self.xml.val("c:grouping", chart_type.grouping().xml_value());
            }
            ChartKind::Line | ChartKind::Area => {
                self.xml.val("c:grouping", chart_type.grouping().xml_value());
            }
            ChartKind::Radar => {
                let style = if chart_type == ChartType::RadarFilled { "filled" } else { "marker" };
                self.xml.val("c:radarStyle", style);
            }
            ChartKind::Scatter => {
                let style = match chart_type {
                    ChartType::ScatterSmooth | ChartType::ScatterSmoothWithMarkers => "smoothMarker",
                    _ => "lineMarker",
                };
                self.xml.val("c:scatterStyle", style);
            }
            ChartKind::Pie | ChartKind::Doughnut | ChartKind::Stock => {}
        }
        if behavior.vary_colors {
            self.xml.val("c:varyColors", "1");
        }

        for (idx, s) in &series {
            self.write_series(chart, *idx, s);
        }

        match kind {
            ChartKind::Bar | ChartKind::Column => {
                if let Some(gap) = chart.gap {
                    self.xml.val("c:gapWidth", &gap.to_string());
                }
                if let Some(overlap) = chart.overlap {
                    self.xml.val("c:overlap", &overlap.to_string());
                }
            }
            ChartKind::Line | ChartKind::Stock => {
                self.write_line_decorations(chart, true);
                if kind == ChartKind::Line {
                    self.xml.val("c:marker", "1");
                }
            }
            ChartKind::Area => {
                self.write_line_decorations(chart, false);
            }
            ChartKind::Pie | ChartKind::Doughnut => {
                self.xml.val("c:firstSliceAng", &chart.first_slice_angle.to_string());
                if kind == ChartKind::Doughnut {
                    self.xml.val("c:holeSize", &chart.hole_size.to_string());
                }
            }
            ChartKind::Radar | ChartKind::Scatter => {}
        }

        if behavior.has_axes {
            self.xml.val("c:axId", &axis_ids[0].to_string());
            self.xml.val("c:axId", &axis_ids[1].to_string());
        }
        self.xml.end(behavior.element);
    }

    fn write_line_decorations(&mut self, chart: &Chart, high_low_and_bars: bool) {
        if let Some(format) = &chart.drop_lines {
            self.write_lines_element("c:dropLines", format);
        }
        if !high_low_and_bars {
            return;
        }
        if let Some(format) = &chart.high_low_lines {
            self.write_lines_element("c:hiLowLines", format);
        }
        if chart.up_down_bars {
            self.xml.start("c:upDownBars");
            self.xml.val("c:gapWidth", "150");
            self.xml.empty("c:upBars");
            self.xml.empty("c:downBars");
            self.xml.end("c:upDownBars");
        }
    }

    fn write_lines_element(&mut self, tag: &str, format: &ChartFormat) {
        if format.is_empty() {
            self.xml.empty(tag);
        } else {
            self.xml.start(tag);
            write_sp_pr(&mut self.xml, format);
            self.xml.end(tag);
        }
    }

    // ------------------------------------------------------------------------
    // Series
    // ------------------------------------------------------------------------

    fn write_series(&mut self, chart: &Chart, idx: usize, series: &ChartSeries) {
        let kind = chart.kind();
        let behavior = kind.behavior();
        let idx_str = idx.to_string();

        self.xml.start("c:ser");
        self.xml.val("c:idx", &idx_str);
        self.xml.val("c:order", &idx_str);
        match &series.name {
            Some(ChartText::Literal(name)) => {
                self.xml.start("c:tx");
                self.xml.data("c:v", name);
                self.xml.end("c:tx");
            }
            Some(ChartText::Range(range)) => {
                self.xml.start("c:tx");
                self.write_str_ref(range);
                self.xml.end("c:tx");
            }
            None => {}
        }
        self.write_series_sp_pr(chart, series);

        match kind {
            ChartKind::Bar | ChartKind::Column => {
                if series.invert_if_negative {
                    self.xml.val("c:invertIfNegative", "1");
                }
            }
            ChartKind::Pie | ChartKind::Doughnut => {
                if series.explosion > 0 {
                    self.xml.val("c:explosion", &series.explosion.to_string());
                }
            }
            _ => {}
        }
        if behavior.markers {
            self.write_series_marker(chart.chart_type, series.marker.as_ref());
        }
        self.write_points(kind, series);
        if let Some(labels) = &series.data_labels {
            self.write_data_labels(labels, kind);
        }
        if behavior.trendlines {
            if let Some(trendline) = &series.trendline {
                self.write_trendline(trendline);
            }
        }
        if behavior.error_bars {
            if kind == ChartKind::Scatter {
                if let Some(bars) = &series.x_error_bars {
                    self.write_error_bars(bars, Some("x"));
                }
            }
            if let Some(bars) = &series.y_error_bars {
                let direction = (kind == ChartKind::Scatter).then_some("y");
                self.write_error_bars(bars, direction);
            }
        }

        if behavior.x_is_value_axis {
            self.write_category_data("c:xVal", &series.categories);
            self.write_value_data("c:yVal", &series.values);
        } else {
            self.write_category_data("c:cat", &series.categories);
            self.write_value_data("c:val", &series.values);
        }

        let default_smooth = matches!(
            chart.chart_type,
            ChartType::ScatterSmooth | ChartType::ScatterSmoothWithMarkers
        );
        if matches!(kind, ChartKind::Line | ChartKind::Scatter | ChartKind::Stock)
            && series.smooth.unwrap_or(default_smooth)
        {
            self.xml.val("c:smooth", "1");
        }
        self.xml.end("c:ser");
    }

    /// Marker-only scatter and stock series hide their connecting line
    /// unless the caller formatted it.
    fn write_series_sp_pr(&mut self, chart: &Chart, series: &ChartSeries) {
        let hide_line = matches!(chart.chart_type, ChartType::Scatter | ChartType::Stock);
        if hide_line && series.format.is_empty() {
            self.xml.start("c:spPr");
            self.xml.start_with("a:ln", &[("w", "28575")]);
            self.xml.empty("a:noFill");
            self.xml.end("a:ln");
            self.xml.end("c:spPr");
        } else {
            write_sp_pr(&mut self.xml, &series.format);
        }
    }

    fn write_series_marker(&mut self, chart_type: ChartType, marker: Option<&ChartMarker>) {
        let hidden_by_default = matches!(
            chart_type,
            ChartType::ScatterStraight
                | ChartType::ScatterSmooth
                | ChartType::Radar
                | ChartType::RadarFilled
                | ChartType::Stock
        );
        match marker {
            Some(marker) => self.write_marker(marker),
            None if hidden_by_default => {
                self.xml.start("c:marker");
                self.xml.val("c:symbol", "none");
                self.xml.end("c:marker");
            }
            None => {}
        }
    }

    fn write_marker(&mut self, marker: &ChartMarker) {
        self.xml.start("c:marker");
        if marker.marker_type != ChartMarkerType::Automatic {
            self.xml.val("c:symbol", marker.marker_type.xml_value());
        }
        if let Some(size) = marker.size {
            self.xml.val("c:size", &size.to_string());
        }
        write_sp_pr(&mut self.xml, &marker.format);
        self.xml.end("c:marker");
    }

    fn write_points(&mut self, kind: ChartKind, series: &ChartSeries) {
        for (idx, point) in series.points.iter().enumerate() {
            if point.format.is_empty() {
                continue;
            }
            self.xml.start("c:dPt");
            self.xml.val("c:idx", &idx.to_string());
            match kind {
                ChartKind::Bar | ChartKind::Column => self.xml.val("c:invertIfNegative", "0"),
                ChartKind::Pie | ChartKind::Doughnut => self.xml.val("c:bubble3D", "0"),
                _ => {}
            }
            write_sp_pr(&mut self.xml, &point.format);
            self.xml.end("c:dPt");
        }
    }

    fn write_data_labels(&mut self, labels: &ChartDataLabels, kind: ChartKind) {
        self.xml.start("c:dLbls");
        if let Some(num_format) = &labels.num_format {
            self.xml.empty_with("c:numFmt", &[("formatCode", num_format), ("sourceLinked", "0")]);
        }
        write_sp_pr(&mut self.xml, &labels.format);
        write_tx_pr(&mut self.xml, &labels.font);
        if let Some(position) = labels.position {
            self.xml.val("c:dLblPos", position.xml_value());
        }
        let flags = [
            ("c:showLegendKey", labels.show_legend_key),
            ("c:showVal", labels.show_value),
            ("c:showCatName", labels.show_category_name),
            ("c:showSerName", labels.show_series_name),
            ("c:showPercent", labels.show_percentage),
        ];
        for (tag, on) in flags {
            if on {
                self.xml.val(tag, "1");
            }
        }
        if let Some(separator) = labels.separator {
            let text = match separator {
                ',' => ", ",
                ';' => "; ",
                '.' => ". ",
                '\n' => "\n",
                _ => " ",
            };
            self.xml.data("c:separator", text);
        }
        if labels.show_leader_lines && matches!(kind, ChartKind::Pie | ChartKind::Doughnut) {
            self.xml.val("c:showLeaderLines", "1");
        }
        self.xml.end("c:dLbls");
    }

    fn write_trendline(&mut self, trendline: &ChartTrendline) {
        self.xml.start("c:trendline");
        if let Some(name) = &trendline.name {
            self.xml.data("c:name", name);
        }
        write_sp_pr(&mut self.xml, &trendline.format);
        let (trend_type, order, period) = match trendline.trend_type {
            ChartTrendlineType::Exponential => ("exp", None, None),
            ChartTrendlineType::Linear => ("linear", None, None),
            ChartTrendlineType::Log => ("log", None, None),
            ChartTrendlineType::MovingAverage(p) => ("movingAvg", None, Some(p)),
            ChartTrendlineType::Polynomial(o) => ("poly", Some(o), None),
            ChartTrendlineType::Power => ("power", None, None),
        };
        self.xml.val("c:trendlineType", trend_type);
        if let Some(order) = order {
            self.xml.val("c:order", &order.to_string());
        }
        if let Some(period) = period {
            self.xml.val("c:period", &period.to_string());
        }
        if let Some(forward) = trendline.forward {
            self.xml.val("c:forward", &format_number(forward));
        }
        if let Some(backward) = trendline.backward {
            self.xml.val("c:backward", &format_number(backward));
        }
        if let Some(intercept) = trendline.intercept {
            self.xml.val("c:intercept", &format_number(intercept));
        }
        if trendline.display_r_squared {
            self.xml.val("c:dispRSqr", "1");
        }
        if trendline.display_equation {
            self.xml.val("c:dispEq", "1");
        }
        if trendline.display_r_squared || trendline.display_equation {
            self.xml.start("c:trendlineLbl");
            self.xml.empty_with("c:numFmt", &[("formatCode", "General"), ("sourceLinked", "0")]);
            self.xml.end("c:trendlineLbl");
        }
        self.xml.end("c:trendline");
    }

    fn write_error_bars(&mut self, bars: &ChartErrorBars, direction: Option<&str>) {
        self.xml.start("c:errBars");
        if let Some(direction) = direction {
            self.xml.val("c:errDir", direction);
        }
        let bar_type = match bars.direction {
            ChartErrorBarsDirection::Both => "both",
            ChartErrorBarsDirection::Minus => "minus",
            ChartErrorBarsDirection::Plus => "plus",
        };
        self.xml.val("c:errBarType", bar_type);
        let (val_type, value) = match bars.bar_type {
            ChartErrorBarsType::FixedValue(v) => ("fixedVal", Some(v)),
            ChartErrorBarsType::Percentage(v) => ("percentage", Some(v)),
            ChartErrorBarsType::StandardDeviation(v) => ("stdDev", Some(v)),
            ChartErrorBarsType::StandardError => ("stdErr", None),
        };
        self.xml.val("c:errValType", val_type);
        if !bars.end_cap {
            self.xml.val("c:noEndCap", "1");
        }
        if let Some(value) = value {
            self.xml.val("c:val", &format_number(value));
        }
        write_sp_pr(&mut self.xml, &bars.format);
        self.xml.end("c:errBars");
    }

    // ------------------------------------------------------------------------
    // Data references and caches
    // ------------------------------------------------------------------------

    fn write_str_ref(&mut self, range: &ChartRange) {
        let values = self.cached(range);
        self.xml.start("c:strRef");
        self.xml.data("c:f", &range.formula);
        if !values.is_empty() {
            self.write_str_cache(values);
        }
        self.xml.end("c:strRef");
    }

    fn write_str_cache(&mut self, values: &[ChartCacheValue]) {
        self.xml.start("c:strCache");
        self.xml.val("c:ptCount", &values.len().to_string());
        for (idx, value) in values.iter().enumerate() {
            let text = match value {
                ChartCacheValue::String(s) => s.clone(),
                ChartCacheValue::Number(n) => format_number(*n),
                ChartCacheValue::Empty => continue,
            };
            self.xml.start_with("c:pt", &[("idx", &idx.to_string())]);
            self.xml.data("c:v", &text);
            self.xml.end("c:pt");
        }
        self.xml.end("c:strCache");
    }

    fn write_num_cache(&mut self, values: &[ChartCacheValue]) {
        self.xml.start("c:numCache");
        self.xml.data("c:formatCode", "General");
        self.xml.val("c:ptCount", &values.len().to_string());
        for (idx, value) in values.iter().enumerate() {
            if let ChartCacheValue::Number(n) = value {
                self.xml.start_with("c:pt", &[("idx", &idx.to_string())]);
                self.xml.data("c:v", &format_number(*n));
                self.xml.end("c:pt");
            }
        }
        self.xml.end("c:numCache");
    }

    /// Categories are numeric only if every cached point is a number.
    fn write_category_data(&mut self, tag: &str, range: &ChartRange) {
        if range.is_empty() {
            return;
        }
        let values = self.cached(range);
        let numeric = !values.is_empty()
            && values.iter().all(|v| matches!(v, ChartCacheValue::Number(_)));
        self.xml.start(tag);
        if numeric {
            self.xml.start("c:numRef");
            self.xml.data("c:f", &range.formula);
            self.write_num_cache(values);
            self.xml.end("c:numRef");
        } else {
            self.write_str_ref(range);
        }
        self.xml.end(tag);
    }

    fn write_value_data(&mut self, tag: &str, range: &ChartRange) {
        let values = self.cached(range);
        self.xml.start(tag);
        self.xml.start("c:numRef");
        self.xml.data("c:f", &range.formula);
        if !values.is_empty() {
            self.write_num_cache(values);
        }
        self.xml.end("c:numRef");
        self.xml.end(tag);
    }

    // ------------------------------------------------------------------------
    // Axes
    // ------------------------------------------------------------------------

    fn write_axes(&mut self, x_axis: &ChartAxis, y_axis: &ChartAxis, ids: [u32; 2], secondary: bool) {
        let behavior = self.chart.kind().behavior();
        let x_role = if behavior.x_is_value_axis {
            AxisRole::Value
        } else if x_axis.date_axis {
            AxisRole::Date
        } else {
            AxisRole::Category
        };
        let (x_pos, y_pos) = if secondary {
            (behavior.x_axis_position, opposite(behavior.y_axis_position))
        } else {
            (behavior.x_axis_position, behavior.y_axis_position)
        };
        let horizontal_y = matches!(y_pos, "b" | "t");

        // Each axis records where the *other* axis crosses it.
        self.write_axis(x_axis, x_role, ids[0], ids[1], x_pos, y_axis, !horizontal_y);
        self.write_axis(y_axis, AxisRole::Value, ids[1], ids[0], y_pos, x_axis, horizontal_y);
    }

    #[allow(clippy::too_many_arguments)]
    fn write_axis(
        &mut self,
        axis: &ChartAxis,
        role: AxisRole,
        id: u32,
        cross_id: u32,
        position: &str,
        cross_axis: &ChartAxis,
        horizontal: bool,
    ) {
        let tag = match role {
            AxisRole::Category => "c:catAx",
            AxisRole::Date => "c:dateAx",
            AxisRole::Value => "c:valAx",
        };
        self.xml.start(tag);
        self.xml.val("c:axId", &id.to_string());

        self.xml.start("c:scaling");
        if let Some(base) = axis.log_base {
            self.xml.val("c:logBase", &base.to_string());
        }
        self.xml.val("c:orientation", if axis.reverse { "maxMin" } else { "minMax" });
        if let Some(max) = axis.max {
            self.xml.val("c:max", &format_number(max));
        }
        if let Some(min) = axis.min {
            self.xml.val("c:min", &format_number(min));
        }
        self.xml.end("c:scaling");

        if axis.hidden {
            self.xml.val("c:delete", "1");
        }
        self.xml.val("c:axPos", position);

        if axis.major_gridlines.unwrap_or(false) {
            match &axis.major_gridlines_line {
                Some(line) => {
                    let format = ChartFormat {
                        line: Some(line.clone()),
                        ..ChartFormat::default()
                    };
                    self.xml.start("c:majorGridlines");
                    write_sp_pr(&mut self.xml, &format);
                    self.xml.end("c:majorGridlines");
                }
                None => self.xml.empty("c:majorGridlines"),
            }
        }
        if axis.minor_gridlines {
            self.xml.empty("c:minorGridlines");
        }

        let rotation = (!horizontal).then_some(-90);
        self.write_title(&axis.title, 10.0, rotation);

        match (&axis.num_format, role) {
            (Some(code), AxisRole::Date) => {
                self.xml.empty_with("c:numFmt", &[("formatCode", code), ("sourceLinked", "1")])
            }
            (Some(code), _) => {
                self.xml.empty_with("c:numFmt", &[("formatCode", code), ("sourceLinked", "0")])
            }
            (None, AxisRole::Value) => {
                let code = if self.chart.chart_type.grouping() == ChartGrouping::PercentStacked {
                    "0%"
                } else {
                    "General"
                };
                self.xml.empty_with("c:numFmt", &[("formatCode", code), ("sourceLinked", "1")]);
            }
            (None, _) => {}
        }
        if let Some(tick) = axis.major_tick_mark {
            self.xml.val("c:majorTickMark", tick.xml_value());
        }
        if let Some(tick) = axis.minor_tick_mark {
            self.xml.val("c:minorTickMark", tick.xml_value());
        }
        self.xml.val("c:tickLblPos", axis.label_position.xml_value());
        write_sp_pr(&mut self.xml, &axis.format);
        write_tx_pr(&mut self.xml, &axis.font);

        self.xml.val("c:crossAx", &cross_id.to_string());
        match cross_axis.crossing {
            ChartAxisCrossing::Automatic => self.xml.val("c:crosses", "autoZero"),
            ChartAxisCrossing::Min => self.xml.val("c:crosses", "min"),
            ChartAxisCrossing::Max => self.xml.val("c:crosses", "max"),
            ChartAxisCrossing::AxisValue(v) => self.xml.val("c:crossesAt", &format_number(v)),
        }

        match role {
            AxisRole::Category => {
                self.xml.val("c:auto", "1");
                self.xml.val("c:lblAlgn", "ctr");
                self.xml.val("c:lblOffset", "100");
                self.xml.val("c:noMultiLvlLbl", "0");
            }
            AxisRole::Date => {
                self.xml.val("c:auto", "1");
                self.xml.val("c:lblOffset", "100");
                self.write_units(axis);
            }
            AxisRole::Value => {
                let between = match cross_axis.position_between_ticks {
                    Some(true) => "between",
                    Some(false) => "midCat",
                    None => self.chart.kind().behavior().cross_between,
                };
                self.xml.val("c:crossBetween", between);
                self.write_units(axis);
            }
        }
        self.xml.end(tag);
    }

    fn write_units(&mut self, axis: &ChartAxis) {
        if let Some(unit) = axis.major_unit {
            self.xml.val("c:majorUnit", &format_number(unit));
        }
        if let Some(unit) = axis.minor_unit {
            self.xml.val("c:minorUnit", &format_number(unit));
        }
    }

    fn write_data_table(&mut self) {
        let Some(table) = self.chart.data_table else {
            return;
        };
        let flag = |on: bool| if on { "1" } else { "0" };
        self.xml.start("c:dTable");
        self.xml.val("c:showHorzBorder", flag(table.horizontal_borders));
        self.xml.val("c:showVertBorder", flag(table.vertical_borders));
        self.xml.val("c:showOutline", flag(table.outline));
        self.xml.val("c:showKeys", flag(table.legend_keys));
        self.xml.end("c:dTable");
    }

    // ------------------------------------------------------------------------
    // Legend and print settings
    // ------------------------------------------------------------------------

    fn write_legend(&mut self) {
        let legend = &self.chart.legend;
        if legend.hidden {
            return;
        }
        self.xml.start("c:legend");
        self.xml.val("c:legendPos", legend.position.xml_value());
        for idx in &legend.deleted_entries {
            self.xml.start("c:legendEntry");
            self.xml.val("c:idx", &idx.to_string());
            self.xml.val("c:delete", "1");
            self.xml.end("c:legendEntry");
        }
        self.xml.empty("c:layout");
        if legend.overlay {
            self.xml.val("c:overlay", "1");
        }
        write_sp_pr(&mut self.xml, &legend.format);
        write_tx_pr(&mut self.xml, &legend.font);
        self.xml.end("c:legend");
    }

    fn write_print_settings(&mut self) {
        self.xml.start("c:printSettings");
        self.xml.empty("c:headerFooter");
        self.xml.empty_with(
            "c:pageMargins",
            &[
                ("b", "0.75"),
                ("l", "0.7"),
                ("r", "0.7"),
                ("t", "0.75"),
                ("header", "0.3"),
                ("footer", "0.3"),
            ],
        );
        self.xml.empty("c:pageSetup");
        self.xml.end("c:printSettings");
    }
}

fn opposite(position: &'static str) -> &'static str {
    match position {
        "l" => "r",
        "r" => "l",
        "b" => "t",
        _ => "b",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::format::{ChartLine, ChartSolidFill, HasFormatting};
    use crate::chart::{ChartDataLabelPosition, ChartLegendPosition};
    use crate::format::Color;
    use std::collections::HashMap;

    fn render(chart: &Chart, cache: &ChartCache) -> String {
        String::from_utf8(ChartWriter::new(chart, 0, cache).write()).unwrap()
    }

    fn column_chart() -> (Chart, ChartCache) {
        let mut chart = Chart::new_column();
        chart
            .add_series()
            .unwrap()
            .set_categories("Sheet1!$A$2:$A$4")
            .set_values("Sheet1!$B$2:$B$4")
            .set_name("=Sheet1!$B$1");
        let mut cache = HashMap::new();
        cache.insert(
            "Sheet1!$A$2:$A$4".to_string(),
            vec![
                ChartCacheValue::String("North".into()),
                ChartCacheValue::String("South".into()),
                ChartCacheValue::Empty,
            ],
        );
        cache.insert(
            "Sheet1!$B$2:$B$4".to_string(),
            vec![
                ChartCacheValue::Number(10.0),
                ChartCacheValue::Number(2.5),
                ChartCacheValue::Number(7.0),
            ],
        );
        cache.insert("Sheet1!$B$1".to_string(), vec![ChartCacheValue::String("Sales".into())]);
        (chart, cache)
    }

    fn position(haystack: &str, needle: &str) -> usize {
        haystack.find(needle).unwrap_or_else(|| panic!("missing {}", needle))
    }

    #[test]
    fn test_chart_space_order() {
        let (mut chart, cache) = column_chart();
        chart.title().set_name("Quarterly");
        let xml = render(&chart, &cache);
        let order = [
            "<c:lang",
            "<c:chart>",
            "<c:title>",
            "<c:plotArea>",
            "<c:barChart>",
            "<c:catAx>",
            "<c:valAx>",
            "</c:plotArea>",
            "<c:legend>",
            "<c:plotVisOnly",
            "<c:dispBlanksAs",
            "</c:chart>",
            "<c:printSettings>",
        ];
        let positions: Vec<usize> = order.iter().map(|n| position(&xml, n)).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", xml);
        assert!(!xml.contains("<c:style"));
    }

    #[test]
    fn test_bar_series_caches() {
        let (chart, cache) = column_chart();
        let xml = render(&chart, &cache);
        assert!(xml.contains("<c:barDir val=\"col\"/><c:grouping val=\"clustered\"/>"));
        assert!(xml.contains(
            "<c:tx><c:strRef><c:f>Sheet1!$B$1</c:f><c:strCache><c:ptCount val=\"1\"/><c:pt idx=\"0\"><c:v>Sales</c:v></c:pt></c:strCache></c:strRef></c:tx>"
        ));
        assert!(xml.contains("<c:cat><c:strRef><c:f>Sheet1!$A$2:$A$4</c:f><c:strCache><c:ptCount val=\"3\"/>"));
        assert!(!xml.contains("<c:pt idx=\"2\"><c:v></c:v>"));
        assert!(xml.contains("<c:pt idx=\"1\"><c:v>2.5</c:v></c:pt>"));
        assert!(xml.contains("<c:axId val=\"50010001\"/><c:axId val=\"50010002\"/>"));
    }

    #[test]
    fn test_numeric_categories_use_num_ref() {
        let mut chart = Chart::new_line();
        chart
            .add_series()
            .unwrap()
            .set_categories("Sheet1!$A$1:$A$2")
            .set_values("Sheet1!$B$1:$B$2");
        let mut cache = HashMap::new();
        cache.insert(
            "Sheet1!$A$1:$A$2".to_string(),
            vec![ChartCacheValue::Number(2020.0), ChartCacheValue::Number(2021.0)],
        );
        let xml = render(&chart, &cache);
        assert!(xml.contains("<c:cat><c:numRef><c:f>Sheet1!$A$1:$A$2</c:f><c:numCache><c:formatCode>General</c:formatCode>"));
        assert!(xml.contains("<c:val><c:numRef><c:f>Sheet1!$B$1:$B$2</c:f></c:numRef></c:val>"));
        assert!(xml.contains("<c:marker val=\"1\"/>"));
    }

    #[test]
    fn test_pie_has_no_axes() {
        let mut chart = Chart::new_doughnut();
        chart.add_series().unwrap().set_values("Sheet1!$B$1:$B$3");
        chart.set_hole_size(60);
        let xml = render(&chart, &HashMap::new());
        assert!(xml.contains("<c:varyColors val=\"1\"/>"));
        assert!(xml.contains("<c:firstSliceAng val=\"0\"/><c:holeSize val=\"60\"/>"));
        assert!(!xml.contains("<c:axId"));
        assert!(!xml.contains("<c:catAx>"));
    }

    #[test]
    fn test_secondary_axis_and_combined_chart() {
        let (mut chart, cache) = column_chart();
        let mut line = Chart::new_line();
        line.add_series()
            .unwrap()
            .set_values("Sheet1!$C$2:$C$4")
            .set_secondary_axis(true);
        chart.combine(line).unwrap();
        let xml = render(&chart, &cache);
        let bar = position(&xml, "<c:barChart>");
        let line = position(&xml, "<c:lineChart>");
        assert!(bar < line);
        assert!(xml.contains("<c:idx val=\"1\"/><c:order val=\"1\"/>"));
        assert!(xml.contains("<c:axId val=\"50010003\"/><c:axId val=\"50010004\"/>"));
        assert_eq!(xml.matches("<c:valAx>").count(), 2);
        assert!(xml.contains("<c:delete val=\"1\"/>"));
        assert!(xml.contains("<c:axPos val=\"r\"/>"));
        assert!(xml.contains("<c:crosses val=\"max\"/>"));
    }

    #[test]
    fn test_only_secondary_series_use_primary_axes() {
        let mut chart = Chart::new_line();
        chart
            .add_series()
            .unwrap()
            .set_values("Sheet1!$B$2:$B$4")
            .set_secondary_axis(true);
        let xml = render(&chart, &HashMap::new());
        assert_eq!(xml.matches("<c:lineChart>").count(), 1);
        assert_eq!(xml.matches("<c:catAx>").count(), 1);
        assert_eq!(xml.matches("<c:valAx>").count(), 1);
        assert!(xml.contains("<c:axId val=\"50010001\"/><c:axId val=\"50010002\"/></c:lineChart>"));
        assert!(!xml.contains("50010003"));
    }

    #[test]
    fn test_scatter_uses_value_axes() {
        let mut chart = Chart::new_scatter();
        chart
            .add_series()
            .unwrap()
            .set_categories("Sheet1!$A$1:$A$3")
            .set_values("Sheet1!$B$1:$B$3");
        let xml = render(&chart, &HashMap::new());
        assert!(xml.contains("<c:scatterStyle val=\"lineMarker\"/>"));
        assert!(xml.contains("<a:ln w=\"28575\"><a:noFill/></a:ln>"));
        assert!(xml.contains("<c:xVal>"));
        assert!(xml.contains("<c:yVal>"));
        assert_eq!(xml.matches("<c:valAx>").count(), 2);
        assert!(xml.contains("<c:crossBetween val=\"midCat\"/>"));
    }

    #[test]
    fn test_series_decorations() {
        let (mut chart, cache) = column_chart();
        let mut labels = ChartDataLabels::new();
        labels.show_value().set_position(ChartDataLabelPosition::OutsideEnd);
        let mut point = crate::chart::ChartPoint::new();
        point.set_solid_fill(ChartSolidFill::new().set_color(Color::RED));
        let mut trend = ChartTrendline::new(ChartTrendlineType::Polynomial(3)).unwrap();
        trend.display_equation();
        chart.series[0]
            .set_data_labels(labels)
            .set_points(&[point])
            .set_trendline(trend)
            .set_y_error_bars(ChartErrorBars::new(ChartErrorBarsType::StandardError));
        let xml = render(&chart, &cache);
        let dpt = position(&xml, "<c:dPt>");
        let dlbls = position(&xml, "<c:dLbls>");
        let trendline = position(&xml, "<c:trendline>");
        let err = position(&xml, "<c:errBars>");
        let cat = position(&xml, "<c:cat>");
        assert!(dpt < dlbls && dlbls < trendline && trendline < err && err < cat);
        assert!(xml.contains("<c:dLblPos val=\"outEnd\"/><c:showVal val=\"1\"/>"));
        assert!(xml.contains("<c:trendlineType val=\"poly\"/><c:order val=\"3\"/>"));
        assert!(xml.contains("<c:errValType val=\"stdErr\"/>"));
    }

    #[test]
    fn test_axis_options() {
        let (mut chart, cache) = column_chart();
        chart.y_axis().set_min(0.0).set_max(50.0).set_reverse().set_name("Units");
        chart
            .y_axis()
            .set_major_gridlines_line(ChartLine::new().set_color(Color::GRAY));
        chart.legend().set_position(ChartLegendPosition::Bottom);
        let xml = render(&chart, &cache);
        assert!(xml.contains(
            "<c:scaling><c:orientation val=\"maxMin\"/><c:max val=\"50\"/><c:min val=\"0\"/></c:scaling>"
        ));
        assert!(xml.contains("<c:majorGridlines><c:spPr>"));
        assert!(xml.contains("rot=\"-5400000\""));
        assert!(xml.contains("<c:legendPos val=\"b\"/>"));
    }

    #[test]
    fn test_stock_defaults() {
        let mut chart = Chart::new_stock();
        for col in ["B", "C", "D"] {
            chart
                .add_series()
                .unwrap()
                .set_categories("Sheet1!$A$2:$A$6")
                .set_values(format!("Sheet1!${}$2:${}$6", col, col).as_str());
        }
        let xml = render(&chart, &HashMap::new());
        assert!(xml.contains("<c:stockChart>"));
        assert!(xml.contains("<c:hiLowLines/>"));
        assert!(xml.contains("<c:dateAx>"));
        assert!(xml.contains("formatCode=\"dd/mm/yyyy\" sourceLinked=\"1\""));
    }

    #[test]
    fn test_hidden_title_and_style() {
        let (mut chart, cache) = column_chart();
        chart.title().set_hidden();
        chart.set_style(10).set_protect(true);
        let xml = render(&chart, &cache);
        assert!(xml.contains("<c:style val=\"10\"/><c:protection/>"));
        assert!(xml.contains("<c:autoTitleDeleted val=\"1\"/>"));
    }
}
