//! Conditional formatting rules. Rules that highlight cells carry a
//! [`Format`] which the worksheet registers in the workbook's dxf table
//! when the rule is added.

use crate::data_validation::IntoRuleValue;
use crate::format::{Color, Format};
use crate::types::CellRange;
use crate::utility::{cell_ref, format_number};
use crate::xml::{escape_attr_into, escape_data_into};

/// Comparison for `cellIs` rules.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionalFormatCellRule {
    EqualTo(String),
    NotEqualTo(String),
    GreaterThan(String),
    LessThan(String),
    GreaterThanOrEqualTo(String),
    LessThanOrEqualTo(String),
    Between(String, String),
    NotBetween(String, String),
}

impl ConditionalFormatCellRule {
    pub fn equal_to<T: IntoRuleValue>(value: T) -> Self {
        Self::EqualTo(value.to_rule_value())
    }

    pub fn not_equal_to<T: IntoRuleValue>(value: T) -> Self {
        Self::NotEqualTo(value.to_rule_value())
    }

    pub fn greater_than<T: IntoRuleValue>(value: T) -> Self {
        Self::GreaterThan(value.to_rule_value())
    }

    pub fn less_than<T: IntoRuleValue>(value: T) -> Self {
        Self::LessThan(value.to_rule_value())
    }

    pub fn greater_than_or_equal_to<T: IntoRuleValue>(value: T) -> Self {
        Self::GreaterThanOrEqualTo(value.to_rule_value())
    }

    pub fn less_than_or_equal_to<T: IntoRuleValue>(value: T) -> Self {
        Self::LessThanOrEqualTo(value.to_rule_value())
    }

    pub fn between<T: IntoRuleValue>(min: T, max: T) -> Self {
        Self::Between(min.to_rule_value(), max.to_rule_value())
    }

    pub fn not_between<T: IntoRuleValue>(min: T, max: T) -> Self {
        Self::NotBetween(min.to_rule_value(), max.to_rule_value())
    }

    fn operator(&self) -> &'static str {
        match self {
            Self::EqualTo(_) => "equal",
            Self::NotEqualTo(_) => "notEqual",
            Self::GreaterThan(_) => "greaterThan",
            Self::LessThan(_) => "lessThan",
            Self::GreaterThanOrEqualTo(_) => "greaterThanOrEqual",
            Self::LessThanOrEqualTo(_) => "lessThanOrEqual",
            Self::Between(..) => "between",
            Self::NotBetween(..) => "notBetween",
        }
    }

    fn formulas(&self) -> Vec<&str> {
        match self {
            Self::Between(a, b) | Self::NotBetween(a, b) => vec![a, b],
            Self::EqualTo(a)
            | Self::NotEqualTo(a)
            | Self::GreaterThan(a)
            | Self::LessThan(a)
            | Self::GreaterThanOrEqualTo(a)
            | Self::LessThanOrEqualTo(a) => vec![a],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionalFormatTextRule {
    Contains,
    DoesNotContain,
    BeginsWith,
    EndsWith,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionalFormatAverageRule {
    Above,
    Below,
    EqualOrAbove,
    EqualOrBelow,
    OneStdDevAbove,
    OneStdDevBelow,
    TwoStdDevAbove,
    TwoStdDevBelow,
    ThreeStdDevAbove,
    ThreeStdDevBelow,
}

/// How a color scale or data bar end point is located.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionalFormatValue {
    Lowest,
    Highest,
    Number(f64),
    Percent(f64),
    Percentile(f64),
    Formula(String),
}

impl ConditionalFormatValue {
    fn write_cfvo(&self, buf: &mut Vec<u8>) {
        let (kind, val) = match self {
            Self::Lowest => ("min", None),
            Self::Highest => ("max", None),
            Self::Number(n) => ("num", Some(format_number(*n))),
            Self::Percent(n) => ("percent", Some(format_number(*n))),
            Self::Percentile(n) => ("percentile", Some(format_number(*n))),
            Self::Formula(f) => ("formula", Some(f.trim_start_matches('=').to_string())),
        };
        buf.extend_from_slice(b"<cfvo type=\"");
        buf.extend_from_slice(kind.as_bytes());
        buf.push(b'"');
        if let Some(val) = val {
            buf.extend_from_slice(b" val=\"");
            escape_attr_into(val.as_bytes(), buf);
            buf.push(b'"');
        }
        buf.extend_from_slice(b"/>");
    }
}

#[derive(Debug, Clone, PartialEq)]
enum RuleKind {
    Cell(ConditionalFormatCellRule),
    Formula(String),
    ColorScale(Vec<(ConditionalFormatValue, Color)>),
    DataBar {
        min: ConditionalFormatValue,
        max: ConditionalFormatValue,
        color: Color,
        show_value: bool,
    },
    Top {
        rank: u16,
        bottom: bool,
        percent: bool,
    },
    Text(ConditionalFormatTextRule, String),
    Duplicate,
    Unique,
    Blanks,
    NoBlanks,
    Errors,
    NoErrors,
    Average(ConditionalFormatAverageRule),
}

/// One conditional formatting rule, built with one of the constructors
/// and then given a highlight format where the rule kind uses one.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalFormat {
    kind: RuleKind,
    pub(crate) format: Option<Format>,
    pub(crate) dxf_index: Option<u32>,
    stop_if_true: bool,
    pub(crate) multi_range: Vec<CellRange>,
}

impl ConditionalFormat {
    fn with_kind(kind: RuleKind) -> Self {
        Self {
            kind,
            format: None,
            dxf_index: None,
            stop_if_true: false,
            multi_range: Vec::new(),
        }
    }

    pub fn cell(rule: ConditionalFormatCellRule) -> Self {
        Self::with_kind(RuleKind::Cell(rule))
    }

    /// A formula evaluated relative to the top-left cell of the range.
    pub fn formula(formula: &str) -> Self {
        Self::with_kind(RuleKind::Formula(formula.trim_start_matches('=').to_string()))
    }

    /// Excel's default two color scale, light yellow to green.
    pub fn two_color_scale() -> Self {
        Self::with_kind(RuleKind::ColorScale(vec![
            (ConditionalFormatValue::Lowest, Color::Rgb(0xFFEF9C)),
            (ConditionalFormatValue::Highest, Color::Rgb(0x63BE7B)),
        ]))
    }

    /// Excel's default three color scale, red through yellow to green.
    pub fn three_color_scale() -> Self {
        Self::with_kind(RuleKind::ColorScale(vec![
            (ConditionalFormatValue::Lowest, Color::Rgb(0xF8696B)),
            (ConditionalFormatValue::Percentile(50.0), Color::Rgb(0xFFEB84)),
            (ConditionalFormatValue::Highest, Color::Rgb(0x63BE7B)),
        ]))
    }

    pub fn data_bar() -> Self {
        Self::with_kind(RuleKind::DataBar {
            min: ConditionalFormatValue::Lowest,
            max: ConditionalFormatValue::Highest,
            color: Color::Rgb(0x638EC6),
            show_value: true,
        })
    }

    pub fn top(rank: u16) -> Self {
        Self::with_kind(RuleKind::Top { rank, bottom: false, percent: false })
    }

    pub fn bottom(rank: u16) -> Self {
        Self::with_kind(RuleKind::Top { rank, bottom: true, percent: false })
    }

    pub fn text(rule: ConditionalFormatTextRule, text: &str) -> Self {
        Self::with_kind(RuleKind::Text(rule, text.to_string()))
    }

    pub fn duplicate() -> Self {
        Self::with_kind(RuleKind::Duplicate)
    }

    pub fn unique() -> Self {
        Self::with_kind(RuleKind::Unique)
    }

    pub fn blanks() -> Self {
        Self::with_kind(RuleKind::Blanks)
    }

    pub fn no_blanks() -> Self {
        Self::with_kind(RuleKind::NoBlanks)
    }

    pub fn errors() -> Self {
        Self::with_kind(RuleKind::Errors)
    }

    pub fn no_errors() -> Self {
        Self::with_kind(RuleKind::NoErrors)
    }

    pub fn average(rule: ConditionalFormatAverageRule) -> Self {
        Self::with_kind(RuleKind::Average(rule))
    }

    pub fn set_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    pub fn set_stop_if_true(mut self, enable: bool) -> Self {
        self.stop_if_true = enable;
        self
    }

    /// Rank as a percentage for `top`/`bottom` rules.
    pub fn set_percent(mut self, enable: bool) -> Self {
        if let RuleKind::Top { percent, .. } = &mut self.kind {
            *percent = enable;
        }
        self
    }

    /// Override a color scale stop. `stop` is 0 for the minimum and the
    /// last index for the maximum; out of range stops are ignored.
    pub fn set_scale_point(mut self, stop: usize, value: ConditionalFormatValue, color: Color) -> Self {
        if let RuleKind::ColorScale(points) = &mut self.kind {
            if let Some(point) = points.get_mut(stop) {
                *point = (value, color);
            }
        }
        self
    }

    pub fn set_bar_color(mut self, bar_color: Color) -> Self {
        if let RuleKind::DataBar { color, .. } = &mut self.kind {
            *color = bar_color;
        }
        self
    }

    pub fn set_bar_range(mut self, minimum: ConditionalFormatValue, maximum: ConditionalFormatValue) -> Self {
        if let RuleKind::DataBar { min, max, .. } = &mut self.kind {
            *min = minimum;
            *max = maximum;
        }
        self
    }

    /// Show only the bar, hiding the cell value.
    pub fn set_bar_only(mut self, enable: bool) -> Self {
        if let RuleKind::DataBar { show_value, .. } = &mut self.kind {
            *show_value = !enable;
        }
        self
    }

    pub fn set_multi_range(mut self, ranges: &[CellRange]) -> Self {
        self.multi_range = ranges.to_vec();
        self
    }

    /// Whether the rule applies a differential format.
    pub(crate) fn uses_format(&self) -> bool {
        !matches!(self.kind, RuleKind::ColorScale(_) | RuleKind::DataBar { .. })
    }
}

fn push_int(buf: &mut Vec<u8>, n: impl itoa::Integer) {
    buf.extend_from_slice(itoa::Buffer::new().format(n).as_bytes());
}

fn push_formula(buf: &mut Vec<u8>, formula: &str) {
    buf.extend_from_slice(b"<formula>");
    escape_data_into(formula.as_bytes(), buf);
    buf.extend_from_slice(b"</formula>");
}

fn push_color(buf: &mut Vec<u8>, color: &Color) {
    buf.extend_from_slice(b"<color");
    for (name, value) in color.style_attributes() {
        buf.push(b' ');
        buf.extend_from_slice(name.as_bytes());
        buf.extend_from_slice(b"=\"");
        buf.extend_from_slice(value.as_bytes());
        buf.push(b'"');
    }
    buf.extend_from_slice(b"/>");
}

/// Write one `<conditionalFormatting>` block per rule. Priorities run
/// sheet-wide from 1 in insertion order.
pub(crate) fn write_conditional_formats(buf: &mut Vec<u8>, formats: &[(CellRange, ConditionalFormat)]) {
    for (idx, (range, cf)) in formats.iter().enumerate() {
        let priority = idx + 1;
        let anchor = cell_ref(range.first_row, range.first_col);

        buf.extend_from_slice(b"<conditionalFormatting sqref=\"");
        buf.extend_from_slice(range.to_a1().as_bytes());
        for extra in &cf.multi_range {
            buf.push(b' ');
            buf.extend_from_slice(extra.to_a1().as_bytes());
        }
        buf.extend_from_slice(b"\"><cfRule type=\"");

        let rule_type: &str = match &cf.kind {
            RuleKind::Cell(_) => "cellIs",
            RuleKind::Formula(_) => "expression",
            RuleKind::ColorScale(_) => "colorScale",
            RuleKind::DataBar { .. } => "dataBar",
            RuleKind::Top { .. } => "top10",
            RuleKind::Text(ConditionalFormatTextRule::Contains, _) => "containsText",
            RuleKind::Text(ConditionalFormatTextRule::DoesNotContain, _) => "notContainsText",
            RuleKind::Text(ConditionalFormatTextRule::BeginsWith, _) => "beginsWith",
            RuleKind::Text(ConditionalFormatTextRule::EndsWith, _) => "endsWith",
            RuleKind::Duplicate => "duplicateValues",
            RuleKind::Unique => "uniqueValues",
            RuleKind::Blanks => "containsBlanks",
            RuleKind::NoBlanks => "notContainsBlanks",
            RuleKind::Errors => "containsErrors",
            RuleKind::NoErrors => "notContainsErrors",
            RuleKind::Average(_) => "aboveAverage",
        };
        buf.extend_from_slice(rule_type.as_bytes());
        buf.push(b'"');

        if let Some(dxf) = cf.dxf_index.filter(|_| cf.uses_format()) {
            buf.extend_from_slice(b" dxfId=\"");
            push_int(buf, dxf);
            buf.push(b'"');
        }
        buf.extend_from_slice(b" priority=\"");
        push_int(buf, priority);
        buf.push(b'"');
        if cf.stop_if_true {
            buf.extend_from_slice(b" stopIfTrue=\"1\"");
        }

        match &cf.kind {
            RuleKind::Cell(rule) => {
                buf.extend_from_slice(b" operator=\"");
                buf.extend_from_slice(rule.operator().as_bytes());
                buf.extend_from_slice(b"\">");
                for formula in rule.formulas() {
                    push_formula(buf, formula);
                }
            }
            RuleKind::Formula(formula) => {
                buf.push(b'>');
                push_formula(buf, formula);
            }
            RuleKind::ColorScale(points) => {
                buf.extend_from_slice(b"><colorScale>");
                for (value, _) in points {
                    value.write_cfvo(buf);
                }
                for (_, color) in points {
                    push_color(buf, color);
                }
                buf.extend_from_slice(b"</colorScale>");
            }
            RuleKind::DataBar { min, max, color, show_value } => {
                buf.extend_from_slice(b"><dataBar");
                if !show_value {
                    buf.extend_from_slice(b" showValue=\"0\"");
                }
                buf.push(b'>');
                min.write_cfvo(buf);
                max.write_cfvo(buf);
                push_color(buf, color);
                buf.extend_from_slice(b"</dataBar>");
            }
            RuleKind::Top { rank, bottom, percent } => {
                if *percent {
                    buf.extend_from_slice(b" percent=\"1\"");
                }
                if *bottom {
                    buf.extend_from_slice(b" bottom=\"1\"");
                }
                buf.extend_from_slice(b" rank=\"");
                push_int(buf, *rank);
                buf.extend_from_slice(b"\"/></conditionalFormatting>");
                continue;
            }
            RuleKind::Text(rule, text) => {
                let (operator, formula) = text_rule_formula(*rule, text, &anchor);
                buf.extend_from_slice(b" operator=\"");
                buf.extend_from_slice(operator.as_bytes());
                buf.extend_from_slice(b"\" text=\"");
                escape_attr_into(text.as_bytes(), buf);
                buf.extend_from_slice(b"\">");
                push_formula(buf, &formula);
            }
            RuleKind::Duplicate | RuleKind::Unique => {
                buf.extend_from_slice(b"/></conditionalFormatting>");
                continue;
            }
            RuleKind::Blanks => {
                buf.push(b'>');
                push_formula(buf, &format!("LEN(TRIM({}))=0", anchor));
            }
            RuleKind::NoBlanks => {
                buf.push(b'>');
                push_formula(buf, &format!("LEN(TRIM({}))>0", anchor));
            }
            RuleKind::Errors => {
                buf.push(b'>');
                push_formula(buf, &format!("ISERROR({})", anchor));
            }
            RuleKind::NoErrors => {
                buf.push(b'>');
                push_formula(buf, &format!("NOT(ISERROR({}))", anchor));
            }
            RuleKind::Average(rule) => {
                write_average_attributes(buf, *rule);
                buf.extend_from_slice(b"/></conditionalFormatting>");
                continue;
            }
        }
        buf.extend_from_slice(b"</cfRule></conditionalFormatting>");
    }
}

fn text_rule_formula(rule: ConditionalFormatTextRule, text: &str, anchor: &str) -> (&'static str, String) {
    let quoted = text.replace('"', "\"\"");
    let len = text.chars().count();
    match rule {
        ConditionalFormatTextRule::Contains => (
            "containsText",
            format!("NOT(ISERROR(SEARCH(\"{}\",{})))", quoted, anchor),
        ),
        ConditionalFormatTextRule::DoesNotContain => (
            "notContains",
            format!("ISERROR(SEARCH(\"{}\",{}))", quoted, anchor),
        ),
        ConditionalFormatTextRule::BeginsWith => (
            "beginsWith",
            format!("LEFT({},{})=\"{}\"", anchor, len, quoted),
        ),
        ConditionalFormatTextRule::EndsWith => (
            "endsWith",
            format!("RIGHT({},{})=\"{}\"", anchor, len, quoted),
        ),
    }
}

fn write_average_attributes(buf: &mut Vec<u8>, rule: ConditionalFormatAverageRule) {
    use ConditionalFormatAverageRule::*;
    let below = matches!(
        rule,
        Below | EqualOrBelow | OneStdDevBelow | TwoStdDevBelow | ThreeStdDevBelow
    );
    if below {
        buf.extend_from_slice(b" aboveAverage=\"0\"");
    }
    if matches!(rule, EqualOrAbove | EqualOrBelow) {
        buf.extend_from_slice(b" equalAverage=\"1\"");
    }
    let std_dev = match rule {
        OneStdDevAbove | OneStdDevBelow => Some(b'1'),
        TwoStdDevAbove | TwoStdDevBelow => Some(b'2'),
        ThreeStdDevAbove | ThreeStdDevBelow => Some(b'3'),
        _ => None,
    };
    if let Some(n) = std_dev {
        buf.extend_from_slice(b" stdDev=\"");
        buf.push(n);
        buf.push(b'"');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(formats: Vec<(CellRange, ConditionalFormat)>) -> String {
        let mut buf = Vec::new();
        write_conditional_formats(&mut buf, &formats);
        String::from_utf8(buf).unwrap()
    }

    fn with_dxf(cf: ConditionalFormat, dxf: u32) -> ConditionalFormat {
        ConditionalFormat { dxf_index: Some(dxf), ..cf }
    }

    #[test]
    fn test_cell_rule_between() {
        let cf = with_dxf(ConditionalFormat::cell(ConditionalFormatCellRule::between(1, 5)), 0);
        assert_eq!(
            render(vec![(CellRange::new(0, 0, 9, 0), cf)]),
            "<conditionalFormatting sqref=\"A1:A10\"><cfRule type=\"cellIs\" dxfId=\"0\" priority=\"1\" \
operator=\"between\"><formula>1</formula><formula>5</formula></cfRule></conditionalFormatting>"
        );
    }

    #[test]
    fn test_priorities_are_sheet_wide() {
        let range = CellRange::new(0, 0, 4, 0);
        let xml = render(vec![
            (range, with_dxf(ConditionalFormat::duplicate(), 0)),
            (range, with_dxf(ConditionalFormat::formula("=$A1>10").set_stop_if_true(true), 1)),
        ]);
        assert!(xml.contains("type=\"duplicateValues\" dxfId=\"0\" priority=\"1\"/>"));
        assert!(xml.contains(
            "type=\"expression\" dxfId=\"1\" priority=\"2\" stopIfTrue=\"1\"><formula>$A1&gt;10</formula>"
        ));
    }

    #[test]
    fn test_text_rule_uses_top_left_cell() {
        let cf = with_dxf(ConditionalFormat::text(ConditionalFormatTextRule::BeginsWith, "ab"), 2);
        let xml = render(vec![(CellRange::new(1, 2, 5, 3), cf)]);
        assert!(xml.contains("operator=\"beginsWith\" text=\"ab\""));
        assert!(xml.contains("<formula>LEFT(C2,2)=\"ab\"</formula>"));

        let cf = ConditionalFormat::text(ConditionalFormatTextRule::Contains, "x\"y");
        let xml = render(vec![(CellRange::new(0, 0, 0, 0), cf)]);
        assert!(xml.contains("NOT(ISERROR(SEARCH(\"x\"\"y\",A1)))"));
    }

    #[test]
    fn test_color_scale_and_data_bar() {
        let range = CellRange::new(0, 1, 9, 1);
        let xml = render(vec![
            (range, with_dxf(ConditionalFormat::three_color_scale(), 7)),
            (range, ConditionalFormat::data_bar().set_bar_only(true).set_bar_color(Color::RED)),
        ]);
        assert!(!xml.contains("dxfId"));
        assert!(xml.contains(
            "<colorScale><cfvo type=\"min\"/><cfvo type=\"percentile\" val=\"50\"/><cfvo type=\"max\"/>\
<color rgb=\"FFF8696B\"/><color rgb=\"FFFFEB84\"/><color rgb=\"FF63BE7B\"/></colorScale>"
        ));
        assert!(xml.contains(
            "<dataBar showValue=\"0\"><cfvo type=\"min\"/><cfvo type=\"max\"/><color rgb=\"FFFF0000\"/></dataBar>"
        ));
    }

    #[test]
    fn test_top_and_average() {
        let range = CellRange::new(0, 0, 9, 0);
        let xml = render(vec![
            (range, with_dxf(ConditionalFormat::bottom(5).set_percent(true), 0)),
            (range, with_dxf(ConditionalFormat::average(ConditionalFormatAverageRule::TwoStdDevBelow), 0)),
        ]);
        assert!(xml.contains("type=\"top10\" dxfId=\"0\" priority=\"1\" percent=\"1\" bottom=\"1\" rank=\"5\"/>"));
        assert!(xml.contains("type=\"aboveAverage\" dxfId=\"0\" priority=\"2\" aboveAverage=\"0\" stdDev=\"2\"/>"));
    }

    #[test]
    fn test_blank_and_error_rules() {
        let range = CellRange::new(2, 1, 3, 1);
        let xml = render(vec![
            (range, ConditionalFormat::blanks()),
            (range, ConditionalFormat::no_errors()),
        ]);
        assert!(xml.contains("<formula>LEN(TRIM(B3))=0</formula>"));
        assert!(xml.contains("type=\"notContainsErrors\" priority=\"2\"><formula>NOT(ISERROR(B3))</formula>"));
    }
}
