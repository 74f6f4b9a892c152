//! Worksheet autofilter criteria and the `<autoFilter>` element.

use std::collections::BTreeMap;

use crate::types::CellRange;
use crate::xml::escape_attr_into;

/// Comparison used by a custom filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterCriteria {
    EqualTo,
    NotEqualTo,
    GreaterThan,
    GreaterThanOrEqualTo,
    LessThan,
    LessThanOrEqualTo,
    BeginsWith,
    EndsWith,
    Contains,
    DoesNotContain,
}

impl FilterCriteria {
    /// Operator attribute and the wildcard wrapping applied to the value.
    fn operator_and_value(&self, value: &str) -> (Option<&'static str>, String) {
        match self {
            FilterCriteria::EqualTo => (None, value.to_string()),
            FilterCriteria::NotEqualTo => (Some("notEqual"), value.to_string()),
            FilterCriteria::GreaterThan => (Some("greaterThan"), value.to_string()),
            FilterCriteria::GreaterThanOrEqualTo => (Some("greaterThanOrEqual"), value.to_string()),
            FilterCriteria::LessThan => (Some("lessThan"), value.to_string()),
            FilterCriteria::LessThanOrEqualTo => (Some("lessThanOrEqual"), value.to_string()),
            FilterCriteria::BeginsWith => (None, format!("{}*", value)),
            FilterCriteria::EndsWith => (None, format!("*{}", value)),
            FilterCriteria::Contains => (None, format!("*{}*", value)),
            FilterCriteria::DoesNotContain => (Some("notEqual"), format!("*{}*", value)),
        }
    }
}

/// Criteria for one autofilter column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterCondition {
    pub(crate) list: Vec<String>,
    pub(crate) blanks: bool,
    pub(crate) custom: Vec<(FilterCriteria, String)>,
    pub(crate) and: bool,
}

impl FilterCondition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show rows whose cell text equals one of `values`.
    pub fn add_list_filter(mut self, value: &str) -> Self {
        self.list.push(value.to_string());
        self
    }

    pub fn add_list_blanks_filter(mut self) -> Self {
        self.blanks = true;
        self
    }

    /// Custom comparison; at most two apply, joined by `and` or `or`.
    pub fn add_custom_filter(mut self, criteria: FilterCriteria, value: &str) -> Self {
        if self.custom.len() < 2 {
            self.custom.push((criteria, value.to_string()));
        }
        self
    }

    pub fn add_custom_boolean_and(mut self) -> Self {
        self.and = true;
        self
    }

    pub(crate) fn is_list(&self) -> bool {
        self.custom.is_empty() && (!self.list.is_empty() || self.blanks)
    }

    /// Whether a row with this cell text stays visible under a list filter.
    /// Custom filters are left for Excel to apply on open.
    pub(crate) fn shows(&self, text: Option<&str>) -> bool {
        if !self.is_list() {
            return true;
        }
        match text {
            None | Some("") => self.blanks,
            Some(t) => self.list.iter().any(|v| v.eq_ignore_ascii_case(t.trim())),
        }
    }
}

pub(crate) fn write_autofilter(
    buf: &mut Vec<u8>,
    range: &CellRange,
    columns: &BTreeMap<u16, FilterCondition>,
) {
    let mut int = itoa::Buffer::new();
    buf.extend_from_slice(b"<autoFilter ref=\"");
    buf.extend_from_slice(range.to_a1().as_bytes());
    if columns.is_empty() {
        buf.extend_from_slice(b"\"/>");
        return;
    }
    buf.extend_from_slice(b"\">");
    for (col, condition) in columns {
        buf.extend_from_slice(b"<filterColumn colId=\"");
        buf.extend_from_slice(int.format(col - range.first_col).as_bytes());
        buf.extend_from_slice(b"\">");
        if condition.is_list() {
            buf.extend_from_slice(b"<filters");
            if condition.blanks {
                buf.extend_from_slice(b" blank=\"1\"");
            }
            if condition.list.is_empty() {
                buf.extend_from_slice(b"/>");
            } else {
                buf.push(b'>');
                for value in &condition.list {
                    buf.extend_from_slice(b"<filter val=\"");
                    escape_attr_into(value.as_bytes(), buf);
                    buf.extend_from_slice(b"\"/>");
                }
                buf.extend_from_slice(b"</filters>");
            }
        } else {
            buf.extend_from_slice(b"<customFilters");
            if condition.and && condition.custom.len() == 2 {
                buf.extend_from_slice(b" and=\"1\"");
            }
            buf.push(b'>');
            for (criteria, value) in &condition.custom {
                let (operator, value) = criteria.operator_and_value(value);
                buf.extend_from_slice(b"<customFilter");
                if let Some(operator) = operator {
                    buf.extend_from_slice(b" operator=\"");
                    buf.extend_from_slice(operator.as_bytes());
                    buf.push(b'"');
                }
                buf.extend_from_slice(b" val=\"");
                escape_attr_into(value.as_bytes(), buf);
                buf.extend_from_slice(b"\"/>");
            }
            buf.extend_from_slice(b"</customFilters>");
        }
        buf.extend_from_slice(b"</filterColumn>");
    }
    buf.extend_from_slice(b"</autoFilter>");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(columns: &BTreeMap<u16, FilterCondition>) -> String {
        let mut buf = Vec::new();
        write_autofilter(&mut buf, &CellRange::new(0, 1, 50, 4), columns);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_plain_autofilter() {
        assert_eq!(render(&BTreeMap::new()), "<autoFilter ref=\"B1:E51\"/>");
    }

    #[test]
    fn test_list_filter_with_blanks() {
        let mut columns = BTreeMap::new();
        columns.insert(
            2,
            FilterCondition::new()
                .add_list_filter("East")
                .add_list_filter("North")
                .add_list_blanks_filter(),
        );
        assert_eq!(
            render(&columns),
            "<autoFilter ref=\"B1:E51\"><filterColumn colId=\"1\"><filters blank=\"1\">\
<filter val=\"East\"/><filter val=\"North\"/></filters></filterColumn></autoFilter>"
        );
    }

    #[test]
    fn test_custom_filters() {
        let mut columns = BTreeMap::new();
        columns.insert(
            4,
            FilterCondition::new()
                .add_custom_filter(FilterCriteria::GreaterThan, "4000")
                .add_custom_filter(FilterCriteria::Contains, "x")
                .add_custom_boolean_and(),
        );
        let xml = render(&columns);
        assert!(xml.contains(
            "<customFilters and=\"1\"><customFilter operator=\"greaterThan\" val=\"4000\"/>\
<customFilter val=\"*x*\"/></customFilters>"
        ));
    }

    #[test]
    fn test_list_visibility() {
        let condition = FilterCondition::new().add_list_filter("East");
        assert!(condition.shows(Some("east")));
        assert!(!condition.shows(Some("West")));
        assert!(!condition.shows(None));
        let custom = FilterCondition::new().add_custom_filter(FilterCriteria::LessThan, "3");
        assert!(custom.shows(Some("9")));
    }
}
