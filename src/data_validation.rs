//! Cell data validation: the rule kinds Excel offers in its "Data
//! Validation" dialog and their `<dataValidation>` serialization.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{Result, WriteError};
use crate::types::CellRange;
use crate::utility::{
    date_to_excel_serial, datetime_to_excel_serial, format_number, time_to_excel_fraction,
};
use crate::xml::escape_attr_into;

const MAX_TITLE_LEN: usize = 32;
const MAX_MESSAGE_LEN: usize = 255;
const MAX_LIST_LEN: usize = 255;

/// Anything usable as a rule operand. Numbers and dates become
/// literals, strings are taken as formulas or cell references.
pub trait IntoRuleValue {
    fn to_rule_value(&self) -> String;
}

impl IntoRuleValue for i32 {
    fn to_rule_value(&self) -> String {
        self.to_string()
    }
}

impl IntoRuleValue for u32 {
    fn to_rule_value(&self) -> String {
        self.to_string()
    }
}

impl IntoRuleValue for f64 {
    fn to_rule_value(&self) -> String {
        format_number(*self)
    }
}

impl IntoRuleValue for &str {
    fn to_rule_value(&self) -> String {
        self.trim_start_matches('=').to_string()
    }
}

impl IntoRuleValue for String {
    fn to_rule_value(&self) -> String {
        self.as_str().to_rule_value()
    }
}

impl IntoRuleValue for NaiveDate {
    fn to_rule_value(&self) -> String {
        format_number(date_to_excel_serial(self))
    }
}

impl IntoRuleValue for NaiveDateTime {
    fn to_rule_value(&self) -> String {
        format_number(datetime_to_excel_serial(self))
    }
}

impl IntoRuleValue for NaiveTime {
    fn to_rule_value(&self) -> String {
        format_number(time_to_excel_fraction(self))
    }
}

/// Comparison applied to the cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValidationCriteria {
    Between(String, String),
    NotBetween(String, String),
    EqualTo(String),
    NotEqualTo(String),
    GreaterThan(String),
    LessThan(String),
    GreaterThanOrEqualTo(String),
    LessThanOrEqualTo(String),
}

impl DataValidationCriteria {
    pub fn between<T: IntoRuleValue>(min: T, max: T) -> Self {
        Self::Between(min.to_rule_value(), max.to_rule_value())
    }

    pub fn not_between<T: IntoRuleValue>(min: T, max: T) -> Self {
        Self::NotBetween(min.to_rule_value(), max.to_rule_value())
    }

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

    /// `between` is the schema default and is never written.
    fn operator(&self) -> Option<&'static str> {
        match self {
            Self::Between(..) => None,
            Self::NotBetween(..) => Some("notBetween"),
            Self::EqualTo(_) => Some("equal"),
            Self::NotEqualTo(_) => Some("notEqual"),
            Self::GreaterThan(_) => Some("greaterThan"),
            Self::LessThan(_) => Some("lessThan"),
            Self::GreaterThanOrEqualTo(_) => Some("greaterThanOrEqual"),
            Self::LessThanOrEqualTo(_) => Some("lessThanOrEqual"),
        }
    }

    fn formulas(&self) -> (&str, Option<&str>) {
        match self {
            Self::Between(a, b) | Self::NotBetween(a, b) => (a, Some(b)),
            Self::EqualTo(a)
            | Self::NotEqualTo(a)
            | Self::GreaterThan(a)
            | Self::LessThan(a)
            | Self::GreaterThanOrEqualTo(a)
            | Self::LessThanOrEqualTo(a) => (a, None),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataValidationRule {
    /// No restriction; only useful to attach an input message.
    Any,
    WholeNumber(DataValidationCriteria),
    Decimal(DataValidationCriteria),
    TextLength(DataValidationCriteria),
    Date(DataValidationCriteria),
    Time(DataValidationCriteria),
    /// Explicit list shown in a dropdown.
    List(Vec<String>),
    /// Dropdown sourced from a range or formula such as `=$A$1:$A$5`.
    ListFormula(String),
    Custom(String),
}

impl DataValidationRule {
    fn type_name(&self) -> Option<&'static str> {
        match self {
            Self::Any => None,
            Self::WholeNumber(_) => Some("whole"),
            Self::Decimal(_) => Some("decimal"),
            Self::TextLength(_) => Some("textLength"),
            Self::Date(_) => Some("date"),
            Self::Time(_) => Some("time"),
            Self::List(_) | Self::ListFormula(_) => Some("list"),
            Self::Custom(_) => Some("custom"),
        }
    }

    fn criteria(&self) -> Option<&DataValidationCriteria> {
        match self {
            Self::WholeNumber(c)
            | Self::Decimal(c)
            | Self::TextLength(c)
            | Self::Date(c)
            | Self::Time(c) => Some(c),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataValidationErrorStyle {
    #[default]
    Stop,
    Warning,
    Information,
}

/// A validation rule plus its prompts. Attach it to a range with
/// [`Worksheet::add_data_validation`](crate::Worksheet::add_data_validation).
#[derive(Debug, Clone, PartialEq)]
pub struct DataValidation {
    pub(crate) rule: DataValidationRule,
    pub(crate) ignore_blank: bool,
    pub(crate) show_dropdown: bool,
    pub(crate) show_input_message: bool,
    pub(crate) show_error_message: bool,
    pub(crate) input_title: String,
    pub(crate) input_message: String,
    pub(crate) error_title: String,
    pub(crate) error_message: String,
    pub(crate) error_style: DataValidationErrorStyle,
    pub(crate) multi_range: Vec<CellRange>,
}

impl Default for DataValidation {
    fn default() -> Self {
        Self {
            rule: DataValidationRule::Any,
            ignore_blank: true,
            show_dropdown: true,
            show_input_message: true,
            show_error_message: true,
            input_title: String::new(),
            input_message: String::new(),
            error_title: String::new(),
            error_message: String::new(),
            error_style: DataValidationErrorStyle::Stop,
            multi_range: Vec::new(),
        }
    }
}

impl DataValidation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_whole_number(mut self, criteria: DataValidationCriteria) -> Self {
        self.rule = DataValidationRule::WholeNumber(criteria);
        self
    }

    pub fn allow_decimal_number(mut self, criteria: DataValidationCriteria) -> Self {
        self.rule = DataValidationRule::Decimal(criteria);
        self
    }

    pub fn allow_text_length(mut self, criteria: DataValidationCriteria) -> Self {
        self.rule = DataValidationRule::TextLength(criteria);
        self
    }

    pub fn allow_date(mut self, criteria: DataValidationCriteria) -> Self {
        self.rule = DataValidationRule::Date(criteria);
        self
    }

    pub fn allow_time(mut self, criteria: DataValidationCriteria) -> Self {
        self.rule = DataValidationRule::Time(criteria);
        self
    }

    /// Dropdown of literal values. Excel limits the joined list,
    /// separators included, to 255 characters.
    pub fn allow_list_strings<S: AsRef<str>>(mut self, items: &[S]) -> Result<Self> {
        let items: Vec<String> = items.iter().map(|s| s.as_ref().to_string()).collect();
        let joined_len: usize =
            items.iter().map(|s| s.chars().count()).sum::<usize>() + items.len().saturating_sub(1);
        if joined_len > MAX_LIST_LEN {
            return Err(WriteError::Parameter(format!(
                "validation list is {} characters, the limit is {}",
                joined_len, MAX_LIST_LEN
            )));
        }
        self.rule = DataValidationRule::List(items);
        Ok(self)
    }

    pub fn allow_list_formula(mut self, formula: &str) -> Self {
        self.rule = DataValidationRule::ListFormula(formula.trim_start_matches('=').to_string());
        self
    }

    pub fn allow_custom(mut self, formula: &str) -> Self {
        self.rule = DataValidationRule::Custom(formula.trim_start_matches('=').to_string());
        self
    }

    pub fn ignore_blank(mut self, enable: bool) -> Self {
        self.ignore_blank = enable;
        self
    }

    pub fn show_dropdown(mut self, enable: bool) -> Self {
        self.show_dropdown = enable;
        self
    }

    pub fn show_input_message(mut self, enable: bool) -> Self {
        self.show_input_message = enable;
        self
    }

    pub fn show_error_message(mut self, enable: bool) -> Self {
        self.show_error_message = enable;
        self
    }

    pub fn set_input_title(mut self, title: &str) -> Result<Self> {
        check_len("input title", title, MAX_TITLE_LEN)?;
        self.input_title = title.to_string();
        Ok(self)
    }

    pub fn set_input_message(mut self, message: &str) -> Result<Self> {
        check_len("input message", message, MAX_MESSAGE_LEN)?;
        self.input_message = message.to_string();
        Ok(self)
    }

    pub fn set_error_title(mut self, title: &str) -> Result<Self> {
        check_len("error title", title, MAX_TITLE_LEN)?;
        self.error_title = title.to_string();
        Ok(self)
    }

    pub fn set_error_message(mut self, message: &str) -> Result<Self> {
        check_len("error message", message, MAX_MESSAGE_LEN)?;
        self.error_message = message.to_string();
        Ok(self)
    }

    pub fn set_error_style(mut self, style: DataValidationErrorStyle) -> Self {
        self.error_style = style;
        self
    }

    /// Apply the same rule to additional, non-contiguous ranges.
    pub fn set_multi_range(mut self, ranges: &[CellRange]) -> Self {
        self.multi_range = ranges.to_vec();
        self
    }
}

fn check_len(what: &str, text: &str, limit: usize) -> Result<()> {
    let len = text.chars().count();
    if len > limit {
        return Err(WriteError::Parameter(format!(
            "validation {} is {} characters, the limit is {}",
            what, len, limit
        )));
    }
    Ok(())
}

fn push_attr(buf: &mut Vec<u8>, name: &[u8], value: &str) {
    buf.push(b' ');
    buf.extend_from_slice(name);
    buf.extend_from_slice(b"=\"");
    escape_attr_into(value.as_bytes(), buf);
    buf.push(b'"');
}

fn push_formula(buf: &mut Vec<u8>, tag: &[u8], formula: &str) {
    buf.push(b'<');
    buf.extend_from_slice(tag);
    buf.push(b'>');
    crate::xml::escape_data_into(formula.as_bytes(), buf);
    buf.extend_from_slice(b"</");
    buf.extend_from_slice(tag);
    buf.push(b'>');
}

/// `<dataValidations>` for a worksheet. Each entry is the primary range
/// plus the validation attached to it.
pub(crate) fn write_data_validations(buf: &mut Vec<u8>, validations: &[(CellRange, DataValidation)]) {
    if validations.is_empty() {
        return;
    }
    buf.extend_from_slice(b"<dataValidations count=\"");
    buf.extend_from_slice(itoa::Buffer::new().format(validations.len()).as_bytes());
    buf.extend_from_slice(b"\">");

    for (range, validation) in validations {
        buf.extend_from_slice(b"<dataValidation");
        if let Some(kind) = validation.rule.type_name() {
            push_attr(buf, b"type", kind);
        }
        match validation.error_style {
            DataValidationErrorStyle::Stop => {}
            DataValidationErrorStyle::Warning => push_attr(buf, b"errorStyle", "warning"),
            DataValidationErrorStyle::Information => push_attr(buf, b"errorStyle", "information"),
        }
        if let Some(op) = validation.rule.criteria().and_then(|c| c.operator()) {
            push_attr(buf, b"operator", op);
        }
        if validation.ignore_blank {
            buf.extend_from_slice(b" allowBlank=\"1\"");
        }
        // The attribute is inverted: "1" hides the in-cell dropdown.
        let is_list = matches!(
            validation.rule,
            DataValidationRule::List(_) | DataValidationRule::ListFormula(_)
        );
        if is_list && !validation.show_dropdown {
            buf.extend_from_slice(b" showDropDown=\"1\"");
        }
        if validation.show_input_message {
            buf.extend_from_slice(b" showInputMessage=\"1\"");
        }
        if validation.show_error_message {
            buf.extend_from_slice(b" showErrorMessage=\"1\"");
        }
        if !validation.error_title.is_empty() {
            push_attr(buf, b"errorTitle", &validation.error_title);
        }
        if !validation.error_message.is_empty() {
            push_attr(buf, b"error", &validation.error_message);
        }
        if !validation.input_title.is_empty() {
            push_attr(buf, b"promptTitle", &validation.input_title);
        }
        if !validation.input_message.is_empty() {
            push_attr(buf, b"prompt", &validation.input_message);
        }

        let mut sqref = range.to_a1();
        for extra in &validation.multi_range {
            sqref.push(' ');
            sqref.push_str(&extra.to_a1());
        }
        push_attr(buf, b"sqref", &sqref);

        match &validation.rule {
            DataValidationRule::Any => {
                buf.extend_from_slice(b"/>");
                continue;
            }
            DataValidationRule::List(items) => {
                buf.push(b'>');
                push_formula(buf, b"formula1", &format!("\"{}\"", items.join(",")));
            }
            DataValidationRule::ListFormula(formula) | DataValidationRule::Custom(formula) => {
                buf.push(b'>');
                push_formula(buf, b"formula1", formula);
            }
            rule => {
                buf.push(b'>');
                if let Some(criteria) = rule.criteria() {
                    let (first, second) = criteria.formulas();
                    push_formula(buf, b"formula1", first);
                    if let Some(second) = second {
                        push_formula(buf, b"formula2", second);
                    }
                }
            }
        }
        buf.extend_from_slice(b"</dataValidation>");
    }

    buf.extend_from_slice(b"</dataValidations>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(range: CellRange, validation: DataValidation) -> String {
        let mut buf = Vec::new();
        write_data_validations(&mut buf, &[(range, validation)]);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_whole_number_between() {
        let dv = DataValidation::new().allow_whole_number(DataValidationCriteria::between(1, 10));
        assert_eq!(
            render(CellRange::new(0, 0, 9, 0), dv),
            "<dataValidations count=\"1\"><dataValidation type=\"whole\" allowBlank=\"1\" \
showInputMessage=\"1\" showErrorMessage=\"1\" sqref=\"A1:A10\"><formula1>1</formula1>\
<formula2>10</formula2></dataValidation></dataValidations>"
        );
    }

    #[test]
    fn test_list_with_messages_and_hidden_dropdown() {
        let dv = DataValidation::new()
            .allow_list_strings(&["open", "closed"])
            .unwrap()
            .show_dropdown(false)
            .set_input_title("Status")
            .unwrap()
            .set_error_message("Pick a status")
            .unwrap()
            .set_error_style(DataValidationErrorStyle::Warning);
        let xml = render(CellRange::new(1, 1, 1, 1), dv);
        assert!(xml.contains(
            "<dataValidation type=\"list\" errorStyle=\"warning\" allowBlank=\"1\" showDropDown=\"1\""
        ));
        assert!(xml.contains("error=\"Pick a status\" promptTitle=\"Status\" sqref=\"B2\""));
        assert!(xml.contains("<formula1>\"open,closed\"</formula1>"));
    }

    #[test]
    fn test_operator_and_date_value() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dv = DataValidation::new().allow_date(DataValidationCriteria::greater_than(date));
        let xml = render(CellRange::new(0, 0, 0, 0), dv);
        assert!(xml.contains("type=\"date\" operator=\"greaterThan\""));
        assert!(xml.contains("<formula1>45292</formula1>"));
    }

    #[test]
    fn test_any_rule_is_self_closing() {
        let dv = DataValidation::new().set_input_message("Enter anything").unwrap();
        let xml = render(CellRange::new(0, 0, 0, 0), dv);
        assert!(xml.contains("prompt=\"Enter anything\" sqref=\"A1\"/>"));
        assert!(!xml.contains("type="));
    }

    #[test]
    fn test_limits() {
        let long: Vec<String> = (0..60).map(|i| format!("item{}", i)).collect();
        assert!(DataValidation::new().allow_list_strings(&long).is_err());
        assert!(DataValidation::new().set_input_title(&"t".repeat(33)).is_err());
        assert!(DataValidation::new().set_error_message(&"m".repeat(256)).is_err());
    }

    #[test]
    fn test_multi_range_sqref() {
        let dv = DataValidation::new()
            .allow_custom("=ISNUMBER(A1)")
            .set_multi_range(&[CellRange::new(4, 0, 5, 0)]);
        let xml = render(CellRange::new(0, 0, 1, 0), dv);
        assert!(xml.contains("sqref=\"A1:A2 A5:A6\""));
        assert!(xml.contains("<formula1>ISNUMBER(A1)</formula1>"));
    }
}
