//! Formula preparation: strip the leading `=` and array braces, and add the
//! `_xlfn.` prefixes Excel 2010+ functions need in the file format.

use std::collections::HashSet;
use std::sync::OnceLock;

/// Functions that must be stored with an `_xlfn.` prefix.
const FUTURE_FUNCTIONS: &[&str] = &[
    "ACOT", "ACOTH", "AGGREGATE", "ARABIC", "ARRAYTOTEXT", "BASE", "BETA.DIST", "BETA.INV",
    "BINOM.DIST", "BINOM.DIST.RANGE", "BINOM.INV", "BITAND", "BITLSHIFT", "BITOR", "BITRSHIFT",
    "BITXOR", "CEILING.MATH", "CEILING.PRECISE", "CHISQ.DIST", "CHISQ.DIST.RT", "CHISQ.INV",
    "CHISQ.INV.RT", "CHISQ.TEST", "COMBINA", "CONCAT", "CONFIDENCE.NORM", "CONFIDENCE.T", "COT",
    "COTH", "COVARIANCE.P", "COVARIANCE.S", "CSC", "CSCH", "DAYS", "DECIMAL", "ERF.PRECISE",
    "ERFC.PRECISE", "EXPON.DIST", "F.DIST", "F.DIST.RT", "F.INV", "F.INV.RT", "F.TEST",
    "FILTERXML", "FLOOR.MATH", "FLOOR.PRECISE", "FORECAST.ETS", "FORECAST.ETS.CONFINT",
    "FORECAST.ETS.SEASONALITY", "FORECAST.ETS.STAT", "FORECAST.LINEAR", "FORMULATEXT", "GAMMA",
    "GAMMA.DIST", "GAMMA.INV", "GAMMALN.PRECISE", "GAUSS", "HYPGEOM.DIST", "IFNA", "IFS",
    "IMCOSH", "IMCOT", "IMCSC", "IMCSCH", "IMSEC", "IMSECH", "IMSINH", "IMTAN", "ISFORMULA",
    "ISOWEEKNUM", "LOGNORM.DIST", "LOGNORM.INV", "MAXIFS", "MINIFS", "MODE.MULT", "MODE.SNGL",
    "MUNIT", "NEGBINOM.DIST", "NORM.DIST", "NORM.INV", "NORM.S.DIST", "NORM.S.INV",
    "NUMBERVALUE", "PDURATION", "PERCENTILE.EXC", "PERCENTILE.INC", "PERCENTRANK.EXC",
    "PERCENTRANK.INC", "PERMUTATIONA", "PHI", "POISSON.DIST", "QUARTILE.EXC", "QUARTILE.INC",
    "QUERYSTRING", "RANK.AVG", "RANK.EQ", "RRI", "SEC", "SECH", "SHEET", "SHEETS", "SKEW.P",
    "STDEV.P", "STDEV.S", "SWITCH", "T.DIST", "T.DIST.2T", "T.DIST.RT", "T.INV", "T.INV.2T",
    "T.TEST", "TEXTJOIN", "UNICHAR", "UNICODE", "VAR.P", "VAR.S", "WEBSERVICE", "WEIBULL.DIST",
    "XOR", "Z.TEST",
    // Dynamic array era.
    "ANCHORARRAY", "BYCOL", "BYROW", "CHOOSECOLS", "CHOOSEROWS", "DROP", "EXPAND", "HSTACK",
    "ISOMITTED", "LAMBDA", "LET", "MAKEARRAY", "MAP", "RANDARRAY", "REDUCE", "SCAN", "SEQUENCE",
    "SINGLE", "SORTBY", "TAKE", "TEXTAFTER", "TEXTBEFORE", "TEXTSPLIT", "TOCOL", "TOROW",
    "UNIQUE", "VSTACK", "WRAPCOLS", "WRAPROWS", "XLOOKUP", "XMATCH",
];

/// Functions stored as `_xlfn._xlws.NAME`.
const WORKSHEET_FUTURE_FUNCTIONS: &[&str] = &["FILTER", "SORT"];

/// Functions whose presence makes a formula spill as a dynamic array.
const DYNAMIC_FUNCTIONS: &[&str] = &[
    "ANCHORARRAY", "BYCOL", "BYROW", "CHOOSECOLS", "CHOOSEROWS", "DROP", "EXPAND", "FILTER",
    "HSTACK", "LAMBDA", "MAKEARRAY", "MAP", "RANDARRAY", "REDUCE", "SCAN", "SEQUENCE", "SORT",
    "SORTBY", "TAKE", "TOCOL", "TOROW", "UNIQUE", "VSTACK", "WRAPCOLS", "WRAPROWS", "XLOOKUP",
];

fn future_set() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| FUTURE_FUNCTIONS.iter().copied().collect())
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '_'
}

/// Function-call tokens (`NAME(`) in the formula, outside string literals.
fn function_tokens(formula: &str) -> Vec<(usize, usize)> {
    let bytes = formula.as_bytes();
    let mut tokens = Vec::new();
    let mut in_string = false;
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c == '"' {
            in_string = !in_string;
            i += 1;
            continue;
        }
        if in_string || !(c.is_ascii_alphabetic() || c == '_') {
            i += 1;
            continue;
        }
        let boundary = i == 0 || !is_name_char(bytes[i - 1] as char);
        let start = i;
        while i < bytes.len() && is_name_char(bytes[i] as char) {
            i += 1;
        }
        if boundary && bytes.get(i) == Some(&b'(') {
            tokens.push((start, i));
        }
    }
    tokens
}

/// Add `_xlfn.` / `_xlfn._xlws.` prefixes to future functions.
///
/// A formula that already contains `_xlfn.` is returned untouched, which
/// makes the rewrite idempotent.
pub fn expand_future_functions(formula: &str) -> String {
    if formula.contains("_xlfn.") {
        return formula.to_string();
    }
    let mut out = String::with_capacity(formula.len() + 16);
    let mut last = 0;
    for (start, end) in function_tokens(formula) {
        let name = &formula[start..end];
        let prefix = if WORKSHEET_FUTURE_FUNCTIONS.contains(&name) {
            "_xlfn._xlws."
        } else if future_set().contains(name) {
            "_xlfn."
        } else {
            continue;
        };
        out.push_str(&formula[last..start]);
        out.push_str(prefix);
        last = start;
    }
    out.push_str(&formula[last..]);
    out
}

/// True when the formula calls a function that returns a spilled array.
pub fn has_dynamic_function(formula: &str) -> bool {
    function_tokens(formula).into_iter().any(|(start, end)| {
        let name = &formula[start..end];
        let name = name
            .strip_prefix("_xlfn._xlws.")
            .or_else(|| name.strip_prefix("_xlfn."))
            .unwrap_or(name);
        DYNAMIC_FUNCTIONS.contains(&name)
    })
}

/// Normalize a user formula for storage in `<f>`.
pub fn prepare_formula(formula: &str) -> String {
    let mut f = formula.trim();
    if let Some(stripped) = f.strip_prefix('{') {
        f = stripped.strip_suffix('}').unwrap_or(stripped);
    }
    let f = f.strip_prefix('=').unwrap_or(f);
    expand_future_functions(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_equals_and_braces() {
        assert_eq!(prepare_formula("=SUM(A1:A3)"), "SUM(A1:A3)");
        assert_eq!(prepare_formula("{=TREND(A1:A3)}"), "TREND(A1:A3)");
        assert_eq!(prepare_formula("A1+1"), "A1+1");
    }

    #[test]
    fn test_future_function_prefixes() {
        assert_eq!(prepare_formula("=STDEV.S(A1:A10)"), "_xlfn.STDEV.S(A1:A10)");
        assert_eq!(prepare_formula("=FILTER(A1:A10,B1:B10>1)"), "_xlfn._xlws.FILTER(A1:A10,B1:B10>1)");
        assert_eq!(
            prepare_formula("=IFS(A1>1,XLOOKUP(1,B:B,C:C),TRUE,0)"),
            "_xlfn.IFS(A1>1,_xlfn.XLOOKUP(1,B:B,C:C),TRUE,0)"
        );
        assert_eq!(prepare_formula("=SUM(A1)"), "SUM(A1)");
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let once = prepare_formula("=UNIQUE(SORT(A1:A9))");
        assert_eq!(once, "_xlfn.UNIQUE(_xlfn._xlws.SORT(A1:A9))");
        assert_eq!(prepare_formula(&once), once);
    }

    #[test]
    fn test_names_inside_strings_and_longer_names_untouched() {
        assert_eq!(prepare_formula("=\"SEQUENCE(\"&A1"), "\"SEQUENCE(\"&A1");
        assert_eq!(prepare_formula("=MYSORT(A1)"), "MYSORT(A1)");
        assert_eq!(prepare_formula("=SORTED(A1)"), "SORTED(A1)");
    }

    #[test]
    fn test_dynamic_detection() {
        assert!(has_dynamic_function("_xlfn.UNIQUE(A1:A3)"));
        assert!(has_dynamic_function("SEQUENCE(5)"));
        assert!(!has_dynamic_function("SUM(A1:A3)"));
    }
}
