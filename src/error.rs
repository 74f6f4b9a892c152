use thiserror::Error;

/// Every fallible operation in the crate returns this error.
///
/// Validation failures are raised at the call that introduced the bad
/// input; `save` only reports packaging and I/O problems plus the checks
/// that need the whole workbook (duplicate names, chart ranges).
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("cell ({row}, {col}) is outside the worksheet limits of 1,048,576 rows by 16,384 columns")]
    Dimension { row: u32, col: u32 },

    #[error("invalid sheet name '{name}': {reason}")]
    SheetName { name: String, reason: String },

    #[error("sheet name '{0}' is already in use (sheet names are case-insensitive)")]
    DuplicateSheetName(String),

    #[error("a chart can hold at most 255 series")]
    TooManySeries,

    #[error("worksheet already holds the maximum of 65,530 hyperlinks")]
    TooManyHyperlinks,

    #[error("url is longer than 2079 characters: '{0}'")]
    UrlTooLong(String),

    #[error("header or footer is longer than 255 characters")]
    HeaderFooterTooLong,

    #[error("string is longer than Excel's limit of 32,767 characters")]
    StringTooLong,

    #[error("merge range {new} overlaps previously merged range {existing}")]
    MergeOverlap { new: String, existing: String },

    #[error("can't merge a single cell: {0}")]
    MergeSingleCell(String),

    #[error("invalid gradient fill: {0}")]
    Gradient(String),

    #[error("invalid pattern fill: {0}")]
    Pattern(String),

    #[error("invalid parameter: {0}")]
    Parameter(String),

    #[error("invalid table: {0}")]
    Table(String),

    #[error("invalid defined name '{0}'")]
    DefinedName(String),

    #[error("unsupported or unreadable image '{0}'")]
    ImageFormat(String),

    #[error("chart range '{formula}' refers to unknown worksheet '{sheet}'")]
    UnknownWorksheetReference { sheet: String, formula: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Zip(String),
}

pub type Result<T> = std::result::Result<T, WriteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: WriteError = io.into();
        assert!(matches!(err, WriteError::Io(_)));
        assert!(err.to_string().starts_with("IO error"));
    }

    #[test]
    fn test_dimension_message() {
        let err = WriteError::Dimension { row: 1_048_576, col: 0 };
        assert!(err.to_string().contains("1048576"));
    }
}
