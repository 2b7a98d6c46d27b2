use thiserror::Error;

/// Errors raised while building price tables or computing indicators.
#[derive(Debug, Error)]
pub enum IndicatorError {
    /// A required column is not present in the table
    #[error("missing column: {0}")]
    MissingColumn(String),

    /// A window, span or period that defines no smoothing
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// A column does not line up with the timestamp index
    #[error("column {column} has {actual} values, index has {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Timestamps must be strictly increasing
    #[error("timestamp index is not strictly increasing at position {0}")]
    UnorderedIndex(usize),

    #[error("invalid settings: {0}")]
    Settings(#[from] serde_json::Error),
}

impl IndicatorError {
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        IndicatorError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn missing_column(name: impl Into<String>) -> Self {
        IndicatorError::MissingColumn(name.into())
    }
}

pub type Result<T> = std::result::Result<T, IndicatorError>;
