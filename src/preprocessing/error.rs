//! Error types for preprocessing operations.

use thiserror::Error;

/// Error type for preprocessing operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PreprocessingError {
    /// Empty data provided where non-empty was required.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Feature dimension mismatch.
    #[error("Feature mismatch: expected {expected_features} features, got {got_features}")]
    FeatureMismatch {
        expected_features: usize,
        got_features: usize,
    },

    /// Input columns are not the ones the transformer was fitted on.
    #[error("Schema mismatch: expected columns {expected:?}, got {got:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        got: Vec<String>,
    },

    /// A numerical input is NaN or infinite.
    #[error("Non-finite value in column '{column}'")]
    NonFinite { column: String },

    /// Unknown category met by an encoder configured to reject it.
    #[error("Unknown category '{category}' in column {column}")]
    UnknownCategory { category: String, column: usize },
}
