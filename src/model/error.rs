//! Error types for estimator fitting and inference.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Feature mismatch: expected {expected_features} features, got {got_features}")]
    FeatureMismatch {
        expected_features: usize,
        got_features: usize,
    },

    /// Row count of the design matrix differs from the target length.
    #[error("Target mismatch: {rows} rows but {targets} targets")]
    TargetMismatch { rows: usize, targets: usize },

    /// Solver broke down or produced non-finite parameters.
    #[error("Numerical failure: {0}")]
    Numerical(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_mismatch_display() {
        let err = ModelError::TargetMismatch {
            rows: 4,
            targets: 3,
        };
        assert_eq!(err.to_string(), "Target mismatch: 4 rows but 3 targets");
    }
}
