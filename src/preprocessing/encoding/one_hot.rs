//! One-hot encoding for categorical features.
//!
//! Transforms string categories to indicator vectors.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::preprocessing::encoding::HandleUnknown;
use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::traits::{FittedTransformer, Transformer};

/// One-hot encoder for categorical features.
///
/// Each input column is treated as a categorical feature, and the encoder
/// learns the distinct values present in each column during fitting. The
/// vocabulary of a column is sorted, so the output layout does not depend on
/// row order.
///
/// # Example
/// ```ignore
/// // Input: 3 samples with 1 categorical feature each
/// let data = Array2::from_shape_vec((3, 1), vec!["red".into(), "green".into(), "blue".into()])?;
///
/// let fitted = OneHotEncoder::new().fit(&data)?;
///
/// // Output: 3x3 indicator matrix over ["blue", "green", "red"]
/// let encoded = fitted.transform(&data)?;
/// // [[0, 0, 1],
/// //  [0, 1, 0],
/// //  [1, 0, 0]]
/// ```
#[derive(Clone, Debug, Default)]
pub struct OneHotEncoder {
    /// How to handle unknown categories during transform.
    handle_unknown: HandleUnknown,
}

impl OneHotEncoder {
    /// Create a new OneHotEncoder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the strategy for handling unknown categories.
    pub fn with_handle_unknown(mut self, strategy: HandleUnknown) -> Self {
        self.handle_unknown = strategy;
        self
    }
}

/// Fitted OneHotEncoder ready for inference.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FittedOneHotEncoder {
    /// Sorted distinct categories for each input column.
    categories: Vec<Vec<String>>,
    /// Start of each column's block in the output.
    offsets: Vec<usize>,
    /// Total number of output features.
    n_features_out: usize,
    handle_unknown: HandleUnknown,
}

impl FittedOneHotEncoder {
    /// Get the categories learned for each feature.
    pub fn categories(&self) -> &[Vec<String>] {
        &self.categories
    }

    /// Get the number of categories per input feature.
    pub fn n_values(&self) -> Vec<usize> {
        self.categories.iter().map(Vec::len).collect()
    }
}

impl Transformer for OneHotEncoder {
    type Input = Array2<String>;
    type Output = Array2<f64>;
    type Fitted = FittedOneHotEncoder;

    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted, PreprocessingError> {
        if data.nrows() == 0 {
            return Err(PreprocessingError::EmptyData(
                "Cannot fit OneHotEncoder on empty data".to_string(),
            ));
        }

        let categories: Vec<Vec<String>> = data
            .columns()
            .into_iter()
            .map(|column| {
                column
                    .iter()
                    .cloned()
                    .collect::<BTreeSet<String>>()
                    .into_iter()
                    .collect()
            })
            .collect();

        let mut offsets = Vec::with_capacity(categories.len());
        let mut n_features_out = 0;
        for cats in &categories {
            offsets.push(n_features_out);
            n_features_out += cats.len();
        }

        Ok(FittedOneHotEncoder {
            categories,
            offsets,
            n_features_out,
            handle_unknown: self.handle_unknown,
        })
    }
}

impl FittedTransformer for FittedOneHotEncoder {
    type Input = Array2<String>;
    type Output = Array2<f64>;

    fn transform(&self, data: &Self::Input) -> Result<Self::Output, PreprocessingError> {
        let (rows, cols) = data.dim();

        if cols != self.categories.len() {
            return Err(PreprocessingError::FeatureMismatch {
                expected_features: self.categories.len(),
                got_features: cols,
            });
        }

        let mut result = Array2::<f64>::zeros((rows, self.n_features_out));

        for ((row, col), value) in data.indexed_iter() {
            // Vocabulary is sorted, so binary search gives the block position.
            match self.categories[col].binary_search(value) {
                Ok(idx) => result[[row, self.offsets[col] + idx]] = 1.0,
                Err(_) => {
                    if self.handle_unknown == HandleUnknown::Error {
                        return Err(PreprocessingError::UnknownCategory {
                            category: value.clone(),
                            column: col,
                        });
                    }
                    // With Ignore, leave the block as zeros
                }
            }
        }

        Ok(result)
    }

    fn n_features_in(&self) -> usize {
        self.categories.len()
    }

    fn n_features_out(&self) -> usize {
        self.n_features_out
    }
}
