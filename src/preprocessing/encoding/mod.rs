//! Categorical feature encoding transformers.
//!
//! ## OneHotEncoder
//! Converts string categories to indicator columns.
//!
//! ```ignore
//! // Input: [["Sokol"], ["Arbatskaya"]]  (2 samples, 1 categorical feature)
//! // Output: [[0, 1], [1, 0]]            (2 samples, 2 binary features)
//! ```

mod one_hot;

pub use one_hot::{FittedOneHotEncoder, OneHotEncoder};

/// Strategy for handling unknown categories during transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum HandleUnknown {
    /// Raise an error when unknown categories are encountered.
    #[default]
    Error,
    /// Ignore unknown categories (output an all-zero block).
    Ignore,
}
