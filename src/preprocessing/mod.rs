//! Data preprocessing transformers.
//!
//! Transformers follow a type-state pattern: an unfitted value carries
//! hyperparameters, `fit` returns a separate fitted value that owns the
//! learned state, and only the fitted value can `transform`.
//!
//! # Core Traits
//!
//! - [`Transformer`]: Unfitted transformer with hyperparameters
//! - [`FittedTransformer`]: Fitted transformer ready for inference
//!
//! # Available Transformers
//!
//! - [`OneHotEncoder`]: categorical strings to indicator columns
//! - [`StandardScaler`]: Z-score normalization
//! - [`FeatureTransformer`]: both of the above applied to a [`FeatureFrame`](crate::features::FeatureFrame)
//!
//! # Example
//!
//! ```ignore
//! use rental_ml::features::{FeatureFrame, PriceFeatures};
//! use rental_ml::preprocessing::{FeatureTransformer, FittedTransformer, Transformer};
//!
//! let frame = FeatureFrame::from_rows(&rows);
//! let fitted = FeatureTransformer::new().fit(&frame)?;
//! let matrix = fitted.transform(&FeatureFrame::from_row(&request))?;
//! ```

pub mod column_transformer;
pub mod encoding;
pub mod error;
pub mod scaling;
pub mod traits;

pub use column_transformer::{FeatureTransformer, FittedFeatureTransformer};
pub use encoding::{FittedOneHotEncoder, HandleUnknown, OneHotEncoder};
pub use error::PreprocessingError;
pub use scaling::{FittedStandardScaler, StandardScaler};
pub use traits::{FittedTransformer, Transformer};
