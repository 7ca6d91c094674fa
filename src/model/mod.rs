//! Regression estimators.
//!
//! Estimators use the same type-state split as the preprocessing layer: an
//! unfitted [`Regressor`] holds hyperparameters, [`Regressor::fit`] returns a
//! separate [`FittedRegressor`] that owns the learned parameters.
//!
//! # Available Estimators
//!
//! - [`LinearRegression`], [`Ridge`], [`Lasso`], [`ElasticNet`]: linear models
//! - [`LinearSvr`]: linear support-vector regression
//! - [`DecisionTreeRegressor`]: CART base learner
//! - [`RandomForestRegressor`]: bagged trees
//! - [`GradientBoostingRegressor`]: boosted trees under squared loss
//!
//! [`Candidate`] lists them in the fixed order the price predictor compares
//! them.

use ndarray::{Array1, Array2};

pub mod boosting;
pub mod candidate;
pub mod error;
pub mod forest;
mod linalg;
pub mod linear;
pub mod svr;
pub mod tree;

pub use boosting::{FittedGradientBoosting, GradientBoostingRegressor};
pub use candidate::{Candidate, FittedCandidate};
pub use error::ModelError;
pub use forest::{FittedRandomForest, RandomForestRegressor};
pub use linear::{ElasticNet, FittedLinear, Lasso, LinearRegression, Ridge};
pub use svr::LinearSvr;
pub use tree::{DecisionTreeRegressor, FittedTree};

/// An unfitted regression estimator.
pub trait Regressor {
    type Fitted: FittedRegressor;

    /// Learn parameters from a design matrix and its targets.
    ///
    /// # Errors
    /// Returns [`ModelError`] if the data is empty, shapes disagree, or the
    /// solver breaks down.
    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Self::Fitted, ModelError>;
}

/// A fitted regression estimator ready for inference.
pub trait FittedRegressor {
    /// Predict one target per row of `x`.
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError>;

    /// Number of columns seen during fit.
    fn n_features_in(&self) -> usize;
}

/// Shape checks shared by every `fit`.
pub(crate) fn check_training_data(x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelError> {
    if x.nrows() == 0 {
        return Err(ModelError::EmptyData(
            "Cannot fit on zero rows".to_string(),
        ));
    }
    if x.nrows() != y.len() {
        return Err(ModelError::TargetMismatch {
            rows: x.nrows(),
            targets: y.len(),
        });
    }
    Ok(())
}

pub(crate) fn check_features(expected: usize, x: &Array2<f64>) -> Result<(), ModelError> {
    if x.ncols() != expected {
        return Err(ModelError::FeatureMismatch {
            expected_features: expected,
            got_features: x.ncols(),
        });
    }
    Ok(())
}
