//! Two-branch column transformer over a [`FeatureFrame`].
//!
//! The categorical block goes through a [`OneHotEncoder`] that maps unseen
//! categories to zeros, the numerical block through a [`StandardScaler`].
//! The output is the horizontal concatenation `[one-hot | scaled]`.

use ndarray::{concatenate, Array2, Axis};

use crate::features::FeatureFrame;
use crate::preprocessing::encoding::{FittedOneHotEncoder, HandleUnknown, OneHotEncoder};
use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::scaling::{FittedStandardScaler, StandardScaler};
use crate::preprocessing::traits::{FittedTransformer, Transformer};

/// Unfitted feature transformer.
#[derive(Clone, Debug)]
pub struct FeatureTransformer {
    encoder: OneHotEncoder,
    scaler: StandardScaler,
}

impl Default for FeatureTransformer {
    fn default() -> Self {
        Self {
            encoder: OneHotEncoder::new().with_handle_unknown(HandleUnknown::Ignore),
            scaler: StandardScaler::new(),
        }
    }
}

impl FeatureTransformer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transformer for FeatureTransformer {
    type Input = FeatureFrame;
    type Output = Array2<f64>;
    type Fitted = FittedFeatureTransformer;

    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted, PreprocessingError> {
        if data.n_rows() == 0 {
            return Err(PreprocessingError::EmptyData(
                "Cannot fit FeatureTransformer on an empty frame".to_string(),
            ));
        }

        let encoder = self.encoder.fit(data.categorical())?;
        let scaler = self.scaler.fit(data.numerical())?;

        Ok(FittedFeatureTransformer {
            categorical_names: data.categorical_names(),
            numerical_names: data.numerical_names(),
            encoder,
            scaler,
        })
    }
}

/// Frozen encoding vocabulary and scaling statistics.
#[derive(Clone, Debug)]
pub struct FittedFeatureTransformer {
    categorical_names: &'static [&'static str],
    numerical_names: &'static [&'static str],
    encoder: FittedOneHotEncoder,
    scaler: FittedStandardScaler,
}

impl FittedFeatureTransformer {
    pub fn encoder(&self) -> &FittedOneHotEncoder {
        &self.encoder
    }

    pub fn scaler(&self) -> &FittedStandardScaler {
        &self.scaler
    }

    fn check_schema(&self, data: &FeatureFrame) -> Result<(), PreprocessingError> {
        if data.categorical_names() == self.categorical_names
            && data.numerical_names() == self.numerical_names
        {
            return Ok(());
        }
        let names = |cat: &[&str], num: &[&str]| -> Vec<String> {
            cat.iter().chain(num).map(|s| s.to_string()).collect()
        };
        Err(PreprocessingError::SchemaMismatch {
            expected: names(self.categorical_names, self.numerical_names),
            got: names(data.categorical_names(), data.numerical_names()),
        })
    }
}

impl FittedTransformer for FittedFeatureTransformer {
    type Input = FeatureFrame;
    type Output = Array2<f64>;

    fn transform(&self, data: &Self::Input) -> Result<Self::Output, PreprocessingError> {
        self.check_schema(data)?;

        if let Some(col) = data
            .numerical()
            .columns()
            .into_iter()
            .position(|c| c.iter().any(|v| !v.is_finite()))
        {
            return Err(PreprocessingError::NonFinite {
                column: self.numerical_names[col].to_string(),
            });
        }

        let encoded = self.encoder.transform(data.categorical())?;
        let scaled = self.scaler.transform(data.numerical())?;

        concatenate(Axis(1), &[encoded.view(), scaled.view()]).map_err(|_| {
            PreprocessingError::FeatureMismatch {
                expected_features: self.n_features_out(),
                got_features: encoded.ncols() + scaled.ncols(),
            }
        })
    }

    fn n_features_in(&self) -> usize {
        self.encoder.n_features_in() + self.scaler.n_features_in()
    }

    fn n_features_out(&self) -> usize {
        self.encoder.n_features_out() + self.scaler.n_features_out()
    }
}
