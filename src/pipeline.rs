//! Fitted preprocessing plus a fitted estimator, used as one unit.

use ndarray::{Array1, Array2};
use thiserror::Error;

use crate::features::FeatureFrame;
use crate::model::{Candidate, FittedCandidate, FittedRegressor, ModelError};
use crate::preprocessing::{
    FeatureTransformer, FittedFeatureTransformer, FittedTransformer, PreprocessingError,
    Transformer,
};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Preprocessing(#[from] PreprocessingError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// A trained price pipeline. Refitting builds a new value; nothing here is
/// updated in place.
#[derive(Clone, Debug)]
pub struct PricePipeline {
    name: &'static str,
    transformer: FittedFeatureTransformer,
    model: FittedCandidate,
}

impl PricePipeline {
    /// Fit the preprocessing on `frame`, then the candidate on the
    /// transformed matrix.
    pub fn fit(
        candidate: &Candidate,
        frame: &FeatureFrame,
        targets: &Array1<f64>,
    ) -> Result<Self, PipelineError> {
        let transformer = FeatureTransformer::new().fit(frame)?;
        let x = transformer.transform(frame)?;
        let model = candidate.fit(&x, targets)?;
        Ok(Self {
            name: candidate.name(),
            transformer,
            model,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Transform `frame` with the frozen preprocessing.
    pub fn features(&self, frame: &FeatureFrame) -> Result<Array2<f64>, PipelineError> {
        Ok(self.transformer.transform(frame)?)
    }

    /// Raw model output, one value per row.
    pub fn predict(&self, frame: &FeatureFrame) -> Result<Array1<f64>, PipelineError> {
        let x = self.features(frame)?;
        Ok(self.model.predict(&x)?)
    }

    pub fn model(&self) -> &FittedCandidate {
        &self.model
    }

    pub fn transformer(&self) -> &FittedFeatureTransformer {
        &self.transformer
    }
}
