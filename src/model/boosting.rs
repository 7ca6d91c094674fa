//! Gradient-boosted regression trees under squared loss.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::model::error::ModelError;
use crate::model::tree::{DecisionTreeRegressor, FittedTree};
use crate::model::{check_features, check_training_data, FittedRegressor, Regressor};

/// Each stage fits a tree to the current residuals and adds it, shrunk by
/// the learning rate. The initial prediction is the target mean.
#[derive(Clone, Debug)]
pub struct GradientBoostingRegressor {
    n_estimators: usize,
    learning_rate: f64,
    max_depth: usize,
}

impl Default for GradientBoostingRegressor {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 5,
        }
    }
}

impl GradientBoostingRegressor {
    pub fn new(n_estimators: usize, learning_rate: f64, max_depth: usize) -> Self {
        Self {
            n_estimators,
            learning_rate,
            max_depth,
        }
    }
}

impl Regressor for GradientBoostingRegressor {
    type Fitted = FittedGradientBoosting;

    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedGradientBoosting, ModelError> {
        check_training_data(x, y)?;
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(ModelError::InvalidParameter(format!(
                "learning rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }

        let init = y
            .mean()
            .ok_or_else(|| ModelError::EmptyData("no targets".to_string()))?;
        let base = DecisionTreeRegressor::new().with_max_depth(self.max_depth);

        let mut current = Array1::from_elem(y.len(), init);
        let mut stages = Vec::with_capacity(self.n_estimators);

        for _ in 0..self.n_estimators {
            let residual = y - &current;
            let tree = base.fit(x, &residual)?;
            current.scaled_add(self.learning_rate, &tree.predict(x)?);
            stages.push(tree);
        }

        Ok(FittedGradientBoosting {
            init,
            learning_rate: self.learning_rate,
            stages,
            n_features: x.ncols(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FittedGradientBoosting {
    init: f64,
    learning_rate: f64,
    stages: Vec<FittedTree>,
    n_features: usize,
}

impl FittedGradientBoosting {
    pub fn n_stages(&self) -> usize {
        self.stages.len()
    }
}

impl FittedRegressor for FittedGradientBoosting {
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        check_features(self.n_features, x)?;
        let mut out = Array1::from_elem(x.nrows(), self.init);
        for tree in &self.stages {
            out.scaled_add(self.learning_rate, &tree.predict(x)?);
        }
        Ok(out)
    }

    fn n_features_in(&self) -> usize {
        self.n_features
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boosting_reduces_training_error() {
        let x = Array2::from_shape_fn((40, 1), |(i, _)| i as f64);
        let y = x.column(0).mapv(|v| (v / 4.0).sin() * 10.0 + v);

        let mse = |stages: usize| {
            let fitted = GradientBoostingRegressor::new(stages, 0.1, 3)
                .fit(&x, &y)
                .unwrap();
            let pred = fitted.predict(&x).unwrap();
            (&pred - &y).mapv(|e| e * e).mean().unwrap()
        };

        assert!(mse(50) < mse(5));
        assert!(mse(5) < mse(0));
    }

    #[test]
    fn test_zero_stages_predicts_mean() {
        let x = Array2::from_shape_fn((4, 1), |(i, _)| i as f64);
        let y = Array1::from(vec![1.0, 2.0, 3.0, 6.0]);

        let fitted = GradientBoostingRegressor::new(0, 0.1, 3).fit(&x, &y).unwrap();
        assert_eq!(fitted.predict(&x).unwrap().to_vec(), vec![3.0; 4]);
    }

    #[test]
    fn test_boosting_invalid_learning_rate() {
        let x = Array2::<f64>::zeros((2, 1));
        let y = Array1::<f64>::zeros(2);
        assert!(GradientBoostingRegressor::new(10, 0.0, 3).fit(&x, &y).is_err());
    }
}
