//! Random forest regression: bagged CART trees averaged at prediction time.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::model::error::ModelError;
use crate::model::tree::{DecisionTreeRegressor, FittedTree};
use crate::model::{check_features, check_training_data, FittedRegressor, Regressor};

#[derive(Clone, Debug)]
pub struct RandomForestRegressor {
    n_estimators: usize,
    max_depth: Option<usize>,
    seed: u64,
}

impl Default for RandomForestRegressor {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: Some(10),
            seed: 42,
        }
    }
}

impl RandomForestRegressor {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            n_estimators,
            ..Self::default()
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl Regressor for RandomForestRegressor {
    type Fitted = FittedRandomForest;

    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedRandomForest, ModelError> {
        check_training_data(x, y)?;
        if self.n_estimators == 0 {
            return Err(ModelError::InvalidParameter(
                "a forest needs at least one tree".to_string(),
            ));
        }

        let mut base = DecisionTreeRegressor::new();
        if let Some(depth) = self.max_depth {
            base = base.with_max_depth(depth);
        }

        let n = x.nrows();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut trees = Vec::with_capacity(self.n_estimators);

        for _ in 0..self.n_estimators {
            let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            trees.push(base.fit_indices(x, y, &sample)?);
        }

        Ok(FittedRandomForest {
            trees,
            n_features: x.ncols(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FittedRandomForest {
    trees: Vec<FittedTree>,
    n_features: usize,
}

impl FittedRandomForest {
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl FittedRegressor for FittedRandomForest {
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        check_features(self.n_features, x)?;
        let mut total = Array1::<f64>::zeros(x.nrows());
        for tree in &self.trees {
            total += &tree.predict(x)?;
        }
        Ok(total / self.trees.len() as f64)
    }

    fn n_features_in(&self) -> usize {
        self.n_features
    }
}
