//! The fixed set of price-model candidates.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::model::boosting::{FittedGradientBoosting, GradientBoostingRegressor};
use crate::model::error::ModelError;
use crate::model::forest::{FittedRandomForest, RandomForestRegressor};
use crate::model::linear::{ElasticNet, FittedLinear, Lasso, LinearRegression, Ridge};
use crate::model::svr::LinearSvr;
use crate::model::{FittedRegressor, Regressor};

/// Unfitted candidate estimator.
#[derive(Clone, Debug)]
pub enum Candidate {
    LinearRegression(LinearRegression),
    Ridge(Ridge),
    Lasso(Lasso),
    ElasticNet(ElasticNet),
    Svr(LinearSvr),
    RandomForest(RandomForestRegressor),
    GradientBoosting(GradientBoostingRegressor),
}

impl Candidate {
    /// All seven candidates in comparison order. Ties in held-out score go
    /// to the earlier entry.
    pub fn default_set(seed: u64) -> Vec<Candidate> {
        vec![
            Candidate::LinearRegression(LinearRegression::new()),
            Candidate::Ridge(Ridge::new(1.0)),
            Candidate::Lasso(Lasso::new(0.1)),
            Candidate::ElasticNet(ElasticNet::new(0.1, 0.5)),
            Candidate::Svr(LinearSvr::new(1.0, 0.1)),
            Candidate::RandomForest(
                RandomForestRegressor::new(100)
                    .with_max_depth(10)
                    .with_random_state(seed),
            ),
            Candidate::GradientBoosting(GradientBoostingRegressor::new(100, 0.1, 5)),
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Candidate::LinearRegression(_) => "Linear Regression",
            Candidate::Ridge(_) => "Ridge",
            Candidate::Lasso(_) => "Lasso",
            Candidate::ElasticNet(_) => "ElasticNet",
            Candidate::Svr(_) => "SVR",
            Candidate::RandomForest(_) => "Random Forest",
            Candidate::GradientBoosting(_) => "Gradient Boosting",
        }
    }

    pub fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedCandidate, ModelError> {
        Ok(match self {
            Candidate::LinearRegression(m) => FittedCandidate::Linear(m.fit(x, y)?),
            Candidate::Ridge(m) => FittedCandidate::Linear(m.fit(x, y)?),
            Candidate::Lasso(m) => FittedCandidate::Linear(m.fit(x, y)?),
            Candidate::ElasticNet(m) => FittedCandidate::Linear(m.fit(x, y)?),
            Candidate::Svr(m) => FittedCandidate::Linear(m.fit(x, y)?),
            Candidate::RandomForest(m) => FittedCandidate::RandomForest(m.fit(x, y)?),
            Candidate::GradientBoosting(m) => FittedCandidate::GradientBoosting(m.fit(x, y)?),
        })
    }
}

/// Fitted candidate. The five linear strategies share one fitted form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FittedCandidate {
    Linear(FittedLinear),
    RandomForest(FittedRandomForest),
    GradientBoosting(FittedGradientBoosting),
}

impl FittedRegressor for FittedCandidate {
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        match self {
            FittedCandidate::Linear(m) => m.predict(x),
            FittedCandidate::RandomForest(m) => m.predict(x),
            FittedCandidate::GradientBoosting(m) => m.predict(x),
        }
    }

    fn n_features_in(&self) -> usize {
        match self {
            FittedCandidate::Linear(m) => m.n_features_in(),
            FittedCandidate::RandomForest(m) => m.n_features_in(),
            FittedCandidate::GradientBoosting(m) => m.n_features_in(),
        }
    }
}
