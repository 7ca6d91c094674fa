//! Held-out evaluation of fitted regressors.
//!
//! # Metrics
//!
//! - MSE = mean((y_true - y_pred)^2)
//! - RMSE = sqrt(MSE)
//! - MAE = mean(|y_true - y_pred|)
//! - R² = 1 - SS_res / SS_tot. A constant target gives 1.0 for an exact fit
//!   and 0.0 otherwise.
//! - Relative error = 100 * mean(|y_true - y_pred| / |y_true|), averaged over
//!   rows with a non-zero target. NaN when every target is zero.

use std::collections::BTreeMap;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::model::{FittedRegressor, ModelError};

/// Error measures for one split.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
    pub relative_error_pct: f64,
}

impl RegressionMetrics {
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self, ModelError> {
        if y_true.len() != y_pred.len() {
            return Err(ModelError::TargetMismatch {
                rows: y_pred.len(),
                targets: y_true.len(),
            });
        }
        if y_true.is_empty() {
            return Err(ModelError::EmptyData(
                "Cannot score an empty split".to_string(),
            ));
        }

        let n = y_true.len() as f64;
        let errors = y_true - y_pred;

        let ss_res: f64 = errors.iter().map(|e| e * e).sum();
        let mse = ss_res / n;
        let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

        let mean_true = y_true.sum() / n;
        let ss_tot: f64 = y_true.iter().map(|t| (t - mean_true).powi(2)).sum();
        let r2 = if ss_tot == 0.0 {
            if ss_res == 0.0 {
                1.0
            } else {
                0.0
            }
        } else {
            1.0 - ss_res / ss_tot
        };

        let (rel_sum, rel_count) = y_true
            .iter()
            .zip(errors.iter())
            .filter(|(t, _)| **t != 0.0)
            .fold((0.0, 0usize), |(sum, count), (t, e)| {
                (sum + (e / t).abs(), count + 1)
            });
        let relative_error_pct = if rel_count == 0 {
            f64::NAN
        } else {
            100.0 * rel_sum / rel_count as f64
        };

        Ok(Self {
            mse,
            rmse: mse.sqrt(),
            mae,
            r2,
            relative_error_pct,
        })
    }
}

/// Train and held-out metrics of one candidate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub train_mse: f64,
    pub test_mse: f64,
    pub train_rmse: f64,
    pub test_rmse: f64,
    pub train_mae: f64,
    pub test_mae: f64,
    pub train_r2: f64,
    pub test_r2: f64,
    pub train_rel_error: f64,
    pub test_rel_error: f64,
}

impl ModelMetrics {
    pub fn from_splits(train: &RegressionMetrics, test: &RegressionMetrics) -> Self {
        Self {
            train_mse: train.mse,
            test_mse: test.mse,
            train_rmse: train.rmse,
            test_rmse: test.rmse,
            train_mae: train.mae,
            test_mae: test.mae,
            train_r2: train.r2,
            test_r2: test.r2,
            train_rel_error: train.relative_error_pct,
            test_rel_error: test.relative_error_pct,
        }
    }

    /// Entry for a candidate that could not be fitted. It ranks below every
    /// fitted candidate.
    pub fn failed() -> Self {
        Self {
            train_mse: f64::NAN,
            test_mse: f64::NAN,
            train_rmse: f64::NAN,
            test_rmse: f64::NAN,
            train_mae: f64::NAN,
            test_mae: f64::NAN,
            train_r2: f64::NAN,
            test_r2: f64::NEG_INFINITY,
            train_rel_error: f64::NAN,
            test_rel_error: f64::NAN,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.test_r2 == f64::NEG_INFINITY
    }
}

/// Score a fitted model on its training split and its held-out split.
pub fn evaluate<M: FittedRegressor>(
    model: &M,
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_test: &Array2<f64>,
    y_test: &Array1<f64>,
) -> Result<ModelMetrics, ModelError> {
    let train = RegressionMetrics::compute(y_train, &model.predict(x_train)?)?;
    let test = RegressionMetrics::compute(y_test, &model.predict(x_test)?)?;
    Ok(ModelMetrics::from_splits(&train, &test))
}

/// One row of a [`PerformanceReport`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub model: String,
    pub metrics: ModelMetrics,
}

/// Metrics of every candidate from one training run, in comparison order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    entries: Vec<ReportEntry>,
    selected: Option<String>,
}

impl PerformanceReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, model: impl Into<String>, metrics: ModelMetrics) {
        self.entries.push(ReportEntry {
            model: model.into(),
            metrics,
        });
    }

    pub fn with_selected(mut self, model: impl Into<String>) -> Self {
        self.selected = Some(model.into());
        self
    }

    pub fn get(&self, model: &str) -> Option<&ModelMetrics> {
        self.entries
            .iter()
            .find(|e| e.model == model)
            .map(|e| &e.metrics)
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    /// Candidate names in comparison order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.model.as_str()).collect()
    }

    /// Name of the candidate that won the comparison.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the entry with the highest held-out R². Ties go to the
    /// earliest entry and NaN scores never win.
    pub fn best_index(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, entry) in self.entries.iter().enumerate() {
            let score = entry.metrics.test_r2;
            if score.is_nan() {
                continue;
            }
            if best.map_or(true, |(_, b)| score > b) {
                best = Some((i, score));
            }
        }
        best.map(|(i, _)| i)
    }

    pub fn to_map(&self) -> BTreeMap<String, ModelMetrics> {
        self.entries
            .iter()
            .map(|e| (e.model.clone(), e.metrics))
            .collect()
    }
}
