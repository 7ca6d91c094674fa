//! Linear support-vector regression.

use ndarray::{Array1, Array2};

use crate::model::error::ModelError;
use crate::model::linear::FittedLinear;
use crate::model::{check_training_data, Regressor};

/// Linear SVR with an epsilon-insensitive loss.
///
/// Minimises
/// ```text
/// ||w||² / (2 C n) + mean(max(0, |y - Xw - b| - epsilon))
/// ```
/// by full-batch subgradient descent with step `eta0 / sqrt(t)`, where
/// `eta0` is the target's mean absolute deviation. The iterate with the
/// lowest objective is kept. The bias starts at the target median, so the
/// result is fully deterministic.
#[derive(Clone, Debug)]
pub struct LinearSvr {
    c: f64,
    epsilon: f64,
    max_iter: usize,
}

impl Default for LinearSvr {
    fn default() -> Self {
        Self {
            c: 1.0,
            epsilon: 0.1,
            max_iter: 1000,
        }
    }
}

impl LinearSvr {
    pub fn new(c: f64, epsilon: f64) -> Self {
        Self {
            c,
            epsilon,
            ..Self::default()
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    fn objective(&self, x: &Array2<f64>, y: &Array1<f64>, w: &Array1<f64>, b: f64) -> f64 {
        let n = y.len() as f64;
        let residual = y - &(x.dot(w) + b);
        let loss = residual
            .iter()
            .map(|r| (r.abs() - self.epsilon).max(0.0))
            .sum::<f64>()
            / n;
        w.dot(w) / (2.0 * self.c * n) + loss
    }
}

fn median(values: &Array1<f64>) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

impl Regressor for LinearSvr {
    type Fitted = FittedLinear;

    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedLinear, ModelError> {
        check_training_data(x, y)?;
        if self.c <= 0.0 || self.c.is_nan() || self.epsilon < 0.0 {
            return Err(ModelError::InvalidParameter(format!(
                "SVR needs C > 0 and epsilon >= 0, got {} and {}",
                self.c, self.epsilon
            )));
        }

        let (n, p) = x.dim();
        let nf = n as f64;

        let mut w = Array1::<f64>::zeros(p);
        let mut b = median(y);
        let eta0 = (y.iter().map(|v| (v - b).abs()).sum::<f64>() / nf).max(1.0);

        let mut best = (self.objective(x, y, &w, b), w.clone(), b);

        for t in 1..=self.max_iter {
            let residual = y - &(x.dot(&w) + b);
            // Subgradient of the loss term w.r.t. the prediction.
            let signs = residual.mapv(|r| {
                if r > self.epsilon {
                    1.0
                } else if r < -self.epsilon {
                    -1.0
                } else {
                    0.0
                }
            });

            let grad_w = &w / (self.c * nf) - x.t().dot(&signs) / nf;
            let grad_b = -signs.sum() / nf;

            let eta = eta0 / (t as f64).sqrt();
            w.scaled_add(-eta, &grad_w);
            b -= eta * grad_b;

            let objective = self.objective(x, y, &w, b);
            if objective < best.0 {
                best = (objective, w.clone(), b);
            }
        }

        let (objective, coef, intercept) = best;
        if !objective.is_finite() {
            return Err(ModelError::Numerical(
                "SVR objective diverged".to_string(),
            ));
        }
        Ok(FittedLinear::from_parts(coef, intercept))
    }
}
