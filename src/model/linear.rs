//! Linear models: least squares, ridge, lasso and elastic net.
//!
//! All four fit an intercept by centering `x` and `y` first, then solve for
//! the coefficients of the centered problem. The intercept is recovered as
//! `mean(y) - mean(x) . coef`.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::model::error::ModelError;
use crate::model::linalg::cholesky_solve;
use crate::model::{check_features, check_training_data, FittedRegressor, Regressor};

/// Fitted linear model `y = x . coef + intercept`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FittedLinear {
    coef: Array1<f64>,
    intercept: f64,
}

impl FittedLinear {
    pub(crate) fn from_parts(coef: Array1<f64>, intercept: f64) -> Self {
        Self { coef, intercept }
    }

    pub fn coef(&self) -> &Array1<f64> {
        &self.coef
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl FittedRegressor for FittedLinear {
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        check_features(self.coef.len(), x)?;
        Ok(x.dot(&self.coef) + self.intercept)
    }

    fn n_features_in(&self) -> usize {
        self.coef.len()
    }
}

struct Centered {
    x: Array2<f64>,
    y: Array1<f64>,
    x_mean: Array1<f64>,
    y_mean: f64,
}

fn center(x: &Array2<f64>, y: &Array1<f64>) -> Result<Centered, ModelError> {
    check_training_data(x, y)?;
    let x_mean = x
        .mean_axis(Axis(0))
        .ok_or_else(|| ModelError::EmptyData("Cannot center zero rows".to_string()))?;
    let y_mean = y
        .mean()
        .ok_or_else(|| ModelError::EmptyData("Cannot center zero targets".to_string()))?;
    Ok(Centered {
        x: x - &x_mean,
        y: y - y_mean,
        x_mean,
        y_mean,
    })
}

fn finish(coef: Array1<f64>, centered: &Centered) -> Result<FittedLinear, ModelError> {
    let intercept = centered.y_mean - centered.x_mean.dot(&coef);
    if !intercept.is_finite() || coef.iter().any(|c| !c.is_finite()) {
        return Err(ModelError::Numerical(
            "non-finite linear coefficients".to_string(),
        ));
    }
    Ok(FittedLinear { coef, intercept })
}

/// Solve `(XᵀX + penalty·I) w = Xᵀy` on centered data.
fn solve_normal_equations(c: &Centered, penalty: f64) -> Result<Array1<f64>, ModelError> {
    let mut gram = c.x.t().dot(&c.x);
    for i in 0..gram.nrows() {
        gram[[i, i]] += penalty;
    }
    let rhs = c.x.t().dot(&c.y);
    cholesky_solve(&gram, &rhs)
}

/// Ordinary least squares.
///
/// One-hot blocks are collinear with the intercept, so the normal equations
/// are singular by construction. A vanishing diagonal jitter, scaled to the
/// Gram trace, picks a solution; it grows tenfold while the factorisation
/// still fails.
#[derive(Clone, Debug)]
pub struct LinearRegression {
    jitter: f64,
    max_retries: usize,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self {
            jitter: 1e-10,
            max_retries: 10,
        }
    }
}

impl LinearRegression {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Regressor for LinearRegression {
    type Fitted = FittedLinear;

    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedLinear, ModelError> {
        let c = center(x, y)?;
        let p = c.x.ncols();
        if p == 0 {
            return finish(Array1::zeros(0), &c);
        }

        let trace: f64 = c.x.iter().map(|v| v * v).sum();
        let mut penalty = self.jitter * (trace / p as f64).max(1.0);

        let mut last_err = None;
        for _ in 0..=self.max_retries {
            match solve_normal_equations(&c, penalty) {
                Ok(coef) => return finish(coef, &c),
                Err(e) => {
                    last_err = Some(e);
                    penalty *= 10.0;
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            ModelError::Numerical("least squares did not converge".to_string())
        }))
    }
}

/// Least squares with an L2 penalty `alpha * ||w||²`.
#[derive(Clone, Debug)]
pub struct Ridge {
    alpha: f64,
}

impl Default for Ridge {
    fn default() -> Self {
        Self { alpha: 1.0 }
    }
}

impl Ridge {
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl Regressor for Ridge {
    type Fitted = FittedLinear;

    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedLinear, ModelError> {
        if self.alpha <= 0.0 || self.alpha.is_nan() {
            return Err(ModelError::InvalidParameter(format!(
                "ridge alpha must be positive, got {}",
                self.alpha
            )));
        }
        let c = center(x, y)?;
        let coef = solve_normal_equations(&c, self.alpha)?;
        finish(coef, &c)
    }
}

/// Elastic net by cyclic coordinate descent.
///
/// Minimises
/// ```text
/// 1/(2n) ||y - Xw||² + alpha * l1_ratio * ||w||₁ + alpha * (1 - l1_ratio) / 2 * ||w||²
/// ```
#[derive(Clone, Debug)]
pub struct ElasticNet {
    alpha: f64,
    l1_ratio: f64,
    max_iter: usize,
    tol: f64,
}

impl Default for ElasticNet {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            l1_ratio: 0.5,
            max_iter: 1000,
            tol: 1e-4,
        }
    }
}

impl ElasticNet {
    pub fn new(alpha: f64, l1_ratio: f64) -> Self {
        Self {
            alpha,
            l1_ratio,
            ..Self::default()
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }
}

fn soft_threshold(value: f64, threshold: f64) -> f64 {
    if value > threshold {
        value - threshold
    } else if value < -threshold {
        value + threshold
    } else {
        0.0
    }
}

impl Regressor for ElasticNet {
    type Fitted = FittedLinear;

    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedLinear, ModelError> {
        if self.alpha < 0.0 || !(0.0..=1.0).contains(&self.l1_ratio) {
            return Err(ModelError::InvalidParameter(format!(
                "elastic net needs alpha >= 0 and l1_ratio in [0, 1], got {} and {}",
                self.alpha, self.l1_ratio
            )));
        }
        let c = center(x, y)?;
        let (n, p) = c.x.dim();
        let n = n as f64;

        let l1 = n * self.alpha * self.l1_ratio;
        let l2 = n * self.alpha * (1.0 - self.l1_ratio);
        let col_sq: Vec<f64> = c.x.columns().into_iter().map(|col| col.dot(&col)).collect();

        let mut coef = Array1::<f64>::zeros(p);
        let mut residual = c.y.clone();

        for _ in 0..self.max_iter {
            let mut max_delta: f64 = 0.0;
            let mut max_coef: f64 = 0.0;

            for j in 0..p {
                let denom = col_sq[j] + l2;
                if denom == 0.0 {
                    continue;
                }
                let col = c.x.column(j);
                let old = coef[j];
                // Correlation with the residual that excludes feature j
                let rho = col.dot(&residual) + col_sq[j] * old;
                let new = soft_threshold(rho, l1) / denom;

                if new != old {
                    residual.scaled_add(old - new, &col);
                    coef[j] = new;
                }
                max_delta = max_delta.max((new - old).abs());
                max_coef = max_coef.max(new.abs());
            }

            if max_delta <= self.tol * max_coef.max(1.0) {
                break;
            }
        }

        finish(coef, &c)
    }
}

/// Lasso: elastic net with a pure L1 penalty.
#[derive(Clone, Debug)]
pub struct Lasso {
    inner: ElasticNet,
}

impl Default for Lasso {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl Lasso {
    pub fn new(alpha: f64) -> Self {
        Self {
            inner: ElasticNet::new(alpha, 1.0),
        }
    }
}

impl Regressor for Lasso {
    type Fitted = FittedLinear;

    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedLinear, ModelError> {
        self.inner.fit(x, y)
    }
}
