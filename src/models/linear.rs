//! Linear regression: a non-private baseline and a private variant built on
//! noisy sufficient statistics

#![allow(non_snake_case)]

use linfa::prelude::*;
use linfa_linear::{FittedLinearRegression, LinearRegression};
use ndarray::{Array1, Array2};
use rand::Rng;

use crate::error::ServiceError;
use crate::mechanisms::{Laplace, Mechanism};
use crate::preprocessing::{DataNormalizer, FeatureEngineer, Scaling};

/// Ordinary least squares with intercept.
pub struct BaselineRegressor {
    model: FittedLinearRegression<f64>,
}

impl BaselineRegressor {
    pub fn fit(X: &Array2<f64>, y: &Array1<f64>) -> Result<Self, ServiceError> {
        let dataset = linfa::Dataset::new(X.clone(), y.clone());
        let model = LinearRegression::new()
            .fit(&dataset)
            .map_err(|e| ServiceError::Model(e.to_string()))?;
        Ok(Self { model })
    }

    pub fn predict(&self, X: &Array2<f64>) -> Array1<f64> {
        self.model.predict(X)
    }
}

/// ε-differentially private least squares.
///
/// Features and target are min-max scaled into [0, 1], an intercept column is
/// added, and Laplace noise is applied to XᵀX and Xᵀy with ε/2 each before
/// solving the ridge-stabilised normal equations.
#[derive(Debug, Clone, Copy)]
pub struct PrivateLinearRegression {
    epsilon: f64,
    ridge: f64,
}

impl PrivateLinearRegression {
    pub fn new(epsilon: f64) -> Result<Self, ServiceError> {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(ServiceError::InvalidModelEpsilon);
        }
        Ok(Self { epsilon, ridge: 1.0 })
    }

    pub fn fit<R: Rng + ?Sized>(
        &self,
        X: &Array2<f64>,
        y: &Array1<f64>,
        rng: &mut R,
    ) -> Result<FittedPrivateLinear, ServiceError> {
        if X.nrows() == 0 {
            return Err(ServiceError::Model("empty training partition".to_string()));
        }
        tracing::warn!("Feature and target bounds derived from the training data itself; supply bounds to avoid the privacy leak");

        let mut normalizer = DataNormalizer::new(Scaling::MinMax);
        let Xs = FeatureEngineer::with_intercept(&normalizer.fit_transform(X)?);
        let target = TargetScale::fit(y);
        let ys = y.mapv(|v| target.scale(v));

        let p = Xs.ncols();
        let xtx_mech = Laplace::new(self.epsilon / 2.0, (p * (p + 1) / 2) as f64)?;
        let xty_mech = Laplace::new(self.epsilon / 2.0, p as f64)?;

        let mut xtx = Xs.t().dot(&Xs);
        for i in 0..p {
            for j in i..p {
                let noisy = xtx_mech.randomise(&xtx[[i, j]], rng)?;
                xtx[[i, j]] = noisy;
                xtx[[j, i]] = noisy;
            }
            xtx[[i, i]] += self.ridge;
        }

        let mut xty = Xs.t().dot(&ys);
        for v in xty.iter_mut() {
            *v = xty_mech.randomise(v, rng)?;
        }

        let weights = solve_linear_system(&xtx, &xty)?;

        Ok(FittedPrivateLinear {
            normalizer,
            target,
            weights,
        })
    }
}

pub struct FittedPrivateLinear {
    normalizer: DataNormalizer,
    target: TargetScale,
    weights: Array1<f64>,
}

impl FittedPrivateLinear {
    pub fn predict(&self, X: &Array2<f64>) -> Result<Array1<f64>, ServiceError> {
        let Xs = FeatureEngineer::with_intercept(&self.normalizer.transform(X)?);
        Ok(Xs.dot(&self.weights).mapv(|v| self.target.unscale(v)))
    }
}

#[derive(Debug, Clone, Copy)]
struct TargetScale {
    min: f64,
    range: f64,
}

impl TargetScale {
    fn fit(y: &Array1<f64>) -> Self {
        let min = y.iter().copied().fold(f64::INFINITY, f64::min);
        let max = y.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;
        Self {
            min,
            range: if range < 1e-10 { 1.0 } else { range },
        }
    }

    fn scale(&self, v: f64) -> f64 {
        (v - self.min) / self.range
    }

    fn unscale(&self, v: f64) -> f64 {
        v * self.range + self.min
    }
}

/// Решение СЛАУ методом Гаусса с выбором ведущего элемента
fn solve_linear_system(A: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>, ServiceError> {
    let n = A.nrows();
    let mut augmented = Array2::zeros((n, n + 1));

    for i in 0..n {
        for j in 0..n {
            augmented[[i, j]] = A[[i, j]];
        }
        augmented[[i, n]] = b[i];
    }

    for i in 0..n {
        let mut max_row = i;
        let mut max_val = augmented[[i, i]].abs();
        for k in (i + 1)..n {
            if augmented[[k, i]].abs() > max_val {
                max_val = augmented[[k, i]].abs();
                max_row = k;
            }
        }

        if max_row != i {
            for j in 0..=n {
                augmented.swap([i, j], [max_row, j]);
            }
        }

        let pivot = augmented[[i, i]];
        if pivot.abs() < 1e-10 {
            return Err(ServiceError::Model("singular normal equations".to_string()));
        }

        for k in (i + 1)..n {
            let factor = augmented[[k, i]] / pivot;
            for j in i..=n {
                augmented[[k, j]] -= factor * augmented[[i, j]];
            }
        }
    }

    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = augmented[[i, n]];
        for j in (i + 1)..n {
            sum -= augmented[[i, j]] * x[j];
        }
        x[i] = sum / augmented[[i, i]];
    }

    Ok(x)
}
