//! Logistic regression: a non-private baseline and an objective-perturbation
//! private variant

#![allow(non_snake_case)]

use std::collections::BTreeSet;

use linfa::prelude::*;
use linfa_logistic::{
    FittedLogisticRegression, LogisticRegression, MultiFittedLogisticRegression,
    MultiLogisticRegression,
};
use ndarray::{Array1, Array2};
use rand::distributions::Distribution;
use rand::Rng;
use rand_distr::{Gamma, StandardNormal};

use crate::error::ServiceError;
use crate::preprocessing::FeatureEngineer;

const MAX_ITERATIONS: u64 = 100;

/// Logistic loss curvature bound used by the perturbation calibration.
const LOSS_LIPSCHITZ: f64 = 0.25;

fn distinct_classes(y: &Array1<usize>) -> Vec<usize> {
    y.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}

fn too_few_classes() -> ServiceError {
    ServiceError::Model("the training partition needs at least two classes".to_string())
}

/// Non-private multinomial/binary logistic regression.
pub enum BaselineClassifier {
    Binary(FittedLogisticRegression<f64, usize>),
    Multi(MultiFittedLogisticRegression<f64, usize>),
}

impl BaselineClassifier {
    pub fn fit(X: &Array2<f64>, y: &Array1<usize>) -> Result<Self, ServiceError> {
        let n_classes = distinct_classes(y).len();
        let dataset = linfa::Dataset::new(X.clone(), y.clone());

        match n_classes {
            0 | 1 => Err(too_few_classes()),
            2 => LogisticRegression::<f64>::default()
                .max_iterations(MAX_ITERATIONS)
                .fit(&dataset)
                .map(BaselineClassifier::Binary)
                .map_err(|e| ServiceError::Model(e.to_string())),
            _ => MultiLogisticRegression::<f64>::default()
                .max_iterations(MAX_ITERATIONS)
                .fit(&dataset)
                .map(BaselineClassifier::Multi)
                .map_err(|e| ServiceError::Model(e.to_string())),
        }
    }

    pub fn predict(&self, X: &Array2<f64>) -> Array1<usize> {
        match self {
            BaselineClassifier::Binary(model) => model.predict(X),
            BaselineClassifier::Multi(model) => model.predict(X),
        }
    }
}

/// ε-differentially private logistic regression by objective perturbation
/// (Chaudhuri, Monteleoni & Sarwate, 2011).
///
/// Rows get an intercept feature and are scaled so every row has L2 norm at
/// most one. Each binary problem minimises
///
/// `(1/n) Σ log(1 + exp(-yᵢ w·xᵢ)) + (λ + Δ)/2 ‖w‖² + (b·w)/n`
///
/// where `b` has a uniformly random direction and a Gamma(d, 2/ε') norm. More
/// than two classes are handled one-vs-rest with ε split evenly between them.
#[derive(Debug, Clone, Copy)]
pub struct PrivateLogisticRegression {
    epsilon: f64,
    /// Inverse regularisation strength; λ = 1 / (C n).
    c: f64,
    max_iterations: usize,
    tolerance: f64,
}

impl PrivateLogisticRegression {
    pub fn new(epsilon: f64) -> Result<Self, ServiceError> {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(ServiceError::InvalidModelEpsilon);
        }
        Ok(Self {
            epsilon,
            c: 1.0,
            max_iterations: 1000,
            tolerance: 1e-6,
        })
    }

    pub fn fit<R: Rng + ?Sized>(
        &self,
        X: &Array2<f64>,
        y: &Array1<usize>,
        rng: &mut R,
    ) -> Result<FittedPrivateLogistic, ServiceError> {
        let classes = distinct_classes(y);
        if classes.len() < 2 {
            return Err(too_few_classes());
        }

        let augmented = FeatureEngineer::with_intercept(X);
        let data_norm = augmented
            .rows()
            .into_iter()
            .map(|row| row.dot(&row).sqrt())
            .fold(0.0_f64, f64::max)
            .max(1e-12);
        tracing::warn!(
            "Data norm {:.4} derived from the training data itself; supply bounds to avoid the privacy leak",
            data_norm
        );
        let scaled = augmented / data_norm;

        // Для двух классов одна граница, иначе по одной на класс
        let positives: Vec<usize> = if classes.len() == 2 {
            vec![classes[1]]
        } else {
            classes.clone()
        };
        let epsilon = self.epsilon / positives.len() as f64;

        let mut weights = Array2::zeros((positives.len(), scaled.ncols()));
        for (k, &positive) in positives.iter().enumerate() {
            let signs = y.mapv(|label| if label == positive { 1.0 } else { -1.0 });
            let w = self.fit_binary(&scaled, &signs, epsilon, rng)?;
            weights.row_mut(k).assign(&w);
        }

        Ok(FittedPrivateLogistic {
            classes,
            weights,
            data_norm,
        })
    }

    fn fit_binary<R: Rng + ?Sized>(
        &self,
        X: &Array2<f64>,
        signs: &Array1<f64>,
        epsilon: f64,
        rng: &mut R,
    ) -> Result<Array1<f64>, ServiceError> {
        let n = X.nrows() as f64;
        let d = X.ncols();
        let lambda = 1.0 / (self.c * n);

        let ratio = LOSS_LIPSCHITZ / (n * lambda);
        let mut epsilon_p = epsilon - (1.0 + 2.0 * ratio + ratio * ratio).ln();
        let mut extra_reg = 0.0;
        if epsilon_p <= 0.0 {
            extra_reg = (LOSS_LIPSCHITZ / (n * ((epsilon / 4.0).exp() - 1.0)) - lambda).max(0.0);
            epsilon_p = epsilon / 2.0;
        }

        let b = perturbation_vector(d, 2.0 / epsilon_p, rng)?;
        let reg = lambda + extra_reg;
        let step = 1.0 / (LOSS_LIPSCHITZ + reg);

        let mut w = Array1::<f64>::zeros(d);
        for _ in 0..self.max_iterations {
            let margins = X.dot(&w) * signs;
            // σ(-m) weighted by the sign
            let coeffs = margins.mapv(|m| 1.0 / (1.0 + m.exp())) * signs;
            let grad = -X.t().dot(&coeffs) / n + &w * reg + &b / n;

            if grad.dot(&grad).sqrt() < self.tolerance {
                break;
            }
            w.scaled_add(-step, &grad);
        }

        if w.iter().any(|v| !v.is_finite()) {
            return Err(ServiceError::Model("private logistic regression diverged".to_string()));
        }
        Ok(w)
    }
}

/// Random vector with uniform direction and Gamma(d, scale) norm.
fn perturbation_vector<R: Rng + ?Sized>(
    d: usize,
    scale: f64,
    rng: &mut R,
) -> Result<Array1<f64>, ServiceError> {
    let gamma = Gamma::new(d as f64, scale).map_err(|e| ServiceError::Model(e.to_string()))?;
    let direction = Array1::from_iter((0..d).map(|_| {
        let z: f64 = StandardNormal.sample(rng);
        z
    }));
    let length = direction.dot(&direction).sqrt().max(1e-12);
    Ok(direction / length * gamma.sample(rng))
}

pub struct FittedPrivateLogistic {
    classes: Vec<usize>,
    /// One row per decision boundary; the last column is the intercept.
    weights: Array2<f64>,
    data_norm: f64,
}

impl FittedPrivateLogistic {
    pub fn predict(&self, X: &Array2<f64>) -> Array1<usize> {
        let scaled = FeatureEngineer::with_intercept(X) / self.data_norm;
        let scores = scaled.dot(&self.weights.t());

        scores
            .rows()
            .into_iter()
            .map(|row| {
                if self.classes.len() == 2 {
                    if row[0] > 0.0 {
                        self.classes[1]
                    } else {
                        self.classes[0]
                    }
                } else {
                    let best = row
                        .iter()
                        .enumerate()
                        .fold((0, f64::NEG_INFINITY), |best, (k, &s)| if s > best.1 { (k, s) } else { best })
                        .0;
                    self.classes[best]
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::metrics::accuracy;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Two well-separated blobs along the first feature.
    fn separable(n: usize, rng: &mut StdRng) -> (Array2<f64>, Array1<usize>) {
        let mut X = Array2::zeros((n, 2));
        let mut y = Array1::zeros(n);
        for i in 0..n {
            let label = i % 2;
            let center = if label == 1 { 3.0 } else { -3.0 };
            X[[i, 0]] = center + rng.gen_range(-1.0..1.0);
            X[[i, 1]] = rng.gen_range(-1.0..1.0);
            y[i] = label;
        }
        (X, y)
    }

    #[test]
    fn test_baseline_learns_separable_data() {
        let mut rng = StdRng::seed_from_u64(21);
        let (X, y) = separable(200, &mut rng);
        let model = BaselineClassifier::fit(&X, &y).unwrap();

        assert!(accuracy(&model.predict(&X), &y) > 0.95);
    }

    #[test]
    fn test_baseline_needs_two_classes() {
        let X = Array2::zeros((4, 1));
        let y = Array1::from(vec![1, 1, 1, 1]);
        assert!(matches!(BaselineClassifier::fit(&X, &y), Err(ServiceError::Model(_))));
    }

    #[test]
    fn test_private_model_with_large_epsilon_is_useful() {
        let mut rng = StdRng::seed_from_u64(4);
        let (X, y) = separable(2000, &mut rng);
        let model = PrivateLogisticRegression::new(50.0).unwrap().fit(&X, &y, &mut rng).unwrap();

        assert!(accuracy(&model.predict(&X), &y) > 0.9);
    }

    #[test]
    fn test_private_model_predicts_known_classes() {
        let mut rng = StdRng::seed_from_u64(8);
        let n = 90;
        let X = Array2::from_shape_fn((n, 2), |(i, j)| (i % 3) as f64 * 2.0 + j as f64 * 0.1 + rng.gen_range(0.0..0.5));
        let y = Array1::from_iter((0..n).map(|i| (i % 3) * 2));
        let model = PrivateLogisticRegression::new(0.5).unwrap().fit(&X, &y, &mut rng).unwrap();

        let predicted = model.predict(&X);
        assert!(predicted.iter().all(|c| [0, 2, 4].contains(c)));
    }

    #[test]
    fn test_private_rejects_bad_epsilon() {
        assert!(matches!(
            PrivateLogisticRegression::new(0.0),
            Err(ServiceError::InvalidModelEpsilon)
        ));
    }
}
