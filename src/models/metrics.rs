//! Scores reported for baseline and private models

use ndarray::Array1;

/// Fraction of exact matches. An empty comparison scores 0.
pub fn accuracy(predicted: &Array1<usize>, truth: &Array1<usize>) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = predicted
        .iter()
        .zip(truth.iter())
        .filter(|(p, t)| p == t)
        .count();
    correct as f64 / truth.len() as f64
}

/// Coefficient of determination. A constant target scores 1 on a perfect fit
/// and 0 otherwise.
pub fn r2_score(predicted: &Array1<f64>, truth: &Array1<f64>) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let mean = truth.mean().unwrap_or(0.0);
    let ss_res: f64 = predicted
        .iter()
        .zip(truth.iter())
        .map(|(p, t)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = truth.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        if ss_res == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - ss_res / ss_tot
    }
}
