//! Нормализация данных по обучающей выборке

#![allow(non_snake_case)]

use ndarray::{Array1, Array2, Axis};

use crate::error::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scaling {
    /// (x - mean) / std
    Standard,
    /// (x - min) / (max - min), landing in [0, 1] on the fitted data
    MinMax,
}

pub struct DataNormalizer {
    scaling: Scaling,
    offset: Option<Array1<f64>>,
    scale: Option<Array1<f64>>,
}

impl DataNormalizer {
    pub fn new(scaling: Scaling) -> Self {
        Self {
            scaling,
            offset: None,
            scale: None,
        }
    }

    pub fn fit(&mut self, X: &Array2<f64>) -> Result<(), ServiceError> {
        if X.nrows() == 0 {
            return Err(ServiceError::Data("empty dataset".to_string()));
        }

        let (offset, mut scale) = match self.scaling {
            Scaling::Standard => (
                X.mean_axis(Axis(0))
                    .ok_or_else(|| ServiceError::Data("failed to compute mean".to_string()))?,
                X.std_axis(Axis(0), 0.0),
            ),
            Scaling::MinMax => {
                let min = X.fold_axis(Axis(0), f64::INFINITY, |acc, v| acc.min(*v));
                let max = X.fold_axis(Axis(0), f64::NEG_INFINITY, |acc, v| acc.max(*v));
                let range = &max - &min;
                (min, range)
            }
        };

        // Константные колонки
        for val in scale.iter_mut() {
            if *val < 1e-10 {
                *val = 1.0;
            }
        }

        self.offset = Some(offset);
        self.scale = Some(scale);
        Ok(())
    }

    pub fn transform(&self, X: &Array2<f64>) -> Result<Array2<f64>, ServiceError> {
        let (offset, scale) = match (&self.offset, &self.scale) {
            (Some(offset), Some(scale)) => (offset, scale),
            _ => return Err(ServiceError::Internal("normalizer not fitted".to_string())),
        };
        if X.ncols() != offset.len() {
            return Err(ServiceError::Internal(format!(
                "normalizer fitted on {} features, got {}",
                offset.len(),
                X.ncols()
            )));
        }

        let mut normalized = X.clone();
        for mut row in normalized.rows_mut() {
            for (i, val) in row.iter_mut().enumerate() {
                *val = (*val - offset[i]) / scale[i];
            }
        }

        Ok(normalized)
    }

    pub fn fit_transform(&mut self, X: &Array2<f64>) -> Result<Array2<f64>, ServiceError> {
        self.fit(X)?;
        self.transform(X)
    }
}

impl Default for DataNormalizer {
    fn default() -> Self {
        Self::new(Scaling::Standard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_standard_scaling() {
        let X = array![[1.0, 10.0], [3.0, 10.0]];
        let mut normalizer = DataNormalizer::new(Scaling::Standard);
        let scaled = normalizer.fit_transform(&X).unwrap();

        assert_eq!(scaled, array![[-1.0, 0.0], [1.0, 0.0]]);
    }

    #[test]
    fn test_min_max_uses_training_bounds() {
        let train = array![[0.0], [4.0]];
        let test = array![[2.0], [8.0]];
        let mut normalizer = DataNormalizer::new(Scaling::MinMax);
        normalizer.fit(&train).unwrap();

        assert_eq!(normalizer.transform(&test).unwrap(), array![[0.5], [2.0]]);
    }

    #[test]
    fn test_unfitted_transform_fails() {
        let normalizer = DataNormalizer::default();
        assert!(normalizer.transform(&array![[1.0]]).is_err());
    }
}
