//! Random train/test partition

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::ServiceError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffles row indices and takes `ceil(test_fraction * n_rows)` of them as the
/// test partition. Both partitions must end up non-empty.
pub fn train_test_split<R: Rng + ?Sized>(
    n_rows: usize,
    test_fraction: f64,
    rng: &mut R,
) -> Result<SplitIndices, ServiceError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(ServiceError::InvalidSplit);
    }

    // 0.3 * 100.0 is 30.000000000000004 in f64
    let n_test = (test_fraction * n_rows as f64 - 1e-9).ceil() as usize;
    if n_test == 0 || n_test >= n_rows {
        return Err(ServiceError::InvalidSplit);
    }

    let mut indices: Vec<usize> = (0..n_rows).collect();
    indices.shuffle(rng);
    let train = indices.split_off(n_test);

    Ok(SplitIndices {
        train,
        test: indices,
    })
}
