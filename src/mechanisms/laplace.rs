//! Laplace mechanism for real-valued cells

use rand::distributions::Distribution;
use rand::Rng;
use rand_distr::Exp;

use super::{check_epsilon, check_sensitivity, Mechanism, MechanismError};

/// Adds Lap(0, sensitivity / epsilon) noise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Laplace {
    epsilon: f64,
    sensitivity: f64,
}

impl Laplace {
    pub fn new(epsilon: f64, sensitivity: f64) -> Result<Self, MechanismError> {
        check_epsilon(epsilon)?;
        check_sensitivity(sensitivity)?;
        Ok(Self {
            epsilon,
            sensitivity,
        })
    }

    pub fn scale(&self) -> f64 {
        self.sensitivity / self.epsilon
    }

    pub fn sample_noise<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64, MechanismError> {
        let b = self.scale();
        if b == 0.0 {
            return Ok(0.0);
        }
        // Laplace(0, b) is the difference of two Exp(1/b) draws
        let exp = Exp::new(1.0 / b).map_err(|e| MechanismError::Sampling(e.to_string()))?;
        Ok(exp.sample(rng) - exp.sample(rng))
    }
}

impl Mechanism for Laplace {
    type Input = f64;
    type Output = f64;

    fn randomise<R: Rng + ?Sized>(&self, value: &f64, rng: &mut R) -> Result<f64, MechanismError> {
        Ok(*value + self.sample_noise(rng)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_laplace_adds_noise() {
        let mech = Laplace::new(1.0, 1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let noisy: Vec<f64> = (0..10).map(|_| mech.randomise(&100.0, &mut rng).unwrap()).collect();

        assert!(noisy.iter().any(|v| (v - 100.0).abs() > 1e-9));
        assert!(noisy.windows(2).any(|w| (w[0] - w[1]).abs() > 1e-9));
    }

    #[test]
    fn test_laplace_empirical_variance() {
        let mech = Laplace::new(0.5, 1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let n = 20_000;
        let samples: Vec<f64> = (0..n).map(|_| mech.sample_noise(&mut rng).unwrap()).collect();
        let expected = 2.0 * mech.scale().powi(2);
        let mean = samples.iter().sum::<f64>() / n as f64;
        let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n as f64;

        assert!(mean.abs() < 0.2, "mean {mean}");
        assert!((var - expected).abs() / expected < 0.1, "variance {var}");
    }

    #[test]
    fn test_zero_sensitivity_is_identity() {
        let mech = Laplace::new(1.0, 0.0).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(mech.randomise(&3.5, &mut rng).unwrap(), 3.5);
    }

    #[test]
    fn test_invalid_parameters() {
        assert_eq!(Laplace::new(0.0, 1.0), Err(MechanismError::InvalidEpsilon(0.0)));
        assert_eq!(Laplace::new(1.0, -1.0), Err(MechanismError::InvalidSensitivity(-1.0)));
    }
}
