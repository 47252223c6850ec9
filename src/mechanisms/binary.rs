//! Binary (randomised response) mechanism for two-valued cells

use rand::Rng;

use super::{check_epsilon, check_sensitivity, Mechanism, MechanismError};

/// Keeps a value with probability e^(ε/Δ) / (1 + e^(ε/Δ)), otherwise swaps it
/// for the other label.
#[derive(Debug, Clone, PartialEq)]
pub struct Binary {
    epsilon: f64,
    sensitivity: f64,
    value0: String,
    value1: String,
}

impl Binary {
    pub fn new(
        epsilon: f64,
        sensitivity: f64,
        value0: impl Into<String>,
        value1: impl Into<String>,
    ) -> Result<Self, MechanismError> {
        check_epsilon(epsilon)?;
        check_sensitivity(sensitivity)?;
        if sensitivity == 0.0 {
            return Err(MechanismError::InvalidSensitivity(sensitivity));
        }
        Ok(Self {
            epsilon,
            sensitivity,
            value0: value0.into(),
            value1: value1.into(),
        })
    }

    pub fn flip_probability(&self) -> f64 {
        1.0 / (1.0 + (self.epsilon / self.sensitivity).exp())
    }
}

impl Mechanism for Binary {
    type Input = str;
    type Output = String;

    fn randomise<R: Rng + ?Sized>(&self, value: &str, rng: &mut R) -> Result<String, MechanismError> {
        let (keep, other) = if value == self.value0 {
            (&self.value0, &self.value1)
        } else if value == self.value1 {
            (&self.value1, &self.value0)
        } else {
            return Err(MechanismError::OutOfDomain(value.to_string()));
        };

        if rng.gen_bool(self.flip_probability()) {
            Ok(other.clone())
        } else {
            Ok(keep.clone())
        }
    }
}
