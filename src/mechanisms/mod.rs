//! Механизмы дифференциальной приватности для отдельных ячеек

pub mod binary;
pub mod laplace;

pub use binary::Binary;
pub use laplace::Laplace;

use rand::Rng;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MechanismError {
    #[error("Invalid epsilon: {0}")]
    InvalidEpsilon(f64),

    #[error("Invalid sensitivity: {0}")]
    InvalidSensitivity(f64),

    #[error("Value {0:?} is outside the mechanism domain")]
    OutOfDomain(String),

    #[error("Noise sampling failed: {0}")]
    Sampling(String),
}

/// A randomised mechanism over values of type `Input`.
pub trait Mechanism {
    type Input: ?Sized;
    type Output;

    fn randomise<R: Rng + ?Sized>(
        &self,
        value: &Self::Input,
        rng: &mut R,
    ) -> Result<Self::Output, MechanismError>;
}

pub(crate) fn check_epsilon(epsilon: f64) -> Result<(), MechanismError> {
    if epsilon.is_finite() && epsilon > 0.0 {
        Ok(())
    } else {
        Err(MechanismError::InvalidEpsilon(epsilon))
    }
}

pub(crate) fn check_sensitivity(sensitivity: f64) -> Result<(), MechanismError> {
    if sensitivity.is_finite() && sensitivity >= 0.0 {
        Ok(())
    } else {
        Err(MechanismError::InvalidSensitivity(sensitivity))
    }
}
