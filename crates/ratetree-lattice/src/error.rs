//! Error types for lattice construction and traversal.

use ratetree_math::MathError;
use thiserror::Error;

/// A specialized Result type for lattice operations.
pub type LatticeResult<T> = Result<T, LatticeError>;

/// Errors that can occur while building or walking a lattice.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LatticeError {
    /// Malformed input: bad curve, non-positive mean reversion, mismatched arrays.
    #[error("Invalid parameter: {reason}")]
    InvalidParameter {
        /// Description of the invalid parameter.
        reason: String,
    },

    /// State offset outside the width of a level.
    #[error("Offset {offset} is outside [-{j_max}, {j_max}] at time step {time_step}")]
    IndexOutOfRange {
        /// Requested time step.
        time_step: usize,
        /// Requested state offset.
        offset: i32,
        /// Width bound of that level.
        j_max: i32,
    },

    /// Time step beyond the built depth of the lattice.
    #[error("Time step {time_step} is beyond the last level {last_step}")]
    TimeStepOutOfRange {
        /// Requested time step.
        time_step: usize,
        /// Last built level.
        last_step: usize,
    },

    /// The Black-Karasinski drift fit stopped short of its tolerance.
    #[error("Drift fit at step {step} did not converge (residual {residual:e})")]
    DriftNotConverged {
        /// Time step of the failed fit.
        step: usize,
        /// Remaining pricing error.
        residual: f64,
    },

    /// Error from a numerical primitive.
    #[error(transparent)]
    Math(#[from] MathError),
}

impl LatticeError {
    /// Creates an invalid parameter error.
    #[must_use]
    pub fn invalid_parameter(reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            reason: reason.into(),
        }
    }
}
