//! Error types for instrument pricing and calibration.

use ratetree_lattice::LatticeError;
use ratetree_math::MathError;
use thiserror::Error;

/// A specialized Result type for pricing operations.
pub type PricingResult<T> = Result<T, PricingError>;

/// Errors that can occur while pricing on a lattice.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PricingError {
    /// The instrument needs dates past the lattice horizon.
    #[error("Instrument ends at {end:.4}y, beyond the lattice horizon {horizon:.4}y")]
    CoverageExceeded {
        /// Last date the instrument needs, in years.
        end: f64,
        /// Lattice horizon in years.
        horizon: f64,
    },

    /// Malformed instrument definition.
    #[error("Invalid instrument: {reason}")]
    InvalidInstrument {
        /// Description of the problem.
        reason: String,
    },

    /// Query outside the sampled OAS/price range.
    #[error("{value} is outside the sensitivity range [{min}, {max}]")]
    OutsideSensitivityRange {
        /// Requested OAS or price.
        value: f64,
        /// Lower end of the range.
        min: f64,
        /// Upper end of the range.
        max: f64,
    },

    /// Lattice construction or traversal error.
    #[error("Lattice error: {0}")]
    Lattice(#[from] LatticeError),

    /// Numerical primitive error.
    #[error("Math error: {0}")]
    Math(#[from] MathError),
}

impl PricingError {
    /// Creates an invalid instrument error.
    #[must_use]
    pub fn invalid_instrument(reason: impl Into<String>) -> Self {
        Self::InvalidInstrument {
            reason: reason.into(),
        }
    }
}
