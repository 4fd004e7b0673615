//! Lattice settings and payment period codes.

use serde::{Deserialize, Serialize};

use ratetree_lattice::builder::{DEFAULT_HORIZON, DEFAULT_STEP_SIZE};
use ratetree_lattice::ShortRateModel;

use crate::error::{Validate, ValidationError};

// =============================================================================
// TREE SETTINGS
// =============================================================================

/// Geometry and model of the lattices built from market data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeSettings {
    /// Short-rate model.
    #[serde(default)]
    pub model: ShortRateModel,

    /// Lattice step in years.
    #[serde(default = "default_step_size")]
    pub step_size: f64,

    /// Lattice horizon in years.
    #[serde(default = "default_horizon")]
    pub horizon: f64,
}

fn default_step_size() -> f64 {
    DEFAULT_STEP_SIZE
}

fn default_horizon() -> f64 {
    DEFAULT_HORIZON
}

impl Default for TreeSettings {
    fn default() -> Self {
        Self {
            model: ShortRateModel::default(),
            step_size: DEFAULT_STEP_SIZE,
            horizon: DEFAULT_HORIZON,
        }
    }
}

impl TreeSettings {
    /// Builder method to set the model.
    pub fn with_model(mut self, model: ShortRateModel) -> Self {
        self.model = model;
        self
    }

    /// Builder method to set the step size.
    pub fn with_step_size(mut self, step_size: f64) -> Self {
        self.step_size = step_size;
        self
    }

    /// Builder method to set the horizon.
    pub fn with_horizon(mut self, horizon: f64) -> Self {
        self.horizon = horizon;
        self
    }
}

impl Validate for TreeSettings {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if !self.step_size.is_finite() || self.step_size <= 0.0 {
            errors.push(ValidationError::with_rule(
                "step_size",
                "Step size must be positive",
                "positive_step",
            ));
        }

        if !self.horizon.is_finite() || self.horizon < self.step_size {
            errors.push(ValidationError::with_rule(
                "horizon",
                "Horizon must be at least one step",
                "min_horizon",
            ));
        }

        errors
    }
}

// =============================================================================
// PAYMENT PERIOD
// =============================================================================

/// Coupon or reset frequency given as a one-letter code.
///
/// `A`, `S`, `Q` and `M` are annual, semi-annual, quarterly and monthly;
/// any other code reads as semi-annual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentPeriod {
    /// Once a year.
    Annual,
    /// Twice a year.
    #[default]
    SemiAnnual,
    /// Four times a year.
    Quarterly,
    /// Twelve times a year.
    Monthly,
}

impl PaymentPeriod {
    /// Parses a period code, case-insensitively.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "A" => Self::Annual,
            "Q" => Self::Quarterly,
            "M" => Self::Monthly,
            _ => Self::SemiAnnual,
        }
    }

    /// One-letter code.
    pub fn code(self) -> &'static str {
        match self {
            Self::Annual => "A",
            Self::SemiAnnual => "S",
            Self::Quarterly => "Q",
            Self::Monthly => "M",
        }
    }

    /// Period length in years.
    pub fn years(self) -> f64 {
        match self {
            Self::Annual => 1.0,
            Self::SemiAnnual => 0.5,
            Self::Quarterly => 0.25,
            Self::Monthly => 1.0 / 12.0,
        }
    }
}

impl From<String> for PaymentPeriod {
    fn from(code: String) -> Self {
        Self::from_code(&code)
    }
}

impl From<PaymentPeriod> for String {
    fn from(period: PaymentPeriod) -> Self {
        period.code().to_string()
    }
}

impl std::fmt::Display for PaymentPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
