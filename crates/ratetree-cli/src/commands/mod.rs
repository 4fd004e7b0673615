//! CLI command implementations.

pub mod bond;
pub mod build;
pub mod calibrate;
pub mod report;
pub mod tree;

// Re-export submodules for convenience
pub use bond::BondArgs;
pub use build::BuildArgs;
pub use calibrate::CalibrateArgs;
pub use tree::TreeArgs;

use clap::{Args, ValueEnum};

use ratetree_config::{ConfigResult, TargetKind, TreeSettings, Validate};
use ratetree_lattice::builder::{DEFAULT_HORIZON, DEFAULT_STEP_SIZE};
use ratetree_lattice::ShortRateModel;

use crate::error::{CliError, CliResult};

/// Short-rate model choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ModelChoice {
    /// Hull-White, normal short rate
    #[default]
    #[value(name = "hw")]
    HullWhite,
    /// Black-Karasinski, lognormal short rate
    #[value(name = "bk")]
    BlackKarasinski,
}

impl From<ModelChoice> for ShortRateModel {
    fn from(choice: ModelChoice) -> Self {
        match choice {
            ModelChoice::HullWhite => ShortRateModel::HullWhite,
            ModelChoice::BlackKarasinski => ShortRateModel::BlackKarasinski,
        }
    }
}

/// Calibration instrument choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TargetChoice {
    /// Cap premiums
    #[default]
    Cap,
    /// Caplet premiums
    Caplet,
}

impl From<TargetChoice> for TargetKind {
    fn from(choice: TargetChoice) -> Self {
        match choice {
            TargetChoice::Cap => TargetKind::Cap,
            TargetChoice::Caplet => TargetKind::Caplet,
        }
    }
}

/// Model and geometry flags shared by the lattice-building commands.
#[derive(Args, Debug, Clone, Copy)]
pub struct LatticeArgs {
    /// Short-rate model
    #[arg(short, long, value_enum, default_value = "hw")]
    pub model: ModelChoice,

    /// Lattice step in years
    #[arg(long, default_value_t = DEFAULT_STEP_SIZE)]
    pub dt: f64,

    /// Lattice horizon in years
    #[arg(long, default_value_t = DEFAULT_HORIZON)]
    pub horizon: f64,
}

impl LatticeArgs {
    /// Validated tree settings from the flags.
    pub fn settings(&self) -> ConfigResult<TreeSettings> {
        let settings = TreeSettings::default()
            .with_model(self.model.into())
            .with_step_size(self.dt)
            .with_horizon(self.horizon);
        settings.validate_or_error()?;
        Ok(settings)
    }
}

/// Validates a strictly positive parameter.
pub fn validate_positive(name: &'static str, value: f64) -> CliResult<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(CliError::InvalidArgument {
            name,
            value,
            reason: "Must be positive.",
        });
    }
    Ok(value)
}
