//! Calibrate command implementation.
//!
//! Fits `(a, σ)` for every currency of a market file, each on its own
//! lattice and thread.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use rayon::prelude::*;
use tracing::info;

use ratetree_config::MarketData;
use ratetree_pricing::ParameterSearch;

use crate::cli::OutputFormat;
use crate::commands::report::{calibrate_currency, CalibrationReport, CurrencyFit};
use crate::commands::{validate_positive, LatticeArgs, TargetChoice};
use crate::error::{CliError, CliResult};
use crate::output::print_warning;

/// Arguments for the calibrate command.
#[derive(Args, Debug)]
pub struct CalibrateArgs {
    /// Market data file (JSON, or TOML with a .toml extension)
    #[arg(long)]
    pub market: PathBuf,

    #[command(flatten)]
    pub lattice: LatticeArgs,

    /// Instruments to calibrate against
    #[arg(short, long, value_enum, default_value = "cap")]
    pub target: TargetChoice,

    /// Hold the mean-reversion speed at this value and fit sigma only
    #[arg(long)]
    pub fix_a: Option<f64>,

    /// Starting mean-reversion speed
    #[arg(long, default_value_t = 0.1)]
    pub initial_a: f64,

    /// Starting volatility
    #[arg(long, default_value_t = 0.1)]
    pub initial_s: f64,
}

impl CalibrateArgs {
    fn search(&self) -> CliResult<ParameterSearch> {
        let initial_volatility = validate_positive("initial-s", self.initial_s)?;
        Ok(match self.fix_a {
            Some(a) => ParameterSearch::FixedMeanReversion {
                mean_reversion: validate_positive("fix-a", a)?,
                initial_volatility,
            },
            None => ParameterSearch::Both {
                initial: (validate_positive("initial-a", self.initial_a)?, initial_volatility),
            },
        })
    }
}

/// Execute the calibrate command.
pub fn execute(args: CalibrateArgs, format: OutputFormat) -> Result<()> {
    let settings = args.lattice.settings()?;
    let search = args.search()?;
    let kind = args.target.into();
    let market = MarketData::from_file(&args.market)?;

    info!(
        currencies = market.currencies.len(),
        model = %settings.model,
        "calibrating market file"
    );

    let fits = market
        .currencies
        .par_iter()
        .map(|currency| {
            calibrate_currency(currency, settings, search, kind)
                .map_err(|e| CliError::currency(&currency.id, e))
        })
        .collect::<CliResult<Vec<CurrencyFit>>>()?;

    for fit in fits.iter().filter(|fit| !fit.result.converged) {
        print_warning(&format!(
            "{}: minimizer stopped before meeting its tolerances",
            fit.currency
        ));
    }

    CalibrationReport::new(&fits)?.print(format)
}
