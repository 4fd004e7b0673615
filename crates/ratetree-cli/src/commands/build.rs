//! Build command implementation.
//!
//! Builds each currency's lattice at known parameters and reports how
//! well it reprices the quotes.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use rayon::prelude::*;

use ratetree_config::MarketData;

use crate::cli::OutputFormat;
use crate::commands::report::{build_currency, CalibrationReport, CurrencyFit};
use crate::commands::{validate_positive, LatticeArgs, TargetChoice};
use crate::error::{CliError, CliResult};

/// Arguments for the build command.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Market data file (JSON, or TOML with a .toml extension)
    #[arg(long)]
    pub market: PathBuf,

    #[command(flatten)]
    pub lattice: LatticeArgs,

    /// Instruments to reprice
    #[arg(short, long, value_enum, default_value = "cap")]
    pub target: TargetChoice,

    /// Mean-reversion speed
    #[arg(short, long)]
    pub a: f64,

    /// Volatility
    #[arg(short, long)]
    pub s: f64,
}

/// Execute the build command.
pub fn execute(args: BuildArgs, format: OutputFormat) -> Result<()> {
    let settings = args.lattice.settings()?;
    let a = validate_positive("a", args.a)?;
    let s = validate_positive("s", args.s)?;
    let kind = args.target.into();
    let market = MarketData::from_file(&args.market)?;

    let fits = market
        .currencies
        .par_iter()
        .map(|currency| {
            build_currency(currency, settings, a, s, kind)
                .map_err(|e| CliError::currency(&currency.id, e))
        })
        .collect::<CliResult<Vec<CurrencyFit>>>()?;

    CalibrationReport::new(&fits)?.print(format)
}
