//! RateTree CLI - calibrate short-rate lattices and price bonds on them.
//!
//! # Usage
//!
//! ```bash
//! # Calibrate every currency in a market file to its cap quotes
//! ratetree calibrate --market market.toml --model bk
//!
//! # Build a lattice with known parameters and report the quote fits
//! ratetree build --market market.toml --a 0.1 --s 0.01
//!
//! # OAS ladder and risk for one bond
//! ratetree bond --market market.toml --bonds bonds.json --id NUMFP --csv oas.csv
//!
//! # Dump the nodes of a small tree
//! ratetree tree --a 0.1 --s 0.01 --dt 1 --horizon 3
//! ```

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod commands;
mod error;
mod output;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries the report, so logs go to stderr
    let default_filter = if cli.verbose {
        "ratetree=debug"
    } else {
        "ratetree=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let format = cli.format;

    match cli.command {
        Commands::Calibrate(args) => commands::calibrate::execute(args, format)?,
        Commands::Build(args) => commands::build::execute(args, format)?,
        Commands::Bond(args) => commands::bond::execute(args, format)?,
        Commands::Tree(args) => commands::tree::execute(args, format)?,
    }

    Ok(())
}
