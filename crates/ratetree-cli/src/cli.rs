//! CLI argument definitions.

use clap::{Parser, Subcommand, ValueEnum};

use crate::commands::{BondArgs, BuildArgs, CalibrateArgs, TreeArgs};

/// RateTree - one-factor short-rate lattices for caps and callable bonds
#[derive(Parser)]
#[command(name = "ratetree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Log calibration trials and tree builds to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Calibrate every currency in a market file to cap or caplet premiums
    Calibrate(CalibrateArgs),

    /// Build a lattice with known parameters and compare it to the quotes
    Build(BuildArgs),

    /// Price a bond on a calibrated lattice (OAS ladder, durations, risk)
    Bond(BondArgs),

    /// Dump every node of a small lattice built on a flat curve
    Tree(TreeArgs),
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
}
