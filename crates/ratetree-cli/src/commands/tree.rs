//! Tree command implementation.
//!
//! Dumps every node of a small lattice fitted to a flat curve.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use ratetree_lattice::{LatticeNode, ShortRateTreeBuilder, ZeroCurve};

use crate::cli::OutputFormat;
use crate::commands::{validate_positive, ModelChoice};
use crate::error::CliError;
use crate::output::{format_f64, print_header, print_output};

/// Deepest lattice the command will print.
const MAX_DUMP_STEPS: f64 = 50.0;

/// Arguments for the tree command.
#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Short-rate model
    #[arg(short, long, value_enum, default_value = "hw")]
    pub model: ModelChoice,

    /// Mean-reversion speed
    #[arg(short, long, default_value_t = 0.1)]
    pub a: f64,

    /// Volatility
    #[arg(short, long, default_value_t = 0.01)]
    pub s: f64,

    /// Lattice step in years
    #[arg(long, default_value_t = 1.0)]
    pub dt: f64,

    /// Lattice horizon in years
    #[arg(long, default_value_t = 3.0)]
    pub horizon: f64,

    /// Flat zero rate, continuously compounded
    #[arg(short, long, default_value_t = 0.05)]
    pub rate: f64,
}

/// One lattice node.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct NodeRow {
    #[tabled(rename = "Step")]
    pub step: usize,
    #[tabled(rename = "Offset")]
    pub offset: i32,
    #[tabled(rename = "Branch")]
    pub branch: String,
    #[tabled(rename = "P(up)", display_with = "format_f64")]
    pub p_up: f64,
    #[tabled(rename = "P(mid)", display_with = "format_f64")]
    pub p_mid: f64,
    #[tabled(rename = "P(down)", display_with = "format_f64")]
    pub p_down: f64,
    #[tabled(rename = "Q", display_with = "format_f64")]
    pub q: f64,
    #[tabled(rename = "R", display_with = "format_f64")]
    pub rate: f64,
}

impl From<&LatticeNode> for NodeRow {
    fn from(node: &LatticeNode) -> Self {
        Self {
            step: node.time_step,
            offset: node.offset,
            branch: node.branch.label().to_string(),
            p_up: node.probabilities.up,
            p_mid: node.probabilities.mid,
            p_down: node.probabilities.down,
            q: node.arrow_debreu,
            rate: node.rate,
        }
    }
}

/// Execute the tree command.
pub fn execute(args: TreeArgs, format: OutputFormat) -> Result<()> {
    let a = validate_positive("a", args.a)?;
    let s = validate_positive("s", args.s)?;
    let dt = validate_positive("dt", args.dt)?;
    let horizon = validate_positive("horizon", args.horizon)?;
    if (horizon / dt).round() > MAX_DUMP_STEPS {
        return Err(CliError::InvalidArgument {
            name: "horizon",
            value: horizon,
            reason: "At most 50 steps can be dumped.",
        }
        .into());
    }

    let curve = ZeroCurve::flat(args.rate)?;
    let tree = ShortRateTreeBuilder::new(args.model.into())
        .mean_reversion(a)
        .volatility(s)
        .step_size(dt)
        .horizon(horizon)
        .curve(&curve)
        .build()?;

    let rows: Vec<NodeRow> = tree.lattice().nodes().iter().map(NodeRow::from).collect();

    print_header(
        &format!("{} lattice: {} steps of {dt}y", tree.model(), tree.num_steps()),
        format,
    );
    print_output(&rows, format)
}
