//! Bond command implementation.
//!
//! Calibrates the bond's currency to caps, then reports price and spread
//! risk along an OAS ladder and rate risk at the par spread.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;
use tracing::info;

use ratetree_config::{BondPortfolio, MarketData, TargetKind};
use ratetree_pricing::{BondAnalytics, ParameterSearch, PricingResult};

use crate::cli::OutputFormat;
use crate::commands::report::calibrate_currency;
use crate::commands::{validate_positive, LatticeArgs};
use crate::error::CliError;
use crate::output::{
    format_f64, format_percent_cell, print_header, print_json_value, print_output, print_success,
    print_warning, write_csv, KeyValue,
};

/// OAS ladder printed on screen, in 1% steps.
const LADDER_STEP: f64 = 0.01;
/// OAS grid written to the CSV file, in 0.5% steps.
const CSV_STEP: f64 = 0.005;
/// Top of both ladders.
const LADDER_MAX: f64 = 0.10;
/// Parallel shift at which rate risk is measured.
const NO_SHIFT: f64 = 0.0;

/// Arguments for the bond command.
#[derive(Args, Debug)]
pub struct BondArgs {
    /// Market data file (JSON, or TOML with a .toml extension)
    #[arg(long)]
    pub market: PathBuf,

    /// Bond portfolio file (JSON, or TOML with a .toml extension)
    #[arg(long)]
    pub bonds: PathBuf,

    /// Bond id
    #[arg(long)]
    pub id: String,

    #[command(flatten)]
    pub lattice: LatticeArgs,

    /// Price whose OAS anchors the rate risk
    #[arg(short, long, default_value_t = 1.0)]
    pub price: f64,

    /// Write the 0.5% OAS grid to this CSV file
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

/// Price and spread risk at one OAS.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct LadderRow {
    #[tabled(rename = "OAS", display_with = "format_percent_cell")]
    pub oas: f64,
    #[tabled(rename = "Price", display_with = "format_f64")]
    pub price: f64,
    #[tabled(rename = "Spread Duration", display_with = "format_f64")]
    pub spread_duration: f64,
    #[tabled(rename = "Spread Risk", display_with = "format_f64")]
    pub spread_risk: f64,
    #[tabled(rename = "Spread Convexity", display_with = "format_f64")]
    pub spread_convexity: f64,
}

/// Rate risk measured at the OAS matching the target price.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ParRisk {
    pub price: f64,
    pub oas: f64,
    pub rate_duration: f64,
    pub rate_risk: f64,
    pub rate_convexity: f64,
}

/// Everything the bond command reports.
#[derive(Debug, Clone, Serialize)]
pub struct BondReport {
    pub id: String,
    pub name: String,
    pub currency: String,
    pub model: String,
    pub mean_reversion: f64,
    pub volatility: f64,
    pub perpetual: bool,
    pub callable: bool,
    pub payments: usize,
    pub value: f64,
    pub par: Option<ParRisk>,
    pub ladder: Vec<LadderRow>,
}

impl BondReport {
    fn summary(&self) -> Vec<KeyValue> {
        let mut rows = vec![
            KeyValue::new("Bond", format!("{} ({})", self.id, self.name)),
            KeyValue::new("Currency", self.currency.clone()),
            KeyValue::new("Model", self.model.clone()),
            KeyValue::from_f64("a", self.mean_reversion, 6),
            KeyValue::from_f64("sigma", self.volatility, 6),
            KeyValue::new("Perpetual", self.perpetual.to_string()),
            KeyValue::new("Callable", self.callable.to_string()),
            KeyValue::new("Payments", self.payments.to_string()),
            KeyValue::from_f64("Value (OAS 0)", self.value, 6),
        ];
        if let Some(par) = self.par {
            rows.push(KeyValue::from_f64("Target Price", par.price, 6));
            rows.push(KeyValue::from_percent("OAS", par.oas));
            rows.push(KeyValue::from_f64("Rate Duration", par.rate_duration, 6));
            rows.push(KeyValue::from_f64("Rate Risk", par.rate_risk, 6));
            rows.push(KeyValue::from_f64("Rate Convexity", par.rate_convexity, 4));
        }
        rows
    }

    fn print(&self, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Table => {
                print_header("Bond Analytics", format);
                print_output(&self.summary(), format)?;
                print_header("OAS Ladder", format);
                print_output(&self.ladder, format)
            }
            OutputFormat::Json => print_json_value(self),
            OutputFormat::Csv => print_output(&self.ladder, format),
        }
    }
}

/// Spreads from zero to the ladder top in `step` increments.
fn ladder_points(step: f64) -> Vec<f64> {
    let count = (LADDER_MAX / step).round() as usize;
    (0..=count).map(|i| i as f64 * step).collect()
}

fn ladder(analytics: &BondAnalytics<'_>, step: f64) -> PricingResult<Vec<LadderRow>> {
    ladder_points(step)
        .into_iter()
        .map(|oas| -> PricingResult<LadderRow> {
            Ok(LadderRow {
                oas,
                price: analytics.price(oas)?,
                spread_duration: analytics.spread_duration(oas)?,
                spread_risk: analytics.spread_risk(oas)?,
                spread_convexity: analytics.spread_convexity(oas)?,
            })
        })
        .collect()
}

fn par_risk(analytics: &mut BondAnalytics<'_>, price: f64) -> PricingResult<ParRisk> {
    let oas = analytics.oas(price)?;
    Ok(ParRisk {
        price,
        oas,
        rate_duration: analytics.rate_duration(NO_SHIFT, oas)?,
        rate_risk: analytics.rate_risk(NO_SHIFT, oas)?,
        rate_convexity: analytics.rate_convexity(NO_SHIFT, oas)?,
    })
}

/// Execute the bond command.
pub fn execute(args: BondArgs, format: OutputFormat) -> Result<()> {
    let settings = args.lattice.settings()?;
    let target_price = validate_positive("price", args.price)?;
    let market = MarketData::from_file(&args.market)?;
    let portfolio = BondPortfolio::from_file(&args.bonds)?;

    let data = portfolio.bond(&args.id)?;
    let currency = market.currency(&data.currency)?;
    let fit = calibrate_currency(currency, settings, ParameterSearch::default(), TargetKind::Cap)
        .map_err(|e| CliError::currency(&currency.id, e))?;
    let mut tree = fit.result.tree;

    let bond = data.builder(market.evaluation_date)?.build(&tree)?;
    info!(
        bond = %data.id,
        payments = bond.payments().len(),
        calls = bond.calls().len(),
        "pricing bond"
    );

    let mut analytics = BondAnalytics::new(&mut tree, &bond)?;
    let value = analytics.value(NO_SHIFT, 0.0)?;
    let rows = ladder(&analytics, LADDER_STEP)?;

    let par = match par_risk(&mut analytics, target_price) {
        Ok(par) => Some(par),
        Err(e) => {
            print_warning(&format!("no OAS for price {target_price}: {e}"));
            None
        }
    };

    if let Some(path) = &args.csv {
        write_csv(path, &ladder(&analytics, CSV_STEP)?)?;
        print_success(&format!("OAS grid written to {}", path.display()));
    }

    let report = BondReport {
        id: data.id.clone(),
        name: data.name.clone(),
        currency: currency.id.clone(),
        model: settings.model.name().to_string(),
        mean_reversion: fit.result.mean_reversion,
        volatility: fit.result.volatility,
        perpetual: bond.is_perpetual(),
        callable: bond.is_callable(),
        payments: bond.payments().len(),
        value,
        par,
        ladder: rows,
    };
    report.print(format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ladder_points() {
        let screen = ladder_points(LADDER_STEP);
        assert_eq!(screen.len(), 11);
        assert_eq!(screen[0], 0.0);
        assert!((screen[10] - 0.10).abs() < 1e-12);

        let grid = ladder_points(CSV_STEP);
        assert_eq!(grid.len(), 21);
        assert!((grid[1] - 0.005).abs() < 1e-12);
    }
}
