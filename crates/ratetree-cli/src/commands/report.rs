//! Parameter and quote-fit report shared by `calibrate` and `build`.

use anyhow::Result;
use serde::Serialize;
use tabled::Tabled;

use ratetree_config::{ConfigResult, CurrencyMarket, TargetKind, TreeSettings};
use ratetree_lattice::LatticeResult;
use ratetree_pricing::{CalibrationResult, Calibrator, ParameterSearch, QuoteFit};

use crate::cli::OutputFormat;
use crate::output::{format_f64, format_percent_cell, print_header, print_json_value, print_output};

/// One lattice fitted to one currency.
#[derive(Debug)]
pub struct CurrencyFit {
    /// Currency id.
    pub currency: String,
    /// Whether the parameters were searched or given.
    pub calibrated: bool,
    /// Lattice, parameters and quote fits.
    pub result: CalibrationResult,
}

/// Calibrates one currency to the quotes selected by `kind`.
pub fn calibrate_currency(
    market: &CurrencyMarket,
    settings: TreeSettings,
    search: ParameterSearch,
    kind: TargetKind,
) -> ConfigResult<CurrencyFit> {
    let curve = market.curve()?;
    let target = market.target(kind)?;
    let result = Calibrator::new(settings.model, &curve)
        .step_size(settings.step_size)
        .horizon(settings.horizon)
        .search(search)
        .calibrate(&target)?;

    Ok(CurrencyFit {
        currency: market.id.clone(),
        calibrated: true,
        result,
    })
}

/// Builds one currency's lattice at known `(a, σ)` and prices its quotes.
pub fn build_currency(
    market: &CurrencyMarket,
    settings: TreeSettings,
    mean_reversion: f64,
    volatility: f64,
    kind: TargetKind,
) -> ConfigResult<CurrencyFit> {
    let curve = market.curve()?;
    let target = market.target(kind)?;
    let calibrator = Calibrator::new(settings.model, &curve)
        .step_size(settings.step_size)
        .horizon(settings.horizon);

    let mut tree = calibrator.build_tree(mean_reversion, volatility)?;
    let fits = calibrator.quote_fits(&mut tree, &target)?;
    let objective: f64 = fits.iter().map(|fit| fit.error().powi(2)).sum();

    Ok(CurrencyFit {
        currency: market.id.clone(),
        calibrated: false,
        result: CalibrationResult {
            tree,
            mean_reversion,
            volatility,
            objective,
            iterations: 0,
            converged: true,
            fits,
        },
    })
}

/// Calibrated parameters of one currency.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct ParameterRow {
    #[tabled(rename = "Currency")]
    pub currency: String,
    #[tabled(rename = "Model")]
    pub model: String,
    #[tabled(rename = "a", display_with = "format_f64")]
    pub mean_reversion: f64,
    #[tabled(rename = "sigma", display_with = "format_f64")]
    pub volatility: f64,
    #[tabled(rename = "R min", display_with = "format_percent_cell")]
    pub rate_low: f64,
    #[tabled(rename = "R max", display_with = "format_percent_cell")]
    pub rate_high: f64,
    #[tabled(rename = "Objective")]
    pub objective: f64,
    #[tabled(rename = "Iterations")]
    pub iterations: u32,
    #[tabled(rename = "Status")]
    pub status: String,
}

impl ParameterRow {
    /// Parameters of `fit`, with the rate range of its horizon level.
    fn new(fit: &CurrencyFit) -> LatticeResult<Self> {
        let tree = &fit.result.tree;
        let (rate_low, rate_high) = tree.rate_range(tree.num_steps())?;
        let status = match (fit.calibrated, fit.result.converged) {
            (false, _) => "given",
            (true, true) => "converged",
            (true, false) => "not converged",
        };
        Ok(Self {
            currency: fit.currency.clone(),
            model: tree.model().name().to_string(),
            mean_reversion: fit.result.mean_reversion,
            volatility: fit.result.volatility,
            rate_low,
            rate_high,
            objective: fit.result.objective,
            iterations: fit.result.iterations,
            status: status.to_string(),
        })
    }
}

/// Model versus market for one quote.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct FitRow {
    #[tabled(rename = "Currency")]
    pub currency: String,
    #[tabled(rename = "Tenor")]
    pub tenor: f64,
    #[tabled(rename = "Strike", display_with = "format_percent_cell")]
    pub strike: f64,
    #[tabled(rename = "Market", display_with = "format_f64")]
    pub market: f64,
    #[tabled(rename = "Model", display_with = "format_f64")]
    pub model: f64,
    #[tabled(rename = "Error", display_with = "format_f64")]
    pub error: f64,
}

impl FitRow {
    fn new(currency: &str, fit: &QuoteFit) -> Self {
        Self {
            currency: currency.to_string(),
            tenor: fit.tenor,
            strike: fit.strike,
            market: fit.market,
            model: fit.model,
            error: fit.error(),
        }
    }
}

/// Parameters and quote fits of every currency.
#[derive(Debug, Clone, Serialize)]
pub struct CalibrationReport {
    pub parameters: Vec<ParameterRow>,
    pub fits: Vec<FitRow>,
}

impl CalibrationReport {
    /// Collects the rows of `fits`, in order.
    pub fn new(fits: &[CurrencyFit]) -> LatticeResult<Self> {
        Ok(Self {
            parameters: fits
                .iter()
                .map(ParameterRow::new)
                .collect::<LatticeResult<_>>()?,
            fits: fits
                .iter()
                .flat_map(|fit| {
                    fit.result
                        .fits
                        .iter()
                        .map(|quote| FitRow::new(&fit.currency, quote))
                })
                .collect(),
        })
    }

    /// Prints the report; CSV output carries the quote fits only.
    pub fn print(&self, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Table => {
                print_header("Lattice Parameters", format);
                print_output(&self.parameters, format)?;
                print_header("Quote Fits", format);
                print_output(&self.fits, format)
            }
            OutputFormat::Json => print_json_value(self),
            OutputFormat::Csv => print_output(&self.fits, format),
        }
    }
}
