//! Calibration of lattice parameters to cap and caplet premiums.
//!
//! Every objective evaluation rebuilds the whole lattice for the trial
//! `(a, σ)` and reprices every quote, so a calibration costs a few hundred
//! tree builds. Trials outside `a > 1e-4`, `σ >= 1e-4` are not errors:
//! they score [`INFEASIBLE_ERROR`] and the minimizer backs away.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use ratetree_lattice::builder::{DEFAULT_HORIZON, DEFAULT_STEP_SIZE};
use ratetree_lattice::{
    LatticeResult, ShortRateModel, ShortRateTree, ShortRateTreeBuilder, ZeroCurve,
};
use ratetree_math::optimization::{bfgs, OptimizationConfig};

use crate::cap::{Cap, Caplet};
use crate::error::{PricingError, PricingResult};

/// Objective value reported for infeasible trials.
pub const INFEASIBLE_ERROR: f64 = 1e300;

/// Smallest admissible mean-reversion speed (exclusive).
pub const MIN_MEAN_REVERSION: f64 = 1e-4;

/// Smallest admissible volatility.
pub const MIN_VOLATILITY: f64 = 1e-4;

/// Market premium of a cap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapQuote {
    /// Cap maturity in years.
    pub tenor: f64,
    /// Strike rate.
    pub strike: f64,
    /// Market premium.
    pub premium: f64,
}

/// Market premium of a single caplet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapletQuote {
    /// Reset time in years.
    pub expiry: f64,
    /// Strike rate, ignored when `atm` is set.
    pub strike: f64,
    /// Market premium.
    pub premium: f64,
    /// Struck at the curve forward over the caplet period.
    #[serde(default)]
    pub atm: bool,
}

/// Instruments the lattice is fitted to.
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationTarget {
    /// Caps resetting every `period` years from `start`.
    Caps {
        /// First reset time.
        start: f64,
        /// Reset interval.
        period: f64,
        /// Quotes by maturity.
        quotes: Vec<CapQuote>,
    },
    /// Single-period caplets.
    Caplets {
        /// Caplet period.
        period: f64,
        /// Quotes by expiry.
        quotes: Vec<CapletQuote>,
    },
}

impl CalibrationTarget {
    /// Number of quotes.
    pub fn len(&self) -> usize {
        match self {
            Self::Caps { quotes, .. } => quotes.len(),
            Self::Caplets { quotes, .. } => quotes.len(),
        }
    }

    /// Whether there are no quotes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolves ATM strikes against `curve`.
    fn instruments(&self, curve: &ZeroCurve) -> PricingResult<Vec<QuotedInstrument>> {
        match self {
            Self::Caps {
                start,
                period,
                quotes,
            } => Ok(quotes
                .iter()
                .map(|q| QuotedInstrument {
                    tenor: q.tenor,
                    strike: q.strike,
                    premium: q.premium,
                    instrument: Instrument::Cap(Cap::new(q.strike, *start, *period, q.tenor)),
                })
                .collect()),
            Self::Caplets { period, quotes } => quotes
                .iter()
                .map(|q| -> PricingResult<QuotedInstrument> {
                    let strike = if q.atm {
                        curve.forward_rate(q.expiry, q.expiry + period)?
                    } else {
                        q.strike
                    };
                    Ok(QuotedInstrument {
                        tenor: q.expiry,
                        strike,
                        premium: q.premium,
                        instrument: Instrument::Caplet(Caplet::single(strike, q.expiry, *period)),
                    })
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Instrument {
    Cap(Cap),
    Caplet(Caplet),
}

#[derive(Debug, Clone, Copy)]
struct QuotedInstrument {
    tenor: f64,
    strike: f64,
    premium: f64,
    instrument: Instrument,
}

impl QuotedInstrument {
    fn price(&self, tree: &mut ShortRateTree) -> PricingResult<f64> {
        match &self.instrument {
            Instrument::Cap(cap) => cap.price(tree),
            Instrument::Caplet(caplet) => caplet.price(tree),
        }
    }
}

/// Which parameters the search moves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParameterSearch {
    /// Search `(a, σ)` from `initial`.
    Both {
        /// Starting `(a, σ)`.
        initial: (f64, f64),
    },
    /// Hold `a` and search `σ` only.
    FixedMeanReversion {
        /// Fixed mean-reversion speed.
        mean_reversion: f64,
        /// Starting volatility.
        initial_volatility: f64,
    },
}

impl Default for ParameterSearch {
    fn default() -> Self {
        Self::Both { initial: (0.1, 0.1) }
    }
}

impl ParameterSearch {
    fn initial(&self) -> Vec<f64> {
        match *self {
            Self::Both { initial: (a, s) } => vec![a, s],
            Self::FixedMeanReversion {
                initial_volatility, ..
            } => vec![initial_volatility],
        }
    }

    fn unpack(&self, params: &[f64]) -> (f64, f64) {
        match *self {
            Self::Both { .. } => (params[0], params[1]),
            Self::FixedMeanReversion { mean_reversion, .. } => (mean_reversion, params[0]),
        }
    }
}

/// Model versus market for one quote.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuoteFit {
    /// Cap maturity or caplet expiry.
    pub tenor: f64,
    /// Strike used, after ATM resolution.
    pub strike: f64,
    /// Market premium.
    pub market: f64,
    /// Model premium.
    pub model: f64,
}

impl QuoteFit {
    /// Model minus market.
    pub fn error(&self) -> f64 {
        self.model - self.market
    }
}

/// Outcome of a calibration.
#[derive(Debug, Clone)]
pub struct CalibrationResult {
    /// Lattice built at the calibrated parameters.
    pub tree: ShortRateTree,
    /// Calibrated mean-reversion speed.
    pub mean_reversion: f64,
    /// Calibrated volatility.
    pub volatility: f64,
    /// Sum of squared premium errors at the optimum.
    pub objective: f64,
    /// Minimizer iterations.
    pub iterations: u32,
    /// Whether the minimizer met its tolerances.
    pub converged: bool,
    /// Per-quote report.
    pub fits: Vec<QuoteFit>,
}

/// Fits `(a, σ)` of a short-rate lattice to option premiums.
///
/// # Example
///
/// ```rust,no_run
/// use ratetree_lattice::{ShortRateModel, ZeroCurve};
/// use ratetree_pricing::calibration::{CalibrationTarget, Calibrator, CapQuote};
///
/// let curve = ZeroCurve::flat(0.03).unwrap();
/// let target = CalibrationTarget::Caps {
///     start: 0.25,
///     period: 0.25,
///     quotes: vec![
///         CapQuote { tenor: 2.0, strike: 0.03, premium: 0.0080 },
///         CapQuote { tenor: 5.0, strike: 0.03, premium: 0.0250 },
///     ],
/// };
///
/// let result = Calibrator::new(ShortRateModel::HullWhite, &curve)
///     .step_size(0.25)
///     .horizon(10.0)
///     .calibrate(&target)
///     .unwrap();
/// println!("a = {}, s = {}", result.mean_reversion, result.volatility);
/// ```
#[derive(Debug, Clone)]
pub struct Calibrator<'c> {
    model: ShortRateModel,
    curve: &'c ZeroCurve,
    step_size: f64,
    horizon: f64,
    search: ParameterSearch,
    optimizer: OptimizationConfig,
}

impl<'c> Calibrator<'c> {
    /// Creates a calibrator with the default lattice geometry.
    pub fn new(model: ShortRateModel, curve: &'c ZeroCurve) -> Self {
        Self {
            model,
            curve,
            step_size: DEFAULT_STEP_SIZE,
            horizon: DEFAULT_HORIZON,
            search: ParameterSearch::default(),
            optimizer: Self::default_optimizer(),
        }
    }

    /// Minimizer settings used unless overridden. The search runs until the
    /// gradient, step or objective change falls below `1e-10`, with no
    /// iteration cap.
    pub fn default_optimizer() -> OptimizationConfig {
        OptimizationConfig {
            tolerance: 1e-10,
            function_tolerance: 1e-10,
            step_tolerance: 1e-10,
            max_iterations: 0,
            step_size: 1e-4,
            max_step: Some(0.05),
        }
    }

    /// Sets the lattice step.
    #[must_use]
    pub fn step_size(mut self, dt: f64) -> Self {
        self.step_size = dt;
        self
    }

    /// Sets the lattice horizon.
    #[must_use]
    pub fn horizon(mut self, horizon: f64) -> Self {
        self.horizon = horizon;
        self
    }

    /// Sets the parameter search.
    #[must_use]
    pub fn search(mut self, search: ParameterSearch) -> Self {
        self.search = search;
        self
    }

    /// Sets the minimizer.
    #[must_use]
    pub fn optimizer(mut self, config: OptimizationConfig) -> Self {
        self.optimizer = config;
        self
    }

    /// Model of the lattices built.
    pub fn model(&self) -> ShortRateModel {
        self.model
    }

    /// Builds a lattice with the given parameters.
    pub fn build_tree(&self, mean_reversion: f64, volatility: f64) -> LatticeResult<ShortRateTree> {
        ShortRateTreeBuilder::new(self.model)
            .mean_reversion(mean_reversion)
            .volatility(volatility)
            .step_size(self.step_size)
            .horizon(self.horizon)
            .curve(self.curve)
            .build()
    }

    /// Sum of squared premium errors at `(a, σ)`.
    ///
    /// # Errors
    ///
    /// Any lattice or pricing failure, including quotes beyond the horizon.
    pub fn evaluate(
        &self,
        target: &CalibrationTarget,
        mean_reversion: f64,
        volatility: f64,
    ) -> PricingResult<f64> {
        let instruments = target.instruments(self.curve)?;
        let mut tree = self.build_tree(mean_reversion, volatility)?;
        sum_squared_errors(&mut tree, &instruments)
    }

    /// Premium errors of every quote on `tree`.
    pub fn quote_fits(
        &self,
        tree: &mut ShortRateTree,
        target: &CalibrationTarget,
    ) -> PricingResult<Vec<QuoteFit>> {
        target
            .instruments(self.curve)?
            .iter()
            .map(|quote| -> PricingResult<QuoteFit> {
                Ok(QuoteFit {
                    tenor: quote.tenor,
                    strike: quote.strike,
                    market: quote.premium,
                    model: quote.price(tree)?,
                })
            })
            .collect()
    }

    /// Minimizes the squared premium error over the free parameters.
    ///
    /// # Errors
    ///
    /// `InvalidInstrument` for an empty target, and any error raised while
    /// evaluating the starting point or building the final lattice.
    pub fn calibrate(&self, target: &CalibrationTarget) -> PricingResult<CalibrationResult> {
        if target.is_empty() {
            return Err(PricingError::invalid_instrument("no calibration quotes"));
        }
        let instruments = target.instruments(self.curve)?;
        let initial = self.search.initial();

        // Structural problems surface here instead of as sentinel costs.
        let (a0, s0) = self.search.unpack(&initial);
        let start = {
            let mut tree = self.build_tree(a0, s0)?;
            sum_squared_errors(&mut tree, &instruments)?
        };
        debug!(model = %self.model, a = a0, s = s0, objective = start, "Calibration start");

        let objective = |params: &[f64]| {
            let (a, s) = self.search.unpack(params);
            self.trial(&instruments, a, s)
        };
        let solution = bfgs(objective, &initial, &self.optimizer)?;

        let (mean_reversion, volatility) = self.search.unpack(&solution.parameters);
        let mut tree = self.build_tree(mean_reversion, volatility)?;
        let fits = self.quote_fits(&mut tree, target)?;

        info!(
            model = %self.model,
            a = mean_reversion,
            s = volatility,
            objective = solution.objective_value,
            iterations = solution.iterations,
            converged = solution.converged,
            "Calibration complete"
        );

        Ok(CalibrationResult {
            tree,
            mean_reversion,
            volatility,
            objective: solution.objective_value,
            iterations: solution.iterations,
            converged: solution.converged,
            fits,
        })
    }

    /// Objective seen by the minimizer: never fails.
    fn trial(&self, instruments: &[QuotedInstrument], a: f64, s: f64) -> f64 {
        if a.is_nan() || s.is_nan() || a <= MIN_MEAN_REVERSION || s < MIN_VOLATILITY {
            return INFEASIBLE_ERROR;
        }
        let result = self
            .build_tree(a, s)
            .map_err(PricingError::from)
            .and_then(|mut tree| sum_squared_errors(&mut tree, instruments));
        match result {
            Ok(value) if value.is_finite() => {
                debug!(a, s, objective = value, "Calibration trial");
                value
            }
            Ok(_) => INFEASIBLE_ERROR,
            Err(e) => {
                debug!(a, s, error = %e, "Calibration trial failed");
                INFEASIBLE_ERROR
            }
        }
    }
}

fn sum_squared_errors(
    tree: &mut ShortRateTree,
    instruments: &[QuotedInstrument],
) -> PricingResult<f64> {
    instruments.iter().try_fold(0.0, |acc, quote| -> PricingResult<f64> {
        let error = quote.price(tree)? - quote.premium;
        Ok(acc + error * error)
    })
}
