//! Interest rate caps and caplets.
//!
//! Each caplet pays `period·(R - K)` at the end of its period when the
//! lattice short rate `R` observed at the reset date exceeds the strike.
//! The payment is discounted back to the reset node over one period at `R`,
//! then rolled back through the lattice.

use ratetree_lattice::{NodeView, NodeVisitor, Scratch, ShortRateTree};

use crate::error::{PricingError, PricingResult};

/// Slack when comparing schedule dates to an end date.
const DATE_EPSILON: f64 = 1e-9;

/// A strip of caplets resetting at `start, start + period, ...` up to and
/// including `maturity`.
///
/// # Example
///
/// ```rust
/// use ratetree_lattice::{ShortRateModel, ShortRateTreeBuilder, ZeroCurve};
/// use ratetree_pricing::Cap;
///
/// let curve = ZeroCurve::flat(0.03).unwrap();
/// let mut tree = ShortRateTreeBuilder::new(ShortRateModel::HullWhite)
///     .step_size(0.25)
///     .horizon(10.0)
///     .curve(&curve)
///     .build()
///     .unwrap();
///
/// let cap = Cap::new(0.03, 0.25, 0.25, 5.0);
/// let premium = cap.price(&mut tree).unwrap();
/// assert!(premium > 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cap {
    /// Strike rate.
    pub strike: f64,
    /// First reset time in years.
    pub start: f64,
    /// Reset interval in years.
    pub period: f64,
    /// Last reset time in years (inclusive).
    pub maturity: f64,
}

impl Cap {
    /// Creates a cap.
    pub fn new(strike: f64, start: f64, period: f64, maturity: f64) -> Self {
        Self {
            strike,
            start,
            period,
            maturity,
        }
    }

    /// Lattice steps of the reset dates.
    pub fn payment_steps(&self, tree: &ShortRateTree) -> PricingResult<Vec<usize>> {
        reset_steps(tree, self.start, self.period, self.maturity, true)
    }

    /// Premium of the cap on `tree`.
    ///
    /// # Errors
    ///
    /// `CoverageExceeded` if `maturity` lies past the lattice horizon,
    /// `InvalidInstrument` for a non-positive period or an empty schedule.
    pub fn price(&self, tree: &mut ShortRateTree) -> PricingResult<f64> {
        let steps = self.payment_steps(tree)?;
        price_strip(tree, self.strike, self.period, &steps)
    }
}

/// A single-period caplet, or a strip of them resetting at
/// `start, start + period, ...` strictly before `end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Caplet {
    /// Strike rate.
    pub strike: f64,
    /// First reset time in years.
    pub start: f64,
    /// End of the last period in years (exclusive for resets).
    pub end: f64,
    /// Reset interval in years.
    pub period: f64,
}

impl Caplet {
    /// Creates a caplet.
    pub fn new(strike: f64, start: f64, end: f64, period: f64) -> Self {
        Self {
            strike,
            start,
            end,
            period,
        }
    }

    /// Single caplet on `[expiry, expiry + period]`.
    pub fn single(strike: f64, expiry: f64, period: f64) -> Self {
        Self::new(strike, expiry, expiry + period, period)
    }

    /// Lattice steps of the reset dates.
    pub fn payment_steps(&self, tree: &ShortRateTree) -> PricingResult<Vec<usize>> {
        reset_steps(tree, self.start, self.period, self.end, false)
    }

    /// Premium of the caplet on `tree`.
    pub fn price(&self, tree: &mut ShortRateTree) -> PricingResult<f64> {
        let steps = self.payment_steps(tree)?;
        price_strip(tree, self.strike, self.period, &steps)
    }
}

/// Nearest lattice steps of `start + k·period` up to `end`.
fn reset_steps(
    tree: &ShortRateTree,
    start: f64,
    period: f64,
    end: f64,
    inclusive: bool,
) -> PricingResult<Vec<usize>> {
    if !period.is_finite() || period <= 0.0 {
        return Err(PricingError::invalid_instrument(format!(
            "payment period must be positive, got {period}"
        )));
    }
    if !start.is_finite() || start < 0.0 || !end.is_finite() {
        return Err(PricingError::invalid_instrument(format!(
            "invalid schedule [{start}, {end}]"
        )));
    }
    if end > tree.horizon() + DATE_EPSILON {
        return Err(PricingError::CoverageExceeded {
            end,
            horizon: tree.horizon(),
        });
    }

    let mut steps = Vec::new();
    for k in 0.. {
        let t = start + f64::from(k) * period;
        let inside = if inclusive {
            t <= end + DATE_EPSILON
        } else {
            t < end - DATE_EPSILON
        };
        if !inside {
            break;
        }
        steps.push(tree.nearest_time_step(t));
    }

    if steps.is_empty() {
        return Err(PricingError::invalid_instrument(format!(
            "no reset dates between {start} and {end}"
        )));
    }
    Ok(steps)
}

fn price_strip(
    tree: &mut ShortRateTree,
    strike: f64,
    period: f64,
    steps: &[usize],
) -> PricingResult<f64> {
    let last_step = steps.iter().copied().max().unwrap_or(0);
    let mut resets = vec![false; last_step + 1];
    for &step in steps {
        resets[step] = true;
    }

    let mut strip = CapletStrip {
        strike,
        period,
        dt: tree.dt(),
        resets,
    };
    Ok(tree.backward_induction(last_step, &mut strip)?.value2)
}

/// Backward-induction payoff for a strip of caplets.
///
/// `value1` holds the discounted payoff fixed at the node, `value2` the
/// value of all remaining caplets.
struct CapletStrip {
    strike: f64,
    period: f64,
    dt: f64,
    resets: Vec<bool>,
}

impl NodeVisitor for CapletStrip {
    fn process_node(&mut self, view: NodeView<'_>) -> Scratch {
        let rate = view.rate();
        let resets = self.resets.get(view.time_step()).copied().unwrap_or(false);

        let payoff = if resets && rate > self.strike {
            self.period * (rate - self.strike) * (-self.period * rate).exp()
        } else {
            0.0
        };
        let continuation = (-self.dt * rate).exp() * view.expected(|s| s.value2);

        Scratch {
            value1: payoff,
            value2: payoff + continuation,
            ..Scratch::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ratetree_lattice::{ShortRateModel, ShortRateTreeBuilder, ZeroCurve};

    fn tree(s: f64) -> ShortRateTree {
        let curve = ZeroCurve::new(&[(0.25, 0.025), (1.0, 0.028), (3.0, 0.032), (10.0, 0.036)])
            .unwrap();
        ShortRateTreeBuilder::new(ShortRateModel::HullWhite)
            .mean_reversion(0.1)
            .volatility(s)
            .step_size(0.25)
            .horizon(10.0)
            .curve(&curve)
            .build()
            .unwrap()
    }

    #[test]
    fn test_schedules() {
        let tree = tree(0.01);
        let cap = Cap::new(0.03, 0.25, 0.25, 1.0);
        assert_eq!(cap.payment_steps(&tree).unwrap(), vec![1, 2, 3, 4]);

        let caplet = Caplet::new(0.03, 0.25, 1.0, 0.25);
        assert_eq!(caplet.payment_steps(&tree).unwrap(), vec![1, 2, 3]);

        let single = Caplet::single(0.03, 2.0, 0.5);
        assert_eq!(single.payment_steps(&tree).unwrap(), vec![8]);
    }

    #[test]
    fn test_coverage() {
        let mut tree = tree(0.01);
        let err = Cap::new(0.03, 0.25, 0.25, 12.0).price(&mut tree).unwrap_err();
        assert!(matches!(err, PricingError::CoverageExceeded { .. }));

        let err = Caplet::single(0.03, 9.9, 0.25).price(&mut tree).unwrap_err();
        assert!(matches!(err, PricingError::CoverageExceeded { .. }));
    }

    #[test]
    fn test_bad_schedules() {
        let mut tree = tree(0.01);
        assert!(matches!(
            Cap::new(0.03, 0.25, 0.0, 2.0).price(&mut tree),
            Err(PricingError::InvalidInstrument { .. })
        ));
        assert!(matches!(
            Cap::new(0.03, 3.0, 0.25, 2.0).price(&mut tree),
            Err(PricingError::InvalidInstrument { .. })
        ));
    }

    #[test]
    fn test_cap_is_sum_of_caplets() {
        let mut tree = tree(0.01);
        let cap = Cap::new(0.03, 0.25, 0.25, 3.0).price(&mut tree).unwrap();

        let mut sum = 0.0;
        for k in 1..=12 {
            let expiry = 0.25 * f64::from(k);
            sum += Caplet::single(0.03, expiry, 0.25).price(&mut tree).unwrap();
        }
        assert_relative_eq!(cap, sum, epsilon = 1e-12);
    }

    #[test]
    fn test_monotone_in_strike_and_volatility() {
        let mut low_vol = tree(0.005);
        let mut high_vol = tree(0.015);

        let atm = Cap::new(0.03, 0.25, 0.25, 5.0);
        let otm = Cap::new(0.05, 0.25, 0.25, 5.0);

        let atm_low = atm.price(&mut low_vol).unwrap();
        let atm_high = atm.price(&mut high_vol).unwrap();
        let otm_high = otm.price(&mut high_vol).unwrap();

        assert!(atm_high > atm_low);
        assert!(atm_high > otm_high);
        assert!(otm_high > 0.0);
    }

    #[test]
    fn test_deep_in_the_money_caplet() {
        // With a zero strike the caplet is worth period·R·exp(-period·R)
        // in expectation, roughly the discounted forward accrual
        let mut tree = tree(0.0);
        let price = Caplet::single(0.0, 0.0, 0.25).price(&mut tree).unwrap();
        let r = tree.root().rate;
        assert_relative_eq!(price, 0.25 * r * (-0.25 * r).exp(), epsilon = 1e-15);
    }
}
