//! Callable, floating and perpetual bonds on a short-rate lattice.
//!
//! A [`CallableBond`] is a set of coupon payments and call prices keyed by
//! lattice step, redeemed either at a maturity step or as a perpetuity at
//! the lattice horizon. Valuation is a single backward-induction pass with
//! an optional parallel rate shift `dr` and a discount spread `oas`.
//!
//! [`BondBuilder`] turns calendar dates into such a schedule and
//! [`BondAnalytics`] adds OAS and risk measures on top.

mod analytics;
mod builder;

pub use analytics::{BondAnalytics, OasCurve, ONE_BP};
pub use builder::{BondBuilder, DAYS_PER_YEAR};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use ratetree_lattice::{NodeView, NodeVisitor, Scratch, ShortRateTree};

use crate::error::{PricingError, PricingResult};

/// Floor on the perpetuity discount rate.
pub const MIN_PERPETUAL_RATE: f64 = 1e-4;

/// A coupon payment.
///
/// Fixed coupons pay `period·rate`. Floating coupons pay
/// `period·(index + rate)`, the index being the short rate observed one
/// coupon period earlier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Whether the coupon floats over the short rate.
    pub floating: bool,
    /// Fixed rate, or spread over the index for floating coupons.
    pub rate: f64,
    /// Accrual period in years.
    pub period: f64,
}

impl Payment {
    /// Fixed coupon.
    pub fn fixed(rate: f64, period: f64) -> Self {
        Self {
            floating: false,
            rate,
            period,
        }
    }

    /// Floating coupon paying `spread` over the short rate.
    pub fn floating(spread: f64, period: f64) -> Self {
        Self {
            floating: true,
            rate: spread,
            period,
        }
    }

    fn validate(&self) -> PricingResult<()> {
        if !self.rate.is_finite() {
            return Err(PricingError::invalid_instrument(format!(
                "coupon rate must be finite, got {}",
                self.rate
            )));
        }
        if !self.period.is_finite() || self.period <= 0.0 {
            return Err(PricingError::invalid_instrument(format!(
                "coupon period must be positive, got {}",
                self.period
            )));
        }
        Ok(())
    }
}

/// How principal is returned.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Redemption {
    /// Principal of 1 paid at this lattice step.
    Maturity(usize),
    /// No maturity; the coupon is valued as a perpetuity at the horizon.
    Perpetual(Payment),
}

/// A bond schedule in lattice steps.
#[derive(Debug, Clone, PartialEq)]
pub struct CallableBond {
    payments: BTreeMap<usize, Payment>,
    calls: BTreeMap<usize, f64>,
    redemption: Redemption,
}

impl CallableBond {
    /// Bond redeemed at par at `maturity_step`.
    ///
    /// # Errors
    ///
    /// `InvalidInstrument` for malformed coupons or call prices, or any
    /// payment or call after maturity.
    pub fn new(
        maturity_step: usize,
        payments: BTreeMap<usize, Payment>,
        calls: BTreeMap<usize, f64>,
    ) -> PricingResult<Self> {
        let bond = Self {
            payments,
            calls,
            redemption: Redemption::Maturity(maturity_step),
        };
        bond.validate()?;

        let late = bond
            .payments
            .keys()
            .chain(bond.calls.keys())
            .find(|&&step| step > maturity_step);
        if let Some(step) = late {
            return Err(PricingError::invalid_instrument(format!(
                "cash flow at step {step} is after maturity step {maturity_step}"
            )));
        }
        Ok(bond)
    }

    /// Perpetual bond paying `coupon` beyond the lattice horizon.
    pub fn perpetual(
        coupon: Payment,
        payments: BTreeMap<usize, Payment>,
        calls: BTreeMap<usize, f64>,
    ) -> PricingResult<Self> {
        coupon.validate()?;
        let bond = Self {
            payments,
            calls,
            redemption: Redemption::Perpetual(coupon),
        };
        bond.validate()?;
        Ok(bond)
    }

    fn validate(&self) -> PricingResult<()> {
        for payment in self.payments.values() {
            payment.validate()?;
        }
        if let Some((step, price)) = self
            .calls
            .iter()
            .find(|(_, price)| !price.is_finite() || **price <= 0.0)
        {
            return Err(PricingError::invalid_instrument(format!(
                "call price at step {step} must be positive, got {price}"
            )));
        }
        Ok(())
    }

    /// Coupons keyed by lattice step.
    pub fn payments(&self) -> &BTreeMap<usize, Payment> {
        &self.payments
    }

    /// Call prices keyed by lattice step.
    pub fn calls(&self) -> &BTreeMap<usize, f64> {
        &self.calls
    }

    /// Redemption terms.
    pub fn redemption(&self) -> Redemption {
        self.redemption
    }

    /// Whether the bond is perpetual.
    pub fn is_perpetual(&self) -> bool {
        matches!(self.redemption, Redemption::Perpetual(_))
    }

    /// Whether the bond has any call dates.
    pub fn is_callable(&self) -> bool {
        !self.calls.is_empty()
    }

    /// Last lattice step the valuation visits.
    ///
    /// # Errors
    ///
    /// `CoverageExceeded` if any cash flow lies past the lattice horizon.
    pub fn last_step(&self, tree: &ShortRateTree) -> PricingResult<usize> {
        let horizon = tree.num_steps();
        let last = match self.redemption {
            Redemption::Maturity(step) => step,
            Redemption::Perpetual(_) => horizon,
        };
        let latest = self
            .payments
            .keys()
            .chain(self.calls.keys())
            .copied()
            .max()
            .unwrap_or(0)
            .max(last);

        if latest > horizon {
            return Err(PricingError::CoverageExceeded {
                end: tree.time_at_step(latest),
                horizon: tree.horizon(),
            });
        }
        Ok(last)
    }

    /// Value per unit notional with the short rate shifted by `dr` and
    /// discounting at an extra spread `oas`.
    pub fn value(&self, tree: &mut ShortRateTree, dr: f64, oas: f64) -> PricingResult<f64> {
        let last_step = self.last_step(tree)?;
        let mut cashflows = BondCashflows {
            bond: self,
            last_step,
            dt: tree.dt(),
            dr,
            oas,
        };
        Ok(tree.backward_induction(last_step, &mut cashflows)?.value2)
    }

    /// Nodes `(step, offset)` at which the issuer calls, for the given
    /// shift and spread.
    pub fn exercise_nodes(
        &self,
        tree: &mut ShortRateTree,
        dr: f64,
        oas: f64,
    ) -> PricingResult<Vec<(usize, i32)>> {
        self.value(tree, dr, oas)?;
        let mut nodes = Vec::new();
        for &step in self.calls.keys() {
            nodes.extend(
                tree.lattice()
                    .level(step)?
                    .iter()
                    .filter(|node| node.scratch.flag)
                    .map(|node| (node.time_step, node.offset)),
            );
        }
        Ok(nodes)
    }
}

/// Backward-induction payoff for [`CallableBond`].
///
/// `value1` holds the cash paid at the node, `value2` the bond value
/// including that cash, and `flag` marks an exercised call.
struct BondCashflows<'b> {
    bond: &'b CallableBond,
    last_step: usize,
    dt: f64,
    dr: f64,
    oas: f64,
}

impl BondCashflows<'_> {
    fn coupon(&self, payment: &Payment, view: NodeView<'_>) -> f64 {
        let rate = if payment.floating {
            payment.rate + self.index_rate(payment.period, view)
        } else {
            payment.rate
        };
        payment.period * rate
    }

    /// Shifted short rate one coupon period back along the node's offset,
    /// clamped into the earlier level's width.
    fn index_rate(&self, period: f64, view: NodeView<'_>) -> f64 {
        let lookback = (period / self.dt).round().max(0.0) as usize;
        let step = view.time_step().saturating_sub(lookback);
        let lattice = view.tree();

        let j_max = lattice.j_max(step).unwrap_or(0);
        let offset = view.offset().clamp(-j_max, j_max);
        let rate = lattice
            .node(step, offset)
            .map_or(view.rate(), |node| node.rate);
        rate + self.dr
    }

    fn perpetuity(&self, coupon: &Payment, view: NodeView<'_>) -> f64 {
        let rate = view.rate() + self.dr;
        let annual = if coupon.floating {
            rate + coupon.rate
        } else {
            coupon.rate
        };
        annual / (rate + self.oas).max(MIN_PERPETUAL_RATE)
    }
}

impl NodeVisitor for BondCashflows<'_> {
    fn process_node(&mut self, view: NodeView<'_>) -> Scratch {
        let step = view.time_step();
        let at_end = step == self.last_step;

        let mut cash = self
            .bond
            .payments
            .get(&step)
            .map_or(0.0, |payment| self.coupon(payment, view));

        let continuation = match (at_end, self.bond.redemption) {
            (true, Redemption::Maturity(_)) => {
                cash += 1.0;
                0.0
            }
            (true, Redemption::Perpetual(coupon)) => self.perpetuity(&coupon, view),
            (false, _) => {
                let discount = (-self.dt * (view.rate() + self.oas + self.dr)).exp();
                discount * view.expected(|s| s.value2)
            }
        };

        let mut scratch = Scratch {
            value1: cash,
            value2: cash + continuation,
            ..Scratch::default()
        };
        if let Some(&call_price) = self.bond.calls.get(&step) {
            if call_price < continuation {
                scratch.value2 = cash + call_price;
                scratch.flag = true;
            }
        }
        scratch
    }
}
