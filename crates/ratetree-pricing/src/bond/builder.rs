//! Calendar-date construction of lattice bond schedules.

use std::collections::BTreeMap;

use chrono::{Months, NaiveDate};

use ratetree_lattice::ShortRateTree;

use super::{CallableBond, Payment};
use crate::error::{PricingError, PricingResult};

/// Day count denominator for Actual/365 year fractions.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Coupon dates this close to the accrual start are dropped.
const DAY_TOLERANCE: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Term {
    Maturity(NaiveDate),
    Perpetual(Payment),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CouponLeg {
    floating: bool,
    rate: f64,
    period: f64,
    start: NaiveDate,
    end: NaiveDate,
}

/// Builder for [`CallableBond`] from calendar dates.
///
/// Dates become year fractions from the evaluation date on an
/// Actual/365 basis and are snapped to the nearest lattice step. Coupon
/// legs are rolled back from their end date by whole months, so a leg
/// whose span is not a multiple of the period gets a short first coupon.
/// Coupon and call dates on or before the evaluation date are ignored,
/// and when two dates land on the same step the first one added wins.
///
/// # Example
///
/// ```rust
/// use chrono::NaiveDate;
/// use ratetree_lattice::{ShortRateModel, ShortRateTreeBuilder, ZeroCurve};
/// use ratetree_pricing::bond::BondBuilder;
///
/// let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
/// let curve = ZeroCurve::flat(0.03).unwrap();
/// let tree = ShortRateTreeBuilder::new(ShortRateModel::HullWhite)
///     .step_size(0.125)
///     .horizon(10.0)
///     .curve(&curve)
///     .build()
///     .unwrap();
///
/// let bond = BondBuilder::new(date(2024, 1, 15))
///     .maturity_date(date(2029, 5, 15))
///     .fixed_coupon(0.04875, 0.5, date(2019, 5, 8), date(2029, 5, 15))
///     .call(date(2026, 5, 15), 1.02)
///     .build(&tree)
///     .unwrap();
///
/// assert_eq!(bond.payments().len(), 11);
/// assert!(bond.is_callable());
/// ```
#[derive(Debug, Clone)]
pub struct BondBuilder {
    evaluation_date: NaiveDate,
    term: Option<Term>,
    coupons: Vec<CouponLeg>,
    calls: Vec<(NaiveDate, f64)>,
}

impl BondBuilder {
    /// Creates a builder valuing as of `evaluation_date`.
    pub fn new(evaluation_date: NaiveDate) -> Self {
        Self {
            evaluation_date,
            term: None,
            coupons: Vec::new(),
            calls: Vec::new(),
        }
    }

    /// Redeems at par on `date`.
    #[must_use]
    pub fn maturity_date(mut self, date: NaiveDate) -> Self {
        self.term = Some(Term::Maturity(date));
        self
    }

    /// Makes the bond perpetual, paying `coupon` beyond the lattice.
    #[must_use]
    pub fn perpetual(mut self, coupon: Payment) -> Self {
        self.term = Some(Term::Perpetual(coupon));
        self
    }

    /// Adds a fixed coupon leg paying `rate` every `period` years, with
    /// `end` a payment date.
    #[must_use]
    pub fn fixed_coupon(self, rate: f64, period: f64, start: NaiveDate, end: NaiveDate) -> Self {
        self.coupon_leg(false, rate, period, start, end)
    }

    /// Adds a floating coupon leg paying `spread` over the short rate.
    #[must_use]
    pub fn floating_coupon(
        self,
        spread: f64,
        period: f64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        self.coupon_leg(true, spread, period, start, end)
    }

    /// Adds a coupon leg.
    #[must_use]
    pub fn coupon_leg(
        mut self,
        floating: bool,
        rate: f64,
        period: f64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        self.coupons.push(CouponLeg {
            floating,
            rate,
            period,
            start,
            end,
        });
        self
    }

    /// Adds a call at `price` on `date`.
    #[must_use]
    pub fn call(mut self, date: NaiveDate, price: f64) -> Self {
        self.calls.push((date, price));
        self
    }

    /// Evaluation date.
    pub fn evaluation_date(&self) -> NaiveDate {
        self.evaluation_date
    }

    /// Actual/365 year fraction from the evaluation date.
    pub fn year_fraction(&self, date: NaiveDate) -> f64 {
        (date - self.evaluation_date).num_days() as f64 / DAYS_PER_YEAR
    }

    /// Maps the schedule onto `tree`.
    ///
    /// # Errors
    ///
    /// `InvalidInstrument` if no maturity or perpetual coupon was set, the
    /// maturity is not after the evaluation date, or a coupon period is not
    /// a whole number of months.
    pub fn build(&self, tree: &ShortRateTree) -> PricingResult<CallableBond> {
        let term = self
            .term
            .ok_or_else(|| PricingError::invalid_instrument("maturity date has not been set"))?;

        let mut payments = BTreeMap::new();
        for leg in &self.coupons {
            self.roll_coupons(leg, tree, &mut payments)?;
        }

        let mut calls = BTreeMap::new();
        for &(date, price) in &self.calls {
            if date <= self.evaluation_date {
                continue;
            }
            calls.entry(self.step(tree, date)).or_insert(price);
        }

        match term {
            Term::Maturity(date) => {
                if date <= self.evaluation_date {
                    return Err(PricingError::invalid_instrument(format!(
                        "maturity {date} is not after the evaluation date {}",
                        self.evaluation_date
                    )));
                }
                CallableBond::new(self.step(tree, date), payments, calls)
            }
            Term::Perpetual(coupon) => CallableBond::perpetual(coupon, payments, calls),
        }
    }

    fn step(&self, tree: &ShortRateTree, date: NaiveDate) -> usize {
        tree.nearest_time_step(self.year_fraction(date))
    }

    fn roll_coupons(
        &self,
        leg: &CouponLeg,
        tree: &ShortRateTree,
        payments: &mut BTreeMap<usize, Payment>,
    ) -> PricingResult<()> {
        let months = period_months(leg.period)?;
        if leg.end < leg.start {
            return Err(PricingError::invalid_instrument(format!(
                "coupon leg ends {} before it starts {}",
                leg.end, leg.start
            )));
        }

        for k in 0u32.. {
            let date = leg
                .end
                .checked_sub_months(Months::new(k * months))
                .ok_or_else(|| PricingError::invalid_instrument("coupon date out of range"))?;
            if (date - leg.start).num_days() <= DAY_TOLERANCE || date <= self.evaluation_date {
                break;
            }

            let previous = leg.end.checked_sub_months(Months::new((k + 1) * months));
            let accrual = match previous {
                Some(previous) if (leg.start - previous).num_days() > DAY_TOLERANCE => {
                    (date - leg.start).num_days() as f64 / DAYS_PER_YEAR
                }
                _ => leg.period,
            };

            payments.entry(self.step(tree, date)).or_insert(Payment {
                floating: leg.floating,
                rate: leg.rate,
                period: accrual,
            });
        }
        Ok(())
    }
}

/// Whole months in a coupon period of `period` years.
fn period_months(period: f64) -> PricingResult<u32> {
    let months = (period * 12.0).round();
    if !period.is_finite() || months < 1.0 || (period * 12.0 - months).abs() > 1e-6 {
        return Err(PricingError::invalid_instrument(format!(
            "coupon period {period} is not a whole number of months"
        )));
    }
    Ok(months as u32)
}
