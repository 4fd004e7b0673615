//! OAS and risk analytics for lattice-priced bonds.

use ratetree_lattice::ShortRateTree;
use ratetree_math::interpolation::{AkimaSpline, Interpolator};

use super::CallableBond;
use crate::error::{PricingError, PricingResult};

/// Bump used by every finite-difference measure.
pub const ONE_BP: f64 = 1e-4;

/// Number of sampled spreads.
const OAS_POINTS: usize = 201;

/// Decades spanned by the log-spaced spread grid.
const OAS_DECADES: f64 = 2.0;

/// Bond price as a function of option-adjusted spread.
///
/// Spreads are sampled log-densely near zero on `[0, 0.99]`, each priced by
/// a full backward induction. Akima splines map spread to price and back.
#[derive(Debug, Clone)]
pub struct OasCurve {
    spreads: Vec<f64>,
    prices: Vec<f64>,
    oas_to_price: AkimaSpline,
    price_to_oas: AkimaSpline,
}

impl OasCurve {
    /// The spread grid: `(10^(2i/200) - 1) / 100` for `i = 0..=200`.
    pub fn grid() -> Vec<f64> {
        let scale = 10f64.powf(OAS_DECADES);
        (0..OAS_POINTS)
            .map(|i| {
                let exponent = i as f64 * OAS_DECADES / (OAS_POINTS - 1) as f64;
                (10f64.powf(exponent) - 1.0) / scale
            })
            .collect()
    }

    /// Prices `bond` at every grid spread.
    pub fn build(bond: &CallableBond, tree: &mut ShortRateTree) -> PricingResult<Self> {
        let spreads = Self::grid();
        let prices = spreads
            .iter()
            .map(|&oas| bond.value(tree, 0.0, oas))
            .collect::<PricingResult<Vec<_>>>()?;

        let oas_to_price = AkimaSpline::new(spreads.clone(), prices.clone())?;

        // Prices fall with spread; keep the strictly monotone part, ascending.
        let mut by_price: Vec<(f64, f64)> = Vec::with_capacity(OAS_POINTS);
        for (&price, &oas) in prices.iter().zip(&spreads).rev() {
            if by_price.last().map_or(true, |&(last, _)| price > last) {
                by_price.push((price, oas));
            }
        }
        let (xs, ys): (Vec<f64>, Vec<f64>) = by_price.into_iter().unzip();
        let price_to_oas = AkimaSpline::new(xs, ys)?;

        tracing::debug!(
            min_price = prices[OAS_POINTS - 1],
            max_price = prices[0],
            "Built OAS curve"
        );

        Ok(Self {
            spreads,
            prices,
            oas_to_price,
            price_to_oas,
        })
    }

    /// Sampled spreads.
    pub fn spreads(&self) -> &[f64] {
        &self.spreads
    }

    /// Prices at the sampled spreads.
    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    /// `(min, max)` spread covered.
    pub fn oas_range(&self) -> (f64, f64) {
        (self.oas_to_price.min_x(), self.oas_to_price.max_x())
    }

    /// `(min, max)` price covered.
    pub fn price_range(&self) -> (f64, f64) {
        (self.price_to_oas.min_x(), self.price_to_oas.max_x())
    }

    /// Interpolated price at `oas`.
    ///
    /// # Errors
    ///
    /// `OutsideSensitivityRange` outside [`oas_range`](Self::oas_range).
    pub fn price(&self, oas: f64) -> PricingResult<f64> {
        check_range(oas, self.oas_range())?;
        Ok(self.oas_to_price.interpolate(oas)?)
    }

    /// Interpolated spread at which the bond is worth `price`.
    pub fn oas(&self, price: f64) -> PricingResult<f64> {
        check_range(price, self.price_range())?;
        Ok(self.price_to_oas.interpolate(price)?)
    }

    /// First and second spread differences at `oas`, bumped inward so the
    /// stencil stays inside the sampled range. Returns `(down, mid, up)`.
    fn stencil(&self, oas: f64) -> PricingResult<(f64, f64, f64)> {
        let (min, max) = self.oas_range();
        check_range(oas, (min, max))?;
        let x = oas.max(min + ONE_BP).min(max - ONE_BP);
        Ok((
            self.oas_to_price.interpolate(x - ONE_BP)?,
            self.oas_to_price.interpolate(x)?,
            self.oas_to_price.interpolate(x + ONE_BP)?,
        ))
    }
}

fn check_range(value: f64, (min, max): (f64, f64)) -> PricingResult<()> {
    if value.is_nan() || value < min || value > max {
        return Err(PricingError::OutsideSensitivityRange { value, min, max });
    }
    Ok(())
}

/// Price, OAS and sensitivities of a bond on a calibrated lattice.
///
/// Rate measures reprice the bond with the short rate shifted by ±1bp.
/// Spread measures difference the [`OasCurve`] built on construction.
///
/// # Example
///
/// ```rust
/// use std::collections::BTreeMap;
///
/// use ratetree_lattice::{ShortRateModel, ShortRateTreeBuilder, ZeroCurve};
/// use ratetree_pricing::bond::{BondAnalytics, CallableBond, Payment};
///
/// let curve = ZeroCurve::flat(0.03).unwrap();
/// let mut tree = ShortRateTreeBuilder::new(ShortRateModel::HullWhite)
///     .step_size(0.25)
///     .horizon(5.0)
///     .curve(&curve)
///     .build()
///     .unwrap();
///
/// let coupons: BTreeMap<usize, Payment> =
///     (1..=10).map(|k| (2 * k, Payment::fixed(0.04, 0.5))).collect();
/// let bond = CallableBond::new(20, coupons, BTreeMap::new()).unwrap();
///
/// let mut analytics = BondAnalytics::new(&mut tree, &bond).unwrap();
/// let oas = analytics.oas(1.0).unwrap();
/// assert!(oas > 0.0);
/// assert!(analytics.spread_duration(oas).unwrap() > 4.0);
/// ```
pub struct BondAnalytics<'a> {
    tree: &'a mut ShortRateTree,
    bond: &'a CallableBond,
    curve: OasCurve,
}

impl<'a> BondAnalytics<'a> {
    /// Builds the OAS curve of `bond` on `tree`.
    pub fn new(tree: &'a mut ShortRateTree, bond: &'a CallableBond) -> PricingResult<Self> {
        let curve = OasCurve::build(bond, tree)?;
        Ok(Self { tree, bond, curve })
    }

    /// The sampled OAS curve.
    pub fn curve(&self) -> &OasCurve {
        &self.curve
    }

    /// Full lattice value with rate shift `dr` and spread `oas`.
    pub fn value(&mut self, dr: f64, oas: f64) -> PricingResult<f64> {
        self.bond.value(self.tree, dr, oas)
    }

    /// Price at spread `oas`.
    pub fn price(&self, oas: f64) -> PricingResult<f64> {
        self.curve.price(oas)
    }

    /// Spread matching `price`.
    pub fn oas(&self, price: f64) -> PricingResult<f64> {
        self.curve.oas(price)
    }

    /// Price change per unit parallel rate move, `-dV/dr`.
    pub fn rate_risk(&mut self, dr: f64, oas: f64) -> PricingResult<f64> {
        let down = self.value(dr - ONE_BP, oas)?;
        let up = self.value(dr + ONE_BP, oas)?;
        Ok((down - up) / (2.0 * ONE_BP))
    }

    /// Rate risk per unit value.
    pub fn rate_duration(&mut self, dr: f64, oas: f64) -> PricingResult<f64> {
        let value = self.value(dr, oas)?;
        Ok(self.rate_risk(dr, oas)? / value)
    }

    /// Second derivative in the rate shift per unit value.
    pub fn rate_convexity(&mut self, dr: f64, oas: f64) -> PricingResult<f64> {
        let down = self.value(dr - ONE_BP, oas)?;
        let mid = self.value(dr, oas)?;
        let up = self.value(dr + ONE_BP, oas)?;
        Ok((down + up - 2.0 * mid) / (mid * ONE_BP * ONE_BP))
    }

    /// Price change per unit spread move, `-dP/dOAS`.
    pub fn spread_risk(&self, oas: f64) -> PricingResult<f64> {
        let (down, _, up) = self.curve.stencil(oas)?;
        Ok((down - up) / (2.0 * ONE_BP))
    }

    /// Spread risk per unit price.
    pub fn spread_duration(&self, oas: f64) -> PricingResult<f64> {
        Ok(self.spread_risk(oas)? / self.price(oas)?)
    }

    /// Second derivative in the spread per unit price.
    pub fn spread_convexity(&self, oas: f64) -> PricingResult<f64> {
        let (down, mid, up) = self.curve.stencil(oas)?;
        Ok((down + up - 2.0 * mid) / (mid * ONE_BP * ONE_BP))
    }
}
