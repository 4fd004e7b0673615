//! Calibrated short-rate lattice.

use crate::drift::DriftFit;
use crate::error::{LatticeError, LatticeResult};
use crate::model::ShortRateModel;
use crate::node::{LatticeNode, Scratch};
use crate::traversal::NodeVisitor;
use crate::tree::RecombinantTree;

/// A trinomial short-rate lattice fitted to a zero curve.
///
/// Built by [`ShortRateTreeBuilder`](crate::ShortRateTreeBuilder). Level `m`
/// sits at time `m·dt`; every level, the horizon level included, carries a
/// drift and realized rates. Apart from the scratch records used by pricing
/// passes the lattice never changes after construction.
///
/// # Pricing passes
///
/// Instruments price by backward induction through a [`NodeVisitor`].
/// [`backward_induction`](Self::backward_induction) clears every scratch
/// record first, so passes for different instruments on the same tree do
/// not see each other's values.
#[derive(Debug, Clone)]
pub struct ShortRateTree {
    model: ShortRateModel,
    mean_reversion: f64,
    volatility: f64,
    dt: f64,
    rate_spacing: f64,
    saturation_bound: i32,
    /// Target discount factors for steps `0..=num_steps + 1`.
    discount_factors: Vec<f64>,
    drifts: Vec<f64>,
    fits: Vec<DriftFit>,
    lattice: RecombinantTree,
}

impl ShortRateTree {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        model: ShortRateModel,
        mean_reversion: f64,
        volatility: f64,
        dt: f64,
        rate_spacing: f64,
        saturation_bound: i32,
        discount_factors: Vec<f64>,
        drifts: Vec<f64>,
        fits: Vec<DriftFit>,
        lattice: RecombinantTree,
    ) -> Self {
        Self {
            model,
            mean_reversion,
            volatility,
            dt,
            rate_spacing,
            saturation_bound,
            discount_factors,
            drifts,
            fits,
            lattice,
        }
    }

    /// Short-rate model of the lattice.
    pub fn model(&self) -> ShortRateModel {
        self.model
    }

    /// Mean-reversion speed `a`.
    pub fn mean_reversion(&self) -> f64 {
        self.mean_reversion
    }

    /// Volatility `σ`.
    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    /// Time step length.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// State spacing `dR = σ·sqrt(3·dt)`.
    pub fn rate_spacing(&self) -> f64 {
        self.rate_spacing
    }

    /// Offset at which branching turns inward.
    pub fn saturation_bound(&self) -> i32 {
        self.saturation_bound
    }

    /// Index of the horizon level.
    pub fn num_steps(&self) -> usize {
        self.lattice.last_step()
    }

    /// Time in years of the horizon level.
    pub fn horizon(&self) -> f64 {
        self.time_at_step(self.num_steps())
    }

    /// Time in years of a level.
    pub fn time_at_step(&self, step: usize) -> f64 {
        step as f64 * self.dt
    }

    /// Level closest to time `t`. Negative times map to the root.
    pub fn nearest_time_step(&self, t: f64) -> usize {
        (t / self.dt).round().max(0.0) as usize
    }

    /// Width bound of a level.
    pub fn j_max(&self, step: usize) -> LatticeResult<i32> {
        self.lattice.j_max(step)
    }

    /// Node at `(step, offset)`.
    pub fn node(&self, step: usize, offset: i32) -> LatticeResult<&LatticeNode> {
        self.lattice.node(step, offset)
    }

    /// The root node.
    pub fn root(&self) -> &LatticeNode {
        &self.lattice.nodes()[0]
    }

    /// Underlying node arena.
    pub fn lattice(&self) -> &RecombinantTree {
        &self.lattice
    }

    /// Fitted drift of a level.
    pub fn drift(&self, step: usize) -> LatticeResult<f64> {
        self.drifts.get(step).copied().ok_or(LatticeError::TimeStepOutOfRange {
            time_step: step,
            last_step: self.num_steps(),
        })
    }

    /// Fitted drifts, one per level.
    pub fn drifts(&self) -> &[f64] {
        &self.drifts
    }

    /// Drift fit diagnostics, one per level.
    pub fn drift_fits(&self) -> &[DriftFit] {
        &self.fits
    }

    /// Whether every level's drift met its tolerance.
    pub fn drift_converged(&self) -> bool {
        self.fits.iter().all(|fit| fit.converged)
    }

    /// Input-curve discount factor at a step, available up to one step past
    /// the horizon.
    pub fn discount_factor(&self, step: usize) -> LatticeResult<f64> {
        self.discount_factors
            .get(step)
            .copied()
            .ok_or(LatticeError::TimeStepOutOfRange {
                time_step: step,
                last_step: self.discount_factors.len() - 1,
            })
    }

    /// Model price at time 0 of a zero-coupon bond paying at step `step + 1`:
    /// `Σ_j Q(step, j)·exp(-R(step, j)·dt)`.
    pub fn implied_discount_factor(&self, step: usize) -> LatticeResult<f64> {
        Ok(self
            .lattice
            .level(step)?
            .iter()
            .map(|node| node.arrow_debreu * (-node.rate * self.dt).exp())
            .sum())
    }

    /// Realized rates at the lowest and highest offsets of a level.
    pub fn rate_range(&self, step: usize) -> LatticeResult<(f64, f64)> {
        let j = self.j_max(step)?;
        let low = self.node(step, -j)?.rate;
        let high = self.node(step, j)?.rate;
        Ok((low.min(high), low.max(high)))
    }

    /// Zeroes every scratch record.
    pub fn reset_scratch(&mut self) {
        self.lattice.reset_scratch();
    }

    /// Applies `visitor` to one level.
    pub fn traverse_level<V: NodeVisitor + ?Sized>(
        &mut self,
        step: usize,
        visitor: &mut V,
    ) -> LatticeResult<()> {
        self.lattice.traverse_level(step, visitor)
    }

    /// Applies `visitor` to every node, root level first.
    pub fn traverse_all<V: NodeVisitor + ?Sized>(&mut self, visitor: &mut V) {
        self.lattice.traverse_all(visitor);
    }

    /// Resets scratch, visits levels `last_step` down to 0 and returns the
    /// root's scratch record.
    ///
    /// # Errors
    ///
    /// `TimeStepOutOfRange` if `last_step` is past the horizon.
    pub fn backward_induction<V: NodeVisitor + ?Sized>(
        &mut self,
        last_step: usize,
        visitor: &mut V,
    ) -> LatticeResult<Scratch> {
        self.lattice.j_max(last_step)?;
        self.reset_scratch();
        for step in (0..=last_step).rev() {
            self.lattice.traverse_level(step, visitor)?;
        }
        Ok(self.root().scratch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traversal::NodeView;
    use crate::{ShortRateTreeBuilder, ZeroCurve};
    use approx::assert_relative_eq;

    fn tree(model: ShortRateModel) -> ShortRateTree {
        let curve = ZeroCurve::new(&[
            (0.25, 0.020),
            (1.0, 0.025),
            (2.0, 0.028),
            (5.0, 0.032),
            (10.0, 0.035),
        ])
        .unwrap();
        let s = match model {
            ShortRateModel::HullWhite => 0.01,
            ShortRateModel::BlackKarasinski => 0.2,
        };
        ShortRateTreeBuilder::new(model)
            .mean_reversion(0.1)
            .volatility(s)
            .step_size(0.25)
            .horizon(10.0)
            .curve(&curve)
            .build()
            .unwrap()
    }

    #[test]
    fn test_geometry() {
        let tree = tree(ShortRateModel::HullWhite);
        assert_eq!(tree.num_steps(), 40);
        assert_eq!(tree.saturation_bound(), 8);
        assert_eq!(tree.j_max(3).unwrap(), 3);
        assert_eq!(tree.j_max(40).unwrap(), 8);
        assert_relative_eq!(tree.horizon(), 10.0);
        assert_relative_eq!(tree.rate_spacing(), 0.01 * 0.75f64.sqrt());
        assert_eq!(tree.drifts().len(), 41);
        assert_eq!(tree.drift_fits().len(), 41);
        assert!(tree.drift(41).is_err());
        assert!(tree.discount_factor(41).is_ok());
        assert!(tree.discount_factor(42).is_err());
    }

    #[test]
    fn test_nearest_time_step() {
        let tree = tree(ShortRateModel::HullWhite);
        assert_eq!(tree.nearest_time_step(1.0), 4);
        assert_eq!(tree.nearest_time_step(1.1), 4);
        assert_eq!(tree.nearest_time_step(1.15), 5);
        assert_eq!(tree.nearest_time_step(-1.0), 0);
    }

    #[test]
    fn test_zero_coupon_bond_by_backward_induction() {
        for model in [ShortRateModel::HullWhite, ShortRateModel::BlackKarasinski] {
            let mut tree = tree(model);
            let maturity = 20;
            let dt = tree.dt();

            let mut zcb = |view: NodeView<'_>| {
                if view.time_step() == maturity {
                    Scratch::value(1.0)
                } else {
                    Scratch::value((-view.rate() * dt).exp() * view.expected(|s| s.value1))
                }
            };
            let price = tree.backward_induction(maturity, &mut zcb).unwrap().value1;

            assert_relative_eq!(price, tree.discount_factor(maturity).unwrap(), epsilon = 1e-8);
        }
    }

    #[test]
    fn test_backward_induction_resets_scratch() {
        let mut tree = tree(ShortRateModel::HullWhite);
        tree.traverse_all(&mut |_: NodeView<'_>| Scratch::value(7.0));

        let mut untouched = |view: NodeView<'_>| Scratch::value(view.expected(|s| s.value1));
        let value = tree.backward_induction(5, &mut untouched).unwrap();

        assert_eq!(value.value1, 0.0);
        assert_eq!(tree.node(10, 0).unwrap().scratch, Scratch::default());
    }

    #[test]
    fn test_backward_induction_past_horizon_fails() {
        let mut tree = tree(ShortRateModel::HullWhite);
        let mut noop = |_: NodeView<'_>| Scratch::default();
        assert!(matches!(
            tree.backward_induction(41, &mut noop),
            Err(LatticeError::TimeStepOutOfRange { .. })
        ));
    }
}
