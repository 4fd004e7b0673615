//! Construction of a curve-fitted short-rate lattice.
//!
//! Follows the two-stage trinomial procedure for one-factor models:
//!
//! 1. Grow a recombining tree for the state variable `x` with spacing
//!    `dR = σ·sqrt(3·dt)`, branching bound `ceil(0.184 / (a·dt))`, and
//!    transition probabilities that depend only on `a·j·dt`.
//! 2. Walk forward from the root with `Q(0,0) = 1`, fitting one drift per
//!    level so that `Σ_j Q(m,j)·exp(-r(m,j)·dt)` equals the curve's discount
//!    factor at step `m+1`, then pushing `Q` to the next level.

use crate::curve::ZeroCurve;
use crate::drift::{DriftFit, DriftProblem};
use crate::error::{LatticeError, LatticeResult};
use crate::model::ShortRateModel;
use crate::node::Probabilities;
use crate::short_rate::ShortRateTree;
use crate::tree::RecombinantTree;

/// Default time step length in years.
pub const DEFAULT_STEP_SIZE: f64 = 0.125;

/// Default lattice horizon in years.
pub const DEFAULT_HORIZON: f64 = 32.0;

/// Mean-reversion threshold on `a·dt·j` beyond which branching turns inward.
pub const BRANCHING_THRESHOLD: f64 = 0.184;

/// Smallest `j` with `a·dt·j >= 0.184`.
///
/// # Errors
///
/// Returns `InvalidParameter` unless `a·dt` is positive and finite.
pub fn saturation_bound(mean_reversion: f64, dt: f64) -> LatticeResult<i32> {
    let a_dt = mean_reversion * dt;
    if !a_dt.is_finite() || a_dt <= 0.0 {
        return Err(LatticeError::invalid_parameter(format!(
            "a·dt must be positive, got {a_dt}"
        )));
    }
    let bound = (BRANCHING_THRESHOLD / a_dt).ceil().min(f64::from(i32::MAX));
    Ok((bound as i32).max(1))
}

/// Builder for [`ShortRateTree`].
///
/// # Example
///
/// ```rust
/// use ratetree_lattice::{ShortRateModel, ShortRateTreeBuilder, ZeroCurve};
///
/// let curve = ZeroCurve::flat(0.03).unwrap();
/// let tree = ShortRateTreeBuilder::new(ShortRateModel::HullWhite)
///     .mean_reversion(0.1)
///     .volatility(0.01)
///     .step_size(0.25)
///     .horizon(5.0)
///     .curve(&curve)
///     .build()
///     .unwrap();
///
/// assert_eq!(tree.num_steps(), 20);
/// let df = tree.implied_discount_factor(0).unwrap();
/// assert!((df - (-0.03f64 * 0.25).exp()).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct ShortRateTreeBuilder<'a> {
    model: ShortRateModel,
    mean_reversion: f64,
    volatility: f64,
    step_size: f64,
    horizon: f64,
    curve: Option<&'a ZeroCurve>,
    strict_drift: bool,
}

impl<'a> ShortRateTreeBuilder<'a> {
    /// Starts a builder with `a = 0.1`, `σ = 0.01`, the default step size
    /// and horizon, and no curve.
    pub fn new(model: ShortRateModel) -> Self {
        Self {
            model,
            mean_reversion: 0.1,
            volatility: 0.01,
            step_size: DEFAULT_STEP_SIZE,
            horizon: DEFAULT_HORIZON,
            curve: None,
            strict_drift: false,
        }
    }

    /// Sets the mean-reversion speed `a`.
    pub fn mean_reversion(mut self, a: f64) -> Self {
        self.mean_reversion = a;
        self
    }

    /// Sets the volatility `σ`.
    pub fn volatility(mut self, s: f64) -> Self {
        self.volatility = s;
        self
    }

    /// Sets the time step length.
    pub fn step_size(mut self, dt: f64) -> Self {
        self.step_size = dt;
        self
    }

    /// Sets the horizon in years.
    pub fn horizon(mut self, horizon: f64) -> Self {
        self.horizon = horizon;
        self
    }

    /// Sets the curve the lattice reprices.
    pub fn curve(mut self, curve: &'a ZeroCurve) -> Self {
        self.curve = Some(curve);
        self
    }

    /// Fails the build when a numerical drift fit does not converge,
    /// instead of logging a warning and keeping the last iterate.
    pub fn strict_drift(mut self, strict: bool) -> Self {
        self.strict_drift = strict;
        self
    }

    fn validate(&self) -> LatticeResult<&'a ZeroCurve> {
        let a = self.mean_reversion;
        let s = self.volatility;
        let dt = self.step_size;

        if !a.is_finite() || a <= 0.0 {
            return Err(LatticeError::invalid_parameter(format!(
                "mean reversion must be positive, got {a}"
            )));
        }
        if !s.is_finite() || s < 0.0 {
            return Err(LatticeError::invalid_parameter(format!(
                "volatility must be non-negative, got {s}"
            )));
        }
        if !dt.is_finite() || dt <= 0.0 {
            return Err(LatticeError::invalid_parameter(format!(
                "step size must be positive, got {dt}"
            )));
        }
        if !self.horizon.is_finite() || self.horizon < dt {
            return Err(LatticeError::invalid_parameter(format!(
                "horizon {} must cover at least one step of {dt}",
                self.horizon
            )));
        }
        self.curve
            .ok_or_else(|| LatticeError::invalid_parameter("no zero curve supplied"))
    }

    /// Builds and calibrates the lattice.
    ///
    /// # Errors
    ///
    /// - `InvalidParameter` for `a <= 0`, `σ < 0`, a non-positive step, a
    ///   horizon shorter than one step, a missing curve, or a curve that
    ///   cannot price a step date (e.g. a step before its first tenor)
    /// - `DriftNotConverged` in strict mode
    pub fn build(self) -> LatticeResult<ShortRateTree> {
        let curve = self.validate()?;
        let model = self.model;
        let a = self.mean_reversion;
        let dt = self.step_size;
        let num_steps = (self.horizon / dt).round() as usize;
        let rate_spacing = self.volatility * (3.0 * dt).sqrt();
        let bound = saturation_bound(a, dt)?;

        let discount_factors = (0..=num_steps + 1)
            .map(|m| curve.discount_factor(m as f64 * dt))
            .collect::<LatticeResult<Vec<_>>>()?;

        let mut lattice = RecombinantTree::new();
        for _ in 0..num_steps {
            lattice.add_level(bound)?;
        }
        for step in 0..num_steps {
            for node in lattice.level_mut(step)? {
                node.probabilities =
                    Probabilities::trinomial(node.branch, a * f64::from(node.offset) * dt);
            }
        }

        lattice.node_mut(0, 0)?.arrow_debreu = 1.0;

        let mut drifts = Vec::with_capacity(num_steps + 1);
        let mut fits = Vec::with_capacity(num_steps + 1);
        for step in 0..=num_steps {
            let fit = DriftProblem {
                step,
                level: lattice.level(step)?,
                rate_spacing,
                dt,
                target: discount_factors[step + 1],
            }
            .solve(model)?;

            if self.strict_drift && !fit.converged {
                return Err(LatticeError::DriftNotConverged {
                    step,
                    residual: fit.residual,
                });
            }

            for node in lattice.level_mut(step)? {
                node.rate = model.short_rate(fit.drift + f64::from(node.offset) * rate_spacing);
            }
            if step < num_steps {
                lattice.push_forward(step, |node| node.arrow_debreu * (-node.rate * dt).exp())?;
            }

            drifts.push(fit.drift);
            fits.push(fit);
        }

        let unconverged = fits.iter().filter(|f: &&DriftFit| !f.converged).count();
        tracing::debug!(
            model = %model,
            a,
            s = self.volatility,
            dt,
            steps = num_steps,
            bound,
            nodes = lattice.len(),
            unconverged,
            "built short-rate lattice"
        );

        Ok(ShortRateTree::new(
            model,
            a,
            self.volatility,
            dt,
            rate_spacing,
            bound,
            discount_factors,
            drifts,
            fits,
            lattice,
        ))
    }
}
