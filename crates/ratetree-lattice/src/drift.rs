//! Per-level drift fitting.
//!
//! At each time step the drift shifts every state so that the level's
//! Arrow-Debreu prices, discounted one step at the realized rates, reproduce
//! the input discount factor of the next step. Hull-White admits a closed
//! form; Black-Karasinski is solved numerically.

use ratetree_math::optimization::{bfgs, OptimizationConfig};
use serde::{Deserialize, Serialize};

use crate::error::{LatticeError, LatticeResult};
use crate::model::ShortRateModel;
use crate::node::LatticeNode;

/// Starting guess of the numerical drift search.
pub const INITIAL_DRIFT: f64 = 0.01;

/// Largest pricing error a numerical drift fit may leave.
pub const RESIDUAL_TOLERANCE: f64 = 1e-12;

const MAX_NEWTON_STEPS: u32 = 8;

/// Outcome of fitting one level's drift.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftFit {
    /// Time step of the level.
    pub step: usize,
    /// Fitted drift.
    pub drift: f64,
    /// Whether the fit met its tolerance. Always true for the closed form.
    pub converged: bool,
    /// Optimizer iterations, zero for the closed form.
    pub iterations: u32,
    /// Implied minus target discount factor.
    pub residual: f64,
}

/// One level's drift equation.
#[derive(Debug, Clone, Copy)]
pub struct DriftProblem<'a> {
    /// Time step of the level.
    pub step: usize,
    /// Nodes of the level, with Arrow-Debreu prices filled in.
    pub level: &'a [LatticeNode],
    /// Spacing `dR` between adjacent states.
    pub rate_spacing: f64,
    /// Time step length.
    pub dt: f64,
    /// Discount factor of the next step.
    pub target: f64,
}

impl DriftProblem<'_> {
    /// Model price of the next step's zero-coupon bond for a given drift.
    pub fn implied_price(&self, model: ShortRateModel, drift: f64) -> f64 {
        self.level
            .iter()
            .map(|node| {
                let r = model.short_rate(drift + f64::from(node.offset) * self.rate_spacing);
                node.arrow_debreu * (-r * self.dt).exp()
            })
            .sum()
    }

    /// Fits the drift for `model`.
    pub fn solve(&self, model: ShortRateModel) -> LatticeResult<DriftFit> {
        match model {
            ShortRateModel::HullWhite => self.solve_closed_form(),
            ShortRateModel::BlackKarasinski => self.solve_numerically(),
        }
    }

    /// `alpha = (ln Σ Q·exp(-j·dR·dt) - ln P(m+1)) / dt`.
    fn solve_closed_form(&self) -> LatticeResult<DriftFit> {
        let q_sum: f64 = self
            .level
            .iter()
            .map(|node| node.arrow_debreu * (-f64::from(node.offset) * self.rate_spacing * self.dt).exp())
            .sum();

        if !q_sum.is_finite() || q_sum <= 0.0 || self.target <= 0.0 {
            return Err(LatticeError::invalid_parameter(format!(
                "cannot fit drift at step {}: state price sum {q_sum}, target {}",
                self.step, self.target
            )));
        }

        let drift = (q_sum.ln() - self.target.ln()) / self.dt;
        Ok(DriftFit {
            step: self.step,
            drift,
            converged: true,
            iterations: 0,
            residual: self.implied_price(ShortRateModel::HullWhite, drift) - self.target,
        })
    }

    /// Derivative of [`implied_price`](Self::implied_price) with respect to
    /// the drift under Black-Karasinski: `-dt·Σ Q·r·exp(-r·dt)`.
    fn implied_slope(&self, drift: f64) -> f64 {
        -self.dt
            * self
                .level
                .iter()
                .map(|node| {
                    let r = (drift + f64::from(node.offset) * self.rate_spacing).exp();
                    node.arrow_debreu * r * (-r * self.dt).exp()
                })
                .sum::<f64>()
    }

    /// Minimizes the squared pricing error over the drift, then refines the
    /// minimizer with Newton steps on the pricing error itself.
    fn solve_numerically(&self) -> LatticeResult<DriftFit> {
        let model = ShortRateModel::BlackKarasinski;
        let objective = |p: &[f64]| (self.implied_price(model, p[0]) - self.target).powi(2);

        let config = OptimizationConfig::default()
            .with_tolerance(1e-10)
            .with_step_size(1e-6)
            .with_max_iterations(0)
            .with_max_step(1.0);

        let result = bfgs(objective, &[INITIAL_DRIFT], &config)?;
        let mut drift = result.parameters[0];
        let mut residual = self.implied_price(model, drift) - self.target;
        let mut iterations = result.iterations;

        // The squared error flattens near its root, so the gradient test
        // above leaves residuals of order 1e-8.
        for _ in 0..MAX_NEWTON_STEPS {
            if residual.abs() <= RESIDUAL_TOLERANCE {
                break;
            }
            let slope = self.implied_slope(drift);
            if !slope.is_finite() || slope == 0.0 {
                break;
            }
            let next = drift - residual / slope;
            let next_residual = self.implied_price(model, next) - self.target;
            if !next_residual.is_finite() || next_residual.abs() >= residual.abs() {
                break;
            }
            drift = next;
            residual = next_residual;
            iterations += 1;
        }

        let converged = residual.abs() <= RESIDUAL_TOLERANCE;
        if !converged {
            tracing::warn!(
                step = self.step,
                drift,
                residual,
                iterations,
                "drift fit stopped before reaching its tolerance"
            );
        }

        Ok(DriftFit {
            step: self.step,
            drift,
            converged,
            iterations,
            residual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn single_node(q: f64) -> Vec<LatticeNode> {
        let mut node = LatticeNode::new(0, 0);
        node.arrow_debreu = q;
        vec![node]
    }

    #[test]
    fn test_closed_form_at_root() {
        let level = single_node(1.0);
        let problem = DriftProblem {
            step: 0,
            level: &level,
            rate_spacing: 0.01,
            dt: 0.25,
            target: (-0.04f64 * 0.25).exp(),
        };

        let fit = problem.solve(ShortRateModel::HullWhite).unwrap();
        assert_relative_eq!(fit.drift, 0.04, epsilon = 1e-12);
        assert!(fit.converged);
        assert!(fit.residual.abs() < 1e-15);
    }

    #[test]
    fn test_numerical_at_root() {
        let level = single_node(1.0);
        let problem = DriftProblem {
            step: 0,
            level: &level,
            rate_spacing: 0.1,
            dt: 0.125,
            target: (-0.03f64 * 0.125).exp(),
        };

        let fit = problem.solve(ShortRateModel::BlackKarasinski).unwrap();
        assert!(fit.converged);
        assert_relative_eq!(fit.drift, 0.03f64.ln(), epsilon = 1e-9);
        assert!(fit.residual.abs() <= RESIDUAL_TOLERANCE);
    }

    #[test]
    fn test_numerical_on_wide_level() {
        // A level of seven states carrying the same total price as one.
        let level: Vec<LatticeNode> = (-3..=3)
            .map(|offset| {
                let mut node = LatticeNode::new(10, offset);
                node.arrow_debreu = 0.95 / 7.0;
                node
            })
            .collect();
        let problem = DriftProblem {
            step: 10,
            level: &level,
            rate_spacing: 0.2,
            dt: 0.125,
            target: 0.95 * (-0.035f64 * 0.125).exp(),
        };

        let fit = problem.solve(ShortRateModel::BlackKarasinski).unwrap();
        assert!(fit.converged);
        assert!(fit.residual.abs() <= RESIDUAL_TOLERANCE);
        assert_relative_eq!(
            problem.implied_price(ShortRateModel::BlackKarasinski, fit.drift),
            problem.target,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_slope_matches_finite_difference() {
        let level = single_node(0.9);
        let problem = DriftProblem {
            step: 1,
            level: &level,
            rate_spacing: 0.1,
            dt: 0.5,
            target: 0.88,
        };
        let model = ShortRateModel::BlackKarasinski;
        let x = -3.2;
        let h = 1e-6;
        let numeric =
            (problem.implied_price(model, x + h) - problem.implied_price(model, x - h)) / (2.0 * h);
        assert_relative_eq!(problem.implied_slope(x), numeric, max_relative = 1e-6);
    }

    #[test]
    fn test_rejects_degenerate_level() {
        let level = single_node(0.0);
        let problem = DriftProblem {
            step: 3,
            level: &level,
            rate_spacing: 0.01,
            dt: 0.25,
            target: 0.99,
        };
        assert!(problem.solve(ShortRateModel::HullWhite).is_err());
    }
}
