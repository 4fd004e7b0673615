//! Optimization algorithms.
//!
//! Unconstrained minimization of smooth scalar objectives. Gradients are
//! estimated by central differences, so callers only supply the objective.

use nalgebra::{DMatrix, DVector};

use crate::error::{MathError, MathResult};

/// Backtracking halvings tried before a line search gives up.
const MAX_BACKTRACKS: u32 = 60;

/// Sufficient-decrease constant for the Armijo condition.
const ARMIJO_C1: f64 = 1e-4;

/// Configuration for optimization algorithms.
#[derive(Debug, Clone, Copy)]
pub struct OptimizationConfig {
    /// Convergence threshold on the largest gradient component.
    pub tolerance: f64,
    /// Relative change in the objective below which the search stops.
    /// Zero disables the test.
    pub function_tolerance: f64,
    /// Largest parameter move below which the search stops.
    pub step_tolerance: f64,
    /// Maximum number of iterations, zero meaning unlimited.
    pub max_iterations: u32,
    /// Step size for numerical gradients.
    pub step_size: f64,
    /// Upper bound on the largest component of a single step.
    pub max_step: Option<f64>,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            function_tolerance: 0.0,
            step_tolerance: 1e-15,
            max_iterations: 200,
            step_size: 1e-8,
            max_step: None,
        }
    }
}

impl OptimizationConfig {
    /// Sets the gradient tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the finite-difference step.
    #[must_use]
    pub fn with_step_size(mut self, step_size: f64) -> Self {
        self.step_size = step_size;
        self
    }

    /// Sets the iteration cap.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Caps the size of any single step.
    #[must_use]
    pub fn with_max_step(mut self, max_step: f64) -> Self {
        self.max_step = Some(max_step);
        self
    }
}

/// Result of an optimization run.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Optimal parameters found.
    pub parameters: Vec<f64>,
    /// Final objective function value.
    pub objective_value: f64,
    /// Number of iterations used.
    pub iterations: u32,
    /// Whether the optimization converged.
    pub converged: bool,
}

/// Quasi-Newton BFGS minimizer with numerical gradients.
///
/// Keeps a dense inverse-Hessian approximation, searches along the
/// quasi-Newton direction with Armijo backtracking, and falls back to
/// steepest descent whenever the approximation stops producing descent
/// directions. Non-finite objective values are treated as infeasible and
/// rejected by the line search.
///
/// Stops when the gradient, the step, or the relative change in the
/// objective drops below the thresholds in `config`. Hitting the iteration
/// cap, or a line search that cannot decrease the objective, returns the
/// best point with `converged == false`.
///
/// # Errors
///
/// Returns an error if `initial` is empty or the objective is not finite at
/// the starting point.
///
/// # Example
///
/// ```rust
/// use ratetree_math::optimization::{bfgs, OptimizationConfig};
///
/// let f = |p: &[f64]| (p[0] - 1.0).powi(2) + 10.0 * (p[1] + 2.0).powi(2);
/// let result = bfgs(f, &[0.0, 0.0], &OptimizationConfig::default()).unwrap();
///
/// assert!(result.converged);
/// assert!((result.parameters[0] - 1.0).abs() < 1e-6);
/// assert!((result.parameters[1] + 2.0).abs() < 1e-6);
/// ```
pub fn bfgs<F>(f: F, initial: &[f64], config: &OptimizationConfig) -> MathResult<OptimizationResult>
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return Err(MathError::invalid_input("no parameters to optimize"));
    }

    let mut x = DVector::from_column_slice(initial);
    let mut fx = f(x.as_slice());
    if !fx.is_finite() {
        return Err(MathError::invalid_input(
            "objective is not finite at the starting point",
        ));
    }

    let mut g = gradient(&f, &x, config.step_size);
    let mut h = DMatrix::<f64>::identity(n, n);
    let mut iteration = 0u32;

    let finish = |x: DVector<f64>, fx: f64, iterations: u32, converged: bool| {
        Ok(OptimizationResult {
            parameters: x.as_slice().to_vec(),
            objective_value: fx,
            iterations,
            converged,
        })
    };

    loop {
        if g.amax() < config.tolerance {
            return finish(x, fx, iteration, true);
        }
        if config.max_iterations != 0 && iteration >= config.max_iterations {
            return finish(x, fx, iteration, false);
        }

        let mut direction = -(&h * &g);
        let mut slope = direction.dot(&g);
        if slope.is_nan() || slope >= 0.0 {
            h = DMatrix::identity(n, n);
            direction = -g.clone();
            slope = direction.dot(&g);
        }

        if let Some(max_step) = config.max_step {
            let largest = direction.amax();
            if largest > max_step {
                let scale = max_step / largest;
                direction *= scale;
                slope *= scale;
            }
        }

        let Some((x_new, f_new)) = line_search(&f, &x, fx, &direction, slope) else {
            return finish(x, fx, iteration, false);
        };
        iteration += 1;

        let s = &x_new - &x;
        let g_new = gradient(&f, &x_new, config.step_size);
        let y = &g_new - &g;

        let f_change = (fx - f_new).abs();
        let f_scale = fx.abs().max(f_new.abs()).max(f64::MIN_POSITIVE);

        x = x_new;
        fx = f_new;
        g = g_new;

        if s.amax() < config.step_tolerance {
            return finish(x, fx, iteration, true);
        }
        if config.function_tolerance > 0.0 && f_change <= config.function_tolerance * f_scale {
            return finish(x, fx, iteration, true);
        }

        let sy = s.dot(&y);
        if sy > f64::EPSILON * s.norm() * y.norm() {
            if iteration == 1 {
                h = DMatrix::identity(n, n) * (sy / y.dot(&y));
            }
            let rho = 1.0 / sy;
            let identity = DMatrix::<f64>::identity(n, n);
            let left = &identity - rho * &s * y.transpose();
            let right = &identity - rho * &y * s.transpose();
            h = &left * &h * &right + rho * &s * s.transpose();
        }
    }
}

/// Central-difference gradient.
fn gradient<F>(f: &F, x: &DVector<f64>, step: f64) -> DVector<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut probe = x.clone();
    DVector::from_fn(x.len(), |i, _| {
        let xi = x[i];
        probe[i] = xi + step;
        let up = f(probe.as_slice());
        probe[i] = xi - step;
        let down = f(probe.as_slice());
        probe[i] = xi;
        (up - down) / (2.0 * step)
    })
}

/// Armijo backtracking along `direction`, starting from a unit step.
fn line_search<F>(
    f: &F,
    x: &DVector<f64>,
    fx: f64,
    direction: &DVector<f64>,
    slope: f64,
) -> Option<(DVector<f64>, f64)>
where
    F: Fn(&[f64]) -> f64,
{
    let mut alpha = 1.0;
    for _ in 0..MAX_BACKTRACKS {
        let candidate = x + alpha * direction;
        let value = f(candidate.as_slice());
        if value.is_finite() && value <= fx + ARMIJO_C1 * alpha * slope && value <= fx {
            return Some((candidate, value));
        }
        alpha *= 0.5;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bfgs_quadratic() {
        // Minimize (x-2)^2 + (y-3)^2
        let f = |params: &[f64]| {
            let x = params[0];
            let y = params[1];
            (x - 2.0).powi(2) + (y - 3.0).powi(2)
        };

        let result = bfgs(f, &[0.0, 0.0], &OptimizationConfig::default()).unwrap();

        assert!(result.converged);
        assert_relative_eq!(result.parameters[0], 2.0, epsilon = 1e-6);
        assert_relative_eq!(result.parameters[1], 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_bfgs_rosenbrock() {
        let f = |p: &[f64]| (1.0 - p[0]).powi(2) + 100.0 * (p[1] - p[0] * p[0]).powi(2);
        let config = OptimizationConfig::default()
            .with_tolerance(1e-7)
            .with_step_size(1e-7)
            .with_max_iterations(2000);

        let result = bfgs(f, &[-1.2, 1.0], &config).unwrap();

        assert_relative_eq!(result.parameters[0], 1.0, epsilon = 1e-3);
        assert_relative_eq!(result.parameters[1], 1.0, epsilon = 2e-3);
        assert!(result.objective_value < 1e-6);
    }

    #[test]
    fn test_bfgs_one_dimensional_root_match() {
        // Squared residual of exp(-x) against a target, the shape of a drift fit
        let target = (-0.75f64).exp();
        let f = |p: &[f64]| ((-p[0]).exp() - target).powi(2);
        let config = OptimizationConfig::default()
            .with_step_size(1e-6)
            .with_max_step(1.0);

        let result = bfgs(f, &[0.01], &config).unwrap();

        assert!(result.converged);
        assert_relative_eq!(result.parameters[0], 0.75, epsilon = 1e-4);
    }

    #[test]
    fn test_max_step_limits_moves() {
        let f = |p: &[f64]| (p[0] - 100.0).powi(2);
        let config = OptimizationConfig::default()
            .with_max_step(0.5)
            .with_max_iterations(1);

        let result = bfgs(f, &[0.0], &config).unwrap();

        assert!(!result.converged);
        assert!(result.parameters[0] <= 0.5 + 1e-12);
        assert!(result.parameters[0] > 0.0);
    }

    #[test]
    fn test_infeasible_region_is_avoided() {
        let f = |p: &[f64]| {
            if p[0] <= 0.0 {
                f64::NAN
            } else {
                (p[0].ln() - 1.0).powi(2)
            }
        };

        let result = bfgs(f, &[0.5], &OptimizationConfig::default().with_max_iterations(500)).unwrap();

        assert_relative_eq!(result.parameters[0], std::f64::consts::E, epsilon = 1e-4);
    }

    #[test]
    fn test_rejects_bad_start() {
        let f = |_: &[f64]| f64::INFINITY;
        assert!(bfgs(f, &[1.0], &OptimizationConfig::default()).is_err());
        assert!(bfgs(|_: &[f64]| 0.0, &[], &OptimizationConfig::default()).is_err());
    }
}
