//! Akima spline interpolation.

use crate::error::MathResult;
use crate::interpolation::{
    locate, validate_knots, Extrapolation, Interpolator, Located, AKIMA_MIN_POINTS,
};

/// Akima spline interpolation.
///
/// A piecewise cubic Hermite interpolant whose knot derivatives are weighted
/// averages of neighbouring secant slopes. The weights damp the overshoot a
/// natural cubic spline shows around abrupt changes in slope, which keeps
/// zero curves and price/spread tables free of spurious wiggles.
///
/// The two derivatives at each end come from the parabola through the three
/// outermost knots.
///
/// # Example
///
/// ```rust
/// use ratetree_math::interpolation::{AkimaSpline, Interpolator};
///
/// let xs = vec![1.0, 2.0, 3.0, 5.0, 10.0];
/// let ys = vec![0.010, 0.015, 0.020, 0.025, 0.030];
///
/// let spline = AkimaSpline::new(xs, ys).unwrap();
/// let y = spline.interpolate(4.0).unwrap();
/// assert!(y > 0.020 && y < 0.025);
/// ```
#[derive(Debug, Clone)]
pub struct AkimaSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// First derivatives at each knot
    ds: Vec<f64>,
    extrapolation: Extrapolation,
}

impl AkimaSpline {
    /// Creates an Akima spline.
    ///
    /// # Errors
    ///
    /// Returns an error if there are fewer than 5 points, if lengths differ,
    /// or if `xs` is not strictly increasing.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> MathResult<Self> {
        validate_knots(&xs, &ys, AKIMA_MIN_POINTS)?;
        let ds = knot_derivatives(&xs, &ys);
        Ok(Self {
            xs,
            ys,
            ds,
            extrapolation: Extrapolation::None,
        })
    }

    /// Sets the extrapolation mode.
    #[must_use]
    pub fn with_extrapolation(mut self, mode: Extrapolation) -> Self {
        self.extrapolation = mode;
        self
    }

    /// Hermite coefficients `(c1, c2, c3)` of segment `i`; `c0` is `ys[i]`.
    fn coefficients(&self, i: usize) -> (f64, f64, f64) {
        let h = self.xs[i + 1] - self.xs[i];
        let slope = (self.ys[i + 1] - self.ys[i]) / h;
        let (d0, d1) = (self.ds[i], self.ds[i + 1]);
        let c2 = (3.0 * slope - 2.0 * d0 - d1) / h;
        let c3 = (d0 + d1 - 2.0 * slope) / (h * h);
        (d0, c2, c3)
    }
}

impl Interpolator for AkimaSpline {
    fn interpolate(&self, x: f64) -> MathResult<f64> {
        match locate(&self.xs, x, self.extrapolation)? {
            Located::Flat => Ok(self.ys[self.ys.len() - 1]),
            Located::Segment(i) => {
                let t = x - self.xs[i];
                let (c1, c2, c3) = self.coefficients(i);
                Ok(self.ys[i] + t * (c1 + t * (c2 + t * c3)))
            }
        }
    }

    fn derivative(&self, x: f64) -> MathResult<f64> {
        match locate(&self.xs, x, self.extrapolation)? {
            Located::Flat => Ok(0.0),
            Located::Segment(i) => {
                let t = x - self.xs[i];
                let (c1, c2, c3) = self.coefficients(i);
                Ok(c1 + t * (2.0 * c2 + 3.0 * t * c3))
            }
        }
    }

    fn min_x(&self) -> f64 {
        self.xs[0]
    }

    fn max_x(&self) -> f64 {
        self.xs[self.xs.len() - 1]
    }
}

fn knot_derivatives(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = xs.len();

    let secants: Vec<f64> = (0..n - 1)
        .map(|i| (ys[i + 1] - ys[i]) / (xs[i + 1] - xs[i]))
        .collect();

    let mut weights = vec![0.0; n - 1];
    for i in 1..n - 1 {
        weights[i] = (secants[i] - secants[i - 1]).abs();
    }

    let mut ds = vec![0.0; n];
    for i in 2..n - 2 {
        let denom = weights[i - 1] + weights[i + 1];
        ds[i] = if denom != 0.0 {
            (weights[i + 1] * secants[i - 1] + weights[i - 1] * secants[i]) / denom
        } else {
            ((xs[i + 1] - xs[i]) * secants[i - 1] + (xs[i] - xs[i - 1]) * secants[i])
                / (xs[i + 1] - xs[i - 1])
        };
    }

    ds[0] = parabola_slope(&xs[0..3], &ys[0..3], xs[0]);
    ds[1] = parabola_slope(&xs[0..3], &ys[0..3], xs[1]);
    ds[n - 2] = parabola_slope(&xs[n - 3..n], &ys[n - 3..n], xs[n - 2]);
    ds[n - 1] = parabola_slope(&xs[n - 3..n], &ys[n - 3..n], xs[n - 1]);
    ds
}

/// Slope at `t` of the parabola through three knots.
fn parabola_slope(xs: &[f64], ys: &[f64], t: f64) -> f64 {
    let t = t - xs[0];
    let x1 = xs[1] - xs[0];
    let x2 = xs[2] - xs[0];
    let a = (ys[2] - ys[0] - x2 / x1 * (ys[1] - ys[0])) / (x2 * x2 - x1 * x2);
    let b = (ys[1] - ys[0] - a * x1 * x1) / x1;
    2.0 * a * t + b
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_reproduces_straight_line() {
        let xs = vec![0.0, 1.0, 2.5, 4.0, 7.0, 9.0];
        let ys: Vec<f64> = xs.iter().map(|x| 0.5 + 0.25 * x).collect();

        let spline = AkimaSpline::new(xs, ys).unwrap();

        for x in [0.3, 1.7, 3.3, 5.0, 8.9] {
            assert_relative_eq!(spline.interpolate(x).unwrap(), 0.5 + 0.25 * x, epsilon = 1e-12);
            assert_relative_eq!(spline.derivative(x).unwrap(), 0.25, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_no_overshoot_on_step() {
        // Flat, jump, flat: Akima stays inside the data range on each flat run
        let xs = vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let ys = vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];

        let spline = AkimaSpline::new(xs, ys).unwrap();

        for x in [0.5, 1.5, 4.5, 5.5] {
            let y = spline.interpolate(x).unwrap();
            assert!((-1e-12..=1.0 + 1e-12).contains(&y), "y({x}) = {y}");
        }
    }

    #[test]
    fn test_derivative_matches_finite_difference() {
        let xs = vec![0.25, 1.0, 2.0, 3.0, 5.0, 10.0, 30.0];
        let ys = vec![0.020, 0.022, 0.025, 0.027, 0.031, 0.037, 0.041];
        let spline = AkimaSpline::new(xs, ys).unwrap();

        let h = 1e-6;
        for x in [0.6, 2.5, 7.0, 20.0] {
            let numerical =
                (spline.interpolate(x + h).unwrap() - spline.interpolate(x - h).unwrap()) / (2.0 * h);
            assert_relative_eq!(spline.derivative(x).unwrap(), numerical, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_needs_five_points() {
        let xs = vec![0.0, 1.0, 2.0, 3.0];
        let ys = vec![0.0, 1.0, 2.0, 3.0];
        assert!(AkimaSpline::new(xs, ys).is_err());
    }

    #[test]
    fn test_range_checks() {
        let xs = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let ys = vec![1.0, 2.0, 2.5, 2.7, 2.8];

        let strict = AkimaSpline::new(xs.clone(), ys.clone()).unwrap();
        assert!(strict.interpolate(5.5).is_err());
        assert!(strict.interpolate(0.5).is_err());

        let flat = AkimaSpline::new(xs, ys)
            .unwrap()
            .with_extrapolation(Extrapolation::FlatRight);
        assert_relative_eq!(flat.interpolate(50.0).unwrap(), 2.8, epsilon = 1e-15);
        assert!(flat.interpolate(0.5).is_err());
    }
}
