//! Linear interpolation.

use crate::error::MathResult;
use crate::interpolation::{locate, validate_knots, Extrapolation, Interpolator, Located};

/// Linear interpolation between data points.
///
/// # Example
///
/// ```rust
/// use ratetree_math::interpolation::{Interpolator, LinearInterpolator};
///
/// let xs = vec![0.0, 1.0, 2.0, 3.0];
/// let ys = vec![0.0, 1.0, 4.0, 9.0];
///
/// let interp = LinearInterpolator::new(xs, ys).unwrap();
/// let y = interp.interpolate(1.5).unwrap();
/// assert!((y - 2.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct LinearInterpolator {
    xs: Vec<f64>,
    ys: Vec<f64>,
    extrapolation: Extrapolation,
}

impl LinearInterpolator {
    /// Creates a new linear interpolator.
    ///
    /// # Errors
    ///
    /// Returns an error if there are fewer than 2 points, if lengths differ,
    /// or if `xs` is not strictly increasing.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> MathResult<Self> {
        validate_knots(&xs, &ys, 2)?;
        Ok(Self {
            xs,
            ys,
            extrapolation: Extrapolation::None,
        })
    }

    /// Sets the extrapolation mode.
    #[must_use]
    pub fn with_extrapolation(mut self, mode: Extrapolation) -> Self {
        self.extrapolation = mode;
        self
    }
}

impl Interpolator for LinearInterpolator {
    fn interpolate(&self, x: f64) -> MathResult<f64> {
        match locate(&self.xs, x, self.extrapolation)? {
            Located::Flat => Ok(self.ys[self.ys.len() - 1]),
            Located::Segment(i) => {
                let (x0, x1) = (self.xs[i], self.xs[i + 1]);
                let (y0, y1) = (self.ys[i], self.ys[i + 1]);
                let t = (x - x0) / (x1 - x0);
                Ok(y0 + t * (y1 - y0))
            }
        }
    }

    fn derivative(&self, x: f64) -> MathResult<f64> {
        match locate(&self.xs, x, self.extrapolation)? {
            Located::Flat => Ok(0.0),
            Located::Segment(i) => {
                Ok((self.ys[i + 1] - self.ys[i]) / (self.xs[i + 1] - self.xs[i]))
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
