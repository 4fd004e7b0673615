//! One-dimensional interpolation.
//!
//! # Available Methods
//!
//! - [`LinearInterpolator`]: piecewise-linear, needs 2 points
//! - [`AkimaSpline`]: Akima's shape-preserving cubic, needs 5 points
//! - [`Interpolant`]: picks linear below 5 points and Akima otherwise
//!
//! Every interpolant rejects queries outside `[min_x, max_x]` by default.
//! [`Extrapolation::FlatRight`] holds the last knot value beyond `max_x`;
//! queries below `min_x` always fail.

mod akima;
mod linear;

pub use akima::AkimaSpline;
pub use linear::LinearInterpolator;

use crate::error::{MathError, MathResult};

/// Number of knots from which [`Interpolant::auto`] switches to Akima.
pub const AKIMA_MIN_POINTS: usize = 5;

/// Behaviour outside the knot range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Extrapolation {
    /// Queries outside the knots fail.
    #[default]
    None,
    /// Queries above the last knot return the last value.
    FlatRight,
}

/// Trait for interpolation methods.
pub trait Interpolator: Send + Sync {
    /// Returns the interpolated value at x.
    fn interpolate(&self, x: f64) -> MathResult<f64>;

    /// Returns the first derivative at x.
    fn derivative(&self, x: f64) -> MathResult<f64>;

    /// Returns the minimum x value in the data.
    fn min_x(&self) -> f64;

    /// Returns the maximum x value in the data.
    fn max_x(&self) -> f64;

    /// Checks if x is within the interpolation range.
    fn in_range(&self, x: f64) -> bool {
        x >= self.min_x() && x <= self.max_x()
    }
}

/// Interpolant chosen by the number of knots.
#[derive(Debug, Clone)]
pub enum Interpolant {
    /// Piecewise-linear interpolation.
    Linear(LinearInterpolator),
    /// Akima spline interpolation.
    Akima(AkimaSpline),
}

impl Interpolant {
    /// Builds a linear interpolant below [`AKIMA_MIN_POINTS`] knots, an Akima
    /// spline otherwise.
    pub fn auto(xs: Vec<f64>, ys: Vec<f64>) -> MathResult<Self> {
        if xs.len() < AKIMA_MIN_POINTS {
            LinearInterpolator::new(xs, ys).map(Self::Linear)
        } else {
            AkimaSpline::new(xs, ys).map(Self::Akima)
        }
    }

    /// Sets the extrapolation mode.
    #[must_use]
    pub fn with_extrapolation(self, mode: Extrapolation) -> Self {
        match self {
            Self::Linear(i) => Self::Linear(i.with_extrapolation(mode)),
            Self::Akima(i) => Self::Akima(i.with_extrapolation(mode)),
        }
    }

    fn inner(&self) -> &dyn Interpolator {
        match self {
            Self::Linear(i) => i as &dyn Interpolator,
            Self::Akima(i) => i as &dyn Interpolator,
        }
    }
}

impl Interpolator for Interpolant {
    fn interpolate(&self, x: f64) -> MathResult<f64> {
        self.inner().interpolate(x)
    }

    fn derivative(&self, x: f64) -> MathResult<f64> {
        self.inner().derivative(x)
    }

    fn min_x(&self) -> f64 {
        self.inner().min_x()
    }

    fn max_x(&self) -> f64 {
        self.inner().max_x()
    }
}

/// Checks knot arrays shared by every interpolant.
pub(crate) fn validate_knots(xs: &[f64], ys: &[f64], required: usize) -> MathResult<()> {
    if xs.len() != ys.len() {
        return Err(MathError::LengthMismatch {
            left: xs.len(),
            right: ys.len(),
        });
    }
    if xs.len() < required {
        return Err(MathError::insufficient_data(required, xs.len()));
    }
    if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
        return Err(MathError::invalid_input("knots must be finite"));
    }
    for i in 1..xs.len() {
        if xs[i] <= xs[i - 1] {
            return Err(MathError::invalid_input(
                "x values must be strictly increasing",
            ));
        }
    }
    Ok(())
}

/// Where a query lands relative to the knots.
pub(crate) enum Located {
    /// Inside segment `i`, i.e. `xs[i] <= x <= xs[i+1]`.
    Segment(usize),
    /// Above the last knot with flat extrapolation enabled.
    Flat,
}

/// Finds the segment for `x`, honouring the extrapolation mode.
pub(crate) fn locate(xs: &[f64], x: f64, mode: Extrapolation) -> MathResult<Located> {
    let n = xs.len();
    let (min, max) = (xs[0], xs[n - 1]);

    if x.is_nan() || x < min {
        return Err(MathError::ExtrapolationNotAllowed { x, min, max });
    }
    if x > max {
        return match mode {
            Extrapolation::FlatRight => Ok(Located::Flat),
            Extrapolation::None => Err(MathError::ExtrapolationNotAllowed { x, min, max }),
        };
    }

    let i = match xs.binary_search_by(|probe| probe.total_cmp(&x)) {
        Ok(i) => i.min(n - 2),
        Err(i) => i.saturating_sub(1).min(n - 2),
    };
    Ok(Located::Segment(i))
}
