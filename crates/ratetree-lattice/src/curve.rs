//! Input zero-coupon curve.

use ratetree_math::interpolation::{Extrapolation, Interpolant, Interpolator};

use crate::error::{LatticeError, LatticeResult};

/// Continuously compounded zero curve used to calibrate a lattice.
///
/// Zero rates are interpolated linearly when fewer than five tenors are
/// given and with an Akima spline otherwise. Beyond the last tenor the rate
/// is held flat; below the first tenor the curve refuses to answer.
///
/// # Example
///
/// ```rust
/// use ratetree_lattice::ZeroCurve;
///
/// let curve = ZeroCurve::new(&[(0.25, 0.030), (1.0, 0.032), (5.0, 0.035)]).unwrap();
///
/// let df = curve.discount_factor(1.0).unwrap();
/// assert!((df - (-0.032f64).exp()).abs() < 1e-12);
///
/// // Flat beyond the last tenor
/// assert!((curve.zero_rate(30.0).unwrap() - 0.035).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct ZeroCurve {
    tenors: Vec<f64>,
    rates: Vec<f64>,
    interpolant: Interpolant,
}

impl ZeroCurve {
    /// Smallest number of points a curve accepts.
    pub const MIN_POINTS: usize = 3;

    /// Builds a curve from `(tenor, zero_rate)` pairs.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for fewer than 3 points, tenors that are
    /// not positive and strictly increasing, or non-finite rates.
    pub fn new(points: &[(f64, f64)]) -> LatticeResult<Self> {
        let (tenors, rates) = points.iter().copied().unzip();
        Self::from_arrays(tenors, rates)
    }

    /// Builds a curve from parallel tenor and rate arrays.
    pub fn from_arrays(tenors: Vec<f64>, rates: Vec<f64>) -> LatticeResult<Self> {
        if tenors.len() != rates.len() {
            return Err(LatticeError::invalid_parameter(format!(
                "{} tenors but {} zero rates",
                tenors.len(),
                rates.len()
            )));
        }
        if tenors.len() < Self::MIN_POINTS {
            return Err(LatticeError::invalid_parameter(format!(
                "zero curve needs at least {} points, got {}",
                Self::MIN_POINTS,
                tenors.len()
            )));
        }
        if tenors.iter().any(|t| !t.is_finite() || *t <= 0.0) {
            return Err(LatticeError::invalid_parameter(
                "curve tenors must be positive",
            ));
        }
        if tenors.windows(2).any(|w| w[1] <= w[0]) {
            return Err(LatticeError::invalid_parameter(
                "curve tenors must be strictly increasing",
            ));
        }
        if rates.iter().any(|r| !r.is_finite()) {
            return Err(LatticeError::invalid_parameter("zero rates must be finite"));
        }

        let interpolant = Interpolant::auto(tenors.clone(), rates.clone())?
            .with_extrapolation(Extrapolation::FlatRight);

        Ok(Self {
            tenors,
            rates,
            interpolant,
        })
    }

    /// A flat curve from one day out to thirty years.
    pub fn flat(rate: f64) -> LatticeResult<Self> {
        Self::from_arrays(vec![1.0 / 365.0, 1.0, 30.0], vec![rate; 3])
    }

    /// Curve tenors in years.
    pub fn tenors(&self) -> &[f64] {
        &self.tenors
    }

    /// Zero rates at the curve tenors.
    pub fn zero_rates(&self) -> &[f64] {
        &self.rates
    }

    /// Number of curve points.
    pub fn len(&self) -> usize {
        self.tenors.len()
    }

    /// Always false: a curve has at least [`Self::MIN_POINTS`] points.
    pub fn is_empty(&self) -> bool {
        self.tenors.is_empty()
    }

    /// Interpolated zero rate at `t`.
    ///
    /// Fails for `t` below the first tenor.
    pub fn zero_rate(&self, t: f64) -> LatticeResult<f64> {
        if t.is_nan() || t < self.tenors[0] {
            return Err(LatticeError::invalid_parameter(format!(
                "time {t} is before the first curve tenor {}",
                self.tenors[0]
            )));
        }
        Ok(self.interpolant.interpolate(t)?)
    }

    /// Discount factor `exp(-z(t)·t)`, equal to 1 at `t = 0`.
    pub fn discount_factor(&self, t: f64) -> LatticeResult<f64> {
        if t == 0.0 {
            return Ok(1.0);
        }
        if t < 0.0 {
            return Err(LatticeError::invalid_parameter(format!(
                "negative time {t}"
            )));
        }
        Ok((-self.zero_rate(t)? * t).exp())
    }

    /// Simple-compounded forward rate over `[t1, t2]`, annualized.
    pub fn forward_rate(&self, t1: f64, t2: f64) -> LatticeResult<f64> {
        if t2 <= t1 {
            return Err(LatticeError::invalid_parameter(format!(
                "forward period [{t1}, {t2}] is empty"
            )));
        }
        let p1 = self.discount_factor(t1)?;
        let p2 = self.discount_factor(t2)?;
        Ok((p1 / p2 - 1.0) / (t2 - t1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rejects_two_points() {
        let err = ZeroCurve::new(&[(1.0, 0.03), (2.0, 0.03)]).unwrap_err();
        assert!(matches!(err, LatticeError::InvalidParameter { .. }));
    }

    #[test]
    fn test_rejects_unordered_tenors() {
        assert!(ZeroCurve::new(&[(1.0, 0.03), (1.0, 0.031), (2.0, 0.032)]).is_err());
        assert!(ZeroCurve::new(&[(2.0, 0.03), (1.0, 0.031), (3.0, 0.032)]).is_err());
        assert!(ZeroCurve::new(&[(0.0, 0.03), (1.0, 0.031), (3.0, 0.032)]).is_err());
    }

    #[test]
    fn test_rejects_mismatched_arrays() {
        let err = ZeroCurve::from_arrays(vec![1.0, 2.0, 3.0], vec![0.01, 0.02]).unwrap_err();
        assert!(matches!(err, LatticeError::InvalidParameter { .. }));
    }

    #[test]
    fn test_linear_below_five_points() {
        let curve = ZeroCurve::new(&[(1.0, 0.02), (2.0, 0.03), (4.0, 0.04)]).unwrap();
        assert_relative_eq!(curve.zero_rate(1.5).unwrap(), 0.025, epsilon = 1e-14);
        assert_relative_eq!(curve.zero_rate(3.0).unwrap(), 0.035, epsilon = 1e-14);
    }

    #[test]
    fn test_fails_below_first_tenor() {
        let curve = ZeroCurve::new(&[(1.0, 0.02), (2.0, 0.03), (4.0, 0.04)]).unwrap();
        assert!(matches!(
            curve.zero_rate(0.5),
            Err(LatticeError::InvalidParameter { .. })
        ));
        assert!(curve.discount_factor(0.5).is_err());
        assert_relative_eq!(curve.discount_factor(0.0).unwrap(), 1.0);
    }

    #[test]
    fn test_flat_beyond_last_tenor() {
        let points = [(0.5, 0.01), (1.0, 0.015), (2.0, 0.02), (5.0, 0.025), (10.0, 0.03)];
        let curve = ZeroCurve::new(&points).unwrap();
        assert_relative_eq!(curve.zero_rate(40.0).unwrap(), 0.03, epsilon = 1e-15);
        assert_relative_eq!(
            curve.discount_factor(40.0).unwrap(),
            (-0.03f64 * 40.0).exp(),
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_forward_rate_on_flat_curve() {
        let curve = ZeroCurve::flat(0.03).unwrap();
        let fwd = curve.forward_rate(2.0, 2.5).unwrap();
        assert_relative_eq!(fwd, ((0.03f64 * 0.5).exp() - 1.0) / 0.5, epsilon = 1e-12);
        assert!(curve.forward_rate(2.0, 2.0).is_err());
    }
}
