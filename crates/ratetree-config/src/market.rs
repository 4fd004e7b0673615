//! Market data input: zero curves and cap/caplet premiums per currency.

use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use ratetree_lattice::ZeroCurve;
use ratetree_pricing::calibration::{CalibrationTarget, CapQuote, CapletQuote};

use crate::error::{check_length, ConfigError, ConfigResult, Validate, ValidationError};
use crate::loader;
use crate::settings::PaymentPeriod;

/// Which quotes a calibration fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// Cap premiums.
    #[default]
    Cap,
    /// Caplet premiums.
    Caplet,
}

/// Market data for every currency, as of one evaluation date.
///
/// # Example
///
/// ```rust
/// use ratetree_config::{MarketData, TargetKind, Validate};
///
/// let market = MarketData::from_json_str(r#"{
///     "evaluation_date": "2014-05-15",
///     "currencies": [{
///         "id": "USD",
///         "yield_curve": {
///             "tenors": [0.125, 1, 2, 5, 10],
///             "zero_rates": [0.0020, 0.0025, 0.0051, 0.0168, 0.0272]
///         },
///         "cap": {
///             "forward_start": 0.25,
///             "payment_period": "Q",
///             "tenors": [3, 5],
///             "strikes": [0.03, 0.03],
///             "premiums": [0.00244, 0.0165]
///         }
///     }]
/// }"#).unwrap();
///
/// assert!(market.is_valid());
/// let usd = market.currency("USD").unwrap();
/// assert_eq!(usd.target(TargetKind::Cap).unwrap().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    /// Valuation date.
    pub evaluation_date: NaiveDate,
    /// Per-currency data.
    #[serde(default)]
    pub currencies: Vec<CurrencyMarket>,
}

impl MarketData {
    /// Loads a JSON file, or TOML when the extension is `.toml`.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let market: Self = loader::load(path.as_ref())?;
        market.validate_or_error()?;
        Ok(market)
    }

    /// Parses JSON text.
    pub fn from_json_str(text: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parses TOML text.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Currency ids in file order.
    pub fn currency_ids(&self) -> Vec<&str> {
        self.currencies.iter().map(|c| c.id.as_str()).collect()
    }

    /// Data for one currency.
    pub fn currency(&self, id: &str) -> ConfigResult<&CurrencyMarket> {
        self.currencies
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| ConfigError::not_found(format!("currency {id}")))
    }
}

impl Validate for MarketData {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.currencies.is_empty() {
            errors.push(ValidationError::new(
                "currencies",
                "At least one currency is required",
            ));
        }

        let mut seen = HashSet::new();
        for (i, currency) in self.currencies.iter().enumerate() {
            if !seen.insert(currency.id.as_str()) {
                errors.push(ValidationError::with_rule(
                    format!("currencies[{i}].id"),
                    format!("Duplicate currency {}", currency.id),
                    "unique_id",
                ));
            }
            let parent = format!("currencies[{i}]");
            errors.extend(currency.validate().into_iter().map(|e| e.nested(&parent)));
        }

        errors
    }
}

/// Curve and option quotes for one currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyMarket {
    /// Currency id, e.g. `USD`.
    pub id: String,
    /// Zero curve.
    pub yield_curve: YieldCurveData,
    /// Cap premiums.
    pub cap: CapData,
    /// Optional caplet premiums.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caplet: Option<CapletData>,
}

impl CurrencyMarket {
    /// Interpolated zero curve.
    pub fn curve(&self) -> ConfigResult<ZeroCurve> {
        self.yield_curve.to_curve()
    }

    /// Quotes to calibrate against.
    pub fn target(&self, kind: TargetKind) -> ConfigResult<CalibrationTarget> {
        match kind {
            TargetKind::Cap => Ok(self.cap.to_target()),
            TargetKind::Caplet => self
                .caplet
                .as_ref()
                .map(CapletData::to_target)
                .ok_or_else(|| ConfigError::not_found(format!("caplet quotes for {}", self.id))),
        }
    }
}

impl Validate for CurrencyMarket {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.id.trim().is_empty() {
            errors.push(ValidationError::new("id", "Currency id cannot be empty"));
        }
        errors.extend(
            self.yield_curve
                .validate()
                .into_iter()
                .map(|e| e.nested("yield_curve")),
        );
        errors.extend(self.cap.validate().into_iter().map(|e| e.nested("cap")));
        if let Some(caplet) = &self.caplet {
            errors.extend(caplet.validate().into_iter().map(|e| e.nested("caplet")));
        }
        errors
    }
}

/// Zero rates by tenor, continuously compounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldCurveData {
    /// Tenors in years.
    pub tenors: Vec<f64>,
    /// Zero rates.
    pub zero_rates: Vec<f64>,
}

impl YieldCurveData {
    /// Builds the interpolated curve.
    pub fn to_curve(&self) -> ConfigResult<ZeroCurve> {
        Ok(ZeroCurve::from_arrays(
            self.tenors.clone(),
            self.zero_rates.clone(),
        )?)
    }
}

impl Validate for YieldCurveData {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_length(
            &mut errors,
            "zero_rates",
            &self.zero_rates,
            "tenors",
            self.tenors.len(),
        );
        if self.tenors.len() < ZeroCurve::MIN_POINTS {
            errors.push(ValidationError::with_rule(
                "tenors",
                format!("At least {} points are required", ZeroCurve::MIN_POINTS),
                "min_points",
            ));
        }
        if self.tenors.windows(2).any(|w| w[1] <= w[0]) {
            errors.push(ValidationError::with_rule(
                "tenors",
                "Tenors must be strictly increasing",
                "increasing",
            ));
        }
        errors
    }
}

/// Cap premiums for caps resetting every `payment_period` from
/// `forward_start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapData {
    /// First reset time in years.
    pub forward_start: f64,
    /// Reset frequency.
    #[serde(default)]
    pub payment_period: PaymentPeriod,
    /// Cap maturities in years.
    pub tenors: Vec<f64>,
    /// Strikes.
    pub strikes: Vec<f64>,
    /// Market premiums.
    pub premiums: Vec<f64>,
}

impl CapData {
    /// Cap calibration target.
    pub fn to_target(&self) -> CalibrationTarget {
        let quotes = self
            .tenors
            .iter()
            .zip(&self.strikes)
            .zip(&self.premiums)
            .map(|((&tenor, &strike), &premium)| CapQuote {
                tenor,
                strike,
                premium,
            })
            .collect();
        CalibrationTarget::Caps {
            start: self.forward_start,
            period: self.payment_period.years(),
            quotes,
        }
    }
}

impl Validate for CapData {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let n = self.tenors.len();
        check_length(&mut errors, "strikes", &self.strikes, "tenors", n);
        check_length(&mut errors, "premiums", &self.premiums, "tenors", n);
        if n == 0 {
            errors.push(ValidationError::new("tenors", "No cap quotes"));
        }
        if !self.forward_start.is_finite() || self.forward_start < 0.0 {
            errors.push(ValidationError::new(
                "forward_start",
                "Forward start cannot be negative",
            ));
        }
        errors
    }
}

/// Single-period caplet premiums.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapletData {
    /// Caplet period.
    #[serde(default)]
    pub payment_period: PaymentPeriod,
    /// Reset times in years.
    pub expiries: Vec<f64>,
    /// At-the-money flags; ATM caplets ignore their strike.
    #[serde(default)]
    pub atm: Vec<bool>,
    /// Strikes.
    pub strikes: Vec<f64>,
    /// Market premiums.
    pub premiums: Vec<f64>,
}

impl CapletData {
    /// Caplet calibration target. Missing ATM flags read as `false`.
    pub fn to_target(&self) -> CalibrationTarget {
        let quotes = self
            .expiries
            .iter()
            .zip(&self.strikes)
            .zip(&self.premiums)
            .enumerate()
            .map(|(i, ((&expiry, &strike), &premium))| CapletQuote {
                expiry,
                strike,
                premium,
                atm: self.atm.get(i).copied().unwrap_or(false),
            })
            .collect();
        CalibrationTarget::Caplets {
            period: self.payment_period.years(),
            quotes,
        }
    }
}

impl Validate for CapletData {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let n = self.expiries.len();
        check_length(&mut errors, "strikes", &self.strikes, "expiries", n);
        check_length(&mut errors, "premiums", &self.premiums, "expiries", n);
        if !self.atm.is_empty() {
            check_length(&mut errors, "atm", &self.atm, "expiries", n);
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn usd() -> CurrencyMarket {
        CurrencyMarket {
            id: "USD".into(),
            yield_curve: YieldCurveData {
                tenors: vec![0.125, 1.0, 2.0, 5.0, 10.0],
                zero_rates: vec![0.002, 0.0025, 0.0051, 0.0168, 0.0272],
            },
            cap: CapData {
                forward_start: 0.25,
                payment_period: PaymentPeriod::Quarterly,
                tenors: vec![3.0, 5.0],
                strikes: vec![0.03, 0.03],
                premiums: vec![0.00244, 0.0165],
            },
            caplet: Some(CapletData {
                payment_period: PaymentPeriod::SemiAnnual,
                expiries: vec![1.0, 2.0],
                atm: vec![true, false],
                strikes: vec![0.0, 0.02],
                premiums: vec![0.001, 0.002],
            }),
        }
    }

    fn market(currencies: Vec<CurrencyMarket>) -> MarketData {
        MarketData {
            evaluation_date: NaiveDate::from_ymd_opt(2014, 5, 15).unwrap(),
            currencies,
        }
    }

    #[test]
    fn test_valid_market() {
        let market = market(vec![usd()]);
        assert!(market.is_valid());
        assert_eq!(market.currency_ids(), vec!["USD"]);
        assert!(matches!(market.currency("EUR"), Err(ConfigError::NotFound { .. })));
    }

    #[test]
    fn test_targets() {
        let usd = usd();
        match usd.target(TargetKind::Cap).unwrap() {
            CalibrationTarget::Caps { start, period, quotes } => {
                assert_relative_eq!(start, 0.25);
                assert_relative_eq!(period, 0.25);
                assert_eq!(quotes[1].tenor, 5.0);
                assert_eq!(quotes[1].premium, 0.0165);
            }
            CalibrationTarget::Caplets { .. } => panic!("expected caps"),
        }
        match usd.target(TargetKind::Caplet).unwrap() {
            CalibrationTarget::Caplets { period, quotes } => {
                assert_relative_eq!(period, 0.5);
                assert!(quotes[0].atm);
                assert!(!quotes[1].atm);
            }
            CalibrationTarget::Caps { .. } => panic!("expected caplets"),
        }

        let no_caplets = CurrencyMarket {
            caplet: None,
            ..usd
        };
        assert!(no_caplets.target(TargetKind::Caplet).is_err());
    }

    #[test]
    fn test_every_error_reported() {
        let mut broken = usd();
        broken.yield_curve.zero_rates.pop();
        broken.cap.premiums.push(0.1);
        let mut duplicate = usd();
        duplicate.yield_curve.tenors = vec![1.0, 1.0];
        duplicate.yield_curve.zero_rates = vec![0.01, 0.01];

        let errors = market(vec![broken, duplicate]).validate();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();

        assert!(fields.contains(&"currencies[0].yield_curve.zero_rates"));
        assert!(fields.contains(&"currencies[0].cap.premiums"));
        assert!(fields.contains(&"currencies[1].id"));
        assert!(fields.contains(&"currencies[1].yield_curve.tenors"));
    }

    #[test]
    fn test_curve_conversion() {
        let curve = usd().curve().unwrap();
        assert_eq!(curve.len(), 5);
        assert_relative_eq!(curve.zero_rate(2.0).unwrap(), 0.0051, epsilon = 1e-12);
    }

    #[test]
    fn test_toml() {
        let text = r#"
            evaluation_date = "2014-05-15"

            [[currencies]]
            id = "EUR"

            [currencies.yield_curve]
            tenors = [0.25, 1.0, 5.0]
            zero_rates = [0.001, 0.002, 0.01]

            [currencies.cap]
            forward_start = 0.5
            payment_period = "S"
            tenors = [2.0]
            strikes = [0.01]
            premiums = [0.003]
        "#;
        let market = MarketData::from_toml_str(text).unwrap();
        assert!(market.is_valid());
        let eur = market.currency("EUR").unwrap();
        assert_eq!(eur.cap.payment_period, PaymentPeriod::SemiAnnual);
        assert!(eur.caplet.is_none());
    }
}
