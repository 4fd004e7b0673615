//! Bond input: coupon legs, call schedules and perpetual terms.

use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use ratetree_pricing::bond::{BondBuilder, Payment};

use crate::error::{check_length, ConfigError, ConfigResult, Validate, ValidationError};
use crate::loader;
use crate::settings::PaymentPeriod;

/// A set of bonds to analyse.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BondPortfolio {
    /// Bonds in file order.
    #[serde(default)]
    pub bonds: Vec<BondData>,
}

impl BondPortfolio {
    /// Loads a JSON file, or TOML when the extension is `.toml`.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let portfolio: Self = loader::load(path.as_ref())?;
        portfolio.validate_or_error()?;
        Ok(portfolio)
    }

    /// Parses JSON text.
    pub fn from_json_str(text: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Bond ids in file order.
    pub fn ids(&self) -> Vec<&str> {
        self.bonds.iter().map(|b| b.id.as_str()).collect()
    }

    /// Looks up a bond by id.
    pub fn bond(&self, id: &str) -> ConfigResult<&BondData> {
        self.bonds
            .iter()
            .find(|b| b.id == id)
            .ok_or_else(|| ConfigError::not_found(format!("bond {id}")))
    }
}

impl Validate for BondPortfolio {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();
        for (i, bond) in self.bonds.iter().enumerate() {
            if !seen.insert(bond.id.as_str()) {
                errors.push(ValidationError::with_rule(
                    format!("bonds[{i}].id"),
                    format!("Duplicate bond {}", bond.id),
                    "unique_id",
                ));
            }
            let parent = format!("bonds[{i}]");
            errors.extend(bond.validate().into_iter().map(|e| e.nested(&parent)));
        }
        errors
    }
}

/// Static data of one bond.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondData {
    /// Identifier, e.g. an ISIN.
    pub id: String,
    /// Short name.
    #[serde(default)]
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Currency; selects the market data used for the lattice.
    pub currency: String,
    /// Issue date.
    pub issue_date: NaiveDate,
    /// Whether the bond never matures.
    #[serde(default)]
    pub perpetual: bool,
    /// Maturity date, absent for perpetuals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maturity: Option<NaiveDate>,
    /// Coupon legs.
    #[serde(default)]
    pub coupons: Vec<CouponData>,
    /// Coupon paid beyond the lattice by perpetuals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perpetual_coupon: Option<PerpetualCouponData>,
    /// Issuer call schedule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_schedule: Option<CallScheduleData>,
}

impl BondData {
    /// Date-based builder for the bond, valued as of `evaluation_date`.
    ///
    /// # Errors
    ///
    /// `Validation` if the bond fails [`Validate`].
    pub fn builder(&self, evaluation_date: NaiveDate) -> ConfigResult<BondBuilder> {
        self.validate_or_error()?;

        let mut builder = BondBuilder::new(evaluation_date);
        builder = match (self.perpetual, self.maturity, self.perpetual_coupon) {
            (true, _, Some(coupon)) => builder.perpetual(coupon.to_payment()),
            (false, Some(maturity), _) => builder.maturity_date(maturity),
            _ => return Err(ConfigError::not_found(format!("redemption terms of {}", self.id))),
        };

        for leg in &self.coupons {
            builder = builder.coupon_leg(
                leg.floating,
                leg.rate,
                leg.period.years(),
                leg.start,
                leg.end,
            );
        }

        if let Some(calls) = &self.call_schedule {
            for (&date, &price) in calls.dates.iter().zip(&calls.prices) {
                builder = builder.call(date, price);
            }
        }
        Ok(builder)
    }
}

impl Validate for BondData {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.id.trim().is_empty() {
            errors.push(ValidationError::new("id", "Bond id cannot be empty"));
        }
        if self.perpetual {
            if self.perpetual_coupon.is_none() {
                errors.push(ValidationError::with_rule(
                    "perpetual_coupon",
                    "Perpetual bonds need a perpetual coupon",
                    "perpetual_terms",
                ));
            }
        } else {
            match self.maturity {
                None => errors.push(ValidationError::with_rule(
                    "maturity",
                    "Maturity is required unless the bond is perpetual",
                    "maturity_terms",
                )),
                Some(maturity) if maturity <= self.issue_date => {
                    errors.push(ValidationError::new(
                        "maturity",
                        "Maturity must be after the issue date",
                    ));
                }
                Some(_) => {}
            }
        }

        for (i, leg) in self.coupons.iter().enumerate() {
            if leg.end < leg.start {
                errors.push(ValidationError::new(
                    format!("coupons[{i}].end"),
                    "Coupon end precedes its start",
                ));
            }
            if !leg.rate.is_finite() {
                errors.push(ValidationError::new(
                    format!("coupons[{i}].rate"),
                    "Coupon rate must be finite",
                ));
            }
        }

        if let Some(calls) = &self.call_schedule {
            check_length(
                &mut errors,
                "call_schedule.prices",
                &calls.prices,
                "call_schedule.dates",
                calls.dates.len(),
            );
        }

        errors
    }
}

/// A fixed or floating coupon leg; `end` is a payment date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CouponData {
    /// Whether the coupon floats over the short rate.
    #[serde(default)]
    pub floating: bool,
    /// Fixed rate, or spread for floating legs.
    pub rate: f64,
    /// Accrual start.
    pub start: NaiveDate,
    /// Last payment date.
    pub end: NaiveDate,
    /// Payment frequency.
    #[serde(default)]
    pub period: PaymentPeriod,
}

/// Coupon of a perpetual beyond the lattice horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerpetualCouponData {
    /// Whether the coupon floats over the short rate.
    #[serde(default)]
    pub floating: bool,
    /// Fixed rate, or spread for floating coupons.
    pub rate: f64,
    /// Payment frequency.
    #[serde(default)]
    pub period: PaymentPeriod,
}

impl PerpetualCouponData {
    /// Lattice payment terms.
    pub fn to_payment(self) -> Payment {
        Payment {
            floating: self.floating,
            rate: self.rate,
            period: self.period.years(),
        }
    }
}

/// Call dates with their prices per unit notional.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CallScheduleData {
    /// Call dates.
    pub dates: Vec<NaiveDate>,
    /// Call prices.
    pub prices: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "bonds": [
            {
                "id": "US67054LAA52",
                "name": "NUMFP 4 7/8 05/15/19",
                "description": "1st Lien - 5NC2",
                "currency": "USD",
                "issue_date": "2014-05-08",
                "maturity": "2019-05-15",
                "coupons": [
                    {"rate": 0.04875, "start": "2014-05-08", "end": "2019-05-15", "period": "S"}
                ],
                "call_schedule": {
                    "dates": ["2016-05-15", "2017-05-15", "2018-05-15"],
                    "prices": [1.03656, 1.01828, 1.0]
                }
            },
            {
                "id": "PERP1",
                "currency": "EUR",
                "issue_date": "2015-01-01",
                "perpetual": true,
                "coupons": [
                    {"rate": 0.06, "start": "2015-01-01", "end": "2025-01-01", "period": "A"}
                ],
                "perpetual_coupon": {"floating": true, "rate": 0.04, "period": "Q"}
            }
        ]
    }"#;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_sample() {
        let portfolio = BondPortfolio::from_json_str(SAMPLE).unwrap();
        assert!(portfolio.is_valid());
        assert_eq!(portfolio.ids(), vec!["US67054LAA52", "PERP1"]);

        let bond = portfolio.bond("US67054LAA52").unwrap();
        assert!(!bond.perpetual);
        assert!(!bond.coupons[0].floating);
        assert_eq!(bond.coupons[0].period, PaymentPeriod::SemiAnnual);
        assert_eq!(bond.call_schedule.as_ref().unwrap().prices.len(), 3);

        let perp = portfolio.bond("PERP1").unwrap();
        let coupon = perp.perpetual_coupon.unwrap().to_payment();
        assert!(coupon.floating);
        assert_eq!(coupon.period, 0.25);

        assert!(portfolio.bond("MISSING").is_err());
    }

    #[test]
    fn test_validation() {
        let mut portfolio = BondPortfolio::from_json_str(SAMPLE).unwrap();
        portfolio.bonds[0].maturity = None;
        portfolio.bonds[0]
            .call_schedule
            .as_mut()
            .unwrap()
            .prices
            .pop();
        portfolio.bonds[1].perpetual_coupon = None;
        portfolio.bonds[1].id = "US67054LAA52".into();

        let fields: Vec<String> = portfolio.validate().into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"bonds[0].maturity".to_string()));
        assert!(fields.contains(&"bonds[0].call_schedule.prices".to_string()));
        assert!(fields.contains(&"bonds[1].id".to_string()));
        assert!(fields.contains(&"bonds[1].perpetual_coupon".to_string()));
    }

    #[test]
    fn test_builder_rejects_invalid_bond() {
        let mut portfolio = BondPortfolio::from_json_str(SAMPLE).unwrap();
        portfolio.bonds[0].maturity = None;
        assert!(matches!(
            portfolio.bonds[0].builder(date(2014, 5, 15)),
            Err(ConfigError::Validation { .. })
        ));
    }
}
