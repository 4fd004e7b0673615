//! One-factor short-rate model selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LatticeError;

/// Short-rate dynamics carried by the lattice.
///
/// Both models share the same trinomial geometry; they differ in how the
/// state variable `x = drift + j·dR` maps to a short rate.
///
/// - **Hull-White**: `r = x`, normal rates that may go negative
/// - **Black-Karasinski**: `r = exp(x)`, lognormal rates that stay positive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShortRateModel {
    /// Hull-White (extended Vasicek).
    #[default]
    #[serde(alias = "hw")]
    HullWhite,
    /// Black-Karasinski (lognormal).
    #[serde(alias = "bk")]
    BlackKarasinski,
}

impl ShortRateModel {
    /// Maps the state variable to the realized short rate.
    #[inline]
    pub fn short_rate(self, x: f64) -> f64 {
        match self {
            Self::HullWhite => x,
            Self::BlackKarasinski => x.exp(),
        }
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::HullWhite => "Hull-White",
            Self::BlackKarasinski => "Black-Karasinski",
        }
    }
}

impl fmt::Display for ShortRateModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShortRateModel {
    type Err = LatticeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hw" | "hull-white" | "hullwhite" => Ok(Self::HullWhite),
            "bk" | "black-karasinski" | "blackkarasinski" => Ok(Self::BlackKarasinski),
            other => Err(LatticeError::invalid_parameter(format!(
                "unknown short-rate model '{other}'"
            ))),
        }
    }
}
