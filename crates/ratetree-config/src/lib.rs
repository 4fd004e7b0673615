//! # RateTree Configuration
//!
//! Input schemas for the RateTree library: market data used to calibrate
//! lattices and the bonds priced on them.
//!
//! # Features
//!
//! - **Market data**: zero curves and cap/caplet premiums per currency
//! - **Bonds**: coupon legs, call schedules and perpetual terms keyed by id
//! - **Tree settings**: model, step size and horizon with defaults
//! - **Validation**: every field error reported at once, before any build
//!
//! Files are JSON, or TOML when the extension is `.toml`. Dates use
//! `YYYY-MM-DD` and payment frequencies the codes `A`, `S`, `Q`, `M`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod bond;
mod error;
mod loader;
mod market;
mod settings;

pub use bond::{BondData, BondPortfolio, CallScheduleData, CouponData, PerpetualCouponData};
pub use error::{ConfigError, ConfigResult, Validate, ValidationError};
pub use loader::{load, FileFormat};
pub use market::{CapData, CapletData, CurrencyMarket, MarketData, TargetKind, YieldCurveData};
pub use settings::{PaymentPeriod, TreeSettings};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bond::{BondData, BondPortfolio};
    pub use crate::error::{ConfigError, ConfigResult, Validate};
    pub use crate::market::{CurrencyMarket, MarketData, TargetKind};
    pub use crate::settings::{PaymentPeriod, TreeSettings};
}
