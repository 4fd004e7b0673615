//! # RateTree Pricing
//!
//! Instruments priced on calibrated short-rate lattices.
//!
//! This crate provides:
//!
//! - **Caps and caplets**: backward-induction payoffs over reset schedules
//! - **Bonds**: fixed, floating, callable and perpetual bonds with OAS,
//!   duration and convexity analytics
//! - **Calibration**: fitting mean reversion and volatility to cap or caplet
//!   premiums
//!
//! ## Example
//!
//! ```rust
//! use ratetree_pricing::prelude::*;
//!
//! let curve = ZeroCurve::new(&[(0.25, 0.025), (2.0, 0.028), (10.0, 0.033)]).unwrap();
//! let calibrator = Calibrator::new(ShortRateModel::HullWhite, &curve)
//!     .step_size(0.25)
//!     .horizon(5.0);
//!
//! let mut tree = calibrator.build_tree(0.1, 0.01).unwrap();
//! let premium = Cap::new(0.03, 0.25, 0.25, 3.0).price(&mut tree).unwrap();
//! assert!(premium > 0.0 && premium < 0.05);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::similar_names)]
#![allow(clippy::float_cmp)]

pub mod bond;
pub mod calibration;
pub mod cap;
pub mod error;

pub use bond::{BondAnalytics, BondBuilder, CallableBond, OasCurve, Payment, Redemption};
pub use calibration::{
    CalibrationResult, CalibrationTarget, Calibrator, CapQuote, CapletQuote, ParameterSearch,
    QuoteFit,
};
pub use cap::{Cap, Caplet};
pub use error::{PricingError, PricingResult};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bond::{BondAnalytics, BondBuilder, CallableBond, Payment};
    pub use crate::calibration::{
        CalibrationTarget, Calibrator, CapQuote, CapletQuote, ParameterSearch,
    };
    pub use crate::cap::{Cap, Caplet};
    pub use crate::error::{PricingError, PricingResult};
    pub use ratetree_lattice::prelude::*;
}
