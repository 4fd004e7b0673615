//! # RateTree Lattice
//!
//! One-factor short-rate lattices for the RateTree library.
//!
//! This crate provides:
//!
//! - **Zero curve**: interpolated input curve with discount factors and forwards
//! - **Recombinant tree**: arena of trinomial nodes addressed by `(step, offset)`
//! - **Short-rate tree**: Hull-White or Black-Karasinski lattice fitted to the
//!   curve by forward induction
//! - **Traversal**: visitor protocol for backward-induction pricing
//!
//! ## Example
//!
//! ```rust
//! use ratetree_lattice::prelude::*;
//!
//! let curve = ZeroCurve::new(&[(0.125, 0.030), (1.0, 0.031), (10.0, 0.035)]).unwrap();
//!
//! let mut tree = ShortRateTreeBuilder::new(ShortRateModel::HullWhite)
//!     .mean_reversion(0.1)
//!     .volatility(0.01)
//!     .step_size(0.125)
//!     .horizon(5.0)
//!     .curve(&curve)
//!     .build()
//!     .unwrap();
//!
//! // Price a 2-year zero-coupon bond by backward induction
//! let dt = tree.dt();
//! let maturity = tree.nearest_time_step(2.0);
//! let mut zcb = |view: NodeView<'_>| {
//!     if view.time_step() == maturity {
//!         Scratch::value(1.0)
//!     } else {
//!         Scratch::value((-view.rate() * dt).exp() * view.expected(|s| s.value1))
//!     }
//! };
//! let price = tree.backward_induction(maturity, &mut zcb).unwrap().value1;
//!
//! assert!((price - curve.discount_factor(2.0).unwrap()).abs() < 1e-10);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::similar_names)]
#![allow(clippy::float_cmp)]
#![allow(clippy::unreadable_literal)]

pub mod builder;
pub mod curve;
pub mod drift;
pub mod error;
pub mod model;
pub mod node;
pub mod short_rate;
pub mod traversal;
pub mod tree;

pub use builder::{saturation_bound, ShortRateTreeBuilder};
pub use curve::ZeroCurve;
pub use drift::DriftFit;
pub use error::{LatticeError, LatticeResult};
pub use model::ShortRateModel;
pub use node::{Branch, Children, LatticeNode, Probabilities, Scratch};
pub use short_rate::ShortRateTree;
pub use traversal::{NodeView, NodeVisitor};
pub use tree::RecombinantTree;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::builder::ShortRateTreeBuilder;
    pub use crate::curve::ZeroCurve;
    pub use crate::error::{LatticeError, LatticeResult};
    pub use crate::model::ShortRateModel;
    pub use crate::node::{Branch, LatticeNode, Scratch};
    pub use crate::short_rate::ShortRateTree;
    pub use crate::traversal::{NodeView, NodeVisitor};
}
