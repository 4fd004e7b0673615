//! # RateTree Math
//!
//! Numerical primitives for the RateTree short-rate lattice library.
//!
//! This crate provides:
//!
//! - **Interpolation**: Linear and Akima spline interpolation of 1-D data
//! - **Optimization**: Finite-difference BFGS minimization of scalar objectives
//!
//! ## Design Philosophy
//!
//! - **Black-box primitives**: callers supply data or an objective closure,
//!   nothing here knows about lattices or instruments
//! - **Explicit range handling**: interpolants refuse to extrapolate unless
//!   the caller asks for it

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::unreadable_literal)]

pub mod error;
pub mod interpolation;
pub mod optimization;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{MathError, MathResult};
    pub use crate::interpolation::{AkimaSpline, Interpolant, Interpolator, LinearInterpolator};
    pub use crate::optimization::{bfgs, OptimizationConfig, OptimizationResult};
}

pub use error::{MathError, MathResult};
