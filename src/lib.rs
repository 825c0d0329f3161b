//! # u-runlength
//!
//! Distribution of the run-length statistic for a sequence of independent
//! trials: point mass at an exact run length, quantiles, mean and variance.
//!
//! The cumulative mass is an inclusion–exclusion style sum whose terms
//! combine binomial coefficients with powers raised to the sequence length.
//! Every term is evaluated in log space and exponentiated once; binomial
//! coefficients come from memoized log-factorials.
//!
//! ## Modules
//!
//! - [`special`] — log-gamma, cached log-factorials, binomial coefficients
//! - [`run_length`] — the distribution and its quantile/moment scans
//! - [`random`] — seeded sampling of run lengths
//! - [`summation`] — compensated accumulation of probability mass
//! - [`config`] — limits for the forward scans
//!
//! ## Precision
//!
//! Results are floating-point approximations. Point masses are not
//! clamped, so values marginally below zero or cumulative sums marginally
//! above one are possible; clamp at the call site if needed.
//!
//! ## Example
//!
//! ```
//! use u_runlength::{exceedance_probability, mean, quantile};
//! let p = exceedance_probability(1000, 0.5, 6).unwrap();
//! assert!(p > 0.4 && p < 0.5);
//! assert_eq!(quantile(1000, 0.5, 0.5).unwrap(), 6);
//! assert!((mean(1000, 0.5).unwrap() - 6.3994).abs() < 1e-3);
//! ```

pub mod config;
pub mod error;
pub mod random;
pub mod run_length;
pub mod special;
pub mod summation;

pub use config::SearchLimits;
pub use error::{Result, RunLengthError};
pub use run_length::{exceedance_probability, mean, quantile, LongestRun};
pub use special::binomial_coefficient;
