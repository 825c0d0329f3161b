//! Distribution of the run-length statistic.
//!
//! For a sequence of `l` trials with event probability `g`, the engine
//! works on the doubled length `l' = 2l` and halved probability
//! `g' = g/2`. The cumulative mass at run length `x` is
//!
//! ```text
//! S(x) = Σ_{k=0}^{x} C(x,k) · 2^x · g'^k · (½−g')^(x−k) · (1 − g'^k (½−g')^(x−k))^{l'}
//! ```
//!
//! Each term is assembled in log space and exponentiated once, so the
//! power `l'` never underflows on its own. The point mass at `x` is the
//! difference of two adjacent cumulative sums, `S(x) − S(x−1)`.
//!
//! # Interpretation
//! `S(x)` is the probability that a random word of length `x` over a
//! four-letter alphabet (two letters at `g'`, two at `½−g'`) occurs in
//! neither strand of a random sequence of length `l`.
//!
//! # Examples
//! ```
//! use u_runlength::run_length::LongestRun;
//! let dist = LongestRun::new(10, 0.5).unwrap();
//! assert_eq!(dist.quantile(0.9).unwrap(), 4);
//! assert!((dist.mean().unwrap() - 3.0923).abs() < 1e-3);
//! ```

use serde::{Deserialize, Serialize};

use crate::config::SearchLimits;
use crate::error::{Result, RunLengthError};
use crate::special::{ln_binomial, ln_one_minus_exp, ln_pow};
use crate::summation::NeumaierSum;

/// One term of the cumulative sum, in rescaled parameters.
///
/// Evaluates
/// `exp(x·ln 2 + ln C(x,k) + k·ln g + (x−k)·ln(½−g) + l·ln(1 − g^k (½−g)^(x−k)))`
/// where `l` is the doubled sequence length and `g` the halved event
/// probability. The last summand goes through `ln(1 − eᵃ)` so the `l`-th
/// power is never formed directly.
///
/// # Errors
/// Returns [`RunLengthError::InvalidArgument`] if `k > x` or `x` does not
/// fit in an `i64`.
pub fn run_length_term(
    doubled_length: f64,
    halved_probability: f64,
    x: u64,
    k: u64,
) -> Result<f64> {
    if k > x {
        return Err(RunLengthError::InvalidArgument(format!(
            "boundary count k = {k} exceeds run length x = {x}"
        )));
    }
    let xi = i64::try_from(x).map_err(|_| {
        RunLengthError::InvalidArgument(format!("run length {x} out of range"))
    })?;
    let ki = k as i64;

    let g = halved_probability;
    let log_word = ln_pow(g, k) + ln_pow(0.5 - g, x - k);
    let exponent = x as f64 * std::f64::consts::LN_2
        + ln_binomial(xi, ki)?
        + log_word
        + doubled_length * ln_one_minus_exp(log_word);
    Ok(exponent.exp())
}

/// Run-length distribution for a sequence length and event probability.
///
/// # Parameters
/// - `sequence_length ≥ 1`, doubled internally.
/// - `event_probability ∈ (0, 1)`, halved internally so the per-letter
///   probability stays inside `(0, ½)`.
///
/// The scans behind [`quantile`](Self::quantile), [`mean`](Self::mean) and
/// [`variance`](Self::variance) are bounded by [`SearchLimits`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLongestRun")]
pub struct LongestRun {
    sequence_length: u64,
    event_probability: f64,
    limits: SearchLimits,
}

/// Unvalidated wire form; deserialization goes through [`LongestRun::new`].
#[derive(Deserialize)]
struct RawLongestRun {
    sequence_length: u64,
    event_probability: f64,
    #[serde(default)]
    limits: SearchLimits,
}

impl TryFrom<RawLongestRun> for LongestRun {
    type Error = RunLengthError;

    fn try_from(raw: RawLongestRun) -> Result<Self> {
        Self::new(raw.sequence_length, raw.event_probability)?.with_limits(raw.limits)
    }
}

impl LongestRun {
    /// Creates the distribution with default [`SearchLimits`].
    ///
    /// # Errors
    /// Returns [`RunLengthError::InvalidArgument`] if `sequence_length` is
    /// zero or too large to double, or if `event_probability` is not a
    /// finite value strictly inside `(0, 1)`.
    pub fn new(sequence_length: u64, event_probability: f64) -> Result<Self> {
        if sequence_length == 0 || sequence_length.checked_mul(2).is_none() {
            return Err(RunLengthError::InvalidArgument(format!(
                "sequence length must lie in [1, {}], got {sequence_length}",
                u64::MAX / 2
            )));
        }
        if !event_probability.is_finite() || event_probability <= 0.0 || event_probability >= 1.0
        {
            return Err(RunLengthError::InvalidArgument(format!(
                "event probability must lie in (0, 1), got {event_probability}"
            )));
        }
        Ok(Self {
            sequence_length,
            event_probability,
            limits: SearchLimits::default(),
        })
    }

    /// Replaces the scan limits.
    ///
    /// # Errors
    /// Propagates [`SearchLimits::validate`].
    pub fn with_limits(mut self, limits: SearchLimits) -> Result<Self> {
        limits.validate()?;
        self.limits = limits;
        Ok(self)
    }

    pub fn sequence_length(&self) -> u64 {
        self.sequence_length
    }

    pub fn event_probability(&self) -> f64 {
        self.event_probability
    }

    pub fn limits(&self) -> &SearchLimits {
        &self.limits
    }

    /// Cumulative probability P(X ≤ x).
    ///
    /// `cdf(0)` is zero.
    ///
    /// # Errors
    /// Returns [`RunLengthError::InvalidArgument`] if `x` exceeds `i64::MAX`.
    pub fn cdf(&self, x: u64) -> Result<f64> {
        let doubled = 2.0 * self.sequence_length as f64;
        let halved = self.event_probability / 2.0;
        let mut acc = NeumaierSum::new();
        for k in 0..=x {
            acc.add(run_length_term(doubled, halved, x, k)?);
        }
        Ok(acc.total())
    }

    /// Point mass P(X = x) = S(x) − S(x−1).
    ///
    /// Not clamped: floating-point error can push it marginally below zero.
    ///
    /// # Errors
    /// Same as [`cdf`](Self::cdf).
    pub fn pmf(&self, x: u64) -> Result<f64> {
        let previous = match x {
            0 => 0.0,
            _ => self.cdf(x - 1)?,
        };
        Ok(self.cdf(x)? - previous)
    }

    /// Smallest run length `x ≥ 1` whose accumulated mass exceeds `p`.
    ///
    /// Walks `x = 1, 2, …` adding [`pmf`](Self::pmf) until the running total
    /// is strictly greater than `p`.
    ///
    /// # Errors
    /// - [`RunLengthError::InvalidArgument`] if `p` is not in `(0, 1)`.
    /// - [`RunLengthError::Unreachable`] if the scan passes
    ///   `limits.max_run_length` first.
    pub fn quantile(&self, p: f64) -> Result<u64> {
        if !p.is_finite() || p <= 0.0 || p >= 1.0 {
            return Err(RunLengthError::InvalidArgument(format!(
                "target cumulative probability must lie in (0, 1), got {p}"
            )));
        }
        let max_run_length = self.limits.max_run_length;

        let mut x = 1;
        let mut cumulative = NeumaierSum::new();
        cumulative.add(self.pmf(x)?);
        while cumulative.total() <= p {
            if x >= max_run_length {
                tracing::warn!(
                    target_probability = p,
                    reached = cumulative.total(),
                    max_run_length,
                    "quantile scan hit run length cap"
                );
                return Err(RunLengthError::Unreachable {
                    target: p,
                    reached: cumulative.total(),
                    max_run_length,
                });
            }
            x += 1;
            cumulative.add(self.pmf(x)?);
        }
        tracing::debug!(x, cumulative = cumulative.total(), p, "quantile found");
        Ok(x)
    }

    /// Expected run length `Σ x·P(X = x)`.
    ///
    /// The sum runs over `1 ≤ x < sequence_length` and stops early once the
    /// accumulated mass is within `limits.convergence_epsilon` of 1. A
    /// sequence length of 1 gives an empty sum.
    ///
    /// # Errors
    /// [`RunLengthError::Unreachable`] if `limits.max_run_length` is passed
    /// before either stopping condition.
    pub fn mean(&self) -> Result<f64> {
        Ok(self.moments()?.mean)
    }

    /// Variance `E[X²] − E[X]²`, over the same truncated scan as
    /// [`mean`](Self::mean).
    ///
    /// # Errors
    /// Same as [`mean`](Self::mean).
    pub fn variance(&self) -> Result<f64> {
        let m = self.moments()?;
        Ok((m.second - m.mean * m.mean).max(0.0))
    }

    fn moments(&self) -> Result<Moments> {
        let threshold = 1.0 - self.limits.convergence_epsilon;
        let max_run_length = self.limits.max_run_length;

        let mut cumulative = NeumaierSum::new();
        let mut first = NeumaierSum::new();
        let mut second = NeumaierSum::new();
        let mut x: u64 = 1;
        while x < self.sequence_length {
            if x > max_run_length {
                tracing::warn!(
                    reached = cumulative.total(),
                    max_run_length,
                    "moment scan hit run length cap"
                );
                return Err(RunLengthError::Unreachable {
                    target: threshold,
                    reached: cumulative.total(),
                    max_run_length,
                });
            }
            let p = self.pmf(x)?;
            let xf = x as f64;
            cumulative.add(p);
            first.add(p * xf);
            second.add(p * xf * xf);
            if cumulative.total() >= threshold {
                break;
            }
            x += 1;
        }
        tracing::debug!(
            last_run_length = x,
            cumulative = cumulative.total(),
            "moment scan finished"
        );
        Ok(Moments {
            mean: first.total(),
            second: second.total(),
        })
    }
}

/// Raw first and second moments of a truncated scan.
struct Moments {
    mean: f64,
    second: f64,
}

/// Point mass at run length `run_length`.
///
/// # Errors
/// Returns [`RunLengthError::InvalidArgument`] for parameters rejected by
/// [`LongestRun::new`].
///
/// # Examples
/// ```
/// use u_runlength::exceedance_probability;
/// let p = exceedance_probability(10, 0.5, 3).unwrap();
/// assert!((p - 0.454754).abs() < 1e-6);
/// ```
pub fn exceedance_probability(
    sequence_length: u64,
    event_probability: f64,
    run_length: u64,
) -> Result<f64> {
    LongestRun::new(sequence_length, event_probability)?.pmf(run_length)
}

/// Smallest run length whose cumulative mass exceeds `target`, with default
/// [`SearchLimits`].
///
/// # Errors
/// See [`LongestRun::new`] and [`LongestRun::quantile`].
pub fn quantile(sequence_length: u64, event_probability: f64, target: f64) -> Result<u64> {
    LongestRun::new(sequence_length, event_probability)?.quantile(target)
}

/// Expected run length with default [`SearchLimits`].
///
/// # Errors
/// See [`LongestRun::new`] and [`LongestRun::mean`].
pub fn mean(sequence_length: u64, event_probability: f64) -> Result<f64> {
    LongestRun::new(sequence_length, event_probability)?.mean()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn pmf_is_non_negative(
            l in 1_u64..1_000_000,
            g in 0.01_f64..0.99,
            x in 1_u64..40,
        ) {
            let p = LongestRun::new(l, g).unwrap().pmf(x).unwrap();
            prop_assert!(p >= -1e-9, "pmf({l}, {g}, {x}) = {p}");
        }

        #[test]
        fn cdf_bounded_and_monotone(
            l in 1_u64..100_000,
            g in 0.01_f64..0.99,
        ) {
            let dist = LongestRun::new(l, g).unwrap();
            let mut prev = 0.0;
            for x in 1..=30 {
                let c = dist.cdf(x).unwrap();
                prop_assert!(c <= 1.0 + 1e-8, "cdf({x}) = {c}");
                prop_assert!(c >= prev - 1e-9, "cdf not monotone at x = {x}");
                prev = c;
            }
        }

        #[test]
        fn quantile_is_monotone_in_target(
            l in 1_u64..100_000,
            g in 0.05_f64..0.95,
            p1 in 0.01_f64..0.98,
            p2 in 0.01_f64..0.98,
        ) {
            let (lo, hi) = if p1 <= p2 { (p1, p2) } else { (p2, p1) };
            let dist = LongestRun::new(l, g).unwrap();
            prop_assert!(dist.quantile(lo).unwrap() <= dist.quantile(hi).unwrap());
        }
    }
}
