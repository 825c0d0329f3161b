//! Limits for the forward scans over run lengths.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RunLengthError};

/// Bounds on the quantile, moment and sampling scans.
///
/// Both scans walk `x = 1, 2, …` accumulating point masses. Out-of-range
/// targets (or parameters whose mass never saturates) would otherwise walk
/// forever, so every scan stops at `max_run_length`.
///
/// Deserializes from partial documents; missing fields take the defaults.
///
/// # Examples
/// ```
/// use u_runlength::config::SearchLimits;
/// let limits = SearchLimits::default().with_max_run_length(64);
/// assert_eq!(limits.max_run_length, 64);
/// assert!(limits.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchLimits {
    /// Largest run length any scan will evaluate.
    pub max_run_length: u64,
    /// Scans treat cumulative mass `≥ 1 − convergence_epsilon` as saturated.
    pub convergence_epsilon: f64,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_run_length: 1000,
            convergence_epsilon: f64::from(f32::EPSILON),
        }
    }
}

impl SearchLimits {
    pub fn with_max_run_length(mut self, max_run_length: u64) -> Self {
        self.max_run_length = max_run_length;
        self
    }

    pub fn with_convergence_epsilon(mut self, convergence_epsilon: f64) -> Self {
        self.convergence_epsilon = convergence_epsilon;
        self
    }

    /// Checks that the cap is positive and the tolerance lies in `[0, 1)`.
    ///
    /// # Errors
    /// Returns [`RunLengthError::InvalidArgument`] describing the first
    /// violated bound.
    pub fn validate(&self) -> Result<()> {
        if self.max_run_length == 0 {
            return Err(RunLengthError::InvalidArgument(
                "max_run_length must be at least 1".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.convergence_epsilon) {
            return Err(RunLengthError::InvalidArgument(format!(
                "convergence_epsilon must lie in [0, 1), got {}",
                self.convergence_epsilon
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let limits = SearchLimits::default();
        assert_eq!(limits.max_run_length, 1000);
        assert_eq!(limits.convergence_epsilon, f32::EPSILON as f64);
        assert!(limits.validate().is_ok());
    }

    #[test]
    fn test_builder_setters() {
        let limits = SearchLimits::default()
            .with_max_run_length(12)
            .with_convergence_epsilon(1e-12);
        assert_eq!(limits.max_run_length, 12);
        assert_eq!(limits.convergence_epsilon, 1e-12);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(SearchLimits::default().with_max_run_length(0).validate().is_err());
        assert!(SearchLimits::default().with_convergence_epsilon(1.0).validate().is_err());
        assert!(SearchLimits::default().with_convergence_epsilon(-1e-3).validate().is_err());
        assert!(SearchLimits::default()
            .with_convergence_epsilon(f64::NAN)
            .validate()
            .is_err());
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let limits: SearchLimits = serde_json::from_str(r#"{ "max_run_length": 40 }"#).unwrap();
        assert_eq!(limits.max_run_length, 40);
        assert_eq!(limits.convergence_epsilon, SearchLimits::default().convergence_epsilon);

        let empty: SearchLimits = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, SearchLimits::default());
    }
}
