//! Error type shared by every fallible operation in the crate.

use thiserror::Error;

/// Errors raised by the run-length engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunLengthError {
    /// An argument violates a mathematical precondition.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A forward scan hit its run-length cap before reaching the target mass.
    #[error(
        "target cumulative probability {target} unreachable: reached {reached} \
         at run length cap {max_run_length}"
    )]
    Unreachable {
        target: f64,
        reached: f64,
        max_run_length: u64,
    },
}

/// Result alias for run-length operations.
pub type Result<T> = std::result::Result<T, RunLengthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_message() {
        let err = RunLengthError::InvalidArgument("negative factorial: n = -1".into());
        assert_eq!(err.to_string(), "invalid argument: negative factorial: n = -1");
    }

    #[test]
    fn test_unreachable_message_names_cap() {
        let err = RunLengthError::Unreachable {
            target: 0.999,
            reached: 0.5,
            max_run_length: 10,
        };
        let msg = err.to_string();
        assert!(msg.contains("0.999"), "{msg}");
        assert!(msg.contains("cap 10"), "{msg}");
    }
}
