//! Error types raised by test bodies and the executor.

use std::time::Duration;

use thiserror::Error;

/// Type-erased error carried by failed tests and rejected deferreds.
///
/// Execution is single-threaded, so the error is not required to be `Send`.
pub type BoxError = Box<dyn std::error::Error + 'static>;

/// Signal returned by a test body when it does not pass.
///
/// [`Skip`][Self::Skip] is a control-flow signal rather than a failure: the
/// executor records the test as skipped with the supplied reason.
///
/// # Examples
///
/// ```
/// use bdd_suite_harness::TestError;
///
/// let skip = TestError::skip("pending");
/// assert!(skip.is_skip());
/// assert_eq!(skip.skip_reason(), Some("pending"));
///
/// let failed = TestError::failed("boom");
/// assert!(!failed.is_skip());
/// assert_eq!(failed.to_string(), "boom");
/// ```
#[derive(Debug, Error)]
pub enum TestError {
    /// The test was skipped; carries the visible skip cause.
    #[error("skipped: {reason}")]
    Skip {
        /// Reason recorded against the skipped test.
        reason: String,
    },
    /// The test body reported a failure.
    #[error("{0}")]
    Failed(BoxError),
    /// The test did not settle within its timeout.
    #[error("test timed out after {0:?}")]
    Timeout(Duration),
    /// The test body panicked.
    #[error("test panicked: {0}")]
    Panicked(String),
    /// The test is no longer attached to a suite.
    #[error("test '{name}' is detached from its suite")]
    Detached {
        /// Name of the detached test.
        name: String,
    },
}

impl TestError {
    /// Construct a skip signal.
    #[must_use]
    pub fn skip(reason: impl Into<String>) -> Self {
        Self::Skip {
            reason: reason.into(),
        }
    }

    /// Construct a failure from any error value or message.
    #[must_use]
    pub fn failed(error: impl Into<BoxError>) -> Self {
        Self::Failed(error.into())
    }

    /// Return `true` when this value is a skip signal.
    #[must_use]
    pub const fn is_skip(&self) -> bool {
        matches!(self, Self::Skip { .. })
    }

    /// Return the skip reason when this value is a skip signal.
    #[must_use]
    pub fn skip_reason(&self) -> Option<&str> {
        match self {
            Self::Skip { reason } => Some(reason),
            _ => None,
        }
    }
}

/// Errors raised by the executor itself rather than by a test.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The Tokio runtime could not be constructed.
    #[error("failed to build the test runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::skip(TestError::skip("only"), "skipped: only")]
    #[case::failed(TestError::failed("step exploded"), "step exploded")]
    #[case::timeout(TestError::Timeout(Duration::from_millis(5)), "test timed out after 5ms")]
    #[case::panicked(TestError::Panicked("boom".into()), "test panicked: boom")]
    fn test_error_renders_message(#[case] error: TestError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[test]
    fn only_skip_variant_carries_reason() {
        assert_eq!(TestError::skip("pending").skip_reason(), Some("pending"));
        assert_eq!(TestError::failed("nope").skip_reason(), None);
    }

    #[test]
    fn runtime_error_converts_from_io() {
        let error: HarnessError = std::io::Error::other("no reactor").into();
        assert!(error.to_string().contains("no reactor"));
    }
}
