//! Outcomes gathered while the executor runs a tree.
//!
//! A [`Report`] is returned by [`Executor::run`](crate::Executor::run). It
//! holds one [`TestRecord`] per leaf test in execution order, so reporters can
//! render summaries without walking the suite tree again.

use std::time::Duration;

/// JSON report writer for test outcomes.
#[cfg(feature = "diagnostics")]
pub mod json;

/// Final status of a single test.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TestStatus {
    /// The test body settled successfully.
    Passed,
    /// The test body failed, panicked, or timed out.
    Failed {
        /// Rendered failure.
        message: String,
    },
    /// The test was skipped.
    Skipped {
        /// Visible skip cause.
        reason: String,
    },
}

impl TestStatus {
    /// Retrieve the lowercase label for the status.
    ///
    /// # Examples
    /// ```
    /// use bdd_suite_harness::TestStatus;
    ///
    /// let skipped = TestStatus::Skipped { reason: "only".into() };
    /// assert_eq!(skipped.label(), "skipped");
    /// ```
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed { .. } => "failed",
            Self::Skipped { .. } => "skipped",
        }
    }

    /// Skip reason, when the test was skipped.
    #[must_use]
    pub fn skip_reason(&self) -> Option<&str> {
        match self {
            Self::Skipped { reason } => Some(reason),
            _ => None,
        }
    }

    /// Failure message, when the test failed.
    #[must_use]
    pub fn failure_message(&self) -> Option<&str> {
        match self {
            Self::Failed { message } => Some(message),
            _ => None,
        }
    }
}

/// Outcome recorded for one executed test.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestRecord {
    full_name: String,
    status: TestStatus,
    duration: Duration,
}

impl TestRecord {
    /// Construct a record.
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use bdd_suite_harness::{TestRecord, TestStatus};
    ///
    /// let record = TestRecord::new("Feature - Scenario - Given x", TestStatus::Passed, Duration::ZERO);
    /// assert_eq!(record.full_name(), "Feature - Scenario - Given x");
    /// ```
    #[must_use]
    pub fn new(full_name: impl Into<String>, status: TestStatus, duration: Duration) -> Self {
        Self {
            full_name: full_name.into(),
            status,
            duration,
        }
    }

    /// Suite path and test name joined with `" - "`.
    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Final status.
    #[must_use]
    pub fn status(&self) -> &TestStatus {
        &self.status
    }

    /// Wall-clock time spent running the body.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }
}

/// Ordered collection of test outcomes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Report {
    records: Vec<TestRecord>,
}

impl Report {
    /// Append a record.
    pub fn push(&mut self, record: TestRecord) {
        self.records.push(record);
    }

    /// Records in execution order.
    #[must_use]
    pub fn records(&self) -> &[TestRecord] {
        &self.records
    }

    /// Find the first record whose full name equals `full_name`.
    #[must_use]
    pub fn find(&self, full_name: &str) -> Option<&TestRecord> {
        self.records.iter().find(|record| record.full_name == full_name)
    }

    /// Number of passed tests.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.count(|status| matches!(status, TestStatus::Passed))
    }

    /// Number of failed tests.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|status| matches!(status, TestStatus::Failed { .. }))
    }

    /// Number of skipped tests.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|status| matches!(status, TestStatus::Skipped { .. }))
    }

    /// Return `true` when no test failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, predicate: impl Fn(&TestStatus) -> bool) -> usize {
        self.records
            .iter()
            .filter(|record| predicate(&record.status))
            .count()
    }
}
