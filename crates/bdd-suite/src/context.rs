//! The view of a running test that step functions receive.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use bdd_suite_harness::{Deferred, DeferredPromise, Remote, SharedContext, Test};

use crate::error::StepError;

/// Execution context passed to step functions.
///
/// The context is a thin projection over the running [`Test`]: reads and
/// writes go straight through to it. Cloning shares the same test.
#[derive(Clone)]
pub struct StepContext {
    test: Rc<Test>,
}

impl StepContext {
    /// Wrap the running test.
    #[must_use]
    pub fn new(test: Rc<Test>) -> Self {
        Self { test }
    }

    /// The underlying test.
    #[must_use]
    pub fn test(&self) -> &Rc<Test> {
        &self.test
    }

    /// State shared by every step of the enclosing scenario.
    ///
    /// A test without a scenario context gets a fresh, unshared store.
    #[must_use]
    pub fn shared(&self) -> SharedContext {
        self.test
            .parent()
            .and_then(|scenario| scenario.context().cloned())
            .unwrap_or_default()
    }

    /// Step text the test was created for.
    #[must_use]
    pub fn name(&self) -> &str {
        self.test.name()
    }

    /// Remote driver of the session, if any.
    #[must_use]
    pub fn remote(&self) -> Option<Remote> {
        self.test.remote()
    }

    /// Session identifier, if any.
    #[must_use]
    pub fn session_id(&self) -> Option<String> {
        self.test.session_id()
    }

    /// Current timeout of the test.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.test.timeout()
    }

    /// Change the timeout of the running test.
    pub fn set_timeout(&self, timeout: Duration) {
        self.test.set_timeout(timeout);
    }

    /// Switch the step to deferred completion.
    ///
    /// A managed step that calls this and returns without an awaitable
    /// completes when the returned [`Deferred`] settles.
    pub fn defer(&self) -> Deferred {
        self.test.defer()
    }

    /// Like [`defer`](Self::defer), also replacing the timeout.
    pub fn defer_with_timeout(&self, timeout: Duration) -> Deferred {
        self.test.defer_with_timeout(timeout)
    }

    /// Return `true` once [`defer`](Self::defer) has been called.
    #[must_use]
    pub fn is_async(&self) -> bool {
        self.test.is_async()
    }

    pub(crate) fn pending_completion(&self) -> Option<DeferredPromise> {
        self.test.pending_completion()
    }

    /// Skip reason already recorded against the test.
    #[must_use]
    pub fn skipped(&self) -> Option<String> {
        self.test.skipped()
    }

    /// Record `reason` and return the error that skips the step.
    ///
    /// # Examples
    ///
    /// ```
    /// use bdd_suite::{StepArgs, StepContext, StepError, StepFn};
    ///
    /// let step = StepFn::managed(|ctx: &StepContext, _args: &StepArgs| -> Result<(), StepError> {
    ///     Err(ctx.skip("requires a browser"))
    /// });
    /// assert!(!step.wants_completion());
    /// ```
    #[must_use]
    pub fn skip(&self, reason: impl Into<String>) -> StepError {
        let reason = reason.into();
        self.test.flag_skipped(reason.clone());
        StepError::Skipped { reason }
    }

    /// Snapshot of the underlying test as JSON.
    #[cfg(feature = "diagnostics")]
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        self.test.to_json()
    }
}

impl fmt::Debug for StepContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepContext")
            .field("test", &self.test.name())
            .finish()
    }
}
