//! Sequential executor for a suite tree.
//!
//! Plugins register hooks that populate the root suite. [`Executor::run`]
//! invokes every hook, then runs each leaf test one at a time inside a
//! current-thread Tokio runtime and a [`LocalSet`](tokio::task::LocalSet), so
//! test bodies may use `tokio::task::spawn_local` and Tokio timers.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use regex::Regex;
use tokio::time::Instant;

use crate::error::HarnessError;
use crate::node::{Remote, Suite};
use crate::report::{Report, TestRecord, TestStatus};
use crate::test::{DEFAULT_TIMEOUT, Test};

type RegistrationHook = Box<dyn FnOnce(&Rc<Suite>)>;

/// Skip reason recorded against tests filtered out by
/// [`ExecutorConfig::grep`].
pub const GREP_SKIP_REASON: &str = "grep";

/// Executor settings.
#[derive(Clone, Debug)]
pub struct ExecutorConfig {
    /// Only tests whose full name matches run; the rest are skipped.
    pub grep: Option<Regex>,
    /// Timeout for tests that do not set their own.
    pub default_timeout: Duration,
    /// Session identifier exposed to every test.
    pub session_id: Option<String>,
    /// Remote driver exposed to every test.
    pub remote: Option<Remote>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            grep: None,
            default_timeout: DEFAULT_TIMEOUT,
            session_id: None,
            remote: None,
        }
    }
}

/// Collects registration hooks and runs the resulting tree.
///
/// # Examples
///
/// ```
/// use bdd_suite_harness::{Executor, ExecutorConfig, Node, Test};
/// use futures::FutureExt as _;
///
/// let mut executor = Executor::new(ExecutorConfig::default());
/// executor.register(|root| {
///     let test = Test::new(root, "always passes", |_test| async { Ok(()) }.boxed_local());
///     root.push(Node::Test(test));
/// });
///
/// let report = executor.run().expect("runtime should build");
/// assert_eq!(report.passed(), 1);
/// ```
pub struct Executor {
    config: ExecutorConfig,
    root: Rc<Suite>,
    hooks: Vec<RegistrationHook>,
}

impl Executor {
    /// Create an executor with an empty, unnamed root suite.
    #[must_use]
    pub fn new(config: ExecutorConfig) -> Self {
        let root = Suite::root_with_session("", config.remote.clone(), config.session_id.clone());
        Self {
            config,
            root,
            hooks: Vec::new(),
        }
    }

    /// Queue a hook that populates the root suite when the run starts.
    ///
    /// Hooks run in registration order.
    pub fn register(&mut self, hook: impl FnOnce(&Rc<Suite>) + 'static) {
        self.hooks.push(Box::new(hook));
    }

    /// Number of hooks waiting to run.
    #[must_use]
    pub fn pending_hooks(&self) -> usize {
        self.hooks.len()
    }

    /// Root suite of the tree.
    #[must_use]
    pub fn root(&self) -> &Rc<Suite> {
        &self.root
    }

    /// Invoke the queued hooks without running any test.
    pub fn prepare(&mut self) {
        for hook in self.hooks.drain(..) {
            hook(&self.root);
        }
    }

    /// Run every registered test and return their outcomes.
    ///
    /// # Errors
    /// Returns [`HarnessError::Runtime`] when the Tokio runtime cannot be
    /// built.
    pub fn run(mut self) -> Result<Report, HarnessError> {
        self.prepare();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let local_set = tokio::task::LocalSet::new();
        let report = local_set.block_on(&runtime, self.run_tests());
        tracing::info!(
            passed = report.passed(),
            failed = report.failed(),
            skipped = report.skipped(),
            "run finished"
        );
        Ok(report)
    }

    async fn run_tests(&self) -> Report {
        let mut report = Report::default();
        for test in self.root.tests() {
            report.push(self.run_test(&test).await);
        }
        report
    }

    async fn run_test(&self, test: &Rc<Test>) -> TestRecord {
        let full_name = test.full_name();
        let filtered_out = self
            .config
            .grep
            .as_ref()
            .is_some_and(|grep| !grep.is_match(&full_name));
        if filtered_out {
            test.flag_skipped(GREP_SKIP_REASON);
        }
        test.inherit_timeout(self.config.default_timeout);

        let started = Instant::now();
        let status = test.execute().await;
        let duration = started.elapsed();
        match &status {
            TestStatus::Passed => tracing::debug!(test = %full_name, ?duration, "passed"),
            TestStatus::Skipped { reason } => {
                tracing::debug!(test = %full_name, %reason, "skipped");
            }
            TestStatus::Failed { message } => {
                tracing::warn!(test = %full_name, %message, "failed");
            }
        }
        TestRecord::new(full_name, status, duration)
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("config", &self.config)
            .field("root", &self.root)
            .field("pending_hooks", &self.hooks.len())
            .finish()
    }
}
