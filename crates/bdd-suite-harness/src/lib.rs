//! Host test framework for `bdd-suite`.
//!
//! The crate models a hierarchical tree of suites and tests, the per-test
//! execution state machine, a deferred completion protocol for tests that
//! finish asynchronously, and an executor that runs every registered test
//! sequentially on a single-threaded Tokio runtime.

mod context;
mod deferred;
mod error;
mod executor;
mod node;
mod panic;
pub mod report;

pub use context::SharedContext;
pub use deferred::{Deferred, DeferredPromise};
pub use error::{BoxError, HarnessError, TestError};
pub use executor::{Executor, ExecutorConfig, GREP_SKIP_REASON};
pub use node::{Node, Remote, Suite, SuiteId};
pub use panic::panic_message;
pub use report::{Report, TestRecord, TestStatus};
pub use test::{DEFAULT_TIMEOUT, Test, TestBody, TestFuture, TestState};
