//! Step functions and the adapter that drives them to a single completion.
//!
//! Step authors declare at registration time how a function completes:
//!
//! - [`StepFn::managed`]: the adapter owns completion. The function returns a
//!   [`StepReturn`] which is either ready or awaitable. If the function
//!   switched the context to deferred mode and returned a ready success, the
//!   adapter waits for the deferred instead.
//! - [`StepFn::future`]: shorthand for a managed step returning a future.
//! - [`StepFn::with_completion`]: the function receives the raw
//!   [`Completion`] and reports through it itself.
//!
//! A [`Completion`] is consumed when it reports, so a step can never report
//! twice. Dropping it without reporting settles as [`StepError::Abandoned`].

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::rc::Rc;
use std::str::FromStr;
use std::task::{Context, Poll};

use bdd_suite_harness::panic_message;
use futures::FutureExt as _;
use futures::channel::oneshot;
use futures::future::{self, LocalBoxFuture};

use crate::context::StepContext;
use crate::error::StepError;

/// Outcome reported for a single step.
pub type StepOutcome = Result<(), StepError>;

/// Captured groups of a matched step signature.
///
/// # Examples
///
/// ```
/// use bdd_suite::StepArgs;
///
/// let args = StepArgs::new(vec!["12".into(), "apples".into()]);
/// assert_eq!(args.len(), 2);
/// assert_eq!(args.parse::<u32>(0).ok(), Some(12));
/// assert_eq!(args.get(1), Some("apples"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepArgs {
    values: Vec<String>,
}

impl StepArgs {
    /// Wrap captured values.
    #[must_use]
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    /// Captured value at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    /// Parse the captured value at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Argument`] when the value is missing or fails to
    /// parse.
    pub fn parse<T>(&self, index: usize) -> Result<T, StepError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let value = self.get(index).ok_or_else(|| StepError::Argument {
            index,
            message: format!("only {} argument(s) captured", self.values.len()),
        })?;
        value.parse().map_err(|err: T::Err| StepError::Argument {
            index,
            message: format!("cannot parse '{value}': {err}"),
        })
    }

    /// Number of captured values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Return `true` when nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Captured values in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }
}

/// Value returned by a managed step.
pub enum StepReturn {
    /// The step already finished.
    Ready(StepOutcome),
    /// The step finishes when the future resolves.
    Awaitable(LocalBoxFuture<'static, StepOutcome>),
}

impl StepReturn {
    /// Wrap a future as an awaitable result.
    pub fn awaitable<F, E>(future: F) -> Self
    where
        F: Future<Output = Result<(), E>> + 'static,
        E: Into<StepError>,
    {
        Self::Awaitable(future.map(|outcome| outcome.map_err(Into::into)).boxed_local())
    }

    /// Return `true` for [`Awaitable`](Self::Awaitable).
    #[must_use]
    pub const fn is_awaitable(&self) -> bool {
        matches!(self, Self::Awaitable(_))
    }
}

impl From<()> for StepReturn {
    fn from((): ()) -> Self {
        Self::Ready(Ok(()))
    }
}

impl<E: Into<StepError>> From<Result<(), E>> for StepReturn {
    fn from(outcome: Result<(), E>) -> Self {
        Self::Ready(outcome.map_err(Into::into))
    }
}

impl fmt::Debug for StepReturn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(outcome) => f.debug_tuple("Ready").field(outcome).finish(),
            Self::Awaitable(_) => f.debug_tuple("Awaitable").finish_non_exhaustive(),
        }
    }
}

/// One-shot handle through which a step reports its outcome.
///
/// # Examples
///
/// ```
/// use bdd_suite::{Completion, StepError};
///
/// let (completion, settled) = Completion::channel();
/// completion.fail("balance mismatch");
/// let outcome = futures::executor::block_on(settled);
/// assert_eq!(outcome.err().map(|e| e.to_string()).as_deref(), Some("balance mismatch"));
///
/// let (completion, settled) = Completion::channel();
/// drop(completion);
/// assert!(matches!(futures::executor::block_on(settled), Err(StepError::Abandoned)));
/// ```
#[must_use = "a step must report through its completion"]
pub struct Completion {
    sender: oneshot::Sender<StepOutcome>,
}

impl Completion {
    /// Create a completion handle and the future that observes it.
    pub fn channel() -> (Self, Settled) {
        let (sender, receiver) = oneshot::channel();
        (Self { sender }, Settled { receiver })
    }

    /// Report success.
    pub fn succeed(self) {
        self.finish(Ok(()));
    }

    /// Report failure.
    pub fn fail(self, error: impl Into<StepError>) {
        self.finish(Err(error.into()));
    }

    /// Report `outcome`.
    pub fn finish(self, outcome: StepOutcome) {
        if self.sender.send(outcome).is_err() {
            tracing::debug!("step completed after its test stopped waiting");
        }
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion").finish_non_exhaustive()
    }
}

/// Future resolving to the outcome reported through a [`Completion`].
#[must_use = "futures do nothing unless polled"]
pub struct Settled {
    receiver: oneshot::Receiver<StepOutcome>,
}

impl Future for Settled {
    type Output = StepOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(StepError::Abandoned)))
    }
}

impl fmt::Debug for Settled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settled").finish_non_exhaustive()
    }
}

type ManagedFn = dyn Fn(&StepContext, &StepArgs) -> StepReturn;
type CompletionFn = dyn Fn(&StepContext, &StepArgs, Completion);

#[derive(Clone)]
enum Mode {
    Managed(Rc<ManagedFn>),
    WithCompletion(Rc<CompletionFn>),
}

/// A registered step implementation together with its completion mode.
///
/// Cloning shares the implementation, so one function can back several
/// signatures.
#[derive(Clone)]
pub struct StepFn {
    mode: Mode,
}

impl StepFn {
    /// Step whose completion the adapter manages.
    ///
    /// `step` may return `()`, `Result<(), E>` with `E: Into<StepError>`, or a
    /// [`StepReturn`].
    ///
    /// # Examples
    ///
    /// ```
    /// use bdd_suite::{StepArgs, StepContext, StepError, StepFn};
    ///
    /// let step = StepFn::managed(|ctx: &StepContext, args: &StepArgs| -> Result<(), StepError> {
    ///     let count: u32 = args.parse(0)?;
    ///     ctx.shared().insert("count", count);
    ///     Ok(())
    /// });
    /// assert!(!step.wants_completion());
    /// ```
    pub fn managed<F, R>(step: F) -> Self
    where
        F: Fn(&StepContext, &StepArgs) -> R + 'static,
        R: Into<StepReturn>,
    {
        Self {
            mode: Mode::Managed(Rc::new(
                move |ctx: &StepContext, args: &StepArgs| -> StepReturn { step(ctx, args).into() },
            )),
        }
    }

    /// Step implemented as an async function.
    pub fn future<F, Fut, E>(step: F) -> Self
    where
        F: Fn(StepContext, StepArgs) -> Fut + 'static,
        Fut: Future<Output = Result<(), E>> + 'static,
        E: Into<StepError>,
    {
        Self::managed(move |ctx: &StepContext, args: &StepArgs| {
            StepReturn::awaitable(step(ctx.clone(), args.clone()))
        })
    }

    /// Step that reports through the [`Completion`] it receives.
    ///
    /// The adapter calls it unmodified and issues no completion of its own.
    pub fn with_completion<F>(step: F) -> Self
    where
        F: Fn(&StepContext, &StepArgs, Completion) + 'static,
    {
        Self {
            mode: Mode::WithCompletion(Rc::new(step)),
        }
    }

    /// Return `true` when the step reports through its own completion.
    #[must_use]
    pub const fn wants_completion(&self) -> bool {
        matches!(self.mode, Mode::WithCompletion(_))
    }

    /// Run the step and report its outcome through `completion` exactly once.
    ///
    /// The returned future drives any asynchronous part of the step; it does
    /// nothing further for steps that report through their own completion.
    pub fn invoke(
        &self,
        ctx: &StepContext,
        args: &StepArgs,
        completion: Completion,
    ) -> LocalBoxFuture<'static, ()> {
        match &self.mode {
            Mode::WithCompletion(step) => {
                step(ctx, args, completion);
                future::ready(()).boxed_local()
            }
            Mode::Managed(step) => Self::invoke_managed(step.as_ref(), ctx, args, completion),
        }
    }

    fn invoke_managed(
        step: &ManagedFn,
        ctx: &StepContext,
        args: &StepArgs,
        completion: Completion,
    ) -> LocalBoxFuture<'static, ()> {
        let returned = match std::panic::catch_unwind(AssertUnwindSafe(|| step(ctx, args))) {
            Ok(returned) => returned,
            Err(payload) => {
                completion.fail(StepError::Panicked(panic_message(payload.as_ref())));
                return future::ready(()).boxed_local();
            }
        };
        match returned {
            StepReturn::Ready(Err(error)) => {
                completion.fail(error);
                future::ready(()).boxed_local()
            }
            StepReturn::Ready(Ok(())) if ctx.is_async() => {
                let pending = ctx.pending_completion();
                async move {
                    let outcome = match pending {
                        Some(promise) => promise.await.map_err(StepError::Failed),
                        None => Err(StepError::Abandoned),
                    };
                    completion.finish(outcome);
                }
                .boxed_local()
            }
            StepReturn::Ready(Ok(())) => {
                completion.succeed();
                future::ready(()).boxed_local()
            }
            StepReturn::Awaitable(awaitable) => async move {
                let outcome = AssertUnwindSafe(awaitable)
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|payload| {
                        Err(StepError::Panicked(panic_message(payload.as_ref())))
                    });
                completion.finish(outcome);
            }
            .boxed_local(),
        }
    }
}

impl fmt::Debug for StepFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.mode {
            Mode::Managed(_) => "managed",
            Mode::WithCompletion(_) => "with_completion",
        };
        f.debug_struct("StepFn").field("mode", &mode).finish()
    }
}
