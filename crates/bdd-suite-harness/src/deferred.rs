//! Deferred completion for tests that finish after their body returns.
//!
//! A [`Deferred`] is handed out by [`Test::defer`](crate::Test::defer). The
//! test is considered running until the deferred is resolved or rejected.
//! Only the first settlement counts; later calls are ignored. Dropping every
//! handle without settling fails the pending [`DeferredPromise`].

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll};

use futures::channel::oneshot;

use crate::error::BoxError;

type Outcome = Result<(), BoxError>;

struct Inner {
    sender: RefCell<Option<oneshot::Sender<Outcome>>>,
}

/// Handle used to settle an asynchronous test exactly once.
///
/// # Examples
///
/// ```
/// use bdd_suite_harness::Deferred;
///
/// let (deferred, promise) = Deferred::channel();
/// deferred.resolve();
/// deferred.reject("ignored: already settled");
///
/// assert!(deferred.is_settled());
/// assert!(futures::executor::block_on(promise).is_ok());
/// ```
#[derive(Clone)]
pub struct Deferred {
    inner: Rc<Inner>,
}

impl Deferred {
    /// Create an unsettled deferred and the promise observing it.
    #[must_use]
    pub fn channel() -> (Self, DeferredPromise) {
        let (sender, receiver) = oneshot::channel();
        let deferred = Self {
            inner: Rc::new(Inner {
                sender: RefCell::new(Some(sender)),
            }),
        };
        (deferred, DeferredPromise { receiver })
    }

    /// A handle that is already settled; settling it does nothing.
    pub(crate) fn settled() -> Self {
        Self {
            inner: Rc::new(Inner {
                sender: RefCell::new(None),
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> WeakDeferred {
        WeakDeferred(Rc::downgrade(&self.inner))
    }

    /// Settle successfully. Ignored when already settled.
    pub fn resolve(&self) {
        self.settle(Ok(()));
    }

    /// Settle with a failure. Ignored when already settled.
    pub fn reject(&self, error: impl Into<BoxError>) {
        self.settle(Err(error.into()));
    }

    /// Return `true` once the deferred has been resolved or rejected.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.inner.sender.borrow().is_none()
    }

    fn settle(&self, outcome: Outcome) {
        let Some(sender) = self.inner.sender.borrow_mut().take() else {
            tracing::debug!("ignoring repeated settlement of a deferred test");
            return;
        };
        // The promise may already be gone when the test timed out.
        let _ = sender.send(outcome);
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("settled", &self.is_settled())
            .finish()
    }
}

/// Non-owning reference to a [`Deferred`]; it does not keep the deferred
/// from being abandoned.
#[derive(Clone, Debug)]
pub(crate) struct WeakDeferred(Weak<Inner>);

impl WeakDeferred {
    pub(crate) fn upgrade(&self) -> Option<Deferred> {
        self.0.upgrade().map(|inner| Deferred { inner })
    }
}

/// Future resolving when the owning [`Deferred`] settles.
///
/// A deferred whose handles are all dropped without settling resolves to an
/// error.
#[must_use = "futures do nothing unless polled"]
pub struct DeferredPromise {
    receiver: oneshot::Receiver<Outcome>,
}

impl Future for DeferredPromise {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver).poll(cx).map(|received| {
            received.unwrap_or_else(|_| Err("deferred was dropped before it settled".into()))
        })
    }
}

impl fmt::Debug for DeferredPromise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredPromise").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::Deferred;
    use futures::executor::block_on;

    #[test]
    fn resolve_settles_promise() {
        let (deferred, promise) = Deferred::channel();
        assert!(!deferred.is_settled());
        deferred.resolve();
        assert!(deferred.is_settled());
        assert!(block_on(promise).is_ok());
    }

    #[test]
    fn first_settlement_wins() {
        let (deferred, promise) = Deferred::channel();
        deferred.reject("first");
        deferred.resolve();
        let Err(error) = block_on(promise) else {
            panic!("rejection should win");
        };
        assert_eq!(error.to_string(), "first");
    }

    #[test]
    fn clones_settle_the_same_promise() {
        let (deferred, promise) = Deferred::channel();
        deferred.clone().resolve();
        assert!(deferred.is_settled());
        assert!(block_on(promise).is_ok());
    }

    #[test]
    fn dropping_unsettled_deferred_fails_promise() {
        let (deferred, promise) = Deferred::channel();
        let weak = deferred.downgrade();
        drop(deferred);
        assert!(weak.upgrade().is_none());
        let Err(error) = block_on(promise) else {
            panic!("abandoned deferred should fail");
        };
        assert!(error.to_string().contains("dropped"));
    }

    #[test]
    fn weak_reference_sees_the_live_handle() {
        let (deferred, _promise) = Deferred::channel();
        let weak = deferred.downgrade();
        deferred.resolve();
        assert!(weak.upgrade().is_some_and(|handle| handle.is_settled()));
    }

    #[test]
    fn settled_handle_ignores_settlement() {
        let deferred = Deferred::settled();
        assert!(deferred.is_settled());
        deferred.reject("ignored");
        assert!(deferred.is_settled());
    }
}
