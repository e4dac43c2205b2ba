//! Scenario-scoped associative storage shared between successive tests.
//!
//! Values are stored type-erased under string keys and retrieved by
//! downcasting. A lookup with the wrong type behaves as if the key were
//! absent. Execution is single-threaded, so the store uses `Rc<RefCell<_>>`
//! rather than locks.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Shared state for the tests of one suite.
///
/// Cloning the handle shares the underlying store.
///
/// # Examples
///
/// ```
/// use bdd_suite_harness::SharedContext;
///
/// let ctx = SharedContext::default();
/// ctx.insert("user", String::from("ada"));
///
/// let alias = ctx.clone();
/// assert_eq!(alias.get::<String>("user").as_deref(), Some("ada"));
/// assert_eq!(ctx.get::<u32>("user"), None);
/// ```
#[derive(Clone, Default)]
pub struct SharedContext {
    values: Rc<RefCell<HashMap<String, Box<dyn Any>>>>,
}

impl SharedContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, returning `true` when a previous value was
    /// replaced.
    pub fn insert<T: Any>(&self, key: impl Into<String>, value: T) -> bool {
        self.values
            .borrow_mut()
            .insert(key.into(), Box::new(value))
            .is_some()
    }

    /// Clone the value stored under `key` when it has type `T`.
    #[must_use]
    pub fn get<T: Any + Clone>(&self, key: &str) -> Option<T> {
        self.with(key, T::clone)
    }

    /// Apply `read` to the value stored under `key` when it has type `T`.
    pub fn with<T: Any, R>(&self, key: &str, read: impl FnOnce(&T) -> R) -> Option<R> {
        let values = self.values.borrow();
        values.get(key)?.downcast_ref::<T>().map(read)
    }

    /// Apply `update` to the value stored under `key` when it has type `T`.
    pub fn with_mut<T: Any, R>(&self, key: &str, update: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut values = self.values.borrow_mut();
        values.get_mut(key)?.downcast_mut::<T>().map(update)
    }

    /// Remove and return the value stored under `key` when it has type `T`.
    ///
    /// A value of a different type is left in place.
    pub fn remove<T: Any>(&self, key: &str) -> Option<T> {
        let mut values = self.values.borrow_mut();
        if !values.get(key)?.is::<T>() {
            return None;
        }
        let boxed = values.remove(key)?;
        boxed.downcast::<T>().ok().map(|value| *value)
    }

    /// Return `true` when any value is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.borrow().contains_key(key)
    }

    /// Number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.borrow().len()
    }

    /// Return `true` when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.borrow().is_empty()
    }
}

impl fmt::Debug for SharedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self.values.borrow();
        let mut keys: Vec<_> = values.keys().collect();
        keys.sort_unstable();
        f.debug_struct("SharedContext").field("keys", &keys).finish()
    }
}
