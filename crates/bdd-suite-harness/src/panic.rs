//! Panic payload formatting for failed test bodies.

use std::any::Any;

/// Render a panic payload as a readable message.
///
/// String payloads are returned verbatim; anything else is described by its
/// `Debug` rendering of the erased payload.
///
/// # Examples
///
/// ```
/// use bdd_suite_harness::panic_message;
///
/// let payload = std::panic::catch_unwind(|| panic!("step blew up")).unwrap_err();
/// assert_eq!(panic_message(payload.as_ref()), "step blew up");
/// ```
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| format!("{payload:?}"))
}
