//! Run-time skip resolution for scenario suites.
//!
//! Resolution reads the sealed [`AnnotationIndex`] when a step runs, never
//! while the tree is built, because an `only` marker anywhere in the tree
//! changes what every other scenario does.

use std::fmt;

use bdd_suite_harness::Suite;

use crate::index::{AnnotationIndex, Marker, Scope};

/// Why a step was skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Another feature or scenario was selected with `only`.
    Only,
    /// The feature or scenario is marked `pending`.
    Pending,
}

impl SkipReason {
    /// Reason string recorded against the skipped test.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Only => "only",
            Self::Pending => "pending",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decide whether steps of `scenario` are skipped.
///
/// Rules are tried in order and the first match wins:
///
/// 1. some feature is `only` and the scenario's feature is not: `Only`;
/// 2. the scenario's feature is `pending`: `Pending`;
/// 3. some scenario is `only` and this one is not: `Only`;
/// 4. the scenario is `pending`: `Pending`.
///
/// A scenario marked `only` inside an unmarked feature is therefore still
/// skipped while any feature is marked `only`.
///
/// # Examples
///
/// ```
/// use bdd_suite::{AnnotationIndex, Marker, Scope, SkipReason, resolve_skip};
/// use bdd_suite_harness::Suite;
///
/// let root = Suite::root("");
/// let feature = Suite::child(&root, "Feature");
/// let scenario = Suite::child(&feature, "Scenario");
///
/// let mut index = AnnotationIndex::default();
/// assert_eq!(resolve_skip(&index, &scenario), None);
///
/// index.mark(Scope::Scenario, Marker::Pending, scenario.id());
/// assert_eq!(resolve_skip(&index, &scenario), Some(SkipReason::Pending));
/// ```
#[must_use]
pub fn resolve_skip(index: &AnnotationIndex, scenario: &Suite) -> Option<SkipReason> {
    let feature = scenario.parent().map(|feature| feature.id());
    let feature_marked =
        |marker| feature.is_some_and(|id| index.is_marked(Scope::Feature, marker, id));

    if index.has_any(Scope::Feature, Marker::Only) && !feature_marked(Marker::Only) {
        return Some(SkipReason::Only);
    }
    if feature_marked(Marker::Pending) {
        return Some(SkipReason::Pending);
    }
    if index.has_any(Scope::Scenario, Marker::Only)
        && !index.is_marked(Scope::Scenario, Marker::Only, scenario.id())
    {
        return Some(SkipReason::Only);
    }
    if index.is_marked(Scope::Scenario, Marker::Pending, scenario.id()) {
        return Some(SkipReason::Pending);
    }
    None
}
