//! Identity-keyed record of `only` and `pending` markers.
//!
//! The index is filled while the suite tree is built and sealed afterwards;
//! test bodies only ever see a shared reference. Membership is by
//! [`SuiteId`], so features or scenarios with repeated titles stay distinct.

use std::collections::HashSet;

use bdd_suite_harness::SuiteId;

/// Annotation that influences which scenarios run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Marker {
    /// Run only marked nodes.
    Only,
    /// Skip the marked node as unfinished.
    Pending,
}

impl Marker {
    /// Untranslated annotation name, used as the localisation key.
    #[must_use]
    pub const fn annotation_name(self) -> &'static str {
        match self {
            Self::Only => "only",
            Self::Pending => "pending",
        }
    }
}

/// Level of the suite tree a marker was found at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Feature suite.
    Feature,
    /// Scenario suite.
    Scenario,
}

/// Four identity sets: only/pending features and only/pending scenarios.
///
/// # Examples
///
/// ```
/// use bdd_suite::{AnnotationIndex, Marker, Scope};
/// use bdd_suite_harness::Suite;
///
/// let root = Suite::root("");
/// let feature = Suite::child(&root, "Checkout");
///
/// let mut index = AnnotationIndex::default();
/// index.mark(Scope::Feature, Marker::Only, feature.id());
///
/// assert!(index.has_any(Scope::Feature, Marker::Only));
/// assert!(index.is_marked(Scope::Feature, Marker::Only, feature.id()));
/// assert!(!index.has_any(Scope::Scenario, Marker::Only));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnnotationIndex {
    only_features: HashSet<SuiteId>,
    pending_features: HashSet<SuiteId>,
    only_scenarios: HashSet<SuiteId>,
    pending_scenarios: HashSet<SuiteId>,
}

impl AnnotationIndex {
    /// Record `marker` against the suite `id` at `scope`.
    pub fn mark(&mut self, scope: Scope, marker: Marker, id: SuiteId) {
        self.set_mut(scope, marker).insert(id);
    }

    /// Return `true` when `id` carries `marker` at `scope`.
    #[must_use]
    pub fn is_marked(&self, scope: Scope, marker: Marker, id: SuiteId) -> bool {
        self.set(scope, marker).contains(&id)
    }

    /// Return `true` when any suite carries `marker` at `scope`.
    #[must_use]
    pub fn has_any(&self, scope: Scope, marker: Marker) -> bool {
        !self.set(scope, marker).is_empty()
    }

    /// Number of suites carrying `marker` at `scope`.
    #[must_use]
    pub fn count(&self, scope: Scope, marker: Marker) -> usize {
        self.set(scope, marker).len()
    }

    const fn set(&self, scope: Scope, marker: Marker) -> &HashSet<SuiteId> {
        match (scope, marker) {
            (Scope::Feature, Marker::Only) => &self.only_features,
            (Scope::Feature, Marker::Pending) => &self.pending_features,
            (Scope::Scenario, Marker::Only) => &self.only_scenarios,
            (Scope::Scenario, Marker::Pending) => &self.pending_scenarios,
        }
    }

    fn set_mut(&mut self, scope: Scope, marker: Marker) -> &mut HashSet<SuiteId> {
        match (scope, marker) {
            (Scope::Feature, Marker::Only) => &mut self.only_features,
            (Scope::Feature, Marker::Pending) => &mut self.pending_features,
            (Scope::Scenario, Marker::Only) => &mut self.only_scenarios,
            (Scope::Scenario, Marker::Pending) => &mut self.pending_scenarios,
        }
    }
}
