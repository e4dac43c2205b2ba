//! Materialises parsed features as a suite tree.
//!
//! Each feature becomes a suite under the root, each scenario a suite under
//! its feature with a fresh [`SharedContext`], and each step a test under its
//! scenario. Children are appended in input order. Feature and scenario
//! markers are recorded in an [`AnnotationIndex`] that is sealed when the
//! build finishes; test bodies read it only once they run.

use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

use bdd_suite_harness::{Node, SharedContext, Suite, Test, TestError, TestFuture};
use futures::FutureExt as _;

use crate::annotations::{AnnotationMatcher, Annotations};
use crate::context::StepContext;
use crate::feature::{Feature, Scenario};
use crate::index::{AnnotationIndex, Marker, Scope};
use crate::library::StepResolver;
use crate::skip::resolve_skip;
use crate::step::Completion;

type SealedIndex = Rc<OnceCell<AnnotationIndex>>;

/// Counts of the nodes created by a build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Feature suites created.
    pub features: usize,
    /// Scenario suites created.
    pub scenarios: usize,
    /// Step tests created.
    pub steps: usize,
}

/// The outcome of a build: node counts and the sealed annotation index.
#[derive(Clone, Debug)]
pub struct SuiteTree {
    summary: BuildSummary,
    index: SealedIndex,
}

impl SuiteTree {
    /// Counts of the nodes created.
    #[must_use]
    pub const fn summary(&self) -> BuildSummary {
        self.summary
    }

    /// The annotation index the tree's tests resolve skips against.
    #[must_use]
    pub fn index(&self) -> Option<&AnnotationIndex> {
        self.index.get()
    }
}

/// Builds suite trees whose steps run through a [`StepResolver`].
pub struct SuiteTreeBuilder {
    matcher: AnnotationMatcher,
    resolver: Rc<dyn StepResolver>,
    index: AnnotationIndex,
    sealed: SealedIndex,
    summary: BuildSummary,
}

impl SuiteTreeBuilder {
    /// Builder recognising markers with `matcher` and running steps with
    /// `resolver`.
    #[must_use]
    pub fn new(matcher: AnnotationMatcher, resolver: Rc<dyn StepResolver>) -> Self {
        Self {
            matcher,
            resolver,
            index: AnnotationIndex::default(),
            sealed: Rc::new(OnceCell::new()),
            summary: BuildSummary::default(),
        }
    }

    /// Append a suite for every feature to `root` and seal the index.
    pub fn build(mut self, features: &[Feature], root: &Rc<Suite>) -> SuiteTree {
        for feature in features {
            self.feature_suite(root, feature);
        }
        if self.sealed.set(self.index).is_err() {
            tracing::warn!("annotation index was sealed twice; keeping the first");
        }
        tracing::debug!(
            features = self.summary.features,
            scenarios = self.summary.scenarios,
            steps = self.summary.steps,
            "built suite tree"
        );
        SuiteTree {
            summary: self.summary,
            index: self.sealed,
        }
    }

    fn record_markers(&mut self, scope: Scope, suite: &Suite, annotations: &Annotations) {
        for marker in [Marker::Only, Marker::Pending] {
            if self.matcher.matches(annotations, marker) {
                self.index.mark(scope, marker, suite.id());
            }
        }
    }

    fn feature_suite(&mut self, root: &Rc<Suite>, feature: &Feature) {
        let suite = Suite::child(root, feature.title.as_str());
        root.push(Node::Suite(Rc::clone(&suite)));
        self.summary.features += 1;
        self.record_markers(Scope::Feature, &suite, &feature.annotations);
        for scenario in &feature.scenarios {
            self.scenario_suite(&suite, scenario);
        }
    }

    fn scenario_suite(&mut self, feature: &Rc<Suite>, scenario: &Scenario) {
        let suite =
            Suite::child_with_context(feature, scenario.title.as_str(), SharedContext::new());
        feature.push(Node::Suite(Rc::clone(&suite)));
        self.summary.scenarios += 1;
        self.record_markers(Scope::Scenario, &suite, &scenario.annotations);
        for step in &scenario.steps {
            self.step_test(&suite, step);
        }
    }

    fn step_test(&mut self, scenario: &Rc<Suite>, step: &str) {
        let index = Rc::clone(&self.sealed);
        let resolver = Rc::clone(&self.resolver);
        let text: Rc<str> = Rc::from(step);
        let test = Test::new(scenario, step, move |test: Rc<Test>| -> TestFuture {
            let index = Rc::clone(&index);
            let resolver = Rc::clone(&resolver);
            let text = Rc::clone(&text);
            async move { run_step(&index, resolver.as_ref(), &text, test).await }.boxed_local()
        });
        scenario.push(Node::Test(test));
        self.summary.steps += 1;
    }
}

impl fmt::Debug for SuiteTreeBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuiteTreeBuilder")
            .field("matcher", &self.matcher)
            .field("index", &self.index)
            .field("summary", &self.summary)
            .finish_non_exhaustive()
    }
}

async fn run_step(
    index: &OnceCell<AnnotationIndex>,
    resolver: &dyn StepResolver,
    text: &str,
    test: Rc<Test>,
) -> Result<(), TestError> {
    if let Some(reason) = test.skipped() {
        return Err(TestError::Skip { reason });
    }
    let scenario = test.parent().ok_or_else(|| TestError::Detached {
        name: test.name().to_owned(),
    })?;
    let index = index
        .get()
        .ok_or_else(|| TestError::failed("suite tree is still being built"))?;
    if let Some(reason) = resolve_skip(index, &scenario) {
        return Err(test.skip(reason.as_str()));
    }

    let ctx = StepContext::new(Rc::clone(&test));
    let (completion, settled) = Completion::channel();
    let ((), outcome) = futures::join!(resolver.run(text, &ctx, completion), settled);
    // The completion is the step's only outcome; an unclaimed deferred is dropped.
    if ctx.pending_completion().is_some() {
        tracing::debug!(step = text, "discarding unclaimed deferred completion");
    }
    outcome.map_err(TestError::from)
}
