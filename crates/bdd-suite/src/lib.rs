//! Bridge between Gherkin feature files and the `bdd-suite-harness` test
//! framework.
//!
//! A [`Loader`] parses the feature files of a test resource and queues a
//! registration hook on an [`Executor`](bdd_suite_harness::Executor). When
//! the run starts, the [`SuiteTreeBuilder`] turns every feature into a suite,
//! every scenario into a nested suite with its own shared context, and every
//! step into a test. Step tests check [`resolve_skip`] against the sealed
//! [`AnnotationIndex`] before resolving their text in a [`Library`] and
//! running the matching [`StepFn`].
//!
//! Annotations named `only` and `pending` (localised for the active
//! [`Language`]) select what runs:
//!
//! - any feature marked `only` skips every scenario of unmarked features;
//! - a feature marked `pending` skips all its scenarios;
//! - any scenario marked `only` skips the unmarked scenarios;
//! - a scenario marked `pending` is skipped.

pub use inventory;

mod annotations;
mod builder;
mod config;
mod context;
mod dictionary;
mod error;
mod feature;
mod index;
mod language;
mod library;
mod loader;
mod locator;
mod logging;
mod modules;
mod skip;
mod step;

pub use annotations::{AnnotationMatcher, Annotations, has_annotation};
pub use builder::{BuildSummary, SuiteTree, SuiteTreeBuilder};
pub use config::{
    DEFAULT_STEP_MODULE, ENV_BASE_DIR, ENV_LANG, ENV_LOG_LEVEL, ENV_STEPS, LoaderConfig, LogLevel,
};
pub use context::StepContext;
pub use dictionary::{ANY_TEXT, Dictionary};
pub use error::{LanguageError, LibraryError, LoadError, ParseError, StepError};
pub use feature::{Feature, FeatureParser, GherkinParser, Scenario};
pub use index::{AnnotationIndex, Marker, Scope};
pub use language::{DEFAULT_LANGUAGE, Language, StepKeywords, StepKind};
pub use library::{Library, Resolved, StepResolver};
pub use loader::{LoadSummary, Loader};
pub use locator::locate_features;
pub use logging::init_logging;
pub use modules::{RegisterFn, StepModule, find_step_module, step_module_names};
pub use skip::{SkipReason, resolve_skip};
pub use step::{Completion, Settled, StepArgs, StepFn, StepOutcome, StepReturn};
