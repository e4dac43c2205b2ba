//! Error types for loading features and running steps.
//!
//! Load-time errors abort the whole load before anything is registered with
//! the executor. Step errors are scoped to a single test and reach the
//! executor as ordinary failures, except [`StepError::Skipped`], which marks
//! the test skipped.

use std::path::PathBuf;

use bdd_suite_harness::{BoxError, TestError};
use thiserror::Error;

/// Errors that abort loading a test resource.
#[derive(Debug, Error)]
pub enum LoadError {
    /// An invalid configuration value was provided.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configured language could not be loaded.
    #[error(transparent)]
    Language(#[from] LanguageError),

    /// Listing feature files failed for a reason other than the resource
    /// being a plain file.
    #[error("failed to locate features under '{}': {source}", .path.display())]
    Locate {
        /// Resource path that was searched.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// A feature file could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A configured step module is not registered.
    #[error("step module '{name}' is not registered")]
    MissingStepModule {
        /// Name that failed to resolve.
        name: String,
    },

    /// A step module defined an invalid step.
    #[error(transparent)]
    Library(#[from] LibraryError),
}

/// Errors raised while loading a keyword table.
#[derive(Debug, Error)]
pub enum LanguageError {
    /// The selector is not a valid language identifier.
    #[error("invalid language identifier '{selector}'")]
    InvalidIdentifier {
        /// Selector as configured.
        selector: String,
    },

    /// No keyword table is bundled for the language.
    #[error("unsupported language '{selector}'")]
    Unsupported {
        /// Selector as configured.
        selector: String,
    },

    /// The keyword table lacks a required message.
    #[error("language '{language}' has no message '{message}'")]
    MissingMessage {
        /// Language identifier.
        language: String,
        /// Fluent message identifier.
        message: String,
    },

    /// A localised annotation keyword does not compile to a matcher.
    #[error("invalid annotation keyword '{keyword}': {source}")]
    InvalidKeyword {
        /// Localised keyword.
        keyword: String,
        /// Regex compilation error.
        source: regex::Error,
    },

    /// Loading the embedded Fluent resources failed.
    #[error("failed to load localisation resources: {0}")]
    Loader(#[from] i18n_embed::I18nEmbedError),
}

/// Errors raised while defining steps.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// A signature did not compile to a valid regular expression.
    #[error("invalid step signature '{signature}': {source}")]
    InvalidSignature {
        /// Signature after dictionary expansion.
        signature: String,
        /// Regex compilation error.
        source: regex::Error,
    },
}

/// A feature file could not be parsed.
#[derive(Debug, Error)]
#[error("failed to parse feature '{}': {message}", .path.display())]
pub struct ParseError {
    /// File that failed to parse.
    pub path: PathBuf,
    /// Parser diagnostic.
    pub message: String,
}

/// Outcome of a step that did not succeed.
///
/// # Examples
///
/// ```
/// use bdd_suite::StepError;
///
/// let error = StepError::from("balance mismatch");
/// assert_eq!(error.to_string(), "balance mismatch");
/// assert!(StepError::Skipped { reason: "later".into() }.is_skip());
/// ```
#[derive(Debug, Error)]
pub enum StepError {
    /// No definition matched the step text.
    #[error("undefined step: {text}")]
    Undefined {
        /// Step text.
        text: String,
    },

    /// More than one definition matched with equal specificity.
    #[error("ambiguous step '{text}' matches: {}", .signatures.join(", "))]
    Ambiguous {
        /// Step text.
        text: String,
        /// Signatures of the competing definitions.
        signatures: Vec<String>,
    },

    /// A captured argument could not be converted.
    #[error("argument {index}: {message}")]
    Argument {
        /// Zero-based capture index.
        index: usize,
        /// Conversion failure.
        message: String,
    },

    /// The step function panicked.
    #[error("step panicked: {0}")]
    Panicked(String),

    /// The completion handle was dropped without reporting.
    #[error("step finished without reporting completion")]
    Abandoned,

    /// The step asked to be skipped.
    #[error("skipped: {reason}")]
    Skipped {
        /// Visible skip cause.
        reason: String,
    },

    /// The step failed with an error value.
    #[error("{0}")]
    Failed(BoxError),

    /// The step failed with a message.
    #[error("{0}")]
    Message(String),
}

impl StepError {
    /// Wrap any error value as a step failure.
    #[must_use]
    pub fn failed(error: impl Into<BoxError>) -> Self {
        Self::Failed(error.into())
    }

    /// Return `true` for [`Skipped`](Self::Skipped).
    #[must_use]
    pub const fn is_skip(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

impl From<String> for StepError {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<&str> for StepError {
    fn from(message: &str) -> Self {
        Self::Message(message.to_owned())
    }
}

impl From<BoxError> for StepError {
    fn from(error: BoxError) -> Self {
        Self::Failed(error)
    }
}

impl From<StepError> for TestError {
    fn from(error: StepError) -> Self {
        match error {
            StepError::Skipped { reason } => Self::Skip { reason },
            StepError::Failed(source) => Self::Failed(source),
            other => Self::Failed(Box::new(other)),
        }
    }
}
