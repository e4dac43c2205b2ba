//! Keyword tables for annotations and step prefixes.
//!
//! Each bundled language ships a Fluent file under `i18n/<lang>/` that is
//! embedded into the crate at build time. Annotation keywords live under
//! `annotation-<name>`; step keyword alternatives live under `step-given`,
//! `step-when`, `step-then`, and `step-conjunction` and are separated by `|`.

use std::fmt;

use i18n_embed::fluent::{FluentLanguageLoader, fluent_language_loader};
use rust_embed::RustEmbed;
use unic_langid::{LanguageIdentifier, langid};

use crate::error::LanguageError;

/// Selector that maps to the built-in default language.
pub const DEFAULT_LANGUAGE: &str = "default";

#[derive(RustEmbed)]
#[folder = "i18n"]
pub(crate) struct Localisations;

/// Kind of step keyword.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepKind {
    /// Context-setting steps.
    Given,
    /// Action steps.
    When,
    /// Outcome steps.
    Then,
}

/// Keyword alternatives for every step kind in one language.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepKeywords {
    given: Vec<String>,
    when: Vec<String>,
    then: Vec<String>,
    conjunction: Vec<String>,
}

impl StepKeywords {
    /// Build a table from explicit alternatives.
    #[must_use]
    pub fn new(
        given: Vec<String>,
        when: Vec<String>,
        then: Vec<String>,
        conjunction: Vec<String>,
    ) -> Self {
        Self {
            given,
            when,
            then,
            conjunction,
        }
    }

    /// English keywords.
    #[must_use]
    pub fn english() -> Self {
        let words = |list: &[&str]| list.iter().map(|word| (*word).to_owned()).collect();
        Self::new(
            words(&["Given"]),
            words(&["When"]),
            words(&["Then"]),
            words(&["And", "But"]),
        )
    }

    /// Keywords accepted for `kind`, conjunctions included.
    #[must_use]
    pub fn alternatives(&self, kind: StepKind) -> Vec<&str> {
        let primary = match kind {
            StepKind::Given => &self.given,
            StepKind::When => &self.when,
            StepKind::Then => &self.then,
        };
        primary
            .iter()
            .chain(&self.conjunction)
            .map(String::as_str)
            .collect()
    }
}

impl Default for StepKeywords {
    fn default() -> Self {
        Self::english()
    }
}

/// A loaded keyword table.
///
/// # Examples
///
/// ```
/// use bdd_suite::Language;
///
/// let language = Language::load("default")?;
/// assert_eq!(language.localise("only")?, "only");
/// assert_eq!(language.gherkin_code(), "en");
///
/// let french = Language::load("fr")?;
/// assert_eq!(french.localise("pending")?, "brouillon");
/// # Ok::<(), bdd_suite::LanguageError>(())
/// ```
pub struct Language {
    id: LanguageIdentifier,
    loader: FluentLanguageLoader,
}

impl Language {
    /// Load the table for `selector`.
    ///
    /// `"default"` selects `en-US`; anything else is parsed as a BCP-47
    /// language identifier.
    ///
    /// # Errors
    ///
    /// Returns [`LanguageError::InvalidIdentifier`] for malformed selectors,
    /// [`LanguageError::Unsupported`] when no bundled table matches the
    /// language, and [`LanguageError::Loader`] when the embedded resources
    /// cannot be read.
    pub fn load(selector: &str) -> Result<Self, LanguageError> {
        let id: LanguageIdentifier = if selector.eq_ignore_ascii_case(DEFAULT_LANGUAGE) {
            langid!("en-US")
        } else {
            selector
                .parse()
                .map_err(|_| LanguageError::InvalidIdentifier {
                    selector: selector.to_owned(),
                })?
        };
        let loader = fluent_language_loader!();
        loader.set_use_isolating(false);
        let selected = i18n_embed::select(&loader, &Localisations, &[id.clone()])?;
        if !selected
            .iter()
            .any(|candidate| candidate.language == id.language)
        {
            return Err(LanguageError::Unsupported {
                selector: selector.to_owned(),
            });
        }
        tracing::debug!(language = %id, "loaded keyword table");
        Ok(Self { id, loader })
    }

    /// Language identifier.
    #[must_use]
    pub fn id(&self) -> &LanguageIdentifier {
        &self.id
    }

    /// Gherkin dialect code, e.g. `"en"` or `"fr"`.
    #[must_use]
    pub fn gherkin_code(&self) -> String {
        self.id.language.as_str().to_owned()
    }

    /// Localised keyword for the annotation `name`.
    ///
    /// # Errors
    ///
    /// Returns [`LanguageError::MissingMessage`] when the table has no
    /// `annotation-<name>` message.
    pub fn localise(&self, name: &str) -> Result<String, LanguageError> {
        self.message(&format!("annotation-{name}"))
    }

    /// Step keyword alternatives.
    ///
    /// # Errors
    ///
    /// Returns [`LanguageError::MissingMessage`] when any step message is
    /// absent.
    pub fn step_keywords(&self) -> Result<StepKeywords, LanguageError> {
        Ok(StepKeywords::new(
            self.alternatives("step-given")?,
            self.alternatives("step-when")?,
            self.alternatives("step-then")?,
            self.alternatives("step-conjunction")?,
        ))
    }

    fn alternatives(&self, message: &str) -> Result<Vec<String>, LanguageError> {
        Ok(self
            .message(message)?
            .split('|')
            .map(str::trim)
            .filter(|word| !word.is_empty())
            .map(str::to_owned)
            .collect())
    }

    fn message(&self, message: &str) -> Result<String, LanguageError> {
        if !self.loader.has(message) {
            return Err(LanguageError::MissingMessage {
                language: self.id.to_string(),
                message: message.to_owned(),
            });
        }
        Ok(self.loader.get(message))
    }
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Language")
            .field("id", &self.id.to_string())
            .finish_non_exhaustive()
    }
}
