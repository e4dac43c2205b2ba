//! Named sub-patterns that step signatures can reference as `$term`.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static TERM: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)"));

/// Pattern used for terms that have no definition.
pub const ANY_TEXT: &str = ".+";

/// Term definitions used to expand step signatures.
///
/// # Examples
///
/// ```
/// use bdd_suite::Dictionary;
///
/// let mut dictionary = Dictionary::default();
/// dictionary.define("count", r"\d+");
///
/// assert_eq!(dictionary.expand("I have $count $fruit"), r"I have (\d+) (.+)");
/// ```
#[derive(Clone, Debug, Default)]
pub struct Dictionary {
    terms: HashMap<String, String>,
}

impl Dictionary {
    /// Define `term` as the regular expression `pattern`.
    ///
    /// Redefining a term replaces its pattern.
    pub fn define(&mut self, term: impl Into<String>, pattern: impl Into<String>) -> &mut Self {
        self.terms.insert(term.into(), pattern.into());
        self
    }

    /// Pattern defined for `term`.
    #[must_use]
    pub fn pattern(&self, term: &str) -> Option<&str> {
        self.terms.get(term).map(String::as_str)
    }

    /// Replace each `$term` in `signature` with a capture group holding its
    /// pattern, or [`ANY_TEXT`] when the term is undefined.
    #[must_use]
    pub fn expand(&self, signature: &str) -> String {
        let Ok(term) = TERM.as_ref() else {
            return signature.to_owned();
        };
        term.replace_all(signature, |caps: &Captures<'_>| {
            let pattern = caps
                .get(1)
                .and_then(|name| self.pattern(name.as_str()))
                .unwrap_or(ANY_TEXT);
            format!("({pattern})")
        })
        .into_owned()
    }
}
