//! Annotations on features and scenarios and the predicate that reads them.

use regex::{Regex, RegexBuilder};

use crate::error::LanguageError;
use crate::index::Marker;
use crate::language::Language;

/// Ordered annotation names and values taken from tags.
///
/// `@name` produces an entry with an empty value; `@name=value` keeps the
/// value. Names keep the case they were written in.
///
/// # Examples
///
/// ```
/// use bdd_suite::Annotations;
///
/// let annotations = Annotations::from_tags(["@only", "@owner=payments"]);
/// assert_eq!(annotations.get("owner"), Some("payments"));
/// assert_eq!(annotations.get("only"), Some(""));
/// assert_eq!(annotations.len(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Annotations {
    entries: Vec<(String, String)>,
}

impl Annotations {
    /// Parse Gherkin tags, with or without the leading `@`.
    #[must_use]
    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut annotations = Self::default();
        for tag in tags {
            let tag = tag.as_ref().trim().trim_start_matches('@');
            if tag.is_empty() {
                continue;
            }
            match tag.split_once('=') {
                Some((name, value)) => annotations.insert(name.trim(), value.trim()),
                None => annotations.insert(tag, ""),
            }
        }
        annotations
    }

    /// Set `name` to `value`, replacing an entry with the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Copy every entry of `other` into `self`.
    pub fn merge(&mut self, other: &Self) {
        for (name, value) in &other.entries {
            self.insert(name.clone(), value.clone());
        }
    }

    /// Value stored under exactly `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Annotation names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Number of annotations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` when there are no annotations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Annotations {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut annotations = Self::default();
        for (name, value) in iter {
            annotations.insert(name, value);
        }
        annotations
    }
}

fn keyword_matcher(keyword: &str) -> Result<Regex, LanguageError> {
    RegexBuilder::new(&format!("^{}$", regex::escape(keyword)))
        .case_insensitive(true)
        .build()
        .map_err(|source| LanguageError::InvalidKeyword {
            keyword: keyword.to_owned(),
            source,
        })
}

fn any_name_matches(annotations: &Annotations, matcher: &Regex) -> bool {
    annotations.names().any(|name| matcher.is_match(name))
}

/// Return `true` when some annotation name equals the localised form of
/// `name`, ignoring case.
///
/// The comparison is a full match: with English keywords `ONLY` matches
/// `only` but `onlyish` does not.
///
/// # Errors
///
/// Returns an error when the language has no keyword for `name`.
pub fn has_annotation(
    language: &Language,
    annotations: &Annotations,
    name: &str,
) -> Result<bool, LanguageError> {
    let matcher = keyword_matcher(&language.localise(name)?)?;
    Ok(any_name_matches(annotations, &matcher))
}

/// Precompiled `only`/`pending` predicates for one language.
#[derive(Clone, Debug)]
pub struct AnnotationMatcher {
    only: Regex,
    pending: Regex,
}

impl AnnotationMatcher {
    /// Compile the predicates for `language`.
    ///
    /// # Errors
    ///
    /// Returns an error when either keyword is missing from the language.
    pub fn for_language(language: &Language) -> Result<Self, LanguageError> {
        Self::from_keywords(
            &language.localise(Marker::Only.annotation_name())?,
            &language.localise(Marker::Pending.annotation_name())?,
        )
    }

    /// Compile the predicates from literal keywords.
    ///
    /// # Errors
    ///
    /// Returns [`LanguageError::InvalidKeyword`] when a keyword cannot be
    /// compiled.
    pub fn from_keywords(only: &str, pending: &str) -> Result<Self, LanguageError> {
        Ok(Self {
            only: keyword_matcher(only)?,
            pending: keyword_matcher(pending)?,
        })
    }

    /// Return `true` when `annotations` carry `marker`.
    #[must_use]
    pub fn matches(&self, annotations: &Annotations, marker: Marker) -> bool {
        let matcher = match marker {
            Marker::Only => &self.only,
            Marker::Pending => &self.pending,
        };
        any_name_matches(annotations, matcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn english() -> Language {
        let Ok(language) = Language::load("default") else {
            panic!("default language should load");
        };
        language
    }

    #[rstest]
    #[case::exact(&["@only"], true)]
    #[case::upper(&["@ONLY"], true)]
    #[case::mixed(&["@OnLy=yes"], true)]
    #[case::prefix(&["@onlyish"], false)]
    #[case::suffix(&["@not_only"], false)]
    #[case::among_others(&["@slow", "@Only"], true)]
    #[case::none(&[], false)]
    fn only_is_a_full_case_insensitive_match(
        english: Language,
        #[case] tags: &[&str],
        #[case] expected: bool,
    ) {
        let annotations = Annotations::from_tags(tags.iter().copied());
        assert_eq!(has_annotation(&english, &annotations, "only").ok(), Some(expected));
    }

    #[rstest]
    fn matcher_agrees_with_ad_hoc_predicate(english: Language) {
        let Ok(matcher) = AnnotationMatcher::for_language(&english) else {
            panic!("matcher should compile");
        };
        let annotations = Annotations::from_tags(["@Pending"]);
        assert!(matcher.matches(&annotations, Marker::Pending));
        assert!(!matcher.matches(&annotations, Marker::Only));
        assert_eq!(
            has_annotation(&english, &annotations, "pending").ok(),
            Some(true)
        );
    }

    #[test]
    fn localised_keywords_replace_english_ones() {
        let Ok(french) = Language::load("fr") else {
            panic!("French should load");
        };
        let annotations = Annotations::from_tags(["@Seulement"]);
        assert_eq!(has_annotation(&french, &annotations, "only").ok(), Some(true));
        let english_tag = Annotations::from_tags(["@only"]);
        assert_eq!(has_annotation(&french, &english_tag, "only").ok(), Some(false));
    }

    #[test]
    fn keywords_are_matched_literally() {
        let Ok(matcher) = AnnotationMatcher::from_keywords("o.ly", "pending") else {
            panic!("escaped keyword should compile");
        };
        let annotations = Annotations::from_tags(["@only"]);
        assert!(!matcher.matches(&annotations, Marker::Only));
    }

    #[test]
    fn later_tags_replace_earlier_values() {
        let mut annotations = Annotations::from_tags(["@owner=a"]);
        annotations.merge(&Annotations::from_tags(["@owner=b", "@slow"]));
        assert_eq!(annotations.get("owner"), Some("b"));
        assert_eq!(annotations.names().collect::<Vec<_>>(), ["owner", "slow"]);
    }
}
