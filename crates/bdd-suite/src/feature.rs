//! Parsed features and the parser that produces them.
//!
//! The suite tree only needs titles, annotations and step texts, so Gherkin
//! documents are flattened on the way in: backgrounds are prepended to the
//! scenarios they govern, rule scenarios are lifted to the feature, and
//! scenario outlines become one scenario per examples row.

use std::path::Path;

use gherkin::GherkinEnv;

use crate::annotations::Annotations;
use crate::error::ParseError;
use crate::language::Language;

/// A parsed feature.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Feature {
    /// Feature title.
    pub title: String,
    /// Annotations taken from the feature's tags.
    pub annotations: Annotations,
    /// Scenarios in document order.
    pub scenarios: Vec<Scenario>,
}

impl Feature {
    /// Create a feature without annotations or scenarios.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Replace the annotations.
    #[must_use]
    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }

    /// Append a scenario.
    #[must_use]
    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }

    /// Total number of steps across all scenarios.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.scenarios.iter().map(|scenario| scenario.steps.len()).sum()
    }
}

/// A parsed scenario: a title, annotations and step texts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Scenario {
    /// Scenario title.
    pub title: String,
    /// Annotations taken from the scenario's tags.
    pub annotations: Annotations,
    /// Step texts including their keyword, e.g. `"Given a user"`.
    pub steps: Vec<String>,
}

impl Scenario {
    /// Create a scenario without annotations or steps.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Replace the annotations.
    #[must_use]
    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }

    /// Append a step.
    #[must_use]
    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.steps.push(step.into());
        self
    }
}

/// Source of parsed features.
pub trait FeatureParser {
    /// Parse the features contained in `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] when the file cannot be read or parsed.
    fn parse(&self, path: &Path) -> Result<Vec<Feature>, ParseError>;
}

/// [`FeatureParser`] backed by the `gherkin` crate.
#[derive(Clone, Debug)]
pub struct GherkinParser {
    dialect: String,
}

impl GherkinParser {
    /// Parser for the Gherkin dialect `dialect`, e.g. `"en"`.
    #[must_use]
    pub fn new(dialect: impl Into<String>) -> Self {
        Self {
            dialect: dialect.into(),
        }
    }

    /// Parser for the dialect of `language`.
    #[must_use]
    pub fn for_language(language: &Language) -> Self {
        Self::new(language.gherkin_code())
    }
}

impl Default for GherkinParser {
    fn default() -> Self {
        Self::new("en")
    }
}

impl FeatureParser for GherkinParser {
    fn parse(&self, path: &Path) -> Result<Vec<Feature>, ParseError> {
        let fail = |message: String| ParseError {
            path: path.to_path_buf(),
            message,
        };
        let env = GherkinEnv::new(&self.dialect).map_err(|err| fail(err.to_string()))?;
        let document =
            gherkin::Feature::parse_path(path, env).map_err(|err| fail(err.to_string()))?;
        tracing::debug!(path = %path.display(), "parsed feature file");
        Ok(vec![flatten_feature(&document)])
    }
}

fn step_texts(steps: &[gherkin::Step]) -> Vec<String> {
    steps
        .iter()
        .map(|step| format!("{} {}", step.keyword.trim(), step.value.trim()))
        .collect()
}

fn background_steps(background: Option<&gherkin::Background>) -> Vec<String> {
    background.map_or_else(Vec::new, |background| step_texts(&background.steps))
}

fn flatten_feature(document: &gherkin::Feature) -> Feature {
    let mut feature = Feature::new(document.name.trim())
        .with_annotations(Annotations::from_tags(&document.tags));
    let background = background_steps(document.background.as_ref());
    let inherited = Annotations::default();
    for scenario in &document.scenarios {
        feature
            .scenarios
            .extend(flatten_scenario(scenario, &background, &inherited));
    }
    for rule in &document.rules {
        let mut rule_background = background.clone();
        rule_background.extend(background_steps(rule.background.as_ref()));
        let rule_annotations = Annotations::from_tags(&rule.tags);
        for scenario in &rule.scenarios {
            feature.scenarios.extend(flatten_scenario(
                scenario,
                &rule_background,
                &rule_annotations,
            ));
        }
    }
    feature
}

fn flatten_scenario(
    scenario: &gherkin::Scenario,
    background: &[String],
    inherited: &Annotations,
) -> Vec<Scenario> {
    let mut annotations = inherited.clone();
    annotations.merge(&Annotations::from_tags(&scenario.tags));
    let mut steps = background.to_vec();
    steps.extend(step_texts(&scenario.steps));
    let title = scenario.name.trim();

    let tables: Vec<_> = scenario
        .examples
        .iter()
        .filter_map(|examples| examples.table.as_ref().map(|table| (examples, table)))
        .collect();
    if tables.is_empty() {
        return vec![Scenario {
            title: title.to_owned(),
            annotations,
            steps,
        }];
    }

    let mut expanded = Vec::new();
    for (examples, table) in tables {
        let Some((header, rows)) = table.rows.split_first() else {
            continue;
        };
        let mut row_annotations = annotations.clone();
        row_annotations.merge(&Annotations::from_tags(&examples.tags));
        for row in rows {
            let ordinal = expanded.len() + 1;
            let substitute = |text: &str| substitute_placeholders(text, header, row);
            let row_title = substitute(title);
            expanded.push(Scenario {
                title: if row_title == title {
                    format!("{title} (example {ordinal})")
                } else {
                    row_title
                },
                annotations: row_annotations.clone(),
                steps: steps.iter().map(|step| substitute(step.as_str())).collect(),
            });
        }
    }
    expanded
}

fn substitute_placeholders(text: &str, header: &[String], row: &[String]) -> String {
    header
        .iter()
        .zip(row)
        .fold(text.to_owned(), |acc, (column, value)| {
            acc.replace(&format!("<{column}>"), value)
        })
}
