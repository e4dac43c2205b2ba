//! Loader configuration.
//!
//! Configuration is read once per load. It can be deserialised from the host
//! framework's configuration and overridden from environment variables
//! prefixed with `BDD_SUITE_`.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

use crate::error::LoadError;
use crate::language::DEFAULT_LANGUAGE;

/// Step module loaded when none is configured.
pub const DEFAULT_STEP_MODULE: &str = "steps";

/// Environment variable selecting the language.
pub const ENV_LANG: &str = "BDD_SUITE_LANG";
/// Environment variable listing step modules, comma separated.
pub const ENV_STEPS: &str = "BDD_SUITE_STEPS";
/// Environment variable setting the base directory for resources.
pub const ENV_BASE_DIR: &str = "BDD_SUITE_BASE_DIR";
/// Environment variable setting the log level.
pub const ENV_LOG_LEVEL: &str = "BDD_SUITE_LOG_LEVEL";

/// Verbosity of the loader and executor logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Every span and event.
    Trace,
    /// Step resolution and per-test outcomes.
    Debug,
    /// One summary per load and per run.
    #[default]
    Info,
    /// Failed tests.
    Warn,
    /// Errors only.
    Error,
}

impl LogLevel {
    const ALL: [Self; 5] = [Self::Trace, Self::Debug, Self::Info, Self::Warn, Self::Error];

    /// Lowercase name, also used as the filter directive.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|level| level.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                LoadError::InvalidConfig(format!(
                    "{ENV_LOG_LEVEL} must be trace, debug, info, warn or error; got '{wanted}'"
                ))
            })
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(module) => vec![module],
        OneOrMany::Many(modules) => modules,
    })
}

fn split_modules(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|module| !module.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Settings for [`Loader`](crate::Loader).
///
/// # Environment Variables
///
/// - `BDD_SUITE_LANG`: language selector (`default`, `fr`, ...)
/// - `BDD_SUITE_STEPS`: comma-separated step module names
/// - `BDD_SUITE_BASE_DIR`: directory resource identifiers are resolved against
/// - `BDD_SUITE_LOG_LEVEL`: trace, debug, info, warn, or error
///
/// # Examples
///
/// ```
/// use bdd_suite::{LoaderConfig, LogLevel};
///
/// let config = LoaderConfig::default();
/// assert_eq!(config.lang, "default");
/// assert_eq!(config.steps, ["steps"]);
/// assert_eq!(config.log_level, LogLevel::Info);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// Language selector.
    pub lang: String,
    /// Step modules to register, in order.
    #[serde(deserialize_with = "one_or_many")]
    pub steps: Vec<String>,
    /// Directory that resource identifiers are resolved against.
    pub base_dir: PathBuf,
    /// Log level used by [`init_logging`](crate::init_logging).
    pub log_level: LogLevel,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            lang: DEFAULT_LANGUAGE.to_owned(),
            steps: vec![DEFAULT_STEP_MODULE.to_owned()],
            base_dir: PathBuf::from("."),
            log_level: LogLevel::default(),
        }
    }
}

impl LoaderConfig {
    /// Defaults overridden by the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::InvalidConfig`] when a variable holds an invalid
    /// value.
    pub fn from_env() -> Result<Self, LoadError> {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides looked up by variable name.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::InvalidConfig`] when an override is invalid.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, LoadError> {
        if let Some(lang) = lookup(ENV_LANG) {
            self.lang = lang.trim().to_owned();
        }
        if let Some(steps) = lookup(ENV_STEPS) {
            self.steps = split_modules(&steps);
        }
        if let Some(base_dir) = lookup(ENV_BASE_DIR) {
            self.base_dir = PathBuf::from(base_dir);
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = level.parse()?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check that every field holds a usable value.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::InvalidConfig`] for an empty language selector or
    /// an empty or blank step module list.
    pub fn validate(&self) -> Result<(), LoadError> {
        if self.lang.trim().is_empty() {
            return Err(LoadError::InvalidConfig(
                "language selector must not be empty".to_owned(),
            ));
        }
        if self.steps.is_empty() {
            return Err(LoadError::InvalidConfig(
                "at least one step module is required".to_owned(),
            ));
        }
        if self.steps.iter().any(|module| module.trim().is_empty()) {
            return Err(LoadError::InvalidConfig(
                "step module names must not be blank".to_owned(),
            ));
        }
        Ok(())
    }

    /// Replace the language selector.
    #[must_use]
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    /// Replace the step module list.
    #[must_use]
    pub fn with_steps<I, S>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.steps = steps.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the base directory.
    #[must_use]
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Replace the log level.
    #[must_use]
    pub const fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }
}
