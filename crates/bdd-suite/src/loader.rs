//! Loads a test resource into an [`Executor`].
//!
//! Everything that can fail happens before the executor is touched: the
//! language is loaded, features are located and parsed, and the step library
//! is assembled from the configured modules. Only then is a registration hook
//! queued that builds the suite tree when the run starts.

use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use bdd_suite_harness::Executor;

use crate::annotations::AnnotationMatcher;
use crate::builder::SuiteTreeBuilder;
use crate::config::LoaderConfig;
use crate::error::LoadError;
use crate::feature::{Feature, FeatureParser, GherkinParser};
use crate::language::Language;
use crate::library::{Library, StepResolver};
use crate::locator::locate_features;
use crate::modules::{StepModule, find_step_module};

/// Counts of what a load registered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Feature files parsed.
    pub files: usize,
    /// Features found.
    pub features: usize,
    /// Scenarios found, after outline expansion.
    pub scenarios: usize,
    /// Steps found.
    pub steps: usize,
}

impl LoadSummary {
    fn of(files: usize, features: &[Feature]) -> Self {
        Self {
            files,
            features: features.len(),
            scenarios: features.iter().map(|feature| feature.scenarios.len()).sum(),
            steps: features.iter().map(Feature::step_count).sum(),
        }
    }
}

/// Loads feature files and step modules into an executor.
///
/// # Examples
///
/// ```no_run
/// use bdd_suite::{Loader, LoaderConfig};
/// use bdd_suite_harness::{Executor, ExecutorConfig};
///
/// let loader = Loader::new(LoaderConfig::default().with_base_dir("tests"));
/// let mut executor = Executor::new(ExecutorConfig::default());
/// let summary = loader.load("features", &mut executor)?;
/// assert!(summary.features > 0);
/// let report = executor.run()?;
/// assert!(report.is_success());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Loader {
    config: LoaderConfig,
    modules: Vec<&'static StepModule>,
    parser: Option<Box<dyn FeatureParser>>,
}

impl Loader {
    /// Loader using `config`.
    #[must_use]
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            config,
            modules: Vec::new(),
            parser: None,
        }
    }

    /// Make `module` resolvable by name in addition to the link-time
    /// registry. Added modules take precedence.
    #[must_use]
    pub fn with_module(mut self, module: &'static StepModule) -> Self {
        self.modules.push(module);
        self
    }

    /// Replace the Gherkin parser used for every file.
    #[must_use]
    pub fn with_parser(mut self, parser: impl FeatureParser + 'static) -> Self {
        self.parser = Some(Box::new(parser));
        self
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Load `resource_id`, relative to the configured base directory, and
    /// queue its suite tree on `executor`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] when the configuration is invalid, the language
    /// is unsupported, the resource cannot be listed, a feature fails to
    /// parse, a step module is missing, or a step signature is invalid. The
    /// executor is unchanged in every error case.
    pub fn load(
        &self,
        resource_id: &str,
        executor: &mut Executor,
    ) -> Result<LoadSummary, LoadError> {
        self.config.validate()?;
        let language = Language::load(&self.config.lang)?;
        let matcher = AnnotationMatcher::for_language(&language)?;

        let resource = self.config.base_dir.join(resource_id);
        let files = locate(&resource)?;
        let features = self.parse_all(&language, &files)?;
        let library = self.library(&language)?;

        let summary = LoadSummary::of(files.len(), &features);
        tracing::info!(
            resource = %resource.display(),
            language = %language.id(),
            files = summary.files,
            features = summary.features,
            scenarios = summary.scenarios,
            steps = summary.steps,
            "loaded test resource"
        );

        let resolver: Rc<dyn StepResolver> = Rc::new(library);
        executor.register(move |root| {
            let tree = SuiteTreeBuilder::new(matcher, resolver).build(&features, root);
            tracing::debug!(summary = ?tree.summary(), "registered suite tree");
        });
        Ok(summary)
    }

    fn parse_all(
        &self,
        language: &Language,
        files: &[PathBuf],
    ) -> Result<Vec<Feature>, LoadError> {
        let gherkin = GherkinParser::for_language(language);
        let parser: &dyn FeatureParser = self.parser.as_deref().unwrap_or(&gherkin);
        let mut features = Vec::new();
        for file in files {
            tracing::debug!(file = %file.display(), "parsing feature file");
            features.extend(parser.parse(file)?);
        }
        Ok(features)
    }

    fn library(&self, language: &Language) -> Result<Library, LoadError> {
        let mut library = Library::with_keywords(language.step_keywords()?);
        for name in &self.config.steps {
            let module = self
                .find_module(name)
                .ok_or_else(|| LoadError::MissingStepModule { name: name.clone() })?;
            module.register(&mut library)?;
            tracing::debug!(
                module = name.as_str(),
                definitions = library.len(),
                "registered step module"
            );
        }
        Ok(library)
    }

    fn find_module(&self, name: &str) -> Option<&'static StepModule> {
        self.modules
            .iter()
            .copied()
            .find(|module| module.name() == name)
            .or_else(|| find_step_module(name))
    }
}

fn locate(resource: &Path) -> Result<Vec<PathBuf>, LoadError> {
    locate_features(resource).map_err(|source| LoadError::Locate {
        path: resource.to_path_buf(),
        source,
    })
}

impl Default for Loader {
    fn default() -> Self {
        Self::new(LoaderConfig::default())
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modules: Vec<_> = self.modules.iter().map(|module| module.name()).collect();
        f.debug_struct("Loader")
            .field("config", &self.config)
            .field("modules", &modules)
            .field("custom_parser", &self.parser.is_some())
            .finish()
    }
}
