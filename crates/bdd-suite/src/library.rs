//! Step definitions and resolution of step text against them.

use futures::FutureExt as _;
use futures::future::{self, LocalBoxFuture};
use regex::Regex;

use crate::context::StepContext;
use crate::dictionary::Dictionary;
use crate::error::{LibraryError, StepError};
use crate::language::{StepKeywords, StepKind};
use crate::step::{Completion, StepArgs, StepFn};

/// Runs step text against a set of definitions.
///
/// Implementations report every outcome, including a failure to resolve the
/// text, through `completion`; they never fail out of band.
pub trait StepResolver {
    /// Resolve `text` and run the matching step.
    fn run(
        &self,
        text: &str,
        ctx: &StepContext,
        completion: Completion,
    ) -> LocalBoxFuture<'static, ()>;
}

#[derive(Debug)]
struct Definition {
    signature: String,
    pattern: Regex,
    step: StepFn,
}

/// A definition matched against step text.
#[derive(Debug)]
pub struct Resolved<'a> {
    /// Signature of the matching definition.
    pub signature: &'a str,
    /// Step implementation.
    pub step: &'a StepFn,
    /// Captured arguments.
    pub args: StepArgs,
}

/// Ordered collection of step definitions.
///
/// # Examples
///
/// ```
/// use bdd_suite::{Library, StepArgs, StepContext, StepFn};
///
/// let mut library = Library::default();
/// library.dictionary_mut().define("count", r"\d+");
/// library
///     .given("there are $count apples", StepFn::managed(|_: &StepContext, _: &StepArgs| ()))?
///     .define(&["I eat (\\d+)"], StepFn::managed(|_: &StepContext, _: &StepArgs| ()))?;
///
/// let resolved = library.resolve("Given there are 12 apples")?;
/// assert_eq!(resolved.args.get(0), Some("12"));
/// assert!(library.resolve("I eat 3").is_ok());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Default)]
pub struct Library {
    keywords: StepKeywords,
    dictionary: Dictionary,
    definitions: Vec<Definition>,
}

impl Library {
    /// Library whose keyword helpers use `keywords`.
    #[must_use]
    pub fn with_keywords(keywords: StepKeywords) -> Self {
        Self {
            keywords,
            ..Self::default()
        }
    }

    /// Term definitions used to expand signatures.
    #[must_use]
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Mutable access to the term definitions.
    ///
    /// Terms only affect signatures defined afterwards.
    pub fn dictionary_mut(&mut self) -> &mut Dictionary {
        &mut self.dictionary
    }

    /// Number of compiled signatures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Return `true` when nothing is defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Define `step` under every signature in `signatures`.
    ///
    /// Signatures are regular expressions matched against the whole step
    /// text after `$term` expansion.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::InvalidSignature`] when a signature does not
    /// compile; earlier signatures in the same call stay defined.
    pub fn define<S: AsRef<str>>(
        &mut self,
        signatures: &[S],
        step: StepFn,
    ) -> Result<&mut Self, LibraryError> {
        for signature in signatures {
            let expanded = self.dictionary.expand(signature.as_ref());
            self.compile(signature.as_ref(), &expanded, step.clone())?;
        }
        Ok(self)
    }

    /// Define a step that must start with a Given keyword or a conjunction.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::InvalidSignature`] when the signature does not
    /// compile.
    pub fn given(&mut self, signature: &str, step: StepFn) -> Result<&mut Self, LibraryError> {
        self.define_keyword(StepKind::Given, signature, step)
    }

    /// Define a step that must start with a When keyword or a conjunction.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::InvalidSignature`] when the signature does not
    /// compile.
    pub fn when(&mut self, signature: &str, step: StepFn) -> Result<&mut Self, LibraryError> {
        self.define_keyword(StepKind::When, signature, step)
    }

    /// Define a step that must start with a Then keyword or a conjunction.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::InvalidSignature`] when the signature does not
    /// compile.
    pub fn then(&mut self, signature: &str, step: StepFn) -> Result<&mut Self, LibraryError> {
        self.define_keyword(StepKind::Then, signature, step)
    }

    fn define_keyword(
        &mut self,
        kind: StepKind,
        signature: &str,
        step: StepFn,
    ) -> Result<&mut Self, LibraryError> {
        let keywords: Vec<_> = self
            .keywords
            .alternatives(kind)
            .into_iter()
            .map(regex::escape)
            .collect();
        let expanded = format!(
            r"(?i:{})\s+{}",
            keywords.join("|"),
            self.dictionary.expand(signature)
        );
        self.compile(signature, &expanded, step)?;
        Ok(self)
    }

    fn compile(&mut self, signature: &str, expanded: &str, step: StepFn) -> Result<(), LibraryError> {
        let pattern = Regex::new(&format!("^(?:{expanded})$")).map_err(|source| {
            LibraryError::InvalidSignature {
                signature: expanded.to_owned(),
                source,
            }
        })?;
        self.definitions.push(Definition {
            signature: signature.to_owned(),
            pattern,
            step,
        });
        Ok(())
    }

    /// Find the definition matching `text`.
    ///
    /// When several definitions match, the one consuming the fewest
    /// characters through captures wins.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Undefined`] when nothing matches and
    /// [`StepError::Ambiguous`] when the best matches tie.
    pub fn resolve(&self, text: &str) -> Result<Resolved<'_>, StepError> {
        let mut best: Vec<(&Definition, StepArgs)> = Vec::new();
        let mut best_score = 0;
        for definition in &self.definitions {
            let Some(captures) = definition.pattern.captures(text) else {
                continue;
            };
            let values: Vec<String> = captures
                .iter()
                .skip(1)
                .map(|group| group.map_or_else(String::new, |m| m.as_str().to_owned()))
                .collect();
            let captured: usize = values.iter().map(String::len).sum();
            let score = text.len().saturating_sub(captured);
            if best.is_empty() || score > best_score {
                best.clear();
                best_score = score;
            } else if score < best_score {
                continue;
            }
            best.push((definition, StepArgs::new(values)));
        }

        let mut best = best.into_iter();
        let Some((definition, args)) = best.next() else {
            return Err(StepError::Undefined {
                text: text.to_owned(),
            });
        };
        let rivals: Vec<_> = best.map(|(rival, _)| rival.signature.clone()).collect();
        if !rivals.is_empty() {
            let mut signatures = vec![definition.signature.clone()];
            signatures.extend(rivals);
            return Err(StepError::Ambiguous {
                text: text.to_owned(),
                signatures,
            });
        }
        Ok(Resolved {
            signature: &definition.signature,
            step: &definition.step,
            args,
        })
    }
}

impl StepResolver for Library {
    fn run(
        &self,
        text: &str,
        ctx: &StepContext,
        completion: Completion,
    ) -> LocalBoxFuture<'static, ()> {
        match self.resolve(text) {
            Ok(resolved) => {
                tracing::debug!(step = text, signature = resolved.signature, "resolved step");
                resolved.step.invoke(ctx, &resolved.args, completion)
            }
            Err(error) => {
                tracing::debug!(step = text, %error, "step did not resolve");
                completion.fail(error);
                future::ready(()).boxed_local()
            }
        }
    }
}
