//! Link-time registry of named step modules.
//!
//! A step module is a named function that adds definitions to a
//! [`Library`]. Modules are submitted with [`step_module!`](crate::step_module)
//! from anywhere in the final binary and looked up by the names listed in
//! [`LoaderConfig::steps`](crate::LoaderConfig::steps).

use crate::error::LibraryError;
use crate::library::Library;

/// Signature of a step module's registration function.
pub type RegisterFn = fn(&mut Library) -> Result<(), LibraryError>;

/// A named set of step definitions.
#[derive(Debug)]
pub struct StepModule {
    name: &'static str,
    register: RegisterFn,
}

impl StepModule {
    /// Module `name` that defines its steps with `register`.
    #[must_use]
    pub const fn new(name: &'static str, register: RegisterFn) -> Self {
        Self { name, register }
    }

    /// Name the module is configured by.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Add the module's definitions to `library`.
    ///
    /// # Errors
    ///
    /// Propagates [`LibraryError`] when a definition fails to compile.
    pub fn register(&self, library: &mut Library) -> Result<(), LibraryError> {
        (self.register)(library)
    }
}

inventory::collect!(StepModule);

/// Submit a step module to the link-time registry.
///
/// # Examples
///
/// ```
/// use bdd_suite::{Library, LibraryError, StepArgs, StepContext, StepFn};
///
/// fn arithmetic(library: &mut Library) -> Result<(), LibraryError> {
///     library.given("a number (\\d+)", StepFn::managed(|_: &StepContext, _: &StepArgs| ()))?;
///     Ok(())
/// }
///
/// bdd_suite::step_module!("doc/arithmetic", arithmetic);
///
/// assert!(bdd_suite::find_step_module("doc/arithmetic").is_some());
/// ```
#[macro_export]
macro_rules! step_module {
    ($name:expr, $register:path $(,)?) => {
        $crate::inventory::submit! {
            $crate::StepModule::new($name, $register)
        }
    };
}

/// Look up a submitted step module by name.
///
/// When several modules share a name the first one found is returned.
#[must_use]
pub fn find_step_module(name: &str) -> Option<&'static StepModule> {
    inventory::iter::<StepModule>
        .into_iter()
        .find(|module| module.name == name)
}

/// Names of every submitted step module, sorted.
#[must_use]
pub fn step_module_names() -> Vec<&'static str> {
    let mut names: Vec<_> = inventory::iter::<StepModule>
        .into_iter()
        .map(StepModule::name)
        .collect();
    names.sort_unstable();
    names.dedup();
    names
}
