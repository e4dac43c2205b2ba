//! Loading feature files from disk into an executor.

use std::fs;
use std::path::Path;

use bdd_suite::{
    Library, LibraryError, LoadError, LoadSummary, Loader, LoaderConfig, StepArgs, StepContext,
    StepError, StepFn, StepModule,
};
use bdd_suite_harness::{Executor, ExecutorConfig, Report};
use rstest::{fixture, rstest};
use tempfile::TempDir;

const CART: &str = "\
Feature: Cart
  Background:
    Given an empty cart

  Scenario: Adding an item
    When I add 2 apples
    Then the cart holds 2 items

  Scenario Outline: Adding several
    When I add <count> apples
    Then the cart holds <count> items

    Examples:
      | count |
      | 1     |
      | 3     |
";

const CHECKOUT: &str = "\
@pending
Feature: Checkout
  Scenario: Paying
    Given an empty cart
    When I pay
";

const PANIER: &str = "\
# language: fr
Fonctionnalité: Panier
  Scénario: Vide
    Soit un panier vide

  @brouillon
  Scénario: Plus tard
    Soit un panier vide
";

fn shop_steps(library: &mut Library) -> Result<(), LibraryError> {
    library
        .given(
            "an empty cart",
            StepFn::managed(|ctx: &StepContext, _: &StepArgs| {
                ctx.shared().insert("cart", 0_u32);
            }),
        )?
        .when(
            "I add (\\d+) apples",
            StepFn::managed(|ctx: &StepContext, args: &StepArgs| -> Result<(), StepError> {
                let added: u32 = args.parse(0)?;
                ctx.shared()
                    .with_mut("cart", |cart: &mut u32| *cart += added)
                    .ok_or_else(|| StepError::from("no cart"))
            }),
        )?
        .then(
            "the cart holds (\\d+) items",
            StepFn::managed(|ctx: &StepContext, args: &StepArgs| -> Result<(), StepError> {
                let expected: u32 = args.parse(0)?;
                let actual = ctx.shared().get::<u32>("cart");
                if actual == Some(expected) {
                    Ok(())
                } else {
                    Err(format!("expected {expected} items, found {actual:?}").into())
                }
            }),
        )?;
    Ok(())
}

bdd_suite::step_module!("shop/steps", shop_steps);

fn panier_steps(library: &mut Library) -> Result<(), LibraryError> {
    library.given(
        "un panier vide",
        StepFn::managed(|_: &StepContext, _: &StepArgs| ()),
    )?;
    Ok(())
}

static PANIER_STEPS: StepModule = StepModule::new("panier", panier_steps);

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        let Ok(()) = fs::create_dir_all(parent) else {
            panic!("directory should be created");
        };
    }
    let Ok(()) = fs::write(&path, contents) else {
        panic!("feature file should be written");
    };
}

#[fixture]
fn workspace() -> TempDir {
    let Ok(dir) = tempfile::tempdir() else {
        panic!("temp dir should be created");
    };
    write(dir.path(), "features/shop/cart.feature", CART);
    write(dir.path(), "features/pending.FEATURE", CHECKOUT);
    write(dir.path(), "features/notes.txt", "not a feature");
    write(dir.path(), "i18n/panier.feature", PANIER);
    write(dir.path(), "broken/bad.feature", "this is not gherkin\n");
    dir
}

fn loader(dir: &TempDir) -> Loader {
    Loader::new(
        LoaderConfig::default()
            .with_base_dir(dir.path())
            .with_steps(["shop/steps"]),
    )
}

fn run(executor: Executor) -> Report {
    let Ok(report) = executor.run() else {
        panic!("runtime should build");
    };
    report
}

#[rstest]
fn loads_and_runs_a_directory_of_features(workspace: TempDir) {
    let mut executor = Executor::new(ExecutorConfig::default());
    let Ok(summary) = loader(&workspace).load("features", &mut executor) else {
        panic!("features should load");
    };
    assert_eq!(
        summary,
        LoadSummary {
            files: 2,
            features: 2,
            scenarios: 4,
            steps: 11,
        }
    );
    assert_eq!(executor.pending_hooks(), 1);

    let report = run(executor);
    assert_eq!(report.passed(), 9);
    assert_eq!(report.skipped(), 2);
    assert_eq!(report.failed(), 0);

    let names: Vec<_> = report.records().iter().map(|r| r.full_name()).collect();
    assert_eq!(names.first().copied(), Some("Checkout - Paying - Given an empty cart"));
    assert!(names.contains(&"Cart - Adding several (example 2) - When I add 3 apples"));
    assert!(names.contains(&"Cart - Adding several (example 2) - Then the cart holds 3 items"));
}

#[rstest]
fn a_single_file_resource_is_loaded_directly(workspace: TempDir) {
    let mut executor = Executor::new(ExecutorConfig::default());
    let Ok(summary) = loader(&workspace).load("features/shop/cart.feature", &mut executor) else {
        panic!("single file should load");
    };
    assert_eq!(summary.files, 1);
    assert_eq!(summary.scenarios, 3);
    assert!(run(executor).is_success());
}

#[rstest]
fn missing_step_module_registers_nothing(workspace: TempDir) {
    let loader = Loader::new(
        LoaderConfig::default()
            .with_base_dir(workspace.path())
            .with_steps(["shop/steps", "shop/missing"]),
    );
    let mut executor = Executor::new(ExecutorConfig::default());
    let result = loader.load("features", &mut executor);
    let Err(LoadError::MissingStepModule { name }) = result else {
        panic!("unknown module should abort the load: {result:?}");
    };
    assert_eq!(name, "shop/missing");
    assert_eq!(executor.pending_hooks(), 0);
}

#[rstest]
fn parse_failures_abort_the_load(workspace: TempDir) {
    let mut executor = Executor::new(ExecutorConfig::default());
    let result = loader(&workspace).load("broken", &mut executor);
    let Err(LoadError::Parse(error)) = result else {
        panic!("malformed feature should abort the load: {result:?}");
    };
    assert!(error.path.ends_with("bad.feature"));
    assert_eq!(executor.pending_hooks(), 0);
}

#[rstest]
fn missing_resources_are_fatal(workspace: TempDir) {
    let mut executor = Executor::new(ExecutorConfig::default());
    let result = loader(&workspace).load("nowhere", &mut executor);
    assert!(matches!(result, Err(LoadError::Locate { .. })), "{result:?}");
}

#[rstest]
fn localised_features_use_their_language(workspace: TempDir) {
    let loader = Loader::new(
        LoaderConfig::default()
            .with_base_dir(workspace.path())
            .with_lang("fr")
            .with_steps(["panier"]),
    )
    .with_module(&PANIER_STEPS);
    let mut executor = Executor::new(ExecutorConfig::default());
    let Ok(summary) = loader.load("i18n", &mut executor) else {
        panic!("french feature should load");
    };
    assert_eq!(summary.scenarios, 2);

    let report = run(executor);
    assert_eq!(report.passed(), 1);
    let reason = report
        .find("Panier - Plus tard - Soit un panier vide")
        .and_then(|record| record.status().skip_reason());
    assert_eq!(reason, Some("pending"));
}

#[rstest]
fn invalid_configuration_is_rejected(workspace: TempDir) {
    let loader = Loader::new(
        LoaderConfig::default()
            .with_base_dir(workspace.path())
            .with_steps(Vec::<String>::new()),
    );
    let mut executor = Executor::new(ExecutorConfig::default());
    let result = loader.load("features", &mut executor);
    assert!(matches!(result, Err(LoadError::InvalidConfig(_))), "{result:?}");
}
