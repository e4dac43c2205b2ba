//! Completion behaviour of registered step functions.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use bdd_suite::{
    AnnotationMatcher, Completion, Feature, Library, Scenario, StepArgs, StepContext, StepError,
    StepFn, StepReturn, SuiteTreeBuilder,
};
use bdd_suite_harness::{
    Deferred, Executor, ExecutorConfig, Report, Suite, Test, TestStatus,
};
use futures::FutureExt as _;
use futures::executor::block_on;
use futures::poll;
use rstest::{fixture, rstest};

#[fixture]
fn ctx() -> StepContext {
    let root = Suite::root("");
    let test = Test::new(&root, "Given a step", |_test| async { Ok(()) }.boxed_local());
    StepContext::new(test)
}

fn invoke(step: &StepFn, ctx: &StepContext) -> Result<(), StepError> {
    let (completion, settled) = Completion::channel();
    let running = step.invoke(ctx, &StepArgs::default(), completion);
    block_on(async {
        let ((), outcome) = futures::join!(running, settled);
        outcome
    })
}

#[rstest]
fn completion_steps_are_called_unmodified(ctx: StepContext) {
    let stash: Rc<RefCell<Option<Completion>>> = Rc::new(RefCell::new(None));
    let step = {
        let stash = Rc::clone(&stash);
        StepFn::with_completion(move |_: &StepContext, _: &StepArgs, completion| {
            *stash.borrow_mut() = Some(completion);
        })
    };
    assert!(step.wants_completion());

    let (completion, mut settled) = Completion::channel();
    block_on(step.invoke(&ctx, &StepArgs::default(), completion));
    // Nothing is reported on the step's behalf.
    assert!(block_on(async { poll!(&mut settled).is_pending() }));

    let Some(completion) = stash.borrow_mut().take() else {
        panic!("step should receive the completion");
    };
    completion.fail("reported late");
    let Err(error) = block_on(settled) else {
        panic!("step's own failure should be observed");
    };
    assert_eq!(error.to_string(), "reported late");
}

#[rstest]
fn rejected_future_fails_with_its_error(ctx: StepContext) {
    let step = StepFn::future(|_ctx: StepContext, _args: StepArgs| async {
        Err::<(), _>(StepError::from("rejected"))
    });
    let Err(error) = invoke(&step, &ctx) else {
        panic!("rejection should fail the step");
    };
    assert_eq!(error.to_string(), "rejected");
}

#[rstest]
fn sync_panic_fails_and_never_succeeds(ctx: StepContext) {
    let step = StepFn::managed(|_: &StepContext, _: &StepArgs| -> StepReturn {
        panic!("thrown from step")
    });
    let Err(StepError::Panicked(message)) = invoke(&step, &ctx) else {
        panic!("panic should be reported as a failure");
    };
    assert_eq!(message, "thrown from step");
}

#[rstest]
#[case::error(Err(StepError::from("sync failure")), Some("sync failure"))]
#[case::success(Ok(()), None)]
fn ready_results_are_reported_immediately(
    ctx: StepContext,
    #[case] result: Result<(), StepError>,
    #[case] expected: Option<&str>,
) {
    let result = RefCell::new(Some(result));
    let step = StepFn::managed(move |_: &StepContext, _: &StepArgs| {
        result.borrow_mut().take().unwrap_or(Ok(()))
    });
    let outcome = invoke(&step, &ctx);
    assert_eq!(outcome.err().map(|error| error.to_string()).as_deref(), expected);
}

#[rstest]
fn deferred_context_waits_for_settlement(ctx: StepContext) {
    let handle: Rc<RefCell<Option<Deferred>>> = Rc::new(RefCell::new(None));
    let step = {
        let handle = Rc::clone(&handle);
        StepFn::managed(move |ctx: &StepContext, _: &StepArgs| {
            *handle.borrow_mut() = Some(ctx.defer());
        })
    };
    let (completion, mut settled) = Completion::channel();
    let mut running = step.invoke(&ctx, &StepArgs::default(), completion);
    assert!(ctx.is_async());

    block_on(async {
        assert!(poll!(&mut running).is_pending());
        assert!(poll!(&mut settled).is_pending());
        let Some(deferred) = handle.borrow_mut().take() else {
            panic!("step should have deferred");
        };
        deferred.reject("settled elsewhere");
        running.await;
        let Err(error) = settled.await else {
            panic!("rejected deferred should fail the step");
        };
        assert_eq!(error.to_string(), "settled elsewhere");
    });
}

#[rstest]
fn skip_from_step_is_not_a_failure(ctx: StepContext) {
    let step = StepFn::managed(|ctx: &StepContext, _: &StepArgs| Err::<(), _>(ctx.skip("later")));
    let Err(error) = invoke(&step, &ctx) else {
        panic!("skip should be reported");
    };
    assert!(error.is_skip());
    assert_eq!(ctx.skipped().as_deref(), Some("later"));
}

fn cart_library(calls: &Rc<Cell<usize>>) -> Library {
    let mut library = Library::default();
    let counted = Rc::clone(calls);
    let defined = library
        .given(
            "an empty cart",
            StepFn::managed(move |ctx: &StepContext, _: &StepArgs| {
                counted.set(counted.get() + 1);
                ctx.shared().insert("cart", 0_u32);
            }),
        )
        .and_then(|library| {
            library.when(
                "I add (\\d+) items?",
                StepFn::managed(|ctx: &StepContext, args: &StepArgs| -> Result<(), StepError> {
                    let added: u32 = args.parse(0)?;
                    ctx.shared()
                        .with_mut("cart", |cart: &mut u32| *cart += added)
                        .ok_or_else(|| StepError::from("no cart"))
                }),
            )
        })
        .and_then(|library| {
            library.when(
                "the payment is confirmed later",
                StepFn::managed(|ctx: &StepContext, _: &StepArgs| {
                    let deferred = ctx.defer_with_timeout(Duration::from_secs(1));
                    tokio::task::spawn_local(async move {
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        deferred.resolve();
                    });
                }),
            )
        })
        .and_then(|library| {
            library.then(
                "the cart holds (\\d+) items?",
                StepFn::future(|ctx: StepContext, args: StepArgs| async move {
                    let expected: u32 = args.parse(0)?;
                    match ctx.shared().get::<u32>("cart") {
                        Some(actual) if actual == expected => Ok(()),
                        actual => Err(StepError::from(format!(
                            "expected {expected} items, found {actual:?}"
                        ))),
                    }
                }),
            )
        });
    let Ok(_) = defined else {
        panic!("signatures should compile");
    };
    library
}

fn run(features: Vec<Feature>, library: Library) -> Report {
    run_with(ExecutorConfig::default(), features, library)
}

fn run_with(config: ExecutorConfig, features: Vec<Feature>, library: Library) -> Report {
    let Ok(matcher) = AnnotationMatcher::from_keywords("only", "pending") else {
        panic!("english keywords should compile");
    };
    let mut executor = Executor::new(config);
    executor.register(move |root| {
        SuiteTreeBuilder::new(matcher, Rc::new(library)).build(&features, root);
    });
    let Ok(report) = executor.run() else {
        panic!("runtime should build");
    };
    report
}

#[test]
fn scenario_steps_share_state_and_fail_in_isolation() {
    let calls = Rc::new(Cell::new(0));
    let feature = Feature::new("Cart")
        .with_scenario(
            Scenario::new("Filling")
                .with_step("Given an empty cart")
                .with_step("When I add 2 items")
                .with_step("And I add 1 item")
                .with_step("Then the cart holds 3 items"),
        )
        .with_scenario(
            Scenario::new("Miscounted")
                .with_step("Given an empty cart")
                .with_step("Then the cart holds 4 items")
                .with_step("When I juggle")
                .with_step("But the cart holds 0 items"),
        );
    let report = run(vec![feature], cart_library(&calls));

    assert_eq!(calls.get(), 2);
    assert_eq!(report.passed(), 6);
    assert_eq!(report.failed(), 2);
    let message = |name: &str| {
        report
            .find(name)
            .and_then(|record| record.status().failure_message().map(str::to_owned))
    };
    assert_eq!(
        message("Cart - Miscounted - Then the cart holds 4 items").as_deref(),
        Some("expected 4 items, found Some(0)")
    );
    assert_eq!(
        message("Cart - Miscounted - When I juggle").as_deref(),
        Some("undefined step: When I juggle")
    );
}

#[test]
fn deferred_step_settles_on_the_executor_runtime() {
    let calls = Rc::new(Cell::new(0));
    let feature = Feature::new("Checkout").with_scenario(
        Scenario::new("Paying")
            .with_step("Given an empty cart")
            .with_step("When the payment is confirmed later"),
    );
    let report = run(vec![feature], cart_library(&calls));
    assert!(matches!(
        report
            .find("Checkout - Paying - When the payment is confirmed later")
            .map(|record| record.status()),
        Some(TestStatus::Passed)
    ));
    assert!(report.is_success());
}

fn single_step_report(step: StepFn) -> Report {
    let mut library = Library::default();
    let Ok(_) = library.when("the step runs", step) else {
        panic!("signature should compile");
    };
    let config = ExecutorConfig {
        default_timeout: Duration::from_millis(200),
        ..ExecutorConfig::default()
    };
    let feature =
        Feature::new("F").with_scenario(Scenario::new("S").with_step("When the step runs"));
    run_with(config, vec![feature], library)
}

fn single_status(report: &Report) -> TestStatus {
    let Some(record) = report.find("F - S - When the step runs") else {
        panic!("step should be reported");
    };
    record.status().clone()
}

#[rstest]
#[case::future(StepFn::future(|ctx: StepContext, _args: StepArgs| async move {
    let _deferred = ctx.defer();
    Ok::<(), StepError>(())
}))]
#[case::with_completion(StepFn::with_completion(
    |ctx: &StepContext, _: &StepArgs, completion: Completion| {
        let _deferred = ctx.defer();
        completion.succeed();
    }
))]
fn completion_outcome_is_final_even_after_defer(#[case] step: StepFn) {
    let report = single_step_report(step);
    assert_eq!(single_status(&report), TestStatus::Passed);
}

#[test]
fn dropped_deferred_fails_the_step_as_abandoned() {
    let report = single_step_report(StepFn::managed(|ctx: &StepContext, _: &StepArgs| {
        drop(ctx.defer());
    }));
    let status = single_status(&report);
    let Some(message) = status.failure_message() else {
        panic!("abandoned deferred should fail the step: {status:?}");
    };
    assert!(message.contains("dropped"), "unexpected message: {message}");
}
