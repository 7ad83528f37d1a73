use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use eyre::{WrapErr, eyre};
use spindle_core::{
    CompilationOptions, CompilationService, CompilationUnit, Diagnostic, GeneratorId, Origin,
    OutputKind, Reference, Severity, codes,
};
use spindle_driver::{
    CancellationToken, DriverOptions, ExecutionContext, FailureKind, Generator, GeneratorDriver,
    GeneratorFailure, RegistrationContext, emit::write_generated_files,
};
use spindle_lang::BraceService;

const PROGRAM: &str =
    "namespace MyCode { public class Program { public static void Main(string[] args) { } } }";

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

fn service() -> Arc<dyn CompilationService> {
    Arc::new(BraceService::new())
}

fn program() -> CompilationUnit {
    let tree = BraceService::new()
        .parse_source("program.cs", PROGRAM)
        .unwrap();
    CompilationUnit::new(
        "app",
        vec![tree],
        Vec::new(),
        CompilationOptions::new(OutputKind::ConsoleApplication),
    )
}

fn with_extra_file(unit: &CompilationUnit, path: &str, text: &str) -> CompilationUnit {
    let tree = BraceService::new().parse_source(path, text).unwrap();
    unit.with_trees([tree])
}

fn class_source(class: &str) -> String {
    format!("namespace Generated {{ public class {} {{ }} }}", class)
}

fn render(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

fn shared(generator: impl Generator + 'static) -> Arc<dyn Generator> {
    Arc::new(generator)
}

/// Emits a fixed list of sources.
struct Emit {
    name: &'static str,
    sources: Vec<(String, String)>,
}

impl Emit {
    /// One source per class, hinted by the class name.
    fn classes(name: &'static str, classes: &[&str]) -> Self {
        Self {
            name,
            sources: classes
                .iter()
                .map(|class| (class.to_string(), class_source(class)))
                .collect(),
        }
    }

    fn raw(name: &'static str, sources: &[(&str, &str)]) -> Self {
        Self {
            name,
            sources: sources
                .iter()
                .map(|(hint, text)| (hint.to_string(), text.to_string()))
                .collect(),
        }
    }
}

impl Generator for Emit {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "emits fixed sources"
    }

    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> eyre::Result<()> {
        for (hint, text) in &self.sources {
            ctx.add_source(hint.as_str(), text.as_str());
        }
        Ok(())
    }
}

/// Counts its executions.
struct Counting {
    calls: Arc<AtomicUsize>,
}

impl Counting {
    fn new() -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                calls: calls.clone(),
            },
            calls,
        )
    }
}

impl Generator for Counting {
    fn name(&self) -> &str {
        "counting"
    }

    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> eyre::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ctx.add_source("Counted", class_source("Counted"));
        Ok(())
    }
}

/// Adds a source and reports a diagnostic, then fails.
struct Failing;

impl Generator for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> eyre::Result<()> {
        ctx.add_source("Partial", class_source("Partial"));
        ctx.report_diagnostic(Diagnostic::info("about to fail"));
        Err(eyre!("template missing")).wrap_err("cannot render")
    }
}

struct Panicking;

impl Generator for Panicking {
    fn name(&self) -> &str {
        "panicking"
    }

    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> eyre::Result<()> {
        ctx.add_source("Partial", class_source("Partial"));
        panic!("unexpected state");
    }
}

/// Sleeps before emitting, to perturb parallel scheduling.
struct Slow {
    name: &'static str,
    delay: Duration,
}

impl Generator for Slow {
    fn name(&self) -> &str {
        self.name
    }

    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> eyre::Result<()> {
        thread::sleep(self.delay);
        ctx.add_source(self.name, class_source(self.name));
        Ok(())
    }
}

/// Raises a cancellation token from inside the run.
struct Cancelling {
    token: CancellationToken,
}

impl Generator for Cancelling {
    fn name(&self) -> &str {
        "cancelling"
    }

    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> eyre::Result<()> {
        ctx.add_source("BeforeCancel", class_source("BeforeCancel"));
        self.token.cancel();
        Ok(())
    }
}

/// Fails to initialize.
struct Misconfigured {
    executions: Arc<AtomicUsize>,
}

impl Generator for Misconfigured {
    fn name(&self) -> &str {
        "misconfigured"
    }

    fn initialize(&self, _ctx: &mut RegistrationContext) -> eyre::Result<()> {
        Err(eyre!("no template directory configured"))
    }

    fn execute(&self, _ctx: &mut ExecutionContext<'_>) -> eyre::Result<()> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_baseline_scenario() {
    init_logging();
    let input = program();
    assert!(BraceService::new().diagnostics(&input).is_empty());

    let driver = GeneratorDriver::create(service(), [shared(Emit::classes("hello", &["HelloWorld"]))]);
    assert!(driver.run_result().is_none());

    let (driver, output, diagnostics) = driver.run_generators_and_update_compilation(&input);

    assert_eq!(output.syntax_trees().len(), 2);
    assert_eq!(output.syntax_trees()[1].path(), "hello/HelloWorld");
    assert!(BraceService::new().diagnostics(&output).is_empty());
    assert!(diagnostics.is_empty());

    let run = driver.run_result().unwrap();
    assert_eq!(run.generated_trees.len(), 1);
    assert_eq!(run.results.len(), 1);
    assert!(run.results[0].diagnostics.is_empty());
    assert!(run.results[0].captured_failure.is_none());

    // The input is a value; the run did not touch it.
    assert_eq!(input.syntax_trees().len(), 1);
}

#[test]
fn test_runs_are_idempotent() {
    let input = program();
    let driver = GeneratorDriver::create(
        service(),
        [
            shared(Emit::classes("first", &["A", "B"])),
            shared(Emit::raw("broken", &[("bad", "class {")])),
        ],
    );

    let first = driver.run_generators(&input);
    let second = first.run_generators(&input);
    let fresh = driver.run_generators(&input);

    assert!(first.run_result().is_some());
    assert_eq!(first.run_result(), second.run_result());
    assert_eq!(first.run_result(), fresh.run_result());
}

#[test]
fn test_results_follow_registration_order() {
    let input = program();
    let driver = GeneratorDriver::builder(service())
        .generator(Slow {
            name: "Slow",
            delay: Duration::from_millis(50),
        })
        .generator(Slow {
            name: "Fast",
            delay: Duration::ZERO,
        })
        .options(DriverOptions::default().parallel(true).max_parallelism(2))
        .build();

    let (driver, output, _) = driver.run_generators_and_update_compilation(&input);
    let run = driver.run_result().unwrap();

    assert_eq!(run.results[0].generator, GeneratorId::new("Slow", 0));
    assert_eq!(run.results[1].generator, GeneratorId::new("Fast", 1));
    let paths: Vec<&str> = output.syntax_trees().iter().map(|t| t.path()).collect();
    assert_eq!(paths, ["program.cs", "Slow/Slow", "Fast/Fast"]);
}

#[test]
fn test_generated_trees_are_additive() {
    let input = program();
    let driver = GeneratorDriver::create(
        service(),
        [
            shared(Emit::classes("g1", &["A", "B"])),
            shared(Emit::classes("g2", &["C", "D", "E"])),
        ],
    );

    let (driver, output, diagnostics) = driver.run_generators_and_update_compilation(&input);

    assert!(diagnostics.is_empty());
    assert_eq!(output.syntax_trees().len(), 1 + 2 + 3);
    assert_eq!(driver.run_result().unwrap().generated_trees.len(), 5);
}

#[test]
fn test_failing_generator_is_isolated() {
    let input = program();
    let driver = GeneratorDriver::create(
        service(),
        [shared(Failing), shared(Emit::classes("ok", &["Fine"]))],
    );

    let (driver, output, diagnostics) = driver.run_generators_and_update_compilation(&input);
    let run = driver.run_result().unwrap();

    let failed = &run.results[0];
    assert!(failed.generated_sources.is_empty());
    assert_eq!(
        failed.captured_failure,
        Some(GeneratorFailure {
            kind: FailureKind::Error,
            message: "cannot render: template missing".to_string(),
        })
    );
    assert_eq!(
        failed.diagnostics[1].origin,
        Origin::Generator(GeneratorId::new("failing", 0))
    );

    assert!(run.results[1].succeeded());
    assert!(output.tree("ok/Fine").is_some());
    assert!(output.tree("failing/Partial").is_none());
    assert_eq!(output.syntax_trees().len(), 2);

    insta::assert_snapshot!(render(&diagnostics), @r"
    info: about to fail (from failing)
    error[SPN0001]: generator 'failing' failed and will not contribute to the output: cannot render: template missing (from failing)
    ");
}

#[test]
fn test_panicking_generator_is_isolated() {
    let input = program();
    let driver = GeneratorDriver::create(
        service(),
        [shared(Panicking), shared(Emit::classes("ok", &["Fine"]))],
    );

    let (driver, output, _) = driver.run_generators_and_update_compilation(&input);
    let run = driver.run_result().unwrap();

    let failure = run.results[0].captured_failure.as_ref().unwrap();
    assert_eq!(failure.kind, FailureKind::Panic);
    assert_eq!(failure.message, "unexpected state");
    assert!(run.results[0].generated_sources.is_empty());
    assert_eq!(
        run.failed_generators().collect::<Vec<_>>(),
        [&GeneratorId::new("panicking", 0)]
    );
    assert!(output.tree("ok/Fine").is_some());
    assert!(output.tree("panicking/Partial").is_none());
}

#[test]
fn test_hint_name_collision_keeps_first_source() {
    let input = program();
    let collide = || {
        Emit::raw(
            "collide",
            &[
                ("x", "namespace Generated { class First { } }"),
                ("x", "namespace Generated { class Second { } }"),
            ],
        )
    };

    let driver = GeneratorDriver::create(service(), [shared(collide())]);
    let (driver, output, diagnostics) = driver.run_generators_and_update_compilation(&input);

    assert_eq!(output.syntax_trees().len(), 2);
    let tree = output.tree("collide/x").unwrap();
    assert!(tree.text().contains("First"));
    assert_eq!(driver.run_result().unwrap().results[0].generated_sources.len(), 1);

    insta::assert_snapshot!(render(&diagnostics), @"warning[SPN0003]: hint name 'x' collides with 'x' already added by this generator; the source was dropped (from collide) (at collide/x)");

    let strict = GeneratorDriver::builder(service())
        .generator(collide())
        .options(DriverOptions::default().collision_severity(Severity::Error))
        .build();
    let (_, _, diagnostics) = strict.run_generators_and_update_compilation(&input);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Error);
}

#[test]
fn test_unparsable_source_is_dropped() {
    let input = program();
    let driver = GeneratorDriver::create(
        service(),
        [shared(Emit::raw(
            "broken",
            &[("bad", "class {"), ("good", "namespace Generated { class Good { } }")],
        ))],
    );

    let (driver, output, diagnostics) = driver.run_generators_and_update_compilation(&input);
    let run = driver.run_result().unwrap();

    assert_eq!(output.syntax_trees().len(), 2);
    assert!(output.tree("broken/good").is_some());
    assert_eq!(run.generated_trees.len(), 1);
    // The source is still reported as produced by the generator.
    assert_eq!(run.results[0].generated_sources.len(), 2);

    assert_eq!(diagnostics.len(), 1);
    let diagnostic = &diagnostics[0];
    assert_eq!(diagnostic.code.as_deref(), Some(codes::GENERATED_SOURCE_PARSE_FAILURE));
    assert!(
        diagnostic
            .message
            .starts_with("generated source 'bad' could not be parsed: "),
        "{diagnostic}"
    );
    let location = diagnostic.location.as_ref().unwrap();
    assert_eq!(location.path, "broken/bad");
    assert!(location.span.is_some_and(|span| span.end() <= "class {".len()));
    assert_eq!(run.diagnostics, diagnostics);
}

#[test]
fn test_generators_differing_in_case_keep_their_sources() {
    init_logging();
    let input = program();
    let driver = GeneratorDriver::create(
        service(),
        [
            shared(Emit::raw("Gen", &[("x", "namespace Upper { class X { } }")])),
            shared(Emit::raw("gen", &[("x", "namespace Lower { class X { } }")])),
        ],
    );

    let (driver, output, diagnostics) = driver.run_generators_and_update_compilation(&input);

    assert!(diagnostics.is_empty(), "{}", render(&diagnostics));
    assert_eq!(output.syntax_trees().len(), 3);
    assert!(output.tree("Gen/0/x").unwrap().text().contains("Upper"));
    assert!(output.tree("gen/1/x").unwrap().text().contains("Lower"));
    assert_eq!(driver.run_result().unwrap().generated_trees.len(), 2);
}

#[test]
fn test_same_named_generators_keep_their_sources() {
    let input = program();
    let driver = GeneratorDriver::create(
        service(),
        [
            shared(Emit::raw("twin", &[("Shared", "namespace First { class Shared { } }")])),
            shared(Emit::raw("twin", &[("Shared", "namespace Second { class Shared { } }")])),
        ],
    );

    let (driver, output, diagnostics) = driver.run_generators_and_update_compilation(&input);

    assert!(diagnostics.is_empty(), "{}", render(&diagnostics));
    assert!(output.tree("twin/0/Shared").is_some());
    assert!(output.tree("twin/1/Shared").is_some());

    let dir = tempfile::tempdir().unwrap();
    let written = write_generated_files(driver.run_result().unwrap(), dir.path()).unwrap();
    assert_eq!(written.len(), 3);
    assert!(dir.path().join("twin/0/Shared").is_file());
    assert!(dir.path().join("twin/1/Shared").is_file());
}

#[test]
fn test_rooted_hint_names_are_rejected() {
    let outer = tempfile::tempdir().unwrap();
    let escaped = outer.path().join("escaped.cs");
    let absolute = escaped.to_string_lossy().replace('\\', "/");
    let driver = GeneratorDriver::create(
        service(),
        [shared(Emit::raw(
            "rooted",
            &[
                (absolute.as_str(), "class Escaped { }"),
                ("ok", "class Kept { }"),
            ],
        ))],
    );

    let (driver, output, diagnostics) = driver.run_generators_and_update_compilation(&program());

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code.as_deref(), Some(codes::INVALID_HINT_NAME));
    assert!(output.tree("rooted/ok").is_some());
    assert_eq!(output.syntax_trees().len(), 2);

    let dir = outer.path().join("out");
    let written = write_generated_files(driver.run_result().unwrap(), &dir).unwrap();
    assert_eq!(written.len(), 2);
    assert!(written.iter().all(|path| path.starts_with(&dir)));
    assert!(!escaped.exists());
}

#[test]
fn test_generator_name_with_separator_fails_initialization() {
    let driver = GeneratorDriver::builder(service())
        .generator(Emit::classes("../escape", &["Escaped"]))
        .generator(Emit::classes("ok", &["Fine"]))
        .build();

    let (driver, output, diagnostics) = driver.run_generators_and_update_compilation(&program());

    assert!(output.tree("ok/Fine").is_some());
    assert_eq!(output.syntax_trees().len(), 2);
    insta::assert_snapshot!(render(&diagnostics), @"error[SPN0002]: generator '../escape' failed to initialize and will not run: invalid generator name '../escape': generator name cannot contain a path separator (from ../escape)");
    let failure = driver.run_result().unwrap().results[0]
        .captured_failure
        .clone()
        .unwrap();
    assert_eq!(failure.kind, FailureKind::Initialization);
}

#[test]
fn test_deeply_nested_generated_source() {
    let depth = 20_000;
    let balanced = format!(
        "class Deep {{ void Run() {{ {}{} }} }}",
        "{ ".repeat(depth),
        "} ".repeat(depth)
    );
    let unbalanced = format!("class Deep {{ void Run() {{ {}", "{ ".repeat(depth));
    let driver = GeneratorDriver::create(
        service(),
        [shared(Emit::raw(
            "deep",
            &[("balanced", balanced.as_str()), ("unbalanced", unbalanced.as_str())],
        ))],
    );

    let (_, output, diagnostics) = driver.run_generators_and_update_compilation(&program());

    let tree = output.tree("deep/balanced").unwrap();
    let names: Vec<&str> = tree.declarations().iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, ["Deep", "Deep.Run"]);
    assert!(output.tree("deep/unbalanced").is_none());
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].code.as_deref(),
        Some(codes::GENERATED_SOURCE_PARSE_FAILURE)
    );
}

#[test]
fn test_reference_failure_runs_nothing() {
    let input = program().with_references(vec![Reference::named("System.Missing")]);
    let (counting, calls) = Counting::new();
    let driver = GeneratorDriver::builder(service()).generator(counting).build();
    let ran = driver.run_generators(&program());

    let (after, output, diagnostics) = ran.run_generators_and_update_compilation(&input);

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(output.same_content(&input));
    assert_eq!(output.syntax_trees().len(), 1);
    insta::assert_snapshot!(render(&diagnostics), @"error[SPN0006]: cannot resolve reference 'System.Missing': not a known reference and no path was given");

    // The snapshot is unaffected and can be retried.
    assert_eq!(after.run_result(), ran.run_result());
    let service: Arc<dyn CompilationService> =
        Arc::new(BraceService::new().with_known_reference("System.Missing"));
    let (counting, calls) = Counting::new();
    let retried = GeneratorDriver::builder(service)
        .generator(counting)
        .build()
        .run_generators(&input);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(retried.run_result().unwrap().generated_trees.len(), 1);
}

#[test]
fn test_cached_outputs_are_reused() {
    init_logging();
    let input = program();
    let (counting, calls) = Counting::new();
    let driver = GeneratorDriver::builder(service()).generator(counting).build();

    let first = driver.run_generators(&input);
    let (second, output, _) = first.run_generators_and_update_compilation(&input);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first.run_result(), second.run_result());
    assert!(output.tree("counting/Counted").is_some());

    // A different compilation is a different fingerprint.
    let changed = with_extra_file(&input, "extra.cs", "class Extra { }");
    second.run_generators(&changed);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // So are options that affect output.
    let strict = second.with_options(DriverOptions::default().collision_severity(Severity::Error));
    strict.run_generators(&input);
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    let uncached = first.with_options(DriverOptions::default().incremental(false));
    let again = uncached.run_generators(&input);
    again.run_generators(&input);
    assert_eq!(calls.load(Ordering::SeqCst), 5);
    assert_eq!(again.run_result(), first.run_result());
}

#[test]
fn test_parallel_matches_sequential() {
    let input = with_extra_file(&program(), "models.cs", "namespace Models { class User { } }");
    let generators = || {
        vec![
            shared(Emit::classes("a", &["A1", "A2"])),
            shared(Failing),
            shared(Slow {
                name: "Slow",
                delay: Duration::from_millis(20),
            }),
            shared(Emit::raw("broken", &[("bad", "class {")])),
            shared(Emit::classes("b", &["B1"])),
            shared(Emit::raw("collide", &[("x", "class X { }"), ("X", "class Y { }")])),
        ]
    };

    let sequential = GeneratorDriver::create(service(), generators());
    let parallel = GeneratorDriver::builder(service())
        .generators(generators())
        .options(DriverOptions::default().parallel(true).max_parallelism(3))
        .build();

    let (seq_driver, seq_output, seq_diagnostics) =
        sequential.run_generators_and_update_compilation(&input);
    let (par_driver, par_output, par_diagnostics) =
        parallel.run_generators_and_update_compilation(&input);

    assert_eq!(seq_driver.run_result(), par_driver.run_result());
    assert_eq!(seq_output.syntax_trees(), par_output.syntax_trees());
    assert_eq!(seq_diagnostics, par_diagnostics);
}

#[test]
fn test_cancelled_before_start() {
    let input = program();
    let (counting, calls) = Counting::new();
    let driver = GeneratorDriver::builder(service()).generator(counting).build();

    let token = CancellationToken::new();
    token.cancel();
    let cancelled = driver.run_cancellable(&input, &token).unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(cancelled.completed, 0);
    assert_eq!(cancelled.total, 1);
    assert!(cancelled.partial.results.is_empty());
    assert_eq!(
        cancelled.partial.diagnostics.last().unwrap().code.as_deref(),
        Some(codes::RUN_CANCELLED)
    );
    assert!(driver.run_result().is_none());
}

#[test]
fn test_cancelled_mid_run_commits_nothing() {
    let input = program();
    let token = CancellationToken::new();
    let (counting, calls) = Counting::new();
    let driver = GeneratorDriver::builder(service())
        .generator(Emit::classes("first", &["First"]))
        .generator(Cancelling {
            token: token.clone(),
        })
        .generator(counting)
        .build();

    let cancelled = driver.run_cancellable(&input, &token).unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        cancelled.to_string(),
        "generator run cancelled after 2 of 3 generators completed"
    );
    let names: Vec<&str> = cancelled
        .partial
        .results
        .iter()
        .map(|r| r.generator.name())
        .collect();
    assert_eq!(names, ["first", "cancelling"]);
    assert!(cancelled.partial.generated_trees.is_empty());
    insta::assert_snapshot!(render(&cancelled.partial.diagnostics), @"warning[SPN0007]: generator run was cancelled after 2 of 3 generators completed; no output was committed");
    assert!(driver.run_result().is_none());

    // The snapshot can be run again; the run's own token is not the one the
    // generator raises.
    let (after, output, _) = driver.run_generators_and_update_compilation(&input);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(output.syntax_trees().len(), 4);
    assert_eq!(after.run_result().unwrap().results.len(), 3);
}

#[test]
fn test_generators_can_observe_cancellation() {
    struct Waiting;

    impl Generator for Waiting {
        fn name(&self) -> &str {
            "waiting"
        }

        fn execute(&self, ctx: &mut ExecutionContext<'_>) -> eyre::Result<()> {
            let deadline = Instant::now() + Duration::from_secs(10);
            while !ctx.is_cancelled() {
                if Instant::now() > deadline {
                    return Err(eyre!("cancellation never arrived"));
                }
                thread::sleep(Duration::from_millis(1));
            }
            Ok(())
        }
    }

    let driver = GeneratorDriver::builder(service())
        .generator(Waiting)
        .generator(Emit::classes("after", &["After"]))
        .build();

    let token = CancellationToken::new();
    token.cancel_after(Duration::from_millis(20));
    let cancelled = driver.run_cancellable(&program(), &token).unwrap_err();

    assert_eq!(cancelled.completed, 1);
    assert!(cancelled.partial.results[0].succeeded());
}

#[test]
fn test_concurrent_runs_on_one_snapshot() {
    let driver = GeneratorDriver::builder(service())
        .generator(Emit::classes("a", &["A"]))
        .generator(Emit::classes("b", &["B"]))
        .build();
    let small = program();
    let large = with_extra_file(&small, "extra.cs", "class Extra { }");

    let expected_small = driver.run_generators_and_update_compilation(&small);
    let expected_large = driver.run_generators_and_update_compilation(&large);

    let (got_small, got_large) = thread::scope(|scope| {
        let a = scope.spawn(|| driver.run_generators_and_update_compilation(&small));
        let b = scope.spawn(|| driver.run_generators_and_update_compilation(&large));
        (a.join().unwrap(), b.join().unwrap())
    });

    assert_eq!(got_small.0.run_result(), expected_small.0.run_result());
    assert_eq!(got_small.1.syntax_trees().len(), 3);
    assert_eq!(got_large.0.run_result(), expected_large.0.run_result());
    assert_eq!(got_large.1.syntax_trees().len(), 4);
    assert!(driver.run_result().is_none());
}

#[test]
fn test_initialization_failure_reported_every_run() {
    let executions = Arc::new(AtomicUsize::new(0));
    let driver = GeneratorDriver::builder(service())
        .generator(Misconfigured {
            executions: executions.clone(),
        })
        .generator(Emit::classes("ok", &["Fine"]))
        .build();

    let input = program();
    let (first, output, diagnostics) = driver.run_generators_and_update_compilation(&input);
    let changed = with_extra_file(&input, "extra.cs", "class Extra { }");
    let second = first.run_generators(&changed);

    assert_eq!(executions.load(Ordering::SeqCst), 0);
    assert!(output.tree("ok/Fine").is_some());
    insta::assert_snapshot!(render(&diagnostics), @"error[SPN0002]: generator 'misconfigured' failed to initialize and will not run: no template directory configured (from misconfigured)");

    for driver in [&first, &second] {
        let failure = driver.run_result().unwrap().results[0]
            .captured_failure
            .clone()
            .unwrap();
        assert_eq!(failure.kind, FailureKind::Initialization);
    }
}

#[test]
fn test_adding_and_removing_generators() {
    let input = program();
    let driver = GeneratorDriver::create(service(), [shared(Emit::classes("a", &["A"]))]);
    let ran = driver.run_generators(&input);

    let extended = ran.add_generators([shared(Emit::classes("b", &["B"]))]);
    assert!(extended.run_result().is_none());
    let ids: Vec<GeneratorId> = extended.generators().into_iter().map(|g| g.id).collect();
    assert_eq!(ids, [GeneratorId::new("a", 0), GeneratorId::new("b", 1)]);
    assert_eq!(extended.generators()[0].description, "emits fixed sources");

    let extended_run = extended.run_generators(&input);
    assert_eq!(extended_run.run_result().unwrap().results.len(), 2);

    let reduced = extended_run.remove_generators(&["a"]);
    let ids: Vec<GeneratorId> = reduced.generators().into_iter().map(|g| g.id).collect();
    assert_eq!(ids, [GeneratorId::new("b", 0)]);
    let (_, output, _) = reduced.run_generators_and_update_compilation(&input);
    assert!(output.tree("a/A").is_none());
    assert!(output.tree("b/B").is_some());

    // Earlier snapshots are untouched.
    assert_eq!(ran.generators().len(), 1);
    assert_eq!(ran.run_result().unwrap().results.len(), 1);
}

#[test]
fn test_post_initialization_sources() {
    struct WithAttributes {
        fail: bool,
    }

    impl Generator for WithAttributes {
        fn name(&self) -> &str {
            "attrs"
        }

        fn initialize(&self, ctx: &mut RegistrationContext) -> eyre::Result<()> {
            ctx.add_post_initialization_source(
                "Attributes",
                "namespace Generated { class MarkerAttribute { } }",
            );
            Ok(())
        }

        fn execute(&self, ctx: &mut ExecutionContext<'_>) -> eyre::Result<()> {
            if self.fail {
                return Err(eyre!("boom"));
            }
            ctx.add_source("Marked", class_source("Marked"));
            Ok(())
        }
    }

    let input = program();
    let driver = GeneratorDriver::create(service(), [shared(WithAttributes { fail: false })]);
    let driver = driver.run_generators(&input);
    let hints: Vec<&str> = driver.run_result().unwrap().results[0]
        .generated_sources
        .iter()
        .map(|s| s.hint_name.as_str())
        .collect();
    assert_eq!(hints, ["Attributes", "Marked"]);

    let failing = GeneratorDriver::create(service(), [shared(WithAttributes { fail: true })]);
    let (_, output, _) = failing.run_generators_and_update_compilation(&input);
    assert!(output.tree("attrs/Attributes").is_none());
}

#[test]
fn test_candidate_trees_follow_syntax_filters() {
    struct ListTypedTrees;

    impl Generator for ListTypedTrees {
        fn name(&self) -> &str {
            "typed"
        }

        fn initialize(&self, ctx: &mut RegistrationContext) -> eyre::Result<()> {
            ctx.register_syntax_filter(|tree| tree.types().next().is_some());
            Ok(())
        }

        fn execute(&self, ctx: &mut ExecutionContext<'_>) -> eyre::Result<()> {
            let listing: Vec<String> = ctx
                .candidate_trees()
                .map(|tree| format!("// {}", tree.path()))
                .collect();
            ctx.add_source("listing", listing.join("\n"));
            Ok(())
        }
    }

    let input = with_extra_file(&program(), "notes.cs", "// nothing declared here");
    let driver = GeneratorDriver::create(service(), [shared(ListTypedTrees)]);
    let (_, output, _) = driver.run_generators_and_update_compilation(&input);

    insta::assert_snapshot!(output.tree("typed/listing").unwrap().text(), @"// program.cs");
}

#[test]
fn test_compilation_diagnostics_come_last() {
    struct Duplicating;

    impl Generator for Duplicating {
        fn name(&self) -> &str {
            "dup"
        }

        fn execute(&self, ctx: &mut ExecutionContext<'_>) -> eyre::Result<()> {
            ctx.report_diagnostic(Diagnostic::warning("emitting a second Program"));
            ctx.add_source("Program", "namespace MyCode { class Program { } }");
            Ok(())
        }
    }

    let driver = GeneratorDriver::create(service(), [shared(Duplicating)]);
    let (driver, _, diagnostics) = driver.run_generators_and_update_compilation(&program());

    insta::assert_snapshot!(render(&diagnostics), @r"
    warning: emitting a second Program (from dup)
    error[BRC0001]: type 'MyCode.Program' is defined multiple times (at dup/Program@25..32)
    ");
    assert_eq!(driver.run_result().unwrap().diagnostics, diagnostics[..1]);
}

#[test]
fn test_emit_generated_files() {
    let driver = GeneratorDriver::create(service(), [shared(Emit::classes("hello", &["HelloWorld"]))])
        .run_generators(&program());

    let dir = tempfile::tempdir().unwrap();
    let written = write_generated_files(driver.run_result().unwrap(), dir.path()).unwrap();

    assert_eq!(written.len(), 2);
    let text = std::fs::read_to_string(dir.path().join("hello").join("HelloWorld")).unwrap();
    assert_eq!(text, class_source("HelloWorld"));
    assert!(dir.path().join("run.json").is_file());
}
