//! Test utilities for generators.
//!
//! This module is only available when the `testing` feature is enabled
//! or during tests.

use std::{fmt::Write, sync::Arc};

use eyre::{Result, eyre};
use spindle_core::{
    CompilationOptions, CompilationService, CompilationUnit, Diagnostic, OutputKind, Reference,
    generated_tree_path, generator_dirs,
};
use tracing_subscriber::EnvFilter;

use crate::{
    DriverOptions, Generator, GeneratorDriver, GeneratorDriverRunResult, emit::write_generated_files,
};

/// Install a `tracing` subscriber for tests, filtered by `SPINDLE_LOG`
/// (default `warn`). Safe to call more than once.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SPINDLE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Builds a compilation from source strings and runs generators over it.
///
/// # Example
///
/// ```ignore
/// let run = GeneratorTest::new(BraceService::new())
///     .source("program.cs", "class Program { static void Main() { } }")
///     .output_kind(OutputKind::ConsoleApplication)
///     .generator(HelloWorldGenerator)
///     .run()?;
///
/// assert!(run.diagnostics.is_empty());
/// ```
pub struct GeneratorTest {
    service: Arc<dyn CompilationService>,
    name: String,
    sources: Vec<(String, String)>,
    references: Vec<Reference>,
    options: CompilationOptions,
    generators: Vec<Arc<dyn Generator>>,
    driver_options: DriverOptions,
}

impl GeneratorTest {
    pub fn new(service: impl CompilationService + 'static) -> Self {
        Self {
            service: Arc::new(service),
            name: "test".to_string(),
            sources: Vec::new(),
            references: Vec::new(),
            options: CompilationOptions::default(),
            generators: Vec::new(),
            driver_options: DriverOptions::default(),
        }
    }

    /// Add a user source file.
    pub fn source(mut self, path: &str, text: &str) -> Self {
        self.sources.push((path.to_string(), text.to_string()));
        self
    }

    pub fn reference(mut self, reference: Reference) -> Self {
        self.references.push(reference);
        self
    }

    pub fn output_kind(mut self, output_kind: OutputKind) -> Self {
        self.options = CompilationOptions::new(output_kind);
        self
    }

    pub fn generator(mut self, generator: impl Generator + 'static) -> Self {
        self.generators.push(Arc::new(generator));
        self
    }

    pub fn shared(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generators.push(generator);
        self
    }

    pub fn driver_options(mut self, options: DriverOptions) -> Self {
        self.driver_options = options;
        self
    }

    /// Parse every source into the input compilation.
    pub fn compilation(&self) -> Result<CompilationUnit> {
        let trees = self
            .sources
            .iter()
            .map(|(path, text)| {
                self.service
                    .parse_text(path, text, &self.options)
                    .map_err(|e| eyre!("test source failed to parse: {}", e))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(CompilationUnit::new(
            self.name.clone(),
            trees,
            self.references.clone(),
            self.options.clone(),
        ))
    }

    /// Build a driver over the registered generators.
    pub fn driver(&self) -> GeneratorDriver {
        GeneratorDriver::builder(Arc::clone(&self.service))
            .generators(self.generators.iter().cloned())
            .options(self.driver_options.clone())
            .build()
    }

    /// Build the compilation and a driver, and run the generators once.
    pub fn run(&self) -> Result<TestRun> {
        let input = self.compilation()?;
        let (driver, output, diagnostics) =
            self.driver().run_generators_and_update_compilation(&input);
        Ok(TestRun {
            service: Arc::clone(&self.service),
            driver,
            input,
            output,
            diagnostics,
        })
    }
}

/// The outcome of [`GeneratorTest::run`].
pub struct TestRun {
    service: Arc<dyn CompilationService>,
    pub driver: GeneratorDriver,
    pub input: CompilationUnit,
    pub output: CompilationUnit,
    pub diagnostics: Vec<Diagnostic>,
}

impl TestRun {
    /// The run result of the returned driver.
    ///
    /// # Panics
    ///
    /// Panics if the run produced no result (reference resolution failed).
    pub fn result(&self) -> &GeneratorDriverRunResult {
        self.driver
            .run_result()
            .expect("run produced no result - did reference resolution fail?")
    }

    /// Text of the tree `generator` produced under `hint_name`.
    pub fn generated_text(&self, generator: &str, hint_name: &str) -> Option<&str> {
        let results = &self.result().results;
        let dirs = generator_dirs(results.iter().map(|r| &r.generator));
        results
            .iter()
            .zip(&dirs)
            .find(|(r, _)| r.generator.name() == generator)
            .map(|(_, dir)| generated_tree_path(dir, hint_name))
            .and_then(|path| self.output.tree(&path))
            .map(|tree| tree.text())
    }

    /// Diagnostics of the updated compilation alone.
    pub fn compilation_diagnostics(&self) -> Vec<Diagnostic> {
        self.service.diagnostics(&self.output)
    }

    /// Write the generated files into a temporary directory.
    ///
    /// The directory will be cleaned up when the returned `TempDir` is dropped.
    pub fn emit_to_temp(&self) -> Result<tempfile::TempDir> {
        let temp_dir = tempfile::TempDir::new()?;
        write_generated_files(self.result(), temp_dir.path())?;
        Ok(temp_dir)
    }
}

/// Assert that generated text matches, reporting each differing line.
///
/// # Panics
///
/// Panics with a line-by-line report when `expected` and `actual` differ.
pub fn assert_content_eq(expected: &str, actual: &str) {
    if expected == actual {
        return;
    }

    let mut report = String::new();
    let (mut expected_lines, mut actual_lines) = (expected.lines(), actual.lines());
    for line in 1.. {
        match (expected_lines.next(), actual_lines.next()) {
            (None, None) => break,
            (exp, act) if exp == act => {}
            (exp, act) => {
                let _ = writeln!(
                    report,
                    "line {line}:\n  expected: {}\n  actual:   {}",
                    exp.unwrap_or("<missing>"),
                    act.unwrap_or("<missing>"),
                );
            }
        }
    }
    if report.is_empty() {
        report.push_str("texts differ only in line endings\n");
    }

    panic!("generated content mismatch:\n{report}");
}
