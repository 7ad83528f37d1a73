//! The generator driver.

use std::sync::Arc;

use spindle_core::{CompilationService, CompilationUnit, Diagnostic, Fingerprint, codes};
use tracing::{debug, info, info_span, warn};

use crate::{
    CancellationToken, Cancelled, DriverOptions, Generator, GeneratorDriverRunResult,
    GeneratorInfo, GeneratorRunResult,
    aggregate::ResultAggregator,
    barrier::RunSettings,
    cache::{RunCache, run_fingerprint},
    registry::GeneratorRegistry,
    schedule,
    sink::DiagnosticSink,
};

/// A persistent driver that runs source generators against compilations.
///
/// A driver value is never mutated. Every run, and every edit of the
/// generator set or options, returns a new driver and leaves the original
/// usable, so a snapshot can be run again, run concurrently from several
/// threads, or kept around after a later run.
///
/// # Example
///
/// ```ignore
/// let driver = GeneratorDriver::builder(Arc::new(BraceService::new()))
///     .generator(HelloWorldGenerator)
///     .build();
///
/// let (driver, compilation, diagnostics) =
///     driver.run_generators_and_update_compilation(&compilation);
/// let run = driver.run_result().unwrap();
/// ```
#[derive(Clone)]
pub struct GeneratorDriver {
    service: Arc<dyn CompilationService>,
    registry: GeneratorRegistry,
    options: DriverOptions,
    state: Arc<DriverState>,
}

/// What a driver snapshot remembers from the run that produced it.
#[derive(Debug, Default)]
struct DriverState {
    run_result: Option<GeneratorDriverRunResult>,
    cache: Option<RunCache>,
}

/// Builder for [`GeneratorDriver`].
pub struct DriverBuilder {
    service: Arc<dyn CompilationService>,
    generators: Vec<Arc<dyn Generator>>,
    options: DriverOptions,
}

impl DriverBuilder {
    /// Register a generator after the ones already added.
    pub fn generator(mut self, generator: impl Generator + 'static) -> Self {
        self.generators.push(Arc::new(generator));
        self
    }

    /// Register an already shared generator.
    pub fn shared(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generators.push(generator);
        self
    }

    pub fn generators(mut self, generators: impl IntoIterator<Item = Arc<dyn Generator>>) -> Self {
        self.generators.extend(generators);
        self
    }

    pub fn options(mut self, options: DriverOptions) -> Self {
        self.options = options;
        self
    }

    /// Initialize every generator and build the driver.
    pub fn build(self) -> GeneratorDriver {
        GeneratorDriver {
            service: self.service,
            registry: GeneratorRegistry::initialize(self.generators),
            options: self.options,
            state: Arc::default(),
        }
    }
}

impl GeneratorDriver {
    pub fn builder(service: Arc<dyn CompilationService>) -> DriverBuilder {
        DriverBuilder {
            service,
            generators: Vec::new(),
            options: DriverOptions::default(),
        }
    }

    /// Create a driver hosting `generators`, in order, with default options.
    pub fn create(
        service: Arc<dyn CompilationService>,
        generators: impl IntoIterator<Item = Arc<dyn Generator>>,
    ) -> Self {
        Self::builder(service).generators(generators).build()
    }

    pub fn options(&self) -> &DriverOptions {
        &self.options
    }

    /// The registered generators, in registration order.
    pub fn generators(&self) -> Vec<GeneratorInfo> {
        self.registry.info()
    }

    /// The result of the run that produced this snapshot, if any.
    pub fn run_result(&self) -> Option<&GeneratorDriverRunResult> {
        self.state.run_result.as_ref()
    }

    /// A driver with `generators` registered after the existing ones.
    ///
    /// Only the new generators are initialized. The returned driver has no
    /// run result and no cached outputs.
    pub fn add_generators(&self, generators: impl IntoIterator<Item = Arc<dyn Generator>>) -> Self {
        Self {
            registry: self.registry.with_added(generators),
            state: Arc::default(),
            ..self.clone()
        }
    }

    /// A driver without the generators named in `names`.
    ///
    /// The returned driver has no run result and no cached outputs.
    pub fn remove_generators(&self, names: &[&str]) -> Self {
        Self {
            registry: self.registry.without(names),
            state: Arc::default(),
            ..self.clone()
        }
    }

    /// A driver with different options and the same generators.
    pub fn with_options(&self, options: DriverOptions) -> Self {
        Self {
            options,
            ..self.clone()
        }
    }

    /// Run every generator and return the new driver snapshot.
    pub fn run_generators(&self, compilation: &CompilationUnit) -> Self {
        self.run_generators_and_update_compilation(compilation).0
    }

    /// Run every generator against `compilation`.
    ///
    /// Returns the new driver snapshot, the compilation with every generated
    /// tree appended, and the full set of diagnostics: generation diagnostics
    /// followed by the diagnostics of the updated compilation.
    ///
    /// If the references of `compilation` cannot be resolved no generator is
    /// run: the returned driver is this one, the compilation is the input,
    /// and the only diagnostic describes the failure.
    pub fn run_generators_and_update_compilation(
        &self,
        compilation: &CompilationUnit,
    ) -> (Self, CompilationUnit, Vec<Diagnostic>) {
        match self.run_cancellable(compilation, &CancellationToken::new()) {
            Ok(outcome) => outcome,
            // Unreachable: nothing else holds the token.
            Err(cancelled) => (self.clone(), compilation.clone(), cancelled.partial.diagnostics),
        }
    }

    /// Like [`run_generators_and_update_compilation`](Self::run_generators_and_update_compilation),
    /// stopping early once `cancellation` is raised.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] if the token was raised before the generated
    /// sources were merged. Generators that were already running are allowed
    /// to finish; nothing is committed.
    pub fn run_cancellable(
        &self,
        compilation: &CompilationUnit,
        cancellation: &CancellationToken,
    ) -> Result<(Self, CompilationUnit, Vec<Diagnostic>), Cancelled> {
        let span = info_span!(
            "generator_run",
            compilation = compilation.name(),
            generators = self.registry.len()
        );
        let _enter = span.enter();

        if let Err(error) = self.service.resolve_references(compilation) {
            warn!(%error, "reference resolution failed; no generators were run");
            let diagnostic = Diagnostic::error(error.to_string())
                .with_code(codes::REFERENCE_RESOLUTION_FAILURE);
            return Ok((self.clone(), compilation.clone(), vec![diagnostic]));
        }

        if cancellation.is_cancelled() {
            return Err(self.cancelled(Vec::new()));
        }

        let fingerprint = run_fingerprint(compilation, &self.registry, &self.options);
        let results = match self.cached_results(fingerprint) {
            Some(results) => {
                debug!(%fingerprint, "reusing cached generator outputs");
                results
            }
            None => {
                let settings = RunSettings {
                    collision_severity: self.options.collision_severity,
                    cancellation,
                };
                let slots = schedule::execute_all(
                    self.registry.entries(),
                    compilation,
                    settings,
                    &self.options,
                );
                if cancellation.is_cancelled() {
                    return Err(self.cancelled(slots));
                }
                slots.into_iter().flatten().collect::<Arc<[_]>>()
            }
        };

        let aggregation =
            ResultAggregator::new(self.service.as_ref())
                .aggregate(compilation, &results);

        let mut sink = DiagnosticSink::new();
        for (result, merge_diagnostics) in results.iter().zip(aggregation.diagnostics) {
            sink.extend_generation(result.diagnostics.iter().cloned());
            sink.extend_generation(merge_diagnostics);
        }
        sink.extend_compilation(self.service.diagnostics(&aggregation.compilation));
        let (generation, combined) = sink.into_parts();

        info!(
            generated_trees = aggregation.generated_trees.len(),
            diagnostics = combined.len(),
            "generator run complete"
        );

        let run_result = GeneratorDriverRunResult {
            generated_trees: aggregation.generated_trees,
            diagnostics: generation,
            results: results.to_vec(),
        };
        let cache = self
            .options
            .incremental
            .then(|| RunCache { fingerprint, results });
        let driver = Self {
            state: Arc::new(DriverState {
                run_result: Some(run_result),
                cache,
            }),
            ..self.clone()
        };

        Ok((driver, aggregation.compilation, combined))
    }

    fn cached_results(&self, fingerprint: Fingerprint) -> Option<Arc<[GeneratorRunResult]>> {
        if !self.options.incremental {
            return None;
        }
        self.state.cache.as_ref()?.lookup(fingerprint)
    }

    fn cancelled(&self, slots: Vec<Option<GeneratorRunResult>>) -> Cancelled {
        let results: Vec<GeneratorRunResult> = slots.into_iter().flatten().collect();
        let completed = results.len();
        let total = self.registry.len();
        warn!(completed, total, "generator run cancelled");

        let mut diagnostics: Vec<Diagnostic> = results
            .iter()
            .flat_map(|r| r.diagnostics.iter().cloned())
            .collect();
        diagnostics.push(
            Diagnostic::warning(format!(
                "generator run was cancelled after {} of {} generators completed; no output was committed",
                completed, total
            ))
            .with_code(codes::RUN_CANCELLED),
        );

        Cancelled {
            partial: GeneratorDriverRunResult {
                generated_trees: Vec::new(),
                diagnostics,
                results,
            },
            completed,
            total,
        }
    }
}

impl std::fmt::Debug for GeneratorDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorDriver")
            .field("generators", &self.registry.info())
            .field("options", &self.options)
            .field("has_run_result", &self.state.run_result.is_some())
            .finish()
    }
}
