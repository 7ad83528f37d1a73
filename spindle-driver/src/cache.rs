//! Reuse of generator outputs across runs.

use std::sync::Arc;

use spindle_core::{CompilationUnit, Fingerprint, Fingerprinter};

use crate::{DriverOptions, GeneratorRunResult, registry::GeneratorRegistry};

/// Generator results of a completed run, keyed by the run fingerprint.
#[derive(Debug, Clone)]
pub(crate) struct RunCache {
    pub fingerprint: Fingerprint,
    pub results: Arc<[GeneratorRunResult]>,
}

impl RunCache {
    /// The cached results if they were produced under `fingerprint`.
    pub fn lookup(&self, fingerprint: Fingerprint) -> Option<Arc<[GeneratorRunResult]>> {
        (self.fingerprint == fingerprint).then(|| Arc::clone(&self.results))
    }
}

/// Everything that determines the generator results of a run.
pub(crate) fn run_fingerprint(
    compilation: &CompilationUnit,
    registry: &GeneratorRegistry,
    options: &DriverOptions,
) -> Fingerprint {
    Fingerprinter::new("spindle.run")
        .fingerprint(&compilation.fingerprint())
        .fingerprint(&registry.fingerprint())
        .str(&options.collision_severity.to_string())
        .finish()
}
