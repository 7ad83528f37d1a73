//! Run results.

use serde::Serialize;
use spindle_core::{Diagnostic, GeneratedSource, GeneratorId, SyntaxTree};

use crate::GeneratorFailure;

/// The outcome of one generator in one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratorRunResult {
    pub generator: GeneratorId,
    /// Sources that were accepted, in emission order. Always empty when
    /// `captured_failure` is set.
    pub generated_sources: Vec<GeneratedSource>,
    /// Diagnostics reported by or about the generator during its execution.
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured_failure: Option<GeneratorFailure>,
}

impl GeneratorRunResult {
    pub fn succeeded(&self) -> bool {
        self.captured_failure.is_none()
    }

    /// Find a generated source by hint name (ASCII case-insensitive).
    pub fn source(&self, hint_name: &str) -> Option<&GeneratedSource> {
        self.generated_sources
            .iter()
            .find(|s| s.hint_name.eq_ignore_ascii_case(hint_name))
    }
}

/// The outcome of a whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratorDriverRunResult {
    /// Trees parsed from generated sources, in merge order.
    pub generated_trees: Vec<SyntaxTree>,
    /// Diagnostics produced by generation. Diagnostics of the updated
    /// compilation itself are not included.
    pub diagnostics: Vec<Diagnostic>,
    /// One entry per registered generator, in registration order.
    pub results: Vec<GeneratorRunResult>,
}

impl GeneratorDriverRunResult {
    /// The result of the first generator registered under `name`.
    pub fn result_for(&self, name: &str) -> Option<&GeneratorRunResult> {
        self.results.iter().find(|r| r.generator.name() == name)
    }

    /// Check if any error diagnostics have been recorded.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity.is_error())
    }

    /// Generators whose failure was captured in this run.
    pub fn failed_generators(&self) -> impl Iterator<Item = &GeneratorId> {
        self.results
            .iter()
            .filter(|r| !r.succeeded())
            .map(|r| &r.generator)
    }
}
