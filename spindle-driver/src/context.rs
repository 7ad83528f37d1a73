//! Per-generator execution context.

use indexmap::IndexMap;
use spindle_core::{
    CompilationOptions, CompilationUnit, Diagnostic, GeneratedSource, GeneratorId, Location,
    Reference, Severity, SyntaxTree, codes, generated_tree_path, hint_name_key,
    validate_hint_name,
};

use crate::{CancellationToken, registration::Registration};

/// The view of a run handed to [`Generator::execute`](crate::Generator::execute).
///
/// A context is created fresh for every (generator, run) pair. It exposes the
/// input compilation read-only and buffers everything the generator emits;
/// nothing another generator emits in the same run is visible here.
pub struct ExecutionContext<'a> {
    generator: GeneratorId,
    tree_dir: &'a str,
    compilation: &'a CompilationUnit,
    registration: &'a Registration,
    cancellation: &'a CancellationToken,
    collision_severity: Severity,
    sources: IndexMap<String, GeneratedSource>,
    diagnostics: Vec<Diagnostic>,
}

/// Everything a generator emitted in one run, in emission order.
#[derive(Debug, Default)]
pub(crate) struct ExecutionOutput {
    pub sources: Vec<GeneratedSource>,
    pub diagnostics: Vec<Diagnostic>,
}

impl<'a> ExecutionContext<'a> {
    pub(crate) fn new(
        generator: GeneratorId,
        tree_dir: &'a str,
        compilation: &'a CompilationUnit,
        registration: &'a Registration,
        cancellation: &'a CancellationToken,
        collision_severity: Severity,
    ) -> Self {
        Self {
            generator,
            tree_dir,
            compilation,
            registration,
            cancellation,
            collision_severity,
            sources: IndexMap::new(),
            diagnostics: Vec::new(),
        }
    }

    /// The id of the generator this context belongs to.
    pub fn generator(&self) -> &GeneratorId {
        &self.generator
    }

    /// The input compilation.
    pub fn compilation(&self) -> &'a CompilationUnit {
        self.compilation
    }

    /// Every syntax tree of the input compilation.
    pub fn syntax_trees(&self) -> &'a [SyntaxTree] {
        self.compilation.syntax_trees()
    }

    /// The trees accepted by this generator's registered syntax filters, or
    /// every tree if it registered none.
    pub fn candidate_trees(&self) -> impl Iterator<Item = &'a SyntaxTree> {
        let registration = self.registration;
        self.compilation
            .syntax_trees()
            .iter()
            .filter(move |tree| registration.accepts(tree))
    }

    pub fn references(&self) -> &'a [Reference] {
        self.compilation.references()
    }

    pub fn options(&self) -> &'a CompilationOptions {
        self.compilation.options()
    }

    /// Whether the run has been asked to stop.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Add a generated source.
    ///
    /// Returns `false` if the source was rejected, either because the hint
    /// name is invalid or because this generator already added a source
    /// under the same name (compared ASCII case-insensitively). The rejection
    /// is recorded as a diagnostic.
    pub fn add_source(&mut self, hint_name: impl Into<String>, text: impl Into<String>) -> bool {
        let hint_name = hint_name.into();

        if let Some(reason) = validate_hint_name(&hint_name) {
            self.diagnostics.push(
                Diagnostic::error(format!("invalid hint name '{}': {}", hint_name, reason))
                    .with_code(codes::INVALID_HINT_NAME)
                    .from_generator(self.generator.clone()),
            );
            return false;
        }

        let key = hint_name_key(&hint_name);
        if let Some(existing) = self.sources.get(&key) {
            let message = format!(
                "hint name '{}' collides with '{}' already added by this generator; the source was dropped",
                hint_name, existing.hint_name
            );
            self.diagnostics.push(
                Diagnostic::new(self.collision_severity, message)
                    .with_code(codes::HINT_NAME_COLLISION)
                    .from_generator(self.generator.clone())
                    .at(Location::file(generated_tree_path(self.tree_dir, &hint_name))),
            );
            return false;
        }

        let source = GeneratedSource::new(hint_name, text, self.generator.clone());
        self.sources.insert(key, source);
        true
    }

    /// Report a diagnostic. Its origin is set to this generator.
    pub fn report_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics
            .push(diagnostic.from_generator(self.generator.clone()));
    }

    /// Number of sources accepted so far.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Check if any error diagnostics have been recorded.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity.is_error())
    }

    pub(crate) fn into_output(self) -> ExecutionOutput {
        ExecutionOutput {
            sources: self.sources.into_values().collect(),
            diagnostics: self.diagnostics,
        }
    }
}
