//! Collection of run diagnostics.

use spindle_core::Diagnostic;

/// Collects the diagnostics of a run in reporting order.
///
/// Generation diagnostics (reported by generators, collisions, failures, and
/// generated-source parse failures) come first, then the diagnostics the
/// compilation service reports against the updated compilation. Nothing added
/// to the sink is dropped.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    generation: Vec<Diagnostic>,
    compilation: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add diagnostics produced while generating.
    pub fn extend_generation(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.generation.extend(diagnostics);
    }

    /// Add diagnostics of the updated compilation.
    pub fn extend_compilation(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.compilation.extend(diagnostics);
    }

    pub fn generation(&self) -> &[Diagnostic] {
        &self.generation
    }

    pub fn compilation(&self) -> &[Diagnostic] {
        &self.compilation
    }

    /// Every diagnostic, generation first.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.generation.iter().chain(&self.compilation)
    }

    pub fn len(&self) -> usize {
        self.generation.len() + self.compilation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if any error diagnostics have been recorded.
    pub fn has_errors(&self) -> bool {
        self.iter().any(|d| d.severity.is_error())
    }

    /// Split into the generation diagnostics and the combined list.
    pub fn into_parts(self) -> (Vec<Diagnostic>, Vec<Diagnostic>) {
        let mut combined = self.generation.clone();
        combined.extend(self.compilation);
        (self.generation, combined)
    }
}
