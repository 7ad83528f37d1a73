use crate::{CompilationOptions, CompilationUnit, Diagnostic, ParseError, ReferenceError, SyntaxTree};

/// The compilation service the driver delegates all language work to.
///
/// Implementations parse text into trees, resolve references, and compute
/// diagnostics for a compilation. They must be deterministic: the same input
/// yields the same output, which is what makes driver runs reproducible.
pub trait CompilationService: Send + Sync {
    /// Parse `text` into a syntax tree that will live at `path`.
    fn parse_text(
        &self,
        path: &str,
        text: &str,
        options: &CompilationOptions,
    ) -> Result<SyntaxTree, ParseError>;

    /// Check that every reference of `compilation` can be resolved.
    ///
    /// # Errors
    ///
    /// Returns the first reference that cannot be resolved.
    fn resolve_references(&self, compilation: &CompilationUnit) -> Result<(), ReferenceError>;

    /// Diagnostics for `compilation` as a whole.
    fn diagnostics(&self, compilation: &CompilationUnit) -> Vec<Diagnostic>;
}
