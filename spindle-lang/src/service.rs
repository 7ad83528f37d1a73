//! [`CompilationService`] implementation for brace source text.

use std::collections::{BTreeMap, BTreeSet};

use spindle_core::{
    CompilationOptions, CompilationService, CompilationUnit, Declaration, Diagnostic, Location,
    OutputKind, ParseError, ReferenceError, SyntaxTree,
};

use crate::{Result, error::SourceContext, syntax::parse_declarations};

/// Diagnostic codes reported by [`BraceService::diagnostics`].
pub mod codes {
    /// A type is defined more than once.
    pub const DUPLICATE_TYPE: &str = "BRC0001";
    /// A console application has no entry point.
    pub const MISSING_ENTRY_POINT: &str = "BRC0002";
    /// A console application has more than one entry point.
    pub const MULTIPLE_ENTRY_POINTS: &str = "BRC0003";
}

/// Reference compilation service for the brace language.
///
/// # Example
///
/// ```
/// use spindle_core::{CompilationOptions, CompilationService};
/// use spindle_lang::BraceService;
///
/// let service = BraceService::new();
/// let tree = service
///     .parse_text("a.cs", "class A { void F() { } }", &CompilationOptions::default())
///     .unwrap();
/// assert_eq!(tree.types().count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BraceService {
    known_references: BTreeSet<String>,
}

impl BraceService {
    /// Create a service that knows no name-only references.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a reference that resolves by name alone.
    pub fn with_known_reference(mut self, name: impl Into<String>) -> Self {
        self.known_references.insert(name.into());
        self
    }

    /// Parse user source text, reporting failures as rich diagnostics.
    pub fn parse_source(&self, path: &str, text: &str) -> Result<SyntaxTree> {
        parse_declarations(text)
            .map(|declarations| SyntaxTree::new(path, text, declarations))
            .map_err(|e| SourceContext::new(text, path).syntax_error(e.message, e.span))
    }

    fn duplicate_types(&self, compilation: &CompilationUnit) -> Vec<Diagnostic> {
        let mut by_name: BTreeMap<&str, Vec<(&SyntaxTree, &Declaration)>> = BTreeMap::new();
        for tree in compilation.syntax_trees() {
            for decl in tree.types() {
                by_name.entry(decl.name.as_str()).or_default().push((tree, decl));
            }
        }

        let mut diagnostics = Vec::new();
        for (name, definitions) in by_name {
            if definitions.len() < 2 || definitions.iter().all(|(_, d)| d.has_modifier("partial")) {
                continue;
            }
            for (tree, decl) in definitions.iter().skip(1) {
                diagnostics.push(
                    Diagnostic::error(format!("type '{}' is defined multiple times", name))
                        .with_code(codes::DUPLICATE_TYPE)
                        .at(Location::span(tree.path(), decl.span)),
                );
            }
        }
        diagnostics
    }

    fn entry_points(&self, compilation: &CompilationUnit) -> Vec<Diagnostic> {
        if compilation.options().output_kind != OutputKind::ConsoleApplication {
            return Vec::new();
        }

        let mains: Vec<(&SyntaxTree, &Declaration)> = compilation
            .syntax_trees()
            .iter()
            .flat_map(|tree| tree.functions().map(move |decl| (tree, decl)))
            .filter(|(_, decl)| decl.simple_name() == "Main" && decl.has_modifier("static"))
            .collect();

        if mains.is_empty() {
            return vec![
                Diagnostic::error(
                    "program does not contain a static 'Main' function suitable for an entry point",
                )
                .with_code(codes::MISSING_ENTRY_POINT),
            ];
        }

        mains
            .iter()
            .skip(1)
            .map(|(tree, decl)| {
                Diagnostic::error(format!(
                    "program has more than one entry point defined: '{}'",
                    decl.name
                ))
                .with_code(codes::MULTIPLE_ENTRY_POINTS)
                .at(Location::span(tree.path(), decl.span))
            })
            .collect()
    }
}

impl CompilationService for BraceService {
    fn parse_text(
        &self,
        path: &str,
        text: &str,
        _options: &CompilationOptions,
    ) -> std::result::Result<SyntaxTree, ParseError> {
        parse_declarations(text)
            .map(|declarations| SyntaxTree::new(path, text, declarations))
            .map_err(|e| ParseError::new(path, e.message).at(e.span))
    }

    fn resolve_references(
        &self,
        compilation: &CompilationUnit,
    ) -> std::result::Result<(), ReferenceError> {
        for reference in compilation.references() {
            match reference.path() {
                Some(path) if !path.is_file() => {
                    return Err(ReferenceError::new(
                        &reference.name,
                        format!("file '{}' does not exist", path.display()),
                    ));
                }
                Some(_) => {}
                None if !self.known_references.contains(&reference.name) => {
                    return Err(ReferenceError::new(
                        &reference.name,
                        "not a known reference and no path was given",
                    ));
                }
                None => {}
            }
        }
        Ok(())
    }

    fn diagnostics(&self, compilation: &CompilationUnit) -> Vec<Diagnostic> {
        let mut diagnostics = self.duplicate_types(compilation);
        diagnostics.extend(self.entry_points(compilation));
        diagnostics
    }
}
