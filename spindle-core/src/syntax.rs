//! Syntax trees as produced by a compilation service.
//!
//! The driver never inspects tree internals. A tree carries its text and a
//! flat list of [`Declaration`]s the service extracted while parsing, which is
//! what generator plugins use to find the code they care about.

use serde::{Deserialize, Serialize};

use crate::Span;

/// Kind of a declaration found in a syntax tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    Namespace,
    Type,
    Function,
}

/// A declaration found in a syntax tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Declaration {
    pub kind: DeclarationKind,
    /// Fully qualified, dot-separated name (e.g. `MyCode.Program.Main`).
    pub name: String,
    /// Modifiers as written (`public`, `static`, `partial`, ...).
    pub modifiers: Vec<String>,
    /// Span of the declaration's name.
    pub span: Span,
}

impl Declaration {
    pub fn new(kind: DeclarationKind, name: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            name: name.into(),
            modifiers: Vec::new(),
            span,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Vec<String>) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Check if the declaration carries a modifier.
    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }

    /// The last segment of the qualified name.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

/// A parsed source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SyntaxTree {
    path: String,
    text: String,
    declarations: Vec<Declaration>,
}

impl SyntaxTree {
    pub fn new(path: impl Into<String>, text: impl Into<String>, declarations: Vec<Declaration>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
            declarations,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// Type declarations in source order.
    pub fn types(&self) -> impl Iterator<Item = &Declaration> {
        self.of_kind(DeclarationKind::Type)
    }

    /// Function declarations in source order.
    pub fn functions(&self) -> impl Iterator<Item = &Declaration> {
        self.of_kind(DeclarationKind::Function)
    }

    fn of_kind(&self, kind: DeclarationKind) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter().filter(move |d| d.kind == kind)
    }
}
