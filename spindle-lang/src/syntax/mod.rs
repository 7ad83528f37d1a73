//! Parsing of brace source text into declarations.
//!
//! Source text is parsed with the tree-sitter C# grammar. Any error or
//! missing node fails the parse with the first one in document order. The
//! tree is then walked for namespaces, type declarations, and functions,
//! recorded as [`Declaration`]s with qualified names. Function bodies are
//! skipped.

mod collector;
mod parser;

use spindle_core::{Declaration, Span};
use thiserror::Error;

use collector::DeclarationCollector;
use parser::BraceParser;

/// A syntax error with the span it was found at.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {}", .span.offset)]
pub struct SyntaxError {
    pub message: String,
    pub span: Span,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// Parse brace source text into its declarations.
pub fn parse_declarations(src: &str) -> Result<Vec<Declaration>, SyntaxError> {
    let tree = BraceParser::new()?.parse(src)?;
    Ok(DeclarationCollector::new(src).collect(&tree))
}
