//! Tree-sitter parser for brace source text.

use spindle_core::Span;
use tree_sitter::{Node, Parser, Tree};

use super::SyntaxError;

/// Longest token text quoted in an "unexpected" message.
const MAX_QUOTED_LEN: usize = 32;

pub(crate) struct BraceParser {
    parser: Parser,
}

impl BraceParser {
    pub(crate) fn new() -> Result<Self, SyntaxError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_c_sharp::LANGUAGE.into())
            .map_err(|e| SyntaxError::new(format!("failed to load grammar: {e}"), Span::new(0, 0)))?;
        Ok(Self { parser })
    }

    /// Parse `source`, failing on the first syntax error in document order.
    pub(crate) fn parse(&mut self, source: &str) -> Result<Tree, SyntaxError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| SyntaxError::new("parser produced no tree", Span::new(0, 0)))?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(describe(first_error(root), source));
        }
        Ok(tree)
    }
}

pub(crate) fn node_span(node: &Node) -> Span {
    Span::new(node.start_byte(), node.end_byte() - node.start_byte())
}

pub(crate) fn node_text<'s>(node: &Node, source: &'s str) -> &'s str {
    source.get(node.byte_range()).unwrap_or_default()
}

/// The outermost error or missing node on the leftmost erroneous path.
fn first_error(root: Node<'_>) -> Node<'_> {
    let mut node = root;
    loop {
        if node.is_error() || node.is_missing() {
            return node;
        }
        let mut cursor = node.walk();
        let next = node.children(&mut cursor).find(|child| child.has_error());
        match next {
            Some(child) => node = child,
            None => return node,
        }
    }
}

fn describe(node: Node<'_>, source: &str) -> SyntaxError {
    if node.is_missing() {
        let message = if node.is_named() {
            format!("expected {}", node.kind().replace('_', " "))
        } else {
            format!("expected '{}'", node.kind())
        };
        return SyntaxError::new(message, node_span(&node));
    }

    let mut leaf = node;
    while let Some(child) = leaf.child(0) {
        leaf = child;
    }
    let text = node_text(&leaf, source).trim();
    if text.is_empty() {
        return SyntaxError::new("unexpected end of input", Span::new(node.start_byte(), 0));
    }
    let quoted: String = text.chars().take(MAX_QUOTED_LEN).collect();
    SyntaxError::new(format!("unexpected '{}'", quoted), node_span(&leaf))
}
