//! Declaration extraction from a parsed tree.

use spindle_core::{Declaration, DeclarationKind};
use tree_sitter::{Node, Tree};

use super::parser::{node_span, node_text};

const TYPE_KINDS: &[&str] = &[
    "class_declaration",
    "enum_declaration",
    "interface_declaration",
    "record_declaration",
    "record_struct_declaration",
    "struct_declaration",
];

const FUNCTION_KINDS: &[&str] = &[
    "constructor_declaration",
    "local_function_statement",
    "method_declaration",
];

/// A namespace or type name that qualifies the declarations below it.
struct ScopeEntry {
    /// Depth of the node the scope applies beneath.
    depth: usize,
    name: String,
}

/// Collects namespaces, types, and functions in document order.
///
/// The walk is driven by a tree cursor, so nesting depth only costs heap.
/// Function bodies are not entered.
pub(crate) struct DeclarationCollector<'s> {
    source: &'s str,
    scope: Vec<ScopeEntry>,
    declarations: Vec<Declaration>,
}

impl<'s> DeclarationCollector<'s> {
    pub(crate) fn new(source: &'s str) -> Self {
        Self {
            source,
            scope: Vec::new(),
            declarations: Vec::new(),
        }
    }

    pub(crate) fn collect(mut self, tree: &Tree) -> Vec<Declaration> {
        let mut cursor = tree.walk();
        let mut depth = 0usize;

        'walk: loop {
            while self.scope.last().is_some_and(|entry| entry.depth >= depth) {
                self.scope.pop();
            }

            let descend = self.visit(&cursor.node(), depth);
            if descend && cursor.goto_first_child() {
                depth += 1;
                continue;
            }

            loop {
                if cursor.goto_next_sibling() {
                    continue 'walk;
                }
                if !cursor.goto_parent() {
                    break 'walk;
                }
                depth -= 1;
            }
        }

        self.declarations
    }

    /// Record `node` if it declares something; returns whether to walk its
    /// children.
    fn visit(&mut self, node: &Node, depth: usize) -> bool {
        let kind = node.kind();
        match kind {
            "namespace_declaration" | "file_scoped_namespace_declaration" => {
                let Some(name) = self.record(node, DeclarationKind::Namespace) else {
                    return true;
                };
                // A file-scoped namespace covers the siblings that follow it.
                let depth = if kind == "namespace_declaration" {
                    depth
                } else {
                    depth.saturating_sub(1)
                };
                self.scope.push(ScopeEntry { depth, name });
                true
            }
            _ if TYPE_KINDS.contains(&kind) => {
                if let Some(name) = self.record(node, DeclarationKind::Type) {
                    self.scope.push(ScopeEntry { depth, name });
                }
                true
            }
            _ if FUNCTION_KINDS.contains(&kind) => {
                self.record(node, DeclarationKind::Function);
                false
            }
            _ => true,
        }
    }

    /// Push a declaration for `node`, returning its unqualified name.
    fn record(&mut self, node: &Node, kind: DeclarationKind) -> Option<String> {
        let name_node = node.child_by_field_name("name")?;
        let name: String = node_text(&name_node, self.source)
            .split_whitespace()
            .collect();

        let qualified = self
            .scope
            .iter()
            .map(|entry| entry.name.as_str())
            .chain(std::iter::once(name.as_str()))
            .collect::<Vec<_>>()
            .join(".");

        self.declarations.push(
            Declaration::new(kind, qualified, node_span(&name_node))
                .with_modifiers(self.modifiers(node)),
        );
        Some(name)
    }

    fn modifiers(&self, node: &Node) -> Vec<String> {
        let mut cursor = node.walk();
        node.children(&mut cursor)
            .filter(|child| child.kind() == "modifier")
            .map(|child| node_text(&child, self.source).to_string())
            .collect()
    }
}
