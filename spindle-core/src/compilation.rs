//! The immutable compilation snapshot generators run against.

use std::{
    path::{Path, PathBuf},
    sync::{Arc, OnceLock},
};

use serde::{Deserialize, Serialize};

use crate::{Fingerprint, Fingerprinter, SyntaxTree};

/// What the compilation produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputKind {
    /// An executable; requires exactly one entry point.
    #[serde(alias = "console", alias = "exe")]
    ConsoleApplication,
    /// A library; no entry point.
    #[default]
    Library,
}

impl OutputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputKind::ConsoleApplication => "console-application",
            OutputKind::Library => "library",
        }
    }
}

/// Options the compilation was created with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompilationOptions {
    #[serde(default)]
    pub output_kind: OutputKind,
}

impl CompilationOptions {
    pub fn new(output_kind: OutputKind) -> Self {
        Self { output_kind }
    }
}

/// A metadata reference: either a file on disk or a name the compilation
/// service knows how to resolve.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    pub name: String,
    pub path: Option<PathBuf>,
}

impl Reference {
    /// A reference resolved by name alone.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
        }
    }

    /// A reference to a file; its name is the file stem.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            path: Some(path),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[derive(Debug)]
struct CompilationData {
    name: String,
    syntax_trees: Vec<SyntaxTree>,
    references: Vec<Reference>,
    options: CompilationOptions,
    fingerprint: OnceLock<Fingerprint>,
}

/// An immutable snapshot of a program: ordered syntax trees, references, and
/// options.
///
/// Cloning is cheap; all clones share the same data. Every "modification"
/// returns a new unit and leaves the receiver untouched.
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    data: Arc<CompilationData>,
}

impl CompilationUnit {
    pub fn new(
        name: impl Into<String>,
        syntax_trees: Vec<SyntaxTree>,
        references: Vec<Reference>,
        options: CompilationOptions,
    ) -> Self {
        Self {
            data: Arc::new(CompilationData {
                name: name.into(),
                syntax_trees,
                references,
                options,
                fingerprint: OnceLock::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn syntax_trees(&self) -> &[SyntaxTree] {
        &self.data.syntax_trees
    }

    pub fn references(&self) -> &[Reference] {
        &self.data.references
    }

    pub fn options(&self) -> &CompilationOptions {
        &self.data.options
    }

    /// Find a tree by path.
    pub fn tree(&self, path: &str) -> Option<&SyntaxTree> {
        self.data.syntax_trees.iter().find(|t| t.path() == path)
    }

    /// A new compilation with `trees` appended after the existing ones.
    pub fn with_trees(&self, trees: impl IntoIterator<Item = SyntaxTree>) -> Self {
        let mut syntax_trees = self.data.syntax_trees.clone();
        syntax_trees.extend(trees);
        Self::new(
            self.data.name.clone(),
            syntax_trees,
            self.data.references.clone(),
            self.data.options.clone(),
        )
    }

    /// A new compilation with different references.
    pub fn with_references(&self, references: Vec<Reference>) -> Self {
        Self::new(
            self.data.name.clone(),
            self.data.syntax_trees.clone(),
            references,
            self.data.options.clone(),
        )
    }

    /// Content-derived identity; computed once per value.
    pub fn fingerprint(&self) -> Fingerprint {
        *self.data.fingerprint.get_or_init(|| {
            let mut fp = Fingerprinter::new("spindle.compilation");
            fp.str(&self.data.name)
                .str(self.data.options.output_kind.as_str())
                .u64(self.data.references.len() as u64);
            for reference in &self.data.references {
                fp.str(&reference.name);
                match &reference.path {
                    Some(path) => fp.str(&path.to_string_lossy()),
                    None => fp.str(""),
                };
            }
            fp.u64(self.data.syntax_trees.len() as u64);
            for tree in &self.data.syntax_trees {
                fp.str(tree.path()).str(tree.text());
            }
            fp.finish()
        })
    }

    /// Check if two values are the same content.
    pub fn same_content(&self, other: &CompilationUnit) -> bool {
        Arc::ptr_eq(&self.data, &other.data) || self.fingerprint() == other.fingerprint()
    }
}
