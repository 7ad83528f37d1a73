//! Compilation manifests (`spindle.toml`).
//!
//! A manifest names the compilation, lists its sources and references, and
//! picks the output kind:
//!
//! ```toml
//! [compilation]
//! name = "demo"
//! output = "console"
//! sources = ["src/program.cs"]
//!
//! [[references]]
//! path = "refs/System.Runtime.dll"
//!
//! [[references]]
//! name = "std"
//! ```
//!
//! Other tables (such as `[driver]`) are ignored here.

use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::Deserialize;
use spindle_core::{CompilationOptions, CompilationUnit, OutputKind, Reference};

use crate::{BraceService, Error, Result, error::SourceContext};

/// Root of a compilation manifest.
#[derive(Debug, Deserialize)]
pub struct CompilationManifest {
    pub compilation: CompilationSection,
    #[serde(default)]
    pub references: Vec<ReferenceEntry>,
}

/// The `[compilation]` table.
#[derive(Debug, Deserialize)]
pub struct CompilationSection {
    pub name: String,
    #[serde(default)]
    pub output: OutputKind,
    /// Source files, relative to the manifest.
    #[serde(default)]
    pub sources: Vec<PathBuf>,
}

/// A `[[references]]` entry; at least one of `name` or `path` is required.
#[derive(Debug, Deserialize)]
pub struct ReferenceEntry {
    pub name: Option<String>,
    pub path: Option<PathBuf>,
}

impl FromStr for CompilationManifest {
    type Err = Box<Error>;

    fn from_str(s: &str) -> Result<Self> {
        parse_manifest(s, "spindle.toml")
    }
}

impl CompilationManifest {
    /// Parse a manifest file from the given path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        parse_manifest(&content, &path.display().to_string())
    }

    /// Parse a manifest from a string with a custom filename for error reporting.
    pub fn from_str_with_filename(content: &str, filename: &str) -> Result<Self> {
        parse_manifest(content, filename)
    }

    /// References, with relative paths resolved against `base_dir`.
    pub fn references(&self, base_dir: &Path) -> Vec<Reference> {
        self.references
            .iter()
            .map(|entry| match (&entry.name, &entry.path) {
                (name, Some(path)) => {
                    let mut reference = Reference::from_file(base_dir.join(path));
                    if let Some(name) = name {
                        reference.name = name.clone();
                    }
                    reference
                }
                (Some(name), None) => Reference::named(name.clone()),
                // Rejected by validation.
                (None, None) => Reference::named(String::new()),
            })
            .collect()
    }

    /// Read and parse every source, producing the compilation.
    ///
    /// Tree paths are the source paths as written in the manifest, with `/`
    /// separators, so they don't depend on where the project lives.
    pub fn load(&self, base_dir: &Path, service: &BraceService) -> Result<CompilationUnit> {
        let mut trees = Vec::with_capacity(self.compilation.sources.len());
        for source in &self.compilation.sources {
            let full_path = base_dir.join(source);
            let text = std::fs::read_to_string(&full_path).map_err(|e| Error::io(&full_path, e))?;
            let tree_path = source.to_string_lossy().replace('\\', "/");
            trees.push(service.parse_source(&tree_path, &text)?);
        }

        Ok(CompilationUnit::new(
            self.compilation.name.clone(),
            trees,
            self.references(base_dir),
            CompilationOptions::new(self.compilation.output),
        ))
    }
}

/// Load the compilation described by the manifest at `path`.
pub fn load_compilation(path: impl AsRef<Path>, service: &BraceService) -> Result<CompilationUnit> {
    let path = path.as_ref();
    let manifest = CompilationManifest::from_file(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    manifest.load(base_dir, service)
}

/// Parse a manifest from content with the given filename for error reporting.
pub fn parse_manifest(content: &str, filename: &str) -> Result<CompilationManifest> {
    let source_ctx = SourceContext::new(content, filename);
    let manifest: CompilationManifest =
        toml::from_str(content).map_err(|e| source_ctx.parse_error(e))?;
    validate_manifest(&manifest, &source_ctx)?;
    Ok(manifest)
}

fn validate_manifest(manifest: &CompilationManifest, ctx: &SourceContext) -> Result<()> {
    if manifest.compilation.name.trim().is_empty() {
        return Err(ctx.validation_error("compilation name cannot be empty"));
    }

    for (index, entry) in manifest.references.iter().enumerate() {
        if entry.name.is_none() && entry.path.is_none() {
            return Err(ctx.validation_error(format!(
                "reference #{} needs a 'name' or a 'path'",
                index + 1
            )));
        }
    }

    Ok(())
}
