//! Reference compilation service for Spindle.
//!
//! [`BraceService`] implements [`spindle_core::CompilationService`] for C#
//! source parsed with tree-sitter. It extracts enough structure (namespaces,
//! types, functions) for generators to inspect and for compilation
//! diagnostics to be meaningful. [`CompilationManifest`] loads a compilation
//! from a `spindle.toml` file.

// Miette's derive macro generates code that triggers these warnings
#![allow(unused_assignments)]

mod error;
mod manifest;
mod service;
pub mod syntax;

pub use error::{Error, Result, SourceContext};
pub use manifest::{
    CompilationManifest, CompilationSection, ReferenceEntry, load_compilation, parse_manifest,
};
pub use service::{BraceService, codes};
