//! Core data model for the Spindle source-generator driver.
//!
//! This crate holds the values that flow between the driver, generator
//! plugins, and the compilation service: compilations and their syntax trees,
//! generated sources, diagnostics, and fingerprints. The
//! [`CompilationService`] trait is the seam behind which all language work
//! (parsing, reference resolution, semantic checks) lives.

mod compilation;
mod diagnostic;
mod error;
mod fingerprint;
mod id;
mod service;
mod source;
mod syntax;

// Compilation snapshot
pub use compilation::{CompilationOptions, CompilationUnit, OutputKind, Reference};
// Diagnostics
pub use diagnostic::{Diagnostic, Location, Origin, Severity, Span, codes};
pub use error::{ParseError, ReferenceError};
pub use fingerprint::{Fingerprint, Fingerprinter};
pub use id::GeneratorId;
pub use service::CompilationService;
// Generated output
pub use source::{
    GeneratedSource, generated_tree_path, generator_dirs, hint_name_key, validate_generator_name,
    validate_hint_name,
};
pub use syntax::{Declaration, DeclarationKind, SyntaxTree};
