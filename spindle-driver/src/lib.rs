//! Persistent driver for Spindle source generators.
//!
//! A [`GeneratorDriver`] hosts an ordered list of [`Generator`] plugins and
//! runs them against a [`CompilationUnit`](spindle_core::CompilationUnit),
//! producing a new driver snapshot, the compilation with the generated trees
//! appended, and the run's diagnostics.
//!
//! # Module Organization
//!
//! - [`aggregate`] - Merging generated sources into the compilation (ResultAggregator)
//! - [`sink`] - Ordered collection of run diagnostics (DiagnosticSink)
//! - [`emit`] - Writing generated files to disk for inspection
//! - [`testing`] - Test utilities (feature-gated)

pub mod aggregate;
mod barrier;
mod cache;
mod cancel;
mod context;
mod driver;
pub mod emit;
mod generator;
mod options;
mod registration;
mod registry;
mod result;
mod schedule;
pub mod sink;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use barrier::{FailureKind, GeneratorFailure};
pub use cancel::{CancellationToken, Cancelled};
pub use context::ExecutionContext;
pub use driver::{DriverBuilder, GeneratorDriver};
pub use generator::{Generator, GeneratorInfo};
pub use options::DriverOptions;
pub use registration::{RegistrationContext, SyntaxFilter};
pub use result::{GeneratorDriverRunResult, GeneratorRunResult};
