//! Containment of generator failures.
//!
//! Every call into a generator goes through [`ExceptionBarrier`]. A failure,
//! whether an `Err` returned from a hook or a panic, is turned into a
//! [`GeneratorFailure`] and a diagnostic attributed to the generator, and the
//! generator's sources for that run are discarded.

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
};

use serde::Serialize;
use spindle_core::{
    CompilationUnit, Diagnostic, GeneratorId, Severity, codes, validate_generator_name,
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    CancellationToken, ExecutionContext, Generator, GeneratorRunResult, RegistrationContext,
    registration::Registration, registry::RegisteredGenerator,
};

/// How a generator failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// `execute` returned an error.
    Error,
    /// `execute` panicked.
    Panic,
    /// `initialize` failed; the generator is never executed.
    Initialization,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Error => "error",
            FailureKind::Panic => "panic",
            FailureKind::Initialization => "initialization failure",
        }
    }
}

/// A failure captured by the exception barrier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Error)]
#[error("{}: {message}", .kind.as_str())]
pub struct GeneratorFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl GeneratorFailure {
    fn from_report(report: &eyre::Report) -> Self {
        let message = report
            .chain()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(": ");
        Self {
            kind: FailureKind::Error,
            message,
        }
    }

    fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "generator panicked".to_string()
        };
        Self {
            kind: FailureKind::Panic,
            message,
        }
    }

    /// The diagnostic reporting this failure.
    pub fn to_diagnostic(&self, generator: &GeneratorId) -> Diagnostic {
        let (code, message) = match self.kind {
            FailureKind::Initialization => (
                codes::INITIALIZATION_FAILURE,
                format!(
                    "generator '{}' failed to initialize and will not run: {}",
                    generator, self.message
                ),
            ),
            FailureKind::Error | FailureKind::Panic => (
                codes::GENERATOR_FAILURE,
                format!(
                    "generator '{}' failed and will not contribute to the output: {}",
                    generator, self.message
                ),
            ),
        };
        Diagnostic::new(Severity::Error, message)
            .with_code(code)
            .from_generator(generator.clone())
    }
}

/// Per-run settings shared by every generator execution.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RunSettings<'a> {
    pub collision_severity: Severity,
    pub cancellation: &'a CancellationToken,
}

/// Runs generator hooks so that no failure escapes.
pub(crate) struct ExceptionBarrier;

impl ExceptionBarrier {
    /// Run `initialize`, returning what the generator registered.
    ///
    /// A generator whose name cannot be used as a directory fails here
    /// without `initialize` being called.
    pub fn initialize(generator: &dyn Generator) -> Result<Registration, GeneratorFailure> {
        let name = generator.name();
        let outcome = match validate_generator_name(name) {
            Some(reason) => Err(format!("invalid generator name '{}': {}", name, reason)),
            None => {
                let mut ctx = RegistrationContext::new();
                contain(|| generator.initialize(&mut ctx))
                    .map(|()| ctx.finish())
                    .map_err(|failure| failure.message)
            }
        };

        outcome.map_err(|message| {
            let failure = GeneratorFailure {
                kind: FailureKind::Initialization,
                message,
            };
            warn!(generator = name, %failure, "generator failed to initialize");
            failure
        })
    }

    /// Execute one generator against `compilation`.
    pub fn execute(
        entry: &RegisteredGenerator,
        compilation: &CompilationUnit,
        settings: RunSettings<'_>,
    ) -> GeneratorRunResult {
        let id = entry.id.clone();

        let registration = match &entry.registration {
            Ok(registration) => registration,
            Err(failure) => {
                return GeneratorRunResult {
                    diagnostics: vec![failure.to_diagnostic(&id)],
                    generator: id,
                    generated_sources: Vec::new(),
                    captured_failure: Some(failure.clone()),
                };
            }
        };

        debug!(generator = %id, "executing generator");
        let mut ctx = ExecutionContext::new(
            id.clone(),
            &entry.tree_dir,
            compilation,
            registration,
            settings.cancellation,
            settings.collision_severity,
        );
        for (hint_name, text) in registration.post_initialization_sources() {
            ctx.add_source(hint_name.as_str(), text.as_str());
        }

        let outcome = contain(|| entry.generator.execute(&mut ctx));
        let output = ctx.into_output();

        match outcome {
            Ok(()) => {
                debug!(
                    generator = %id,
                    sources = output.sources.len(),
                    diagnostics = output.diagnostics.len(),
                    "generator finished"
                );
                GeneratorRunResult {
                    generator: id,
                    generated_sources: output.sources,
                    diagnostics: output.diagnostics,
                    captured_failure: None,
                }
            }
            Err(failure) => {
                warn!(
                    generator = %id,
                    %failure,
                    discarded_sources = output.sources.len(),
                    "generator failed"
                );
                let mut diagnostics = output.diagnostics;
                diagnostics.push(failure.to_diagnostic(&id));
                GeneratorRunResult {
                    generator: id,
                    generated_sources: Vec::new(),
                    diagnostics,
                    captured_failure: Some(failure),
                }
            }
        }
    }
}

/// Call `f`, turning an error or a panic into a [`GeneratorFailure`].
fn contain<T>(f: impl FnOnce() -> eyre::Result<T>) -> Result<T, GeneratorFailure> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(report)) => Err(GeneratorFailure::from_report(&report)),
        Err(payload) => Err(GeneratorFailure::from_panic(payload)),
    }
}
