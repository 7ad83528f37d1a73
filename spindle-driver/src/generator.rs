//! Generator plugin trait.

use eyre::Result;
use serde::Serialize;
use spindle_core::GeneratorId;

use crate::{ExecutionContext, RegistrationContext};

/// A source generator that can be hosted by a [`GeneratorDriver`](crate::GeneratorDriver).
///
/// Generators are constructed by the caller and handed to the driver in
/// registration order. The driver calls [`initialize`](Generator::initialize)
/// once when it is built and [`execute`](Generator::execute) once per run.
///
/// Both hooks run behind the exception barrier: returning an error or
/// panicking is reported as a diagnostic attributed to this generator and
/// never aborts the run.
///
/// # Example
///
/// ```
/// use spindle_driver::{ExecutionContext, Generator};
///
/// struct Marker;
///
/// impl Generator for Marker {
///     fn name(&self) -> &str {
///         "marker"
///     }
///
///     fn execute(&self, ctx: &mut ExecutionContext<'_>) -> eyre::Result<()> {
///         ctx.add_source("marker", "namespace Generated { class Marker { } }");
///         Ok(())
///     }
/// }
/// ```
pub trait Generator: Send + Sync {
    /// The name of this generator. Generated tree paths are prefixed with it.
    fn name(&self) -> &str;

    /// A short human-readable description.
    fn description(&self) -> &str {
        ""
    }

    /// Version of the generator's output.
    ///
    /// Part of the run fingerprint: bump it when the same input would now
    /// produce different output, so cached results are not reused.
    fn version(&self) -> &str {
        "0"
    }

    /// Called once when the driver is built.
    ///
    /// # Errors
    ///
    /// An error marks the generator as failed for the lifetime of the driver;
    /// it is never executed and every run reports the failure.
    #[allow(unused_variables)]
    fn initialize(&self, ctx: &mut RegistrationContext) -> Result<()> {
        Ok(())
    }

    /// Called once per run.
    ///
    /// # Errors
    ///
    /// An error discards every source this generator added in the run.
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<()>;
}

/// Information about a registered generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratorInfo {
    pub id: GeneratorId,
    pub description: String,
    pub version: String,
}
