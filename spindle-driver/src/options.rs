//! Driver configuration.

use std::path::Path;

use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use spindle_core::Severity;

/// Options controlling how a driver schedules and caches runs.
///
/// Loaded from the `[driver]` table of a `spindle.toml`:
///
/// ```toml
/// [driver]
/// parallel = true
/// max_parallelism = 4
/// incremental = true
/// collision_severity = "error"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriverOptions {
    /// Run generators on worker threads.
    pub parallel: bool,
    /// Upper bound on worker threads; `0` uses the available parallelism.
    pub max_parallelism: usize,
    /// Reuse the previous run's outputs when nothing changed.
    pub incremental: bool,
    /// Severity of hint-name collision diagnostics.
    pub collision_severity: Severity,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            parallel: false,
            max_parallelism: 0,
            incremental: true,
            collision_severity: Severity::Warning,
        }
    }
}

#[derive(Deserialize)]
struct OptionsDocument {
    #[serde(default)]
    driver: DriverOptions,
}

impl DriverOptions {
    /// Read the `[driver]` table of a TOML document. Other tables are ignored.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let document: OptionsDocument =
            toml::from_str(content).wrap_err("invalid [driver] configuration")?;
        Ok(document.driver)
    }

    /// Load options from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&content).wrap_err_with(|| format!("in {}", path.display()))
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn max_parallelism(mut self, max_parallelism: usize) -> Self {
        self.max_parallelism = max_parallelism;
        self
    }

    pub fn incremental(mut self, incremental: bool) -> Self {
        self.incremental = incremental;
        self
    }

    pub fn collision_severity(mut self, severity: Severity) -> Self {
        self.collision_severity = severity;
        self
    }

    /// Number of workers to use for `jobs` generators.
    pub(crate) fn worker_count(&self, jobs: usize) -> usize {
        let limit = match self.max_parallelism {
            0 => std::thread::available_parallelism().map_or(1, |n| n.get()),
            n => n,
        };
        limit.min(jobs).max(1)
    }
}
