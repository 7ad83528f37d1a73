//! Diagnostic types shared by the driver, generators, and compilation services.
//!
//! A [`Diagnostic`] is the unit of reporting for every condition found during a
//! generator run: plugin-reported messages, contained failures, hint-name
//! collisions, parse failures of generated text, and compilation diagnostics.

use serde::{Deserialize, Serialize};

use crate::GeneratorId;

/// Stable diagnostic codes emitted by the driver itself.
pub mod codes {
    /// A generator's `execute` returned an error or panicked.
    pub const GENERATOR_FAILURE: &str = "SPN0001";
    /// A generator's `initialize` returned an error or panicked.
    pub const INITIALIZATION_FAILURE: &str = "SPN0002";
    /// A generator emitted the same hint name twice in one run.
    pub const HINT_NAME_COLLISION: &str = "SPN0003";
    /// A generator emitted a source under an unusable hint name.
    pub const INVALID_HINT_NAME: &str = "SPN0004";
    /// Generated text could not be parsed by the compilation service.
    pub const GENERATED_SOURCE_PARSE_FAILURE: &str = "SPN0005";
    /// The input compilation's references could not be resolved.
    pub const REFERENCE_RESOLUTION_FAILURE: &str = "SPN0006";
    /// The run was cancelled before it could be committed.
    pub const RUN_CANCELLED: &str = "SPN0007";
}

/// Severity level for a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message about the run.
    Info,
    /// A condition that doesn't prevent output but should be addressed.
    Warning,
    /// A condition that invalidates some or all of the output.
    Error,
}

impl Severity {
    /// Returns true if this is an error severity.
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }

    /// Returns true if this is a warning severity.
    pub fn is_warning(&self) -> bool {
        matches!(self, Severity::Warning)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Who produced a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "generator", rename_all = "lowercase")]
pub enum Origin {
    /// The driver or the compilation service.
    Host,
    /// A specific generator plugin.
    Generator(GeneratorId),
}

impl Origin {
    /// The generator this diagnostic is attributed to, if any.
    pub fn generator(&self) -> Option<&GeneratorId> {
        match self {
            Origin::Host => None,
            Origin::Generator(id) => Some(id),
        }
    }
}

/// A byte range within a source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
}

impl Span {
    pub fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    /// Exclusive end offset.
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// Where a diagnostic points: a syntax tree path and an optional span in it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    pub path: String,
    pub span: Option<Span>,
}

impl Location {
    /// A location covering a whole file.
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            span: None,
        }
    }

    /// A location covering a span in a file.
    pub fn span(path: impl Into<String>, span: Span) -> Self {
        Self {
            path: path.into(),
            span: Some(span),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.span {
            Some(span) => write!(f, "{}@{}..{}", self.path, span.offset, span.end()),
            None => write!(f, "{}", self.path),
        }
    }
}

/// A structured message describing a condition found during generation or
/// compilation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// Optional stable identifier (e.g. `SPN0003`).
    pub code: Option<String>,
    /// The diagnostic message.
    pub message: String,
    /// Who produced it.
    pub origin: Origin,
    /// Optional location in a syntax tree.
    pub location: Option<Location>,
}

impl Diagnostic {
    /// Create a diagnostic with the given severity, attributed to the host.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            origin: Origin::Host,
            location: None,
        }
    }

    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Create a new info diagnostic.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    /// Attach a stable code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Add a location to this diagnostic.
    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Attribute this diagnostic to a generator.
    pub fn from_generator(mut self, generator: GeneratorId) -> Self {
        self.origin = Origin::Generator(generator);
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.severity)?;
        if let Some(code) = &self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, ": {}", self.message)?;
        if let Origin::Generator(id) = &self.origin {
            write!(f, " (from {})", id)?;
        }
        if let Some(loc) = &self.location {
            write!(f, " (at {})", loc)?;
        }
        Ok(())
    }
}
