use std::sync::Arc;

use serde::Serialize;

/// Identifies a generator within a driver's registry.
///
/// The name comes from the plugin; the ordinal is its position in the
/// registry, so two instances of the same plugin stay distinguishable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GeneratorId {
    name: Arc<str>,
    ordinal: usize,
}

impl GeneratorId {
    pub fn new(name: impl Into<Arc<str>>, ordinal: usize) -> Self {
        Self {
            name: name.into(),
            ordinal,
        }
    }

    /// The plugin's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position in the registry (0-based).
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }
}

impl std::fmt::Display for GeneratorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
