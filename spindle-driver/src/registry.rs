//! The ordered set of generators a driver hosts.

use std::sync::Arc;

use spindle_core::{Fingerprint, Fingerprinter, GeneratorId, generator_dirs};
use tracing::debug;

use crate::{
    Generator, GeneratorFailure, GeneratorInfo, barrier::ExceptionBarrier,
    registration::Registration,
};

/// A generator together with the outcome of its initialization.
#[derive(Clone)]
pub(crate) struct RegisteredGenerator {
    pub id: GeneratorId,
    /// Directory of the generator's trees; see [`generator_dirs`].
    pub tree_dir: Arc<str>,
    pub generator: Arc<dyn Generator>,
    pub registration: Result<Registration, GeneratorFailure>,
}

/// Generators in registration order. The position of a generator is its
/// ordinal.
#[derive(Clone, Default)]
pub(crate) struct GeneratorRegistry {
    entries: Arc<[RegisteredGenerator]>,
}

impl GeneratorRegistry {
    /// Initialize every generator and register them in order.
    pub fn initialize(generators: impl IntoIterator<Item = Arc<dyn Generator>>) -> Self {
        Self::default().with_added(generators)
    }

    pub fn entries(&self) -> &[RegisteredGenerator] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn info(&self) -> Vec<GeneratorInfo> {
        self.entries
            .iter()
            .map(|entry| GeneratorInfo {
                id: entry.id.clone(),
                description: entry.generator.description().to_string(),
                version: entry.generator.version().to_string(),
            })
            .collect()
    }

    /// A registry with `generators` appended. Existing generators are not
    /// initialized again.
    pub fn with_added(&self, generators: impl IntoIterator<Item = Arc<dyn Generator>>) -> Self {
        let mut entries = self.entries.to_vec();
        for generator in generators {
            let id = GeneratorId::new(generator.name(), entries.len());
            let registration = ExceptionBarrier::initialize(generator.as_ref());
            debug!(generator = %id, ok = registration.is_ok(), "registered generator");
            entries.push(RegisteredGenerator {
                tree_dir: Arc::from(id.name()),
                id,
                generator,
                registration,
            });
        }
        Self::from_entries(entries)
    }

    /// A registry without the generators named in `names`; the remaining
    /// generators are renumbered.
    pub fn without(&self, names: &[&str]) -> Self {
        let entries: Vec<RegisteredGenerator> = self
            .entries
            .iter()
            .filter(|entry| !names.contains(&entry.id.name()))
            .enumerate()
            .map(|(ordinal, entry)| RegisteredGenerator {
                id: GeneratorId::new(entry.id.name(), ordinal),
                ..entry.clone()
            })
            .collect();
        Self::from_entries(entries)
    }

    fn from_entries(mut entries: Vec<RegisteredGenerator>) -> Self {
        let dirs = generator_dirs(entries.iter().map(|entry| &entry.id));
        for (entry, dir) in entries.iter_mut().zip(dirs) {
            entry.tree_dir = dir.into();
        }
        Self {
            entries: entries.into(),
        }
    }

    /// Identity of the generator set.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut fp = Fingerprinter::new("spindle.registry");
        fp.u64(self.entries.len() as u64);
        for entry in self.entries.iter() {
            fp.str(entry.id.name())
                .u64(entry.id.ordinal() as u64)
                .str(entry.generator.version());
        }
        fp.finish()
    }
}
