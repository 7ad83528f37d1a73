use std::collections::HashMap;

use serde::Serialize;

use crate::GeneratorId;

/// Characters hint and generator names may not contain.
const INVALID_PATH_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*'];

/// A named, generator-produced source fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GeneratedSource {
    /// Name unique within the generator's output for one run.
    pub hint_name: String,
    /// Source text.
    pub text: String,
    /// The generator that emitted it.
    pub produced_by: GeneratorId,
}

impl GeneratedSource {
    pub fn new(
        hint_name: impl Into<String>,
        text: impl Into<String>,
        produced_by: GeneratorId,
    ) -> Self {
        Self {
            hint_name: hint_name.into(),
            text: text.into(),
            produced_by,
        }
    }
}

/// Path of the syntax tree built from a generated source: `<dir>/<hint>`,
/// where `dir` is the generator's entry from [`generator_dirs`].
pub fn generated_tree_path(dir: &str, hint_name: &str) -> String {
    format!("{}/{}", dir, hint_name)
}

/// The directory each generator's trees are placed under, in registry order.
///
/// A generator's directory is its name. Generators whose names are equal
/// ignoring ASCII case share the name and are told apart by ordinal:
/// `<name>/<ordinal>`. Names never contain a separator, so no two
/// generators can produce the same tree path.
pub fn generator_dirs<'a>(ids: impl IntoIterator<Item = &'a GeneratorId>) -> Vec<String> {
    let ids: Vec<&GeneratorId> = ids.into_iter().collect();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for id in &ids {
        *counts.entry(id.name().to_ascii_lowercase()).or_default() += 1;
    }

    ids.iter()
        .map(|id| {
            let shared = counts
                .get(&id.name().to_ascii_lowercase())
                .is_some_and(|count| *count > 1);
            if shared {
                format!("{}/{}", id.name(), id.ordinal())
            } else {
                id.name().to_string()
            }
        })
        .collect()
}

/// Check whether a hint name is usable.
///
/// A hint is a relative path below the generator's directory. Returns `None`
/// if valid, or `Some(reason)` if invalid.
pub fn validate_hint_name(hint_name: &str) -> Option<String> {
    if hint_name.is_empty() {
        return Some("hint name cannot be empty".to_string());
    }

    if let Some(c) = invalid_char(hint_name) {
        return Some(format!("hint name contains invalid character {:?}", c));
    }

    if hint_name.starts_with(['/', '\\']) {
        return Some("hint name cannot be an absolute path".to_string());
    }

    for segment in hint_name.split(['/', '\\']) {
        match segment {
            "" => return Some("hint name cannot contain an empty path segment".to_string()),
            "." | ".." => {
                return Some(format!("hint name cannot contain a '{}' segment", segment));
            }
            _ => {}
        }
    }

    None
}

/// Check whether a generator name is usable as a directory name.
///
/// Returns `None` if valid, or `Some(reason)` if invalid.
pub fn validate_generator_name(name: &str) -> Option<String> {
    if name.is_empty() {
        return Some("generator name cannot be empty".to_string());
    }

    if let Some(c) = invalid_char(name) {
        return Some(format!("generator name contains invalid character {:?}", c));
    }

    if name.contains(['/', '\\']) {
        return Some("generator name cannot contain a path separator".to_string());
    }

    if name == "." || name == ".." {
        return Some(format!("generator name cannot be '{}'", name));
    }

    None
}

fn invalid_char(value: &str) -> Option<char> {
    value
        .chars()
        .find(|c| INVALID_PATH_CHARS.contains(c) || c.is_control())
}

/// Key under which hint names are compared for collisions.
pub fn hint_name_key(hint_name: &str) -> String {
    hint_name.to_ascii_lowercase()
}
