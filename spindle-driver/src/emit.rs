//! Writing a run's generated sources to disk for inspection.
//!
//! The driver never touches the filesystem itself; a build step or a debug
//! command calls [`write_generated_files`] with the result it wants to keep.

use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use eyre::{Result, WrapErr, bail};
use spindle_core::{generated_tree_path, generator_dirs};

use crate::GeneratorDriverRunResult;

/// Name of the JSON file holding the serialized run result.
pub const RUN_RESULT_FILE: &str = "run.json";

/// Write every generated source to `<dir>/<tree path>` and the run result to
/// `<dir>/run.json`.
///
/// Tree paths match the ones the driver gave the generated syntax trees.
/// A path that would resolve outside `dir` is refused before anything is
/// written.
///
/// Returns the paths written, sources first, in merge order.
pub fn write_generated_files(
    result: &GeneratorDriverRunResult,
    dir: impl AsRef<Path>,
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let dirs = generator_dirs(result.results.iter().map(|r| &r.generator));
    let mut targets = Vec::new();
    for (run, tree_dir) in result.results.iter().zip(&dirs) {
        for source in &run.generated_sources {
            let relative = generated_tree_path(tree_dir, &source.hint_name);
            if !is_contained(Path::new(&relative)) {
                bail!("refusing to write '{}' outside {}", relative, dir.display());
            }
            targets.push((dir.join(relative), &source.text));
        }
    }

    fs::create_dir_all(dir).wrap_err_with(|| format!("failed to create {}", dir.display()))?;

    let mut written = Vec::new();
    for (path, text) in targets {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&path, text).wrap_err_with(|| format!("failed to write {}", path.display()))?;
        written.push(path);
    }

    let path = dir.join(RUN_RESULT_FILE);
    let json = serde_json::to_string_pretty(result)?;
    fs::write(&path, json).wrap_err_with(|| format!("failed to write {}", path.display()))?;
    written.push(path);

    Ok(written)
}

/// Whether `relative` names a path strictly below the directory it is
/// joined onto.
fn is_contained(relative: &Path) -> bool {
    relative.components().next().is_some()
        && relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}
