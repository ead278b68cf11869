//! Locating input files below a results directory.

use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Recursively collect every file below `root` accepted by `keep`, sorted by path.
pub fn walk_files<F>(root: &Path, keep: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&str) -> bool,
{
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                pending.push(path);
                continue;
            }
            let name = entry.file_name();
            if keep(&name.to_string_lossy()) {
                trace!("Found {}", path.display());
                found.push(path);
            }
        }
    }

    found.sort();
    Ok(found)
}

/// Whether a file name looks like a final predicted structure.
///
/// Unrelaxed models and ranked copies are skipped so each prediction is counted once.
pub fn is_structure_file(name: &str) -> bool {
    name.ends_with(".pdb") && !name.contains("unrelaxed") && !name.contains("ranked")
}

/// All predicted structures below `root`.
pub fn find_structure_files(root: &Path) -> Result<Vec<PathBuf>> {
    walk_files(root, is_structure_file)
}

/// All files below `root` whose name ends with `suffix`.
pub fn find_files_with_suffix(root: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    walk_files(root, |name| name.ends_with(suffix))
}
