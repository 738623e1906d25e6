//! Source-root enumeration.
//!
//! Yields every `.java` file below a root in a stable (file-name) order, so a
//! scan over the same tree always accumulates triggers in the same order.

use crate::AnatomistError;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Directory names never descended into: VCS metadata, IDE state, build output.
const EXCLUDED_DIRS: &[&str] = &[
    ".git", ".hg", ".svn", ".idea", ".gradle", ".mvn", "target", "build", "out", "node_modules",
];

/// Lists the `.java` files under `root`.
///
/// A root that is itself a `.java` file yields just that file. Unreadable
/// subdirectories are skipped with a warning.
///
/// # Errors
/// `MissingSourceRoot` if `root` does not exist.
pub fn java_sources(root: &Path) -> Result<Vec<PathBuf>, AnatomistError> {
    if !root.exists() {
        return Err(AnatomistError::MissingSourceRoot(root.to_path_buf()));
    }
    if root.is_file() {
        return Ok(if is_java_file(root) {
            vec![root.to_path_buf()]
        } else {
            Vec::new()
        });
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_scan_excluded(e));

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(root = %root.display(), "skipping unreadable entry: {e}");
                continue;
            }
        };
        if entry.file_type().is_file() && is_java_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

fn is_java_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("java")
}

fn is_scan_excluded(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| EXCLUDED_DIRS.contains(&name))
            .unwrap_or(false)
}
