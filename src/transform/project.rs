//! Discovery of source files to transform.

use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::syntax::SourceLanguage;

/// Expand `paths` into the list of source files to process.
///
/// Directories are walked recursively, skipping [ignored](is_ignored_dir)
/// directories below the starting point. Files named explicitly are kept as
/// given even if their extension is unknown, so the caller can report them.
pub fn collect_source_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for root in paths {
        if !root.is_dir() {
            files.push(root.clone());
            continue;
        }

        for entry in WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_ignored_dir(e))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().is_file() && is_source_file(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }

    files
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(SourceLanguage::from_extension)
        .is_some()
}

/// Check if a directory should be ignored during traversal.
pub fn is_ignored_dir(entry: &walkdir::DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }

    let name = entry.file_name().to_string_lossy();
    matches!(
        name.as_ref(),
        "node_modules" | ".git" | "dist" | "build" | ".next" | "coverage" | ".turbo"
    )
}
