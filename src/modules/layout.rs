//! Installed-library layout scanning.
//!
//! Libraries like ramda ship one CommonJS file per function under `src/`.
//! The file stem is the exported symbol name and `<lib>/src/<stem>` is the
//! submodule path to import it from directly.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::index::{IndexError, IndexResult, TrackedLibrary};

/// Find the installed root of `library` the way Node resolves packages:
/// check `node_modules/<library>` in `start` and each of its ancestors.
pub fn locate_library(start: &Path, library: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join("node_modules").join(library))
        .find(|candidate| candidate.is_dir())
}

/// List every `(symbol, submodule path)` pair in a library's `src/` directory.
///
/// Only `.js` files directly inside `src/` count; nested directories such as
/// `src/internal` are private helpers. Results are sorted by symbol name.
pub fn list_library_modules(
    library: &TrackedLibrary,
    root: &Path,
) -> IndexResult<Vec<(String, String)>> {
    let src = root.join("src");
    if !src.is_dir() {
        return Err(IndexError::MissingSourceDir {
            library: library.to_string(),
            path: src,
        });
    }

    let mut modules = Vec::new();
    for entry in WalkDir::new(&src)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("js") {
            continue;
        }

        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            modules.push((stem.to_string(), format!("{}/src/{}", library, stem)));
        }
    }

    Ok(modules)
}
