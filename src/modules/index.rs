//! The process-wide method index.
//!
//! Maps every tracked library to the set of symbols it exports and the
//! submodule path backing each symbol. Lookups outside the recorded set are
//! errors, never pass-throughs.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::layout::{list_library_modules, locate_library};

/// Libraries tracked when no explicit list is configured.
pub const DEFAULT_LIBRARIES: &[&str] = &["ramda", "ramda-extension"];

/// Errors raised while building the index. These are fatal at startup.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Library '{library}' is not installed in any node_modules above {start}")]
    LibraryNotFound { library: String, start: PathBuf },

    #[error("Library '{library}' has no source directory at {path}")]
    MissingSourceDir { library: String, path: PathBuf },

    #[error("Failed to scan library layout: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Result type for index construction.
pub type IndexResult<T> = Result<T, IndexError>;

/// A symbol was requested that the library does not export.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{library}'s method {symbol} was not a known function")]
pub struct ResolutionError {
    /// Package name of the library.
    pub library: String,
    /// The symbol that failed to resolve.
    pub symbol: String,
}

/// One of the configured utility libraries, identified by package name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TrackedLibrary(String);

impl TrackedLibrary {
    /// Create a tracked library from its package name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The default tracked set.
    pub fn defaults() -> Vec<Self> {
        DEFAULT_LIBRARIES.iter().map(|name| Self::new(*name)).collect()
    }

    /// The package name, which is also the import source it matches.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackedLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Symbol-to-submodule index for every tracked library.
#[derive(Debug, Clone, Default)]
pub struct MethodIndex {
    methods: HashMap<TrackedLibrary, BTreeMap<String, String>>,
}

impl MethodIndex {
    /// Create an empty index that tracks no libraries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index by locating each library above `start` and scanning
    /// its source layout.
    pub fn build(start: &Path, libraries: &[TrackedLibrary]) -> IndexResult<Self> {
        let mut index = Self::new();
        for library in libraries {
            let root = locate_library(start, library.name()).ok_or_else(|| {
                IndexError::LibraryNotFound {
                    library: library.to_string(),
                    start: start.to_path_buf(),
                }
            })?;
            let modules = list_library_modules(library, &root)?;
            debug!(library = %library, root = %root.display(), count = modules.len(), "indexed library");
            index.insert_library(library.clone(), modules);
        }
        Ok(index)
    }

    /// Register a library with an explicit `(symbol, submodule path)` list.
    ///
    /// Replaces any entries previously recorded for the same library.
    pub fn insert_library<I>(&mut self, library: TrackedLibrary, modules: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.methods.insert(library, modules.into_iter().collect());
    }

    /// Convenience constructor for a single library whose submodules follow
    /// the `<lib>/src/<symbol>` layout.
    pub fn from_symbols<S: AsRef<str>>(library: &str, symbols: &[S]) -> Self {
        let mut index = Self::new();
        index.insert_library(
            TrackedLibrary::new(library),
            symbols.iter().map(|s| {
                let s = s.as_ref();
                (s.to_string(), format!("{}/src/{}", library, s))
            }),
        );
        index
    }

    /// Returns the tracked library whose package name equals `source`.
    pub fn tracked(&self, source: &str) -> Option<&TrackedLibrary> {
        self.methods.keys().find(|lib| lib.name() == source)
    }

    /// All tracked libraries, sorted by name.
    pub fn libraries(&self) -> Vec<&TrackedLibrary> {
        let mut libs: Vec<_> = self.methods.keys().collect();
        libs.sort();
        libs
    }

    /// All `(symbol, submodule path)` pairs of a library, sorted by symbol.
    pub fn symbols(&self, library: &TrackedLibrary) -> Vec<(&str, &str)> {
        self.methods
            .get(library)
            .map(|m| m.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect())
            .unwrap_or_default()
    }

    /// Returns true if the library exports `symbol`.
    pub fn contains(&self, library: &TrackedLibrary, symbol: &str) -> bool {
        self.methods
            .get(library)
            .is_some_and(|m| m.contains_key(symbol))
    }

    /// Resolve a symbol to the submodule path that defines it.
    pub fn resolve(&self, library: &TrackedLibrary, symbol: &str) -> Result<&str, ResolutionError> {
        self.methods
            .get(library)
            .and_then(|m| m.get(symbol))
            .map(String::as_str)
            .ok_or_else(|| ResolutionError {
                library: library.to_string(),
                symbol: symbol.to_string(),
            })
    }
}
