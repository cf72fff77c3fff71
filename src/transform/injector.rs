//! Lazy, deduplicated injection of direct submodule imports.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::modules::{MethodIndex, ResolutionError, TrackedLibrary};

/// Handle to an injected binding.
///
/// Every rewrite site gets its own clone; no two tree positions share one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectedRef {
    local: String,
}

impl InjectedRef {
    /// The local identifier bound to the submodule's default export.
    pub fn name(&self) -> &str {
        &self.local
    }
}

impl fmt::Display for InjectedRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.local)
    }
}

/// A default-style import registered in the current unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InjectedImport {
    pub library: TrackedLibrary,
    pub symbol: String,
    pub local: String,
    pub path: String,
}

impl InjectedImport {
    /// Render as an ES module import declaration.
    pub fn render(&self) -> String {
        format!("import {} from \"{}\";", self.local, self.path)
    }
}

/// Per-unit cache of injected imports, keyed by `(library, symbol)`.
#[derive(Debug, Default)]
pub struct ImportInjector {
    cache: HashMap<(TrackedLibrary, String), InjectedRef>,
    imports: Vec<InjectedImport>,
    /// Names already spelled in the unit or handed out by this injector.
    taken: HashSet<String>,
}

impl ImportInjector {
    /// Create an injector that avoids every name in `taken`.
    pub fn new(taken: HashSet<String>) -> Self {
        Self {
            taken,
            ..Self::default()
        }
    }

    /// Return a reference to the direct import of `symbol`, registering the
    /// import on first use.
    pub fn inject(
        &mut self,
        index: &MethodIndex,
        library: &TrackedLibrary,
        symbol: &str,
    ) -> Result<InjectedRef, ResolutionError> {
        let key = (library.clone(), symbol.to_string());
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached.clone());
        }

        let path = index.resolve(library, symbol)?.to_string();
        let local = self.allocate(symbol);
        debug!(library = %library, symbol, local = %local, path = %path, "injecting import");

        self.imports.push(InjectedImport {
            library: library.clone(),
            symbol: symbol.to_string(),
            local: local.clone(),
            path,
        });
        let injected = InjectedRef { local };
        self.cache.insert(key, injected.clone());
        Ok(injected)
    }

    /// Imports registered so far, in order of first use.
    pub fn imports(&self) -> &[InjectedImport] {
        &self.imports
    }

    pub fn into_imports(self) -> Vec<InjectedImport> {
        self.imports
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }

    /// All registered imports, one declaration per line.
    pub fn render_prelude(&self) -> String {
        self.imports
            .iter()
            .map(|import| format!("{}\n", import.render()))
            .collect()
    }

    /// Pick `_symbol`, or `_symbol2`, `_symbol3`, ... if that name is taken.
    fn allocate(&mut self, symbol: &str) -> String {
        let base: String = std::iter::once('_')
            .chain(symbol.chars().map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                    c
                } else {
                    '_'
                }
            }))
            .collect();

        let mut candidate = base.clone();
        let mut suffix = 2;
        while self.taken.contains(&candidate) {
            candidate = format!("{}{}", base, suffix);
            suffix += 1;
        }
        self.taken.insert(candidate.clone());
        candidate
    }
}
