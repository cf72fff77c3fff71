//! Binding tracking for tracked-library imports.
//!
//! Parses a unit's top-level import declarations and records, per tracked
//! library, which local names alias the whole library and which name a single
//! exported symbol. Lookups are gated on the scope tree so a shadowing local
//! never matches.

use std::collections::{HashMap, HashSet};

use tree_sitter::Node;

use crate::modules::TrackedLibrary;
use crate::syntax::{
    has_token, named_children, node_text, string_value, BindingKind, ScopeTree,
};

/// An individual import specifier within an import statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSpecifier {
    /// Default import: `import R from 'ramda'`
    Default(String),
    /// Named import: `import { map } from 'ramda'` or `import { map as m } from 'ramda'`
    Named {
        imported: String,
        local: String,
        /// `import { type T } from '...'` in TypeScript.
        type_only: bool,
    },
    /// Namespace import: `import * as R from 'ramda'`
    Namespace(String),
}

impl ImportSpecifier {
    /// Returns the local name (the name used in the importing file).
    pub fn local_name(&self) -> &str {
        match self {
            ImportSpecifier::Default(name) => name,
            ImportSpecifier::Named { local, .. } => local,
            ImportSpecifier::Namespace(name) => name,
        }
    }

    /// Returns true if the specifier binds the whole library.
    ///
    /// `import { default as R }` is the default import spelled differently.
    pub fn is_whole_library(&self) -> bool {
        match self {
            ImportSpecifier::Default(_) | ImportSpecifier::Namespace(_) => true,
            ImportSpecifier::Named { imported, .. } => imported == "default",
        }
    }
}

/// A parsed `import` statement.
#[derive(Debug, Clone)]
pub struct ImportDeclaration {
    /// The source module (e.g. "ramda")
    pub source: String,
    /// The specifiers being imported; empty for `import 'ramda'`.
    pub specifiers: Vec<ImportSpecifier>,
    /// `import type { ... }` in TypeScript.
    pub type_only: bool,
    /// Line number in the source file (1-indexed)
    pub line: usize,
}

impl ImportDeclaration {
    /// Parse an `import_statement` node.
    pub fn parse(node: Node<'_>, source: &str) -> Option<Self> {
        let source_node = node.child_by_field_name("source")?;
        let source_module = string_value(source_node, source)?;
        let mut specifiers = Vec::new();

        for child in named_children(node) {
            if child.kind() == "import_clause" {
                parse_import_clause(child, source, &mut specifiers);
            }
        }

        Some(Self {
            source: source_module,
            specifiers,
            type_only: has_token(node, "type") || has_token(node, "typeof"),
            line: node.start_position().row + 1,
        })
    }

    /// Named specifiers that only import types.
    pub fn type_only_specifiers(&self) -> impl Iterator<Item = &ImportSpecifier> {
        self.specifiers
            .iter()
            .filter(|s| matches!(s, ImportSpecifier::Named { type_only: true, .. }))
    }
}

/// Parse the import clause (everything between 'import' and 'from').
fn parse_import_clause(node: Node<'_>, source: &str, specifiers: &mut Vec<ImportSpecifier>) {
    for child in named_children(node) {
        match child.kind() {
            "identifier" => {
                specifiers.push(ImportSpecifier::Default(
                    node_text(child, source).to_string(),
                ));
            }
            "namespace_import" => {
                if let Some(name) = named_children(child)
                    .into_iter()
                    .find(|c| c.kind() == "identifier")
                {
                    specifiers.push(ImportSpecifier::Namespace(
                        node_text(name, source).to_string(),
                    ));
                }
            }
            "named_imports" => {
                for spec in named_children(child) {
                    if spec.kind() == "import_specifier" {
                        if let Some(spec) = parse_import_specifier(spec, source) {
                            specifiers.push(spec);
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

/// Parse a single import specifier: `foo`, `foo as bar` or `"foo" as bar`.
fn parse_import_specifier(node: Node<'_>, source: &str) -> Option<ImportSpecifier> {
    let name = node.child_by_field_name("name")?;
    let imported =
        string_value(name, source).unwrap_or_else(|| node_text(name, source).to_string());
    let local = match node.child_by_field_name("alias") {
        Some(alias) => node_text(alias, source).to_string(),
        None => imported.clone(),
    };

    Some(ImportSpecifier::Named {
        imported,
        local,
        type_only: has_token(node, "type") || has_token(node, "typeof"),
    })
}

/// Namespace and named bindings of tracked libraries within one unit.
#[derive(Debug, Default)]
pub struct BindingTracker {
    namespaces: HashMap<TrackedLibrary, HashSet<String>>,
    named: HashMap<TrackedLibrary, HashMap<String, String>>,
}

impl BindingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `local` as an alias of the whole library.
    pub fn record_namespace(&mut self, library: &TrackedLibrary, local: &str) {
        self.namespaces
            .entry(library.clone())
            .or_default()
            .insert(local.to_string());
    }

    /// Record `local` as bound to the library's `canonical` symbol.
    pub fn record_named(&mut self, library: &TrackedLibrary, local: &str, canonical: &str) {
        self.named
            .entry(library.clone())
            .or_default()
            .insert(local.to_string(), canonical.to_string());
    }

    /// Record every value binding of a tracked import declaration.
    /// Returns the number of bindings recorded.
    pub fn record_declaration(&mut self, library: &TrackedLibrary, decl: &ImportDeclaration) -> usize {
        let mut recorded = 0;
        for spec in &decl.specifiers {
            match spec {
                ImportSpecifier::Named {
                    type_only: true, ..
                } => continue,
                spec if spec.is_whole_library() => {
                    self.record_namespace(library, spec.local_name())
                }
                ImportSpecifier::Named {
                    imported, local, ..
                } => self.record_named(library, local, imported),
                _ => continue,
            }
            recorded += 1;
        }
        recorded
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.values().all(HashSet::is_empty) && self.named.values().all(HashMap::is_empty)
    }

    /// If `name` at `node` refers to a whole-library alias, return its library.
    pub fn namespace_alias(
        &self,
        scopes: &ScopeTree,
        node: Node<'_>,
        name: &str,
    ) -> Option<&TrackedLibrary> {
        let (library, _) = self
            .namespaces
            .iter()
            .find(|(_, locals)| locals.contains(name))?;
        scopes
            .binding_kind(node, name)
            .filter(BindingKind::is_whole_module_import)
            .map(|_| library)
    }

    /// If `name` at `node` refers to a named library symbol, return the
    /// library and the symbol's canonical name.
    pub fn named_symbol(
        &self,
        scopes: &ScopeTree,
        node: Node<'_>,
        name: &str,
    ) -> Option<(&TrackedLibrary, &str)> {
        let (library, canonical) = self
            .named
            .iter()
            .find_map(|(lib, locals)| locals.get(name).map(|c| (lib, c.as_str())))?;
        match scopes.binding_kind(node, name) {
            Some(BindingKind::ImportSpecifier) => Some((library, canonical)),
            _ => None,
        }
    }
}
