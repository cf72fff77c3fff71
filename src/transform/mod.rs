//! The rewrite engine.
//!
//! A [`Transformer`] rewrites one compilation unit at a time. For each unit
//! it creates a fresh [`UnitContext`] holding the binding tracker, the import
//! injector and the pending edits, so nothing leaks between files and the
//! same file can be reprocessed any number of times.
//!
//! Processing is two-pass:
//!
//! 1. **Collect** - every top-level import of a tracked library is recorded
//!    and scheduled for removal; wildcard re-exports are rejected here, before
//!    anything else happens.
//! 2. **Rewrite** - one depth-first traversal dispatches each node to the
//!    rule for its [`NodeShape`](crate::syntax::NodeShape).
//!
//! Edits are applied only after both passes succeed.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use modshake::modules::MethodIndex;
//! use modshake::syntax::SourceLanguage;
//! use modshake::transform::Transformer;
//!
//! let index = MethodIndex::from_symbols("ramda", &["compose", "map"]);
//! let mut transformer = Transformer::new(&index)?;
//! let output = transformer.transform_source(
//!     "import { compose } from 'ramda';\ncompose(f, g);\n",
//!     SourceLanguage::JavaScript,
//!     Path::new("input.js"),
//! )?;
//! assert_eq!(
//!     output.code,
//!     "import _compose from \"ramda/src/compose\";\n_compose(f, g);\n"
//! );
//! ```

pub mod bindings;
pub mod injector;
pub mod project;
mod rules;

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};
use tree_sitter::Node;

use crate::modules::{MethodIndex, ResolutionError, TrackedLibrary};
use crate::syntax::{
    collect_names, first_error_line, named_children, node_text, prelude_offset, EditError,
    EditSet, ScopeTree, SourceLanguage, SourceParser,
};

pub use bindings::{BindingTracker, ImportDeclaration, ImportSpecifier};
pub use injector::{ImportInjector, InjectedImport, InjectedRef};
pub use project::{collect_source_files, is_ignored_dir};

/// A tracked library was used in a form that cannot be decomposed into a
/// finite set of direct imports.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{form}' defeats the purpose of modshake: {library} cannot be split into direct submodule imports")]
pub struct UnsupportedFormError {
    pub library: String,
    /// The offending source text.
    pub form: String,
}

/// Errors that abort processing of one compilation unit.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse file: {path}")]
    ParseError { path: String },

    #[error("Syntax error in {path} at line {line}; refusing to rewrite")]
    SyntaxError { path: String, line: usize },

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Tree-sitter language initialization failed")]
    LanguageInit,

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    UnsupportedForm(#[from] UnsupportedFormError),

    #[error("Conflicting rewrites: {0}")]
    Edit(#[from] EditError),
}

/// Result type for transform operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// The rewritten unit and what was done to it.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    /// The rewritten source text.
    pub code: String,
    /// Direct imports added, in order of first use.
    pub injected: Vec<InjectedImport>,
    /// Tracked-library import declarations removed or reduced.
    pub removed_imports: usize,
    /// Use sites rewritten.
    pub rewrites: usize,
    /// Whether `code` differs from the input.
    pub changed: bool,
}

impl TransformOutput {
    fn unchanged(source: &str) -> Self {
        Self {
            code: source.to_string(),
            injected: Vec::new(),
            removed_imports: 0,
            rewrites: 0,
            changed: false,
        }
    }
}

/// State for one compilation unit. Created fresh by every transform call.
struct UnitContext<'a> {
    index: &'a MethodIndex,
    source: &'a str,
    scopes: ScopeTree,
    bindings: BindingTracker,
    injector: ImportInjector,
    edits: EditSet,
    /// Node ids already rewritten; no rule touches them again.
    claimed: HashSet<usize>,
    removed_imports: usize,
    tracked_reexports: usize,
    rewrites: usize,
}

impl<'a> UnitContext<'a> {
    fn begin(index: &'a MethodIndex, source: &'a str) -> Self {
        Self {
            index,
            source,
            scopes: ScopeTree::default(),
            bindings: BindingTracker::new(),
            injector: ImportInjector::default(),
            edits: EditSet::new(),
            claimed: HashSet::new(),
            removed_imports: 0,
            tracked_reexports: 0,
            rewrites: 0,
        }
    }

    /// First pass: record tracked imports and reject wildcard re-exports.
    fn collect(&mut self, program: Node<'_>) -> TransformResult<()> {
        for statement in named_children(program) {
            match statement.kind() {
                "import_statement" => self.collect_import(statement),
                "export_statement" => {
                    if rules::tracked_export_source(self, statement).is_some() {
                        rules::reject_wildcard_reexport(self, statement)?;
                        self.tracked_reexports += 1;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn collect_import(&mut self, node: Node<'_>) {
        let Some(decl) = ImportDeclaration::parse(node, self.source) else {
            return;
        };
        let Some(library) = self.index.tracked(&decl.source).cloned() else {
            return;
        };
        if decl.type_only {
            return;
        }

        let recorded = self.bindings.record_declaration(&library, &decl);
        debug!(library = %library, line = decl.line, recorded, "collected import");

        let kept: Vec<String> = decl
            .type_only_specifiers()
            .map(|spec| match spec {
                ImportSpecifier::Named {
                    imported, local, ..
                } if imported != local => format!("{} as {}", imported, local),
                spec => spec.local_name().to_string(),
            })
            .collect();

        if kept.is_empty() {
            self.edits.remove_statement(node, self.source);
        } else {
            self.edits.replace(
                node,
                format!("import type {{ {} }} from \"{}\";", kept.join(", "), decl.source),
            );
        }
        self.claimed.insert(node.id());
        self.removed_imports += 1;
    }

    /// Whether the unit has anything for the rewrite pass to do.
    fn needs_rewrite(&self) -> bool {
        !self.bindings.is_empty() || self.tracked_reexports > 0
    }

    /// Whether the unit refers to a tracked library at all.
    fn touches_tracked(&self) -> bool {
        self.needs_rewrite() || self.removed_imports > 0
    }

    /// Build the lookup structures the rewrite pass needs.
    fn prepare_rewrite(&mut self, program: Node<'_>) {
        self.scopes = ScopeTree::build(program, self.source);
        self.injector = ImportInjector::new(collect_names(program, self.source));
    }

    fn finish(self, program: Node<'_>) -> TransformResult<TransformOutput> {
        let UnitContext {
            source,
            injector,
            mut edits,
            removed_imports,
            rewrites,
            ..
        } = self;

        if !injector.is_empty() {
            let offset = prelude_offset(program, source);
            let mut prelude = injector.render_prelude();
            if offset > 0 && !source[..offset].ends_with('\n') {
                prelude.insert(0, '\n');
            }
            edits.insert(offset, prelude);
        }

        let changed = !edits.is_empty();
        let code = if changed {
            edits.apply(source)?
        } else {
            source.to_string()
        };

        Ok(TransformOutput {
            code,
            injected: injector.into_imports(),
            removed_imports,
            rewrites,
            changed,
        })
    }

    fn text(&self, node: Node<'_>) -> &'a str {
        node_text(node, self.source)
    }

    fn inject(&mut self, library: &TrackedLibrary, symbol: &str) -> TransformResult<InjectedRef> {
        Ok(self.injector.inject(self.index, library, symbol)?)
    }

    /// Replace a node and claim it so no later rule rewrites it again.
    fn replace(&mut self, node: Node<'_>, text: impl Into<String>) {
        self.edits.replace(node, text);
        self.claimed.insert(node.id());
        self.rewrites += 1;
    }

    /// The name of an unclaimed identifier in reference position.
    fn reference_name(&self, node: Node<'_>) -> Option<&'a str> {
        let is_reference = matches!(node.kind(), "identifier" | "shorthand_property_identifier")
            && !self.claimed.contains(&node.id())
            && !self.scopes.is_declaration(node);
        is_reference.then(|| self.text(node))
    }

    /// The library and canonical symbol a named binding reference maps to.
    fn named_match(&self, node: Node<'_>) -> Option<(TrackedLibrary, String)> {
        let name = self.reference_name(node)?;
        self.bindings
            .named_symbol(&self.scopes, node, name)
            .map(|(library, canonical)| (library.clone(), canonical.to_string()))
    }

    /// The library a whole-library alias reference maps to.
    fn namespace_match(&self, node: Node<'_>) -> Option<TrackedLibrary> {
        let name = self.reference_name(node)?;
        self.bindings
            .namespace_alias(&self.scopes, node, name)
            .cloned()
    }
}

/// Rewrites compilation units against a shared, read-only method index.
pub struct Transformer<'a> {
    index: &'a MethodIndex,
    parser: SourceParser,
}

impl<'a> Transformer<'a> {
    /// Create a transformer. Parsers are reused across units.
    pub fn new(index: &'a MethodIndex) -> TransformResult<Self> {
        let parser = SourceParser::new().ok_or(TransformError::LanguageInit)?;
        Ok(Self { index, parser })
    }

    pub fn index(&self) -> &'a MethodIndex {
        self.index
    }

    /// Read and rewrite a single file. The file is not written back.
    pub fn transform_file(&mut self, path: &Path) -> TransformResult<TransformOutput> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        let language = SourceLanguage::from_extension(ext)
            .ok_or_else(|| TransformError::UnsupportedFileType(ext.to_string()))?;

        let content = fs::read_to_string(path)?;
        self.transform_source(&content, language, path)
    }

    /// Rewrite source code directly.
    pub fn transform_source(
        &mut self,
        source: &str,
        language: SourceLanguage,
        path: &Path,
    ) -> TransformResult<TransformOutput> {
        let tree = self
            .parser
            .parse(source, language)
            .ok_or_else(|| TransformError::ParseError {
                path: path.display().to_string(),
            })?;
        let program = tree.root_node();

        let mut unit = UnitContext::begin(self.index, source);
        unit.collect(program)?;

        if let Some(line) = first_error_line(program) {
            if unit.touches_tracked() {
                return Err(TransformError::SyntaxError {
                    path: path.display().to_string(),
                    line,
                });
            }
            return Ok(TransformOutput::unchanged(source));
        }

        if unit.needs_rewrite() {
            unit.prepare_rewrite(program);
            rules::visit(&mut unit, program)?;
        }

        let output = unit.finish(program)?;
        if output.changed {
            info!(
                path = %path.display(),
                injected = output.injected.len(),
                removed = output.removed_imports,
                rewrites = output.rewrites,
                "rewrote unit"
            );
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests;
