//! Syntax host for the rewrite engine.
//!
//! Wraps tree-sitter so the rest of the crate can work in terms of a parsed
//! compilation unit, a closed set of node shapes, lexical scope lookups and
//! span-based edits.
//!
//! # Supported Languages
//!
//! - **JavaScript** (`.js`, `.mjs`, `.cjs`, `.jsx`)
//! - **TypeScript** (`.ts`, `.mts`, `.cts`)
//! - **TSX** (`.tsx`)

pub mod edit;
pub mod scope;

use std::collections::HashSet;

use tree_sitter::{Language, Node, Parser, Tree};

pub use edit::{EditError, EditSet};
pub use scope::{Binding, BindingKind, ScopeKind, ScopeTree};

/// Language type for file analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLanguage {
    JavaScript,
    TypeScript,
    Tsx,
    Jsx,
}

impl SourceLanguage {
    /// Determine language from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "js" | "mjs" | "cjs" => Some(SourceLanguage::JavaScript),
            "jsx" => Some(SourceLanguage::Jsx),
            "ts" | "mts" | "cts" => Some(SourceLanguage::TypeScript),
            "tsx" => Some(SourceLanguage::Tsx),
            _ => None,
        }
    }

    /// Get tree-sitter language for this source language.
    pub fn tree_sitter_language(&self) -> Language {
        match self {
            SourceLanguage::JavaScript | SourceLanguage::Jsx => {
                tree_sitter_javascript::LANGUAGE.into()
            }
            SourceLanguage::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            SourceLanguage::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

/// One parser per grammar, reused across compilation units.
pub struct SourceParser {
    js_parser: Parser,
    ts_parser: Parser,
    tsx_parser: Parser,
}

impl SourceParser {
    /// Create parsers for every supported grammar.
    ///
    /// Returns `None` if a grammar is incompatible with the linked
    /// tree-sitter runtime.
    pub fn new() -> Option<Self> {
        let make = |language: SourceLanguage| {
            let mut parser = Parser::new();
            parser
                .set_language(&language.tree_sitter_language())
                .ok()
                .map(|_| parser)
        };

        Some(Self {
            js_parser: make(SourceLanguage::JavaScript)?,
            ts_parser: make(SourceLanguage::TypeScript)?,
            tsx_parser: make(SourceLanguage::Tsx)?,
        })
    }

    /// Parse source text with the grammar for `language`.
    pub fn parse(&mut self, source: &str, language: SourceLanguage) -> Option<Tree> {
        let parser = match language {
            SourceLanguage::JavaScript | SourceLanguage::Jsx => &mut self.js_parser,
            SourceLanguage::TypeScript => &mut self.ts_parser,
            SourceLanguage::Tsx => &mut self.tsx_parser,
        };
        parser.parse(source, None)
    }
}

/// The closed set of node shapes the rewrite rules distinguish.
///
/// Everything the rules do not special-case is `Other` and is only
/// descended into.
#[derive(Debug, Clone, Copy)]
pub enum NodeShape<'tree> {
    /// `import ... from '...'`
    Import(Node<'tree>),
    /// Any `export` statement, with or without a source.
    Export(Node<'tree>),
    /// `callee(args)`
    Call(Node<'tree>),
    /// `object.property`
    Member(Node<'tree>),
    /// `object[index]`
    Subscript(Node<'tree>),
    /// `key: value` inside an object literal.
    Pair(Node<'tree>),
    /// `{ name }` inside an object literal.
    ShorthandProperty(Node<'tree>),
    /// A bare identifier.
    Identifier(Node<'tree>),
    Other(Node<'tree>),
}

impl<'tree> NodeShape<'tree> {
    /// Classify a node by its tree-sitter kind.
    pub fn classify(node: Node<'tree>) -> Self {
        match node.kind() {
            "import_statement" => NodeShape::Import(node),
            "export_statement" => NodeShape::Export(node),
            "call_expression" => NodeShape::Call(node),
            "member_expression" => NodeShape::Member(node),
            "subscript_expression" => NodeShape::Subscript(node),
            "pair" => NodeShape::Pair(node),
            "shorthand_property_identifier" => NodeShape::ShorthandProperty(node),
            "identifier" => NodeShape::Identifier(node),
            _ => NodeShape::Other(node),
        }
    }
}

/// Collect the named children of a node.
pub fn named_children<'tree>(node: Node<'tree>) -> Vec<Node<'tree>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Collect all children of a node, anonymous tokens included.
pub fn children<'tree>(node: Node<'tree>) -> Vec<Node<'tree>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

/// Returns true if the node has an anonymous child token with the given text.
pub fn has_token(node: Node<'_>, token: &str) -> bool {
    children(node)
        .iter()
        .any(|child| !child.is_named() && child.kind() == token)
}

/// Extract the text content of a node.
pub fn node_text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    source.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

/// Extract string value (removes quotes).
pub fn string_value(node: Node<'_>, source: &str) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }
    let text = node_text(node, source);
    let trimmed = text
        .trim_start_matches(['"', '\''])
        .trim_end_matches(['"', '\'']);
    Some(trimmed.to_string())
}

/// Returns true for a string literal without escapes, whose value is
/// exactly what appears between the quotes.
pub fn is_plain_string(node: Node<'_>) -> bool {
    node.kind() == "string"
        && named_children(node)
            .iter()
            .all(|child| child.kind() == "string_fragment")
}

/// Every name spelled anywhere in the unit, used to keep generated
/// identifiers collision-free.
pub fn collect_names(root: Node<'_>, source: &str) -> HashSet<String> {
    let mut names = HashSet::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.kind().ends_with("identifier") {
            names.insert(node_text(node, source).to_string());
        }
        stack.extend(named_children(node));
    }
    names
}

/// Line (1-indexed) of the first syntax error in the tree, if any.
pub fn first_error_line(root: Node<'_>) -> Option<usize> {
    if !root.has_error() {
        return None;
    }
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node.start_position().row + 1);
        }
        let mut kids = children(node);
        kids.reverse();
        stack.extend(kids.into_iter().filter(|k| k.has_error() || k.is_missing()));
    }
    Some(root.start_position().row + 1)
}

/// Byte offset at which new module-level declarations belong: after any
/// hashbang line and directive prologue, before the first real statement.
pub fn prelude_offset(program: Node<'_>, source: &str) -> usize {
    let mut offset = 0;
    for child in named_children(program) {
        match child.kind() {
            "hash_bang_line" => offset = line_end(source, child.end_byte()),
            "comment" => {}
            "expression_statement"
                if child.named_child(0).is_some_and(|n| n.kind() == "string") =>
            {
                offset = line_end(source, child.end_byte())
            }
            _ => return child.start_byte(),
        }
    }
    offset
}

/// Advance past trailing spaces and one line break.
pub(crate) fn line_end(source: &str, from: usize) -> usize {
    let bytes = source.as_bytes();
    let mut end = from;
    while end < bytes.len() && (bytes[end] == b' ' || bytes[end] == b'\t') {
        end += 1;
    }
    if bytes.get(end) == Some(&b'\r') {
        end += 1;
    }
    if bytes.get(end) == Some(&b'\n') {
        end += 1;
    }
    end
}
