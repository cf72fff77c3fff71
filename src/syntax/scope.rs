//! Lexical scope analysis for JavaScript/TypeScript.
//!
//! [`ScopeTree::build`] walks a parsed unit once and records every scope and
//! every binding declared in it, before any lookup happens. Lookups therefore
//! see hoisted declarations no matter where they appear textually.
//!
//! # Scoping Rules
//!
//! - `var` declarations bind in the nearest function (or program) scope
//! - `let`, `const`, `class` and block-level functions bind in the enclosing block
//! - Parameters and a function expression's own name bind in the function scope
//! - `catch (e)` binds `e` in the catch clause
//! - Imports bind in the program scope, tagged with their specifier kind

use std::collections::{HashMap, HashSet};
use std::fmt;

use tree_sitter::Node;

use super::{has_token, named_children, node_text, string_value};

/// Index of a scope within a [`ScopeTree`].
pub type ScopeId = usize;

/// What created a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Program,
    Function,
    Block,
    Class,
    Catch,
}

/// How a name was bound. Rewrite decisions depend on this, not on the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// `import x from '...'` or `import { default as x } from '...'`
    ImportDefault,
    /// `import * as x from '...'`
    ImportNamespace,
    /// `import { a as x } from '...'`
    ImportSpecifier,
    Var,
    Let,
    Const,
    Function,
    Class,
    Param,
    CatchParam,
}

impl BindingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BindingKind::ImportDefault => "import-default",
            BindingKind::ImportNamespace => "import-namespace",
            BindingKind::ImportSpecifier => "import-specifier",
            BindingKind::Var => "var",
            BindingKind::Let => "let",
            BindingKind::Const => "const",
            BindingKind::Function => "function",
            BindingKind::Class => "class",
            BindingKind::Param => "param",
            BindingKind::CatchParam => "catch-param",
        }
    }

    /// Returns true for bindings that import a whole module.
    pub fn is_whole_module_import(&self) -> bool {
        matches!(self, BindingKind::ImportDefault | BindingKind::ImportNamespace)
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A declared name.
#[derive(Debug, Clone)]
pub struct Binding {
    pub name: String,
    pub kind: BindingKind,
    pub scope: ScopeId,
    /// Line of the declaring identifier (1-indexed).
    pub line: usize,
}

#[derive(Debug, Clone)]
struct Scope {
    kind: ScopeKind,
    parent: Option<ScopeId>,
    bindings: HashMap<String, usize>,
}

/// Scopes and bindings of one compilation unit.
#[derive(Debug, Default)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    bindings: Vec<Binding>,
    /// Tree-sitter node id of each scope-creating node.
    scope_nodes: HashMap<usize, ScopeId>,
    /// Node ids of identifiers that declare a binding.
    declarations: HashSet<usize>,
}

impl ScopeTree {
    /// Build the scope tree for a parsed program.
    pub fn build(program: Node<'_>, source: &str) -> Self {
        let mut tree = Self::default();
        let root = tree.push_scope(ScopeKind::Program, None, program);
        tree.walk(program, root, source);
        tree
    }

    /// The innermost scope enclosing `node`.
    pub fn scope_of(&self, node: Node<'_>) -> ScopeId {
        let mut current = node.parent();
        while let Some(n) = current {
            if let Some(&id) = self.scope_nodes.get(&n.id()) {
                return id;
            }
            current = n.parent();
        }
        0
    }

    /// Find the binding `name` refers to when used at `node`.
    pub fn resolve(&self, node: Node<'_>, name: &str) -> Option<&Binding> {
        self.lookup(self.scope_of(node), name)
    }

    /// Find the nearest binding of `name` visible from `scope`.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&Binding> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = self.scopes.get(id)?;
            if let Some(&binding) = scope.bindings.get(name) {
                return self.bindings.get(binding);
            }
            current = scope.parent;
        }
        None
    }

    /// Kind of the binding `name` refers to at `node`.
    pub fn binding_kind(&self, node: Node<'_>, name: &str) -> Option<BindingKind> {
        self.resolve(node, name).map(|b| b.kind)
    }

    /// Returns true if the identifier node declares a binding.
    pub fn is_declaration(&self, node: Node<'_>) -> bool {
        self.declarations.contains(&node.id())
    }

    pub fn scope_kind(&self, scope: ScopeId) -> Option<ScopeKind> {
        self.scopes.get(scope).map(|s| s.kind)
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// All bindings in declaration order.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    fn push_scope(&mut self, kind: ScopeKind, parent: Option<ScopeId>, node: Node<'_>) -> ScopeId {
        let id = self.scopes.len();
        self.scopes.push(Scope {
            kind,
            parent,
            bindings: HashMap::new(),
        });
        self.scope_nodes.insert(node.id(), id);
        id
    }

    /// Nearest function or program scope, where `var` binds.
    fn var_scope(&self, scope: ScopeId) -> ScopeId {
        let mut current = scope;
        loop {
            let s = &self.scopes[current];
            match (s.kind, s.parent) {
                (ScopeKind::Function | ScopeKind::Program, _) | (_, None) => return current,
                (_, Some(parent)) => current = parent,
            }
        }
    }

    fn declare(&mut self, node: Node<'_>, scope: ScopeId, kind: BindingKind, source: &str) {
        let name = node_text(node, source).to_string();
        self.declarations.insert(node.id());
        let binding = self.bindings.len();
        let entry = self.scopes[scope].bindings.entry(name.clone());
        if let std::collections::hash_map::Entry::Vacant(slot) = entry {
            slot.insert(binding);
            self.bindings.push(Binding {
                name,
                kind,
                scope,
                line: node.start_position().row + 1,
            });
        }
    }

    fn walk(&mut self, node: Node<'_>, scope: ScopeId, source: &str) {
        for child in named_children(node) {
            self.visit(child, scope, source);
        }
    }

    fn visit(&mut self, node: Node<'_>, scope: ScopeId, source: &str) {
        match node.kind() {
            "import_statement" => self.declare_import(node, scope, source),
            "variable_declaration" => {
                let target = self.var_scope(scope);
                self.declare_declarators(node, target, BindingKind::Var, source);
                self.walk(node, scope, source);
            }
            "lexical_declaration" => {
                let kind = if has_token(node, "const") {
                    BindingKind::Const
                } else {
                    BindingKind::Let
                };
                self.declare_declarators(node, scope, kind, source);
                self.walk(node, scope, source);
            }
            "function_declaration" | "generator_function_declaration" | "function_signature" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.declare(name, scope, BindingKind::Function, source);
                }
                let inner = self.push_scope(ScopeKind::Function, Some(scope), node);
                self.walk_function(node, inner, source);
            }
            "function_expression" | "function" | "generator_function" => {
                let inner = self.push_scope(ScopeKind::Function, Some(scope), node);
                if let Some(name) = node.child_by_field_name("name") {
                    self.declare(name, inner, BindingKind::Function, source);
                }
                self.walk_function(node, inner, source);
            }
            // Type-level signatures bind parameters but have no body.
            "arrow_function"
            | "method_definition"
            | "function_type"
            | "constructor_type"
            | "method_signature"
            | "abstract_method_signature"
            | "call_signature"
            | "construct_signature" => {
                let inner = self.push_scope(ScopeKind::Function, Some(scope), node);
                self.walk_function(node, inner, source);
            }
            "class_declaration" | "abstract_class_declaration" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.declare(name, scope, BindingKind::Class, source);
                }
                let inner = self.push_scope(ScopeKind::Class, Some(scope), node);
                self.walk(node, inner, source);
            }
            "class" => {
                let inner = self.push_scope(ScopeKind::Class, Some(scope), node);
                if let Some(name) = node.child_by_field_name("name") {
                    self.declare(name, inner, BindingKind::Class, source);
                }
                self.walk(node, inner, source);
            }
            "for_statement" | "for_in_statement" => {
                let inner = self.push_scope(ScopeKind::Block, Some(scope), node);
                if node.kind() == "for_in_statement" {
                    self.declare_for_in_left(node, inner, source);
                }
                self.walk(node, inner, source);
            }
            "catch_clause" => {
                let inner = self.push_scope(ScopeKind::Catch, Some(scope), node);
                if let Some(param) = node.child_by_field_name("parameter") {
                    self.declare_pattern(param, inner, BindingKind::CatchParam, source);
                }
                self.walk_function(node, inner, source);
            }
            "index_signature" => {
                let inner = self.push_scope(ScopeKind::Function, Some(scope), node);
                if let Some(name) = node.child_by_field_name("name") {
                    self.declare(name, inner, BindingKind::Param, source);
                }
                self.walk(node, inner, source);
            }
            "statement_block" | "switch_body" | "class_static_block" => {
                let inner = self.push_scope(ScopeKind::Block, Some(scope), node);
                self.walk(node, inner, source);
            }
            _ => self.walk(node, scope, source),
        }
    }

    /// Walk a function-like node whose parameters and body share one scope.
    fn walk_function(&mut self, node: Node<'_>, inner: ScopeId, source: &str) {
        if let Some(param) = node.child_by_field_name("parameter") {
            self.declare_pattern(param, inner, BindingKind::Param, source);
        }
        if let Some(params) = node.child_by_field_name("parameters") {
            for param in named_children(params) {
                let pattern = match param.kind() {
                    "required_parameter" | "optional_parameter" => {
                        param.child_by_field_name("pattern")
                    }
                    _ => Some(param),
                };
                if let Some(pattern) = pattern {
                    self.declare_pattern(pattern, inner, BindingKind::Param, source);
                }
            }
        }

        let body = node.child_by_field_name("body").map(|b| b.id());
        for child in named_children(node) {
            if Some(child.id()) == body && child.kind() == "statement_block" {
                self.walk(child, inner, source);
            } else {
                self.visit(child, inner, source);
            }
        }
    }

    fn declare_declarators(&mut self, node: Node<'_>, scope: ScopeId, kind: BindingKind, source: &str) {
        for declarator in named_children(node) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            if let Some(name) = declarator.child_by_field_name("name") {
                self.declare_pattern(name, scope, kind, source);
            }
        }
    }

    fn declare_for_in_left(&mut self, node: Node<'_>, inner: ScopeId, source: &str) {
        let kind = if has_token(node, "var") {
            BindingKind::Var
        } else if has_token(node, "let") {
            BindingKind::Let
        } else if has_token(node, "const") {
            BindingKind::Const
        } else {
            // `for (x of xs)` assigns to an existing binding.
            return;
        };
        let target = if kind == BindingKind::Var {
            self.var_scope(inner)
        } else {
            inner
        };
        if let Some(left) = node.child_by_field_name("left") {
            self.declare_pattern(left, target, kind, source);
        }
    }

    fn declare_pattern(&mut self, node: Node<'_>, scope: ScopeId, kind: BindingKind, source: &str) {
        match node.kind() {
            "identifier" | "shorthand_property_identifier_pattern" => {
                self.declare(node, scope, kind, source)
            }
            "object_pattern" | "array_pattern" | "rest_pattern" => {
                for child in named_children(node) {
                    self.declare_pattern(child, scope, kind, source);
                }
            }
            "pair_pattern" => {
                if let Some(value) = node.child_by_field_name("value") {
                    self.declare_pattern(value, scope, kind, source);
                }
            }
            "assignment_pattern" | "object_assignment_pattern" => {
                if let Some(left) = node.child_by_field_name("left") {
                    self.declare_pattern(left, scope, kind, source);
                }
            }
            _ => {}
        }
    }

    fn declare_import(&mut self, node: Node<'_>, scope: ScopeId, source: &str) {
        let Some(clause) = named_children(node)
            .into_iter()
            .find(|c| c.kind() == "import_clause")
        else {
            return;
        };

        for child in named_children(clause) {
            match child.kind() {
                "identifier" => self.declare(child, scope, BindingKind::ImportDefault, source),
                "namespace_import" => {
                    if let Some(name) = named_children(child)
                        .into_iter()
                        .find(|c| c.kind() == "identifier")
                    {
                        self.declare(name, scope, BindingKind::ImportNamespace, source);
                    }
                }
                "named_imports" => {
                    for spec in named_children(child) {
                        if spec.kind() != "import_specifier" {
                            continue;
                        }
                        let Some(name) = spec.child_by_field_name("name") else {
                            continue;
                        };
                        let local = spec.child_by_field_name("alias").unwrap_or(name);
                        if local.kind() != "identifier" {
                            continue;
                        }
                        let imported = string_value(name, source)
                            .unwrap_or_else(|| node_text(name, source).to_string());
                        let kind = if imported == "default" {
                            BindingKind::ImportDefault
                        } else {
                            BindingKind::ImportSpecifier
                        };
                        self.declare(local, scope, kind, source);
                    }
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{SourceLanguage, SourceParser};
    use tree_sitter::Tree;

    fn parse(source: &str, language: SourceLanguage) -> Tree {
        SourceParser::new().unwrap().parse(source, language).unwrap()
    }

    /// Find the `nth` identifier node spelled `name`, in source order.
    fn find_identifier<'t>(root: Node<'t>, source: &str, name: &str, nth: usize) -> Node<'t> {
        let mut found = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if node.kind() == "identifier" && node_text(node, source) == name {
                found.push(node);
            }
            let mut kids = named_children(node);
            kids.reverse();
            stack.extend(kids);
        }
        found.sort_by_key(|n| n.start_byte());
        found[nth]
    }

    fn kind_at(source: &str, name: &str, nth: usize) -> Option<BindingKind> {
        let tree = parse(source, SourceLanguage::JavaScript);
        let root = tree.root_node();
        let scopes = ScopeTree::build(root, source);
        let node = find_identifier(root, source, name, nth);
        scopes.binding_kind(node, name)
    }

    #[test]
    fn test_import_binding_kinds() {
        let source = "import R, { map, default as D } from 'ramda';\nimport * as N from 'x';\n";
        let tree = parse(source, SourceLanguage::JavaScript);
        let scopes = ScopeTree::build(tree.root_node(), source);

        let kinds: Vec<_> = scopes
            .bindings()
            .iter()
            .map(|b| (b.name.as_str(), b.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("R", BindingKind::ImportDefault),
                ("map", BindingKind::ImportSpecifier),
                ("D", BindingKind::ImportDefault),
                ("N", BindingKind::ImportNamespace),
            ]
        );
    }

    #[test]
    fn test_renamed_specifier_binds_alias() {
        let source = "import { map as m } from 'ramda';\nm(f);\n";
        assert_eq!(kind_at(source, "m", 1), Some(BindingKind::ImportSpecifier));
        assert_eq!(kind_at(source, "map", 0), None);
    }

    #[test]
    fn test_shadowing_const_in_function() {
        let source = "import { map } from 'ramda';\nfunction f() { const map = 1; return map; }\nmap(x);\n";
        // 0: import, 1: const declaration, 2: return, 3: top-level call
        assert_eq!(kind_at(source, "map", 2), Some(BindingKind::Const));
        assert_eq!(kind_at(source, "map", 3), Some(BindingKind::ImportSpecifier));
    }

    #[test]
    fn test_var_hoists_out_of_block() {
        let source = "import { map } from 'ramda';\nfunction f() { map; if (a) { var map = 1; } }\n";
        assert_eq!(kind_at(source, "map", 1), Some(BindingKind::Var));
    }

    #[test]
    fn test_let_stays_in_block() {
        let source = "import { map } from 'ramda';\nif (a) { let map = 1; }\nmap;\n";
        assert_eq!(kind_at(source, "map", 2), Some(BindingKind::ImportSpecifier));
    }

    #[test]
    fn test_parameters_shadow() {
        let source = "import R from 'ramda';\nconst f = (R) => R;\nfunction g({ R }) { return R; }\nconst h = function ([R = 1]) { return R; };\n";
        // `{ R }` declares through a shorthand pattern, not an identifier node,
        // so the identifier indices are: 0 import, 1 arrow param, 2 arrow body,
        // 3 return in g, 4 `R = 1` default, 5 return in h.
        assert_eq!(kind_at(source, "R", 2), Some(BindingKind::Param));
        assert_eq!(kind_at(source, "R", 3), Some(BindingKind::Param));
        assert_eq!(kind_at(source, "R", 5), Some(BindingKind::Param));
    }

    #[test]
    fn test_catch_and_for_bindings() {
        let source = "import { map } from 'ramda';\ntry {} catch (map) { map; }\nfor (const map of xs) { map; }\nfor (map of xs) {}\n";
        assert_eq!(kind_at(source, "map", 2), Some(BindingKind::CatchParam));
        assert_eq!(kind_at(source, "map", 4), Some(BindingKind::Const));
        assert_eq!(kind_at(source, "map", 5), Some(BindingKind::ImportSpecifier));
    }

    #[test]
    fn test_declarations_marked() {
        let source = "import { map } from 'ramda';\nconst x = map;\n";
        let tree = parse(source, SourceLanguage::JavaScript);
        let root = tree.root_node();
        let scopes = ScopeTree::build(root, source);

        assert!(scopes.is_declaration(find_identifier(root, source, "map", 0)));
        assert!(scopes.is_declaration(find_identifier(root, source, "x", 0)));
        assert!(!scopes.is_declaration(find_identifier(root, source, "map", 1)));
    }

    #[test]
    fn test_typescript_parameters() {
        let source = "import { map } from 'ramda';\nfunction f(map: number, other?: string) { return map; }\n";
        let tree = parse(source, SourceLanguage::TypeScript);
        let root = tree.root_node();
        let scopes = ScopeTree::build(root, source);
        let use_site = find_identifier(root, source, "map", 2);
        assert_eq!(scopes.binding_kind(use_site, "map"), Some(BindingKind::Param));
    }

    #[test]
    fn test_typescript_signature_parameters_are_declarations() {
        let source = "import R from 'ramda';\ntype F = (R: number) => void;\nfunction g(R: number): void;\ninterface X { run(R: number): void; new (R: string): X; (R: boolean): void; }\n";
        let tree = parse(source, SourceLanguage::TypeScript);
        let root = tree.root_node();
        let scopes = ScopeTree::build(root, source);

        for nth in 1..=5 {
            let param = find_identifier(root, source, "R", nth);
            assert!(scopes.is_declaration(param), "R #{} not declared", nth);
            assert_eq!(scopes.binding_kind(param, "R"), Some(BindingKind::Param));
        }
    }

    #[test]
    fn test_scope_kinds() {
        let source = "function f() { { } }\nclass A {}\n";
        let tree = parse(source, SourceLanguage::JavaScript);
        let scopes = ScopeTree::build(tree.root_node(), source);
        assert_eq!(scopes.scope_kind(0), Some(ScopeKind::Program));
        assert_eq!(scopes.scope_kind(1), Some(ScopeKind::Function));
        assert_eq!(scopes.scope_kind(2), Some(ScopeKind::Block));
        assert_eq!(scopes.scope_kind(3), Some(ScopeKind::Class));
        assert_eq!(scopes.scope_count(), 4);
    }
}
