//! Per-shape rewrite rules.
//!
//! Every rule follows the same policy: resolve the node through the binding
//! tracker, and if it refers to a tracked library replace it with an injected
//! reference. Anything that does not match is left untouched.

use tree_sitter::Node;

use super::{TransformResult, UnitContext, UnsupportedFormError};
use crate::modules::TrackedLibrary;
use crate::syntax::{has_token, is_plain_string, named_children, string_value, NodeShape};

/// Placeholder for a whole-library alias used as a plain value.
const NAMESPACE_PLACEHOLDER: &str = "null";

/// Whether traversal continues into a node's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Descend {
    Children,
    Skip,
}

/// Rewrite pass: dispatch `node` to its rule, then walk its children.
pub(super) fn visit(unit: &mut UnitContext<'_>, node: Node<'_>) -> TransformResult<()> {
    let descend = match NodeShape::classify(node) {
        NodeShape::Import(_) => Descend::Skip,
        NodeShape::Export(n) => rewrite_export(unit, n)?,
        NodeShape::Call(n) => rewrite_call(unit, n)?,
        NodeShape::Member(n) => rewrite_member(unit, n)?,
        NodeShape::Subscript(n) => rewrite_subscript(unit, n)?,
        NodeShape::Pair(n) => rewrite_pair(unit, n)?,
        NodeShape::ShorthandProperty(n) => rewrite_shorthand(unit, n)?,
        NodeShape::Identifier(n) => rewrite_identifier(unit, n)?,
        NodeShape::Other(_) => Descend::Children,
    };

    if descend == Descend::Children {
        for child in named_children(node) {
            visit(unit, child)?;
        }
    }
    Ok(())
}

/// The tracked library an `export ... from '<lib>'` statement forwards from.
pub(super) fn tracked_export_source(unit: &UnitContext<'_>, node: Node<'_>) -> Option<TrackedLibrary> {
    let source = node.child_by_field_name("source")?;
    let module = string_value(source, unit.source)?;
    unit.index.tracked(&module).cloned()
}

/// `export * from '<lib>'` and `export * as R from '<lib>'` cannot be split.
pub(super) fn reject_wildcard_reexport(unit: &UnitContext<'_>, node: Node<'_>) -> TransformResult<()> {
    let Some(library) = tracked_export_source(unit, node) else {
        return Ok(());
    };
    let wildcard = has_token(node, "*")
        || named_children(node)
            .iter()
            .any(|child| child.kind() == "namespace_export");
    if wildcard {
        return Err(unsupported(unit, &library, node).into());
    }
    Ok(())
}

fn unsupported(unit: &UnitContext<'_>, library: &TrackedLibrary, node: Node<'_>) -> UnsupportedFormError {
    UnsupportedFormError {
        library: library.to_string(),
        form: unit.text(node).trim().to_string(),
    }
}

fn rewrite_call(unit: &mut UnitContext<'_>, node: Node<'_>) -> TransformResult<Descend> {
    if let Some(callee) = node.child_by_field_name("function") {
        replace_named(unit, callee)?;
    }

    if let Some(args) = node
        .child_by_field_name("arguments")
        .filter(|a| a.kind() == "arguments")
    {
        for arg in named_children(args) {
            replace_named(unit, arg)?;
        }
    }
    Ok(Descend::Children)
}

/// `R.map` becomes `_map`.
fn rewrite_member(unit: &mut UnitContext<'_>, node: Node<'_>) -> TransformResult<Descend> {
    let (Some(object), Some(property)) = (
        node.child_by_field_name("object"),
        node.child_by_field_name("property"),
    ) else {
        return Ok(Descend::Children);
    };
    if property.kind() != "property_identifier" {
        return Ok(Descend::Children);
    }
    let Some(library) = unit.namespace_match(object) else {
        return Ok(Descend::Children);
    };

    let symbol = unit.text(property);
    let injected = unit.inject(&library, symbol)?;
    unit.replace(node, injected.name());
    Ok(Descend::Skip)
}

/// `R["map"]` is as static as `R.map`; any other index is left to the
/// identifier rule.
fn rewrite_subscript(unit: &mut UnitContext<'_>, node: Node<'_>) -> TransformResult<Descend> {
    let (Some(object), Some(index)) = (
        node.child_by_field_name("object"),
        node.child_by_field_name("index"),
    ) else {
        return Ok(Descend::Children);
    };
    if !is_plain_string(index) {
        return Ok(Descend::Children);
    }
    let Some(library) = unit.namespace_match(object) else {
        return Ok(Descend::Children);
    };
    let Some(symbol) = string_value(index, unit.source) else {
        return Ok(Descend::Children);
    };

    let injected = unit.inject(&library, &symbol)?;
    unit.replace(node, injected.name());
    Ok(Descend::Skip)
}

/// `{ [map]: x, y: map }`: computed keys and values only. Plain keys are
/// property names, not references.
fn rewrite_pair(unit: &mut UnitContext<'_>, node: Node<'_>) -> TransformResult<Descend> {
    if let Some(key) = node
        .child_by_field_name("key")
        .filter(|k| k.kind() == "computed_property_name")
    {
        if let Some(inner) = key.named_child(0) {
            replace_named(unit, inner)?;
        }
    }

    if let Some(value) = node.child_by_field_name("value") {
        replace_named(unit, value)?;
    }
    Ok(Descend::Children)
}

/// `{ map }` becomes `{ map: _map }`; `{ R }` becomes `{ R: null }`.
fn rewrite_shorthand(unit: &mut UnitContext<'_>, node: Node<'_>) -> TransformResult<Descend> {
    let name = unit.text(node);
    if let Some((library, symbol)) = unit.named_match(node) {
        let injected = unit.inject(&library, &symbol)?;
        unit.replace(node, format!("{}: {}", name, injected));
    } else if unit.namespace_match(node).is_some() {
        unit.replace(node, format!("{}: {}", name, NAMESPACE_PLACEHOLDER));
    }
    Ok(Descend::Skip)
}

fn rewrite_identifier(unit: &mut UnitContext<'_>, node: Node<'_>) -> TransformResult<Descend> {
    // Specifier names are handled by the import and export rules.
    let in_specifier = node.parent().is_some_and(|parent| {
        matches!(
            parent.kind(),
            "import_specifier" | "export_specifier" | "namespace_import" | "namespace_export"
        )
    });
    if in_specifier {
        return Ok(Descend::Skip);
    }

    if is_jsx_tag_name(node) {
        // Lowercase tags are intrinsic elements, not references.
        if unit.text(node).starts_with(|c: char| c.is_ascii_lowercase()) {
            return Ok(Descend::Skip);
        }
        // `<R />` has no placeholder that is still a valid tag.
        if let Some(library) = unit.namespace_match(node) {
            let element = node.parent().unwrap_or(node);
            return Err(unsupported(unit, &library, element).into());
        }
    }

    if replace_named(unit, node)? {
        return Ok(Descend::Skip);
    }
    if unit.namespace_match(node).is_some() {
        // No finite set of direct imports stands in for the whole library.
        unit.replace(node, NAMESPACE_PLACEHOLDER);
    }
    Ok(Descend::Skip)
}

fn is_jsx_tag_name(node: Node<'_>) -> bool {
    node.parent().is_some_and(|parent| {
        matches!(
            parent.kind(),
            "jsx_opening_element" | "jsx_closing_element" | "jsx_self_closing_element"
        )
    })
}

/// Replace a named-binding reference with its injected import.
/// Returns whether the node was replaced.
fn replace_named(unit: &mut UnitContext<'_>, node: Node<'_>) -> TransformResult<bool> {
    if node.kind() != "identifier" {
        return Ok(false);
    }
    let Some((library, symbol)) = unit.named_match(node) else {
        return Ok(false);
    };
    let injected = unit.inject(&library, &symbol)?;
    unit.replace(node, injected.name());
    Ok(true)
}

fn rewrite_export(unit: &mut UnitContext<'_>, node: Node<'_>) -> TransformResult<Descend> {
    if node.child_by_field_name("source").is_some() {
        if let Some(library) = tracked_export_source(unit, node) {
            rewrite_reexport(unit, node, &library)?;
        }
        // Specifiers of `export ... from` name another module's bindings.
        return Ok(Descend::Skip);
    }

    if let Some(clause) = export_clause(node) {
        rewrite_local_export(unit, clause)?;
        return Ok(Descend::Skip);
    }

    // `export default R` re-exports the whole library surface.
    if let Some(value) = node.child_by_field_name("value") {
        if value.kind() == "identifier" {
            if let Some(library) = unit.namespace_match(value) {
                return Err(unsupported(unit, &library, node).into());
            }
        }
    }
    Ok(Descend::Children)
}

fn export_clause(node: Node<'_>) -> Option<Node<'_>> {
    named_children(node)
        .into_iter()
        .find(|child| child.kind() == "export_clause")
}

/// `export { compose, map as m } from 'ramda'` becomes
/// `export { _compose as compose, _map as m };`.
fn rewrite_reexport(
    unit: &mut UnitContext<'_>,
    node: Node<'_>,
    library: &TrackedLibrary,
) -> TransformResult<()> {
    if has_token(node, "type") {
        return Ok(());
    }
    reject_wildcard_reexport(unit, node)?;
    let Some(clause) = export_clause(node) else {
        return Ok(());
    };

    let mut specifiers = Vec::new();
    for spec in named_children(clause) {
        if spec.kind() != "export_specifier" {
            continue;
        }
        let Some(name) = spec.child_by_field_name("name") else {
            continue;
        };
        let symbol =
            string_value(name, unit.source).unwrap_or_else(|| unit.text(name).to_string());
        if symbol == "default" {
            // The library's default export is the library itself.
            return Err(unsupported(unit, library, node).into());
        }
        let exported = spec
            .child_by_field_name("alias")
            .map_or_else(|| unit.text(name), |alias| unit.text(alias));

        let injected = unit.inject(library, &symbol)?;
        specifiers.push(format!("{} as {}", injected, exported));
    }

    let replacement = if specifiers.is_empty() {
        "export {};".to_string()
    } else {
        format!("export {{ {} }};", specifiers.join(", "))
    };
    unit.replace(node, replacement);
    Ok(())
}

/// `export { map }` where `map` is a named binding becomes
/// `export { _map as map }`. Exporting a whole-library alias is rejected.
fn rewrite_local_export(unit: &mut UnitContext<'_>, clause: Node<'_>) -> TransformResult<()> {
    for spec in named_children(clause) {
        if spec.kind() != "export_specifier" {
            continue;
        }
        let Some(name) = spec
            .child_by_field_name("name")
            .filter(|n| n.kind() == "identifier")
        else {
            continue;
        };
        let has_alias = spec.child_by_field_name("alias").is_some();

        if let Some((library, symbol)) = unit.named_match(name) {
            let injected = unit.inject(&library, &symbol)?;
            let replacement = if has_alias {
                injected.to_string()
            } else {
                format!("{} as {}", injected, unit.text(name))
            };
            unit.replace(name, replacement);
        } else if let Some(library) = unit.namespace_match(name) {
            return Err(unsupported(unit, &library, spec).into());
        }
    }
    Ok(())
}
