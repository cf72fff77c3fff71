use std::path::Path;

use super::*;

fn index() -> MethodIndex {
    let mut index = MethodIndex::from_symbols(
        "ramda",
        &["add", "compose", "filter", "identity", "map", "omit"],
    );
    index.insert_library(
        TrackedLibrary::new("ramda-extension"),
        vec![(
            "isNilOrEmpty".to_string(),
            "ramda-extension/src/isNilOrEmpty".to_string(),
        )],
    );
    index
}

fn transform_as(source: &str, language: SourceLanguage) -> TransformResult<TransformOutput> {
    let index = index();
    let mut transformer = Transformer::new(&index).unwrap();
    transformer.transform_source(source, language, Path::new("test.js"))
}

fn transform(source: &str) -> TransformOutput {
    transform_as(source, SourceLanguage::JavaScript).unwrap()
}

fn transform_err(source: &str) -> TransformError {
    transform_as(source, SourceLanguage::JavaScript).unwrap_err()
}

// ===== Testable properties =====

#[test]
fn test_dedup_one_import_per_symbol() {
    let source = r#"import { map } from 'ramda';
map(f, a);
map(g, b);
const h = map;
"#;
    let output = transform(source);

    assert_eq!(
        output.code,
        r#"import _map from "ramda/src/map";
_map(f, a);
_map(g, b);
const h = _map;
"#
    );
    assert_eq!(output.code.matches("import _map").count(), 1);
    assert_eq!(output.injected.len(), 1);
    assert_eq!(output.rewrites, 3);
}

#[test]
fn test_unused_import_eliminated() {
    let output = transform("import { map, compose } from 'ramda';\nconsole.log(1);\n");

    assert_eq!(output.code, "console.log(1);\n");
    assert!(output.injected.is_empty());
    assert_eq!(output.removed_imports, 1);
    assert!(output.changed);
}

#[test]
fn test_unknown_symbol_is_only_an_error_when_used() {
    let output = transform("import { nope } from 'ramda';\n");
    assert_eq!(output.code, "");

    let err = transform_err("import { nope } from 'ramda';\nnope(1);\n");
    assert!(matches!(
        err,
        TransformError::Resolution(ref e) if e.library == "ramda" && e.symbol == "nope"
    ));
}

#[test]
fn test_shadowing_local_not_rewritten() {
    let source = r#"import { map } from 'ramda';
function f(xs) {
  const map = (x) => x;
  return map(xs);
}
map(f);
"#;
    let output = transform(source);

    assert_eq!(
        output.code,
        r#"import _map from "ramda/src/map";
function f(xs) {
  const map = (x) => x;
  return map(xs);
}
_map(f);
"#
    );
}

#[test]
fn test_shadowing_namespace_alias_not_nullified() {
    let source = "import R from 'ramda';\nconst g = (R) => R.map;\nR.map(f);\n";
    let output = transform(source);

    assert_eq!(
        output.code,
        "import _map from \"ramda/src/map\";\nconst g = (R) => R.map;\n_map(f);\n"
    );
}

#[test]
fn test_idempotent() {
    let source = r#"import R, { compose } from 'ramda';
export const run = compose(R.map(f), R.filter(g));
"#;
    let first = transform(source);
    assert!(first.changed);

    let second = transform(&first.code);
    assert!(!second.changed);
    assert_eq!(second.code, first.code);
}

#[test]
fn test_wildcard_reexport_rejected() {
    let source = "import { map } from 'ramda';\nmap(x);\nexport * from 'ramda';\n";
    let err = transform_err(source);

    match err {
        TransformError::UnsupportedForm(e) => {
            assert_eq!(e.library, "ramda");
            assert_eq!(e.form, "export * from 'ramda';");
            assert!(e.to_string().contains("defeats the purpose"));
        }
        other => panic!("expected UnsupportedForm, got {:?}", other),
    }
}

#[test]
fn test_namespace_reexport_rejected() {
    let err = transform_err("export * as R from 'ramda-extension';\n");
    assert!(matches!(
        err,
        TransformError::UnsupportedForm(ref e) if e.library == "ramda-extension"
    ));
}

#[test]
fn test_wildcard_reexport_of_other_module_allowed() {
    let output = transform("export * from './local';\n");
    assert!(!output.changed);
}

// ===== Scenarios =====

#[test]
fn test_named_import_only_used_symbol_injected() {
    let source = "import { compose, map } from 'ramda';\n\nexport const run = compose(f, g);\n";
    let output = transform(source);

    assert_eq!(
        output.code,
        "import _compose from \"ramda/src/compose\";\n\nexport const run = _compose(f, g);\n"
    );
    assert!(!output.code.contains("map"));
    assert!(!output.code.contains("'ramda'"));
    assert_eq!(output.injected.len(), 1);
    assert_eq!(output.injected[0].symbol, "compose");
}

#[test]
fn test_namespace_member_call() {
    let source = "import R from 'ramda';\nconst out = R.omit(obj, ['a']);\n";
    let output = transform(source);

    assert_eq!(
        output.code,
        "import _omit from \"ramda/src/omit\";\nconst out = _omit(obj, ['a']);\n"
    );
}

#[test]
fn test_star_namespace_member() {
    let source = "import * as R from 'ramda';\nR.map(R.add(1), xs);\n";
    let output = transform(source);

    assert_eq!(
        output.code,
        "import _map from \"ramda/src/map\";\nimport _add from \"ramda/src/add\";\n_map(_add(1), xs);\n"
    );
}

#[test]
fn test_reexport_named_symbols() {
    let output = transform("export { compose } from 'ramda';\n");
    assert_eq!(
        output.code,
        "import _compose from \"ramda/src/compose\";\nexport { _compose as compose };\n"
    );

    let output = transform("export { map as mapAll, add } from 'ramda';\n");
    assert_eq!(
        output.code,
        "import _map from \"ramda/src/map\";\nimport _add from \"ramda/src/add\";\nexport { _map as mapAll, _add as add };\n"
    );
}

#[test]
fn test_reexport_default_rejected() {
    let err = transform_err("export { default } from 'ramda';\n");
    assert!(matches!(err, TransformError::UnsupportedForm(_)));
}

#[test]
fn test_namespace_alias_as_value_nullified() {
    let source = "import R, { map } from 'ramda';\nmap(f, xs, R);\n";
    let output = transform(source);

    assert_eq!(
        output.code,
        "import _map from \"ramda/src/map\";\n_map(f, xs, null);\n"
    );
}

// ===== Rule coverage =====

#[test]
fn test_renamed_named_import() {
    let output = transform("import { compose as c } from 'ramda';\nc(f, g);\n");
    assert_eq!(
        output.code,
        "import _compose from \"ramda/src/compose\";\n_compose(f, g);\n"
    );
}

#[test]
fn test_object_properties() {
    let source = "import { map, add } from 'ramda';\nconst o = { fn: map, [add]: 1, map, other: 2 };\n";
    let output = transform(source);

    assert_eq!(
        output.code,
        "import _map from \"ramda/src/map\";\nimport _add from \"ramda/src/add\";\nconst o = { fn: _map, [_add]: 1, map: _map, other: 2 };\n"
    );
}

#[test]
fn test_plain_property_key_untouched() {
    let source = "import { map } from 'ramda';\nconst o = { map: 1 };\no.map;\n";
    let output = transform(source);

    assert_eq!(output.code, "const o = { map: 1 };\no.map;\n");
    assert!(output.injected.is_empty());
}

#[test]
fn test_shorthand_namespace_alias() {
    let output = transform("import R from 'ramda';\nconst deps = { R };\n");
    assert_eq!(output.code, "const deps = { R: null };\n");
}

#[test]
fn test_named_binding_as_member_object() {
    let output = transform("import { map } from 'ramda';\nconsole.log(map.length);\n");
    assert_eq!(
        output.code,
        "import _map from \"ramda/src/map\";\nconsole.log(_map.length);\n"
    );
}

#[test]
fn test_string_subscript_on_namespace() {
    let output = transform("import * as R from 'ramda';\nR['map'](f);\n");
    assert_eq!(output.code, "import _map from \"ramda/src/map\";\n_map(f);\n");
}

#[test]
fn test_dynamic_subscript_on_namespace() {
    let output = transform("import R from 'ramda';\nR[name](f);\n");
    assert_eq!(output.code, "null[name](f);\n");
}

#[test]
fn test_unknown_member_is_resolution_error() {
    let err = transform_err("import R from 'ramda';\nR.nope(1);\n");
    match err {
        TransformError::Resolution(e) => {
            assert_eq!(e.symbol, "nope");
            assert_eq!(e.to_string(), "ramda's method nope was not a known function");
        }
        other => panic!("expected Resolution, got {:?}", other),
    }
}

#[test]
fn test_local_export_of_named_binding() {
    let output = transform("import { map } from 'ramda';\nexport { map };\n");
    assert_eq!(
        output.code,
        "import _map from \"ramda/src/map\";\nexport { _map as map };\n"
    );

    let output = transform("import { map } from 'ramda';\nexport { map as m };\n");
    assert_eq!(
        output.code,
        "import _map from \"ramda/src/map\";\nexport { _map as m };\n"
    );
}

#[test]
fn test_local_export_of_namespace_alias_rejected() {
    let err = transform_err("import R from 'ramda';\nexport { R };\n");
    assert!(matches!(err, TransformError::UnsupportedForm(_)));

    let err = transform_err("import R from 'ramda';\nexport default R;\n");
    assert!(matches!(err, TransformError::UnsupportedForm(_)));
}

#[test]
fn test_export_default_named_binding() {
    let output = transform("import { compose } from 'ramda';\nexport default compose;\n");
    assert_eq!(
        output.code,
        "import _compose from \"ramda/src/compose\";\nexport default _compose;\n"
    );
}

#[test]
fn test_default_specifier_is_namespace() {
    let output = transform("import { default as R } from 'ramda';\nR.map(f);\n");
    assert_eq!(output.code, "import _map from \"ramda/src/map\";\n_map(f);\n");
}

#[test]
fn test_two_libraries() {
    let source = r#"import { isNilOrEmpty } from 'ramda-extension';
import R from 'ramda';
R.filter(isNilOrEmpty, xs);
"#;
    let output = transform(source);

    assert_eq!(
        output.code,
        r#"import _isNilOrEmpty from "ramda-extension/src/isNilOrEmpty";
import _filter from "ramda/src/filter";
_filter(_isNilOrEmpty, xs);
"#
    );
    assert_eq!(output.removed_imports, 2);
}

#[test]
fn test_side_effect_import_removed() {
    let output = transform("import 'ramda';\nfoo();\n");
    assert_eq!(output.code, "foo();\n");
}

#[test]
fn test_injected_name_avoids_collisions() {
    let source = "import { map } from 'ramda';\nconst _map = 1;\nmap(_map);\n";
    let output = transform(source);

    assert_eq!(
        output.code,
        "import _map2 from \"ramda/src/map\";\nconst _map = 1;\n_map2(_map);\n"
    );
}

#[test]
fn test_prelude_after_directives() {
    let source = "'use strict';\nimport { map } from 'ramda';\nmap(f);\n";
    let output = transform(source);

    assert_eq!(
        output.code,
        "'use strict';\nimport _map from \"ramda/src/map\";\n_map(f);\n"
    );
}

#[test]
fn test_use_before_import_declaration() {
    let output = transform("map(f);\nimport { map } from 'ramda';\n");
    assert_eq!(output.code, "import _map from \"ramda/src/map\";\n_map(f);\n");
}

#[test]
fn test_nested_functions_and_callbacks() {
    let source = r#"import { map, identity } from 'ramda';
export function run(xs) {
  return xs.then((ys) => map(identity, ys));
}
"#;
    let output = transform(source);

    assert_eq!(
        output.code,
        r#"import _map from "ramda/src/map";
import _identity from "ramda/src/identity";
export function run(xs) {
  return xs.then((ys) => _map(_identity, ys));
}
"#
    );
}

#[test]
fn test_untracked_library_untouched() {
    let source = "import { map } from 'lodash';\nmap(f);\n";
    let output = transform(source);

    assert!(!output.changed);
    assert_eq!(output.code, source);
}

// ===== TypeScript =====

#[test]
fn test_typescript_type_import_kept() {
    let source = "import type { Lens } from 'ramda';\nimport { map } from 'ramda';\nconst l: Lens<any, any> = map(f);\n";
    let output = transform_as(source, SourceLanguage::TypeScript).unwrap();

    assert_eq!(
        output.code,
        "import _map from \"ramda/src/map\";\nimport type { Lens } from 'ramda';\nconst l: Lens<any, any> = _map(f);\n"
    );
}

#[test]
fn test_typescript_inline_type_specifier_kept() {
    let source = "import { type Lens, map } from 'ramda';\nconst l: Lens<any, any> = map(f);\n";
    let output = transform_as(source, SourceLanguage::TypeScript).unwrap();

    assert_eq!(
        output.code,
        "import _map from \"ramda/src/map\";\nimport type { Lens } from \"ramda\";\nconst l: Lens<any, any> = _map(f);\n"
    );
}

#[test]
fn test_typescript_function_type_parameter_not_nullified() {
    let source = "import R from 'ramda';\ntype F = (R: number) => void;\nR.map(f);\n";
    let output = transform_as(source, SourceLanguage::TypeScript).unwrap();

    assert_eq!(
        output.code,
        "import _map from \"ramda/src/map\";\ntype F = (R: number) => void;\n_map(f);\n"
    );
}

#[test]
fn test_typescript_overload_signature_parameter_not_nullified() {
    let source = "import R from 'ramda';\nfunction g(R: number): void;\nfunction g(R: number): void {}\n";
    let output = transform_as(source, SourceLanguage::TypeScript).unwrap();

    assert_eq!(
        output.code,
        "function g(R: number): void;\nfunction g(R: number): void {}\n"
    );
    assert_eq!(output.rewrites, 0);
}

#[test]
fn test_typescript_method_signature_parameter_injects_nothing() {
    let source = "import { filter } from 'ramda';\ninterface X { run(filter: number): void }\n";
    let output = transform_as(source, SourceLanguage::TypeScript).unwrap();

    assert_eq!(output.code, "interface X { run(filter: number): void }\n");
    assert!(output.injected.is_empty());
    assert_eq!(output.removed_imports, 1);
}

// ===== JSX =====

#[test]
fn test_jsx_namespace_alias_tag_rejected() {
    let err = transform_as(
        "import R from 'ramda';\nconst el = <R />;\n",
        SourceLanguage::Jsx,
    )
    .unwrap_err();

    match err {
        TransformError::UnsupportedForm(e) => assert_eq!(e.form, "<R />"),
        other => panic!("expected UnsupportedForm, got {:?}", other),
    }
}

#[test]
fn test_jsx_intrinsic_tag_not_a_reference() {
    let source = "import { map } from 'ramda';\nconst el = <map></map>;\n";
    let output = transform_as(source, SourceLanguage::Jsx).unwrap();

    assert_eq!(output.code, "const el = <map></map>;\n");
    assert!(output.injected.is_empty());
}

// ===== Errors & lifecycle =====

#[test]
fn test_syntax_error_in_tracked_unit() {
    let err = transform_err("import { map } from 'ramda';\nmap(;\n");
    assert!(matches!(err, TransformError::SyntaxError { line: 2, .. }));
}

#[test]
fn test_syntax_error_in_untracked_unit_is_ignored() {
    let source = "const x = ;\n";
    let output = transform(source);
    assert!(!output.changed);
    assert_eq!(output.code, source);
}

#[test]
fn test_no_state_leaks_between_units() {
    let index = index();
    let mut transformer = Transformer::new(&index).unwrap();

    let first = transformer
        .transform_source(
            "import { map } from 'ramda';\nmap(f);\n",
            SourceLanguage::JavaScript,
            Path::new("a.js"),
        )
        .unwrap();
    assert!(first.changed);

    let source = "function map(f) { return f; }\nmap(g);\n";
    let second = transformer
        .transform_source(source, SourceLanguage::JavaScript, Path::new("b.js"))
        .unwrap();
    assert!(!second.changed);
    assert_eq!(second.code, source);
    assert!(second.injected.is_empty());

    // Reprocessing the first unit gives the same result again.
    let again = transformer
        .transform_source(
            "import { map } from 'ramda';\nmap(f);\n",
            SourceLanguage::JavaScript,
            Path::new("a.js"),
        )
        .unwrap();
    assert_eq!(again.code, first.code);
}

#[test]
fn test_failed_unit_returns_no_partial_output() {
    let index = index();
    let mut transformer = Transformer::new(&index).unwrap();
    let source = "import { map } from 'ramda';\nmap(f);\nexport * from 'ramda';\n";

    assert!(transformer
        .transform_source(source, SourceLanguage::JavaScript, Path::new("a.js"))
        .is_err());
}

#[test]
fn test_transform_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("input.mjs");
    std::fs::write(&path, "import R from 'ramda';\nR.add(1, 2);\n").unwrap();

    let index = index();
    let mut transformer = Transformer::new(&index).unwrap();
    let output = transformer.transform_file(&path).unwrap();
    assert_eq!(output.code, "import _add from \"ramda/src/add\";\n_add(1, 2);\n");

    let err = transformer
        .transform_file(&dir.path().join("styles.css"))
        .unwrap_err();
    assert!(matches!(err, TransformError::UnsupportedFileType(ref ext) if ext == "css"));
}
