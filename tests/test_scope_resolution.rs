//! Scope resolution through the public API.
//!
//! Each case resolves the last usage of a snippet and checks what kind of
//! symbol every segment lands on.

use nixref::hir::{
    DeclarationKind, ScopeResolver, Symbol, SymbolPointer, UsageResolution, usages,
};
use nixref::parse;
use rstest::rstest;

/// Resolves the last usage of `source` whose path starts with `head`.
fn resolve(source: &str, head: &str) -> UsageResolution {
    let root = parse(source).syntax_node();
    let usage = usages(&root)
        .filter(|u| u.path().first().name() == Some(head))
        .last()
        .unwrap_or_else(|| panic!("no usage of {head} in {source}"));
    ScopeResolver::new(root).resolve_usage(&usage)
}

fn describe(symbols: &[Symbol]) -> String {
    match symbols {
        [] => "none".into(),
        [Symbol::Declared(_)] => "declared".into(),
        [Symbol::Builtin(b)] => format!("builtin:{}", b.descriptor().name()),
        [Symbol::AdHoc(_)] => "ad-hoc".into(),
        many => format!("ambiguous:{}", many.len()),
    }
}

#[rstest]
#[case::let_binding("let x = 1; in x", "x", "declared")]
#[case::parameter_shadows_let("let x = 1; in x: x", "x", "declared")]
#[case::with_gives_ad_hoc("with pkgs; x", "x", "ad-hoc")]
#[case::nested_with("with a; with b; x", "x", "ad-hoc")]
#[case::let_beats_with("let x = 1; in with pkgs; x", "x", "declared")]
#[case::with_beats_builtin("with pkgs; map", "map", "ad-hoc")]
#[case::global_builtin("map", "map", "builtin:map")]
#[case::builtins_root("builtins", "builtins", "builtin:builtins")]
#[case::unknown("notDefined", "notDefined", "none")]
#[case::plain_set_is_not_a_scope("{ x = 1; y = x; }", "x", "none")]
#[case::rec_set("rec { x = 1; y = x; }", "x", "declared")]
#[case::formal_default_sees_formals("{ a, b ? a }: b", "a", "declared")]
#[case::with_namespace_outside_with("with x; y", "x", "none")]
fn test_first_segment(#[case] source: &str, #[case] head: &str, #[case] expected: &str) {
    let resolution = resolve(source, head);
    assert_eq!(describe(resolution.symbols(0)), expected, "{source}");
}

#[test]
fn test_parameter_shadows_let_binding_by_kind() {
    let source = "let x = 1; in x: x";
    let root = parse(source).syntax_node();
    let usage = usages(&root).last().unwrap();
    let resolution = ScopeResolver::new(root.clone()).resolve_usage(&usage);
    let declarations = resolution.symbols(0)[0].declarations(&root);
    assert_eq!(declarations.len(), 1);
    assert_eq!(declarations[0].kind(), DeclarationKind::Parameter);
}

#[test]
fn test_builtins_members() {
    let resolution = resolve("builtins.map", "builtins");
    assert!(resolution.is_complete());
    assert_eq!(describe(resolution.symbols(1)), "builtin:map");

    let resolution = resolve("builtins.notARealThing", "builtins");
    assert_eq!(describe(resolution.symbols(1)), "ad-hoc");
    assert_eq!(resolution.symbols(1)[0].name(), "notARealThing");
}

#[test]
fn test_nested_builtin_has_no_members() {
    let resolution = resolve("builtins.map.foo", "builtins");
    assert_eq!(describe(resolution.symbols(1)), "builtin:map");
    assert_eq!(describe(resolution.symbols(2)), "ad-hoc");
}

#[test]
fn test_ad_hoc_is_absorbing() {
    let resolution = resolve("with pkgs; a.b.c", "a");
    assert_eq!(resolution.segments().len(), 1);
    assert!(resolution.symbols(0)[0].is_ad_hoc());

    let symbol = &resolution.symbols(0)[0];
    let root = parse("x").syntax_node();
    let mut current = symbol.clone();
    for name in ["b", "c", "d"] {
        let next = current.resolve(&root, &name.into());
        assert_eq!(next.len(), 1);
        assert!(next[0].is_ad_hoc());
        current = next[0].clone();
    }
}

#[test]
fn test_descent_through_attribute_sets() {
    let source = r#"
        let
          config = {
            services.nginx = { enable = 1; };
            networking.hostName = "box";
          };
        in [ config.services.nginx.enable config.networking.hostName config.boot ]
    "#;

    let nginx = resolve(source, "config");
    assert_eq!(nginx.path().to_string(), "config.boot");
    assert_eq!(describe(nginx.symbols(1)), "ad-hoc");

    let root = parse(source).syntax_node();
    let resolver = ScopeResolver::new(root.clone());
    let all: Vec<_> = usages(&root).map(|u| resolver.resolve_usage(&u)).collect();
    assert_eq!(all.len(), 3);
    assert!(all[0].is_complete());
    assert!(all[0].symbols(3).iter().all(|s| matches!(s, Symbol::Declared(_))));
    assert!(all[1].is_complete());
    assert_eq!(describe(all[1].symbols(2)), "declared");
}

#[test]
fn test_duplicate_declarations_form_one_symbol() {
    let root = parse("let a.x = 1; a.y = 2; in a").syntax_node();
    let usage = usages(&root).last().unwrap();
    let resolution = ScopeResolver::new(root.clone()).resolve_usage(&usage);
    assert_eq!(resolution.symbols(0).len(), 1);
    assert_eq!(resolution.symbols(0)[0].declarations(&root).len(), 2);
}

#[test]
fn test_inherit_refers_to_outer_scope() {
    let source = "let x = 1; in let inherit x; in x";
    let root = parse(source).syntax_node();
    let resolver = ScopeResolver::new(root.clone());
    let found: Vec<_> = usages(&root).map(|u| resolver.resolve_usage(&u)).collect();
    assert_eq!(found.len(), 2);

    let inherited = found[0].symbols(0)[0].declarations(&root);
    assert_eq!(inherited[0].kind(), DeclarationKind::Binding);
    let body = found[1].symbols(0)[0].declarations(&root);
    assert_eq!(body[0].kind(), DeclarationKind::Inherit);
}

#[test]
fn test_resolution_is_idempotent() {
    let source = "{ pkgs, lib }: with lib; let cfg = { a = 1; }; in [ cfg.a pkgs.hello mkIf builtins.map ]";
    let root = parse(source).syntax_node();
    let resolver = ScopeResolver::new(root.clone());
    for usage in usages(&root) {
        assert_eq!(resolver.resolve_usage(&usage), resolver.resolve_usage(&usage));
    }
}

#[test]
fn test_symbol_pointer_dereference() {
    let before = parse("let a = 1; in a").syntax_node();
    let usage = usages(&before).last().unwrap();
    let symbol = ScopeResolver::new(before.clone()).resolve_usage(&usage).symbols(0)[0].clone();
    let pointer: SymbolPointer = symbol.pointer();
    assert_eq!(pointer.dereference(&before), Some(symbol));

    let removed = parse("let b = 1; in a").syntax_node();
    assert_eq!(pointer.dereference(&removed), None);
}

#[test]
fn test_resolver_is_usable_across_threads() {
    let parsed = parse("let x = 1; in [ x x x ]");
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let parsed = parsed.clone();
            std::thread::spawn(move || {
                let root = parsed.syntax_node();
                let resolver = ScopeResolver::new(root.clone());
                usages(&root)
                    .map(|u| resolver.resolve_usage(&u).symbols(0).to_vec())
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
}
