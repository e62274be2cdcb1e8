//! Lexical scope resolution.
//!
//! A name is looked up by walking the ancestors of the referencing node:
//!
//! 1. lambda parameters (identifier, formals, `@` binding),
//! 2. `let ... in` bindings,
//! 3. `rec { ... }` bindings, including `inherit`,
//! 4. `with e; body`: when nothing above binds the name, it becomes ad-hoc,
//! 5. global builtins, only when no `with` is in effect.
//!
//! The innermost declaring host wins. The resolver never chooses among
//! same-named declarations of one host; they form a single symbol.

use tracing::{debug, trace};

use super::attribute::{Attribute, AttributePath};
use super::builtins::resolve_global;
use super::declaration::DeclarationHost;
use super::symbol::{AdHocSymbol, BuiltinSymbol, DeclaredSymbol, Symbol};
use super::usage::VariableUsage;
use crate::syntax::ast::{AstNode, Root, With};
use crate::syntax::{SyntaxKind, SyntaxNode};

// ============================================================================
// RESOLUTION RESULT
// ============================================================================

/// Candidates for each segment of a usage's path.
///
/// Resolution stops after the first segment whose candidates are empty,
/// ambiguous or ad-hoc, so `segments()` may be shorter than the path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UsageResolution {
    path: AttributePath,
    segments: Vec<Vec<Symbol>>,
}

impl UsageResolution {
    pub fn path(&self) -> &AttributePath {
        &self.path
    }

    pub fn segments(&self) -> &[Vec<Symbol>] {
        &self.segments
    }

    /// Candidates for segment `index`, or an empty slice if resolution
    /// stopped earlier.
    pub fn symbols(&self, index: usize) -> &[Symbol] {
        self.segments.get(index).map_or(&[], Vec::as_slice)
    }

    /// Whether every segment was resolved to at least one candidate.
    pub fn is_complete(&self) -> bool {
        self.segments.len() == self.path.len()
            && self.segments.last().is_some_and(|last| !last.is_empty())
    }

    /// Candidates for the last segment, if resolution got that far.
    pub fn target(&self) -> Option<&[Symbol]> {
        if self.is_complete() {
            self.segments.last().map(Vec::as_slice)
        } else {
            None
        }
    }

    /// Whether the first segment has no candidates at all.
    pub fn is_unresolved(&self) -> bool {
        self.symbols(0).is_empty()
    }
}

// ============================================================================
// SCOPE RESOLVER
// ============================================================================

/// Resolves names against one syntax tree snapshot.
#[derive(Clone, Debug)]
pub struct ScopeResolver {
    root: SyntaxNode,
}

impl ScopeResolver {
    /// `root` must be the root of the tree the resolved elements live in.
    pub fn new(root: SyntaxNode) -> Self {
        Self { root }
    }

    pub fn for_tree(tree: &Root) -> Self {
        Self::new(tree.syntax().clone())
    }

    pub fn root(&self) -> &SyntaxNode {
        &self.root
    }

    /// Candidates for `attribute` as a variable name at `element`.
    pub fn resolve_name(&self, element: &SyntaxNode, attribute: &Attribute) -> Vec<Symbol> {
        let path = AttributePath::single(attribute.clone());
        let own_host = inherit_host(element);
        let mut with_scopes = 0usize;
        let mut previous = element.clone();

        for node in element.ancestors().skip(1) {
            if node.kind() == SyntaxKind::WITH {
                let from_body = With::cast(node.clone())
                    .and_then(|with| with.body())
                    .is_some_and(|body| body.syntax() == &previous);
                if from_body {
                    with_scopes += 1;
                }
            } else if own_host.as_ref() != Some(&node) {
                if let Some(host) = DeclarationHost::cast(node.clone()).filter(|h| h.is_scope()) {
                    trace!(name = %attribute, host = ?node.kind(), "checking scope");
                    if !host.declarations(&path).is_empty() {
                        debug!(name = %attribute, range = ?node.text_range(), "resolved to declaration");
                        return vec![Symbol::Declared(DeclaredSymbol::new(&host, path))];
                    }
                }
            }
            previous = node;
        }

        if with_scopes > 0 {
            debug!(name = %attribute, with_scopes, "resolved through with");
            return vec![Symbol::AdHoc(AdHocSymbol::new(None, attribute.clone()))];
        }
        match attribute.name().and_then(resolve_global) {
            Some(builtin) => {
                debug!(name = %attribute, "resolved to builtin");
                vec![Symbol::Builtin(BuiltinSymbol::new(builtin))]
            }
            None => {
                debug!(name = %attribute, "unresolved");
                Vec::new()
            }
        }
    }

    /// Resolves each segment of `usage` in turn.
    pub fn resolve_usage(&self, usage: &VariableUsage) -> UsageResolution {
        let path = usage.path().clone();
        let mut segments = Vec::with_capacity(path.len());
        let mut current = self.resolve_name(usage.element().syntax(), path.first());
        let mut rest = path.iter().skip(1);

        loop {
            let stop = current.len() != 1 || current[0].is_ad_hoc();
            let next = if stop {
                None
            } else {
                rest.next().map(|attribute| current[0].resolve(&self.root, attribute))
            };
            segments.push(current);
            match next {
                Some(symbols) => current = symbols,
                None => break,
            }
        }
        UsageResolution { path, segments }
    }
}

/// The host a var-form `inherit x;` belongs to; its own bindings are not in
/// scope for the inherited name.
fn inherit_host(element: &SyntaxNode) -> Option<SyntaxNode> {
    if element.kind() != SyntaxKind::INHERITED_NAME {
        return None;
    }
    element.parent()?.parent()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::usage::usages;
    use crate::syntax::parse;
    use rstest::rstest;

    /// Resolves the last usage in `text`.
    fn resolve_last(text: &str) -> UsageResolution {
        let root = parse(text).syntax_node();
        let usage = usages(&root).last().unwrap();
        ScopeResolver::new(root).resolve_usage(&usage)
    }

    fn first_symbol(text: &str) -> Option<Symbol> {
        resolve_last(text).symbols(0).first().cloned()
    }

    #[rstest]
    #[case("let x = 1; in x")]
    #[case("rec { x = 1; y = x; }")]
    #[case("x: x")]
    #[case("{ x }: x")]
    #[case("x@{ ... }: x")]
    #[case("{ y ? x, x }: y")]
    fn test_declared(#[case] text: &str) {
        assert!(matches!(first_symbol(text), Some(Symbol::Declared(_))), "{text}");
    }

    #[test]
    fn test_formal_default_sees_other_formals() {
        let root = parse("{ y ? x, x }: y").syntax_node();
        let x = usages(&root).next().unwrap();
        assert_eq!(x.path().to_string(), "x");
        let resolved = ScopeResolver::new(root).resolve_usage(&x);
        assert!(matches!(resolved.symbols(0), [Symbol::Declared(_)]));
    }

    #[test]
    fn test_parameter_shadows_let() {
        let symbol = first_symbol("let x = 1; in x: x").unwrap();
        let declared = symbol.as_declared().unwrap();
        assert_eq!(declared.host_ptr().kind(), SyntaxKind::LAMBDA);
    }

    #[test]
    fn test_non_rec_set_is_not_a_scope() {
        assert!(first_symbol("{ x = 1; y = x; }").is_none());
    }

    #[test]
    fn test_with_makes_unbound_names_ad_hoc() {
        assert!(first_symbol("with pkgs; x").unwrap().is_ad_hoc());
        assert!(first_symbol("with a; with b; x").unwrap().is_ad_hoc());
    }

    #[test]
    fn test_lexical_binding_beats_with() {
        let symbol = first_symbol("let x = 1; in with pkgs; x").unwrap();
        assert!(matches!(symbol, Symbol::Declared(_)));
    }

    #[test]
    fn test_with_namespace_is_not_in_its_own_scope() {
        let root = parse("with pkgs; x").syntax_node();
        let pkgs = usages(&root).next().unwrap();
        let resolved = ScopeResolver::new(root).resolve_usage(&pkgs);
        assert!(resolved.is_unresolved());
    }

    #[test]
    fn test_builtins() {
        assert_eq!(first_symbol("map").unwrap().as_builtin().unwrap().name(), "map");
        let resolution = resolve_last("builtins.map");
        assert!(resolution.is_complete());
        assert_eq!(resolution.target().unwrap()[0].as_builtin().unwrap().name(), "map");

        let missing = resolve_last("builtins.notARealThing");
        assert!(missing.target().unwrap()[0].is_ad_hoc());
    }

    #[test]
    fn test_with_beats_builtins() {
        assert!(first_symbol("with pkgs; map").unwrap().is_ad_hoc());
    }

    #[test]
    fn test_unknown_name_has_no_candidates() {
        let resolution = resolve_last("undefinedThing");
        assert!(resolution.is_unresolved());
        assert!(resolution.target().is_none());
        assert!(!resolution.is_complete());
        assert_eq!(resolution.segments().len(), 1);
    }

    #[test]
    fn test_inherit_looks_outside_its_own_host() {
        let resolution = resolve_last("let x = 1; in let inherit x; in 2");
        let declared = resolution.symbols(0)[0].as_declared().unwrap();
        let root = parse("let x = 1; in let inherit x; in 2").syntax_node();
        assert_eq!(declared.host_ptr(), crate::syntax::NodePtr::new(&root.first_child().unwrap()));

        assert!(resolve_last("rec { inherit x; }").is_unresolved());
    }

    #[test]
    fn test_attrpath_descent() {
        let resolution = resolve_last("let a.b = 1; a.c = 2; in a.b");
        assert!(resolution.is_complete());
        let target = resolution.target().unwrap();
        assert_eq!(target.len(), 1);
        assert_eq!(target[0].as_declared().unwrap().path().to_string(), "a.b");
    }

    #[test]
    fn test_attr_set_value_descent() {
        let resolution = resolve_last("let a = { b = { c = 1; }; }; in a.b.c");
        assert!(resolution.is_complete());
        let target = &resolution.target().unwrap()[0];
        assert_eq!(target.as_declared().unwrap().path().to_string(), "c");
        assert_eq!(target.as_declared().unwrap().host_ptr().kind(), SyntaxKind::ATTR_SET);
    }

    #[test]
    fn test_parameter_descends_to_ad_hoc() {
        let resolution = resolve_last("pkgs: pkgs.hello.out");
        assert_eq!(resolution.segments().len(), 2);
        assert!(resolution.symbols(1)[0].is_ad_hoc());
        assert!(!resolution.is_complete());
    }

    #[test]
    fn test_duplicates_form_one_symbol() {
        let root = parse("let a = 1; a = 2; in a").syntax_node();
        let usage = usages(&root).last().unwrap();
        let resolver = ScopeResolver::new(root.clone());
        let resolution = resolver.resolve_usage(&usage);
        assert_eq!(resolution.symbols(0).len(), 1);
        assert_eq!(resolution.symbols(0)[0].declarations(&root).len(), 2);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let text = "{ lib, pkgs }: with lib; let x = pkgs.a; in builtins.map x.y z";
        let root = parse(text).syntax_node();
        let resolver = ScopeResolver::new(root.clone());
        for usage in usages(&root) {
            assert_eq!(resolver.resolve_usage(&usage), resolver.resolve_usage(&usage));
        }
    }
}
