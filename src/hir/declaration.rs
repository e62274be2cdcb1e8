//! Declaration hosts: the syntax nodes that bind names.

use super::attribute::{Attribute, AttributePath};
use crate::base::TextRange;
use crate::syntax::ast::{
    AstChildren, AstNode, AttrSet, Entry, Expr, HasEntries, Lambda, LetIn, Param, ParamName,
};
use crate::syntax::{NodePtr, SyntaxKind, SyntaxNode};

/// A node that introduces bindings.
///
/// Non-recursive attribute sets declare attributes but do not open a scope;
/// see [`DeclarationHost::is_scope`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DeclarationHost {
    Lambda(Lambda),
    LetIn(LetIn),
    AttrSet(AttrSet),
}

/// How a name is declared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    /// `x: ...`
    Parameter,
    /// `{ x ? default }: ...`
    Formal,
    /// `x@{ ... }: ...`
    PatternBind,
    /// `x = value;`, with `x` the full attribute path.
    Binding,
    /// A leading part of a longer attribute path, like `a` in `a.b = 1;`.
    AttrPrefix,
    /// `inherit x;` or `inherit (e) x;`
    Inherit,
}

/// One place that declares a path within its host.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Declaration {
    kind: DeclarationKind,
    name: NodePtr,
    value: Option<NodePtr>,
}

impl Declaration {
    pub fn kind(&self) -> DeclarationKind {
        self.kind
    }

    /// The `PARAM_NAME` or `ATTR` node spelling the declared segment.
    pub fn name_ptr(&self) -> NodePtr {
        self.name
    }

    pub fn name_range(&self) -> TextRange {
        self.name.range()
    }

    /// The bound expression, present only for [`DeclarationKind::Binding`].
    pub fn value(&self, root: &SyntaxNode) -> Option<Expr> {
        self.value.as_ref()?.cast(root)
    }
}

impl DeclarationHost {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        match node.kind() {
            SyntaxKind::LAMBDA => Lambda::cast(node).map(DeclarationHost::Lambda),
            SyntaxKind::LET_IN => LetIn::cast(node).map(DeclarationHost::LetIn),
            SyntaxKind::ATTR_SET => AttrSet::cast(node).map(DeclarationHost::AttrSet),
            _ => None,
        }
    }

    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            DeclarationHost::Lambda(it) => it.syntax(),
            DeclarationHost::LetIn(it) => it.syntax(),
            DeclarationHost::AttrSet(it) => it.syntax(),
        }
    }

    /// Whether the bindings are visible to expressions inside the host.
    pub fn is_scope(&self) -> bool {
        match self {
            DeclarationHost::Lambda(_) | DeclarationHost::LetIn(_) => true,
            DeclarationHost::AttrSet(set) => set.is_rec(),
        }
    }

    /// Declarations of `path`. An attrpath binding declares `path` when
    /// `path` is a prefix of it (`a.b = 1;` declares both `a` and `a.b`).
    pub fn declarations(&self, path: &AttributePath) -> Vec<Declaration> {
        self.bindings()
            .into_iter()
            .filter(|(declared, _)| declared == path)
            .map(|(_, declaration)| declaration)
            .collect()
    }

    /// Every declared path with its declaration, in source order.
    pub fn bindings(&self) -> Vec<(AttributePath, Declaration)> {
        let mut out = Vec::new();
        match self {
            DeclarationHost::Lambda(lambda) => match lambda.param() {
                Some(Param::ParamName(name)) => {
                    push_param(&mut out, &name, DeclarationKind::Parameter);
                }
                Some(Param::Pattern(pattern)) => {
                    for bind in pattern.binds() {
                        if let Some(name) = bind.name() {
                            push_param(&mut out, &name, DeclarationKind::PatternBind);
                        }
                    }
                    for entry in pattern.entries() {
                        if let Some(name) = entry.name() {
                            push_param(&mut out, &name, DeclarationKind::Formal);
                        }
                    }
                }
                None => {}
            },
            DeclarationHost::LetIn(let_in) => push_entries(&mut out, let_in.entries()),
            DeclarationHost::AttrSet(set) => push_entries(&mut out, set.entries()),
        }
        out
    }
}

fn push_param(
    out: &mut Vec<(AttributePath, Declaration)>,
    name: &ParamName,
    kind: DeclarationKind,
) {
    if let Some(text) = name.name() {
        out.push((
            AttributePath::single(Attribute::Static(text)),
            Declaration {
                kind,
                name: NodePtr::from(name),
                value: None,
            },
        ));
    }
}

fn push_entries(out: &mut Vec<(AttributePath, Declaration)>, entries: AstChildren<Entry>) {
    for entry in entries {
        match entry {
            Entry::AttrpathValue(binding) => {
                let Some(attrpath) = binding.attrpath() else {
                    continue;
                };
                let attrs: Vec<_> = attrpath.attrs().collect();
                let mut segments = Vec::with_capacity(attrs.len());
                for (index, attr) in attrs.iter().enumerate() {
                    segments.push(Attribute::from_attr(attr));
                    let complete = index + 1 == attrs.len();
                    let Some(path) = AttributePath::new(segments.iter().cloned()) else {
                        continue;
                    };
                    out.push((
                        path,
                        Declaration {
                            kind: if complete {
                                DeclarationKind::Binding
                            } else {
                                DeclarationKind::AttrPrefix
                            },
                            name: NodePtr::from(attr),
                            value: complete
                                .then(|| binding.value())
                                .flatten()
                                .map(|value| NodePtr::from(&value)),
                        },
                    ));
                }
            }
            Entry::Inherit(inherit) => {
                for name in inherit.names() {
                    let Some(attr) = name.attr() else {
                        continue;
                    };
                    out.push((
                        AttributePath::single(Attribute::from_attr(&attr)),
                        Declaration {
                            kind: DeclarationKind::Inherit,
                            name: NodePtr::from(&attr),
                            value: None,
                        },
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    fn host(text: &str) -> (SyntaxNode, DeclarationHost) {
        let root = parse(text).syntax_node();
        let host = root.descendants().find_map(DeclarationHost::cast).unwrap();
        (root, host)
    }

    fn path(names: &[&str]) -> AttributePath {
        AttributePath::from_names(names.iter().copied()).unwrap()
    }

    #[test]
    fn test_lambda_declarations() {
        let (_, lambda) = host("args@{ a, b ? 1, ... }: a");
        let kinds: Vec<_> = lambda.bindings().iter().map(|(p, d)| (p.to_string(), d.kind())).collect();
        assert_eq!(
            kinds,
            [
                ("args".into(), DeclarationKind::PatternBind),
                ("a".into(), DeclarationKind::Formal),
                ("b".into(), DeclarationKind::Formal),
            ]
        );
        assert!(lambda.is_scope());
    }

    #[test]
    fn test_attrpath_prefixes_are_declared() {
        let (root, set) = host("{ a.b = 1; a.c = { }; }");
        let a = set.declarations(&path(&["a"]));
        assert_eq!(a.len(), 2);
        assert!(a.iter().all(|d| d.kind() == DeclarationKind::AttrPrefix));
        assert!(a.iter().all(|d| d.value(&root).is_none()));

        let ac = set.declarations(&path(&["a", "c"]));
        assert_eq!(ac.len(), 1);
        assert!(matches!(ac[0].value(&root), Some(Expr::AttrSet(_))));
        assert!(set.declarations(&path(&["b"])).is_empty());
        assert!(!set.is_scope());
    }

    #[test]
    fn test_inherit_declares_names() {
        let (_, let_in) = host("let inherit a; inherit (x) b; c = 1; in c");
        let names: Vec<_> = let_in.bindings().iter().map(|(p, _)| p.to_string()).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(
            let_in.declarations(&path(&["b"]))[0].kind(),
            DeclarationKind::Inherit
        );
    }

    #[test]
    fn test_rec_set_is_scope() {
        let (_, set) = host("rec { a = 1; }");
        assert!(set.is_scope());
    }
}
