//! Symbols: what a usage segment refers to.
//!
//! ```text
//!                resolve(name)
//!   Declared ─────────────────────▶ Declared | AdHoc
//!   Builtin(builtins) ────────────▶ Builtin(member) | AdHoc
//!   Builtin(member) ──────────────▶ AdHoc
//!   AdHoc ────────────────────────▶ AdHoc
//! ```
//!
//! Symbols hold no tree references. Operations that need the tree take the
//! root node of the snapshot the symbol was resolved against.

use std::sync::Arc;

use smol_str::SmolStr;
use tracing::trace;

use super::attribute::{Attribute, AttributePath};
use super::builtins::BuiltinDescriptor;
use super::declaration::{Declaration, DeclarationHost};
use super::presentation::{Presentation, SymbolIcon, TextAttributesKey};
use crate::syntax::ast::Expr;
use crate::syntax::{NodePtr, SyntaxKind, SyntaxNode};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
    Declared(DeclaredSymbol),
    Builtin(BuiltinSymbol),
    AdHoc(AdHocSymbol),
}

/// A path declared by a host node.
///
/// Several declarations of the same path in one host form one symbol.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DeclaredSymbol {
    host: NodePtr,
    path: AttributePath,
}

/// Role of a declared symbol, used for presentation and highlighting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeclaredRole {
    Parameter,
    Variable,
    Attribute,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BuiltinSymbol {
    descriptor: &'static BuiltinDescriptor,
}

/// An attribute whose existence cannot be decided statically, e.g. anything
/// inside `with`, or below a function parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AdHocSymbol {
    parent: Option<Arc<Symbol>>,
    attribute: Attribute,
}

impl DeclaredSymbol {
    pub(crate) fn new(host: &DeclarationHost, path: AttributePath) -> Self {
        Self {
            host: NodePtr::new(host.syntax()),
            path,
        }
    }

    pub fn host_ptr(&self) -> NodePtr {
        self.host
    }

    pub fn path(&self) -> &AttributePath {
        &self.path
    }

    pub fn host(&self, root: &SyntaxNode) -> Option<DeclarationHost> {
        DeclarationHost::cast(self.host.to_node(root)?)
    }

    pub fn declarations(&self, root: &SyntaxNode) -> Vec<Declaration> {
        self.host(root)
            .map(|host| host.declarations(&self.path))
            .unwrap_or_default()
    }

    pub fn role(&self) -> DeclaredRole {
        match self.host.kind() {
            SyntaxKind::LAMBDA => DeclaredRole::Parameter,
            SyntaxKind::LET_IN if self.path.len() == 1 => DeclaredRole::Variable,
            _ => DeclaredRole::Attribute,
        }
    }

    /// Descends into `attribute`: first through longer attrpaths of the same
    /// host, then into attribute set literals bound to this path.
    fn resolve_member(&self, root: &SyntaxNode, attribute: &Attribute) -> Vec<Symbol> {
        let Some(host) = self.host(root) else {
            return Vec::new();
        };
        let extended = self.path.child(attribute.clone());
        if !host.declarations(&extended).is_empty() {
            trace!(path = %extended, "found in declaring host");
            return vec![Symbol::Declared(DeclaredSymbol::new(&host, extended))];
        }

        let member = AttributePath::single(attribute.clone());
        let mut found = Vec::new();
        for declaration in host.declarations(&self.path) {
            let Some(Expr::AttrSet(set)) = declaration.value(root).and_then(Expr::strip_parens)
            else {
                continue;
            };
            let nested = DeclarationHost::AttrSet(set);
            if !nested.declarations(&member).is_empty() {
                trace!(path = %member, "found in attribute set value");
                found.push(Symbol::Declared(DeclaredSymbol::new(&nested, member.clone())));
            }
        }
        found
    }
}

impl BuiltinSymbol {
    pub fn new(descriptor: &'static BuiltinDescriptor) -> Self {
        Self { descriptor }
    }

    pub fn descriptor(&self) -> &'static BuiltinDescriptor {
        self.descriptor
    }
}

impl AdHocSymbol {
    pub fn new(parent: Option<Symbol>, attribute: Attribute) -> Self {
        Self {
            parent: parent.map(Arc::new),
            attribute,
        }
    }

    pub fn parent(&self) -> Option<&Symbol> {
        self.parent.as_deref()
    }

    pub fn attribute(&self) -> &Attribute {
        &self.attribute
    }
}

impl Symbol {
    pub fn name(&self) -> SmolStr {
        match self {
            Symbol::Declared(declared) => attribute_name(declared.path.last()),
            Symbol::Builtin(builtin) => SmolStr::new_static(builtin.descriptor.name()),
            Symbol::AdHoc(ad_hoc) => attribute_name(&ad_hoc.attribute),
        }
    }

    pub fn is_ad_hoc(&self) -> bool {
        matches!(self, Symbol::AdHoc(_))
    }

    pub fn as_declared(&self) -> Option<&DeclaredSymbol> {
        match self {
            Symbol::Declared(declared) => Some(declared),
            _ => None,
        }
    }

    pub fn as_builtin(&self) -> Option<&'static BuiltinDescriptor> {
        match self {
            Symbol::Builtin(builtin) => Some(builtin.descriptor),
            _ => None,
        }
    }

    /// Candidates for `self.<attribute>`. Never empty.
    pub fn resolve(&self, root: &SyntaxNode, attribute: &Attribute) -> Vec<Symbol> {
        let found = match self {
            Symbol::Declared(declared) => declared.resolve_member(root, attribute),
            Symbol::Builtin(builtin) => attribute
                .name()
                .and_then(|name| builtin.descriptor.member(name))
                .map(|member| vec![Symbol::Builtin(BuiltinSymbol::new(member))])
                .unwrap_or_default(),
            Symbol::AdHoc(_) => Vec::new(),
        };
        if found.is_empty() {
            vec![Symbol::AdHoc(AdHocSymbol::new(Some(self.clone()), attribute.clone()))]
        } else {
            found
        }
    }

    /// Declaration sites; empty for builtin and ad-hoc symbols.
    pub fn declarations(&self, root: &SyntaxNode) -> Vec<Declaration> {
        match self {
            Symbol::Declared(declared) => declared.declarations(root),
            _ => Vec::new(),
        }
    }

    pub fn pointer(&self) -> SymbolPointer {
        SymbolPointer(self.clone())
    }

    pub fn presentation(&self) -> Presentation {
        let label = self.name().to_string();
        match self {
            Symbol::Declared(declared) => {
                let (icon, key) = match declared.role() {
                    DeclaredRole::Parameter => (SymbolIcon::Parameter, TextAttributesKey::Parameter),
                    DeclaredRole::Variable => (SymbolIcon::Variable, TextAttributesKey::LocalVariable),
                    DeclaredRole::Attribute => (SymbolIcon::Attribute, TextAttributesKey::Attribute),
                };
                Presentation::new(label).with_icon(icon).with_text_attributes(key)
            }
            Symbol::Builtin(_) => Presentation::new(label)
                .with_icon(SymbolIcon::Builtin)
                .with_text_attributes(TextAttributesKey::Builtin),
            Symbol::AdHoc(ad_hoc) if ad_hoc.parent.is_none() => Presentation::new(label)
                .with_icon(SymbolIcon::Variable)
                .with_text_attributes(TextAttributesKey::LocalVariable),
            Symbol::AdHoc(_) => Presentation::new(label)
                .with_icon(SymbolIcon::Attribute)
                .with_text_attributes(TextAttributesKey::Attribute),
        }
    }
}

fn attribute_name(attribute: &Attribute) -> SmolStr {
    match attribute {
        Attribute::Static(name) => name.clone(),
        Attribute::Dynamic(_) => SmolStr::new(attribute.to_string()),
    }
}

/// A durable handle to a symbol that can be checked against a newer tree.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SymbolPointer(Symbol);

impl SymbolPointer {
    /// The symbol again, or `None` if its declaring host no longer declares
    /// its path under `root`.
    pub fn dereference(&self, root: &SyntaxNode) -> Option<Symbol> {
        is_live(&self.0, root).then(|| self.0.clone())
    }
}

fn is_live(symbol: &Symbol, root: &SyntaxNode) -> bool {
    match symbol {
        Symbol::Declared(declared) => !declared.declarations(root).is_empty(),
        Symbol::Builtin(_) => true,
        Symbol::AdHoc(ad_hoc) => ad_hoc.parent().is_none_or(|parent| is_live(parent, root)),
    }
}
