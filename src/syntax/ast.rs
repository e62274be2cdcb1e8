//! Typed wrappers over [`SyntaxNode`].
//!
//! Wrappers are views: they hold a red node and look children up on demand.
//! Missing children (after a parse error) surface as `None`.

use rowan::NodeOrToken;
pub use rowan::ast::{AstChildren, AstNode};
use rowan::ast::support;
use smol_str::SmolStr;

use super::{NixLanguage, SyntaxKind, SyntaxNode, SyntaxToken};

macro_rules! ast_node {
    ($(#[$meta:meta])* $name:ident, $kind:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash)]
        pub struct $name(pub(super) SyntaxNode);

        impl AstNode for $name {
            type Language = NixLanguage;

            fn can_cast(kind: SyntaxKind) -> bool {
                kind == SyntaxKind::$kind
            }

            fn cast(node: SyntaxNode) -> Option<Self> {
                Self::can_cast(node.kind()).then(|| Self(node))
            }

            fn syntax(&self) -> &SyntaxNode {
                &self.0
            }
        }
    };
}

macro_rules! ast_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant($variant)),*
        }

        impl AstNode for $name {
            type Language = NixLanguage;

            fn can_cast(kind: SyntaxKind) -> bool {
                $($variant::can_cast(kind))||*
            }

            fn cast(node: SyntaxNode) -> Option<Self> {
                $(
                    if $variant::can_cast(node.kind()) {
                        return $variant::cast(node).map(Self::$variant);
                    }
                )*
                None
            }

            fn syntax(&self) -> &SyntaxNode {
                match self {
                    $(Self::$variant(it) => it.syntax()),*
                }
            }
        }

        $(
            impl From<$variant> for $name {
                fn from(it: $variant) -> Self {
                    Self::$variant(it)
                }
            }
        )*
    };
}

ast_node!(Root, ROOT);
ast_node!(Apply, APPLY);
ast_node!(Assert, ASSERT);
ast_node!(Attr, ATTR);
ast_node!(AttrPath, ATTR_PATH);
ast_node!(AttrpathValue, ATTRPATH_VALUE);
ast_node!(AttrSet, ATTR_SET);
ast_node!(BinOp, BIN_OP);
ast_node!(Dynamic, DYNAMIC);
ast_node!(HasAttr, HAS_ATTR);
ast_node!(IfElse, IF_ELSE);
ast_node!(Inherit, INHERIT);
ast_node!(InheritFrom, INHERIT_FROM);
ast_node!(
    /// One name in an `inherit` clause.
    InheritedName,
    INHERITED_NAME
);
ast_node!(Interpol, INTERPOL);
ast_node!(
    /// A path literal with `${...}` parts, such as `./pkgs/${name}.nix`.
    InterpolatedPath,
    INTERPOLATED_PATH
);
ast_node!(Lambda, LAMBDA);
ast_node!(LetIn, LET_IN);
ast_node!(List, LIST);
ast_node!(Literal, LITERAL);
ast_node!(Paren, PAREN);
ast_node!(ParamName, PARAM_NAME);
ast_node!(Pattern, PATTERN);
ast_node!(
    /// The `name@` or `@name` part of a pattern.
    PatBind,
    PAT_BIND
);
ast_node!(PatEntry, PAT_ENTRY);
ast_node!(Select, SELECT);
ast_node!(Str, STRING);
ast_node!(UnaryOp, UNARY_OP);
ast_node!(Var, VAR);
ast_node!(With, WITH);

ast_enum!(
    /// Any expression node.
    Expr {
        Apply, Assert, AttrSet, BinOp, HasAttr, IfElse, InterpolatedPath, Lambda, LetIn, List,
        Literal, Paren, Select, Str, UnaryOp, Var, With,
    }
);

ast_enum!(
    /// A binding inside an attribute set or `let`.
    Entry { AttrpathValue, Inherit }
);

ast_enum!(
    /// The parameter of a lambda: `x: ...` or `{ ... }: ...`.
    Param { ParamName, Pattern }
);

fn expr_after(node: &SyntaxNode, kind: SyntaxKind) -> Option<Expr> {
    node.children_with_tokens()
        .skip_while(|element| element.kind() != kind)
        .filter_map(NodeOrToken::into_node)
        .find_map(Expr::cast)
}

fn expr_before(node: &SyntaxNode, kind: SyntaxKind) -> Option<Expr> {
    node.children_with_tokens()
        .take_while(|element| element.kind() != kind)
        .filter_map(NodeOrToken::into_node)
        .find_map(Expr::cast)
}

impl Root {
    pub fn expr(&self) -> Option<Expr> {
        support::child(&self.0)
    }
}

impl Expr {
    /// Strips any number of enclosing parentheses.
    pub fn strip_parens(self) -> Option<Expr> {
        let mut expr = self;
        while let Expr::Paren(paren) = expr {
            expr = paren.expr()?;
        }
        Some(expr)
    }
}

impl Var {
    pub fn ident_token(&self) -> Option<SyntaxToken> {
        support::token(&self.0, SyntaxKind::IDENT)
    }

    pub fn name(&self) -> Option<SmolStr> {
        self.ident_token().map(|token| SmolStr::new(token.text()))
    }
}

impl Select {
    pub fn value(&self) -> Option<Expr> {
        expr_before(&self.0, SyntaxKind::DOT)
    }

    pub fn attrpath(&self) -> Option<AttrPath> {
        support::child(&self.0)
    }

    /// The fallback after `or`.
    pub fn default_expr(&self) -> Option<Expr> {
        expr_after(&self.0, SyntaxKind::OR_KW)
    }

    pub fn or_token(&self) -> Option<SyntaxToken> {
        support::token(&self.0, SyntaxKind::OR_KW)
    }
}

impl HasAttr {
    pub fn value(&self) -> Option<Expr> {
        support::child(&self.0)
    }

    pub fn attrpath(&self) -> Option<AttrPath> {
        support::child(&self.0)
    }
}

impl AttrPath {
    pub fn attrs(&self) -> AstChildren<Attr> {
        support::children(&self.0)
    }
}

/// The three spellings of an attribute name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AttrKind {
    Ident(SyntaxToken),
    Str(Str),
    Dynamic(Dynamic),
}

impl Attr {
    pub fn kind(&self) -> Option<AttrKind> {
        for element in self.0.children_with_tokens() {
            match element {
                NodeOrToken::Token(token)
                    if matches!(token.kind(), SyntaxKind::IDENT | SyntaxKind::OR_KW) =>
                {
                    return Some(AttrKind::Ident(token));
                }
                NodeOrToken::Node(node) => {
                    if let Some(string) = Str::cast(node.clone()) {
                        return Some(AttrKind::Str(string));
                    }
                    if let Some(dynamic) = Dynamic::cast(node) {
                        return Some(AttrKind::Dynamic(dynamic));
                    }
                }
                NodeOrToken::Token(_) => {}
            }
        }
        None
    }

    /// The name if it is known without evaluation: `a`, `"a"` and `${"a"}`.
    pub fn static_name(&self) -> Option<SmolStr> {
        match self.kind()? {
            AttrKind::Ident(token) => Some(SmolStr::new(token.text())),
            AttrKind::Str(string) => string.literal_value().map(SmolStr::from),
            AttrKind::Dynamic(dynamic) => match dynamic.expr()?.strip_parens()? {
                Expr::Str(string) => string.literal_value().map(SmolStr::from),
                _ => None,
            },
        }
    }
}

impl Dynamic {
    pub fn expr(&self) -> Option<Expr> {
        support::child(&self.0)
    }
}

/// A piece of a string literal.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum StrPart {
    Literal(SyntaxToken),
    Interpolation(Interpol),
}

impl InterpolatedPath {
    pub fn interpolations(&self) -> impl Iterator<Item = Interpol> + use<> {
        self.0.children().filter_map(Interpol::cast)
    }
}

impl Str {
    pub fn is_indented(&self) -> bool {
        support::token(&self.0, SyntaxKind::IND_QUOTE).is_some()
    }

    pub fn parts(&self) -> impl Iterator<Item = StrPart> + use<> {
        self.0.children_with_tokens().filter_map(|element| match element {
            NodeOrToken::Token(token) if token.kind() == SyntaxKind::STRING_CONTENT => {
                Some(StrPart::Literal(token))
            }
            NodeOrToken::Node(node) => Interpol::cast(node).map(StrPart::Interpolation),
            NodeOrToken::Token(_) => None,
        })
    }

    /// The unescaped value, or `None` when the string interpolates.
    ///
    /// Indentation of `''` strings is not stripped.
    pub fn literal_value(&self) -> Option<String> {
        let indented = self.is_indented();
        let mut value = String::new();
        for part in self.parts() {
            match part {
                StrPart::Literal(token) if indented => unescape_indented(token.text(), &mut value),
                StrPart::Literal(token) => unescape(token.text(), &mut value),
                StrPart::Interpolation(_) => return None,
            }
        }
        Some(value)
    }
}

fn unescape(text: &str, out: &mut String) {
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
}

fn unescape_indented(text: &str, out: &mut String) {
    let mut rest = text;
    while !rest.is_empty() {
        if let Some(tail) = rest.strip_prefix("'''") {
            out.push_str("''");
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("''$") {
            out.push('$');
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("''\\") {
            let mut chars = tail.chars();
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => {}
            }
            rest = chars.as_str();
        } else {
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                out.push(c);
            }
            rest = chars.as_str();
        }
    }
}

impl Interpol {
    pub fn expr(&self) -> Option<Expr> {
        support::child(&self.0)
    }
}

/// Nodes that carry bindings: attribute sets and `let`.
pub trait HasEntries: AstNode<Language = NixLanguage> {
    fn entries(&self) -> AstChildren<Entry> {
        support::children(self.syntax())
    }

    fn attrpath_values(&self) -> AstChildren<AttrpathValue> {
        support::children(self.syntax())
    }

    fn inherits(&self) -> AstChildren<Inherit> {
        support::children(self.syntax())
    }
}

impl HasEntries for AttrSet {}
impl HasEntries for LetIn {}

impl AttrSet {
    pub fn is_rec(&self) -> bool {
        support::token(&self.0, SyntaxKind::REC_KW).is_some()
    }
}

impl LetIn {
    pub fn body(&self) -> Option<Expr> {
        expr_after(&self.0, SyntaxKind::IN_KW)
    }
}

impl AttrpathValue {
    pub fn attrpath(&self) -> Option<AttrPath> {
        support::child(&self.0)
    }

    pub fn value(&self) -> Option<Expr> {
        expr_after(&self.0, SyntaxKind::ASSIGN)
    }
}

impl Inherit {
    pub fn from(&self) -> Option<InheritFrom> {
        support::child(&self.0)
    }

    pub fn names(&self) -> AstChildren<InheritedName> {
        support::children(&self.0)
    }
}

impl InheritFrom {
    pub fn expr(&self) -> Option<Expr> {
        support::child(&self.0)
    }
}

impl InheritedName {
    pub fn attr(&self) -> Option<Attr> {
        support::child(&self.0)
    }

    pub fn inherit(&self) -> Option<Inherit> {
        self.0.parent().and_then(Inherit::cast)
    }
}

impl Lambda {
    pub fn param(&self) -> Option<Param> {
        support::child(&self.0)
    }

    pub fn body(&self) -> Option<Expr> {
        expr_after(&self.0, SyntaxKind::COLON)
    }
}

impl ParamName {
    pub fn ident_token(&self) -> Option<SyntaxToken> {
        support::token(&self.0, SyntaxKind::IDENT)
    }

    pub fn name(&self) -> Option<SmolStr> {
        self.ident_token().map(|token| SmolStr::new(token.text()))
    }
}

impl Pattern {
    pub fn entries(&self) -> AstChildren<PatEntry> {
        support::children(&self.0)
    }

    /// `args@{ ... }` or `{ ... }@args`; Nix rejects both at once but the
    /// parser keeps them.
    pub fn binds(&self) -> AstChildren<PatBind> {
        support::children(&self.0)
    }

    pub fn has_ellipsis(&self) -> bool {
        support::token(&self.0, SyntaxKind::ELLIPSIS).is_some()
    }
}

impl PatEntry {
    pub fn name(&self) -> Option<ParamName> {
        support::child(&self.0)
    }

    pub fn default_expr(&self) -> Option<Expr> {
        expr_after(&self.0, SyntaxKind::QUESTION)
    }
}

impl PatBind {
    pub fn name(&self) -> Option<ParamName> {
        support::child(&self.0)
    }
}

impl With {
    pub fn namespace(&self) -> Option<Expr> {
        expr_before(&self.0, SyntaxKind::SEMICOLON)
    }

    pub fn body(&self) -> Option<Expr> {
        expr_after(&self.0, SyntaxKind::SEMICOLON)
    }
}

impl Assert {
    pub fn condition(&self) -> Option<Expr> {
        expr_before(&self.0, SyntaxKind::SEMICOLON)
    }

    pub fn body(&self) -> Option<Expr> {
        expr_after(&self.0, SyntaxKind::SEMICOLON)
    }
}

impl IfElse {
    pub fn condition(&self) -> Option<Expr> {
        expr_before(&self.0, SyntaxKind::THEN_KW)
    }

    pub fn then_branch(&self) -> Option<Expr> {
        expr_after(&self.0, SyntaxKind::THEN_KW)
    }

    pub fn else_branch(&self) -> Option<Expr> {
        expr_after(&self.0, SyntaxKind::ELSE_KW)
    }
}

impl Apply {
    pub fn function(&self) -> Option<Expr> {
        support::children(&self.0).next()
    }

    pub fn argument(&self) -> Option<Expr> {
        support::children(&self.0).nth(1)
    }
}

impl BinOp {
    pub fn lhs(&self) -> Option<Expr> {
        support::children(&self.0).next()
    }

    pub fn rhs(&self) -> Option<Expr> {
        support::children(&self.0).nth(1)
    }

    pub fn operator(&self) -> Option<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(NodeOrToken::into_token)
            .find(|token| !token.kind().is_trivia())
    }
}

impl UnaryOp {
    pub fn operand(&self) -> Option<Expr> {
        support::child(&self.0)
    }
}

impl List {
    pub fn items(&self) -> AstChildren<Expr> {
        support::children(&self.0)
    }
}

impl Paren {
    pub fn expr(&self) -> Option<Expr> {
        support::child(&self.0)
    }
}

impl Literal {
    pub fn token(&self) -> Option<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(NodeOrToken::into_token)
            .find(|token| !token.kind().is_trivia())
    }
}
