//! Recursive-descent parser producing a lossless `rowan` tree.
//!
//! The parser never fails: unexpected tokens are wrapped in `ERROR` nodes and
//! reported through [`Parse::errors`]. Input nested deeper than `MAX_DEPTH`
//! ends in a single `ERROR` node holding the rest of the file.
//!
//! Operator precedence follows the Nix manual (select > application > negation > `?` > `++` > `* /` > `+ -` >
//! `!` > `//` > comparison > equality > `&&` > `||` > `->`).

use std::sync::Arc;

use rowan::{Checkpoint, GreenNode, GreenNodeBuilder, TextRange, TextSize};

use super::ast::Root;
use super::lexer::tokenize;
use super::{SyntaxError, SyntaxKind, SyntaxNode};

use SyntaxKind::*;

/// Result of parsing one file: an immutable green tree plus the errors found.
///
/// Cloning is cheap and the value is `Send + Sync`; every thread builds its
/// own red tree with [`Parse::syntax_node`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Parse {
    green: GreenNode,
    errors: Arc<[SyntaxError]>,
}

impl Parse {
    pub fn green(&self) -> &GreenNode {
        &self.green
    }

    pub fn syntax_node(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    pub fn tree(&self) -> Root {
        Root(self.syntax_node())
    }

    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Parses a complete Nix file.
pub fn parse(text: &str) -> Parse {
    let tokens = tokenize(text);
    let mut offsets = Vec::with_capacity(tokens.len() + 1);
    let mut offset = TextSize::from(0);
    for (_, token) in &tokens {
        offsets.push(offset);
        offset += TextSize::of(*token);
    }
    offsets.push(offset);

    let mut parser = Parser {
        tokens,
        offsets,
        pos: 0,
        builder: GreenNodeBuilder::new(),
        errors: Vec::new(),
        depth: 0,
        too_deep: false,
    };
    parser.root();
    Parse {
        green: parser.builder.finish(),
        errors: parser.errors.into(),
    }
}

const MAX_DEPTH: usize = 512;

const CLOSING: &[SyntaxKind] = &[
    R_BRACE, R_BRACK, R_PAREN, SEMICOLON, IN_KW, THEN_KW, ELSE_KW, COMMA, QUOTE, IND_QUOTE,
];

struct Parser<'a> {
    tokens: Vec<(SyntaxKind, &'a str)>,
    offsets: Vec<TextSize>,
    pos: usize,
    builder: GreenNodeBuilder<'static>,
    errors: Vec<SyntaxError>,
    depth: usize,
    /// Set once the nesting limit was hit; later errors are not reported.
    too_deep: bool,
}

impl Parser<'_> {
    // ------------------------------------------------------------------
    // token plumbing
    // ------------------------------------------------------------------

    fn nth(&self, n: usize) -> Option<SyntaxKind> {
        self.tokens[self.pos..]
            .iter()
            .map(|(kind, _)| *kind)
            .filter(|kind| !kind.is_trivia())
            .nth(n)
    }

    fn peek(&self) -> Option<SyntaxKind> {
        self.nth(0)
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        self.peek() == Some(kind)
    }

    fn eat_trivia(&mut self) {
        while let Some(&(kind, text)) = self.tokens.get(self.pos) {
            if !kind.is_trivia() {
                break;
            }
            self.builder.token(kind.into(), text);
            self.pos += 1;
        }
    }

    fn bump(&mut self) {
        self.eat_trivia();
        if let Some(&(kind, text)) = self.tokens.get(self.pos) {
            self.builder.token(kind.into(), text);
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: SyntaxKind) {
        if !self.eat(kind) {
            self.error(format!("expected {kind:?}"));
        }
    }

    fn start(&mut self, kind: SyntaxKind) {
        self.eat_trivia();
        self.builder.start_node(kind.into());
    }

    fn start_at(&mut self, checkpoint: Checkpoint, kind: SyntaxKind) {
        self.builder.start_node_at(checkpoint, kind.into());
    }

    fn finish(&mut self) {
        self.builder.finish_node();
    }

    fn checkpoint(&mut self) -> Checkpoint {
        self.eat_trivia();
        self.builder.checkpoint()
    }

    fn error(&mut self, message: impl Into<String>) {
        if self.too_deep {
            return;
        }
        let index = (self.pos..self.tokens.len())
            .find(|&i| !self.tokens[i].0.is_trivia())
            .unwrap_or(self.tokens.len());
        let start = self.offsets[index];
        let end = self.offsets[(index + 1).min(self.tokens.len())];
        self.errors.push(SyntaxError::new(message, TextRange::new(start, end)));
    }

    /// Runs `f` one nesting level deeper. Past `MAX_DEPTH` the remaining input
    /// is swallowed into an `ERROR` node instead.
    fn nested(&mut self, f: impl FnOnce(&mut Self)) {
        if self.depth >= MAX_DEPTH {
            if !self.too_deep {
                self.error("expression nested too deeply");
                self.too_deep = true;
                self.start(ERROR);
                while self.peek().is_some() {
                    self.bump();
                }
                self.finish();
            }
            return;
        }
        self.depth += 1;
        f(self);
        self.depth -= 1;
    }

    /// Reports an error and wraps the current token in an `ERROR` node, unless
    /// the token closes an enclosing construct.
    fn recover(&mut self, message: &str) {
        self.error(message);
        match self.peek() {
            Some(kind) if !CLOSING.contains(&kind) => {
                self.start(ERROR);
                self.bump();
                self.finish();
            }
            _ => {}
        }
    }

    // ------------------------------------------------------------------
    // grammar
    // ------------------------------------------------------------------

    fn root(&mut self) {
        self.builder.start_node(ROOT.into());
        if self.peek().is_some() {
            self.expr();
        }
        if self.peek().is_some() {
            self.error("unexpected input after expression");
            self.start(ERROR);
            while self.peek().is_some() {
                self.bump();
            }
            self.finish();
        }
        self.eat_trivia();
        self.finish();
    }

    fn expr(&mut self) {
        self.nested(Self::expr_unguarded);
    }

    fn expr_unguarded(&mut self) {
        match self.peek() {
            Some(LET_KW) => self.let_in(),
            Some(WITH_KW) => self.keyword_expr(WITH),
            Some(ASSERT_KW) => self.keyword_expr(ASSERT),
            Some(IF_KW) => self.if_else(),
            Some(IDENT) if self.nth(1) == Some(COLON) => {
                self.start(LAMBDA);
                self.param_name();
                self.bump();
                self.expr();
                self.finish();
            }
            Some(IDENT) if self.nth(1) == Some(AT) => self.pattern_lambda(),
            Some(L_BRACE) if self.pattern_ahead() => self.pattern_lambda(),
            _ => self.binary(0),
        }
    }

    /// `with e; body` and `assert e; body`.
    fn keyword_expr(&mut self, kind: SyntaxKind) {
        self.start(kind);
        self.bump();
        self.expr();
        self.expect(SEMICOLON);
        self.expr();
        self.finish();
    }

    fn if_else(&mut self) {
        self.start(IF_ELSE);
        self.bump();
        self.expr();
        self.expect(THEN_KW);
        self.expr();
        self.expect(ELSE_KW);
        self.expr();
        self.finish();
    }

    fn let_in(&mut self) {
        self.start(LET_IN);
        self.bump();
        self.bindings(IN_KW);
        self.expect(IN_KW);
        self.expr();
        self.finish();
    }

    fn pattern_ahead(&self) -> bool {
        match (self.nth(1), self.nth(2)) {
            (Some(R_BRACE), next) => matches!(next, Some(COLON | AT)),
            (Some(ELLIPSIS), _) => true,
            (Some(IDENT), Some(COMMA | QUESTION)) => true,
            (Some(IDENT), Some(R_BRACE)) => matches!(self.nth(3), Some(COLON | AT)),
            _ => false,
        }
    }

    fn param_name(&mut self) {
        self.start(PARAM_NAME);
        self.bump();
        self.finish();
    }

    fn pattern_lambda(&mut self) {
        self.start(LAMBDA);
        self.start(PATTERN);
        if self.at(IDENT) {
            self.start(PAT_BIND);
            self.param_name();
            self.expect(AT);
            self.finish();
        }
        self.expect(L_BRACE);
        while let Some(kind) = self.peek() {
            match kind {
                R_BRACE => break,
                ELLIPSIS => self.bump(),
                IDENT => {
                    self.start(PAT_ENTRY);
                    self.param_name();
                    if self.eat(QUESTION) {
                        self.expr();
                    }
                    self.finish();
                }
                _ => self.recover("expected formal parameter"),
            }
            if !self.eat(COMMA) {
                break;
            }
        }
        self.expect(R_BRACE);
        if self.at(AT) {
            self.start(PAT_BIND);
            self.bump();
            if self.at(IDENT) {
                self.param_name();
            } else {
                self.error("expected parameter name after '@'");
            }
            self.finish();
        }
        self.finish();
        self.expect(COLON);
        self.expr();
        self.finish();
    }

    fn binary(&mut self, min_bp: u8) {
        let checkpoint = self.checkpoint();
        match self.peek() {
            Some(MINUS) => {
                self.start(UNARY_OP);
                self.bump();
                self.nested(|p| p.binary(21));
                self.finish();
            }
            Some(BANG) => {
                self.start(UNARY_OP);
                self.bump();
                self.nested(|p| p.binary(13));
                self.finish();
            }
            _ => self.application(),
        }

        while let Some(op) = self.peek() {
            if op == QUESTION {
                if 20 < min_bp {
                    break;
                }
                self.start_at(checkpoint, HAS_ATTR);
                self.bump();
                self.attr_path();
                self.finish();
                continue;
            }
            let Some((left, right)) = infix_binding_power(op) else {
                break;
            };
            if left < min_bp {
                break;
            }
            self.start_at(checkpoint, BIN_OP);
            self.bump();
            self.binary(right);
            self.finish();
        }
    }

    fn application(&mut self) {
        let checkpoint = self.checkpoint();
        self.select();
        while self.peek().is_some_and(starts_argument) {
            self.start_at(checkpoint, APPLY);
            self.select();
            self.finish();
        }
    }

    fn select(&mut self) {
        let checkpoint = self.checkpoint();
        self.atom();
        if !self.at(DOT) {
            return;
        }
        if !self.nth(1).is_some_and(SyntaxKind::starts_attr) {
            self.error("expected attribute after '.'");
            self.start(ERROR);
            self.bump();
            self.finish();
            return;
        }
        self.start_at(checkpoint, SELECT);
        self.bump();
        self.attr_path();
        if self.eat(OR_KW) {
            self.select();
        }
        self.finish();
    }

    fn atom(&mut self) {
        self.nested(Self::atom_unguarded);
    }

    fn atom_unguarded(&mut self) {
        match self.peek() {
            Some(IDENT) => {
                self.start(VAR);
                self.bump();
                self.finish();
            }
            Some(INTEGER | FLOAT | PATH | SEARCH_PATH | URI) => {
                self.start(LITERAL);
                self.bump();
                self.finish();
            }
            Some(QUOTE | IND_QUOTE) => self.string(),
            Some(PATH_FRAGMENT) => self.interpolated_path(),
            Some(L_PAREN) => {
                self.start(PAREN);
                self.bump();
                self.expr();
                self.expect(R_PAREN);
                self.finish();
            }
            Some(L_BRACK) => self.list(),
            Some(L_BRACE | REC_KW) => self.attr_set(),
            Some(LET_KW | WITH_KW | ASSERT_KW | IF_KW) => self.expr(),
            _ => self.recover("expected expression"),
        }
    }

    fn list(&mut self) {
        self.start(LIST);
        self.bump();
        while let Some(kind) = self.peek() {
            if kind == R_BRACK {
                break;
            }
            if starts_argument(kind) {
                self.select();
            } else if CLOSING.contains(&kind) {
                break;
            } else {
                self.recover("expected list element");
            }
        }
        self.expect(R_BRACK);
        self.finish();
    }

    fn attr_set(&mut self) {
        self.start(ATTR_SET);
        self.eat(REC_KW);
        self.expect(L_BRACE);
        self.bindings(R_BRACE);
        self.expect(R_BRACE);
        self.finish();
    }

    fn bindings(&mut self, terminator: SyntaxKind) {
        while let Some(kind) = self.peek() {
            if kind == terminator {
                break;
            }
            match kind {
                INHERIT_KW => self.inherit(),
                kind if kind.starts_attr() => {
                    self.start(ATTRPATH_VALUE);
                    self.attr_path();
                    self.expect(ASSIGN);
                    self.expr();
                    self.expect(SEMICOLON);
                    self.finish();
                }
                R_BRACE | IN_KW => break,
                _ => {
                    self.error("expected binding");
                    self.start(ERROR);
                    self.bump();
                    self.finish();
                }
            }
        }
    }

    fn inherit(&mut self) {
        self.start(INHERIT);
        self.bump();
        if self.at(L_PAREN) {
            self.start(INHERIT_FROM);
            self.bump();
            self.expr();
            self.expect(R_PAREN);
            self.finish();
        }
        while self.peek().is_some_and(SyntaxKind::starts_attr) {
            self.start(INHERITED_NAME);
            self.attr();
            self.finish();
        }
        self.expect(SEMICOLON);
        self.finish();
    }

    fn attr_path(&mut self) {
        self.start(ATTR_PATH);
        self.attr();
        while self.at(DOT) && self.nth(1).is_some_and(SyntaxKind::starts_attr) {
            self.bump();
            self.attr();
        }
        self.finish();
    }

    fn attr(&mut self) {
        self.start(ATTR);
        match self.peek() {
            Some(IDENT | OR_KW) => self.bump(),
            Some(QUOTE) => self.string(),
            Some(DOLLAR_CURLY) => {
                self.start(DYNAMIC);
                self.bump();
                self.expr();
                self.expect(R_BRACE);
                self.finish();
            }
            _ => self.error("expected attribute name"),
        }
        self.finish();
    }

    /// `PATH_FRAGMENT`s and `${ ... }` parts. The lexer only emits them back to
    /// back, so the path ends at the first trivia or other token.
    fn interpolated_path(&mut self) {
        self.start(INTERPOLATED_PATH);
        self.bump();
        loop {
            match self.tokens.get(self.pos).map(|&(kind, _)| kind) {
                Some(PATH_FRAGMENT) => self.bump(),
                Some(DOLLAR_CURLY) => {
                    self.start(INTERPOL);
                    self.bump();
                    self.expr();
                    self.expect(R_BRACE);
                    self.finish();
                }
                _ => break,
            }
        }
        self.finish();
    }

    fn string(&mut self) {
        self.start(STRING);
        let Some(open) = self.peek() else {
            self.finish();
            return;
        };
        self.bump();
        loop {
            match self.peek() {
                Some(STRING_CONTENT) => self.bump(),
                Some(DOLLAR_CURLY) => {
                    self.start(INTERPOL);
                    self.bump();
                    self.expr();
                    self.expect(R_BRACE);
                    self.finish();
                }
                Some(kind) if kind == open => {
                    self.bump();
                    break;
                }
                _ => {
                    self.error("unterminated string");
                    break;
                }
            }
        }
        self.finish();
    }
}

fn infix_binding_power(kind: SyntaxKind) -> Option<(u8, u8)> {
    let power = match kind {
        IMPLICATION => (2, 1),
        OR_OR => (3, 4),
        AND_AND => (5, 6),
        EQ | NOT_EQ => (7, 8),
        LESS | LESS_EQ | MORE | MORE_EQ => (9, 10),
        UPDATE => (12, 11),
        PLUS | MINUS => (14, 15),
        STAR | SLASH => (16, 17),
        CONCAT => (19, 18),
        _ => return None,
    };
    Some(power)
}

fn starts_argument(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        IDENT
            | INTEGER
            | FLOAT
            | PATH
            | PATH_FRAGMENT
            | SEARCH_PATH
            | URI
            | QUOTE
            | IND_QUOTE
            | L_PAREN
            | L_BRACK
            | L_BRACE
            | REC_KW
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_of(text: &str) -> Vec<SyntaxKind> {
        parse(text).syntax_node().descendants().map(|n| n.kind()).collect()
    }

    #[test]
    fn test_parse_is_lossless() {
        let text = "let a = { b.c = 1; inherit (x) d; };\n in a.b.c or 2 # end";
        let parse = parse(text);
        assert_eq!(parse.syntax_node().text().to_string(), text);
        assert!(parse.errors().is_empty(), "{:?}", parse.errors());
    }

    #[test]
    fn test_parse_lambda_forms() {
        assert!(kinds_of("x: x").contains(&LAMBDA));
        let pattern = kinds_of("args@{ a, b ? a, ... }: b");
        assert!(pattern.contains(&PATTERN));
        assert!(pattern.contains(&PAT_BIND));
        assert_eq!(pattern.iter().filter(|&&k| k == PAT_ENTRY).count(), 2);
        assert!(kinds_of("{ a }@args: a").contains(&PAT_BIND));
        assert!(kinds_of("{}: 1").contains(&PATTERN));
    }

    #[test]
    fn test_attr_set_is_not_a_pattern() {
        let kinds = kinds_of("{ a = 1; }");
        assert!(kinds.contains(&ATTR_SET));
        assert!(!kinds.contains(&LAMBDA));
    }

    #[test]
    fn test_precedence_select_binds_tighter_than_application() {
        let root = parse("f a.b c").syntax_node();
        let apply = root.first_child().unwrap();
        assert_eq!(apply.kind(), APPLY);
        let inner = apply.first_child().unwrap();
        assert_eq!(inner.kind(), APPLY);
        assert_eq!(inner.children().nth(1).unwrap().kind(), SELECT);
    }

    #[test]
    fn test_precedence_of_operators() {
        let root = parse("a + b * c // d").syntax_node();
        let top = root.first_child().unwrap();
        assert_eq!(top.kind(), BIN_OP);
        assert_eq!(top.first_child().unwrap().kind(), BIN_OP);
        assert_eq!(top.first_child().unwrap().to_string().trim(), "a + b * c");
    }

    #[test]
    fn test_dangling_dot_is_an_error_not_a_select() {
        let parse = parse("a.");
        assert!(parse.has_errors());
        assert!(!parse.syntax_node().descendants().any(|n| n.kind() == SELECT));
    }

    #[test]
    fn test_interpolated_path() {
        let parsed = parse("x: ./pkgs/${x}.nix");
        assert!(parsed.errors().is_empty(), "{:?}", parsed.errors());
        let path = parsed
            .syntax_node()
            .descendants()
            .find(|n| n.kind() == INTERPOLATED_PATH)
            .unwrap();
        assert_eq!(path.to_string(), "./pkgs/${x}.nix");
        assert_eq!(path.children().filter(|n| n.kind() == INTERPOL).count(), 1);

        assert!(parse("import ./a/${b} { }").errors().is_empty());
        assert!(parse("[ ./${a} ~/${b}/c ]").errors().is_empty());
    }

    #[test]
    fn test_deep_nesting_is_an_error_not_a_crash() {
        let text = "[".repeat(20_000);
        let parsed = parse(&text);
        assert!(parsed.has_errors());
        assert!(parsed.errors().len() < 10);
        assert_eq!(parsed.syntax_node().text().to_string(), text);

        let negations = format!("{}x", "!".repeat(20_000));
        assert!(parse(&negations).has_errors());

        let moderate = format!("{}x{}", "(".repeat(200), ")".repeat(200));
        assert!(parse(&moderate).errors().is_empty());
    }

    #[test]
    fn test_recovers_from_garbage() {
        let parse = parse("let a = ; in ) b");
        assert!(parse.has_errors());
        assert_eq!(parse.syntax_node().text().to_string(), "let a = ; in ) b");
    }
}
