//! Tokenizer for Nix source text.
//!
//! Ordinary tokens come from a `logos` lexer. Strings switch into a
//! hand-driven mode because their contents are not token-separated and
//! `${ ... }` re-enters ordinary lexing until the matching brace. Paths,
//! URIs and `<search/paths>` are scanned by hand as well, since they overlap
//! with identifiers and operators until a `/` or `:` decides the token. A
//! path directly followed by `${` switches into a path mode that emits
//! `PATH_FRAGMENT`s around the interpolations.

use logos::Logos;

use super::SyntaxKind;

#[derive(Logos, Clone, Copy, Debug, PartialEq, Eq)]
enum LexToken {
    #[regex(r"[ \t\r\n]+")]
    Whitespace,
    #[regex(r"#[^\r\n]*")]
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
    Comment,

    #[token("assert")]
    Assert,
    #[token("else")]
    Else,
    #[token("if")]
    If,
    #[token("in")]
    In,
    #[token("inherit")]
    Inherit,
    #[token("let")]
    Let,
    #[token("or")]
    Or,
    #[token("rec")]
    Rec,
    #[token("then")]
    Then,
    #[token("with")]
    With,

    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBrack,
    #[token("]")]
    RBrack,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("...")]
    Ellipsis,
    #[token("@")]
    At,
    #[token("?")]
    Question,
    #[token("=")]
    Assign,
    #[token("${")]
    DollarCurly,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("++")]
    Concat,
    #[token("//")]
    Update,
    #[token("==")]
    Eq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Less,
    #[token("<=")]
    LessEq,
    #[token(">")]
    More,
    #[token(">=")]
    MoreEq,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("->")]
    Implication,
    #[token("!")]
    Bang,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_'\-]*")]
    Ident,
    #[regex(r"[0-9]+")]
    Integer,
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?")]
    Float,
    #[token("\"")]
    Quote,
    #[token("''")]
    IndQuote,
}

impl LexToken {
    fn kind(self) -> SyntaxKind {
        use SyntaxKind::*;
        match self {
            LexToken::Whitespace => WHITESPACE,
            LexToken::Comment => COMMENT,
            LexToken::Assert => ASSERT_KW,
            LexToken::Else => ELSE_KW,
            LexToken::If => IF_KW,
            LexToken::In => IN_KW,
            LexToken::Inherit => INHERIT_KW,
            LexToken::Let => LET_KW,
            LexToken::Or => OR_KW,
            LexToken::Rec => REC_KW,
            LexToken::Then => THEN_KW,
            LexToken::With => WITH_KW,
            LexToken::LBrace => L_BRACE,
            LexToken::RBrace => R_BRACE,
            LexToken::LBrack => L_BRACK,
            LexToken::RBrack => R_BRACK,
            LexToken::LParen => L_PAREN,
            LexToken::RParen => R_PAREN,
            LexToken::Semicolon => SEMICOLON,
            LexToken::Colon => COLON,
            LexToken::Comma => COMMA,
            LexToken::Dot => DOT,
            LexToken::Ellipsis => ELLIPSIS,
            LexToken::At => AT,
            LexToken::Question => QUESTION,
            LexToken::Assign => ASSIGN,
            LexToken::DollarCurly => DOLLAR_CURLY,
            LexToken::Plus => PLUS,
            LexToken::Minus => MINUS,
            LexToken::Star => STAR,
            LexToken::Slash => SLASH,
            LexToken::Concat => CONCAT,
            LexToken::Update => UPDATE,
            LexToken::Eq => EQ,
            LexToken::NotEq => NOT_EQ,
            LexToken::Less => LESS,
            LexToken::LessEq => LESS_EQ,
            LexToken::More => MORE,
            LexToken::MoreEq => MORE_EQ,
            LexToken::AndAnd => AND_AND,
            LexToken::OrOr => OR_OR,
            LexToken::Implication => IMPLICATION,
            LexToken::Bang => BANG,
            LexToken::Ident => IDENT,
            LexToken::Integer => INTEGER,
            LexToken::Float => FLOAT,
            LexToken::Quote => QUOTE,
            LexToken::IndQuote => IND_QUOTE,
        }
    }
}

/// Splits `text` into lossless tokens; concatenating the slices yields `text`.
pub fn tokenize(text: &str) -> Vec<(SyntaxKind, &str)> {
    let mut tokenizer = Tokenizer {
        text,
        pos: 0,
        tokens: Vec::new(),
    };
    tokenizer.normal(false);
    tokenizer.tokens
}

struct Tokenizer<'a> {
    text: &'a str,
    pos: usize,
    tokens: Vec<(SyntaxKind, &'a str)>,
}

impl<'a> Tokenizer<'a> {
    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn push(&mut self, kind: SyntaxKind, len: usize) {
        let end = self.pos + len;
        self.tokens.push((kind, &self.text[self.pos..end]));
        self.pos = end;
    }

    /// Lexes ordinary tokens. Inside an interpolation this returns after the
    /// closing brace has been pushed.
    fn normal(&mut self, in_interpolation: bool) {
        let mut depth = 0usize;
        while !self.rest().is_empty() {
            let kind = self.next_normal();
            match kind {
                SyntaxKind::L_BRACE | SyntaxKind::DOLLAR_CURLY => depth += 1,
                SyntaxKind::R_BRACE if in_interpolation && depth == 0 => return,
                SyntaxKind::R_BRACE => depth = depth.saturating_sub(1),
                SyntaxKind::QUOTE => self.string(),
                SyntaxKind::IND_QUOTE => self.ind_string(),
                SyntaxKind::PATH_FRAGMENT => self.interpolated_path(),
                _ => {}
            }
        }
    }

    fn next_normal(&mut self) -> SyntaxKind {
        let rest = self.rest();
        let scanned = scan_search_path(rest)
            .map(|len| (SyntaxKind::SEARCH_PATH, len))
            .or_else(|| scan_path_start(rest).map(|len| (SyntaxKind::PATH_FRAGMENT, len)))
            .or_else(|| scan_path(rest).map(|len| (SyntaxKind::PATH, len)))
            .or_else(|| scan_uri(rest).map(|len| (SyntaxKind::URI, len)));
        let (kind, len) = scanned.unwrap_or_else(|| {
            let mut lexer = LexToken::lexer(rest);
            match lexer.next() {
                Some(Ok(token)) => (token.kind(), lexer.span().end),
                _ => {
                    let first = rest.chars().next().map_or(1, char::len_utf8);
                    (SyntaxKind::ERROR, lexer.span().end.max(first))
                }
            }
        });
        self.push(kind, len);
        kind
    }

    /// Contents of a `"..."` string; the opening quote is already pushed.
    fn string(&mut self) {
        let mut content = 0;
        loop {
            let rest = &self.rest()[content..];
            if rest.is_empty() {
                self.flush_content(content);
                return;
            }
            if rest.starts_with('"') {
                self.flush_content(content);
                self.push(SyntaxKind::QUOTE, 1);
                return;
            }
            if rest.starts_with("${") {
                self.flush_content(content);
                content = 0;
                self.push(SyntaxKind::DOLLAR_CURLY, 2);
                self.normal(true);
                continue;
            }
            if rest.starts_with("$${") {
                content += 3;
                continue;
            }
            if rest.starts_with('\\') {
                content += 1;
                content += rest[1..].chars().next().map_or(0, char::len_utf8);
                continue;
            }
            content += rest.chars().next().map_or(1, char::len_utf8);
        }
    }

    /// Contents of a `''...''` string; the opening quotes are already pushed.
    fn ind_string(&mut self) {
        let mut content = 0;
        loop {
            let rest = &self.rest()[content..];
            if rest.is_empty() {
                self.flush_content(content);
                return;
            }
            if rest.starts_with("'''") || rest.starts_with("''$") {
                content += 3;
                continue;
            }
            if rest.starts_with("''\\") {
                content += 3;
                content += rest[3..].chars().next().map_or(0, char::len_utf8);
                continue;
            }
            if rest.starts_with("''") {
                self.flush_content(content);
                self.push(SyntaxKind::IND_QUOTE, 2);
                return;
            }
            if rest.starts_with("${") {
                self.flush_content(content);
                content = 0;
                self.push(SyntaxKind::DOLLAR_CURLY, 2);
                self.normal(true);
                continue;
            }
            if rest.starts_with("$${") {
                content += 3;
                continue;
            }
            content += rest.chars().next().map_or(1, char::len_utf8);
        }
    }

    /// Rest of a path after its first fragment: `${ ... }` parts and the
    /// fragments between them. Ends at the first byte that continues neither.
    fn interpolated_path(&mut self) {
        loop {
            let rest = self.rest();
            if rest.starts_with("${") {
                self.push(SyntaxKind::DOLLAR_CURLY, 2);
                self.normal(true);
                continue;
            }
            let len = rest
                .bytes()
                .take_while(|&c| is_path_char(c) || c == b'/')
                .count();
            if len == 0 {
                return;
            }
            self.push(SyntaxKind::PATH_FRAGMENT, len);
        }
    }

    fn flush_content(&mut self, len: usize) {
        if len > 0 {
            self.push(SyntaxKind::STRING_CONTENT, len);
        }
    }
}

fn is_path_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'.' | b'_' | b'-' | b'+')
}

/// `./a`, `../a/b`, `/abs`, `~/home`, `rel/ative`.
fn scan_path(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut pos = if bytes.first() == Some(&b'~') {
        1
    } else {
        bytes.iter().take_while(|&&c| is_path_char(c)).count()
    };
    let mut segments = 0;
    while bytes.get(pos) == Some(&b'/') && bytes.get(pos + 1).is_some_and(|&c| is_path_char(c)) {
        pos += 1;
        pos += bytes[pos..].iter().take_while(|&&c| is_path_char(c)).count();
        segments += 1;
    }
    (segments > 0).then_some(pos)
}

/// Leading fragment of an interpolated path: a path or a `segment/` prefix
/// immediately followed by `${`, as in `./a/${x}`, `./${x}` or `~/${x}`.
fn scan_path_start(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let len = match scan_path(text) {
        Some(len) if bytes.get(len) == Some(&b'/') => len + 1,
        Some(len) => len,
        None if bytes.first() == Some(&b'~') => 1 + usize::from(bytes.get(1) == Some(&b'/')),
        None => {
            let segment = bytes.iter().take_while(|&&c| is_path_char(c)).count();
            if bytes.get(segment) != Some(&b'/') {
                return None;
            }
            segment + 1
        }
    };
    let interpolates = text[len..].starts_with("${");
    (interpolates && text[..len].contains('/')).then_some(len)
}

/// `<nixpkgs>` or `<nixpkgs/lib>`.
fn scan_search_path(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.first() != Some(&b'<') {
        return None;
    }
    let body = bytes[1..]
        .iter()
        .take_while(|&&c| is_path_char(c) || c == b'/')
        .count();
    (body > 0 && bytes.get(1 + body) == Some(&b'>')).then_some(body + 2)
}

/// `https://example.org/x.tar.gz`; requires at least one character after the colon.
fn scan_uri(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    if !bytes.first().is_some_and(u8::is_ascii_alphabetic) {
        return None;
    }
    let scheme = bytes
        .iter()
        .take_while(|&&c| c.is_ascii_alphanumeric() || matches!(c, b'+' | b'-' | b'.'))
        .count();
    if bytes.get(scheme) != Some(&b':') {
        return None;
    }
    let body = bytes[scheme + 1..]
        .iter()
        .take_while(|&&c| {
            c.is_ascii_alphanumeric() || b"%/?:@&=+$,-_.!~*'".contains(&c)
        })
        .count();
    (body > 0).then_some(scheme + 1 + body)
}
