//! Token and node kinds of the Nix syntax tree.

macro_rules! syntax_kinds {
    ($($kind:ident),* $(,)?) => {
        /// Kind of a token or node in the lossless Nix syntax tree.
        #[allow(non_camel_case_types)]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(u16)]
        pub enum SyntaxKind {
            $($kind),*
        }

        impl SyntaxKind {
            const ALL: &'static [SyntaxKind] = &[$(SyntaxKind::$kind),*];

            fn from_raw(raw: u16) -> SyntaxKind {
                Self::ALL.get(raw as usize).copied().unwrap_or(SyntaxKind::ERROR)
            }
        }
    };
}

syntax_kinds! {
    // trivia
    WHITESPACE,
    COMMENT,

    // keywords
    ASSERT_KW,
    ELSE_KW,
    IF_KW,
    IN_KW,
    INHERIT_KW,
    LET_KW,
    OR_KW,
    REC_KW,
    THEN_KW,
    WITH_KW,

    // punctuation
    L_BRACE,
    R_BRACE,
    L_BRACK,
    R_BRACK,
    L_PAREN,
    R_PAREN,
    SEMICOLON,
    COLON,
    COMMA,
    DOT,
    ELLIPSIS,
    AT,
    QUESTION,
    ASSIGN,
    DOLLAR_CURLY,

    // operators
    PLUS,
    MINUS,
    STAR,
    SLASH,
    CONCAT,
    UPDATE,
    EQ,
    NOT_EQ,
    LESS,
    LESS_EQ,
    MORE,
    MORE_EQ,
    AND_AND,
    OR_OR,
    IMPLICATION,
    BANG,

    // literals
    IDENT,
    INTEGER,
    FLOAT,
    PATH,
    PATH_FRAGMENT,
    SEARCH_PATH,
    URI,
    QUOTE,
    IND_QUOTE,
    STRING_CONTENT,

    // nodes
    ROOT,
    ERROR,
    APPLY,
    ASSERT,
    ATTR,
    ATTR_PATH,
    ATTRPATH_VALUE,
    ATTR_SET,
    BIN_OP,
    DYNAMIC,
    HAS_ATTR,
    IF_ELSE,
    INHERIT,
    INHERIT_FROM,
    INHERITED_NAME,
    INTERPOL,
    INTERPOLATED_PATH,
    LAMBDA,
    LET_IN,
    LIST,
    LITERAL,
    PAREN,
    PARAM_NAME,
    PATTERN,
    PAT_BIND,
    PAT_ENTRY,
    SELECT,
    STRING,
    UNARY_OP,
    VAR,
    WITH,
}

impl SyntaxKind {
    pub fn is_trivia(self) -> bool {
        matches!(self, SyntaxKind::WHITESPACE | SyntaxKind::COMMENT)
    }

    /// Tokens that may begin an attribute inside an attribute path.
    pub fn starts_attr(self) -> bool {
        matches!(
            self,
            SyntaxKind::IDENT | SyntaxKind::OR_KW | SyntaxKind::QUOTE | SyntaxKind::DOLLAR_CURLY
        )
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NixLanguage {}

impl rowan::Language for NixLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> SyntaxKind {
        SyntaxKind::from_raw(raw.0)
    }

    fn kind_to_raw(kind: SyntaxKind) -> rowan::SyntaxKind {
        kind.into()
    }
}

pub type SyntaxNode = rowan::SyntaxNode<NixLanguage>;
pub type SyntaxToken = rowan::SyntaxToken<NixLanguage>;
pub type SyntaxElement = rowan::SyntaxElement<NixLanguage>;

#[cfg(test)]
mod tests {
    use super::*;
    use rowan::Language;

    #[test]
    fn test_raw_kind_roundtrip() {
        for &kind in SyntaxKind::ALL {
            assert_eq!(NixLanguage::kind_from_raw(NixLanguage::kind_to_raw(kind)), kind);
        }
    }

    #[test]
    fn test_unknown_raw_kind_is_error() {
        assert_eq!(NixLanguage::kind_from_raw(rowan::SyntaxKind(u16::MAX)), SyntaxKind::ERROR);
    }
}
