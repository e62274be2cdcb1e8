//! Semantic tokens: highlighting of variable usages by what they resolve to.

use tracing::debug;

use super::Analysis;
use crate::base::FileId;
use crate::hir::{Attribute, DeclaredRole, ScopeResolver, Symbol, usages};

/// Token type for semantic highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    Parameter,
    Variable,
    Property,
    Builtin,
    /// A variable with no binding in scope.
    Unresolved,
}

impl TokenType {
    /// Convert to LSP token type index.
    pub fn to_lsp_index(self) -> u32 {
        match self {
            TokenType::Parameter => 0,
            TokenType::Variable => 1,
            TokenType::Property => 2,
            TokenType::Builtin => 3,
            TokenType::Unresolved => 4,
        }
    }

    fn of(symbols: &[Symbol], index: usize) -> Self {
        let head = if index == 0 {
            TokenType::Variable
        } else {
            TokenType::Property
        };
        match symbols {
            [] if index == 0 => TokenType::Unresolved,
            [Symbol::Builtin(_)] => TokenType::Builtin,
            [Symbol::Declared(declared)] => match declared.role() {
                DeclaredRole::Parameter => TokenType::Parameter,
                DeclaredRole::Variable => TokenType::Variable,
                DeclaredRole::Attribute => head,
            },
            _ => head,
        }
    }
}

/// A semantic token for syntax highlighting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticToken {
    /// Line number (0-indexed)
    pub line: u32,
    /// Column in bytes (0-indexed)
    pub col: u32,
    /// Length of the token in bytes
    pub length: u32,
    pub token_type: TokenType,
}

/// Get semantic tokens for a file, sorted by position.
///
/// Every static segment of every usage gets a token. Dynamic segments are
/// left to the tokens of the usages inside them, and segments spanning
/// several lines are skipped.
pub fn semantic_tokens(analysis: &Analysis, file: FileId) -> Vec<SemanticToken> {
    let Some(data) = analysis.file(file) else {
        return Vec::new();
    };
    let root = data.parse().syntax_node();
    let resolver = ScopeResolver::new(root.clone());
    let line_index = data.line_index();

    let mut tokens = Vec::new();
    for usage in usages(&root) {
        let resolution = resolver.resolve_usage(&usage);
        for (index, (attribute, element)) in usage.segments().enumerate() {
            if matches!(attribute, Attribute::Dynamic(_)) {
                continue;
            }
            let range = element.text_range();
            let (start, end) = line_index.range(range);
            if start.line != end.line {
                continue;
            }
            tokens.push(SemanticToken {
                line: start.line,
                col: start.col,
                length: u32::from(range.len()),
                token_type: TokenType::of(resolution.symbols(index), index),
            });
        }
    }

    // Sort tokens by position (line, then column)
    tokens.sort_by_key(|t| (t.line, t.col));
    debug!(%file, tokens = tokens.len(), "semantic tokens");
    tokens
}
