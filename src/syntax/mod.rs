//! Nix syntax: lexer, parser, lossless `rowan` tree and typed wrappers.
//!
//! ```text
//! text ──tokenize──▶ [(SyntaxKind, &str)] ──parse──▶ Parse { green, errors }
//!                                                      │
//!                                         syntax_node()│ per thread
//!                                                      ▼
//!                                            SyntaxNode / ast::*
//! ```

pub mod ast;
mod kind;
mod lexer;
mod parser;
mod ptr;

use thiserror::Error;

use crate::base::TextRange;

pub use kind::{NixLanguage, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};
pub use lexer::tokenize;
pub use parser::{Parse, parse};
pub use ptr::NodePtr;

/// A recoverable problem found while parsing.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message} at {range:?}")]
pub struct SyntaxError {
    pub message: String,
    pub range: TextRange,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, range: TextRange) -> Self {
        Self {
            message: message.into(),
            range,
        }
    }
}
