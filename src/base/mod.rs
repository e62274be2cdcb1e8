//! Foundation types shared by the syntax, HIR and IDE layers.
//!
//! - [`FileId`] - handle of a source file known to the analysis host
//! - [`TextRange`], [`TextSize`] - byte positions inside a file
//! - [`LineCol`], [`LineIndex`] - line/column conversion for presentation
//!
//! Nothing in here depends on other nixref modules.

mod file_id;
mod span;

pub use file_id::FileId;
pub use span::{LineCol, LineIndex, TextRange, TextSize};

pub use text_size;
