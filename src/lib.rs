//! # nixref-base
//!
//! Core library for finding variable usages in Nix expressions and resolving
//! them to the bindings, builtins or ad-hoc attributes they refer to.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! ide     → Editor features (goto-def, references, semantic tokens)
//!   ↓
//! hir     → Usages, declarations, scopes, symbols, diagnostics
//!   ↓
//! syntax  → Lexer + error-tolerant parser, rowan tree, typed wrappers
//!   ↓
//! base    → Primitives (FileId, TextRange, LineIndex)
//! ```

// ============================================================================
// MODULES
// ============================================================================

/// Foundation types: FileId, text ranges, line/column conversion
pub mod base;

/// Semantic model: usages, scope resolution, symbols
pub mod hir;

/// Editor features built on the semantic model
pub mod ide;

/// Nix lexer, parser and syntax tree
pub mod syntax;

// Re-export foundation types
pub use base::{FileId, LineCol, LineIndex, TextRange, TextSize};
pub use syntax::{Parse, SyntaxError, parse};
