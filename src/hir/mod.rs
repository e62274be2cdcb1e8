//! Semantic model: usages, scopes and symbols.
//!
//! ```text
//! syntax node ──VariableUsage::of──▶ VariableUsage
//!                                      │ path().first() at element()
//!                                      ▼
//!                          ScopeResolver::resolve_name ──▶ Vec<Symbol>
//!                                                           │ resolve(next segment)
//!                                                           ▼
//!                                          Declared | Builtin | AdHoc
//! ```
//!
//! Everything here is a pure function of one syntax tree snapshot.

mod attribute;
pub mod builtins;
mod declaration;
mod diagnostics;
mod presentation;
mod scope;
mod source;
mod symbol;
mod usage;

pub use attribute::{Attribute, AttributePath};
pub use builtins::{BuiltinDescriptor, BuiltinKind, resolve_builtin, resolve_global};
pub use declaration::{Declaration, DeclarationHost, DeclarationKind};
pub use diagnostics::{
    Diagnostic, DiagnosticCollector, DiagnosticsConfig, RelatedInfo, SemanticChecker, Severity,
    check_file, codes, syntax_diagnostics,
};
pub use presentation::{Presentation, SymbolIcon, TextAttributesKey};
pub use scope::{ScopeResolver, UsageResolution};
pub use source::FileSet;
pub use symbol::{AdHocSymbol, BuiltinSymbol, DeclaredRole, DeclaredSymbol, Symbol, SymbolPointer};
pub use usage::{AttributeElement, UsageElement, UsagePointer, VariableUsage, usages};
