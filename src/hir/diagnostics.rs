//! Diagnostics: semantic error reporting.
//!
//! The checker runs the scope resolver over every usage of a file and
//! reports names that resolve to nothing, plus names bound twice in one
//! host.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use super::attribute::Attribute;
use super::declaration::{DeclarationHost, DeclarationKind};
use super::scope::ScopeResolver;
use super::usage::usages;
use crate::base::{FileId, LineCol, LineIndex, TextRange};
use crate::syntax::SyntaxError;
use crate::syntax::ast::{AstNode, Root};

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl Severity {
    /// Convert to LSP severity number.
    pub fn to_lsp(&self) -> u32 {
        match self {
            Severity::Error => 1,
            Severity::Warning => 2,
            Severity::Info => 3,
            Severity::Hint => 4,
        }
    }
}

/// A diagnostic message with location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// The file containing this diagnostic.
    pub file: FileId,
    /// Start line (0-indexed).
    pub start_line: u32,
    /// Start column (0-indexed).
    pub start_col: u32,
    /// End line (0-indexed).
    pub end_line: u32,
    /// End column (0-indexed).
    pub end_col: u32,
    pub severity: Severity,
    /// Error/warning code (e.g., "E0001").
    pub code: Option<Arc<str>>,
    pub message: Arc<str>,
    pub related: Vec<RelatedInfo>,
}

/// Related information for a diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelatedInfo {
    pub file: FileId,
    pub line: u32,
    pub col: u32,
    pub message: Arc<str>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(file: FileId, line: u32, col: u32, message: impl Into<Arc<str>>) -> Self {
        Self::new(Severity::Error, file, line, col, message)
    }

    /// Create a new warning diagnostic.
    pub fn warning(file: FileId, line: u32, col: u32, message: impl Into<Arc<str>>) -> Self {
        Self::new(Severity::Warning, file, line, col, message)
    }

    fn new(
        severity: Severity,
        file: FileId,
        line: u32,
        col: u32,
        message: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            file,
            start_line: line,
            start_col: col,
            end_line: line,
            end_col: col,
            severity,
            code: None,
            message: message.into(),
            related: Vec::new(),
        }
    }

    /// Set the end of the span.
    pub fn with_span(mut self, end_line: u32, end_col: u32) -> Self {
        self.end_line = end_line;
        self.end_col = end_col;
        self
    }

    pub fn with_code(mut self, code: impl Into<Arc<str>>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_related(mut self, info: RelatedInfo) -> Self {
        self.related.push(info);
        self
    }

    pub fn start(&self) -> LineCol {
        LineCol::new(self.start_line, self.start_col)
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Standard diagnostic codes.
pub mod codes {
    /// The parser had to recover from malformed input.
    pub const SYNTAX_ERROR: &str = "E0000";
    /// A variable that no scope, `with` or builtin provides.
    pub const UNDEFINED_VARIABLE: &str = "E0001";
    /// The same name bound twice in one attribute set, `let` or pattern.
    pub const DUPLICATE_BINDING: &str = "E0004";
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Which checks [`check_file`] runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiagnosticsConfig {
    pub undefined_variables: bool,
    pub duplicate_bindings: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            undefined_variables: true,
            duplicate_bindings: true,
        }
    }
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics for one file, converting ranges to line/column.
#[derive(Clone, Debug)]
pub struct DiagnosticCollector<'a> {
    file: FileId,
    line_index: &'a LineIndex,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> DiagnosticCollector<'a> {
    pub fn new(file: FileId, line_index: &'a LineIndex) -> Self {
        Self {
            file,
            line_index,
            diagnostics: Vec::new(),
        }
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    fn error_at(&self, range: TextRange, message: String) -> Diagnostic {
        let (start, end) = self.line_index.range(range);
        Diagnostic::error(self.file, start.line, start.col, message).with_span(end.line, end.col)
    }

    pub fn syntax_error(&mut self, error: &SyntaxError) {
        let diagnostic = self
            .error_at(error.range, error.message.clone())
            .with_code(codes::SYNTAX_ERROR);
        self.add(diagnostic);
    }

    pub fn undefined_variable(&mut self, range: TextRange, name: &Attribute) {
        let diagnostic = self
            .error_at(range, format!("undefined variable '{name}'"))
            .with_code(codes::UNDEFINED_VARIABLE);
        self.add(diagnostic);
    }

    pub fn duplicate_binding(&mut self, range: TextRange, name: &Attribute, previous: TextRange) {
        let previous = self.line_index.line_col(previous.start());
        let diagnostic = self
            .error_at(range, format!("duplicate binding: '{name}' is already defined"))
            .with_code(codes::DUPLICATE_BINDING)
            .with_related(RelatedInfo {
                file: self.file,
                line: previous.line,
                col: previous.col,
                message: Arc::from(format!("previous binding of '{name}'")),
            });
        self.add(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Take all diagnostics, leaving the collector empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

// ============================================================================
// SEMANTIC CHECKER
// ============================================================================

/// Runs the configured checks over one tree.
pub struct SemanticChecker<'a> {
    tree: &'a Root,
    config: &'a DiagnosticsConfig,
    collector: DiagnosticCollector<'a>,
}

impl<'a> SemanticChecker<'a> {
    pub fn new(
        file: FileId,
        tree: &'a Root,
        line_index: &'a LineIndex,
        config: &'a DiagnosticsConfig,
    ) -> Self {
        Self {
            tree,
            config,
            collector: DiagnosticCollector::new(file, line_index),
        }
    }

    pub fn check(&mut self) {
        if self.config.undefined_variables {
            self.check_undefined_variables();
        }
        if self.config.duplicate_bindings {
            self.check_duplicate_bindings();
        }
    }

    fn check_undefined_variables(&mut self) {
        let resolver = ScopeResolver::for_tree(self.tree);
        for usage in usages(self.tree.syntax()) {
            let name = usage.path().first();
            if name.is_dynamic() {
                continue;
            }
            if resolver.resolve_name(usage.element().syntax(), name).is_empty() {
                let range = usage.attribute_elements()[0].text_range();
                self.collector.undefined_variable(range, name);
            }
        }
    }

    fn check_duplicate_bindings(&mut self) {
        for host in self.tree.syntax().descendants().filter_map(DeclarationHost::cast) {
            let mut seen: FxHashMap<Attribute, TextRange> = FxHashMap::default();
            for (path, declaration) in host.bindings() {
                if path.len() != 1 || declaration.kind() == DeclarationKind::AttrPrefix {
                    continue;
                }
                let name = path.first();
                if name.is_dynamic() {
                    continue;
                }
                match seen.get(name) {
                    Some(&previous) => {
                        self.collector
                            .duplicate_binding(declaration.name_range(), name, previous);
                    }
                    None => {
                        seen.insert(name.clone(), declaration.name_range());
                    }
                }
            }
        }
    }

    pub fn finish(mut self) -> Vec<Diagnostic> {
        debug!(count = self.collector.diagnostics().len(), "semantic check finished");
        self.collector.take()
    }
}

/// Check a file and return diagnostics.
pub fn check_file(
    file: FileId,
    tree: &Root,
    line_index: &LineIndex,
    config: &DiagnosticsConfig,
) -> Vec<Diagnostic> {
    let mut checker = SemanticChecker::new(file, tree, line_index, config);
    checker.check();
    checker.finish()
}

/// Convert parse errors of a file to diagnostics.
pub fn syntax_diagnostics(
    file: FileId,
    errors: &[SyntaxError],
    line_index: &LineIndex,
) -> Vec<Diagnostic> {
    let mut collector = DiagnosticCollector::new(file, line_index);
    for error in errors {
        collector.syntax_error(error);
    }
    collector.take()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    fn check(text: &str, config: DiagnosticsConfig) -> Vec<Diagnostic> {
        let parse = parse(text);
        let line_index = LineIndex::new(text);
        check_file(FileId::new(0), &parse.tree(), &line_index, &config)
    }

    fn codes_of(text: &str) -> Vec<String> {
        check(text, DiagnosticsConfig::default())
            .iter()
            .filter_map(|d| d.code.as_deref().map(str::to_owned))
            .collect()
    }

    #[test]
    fn test_diagnostic_with_code() {
        let diag = Diagnostic::error(FileId::new(0), 0, 0, "test")
            .with_code(codes::UNDEFINED_VARIABLE);
        assert_eq!(diag.code.as_deref(), Some("E0001"));
        assert_eq!(diag.severity, Severity::Error);
    }

    #[test]
    fn test_severity_to_lsp() {
        assert_eq!(Severity::Error.to_lsp(), 1);
        assert_eq!(Severity::Warning.to_lsp(), 2);
        assert_eq!(Severity::Info.to_lsp(), 3);
        assert_eq!(Severity::Hint.to_lsp(), 4);
    }

    #[test]
    fn test_collector_counts() {
        let line_index = LineIndex::new("");
        let mut collector = DiagnosticCollector::new(FileId::new(0), &line_index);
        collector.add(Diagnostic::error(FileId::new(0), 0, 0, "error 1"));
        collector.add(Diagnostic::warning(FileId::new(0), 0, 0, "warning 1"));

        assert_eq!(collector.error_count(), 1);
        assert_eq!(collector.warning_count(), 1);
        assert!(collector.has_errors());
        assert_eq!(collector.take().len(), 2);
        assert!(!collector.has_errors());
    }

    #[test]
    fn test_undefined_variable() {
        let diagnostics = check("let a = 1;\nin a + b", DiagnosticsConfig::default());
        assert_eq!(diagnostics.len(), 1);
        let diag = &diagnostics[0];
        assert_eq!(diag.code.as_deref(), Some(codes::UNDEFINED_VARIABLE));
        assert!(diag.message.contains("'b'"));
        assert_eq!(diag.start(), LineCol::new(1, 7));
        assert_eq!((diag.end_line, diag.end_col), (1, 8));
    }

    #[test]
    fn test_with_and_builtins_are_defined() {
        assert_eq!(codes_of("with pkgs; hello"), [codes::UNDEFINED_VARIABLE]);
        assert!(codes_of("{ pkgs }: with pkgs; hello").is_empty());
        assert!(codes_of("builtins.map toString [ ]").is_empty());
    }

    #[test]
    fn test_duplicate_binding() {
        let diagnostics = check("{ a = 1; b = 2; a = 3; }", DiagnosticsConfig::default());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code.as_deref(), Some(codes::DUPLICATE_BINDING));
        assert_eq!(diagnostics[0].start_col, 16);
        assert_eq!(diagnostics[0].related[0].col, 2);
    }

    #[test]
    fn test_attrpath_merge_is_not_duplicate() {
        assert!(codes_of("{ a.b = 1; a.c = 2; }").is_empty());
    }

    #[test]
    fn test_duplicate_formal_and_inherit() {
        assert_eq!(codes_of("{ x, x }: x"), [codes::DUPLICATE_BINDING]);
        assert_eq!(codes_of("a: { inherit a; a = 1; }"), [codes::DUPLICATE_BINDING]);
    }

    #[test]
    fn test_syntax_diagnostics() {
        let text = "let a = ; in a";
        let parse = parse(text);
        let diagnostics = syntax_diagnostics(FileId::new(3), parse.errors(), &LineIndex::new(text));
        assert!(!diagnostics.is_empty());
        assert!(diagnostics.iter().all(|d| d.code.as_deref() == Some(codes::SYNTAX_ERROR)));
        assert_eq!(diagnostics[0].file, FileId::new(3));
    }

    #[test]
    fn test_config_disables_checks() {
        let config = DiagnosticsConfig {
            undefined_variables: false,
            duplicate_bindings: false,
        };
        assert!(check("{ a = b; a = c; }", config).is_empty());
        assert_eq!(codes_of("{ a = b; a = c; }").len(), 3);
    }
}
