//! Find references.

use tracing::debug;

use super::Analysis;
use super::navigation::{declaration_at, usage_at};
use crate::base::{FileId, LineCol, TextRange, TextSize};
use crate::hir::{ScopeResolver, Symbol, usages};

/// One occurrence of a symbol.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Reference {
    pub file: FileId,
    pub range: TextRange,
    pub start: LineCol,
    pub end: LineCol,
    /// Whether this occurrence declares the symbol rather than uses it.
    pub is_declaration: bool,
}

/// Every occurrence in `file` of the symbol under `offset`.
///
/// The cursor may be on a usage segment or on a declared name. Declarations
/// come first, then usages, each in source order. A segment that resolves
/// ambiguously counts as a reference to each of its candidates.
pub fn find_references(analysis: &Analysis, file: FileId, offset: TextSize) -> Vec<Reference> {
    let Some(data) = analysis.file(file) else {
        return Vec::new();
    };
    let root = data.parse().syntax_node();
    let resolver = ScopeResolver::new(root.clone());

    let targets: Vec<Symbol> = match usage_at(&root, offset) {
        Some((usage, segment)) => resolver.resolve_usage(&usage).symbols(segment).to_vec(),
        None => declaration_at(&root, offset).into_iter().collect(),
    };
    if targets.is_empty() {
        return Vec::new();
    }

    let line_index = data.line_index();
    let reference = |range: TextRange, is_declaration: bool| {
        let (start, end) = line_index.range(range);
        Reference {
            file,
            range,
            start,
            end,
            is_declaration,
        }
    };

    let mut declarations: Vec<Reference> = targets
        .iter()
        .flat_map(|symbol| symbol.declarations(&root))
        .map(|declaration| reference(declaration.name_range(), true))
        .collect();
    declarations.sort_by_key(|r| r.range.start());
    declarations.dedup();

    let mut references = declarations;
    for usage in usages(&root) {
        let resolution = resolver.resolve_usage(&usage);
        for (index, element) in usage.attribute_elements().iter().enumerate() {
            if resolution
                .symbols(index)
                .iter()
                .any(|symbol| targets.contains(symbol))
            {
                references.push(reference(element.text_range(), false));
            }
        }
    }
    debug!(targets = targets.len(), found = references.len(), "find references");
    references
}
