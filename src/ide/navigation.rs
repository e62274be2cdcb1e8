//! Navigation targets and cursor lookups shared by goto and references.

use rowan::TokenAtOffset;
use smol_str::SmolStr;

use crate::base::{FileId, LineCol, LineIndex, TextRange, TextSize};
use crate::hir::{
    Declaration, DeclarationHost, DeclarationKind, DeclaredSymbol, Presentation, Symbol,
    VariableUsage,
};
use crate::syntax::{SyntaxKind, SyntaxNode, SyntaxToken};

/// A place in a file an editor can jump to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NavigationTarget {
    pub file: FileId,
    /// Range of the declared name.
    pub range: TextRange,
    pub start: LineCol,
    pub end: LineCol,
    /// Source text of the declared name.
    pub name: SmolStr,
    pub kind: DeclarationKind,
}

impl NavigationTarget {
    pub(crate) fn from_declaration(
        file: FileId,
        root: &SyntaxNode,
        line_index: &LineIndex,
        declaration: &Declaration,
    ) -> Option<Self> {
        let node = declaration.name_ptr().to_node(root)?;
        let range = node.text_range();
        let (start, end) = line_index.range(range);
        Some(Self {
            file,
            range,
            start,
            end,
            name: SmolStr::new(node.text().to_string()),
            kind: declaration.kind(),
        })
    }

    pub fn presentation(&self) -> Presentation {
        Presentation::new(self.name.as_str())
    }
}

fn token_at(root: &SyntaxNode, offset: TextSize) -> Option<SyntaxToken> {
    if offset > root.text_range().end() {
        return None;
    }
    let is_name = |token: &SyntaxToken| {
        matches!(
            token.kind(),
            SyntaxKind::IDENT | SyntaxKind::OR_KW | SyntaxKind::STRING_CONTENT | SyntaxKind::QUOTE
        )
    };
    match root.token_at_offset(offset) {
        TokenAtOffset::None => None,
        TokenAtOffset::Single(token) => Some(token),
        TokenAtOffset::Between(left, right) => {
            if is_name(&right) || !is_name(&left) {
                Some(right)
            } else {
                Some(left)
            }
        }
    }
}

/// The innermost usage with a segment under `offset`, and that segment's
/// index.
pub(crate) fn usage_at(root: &SyntaxNode, offset: TextSize) -> Option<(VariableUsage, usize)> {
    let token = token_at(root, offset)?;
    token.parent_ancestors().find_map(|node| {
        let usage = VariableUsage::of(&node)?;
        let index = usage
            .attribute_elements()
            .iter()
            .position(|element| element.text_range().contains_inclusive(offset))?;
        Some((usage, index))
    })
}

/// The declared symbol whose declaration name is under `offset`.
pub(crate) fn declaration_at(root: &SyntaxNode, offset: TextSize) -> Option<Symbol> {
    let token = token_at(root, offset)?;
    token
        .parent_ancestors()
        .filter_map(DeclarationHost::cast)
        .find_map(|host| {
            let (path, _) = host
                .bindings()
                .into_iter()
                .find(|(_, declaration)| declaration.name_range().contains_inclusive(offset))?;
            Some(Symbol::Declared(DeclaredSymbol::new(&host, path)))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    #[test]
    fn test_usage_at_picks_segment() {
        let root = parse("let a = 1; in a.b.c").syntax_node();
        let (usage, index) = usage_at(&root, TextSize::from(16)).unwrap();
        assert_eq!(usage.path().to_string(), "a.b.c");
        assert_eq!(index, 1);

        let (_, index) = usage_at(&root, TextSize::from(14)).unwrap();
        assert_eq!(index, 0);
    }

    #[test]
    fn test_usage_at_prefers_inner_usage() {
        let root = parse("a.${b}.c").syntax_node();
        let (usage, index) = usage_at(&root, TextSize::from(4)).unwrap();
        assert_eq!(usage.path().to_string(), "b");
        assert_eq!(index, 0);
    }

    #[test]
    fn test_declaration_at() {
        let root = parse("{ a.b = 1; }").syntax_node();
        let symbol = declaration_at(&root, TextSize::from(4)).unwrap();
        assert_eq!(symbol.as_declared().unwrap().path().to_string(), "a.b");
        assert!(declaration_at(&root, TextSize::from(8)).is_none());
    }

    #[test]
    fn test_navigation_target_presentation() {
        let target = NavigationTarget {
            file: FileId::new(0),
            range: TextRange::empty(TextSize::from(0)),
            start: LineCol::new(0, 0),
            end: LineCol::new(0, 0),
            name: "pkgs".into(),
            kind: DeclarationKind::Formal,
        };
        let presentation = target.presentation();
        assert_eq!(presentation.label, "pkgs");
        assert_eq!(presentation.icon, None);
    }
}
