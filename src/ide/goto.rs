//! Goto definition.

use tracing::debug;

use super::Analysis;
use super::navigation::{NavigationTarget, usage_at};
use crate::base::{FileId, TextSize};
use crate::hir::ScopeResolver;

/// Declarations of the usage segment under `offset`.
///
/// Builtins, ad-hoc attributes and unresolved names have no target. A name
/// declared several times in one host yields one target per declaration.
pub fn goto_definition(analysis: &Analysis, file: FileId, offset: TextSize) -> Vec<NavigationTarget> {
    let Some(data) = analysis.file(file) else {
        return Vec::new();
    };
    let root = data.parse().syntax_node();
    let Some((usage, segment)) = usage_at(&root, offset) else {
        return Vec::new();
    };

    let resolution = ScopeResolver::new(root.clone()).resolve_usage(&usage);
    let targets: Vec<_> = resolution
        .symbols(segment)
        .iter()
        .flat_map(|symbol| symbol.declarations(&root))
        .filter_map(|declaration| {
            NavigationTarget::from_declaration(file, &root, data.line_index(), &declaration)
        })
        .collect();
    debug!(path = %usage.path(), segment, targets = targets.len(), "goto definition");
    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::DeclarationKind;
    use crate::ide::AnalysisHost;

    fn goto(text: &str, offset: u32) -> Vec<NavigationTarget> {
        let mut host = AnalysisHost::new();
        let file = host.set_file_content("/test.nix", text);
        goto_definition(&host.analysis(), file, TextSize::from(offset))
    }

    #[test]
    fn test_goto_let_binding() {
        let targets = goto("let foo = 1; in foo", 17);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].name, "foo");
        assert_eq!(u32::from(targets[0].range.start()), 4);
        assert_eq!(targets[0].kind, DeclarationKind::Binding);
    }

    #[test]
    fn test_goto_formal() {
        let targets = goto("{ pkgs, ... }: pkgs.hello", 16);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].kind, DeclarationKind::Formal);
        assert!(goto("{ pkgs, ... }: pkgs.hello", 21).is_empty());
    }

    #[test]
    fn test_goto_nested_attribute() {
        let text = "let a = { b = 1; }; in a.b";
        let targets = goto(text, 25);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].name, "b");
        assert_eq!(u32::from(targets[0].range.start()), 10);
    }

    #[test]
    fn test_goto_all_duplicate_declarations() {
        assert_eq!(goto("let a.x = 1; a.y = 2; in a", 25).len(), 2);
    }

    #[test]
    fn test_goto_builtin_and_nothing() {
        assert!(goto("builtins.map", 2).is_empty());
        assert!(goto("1 + 2", 0).is_empty());
        assert!(goto("x", 40).is_empty());
    }
}
