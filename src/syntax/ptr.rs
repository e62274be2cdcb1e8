//! Tree-independent references to syntax nodes.

use rowan::NodeOrToken;
use rowan::ast::AstNode;

use super::{NixLanguage, SyntaxKind, SyntaxNode};
use crate::base::TextRange;

/// Identifies a node by kind and range.
///
/// A pointer stays valid across red trees built from the same green tree, so
/// it can be stored in `Send + Sync` values and resolved again on any thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodePtr {
    kind: SyntaxKind,
    range: TextRange,
}

impl NodePtr {
    pub fn new(node: &SyntaxNode) -> Self {
        Self {
            kind: node.kind(),
            range: node.text_range(),
        }
    }

    pub fn kind(&self) -> SyntaxKind {
        self.kind
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    /// Finds the node again under `root`.
    ///
    /// When several nested nodes share kind and range the innermost wins.
    pub fn to_node(&self, root: &SyntaxNode) -> Option<SyntaxNode> {
        if !root.text_range().contains_range(self.range) {
            return None;
        }
        let start = match root.covering_element(self.range) {
            NodeOrToken::Node(node) => node,
            NodeOrToken::Token(token) => token.parent()?,
        };
        start
            .ancestors()
            .take_while(|node| node.text_range() == self.range)
            .find(|node| node.kind() == self.kind)
    }

    pub fn cast<N: AstNode<Language = NixLanguage>>(&self, root: &SyntaxNode) -> Option<N> {
        self.to_node(root).and_then(N::cast)
    }
}

impl<N: AstNode<Language = NixLanguage>> From<&N> for NodePtr {
    fn from(node: &N) -> Self {
        Self::new(node.syntax())
    }
}
