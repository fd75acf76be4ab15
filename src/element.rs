use crate::{SyntaxNode, SyntaxToken, SyntaxTree, TextRange};

/// An element of a syntax tree.
/// Either a node or a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SyntaxElement {
    #[allow(missing_docs)]
    Node(SyntaxNode),
    #[allow(missing_docs)]
    Token(SyntaxToken),
}

impl SyntaxElement {
    /// Asserts this element is a node. Panics if it was actually a token.
    pub fn assert_node(self) -> SyntaxNode {
        match self {
            Self::Node(node) => node,
            Self::Token(_) => panic!("expected node"),
        }
    }

    /// Asserts this element is a token. Panics if it was actually a node.
    pub fn assert_token(self) -> SyntaxToken {
        match self {
            Self::Node(_) => panic!("expected token"),
            Self::Token(token) => token,
        }
    }

    pub fn text(self, tree: &SyntaxTree) -> &str {
        match self {
            Self::Node(node) => node.text(tree),
            Self::Token(token) => token.text(tree),
        }
    }

    pub fn range(self, tree: &SyntaxTree) -> TextRange {
        match self {
            Self::Node(node) => node.range(tree),
            Self::Token(token) => token.range(tree),
        }
    }
}
