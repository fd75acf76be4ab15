use crate::{SyntaxNode, SyntaxTree};

/// Restores source text from a tree by concatenating the text of every token,
/// hidden ones included, in order.
pub fn generate(tree: &SyntaxTree) -> String {
    generate_node(tree, tree.root())
}

/// Like [`generate`], but only for the subtree rooted at `node`.
pub fn generate_node(tree: &SyntaxTree, node: SyntaxNode) -> String {
    let mut source = String::with_capacity(node.text(tree).len());
    for token in node.descendant_tokens(tree) {
        source.push_str(token.text(tree));
    }
    source
}
