use crate::tree::EventIdx;
use crate::{Span, SyntaxTree, TextRange};

/// Which stream a token was lexed onto.
///
/// Hidden tokens (whitespace, comments) are ignored by grammars
/// but kept in the tree so the source can be restored exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Channel {
    #[default]
    Visible,
    Hidden,
}

/// A handle to a specific token in a specific [`SyntaxTree`].
///
/// All accessor methods will panic if used with a tree
/// other than the one this token is from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SyntaxToken {
    idx: EventIdx,
    tree_id: u32,
}

static_assertions::assert_eq_size!(SyntaxToken, Option<SyntaxToken>, u64);

impl SyntaxToken {
    /// # Safety
    /// `idx` must point at an add token event in the tree with id `tree_id`.
    #[inline(always)]
    pub(crate) unsafe fn new(idx: EventIdx, tree_id: u32) -> Self {
        Self { idx, tree_id }
    }

    /// Returns the kind of this token, as named by the lexer.
    pub fn kind(self, tree: &SyntaxTree) -> &str {
        self.verify_tree(tree);
        let add_token = unsafe { tree.get_add_token(self.idx.raw()) };
        tree.resolve(add_token.kind)
    }

    /// Returns the text associated with this token.
    pub fn text(self, tree: &SyntaxTree) -> &str {
        self.verify_tree(tree);
        unsafe {
            let add_token = tree.get_add_token(self.idx.raw());
            tree.get_text(add_token.start, add_token.end)
        }
    }

    pub fn channel(self, tree: &SyntaxTree) -> Channel {
        self.verify_tree(tree);
        unsafe { tree.get_add_token(self.idx.raw()).channel }
    }

    pub fn is_hidden(self, tree: &SyntaxTree) -> bool {
        self.channel(tree) == Channel::Hidden
    }

    /// Returns the byte range this token spans in the tree’s text.
    pub fn range(self, tree: &SyntaxTree) -> TextRange {
        self.verify_tree(tree);
        let add_token = unsafe { tree.get_add_token(self.idx.raw()) };
        TextRange::new(add_token.start.into(), add_token.end.into())
    }

    /// Returns the line and column positions this token spans in the source.
    pub fn span(self, tree: &SyntaxTree) -> Span {
        self.verify_tree(tree);
        unsafe { tree.get_add_token(self.idx.raw()).span }
    }

    fn verify_tree(self, tree: &SyntaxTree) {
        assert_eq!(
            self.tree_id,
            tree.id(),
            "tried to access token data from tree other than the one this token is from"
        );
    }
}
