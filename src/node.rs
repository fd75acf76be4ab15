use crate::tree::{EventIdx, EventKind, ADD_TOKEN_SIZE, FINISH_NODE_SIZE, START_NODE_SIZE};
use crate::{
    Channel, RuleId, Span, SyntaxElement, SyntaxToken, SyntaxTree, TextRange, TOKEN_GROUP,
    TOKEN_GROUP_RULE_ID,
};

/// A handle to a specific node in a specific [`SyntaxTree`].
///
/// A syntax tree’s root node can be obtained by calling [`SyntaxTree::root`].
///
/// All accessor methods will panic if used with a tree
/// other than the one this node is from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SyntaxNode {
    idx: EventIdx,
    tree_id: u32,
}

static_assertions::assert_eq_size!(SyntaxNode, Option<SyntaxNode>, u64);

/// An event of a depth-first walk over a subtree. See [`SyntaxNode::preorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalkEvent {
    #[allow(missing_docs)]
    Enter(SyntaxNode),
    #[allow(missing_docs)]
    Token(SyntaxToken),
    #[allow(missing_docs)]
    Leave(SyntaxNode),
}

impl SyntaxNode {
    /// # Safety
    /// `idx` must point at a start node event in the tree with id `tree_id`.
    #[inline(always)]
    pub(crate) unsafe fn new(idx: EventIdx, tree_id: u32) -> Self {
        Self { idx, tree_id }
    }

    /// Returns the grammar rule name (or synthetic group name) of this node.
    pub fn name(self, tree: &SyntaxTree) -> &str {
        self.verify_tree(tree);
        let start_node = unsafe { tree.get_start_node(self.idx.raw()) };
        tree.resolve(start_node.name)
    }

    /// Returns the id of the grammar alternative that produced this node.
    pub fn rule_id(self, tree: &SyntaxTree) -> RuleId {
        self.verify_tree(tree);
        unsafe { tree.get_start_node(self.idx.raw()).rule_id }
    }

    /// Returns `name#rule_id`, which identifies the grammar position of this node.
    pub fn name_with_id(self, tree: &SyntaxTree) -> String {
        format!("{}#{}", self.name(tree), self.rule_id(tree))
    }

    /// Whether this is a synthetic group holding tokens the grammar did not attach itself.
    pub fn is_token_group(self, tree: &SyntaxTree) -> bool {
        self.rule_id(tree) == TOKEN_GROUP_RULE_ID && self.name(tree) == TOKEN_GROUP
    }

    /// Returns an iterator over the direct child nodes and tokens of this node.
    pub fn children(self, tree: &SyntaxTree) -> impl Iterator<Item = SyntaxElement> + '_ {
        self.verify_tree(tree);
        Children {
            idx: self.idx.raw() + START_NODE_SIZE,
            finish_idx: unsafe { tree.get_start_node(self.idx.raw()).finish_node_idx },
            tree,
        }
    }

    /// Returns an iterator over the direct child nodes of this node.
    pub fn child_nodes(self, tree: &SyntaxTree) -> impl Iterator<Item = SyntaxNode> + '_ {
        self.children(tree).filter_map(|element| match element {
            SyntaxElement::Node(node) => Some(node),
            SyntaxElement::Token(_) => None,
        })
    }

    /// Returns an iterator over the direct child tokens of this node.
    pub fn child_tokens(self, tree: &SyntaxTree) -> impl Iterator<Item = SyntaxToken> + '_ {
        self.children(tree).filter_map(|element| match element {
            SyntaxElement::Node(_) => None,
            SyntaxElement::Token(token) => Some(token),
        })
    }

    /// Returns an iterator over the depth-first walk of this node:
    /// entering it, entering and leaving its descendant nodes, its tokens,
    /// and finally leaving it.
    pub fn preorder(self, tree: &SyntaxTree) -> impl Iterator<Item = WalkEvent> + '_ {
        self.verify_tree(tree);
        let finish_idx = unsafe { tree.get_start_node(self.idx.raw()).finish_node_idx };
        Preorder { idx: self.idx.raw(), end_idx: finish_idx + FINISH_NODE_SIZE, open: Vec::new(), tree }
    }

    /// Returns an iterator over the descendant nodes and tokens of this node
    /// in depth-first order.
    pub fn descendants(self, tree: &SyntaxTree) -> impl Iterator<Item = SyntaxElement> + '_ {
        self.preorder(tree).skip(1).filter_map(|event| match event {
            WalkEvent::Enter(node) => Some(SyntaxElement::Node(node)),
            WalkEvent::Token(token) => Some(SyntaxElement::Token(token)),
            WalkEvent::Leave(_) => None,
        })
    }

    /// Returns an iterator over the descendant nodes of this node
    /// in depth-first order.
    pub fn descendant_nodes(self, tree: &SyntaxTree) -> impl Iterator<Item = SyntaxNode> + '_ {
        self.descendants(tree).filter_map(|element| match element {
            SyntaxElement::Node(node) => Some(node),
            SyntaxElement::Token(_) => None,
        })
    }

    /// Returns an iterator over the descendant tokens of this node
    /// in depth-first order, hidden tokens included.
    pub fn descendant_tokens(self, tree: &SyntaxTree) -> impl Iterator<Item = SyntaxToken> + '_ {
        self.descendants(tree).filter_map(|element| match element {
            SyntaxElement::Node(_) => None,
            SyntaxElement::Token(token) => Some(token),
        })
    }

    /// Returns an iterator over the descendant nodes named `name`.
    pub fn descendants_named<'a>(
        self,
        tree: &'a SyntaxTree,
        name: &'a str,
    ) -> impl Iterator<Item = SyntaxNode> + 'a {
        self.descendant_nodes(tree).filter(move |node| node.name(tree) == name)
    }

    /// Returns an iterator over the descendant tokens on the visible channel.
    pub fn visible_tokens(self, tree: &SyntaxTree) -> impl Iterator<Item = SyntaxToken> + '_ {
        self.descendant_tokens(tree).filter(|token| token.channel(tree) == Channel::Visible)
    }

    /// Returns an iterator over the descendant whitespace and comment tokens.
    pub fn hidden_tokens(self, tree: &SyntaxTree) -> impl Iterator<Item = SyntaxToken> + '_ {
        self.descendant_tokens(tree).filter(|token| token.channel(tree) == Channel::Hidden)
    }

    /// Returns the byte range this node spans in the tree’s text.
    pub fn range(self, tree: &SyntaxTree) -> TextRange {
        self.verify_tree(tree);
        let start_node = unsafe { tree.get_start_node(self.idx.raw()) };
        TextRange::new(start_node.start.into(), start_node.end.into())
    }

    /// Returns the text of all the tokens this node contains.
    pub fn text(self, tree: &SyntaxTree) -> &str {
        self.verify_tree(tree);
        let start_node = unsafe { tree.get_start_node(self.idx.raw()) };
        tree.get_text(start_node.start, start_node.end)
    }

    /// Returns the span from the start of this node’s first token
    /// to the end of its last one, or `None` if it contains no tokens.
    pub fn span(self, tree: &SyntaxTree) -> Option<Span> {
        let mut tokens = self.descendant_tokens(tree);
        let first = tokens.next()?;
        let last = tokens.last().unwrap_or(first);
        Some(Span { start: first.span(tree).start, end: last.span(tree).end })
    }

    fn verify_tree(self, tree: &SyntaxTree) {
        assert_eq!(
            self.tree_id,
            tree.id(),
            "tried to access node data from tree other than the one this node is from"
        );
    }
}

struct Children<'a> {
    idx: u32,
    finish_idx: u32,
    tree: &'a SyntaxTree,
}

impl Iterator for Children<'_> {
    type Item = SyntaxElement;

    fn next(&mut self) -> Option<Self::Item> {
        if self.idx >= self.finish_idx {
            return None;
        }

        let tree_id = self.tree.id();
        unsafe {
            match self.tree.event_kind(self.idx) {
                EventKind::StartNode => {
                    let finish_node_idx = self.tree.get_start_node(self.idx).finish_node_idx;
                    let node = SyntaxNode::new(EventIdx::new(self.idx), tree_id);
                    self.idx = finish_node_idx + FINISH_NODE_SIZE;
                    Some(SyntaxElement::Node(node))
                }
                EventKind::AddToken => {
                    let token = SyntaxToken::new(EventIdx::new(self.idx), tree_id);
                    self.idx += ADD_TOKEN_SIZE;
                    Some(SyntaxElement::Token(token))
                }
                EventKind::FinishNode => unreachable!("finish nodes of children are skipped"),
            }
        }
    }
}

struct Preorder<'a> {
    idx: u32,
    end_idx: u32,
    open: Vec<SyntaxNode>,
    tree: &'a SyntaxTree,
}

impl Iterator for Preorder<'_> {
    type Item = WalkEvent;

    fn next(&mut self) -> Option<Self::Item> {
        if self.idx >= self.end_idx {
            return None;
        }

        let tree_id = self.tree.id();
        unsafe {
            match self.tree.event_kind(self.idx) {
                EventKind::StartNode => {
                    let node = SyntaxNode::new(EventIdx::new(self.idx), tree_id);
                    self.open.push(node);
                    self.idx += START_NODE_SIZE;
                    Some(WalkEvent::Enter(node))
                }
                EventKind::AddToken => {
                    let token = SyntaxToken::new(EventIdx::new(self.idx), tree_id);
                    self.idx += ADD_TOKEN_SIZE;
                    Some(WalkEvent::Token(token))
                }
                EventKind::FinishNode => {
                    self.idx += FINISH_NODE_SIZE;
                    let node = self.open.pop();
                    debug_assert!(node.is_some(), "unbalanced finish node");
                    node.map(WalkEvent::Leave)
                }
            }
        }
    }
}
