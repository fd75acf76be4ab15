//! Syntax trees are stored as a flat buffer of events.
//!
//! # Layout
//!
//! Every event starts with a two-byte [tag](self::tag::Tag) followed by its payload.
//! All integers are stored native-endian and unaligned.
//!
//! | event       | payload                                                              |
//! |-------------|----------------------------------------------------------------------|
//! | start node  | rule id, index of the matching finish node, text start, text end    |
//! | add token   | text start, text end, start line, start column, end line, end column |
//! | finish node | (none)                                                               |
//!
//! The root node always starts at index 0,
//! and the text of every token is stored contiguously in [`SyntaxTree::text`].

use crate::name::{NameId, NameInterner, NameTable};
use crate::{Channel, LineColumn, RuleId, Span, SyntaxNode, WalkEvent};
use std::fmt;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};

mod tag;

use self::tag::Tag;

/// An immutable, lossless concrete syntax tree.
///
/// Trees are created with a [`SyntaxBuilder`], by the
/// [`TreeBuilder`](crate::TreeBuilder) from a grammar’s output,
/// or by [`SyntaxTree::from_xml`].
/// Access the tree’s contents through the [`SyntaxNode`] returned by [`SyntaxTree::root`].
///
/// Trees are `Send` and `Sync` and can be read from several threads at once.
#[derive(Clone)]
pub struct SyntaxTree {
    data: Vec<u8>,
    text: String,
    names: NameTable,
    id: u32,
}

static_assertions::assert_impl_all!(SyntaxTree: Send, Sync);

/// Builds a [`SyntaxTree`] event by event.
///
/// Nodes are opened with [`SyntaxBuilder::start_node`] and closed with
/// [`SyntaxBuilder::finish_node`]. Tokens are appended to the innermost open node.
/// Misuse (for example finishing more nodes than were started) panics.
#[derive(Debug, Default)]
pub struct SyntaxBuilder {
    data: Vec<u8>,
    text: String,
    names: NameInterner,
    is_root_set: bool,
    start_node_idxs: Vec<usize>,
}

pub(crate) const START_NODE_SIZE: u32 = 2 + 4 + 4 + 4 + 4;
pub(crate) const ADD_TOKEN_SIZE: u32 = 2 + 4 + 4 + 4 + 4 + 4 + 4;
pub(crate) const FINISH_NODE_SIZE: u32 = 2;

const FINISH_NODE_IDX_PLACEHOLDER: u32 = 0;

static CURRENT_TREE_ID: AtomicU32 = AtomicU32::new(0);

/// The index of an event in a tree’s buffer.
///
/// Stored off by one so that handles get a niche.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct EventIdx(NonZeroU32);

impl EventIdx {
    pub(crate) fn new(raw: u32) -> Self {
        Self(NonZeroU32::MIN.saturating_add(raw))
    }

    pub(crate) fn raw(self) -> u32 {
        self.0.get() - 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EventKind {
    StartNode,
    AddToken,
    FinishNode,
}

pub(crate) struct StartNode {
    pub(crate) name: NameId,
    pub(crate) rule_id: RuleId,
    pub(crate) finish_node_idx: u32,
    pub(crate) start: u32,
    pub(crate) end: u32,
}

pub(crate) struct AddToken {
    pub(crate) kind: NameId,
    pub(crate) channel: Channel,
    pub(crate) start: u32,
    pub(crate) end: u32,
    pub(crate) span: Span,
}

impl SyntaxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a node named `name` produced by the grammar alternative `rule_id`.
    pub fn start_node(&mut self, name: &str, rule_id: RuleId) {
        if self.is_root_set {
            assert_ne!(self.nesting(), 0, "root node already created");
        } else {
            debug_assert!(self.data.is_empty());
            self.is_root_set = true;
        }

        let name = self.names.intern(name);
        let current_len = self.text_len();

        self.start_node_idxs.push(self.data.len());

        self.data.reserve(START_NODE_SIZE as usize);
        self.push_u16(Tag::start_node(name).to_raw());
        self.push_u32(rule_id);
        self.push_u32(FINISH_NODE_IDX_PLACEHOLDER);
        self.push_u32(current_len);
        self.push_u32(current_len);
        self.check_data_len();
    }

    /// Appends a token to the innermost open node.
    ///
    /// `span` is stored as given; use [`Span::of`] to derive it from a start position.
    pub fn add_token(&mut self, kind: &str, text: &str, channel: Channel, span: Span) {
        assert!(self.nesting() > 0, "cannot add token before starting node");

        let kind = self.names.intern(kind);
        let start = self.text_len();
        self.text.push_str(text);
        let end = self.text_len();

        self.data.reserve(ADD_TOKEN_SIZE as usize);
        self.push_u16(Tag::add_token(kind, channel).to_raw());
        self.push_u32(start);
        self.push_u32(end);
        self.push_line_column(span.start);
        self.push_line_column(span.end);
        self.check_data_len();
    }

    /// Closes the innermost open node.
    pub fn finish_node(&mut self) {
        let Some(start_node_idx) = self.start_node_idxs.pop() else {
            panic!("no nodes are yet to be finished");
        };

        let finish_node_idx = self.data.len() as u32;
        let current_len = self.text_len();

        self.push_u16(Tag::finish_node().to_raw());
        self.check_data_len();

        debug_assert_eq!(self.u32_at(start_node_idx + 6), FINISH_NODE_IDX_PLACEHOLDER);
        self.write_u32_at(start_node_idx + 6, finish_node_idx);
        self.write_u32_at(start_node_idx + 14, current_len);
    }

    /// The number of nodes that have been started but not yet finished.
    pub fn nesting(&self) -> usize {
        self.start_node_idxs.len()
    }

    /// Whether the root node has been started.
    pub fn is_root_set(&self) -> bool {
        self.is_root_set
    }

    /// Completes the tree. Every started node must have been finished.
    pub fn finish(self) -> SyntaxTree {
        let Self { mut data, text, names, is_root_set, start_node_idxs } = self;

        assert!(is_root_set, "no nodes created");

        let nesting = start_node_idxs.len();
        assert_eq!(nesting, 0, "did not finish all nodes ({nesting} unfinished nodes)");

        data.shrink_to_fit();

        SyntaxTree {
            data,
            text,
            names: names.finish(),
            id: CURRENT_TREE_ID.fetch_add(1, Ordering::SeqCst),
        }
    }

    fn text_len(&self) -> u32 {
        u32::try_from(self.text.len()).unwrap_or_else(|_| {
            panic!("text is too long: {} bytes exceed u32::MAX", self.text.len())
        })
    }

    fn check_data_len(&self) {
        assert!(self.data.len() < u32::MAX as usize, "syntax tree is too large");
    }

    fn push_u16(&mut self, n: u16) {
        self.data.extend_from_slice(&n.to_ne_bytes());
    }

    fn push_u32(&mut self, n: u32) {
        self.data.extend_from_slice(&n.to_ne_bytes());
    }

    fn push_line_column(&mut self, position: LineColumn) {
        self.data.extend_from_slice(&position.line.to_ne_bytes());
        self.data.extend_from_slice(&position.column.to_ne_bytes());
    }

    fn u32_at(&self, idx: usize) -> u32 {
        let bytes = &self.data[idx..idx + 4];
        u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    fn write_u32_at(&mut self, idx: usize, n: u32) {
        self.data[idx..idx + 4].copy_from_slice(&n.to_ne_bytes());
    }
}

impl SyntaxTree {
    /// Returns the root node of this tree.
    pub fn root(&self) -> SyntaxNode {
        unsafe { SyntaxNode::new(EventIdx::new(0), self.id) }
    }

    /// Returns the complete text this tree was built from.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn id(&self) -> u32 {
        self.id
    }

    pub(crate) fn resolve(&self, name: NameId) -> &str {
        self.names.resolve(name)
    }

    pub(crate) fn get_text(&self, start: u32, end: u32) -> &str {
        &self.text[start as usize..end as usize]
    }

    pub(crate) fn len(&self) -> u32 {
        self.data.len() as u32
    }

    /// # Safety
    /// `idx` must point at the start of an event in this tree.
    pub(crate) unsafe fn event_kind(&self, idx: u32) -> EventKind {
        debug_assert!(idx < self.len());
        Tag::from_raw(self.read_u16(idx)).event_kind()
    }

    /// # Safety
    /// `idx` must point at a start node event in this tree.
    pub(crate) unsafe fn get_start_node(&self, idx: u32) -> StartNode {
        debug_assert!(idx + START_NODE_SIZE <= self.len());

        let tag = Tag::from_raw(self.read_u16(idx));
        StartNode {
            name: tag.start_node_name(),
            rule_id: self.read_u32(idx + 2),
            finish_node_idx: self.read_u32(idx + 6),
            start: self.read_u32(idx + 10),
            end: self.read_u32(idx + 14),
        }
    }

    /// # Safety
    /// `idx` must point at an add token event in this tree.
    pub(crate) unsafe fn get_add_token(&self, idx: u32) -> AddToken {
        debug_assert!(idx + ADD_TOKEN_SIZE <= self.len());

        let tag = Tag::from_raw(self.read_u16(idx));
        AddToken {
            kind: tag.add_token_kind(),
            channel: tag.add_token_channel(),
            start: self.read_u32(idx + 2),
            end: self.read_u32(idx + 6),
            span: Span {
                start: LineColumn::new(self.read_u32(idx + 10), self.read_i32(idx + 14)),
                end: LineColumn::new(self.read_u32(idx + 18), self.read_i32(idx + 22)),
            },
        }
    }

    unsafe fn read_u16(&self, idx: u32) -> u16 {
        (self.data.as_ptr().add(idx as usize) as *const u16).read_unaligned()
    }

    unsafe fn read_u32(&self, idx: u32) -> u32 {
        (self.data.as_ptr().add(idx as usize) as *const u32).read_unaligned()
    }

    unsafe fn read_i32(&self, idx: u32) -> i32 {
        (self.data.as_ptr().add(idx as usize) as *const i32).read_unaligned()
    }
}

impl PartialEq for SyntaxTree {
    /// Trees are equal when they have the same shape, names, rule ids,
    /// token kinds, texts, channels and spans.
    fn eq(&self, other: &Self) -> bool {
        let mut lhs = self.root().preorder(self);
        let mut rhs = other.root().preorder(other);

        loop {
            let equal = match (lhs.next(), rhs.next()) {
                (None, None) => return true,
                (Some(WalkEvent::Enter(a)), Some(WalkEvent::Enter(b))) => {
                    a.name(self) == b.name(other) && a.rule_id(self) == b.rule_id(other)
                }
                (Some(WalkEvent::Token(a)), Some(WalkEvent::Token(b))) => {
                    a.kind(self) == b.kind(other)
                        && a.text(self) == b.text(other)
                        && a.channel(self) == b.channel(other)
                        && a.span(self) == b.span(other)
                }
                (Some(WalkEvent::Leave(_)), Some(WalkEvent::Leave(_))) => true,
                _ => false,
            };

            if !equal {
                return false;
            }
        }
    }
}

impl Eq for SyntaxTree {}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !f.alternate() {
            return f
                .debug_struct("SyntaxTree")
                .field("text", &self.text)
                .field("data", &self.data)
                .finish();
        }

        let mut indentation_level = 0_usize;

        for event in self.root().preorder(self) {
            match event {
                WalkEvent::Enter(node) => {
                    write!(f, "{:indent$}", "", indent = indentation_level * 2)?;
                    writeln!(f, "{}@{:?}", node.name_with_id(self), node.range(self))?;
                    indentation_level += 1;
                }
                WalkEvent::Token(token) => {
                    write!(f, "{:indent$}", "", indent = indentation_level * 2)?;
                    let kind = token.kind(self);
                    let range = token.range(self);
                    let text = token.text(self);
                    write!(f, "{kind}@{range:?} {text:?}")?;
                    if token.channel(self) == Channel::Hidden {
                        write!(f, " (hidden)")?;
                    }
                    writeln!(f)?;
                }
                WalkEvent::Leave(_) => indentation_level -= 1,
            }
        }

        Ok(())
    }
}
