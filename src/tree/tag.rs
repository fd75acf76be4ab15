use super::EventKind;
use crate::name::NameId;
use crate::Channel;

/// The first two bytes of every event in a tree’s buffer.
///
/// - start node: high bit set, the remaining bits hold the node’s name
/// - add token: high bit clear, second-highest bit set for hidden tokens,
///   the remaining bits hold the token’s kind
/// - finish node: all bits set
#[derive(Clone, Copy)]
#[repr(transparent)]
pub(super) struct Tag(u16);

impl Tag {
    const START_NODE_BIT: u16 = 1 << 15;
    const HIDDEN_BIT: u16 = 1 << 14;
    const NAME_MASK: u16 = Self::HIDDEN_BIT - 1;

    pub(super) fn start_node(name: NameId) -> Self {
        debug_assert!(name.to_raw() <= Self::NAME_MASK);
        Self(name.to_raw() | Self::START_NODE_BIT)
    }

    pub(super) fn add_token(kind: NameId, channel: Channel) -> Self {
        debug_assert!(kind.to_raw() <= Self::NAME_MASK);
        match channel {
            Channel::Visible => Self(kind.to_raw()),
            Channel::Hidden => Self(kind.to_raw() | Self::HIDDEN_BIT),
        }
    }

    pub(super) fn finish_node() -> Self {
        Self(u16::MAX)
    }

    pub(super) fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub(super) fn to_raw(self) -> u16 {
        self.0
    }

    pub(super) fn event_kind(self) -> EventKind {
        if self.0 & Self::START_NODE_BIT != 0 {
            if self.0 == u16::MAX {
                EventKind::FinishNode
            } else {
                EventKind::StartNode
            }
        } else {
            EventKind::AddToken
        }
    }

    pub(super) fn start_node_name(self) -> NameId {
        debug_assert_eq!(self.event_kind(), EventKind::StartNode);
        NameId::from_raw(self.0 & Self::NAME_MASK)
    }

    pub(super) fn add_token_kind(self) -> NameId {
        debug_assert_eq!(self.event_kind(), EventKind::AddToken);
        NameId::from_raw(self.0 & Self::NAME_MASK)
    }

    pub(super) fn add_token_channel(self) -> Channel {
        debug_assert_eq!(self.event_kind(), EventKind::AddToken);
        if self.0 & Self::HIDDEN_BIT != 0 {
            Channel::Hidden
        } else {
            Channel::Visible
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_node() {
        let tag = Tag::start_node(NameId::from_raw(5));
        assert_eq!(tag.event_kind(), EventKind::StartNode);
        assert_eq!(tag.start_node_name(), NameId::from_raw(5));
    }

    #[test]
    fn hidden_token() {
        let tag = Tag::add_token(NameId::from_raw(Tag::NAME_MASK), Channel::Hidden);
        assert_eq!(tag.event_kind(), EventKind::AddToken);
        assert_eq!(tag.add_token_kind(), NameId::from_raw(Tag::NAME_MASK));
        assert_eq!(tag.add_token_channel(), Channel::Hidden);
    }

    #[test]
    fn visible_token() {
        let tag = Tag::add_token(NameId::from_raw(0), Channel::Visible);
        assert_eq!(tag.to_raw(), 0);
        assert_eq!(tag.add_token_channel(), Channel::Visible);
    }

    #[test]
    fn finish_node_is_distinct_from_largest_start_node() {
        let largest = Tag::start_node(NameId::from_raw(Tag::NAME_MASK));
        assert_eq!(largest.event_kind(), EventKind::StartNode);
        assert_eq!(Tag::finish_node().event_kind(), EventKind::FinishNode);
    }
}
