use std::ops::Range;

/// Tracks which tokens of a stream have already been placed in a tree.
///
/// Every token is claimed exactly once: either directly, when the grammar attaches it,
/// or as part of the pending run of tokens in front of an attached token.
#[derive(Debug, Default)]
pub(crate) struct HiddenTokenCollector {
    next_token_index: usize,
}

impl HiddenTokenCollector {
    /// Claims the token at `index` and returns the range of tokens before it
    /// that nobody has claimed yet.
    pub(crate) fn claim(&mut self, index: usize) -> Range<usize> {
        assert!(
            index >= self.next_token_index,
            "token {index} attached twice or out of order (next unplaced token is {})",
            self.next_token_index
        );

        let pending = self.next_token_index..index;
        self.next_token_index = index + 1;
        pending
    }

    /// Claims every remaining token of a stream of `len` tokens.
    pub(crate) fn drain_trailing(&mut self, len: usize) -> Range<usize> {
        let trailing = self.next_token_index.min(len)..len;
        self.next_token_index = len;
        trailing
    }

    pub(crate) fn next_token_index(&self) -> usize {
        self.next_token_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_pending_runs() {
        let mut collector = HiddenTokenCollector::default();
        assert_eq!(collector.claim(0), 0..0);
        assert_eq!(collector.claim(3), 1..3);
        assert_eq!(collector.claim(4), 4..4);
        assert_eq!(collector.next_token_index(), 5);
        assert_eq!(collector.drain_trailing(8), 5..8);
        assert_eq!(collector.drain_trailing(8), 8..8);
    }

    #[test]
    fn drains_everything_when_nothing_was_claimed() {
        let mut collector = HiddenTokenCollector::default();
        assert_eq!(collector.drain_trailing(2), 0..2);
    }

    #[test]
    #[should_panic(expected = "token 1 attached twice or out of order (next unplaced token is 2)")]
    fn claim_twice() {
        let mut collector = HiddenTokenCollector::default();
        collector.claim(1);
        collector.claim(1);
    }

    #[test]
    #[should_panic(expected = "token 2 attached twice or out of order")]
    fn claim_out_of_order() {
        let mut collector = HiddenTokenCollector::default();
        collector.claim(5);
        collector.claim(2);
    }
}
