use crate::collector::HiddenTokenCollector;
use crate::{
    Diagnostic, Error, RawToken, Result, RuleEvent, RuleId, Span, SyntaxBuilder, SyntaxTree,
    TOKEN_GROUP, TOKEN_GROUP_RULE_ID,
};
use std::ops::Range;
use tracing::{debug, trace};

/// How the [`TreeBuilder`] reacts to syntax errors reported by a grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParseMode {
    /// Keep going and return the tree built so far, with every token still in it.
    #[default]
    Lenient,
    /// Fail with [`Error::Parse`] on the first syntax error.
    Strict,
}

/// Builds a lossless [`SyntaxTree`] from a token stream and the rule events of a parse.
///
/// Tokens the grammar does not attach itself (whitespace, comments, and in lenient mode
/// anything after a syntax error) are placed in `TOKENS` groups:
/// directly in front of the next token the grammar attaches,
/// or at the end of the root node if no such token follows.
///
/// Events that contradict the token stream (attaching a token twice, leaving a rule
/// that was never entered, a second root rule) are bugs in the grammar and panic.
#[derive(Debug)]
pub struct TreeBuilder<'a> {
    tokens: &'a [RawToken<'a>],
    mode: ParseMode,
    builder: SyntaxBuilder,
    collector: HiddenTokenCollector,
    root_exited: bool,
    errors: usize,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(tokens: &'a [RawToken<'a>], mode: ParseMode) -> Self {
        Self {
            tokens,
            mode,
            builder: SyntaxBuilder::new(),
            collector: HiddenTokenCollector::default(),
            root_exited: false,
            errors: 0,
        }
    }

    /// Replays `events` over `tokens` and returns the finished tree.
    pub fn build(
        tokens: &'a [RawToken<'a>],
        events: &[RuleEvent<'a>],
        mode: ParseMode,
    ) -> Result<SyntaxTree> {
        let mut builder = Self::new(tokens, mode);
        for event in events {
            match event {
                RuleEvent::Enter { name, rule_id } => builder.enter_rule(name, *rule_id),
                RuleEvent::Token(index) => builder.attach_token(*index),
                RuleEvent::Exit => builder.exit_rule(),
                RuleEvent::Error(diagnostic) => builder.report_error(diagnostic.clone())?,
            }
        }
        Ok(builder.finish())
    }

    pub fn enter_rule(&mut self, name: &str, rule_id: RuleId) {
        assert!(!self.root_exited, "cannot enter `{name}`: the root rule already exited");
        self.builder.start_node(name, rule_id);
    }

    /// Attaches the token at `index`, preceded by a group of every unplaced token before it.
    pub fn attach_token(&mut self, index: usize) {
        assert!(
            index < self.tokens.len(),
            "token index {index} out of range ({} tokens)",
            self.tokens.len()
        );
        assert!(
            self.builder.nesting() > 0 && !self.root_exited,
            "cannot attach token {index} outside of a rule"
        );

        trace!(index, next = self.collector.next_token_index(), "attaching token");
        let pending = self.collector.claim(index);
        self.add_group(pending);
        self.add_token(index);
    }

    /// Leaves the innermost rule. The root rule stays open until [`TreeBuilder::finish`].
    pub fn exit_rule(&mut self) {
        assert!(self.builder.nesting() > 0 && !self.root_exited, "no open rule to exit");

        // the root stays open until `finish` so trailing tokens can still be added
        if self.builder.nesting() == 1 {
            self.root_exited = true;
        } else {
            self.builder.finish_node();
        }
    }

    /// Handles a syntax error according to the builder’s [`ParseMode`].
    pub fn report_error(&mut self, diagnostic: Diagnostic) -> Result<()> {
        match self.mode {
            ParseMode::Strict => Err(Error::Parse { diagnostic }),
            ParseMode::Lenient => {
                debug!(%diagnostic, "continuing after syntax error");
                self.errors += 1;
                Ok(())
            }
        }
    }

    /// Closes every open rule, places the remaining tokens, and returns the tree.
    pub fn finish(mut self) -> SyntaxTree {
        if !self.builder.is_root_set() {
            debug!(tokens = self.tokens.len(), "no rule entered, grouping every token");
            let all = self.collector.drain_trailing(self.tokens.len());
            self.builder.start_node(TOKEN_GROUP, TOKEN_GROUP_RULE_ID);
            self.add_tokens(all);
            self.builder.finish_node();
            return self.builder.finish();
        }

        let unclosed = self.builder.nesting() - usize::from(self.root_exited);
        if unclosed > 0 {
            debug!(unclosed, "closing rules left open by the parser");
        }
        while self.builder.nesting() > 1 {
            self.builder.finish_node();
        }

        let trailing = self.collector.drain_trailing(self.tokens.len());
        self.add_group(trailing);
        self.builder.finish_node();

        debug!(tokens = self.tokens.len(), errors = self.errors, "built tree");
        self.builder.finish()
    }

    fn add_group(&mut self, range: Range<usize>) {
        if range.is_empty() {
            return;
        }

        trace!(?range, "grouping unplaced tokens");
        self.builder.start_node(TOKEN_GROUP, TOKEN_GROUP_RULE_ID);
        self.add_tokens(range);
        self.builder.finish_node();
    }

    fn add_tokens(&mut self, range: Range<usize>) {
        for index in range {
            self.add_token(index);
        }
    }

    fn add_token(&mut self, index: usize) {
        let token = self.tokens[index];
        trace!(index, kind = token.kind, "adding token");
        let span = Span::of(token.start, token.text);
        self.builder.add_token(token.kind, token.text, token.channel, span);
    }
}
