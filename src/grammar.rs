//! What a parser backend hands to the [`TreeBuilder`](crate::TreeBuilder).

use crate::{Channel, LineColumn};
use std::fmt;

/// Identifies the grammar alternative (invocation site) that produced a node.
pub type RuleId = u32;

/// The name of the synthetic nodes that hold tokens the grammar did not attach.
pub const TOKEN_GROUP: &str = "TOKENS";

/// The rule id of [`TOKEN_GROUP`] nodes. Grammars must not use it.
pub const TOKEN_GROUP_RULE_ID: RuleId = 0;

/// A token as produced by a lexer, before it is placed in a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawToken<'a> {
    pub kind: &'a str,
    pub text: &'a str,
    pub channel: Channel,
    /// Where the token starts in the source.
    pub start: LineColumn,
}

/// One step of a parse, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleEvent<'a> {
    /// A rule was entered.
    Enter {
        name: &'a str,
        rule_id: RuleId,
    },
    /// The token at this index of [`ParseOutput::tokens`] was matched.
    Token(usize),
    /// The innermost rule was left.
    Exit,
    /// The parser hit a syntax error.
    Error(Diagnostic),
}

/// A syntax error reported by a parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    /// Where the offending token starts.
    pub position: LineColumn,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.position, self.message)
    }
}

/// Everything one parse of a source produced.
#[derive(Debug, Clone, Default)]
pub struct ParseOutput<'a> {
    /// Every token of the source, hidden ones included, in order.
    pub tokens: Vec<RawToken<'a>>,
    pub events: Vec<RuleEvent<'a>>,
}

/// A lexer and parser for one language.
///
/// Implementations must lex the whole source into `tokens`, so that
/// concatenating their texts yields the source again,
/// and must reference tokens from `events` in increasing order.
pub trait Grammar: Send + Sync {
    /// A short identifier of the language, such as `mini-java`.
    fn name(&self) -> &'static str;

    fn parse<'a>(&self, source: &'a str) -> ParseOutput<'a>;
}
