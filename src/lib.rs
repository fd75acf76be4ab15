#![doc = include_str!("../README.md")]

mod builder;
mod collector;
mod element;
mod error;
mod grammar;
mod name;
mod node;
mod processor;
mod registry;
mod token;
mod tool;
mod tree;
mod xml;

pub mod codegen;
pub mod languages;
pub mod position;
pub mod verify;

pub use self::builder::{ParseMode, TreeBuilder};
pub use self::element::SyntaxElement;
pub use self::error::{Error, Result};
pub use self::grammar::{
    Diagnostic, Grammar, ParseOutput, RawToken, RuleEvent, RuleId, TOKEN_GROUP,
    TOKEN_GROUP_RULE_ID,
};
pub use self::node::{SyntaxNode, WalkEvent};
pub use self::position::{LineColumn, Span};
pub use self::processor::{ExternalProcessor, GrammarProcessor, Processor};
pub use self::registry::{ProcessorFactory, Registry};
pub use self::token::{Channel, SyntaxToken};
pub use self::tool::ToolCommand;
pub use self::tree::{SyntaxBuilder, SyntaxTree};
pub use text_size::{TextRange, TextSize};
