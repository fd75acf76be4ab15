//! Checks that a [`Processor`] restores sources exactly.
//!
//! These helpers are meant for tests of grammars and processors.
//! The conversions themselves never report a [`RoundTripMismatch`].

use crate::{position, Error, ParseMode, Processor, SyntaxTree};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Which comparison of a verification failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Source generated from the tree differs from the parsed source.
    SourceFromTree,
    /// The tree read back from its XML differs from the tree.
    XmlRoundTrip,
    /// Source generated from a re-parsed tree differs from the previous generation.
    Reparse,
    /// The source at a token’s position differs from the token’s text.
    TokenPosition,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SourceFromTree => "source from tree",
            Self::XmlRoundTrip => "XML round trip",
            Self::Reparse => "re-parse",
            Self::TokenPosition => "token position",
        })
    }
}

/// Two texts that should have been identical.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage} mismatch{}", describe_difference(.expected, .actual))]
pub struct RoundTripMismatch {
    /// The comparison that failed.
    pub stage: Stage,
    pub expected: String,
    pub actual: String,
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error(transparent)]
    Processor(#[from] Error),

    #[error(transparent)]
    Mismatch(#[from] RoundTripMismatch),

    #[error("tree changed after re-parsing generated source")]
    UnstableTree,
}

fn describe_difference(expected: &str, actual: &str) -> String {
    let offset = expected
        .char_indices()
        .zip(actual.chars())
        .find(|((_, a), b)| a != b)
        .map(|((offset, _), _)| offset)
        .unwrap_or_else(|| expected.len().min(actual.len()));
    let line = expected[..offset].matches('\n').count() + 1;
    format!(" on line {line}: expected {expected:?}, found {actual:?}")
}

/// Parses `source` strictly and checks that
/// the tree restores `source` exactly, survives a trip through XML,
/// and places every token where its text is in `source`.
pub fn verify_restoring(processor: &dyn Processor, source: &str) -> Result<SyntaxTree, VerifyError> {
    let tree = processor.tree_from_source(source, ParseMode::Strict)?;

    let restored = processor.source_from_tree(&tree)?;
    if restored != source {
        return Err(mismatch(Stage::SourceFromTree, source, restored));
    }

    let xml = processor.xml_from_tree(&tree)?;
    let from_xml = processor.tree_from_xml(&xml)?;
    if from_xml != tree {
        let actual = processor.xml_from_tree(&from_xml)?;
        return Err(mismatch(Stage::XmlRoundTrip, &xml, actual));
    }

    verify_positions(&tree, source)?;
    Ok(tree)
}

/// Parses and regenerates `source` three times and checks that
/// the second and third trees and sources are identical.
pub fn verify_inter_converting(processor: &dyn Processor, source: &str) -> Result<(), VerifyError> {
    let t1 = processor.tree_from_source(source, ParseMode::Strict)?;
    let c1 = processor.source_from_tree(&t1)?;
    let t2 = processor.tree_from_source(&c1, ParseMode::Strict)?;
    let c2 = processor.source_from_tree(&t2)?;
    let t3 = processor.tree_from_source(&c2, ParseMode::Strict)?;
    let c3 = processor.source_from_tree(&t3)?;

    if t2 != t3 {
        return Err(VerifyError::UnstableTree);
    }
    if c2 != c3 {
        return Err(mismatch(Stage::Reparse, &c2, c3));
    }
    Ok(())
}

/// Checks that slicing `source` at every token’s span yields the token’s text.
pub fn verify_positions(tree: &SyntaxTree, source: &str) -> Result<(), RoundTripMismatch> {
    for token in tree.root().descendant_tokens(tree) {
        let text = token.text(tree);
        let span = token.span(tree);
        match position::slice(source, span) {
            Some(found) if found == text => {}
            found => {
                return Err(RoundTripMismatch {
                    stage: Stage::TokenPosition,
                    expected: text.to_owned(),
                    actual: found.unwrap_or_default().to_owned(),
                });
            }
        }
    }
    Ok(())
}

/// Returns how many leading lines of `source` pass [`verify_restoring`] together,
/// which narrows down where a grammar first fails on a large input.
pub fn max_restorable_line(processor: &dyn Processor, source: &str) -> usize {
    let ends: Vec<usize> = source
        .split_inclusive('\n')
        .scan(0, |end, line| {
            *end += line.len();
            Some(*end)
        })
        .collect();

    for lines in (1..=ends.len()).rev() {
        let prefix = &source[..ends[lines - 1]];
        match verify_restoring(processor, prefix) {
            Ok(_) => return lines,
            Err(err) => debug!(lines, %err, "prefix does not restore"),
        }
    }
    0
}

fn mismatch(stage: Stage, expected: &str, actual: String) -> VerifyError {
    VerifyError::Mismatch(RoundTripMismatch { stage, expected: expected.to_owned(), actual })
}
