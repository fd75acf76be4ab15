use crate::{codegen, Grammar, ParseMode, Result, SyntaxTree, ToolCommand, TreeBuilder};
use tracing::debug;

/// Converts between the source code of one language, syntax trees and XML.
///
/// Only [`Processor::tree_from_source`] is required;
/// everything else follows from the tree and its XML form.
pub trait Processor: Send + Sync {
    /// The identifier of the language this processor handles.
    fn language(&self) -> &str;

    /// Parses `source` into a lossless tree.
    ///
    /// In [`ParseMode::Strict`] syntax errors fail with [`Error::Parse`](crate::Error::Parse);
    /// in [`ParseMode::Lenient`] they yield the best tree that could be built.
    fn tree_from_source(&self, source: &str, mode: ParseMode) -> Result<SyntaxTree>;

    fn source_from_tree(&self, tree: &SyntaxTree) -> Result<String> {
        Ok(codegen::generate(tree))
    }

    fn xml_from_tree(&self, tree: &SyntaxTree) -> Result<String> {
        tree.to_xml()
    }

    fn tree_from_xml(&self, xml: &str) -> Result<SyntaxTree> {
        SyntaxTree::from_xml(xml)
    }

    fn xml_from_source(&self, source: &str, mode: ParseMode) -> Result<String> {
        let tree = self.tree_from_source(source, mode)?;
        self.xml_from_tree(&tree)
    }

    fn source_from_xml(&self, xml: &str) -> Result<String> {
        let tree = self.tree_from_xml(xml)?;
        self.source_from_tree(&tree)
    }
}

/// A [`Processor`] that parses in-process with a [`Grammar`].
#[derive(Debug, Clone, Default)]
pub struct GrammarProcessor<G> {
    grammar: G,
}

impl<G: Grammar> GrammarProcessor<G> {
    pub fn new(grammar: G) -> Self {
        Self { grammar }
    }

    pub fn grammar(&self) -> &G {
        &self.grammar
    }
}

impl<G: Grammar> Processor for GrammarProcessor<G> {
    fn language(&self) -> &str {
        self.grammar.name()
    }

    fn tree_from_source(&self, source: &str, mode: ParseMode) -> Result<SyntaxTree> {
        let output = self.grammar.parse(source);
        debug!(
            language = self.grammar.name(),
            tokens = output.tokens.len(),
            events = output.events.len(),
            "parsed source"
        );
        TreeBuilder::build(&output.tokens, &output.events, mode)
    }
}

/// A [`Processor`] backed by external programs.
///
/// The XML generator reads source code on stdin and prints the tree as XML.
/// The optional code generator reads XML on stdin and prints source code;
/// without one, source is restored from the tree directly.
///
/// External parsers have no lenient mode: whatever the XML generator prints is the tree,
/// and a failing XML generator is an error in either [`ParseMode`].
#[derive(Debug, Clone)]
pub struct ExternalProcessor {
    language: String,
    xml_generator: ToolCommand,
    code_generator: Option<ToolCommand>,
}

impl ExternalProcessor {
    pub fn new(language: impl Into<String>, xml_generator: ToolCommand) -> Self {
        Self { language: language.into(), xml_generator, code_generator: None }
    }

    /// Restores source by running `code_generator` on the tree’s XML.
    pub fn with_code_generator(mut self, code_generator: ToolCommand) -> Self {
        self.code_generator = Some(code_generator);
        self
    }
}

impl Processor for ExternalProcessor {
    fn language(&self) -> &str {
        &self.language
    }

    fn tree_from_source(&self, source: &str, mode: ParseMode) -> Result<SyntaxTree> {
        let xml = self.xml_from_source(source, mode)?;
        SyntaxTree::from_xml(&xml)
    }

    fn source_from_tree(&self, tree: &SyntaxTree) -> Result<String> {
        match &self.code_generator {
            Some(code_generator) => code_generator.run(&tree.to_xml()?),
            None => Ok(codegen::generate(tree)),
        }
    }

    fn xml_from_source(&self, source: &str, _mode: ParseMode) -> Result<String> {
        self.xml_generator.run(source)
    }

    fn source_from_xml(&self, xml: &str) -> Result<String> {
        match &self.code_generator {
            Some(code_generator) => code_generator.run(xml),
            None => Ok(codegen::generate(&SyntaxTree::from_xml(xml)?)),
        }
    }
}
