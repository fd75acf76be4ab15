use crate::languages::mini_java::MiniJava;
use crate::{Error, GrammarProcessor, Processor, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::trace;

/// Creates a fresh processor for one language.
pub type ProcessorFactory = fn() -> Box<dyn Processor>;

/// Maps language identifiers and file extensions to processor factories.
///
/// ```
/// use lossless_cst::{ParseMode, Registry};
///
/// let registry = Registry::with_builtin();
/// let processor = registry.processor_for_path("src/K.java")?;
/// let tree = processor.tree_from_source("class K {}", ParseMode::Strict)?;
/// assert_eq!(processor.source_from_tree(&tree)?, "class K {}");
/// # Ok::<(), lossless_cst::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Registry {
    factories: HashMap<String, ProcessorFactory>,
    extensions: HashMap<String, String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that knows every language bundled with this crate.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("mini-java", &["java"], || Box::new(GrammarProcessor::new(MiniJava)));
        registry
    }

    /// Registers `factory` for `language` and for files ending in any of `extensions`
    /// (given without the leading dot).
    ///
    /// Registering a language or extension again replaces the earlier registration.
    pub fn register(&mut self, language: &str, extensions: &[&str], factory: ProcessorFactory) {
        trace!(language, ?extensions, "registering processor");
        self.factories.insert(language.to_owned(), factory);
        for extension in extensions {
            self.extensions.insert(normalize_extension(extension), language.to_owned());
        }
    }

    /// Creates a processor for `language`.
    pub fn processor(&self, language: &str) -> Result<Box<dyn Processor>> {
        match self.factories.get(language) {
            Some(factory) => Ok(factory()),
            None => Err(Error::UnknownLanguage(language.to_owned())),
        }
    }

    /// Picks a processor by the extension of `path`.
    pub fn processor_for_path(&self, path: impl AsRef<Path>) -> Result<Box<dyn Processor>> {
        let path = path.as_ref();
        let language = path
            .extension()
            .and_then(|extension| extension.to_str())
            .and_then(|extension| self.extensions.get(&normalize_extension(extension)))
            .ok_or_else(|| Error::UnknownLanguage(path.display().to_string()))?;
        self.processor(language)
    }

    /// The registered language identifiers, sorted.
    pub fn languages(&self) -> Vec<&str> {
        let mut languages: Vec<_> = self.factories.keys().map(String::as_str).collect();
        languages.sort_unstable();
        languages
    }
}

fn normalize_extension(extension: &str) -> String {
    extension.trim_start_matches('.').to_ascii_lowercase()
}
