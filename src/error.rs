use crate::Diagnostic;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// The grammar reported a syntax error while parsing in strict mode.
    #[error("parse failure at {diagnostic}")]
    Parse { diagnostic: Diagnostic },

    #[error("malformed tree: {message}")]
    MalformedTree { message: String },

    #[error("`{program}` did not finish within {timeout:?}")]
    ToolTimeout { program: String, timeout: Duration },

    #[error("`{program}` failed with {status}: {stderr}")]
    ToolFailed { program: String, status: ExitStatus, stderr: String },

    #[error("`{name}` is not a valid XML name")]
    InvalidXmlName { name: String },

    #[error("no processor registered for `{0}`")]
    UnknownLanguage(String),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedTree { message: message.into() }
    }
}
