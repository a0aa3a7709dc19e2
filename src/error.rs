use std::path::PathBuf;

use thiserror::Error;

use crate::diagnostic::DiagnosticList;

/// Crate-level error type used by the string and file entry points and the CLI
#[derive(Error, Debug)]
pub enum XsdError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Setup(#[from] SetupFailure),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// The engine could not even attempt the requested work.
///
/// Fatal to the single operation and never retried. A document that does not
/// conform to a schema is *not* a setup failure: that outcome is reported as a
/// [`DiagnosticList`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupFailure {
    #[error("could not create parser context")]
    ParserContext,

    #[error("invalid schema")]
    InvalidSchema { diagnostics: DiagnosticList },

    #[error("unable to create validation context")]
    ValidationContext,

    #[error("worker task failed: {details}")]
    Worker { details: String },
}

impl SetupFailure {
    /// Error diagnostics the engine reported before giving up, if any
    pub fn diagnostics(&self) -> Option<&DiagnosticList> {
        match self {
            SetupFailure::InvalidSchema { diagnostics } => Some(diagnostics),
            _ => None,
        }
    }
}

/// Failures turning raw XML into a [`Document`](crate::Document)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Malformed XML document {name}: {}", first_message(.diagnostics))]
    Malformed {
        name: String,
        diagnostics: DiagnosticList,
    },

    #[error("XML input too large: {size} bytes")]
    TooLarge { size: usize },

    #[error("Invalid document name: {name}")]
    InvalidName { name: String },
}

fn first_message(diagnostics: &DiagnosticList) -> &str {
    diagnostics
        .iter()
        .next()
        .map(|d| d.message.as_str())
        .unwrap_or("no diagnostic reported")
}

impl From<crate::config::ConfigError> for XsdError {
    fn from(err: crate::config::ConfigError) -> Self {
        XsdError::Config(err.to_string())
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, XsdError>;

/// Setup result type alias
pub type SetupResult<T> = std::result::Result<T, SetupFailure>;

/// Document result type alias
pub type DocumentResult<T> = std::result::Result<T, DocumentError>;
