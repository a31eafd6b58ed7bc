//! Error types shared by the quill crates

use miette::{Diagnostic, NamedSource, SourceOffset, SourceSpan};
use std::borrow::Cow;

use crate::upload::UploadError;

/// Main error type for quill operations
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum QuillError {
    /// Image upload failed or was refused before reaching the network
    #[error(transparent)]
    #[diagnostic(transparent)]
    Upload(#[from] UploadError),

    /// Configuration could not be read or parsed
    #[error("configuration error: {0}")]
    #[diagnostic(code(quill::config))]
    Config(String),

    /// IO error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Parse error with source location
    #[error(transparent)]
    #[diagnostic_source]
    Parse(#[from] ParseError),

    /// Serialization/deserialization error
    #[error(transparent)]
    #[diagnostic_source]
    Serde(#[from] SerDeError),
}

/// Parse error with source code location information
#[derive(thiserror::Error, Debug, Diagnostic)]
#[error("parse error: {}", self.kind)]
#[diagnostic(code(quill::parse))]
pub struct ParseError {
    #[diagnostic_source]
    kind: SerDeError,
    #[source_code]
    src: NamedSource<Cow<'static, str>>,
    #[label("here")]
    err_location: SourceSpan,
    #[help]
    advice: Option<String>,
}

impl ParseError {
    /// Attach the document that failed to parse so the diagnostic can point into it.
    pub fn json(err: serde_json::Error, name: impl AsRef<str>, src: impl Into<String>) -> Self {
        let src: String = src.into();
        let (line, column) = (err.line(), err.column());
        // serde_json columns are 1-based, miette's are 0-based
        let offset = if line == 0 {
            SourceOffset::from(0)
        } else {
            SourceOffset::from_location(&src, line, column.max(1))
        };
        Self {
            kind: SerDeError::Json(err),
            src: NamedSource::new(name, Cow::Owned(src)),
            err_location: SourceSpan::new(offset, 0),
            advice: None,
        }
    }

    pub fn with_advice(mut self, advice: impl Into<String>) -> Self {
        self.advice = Some(advice.into());
        self
    }
}

/// Serialization/deserialization errors
#[derive(thiserror::Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum SerDeError {
    #[error(transparent)]
    #[diagnostic(code(quill::serde::json))]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    #[diagnostic(code(quill::serde::toml))]
    Toml(#[from] toml::de::Error),
}
