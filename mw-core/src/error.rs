//! Error types for mw.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading, converting or rendering documents.
#[derive(Error, Debug)]
pub enum MwError {
    #[error("Could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Problems with an HTML template.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template {0} not found")]
    NotFound(PathBuf),

    #[error("template has no <head> element")]
    MissingHead,
}

/// Result type alias for mw operations.
pub type MwResult<T> = Result<T, MwError>;
