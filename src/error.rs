//! Error types shared across the analysis, hierarchy and session layers.

use std::path::PathBuf;
use thiserror::Error;

/// Failures of a single analysis round trip.
///
/// Every variant is surfaced to the caller unchanged; the client never
/// retries and never substitutes a fallback report.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The classifier API key is not configured. Raised before any I/O.
    #[error("classifier API key is required for analysis (set GEMINI_CONFIG or API_KEY)")]
    MissingCredential,

    /// The HTTP request could not be sent or the body could not be read.
    #[error("classifier request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("classifier returned {status}: {message}")]
    Service { status: u16, message: String },

    /// The service answered but produced no text content. The candidate's
    /// finish reason (e.g. `SAFETY`, `MAX_TOKENS`) is kept when present.
    #[error(
        "no text content generated by the classifier (finish reason: {})",
        .finish_reason.as_deref().unwrap_or("unknown")
    )]
    EmptyResponse { finish_reason: Option<String> },

    /// The returned payload does not match the report structure.
    #[error("classifier response does not match the report schema: {0}")]
    Schema(String),
}

impl From<serde_json::Error> for AnalysisError {
    fn from(e: serde_json::Error) -> Self {
        AnalysisError::Schema(e.to_string())
    }
}

/// Structural problems in a hierarchy snapshot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("duplicate folder id: {0}")]
    DuplicateFolder(String),

    #[error("duplicate file id: {0}")]
    DuplicateFile(String),

    #[error("hierarchy has no root folder")]
    MissingRoot,

    #[error("hierarchy has more than one root folder: {0:?}")]
    MultipleRoots(Vec<String>),

    #[error("folder {folder} references unknown parent {parent}")]
    DanglingFolderParent { folder: String, parent: String },

    #[error("file {file} references unknown folder {parent}")]
    DanglingFileParent { file: String, parent: String },

    #[error("folder {0} is part of a parent cycle")]
    Cycle(String),

    /// A provider could not produce a snapshot at all.
    #[error("hierarchy unavailable: {0}")]
    Unavailable(String),
}

/// Errors reading or writing the persisted identity.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt session storage at {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no local data directory available for session storage")]
    NoStorageDir,
}

/// Errors loading the application configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}
