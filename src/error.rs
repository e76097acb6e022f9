//! Crate-wide error type.

use thiserror::Error;

/// Errors raised while loading, indexing or analyzing application metadata.
#[derive(Error, Debug)]
pub enum SleuthError {
    /// A key referenced by a connection, view or formula does not resolve.
    #[error("Unresolved reference in {referrer}: {key}")]
    Reference {
        /// Where the dangling reference was found.
        referrer: String,
        /// The key that could not be resolved.
        key: String,
    },

    /// A name lookup matched more than one candidate.
    #[error("'{query}' is ambiguous; matches: {}", candidates.join(", "))]
    AmbiguousLookup {
        /// The identifier that was looked up.
        query: String,
        /// Every candidate key that matched.
        candidates: Vec<String>,
    },

    /// A queried key or name does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The document is structurally invalid.
    #[error("Invalid metadata document: {0}")]
    Validation(String),

    /// An index built by the graph builder is inconsistent.
    #[error("Internal consistency fault: {0}")]
    Internal(String),

    /// Settings are missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local file access failed.
    #[error("IO error: {0}")]
    Io(String),

    /// The metadata API could not be reached or returned an error.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Rendering output failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for SleuthError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for SleuthError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SleuthError>;
