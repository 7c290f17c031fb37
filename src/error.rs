//! Error types for UMLS lookups and feature extraction
//!
//! Lookup failures travel unchanged from the backend, through the cache, to
//! whoever asked for features. "No mapping found" is not an error; it is an
//! empty result.

use thiserror::Error;

use crate::cache::LookupKind;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, UmlsError>;

/// Main error type for UMLS feature extraction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UmlsError {
    #[error("UMLS {kind} lookup failed for '{text}': {reason}")]
    LookupFailure {
        kind: LookupKind,
        text: String,
        reason: String,
    },

    #[error("Chunk index {index} out of range for sentence of {len} spans")]
    ChunkIndexOutOfRange { index: usize, len: usize },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl UmlsError {
    /// Convenience constructor for backend implementations
    pub fn lookup_failure(
        kind: LookupKind,
        text: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        UmlsError::LookupFailure {
            kind,
            text: text.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error came from the backend rather than the caller
    pub fn is_lookup_failure(&self) -> bool {
        matches!(self, UmlsError::LookupFailure { .. })
    }
}
