//! UMLS lookup interface
//!
//! Two layers:
//!
//! - [`UmlsBackend`]: raw, uncached queries against whatever holds the UMLS
//!   data (a database, a service, an in-memory table)
//! - [`UmlsLookup`]: the four query operations the feature extractor uses,
//!   each checked against a [`LookupCache`](crate::cache::LookupCache) first
//!
//! [`StaticUmlsBackend`] is an in-memory backend built from a term table. It is
//! handy offline and as a deterministic test double.

pub mod backend;
pub mod lookup;
pub mod static_backend;

use serde::{Deserialize, Serialize};

pub use backend::UmlsBackend;
pub use lookup::UmlsLookup;
pub use static_backend::{StaticUmlsBackend, TermEntry};

/// One semantic-type hit for a matched span of a sentence
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SemanticMatch {
    /// Semantic-type label (e.g. "sosy", "phsu"); the only part used for features
    pub semantic_type: String,

    /// Concept the span resolved to, when the backend reports one
    pub cui: Option<String>,

    /// Text of the matched span
    pub span: String,
}

impl SemanticMatch {
    pub fn new(semantic_type: impl Into<String>, cui: Option<&str>, span: impl Into<String>) -> Self {
        Self {
            semantic_type: semantic_type.into(),
            cui: cui.map(str::to_string),
            span: span.into(),
        }
    }
}

/// Collapse runs of whitespace to single spaces and trim the ends.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
