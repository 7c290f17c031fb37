//! Memoizing cache for UMLS lookups
//!
//! Every query sent to the UMLS backend is identified by a [`LookupKey`]
//! (query kind + normalized tokens). The [`LookupCache`] stores the backend's
//! answer under that key for the lifetime of the cache, so the same word or
//! sentence is never queried twice.
//!
//! ## Contract
//!
//! - At most one successful fetch per key, even with concurrent callers
//! - Empty answers are cached; errors are not
//! - Append-only: no eviction, no TTL, no capacity bound
//!
//! UMLS mappings are static reference data and the keyspace is bounded by the
//! vocabulary of the corpus being tagged, so unbounded growth is acceptable.

pub mod snapshot;
pub mod store;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::umls::SemanticMatch;

pub use snapshot::{CacheSnapshot, SNAPSHOT_VERSION};
pub use store::{CacheStats, LookupCache};

/// The four kinds of UMLS query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupKind {
    /// Concept identifiers for a single word
    Cui,
    /// Semantic types for a single word in isolation
    SemanticTypeWord,
    /// Semantic types of the largest matching substring(s) of a sentence
    SemanticTypeSentence,
    /// Per-word semantic context over a sentence
    SemanticContext,
}

impl LookupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupKind::Cui => "cui",
            LookupKind::SemanticTypeWord => "semantic_type_word",
            LookupKind::SemanticTypeSentence => "semantic_type_sentence",
            LookupKind::SemanticContext => "semantic_context",
        }
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one UMLS query
///
/// Tokens are kept as a list rather than joined into one string, so two
/// different token sequences always produce different keys. Word keys hold
/// exactly one token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LookupKey {
    pub kind: LookupKind,
    pub tokens: Vec<String>,
}

impl LookupKey {
    /// Key for a single (already normalized) word or phrase
    pub fn word(kind: LookupKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            tokens: vec![text.into()],
        }
    }

    /// Key for an ordered sequence of (already normalized) tokens
    pub fn sentence<S: AsRef<str>>(kind: LookupKind, tokens: &[S]) -> Self {
        Self {
            kind,
            tokens: tokens.iter().map(|t| t.as_ref().to_string()).collect(),
        }
    }

    /// Tokens joined with spaces (for logs and errors)
    pub fn display_text(&self) -> String {
        self.tokens.join(" ")
    }
}

/// A cached backend answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LookupValue {
    /// CUIs or semantic-type labels for a word
    Labels(Vec<String>),
    /// Semantic-type matches per matched span of a sentence
    Matches(Vec<Vec<SemanticMatch>>),
    /// Context labels per word of a sentence
    Contexts(Vec<Vec<String>>),
}

impl LookupValue {
    pub fn as_labels(&self) -> Option<&[String]> {
        match self {
            LookupValue::Labels(labels) => Some(labels),
            _ => None,
        }
    }

    pub fn as_matches(&self) -> Option<&[Vec<SemanticMatch>]> {
        match self {
            LookupValue::Matches(matches) => Some(matches),
            _ => None,
        }
    }

    pub fn as_contexts(&self) -> Option<&[Vec<String>]> {
        match self {
            LookupValue::Contexts(contexts) => Some(contexts),
            _ => None,
        }
    }

    /// True when the backend found nothing at all
    pub fn is_empty(&self) -> bool {
        match self {
            LookupValue::Labels(v) => v.is_empty(),
            LookupValue::Matches(v) => v.is_empty(),
            LookupValue::Contexts(v) => v.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentence_keys_do_not_collide() {
        let joined = LookupKey::sentence(LookupKind::SemanticContext, &["chest pain"]);
        let split = LookupKey::sentence(LookupKind::SemanticContext, &["chest", "pain"]);
        assert_ne!(joined, split);
        assert_eq!(split.display_text(), "chest pain");
    }

    #[test]
    fn test_control_characters_inside_tokens_stay_distinct() {
        let single = LookupKey::sentence(LookupKind::SemanticContext, &["a\u{1f}b"]);
        let pair = LookupKey::sentence(LookupKind::SemanticContext, &["a", "b"]);
        assert_ne!(single, pair);
    }

    #[test]
    fn test_empty_sentence_differs_from_empty_token() {
        let none: [&str; 0] = [];
        let empty = LookupKey::sentence(LookupKind::SemanticTypeSentence, &none);
        let blank = LookupKey::sentence(LookupKind::SemanticTypeSentence, &[""]);
        assert_ne!(empty, blank);
        assert!(empty.tokens.is_empty());
        assert_eq!(blank.tokens, vec![String::new()]);
    }

    #[test]
    fn test_word_key_holds_one_token() {
        let key = LookupKey::word(LookupKind::Cui, "chest pain");
        assert_eq!(key.tokens, vec!["chest pain".to_string()]);
        assert_eq!(key.display_text(), "chest pain");
    }

    #[test]
    fn test_kind_is_part_of_key() {
        let cui = LookupKey::word(LookupKind::Cui, "fever");
        let sty = LookupKey::word(LookupKind::SemanticTypeWord, "fever");
        assert_ne!(cui, sty);
    }

    #[test]
    fn test_value_accessors() {
        let labels = LookupValue::Labels(vec!["C0015967".to_string()]);
        assert_eq!(labels.as_labels().map(|l| l.len()), Some(1));
        assert!(labels.as_matches().is_none());
        assert!(!labels.is_empty());
        assert!(LookupValue::Contexts(vec![]).is_empty());
        // An outer list of empty spans is not "nothing at all"
        assert!(!LookupValue::Contexts(vec![vec![]]).is_empty());
    }
}
