//! Backend trait for raw UMLS queries

use std::sync::Arc;

use super::SemanticMatch;
use crate::error::Result;

/// Trait for UMLS backend implementations.
///
/// Implementations answer queries without any caching; [`UmlsLookup`](super::UmlsLookup)
/// puts the cache in front. A backend that has no mapping returns an empty
/// list. `Err` is reserved for failures (unreachable database, malformed
/// input) and is never cached.
pub trait UmlsBackend: Send + Sync {
    /// Concept identifiers for a single word.
    fn cuis(&self, word: &str) -> Result<Vec<String>>;

    /// Semantic-type labels for a single word in isolation.
    fn semantic_types_of_word(&self, word: &str) -> Result<Vec<String>>;

    /// Semantic types of the largest matching substring(s) of a sentence.
    ///
    /// One inner list per matched span.
    fn semantic_types_of_sentence(&self, sentence: &[String]) -> Result<Vec<Vec<SemanticMatch>>>;

    /// Context concept labels for each word of a sentence.
    fn semantic_context_of_words(&self, sentence: &[String]) -> Result<Vec<Vec<String>>>;
}

impl<B: UmlsBackend + ?Sized> UmlsBackend for Arc<B> {
    fn cuis(&self, word: &str) -> Result<Vec<String>> {
        (**self).cuis(word)
    }

    fn semantic_types_of_word(&self, word: &str) -> Result<Vec<String>> {
        (**self).semantic_types_of_word(word)
    }

    fn semantic_types_of_sentence(&self, sentence: &[String]) -> Result<Vec<Vec<SemanticMatch>>> {
        (**self).semantic_types_of_sentence(sentence)
    }

    fn semantic_context_of_words(&self, sentence: &[String]) -> Result<Vec<Vec<String>>> {
        (**self).semantic_context_of_words(sentence)
    }
}
