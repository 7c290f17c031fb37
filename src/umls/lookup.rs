//! Cache-checked UMLS queries
//!
//! Each operation builds a [`LookupKey`] from normalized text, then asks the
//! cache for it. The backend is only called on a miss, and it is called with
//! exactly the normalized text the key was built from, so a cached answer is
//! always the answer to the query its key names.

use std::sync::Arc;

use super::{collapse_whitespace, SemanticMatch, UmlsBackend};
use crate::cache::{LookupCache, LookupKey, LookupKind, LookupValue};
use crate::config::LookupConfig;
use crate::error::{Result, UmlsError};

/// The four UMLS query operations, memoized through a [`LookupCache`]
#[derive(Clone)]
pub struct UmlsLookup {
    backend: Arc<dyn UmlsBackend>,
    config: LookupConfig,
}

impl UmlsLookup {
    /// Create with default key normalization (case preserved)
    pub fn new(backend: Arc<dyn UmlsBackend>) -> Self {
        Self::with_config(backend, LookupConfig::default())
    }

    pub fn with_config(backend: Arc<dyn UmlsBackend>, config: LookupConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    /// Concept identifiers for a single word.
    pub fn get_cui(&self, cache: &LookupCache, word: &str) -> Result<Vec<String>> {
        let text = self.normalize(word);
        let key = LookupKey::word(LookupKind::Cui, text.as_str());
        let value = cache.get_or_fetch(&key, || {
            self.backend.cuis(&text).map(LookupValue::Labels)
        })?;
        value
            .as_labels()
            .map(<[String]>::to_vec)
            .ok_or_else(|| unexpected_shape(&key))
    }

    /// Semantic-type labels for a single word in isolation.
    pub fn semantic_type_of_word(&self, cache: &LookupCache, word: &str) -> Result<Vec<String>> {
        let text = self.normalize(word);
        let key = LookupKey::word(LookupKind::SemanticTypeWord, text.as_str());
        let value = cache.get_or_fetch(&key, || {
            self.backend
                .semantic_types_of_word(&text)
                .map(LookupValue::Labels)
        })?;
        value
            .as_labels()
            .map(<[String]>::to_vec)
            .ok_or_else(|| unexpected_shape(&key))
    }

    /// Semantic types of the largest matching substring(s) of a sentence.
    pub fn semantic_type_of_sentence<S: AsRef<str>>(
        &self,
        cache: &LookupCache,
        sentence: &[S],
    ) -> Result<Vec<Vec<SemanticMatch>>> {
        let tokens = self.normalize_all(sentence);
        let key = LookupKey::sentence(LookupKind::SemanticTypeSentence, tokens.as_slice());
        let value = cache.get_or_fetch(&key, || {
            self.backend
                .semantic_types_of_sentence(&tokens)
                .map(LookupValue::Matches)
        })?;
        value
            .as_matches()
            .map(<[Vec<SemanticMatch>]>::to_vec)
            .ok_or_else(|| unexpected_shape(&key))
    }

    /// Context concept labels for each word of a sentence.
    pub fn semantic_context_of_words<S: AsRef<str>>(
        &self,
        cache: &LookupCache,
        sentence: &[S],
    ) -> Result<Vec<Vec<String>>> {
        let tokens = self.normalize_all(sentence);
        let key = LookupKey::sentence(LookupKind::SemanticContext, tokens.as_slice());
        let value = cache.get_or_fetch(&key, || {
            self.backend
                .semantic_context_of_words(&tokens)
                .map(LookupValue::Contexts)
        })?;
        value
            .as_contexts()
            .map(<[Vec<String>]>::to_vec)
            .ok_or_else(|| unexpected_shape(&key))
    }

    fn normalize(&self, text: &str) -> String {
        let collapsed = collapse_whitespace(text);
        if self.config.lowercase_keys {
            collapsed.to_lowercase()
        } else {
            collapsed
        }
    }

    fn normalize_all<S: AsRef<str>>(&self, sentence: &[S]) -> Vec<String> {
        sentence.iter().map(|s| self.normalize(s.as_ref())).collect()
    }
}

impl std::fmt::Debug for UmlsLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UmlsLookup")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// A value stored under `key` is not the shape that key's kind produces.
/// Only reachable through a hand-built or corrupted snapshot.
fn unexpected_shape(key: &LookupKey) -> UmlsError {
    UmlsError::lookup_failure(
        key.kind,
        key.display_text(),
        "cached value has unexpected shape",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheSnapshot, SNAPSHOT_VERSION};
    use crate::umls::StaticUmlsBackend;

    fn backend() -> Arc<dyn UmlsBackend> {
        Arc::new(
            StaticUmlsBackend::new()
                .with_term("aspirin", &["C0004057"], &["phsu", "orch"])
                .with_term("chest pain", &["C0008031"], &["sosy"]),
        )
    }

    /// Answers every query with the text it was asked about
    struct EchoBackend;

    impl UmlsBackend for EchoBackend {
        fn cuis(&self, word: &str) -> Result<Vec<String>> {
            Ok(vec![word.to_string()])
        }

        fn semantic_types_of_word(&self, word: &str) -> Result<Vec<String>> {
            Ok(vec![word.to_string()])
        }

        fn semantic_types_of_sentence(&self, sentence: &[String]) -> Result<Vec<Vec<SemanticMatch>>> {
            Ok(sentence
                .iter()
                .map(|token| vec![SemanticMatch::new(token.as_str(), None, token.as_str())])
                .collect())
        }

        fn semantic_context_of_words(&self, sentence: &[String]) -> Result<Vec<Vec<String>>> {
            Ok(sentence.iter().map(|token| vec![token.clone()]).collect())
        }
    }

    #[test]
    fn test_get_cui_populates_cache() {
        let lookup = UmlsLookup::new(backend());
        let cache = LookupCache::new();

        let cuis = lookup.get_cui(&cache, "aspirin").unwrap();
        assert_eq!(cuis, vec!["C0004057"]);
        assert!(cache.contains(&LookupKey::word(LookupKind::Cui, "aspirin")));
    }

    #[test]
    fn test_whitespace_is_normalized_in_keys() {
        let lookup = UmlsLookup::new(backend());
        let cache = LookupCache::new();

        lookup.semantic_type_of_word(&cache, " aspirin ").unwrap();
        lookup.semantic_type_of_word(&cache, "aspirin").unwrap();

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_case_preserved_by_default() {
        let lookup = UmlsLookup::new(backend());
        let cache = LookupCache::new();

        lookup.get_cui(&cache, "Aspirin").unwrap();
        lookup.get_cui(&cache, "aspirin").unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_lowercase_keys_share_entries() {
        let lookup = UmlsLookup::with_config(
            backend(),
            LookupConfig {
                lowercase_keys: true,
            },
        );
        let cache = LookupCache::new();

        let upper = lookup.get_cui(&cache, "ASPIRIN").unwrap();
        let lower = lookup.get_cui(&cache, "aspirin").unwrap();
        assert_eq!(upper, lower);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_sentence_queries_use_separate_kinds() {
        let lookup = UmlsLookup::new(backend());
        let cache = LookupCache::new();
        let sentence = ["chest", "pain", "today"];

        let matches = lookup.semantic_type_of_sentence(&cache, &sentence).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0][0].semantic_type, "sosy");

        let contexts = lookup.semantic_context_of_words(&cache, &sentence).unwrap();
        assert_eq!(contexts.len(), 3);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_sentences_with_shared_text_get_their_own_answers() {
        let lookup = UmlsLookup::new(Arc::new(EchoBackend));
        let cache = LookupCache::new();

        let pair = lookup.semantic_context_of_words(&cache, &["a", "b"]).unwrap();
        let single = lookup.semantic_context_of_words(&cache, &["a\u{1f}b"]).unwrap();

        assert_eq!(pair, vec![vec!["a".to_string()], vec!["b".to_string()]]);
        assert_eq!(single, vec![vec!["a\u{1f}b".to_string()]]);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_empty_sentence_and_blank_token_are_separate_queries() {
        let lookup = UmlsLookup::new(Arc::new(EchoBackend));
        let cache = LookupCache::new();
        let none: [&str; 0] = [];

        let empty = lookup.semantic_type_of_sentence(&cache, &none).unwrap();
        // Whitespace-only tokens normalize to "" but still count as a token
        let blank = lookup.semantic_type_of_sentence(&cache, &[" "]).unwrap();

        assert!(empty.is_empty());
        assert_eq!(blank.len(), 1);
        assert_eq!(blank[0][0].span, "");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_mismatched_snapshot_value_is_an_error() {
        let key = LookupKey::word(LookupKind::Cui, "aspirin");
        let cache = LookupCache::from_snapshot(CacheSnapshot {
            version: SNAPSHOT_VERSION,
            entries: vec![(key, LookupValue::Contexts(vec![]))],
        })
        .unwrap();
        let lookup = UmlsLookup::new(backend());

        let err = lookup.get_cui(&cache, "aspirin").unwrap_err();
        assert!(err.to_string().contains("unexpected shape"));
    }
}
