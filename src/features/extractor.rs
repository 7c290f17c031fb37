//! UmlsFeatures - word, sentence and chunk level UMLS features
//!
//! Word level:
//!
//! ```text
//! "aspirin" ─► get_cui               ─► ("umls_cui", C0004057)
//!           └► semantic_type_of_word ─► ("umls_semantic_type_word", phsu)
//! ```
//!
//! Chunk level adds the word features of every sub-word of the chunk, plus
//! the enabled sentence-wide concept features.

use std::sync::Arc;

use tracing::debug;

use super::map::{FeatureKind, FeatureMap};
use crate::cache::LookupCache;
use crate::config::{ConceptFeature, FeatureConfig};
use crate::error::{Result, UmlsError};
use crate::umls::{UmlsBackend, UmlsLookup};

/// Feature extractor over a UMLS backend and a lookup cache.
///
/// Holds no state of its own beyond the cache, so each call depends only on
/// its arguments and what the cache has already learned. Lookup failures are
/// returned to the caller untouched.
#[derive(Debug, Clone)]
pub struct UmlsFeatures {
    lookup: UmlsLookup,
    cache: Arc<LookupCache>,
    config: FeatureConfig,
}

impl UmlsFeatures {
    /// Create with default configuration and a fresh cache
    pub fn new(backend: Arc<dyn UmlsBackend>) -> Self {
        Self::with_config(backend, FeatureConfig::default())
    }

    /// Create with a fresh cache
    pub fn with_config(backend: Arc<dyn UmlsBackend>, config: FeatureConfig) -> Self {
        Self::with_cache(backend, config, Arc::new(LookupCache::new()))
    }

    /// Create around an existing cache (e.g. one seeded from a snapshot, or
    /// shared with other extractors)
    pub fn with_cache(
        backend: Arc<dyn UmlsBackend>,
        config: FeatureConfig,
        cache: Arc<LookupCache>,
    ) -> Self {
        let lookup = UmlsLookup::with_config(backend, config.lookup.clone());
        Self {
            lookup,
            cache,
            config,
        }
    }

    pub fn cache(&self) -> &Arc<LookupCache> {
        &self.cache
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// CUI and word-level semantic-type features for one word.
    ///
    /// Categories with no UMLS mapping contribute nothing.
    pub fn features_for_word(&self, word: &str) -> Result<FeatureMap> {
        let mut features = FeatureMap::new();

        for cui in self.lookup.get_cui(&self.cache, word)? {
            features.insert(FeatureKind::UmlsCui, cui);
        }

        for semantic_type in self.lookup.semantic_type_of_word(&self.cache, word)? {
            features.insert(FeatureKind::UmlsSemanticTypeWord, semantic_type);
        }

        Ok(features)
    }

    /// [`features_for_word`](Self::features_for_word) for each token, in order.
    pub fn features_for_sentence<S: AsRef<str>>(&self, sentence: &[S]) -> Result<Vec<FeatureMap>> {
        sentence
            .iter()
            .map(|word| self.features_for_word(word.as_ref()))
            .collect()
    }

    /// Per-token features for a prose sentence.
    pub fn iob_prose_features<S: AsRef<str>>(&self, sentence: &[S]) -> Result<Vec<FeatureMap>> {
        self.features_for_sentence(sentence)
    }

    /// Per-token features for a non-prose line (lists, headers, vitals).
    /// Same logic as prose.
    pub fn iob_nonprose_features<S: AsRef<str>>(&self, sentence: &[S]) -> Result<Vec<FeatureMap>> {
        self.features_for_sentence(sentence)
    }

    /// Features for the chunk at `index` of a chunked sentence.
    ///
    /// Word features of every whitespace-separated sub-word of the chunk, plus
    /// for each enabled concept feature:
    ///
    /// - `umls_semantic_type_sentence`: one feature per semantic type of the
    ///   sentence's largest matching substrings, or the null sentinel when
    ///   nothing in the sentence matched
    /// - `umls_semantic_type_context`: one feature per context label of any
    ///   word in the sentence; no sentinel when empty
    ///
    /// The two concept features are asymmetric about the sentinel. Downstream
    /// models are trained with this behaviour, so keep it unless they change.
    pub fn concept_features_for_chunk<S: AsRef<str>>(
        &self,
        sentence: &[S],
        index: usize,
    ) -> Result<FeatureMap> {
        let target: &str = sentence
            .get(index)
            .ok_or(UmlsError::ChunkIndexOutOfRange {
                index,
                len: sentence.len(),
            })?
            .as_ref();

        let mut features = FeatureMap::new();
        for word in target.split_whitespace() {
            features.merge(self.features_for_word(word)?);
        }

        for feature in &self.config.enabled_concept_features {
            match feature {
                ConceptFeature::SemanticTypeSentence => {
                    self.add_sentence_semantic_types(sentence, &mut features)?
                }
                ConceptFeature::SemanticTypeContext => {
                    self.add_semantic_context(sentence, &mut features)?
                }
            }
        }

        debug!(
            index,
            chunk = target,
            features = features.len(),
            "Computed UMLS chunk features"
        );
        Ok(features)
    }

    fn add_sentence_semantic_types<S: AsRef<str>>(
        &self,
        sentence: &[S],
        features: &mut FeatureMap,
    ) -> Result<()> {
        let spans = self.lookup.semantic_type_of_sentence(&self.cache, sentence)?;

        if spans.is_empty() {
            features.insert_null(FeatureKind::UmlsSemanticTypeSentence);
            return Ok(());
        }

        // Empty spans are skipped; they never produce the sentinel
        for span in spans.iter().filter(|span| !span.is_empty()) {
            for hit in span {
                features.insert(FeatureKind::UmlsSemanticTypeSentence, hit.semantic_type.as_str());
            }
        }
        Ok(())
    }

    fn add_semantic_context<S: AsRef<str>>(
        &self,
        sentence: &[S],
        features: &mut FeatureMap,
    ) -> Result<()> {
        let contexts = self.lookup.semantic_context_of_words(&self.cache, sentence)?;

        for label in contexts.iter().flatten() {
            features.insert(FeatureKind::UmlsSemanticTypeContext, label.as_str());
        }
        Ok(())
    }
}
