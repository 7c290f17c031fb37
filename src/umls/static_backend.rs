//! In-memory UMLS backend over a fixed term table
//!
//! Terms are single words or multi-word phrases, matched case-insensitively
//! on whitespace-normalized text. Sentence queries use longest-match
//! semantics:
//!
//! - sentence semantic types: scan left to right, at each position take the
//!   longest known phrase (up to `max_phrase_words`), then continue after it
//! - word context: for each word, the longest known phrase covering it
//!
//! ```text
//! "patient denies chest pain"
//!                 └────┬───┘
//!                  "chest pain" → sosy (C0008031)
//! ```

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use super::{collapse_whitespace, SemanticMatch, UmlsBackend};
use crate::error::Result;

/// Longest phrase considered when the table does not say otherwise
const DEFAULT_MAX_PHRASE_WORDS: usize = 6;

fn default_max_phrase_words() -> usize {
    DEFAULT_MAX_PHRASE_WORDS
}

/// UMLS data for one term
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermEntry {
    #[serde(default)]
    pub cuis: Vec<String>,

    #[serde(default)]
    pub semantic_types: Vec<String>,
}

/// Term table backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticUmlsBackend {
    /// Longest phrase (in words) tried during sentence matching
    #[serde(default = "default_max_phrase_words")]
    max_phrase_words: usize,

    /// Normalized term → UMLS data
    #[serde(default)]
    terms: HashMap<String, TermEntry>,
}

impl Default for StaticUmlsBackend {
    fn default() -> Self {
        Self {
            max_phrase_words: DEFAULT_MAX_PHRASE_WORDS,
            terms: HashMap::new(),
        }
    }
}

impl StaticUmlsBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a term
    pub fn with_term(mut self, term: &str, cuis: &[&str], semantic_types: &[&str]) -> Self {
        self.insert(
            term,
            TermEntry {
                cuis: cuis.iter().map(|s| s.to_string()).collect(),
                semantic_types: semantic_types.iter().map(|s| s.to_string()).collect(),
            },
        );
        self
    }

    pub fn with_max_phrase_words(mut self, max_phrase_words: usize) -> Self {
        self.max_phrase_words = max_phrase_words.max(1);
        self
    }

    pub fn insert(&mut self, term: &str, entry: TermEntry) {
        self.terms.insert(Self::normalize(term), entry);
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Load a term table from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read term table {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Load a term table from a YAML string
    ///
    /// ```
    /// use umls_features::StaticUmlsBackend;
    ///
    /// let backend = StaticUmlsBackend::from_yaml(r#"
    /// terms:
    ///   aspirin:
    ///     cuis: [C0004057]
    ///     semantic_types: [phsu]
    /// "#).unwrap();
    /// assert_eq!(backend.term_count(), 1);
    /// ```
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let raw: StaticUmlsBackend =
            serde_yaml::from_str(yaml).context("Failed to parse term table")?;

        // Re-key so hand-written tables may use any casing or spacing
        let mut backend = Self::new().with_max_phrase_words(raw.max_phrase_words);
        for (term, entry) in raw.terms {
            backend.insert(&term, entry);
        }
        Ok(backend)
    }

    fn normalize(text: &str) -> String {
        collapse_whitespace(text).to_lowercase()
    }

    fn entry(&self, text: &str) -> Option<&TermEntry> {
        self.terms.get(&Self::normalize(text))
    }

    /// Entry for `words[start..start + len]` if it carries semantic types
    fn typed_phrase(&self, words: &[&str], start: usize, len: usize) -> Option<(String, &TermEntry)> {
        let phrase = words[start..start + len].join(" ");
        self.entry(&phrase)
            .filter(|entry| !entry.semantic_types.is_empty())
            .map(|entry| (phrase, entry))
    }

    /// Spans may hold several words; sentence matching works on single words
    fn flatten(sentence: &[String]) -> Vec<&str> {
        sentence
            .iter()
            .flat_map(|span| span.split_whitespace())
            .collect()
    }
}

impl UmlsBackend for StaticUmlsBackend {
    fn cuis(&self, word: &str) -> Result<Vec<String>> {
        Ok(self
            .entry(word)
            .map(|entry| entry.cuis.clone())
            .unwrap_or_default())
    }

    fn semantic_types_of_word(&self, word: &str) -> Result<Vec<String>> {
        Ok(self
            .entry(word)
            .map(|entry| entry.semantic_types.clone())
            .unwrap_or_default())
    }

    fn semantic_types_of_sentence(&self, sentence: &[String]) -> Result<Vec<Vec<SemanticMatch>>> {
        let words = Self::flatten(sentence);
        let mut spans: Vec<Vec<SemanticMatch>> = Vec::new();
        let mut start = 0;

        while start < words.len() {
            let longest = self.max_phrase_words.min(words.len() - start);
            let found = (1..=longest)
                .rev()
                .find_map(|len| self.typed_phrase(&words, start, len).map(|hit| (len, hit)));

            match found {
                Some((len, (phrase, entry))) => {
                    let cui = entry.cuis.first().map(String::as_str);
                    spans.push(
                        entry
                            .semantic_types
                            .iter()
                            .map(|sty| SemanticMatch::new(sty.as_str(), cui, phrase.as_str()))
                            .collect(),
                    );
                    start += len;
                }
                None => start += 1,
            }
        }

        Ok(spans)
    }

    fn semantic_context_of_words(&self, sentence: &[String]) -> Result<Vec<Vec<String>>> {
        let words = Self::flatten(sentence);

        let contexts: Vec<Vec<String>> = (0..words.len())
            .map(|position| {
                let longest = self.max_phrase_words.min(words.len());
                (1..=longest)
                    .rev()
                    .find_map(|len| {
                        // Every window of `len` words that covers `position`
                        let first = (position + 1).saturating_sub(len);
                        let last = position.min(words.len() - len);
                        (first..=last).find_map(|start| self.typed_phrase(&words, start, len))
                    })
                    .map(|(_, entry)| entry.semantic_types.clone())
                    .unwrap_or_default()
            })
            .collect();

        Ok(contexts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence(words: &[&str]) -> Vec<String> {
        words.iter().map(|s| s.to_string()).collect()
    }

    fn backend() -> StaticUmlsBackend {
        StaticUmlsBackend::new()
            .with_term("chest", &["C0817096"], &["blor"])
            .with_term("pain", &["C0030193"], &["sosy"])
            .with_term("chest pain", &["C0008031"], &["sosy"])
            .with_term("aspirin", &["C0004057"], &["phsu", "orch"])
            .with_term("the", &[], &[])
    }

    #[test]
    fn test_word_lookups_are_case_insensitive() {
        let backend = backend();
        assert_eq!(backend.cuis("Aspirin").unwrap(), vec!["C0004057"]);
        assert_eq!(
            backend.semantic_types_of_word("ASPIRIN").unwrap(),
            vec!["phsu", "orch"]
        );
        assert!(backend.cuis("unknown").unwrap().is_empty());
    }

    #[test]
    fn test_sentence_prefers_longest_phrase() {
        let backend = backend();
        let spans = backend
            .semantic_types_of_sentence(&sentence(&["denies", "chest", "pain", "after", "aspirin"]))
            .unwrap();

        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0], vec![SemanticMatch::new("sosy", Some("C0008031"), "chest pain")]);
        assert_eq!(spans[1].len(), 2);
        assert_eq!(spans[1][0].span, "aspirin");
    }

    #[test]
    fn test_sentence_without_matches_is_empty() {
        let backend = backend();
        let spans = backend
            .semantic_types_of_sentence(&sentence(&["no", "matches", "here"]))
            .unwrap();
        assert!(spans.is_empty());
    }

    #[test]
    fn test_untyped_terms_do_not_match_spans() {
        let backend = backend();
        let spans = backend.semantic_types_of_sentence(&sentence(&["the"])).unwrap();
        assert!(spans.is_empty());
    }

    #[test]
    fn test_multi_word_spans_are_flattened() {
        let backend = backend();
        let spans = backend
            .semantic_types_of_sentence(&sentence(&["severe", "chest pain"]))
            .unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0][0].span, "chest pain");
    }

    #[test]
    fn test_context_uses_largest_covering_phrase() {
        let backend = backend();
        let contexts = backend
            .semantic_context_of_words(&sentence(&["no", "chest", "pain"]))
            .unwrap();

        assert_eq!(contexts.len(), 3);
        assert!(contexts[0].is_empty());
        // "chest" alone is blor, but it sits inside "chest pain"
        assert_eq!(contexts[1], vec!["sosy"]);
        assert_eq!(contexts[2], vec!["sosy"]);
    }

    #[test]
    fn test_max_phrase_words_limits_matching() {
        let backend = backend().with_max_phrase_words(1);
        let contexts = backend
            .semantic_context_of_words(&sentence(&["chest", "pain"]))
            .unwrap();
        assert_eq!(contexts[0], vec!["blor"]);
    }

    #[test]
    fn test_from_yaml_normalizes_terms() {
        let backend = StaticUmlsBackend::from_yaml(
            r#"
max_phrase_words: 3
terms:
  "Chest   Pain":
    cuis: [C0008031]
    semantic_types: [sosy]
  fever:
    cuis: [C0015967]
"#,
        )
        .unwrap();

        assert_eq!(backend.term_count(), 2);
        assert_eq!(backend.cuis("chest pain").unwrap(), vec!["C0008031"]);
        assert!(backend.semantic_types_of_word("fever").unwrap().is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terms.yaml");
        std::fs::write(&path, "terms:\n  aspirin:\n    cuis: [C0004057]\n").unwrap();

        let backend = StaticUmlsBackend::load(&path).unwrap();
        assert_eq!(backend.cuis("aspirin").unwrap(), vec!["C0004057"]);
    }
}
