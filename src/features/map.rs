//! Sparse binary feature maps
//!
//! A feature is a `(kind, value)` pair with weight 1. The value is `None` only
//! for the "queried the sentence, found no concept" sentinel.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::config::ConceptFeature;

/// Weight of every present feature
pub const PRESENCE: u8 = 1;

/// Feature families produced by the extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    UmlsCui,
    UmlsSemanticTypeWord,
    UmlsSemanticTypeSentence,
    UmlsSemanticTypeContext,
}

impl FeatureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureKind::UmlsCui => "umls_cui",
            FeatureKind::UmlsSemanticTypeWord => "umls_semantic_type_word",
            FeatureKind::UmlsSemanticTypeSentence => "umls_semantic_type_sentence",
            FeatureKind::UmlsSemanticTypeContext => "umls_semantic_type_context",
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ConceptFeature> for FeatureKind {
    fn from(feature: ConceptFeature) -> Self {
        match feature {
            ConceptFeature::SemanticTypeSentence => FeatureKind::UmlsSemanticTypeSentence,
            ConceptFeature::SemanticTypeContext => FeatureKind::UmlsSemanticTypeContext,
        }
    }
}

/// Composite feature key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureKey {
    pub kind: FeatureKind,
    pub value: Option<String>,
}

impl FeatureKey {
    pub fn new(kind: FeatureKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: Some(value.into()),
        }
    }

    /// Key with no value (the sentinel form)
    pub fn null(kind: FeatureKind) -> Self {
        Self { kind, value: None }
    }
}

/// Renders as `kind=value`, or just `kind` for a null value
impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}={}", self.kind, value),
            None => f.write_str(self.kind.as_str()),
        }
    }
}

/// Sparse indicator vector for one token or span.
///
/// Backed by a `BTreeMap` so iteration (and serialization) order is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureMap {
    features: BTreeMap<FeatureKey, u8>,
}

impl FeatureMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `(kind, value) → 1`
    pub fn insert(&mut self, kind: FeatureKind, value: impl Into<String>) {
        self.insert_key(FeatureKey::new(kind, value));
    }

    /// Set `(kind, null) → 1`
    pub fn insert_null(&mut self, kind: FeatureKind) {
        self.insert_key(FeatureKey::null(kind));
    }

    pub fn insert_key(&mut self, key: FeatureKey) {
        self.features.insert(key, PRESENCE);
    }

    /// Add every feature of `other`. Keys present in both stay at weight 1.
    pub fn merge(&mut self, other: FeatureMap) {
        self.features.extend(other.features);
    }

    pub fn contains(&self, kind: FeatureKind, value: Option<&str>) -> bool {
        self.features.contains_key(&FeatureKey {
            kind,
            value: value.map(str::to_string),
        })
    }

    pub fn get(&self, key: &FeatureKey) -> Option<u8> {
        self.features.get(key).copied()
    }

    /// Non-null values present for `kind`, in sorted order
    pub fn values_of(&self, kind: FeatureKind) -> Vec<&str> {
        self.features
            .keys()
            .filter(|key| key.kind == kind)
            .filter_map(|key| key.value.as_deref())
            .collect()
    }

    pub fn has_kind(&self, kind: FeatureKind) -> bool {
        self.features.keys().any(|key| key.kind == kind)
    }

    pub fn keys(&self) -> impl Iterator<Item = &FeatureKey> {
        self.features.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FeatureKey, u8)> {
        self.features.iter().map(|(key, weight)| (key, *weight))
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// String feature names (`kind=value`) for name-based vectorizers
    pub fn feature_names(&self) -> Vec<String> {
        self.features.keys().map(ToString::to_string).collect()
    }
}

impl FromIterator<FeatureKey> for FeatureMap {
    fn from_iter<I: IntoIterator<Item = FeatureKey>>(iter: I) -> Self {
        let mut map = FeatureMap::new();
        map.extend(iter);
        map
    }
}

impl Extend<FeatureKey> for FeatureMap {
    fn extend<I: IntoIterator<Item = FeatureKey>>(&mut self, iter: I) {
        for key in iter {
            self.insert_key(key);
        }
    }
}

/// Serializes as `{ "kind=value": 1, ... }`
impl Serialize for FeatureMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.features.len()))?;
        for (key, weight) in &self.features {
            map.serialize_entry(&key.to_string(), weight)?;
        }
        map.end()
    }
}
