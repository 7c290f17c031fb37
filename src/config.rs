//! Feature extraction configuration
//!
//! Defines the serde schema for the UMLS feature YAML file:
//!
//! ```yaml
//! enabled_concept_features:
//!   - umls_semantic_type_sentence
//!   - umls_semantic_type_context
//! lookup:
//!   lowercase_keys: false
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::UmlsError;

/// Chunk-level features computed over the whole sentence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConceptFeature {
    /// Semantic types of the largest matching substring(s) of the sentence
    #[serde(rename = "umls_semantic_type_sentence")]
    SemanticTypeSentence,

    /// Semantic context of each word of the sentence
    #[serde(rename = "umls_semantic_type_context", alias = "umls_semantic_context")]
    SemanticTypeContext,
}

impl ConceptFeature {
    pub const ALL: [ConceptFeature; 2] = [
        ConceptFeature::SemanticTypeSentence,
        ConceptFeature::SemanticTypeContext,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConceptFeature::SemanticTypeSentence => "umls_semantic_type_sentence",
            ConceptFeature::SemanticTypeContext => "umls_semantic_type_context",
        }
    }
}

impl fmt::Display for ConceptFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConceptFeature {
    type Err = UmlsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "umls_semantic_type_sentence" => Ok(ConceptFeature::SemanticTypeSentence),
            "umls_semantic_type_context" | "umls_semantic_context" => {
                Ok(ConceptFeature::SemanticTypeContext)
            }
            other => Err(UmlsError::Config(format!(
                "unknown concept feature '{other}'"
            ))),
        }
    }
}

/// How lookup text is turned into cache keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Lowercase text before keying and querying, so "Fever" and "fever"
    /// share one cache entry and one backend query
    #[serde(default)]
    pub lowercase_keys: bool,
}

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Concept features added by `concept_features_for_chunk`
    #[serde(default = "default_concept_features")]
    pub enabled_concept_features: BTreeSet<ConceptFeature>,

    #[serde(default)]
    pub lookup: LookupConfig,
}

fn default_concept_features() -> BTreeSet<ConceptFeature> {
    ConceptFeature::ALL.into_iter().collect()
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            enabled_concept_features: default_concept_features(),
            lookup: LookupConfig::default(),
        }
    }
}

impl FeatureConfig {
    /// Configuration enabling exactly the named concept features
    pub fn with_features<I, S>(names: I) -> Result<Self, UmlsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let enabled_concept_features = names
            .into_iter()
            .map(|name| name.as_ref().parse::<ConceptFeature>())
            .collect::<Result<BTreeSet<_>, UmlsError>>()?;

        Ok(Self {
            enabled_concept_features,
            lookup: LookupConfig::default(),
        })
    }

    pub fn is_enabled(&self, feature: ConceptFeature) -> bool {
        self.enabled_concept_features.contains(&feature)
    }

    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read feature config {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Load configuration from YAML string (for testing)
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let config: FeatureConfig =
            serde_yaml::from_str(yaml).context("Failed to parse feature config")?;
        Ok(config)
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn test_load_config() {
        let yaml = r#"
enabled_concept_features:
  - umls_semantic_type_sentence
lookup:
  lowercase_keys: true
"#;
        let config = FeatureConfig::from_yaml(yaml).unwrap();
        assert!(config.is_enabled(ConceptFeature::SemanticTypeSentence));
        assert!(!config.is_enabled(ConceptFeature::SemanticTypeContext));
        assert!(config.lookup.lowercase_keys);
    }

    #[test]
    fn test_defaults() {
        let config = FeatureConfig::from_yaml("{}").unwrap();
        assert_eq!(config, FeatureConfig::default());
        assert_eq!(config.enabled_concept_features.len(), 2);
        assert!(!config.lookup.lowercase_keys);
    }

    #[test]
    fn test_legacy_context_name() {
        let yaml = "enabled_concept_features: [umls_semantic_context]";
        let config = FeatureConfig::from_yaml(yaml).unwrap();
        assert!(config.is_enabled(ConceptFeature::SemanticTypeContext));
        assert_eq!(config.enabled_concept_features.len(), 1);
    }

    #[test]
    fn test_unknown_feature_rejected() {
        let yaml = "enabled_concept_features: [umls_semantic_type_paragraph]";
        assert!(FeatureConfig::from_yaml(yaml).is_err());

        let err = FeatureConfig::with_features(["umls_semantic_type_paragraph"]).unwrap_err();
        assert!(matches!(err, UmlsError::Config(_)));
    }

    #[test]
    fn test_with_features() {
        let config = FeatureConfig::with_features(["umls_semantic_type_sentence"]).unwrap();
        assert!(config.is_enabled(ConceptFeature::SemanticTypeSentence));
        assert!(!config.is_enabled(ConceptFeature::SemanticTypeContext));

        let none = FeatureConfig::with_features(Vec::<String>::new()).unwrap();
        assert!(none.enabled_concept_features.is_empty());
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/umls_features.yaml");
        let config = FeatureConfig::load(path).unwrap();
        assert_eq!(config, FeatureConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("umls_features.yaml");
        std::fs::write(&path, "lookup:\n  lowercase_keys: true\n").unwrap();

        let config = FeatureConfig::load(&path).unwrap();
        assert!(config.lookup.lowercase_keys);
        assert_eq!(config.enabled_concept_features.len(), 2);
    }
}
