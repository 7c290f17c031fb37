//! UMLS features for IOB tagging
//!
//! - [`FeatureMap`]: sparse `(kind, value) → 1` indicator vector
//! - [`UmlsFeatures`]: builds feature maps for words, sentences and chunks

pub mod extractor;
pub mod map;

pub use extractor::UmlsFeatures;
pub use map::{FeatureKey, FeatureKind, FeatureMap, PRESENCE};
