//! UMLS Feature Extraction
//!
//! Builds sparse indicator features for clinical text from UMLS concept
//! identifiers (CUIs) and semantic types. The features feed an IOB
//! sequence-labeling model; every lookup goes through a memoizing cache so a
//! word or sentence is only ever sent to the UMLS backend once per run.
//!
//! # Architecture
//!
//! ```text
//! Sentence / chunked spans
//!       │
//!       ▼
//! ┌─────────────────────────────────────────┐
//! │  UmlsFeatures                           │
//! │  word → ("umls_cui", C0004057) = 1      │
//! │  chunk → + sentence / context types     │
//! └─────────────────────────────────────────┘
//!       │
//!       ▼
//! ┌─────────────────────────────────────────┐
//! │  UmlsLookup (4 cached query kinds)      │
//! └─────────────────────────────────────────┘
//!       │
//!       ├─── Cache hit ───► Return stored value
//!       │
//!       ▼
//! ┌─────────────────────────────────────────┐
//! │  LookupCache::get_or_fetch              │
//! │  at most one fetch per key, errors are  │
//! │  never stored                           │
//! └─────────────────────────────────────────┘
//!       │
//!       ▼
//! ┌─────────────────────────────────────────┐
//! │  UmlsBackend (database, static table)   │
//! └─────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod features;
pub mod umls;

pub use cache::{CacheSnapshot, CacheStats, LookupCache, LookupKey, LookupKind, LookupValue};
pub use config::{ConceptFeature, FeatureConfig, LookupConfig};
pub use error::{Result, UmlsError};
pub use features::{FeatureKey, FeatureKind, FeatureMap, UmlsFeatures};
pub use umls::{SemanticMatch, StaticUmlsBackend, UmlsBackend, UmlsLookup};
