//! In-memory lookup cache with per-key once-only fetches

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::snapshot::{CacheSnapshot, SNAPSHOT_VERSION};
use super::{LookupKey, LookupValue};
use crate::error::Result;

/// One cache slot. Empty until a fetch for its key succeeds.
type Slot = Arc<OnceCell<LookupValue>>;

/// Memoizing store for UMLS query results.
///
/// The index lock is only held long enough to find or create a key's slot;
/// the fetch itself runs under the slot's own `OnceCell`, so concurrent
/// callers for the same key wait on one in-flight fetch while other keys
/// proceed independently.
#[derive(Default)]
pub struct LookupCache {
    slots: Mutex<HashMap<LookupKey, Slot>>,
    hits: AtomicU64,
    misses: AtomicU64,
    failures: AtomicU64,
}

/// Cache counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Keys holding a value
    pub entries: usize,
    /// Lookups answered without calling the backend
    pub hits: u64,
    /// Backend fetches attempted (including failed ones)
    pub misses: u64,
    /// Backend fetches that returned an error
    pub failures: u64,
}

impl LookupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cache pre-populated from a snapshot.
    ///
    /// Loaded entries are served as hits; the backend is never asked for them.
    /// Fails on a snapshot whose version differs from [`SNAPSHOT_VERSION`].
    pub fn from_snapshot(snapshot: CacheSnapshot) -> anyhow::Result<Self> {
        snapshot.check_version()?;

        let slots = snapshot
            .entries
            .into_iter()
            .map(|(key, value)| (key, Arc::new(OnceCell::with_value(value))))
            .collect();

        Ok(Self {
            slots: Mutex::new(slots),
            ..Self::default()
        })
    }

    /// Return the cached value for `key`, or run `fetch` once and store its result.
    ///
    /// A failed fetch leaves nothing behind: the error is returned and the next
    /// call for the same key fetches again.
    pub fn get_or_fetch<F>(&self, key: &LookupKey, fetch: F) -> Result<LookupValue>
    where
        F: FnOnce() -> Result<LookupValue>,
    {
        let slot = self.slot(key);

        if let Some(value) = slot.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(kind = %key.kind, text = %key.display_text(), "UMLS cache hit");
            return Ok(value.clone());
        }

        let mut fetched = false;
        let outcome = slot.get_or_try_init(|| {
            fetched = true;
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!(kind = %key.kind, text = %key.display_text(), "UMLS cache miss, querying backend");
            fetch()
        });

        match outcome {
            Ok(value) => {
                // Another caller finished the fetch while we waited on the slot
                if !fetched {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                }
                Ok(value.clone())
            }
            Err(err) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                self.discard_if_unused(key, &slot);
                warn!(kind = %key.kind, text = %key.display_text(), error = %err, "UMLS lookup failed, not cached");
                Err(err)
            }
        }
    }

    /// Cached value for `key`, without fetching
    pub fn get(&self, key: &LookupKey) -> Option<LookupValue> {
        self.lock_slots()
            .get(key)
            .and_then(|slot| slot.get().cloned())
    }

    pub fn contains(&self, key: &LookupKey) -> bool {
        self.get(key).is_some()
    }

    /// Number of keys holding a value
    pub fn len(&self) -> usize {
        self.lock_slots()
            .values()
            .filter(|slot| slot.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }

    /// Capture every populated entry, sorted by key
    pub fn snapshot(&self) -> CacheSnapshot {
        let mut entries: Vec<(LookupKey, LookupValue)> = self
            .lock_slots()
            .iter()
            .filter_map(|(key, slot)| slot.get().map(|value| (key.clone(), value.clone())))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        CacheSnapshot {
            version: SNAPSHOT_VERSION,
            entries,
        }
    }

    fn slot(&self, key: &LookupKey) -> Slot {
        let mut slots = self.lock_slots();
        if let Some(slot) = slots.get(key) {
            return Arc::clone(slot);
        }
        let slot: Slot = Arc::new(OnceCell::new());
        slots.insert(key.clone(), Arc::clone(&slot));
        slot
    }

    /// Drop an empty slot after a failed fetch.
    ///
    /// Clones of a slot are only handed out under the index lock, so a strong
    /// count of two (the map's and ours) means no other caller is waiting on it.
    /// Waiting callers keep the slot alive and retry the fetch themselves.
    fn discard_if_unused(&self, key: &LookupKey, slot: &Slot) {
        let mut slots = self.lock_slots();
        let unused = slots.get(key).is_some_and(|current| {
            Arc::ptr_eq(current, slot) && current.get().is_none() && Arc::strong_count(slot) == 2
        });
        if unused {
            slots.remove(key);
        }
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.lock_slots().len()
    }

    fn lock_slots(&self) -> std::sync::MutexGuard<'_, HashMap<LookupKey, Slot>> {
        // Each update is a single insert or remove, so a panic elsewhere cannot leave the map inconsistent
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for LookupCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupCache")
            .field("stats", &self.stats())
            .finish()
    }
}
