use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};

use crate::broker::snapshot::NormalizedState;
use crate::broker::topic::TopicKey;

/// The most recent snapshot for one topic.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: TopicKey,
    pub state: Arc<NormalizedState>,
    pub updated_at: DateTime<Utc>,
}

/// Last-known-good snapshot per topic, used to replay state to late joiners.
///
/// Each key is written only by its own poller and read by the subscription
/// path. Entries are replaced wholesale and never evicted; the key space is
/// bounded by the configured leagues.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    entries: RwLock<HashMap<TopicKey, CacheEntry>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &TopicKey) -> Option<CacheEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Replaces the entry for `key` and returns the entry now stored.
    pub fn put(&self, key: TopicKey, state: NormalizedState) -> CacheEntry {
        let entry = CacheEntry {
            key: key.clone(),
            state: Arc::new(state),
            updated_at: Utc::now(),
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, entry.clone());
        entry
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
