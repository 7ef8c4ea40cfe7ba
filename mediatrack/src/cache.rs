//! Query result cache
//!
//! Read results are cached per query key for a short freshness window.
//! Every mutation declares the keys it makes stale; the service
//! invalidates exactly those keys after the write commits.
//!
//! Readers take a [`QueryCache::generation`] before querying storage and
//! hand it back on insert. An invalidation in between bumps the generation
//! and the insert is dropped, so a result read before a write cannot
//! outlive that write's invalidation.

use crate::database::{Category, EntryDetail, EntrySummary};
use crate::services::progress::GroupedEntries;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Identifies one cached query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// Grouped home-screen listing
    AllEntries,
    Favorites,
    Categories,
    /// Detail screen of one entry (entry, category, parts, progress)
    EntryDetail(String),
}

/// A cached query result
#[derive(Debug, Clone)]
pub enum CachedQuery {
    Grouped(GroupedEntries),
    Summaries(Vec<EntrySummary>),
    Categories(Vec<Category>),
    Detail(Box<EntryDetail>),
}

/// Writes and the cache keys they invalidate
#[derive(Debug, Clone, Copy)]
pub enum Mutation<'a> {
    CreateEntry,
    UpdateEntry { entry_id: &'a str },
    UpdatePart { entry_id: &'a str },
}

impl Mutation<'_> {
    pub fn invalidation_keys(&self) -> Vec<QueryKey> {
        match self {
            Mutation::CreateEntry => vec![QueryKey::AllEntries, QueryKey::Categories],
            Mutation::UpdateEntry { entry_id } | Mutation::UpdatePart { entry_id } => vec![
                QueryKey::EntryDetail(entry_id.to_string()),
                QueryKey::AllEntries,
                QueryKey::Favorites,
            ],
        }
    }
}

/// Shared query cache; clones see the same entries
#[derive(Clone)]
pub struct QueryCache {
    entries: Arc<RwLock<HashMap<QueryKey, (Instant, CachedQuery)>>>,
    /// Bumped by every invalidation
    generation: Arc<AtomicU64>,
    freshness: Duration,
}

impl QueryCache {
    pub fn new(freshness: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            generation: Arc::new(AtomicU64::new(0)),
            freshness,
        }
    }

    /// Fresh cached value for `key`. Stale values are evicted.
    pub async fn get(&self, key: &QueryKey) -> Option<CachedQuery> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some((stored_at, value)) if stored_at.elapsed() < self.freshness => {
                    tracing::debug!("Cache hit: {:?}", key);
                    return Some(value.clone());
                }
                Some(_) => {}
                None => {
                    tracing::debug!("Cache miss: {:?}", key);
                    return None;
                }
            }
        }

        tracing::debug!("Cache entry stale: {:?}", key);
        self.entries.write().await.remove(key);
        None
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Store `value` read at `generation`.
    ///
    /// Returns false and stores nothing when an invalidation happened since.
    pub async fn insert(&self, key: QueryKey, value: CachedQuery, generation: u64) -> bool {
        let mut entries = self.entries.write().await;
        if self.generation() != generation {
            tracing::debug!("Discarding result invalidated during read: {:?}", key);
            return false;
        }

        entries.insert(key, (Instant::now(), value));
        true
    }

    /// Drop exactly the given keys
    pub async fn invalidate(&self, keys: &[QueryKey]) {
        let mut entries = self.entries.write().await;
        self.generation.fetch_add(1, Ordering::AcqRel);
        for key in keys {
            if entries.remove(key).is_some() {
                tracing::debug!("Invalidated cache key: {:?}", key);
            }
        }
    }

    pub async fn contains(&self, key: &QueryKey) -> bool {
        self.entries.read().await.contains_key(key)
    }
}
