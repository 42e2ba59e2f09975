//! Cache + Checkpoint (spec.md §4.7): memoizes a segment's processing
//! result by its content-derived cache key so that a repeat `project()`
//! call with `forceRecalculation=false` over an unchanged prefix of the
//! horizon can skip reprocessing it. Grounded on the Trellis actuarial
//! system's `reserves/cache.rs` (`ReserveCache`: hash map + hit/miss
//! counters + eviction) generalized from one fixed-shape struct to the
//! segment processor's `ActivityLog` + balance/interest snapshot.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::balance_tracker::InterestState;
use crate::model::{AccountId, ConsolidatedActivity};

/// Everything the Engine Orchestrator needs to replay a segment without
/// rerunning the Segment Processor: the activities it emitted and the
/// balance/interest state it left accounts in (spec.md §4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedSegmentResult {
    pub new_activities: FxHashMap<AccountId, Vec<ConsolidatedActivity>>,
    pub ending_balances: FxHashMap<AccountId, f64>,
    pub ending_interest_states: FxHashMap<AccountId, InterestState>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    data: CachedSegmentResult,
    created_at_millis: i64,
    expires_at_millis: Option<i64>,
    size_bytes: usize,
}

/// Rough serialized-size estimate used for the byte budget, computed once
/// at insert time rather than re-measured on every eviction check.
fn estimate_size(result: &CachedSegmentResult) -> usize {
    let activity_count: usize = result.new_activities.values().map(Vec::len).sum();
    // ConsolidatedActivity carries several Strings/Options; 256 bytes/entry
    // is a deliberately coarse stand-in for a real `size_of_val` walk.
    activity_count * 256
        + result.ending_balances.len() * 24
        + result.ending_interest_states.len() * 32
}

/// In-memory segment cache, keyed by the segment's spec.md §4.7 content
/// hash, with LRU eviction against a byte budget and an optional
/// write-through disk tier (spec.md §4.7, §6 "cache persistence").
pub struct SegmentCache {
    entries: FxHashMap<String, CacheEntry>,
    lru_order: VecDeque<String>,
    byte_budget: usize,
    bytes_used: usize,
    hits: u64,
    misses: u64,
    disk: Option<DiskCache>,
}

impl SegmentCache {
    #[must_use]
    pub fn new(byte_budget: usize) -> Self {
        Self {
            entries: FxHashMap::default(),
            lru_order: VecDeque::new(),
            byte_budget,
            bytes_used: 0,
            hits: 0,
            misses: 0,
            disk: None,
        }
    }

    #[must_use]
    pub fn with_disk(mut self, disk: DiskCache) -> Self {
        self.disk = Some(disk);
        self
    }

    /// Look up by cache key. Consults the disk tier on an in-memory miss
    /// so a fresh process can still benefit from a prior run's cache
    /// (spec.md §4.7).
    pub fn get(&mut self, key: &str, now_millis: i64) -> Option<CachedSegmentResult> {
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at_millis.is_some_and(|exp| now_millis >= exp) {
                self.remove(key);
            } else {
                self.touch(key);
                self.hits += 1;
                return Some(self.entries[key].data.clone());
            }
        }
        if let Some(disk) = &self.disk {
            if let Some((data, expires_at_millis)) = disk.load(key) {
                if expires_at_millis.is_some_and(|exp| now_millis >= exp) {
                    self.misses += 1;
                    return None;
                }
                self.insert_with_expiry(key.to_string(), data.clone(), now_millis, expires_at_millis);
                self.hits += 1;
                return Some(data);
            }
        }
        self.misses += 1;
        None
    }

    pub fn insert(&mut self, key: String, data: CachedSegmentResult, now_millis: i64, ttl_millis: Option<i64>) {
        let expires_at_millis = ttl_millis.map(|ttl| now_millis + ttl);
        self.insert_with_expiry(key, data, now_millis, expires_at_millis);
    }

    fn insert_with_expiry(
        &mut self,
        key: String,
        data: CachedSegmentResult,
        now_millis: i64,
        expires_at_millis: Option<i64>,
    ) {
        if let Some(disk) = &self.disk {
            disk.store(&key, &data, now_millis, expires_at_millis);
        }
        let size_bytes = estimate_size(&data);
        if let Some(old) = self.entries.remove(&key) {
            self.bytes_used -= old.size_bytes;
            self.lru_order.retain(|k| k != &key);
        }
        self.entries.insert(key.clone(), CacheEntry { data, created_at_millis: now_millis, expires_at_millis, size_bytes });
        self.bytes_used += size_bytes;
        self.lru_order.push_back(key);
        self.evict_to_budget();
    }

    fn evict_to_budget(&mut self) {
        while self.bytes_used > self.byte_budget {
            let Some(oldest) = self.lru_order.pop_front() else { break };
            if let Some(entry) = self.entries.remove(&oldest) {
                self.bytes_used -= entry.size_bytes;
            }
        }
    }

    fn touch(&mut self, key: &str) {
        self.lru_order.retain(|k| k != key);
        self.lru_order.push_back(key.to_string());
    }

    pub fn remove(&mut self, key: &str) {
        if let Some(entry) = self.entries.remove(key) {
            self.bytes_used -= entry.size_bytes;
        }
        self.lru_order.retain(|k| k != key);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru_order.clear();
        self.bytes_used = 0;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 { 0.0 } else { self.hits as f64 / total as f64 }
    }

    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses
    }
}

/// The on-disk tier of the segment cache: one JSON file per key under
/// `directory`, `{ data, timestamp, expiresAt }` shaped (spec.md §6).
/// Read/write failures are swallowed — a disk cache is an optimization,
/// never a correctness dependency.
pub struct DiskCache {
    directory: PathBuf,
}

#[derive(Serialize, Deserialize)]
struct DiskCacheRecord {
    data: CachedSegmentResult,
    timestamp: i64,
    #[serde(rename = "expiresAt")]
    expires_at: Option<i64>,
}

impl DiskCache {
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self { directory: directory.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let sanitized: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.directory.join(format!("{sanitized}.json"))
    }

    fn load(&self, key: &str) -> Option<(CachedSegmentResult, Option<i64>)> {
        let path = self.path_for(key);
        let bytes = std::fs::read(path).ok()?;
        let record: DiskCacheRecord = serde_json::from_slice(&bytes).ok()?;
        Some((record.data, record.expires_at))
    }

    fn store(&self, key: &str, data: &CachedSegmentResult, now_millis: i64, expires_at: Option<i64>) {
        let record = DiskCacheRecord { data: data.clone(), timestamp: now_millis, expires_at };
        let Ok(bytes) = serde_json::to_vec(&record) else { return };
        if std::fs::create_dir_all(&self.directory).is_err() {
            return;
        }
        let _ = std::fs::write(self.path_for(key), bytes);
    }

    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}
