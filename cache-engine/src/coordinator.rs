//! Cache coordinator
//!
//! The `Cache` type ties every subsystem together: the dictionary, TTL
//! manager, usage tracker, memory accounting, and the eviction candidate
//! pool. Every public operation funnels through a common path — bump the
//! operation counter, run passive expiration, enforce the memory budget,
//! and touch usage metadata on a successful read — before doing its
//! shape-specific work.

use cache_core::{Key, Member, Result, Score, Value};
use log::{debug, info};
use rand::seq::index::sample;
use std::time::Duration;

use crate::config::CacheConfig;
use crate::dict::Dict;
use crate::entry::Entry;
use crate::intset::MemberSet;
use crate::ordered_collection::OrderedCollection;
use crate::ttl::{now_millis, TtlManager};
use crate::usage::UsageTracker;

/// Running counters surfaced by [`Cache::get_stats`]
#[derive(Debug, Clone, Default)]
pub struct Stats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub operations: u64,
}

/// The full snapshot returned by [`Cache::get_stats`]
#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub operations: u64,
    pub key_count: usize,
    pub memory_used: usize,
    pub hit_rate: f64,
}

/// Remaining time-to-live for a key, distinguishing "no TTL" from "absent"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlStatus {
    /// The key carries a TTL with this many milliseconds remaining
    Remaining(u64),
    /// The key exists but never expires
    NoExpiry,
    /// The key does not exist
    Missing,
}

/// The in-process cache coordinator
pub struct Cache {
    config: CacheConfig,
    dict: Dict,
    ttl: TtlManager,
    usage: UsageTracker,
    stats: Stats,
    current_memory_used: usize,
    /// Worst-quality-first candidate queue, refilled by sampling when empty
    eviction_pool: Vec<Key>,
    shut_down: bool,
}

impl Cache {
    /// Creates a new cache. The coordinator itself never spawns threads:
    /// `run_active_expire_round` and `run_lfu_decay_round` are driven by
    /// the host (`cache-server` wraps `Cache` in `Arc<parking_lot::Mutex<_>>`
    /// and spawns the two [`BackgroundTimer`] loops against that lock),
    /// keeping the single-threaded cooperative model intact at this layer.
    pub fn new(config: CacheConfig) -> Self {
        let usage = UsageTracker::new(config.eviction_policy, config.lfu_decay_amount);
        Self {
            config,
            dict: Dict::new(),
            ttl: TtlManager::new(),
            usage,
            stats: Stats::default(),
            current_memory_used: 0,
            eviction_pool: Vec::new(),
            shut_down: false,
        }
    }

    /// Returns the configuration this cache was created with
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Runs one round of active TTL expiration, honoring the adaptive
    /// multi-round contract: a round repeats only if more than a quarter
    /// of the sampled keys were expired.
    pub fn run_active_expire_round(&mut self) {
        for _ in 0..self.config.active_expire_max_rounds {
            let sample_size = self.config.active_expire_sample_size;
            let mut expired_keys = Vec::new();
            let expired = self.ttl.sample_and_purge(sample_size, &mut |k| {
                expired_keys.push(k.to_string());
            });
            self.ttl.flush_pending_deletes(&mut |k| expired_keys.push(k.to_string()));

            for key in &expired_keys {
                self.delete_key(key);
                self.stats.expirations += 1;
            }

            if expired == 0 || (expired as f64) <= 0.25 * sample_size as f64 {
                break;
            }
        }
    }

    /// Runs one LFU decay sweep
    pub fn run_lfu_decay_round(&mut self) {
        self.usage.decay_sweep(Duration::from_millis(self.config.lfu_decay_interval_ms));
    }

    /// Removes `key` from the dictionary, TTL map, and usage tracker, and
    /// subtracts its memory. The single primitive every destruction path
    /// (explicit delete, TTL purge, eviction) converges on.
    fn delete_key(&mut self, key: &str) -> bool {
        match self.dict.remove(key) {
            Some(entry) => {
                let used = entry.memory_used(key.len());
                self.current_memory_used = self.current_memory_used.saturating_sub(used);
                self.ttl.delete(key);
                self.usage.delete(key);
                true
            }
            None => false,
        }
    }

    /// Passive expiration check: if `key` carries a past-due TTL, deletes it
    /// and returns `true`. Also runs the amortized lazy-expiration sweep
    /// every [`LAZY_EXPIRE_FREQ`] operations.
    fn check_expired(&mut self, key: &str) -> bool {
        let was_expired = self.ttl.is_expired(key);
        if was_expired {
            self.delete_key(key);
            self.stats.expirations += 1;
        }

        if self.stats.operations % self.config.lazy_expire_freq == 0 {
            let mut expired_keys = Vec::new();
            self.ttl.sample_and_purge(self.config.lazy_expire_sample_size, &mut |k| {
                expired_keys.push(k.to_string())
            });
            self.ttl.flush_pending_deletes(&mut |k| expired_keys.push(k.to_string()));
            for k in expired_keys {
                if self.delete_key(&k) {
                    self.stats.expirations += 1;
                }
            }
        }

        was_expired
    }

    fn begin_operation(&mut self) {
        self.stats.operations += 1;
    }

    /// Determines the eviction pool's target size from the current key count
    fn pool_cap(key_count: usize) -> usize {
        if key_count < 1_000 {
            8
        } else if key_count < 10_000 {
            16
        } else if key_count < 100_000 {
            32
        } else {
            64
        }
    }

    /// Refills the eviction pool by sampling without replacement and
    /// sorting by eviction quality, worst candidate first
    fn refill_eviction_pool(&mut self) {
        let key_count = self.dict.len();
        if key_count == 0 {
            return;
        }

        let pool_cap = Self::pool_cap(key_count);
        let sample_count = (2 * self.config.eviction_sample_size).min(key_count);

        let all_keys: Vec<&Key> = self.dict.keys().collect();
        let mut rng = rand::thread_rng();
        let indices = sample(&mut rng, all_keys.len(), sample_count);

        let mut candidates: Vec<Key> =
            indices.iter().map(|i| all_keys[i].clone()).collect();

        candidates.sort_by(|a, b| self.usage.compare_eviction_quality(a, b));
        candidates.truncate(pool_cap);
        self.eviction_pool = candidates;
    }

    /// Evicts entries while over the memory budget, sampling a fresh
    /// candidate pool when the current one runs dry
    fn evict_if_needed(&mut self) {
        while self.current_memory_used > self.config.maxmemory && !self.dict.is_empty() {
            if self.eviction_pool.is_empty() {
                self.refill_eviction_pool();
                if self.eviction_pool.is_empty() {
                    break;
                }
            }

            let victim = self.eviction_pool.remove(0);
            if self.dict.contains_key(&victim) {
                self.delete_key(&victim);
                self.stats.evictions += 1;
                debug!("evicted key under memory pressure");
            }
        }
    }

    fn account_new_entry(&mut self, key: &str, entry: &Entry) {
        self.current_memory_used += entry.memory_used(key.len());
    }

    // ---- scalar operations ----

    /// Writes a scalar entry, subtracting any prior entry's memory and
    /// replacing its TTL
    pub fn set(&mut self, key: Key, value: Value, ttl_ms: Option<u64>) {
        self.begin_operation();
        self.evict_if_needed();

        if let Some(prior) = self.dict.remove(&key) {
            let used = prior.memory_used(key.len());
            self.current_memory_used = self.current_memory_used.saturating_sub(used);
        }

        let entry = Entry::Scalar(value);
        self.account_new_entry(&key, &entry);

        match ttl_ms {
            Some(ms) => self.ttl.set(key.clone(), now_millis() + ms),
            None => self.ttl.delete(&key),
        }

        self.dict.insert(key, entry);
        self.evict_if_needed();
    }

    /// Reads a scalar value; `None` if missing or expired, `WrongType` if
    /// the entry is not a scalar
    pub fn get(&mut self, key: &str) -> Result<Option<Value>> {
        self.begin_operation();
        self.check_expired(key);

        match self.dict.get(key) {
            None => {
                self.stats.misses += 1;
                Ok(None)
            }
            Some(entry) => {
                let value = entry.as_scalar()?.clone();
                self.usage.touch(key);
                self.stats.hits += 1;
                Ok(Some(value))
            }
        }
    }

    /// Deletes `key`; returns `1` if it was present, `0` otherwise
    pub fn del(&mut self, key: &str) -> u64 {
        self.begin_operation();
        self.check_expired(key);
        u64::from(self.delete_key(key))
    }

    /// Whether a live (non-expired) entry is present, without touching
    /// hit/miss stats or usage metadata
    pub fn exists(&mut self, key: &str) -> bool {
        self.begin_operation();
        self.check_expired(key);
        self.dict.contains_key(key)
    }

    /// Remaining time-to-live for `key`
    pub fn ttl(&mut self, key: &str) -> TtlStatus {
        self.begin_operation();
        self.check_expired(key);

        if !self.dict.contains_key(key) {
            return TtlStatus::Missing;
        }
        match self.ttl.deadline_of(key) {
            Some(deadline) => TtlStatus::Remaining(deadline.saturating_sub(now_millis())),
            None => TtlStatus::NoExpiry,
        }
    }

    // ---- ordered collection operations ----

    fn get_or_create_ordered_collection(&mut self, key: &str) -> Result<()> {
        if self.dict.contains_key(key) {
            self.dict.get(key).expect("checked contains_key above").as_ordered_collection()?;
            return Ok(());
        }
        let entry = Entry::OrderedCollection(OrderedCollection::new());
        self.account_new_entry(key, &entry);
        self.dict.insert(key.to_string(), entry);
        Ok(())
    }

    /// Adds `member` with `score` to the ordered collection at `key`,
    /// creating it if absent; returns `1` if `member` was newly added
    pub fn zadd(&mut self, key: &str, score: Score, member: Member) -> Result<u64> {
        self.begin_operation();
        self.evict_if_needed();
        self.check_expired(key);

        self.get_or_create_ordered_collection(key)?;
        let entry = self.dict.get_mut(key).expect("just created or verified present");
        let oc = entry.as_ordered_collection_mut()?;

        let member_cost = member.len() * 2 + 80;
        let is_new = oc.add(member, score);
        if is_new {
            self.current_memory_used += member_cost;
        }

        self.evict_if_needed();
        Ok(u64::from(is_new))
    }

    /// Removes `member` from the ordered collection at `key`
    pub fn zrem(&mut self, key: &str, member: &str) -> Result<bool> {
        self.begin_operation();
        self.check_expired(key);

        let Some(entry) = self.dict.get_mut(key) else { return Ok(false) };
        let oc = entry.as_ordered_collection_mut()?;
        let member_cost = member.len() * 2 + 80;
        let removed = oc.remove(member);
        if removed {
            self.current_memory_used = self.current_memory_used.saturating_sub(member_cost);
        }
        Ok(removed)
    }

    /// Returns `member`'s score in the ordered collection at `key`
    pub fn zscore(&mut self, key: &str, member: &str) -> Result<Option<Score>> {
        self.begin_operation();
        self.check_expired(key);
        match self.dict.get(key) {
            None => Ok(None),
            Some(entry) => {
                let score = entry.as_ordered_collection()?.score(member);
                self.usage.touch(key);
                Ok(score)
            }
        }
    }

    /// Returns `member`'s 0-based ascending rank in the ordered collection at `key`
    pub fn zrank(&mut self, key: &str, member: &str) -> Result<Option<usize>> {
        self.begin_operation();
        self.check_expired(key);
        match self.dict.get(key) {
            None => Ok(None),
            Some(entry) => {
                let rank = entry.as_ordered_collection()?.rank(member);
                self.usage.touch(key);
                Ok(rank)
            }
        }
    }

    /// Returns `(member, score)` pairs with score in `[min, max]`, capped at `limit`
    pub fn zrange_by_score(
        &mut self,
        key: &str,
        min: Score,
        max: Score,
        limit: Option<usize>,
    ) -> Result<Vec<(String, Score)>> {
        self.begin_operation();
        self.check_expired(key);
        match self.dict.get(key) {
            None => Ok(Vec::new()),
            Some(entry) => {
                let items =
                    entry.as_ordered_collection()?.range_by_score(min, max, limit.unwrap_or(usize::MAX));
                self.usage.touch(key);
                Ok(items)
            }
        }
    }

    /// Returns `(member, score)` pairs in ascending order for ranks `[start, end]`
    pub fn zrange(&mut self, key: &str, start: i64, end: i64) -> Result<Vec<(String, Score)>> {
        self.begin_operation();
        self.check_expired(key);
        match self.dict.get(key) {
            None => Ok(Vec::new()),
            Some(entry) => {
                let items = entry.as_ordered_collection()?.range(start, end);
                self.usage.touch(key);
                Ok(items)
            }
        }
    }

    /// Returns `(member, score)` pairs in descending order for ranks `[start, end]`
    pub fn zrevrange(&mut self, key: &str, start: i64, end: i64) -> Result<Vec<(String, Score)>> {
        self.begin_operation();
        self.check_expired(key);
        match self.dict.get(key) {
            None => Ok(Vec::new()),
            Some(entry) => {
                let items = entry.as_ordered_collection()?.rev_range(start, end);
                self.usage.touch(key);
                Ok(items)
            }
        }
    }

    /// Cardinality of the ordered collection at `key`
    pub fn zcard(&mut self, key: &str) -> Result<usize> {
        self.begin_operation();
        self.check_expired(key);
        match self.dict.get(key) {
            None => Ok(0),
            Some(entry) => {
                let len = entry.as_ordered_collection()?.len();
                self.usage.touch(key);
                Ok(len)
            }
        }
    }

    /// Count of members with score in `[min, max]`
    pub fn zcount(&mut self, key: &str, min: Score, max: Score) -> Result<usize> {
        self.begin_operation();
        self.check_expired(key);
        match self.dict.get(key) {
            None => Ok(0),
            Some(entry) => {
                let count = entry.as_ordered_collection()?.count_in_range(min, max);
                self.usage.touch(key);
                Ok(count)
            }
        }
    }

    // ---- member set operations ----

    fn get_or_create_member_set(&mut self, key: &str) -> Result<()> {
        if self.dict.contains_key(key) {
            self.dict.get(key).expect("checked contains_key above").as_member_set()?;
            return Ok(());
        }
        let entry = Entry::MemberSet(MemberSet::new());
        self.account_new_entry(key, &entry);
        self.dict.insert(key.to_string(), entry);
        Ok(())
    }

    /// Adds each of `members` to the member set at `key`, creating it if
    /// absent; returns the count actually added
    pub fn sadd(&mut self, key: &str, members: Vec<Member>) -> Result<u64> {
        self.begin_operation();
        self.evict_if_needed();
        self.check_expired(key);

        self.get_or_create_member_set(key)?;
        let mut added = 0u64;

        for member in members {
            let entry = self.dict.get_mut(key).expect("just created or verified present");
            let set = entry.as_member_set_mut()?;
            let was_compact = set.is_compact();

            let inserted = set.add(member, self.config.intset_max_entries);
            if inserted {
                added += 1;
                let upgraded = was_compact && !set.is_compact();
                if upgraded {
                    // upgrading re-encodes every existing member from compact
                    // (8 bytes) to general (40 bytes) form; the exact
                    // recomputation is an approximation tolerated by the
                    // "approximate, not precise" memory contract.
                    self.current_memory_used += 40;
                } else if set.is_compact() {
                    self.current_memory_used += 8;
                } else {
                    self.current_memory_used += 40;
                }
            }
        }

        self.evict_if_needed();
        Ok(added)
    }

    /// Removes `member` from the member set at `key`
    pub fn srem(&mut self, key: &str, member: &str) -> Result<bool> {
        self.begin_operation();
        self.check_expired(key);
        let Some(entry) = self.dict.get_mut(key) else { return Ok(false) };
        let set = entry.as_member_set_mut()?;
        let per_member = if set.is_compact() { 8 } else { 40 };
        let removed = set.remove(member);
        if removed {
            self.current_memory_used = self.current_memory_used.saturating_sub(per_member);
        }
        Ok(removed)
    }

    /// Whether `member` belongs to the member set at `key`
    pub fn sismember(&mut self, key: &str, member: &str) -> Result<bool> {
        self.begin_operation();
        self.check_expired(key);
        match self.dict.get(key) {
            None => Ok(false),
            Some(entry) => {
                let present = entry.as_member_set()?.contains(member);
                self.usage.touch(key);
                Ok(present)
            }
        }
    }

    /// All members of the member set at `key`
    pub fn smembers(&mut self, key: &str) -> Result<Vec<String>> {
        self.begin_operation();
        self.check_expired(key);
        match self.dict.get(key) {
            None => Ok(Vec::new()),
            Some(entry) => {
                let members = entry.as_member_set()?.members();
                self.usage.touch(key);
                Ok(members)
            }
        }
    }

    /// Cardinality of the member set at `key`
    pub fn scard(&mut self, key: &str) -> Result<usize> {
        self.begin_operation();
        self.check_expired(key);
        match self.dict.get(key) {
            None => Ok(0),
            Some(entry) => {
                let len = entry.as_member_set()?.len();
                self.usage.touch(key);
                Ok(len)
            }
        }
    }

    // ---- lifecycle ----

    /// Returns the current stats snapshot
    pub fn get_stats(&self) -> StatsSnapshot {
        let total = self.stats.hits + self.stats.misses;
        let hit_rate = if total == 0 { 0.0 } else { self.stats.hits as f64 / total as f64 };
        StatsSnapshot {
            hits: self.stats.hits,
            misses: self.stats.misses,
            evictions: self.stats.evictions,
            expirations: self.stats.expirations,
            operations: self.stats.operations,
            key_count: self.dict.len(),
            memory_used: self.current_memory_used,
            hit_rate,
        }
    }

    /// Flushes TTL pending-deletes. Idempotent: the background timers
    /// themselves are owned and stopped by the host (see [`Cache::new`));
    /// the cache keeps answering synchronous reads/writes afterward, it
    /// simply does no more background work once the host stops driving it.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        let mut expired_keys = Vec::new();
        self.ttl.flush_pending_deletes(&mut |k| expired_keys.push(k.to_string()));
        for key in expired_keys {
            self.delete_key(&key);
        }
        self.shut_down = true;
        info!("cache shutdown complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> CacheConfig {
        CacheConfig { maxmemory: 1024 * 1024, ..Default::default() }
    }

    #[test]
    fn del_is_idempotent() {
        let mut cache = Cache::new(test_config());
        cache.set("k".into(), b"v".to_vec(), None);
        assert_eq!(cache.del("k"), 1);
        assert_eq!(cache.del("k"), 0);
    }

    #[test]
    fn exists_does_not_affect_hit_miss_stats() {
        let mut cache = Cache::new(test_config());
        cache.set("k".into(), b"v".to_vec(), None);
        let before = cache.get_stats();
        assert!(cache.exists("k"));
        let after = cache.get_stats();
        assert_eq!(before.hits, after.hits);
        assert_eq!(before.misses, after.misses);
    }

    #[test]
    fn stats_are_monotone_across_mixed_operations() {
        let mut cache = Cache::new(test_config());
        let mut prev = cache.get_stats();
        cache.set("a".into(), b"1".to_vec(), None);
        let _ = cache.get("a");
        let _ = cache.get("missing");
        cache.del("a");

        let now = cache.get_stats();
        assert!(now.operations >= prev.operations);
        assert!(now.hits >= prev.hits);
        assert!(now.misses >= prev.misses);
        prev = now;
        assert!(prev.operations > 0);
    }
}
