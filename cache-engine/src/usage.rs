//! Usage tracker
//!
//! Records, per key, the metadata the eviction engine needs to rank
//! candidates: an approximate last-access timestamp for LRU, and a
//! probabilistic, byte-sized frequency counter for LFU. The LFU counter
//! is incremented with probability `1 / (1 + freq)`, the same
//! diminishing-probability trick used to approximate logarithmic
//! frequency counting in a single byte; a periodic decay loop ages it
//! back down so that a shifting working set is not stuck behind keys
//! that were merely hot in the past.

use crate::ttl::now_millis;
use cache_core::{EvictionPolicy, Key, MillisTimestamp};
use hashbrown::HashMap;
use rand::Rng;

/// Per-key usage metadata
#[derive(Debug, Clone, Copy)]
pub struct UsageMeta {
    pub last_access: MillisTimestamp,
    pub freq: u8,
    pub last_decay: MillisTimestamp,
}

impl UsageMeta {
    fn new(now: MillisTimestamp) -> Self {
        Self { last_access: now, freq: 0, last_decay: now }
    }
}

/// Tracks last-access and frequency metadata for every live key
pub struct UsageTracker {
    policy: EvictionPolicy,
    decay_amount: u8,
    meta: HashMap<Key, UsageMeta>,
}

impl UsageTracker {
    /// Creates a tracker under the given eviction policy and per-sweep decay amount
    pub fn new(policy: EvictionPolicy, decay_amount: u8) -> Self {
        Self { policy, decay_amount, meta: HashMap::new() }
    }

    /// Records an access to `key`, initializing its metadata if absent.
    ///
    /// Under the LFU policy, `freq` is incremented with probability
    /// `1 / (1 + freq)`, capped at 255.
    pub fn touch(&mut self, key: &str) {
        let now = now_millis();
        let entry = self
            .meta
            .entry_ref(key)
            .or_insert_with(|| UsageMeta::new(now));
        entry.last_access = now;

        if self.policy == EvictionPolicy::Lfu && entry.freq < 255 {
            let probability = 1.0 / (1.0 + entry.freq as f64);
            if rand::thread_rng().gen_bool(probability) {
                entry.freq += 1;
            }
        }
    }

    /// Drops `key`'s metadata
    pub fn delete(&mut self, key: &str) {
        self.meta.remove(key);
    }

    /// Returns `key`'s metadata, if tracked
    pub fn get(&self, key: &str) -> Option<UsageMeta> {
        self.meta.get(key).copied()
    }

    /// Number of keys currently tracked
    pub fn len(&self) -> usize {
        self.meta.len()
    }

    /// Whether no keys are currently tracked
    pub fn is_empty(&self) -> bool {
        self.meta.is_empty()
    }

    /// Runs one LFU decay sweep: every entry whose `last_decay` is at least
    /// `decay_interval` old has its `freq` reduced by `decay_amount`
    /// (floored at 0) and `last_decay` reset to now. A no-op under LRU.
    pub fn decay_sweep(&mut self, decay_interval: std::time::Duration) {
        if self.policy != EvictionPolicy::Lfu {
            return;
        }
        let now = now_millis();
        let interval_ms = decay_interval.as_millis() as MillisTimestamp;

        for entry in self.meta.values_mut() {
            if now.saturating_sub(entry.last_decay) >= interval_ms {
                entry.freq = entry.freq.saturating_sub(self.decay_amount);
                entry.last_decay = now;
            }
        }
    }

    /// Orders `key` by eviction quality against `other`: `Less` means `key`
    /// is a worse-quality (better eviction candidate, evicted first) key
    /// than `other`. Keys with no tracked metadata are treated as the best
    /// possible eviction candidates (oldest/least-used).
    pub fn compare_eviction_quality(&self, key: &str, other: &str) -> std::cmp::Ordering {
        let a = self.get(key);
        let b = self.get(other);

        match self.policy {
            EvictionPolicy::Lru => {
                let a_access = a.map(|m| m.last_access).unwrap_or(0);
                let b_access = b.map(|m| m.last_access).unwrap_or(0);
                a_access.cmp(&b_access)
            }
            EvictionPolicy::Lfu => {
                let a_freq = a.map(|m| m.freq).unwrap_or(0);
                let b_freq = b.map(|m| m.freq).unwrap_or(0);
                a_freq.cmp(&b_freq).then_with(|| {
                    let a_access = a.map(|m| m.last_access).unwrap_or(0);
                    let b_access = b.map(|m| m.last_access).unwrap_or(0);
                    a_access.cmp(&b_access)
                })
            }
        }
    }
}
