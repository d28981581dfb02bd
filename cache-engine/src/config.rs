//! Configuration for the cache coordinator

use cache_core::EvictionPolicy;

/// Configuration options for the cache
///
/// This struct contains all tunable parameters for the coordinator, the TTL
/// subsystem, and the usage tracker.
///
/// # Example
///
/// ```
/// use cache_engine::CacheConfig;
/// use cache_core::EvictionPolicy;
///
/// let config = CacheConfig {
///     maxmemory: 64 * 1024 * 1024,
///     eviction_policy: EvictionPolicy::Lfu,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum approximate memory budget, in bytes
    pub maxmemory: usize,

    /// Candidate-selection policy used when evicting
    pub eviction_policy: EvictionPolicy,

    /// Number of keys independently sampled when refilling the eviction pool
    pub eviction_sample_size: usize,

    /// Operations between lazy (amortized) TTL sampling passes
    pub lazy_expire_freq: u64,

    /// Interval between active-expiration sweeps, in milliseconds
    pub active_expire_interval_ms: u64,

    /// Maximum adaptive rounds per active-expiration sweep
    pub active_expire_max_rounds: usize,

    /// Keys sampled per round of active expiration
    pub active_expire_sample_size: usize,

    /// Keys sampled per lazy (foreground) expiration pass
    pub lazy_expire_sample_size: usize,

    /// Interval between LFU decay sweeps, in milliseconds
    pub lfu_decay_interval_ms: u64,

    /// Amount subtracted from `freq` per decay sweep
    pub lfu_decay_amount: u8,

    /// Maximum size of the compact integer-set encoding before upgrading
    pub intset_max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            maxmemory: 64 * 1024 * 1024, // 64MB
            eviction_policy: EvictionPolicy::Lru,
            eviction_sample_size: 8,
            lazy_expire_freq: 100,
            active_expire_interval_ms: 200,
            active_expire_max_rounds: 2,
            active_expire_sample_size: 10,
            lazy_expire_sample_size: 5,
            lfu_decay_interval_ms: 60_000,
            lfu_decay_amount: 1,
            intset_max_entries: 512,
        }
    }
}
