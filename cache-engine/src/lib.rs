//! Storage engine for the cache
//!
//! This crate implements the in-memory data structures and the
//! coordinator that together make up the cache core:
//!
//! - **Skip list** (`skiplist`): rank-indexed ordered storage
//! - **Ordered collection** (`ordered_collection`): skip list + score map, the zset type
//! - **Member set** (`intset`): compact integer encoding with upgrade to a general hash set
//! - **TTL manager** (`ttl`): passive and active expiration
//! - **Usage tracker** (`usage`): LRU/LFU metadata and eviction-quality ordering
//! - **Dictionary** (`dict`): incremental-rehash key→entry table
//! - **Coordinator** (`coordinator`): ties every subsystem together behind `Cache`
//!
//! # Architecture
//!
//! ```text
//! Write path:
//! Cache::set/zadd/sadd → evict_if_needed → dict.insert → ttl.set (optional) → usage.touch
//!
//! Read path:
//! Cache::get/zscore/sismember → check_expired → dict.get → usage.touch → value
//! ```
//!
//! # Example
//!
//! ```
//! use cache_engine::{Cache, CacheConfig};
//!
//! let mut cache = Cache::new(CacheConfig::default());
//! cache.set("greeting".to_string(), b"hello".to_vec(), None);
//! assert_eq!(cache.get("greeting").unwrap(), Some(b"hello".to_vec()));
//! ```

pub mod config;
pub mod coordinator;
pub mod dict;
pub mod entry;
pub mod intset;
pub mod ordered_collection;
pub mod skiplist;
pub mod ttl;
pub mod usage;

pub use config::CacheConfig;
pub use coordinator::{Cache, Stats, StatsSnapshot, TtlStatus};
pub use entry::Entry;
pub use intset::MemberSet;
pub use ordered_collection::OrderedCollection;
pub use ttl::BackgroundTimer;
