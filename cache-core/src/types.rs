//! Core types used throughout the cache
//!
//! This module contains the fundamental data types that form the basis
//! of the cache's data model and configuration.

use serde::{Deserialize, Serialize};

/// A key in the cache, represented as an owned string
pub type Key = String;

/// A scalar value stored in the cache, as an opaque byte string
pub type Value = Vec<u8>;

/// A member of an ordered collection or member set
pub type Member = String;

/// A numeric score associated with a member of an ordered collection
pub type Score = f64;

/// Milliseconds since the Unix epoch, used for TTL deadlines and usage timestamps
pub type MillisTimestamp = u64;

/// The eviction policy driving candidate selection when over the memory budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvictionPolicy {
    /// Approximate least-recently-used: evict the oldest `last_access`
    Lru,
    /// Approximate least-frequently-used: evict the smallest `freq`, ties broken by `last_access`
    Lfu,
}

/// The shape tag recorded on every cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueShape {
    /// An opaque scalar byte string
    Scalar,
    /// An ordered set of unique members, each with a numeric score
    OrderedCollection,
    /// An unordered set of unique members
    MemberSet,
}

/// The internal encoding of a `MemberSet` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetEncoding {
    /// A sorted array of integers, capped in size
    Compact,
    /// A general hash set of arbitrary string members
    General,
}
