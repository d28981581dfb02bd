//! Error types for the cache
//!
//! This module defines the error types used throughout the cache crates.

use thiserror::Error;

/// The main error type for cache operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The operation targeted an entry whose value shape does not match
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    /// A request argument failed validation before reaching the coordinator
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A cache invariant was violated; indicates a bug rather than bad input
    #[error("internal invariant violation: {0}")]
    Internal(String),
}

/// A specialized Result type for cache operations
pub type Result<T> = std::result::Result<T, Error>;
