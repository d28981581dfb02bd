//! Core types and error handling shared across the cache crates
//!
//! This crate contains the fundamental types used throughout the cache
//! workspace. It provides:
//!
//! - Common error types with [`Error`] and [`Result`]
//! - Basic data types like [`Key`], [`Value`], [`Member`], and [`Score`]
//! - Shared enums: [`EvictionPolicy`], [`ValueShape`], [`SetEncoding`]
//!
//! # Example
//!
//! ```
//! use cache_core::{Key, Value, Member, Score};
//!
//! let key: Key = "user:123".to_string();
//! let value: Value = b"John Doe".to_vec();
//! let member: Member = "alice".to_string();
//! let score: Score = 1.0;
//! ```

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
