//! Entry: the value a key maps to, tagged by shape
//!
//! Every key in the dictionary maps to exactly one [`Entry`], whose variant
//! fixes its shape for its whole lifetime: a key never silently changes
//! shape under a write to the wrong operation family. Operations that
//! expect one shape and find another fail with [`cache_core::Error::WrongType`]
//! rather than coercing or overwriting.

use crate::intset::MemberSet;
use crate::ordered_collection::OrderedCollection;
use cache_core::{Error, Result, Value, ValueShape};

/// The value half of a dictionary entry
#[derive(Debug, Clone)]
pub enum Entry {
    /// An opaque scalar byte string
    Scalar(Value),
    /// An ordered, score-ranked collection of members
    OrderedCollection(OrderedCollection),
    /// An unordered set of unique members
    MemberSet(MemberSet),
}

impl Entry {
    /// The shape tag for this entry
    pub fn shape(&self) -> ValueShape {
        match self {
            Entry::Scalar(_) => ValueShape::Scalar,
            Entry::OrderedCollection(_) => ValueShape::OrderedCollection,
            Entry::MemberSet(_) => ValueShape::MemberSet,
        }
    }

    /// Borrows the scalar value, or fails with `WrongType`
    pub fn as_scalar(&self) -> Result<&Value> {
        match self {
            Entry::Scalar(value) => Ok(value),
            _ => Err(Error::WrongType),
        }
    }

    /// Borrows the ordered collection, or fails with `WrongType`
    pub fn as_ordered_collection(&self) -> Result<&OrderedCollection> {
        match self {
            Entry::OrderedCollection(oc) => Ok(oc),
            _ => Err(Error::WrongType),
        }
    }

    /// Mutably borrows the ordered collection, or fails with `WrongType`
    pub fn as_ordered_collection_mut(&mut self) -> Result<&mut OrderedCollection> {
        match self {
            Entry::OrderedCollection(oc) => Ok(oc),
            _ => Err(Error::WrongType),
        }
    }

    /// Borrows the member set, or fails with `WrongType`
    pub fn as_member_set(&self) -> Result<&MemberSet> {
        match self {
            Entry::MemberSet(set) => Ok(set),
            _ => Err(Error::WrongType),
        }
    }

    /// Mutably borrows the member set, or fails with `WrongType`
    pub fn as_member_set_mut(&mut self) -> Result<&mut MemberSet> {
        match self {
            Entry::MemberSet(set) => Ok(set),
            _ => Err(Error::WrongType),
        }
    }

    /// Approximate in-memory footprint of this entry's value, given its key length.
    ///
    /// Mirrors the per-shape accounting formulas the coordinator uses
    /// incrementally on zadd/zrem/sadd/srem, so that destroying an entry
    /// (via delete, TTL purge, or eviction) subtracts exactly what was
    /// added: scalar entries count key and value bytes doubled plus a
    /// fixed overhead; ordered-collection members count their own name
    /// length; member-set members count a flat per-member cost that
    /// depends on encoding.
    pub fn memory_used(&self, key_len: usize) -> usize {
        let key_cost = key_len * 2;
        match self {
            Entry::Scalar(value) => key_cost + value.len() * 2 + 48,
            Entry::OrderedCollection(oc) => {
                let members_cost: usize = oc.iter().map(|(member, _)| member.len() * 2 + 80).sum();
                key_cost + members_cost
            }
            Entry::MemberSet(set) => {
                let per_member = if set.is_compact() { 8 } else { 40 };
                key_cost + set.len() * per_member
            }
        }
    }
}
