//! Dictionary with incremental rehash
//!
//! The entry dictionary the coordinator owns migrates entry-by-entry
//! between two tables rather than rehashing in one large pass: the
//! simpler of the two shapes the design notes allow, a single old table
//! being drained into a fresh new table, a bounded number of entries at
//! a time, interleaved with normal operations so no single call pays for
//! a full-table rehash.

use cache_core::Key;
use hashbrown::HashMap;

use crate::entry::Entry;

/// Number of entries migrated from the old table per operation
const REHASH_BATCH: usize = 4;

/// Key→entry dictionary backed by two tables during migration
pub struct Dict {
    old: HashMap<Key, Entry>,
    new: HashMap<Key, Entry>,
    migrating: bool,
}

impl Default for Dict {
    fn default() -> Self {
        Self::new()
    }
}

impl Dict {
    /// Creates a new, empty dictionary
    pub fn new() -> Self {
        Self { old: HashMap::new(), new: HashMap::new(), migrating: false }
    }

    /// Total number of keys across both tables
    pub fn len(&self) -> usize {
        self.new.len() + self.old.len()
    }

    /// Whether the dictionary holds no keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Migrates up to [`REHASH_BATCH`] entries from the old table into the
    /// new one. A no-op once migration has finished.
    fn migrate_step(&mut self) {
        if !self.migrating {
            return;
        }
        for _ in 0..REHASH_BATCH {
            let Some(key) = self.old.keys().next().cloned() else { break };
            let entry = self.old.remove(&key).expect("key came from old.keys()");
            self.new.insert(key, entry);
        }
        if self.old.is_empty() {
            self.migrating = false;
        }
    }

    /// Starts a rehash if the new table has outgrown its allocated capacity
    /// and one is not already in progress
    fn maybe_start_rehash(&mut self) {
        if self.migrating {
            return;
        }
        if self.new.len() > self.new.capacity() {
            let fresh = HashMap::with_capacity((self.new.len() * 2).max(8));
            self.old = std::mem::replace(&mut self.new, fresh);
            self.migrating = true;
        }
    }

    /// Inserts or overwrites `key` with `entry`, returning the prior value if any
    pub fn insert(&mut self, key: Key, entry: Entry) -> Option<Entry> {
        self.migrate_step();
        self.maybe_start_rehash();

        let removed_from_old = if self.migrating { self.old.remove(&key) } else { None };
        let removed_from_new = self.new.insert(key, entry);
        removed_from_new.or(removed_from_old)
    }

    /// Looks up `key`, checking the new table first and falling back to the
    /// old table while a rehash is in progress
    pub fn get(&mut self, key: &str) -> Option<&Entry> {
        self.migrate_step();
        if self.new.contains_key(key) {
            self.new.get(key)
        } else if self.migrating {
            self.old.get(key)
        } else {
            None
        }
    }

    /// Mutably looks up `key`, same table-precedence rule as [`get`](Self::get)
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Entry> {
        self.migrate_step();
        if self.new.contains_key(key) {
            self.new.get_mut(key)
        } else if self.migrating {
            self.old.get_mut(key)
        } else {
            None
        }
    }

    /// Whether `key` exists in either table
    pub fn contains_key(&mut self, key: &str) -> bool {
        self.migrate_step();
        self.new.contains_key(key) || (self.migrating && self.old.contains_key(key))
    }

    /// Removes `key` from whichever table holds it
    pub fn remove(&mut self, key: &str) -> Option<Entry> {
        self.migrate_step();
        let from_new = self.new.remove(key);
        let from_old = if self.migrating { self.old.remove(key) } else { None };
        from_new.or(from_old)
    }

    /// Iterates all keys across both tables, used by the eviction sampler
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.new.keys().chain(self.old.keys())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(v: &str) -> Entry {
        Entry::Scalar(v.as_bytes().to_vec())
    }

    #[test]
    fn insert_and_get_roundtrip() {
        let mut dict = Dict::new();
        dict.insert("a".to_string(), scalar("1"));
        assert!(dict.contains_key("a"));
        assert!(matches!(dict.get("a"), Some(Entry::Scalar(_))));
    }

    #[test]
    fn remove_absent_key_returns_none() {
        let mut dict = Dict::new();
        assert!(dict.remove("ghost").is_none());
    }

    #[test]
    fn survives_growth_triggered_rehash() {
        let mut dict = Dict::new();
        for i in 0..500 {
            dict.insert(format!("k{i}"), scalar("v"));
        }
        assert_eq!(dict.len(), 500);
        for i in 0..500 {
            assert!(dict.contains_key(&format!("k{i}")), "missing k{i}");
        }
    }

    #[test]
    fn insert_overwrites_and_returns_prior_value_during_migration() {
        let mut dict = Dict::new();
        for i in 0..500 {
            dict.insert(format!("k{i}"), scalar("v"));
        }
        let prior = dict.insert("k0".to_string(), scalar("v2"));
        assert!(prior.is_some());
        assert_eq!(dict.len(), 500);
    }

    #[test]
    fn keys_iterates_every_entry_during_migration() {
        let mut dict = Dict::new();
        for i in 0..500 {
            dict.insert(format!("k{i}"), scalar("v"));
        }
        let seen: std::collections::HashSet<_> = dict.keys().cloned().collect();
        assert_eq!(seen.len(), 500);
    }
}
