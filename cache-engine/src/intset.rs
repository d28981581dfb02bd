//! Member sets: compact integer encoding with upgrade to a general hash set
//!
//! A member set starts out `Compact`: a sorted `Vec<i64>`, cheap to store
//! and scan for the small, all-integer sets that dominate real workloads.
//! The moment a non-integer member is added, or the set grows past
//! `intset_max_entries`, it upgrades irreversibly to `General`, a plain
//! hash set of strings. Callers interact with [`MemberSet`] without caring
//! which encoding is active.

use ahash::AHashSet;
use cache_core::Member;

/// An unordered set of unique members, transparently encoded as a compact
/// sorted integer array or a general string hash set
#[derive(Debug, Clone)]
pub enum MemberSet {
    /// Sorted, deduplicated array of integers
    Compact(Vec<i64>),
    /// General string hash set
    General(AHashSet<Member>),
}

impl MemberSet {
    /// Creates a new, empty member set in the compact encoding
    pub fn new() -> Self {
        MemberSet::Compact(Vec::new())
    }

    /// Number of members
    pub fn len(&self) -> usize {
        match self {
            MemberSet::Compact(v) => v.len(),
            MemberSet::General(s) => s.len(),
        }
    }

    /// Whether the set has no members
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this set is currently compact-encoded
    pub fn is_compact(&self) -> bool {
        matches!(self, MemberSet::Compact(_))
    }

    /// Adds `member`, upgrading to the general encoding first if `member`
    /// is not an integer or the compact set has reached `max_compact_entries`.
    ///
    /// Returns `true` if `member` was newly added.
    pub fn add(&mut self, member: Member, max_compact_entries: usize) -> bool {
        if let MemberSet::Compact(entries) = self {
            let as_int = member.parse::<i64>().ok();

            if let Some(value) = as_int {
                match entries.binary_search(&value) {
                    Ok(_) => return false,
                    Err(pos) if entries.len() < max_compact_entries => {
                        entries.insert(pos, value);
                        return true;
                    }
                    Err(_) => {}
                }
            }

            self.upgrade_to_general();
        }

        match self {
            MemberSet::General(set) => set.insert(member),
            MemberSet::Compact(_) => unreachable!("upgraded above"),
        }
    }

    /// Removes `member`; returns `true` if it was present
    pub fn remove(&mut self, member: &str) -> bool {
        match self {
            MemberSet::Compact(entries) => match member.parse::<i64>() {
                Ok(value) => match entries.binary_search(&value) {
                    Ok(pos) => {
                        entries.remove(pos);
                        true
                    }
                    Err(_) => false,
                },
                Err(_) => false,
            },
            MemberSet::General(set) => set.remove(member),
        }
    }

    /// Whether `member` is present
    pub fn contains(&self, member: &str) -> bool {
        match self {
            MemberSet::Compact(entries) => match member.parse::<i64>() {
                Ok(value) => entries.binary_search(&value).is_ok(),
                Err(_) => false,
            },
            MemberSet::General(set) => set.contains(member),
        }
    }

    /// Forces an irreversible upgrade to the general encoding
    fn upgrade_to_general(&mut self) {
        if let MemberSet::Compact(entries) = self {
            let upgraded: AHashSet<Member> = entries.iter().map(|n| n.to_string()).collect();
            *self = MemberSet::General(upgraded);
        }
    }

    /// Returns all members as owned strings, in the set's native iteration order
    pub fn members(&self) -> Vec<String> {
        match self {
            MemberSet::Compact(entries) => entries.iter().map(|n| n.to_string()).collect(),
            MemberSet::General(set) => set.iter().cloned().collect(),
        }
    }
}

impl Default for MemberSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_compact_for_integer_members() {
        let mut set = MemberSet::new();
        set.add("3".into(), 512);
        set.add("1".into(), 512);
        set.add("2".into(), 512);
        assert!(set.is_compact());
        assert_eq!(set.members(), vec!["1", "2", "3"]);
    }

    #[test]
    fn upgrades_on_non_integer_member() {
        let mut set = MemberSet::new();
        set.add("1".into(), 512);
        set.add("hello".into(), 512);
        assert!(!set.is_compact());
        assert!(set.contains("1"));
        assert!(set.contains("hello"));
    }

    #[test]
    fn upgrades_when_compact_cap_exceeded() {
        let mut set = MemberSet::new();
        for i in 0..4 {
            set.add(i.to_string(), 4);
        }
        assert!(set.is_compact());
        set.add("4".into(), 4);
        assert!(!set.is_compact());
        assert_eq!(set.len(), 5);
    }

    #[test]
    fn add_reports_duplicates() {
        let mut set = MemberSet::new();
        assert!(set.add("7".into(), 512));
        assert!(!set.add("7".into(), 512));
    }

    #[test]
    fn remove_works_in_both_encodings() {
        let mut set = MemberSet::new();
        set.add("1".into(), 512);
        set.add("2".into(), 512);
        assert!(set.remove("1"));
        assert!(!set.remove("1"));

        set.add("not-a-number".into(), 512);
        assert!(set.remove("not-a-number"));
    }
}
