//! Ordered collections (sorted sets)
//!
//! An [`OrderedCollection`] pairs a [`SkipList`], which gives rank and
//! range queries, with a member-to-score hash map, which gives O(1) score
//! lookups and duplicate detection. The two structures are kept in
//! lockstep by every mutating method; [`OrderedCollection::verify_invariants`]
//! cross-checks them in debug builds.

use crate::skiplist::SkipList;
use ahash::AHashMap;
use cache_core::{Member, Score};

/// An ordered set of unique members, each carrying a numeric score
#[derive(Debug, Clone)]
pub struct OrderedCollection {
    scores: AHashMap<Member, Score>,
    skiplist: SkipList,
}

impl Default for OrderedCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderedCollection {
    /// Creates a new, empty ordered collection
    pub fn new() -> Self {
        Self { scores: AHashMap::new(), skiplist: SkipList::new() }
    }

    /// Number of members in the collection
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Whether the collection has no members
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Inserts or updates `member` with `score`.
    ///
    /// Returns `true` if `member` was newly added, `false` if it already
    /// existed and its score was updated.
    pub fn add(&mut self, member: Member, score: Score) -> bool {
        match self.scores.get(&member).copied() {
            Some(old_score) => {
                if (old_score - score).abs() > f64::EPSILON {
                    self.skiplist.delete(old_score, &member);
                    self.skiplist.insert(score, member.clone());
                }
                self.scores.insert(member, score);
                false
            }
            None => {
                self.skiplist.insert(score, member.clone());
                self.scores.insert(member, score);
                true
            }
        }
    }

    /// Removes `member`; returns `true` if it was present
    pub fn remove(&mut self, member: &str) -> bool {
        match self.scores.remove(member) {
            Some(score) => {
                self.skiplist.delete(score, member);
                true
            }
            None => false,
        }
    }

    /// Returns `member`'s score, if present
    pub fn score(&self, member: &str) -> Option<Score> {
        self.scores.get(member).copied()
    }

    /// Whether `member` is present
    pub fn contains(&self, member: &str) -> bool {
        self.scores.contains_key(member)
    }

    /// Returns `member`'s 0-based rank in ascending score order, if present
    pub fn rank(&self, member: &str) -> Option<usize> {
        let score = self.scores.get(member)?;
        self.skiplist.rank(*score, member)
    }

    /// Returns `member`'s 0-based rank in descending score order, if present
    pub fn rev_rank(&self, member: &str) -> Option<usize> {
        let rank = self.rank(member)?;
        Some(self.len() - 1 - rank)
    }

    /// Normalizes a possibly-negative index against the collection's length,
    /// the way a negative array index addresses from the end
    fn normalize_index(&self, index: i64) -> i64 {
        if index < 0 {
            index + self.len() as i64
        } else {
            index
        }
    }

    /// Returns `(member, score)` pairs in ascending score order for the
    /// inclusive range `[start, stop]`, where negative indices count from
    /// the end (`-1` is the last element)
    pub fn range(&self, start: i64, stop: i64) -> Vec<(String, Score)> {
        if self.is_empty() {
            return Vec::new();
        }
        let len = self.len() as i64;
        let start = self.normalize_index(start).max(0);
        let stop = self.normalize_index(stop).min(len - 1);
        if start > stop || start >= len {
            return Vec::new();
        }
        self.skiplist.range_by_rank(start as usize, stop as usize)
    }

    /// Returns `(member, score)` pairs in descending score order for the
    /// inclusive range `[start, stop]`, indices counted from the
    /// highest-scoring end
    pub fn rev_range(&self, start: i64, stop: i64) -> Vec<(String, Score)> {
        if self.is_empty() {
            return Vec::new();
        }
        let len = self.len() as i64;
        let normalized_start = self.normalize_index(start);
        let normalized_stop = self.normalize_index(stop);
        let ascending_start = len - 1 - normalized_stop;
        let ascending_stop = len - 1 - normalized_start;
        let mut pairs = self.range(ascending_start, ascending_stop);
        pairs.reverse();
        pairs
    }

    /// Returns `(member, score)` pairs with score in `[min, max]`, in
    /// ascending order, capped at `limit` results
    pub fn range_by_score(&self, min: Score, max: Score, limit: usize) -> Vec<(String, Score)> {
        self.skiplist.range_by_score(min, max, limit)
    }

    /// Counts members with score in `[min, max]`
    pub fn count_in_range(&self, min: Score, max: Score) -> usize {
        self.skiplist.range_by_score(min, max, usize::MAX).len()
    }

    /// Iterates all `(member, score)` pairs in ascending score order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Score)> {
        self.skiplist.iter()
    }

    /// Verifies that the score map and skip list agree on membership,
    /// count, and every recorded score
    #[cfg(debug_assertions)]
    pub fn verify_invariants(&self) {
        assert_eq!(self.scores.len(), self.skiplist.len(), "map/skiplist length mismatch");
        for (member, score) in self.skiplist.iter() {
            let recorded = self.scores.get(member).expect("member in skiplist but not in map");
            assert!(
                (*recorded - score).abs() <= f64::EPSILON,
                "score mismatch for {member}: map={recorded} skiplist={score}"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_reports_new_vs_updated() {
        let mut oc = OrderedCollection::new();
        assert!(oc.add("alice".into(), 1.0));
        assert!(!oc.add("alice".into(), 2.0));
        assert_eq!(oc.score("alice"), Some(2.0));
    }

    #[test]
    fn rank_and_rev_rank_are_mirror_images() {
        let mut oc = OrderedCollection::new();
        for (m, s) in [("a", 1.0), ("b", 2.0), ("c", 3.0)] {
            oc.add(m.into(), s);
        }
        assert_eq!(oc.rank("a"), Some(0));
        assert_eq!(oc.rev_rank("a"), Some(2));
        assert_eq!(oc.rank("c"), Some(2));
        assert_eq!(oc.rev_rank("c"), Some(0));
    }

    #[test]
    fn negative_range_indices_count_from_the_end() {
        let mut oc = OrderedCollection::new();
        for i in 0..5 {
            oc.add(format!("m{i}"), i as f64);
        }
        let got = oc.range(-2, -1);
        let members: Vec<_> = got.iter().map(|(m, _)| m.clone()).collect();
        assert_eq!(members, vec!["m3", "m4"]);
    }

    #[test]
    fn rev_range_reverses_ascending_order() {
        let mut oc = OrderedCollection::new();
        for i in 0..5 {
            oc.add(format!("m{i}"), i as f64);
        }
        let got = oc.rev_range(0, 1);
        let members: Vec<_> = got.iter().map(|(m, _)| m.clone()).collect();
        assert_eq!(members, vec!["m4", "m3"]);
    }

    #[test]
    fn remove_absent_member_is_noop() {
        let mut oc = OrderedCollection::new();
        assert!(!oc.remove("ghost"));
    }

    #[test]
    fn invariants_hold_after_mixed_operations() {
        let mut oc = OrderedCollection::new();
        for i in 0..50 {
            oc.add(format!("m{i}"), (i % 7) as f64);
        }
        for i in (0..50).step_by(3) {
            oc.remove(&format!("m{i}"));
        }
        oc.verify_invariants();
    }

    #[test]
    fn count_in_range_matches_range_by_score_length() {
        let mut oc = OrderedCollection::new();
        for i in 0..20 {
            oc.add(format!("m{i}"), i as f64);
        }
        assert_eq!(oc.count_in_range(5.0, 10.0), 6);
    }
}
