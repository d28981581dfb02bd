//! Skip list with rank spans
//!
//! Backs ordered collections: nodes are ordered lexicographically on
//! `(score, member)` and each forward pointer carries a span, the number of
//! level-0 nodes it skips, so rank queries run in O(log n) instead of O(n).
//!
//! Nodes live in a flat arena (`Vec<Option<Node>>`) addressed by index rather
//! than behind owned pointers: the single-threaded cooperative execution
//! model this cache runs under makes an arena-with-indices far less fiddly
//! than a pointer graph, and it keeps the whole module free of `unsafe`.

use cache_core::{Member, Score};
use rand::Rng;
use std::cmp::Ordering;

/// Maximum number of levels a node may participate in
const MAX_LEVEL: usize = 32;

/// Branching probability for the geometric level distribution
const BRANCHING_P: f64 = 0.25;

/// Index of the header sentinel in the arena; always present at slot 0
const HEADER: usize = 0;

#[derive(Debug, Clone)]
struct Level {
    /// Index of the next node at this level, or `None` at the tail
    forward: Option<usize>,
    /// Number of level-0 steps this forward pointer skips
    span: usize,
}

#[derive(Debug, Clone)]
struct Node {
    member: Member,
    score: Score,
    levels: Vec<Level>,
    /// Backward pointer, level 0 only
    backward: Option<usize>,
}

impl Node {
    fn new(member: Member, score: Score, level: usize) -> Self {
        Self {
            member,
            score,
            levels: vec![Level { forward: None, span: 0 }; level],
            backward: None,
        }
    }

    fn header() -> Self {
        Self::new(Member::new(), Score::default(), MAX_LEVEL)
    }
}

/// Compares two `(score, member)` pairs under the skip list's lexicographic order
fn compare(score_a: Score, member_a: &str, score_b: Score, member_b: &str) -> Ordering {
    score_a
        .partial_cmp(&score_b)
        .unwrap_or(Ordering::Equal)
        .then_with(|| member_a.cmp(member_b))
}

/// An ordered, rank-indexed skip list of `(score, member)` pairs
///
/// Every member is unique; callers (the ordered collection wrapper) are
/// responsible for ensuring a member is not inserted twice and for removing
/// the old `(score, member)` pair before inserting an updated score.
#[derive(Debug, Clone)]
pub struct SkipList {
    nodes: Vec<Option<Node>>,
    free_slots: Vec<usize>,
    tail: Option<usize>,
    level: usize,
    length: usize,
}

/// Scratch buffers reused across a single insert/delete/rank traversal
struct Walk {
    update: [usize; MAX_LEVEL],
    rank: [usize; MAX_LEVEL],
}

impl Default for SkipList {
    fn default() -> Self {
        Self::new()
    }
}

impl SkipList {
    /// Creates a new, empty skip list
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(Node::header())],
            free_slots: Vec::new(),
            tail: None,
            level: 1,
            length: 0,
        }
    }

    /// Number of `(score, member)` pairs currently stored
    pub fn len(&self) -> usize {
        self.length
    }

    /// Whether the skip list holds no elements
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    fn node(&self, idx: usize) -> &Node {
        self.nodes[idx].as_ref().expect("skip list arena slot must be occupied")
    }

    fn node_mut(&mut self, idx: usize) -> &mut Node {
        self.nodes[idx].as_mut().expect("skip list arena slot must be occupied")
    }

    fn random_level(&self) -> usize {
        let mut level = 1;
        let mut rng = rand::thread_rng();
        while level < MAX_LEVEL && rng.gen_bool(BRANCHING_P) {
            level += 1;
        }
        level
    }

    fn alloc(&mut self, member: Member, score: Score, level: usize) -> usize {
        let node = Node::new(member, score, level);
        if let Some(idx) = self.free_slots.pop() {
            self.nodes[idx] = Some(node);
            idx
        } else {
            self.nodes.push(Some(node));
            self.nodes.len() - 1
        }
    }

    fn free(&mut self, idx: usize) {
        self.nodes[idx] = None;
        self.free_slots.push(idx);
    }

    /// Walks from the top level down, stopping just before the first node
    /// that is `>= (score, member)`, recording the predecessor and its
    /// accumulated rank at every level.
    fn walk_before(&self, score: Score, member: &str) -> Walk {
        let mut walk = Walk { update: [HEADER; MAX_LEVEL], rank: [0; MAX_LEVEL] };
        let mut x = HEADER;

        for i in (0..self.level).rev() {
            walk.rank[i] = if i == self.level - 1 { 0 } else { walk.rank[i + 1] };

            loop {
                let Some(fwd) = self.node(x).levels[i].forward else { break };
                let fwd_node = self.node(fwd);
                if compare(fwd_node.score, &fwd_node.member, score, member) == Ordering::Less {
                    walk.rank[i] += self.node(x).levels[i].span;
                    x = fwd;
                } else {
                    break;
                }
            }
            walk.update[i] = x;
        }

        walk
    }

    /// Inserts `(score, member)`.
    ///
    /// The caller guarantees the pair is not already present; inserting a
    /// duplicate `(score, member)` is a logic error, not a recoverable one.
    pub fn insert(&mut self, score: Score, member: Member) {
        let mut walk = self.walk_before(score, &member);
        let new_level = self.random_level();

        if new_level > self.level {
            for i in self.level..new_level {
                walk.rank[i] = 0;
                walk.update[i] = HEADER;
                self.node_mut(HEADER).levels.resize(new_level, Level { forward: None, span: 0 });
                self.node_mut(HEADER).levels[i].span = self.length;
            }
            self.level = new_level;
        }

        let new_idx = self.alloc(member, score, new_level);

        for i in 0..new_level {
            let pred = walk.update[i];
            let old_forward = self.node(pred).levels[i].forward;
            let old_span = self.node(pred).levels[i].span;

            self.node_mut(new_idx).levels[i].forward = old_forward;
            self.node_mut(new_idx).levels[i].span = old_span - (walk.rank[0] - walk.rank[i]);

            self.node_mut(pred).levels[i].forward = Some(new_idx);
            self.node_mut(pred).levels[i].span = (walk.rank[0] - walk.rank[i]) + 1;
        }

        for i in new_level..self.level {
            self.node_mut(walk.update[i]).levels[i].span += 1;
        }

        let backward = if walk.update[0] == HEADER { None } else { Some(walk.update[0]) };
        self.node_mut(new_idx).backward = backward;

        match self.node(new_idx).levels[0].forward {
            Some(next) => self.node_mut(next).backward = Some(new_idx),
            None => self.tail = Some(new_idx),
        }

        self.length += 1;
    }

    /// Removes `(score, member)` if it is present exactly; returns whether it was removed
    pub fn delete(&mut self, score: Score, member: &str) -> bool {
        let walk = self.walk_before(score, member);
        let Some(victim) = self.node(walk.update[0]).levels[0].forward else { return false };
        let victim_node = self.node(victim);
        if victim_node.member != member || (victim_node.score - score).abs() > f64::EPSILON {
            return false;
        }

        for i in 0..self.level {
            let pred = walk.update[i];
            if self.node(pred).levels[i].forward == Some(victim) {
                let victim_span = self.node(victim).levels[i].span;
                let victim_forward = self.node(victim).levels[i].forward;
                let pred_level = &mut self.node_mut(pred).levels[i];
                pred_level.span += victim_span - 1;
                pred_level.forward = victim_forward;
            } else {
                self.node_mut(pred).levels[i].span -= 1;
            }
        }

        let next = self.node(victim).levels[0].forward;
        let backward = self.node(victim).backward;
        match next {
            Some(next_idx) => self.node_mut(next_idx).backward = backward,
            None => self.tail = backward,
        }

        while self.level > 1 && self.node(HEADER).levels[self.level - 1].forward.is_none() {
            self.level -= 1;
        }

        self.free(victim);
        self.length -= 1;
        true
    }

    /// Returns the 0-based rank of `(score, member)`, or `None` if absent
    pub fn rank(&self, score: Score, member: &str) -> Option<usize> {
        let mut rank = 0;
        let mut x = HEADER;

        for i in (0..self.level).rev() {
            loop {
                let Some(fwd) = self.node(x).levels[i].forward else { break };
                let fwd_node = self.node(fwd);
                if compare(fwd_node.score, &fwd_node.member, score, member) == Ordering::Less {
                    rank += self.node(x).levels[i].span;
                    x = fwd;
                } else {
                    break;
                }
            }
        }

        match self.node(x).levels[0].forward {
            Some(fwd) => {
                let fwd_node = self.node(fwd);
                if fwd_node.member == member && (fwd_node.score - score).abs() <= f64::EPSILON {
                    Some(rank)
                } else {
                    None
                }
            }
            None => None,
        }
    }

    /// Returns the `(member, score)` pair at the given 0-based rank
    pub fn get_by_rank(&self, rank: usize) -> Option<(&str, Score)> {
        if rank >= self.length {
            return None;
        }

        let mut traversed = 0;
        let mut x = HEADER;

        for i in (0..self.level).rev() {
            loop {
                let Some(fwd) = self.node(x).levels[i].forward else { break };
                let span = self.node(x).levels[i].span;
                if traversed + span <= rank {
                    traversed += span;
                    x = fwd;
                } else {
                    break;
                }
            }
        }

        self.node(x).levels[0]
            .forward
            .map(|fwd| (self.node(fwd).member.as_str(), self.node(fwd).score))
    }

    /// Returns `(member, score)` pairs for ranks `[start, end]` inclusive
    pub fn range_by_rank(&self, start: usize, end: usize) -> Vec<(String, Score)> {
        if start > end || start >= self.length {
            return Vec::new();
        }
        let end = end.min(self.length - 1);

        let mut traversed = 0;
        let mut x = HEADER;

        for i in (0..self.level).rev() {
            loop {
                let Some(fwd) = self.node(x).levels[i].forward else { break };
                let span = self.node(x).levels[i].span;
                if traversed + span <= start {
                    traversed += span;
                    x = fwd;
                } else {
                    break;
                }
            }
        }

        let mut result = Vec::with_capacity(end - start + 1);
        let mut current = self.node(x).levels[0].forward;
        for _ in start..=end {
            let Some(idx) = current else { break };
            let node = self.node(idx);
            result.push((node.member.clone(), node.score));
            current = node.levels[0].forward;
        }
        result
    }

    /// Descends to the first node whose score is `>= min`, then walks
    /// forward emitting pairs while the score is `<= max`, up to `limit` items
    pub fn range_by_score(&self, min: Score, max: Score, limit: usize) -> Vec<(String, Score)> {
        let mut x = HEADER;
        for i in (0..self.level).rev() {
            loop {
                let Some(fwd) = self.node(x).levels[i].forward else { break };
                if self.node(fwd).score < min {
                    x = fwd;
                } else {
                    break;
                }
            }
        }

        let mut result = Vec::new();
        let mut current = self.node(x).levels[0].forward;
        while let Some(idx) = current {
            let node = self.node(idx);
            if node.score > max || result.len() >= limit {
                break;
            }
            result.push((node.member.clone(), node.score));
            current = node.levels[0].forward;
        }
        result
    }

    /// Iterates all `(member, score)` pairs in skip-list order
    pub fn iter(&self) -> SkipListIter<'_> {
        SkipListIter { list: self, current: self.node(HEADER).levels[0].forward }
    }
}

/// In-order iterator over a [`SkipList`]
pub struct SkipListIter<'a> {
    list: &'a SkipList,
    current: Option<usize>,
}

impl<'a> Iterator for SkipListIter<'a> {
    type Item = (&'a str, Score);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.current?;
        let node = self.list.node(idx);
        self.current = node.levels[0].forward;
        Some((node.member.as_str(), node.score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_rank_order() {
        let mut sl = SkipList::new();
        sl.insert(3.0, "c".to_string());
        sl.insert(1.0, "a".to_string());
        sl.insert(2.0, "b".to_string());

        assert_eq!(sl.rank(1.0, "a"), Some(0));
        assert_eq!(sl.rank(2.0, "b"), Some(1));
        assert_eq!(sl.rank(3.0, "c"), Some(2));
        assert_eq!(sl.len(), 3);
    }

    #[test]
    fn equal_scores_break_ties_lexicographically() {
        let mut sl = SkipList::new();
        sl.insert(1.0, "zebra".to_string());
        sl.insert(1.0, "apple".to_string());
        sl.insert(1.0, "mango".to_string());

        let all: Vec<_> = sl.iter().map(|(m, _)| m.to_string()).collect();
        assert_eq!(all, vec!["apple", "mango", "zebra"]);
    }

    #[test]
    fn delete_reknits_spans() {
        let mut sl = SkipList::new();
        for i in 0..20 {
            sl.insert(i as f64, format!("m{i}"));
        }
        assert!(sl.delete(10.0, "m10"));
        assert_eq!(sl.len(), 19);
        assert_eq!(sl.rank(11.0, "m11"), Some(9));
        assert!(!sl.delete(10.0, "m10"));
    }

    #[test]
    fn range_by_score_is_inclusive_and_ordered() {
        let mut sl = SkipList::new();
        for i in 0..10 {
            sl.insert(i as f64, format!("m{i}"));
        }
        let got = sl.range_by_score(3.0, 6.0, 100);
        let members: Vec<_> = got.iter().map(|(m, _)| m.clone()).collect();
        assert_eq!(members, vec!["m3", "m4", "m5", "m6"]);
    }

    #[test]
    fn range_by_score_respects_limit() {
        let mut sl = SkipList::new();
        for i in 0..10 {
            sl.insert(i as f64, format!("m{i}"));
        }
        let got = sl.range_by_score(0.0, 9.0, 3);
        assert_eq!(got.len(), 3);
    }

    #[test]
    fn range_by_rank_supports_full_scan() {
        let mut sl = SkipList::new();
        for i in 0..5 {
            sl.insert(i as f64, format!("m{i}"));
        }
        let got = sl.range_by_rank(0, sl.len() - 1);
        assert_eq!(got.len(), 5);
        assert_eq!(got[0].0, "m0");
        assert_eq!(got[4].0, "m4");
    }

    #[test]
    fn get_by_rank_out_of_bounds_is_none() {
        let sl = SkipList::new();
        assert_eq!(sl.get_by_rank(0), None);
    }

    #[test]
    fn span_sum_matches_length_at_every_level() {
        let mut sl = SkipList::new();
        for i in 0..100 {
            sl.insert(i as f64, format!("m{i}"));
        }
        for level in 0..sl.level {
            let mut total = 0;
            let mut x = HEADER;
            loop {
                let node = sl.node(x);
                total += node.levels[level].span;
                match node.levels[level].forward {
                    Some(next) => x = next,
                    None => break,
                }
            }
            assert_eq!(total, sl.length);
        }
    }
}
