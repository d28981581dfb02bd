//! Property-based tests for the universal invariants

use cache_engine::{Cache, CacheConfig, OrderedCollection};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum ZOp {
    Add(String, i32),
    Rem(String),
}

fn zop_strategy() -> impl Strategy<Value = ZOp> {
    let member = "[a-e]";
    prop_oneof![
        (member, -10i32..10).prop_map(|(m, s)| ZOp::Add(m.to_string(), s)),
        member.prop_map(|m| ZOp::Rem(m.to_string())),
    ]
}

proptest! {
    /// member→score map and skip list stay in lockstep, and every member's
    /// score agrees with the skip list's score at its own rank
    #[test]
    fn ordered_collection_map_and_skiplist_agree(ops in prop::collection::vec(zop_strategy(), 0..100)) {
        let mut oc = OrderedCollection::new();
        for op in ops {
            match op {
                ZOp::Add(member, score) => { oc.add(member, score as f64); }
                ZOp::Rem(member) => { oc.remove(&member); }
            }
        }

        oc.verify_invariants();

        for (member, _) in oc.iter().collect::<Vec<_>>() {
            let score = oc.score(member).expect("iterated member must have a score");
            let rank = oc.rank(member).expect("iterated member must have a rank");
            let by_rank = oc.range(rank as i64, rank as i64);
            prop_assert_eq!(by_rank.len(), 1);
            prop_assert!((by_rank[0].1 - score).abs() <= f64::EPSILON);
        }
    }

    /// ranks of an N-member ordered collection form a permutation of 0..N
    #[test]
    fn ranks_form_a_permutation(
        members in prop::collection::vec("[a-z]{1,8}", 1..30)
            .prop_map(|mut v| { v.sort(); v.dedup(); v })
    ) {
        let mut oc = OrderedCollection::new();
        for (i, member) in members.iter().enumerate() {
            oc.add(member.clone(), i as f64);
        }

        let mut ranks: Vec<usize> = members.iter().map(|m| oc.rank(m).unwrap()).collect();
        ranks.sort();
        let expected: Vec<usize> = (0..members.len()).collect();
        prop_assert_eq!(ranks, expected);
    }
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set(String, String),
    Del(String),
    Zadd(String, String, i32),
    Sadd(String, Vec<String>),
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    let key = "[a-c]";
    let member = "[x-z]";
    prop_oneof![
        (key, "[0-9]{1,4}").prop_map(|(k, v)| CacheOp::Set(k.to_string(), v)),
        key.prop_map(|k| CacheOp::Del(k.to_string())),
        (key, member, -5i32..5).prop_map(|(k, m, s)| CacheOp::Zadd(k.to_string(), m.to_string(), s)),
        (key, prop::collection::vec(member, 1..4))
            .prop_map(|(k, ms)| CacheOp::Sadd(k.to_string(), ms.into_iter().map(String::from).collect())),
    ]
}

proptest! {
    /// current_memory_used never goes negative and stats never decrease,
    /// across an arbitrary mix of writes and deletes on a handful of keys
    #[test]
    fn memory_and_stats_stay_well_formed(ops in prop::collection::vec(cache_op_strategy(), 0..200)) {
        let mut cache = Cache::new(CacheConfig { maxmemory: 4096, ..Default::default() });
        let mut prev_stats = cache.get_stats();

        for op in ops {
            // zadd/sadd against a key already holding a scalar raise
            // WRONGTYPE; that's an expected, non-fatal outcome here.
            match op {
                CacheOp::Set(k, v) => cache.set(k, v.into_bytes(), None),
                CacheOp::Del(k) => { cache.del(&k); }
                CacheOp::Zadd(k, m, s) => { let _ = cache.zadd(&k, s as f64, m); }
                CacheOp::Sadd(k, members) => { let _ = cache.sadd(&k, members); }
            }

            let stats = cache.get_stats();
            prop_assert!(stats.hits >= prev_stats.hits);
            prop_assert!(stats.misses >= prev_stats.misses);
            prop_assert!(stats.evictions >= prev_stats.evictions);
            prop_assert!(stats.expirations >= prev_stats.expirations);
            prop_assert!(stats.operations >= prev_stats.operations);
            prev_stats = stats;
        }
    }

    /// del is idempotent: calling it again after the first success is a no-op
    #[test]
    fn del_idempotence(key in "[a-z]{1,8}", value in "[0-9]{1,8}") {
        let mut cache = Cache::new(CacheConfig::default());
        cache.set(key.clone(), value.into_bytes(), None);
        prop_assert_eq!(cache.del(&key), 1);
        prop_assert_eq!(cache.del(&key), 0);
    }
}
