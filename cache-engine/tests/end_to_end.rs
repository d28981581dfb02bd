//! End-to-end scenarios against the public `Cache` API

use cache_core::{Error, EvictionPolicy};
use cache_engine::{Cache, CacheConfig};
use std::thread::sleep;
use std::time::Duration;

fn config() -> CacheConfig {
    CacheConfig { maxmemory: 1024 * 1024, ..Default::default() }
}

#[test]
fn set_get_del_roundtrip() {
    let mut cache = Cache::new(config());
    cache.set("foo".into(), b"bar".to_vec(), None);
    assert_eq!(cache.get("foo").unwrap(), Some(b"bar".to_vec()));
    assert_eq!(cache.del("foo"), 1);
    assert_eq!(cache.get("foo").unwrap(), None);
}

#[test]
fn passive_expiration_on_read() {
    let mut cache = Cache::new(config());
    cache.set("temp".into(), b"v".to_vec(), Some(100));
    sleep(Duration::from_millis(150));
    assert_eq!(cache.get("temp").unwrap(), None);
}

#[test]
fn active_expiration_reclaims_without_a_read() {
    let mut cache = Cache::new(config());
    for i in 0..10 {
        cache.set(format!("k{i}"), format!("v{i}").into_bytes(), Some(50));
    }
    sleep(Duration::from_millis(200));

    // drive the active-expiration sweep directly, the way cache-server's
    // background timer would
    cache.run_active_expire_round();
    cache.run_active_expire_round();

    for i in 0..10 {
        assert_eq!(cache.get(&format!("k{i}")).unwrap(), None);
    }
}

#[test]
fn wrongtype_is_symmetric_across_shapes() {
    let mut cache = Cache::new(config());
    cache.set("s".into(), b"x".to_vec(), None);
    assert_eq!(cache.zadd("s", 1.0, "m".into()), Err(Error::WrongType));

    cache.zadd("z", 1.0, "m".into()).unwrap();
    assert_eq!(cache.get("z"), Err(Error::WrongType));
}

#[test]
fn zset_ranks_and_score_update_in_place() {
    let mut cache = Cache::new(config());
    cache.zadd("z", 1.0, "a".into()).unwrap();
    cache.zadd("z", 2.0, "b".into()).unwrap();
    cache.zadd("z", 3.0, "c".into()).unwrap();
    assert_eq!(cache.zadd("z", 4.0, "b".into()).unwrap(), 0);

    assert_eq!(cache.zrank("z", "a").unwrap(), Some(0));
    assert_eq!(cache.zrank("z", "c").unwrap(), Some(1));
    assert_eq!(cache.zrank("z", "b").unwrap(), Some(2));

    assert!(cache.zrem("z", "b").unwrap());
    assert!(!cache.zrem("z", "b").unwrap());
    assert_eq!(cache.zscore("z", "b").unwrap(), None);
}

#[test]
fn memory_bounded_eviction_keeps_cache_under_budget() {
    let mut config = config();
    config.maxmemory = 640;
    config.eviction_policy = EvictionPolicy::Lru;
    let mut cache = Cache::new(config);

    for i in 0..20 {
        cache.set(format!("k{i}"), format!("v{i}").into_bytes(), None);
    }

    let stats = cache.get_stats();
    assert!(stats.key_count < 20);
    assert!(stats.key_count > 0);
    assert!(stats.evictions > 0);
}

#[test]
fn member_set_upgrades_from_compact_on_first_non_integer() {
    let mut cache = Cache::new(config());
    cache.sadd("s", vec!["1".into(), "2".into(), "3".into()]).unwrap();
    cache.sadd("s", vec!["string".into()]).unwrap();
    assert_eq!(cache.smembers("s").unwrap().len(), 4);
}
