//! TTL manager
//!
//! Tracks absolute expiration deadlines per key and offers two ways to
//! reclaim expired entries: a passive `is_expired` check made on every
//! read, and an active sampling sweep, `sample_and_purge`, that walks a
//! long-lived cursor over the deadline map so a full scan is never needed
//! in one call. Deletions are batched into a pending buffer and flushed
//! in one pass, the same batching idiom the pack's sharded in-memory
//! engines use for their background expirer.

use cache_core::{Key, MillisTimestamp};
use hashbrown::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Number of pending deletes that triggers an eager flush inside `sample_and_purge`
const PENDING_FLUSH_THRESHOLD: usize = 100;

/// Returns the current time as milliseconds since the Unix epoch
pub fn now_millis() -> MillisTimestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before Unix epoch")
        .as_millis() as MillisTimestamp
}

/// Absolute-deadline TTL tracker with iterator-based active sampling
pub struct TtlManager {
    deadlines: HashMap<Key, MillisTimestamp>,
    /// Keys visited by the active sampler in the current cursor lap
    cursor_seen: Vec<Key>,
    cursor_pos: usize,
    pending: Vec<Key>,
}

impl Default for TtlManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TtlManager {
    /// Creates a new, empty TTL manager
    pub fn new() -> Self {
        Self {
            deadlines: HashMap::new(),
            cursor_seen: Vec::new(),
            cursor_pos: 0,
            pending: Vec::new(),
        }
    }

    /// Number of keys currently carrying a TTL
    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    /// Whether any key currently carries a TTL
    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }

    /// Sets (overwriting if present) the expiration deadline for `key`
    pub fn set(&mut self, key: Key, deadline_ms: MillisTimestamp) {
        self.deadlines.insert(key, deadline_ms);
    }

    /// Removes `key`'s TTL row, if any
    pub fn delete(&mut self, key: &str) {
        self.deadlines.remove(key);
    }

    /// True iff `key` carries a TTL whose deadline has already passed
    pub fn is_expired(&self, key: &str) -> bool {
        match self.deadlines.get(key) {
            Some(&deadline) => now_millis() >= deadline,
            None => false,
        }
    }

    /// Returns the raw deadline recorded for `key`, if it carries a TTL
    pub fn deadline_of(&self, key: &str) -> Option<MillisTimestamp> {
        self.deadlines.get(key).copied()
    }

    /// Refreshes the cursor snapshot when it has been fully consumed, implementing wraparound
    fn refresh_cursor_if_exhausted(&mut self) {
        if self.cursor_pos >= self.cursor_seen.len() {
            self.cursor_seen = self.deadlines.keys().cloned().collect();
            self.cursor_pos = 0;
        }
    }

    /// Advances the active-sampling cursor up to `k` steps, pushing expired
    /// keys found along the way into the pending-delete buffer and flushing
    /// it once it reaches [`PENDING_FLUSH_THRESHOLD`].
    ///
    /// Returns the number of keys found expired during this call.
    pub fn sample_and_purge(&mut self, k: usize, on_expire: &mut dyn FnMut(&str)) -> usize {
        if self.deadlines.is_empty() {
            return 0;
        }

        let mut expired = 0;
        let now = now_millis();

        for _ in 0..k {
            self.refresh_cursor_if_exhausted();
            if self.cursor_seen.is_empty() {
                break;
            }

            let key = self.cursor_seen[self.cursor_pos].clone();
            self.cursor_pos += 1;

            if let Some(&deadline) = self.deadlines.get(&key) {
                if now >= deadline {
                    self.pending.push(key);
                    expired += 1;

                    if self.pending.len() >= PENDING_FLUSH_THRESHOLD {
                        self.flush_pending_deletes(on_expire);
                    }
                }
            }
        }

        expired
    }

    /// Drains the pending-delete buffer unconditionally, invoking `on_expire` for each key
    pub fn flush_pending_deletes(&mut self, on_expire: &mut dyn FnMut(&str)) {
        for key in self.pending.drain(..) {
            self.deadlines.remove(&key);
            on_expire(&key);
        }
    }
}

/// Handle to a running background timer thread
///
/// Dropping this handle does not stop the thread; call [`BackgroundTimer::stop`]
/// explicitly, matching the explicit start/stop contract background tasks
/// are held to.
pub struct BackgroundTimer {
    stop_flag: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl BackgroundTimer {
    /// Spawns `body` on a dedicated thread, calling it once per `interval`
    /// until [`stop`](Self::stop) is invoked
    pub fn spawn<F>(interval: Duration, mut body: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let stop_flag_thread = Arc::clone(&stop_flag);

        let join = std::thread::spawn(move || {
            while !stop_flag_thread.load(Ordering::Relaxed) {
                std::thread::sleep(interval);
                if stop_flag_thread.load(Ordering::Relaxed) {
                    break;
                }
                body();
            }
        });

        Self { stop_flag, join: Some(join) }
    }

    /// Signals the thread to stop and joins it; idempotent
    pub fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for BackgroundTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_expired_respects_deadline() {
        let mut ttl = TtlManager::new();
        ttl.set("a".to_string(), now_millis() + 10_000);
        ttl.set("b".to_string(), now_millis().saturating_sub(1));
        assert!(!ttl.is_expired("a"));
        assert!(ttl.is_expired("b"));
        assert!(!ttl.is_expired("absent"));
    }

    #[test]
    fn sample_and_purge_empty_map_returns_zero() {
        let mut ttl = TtlManager::new();
        let mut deleted = Vec::new();
        let expired = ttl.sample_and_purge(5, &mut |k| deleted.push(k.to_string()));
        assert_eq!(expired, 0);
        assert!(deleted.is_empty());
    }

    #[test]
    fn sample_and_purge_finds_expired_and_defers_delete_until_flush() {
        let mut ttl = TtlManager::new();
        ttl.set("expired".to_string(), 1);
        ttl.set("alive".to_string(), now_millis() + 60_000);

        let mut deleted = Vec::new();
        let expired = ttl.sample_and_purge(10, &mut |k| deleted.push(k.to_string()));
        assert_eq!(expired, 1);
        // below the flush threshold, on_expire has not fired yet
        assert!(deleted.is_empty());

        ttl.flush_pending_deletes(&mut |k| deleted.push(k.to_string()));
        assert_eq!(deleted, vec!["expired".to_string()]);
        assert!(ttl.is_expired("alive").eq(&false));
    }

    #[test]
    fn cursor_wraps_around_when_exhausted() {
        let mut ttl = TtlManager::new();
        for i in 0..5 {
            ttl.set(format!("k{i}"), now_millis() + 60_000);
        }
        let mut noop = |_: &str| {};
        // sampling more than the map size must wrap the cursor, not panic or stall
        for _ in 0..3 {
            ttl.sample_and_purge(7, &mut noop);
        }
    }

    #[test]
    fn delete_removes_ttl_row() {
        let mut ttl = TtlManager::new();
        ttl.set("a".to_string(), now_millis() + 10_000);
        ttl.delete("a");
        assert!(!ttl.is_expired("a"));
        assert_eq!(ttl.len(), 0);
    }

    #[test]
    fn background_timer_stops_cleanly() {
        use std::sync::atomic::AtomicUsize;
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);
        let mut timer = BackgroundTimer::spawn(Duration::from_millis(10), move || {
            counter_clone.fetch_add(1, Ordering::Relaxed);
        });
        std::thread::sleep(Duration::from_millis(50));
        timer.stop();
        assert!(counter.load(Ordering::Relaxed) > 0);
    }
}
