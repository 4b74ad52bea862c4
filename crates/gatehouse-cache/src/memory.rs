//! In-memory cache: a shared map guarded by a mutex.
//!
//! Every operation takes the lock for a short, non-async critical
//! section, so calls on the same key are linearizable. Expiry is handled
//! in two places:
//!
//! - **Lazily**: `get` compares the entry's deadline with the clock and
//!   treats an overdue entry as absent (removing it on the spot).
//! - **Eagerly**: `expire` spawns a timer task that removes the entry
//!   when the deadline passes, so unread keys don't pile up.
//!
//! Each entry owns the abort handle of its timer. Overwriting, deleting or
//! re-expiring the entry drops that handle's owner and cancels the timer,
//! so a signed-out session doesn't leave a task sleeping for a day.
//!
//! Entries also carry a generation number that changes on every `set` and
//! `expire`. A timer that already woke up before being cancelled only
//! removes the entry if the generation it captured is still current.
//!
//! A TTL too large to represent as a deadline leaves the entry without
//! one; it then lives until overwritten or deleted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::{CacheError, CacheStorage};

/// A stored value plus its expiry bookkeeping.
///
/// Dropping an entry cancels its pending timer.
#[derive(Debug)]
pub(crate) struct Entry<V> {
    pub(crate) value: V,
    pub(crate) generation: u64,
    pub(crate) deadline: Option<Instant>,
    pub(crate) timer: Option<AbortHandle>,
}

impl<V> Entry<V> {
    pub(crate) fn new(value: V, generation: u64) -> Self {
        Self {
            value,
            generation,
            deadline: None,
            timer: None,
        }
    }

    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Aborts the pending timer, if any.
    pub(crate) fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl<V> Drop for Entry<V> {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

#[derive(Debug)]
struct Inner<V> {
    entries: Mutex<HashMap<String, Entry<V>>>,
    next_generation: AtomicU64,
}

impl<V> Inner<V> {
    fn next_generation(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::Relaxed)
    }
}

/// Process-local key-value store with real per-key expiry.
///
/// Cheap to clone: clones share the same map. Timer tasks hold only a
/// weak reference, so dropping every clone frees the map even while
/// timers are still pending.
///
/// Entries live in memory only; they are gone after a restart.
#[derive(Debug)]
pub struct MemoryCache<V> {
    inner: Arc<Inner<V>>,
}

impl<V> MemoryCache<V> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(1),
            }),
        }
    }

    /// Returns the number of live (unexpired) entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.inner.entries.lock().await;
        entries.values().filter(|e| !e.is_expired(now)).count()
    }

    /// Returns `true` if there are no live entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<V> Clone for MemoryCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> Default for MemoryCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CacheStorage for MemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    type Value = V;

    async fn get(&self, key: &str) -> Result<Option<V>, CacheError> {
        let mut entries = self.inner.entries.lock().await;
        let expired = match entries.get(key) {
            None => return Ok(None),
            Some(entry) => entry.is_expired(Instant::now()),
        };
        if expired {
            entries.remove(key);
            tracing::debug!(key_prefix = %key_prefix(key), "entry expired on read");
            return Ok(None);
        }
        Ok(entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: V) -> Result<(), CacheError> {
        let generation = self.inner.next_generation();
        let mut entries = self.inner.entries.lock().await;
        entries.insert(key.to_string(), Entry::new(value, generation));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.inner.entries.lock().await.remove(key);
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut entries = self.inner.entries.lock().await;
        let Some(entry) = entries.get_mut(key) else {
            return Ok(());
        };
        // An overdue entry the timer hasn't reclaimed yet is already gone.
        if ttl.is_zero() || entry.is_expired(now) {
            entries.remove(key);
            return Ok(());
        }

        let generation = self.inner.next_generation();
        entry.cancel_timer();
        entry.generation = generation;
        entry.deadline = now.checked_add(ttl);
        if entry.deadline.is_some() {
            entry.timer = Some(spawn_expiry(
                Arc::downgrade(&self.inner),
                key.to_string(),
                generation,
                ttl,
            ));
        }

        tracing::debug!(key_prefix = %key_prefix(key), ?ttl, "expiry scheduled");
        Ok(())
    }
}

/// Timer that removes `key` after `ttl`, unless the entry was rewritten or
/// re-expired in the meantime. The returned handle lives in the entry.
fn spawn_expiry<V>(
    inner: Weak<Inner<V>>,
    key: String,
    generation: u64,
    ttl: Duration,
) -> AbortHandle
where
    V: Send + Sync + 'static,
{
    let task = tokio::spawn(async move {
        tokio::time::sleep(ttl).await;
        let Some(inner) = inner.upgrade() else {
            return;
        };
        let mut entries = inner.entries.lock().await;
        if entries.get(&key).is_some_and(|e| e.generation == generation) {
            entries.remove(&key);
            tracing::debug!(key_prefix = %key_prefix(&key), "entry expired");
        }
    });
    task.abort_handle()
}

/// First few characters of a key, for logs. Keys are often secrets.
pub(crate) fn key_prefix(key: &str) -> &str {
    match key.char_indices().nth(8) {
        Some((idx, _)) => &key[..idx],
        None => key,
    }
}
