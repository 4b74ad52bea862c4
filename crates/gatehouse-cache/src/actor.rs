//! Actor-backed cache: one Tokio task owns the map.
//!
//! Callers never touch the map. They send a command through an mpsc
//! channel and wait for the reply on a oneshot channel. Because a single
//! task processes commands one at a time, every operation is serialized
//! without locks.
//!
//! Each request is bounded by [`ActorCacheConfig::request_timeout`]: a
//! slow or stuck owner surfaces as [`CacheError::Timeout`] instead of
//! hanging the caller, and a stopped owner as [`CacheError::Unavailable`].

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::memory::{key_prefix, Entry};
use crate::{CacheError, CacheStorage};

/// Tuning knobs for [`ActorCache`].
#[derive(Debug, Clone)]
pub struct ActorCacheConfig {
    /// Capacity of the command channel. Senders wait when it is full.
    pub channel_size: usize,

    /// How long a caller waits for the owner to answer one request.
    pub request_timeout: Duration,
}

impl Default for ActorCacheConfig {
    fn default() -> Self {
        Self {
            channel_size: 64,
            request_timeout: Duration::from_secs(5),
        }
    }
}

/// Commands understood by the owner task.
enum CacheCommand<V> {
    Get {
        key: String,
        reply: oneshot::Sender<Option<V>>,
    },
    Set {
        key: String,
        value: V,
        reply: oneshot::Sender<()>,
    },
    Delete {
        key: String,
        reply: oneshot::Sender<()>,
    },
    Expire {
        key: String,
        ttl: Duration,
        reply: oneshot::Sender<()>,
    },
    Len {
        reply: oneshot::Sender<usize>,
    },
    /// Sent by a timer task when a deadline passes.
    Evict { key: String, generation: u64 },
    Shutdown,
}

/// Handle to a running cache owner task.
///
/// Cheap to clone: it's an `mpsc::Sender` plus a timeout. The owner task
/// stops when every handle is dropped or [`shutdown`](Self::shutdown) is
/// called.
pub struct ActorCache<V> {
    sender: mpsc::Sender<CacheCommand<V>>,
    request_timeout: Duration,
}

impl<V> Clone for ActorCache<V> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            request_timeout: self.request_timeout,
        }
    }
}

impl<V> ActorCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Spawns the owner task and returns a handle to it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(config: ActorCacheConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.channel_size.max(1));
        let actor = CacheActor {
            entries: HashMap::new(),
            next_generation: 1,
            receiver,
            timers: sender.downgrade(),
        };
        tokio::spawn(actor.run());
        Self {
            sender,
            request_timeout: config.request_timeout,
        }
    }

    /// Returns the number of live (unexpired) entries.
    pub async fn len(&self) -> Result<usize, CacheError> {
        self.request(|reply| CacheCommand::Len { reply }).await
    }

    /// Returns `true` if there are no live entries.
    pub async fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len().await? == 0)
    }

    /// Tells the owner task to stop. Later requests fail with
    /// [`CacheError::Unavailable`].
    pub async fn shutdown(&self) {
        let _ = self.sender.send(CacheCommand::Shutdown).await;
    }

    /// Sends one command and waits (bounded) for its reply.
    async fn request<T, F>(&self, make: F) -> Result<T, CacheError>
    where
        T: Send,
        F: FnOnce(oneshot::Sender<T>) -> CacheCommand<V> + Send,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let exchange = async {
            self.sender
                .send(make(reply_tx))
                .await
                .map_err(|_| CacheError::Unavailable)?;
            reply_rx.await.map_err(|_| CacheError::Unavailable)
        };
        tokio::time::timeout(self.request_timeout, exchange)
            .await
            .map_err(|_| CacheError::Timeout(self.request_timeout))?
    }
}

impl<V> CacheStorage for ActorCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    type Value = V;

    async fn get(&self, key: &str) -> Result<Option<V>, CacheError> {
        let key = key.to_string();
        self.request(|reply| CacheCommand::Get { key, reply }).await
    }

    async fn set(&self, key: &str, value: V) -> Result<(), CacheError> {
        let key = key.to_string();
        self.request(|reply| CacheCommand::Set { key, value, reply })
            .await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let key = key.to_string();
        self.request(|reply| CacheCommand::Delete { key, reply }).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), CacheError> {
        let key = key.to_string();
        self.request(|reply| CacheCommand::Expire { key, ttl, reply })
            .await
    }
}

/// State owned by the cache task.
struct CacheActor<V> {
    entries: HashMap<String, Entry<V>>,
    next_generation: u64,
    receiver: mpsc::Receiver<CacheCommand<V>>,
    /// Weak so pending timers don't keep the actor alive.
    timers: mpsc::WeakSender<CacheCommand<V>>,
}

impl<V> CacheActor<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn run(mut self) {
        tracing::debug!("cache actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                CacheCommand::Get { key, reply } => {
                    let _ = reply.send(self.handle_get(&key));
                }
                CacheCommand::Set { key, value, reply } => {
                    self.handle_set(key, value);
                    let _ = reply.send(());
                }
                CacheCommand::Delete { key, reply } => {
                    self.entries.remove(&key);
                    let _ = reply.send(());
                }
                CacheCommand::Expire { key, ttl, reply } => {
                    self.handle_expire(key, ttl);
                    let _ = reply.send(());
                }
                CacheCommand::Len { reply } => {
                    let now = Instant::now();
                    let live =
                        self.entries.values().filter(|e| !e.is_expired(now)).count();
                    let _ = reply.send(live);
                }
                CacheCommand::Evict { key, generation } => {
                    if self
                        .entries
                        .get(&key)
                        .is_some_and(|e| e.generation == generation)
                    {
                        self.entries.remove(&key);
                        tracing::debug!(key_prefix = %key_prefix(&key), "entry expired");
                    }
                }
                CacheCommand::Shutdown => break,
            }
        }

        tracing::debug!(entries = self.entries.len(), "cache actor stopped");
    }

    fn handle_get(&mut self, key: &str) -> Option<V> {
        let expired = self.entries.get(key)?.is_expired(Instant::now());
        if expired {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|e| e.value.clone())
    }

    fn handle_set(&mut self, key: String, value: V) {
        let generation = self.bump_generation();
        self.entries.insert(key, Entry::new(value, generation));
    }

    fn handle_expire(&mut self, key: String, ttl: Duration) {
        let now = Instant::now();
        let overdue = match self.entries.get(&key) {
            None => return,
            Some(entry) => entry.is_expired(now),
        };
        if ttl.is_zero() || overdue {
            self.entries.remove(&key);
            return;
        }

        let generation = self.bump_generation();
        let timers = self.timers.clone();
        let Some(entry) = self.entries.get_mut(&key) else {
            return;
        };
        entry.cancel_timer();
        entry.generation = generation;
        entry.deadline = now.checked_add(ttl);
        if entry.deadline.is_none() {
            return;
        }

        let task = tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Some(sender) = timers.upgrade() {
                let _ = sender.send(CacheCommand::Evict { key, generation }).await;
            }
        });
        entry.timer = Some(task.abort_handle());
    }

    fn bump_generation(&mut self) -> u64 {
        let current = self.next_generation;
        self.next_generation += 1;
        current
    }
}
