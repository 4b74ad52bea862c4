//! Key-value cache storage for Gatehouse.
//!
//! Provides the [`CacheStorage`] trait: a small async key-value contract
//! with per-key expiry, used for sessions and any other short-lived data.
//!
//! Two implementations ship with the crate:
//!
//! - [`MemoryCache`]: a shared map behind a mutex. Every caller touches
//!   the map directly; expiry is enforced with per-key timer tasks.
//! - [`ActorCache`]: a single task owns the map and serves requests from
//!   a channel. Callers wait a bounded time for each reply.
//!
//! Both are process-local: entries do not survive a restart.
//!
//! # How it fits in the stack
//!
//! ```text
//! HTTP layer (gatehouse)          ← reads the session cookie
//!     ↕
//! Session layer (gatehouse-session) ← session id → account id
//!     ↕
//! Cache layer (this crate)        ← typed key-value entries with expiry
//! ```

mod actor;
mod error;
mod memory;

pub use actor::{ActorCache, ActorCacheConfig};
pub use error::CacheError;
pub use memory::MemoryCache;

use std::future::Future;
use std::time::Duration;

/// A key-value store with time-based expiry.
///
/// Keys are strings. The value type is fixed per store instance through
/// [`Value`](Self::Value), so a session store holds session entries and
/// nothing else.
///
/// # Contract
///
/// - `get` right after `set` on the same key returns the value just set.
/// - Conflicting calls on the same key are serialized: no `get` observes a
///   value older than the latest write that completed before it started.
/// - Nothing is promised about ordering across different keys.
/// - A `get` racing an expiry may return the value or `None`, never a
///   partially written value.
///
/// Errors are transport-class only ([`CacheError`]). A missing key is
/// never an error.
///
/// # Why an associated value type?
///
/// Callers never serialize anything: a session store hands back a
/// `SessionEntry`, not bytes. A store that talks to a remote service does
/// its own encoding behind the trait, and the session layer stays the same.
///
/// # Trait bounds
///
/// - `Send + Sync` → one store is shared by every request task, and Tokio
///   may poll those tasks on different threads.
/// - `'static` → the store lives as long as the server.
/// - Each returned future is `Send`, so callers can hold it across
///   `.await` inside spawned tasks and axum handlers.
///
/// # Example
///
/// Using the in-memory store:
///
/// ```rust
/// use std::time::Duration;
///
/// use gatehouse_cache::{CacheError, CacheStorage, MemoryCache};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), CacheError> {
/// let cache = MemoryCache::<u32>::new();
///
/// cache.set("answer", 42).await?;
/// cache.expire("answer", Duration::from_secs(60)).await?;
/// assert_eq!(cache.get("answer").await?, Some(42));
///
/// cache.delete("answer").await?;
/// assert_eq!(cache.get("answer").await?, None);
/// # Ok(())
/// # }
/// ```
///
/// Implementing it (a store that keeps nothing, handy for exercising
/// "session not found" paths):
///
/// ```rust
/// use std::time::Duration;
///
/// use gatehouse_cache::{CacheError, CacheStorage};
///
/// struct NullCache;
///
/// impl CacheStorage for NullCache {
///     type Value = String;
///
///     async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
///         Ok(None)
///     }
///
///     async fn set(&self, _key: &str, _value: String) -> Result<(), CacheError> {
///         Ok(())
///     }
///
///     async fn delete(&self, _key: &str) -> Result<(), CacheError> {
///         Ok(())
///     }
///
///     async fn expire(&self, _key: &str, _ttl: Duration) -> Result<(), CacheError> {
///         Ok(())
///     }
/// }
/// ```
pub trait CacheStorage: Send + Sync + 'static {
    /// The type stored under each key.
    type Value: Clone + Send + Sync + 'static;

    /// Returns the value stored under `key`, or `None` if absent or expired.
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<Self::Value>, CacheError>> + Send;

    /// Inserts or overwrites `key`. Clears any expiry pending on the key.
    fn set(
        &self,
        key: &str,
        value: Self::Value,
    ) -> impl Future<Output = Result<(), CacheError>> + Send;

    /// Removes `key`. Deleting an absent key succeeds.
    fn delete(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<(), CacheError>> + Send;

    /// Schedules removal of `key` once `ttl` has elapsed.
    ///
    /// No effect if the key is absent, including an entry whose earlier
    /// deadline has already passed. A zero `ttl` removes the key now. A
    /// `ttl` too large for the clock leaves the key without a deadline.
    fn expire(
        &self,
        key: &str,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), CacheError>> + Send;
}
