//! Integration tests for the full sign-up → sign-in → sign-out flow,
//! including failure injection at the account-store and cache boundaries.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use gatehouse_account::{
    Account, AccountError, AccountField, AccountId, AccountStore, MemoryAccountStore,
    NewAccount, Pbkdf2Hasher,
};
use gatehouse_cache::{ActorCache, ActorCacheConfig, CacheError, CacheStorage, MemoryCache};
use gatehouse_session::{AuthError, SessionAuthenticator, SessionConfig, SessionEntry};

// =========================================================================
// Test doubles
// =========================================================================

/// Delegates to `MemoryAccountStore` but fails every login update with
/// the configured error.
struct LoginRejectingStore {
    inner: MemoryAccountStore,
    error: AccountError,
}

impl LoginRejectingStore {
    fn new(error: AccountError) -> Self {
        Self {
            inner: MemoryAccountStore::new(),
            error,
        }
    }
}

impl AccountStore for LoginRejectingStore {
    async fn create(&self, account: NewAccount) -> Result<Account, AccountError> {
        self.inner.create(account).await
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Account>, AccountError> {
        self.inner.find_by_name(name).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError> {
        self.inner.find_by_email(email).await
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AccountError> {
        self.inner.find_by_id(id).await
    }

    async fn record_login(
        &self,
        _id: AccountId,
        _at: DateTime<Utc>,
    ) -> Result<Account, AccountError> {
        Err(self.error.clone())
    }
}

/// Delegates to `MemoryCache` but times out on every `expire`.
#[derive(Clone, Default)]
struct ExpireFailingCache(MemoryCache<SessionEntry>);

impl CacheStorage for ExpireFailingCache {
    type Value = SessionEntry;

    async fn get(&self, key: &str) -> Result<Option<SessionEntry>, CacheError> {
        self.0.get(key).await
    }

    async fn set(&self, key: &str, value: SessionEntry) -> Result<(), CacheError> {
        self.0.set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.0.delete(key).await
    }

    async fn expire(&self, _key: &str, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Timeout(Duration::from_secs(5)))
    }
}

/// Reports every name and email as free, so sign-up relies entirely on
/// the store's own uniqueness check in `create`.
struct BlindLookupStore(MemoryAccountStore);

impl AccountStore for BlindLookupStore {
    async fn create(&self, account: NewAccount) -> Result<Account, AccountError> {
        self.0.create(account).await
    }

    async fn find_by_name(&self, _name: &str) -> Result<Option<Account>, AccountError> {
        Ok(None)
    }

    async fn find_by_email(&self, _email: &str) -> Result<Option<Account>, AccountError> {
        Ok(None)
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AccountError> {
        self.0.find_by_id(id).await
    }

    async fn record_login(
        &self,
        id: AccountId,
        at: DateTime<Utc>,
    ) -> Result<Account, AccountError> {
        self.0.record_login(id, at).await
    }
}

// =========================================================================
// Helpers
// =========================================================================

fn hasher() -> Pbkdf2Hasher {
    Pbkdf2Hasher::with_rounds(1_000)
}

fn memory_authenticator()
-> SessionAuthenticator<MemoryAccountStore, Pbkdf2Hasher, MemoryCache<SessionEntry>> {
    SessionAuthenticator::new(
        MemoryAccountStore::new(),
        hasher(),
        MemoryCache::new(),
        SessionConfig::default(),
    )
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_full_flow_alice_scenario() {
    let auth = memory_authenticator();

    // Sign-up succeeds, a second "alice" collides on name.
    let alice = auth.sign_up("alice", "a@x.com", "pw1").await.unwrap();
    let dup = auth.sign_up("alice", "b@x.com", "pw2").await;
    assert!(matches!(dup, Err(AuthError::Conflict(AccountField::Name))));

    // Good password signs in, bad one doesn't.
    let session = auth.sign_in("alice", "pw1").await.unwrap().session_id;
    assert!(matches!(
        auth.sign_in("alice", "wrong").await,
        Err(AuthError::Unauthorized)
    ));

    // The session resolves to alice until she signs out.
    assert_eq!(auth.validate_session(session.as_str()).await.unwrap(), alice.id);
    auth.sign_out(session.as_str()).await.unwrap();

    // Replaying the old cookie fails at the validation gate.
    assert!(matches!(
        auth.validate_session(session.as_str()).await,
        Err(AuthError::Unauthenticated)
    ));
}

#[tokio::test]
async fn test_flow_over_actor_cache() {
    let auth = SessionAuthenticator::new(
        MemoryAccountStore::new(),
        hasher(),
        ActorCache::<SessionEntry>::spawn(ActorCacheConfig::default()),
        SessionConfig::default(),
    );
    let alice = auth.sign_up("alice", "a@x.com", "pw1").await.unwrap();

    let session = auth.sign_in("alice", "pw1").await.unwrap().session_id;
    assert_eq!(auth.validate_session(session.as_str()).await.unwrap(), alice.id);

    auth.sign_out(session.as_str()).await.unwrap();
    assert!(matches!(
        auth.validate_session(session.as_str()).await,
        Err(AuthError::Unauthenticated)
    ));
}

#[tokio::test]
async fn test_rejected_login_update_returns_validation_and_no_session() {
    for error in [
        AccountError::LoginRegression(AccountId(1)),
        AccountError::NotFound(AccountId(1)),
    ] {
        let auth = SessionAuthenticator::new(
            LoginRejectingStore::new(error.clone()),
            hasher(),
            MemoryCache::<SessionEntry>::new(),
            SessionConfig::default(),
        );
        auth.sign_up("alice", "a@x.com", "pw1").await.unwrap();

        let result = auth.sign_in("alice", "pw1").await;

        assert!(
            matches!(&result, Err(AuthError::Validation(msg)) if *msg == error.to_string()),
            "expected validation error for {error:?}, got {result:?}"
        );
        assert!(auth.sessions().is_empty().await);
    }
}

#[tokio::test]
async fn test_unreachable_store_on_login_update_returns_account_error() {
    let auth = SessionAuthenticator::new(
        LoginRejectingStore::new(AccountError::Unavailable("replica down".into())),
        hasher(),
        MemoryCache::<SessionEntry>::new(),
        SessionConfig::default(),
    );
    auth.sign_up("alice", "a@x.com", "pw1").await.unwrap();

    let result = auth.sign_in("alice", "pw1").await;

    assert!(
        matches!(result, Err(AuthError::Account(AccountError::Unavailable(_)))),
        "expected account error, got {result:?}"
    );
    assert!(auth.sessions().is_empty().await);
}

#[tokio::test]
async fn test_failed_expiry_leaves_no_session_behind() {
    let cache = ExpireFailingCache::default();
    let auth = SessionAuthenticator::new(
        MemoryAccountStore::new(),
        hasher(),
        cache.clone(),
        SessionConfig::default(),
    );
    auth.sign_up("alice", "a@x.com", "pw1").await.unwrap();

    let result = auth.sign_in("alice", "pw1").await;

    assert!(
        matches!(result, Err(AuthError::Cache(CacheError::Timeout(_)))),
        "expected cache timeout, got {result:?}"
    );
    assert!(cache.0.is_empty().await, "orphaned session left in the cache");
}

#[tokio::test]
async fn test_store_uniqueness_catches_duplicate_missed_by_lookups() {
    let auth = SessionAuthenticator::new(
        BlindLookupStore(MemoryAccountStore::new()),
        hasher(),
        MemoryCache::<SessionEntry>::new(),
        SessionConfig::default(),
    );
    auth.sign_up("alice", "a@x.com", "pw1").await.unwrap();

    let by_name = auth.sign_up("alice", "b@x.com", "pw2").await;
    let by_email = auth.sign_up("bob", "a@x.com", "pw2").await;

    assert!(matches!(by_name, Err(AuthError::Conflict(AccountField::Name))));
    assert!(matches!(by_email, Err(AuthError::Conflict(AccountField::Email))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicate_sign_ups_create_one_account() {
    let auth = Arc::new(memory_authenticator());

    let mut handles = Vec::new();
    for i in 0..8 {
        let auth = Arc::clone(&auth);
        handles.push(tokio::spawn(async move {
            auth.sign_up("alice", &format!("alice{i}@x.com"), "pw").await
        }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.expect("sign-up task panicked") {
            Ok(_) => created += 1,
            Err(AuthError::Conflict(AccountField::Name)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(auth.accounts().len().await, 1);
}

#[tokio::test]
async fn test_cache_outage_surfaces_as_cache_error() {
    let cache = ActorCache::<SessionEntry>::spawn(ActorCacheConfig::default());
    let auth = SessionAuthenticator::new(
        MemoryAccountStore::new(),
        hasher(),
        cache.clone(),
        SessionConfig::default(),
    );
    auth.sign_up("alice", "a@x.com", "pw1").await.unwrap();

    cache.shutdown().await;

    let result = auth.sign_in("alice", "pw1").await;
    assert!(
        matches!(result, Err(AuthError::Cache(CacheError::Unavailable))),
        "expected cache error, got {result:?}"
    );
    assert!(matches!(
        auth.validate_session("anything").await,
        Err(AuthError::Cache(CacheError::Unavailable))
    ));
}
