//! Account storage contract and the in-memory implementation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{Account, AccountError, AccountField, AccountId, NewAccount};

/// Persistent account storage.
///
/// Implementations must enforce name and email uniqueness themselves:
/// callers may run their own existence checks first, but only `create`
/// sees every concurrent insert.
pub trait AccountStore: Send + Sync + 'static {
    /// Inserts a new account and returns it with its id and timestamps.
    ///
    /// # Errors
    /// [`AccountError::Duplicate`] if the name or email is taken.
    fn create(
        &self,
        account: NewAccount,
    ) -> impl Future<Output = Result<Account, AccountError>> + Send;

    /// Looks up an account by exact name.
    fn find_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Account>, AccountError>> + Send;

    /// Looks up an account by exact email.
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<Account>, AccountError>> + Send;

    /// Looks up an account by id.
    fn find_by_id(
        &self,
        id: AccountId,
    ) -> impl Future<Output = Result<Option<Account>, AccountError>> + Send;

    /// Stores `at` as the account's last-login time.
    ///
    /// # Errors
    /// - [`AccountError::NotFound`]: unknown id
    /// - [`AccountError::LoginRegression`]: `at` is earlier than the
    ///   stored last-login time
    fn record_login(
        &self,
        id: AccountId,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<Account, AccountError>> + Send;
}

/// Tables behind one lock so uniqueness checks and inserts are atomic.
#[derive(Debug, Default)]
struct Tables {
    accounts: HashMap<AccountId, Account>,
    by_name: HashMap<String, AccountId>,
    by_email: HashMap<String, AccountId>,
}

/// Process-local account store.
///
/// Names and emails are compared exactly (case-sensitive, no trimming).
#[derive(Debug)]
pub struct MemoryAccountStore {
    tables: RwLock<Tables>,
    next_id: AtomicU64,
}

impl MemoryAccountStore {
    /// Creates an empty store. Ids start at 1.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Returns the number of stored accounts.
    pub async fn len(&self) -> usize {
        self.tables.read().await.accounts.len()
    }

    /// Returns `true` if no accounts are stored.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountStore for MemoryAccountStore {
    async fn create(&self, account: NewAccount) -> Result<Account, AccountError> {
        let mut tables = self.tables.write().await;

        if tables.by_name.contains_key(&account.name) {
            return Err(AccountError::Duplicate(AccountField::Name));
        }
        if tables.by_email.contains_key(&account.email) {
            return Err(AccountError::Duplicate(AccountField::Email));
        }

        let id = AccountId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let stored = Account {
            id,
            name: account.name,
            email: account.email,
            password_digest: account.password_digest,
            created_at: Utc::now(),
            login_at: None,
        };

        tables.by_name.insert(stored.name.clone(), id);
        tables.by_email.insert(stored.email.clone(), id);
        tables.accounts.insert(id, stored.clone());

        tracing::debug!(account_id = %id, "account stored");
        Ok(stored)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Account>, AccountError> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_name
            .get(name)
            .and_then(|id| tables.accounts.get(id))
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_email
            .get(email)
            .and_then(|id| tables.accounts.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AccountError> {
        Ok(self.tables.read().await.accounts.get(&id).cloned())
    }

    async fn record_login(
        &self,
        id: AccountId,
        at: DateTime<Utc>,
    ) -> Result<Account, AccountError> {
        let mut tables = self.tables.write().await;
        let account = tables
            .accounts
            .get_mut(&id)
            .ok_or(AccountError::NotFound(id))?;

        if account.login_at.is_some_and(|previous| at < previous) {
            return Err(AccountError::LoginRegression(id));
        }
        account.login_at = Some(at);
        Ok(account.clone())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn new_account(name: &str, email: &str) -> NewAccount {
        NewAccount {
            name: name.to_string(),
            email: email.to_string(),
            password_digest: "digest".to_string(),
        }
    }

    // =====================================================================
    // create()
    // =====================================================================

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let store = MemoryAccountStore::new();

        let a = store.create(new_account("alice", "a@x.com")).await.unwrap();
        let b = store.create(new_account("bob", "b@x.com")).await.unwrap();

        assert_eq!(a.id, AccountId(1));
        assert_eq!(b.id, AccountId(2));
        assert!(a.login_at.is_none());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_create_duplicate_name_returns_conflict() {
        let store = MemoryAccountStore::new();
        store.create(new_account("alice", "a@x.com")).await.unwrap();

        let result = store.create(new_account("alice", "other@x.com")).await;

        assert_eq!(result, Err(AccountError::Duplicate(AccountField::Name)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_create_duplicate_email_returns_conflict() {
        let store = MemoryAccountStore::new();
        store.create(new_account("alice", "a@x.com")).await.unwrap();

        let result = store.create(new_account("carol", "a@x.com")).await;

        assert_eq!(result, Err(AccountError::Duplicate(AccountField::Email)));
    }

    // =====================================================================
    // find_*()
    // =====================================================================

    #[tokio::test]
    async fn test_find_by_name_and_email_return_same_account() {
        let store = MemoryAccountStore::new();
        let created = store.create(new_account("alice", "a@x.com")).await.unwrap();

        let by_name = store.find_by_name("alice").await.unwrap();
        let by_email = store.find_by_email("a@x.com").await.unwrap();
        let by_id = store.find_by_id(created.id).await.unwrap();

        assert_eq!(by_name.as_ref(), Some(&created));
        assert_eq!(by_email.as_ref(), Some(&created));
        assert_eq!(by_id.as_ref(), Some(&created));
    }

    #[tokio::test]
    async fn test_find_unknown_returns_none() {
        let store = MemoryAccountStore::new();

        assert!(store.find_by_name("ghost").await.unwrap().is_none());
        assert!(store.find_by_email("ghost@x.com").await.unwrap().is_none());
        assert!(store.find_by_id(AccountId(99)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_name_is_case_sensitive() {
        let store = MemoryAccountStore::new();
        store.create(new_account("alice", "a@x.com")).await.unwrap();

        assert!(store.find_by_name("Alice").await.unwrap().is_none());
    }

    // =====================================================================
    // record_login()
    // =====================================================================

    #[tokio::test]
    async fn test_record_login_sets_timestamp() {
        let store = MemoryAccountStore::new();
        let created = store.create(new_account("alice", "a@x.com")).await.unwrap();
        let at = Utc::now();

        let updated = store.record_login(created.id, at).await.unwrap();

        assert_eq!(updated.login_at, Some(at));
        let reloaded = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(reloaded.login_at, Some(at));
    }

    #[tokio::test]
    async fn test_record_login_earlier_time_returns_regression() {
        let store = MemoryAccountStore::new();
        let created = store.create(new_account("alice", "a@x.com")).await.unwrap();
        let at = Utc::now();
        store.record_login(created.id, at).await.unwrap();

        let result = store.record_login(created.id, at - Duration::seconds(5)).await;

        assert_eq!(result, Err(AccountError::LoginRegression(created.id)));
    }

    #[tokio::test]
    async fn test_record_login_same_time_is_allowed() {
        let store = MemoryAccountStore::new();
        let created = store.create(new_account("alice", "a@x.com")).await.unwrap();
        let at = Utc::now();
        store.record_login(created.id, at).await.unwrap();

        assert!(store.record_login(created.id, at).await.is_ok());
    }

    #[tokio::test]
    async fn test_record_login_unknown_account_returns_not_found() {
        let store = MemoryAccountStore::new();

        let result = store.record_login(AccountId(7), Utc::now()).await;

        assert_eq!(result, Err(AccountError::NotFound(AccountId(7))));
    }
}
