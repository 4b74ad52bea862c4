//! The session authenticator: sign-up, sign-in, validation, sign-out.
//!
//! `SessionAuthenticator` doesn't store anything itself. It composes three
//! injected collaborators:
//!
//! - an [`AccountStore`] for account records,
//! - a [`PasswordHasher`] for digests,
//! - a [`CacheStorage`] holding `session id → SessionEntry`.
//!
//! # Concurrency note
//!
//! Every method takes `&self` and may run from any number of tasks at
//! once. The only shared mutable state lives in the injected stores,
//! which serialize their own writes. Sign-up's two existence checks are
//! plain reads with no lock held between them and the insert; the account
//! store's own uniqueness check on `create` is what actually rejects a
//! concurrent duplicate.

use std::sync::Arc;

use chrono::Utc;
use gatehouse_account::{
    Account, AccountError, AccountField, AccountId, AccountStore, NewAccount,
    PasswordHasher,
};
use gatehouse_cache::CacheStorage;

use crate::session::log_prefix;
use crate::{AuthError, SessionConfig, SessionEntry, SessionId};

/// Result of a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignIn {
    /// The new session's token. Hand this to the client.
    pub session_id: SessionId,

    /// The account that signed in.
    pub account_id: AccountId,

    /// Whether the deployment runs over HTTPS (copied from
    /// [`SessionConfig::secure_cookies`]).
    pub secure: bool,
}

/// Verifies credentials and manages sessions.
///
/// ## Lifecycle
///
/// ```text
/// sign_up() ──→ sign_in() ──→ validate_session() ──→ sign_out()
///                  │                  │                   │
///                  ▼                  ▼                   ▼
///          cache.set(id)       cache.get(id)       cache.delete(id)
///          cache.expire(id)
/// ```
///
/// # Why generic instead of `dyn`?
///
/// [`AccountStore`] and [`CacheStorage`] return `impl Future`, which
/// rules out trait objects. Being generic also means every call is
/// monomorphized, and a test can swap one collaborator for a double
/// without touching the other two.
///
/// # Example
///
/// ```rust
/// use gatehouse_account::{MemoryAccountStore, Pbkdf2Hasher};
/// use gatehouse_cache::MemoryCache;
/// use gatehouse_session::{AuthError, SessionAuthenticator, SessionConfig, SessionEntry};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), AuthError> {
/// let auth = SessionAuthenticator::new(
///     MemoryAccountStore::new(),
///     Pbkdf2Hasher::with_rounds(1_000),
///     MemoryCache::<SessionEntry>::new(),
///     SessionConfig::default(),
/// );
///
/// let alice = auth.sign_up("alice", "a@x.com", "pw1").await?;
/// let session = auth.sign_in("alice", "pw1").await?.session_id;
/// assert_eq!(auth.validate_session(session.as_str()).await?, alice.id);
///
/// auth.sign_out(session.as_str()).await?;
/// assert!(matches!(
///     auth.validate_session(session.as_str()).await,
///     Err(AuthError::Unauthenticated)
/// ));
/// # Ok(())
/// # }
/// ```
pub struct SessionAuthenticator<S, H, C> {
    accounts: S,
    hasher: Arc<H>,
    sessions: C,
    config: SessionConfig,
}

impl<S, H, C> SessionAuthenticator<S, H, C>
where
    S: AccountStore,
    H: PasswordHasher,
    C: CacheStorage<Value = SessionEntry>,
{
    /// Creates an authenticator over the given collaborators.
    pub fn new(accounts: S, hasher: H, sessions: C, config: SessionConfig) -> Self {
        Self {
            accounts,
            hasher: Arc::new(hasher),
            sessions,
            config,
        }
    }

    /// The session configuration in use.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The account store.
    pub fn accounts(&self) -> &S {
        &self.accounts
    }

    /// The session store.
    pub fn sessions(&self) -> &C {
        &self.sessions
    }

    /// Registers a new account.
    ///
    /// # Errors
    /// - [`AuthError::Validation`]: empty name or password, or an email
    ///   without `@`
    /// - [`AuthError::Conflict`]: name or email already in use; nothing
    ///   is created
    pub async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Account, AuthError> {
        validate_sign_up(name, email, password)?;

        if self.accounts.find_by_name(name).await?.is_some() {
            return Err(AuthError::Conflict(AccountField::Name));
        }
        if self.accounts.find_by_email(email).await?.is_some() {
            return Err(AuthError::Conflict(AccountField::Email));
        }

        let hasher = Arc::clone(&self.hasher);
        let plaintext = password.to_owned();
        let password_digest = tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        let account = self
            .accounts
            .create(NewAccount {
                name: name.to_owned(),
                email: email.to_owned(),
                password_digest,
            })
            .await
            .map_err(|e| match e {
                // Lost a race with a concurrent sign-up.
                AccountError::Duplicate(field) => AuthError::Conflict(field),
                other => AuthError::Account(other),
            })?;

        tracing::info!(account_id = %account.id, "account created");
        Ok(account)
    }

    /// Checks credentials and opens a new session.
    ///
    /// # Errors
    /// - [`AuthError::Unauthorized`]: unknown name or wrong password
    ///   (the caller can't tell which)
    /// - [`AuthError::Validation`]: the store rejected the last-login update
    ///   (account vanished, or the timestamp went backwards)
    /// - [`AuthError::Account`]: the account store is unreachable
    pub async fn sign_in(&self, name: &str, password: &str) -> Result<SignIn, AuthError> {
        let account = self.accounts.find_by_name(name).await?;

        let hasher = Arc::clone(&self.hasher);
        let plaintext = password.to_owned();
        let digest = account.as_ref().map(|a| a.password_digest.clone());
        let verified = tokio::task::spawn_blocking(move || match digest {
            Some(digest) => hasher.verify(&plaintext, &digest),
            None => {
                hasher.verify_dummy(&plaintext);
                false
            }
        })
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?;

        let account = match account {
            Some(account) if verified => account,
            _ => {
                tracing::info!("sign-in rejected");
                return Err(AuthError::Unauthorized);
            }
        };

        self.accounts
            .record_login(account.id, Utc::now())
            .await
            .map_err(|e| match e {
                AccountError::NotFound(_) | AccountError::LoginRegression(_) => {
                    AuthError::Validation(e.to_string())
                }
                other => AuthError::Account(other),
            })?;

        let session_id = self.create_session(account.id).await?;

        tracing::info!(
            account_id = %account.id,
            session = %session_id.prefix(),
            "signed in"
        );

        Ok(SignIn {
            session_id,
            account_id: account.id,
            secure: self.config.secure_cookies,
        })
    }

    /// Issues a session for an already-authenticated account.
    ///
    /// Writes `id → SessionEntry` into the session store and, when a TTL
    /// is configured, schedules its expiry. If scheduling fails the entry
    /// is removed again: the caller never learns the id, so a session
    /// left behind without a TTL could never be signed out.
    pub async fn create_session(&self, account_id: AccountId) -> Result<SessionId, AuthError> {
        let session_id = SessionId::generate();

        self.sessions
            .set(session_id.as_str(), SessionEntry { account_id })
            .await?;
        if let Some(ttl) = self.config.ttl() {
            if let Err(err) = self.sessions.expire(session_id.as_str(), ttl).await {
                let _ = self.sessions.delete(session_id.as_str()).await;
                tracing::warn!(
                    session = %session_id.prefix(),
                    error = %err,
                    "session expiry failed, entry discarded"
                );
                return Err(err.into());
            }
        }

        tracing::info!(
            %account_id,
            session = %session_id.prefix(),
            "session created"
        );
        Ok(session_id)
    }

    /// Resolves a session id to its account.
    ///
    /// # Errors
    /// [`AuthError::Unauthenticated`] if the id is unknown, signed out,
    /// or expired.
    pub async fn validate_session(&self, session_id: &str) -> Result<AccountId, AuthError> {
        match self.sessions.get(session_id).await? {
            Some(entry) => Ok(entry.account_id),
            None => {
                tracing::debug!(session = %log_prefix(session_id), "unknown session");
                Err(AuthError::Unauthenticated)
            }
        }
    }

    /// Ends a session. Unconditional and idempotent.
    ///
    /// Callers gate this behind [`validate_session`](Self::validate_session);
    /// it doesn't re-check that the session exists.
    pub async fn sign_out(&self, session_id: &str) -> Result<(), AuthError> {
        self.sessions.delete(session_id).await?;
        tracing::info!(session = %log_prefix(session_id), "signed out");
        Ok(())
    }
}

fn validate_sign_up(name: &str, email: &str, password: &str) -> Result<(), AuthError> {
    if name.trim().is_empty() {
        return Err(AuthError::Validation("name must not be empty".into()));
    }
    if email.trim().is_empty() || !email.contains('@') {
        return Err(AuthError::Validation("email must be an email address".into()));
    }
    if password.is_empty() {
        return Err(AuthError::Validation("password must not be empty".into()));
    }
    Ok(())
}

// =========================================================================
// Tests
// =========================================================================
