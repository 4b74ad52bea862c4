//! Session types: the id handed to clients and the entry stored for it.

use std::fmt;
use std::time::Duration;

use gatehouse_account::AccountId;
use rand::Rng;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// How long (in seconds) a session stays valid after sign-in.
    ///
    /// `None` means sessions last until sign-out or until the session
    /// store is dropped (process exit for the in-memory stores).
    ///
    /// Default: 24 hours.
    pub ttl_secs: Option<u64>,

    /// Whether the deployment is served over HTTPS. Reported back on
    /// sign-in so the transport can pick cookie attributes.
    ///
    /// Default: `false`.
    pub secure_cookies: bool,
}

impl SessionConfig {
    /// The session lifetime as a `Duration`, if one is configured.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: Some(24 * 60 * 60),
            secure_cookies: false,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// An opaque, unguessable session token.
///
/// 32 lowercase hex characters from 16 random bytes (128 bits). Guessing
/// a live one is computationally infeasible.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generates a fresh random session id.
    pub fn generate() -> Self {
        let bytes: [u8; 16] = rand::rng().random();
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// The full token, e.g. for a cookie value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first 8 characters, for logs. Never log the full token.
    pub fn prefix(&self) -> &str {
        log_prefix(&self.0)
    }

    /// Consumes the id and returns the token string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// First 8 characters of an untrusted token, safe for logs.
pub(crate) fn log_prefix(token: &str) -> &str {
    match token.char_indices().nth(8) {
        Some((idx, _)) => &token[..idx],
        None => token,
    }
}

// ---------------------------------------------------------------------------
// SessionEntry
// ---------------------------------------------------------------------------

/// What the session store keeps under each session id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionEntry {
    /// The account this session authenticates as.
    pub account_id: AccountId,
}
