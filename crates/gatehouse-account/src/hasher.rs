//! Password hashing.
//!
//! [`Pbkdf2Hasher`] produces self-describing digests:
//!
//! ```text
//! pbkdf2-sha256$<rounds>$<salt-hex>$<hash-hex>
//! ```
//!
//! The round count travels with the digest, so raising the default later
//! doesn't invalidate existing accounts.

use pbkdf2::pbkdf2_hmac;
use rand::Rng;
use sha2::Sha256;
use subtle::ConstantTimeEq;

const SCHEME: &str = "pbkdf2-sha256";

/// Default PBKDF2 iteration count.
pub const DEFAULT_ROUNDS: u32 = 100_000;

const SALT_BYTES: usize = 16;
const HASH_BYTES: usize = 32;

/// One-way password hashing.
///
/// Hashing is CPU-bound and synchronous; async callers should move it off
/// the runtime's worker threads (e.g. `tokio::task::spawn_blocking`).
pub trait PasswordHasher: Send + Sync + 'static {
    /// Hashes `plaintext` into a digest suitable for storage.
    fn hash(&self, plaintext: &str) -> String;

    /// Returns `true` if `plaintext` matches `digest`.
    ///
    /// A malformed digest never matches.
    fn verify(&self, plaintext: &str, digest: &str) -> bool;

    /// Spends roughly the cost of one `verify` without a real digest.
    ///
    /// Used when the account doesn't exist, so "no such user" and "wrong
    /// password" take about the same time.
    fn verify_dummy(&self, plaintext: &str) {
        let _ = self.verify(plaintext, "");
    }
}

/// PBKDF2-HMAC-SHA256 with a random 16-byte salt per digest.
#[derive(Debug, Clone)]
pub struct Pbkdf2Hasher {
    rounds: u32,
}

impl Pbkdf2Hasher {
    /// Creates a hasher with [`DEFAULT_ROUNDS`].
    pub fn new() -> Self {
        Self::with_rounds(DEFAULT_ROUNDS)
    }

    /// Creates a hasher with a custom round count (at least 1).
    ///
    /// Low counts are only meant for tests.
    pub fn with_rounds(rounds: u32) -> Self {
        Self {
            rounds: rounds.max(1),
        }
    }

    /// The round count used for new digests.
    pub fn rounds(&self) -> u32 {
        self.rounds
    }
}

impl Default for Pbkdf2Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher for Pbkdf2Hasher {
    fn hash(&self, plaintext: &str) -> String {
        let salt: [u8; SALT_BYTES] = rand::rng().random();
        let hash = derive(plaintext, &salt, self.rounds);
        format!(
            "{SCHEME}${}${}${}",
            self.rounds,
            hex::encode(salt),
            hex::encode(hash)
        )
    }

    fn verify(&self, plaintext: &str, digest: &str) -> bool {
        let Some(parsed) = ParsedDigest::parse(digest) else {
            return false;
        };
        let candidate = derive(plaintext, &parsed.salt, parsed.rounds);
        candidate.as_slice().ct_eq(parsed.hash.as_slice()).into()
    }

    fn verify_dummy(&self, plaintext: &str) {
        let _ = derive(plaintext, &[0u8; SALT_BYTES], self.rounds);
    }
}

/// The pieces of a stored digest.
struct ParsedDigest {
    rounds: u32,
    salt: Vec<u8>,
    hash: Vec<u8>,
}

impl ParsedDigest {
    fn parse(digest: &str) -> Option<Self> {
        let mut parts = digest.split('$');
        if parts.next()? != SCHEME {
            return None;
        }
        let rounds: u32 = parts.next()?.parse().ok()?;
        let salt = hex::decode(parts.next()?).ok()?;
        let hash = hex::decode(parts.next()?).ok()?;
        if parts.next().is_some() || rounds == 0 || hash.len() != HASH_BYTES {
            return None;
        }
        Some(Self { rounds, salt, hash })
    }
}

fn derive(plaintext: &str, salt: &[u8], rounds: u32) -> [u8; HASH_BYTES] {
    let mut out = [0u8; HASH_BYTES];
    pbkdf2_hmac::<Sha256>(plaintext.as_bytes(), salt, rounds, &mut out);
    out
}
