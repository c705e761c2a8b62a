//! Pending verification codes.
//!
//! A code is stored only after the mail carrying it was accepted by the
//! transport. Each email has at most one pending code; a new send replaces the
//! previous one. Entries are keyed by the normalized email so the check is not
//! sensitive to the casing the user typed.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Longest lifetime a pending code may have.
pub const MAX_CODE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Result of checking a supplied code against the pending entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Code matched; the entry has been consumed.
    Valid,
    NotFound,
    /// Entry was past its expiry and has been removed.
    Expired,
    /// Code differs; the entry stays usable until it expires.
    Mismatch,
}

impl CheckOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::NotFound => "not_found",
            Self::Expired => "expired",
            Self::Mismatch => "mismatch",
        }
    }
}

/// Storage for pending codes, injected into the reset flow.
#[async_trait]
pub trait VerificationStore: Send + Sync {
    /// Store `code` for `email`, replacing any pending code. `ttl` is capped at
    /// [`MAX_CODE_TTL`].
    async fn put(&self, email: &str, code: &str, ttl: Duration);

    /// The supplied code must equal the stored one byte for byte.
    async fn check(&self, email: &str, supplied: &str) -> CheckOutcome;

    async fn delete(&self, email: &str);
}

#[derive(Clone, Debug)]
pub struct PendingVerification {
    code: String,
    expires_at: Instant,
    failed_attempts: u32,
}

impl PendingVerification {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

/// Normalize an email for use as a store key.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Process-local store. State is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, PendingVerification>>,
    max_attempts: u32,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the pending code after `max_attempts` mismatches. Zero disables the cap.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Expiry of the pending code for `email`, if any.
    pub async fn expires_at(&self, email: &str) -> Option<Instant> {
        self.entries
            .lock()
            .await
            .get(&normalize_email(email))
            .map(|entry| entry.expires_at)
    }
}

#[async_trait]
impl VerificationStore for MemoryStore {
    async fn put(&self, email: &str, code: &str, ttl: Duration) {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl.min(MAX_CODE_TTL))
            .unwrap_or(now);
        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| !entry.is_expired(now));
        entries.insert(
            normalize_email(email),
            PendingVerification {
                code: code.to_string(),
                expires_at,
                failed_attempts: 0,
            },
        );
    }

    async fn check(&self, email: &str, supplied: &str) -> CheckOutcome {
        let key = normalize_email(email);
        let mut entries = self.entries.lock().await;

        let Some(entry) = entries.get_mut(&key) else {
            warn!(email = %key, "no pending verification code");
            return CheckOutcome::NotFound;
        };

        if entry.is_expired(Instant::now()) {
            warn!(email = %key, "verification code expired");
            entries.remove(&key);
            return CheckOutcome::Expired;
        }

        if entry.code != supplied {
            entry.failed_attempts = entry.failed_attempts.saturating_add(1);
            warn!(
                email = %key,
                failed_attempts = entry.failed_attempts,
                "verification code mismatch"
            );
            if self.max_attempts > 0 && entry.failed_attempts >= self.max_attempts {
                warn!(email = %key, "verification attempts exhausted");
                entries.remove(&key);
            }
            return CheckOutcome::Mismatch;
        }

        entries.remove(&key);
        debug!(email = %key, "verification code accepted");
        CheckOutcome::Valid
    }

    async fn delete(&self, email: &str) {
        self.entries.lock().await.remove(&normalize_email(email));
    }
}
