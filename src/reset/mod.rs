//! Password reset flow.
//!
//! Both entry points re-check the username/email pair against the directory.
//! Lookup failures and mismatches share one error so callers cannot tell an
//! unknown username from a wrong address.
//!
//! Code requests for the same email are serialized from send to store, so the
//! pending code is always the one in the most recently delivered message.

use crate::directory::{Directory, DirectoryError};
use crate::mail::{self, Mailer};
use crate::verification::{normalize_email, CheckOutcome, VerificationStore};
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{error, info, instrument, warn};

pub const DEFAULT_CODE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Error)]
pub enum ResetError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("All fields are required")]
    MissingFields,
    /// Code request for an unknown user, a wrong address or a failed lookup.
    #[error("User not found or user information unavailable")]
    LookupFailed,
    /// Reset attempt for an unknown user, a wrong address or a failed lookup.
    #[error("Invalid username or email address")]
    InvalidIdentity,
    #[error("Failed to send verification code")]
    SendFailed,
    #[error("Verification code is invalid or expired")]
    Code(CheckOutcome),
    #[error("Password reset failed: {0}")]
    WriteFailed(String),
}

/// Fields of a code request; `None` and blank values are treated alike.
#[derive(Debug, Default)]
pub struct CodeRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Default)]
pub struct ResetRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub code: Option<String>,
    pub new_password: Option<SecretString>,
}

impl std::fmt::Debug for ResetRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResetRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("code", &self.code.as_ref().map(|_| "***"))
            .field("new_password", &self.new_password.as_ref().map(|_| "***"))
            .finish()
    }
}

pub struct ResetService {
    directory: Arc<dyn Directory>,
    mailer: Arc<dyn Mailer>,
    store: Arc<dyn VerificationStore>,
    code_ttl: Duration,
    send_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ResetService {
    #[must_use]
    pub fn new(
        directory: Arc<dyn Directory>,
        mailer: Arc<dyn Mailer>,
        store: Arc<dyn VerificationStore>,
    ) -> Self {
        Self {
            directory,
            mailer,
            store,
            code_ttl: DEFAULT_CODE_TTL,
            send_locks: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn with_code_ttl(mut self, code_ttl: Duration) -> Self {
        self.code_ttl = code_ttl;
        self
    }

    #[must_use]
    pub fn code_ttl(&self) -> Duration {
        self.code_ttl
    }

    /// Verify the username/email pair and mail a fresh code.
    ///
    /// # Errors
    /// See [`ResetError`]; every failure is terminal for the request.
    #[instrument(skip(self))]
    pub async fn request_code(&self, request: CodeRequest) -> Result<(), ResetError> {
        let email = non_blank(request.email).ok_or_else(|| {
            warn!("Code request without email address");
            ResetError::MissingField("Email address")
        })?;
        let username = non_blank(request.username).ok_or_else(|| {
            warn!("Code request without username");
            ResetError::MissingField("Username")
        })?;

        info!("Code requested: username={username}, email={email}");

        let directory_email = self
            .matching_email(&username, &email)
            .await
            .ok_or(ResetError::LookupFailed)?;

        let _send_guard = self.lock_email(&email).await;

        let issued = mail::dispatch(self.mailer.as_ref(), &directory_email, self.code_ttl)
            .await
            .map_err(|_| ResetError::SendFailed)?;

        self.store.put(&email, &issued.code, issued.ttl).await;

        Ok(())
    }

    /// Consume the code and write the new password.
    ///
    /// # Errors
    /// See [`ResetError`]; every failure is terminal for the request.
    #[instrument(skip(self))]
    pub async fn complete_reset(&self, request: ResetRequest) -> Result<(), ResetError> {
        let username = non_blank(request.username);
        let email = non_blank(request.email);
        // Only blankness is checked here; the store compares the code as sent.
        let code = request.code.filter(|code| !code.trim().is_empty());
        let new_password = request
            .new_password
            .filter(|password| !password.expose_secret().is_empty());

        let (Some(username), Some(email), Some(code), Some(new_password)) =
            (username, email, code, new_password)
        else {
            warn!("Reset request with missing fields");
            return Err(ResetError::MissingFields);
        };

        info!("Password reset requested: username={username}, email={email}");

        if self.matching_email(&username, &email).await.is_none() {
            return Err(ResetError::InvalidIdentity);
        }

        match self.store.check(&email, &code).await {
            CheckOutcome::Valid => {}
            outcome => {
                warn!("Verification failed for {email}: {}", outcome.as_str());
                return Err(ResetError::Code(outcome));
            }
        }

        match self.directory.set_password(&username, &new_password).await {
            Ok(()) => {
                info!("Password reset completed for {username}");
                Ok(())
            }
            Err(err) => {
                error!("Password reset failed for {username}: {err}");
                Err(ResetError::WriteFailed(err.to_string()))
            }
        }
    }

    /// Hold the send lock for `email` until the guard is dropped.
    async fn lock_email(&self, email: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.send_locks.lock().await;
            // Locks nobody holds or waits for are only referenced by the map.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(normalize_email(email)).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Directory address for `username` when it equals `email` ignoring case.
    async fn matching_email(&self, username: &str, email: &str) -> Option<String> {
        let directory_email = match self.directory.lookup_email(username).await {
            Ok(directory_email) => directory_email,
            Err(DirectoryError::NotFound) => {
                warn!("No directory email for {username}");
                return None;
            }
            Err(err) => {
                error!("Directory lookup failed for {username}: {err}");
                return None;
            }
        };

        if directory_email.trim().to_lowercase() == email.trim().to_lowercase() {
            Some(directory_email)
        } else {
            warn!("Email mismatch for {username}: provided={email}, actual={directory_email}");
            None
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
