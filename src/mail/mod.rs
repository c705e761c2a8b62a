//! One-time code generation and delivery.
//!
//! `dispatch` is the only path that hands a code back to the caller, and it
//! does so only after the transport accepted the message. A failed send
//! therefore never leaves a usable code behind.

mod smtp;

pub use smtp::{SmtpConfig, SmtpMailer};

use async_trait::async_trait;
use rand::{rngs::OsRng, Rng};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

pub const CODE_LENGTH: usize = 6;
pub const MESSAGE_SUBJECT: &str = "Password reset verification code";
pub const SENDER_NAME: &str = "Password Reset Service";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("failed to build message: {0}")]
    Build(String),
    #[error("mail transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver `code` to `to`. Returns only once the transport accepted the message.
    async fn send_code(&self, to: &str, code: &str, ttl: Duration) -> Result<(), MailError>;
}

/// A code that was delivered and may now be stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuedCode {
    pub code: String,
    pub ttl: Duration,
}

/// Six decimal digits from the OS random source; leading zeros allowed.
#[must_use]
pub fn generate_code() -> String {
    let mut rng = OsRng;
    (0..CODE_LENGTH)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Plain-text body for the verification mail.
#[must_use]
pub fn render_body(code: &str, ttl: Duration) -> String {
    let minutes = ttl.as_secs().div_ceil(60).max(1);
    let unit = if minutes == 1 { "minute" } else { "minutes" };
    format!("Your password reset verification code is: {code}. It is valid for {minutes} {unit}.")
}

/// Generate a code and send it to `email`.
///
/// # Errors
/// Returns the transport error when the message was not accepted.
pub async fn dispatch(
    mailer: &dyn Mailer,
    email: &str,
    ttl: Duration,
) -> Result<IssuedCode, MailError> {
    let code = generate_code();

    match mailer.send_code(email, &code, ttl).await {
        Ok(()) => {
            info!("Verification code sent to {email}");
            Ok(IssuedCode { code, ttl })
        }
        Err(err) => {
            error!("Failed to send verification code to {email}: {err}");
            Err(err)
        }
    }
}
