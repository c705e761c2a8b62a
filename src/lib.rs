//! # adreset (self-service directory password reset)
//!
//! `adreset` lets a user reset their directory (Active Directory style) password
//! by proving control of the email address stored on their account.
//!
//! ## Flow
//!
//! 1. `POST /api/send-code` looks the username up in the directory, checks the
//!    supplied email against the one on file (case-insensitive) and mails a
//!    six digit one-time code.
//! 2. `POST /api/reset-password` repeats the identity check, consumes the code
//!    and writes the new password to the directory.
//!
//! Pending codes live in memory only; a restart invalidates every outstanding
//! code. Lookup failures and email mismatches share one generic response so
//! the endpoints cannot be used to enumerate usernames.

pub mod api;
pub mod cli;
pub mod directory;
pub mod mail;
pub mod reset;
pub mod verification;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
