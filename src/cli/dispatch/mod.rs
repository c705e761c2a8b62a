//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to the server action with its full configuration.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{directory, mail, server};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let server_opts = server::Options::parse(matches)?;
    let directory_opts = directory::Options::parse(matches)?;
    let mail_opts = mail::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port: server_opts.port,
        advertised_host: server_opts.advertised_host,
        code_ttl: server_opts.code_ttl,
        max_code_attempts: server_opts.max_code_attempts,
        ldap: directory_opts.into_config(),
        smtp: mail_opts.into_config(),
    }))
}
