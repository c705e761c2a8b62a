use crate::verification::MAX_CODE_TTL;
use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use std::time::Duration;

pub const ARG_PORT: &str = "port";
pub const ARG_ADVERTISED_HOST: &str = "advertised-host";
pub const ARG_CODE_TTL_SECONDS: &str = "code-ttl-seconds";
pub const ARG_MAX_CODE_ATTEMPTS: &str = "max-code-attempts";

#[derive(Debug, Clone)]
pub struct Options {
    pub port: u16,
    pub advertised_host: String,
    pub code_ttl: Duration,
    /// 0 means unlimited.
    pub max_code_attempts: u32,
}

impl Options {
    /// Parse listener and verification arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the code lifetime is zero or longer than a day.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let code_ttl_seconds = matches
            .get_one::<u64>(ARG_CODE_TTL_SECONDS)
            .copied()
            .unwrap_or(300);
        if code_ttl_seconds == 0 {
            anyhow::bail!("--{ARG_CODE_TTL_SECONDS} must be greater than zero");
        }
        if code_ttl_seconds > MAX_CODE_TTL.as_secs() {
            anyhow::bail!(
                "--{ARG_CODE_TTL_SECONDS} must be at most {} seconds",
                MAX_CODE_TTL.as_secs()
            );
        }

        Ok(Self {
            port: matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(5001),
            advertised_host: matches
                .get_one::<String>(ARG_ADVERTISED_HOST)
                .cloned()
                .context("missing required argument: --advertised-host")?,
            code_ttl: Duration::from_secs(code_ttl_seconds),
            max_code_attempts: matches
                .get_one::<u32>(ARG_MAX_CODE_ATTEMPTS)
                .copied()
                .unwrap_or(0),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("5001")
                .env("ADRESET_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_ADVERTISED_HOST)
                .long(ARG_ADVERTISED_HOST)
                .help("Host name or IP the frontend uses to reach this API")
                .default_value("localhost")
                .env("SERVER_IP"),
        )
        .arg(
            Arg::new(ARG_CODE_TTL_SECONDS)
                .long(ARG_CODE_TTL_SECONDS)
                .help("Lifetime of a verification code in seconds")
                .default_value("300")
                .env("ADRESET_CODE_TTL_SECONDS")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_MAX_CODE_ATTEMPTS)
                .long(ARG_MAX_CODE_ATTEMPTS)
                .help("Wrong guesses allowed before a code is discarded (0 = unlimited)")
                .default_value("0")
                .env("ADRESET_MAX_CODE_ATTEMPTS")
                .value_parser(clap::value_parser!(u32)),
        )
}
