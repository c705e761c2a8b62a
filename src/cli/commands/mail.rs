use crate::mail::SmtpConfig;
use anyhow::Result;
use clap::{builder::BoolishValueParser, Arg, ArgAction, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_SMTP_SERVER: &str = "smtp-server";
pub const ARG_SMTP_PORT: &str = "smtp-port";
pub const ARG_SMTP_STARTTLS: &str = "smtp-starttls";
pub const ARG_SMTP_USERNAME: &str = "smtp-username";
pub const ARG_SMTP_PASSWORD: &str = "smtp-password";

#[derive(Debug, Clone)]
pub struct Options {
    pub server: String,
    pub port: u16,
    pub starttls: bool,
    pub username: String,
    pub password: SecretString,
}

impl Options {
    /// Parse mail relay arguments from matches.
    ///
    /// # Errors
    /// Returns an error if required arguments are missing or blank.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let read_required = |id: &str| -> Result<String> {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("missing required argument: --{id}"))
        };

        Ok(Self {
            server: read_required(ARG_SMTP_SERVER)?,
            port: matches.get_one::<u16>(ARG_SMTP_PORT).copied().unwrap_or(587),
            starttls: matches.get_flag(ARG_SMTP_STARTTLS),
            username: read_required(ARG_SMTP_USERNAME)?,
            password: SecretString::from(read_required(ARG_SMTP_PASSWORD)?),
        })
    }

    #[must_use]
    pub fn into_config(self) -> SmtpConfig {
        SmtpConfig::new(self.server, self.username, self.password)
            .with_port(self.port)
            .with_starttls(self.starttls)
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SMTP_SERVER)
                .long(ARG_SMTP_SERVER)
                .help("SMTP relay host name")
                .env("SMTP_SERVER")
                .required(true),
        )
        .arg(
            Arg::new(ARG_SMTP_PORT)
                .long(ARG_SMTP_PORT)
                .help("SMTP relay port")
                .default_value("587")
                .env("SMTP_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_SMTP_STARTTLS)
                .long(ARG_SMTP_STARTTLS)
                .help("Upgrade a plain connection with STARTTLS instead of using implicit TLS")
                .env("SMTP_STARTTLS")
                .action(ArgAction::SetTrue)
                .value_parser(BoolishValueParser::new()),
        )
        .arg(
            Arg::new(ARG_SMTP_USERNAME)
                .long(ARG_SMTP_USERNAME)
                .help("SMTP login, also used as the sender address")
                .env("SMTP_USERNAME")
                .required(true),
        )
        .arg(
            Arg::new(ARG_SMTP_PASSWORD)
                .long(ARG_SMTP_PASSWORD)
                .help("SMTP password")
                .env("SMTP_PASSWORD")
                .hide_env_values(true)
                .required(true),
        )
}
