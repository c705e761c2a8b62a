use crate::directory::LdapConfig;
use anyhow::Result;
use clap::{builder::BoolishValueParser, Arg, ArgAction, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_LDAP_SERVER: &str = "ldap-server";
pub const ARG_LDAP_PORT: &str = "ldap-port";
pub const ARG_LDAP_USE_TLS: &str = "ldap-use-tls";
pub const ARG_LDAP_BASE_DN: &str = "ldap-base-dn";
pub const ARG_LDAP_USER_DN: &str = "ldap-user-dn";
pub const ARG_LDAP_PASSWORD: &str = "ldap-password";

#[derive(Debug, Clone)]
pub struct Options {
    pub server: String,
    pub port: u16,
    pub use_tls: bool,
    pub base_dn: String,
    pub user_dn: String,
    pub password: SecretString,
}

impl Options {
    /// Parse directory arguments from matches.
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
            server: read_required(ARG_LDAP_SERVER)?,
            port: matches.get_one::<u16>(ARG_LDAP_PORT).copied().unwrap_or(389),
            use_tls: matches.get_flag(ARG_LDAP_USE_TLS),
            base_dn: read_required(ARG_LDAP_BASE_DN)?,
            user_dn: read_required(ARG_LDAP_USER_DN)?,
            password: SecretString::from(read_required(ARG_LDAP_PASSWORD)?),
        })
    }

    #[must_use]
    pub fn into_config(self) -> LdapConfig {
        LdapConfig::new(self.server, &self.base_dn, self.user_dn, self.password)
            .with_port(self.port)
            .with_tls(self.use_tls)
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_LDAP_SERVER)
                .long(ARG_LDAP_SERVER)
                .help("Directory server host name")
                .env("LDAP_SERVER")
                .required(true),
        )
        .arg(
            Arg::new(ARG_LDAP_PORT)
                .long(ARG_LDAP_PORT)
                .help("Directory server port")
                .default_value("389")
                .env("LDAP_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_LDAP_USE_TLS)
                .long(ARG_LDAP_USE_TLS)
                .help("Connect with ldaps:// instead of ldap://")
                .env("LDAP_USE_TLS")
                .action(ArgAction::SetTrue)
                .value_parser(BoolishValueParser::new()),
        )
        .arg(
            Arg::new(ARG_LDAP_BASE_DN)
                .long(ARG_LDAP_BASE_DN)
                .help("Search base, either DC=corp,DC=example or corp.example")
                .env("LDAP_BASE_DN")
                .required(true),
        )
        .arg(
            Arg::new(ARG_LDAP_USER_DN)
                .long(ARG_LDAP_USER_DN)
                .help("DN of the service account allowed to reset passwords")
                .env("LDAP_USER_DN")
                .required(true),
        )
        .arg(
            Arg::new(ARG_LDAP_PASSWORD)
                .long(ARG_LDAP_PASSWORD)
                .help("Password of the service account")
                .env("LDAP_PASSWORD")
                .hide_env_values(true)
                .required(true),
        )
}
