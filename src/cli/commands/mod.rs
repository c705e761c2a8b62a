pub mod directory;
pub mod logging;
pub mod mail;
pub mod server;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    ColorChoice, Command,
};

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("adreset")
        .about("Self-service directory password reset")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles);

    let command = server::with_args(command);
    let command = directory::with_args(command);
    let command = mail::with_args(command);
    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const REQUIRED_ENV: [(&str, Option<&str>); 7] = [
        ("LDAP_SERVER", Some("dc01.corp.test")),
        ("LDAP_BASE_DN", Some("corp.test")),
        ("LDAP_USER_DN", Some("CN=svc-reset,OU=Service,DC=corp,DC=test")),
        ("LDAP_PASSWORD", Some("bind-secret")),
        ("SMTP_SERVER", Some("smtp.corp.test")),
        ("SMTP_USERNAME", Some("noreply@corp.test")),
        ("SMTP_PASSWORD", Some("smtp-secret")),
    ];

    fn cleared_optional_env() -> Vec<(&'static str, Option<&'static str>)> {
        vec![
            ("ADRESET_PORT", None),
            ("SERVER_IP", None),
            ("ADRESET_CODE_TTL_SECONDS", None),
            ("ADRESET_MAX_CODE_ATTEMPTS", None),
            ("ADRESET_LOG_LEVEL", None),
            ("ADRESET_LOG_DIR", None),
            ("LDAP_PORT", None),
            ("LDAP_USE_TLS", None),
            ("SMTP_PORT", None),
            ("SMTP_STARTTLS", None),
        ]
    }

    fn env_with(
        overrides: &[(&'static str, Option<&'static str>)],
    ) -> Vec<(&'static str, Option<&'static str>)> {
        let mut vars: Vec<_> = REQUIRED_ENV.to_vec();
        vars.extend(cleared_optional_env());
        for &(key, value) in overrides {
            vars.retain(|&(k, _)| k != key);
            vars.push((key, value));
        }
        vars
    }

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "adreset");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Self-service directory password reset".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_defaults_from_env() {
        temp_env::with_vars(env_with(&[]), || {
            let matches = new().get_matches_from(vec!["adreset"]);
            assert_eq!(matches.get_one::<u16>(server::ARG_PORT).copied(), Some(5001));
            assert_eq!(
                matches
                    .get_one::<String>(server::ARG_ADVERTISED_HOST)
                    .map(String::as_str),
                Some("localhost")
            );
            assert_eq!(
                matches.get_one::<u64>(server::ARG_CODE_TTL_SECONDS).copied(),
                Some(300)
            );
            assert_eq!(
                matches.get_one::<u32>(server::ARG_MAX_CODE_ATTEMPTS).copied(),
                Some(0)
            );
            assert_eq!(
                matches.get_one::<u16>(directory::ARG_LDAP_PORT).copied(),
                Some(389)
            );
            assert!(!matches.get_flag(directory::ARG_LDAP_USE_TLS));
            assert_eq!(matches.get_one::<u16>(mail::ARG_SMTP_PORT).copied(), Some(587));
            assert!(!matches.get_flag(mail::ARG_SMTP_STARTTLS));
            assert_eq!(
                matches.get_one::<PathBuf>(logging::ARG_LOG_DIR),
                Some(&PathBuf::from("logs"))
            );
        });
    }

    #[test]
    fn test_env_overrides() {
        let overrides = [
            ("ADRESET_PORT", Some("8443")),
            ("SERVER_IP", Some("10.0.0.5")),
            ("LDAP_PORT", Some("636")),
            ("LDAP_USE_TLS", Some("true")),
            ("SMTP_PORT", Some("465")),
            ("SMTP_STARTTLS", Some("1")),
            ("ADRESET_LOG_LEVEL", Some("info")),
            ("ADRESET_LOG_DIR", Some("/var/log/adreset")),
        ];
        temp_env::with_vars(env_with(&overrides), || {
            let matches = new().get_matches_from(vec!["adreset"]);
            assert_eq!(matches.get_one::<u16>(server::ARG_PORT).copied(), Some(8443));
            assert_eq!(
                matches
                    .get_one::<String>(server::ARG_ADVERTISED_HOST)
                    .map(String::as_str),
                Some("10.0.0.5")
            );
            assert_eq!(
                matches.get_one::<u16>(directory::ARG_LDAP_PORT).copied(),
                Some(636)
            );
            assert!(matches.get_flag(directory::ARG_LDAP_USE_TLS));
            assert_eq!(matches.get_one::<u16>(mail::ARG_SMTP_PORT).copied(), Some(465));
            assert!(matches.get_flag(mail::ARG_SMTP_STARTTLS));
            assert_eq!(
                matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                Some(2)
            );
            assert_eq!(
                matches.get_one::<PathBuf>(logging::ARG_LOG_DIR),
                Some(&PathBuf::from("/var/log/adreset"))
            );
        });
    }

    #[test]
    fn test_missing_required_is_an_error() {
        temp_env::with_vars(env_with(&[("LDAP_SERVER", None)]), || {
            let result = new().try_get_matches_from(vec!["adreset"]);
            assert!(result.is_err());
        });
    }

    #[test]
    fn test_check_log_level_env() {
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars(env_with(&[("ADRESET_LOG_LEVEL", Some(level))]), || {
                let matches = new().get_matches_from(vec!["adreset"]);
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        for index in 0..5usize {
            temp_env::with_vars(env_with(&[]), || {
                let mut args = vec!["adreset".to_string()];
                if index > 0 {
                    args.push(format!("-{}", "v".repeat(index)));
                }

                let matches = new().get_matches_from(args);
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }
}
