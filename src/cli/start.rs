use crate::cli::{actions::Action, commands, dispatch, telemetry};
use anyhow::Result;
use clap::{parser::ValueSource, ArgMatches};
use std::path::{Path, PathBuf};

/// Map verbosity count to tracing level
const fn get_verbosity_level(verbosity: u8) -> tracing::Level {
    match verbosity {
        0 => tracing::Level::ERROR,
        1 => tracing::Level::WARN,
        2 => tracing::Level::INFO,
        3 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }
}

/// Level requested with `-v` or `ADRESET_LOG_LEVEL`; `None` when neither is given.
fn requested_level(matches: &ArgMatches) -> Option<tracing::Level> {
    match matches.value_source(commands::logging::ARG_VERBOSITY) {
        None | Some(ValueSource::DefaultValue) => None,
        Some(_) => matches
            .get_one::<u8>(commands::logging::ARG_VERBOSITY)
            .copied()
            .map(get_verbosity_level),
    }
}

/// Main entry point for the CLI - builds and returns the Action
///
/// # Errors
///
/// Returns an error if argument parsing, telemetry initialization, or action dispatch fails
pub fn start() -> Result<Action> {
    let matches = commands::new().get_matches();

    let log_dir = matches
        .get_one::<PathBuf>(commands::logging::ARG_LOG_DIR)
        .map_or_else(|| Path::new("logs"), PathBuf::as_path);

    telemetry::init(requested_level(&matches), log_dir)?;

    let action = dispatch::handler(&matches)?;

    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Command;

    fn logging_matches(args: &[&str]) -> ArgMatches {
        commands::logging::with_args(Command::new("adreset")).get_matches_from(args)
    }

    #[test]
    fn verbosity_mapping() {
        assert_eq!(get_verbosity_level(0), tracing::Level::ERROR);
        assert_eq!(get_verbosity_level(1), tracing::Level::WARN);
        assert_eq!(get_verbosity_level(2), tracing::Level::INFO);
        assert_eq!(get_verbosity_level(3), tracing::Level::DEBUG);
        assert_eq!(get_verbosity_level(4), tracing::Level::TRACE);
        assert_eq!(get_verbosity_level(9), tracing::Level::TRACE);
    }

    #[test]
    fn no_level_requested_without_flag_or_env() {
        temp_env::with_var_unset("ADRESET_LOG_LEVEL", || {
            assert_eq!(requested_level(&logging_matches(&["adreset"])), None);
            assert_eq!(
                requested_level(&logging_matches(&["adreset", "-vvv"])),
                Some(tracing::Level::DEBUG)
            );
        });
    }

    #[test]
    fn explicit_error_level_is_kept() {
        temp_env::with_var("ADRESET_LOG_LEVEL", Some("error"), || {
            assert_eq!(
                requested_level(&logging_matches(&["adreset"])),
                Some(tracing::Level::ERROR)
            );
        });
    }
}
