use crate::{
    api::{self, ClientConfig},
    cli::telemetry,
    directory::{LdapConfig, LdapDirectory},
    mail::{SmtpConfig, SmtpMailer},
    reset::ResetService,
    verification::MemoryStore,
};
use anyhow::{Context, Result};
use std::{sync::Arc, time::Duration};
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub advertised_host: String,
    pub code_ttl: Duration,
    pub max_code_attempts: u32,
    pub ldap: LdapConfig,
    pub smtp: SmtpConfig,
}

/// Wire the directory, mailer and code store together and serve the API.
///
/// # Errors
/// Returns an error if the mail transport cannot be built, the advertised
/// host is invalid, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let client = ClientConfig::new(&args.advertised_host, args.port)?;

    info!(
        "Directory {} (base {}), mail relay {}:{}",
        args.ldap.url(),
        args.ldap.base_dn(),
        args.smtp.host(),
        args.smtp.port()
    );

    let directory = Arc::new(LdapDirectory::new(args.ldap));
    let mailer = Arc::new(SmtpMailer::new(args.smtp).context("Invalid mail settings")?);
    let store = Arc::new(MemoryStore::new().with_max_attempts(args.max_code_attempts));

    let reset =
        Arc::new(ResetService::new(directory, mailer, store).with_code_ttl(args.code_ttl));

    info!("API base URL advertised as {}", client.api_base_url());

    let result = api::new(args.port, reset, client).await;

    telemetry::shutdown_tracer();
    telemetry::flush_log_file();

    result
}
