use super::{render_body, MailError, Mailer, MESSAGE_SUBJECT, SENDER_NAME};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, info_span, instrument, Instrument};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct SmtpConfig {
    host: String,
    port: u16,
    starttls: bool,
    username: String,
    password: SecretString,
}

impl SmtpConfig {
    /// Implicit TLS on port 587 unless overridden.
    #[must_use]
    pub fn new(host: String, username: String, password: SecretString) -> Self {
        Self {
            host,
            port: 587,
            starttls: false,
            username,
            password,
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Upgrade a plain connection with STARTTLS instead of connecting over TLS.
    #[must_use]
    pub fn with_starttls(mut self, starttls: bool) -> Self {
        self.starttls = starttls;
        self
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("starttls", &self.starttls)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    config: SmtpConfig,
}

impl SmtpMailer {
    /// Build the transport. No connection is opened until the first send.
    ///
    /// # Errors
    /// Returns an error if the sender address or relay host is invalid.
    pub fn new(config: SmtpConfig) -> Result<Self, MailError> {
        let from = sender_mailbox(config.username())?;

        let builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        }
        .map_err(|err| MailError::Transport(format!("invalid SMTP relay: {err}")))?;

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.expose_secret().to_string(),
            ))
            .timeout(Some(CONNECT_TIMEOUT))
            .build();

        Ok(Self {
            transport,
            from,
            config,
        })
    }

    fn build_message(&self, to: &str, code: &str, ttl: Duration) -> Result<Message, MailError> {
        let to: Address = to
            .trim()
            .parse()
            .map_err(|err| MailError::InvalidAddress(format!("{to}: {err}")))?;

        Message::builder()
            .from(self.from.clone())
            .to(Mailbox::new(None, to))
            .subject(MESSAGE_SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(render_body(code, ttl))
            .map_err(|err| MailError::Build(err.to_string()))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    #[instrument(skip(self, code, ttl))]
    async fn send_code(&self, to: &str, code: &str, ttl: Duration) -> Result<(), MailError> {
        let message = self.build_message(to, code, ttl)?;

        debug!(
            "Sending verification mail via {}:{} as {}",
            self.config.host(),
            self.config.port(),
            self.config.username()
        );

        let span = info_span!(
            "smtp.send",
            smtp.host = %self.config.host(),
            smtp.port = self.config.port()
        );
        self.transport
            .send(message)
            .instrument(span)
            .await
            .map_err(|err| MailError::Transport(err.to_string()))?;

        Ok(())
    }
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("config", &self.config)
            .field("from", &self.from.to_string())
            .finish()
    }
}

fn sender_mailbox(username: &str) -> Result<Mailbox, MailError> {
    let address: Address = username
        .trim()
        .parse()
        .map_err(|err| MailError::InvalidAddress(format!("{username}: {err}")))?;
    Ok(Mailbox::new(Some(SENDER_NAME.to_string()), address))
}
