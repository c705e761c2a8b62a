use super::{
    encode_unicode_pwd, normalize_base_dn, service_identity, user_dn, Directory, DirectoryError,
};
use async_trait::async_trait;
use ldap3::{ldap_escape, Ldap, LdapConnAsync, LdapConnSettings, Mod, Scope, SearchEntry};
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, error, info, info_span, instrument, warn, Instrument};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const ATTR_MAIL: &str = "mail";
const ATTR_UPN: &str = "userPrincipalName";
const ATTR_UNICODE_PWD: &str = "unicodePwd";

#[derive(Clone)]
pub struct LdapConfig {
    host: String,
    port: u16,
    use_tls: bool,
    base_dn: String,
    bind_dn: String,
    bind_password: SecretString,
}

impl LdapConfig {
    /// `base_dn` may be a dotted domain or a DN; it is normalized here.
    #[must_use]
    pub fn new(host: String, base_dn: &str, bind_dn: String, bind_password: SecretString) -> Self {
        Self {
            host,
            port: 389,
            use_tls: false,
            base_dn: normalize_base_dn(base_dn),
            bind_dn,
            bind_password,
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    #[must_use]
    pub fn url(&self) -> String {
        let scheme = if self.use_tls { "ldaps" } else { "ldap" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }

    #[must_use]
    pub fn base_dn(&self) -> &str {
        &self.base_dn
    }

    #[must_use]
    pub fn bind_identity(&self) -> String {
        service_identity(&self.base_dn, &self.bind_dn)
    }
}

impl std::fmt::Debug for LdapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("use_tls", &self.use_tls)
            .field("base_dn", &self.base_dn)
            .field("bind_dn", &self.bind_dn)
            .field("bind_password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct LdapDirectory {
    config: LdapConfig,
}

impl LdapDirectory {
    #[must_use]
    pub fn new(config: LdapConfig) -> Self {
        Self { config }
    }

    /// Connect and bind as the service account.
    async fn bind(&self) -> Result<Ldap, DirectoryError> {
        let url = self.config.url();
        let identity = self.config.bind_identity();
        debug!(url = %url, identity = %identity, "connecting to directory");

        let settings = LdapConnSettings::new().set_conn_timeout(CONNECT_TIMEOUT);
        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &url)
            .instrument(info_span!("ldap.connect", ldap.url = %url))
            .await
            .map_err(|err| {
                error!("Failed to connect to directory {url}: {err}");
                DirectoryError::from(err)
            })?;

        tokio::spawn(async move {
            if let Err(err) = conn.drive().await {
                warn!("LDAP connection error: {err}");
            }
        });

        ldap.simple_bind(&identity, self.config.bind_password.expose_secret())
            .instrument(info_span!("ldap.bind", ldap.identity = %identity))
            .await
            .and_then(ldap3::LdapResult::success)
            .map_err(|err| {
                error!("Directory bind failed for {identity}: {err}");
                DirectoryError::from(err)
            })?;

        Ok(ldap)
    }
}

#[async_trait]
impl Directory for LdapDirectory {
    #[instrument(skip(self))]
    async fn lookup_email(&self, username: &str) -> Result<String, DirectoryError> {
        let mut ldap = self.bind().await?;

        let filter = format!(
            "(&(objectClass=user)(sAMAccountName={}))",
            ldap_escape(username)
        );
        let base = self.config.base_dn();
        let span = info_span!("ldap.search", ldap.base = %base, ldap.filter = %filter);

        let result = ldap
            .search(base, Scope::Subtree, &filter, vec![ATTR_MAIL, ATTR_UPN])
            .instrument(span)
            .await
            .and_then(ldap3::SearchResult::success);

        if let Err(err) = ldap.unbind().await {
            debug!("Directory unbind failed: {err}");
        }

        let (entries, _) = result.map_err(|err| {
            error!("Directory search failed for {username}: {err}");
            DirectoryError::from(err)
        })?;

        let Some(entry) = entries.into_iter().next() else {
            warn!("User not found in directory: {username}");
            return Err(DirectoryError::NotFound);
        };

        let entry = SearchEntry::construct(entry);
        match first_attr(&entry, ATTR_MAIL).or_else(|| first_attr(&entry, ATTR_UPN)) {
            Some(email) => {
                info!("Resolved email address for {username}");
                Ok(email)
            }
            None => {
                warn!("User {username} has no email address on file");
                Err(DirectoryError::NotFound)
            }
        }
    }

    #[instrument(skip(self, new_password))]
    async fn set_password(
        &self,
        username: &str,
        new_password: &SecretString,
    ) -> Result<(), DirectoryError> {
        let mut ldap = self.bind().await?;

        let dn = user_dn(username, self.config.base_dn());
        let value = encode_unicode_pwd(new_password.expose_secret());
        let modification = Mod::Replace(
            ATTR_UNICODE_PWD.as_bytes().to_vec(),
            HashSet::from([value]),
        );

        let result = ldap
            .modify(&dn, vec![modification])
            .instrument(info_span!("ldap.modify", ldap.dn = %dn))
            .await
            .and_then(ldap3::LdapResult::success);

        if let Err(err) = ldap.unbind().await {
            debug!("Directory unbind failed: {err}");
        }

        result.map_err(|err| {
            error!("Password write failed for {username}: {err}");
            DirectoryError::from(err)
        })?;

        info!("Password updated for {username}");
        Ok(())
    }
}

/// First non-empty value of `attribute`, matching the name case-insensitively.
fn first_attr(entry: &SearchEntry, attribute: &str) -> Option<String> {
    entry
        .attrs
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(attribute))
        .and_then(|(_, values)| values.iter().find(|value| !value.trim().is_empty()))
        .map(|value| value.trim().to_string())
}
