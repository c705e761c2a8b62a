//! Directory service access (Active Directory over LDAP).
//!
//! Every operation opens a fresh connection, binds with the service account,
//! performs a single request and unbinds. Nothing is cached between calls.

mod ldap;

pub use ldap::{LdapConfig, LdapDirectory};

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryError {
    /// No account matched, or the account carries no usable address.
    #[error("user not found")]
    NotFound,
    #[error("directory service error: {0}")]
    Service(String),
}

impl From<ldap3::LdapError> for DirectoryError {
    fn from(err: ldap3::LdapError) -> Self {
        Self::Service(err.to_string())
    }
}

#[async_trait]
pub trait Directory: Send + Sync {
    /// Email address on file for `username`, falling back to the principal name.
    async fn lookup_email(&self, username: &str) -> Result<String, DirectoryError>;

    async fn set_password(
        &self,
        username: &str,
        new_password: &SecretString,
    ) -> Result<(), DirectoryError>;
}

/// Normalize the configured naming context.
///
/// `corp.example.com` becomes `DC=corp,DC=example,DC=com`; a value that already
/// contains `DC=` is kept as is.
#[must_use]
pub fn normalize_base_dn(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    if raw.to_ascii_uppercase().contains("DC=") {
        return raw.to_string();
    }
    raw.split('.')
        .filter(|label| !label.is_empty())
        .map(|label| format!("DC={label}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Down-level logon name (`DOMAIN\account`) used to bind the service account.
///
/// The domain is the first `DC=` component of the base DN and the account is
/// the first `CN=` component of the bind DN.
#[must_use]
pub fn service_identity(base_dn: &str, bind_dn: &str) -> String {
    let domain = first_rdn_value(base_dn, "DC").unwrap_or_default();
    let account = first_rdn_value(bind_dn, "CN").unwrap_or_else(|| bind_dn.trim().to_string());
    if domain.is_empty() {
        account
    } else {
        format!("{domain}\\{account}")
    }
}

fn first_rdn_value(dn: &str, attribute: &str) -> Option<String> {
    let first = dn.split(',').next()?.trim();
    let (key, value) = first.split_once('=')?;
    if key.trim().eq_ignore_ascii_case(attribute) {
        Some(value.trim().to_string())
    } else {
        None
    }
}

/// Distinguished name of the account whose password is written.
#[must_use]
pub fn user_dn(username: &str, base_dn: &str) -> String {
    let cn = ldap3::dn_escape(username);
    if base_dn.is_empty() {
        format!("CN={cn}")
    } else {
        format!("CN={cn},{base_dn}")
    }
}

/// Value for the `unicodePwd` attribute: the quoted password in UTF-16LE.
#[must_use]
pub fn encode_unicode_pwd(password: &str) -> Vec<u8> {
    format!("\"{password}\"")
        .encode_utf16()
        .flat_map(u16::to_le_bytes)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_dn_from_dotted_domain() {
        assert_eq!(normalize_base_dn("corp.test"), "DC=corp,DC=test");
        assert_eq!(
            normalize_base_dn("ad.corp.example.com"),
            "DC=ad,DC=corp,DC=example,DC=com"
        );
    }

    #[test]
    fn base_dn_kept_when_already_dn() {
        assert_eq!(normalize_base_dn("DC=corp,DC=test"), "DC=corp,DC=test");
        assert_eq!(
            normalize_base_dn("OU=Staff,DC=corp,DC=test"),
            "OU=Staff,DC=corp,DC=test"
        );
    }

    #[test]
    fn base_dn_empty() {
        assert_eq!(normalize_base_dn(""), "");
        assert_eq!(normalize_base_dn("   "), "");
    }

    #[test]
    fn identity_from_dns() {
        assert_eq!(
            service_identity("DC=corp,DC=test", "CN=svc-reset,OU=Service,DC=corp,DC=test"),
            "corp\\svc-reset"
        );
    }

    #[test]
    fn identity_with_plain_account() {
        assert_eq!(service_identity("DC=corp,DC=test", "svc-reset"), "corp\\svc-reset");
        assert_eq!(service_identity("", "CN=svc-reset"), "svc-reset");
    }

    #[test]
    fn identity_ignores_non_dc_first_component() {
        assert_eq!(
            service_identity("OU=Staff,DC=corp,DC=test", "CN=svc"),
            "svc"
        );
    }

    #[test]
    fn user_dn_escapes_value() {
        assert_eq!(user_dn("alice", "DC=corp,DC=test"), "CN=alice,DC=corp,DC=test");
        let escaped = user_dn("doe, john", "DC=corp,DC=test");
        assert!(escaped.starts_with("CN=doe\\"), "got {escaped}");
        assert!(escaped.ends_with(",DC=corp,DC=test"));
        assert!(!escaped.contains("doe, john"));
    }

    #[test]
    fn unicode_pwd_is_quoted_utf16le() {
        assert_eq!(
            encode_unicode_pwd("ab"),
            vec![b'"', 0, b'a', 0, b'b', 0, b'"', 0]
        );
    }
}
