//! Validated newtype wrappers for configuration and request values.
//!
//! This module provides type-safe wrappers around string values that validate
//! their contents on construction. Invalid values are rejected with clear error messages.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A validated Shopify client id (the app's API key).
///
/// # Example
///
/// ```rust
/// use shopify_app_gateway::ApiKey;
///
/// let key = ApiKey::new("my-client-id").unwrap();
/// assert_eq!(key.as_ref(), "my-client-id");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Creates a new validated client id.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiKey`] if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(key))
    }
}

impl AsRef<str> for ApiKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A validated Shopify client secret.
///
/// The secret signs every callback HMAC and authenticates the token
/// exchange. Its `Debug` output is masked so it cannot leak through logs.
///
/// # Example
///
/// ```rust
/// use shopify_app_gateway::ApiSecretKey;
///
/// let secret = ApiSecretKey::new("my-secret").unwrap();
/// assert_eq!(format!("{:?}", secret), "ApiSecretKey(*****)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ApiSecretKey(String);

impl ApiSecretKey {
    /// Creates a new validated client secret.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiSecretKey`] if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ConfigError::EmptyApiSecretKey);
        }
        Ok(Self(key))
    }

    /// Replaces every occurrence of the secret in `text` with `*****`.
    ///
    /// Applied to any upstream body before it is surfaced to a caller.
    #[must_use]
    pub fn redact(&self, text: &str) -> String {
        text.replace(&self.0, "*****")
    }
}

impl AsRef<str> for ApiSecretKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiSecretKey(*****)")
    }
}

/// A validated Shopify shop domain.
///
/// Only the full `name.myshopify.com` form is accepted: the name must start
/// with an ASCII letter or digit and may otherwise contain letters, digits
/// and hyphens. Anything else is rejected before it can reach a URL, a
/// header or a store key. The canonical form is lowercase.
///
/// # Serialization
///
/// `ShopDomain` serializes to and deserializes from the full domain string:
///
/// ```rust
/// use shopify_app_gateway::ShopDomain;
///
/// let domain = ShopDomain::new("my-store.myshopify.com").unwrap();
/// let json = serde_json::to_string(&domain).unwrap();
/// assert_eq!(json, r#""my-store.myshopify.com""#);
/// ```
///
/// # Example
///
/// ```rust
/// use shopify_app_gateway::ShopDomain;
///
/// let domain = ShopDomain::new("My-Shop1.myshopify.com").unwrap();
/// assert_eq!(domain.as_ref(), "my-shop1.myshopify.com");
///
/// assert!(ShopDomain::new("evil.com").is_err());
/// assert!(ShopDomain::new("myshopify.com").is_err());
/// assert!(ShopDomain::new("shop.myshopify.com.evil.com").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ShopDomain {
    full_domain: String,
}

impl ShopDomain {
    const SUFFIX: &'static str = ".myshopify.com";

    /// Creates a new validated shop domain.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidShopDomain`] if the domain does not
    /// match `^[A-Za-z0-9][A-Za-z0-9-]*\.myshopify\.com$`.
    pub fn new(domain: impl Into<String>) -> Result<Self, ConfigError> {
        let domain = domain.into();

        let Some(shop_name) = domain.strip_suffix(Self::SUFFIX) else {
            return Err(ConfigError::InvalidShopDomain { domain });
        };

        if !Self::is_valid_shop_name(shop_name) {
            return Err(ConfigError::InvalidShopDomain { domain });
        }

        Ok(Self {
            full_domain: domain.to_ascii_lowercase(),
        })
    }

    /// Returns the store key of this shop's offline session: `offline_<domain>`.
    #[must_use]
    pub fn offline_session_id(&self) -> String {
        format!("offline_{}", self.full_domain)
    }

    fn is_valid_shop_name(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphanumeric() => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.full_domain
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_domain)
    }
}

impl Serialize for ShopDomain {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.full_domain)
    }
}

impl<'de> Deserialize<'de> for ShopDomain {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(de::Error::custom)
    }
}

/// A validated absolute `http`/`https` URL.
///
/// Used for the platform host override and as the base of [`RedirectUri`].
///
/// # Example
///
/// ```rust
/// use shopify_app_gateway::HostUrl;
///
/// let url = HostUrl::new("https://myapp.example.org").unwrap();
/// assert_eq!(url.host_name(), Some("myapp.example.org"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostUrl {
    url: String,
    host_start: usize,
    host_end: usize,
}

impl HostUrl {
    /// Creates a new validated URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidHostUrl`] if the URL has no `http` or
    /// `https` scheme or no host.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into().trim().to_string();
        let invalid = || ConfigError::InvalidHostUrl { url: url.clone() };

        let scheme_end = url.find("://").ok_or_else(invalid)?;
        let scheme = &url[..scheme_end];
        if !scheme.eq_ignore_ascii_case("http") && !scheme.eq_ignore_ascii_case("https") {
            return Err(invalid());
        }

        // Host ends at port, path, query, fragment, or end of string
        let host_start = scheme_end + 3;
        let remainder = &url[host_start..];
        let host_end = remainder
            .find([':', '/', '?', '#'])
            .map_or(url.len(), |i| host_start + i);

        if host_start >= host_end {
            return Err(invalid());
        }

        Ok(Self {
            url,
            host_start,
            host_end,
        })
    }

    /// Returns the host name portion of the URL.
    #[must_use]
    pub fn host_name(&self) -> Option<&str> {
        let host = &self.url[self.host_start..self.host_end];
        if host.is_empty() {
            None
        } else {
            Some(host)
        }
    }
}

impl AsRef<str> for HostUrl {
    fn as_ref(&self) -> &str {
        &self.url
    }
}

/// The app's own OAuth callback URL, sent as `redirect_uri`.
///
/// Rejects the template placeholder host so a half-configured deployment
/// fails at start-up instead of sending merchants to a dead page.
///
/// # Example
///
/// ```rust
/// use shopify_app_gateway::{ConfigError, RedirectUri};
///
/// let uri = RedirectUri::new("https://abc123.execute-api.us-east-1.amazonaws.com/callback").unwrap();
/// assert!(uri.as_ref().ends_with("/callback"));
///
/// let placeholder = RedirectUri::new("https://example.com/callback");
/// assert!(matches!(placeholder, Err(ConfigError::PlaceholderRedirectUri { .. })));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedirectUri(HostUrl);

impl RedirectUri {
    const PLACEHOLDER_HOST: &'static str = "example.com";

    /// Creates a new validated redirect URI.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidHostUrl`] for a malformed URL and
    /// [`ConfigError::PlaceholderRedirectUri`] when the host is the placeholder.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = HostUrl::new(url)?;
        let is_placeholder = url.host_name().is_some_and(|host| {
            let host = host.to_ascii_lowercase();
            host == Self::PLACEHOLDER_HOST || host.ends_with(".example.com")
        });
        if is_placeholder {
            return Err(ConfigError::PlaceholderRedirectUri {
                url: url.as_ref().to_string(),
            });
        }
        Ok(Self(url))
    }
}

impl AsRef<str> for RedirectUri {
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}

/// Identifier of the key-value table holding session records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableName(String);

impl TableName {
    /// Creates a new validated table name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTableName`] if the name is empty, starts
    /// with `.`, or contains anything other than letters, digits, `_`, `-`, `.`.
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        let valid = !name.is_empty()
            && !name.starts_with('.')
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !valid {
            return Err(ConfigError::InvalidTableName { name });
        }
        Ok(Self(name))
    }
}

impl AsRef<str> for TableName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_rejects_empty_string() {
        assert!(matches!(ApiKey::new(""), Err(ConfigError::EmptyApiKey)));
        assert!(matches!(ApiKey::new("   "), Err(ConfigError::EmptyApiKey)));
    }

    #[test]
    fn test_api_secret_key_masks_value_in_debug() {
        let secret = ApiSecretKey::new("super-secret-key").unwrap();
        let debug_output = format!("{:?}", secret);
        assert_eq!(debug_output, "ApiSecretKey(*****)");
        assert!(!debug_output.contains("super-secret-key"));
    }

    #[test]
    fn test_api_secret_key_redacts_occurrences() {
        let secret = ApiSecretKey::new("shpss_abc").unwrap();
        let redacted = secret.redact(r#"{"error":"bad client_secret shpss_abc"}"#);
        assert_eq!(redacted, r#"{"error":"bad client_secret *****"}"#);
    }

    #[test]
    fn test_shop_domain_accepts_full_format() {
        let domain = ShopDomain::new("my-shop1.myshopify.com").unwrap();
        assert_eq!(domain.as_ref(), "my-shop1.myshopify.com");
    }

    #[test]
    fn test_shop_domain_canonicalizes_to_lowercase() {
        let domain = ShopDomain::new("My-Shop.myshopify.com").unwrap();
        assert_eq!(domain.as_ref(), "my-shop.myshopify.com");
        assert_eq!(domain.offline_session_id(), "offline_my-shop.myshopify.com");
    }

    #[test]
    fn test_shop_domain_rejects_invalid_domains() {
        assert!(ShopDomain::new("").is_err());
        assert!(ShopDomain::new("evil.com").is_err());
        assert!(ShopDomain::new("myshopify.com").is_err());
        assert!(ShopDomain::new(".myshopify.com").is_err());
        assert!(ShopDomain::new("shop.myshopify.com.evil.com").is_err());

        // Short form is not accepted
        assert!(ShopDomain::new("my-store").is_err());

        // Leading hyphen, bad characters, subdomains, whitespace
        assert!(ShopDomain::new("-shop.myshopify.com").is_err());
        assert!(ShopDomain::new("my_store.myshopify.com").is_err());
        assert!(ShopDomain::new("a.b.myshopify.com").is_err());
        assert!(ShopDomain::new(" shop.myshopify.com").is_err());
        assert!(ShopDomain::new("shop.myshopify.com\r\nX-Injected: 1").is_err());

        // Suffix is case-sensitive
        assert!(ShopDomain::new("shop.MyShopify.com").is_err());
    }

    #[test]
    fn test_shop_domain_allows_trailing_hyphen_and_digits() {
        assert!(ShopDomain::new("1shop.myshopify.com").is_ok());
        assert!(ShopDomain::new("shop-.myshopify.com").is_ok());
    }

    #[test]
    fn test_host_url_validates_format() {
        let url = HostUrl::new("https://myapp.example.org").unwrap();
        assert_eq!(url.as_ref(), "https://myapp.example.org");
        assert_eq!(url.host_name(), Some("myapp.example.org"));

        let url = HostUrl::new("http://127.0.0.1:3000").unwrap();
        assert_eq!(url.host_name(), Some("127.0.0.1"));
    }

    #[test]
    fn test_host_url_rejects_invalid() {
        assert!(HostUrl::new("myapp.example.org").is_err());
        assert!(HostUrl::new("https://").is_err());
        assert!(HostUrl::new("ftp://files.example.org").is_err());
        assert!(HostUrl::new("://example.org").is_err());
    }

    #[test]
    fn test_redirect_uri_rejects_placeholder_host() {
        assert!(matches!(
            RedirectUri::new("https://example.com/callback"),
            Err(ConfigError::PlaceholderRedirectUri { .. })
        ));
        assert!(matches!(
            RedirectUri::new("https://your-api.example.com/callback"),
            Err(ConfigError::PlaceholderRedirectUri { .. })
        ));
        assert!(RedirectUri::new("https://app.example.org/callback").is_ok());
    }

    #[test]
    fn test_table_name_validation() {
        assert!(TableName::new("shopify_sessions").is_ok());
        assert!(TableName::new("prod.sessions-v2").is_ok());
        assert!(TableName::new("").is_err());
        assert!(TableName::new("../etc").is_err());
        assert!(TableName::new(".hidden").is_err());
        assert!(TableName::new("a/b").is_err());
    }

    #[test]
    fn test_shop_domain_serialization() {
        let domain = ShopDomain::new("test-shop.myshopify.com").unwrap();
        let json = serde_json::to_string(&domain).unwrap();
        assert_eq!(json, r#""test-shop.myshopify.com""#);

        let parsed: ShopDomain = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, domain);

        let rejected: Result<ShopDomain, _> = serde_json::from_str(r#""evil.com""#);
        assert!(rejected.is_err());
    }
}
