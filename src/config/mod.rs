//! Process-wide configuration for the install gateway.
//!
//! Configuration is read once at start-up, validated, and then passed
//! explicitly into every component. Nothing reads the environment after
//! [`AppConfig::from_env`] returns.
//!
//! # Overview
//!
//! - [`AppConfig`]: The immutable configuration struct
//! - [`AppConfigBuilder`]: A builder for constructing [`AppConfig`] instances
//! - [`ApiKey`], [`ApiSecretKey`]: Validated app credentials
//! - [`ShopDomain`]: A validated `name.myshopify.com` domain
//! - [`RedirectUri`], [`HostUrl`]: Validated URLs
//! - [`TableName`]: The key-value table holding session records
//! - [`ApiVersion`]: The Admin API version used for proxied calls
//!
//! # Example
//!
//! ```rust
//! use shopify_app_gateway::{AppConfig, ApiKey, ApiSecretKey, RedirectUri, TableName};
//!
//! let config = AppConfig::builder()
//!     .api_key(ApiKey::new("my-client-id").unwrap())
//!     .api_secret_key(ApiSecretKey::new("my-secret").unwrap())
//!     .redirect_uri(RedirectUri::new("https://app.example.org/callback").unwrap())
//!     .table_name(TableName::new("shopify_sessions").unwrap())
//!     .scopes("read_products")
//!     .build()
//!     .unwrap();
//!
//! assert!(config.verify_state());
//! ```

mod newtypes;
mod version;

pub use newtypes::{ApiKey, ApiSecretKey, HostUrl, RedirectUri, ShopDomain, TableName};
pub use version::ApiVersion;

use crate::error::ConfigError;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// Environment variables that must be set for the handshake to run.
pub const REQUIRED_ENV_VARS: [&str; 4] = [
    "SHOPIFY_CLIENT_ID",
    "SHOPIFY_CLIENT_SECRET",
    "REDIRECT_URI",
    "TABLE_NAME",
];

const DEFAULT_DATA_DIR: &str = "./data";

/// Backing implementation of the key-value store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StoreBackend {
    /// One JSON document per key under the data directory.
    #[default]
    File,
    /// Process memory. Records are lost on restart.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::InvalidEnvVar {
                name: "STORE_BACKEND",
                reason: format!("expected 'file' or 'memory', got '{other}'"),
            }),
        }
    }
}

/// Output format of the log subscriber.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidEnvVar {
                name: "LOG_FORMAT",
                reason: format!("expected 'pretty' or 'json', got '{other}'"),
            }),
        }
    }
}

/// Whether a required environment variable is set, for the diagnostic page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnvVarStatus {
    /// Variable name.
    pub name: &'static str,
    /// `true` when the variable is set to a non-empty value.
    pub present: bool,
}

/// Immutable gateway configuration.
///
/// # Thread Safety
///
/// `AppConfig` is `Clone`, `Send`, and `Sync`; the server wraps it in an
/// `Arc` and shares it across request tasks.
#[derive(Clone, Debug)]
pub struct AppConfig {
    api_key: ApiKey,
    api_secret_key: ApiSecretKey,
    scopes: String,
    redirect_uri: RedirectUri,
    table_name: TableName,
    api_version: ApiVersion,
    api_host: Option<HostUrl>,
    verify_state: bool,
    store_backend: StoreBackend,
    data_dir: PathBuf,
    listen_addr: SocketAddr,
    log_format: LogFormat,
}

impl AppConfig {
    /// Creates a new builder for constructing an `AppConfig`.
    #[must_use]
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::new()
    }

    /// Loads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVars`] naming every unset required
    /// variable, or the validation error of the first malformed value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads the configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let missing: Vec<&'static str> = REQUIRED_ENV_VARS
            .iter()
            .copied()
            .filter(|name| get(*name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingEnvVars { names: missing });
        }

        let required = |name: &'static str| get(name).unwrap_or_default();

        let mut builder = Self::builder()
            .api_key(ApiKey::new(required("SHOPIFY_CLIENT_ID"))?)
            .api_secret_key(ApiSecretKey::new(required("SHOPIFY_CLIENT_SECRET"))?)
            .redirect_uri(RedirectUri::new(required("REDIRECT_URI"))?)
            .table_name(TableName::new(required("TABLE_NAME"))?)
            .scopes(lookup("SHOPIFY_SCOPES").unwrap_or_default());

        if let Some(version) = get("SHOPIFY_API_VERSION") {
            builder = builder.api_version(version.parse()?);
        }
        if let Some(host) = get("SHOPIFY_API_HOST") {
            builder = builder.api_host(HostUrl::new(host)?);
        }
        if let Some(flag) = get("VERIFY_STATE") {
            builder = builder.verify_state(parse_bool("VERIFY_STATE", &flag)?);
        }
        if let Some(backend) = get("STORE_BACKEND") {
            builder = builder.store_backend(backend.parse()?);
        }
        if let Some(dir) = get("DATA_DIR") {
            builder = builder.data_dir(dir);
        }
        if let Some(addr) = get("LISTEN_ADDR") {
            let addr = addr.trim().parse::<SocketAddr>().map_err(|e| ConfigError::InvalidEnvVar {
                name: "LISTEN_ADDR",
                reason: format!("{e}"),
            })?;
            builder = builder.listen_addr(addr);
        }
        if let Some(format) = get("LOG_FORMAT") {
            builder = builder.log_format(format.parse()?);
        }

        builder.build()
    }

    /// Reports which required variables are set, without their values.
    pub fn required_env_status<F>(lookup: F) -> Vec<EnvVarStatus>
    where
        F: Fn(&str) -> Option<String>,
    {
        REQUIRED_ENV_VARS
            .iter()
            .map(|&name| EnvVarStatus {
                name,
                present: lookup(name).is_some_and(|v| !v.trim().is_empty()),
            })
            .collect()
    }

    /// Returns the client id.
    #[must_use]
    pub const fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    /// Returns the client secret.
    #[must_use]
    pub const fn api_secret_key(&self) -> &ApiSecretKey {
        &self.api_secret_key
    }

    /// Returns the requested scope list, comma-separated without blanks.
    ///
    /// The same string is sent to the authorize page and stored on the
    /// session.
    #[must_use]
    pub fn scopes(&self) -> &str {
        &self.scopes
    }

    /// Returns the OAuth redirect URI.
    #[must_use]
    pub const fn redirect_uri(&self) -> &RedirectUri {
        &self.redirect_uri
    }

    /// Returns the session table name.
    #[must_use]
    pub const fn table_name(&self) -> &TableName {
        &self.table_name
    }

    /// Returns the Admin API version.
    #[must_use]
    pub const fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }

    /// Returns the platform host override, if configured.
    #[must_use]
    pub const fn api_host(&self) -> Option<&HostUrl> {
        self.api_host.as_ref()
    }

    /// Returns whether `/callback` checks the `state` nonce.
    #[must_use]
    pub const fn verify_state(&self) -> bool {
        self.verify_state
    }

    /// Returns the store backend.
    #[must_use]
    pub const fn store_backend(&self) -> StoreBackend {
        self.store_backend
    }

    /// Returns the root directory of the file store.
    #[must_use]
    pub fn data_dir(&self) -> &std::path::Path {
        &self.data_dir
    }

    /// Returns the listener address.
    #[must_use]
    pub const fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }

    /// Returns the log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

// Verify AppConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AppConfig>();
};

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            name,
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}

/// Builder for constructing [`AppConfig`] instances.
///
/// Required fields are `api_key`, `api_secret_key`, `redirect_uri` and
/// `table_name`.
///
/// # Defaults
///
/// - `scopes`: empty
/// - `api_version`: `2024-10`
/// - `api_host`: `None`
/// - `verify_state`: `true`
/// - `store_backend`: [`StoreBackend::File`]
/// - `data_dir`: `./data`
/// - `listen_addr`: `0.0.0.0:3000`
/// - `log_format`: [`LogFormat::Pretty`]
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    api_key: Option<ApiKey>,
    api_secret_key: Option<ApiSecretKey>,
    scopes: Option<String>,
    redirect_uri: Option<RedirectUri>,
    table_name: Option<TableName>,
    api_version: Option<ApiVersion>,
    api_host: Option<HostUrl>,
    verify_state: Option<bool>,
    store_backend: Option<StoreBackend>,
    data_dir: Option<PathBuf>,
    listen_addr: Option<SocketAddr>,
    log_format: Option<LogFormat>,
}

impl AppConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the client id (required).
    #[must_use]
    pub fn api_key(mut self, key: ApiKey) -> Self {
        self.api_key = Some(key);
        self
    }

    /// Sets the client secret (required).
    #[must_use]
    pub fn api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.api_secret_key = Some(key);
        self
    }

    /// Sets the comma-separated scope list.
    #[must_use]
    pub fn scopes(mut self, scopes: impl Into<String>) -> Self {
        self.scopes = Some(scopes.into());
        self
    }

    /// Sets the OAuth redirect URI (required).
    #[must_use]
    pub fn redirect_uri(mut self, uri: RedirectUri) -> Self {
        self.redirect_uri = Some(uri);
        self
    }

    /// Sets the session table name (required).
    #[must_use]
    pub fn table_name(mut self, name: TableName) -> Self {
        self.table_name = Some(name);
        self
    }

    /// Sets the Admin API version.
    #[must_use]
    pub fn api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = Some(version);
        self
    }

    /// Routes all platform calls to `host` instead of `https://<shop>`.
    #[must_use]
    pub fn api_host(mut self, host: HostUrl) -> Self {
        self.api_host = Some(host);
        self
    }

    /// Enables or disables `state` verification on `/callback`.
    #[must_use]
    pub const fn verify_state(mut self, verify: bool) -> Self {
        self.verify_state = Some(verify);
        self
    }

    /// Sets the store backend.
    #[must_use]
    pub const fn store_backend(mut self, backend: StoreBackend) -> Self {
        self.store_backend = Some(backend);
        self
    }

    /// Sets the root directory of the file store.
    #[must_use]
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Sets the listener address.
    #[must_use]
    pub const fn listen_addr(mut self, addr: SocketAddr) -> Self {
        self.listen_addr = Some(addr);
        self
    }

    /// Sets the log output format.
    #[must_use]
    pub const fn log_format(mut self, format: LogFormat) -> Self {
        self.log_format = Some(format);
        self
    }

    /// Builds the [`AppConfig`], validating that required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] naming the first unset
    /// required field.
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let api_key = self
            .api_key
            .ok_or(ConfigError::MissingRequiredField { field: "api_key" })?;
        let api_secret_key = self
            .api_secret_key
            .ok_or(ConfigError::MissingRequiredField {
                field: "api_secret_key",
            })?;
        let redirect_uri = self.redirect_uri.ok_or(ConfigError::MissingRequiredField {
            field: "redirect_uri",
        })?;
        let table_name = self.table_name.ok_or(ConfigError::MissingRequiredField {
            field: "table_name",
        })?;

        Ok(AppConfig {
            api_key,
            api_secret_key,
            scopes: normalize_scopes(self.scopes.as_deref().unwrap_or_default()),
            redirect_uri,
            table_name,
            api_version: self.api_version.unwrap_or_default(),
            api_host: self.api_host,
            verify_state: self.verify_state.unwrap_or(true),
            store_backend: self.store_backend.unwrap_or_default(),
            data_dir: self
                .data_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            listen_addr: self.listen_addr.unwrap_or_else(default_listen_addr),
            log_format: self.log_format.unwrap_or_default(),
        })
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

fn normalize_scopes(scopes: &str) -> String {
    scopes
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn complete_env() -> Vec<(&'static str, &'static str)> {
        vec![
            ("SHOPIFY_CLIENT_ID", "client-id"),
            ("SHOPIFY_CLIENT_SECRET", "client-secret"),
            ("REDIRECT_URI", "https://app.example.org/callback"),
            ("TABLE_NAME", "shopify_sessions"),
            ("SHOPIFY_SCOPES", "read_products,write_orders"),
        ]
    }

    #[test]
    fn test_builder_requires_redirect_uri() {
        let result = AppConfigBuilder::new()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .table_name(TableName::new("sessions").unwrap())
            .build();

        assert!(matches!(
            result,
            Err(ConfigError::MissingRequiredField {
                field: "redirect_uri"
            })
        ));
    }

    #[test]
    fn test_builder_normalizes_scope_list() {
        let config = AppConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .redirect_uri(RedirectUri::new("https://app.example.org/callback").unwrap())
            .table_name(TableName::new("sessions").unwrap())
            .scopes(" read_products, write_orders ,,")
            .build()
            .unwrap();

        assert_eq!(config.scopes(), "read_products,write_orders");
    }

    #[test]
    fn test_builder_provides_sensible_defaults() {
        let config = AppConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .redirect_uri(RedirectUri::new("https://app.example.org/callback").unwrap())
            .table_name(TableName::new("sessions").unwrap())
            .build()
            .unwrap();

        assert_eq!(config.api_version(), &ApiVersion::V2024_10);
        assert_eq!(config.scopes(), "");
        assert!(config.api_host().is_none());
        assert!(config.verify_state());
        assert_eq!(config.store_backend(), StoreBackend::File);
        assert_eq!(config.data_dir(), std::path::Path::new(DEFAULT_DATA_DIR));
        assert_eq!(config.listen_addr().to_string(), "0.0.0.0:3000");
        assert_eq!(config.log_format(), LogFormat::Pretty);
    }

    #[test]
    fn test_from_lookup_reads_every_variable() {
        let mut vars = complete_env();
        vars.extend([
            ("SHOPIFY_API_VERSION", "2025-01"),
            ("SHOPIFY_API_HOST", "http://127.0.0.1:9000"),
            ("VERIFY_STATE", "no"),
            ("STORE_BACKEND", "memory"),
            ("DATA_DIR", "/var/lib/gateway"),
            ("LISTEN_ADDR", "127.0.0.1:8080"),
            ("LOG_FORMAT", "json"),
        ]);
        let config = AppConfig::from_lookup(env(&vars)).unwrap();

        assert_eq!(config.api_key().as_ref(), "client-id");
        assert_eq!(config.scopes(), "read_products,write_orders");
        assert_eq!(config.api_version(), &ApiVersion::V2025_01);
        assert_eq!(
            config.api_host().map(|h| h.as_ref().to_string()),
            Some("http://127.0.0.1:9000".to_string())
        );
        assert!(!config.verify_state());
        assert_eq!(config.store_backend(), StoreBackend::Memory);
        assert_eq!(config.data_dir(), std::path::Path::new("/var/lib/gateway"));
        assert_eq!(config.listen_addr().port(), 8080);
        assert_eq!(config.log_format(), LogFormat::Json);
    }

    #[test]
    fn test_from_lookup_reports_all_missing_variables() {
        let result = AppConfig::from_lookup(env(&[
            ("SHOPIFY_CLIENT_ID", "client-id"),
            ("REDIRECT_URI", ""),
        ]));

        match result {
            Err(ConfigError::MissingEnvVars { names }) => assert_eq!(
                names,
                vec!["SHOPIFY_CLIENT_SECRET", "REDIRECT_URI", "TABLE_NAME"]
            ),
            other => panic!("expected MissingEnvVars, got {other:?}"),
        }
    }

    #[test]
    fn test_from_lookup_rejects_placeholder_redirect_uri() {
        let mut vars = complete_env();
        vars.retain(|(k, _)| *k != "REDIRECT_URI");
        vars.push(("REDIRECT_URI", "https://example.com/callback"));

        assert!(matches!(
            AppConfig::from_lookup(env(&vars)),
            Err(ConfigError::PlaceholderRedirectUri { .. })
        ));
    }

    #[test]
    fn test_from_lookup_rejects_bad_boolean() {
        let mut vars = complete_env();
        vars.push(("VERIFY_STATE", "maybe"));

        assert!(matches!(
            AppConfig::from_lookup(env(&vars)),
            Err(ConfigError::InvalidEnvVar {
                name: "VERIFY_STATE",
                ..
            })
        ));
    }

    #[test]
    fn test_required_env_status_hides_values() {
        let status = AppConfig::required_env_status(env(&[
            ("SHOPIFY_CLIENT_ID", "client-id"),
            ("TABLE_NAME", "  "),
        ]));

        assert_eq!(status.len(), 4);
        assert!(status[0].present);
        assert!(!status[1].present);
        assert!(!status[2].present);
        assert!(!status[3].present);
    }

    #[test]
    fn test_config_debug_masks_secret() {
        let config = AppConfig::from_lookup(env(&complete_env())).unwrap();
        let debug_str = format!("{config:?}");
        assert!(debug_str.contains("AppConfig"));
        assert!(!debug_str.contains("client-secret"));
    }
}
