//! Authorization URL construction.
//!
//! [`begin_auth`] is the first step of the handshake: it issues a fresh
//! `state` nonce and builds the URL the merchant's browser is redirected to
//! on the shop's admin.
//!
//! # Example
//!
//! ```rust
//! use shopify_app_gateway::{AppConfig, ApiKey, ApiSecretKey, RedirectUri, ShopDomain, TableName};
//! use shopify_app_gateway::auth::oauth::begin_auth;
//!
//! let config = AppConfig::builder()
//!     .api_key(ApiKey::new("client-id").unwrap())
//!     .api_secret_key(ApiSecretKey::new("secret").unwrap())
//!     .redirect_uri(RedirectUri::new("https://app.example.org/callback").unwrap())
//!     .table_name(TableName::new("sessions").unwrap())
//!     .scopes("read_products,write_orders")
//!     .build()
//!     .unwrap();
//!
//! let shop = ShopDomain::new("test-shop.myshopify.com").unwrap();
//! let result = begin_auth(&config, &shop);
//!
//! assert!(result.auth_url.starts_with("https://test-shop.myshopify.com/admin/oauth/authorize?"));
//! assert!(result.auth_url.contains("scope=read_products,write_orders"));
//! assert!(result.auth_url.contains("redirect_uri=https%3A%2F%2Fapp.example.org%2Fcallback"));
//! ```

use crate::auth::oauth::state::StateParam;
use crate::config::{AppConfig, ShopDomain};

/// Result of initiating authorization.
///
/// The `state` must be persisted by the caller when the callback is going
/// to verify it.
#[derive(Clone, Debug)]
pub struct BeginAuthResult {
    /// The full authorization URL on the shop's admin.
    pub auth_url: String,

    /// The nonce embedded in `auth_url`.
    pub state: StateParam,
}

/// Builds the authorization URL for `shop` with a newly generated nonce.
///
/// The URL carries the client id, the configured scope list, the
/// percent-encoded redirect URI and the nonce. Scope names are encoded
/// individually so the separating commas stay readable.
#[must_use]
pub fn begin_auth(config: &AppConfig, shop: &ShopDomain) -> BeginAuthResult {
    let state = StateParam::new();

    let scope = config
        .scopes()
        .split(',')
        .map(|s| urlencoding::encode(s).into_owned())
        .collect::<Vec<_>>()
        .join(",");

    let auth_url = format!(
        "https://{}/admin/oauth/authorize?client_id={}&scope={}&redirect_uri={}&state={}",
        shop.as_ref(),
        urlencoding::encode(config.api_key().as_ref()),
        scope,
        urlencoding::encode(config.redirect_uri().as_ref()),
        state.as_ref(),
    );

    BeginAuthResult { auth_url, state }
}
