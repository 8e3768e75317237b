//! # Shopify App Gateway
//!
//! The install handshake of a Shopify app and an authenticated proxy for the
//! Admin REST API, served over HTTP with axum.
//!
//! ## Overview
//!
//! - Validated configuration via [`AppConfig`] and [`AppConfigBuilder`], or
//!   [`AppConfig::from_env`]
//! - HMAC verification of platform-signed parameters via [`auth::oauth::hmac`]
//! - The authorization-code grant via [`InstallFlow`]
//! - One offline [`Session`] per shop in a [`SessionStore`] over any
//!   [`KeyValueStore`]
//! - The `/products` relay via [`ResourceProxy`]
//! - The router itself via [`server::router`]
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use shopify_app_gateway::{
//!     ApiKey, ApiSecretKey, AppConfig, MemoryStore, RedirectUri, SessionStore,
//!     ShopifyHttpClient, TableName,
//! };
//! use shopify_app_gateway::server::{router, AppState};
//!
//! let config = AppConfig::builder()
//!     .api_key(ApiKey::new("your-client-id").unwrap())
//!     .api_secret_key(ApiSecretKey::new("your-client-secret").unwrap())
//!     .scopes("read_products")
//!     .redirect_uri(RedirectUri::new("https://app.mycompany.io/callback").unwrap())
//!     .table_name(TableName::new("shopify_sessions").unwrap())
//!     .build()
//!     .unwrap();
//!
//! let platform = Arc::new(ShopifyHttpClient::new(&config).unwrap());
//! let store = SessionStore::new(Arc::new(MemoryStore::new()));
//! let app = router(AppState::new(Arc::new(config), store, platform));
//! # drop(app);
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: configuration is built once and passed explicitly
//! - **Fail-fast validation**: newtypes validate on construction, and request
//!   input is checked before any store or network call
//! - **Narrow seams**: the store and the platform sit behind traits so the
//!   handshake can run against in-memory fakes
//! - **No secrets in output**: the client secret and access tokens are
//!   masked in `Debug` and redacted from surfaced error bodies

pub mod auth;
pub mod clients;
pub mod config;
pub mod error;
pub mod proxy;
pub mod server;
pub mod store;

// Re-export public types at crate root for convenience
pub use auth::{PendingAuthorization, Session};
pub use config::{
    ApiKey, ApiSecretKey, ApiVersion, AppConfig, AppConfigBuilder, EnvVarStatus, HostUrl,
    LogFormat, RedirectUri, ShopDomain, StoreBackend, TableName,
};
pub use error::{ConfigError, GatewayError};

pub use clients::{HttpError, HttpResponse, PlatformApi, ShopifyHttpClient, TokenRequest};

pub use store::{FileStore, Item, KeyValueStore, MemoryStore, SessionStore, StoreError};

pub use auth::oauth::{
    begin_auth, BeginAuthResult, CallbackQuery, FlowEvent, FlowState, InstallFlow, StateParam,
    StatusOutcome,
};
pub use proxy::ResourceProxy;
