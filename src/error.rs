//! Error types for the install gateway.
//!
//! Two layers of errors live here:
//!
//! - [`ConfigError`]: raised while building the process-wide configuration.
//!   These are fatal for the handshake and are surfaced as a diagnostic page.
//! - [`GatewayError`]: raised while handling a single request. Each variant
//!   maps to exactly one HTTP status via [`GatewayError::status_code`].
//!
//! # Example
//!
//! ```rust
//! use shopify_app_gateway::{ApiKey, ConfigError, GatewayError};
//!
//! let result = ApiKey::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyApiKey)));
//!
//! assert_eq!(GatewayError::InvalidShop.status_code(), 400);
//! assert_eq!(GatewayError::NotInstalled.status_code(), 404);
//! ```

use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur while building the gateway configuration.
///
/// Each variant provides a clear, actionable error message. None of them
/// ever carries the value of a secret.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Client id cannot be empty.
    #[error("Client id cannot be empty. Please provide the app's Shopify client id.")]
    EmptyApiKey,

    /// Client secret cannot be empty.
    #[error("Client secret cannot be empty. Please provide the app's Shopify client secret.")]
    EmptyApiSecretKey,

    /// Shop domain does not match `<name>.myshopify.com`.
    #[error("Invalid shop domain '{domain}'. Expected format: 'shop-name.myshopify.com'.")]
    InvalidShopDomain {
        /// The invalid domain that was provided.
        domain: String,
    },

    /// API version is invalid.
    #[error("Invalid API version '{version}'. Expected format: 'YYYY-MM' (e.g., '2024-10') or 'unstable'.")]
    InvalidApiVersion {
        /// The invalid version string that was provided.
        version: String,
    },

    /// A required field is missing from the builder.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },

    /// One or more required environment variables are not set.
    #[error("Missing required environment variables: {}", names.join(", "))]
    MissingEnvVars {
        /// Every missing variable, in declaration order.
        names: Vec<&'static str>,
    },

    /// An environment variable is set to an unusable value.
    #[error("Invalid value for environment variable {name}: {reason}")]
    InvalidEnvVar {
        /// The variable name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// URL is not an absolute http(s) URL.
    #[error("Invalid URL '{url}'. Please provide an absolute URL with scheme (e.g., 'https://myapp.example.org/callback').")]
    InvalidHostUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// The redirect URI still points at the template placeholder host.
    #[error("The redirect URI '{url}' appears to be a placeholder. Set it to this app's public URL + '/callback'.")]
    PlaceholderRedirectUri {
        /// The configured redirect URI.
        url: String,
    },

    /// Table identifier is empty or contains characters unusable as a key prefix.
    #[error("Invalid table name '{name}'. Use letters, digits, '_', '-' or '.'.")]
    InvalidTableName {
        /// The rejected table name.
        name: String,
    },
}

/// Errors raised while handling a single inbound request.
///
/// Client-input errors are detected at the boundary before any network or
/// store call. Dependency errors are safe for the caller to retry; the
/// gateway never retries them itself.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The `shop` parameter does not match the shop domain format.
    #[error("Invalid shop parameter")]
    InvalidShop,

    /// The HMAC signature of the inbound parameters did not verify.
    #[error("HMAC validation failed")]
    InvalidSignature,

    /// A required query parameter is absent or empty.
    #[error("Missing required parameter: {name}")]
    MissingParameter {
        /// The missing parameter.
        name: &'static str,
    },

    /// The callback `state` does not match the nonce issued by `/auth`.
    #[error("State parameter does not match the pending authorization")]
    StateMismatch,

    /// The credential store could not be reached or returned garbage.
    #[error("Credential store unavailable")]
    StoreUnavailable(#[source] StoreError),

    /// The token endpoint rejected the exchange or could not be reached.
    #[error("Token exchange failed: {body}")]
    UpstreamToken {
        /// Upstream status, `None` when the request never completed.
        status: Option<u16>,
        /// Redacted diagnostic body.
        body: String,
    },

    /// The token endpoint answered 2xx with a body that is not a token response.
    #[error("Failed to parse token response: {body}")]
    TokenResponseMalformed {
        /// Redacted upstream body.
        body: String,
    },

    /// The token endpoint answered successfully without an access token.
    #[error("No access token returned")]
    TokenMissing,

    /// The resource endpoint returned a non-success status or was unreachable.
    #[error("Shopify API error ({status}): {body}")]
    UpstreamApi {
        /// Status relayed to the caller.
        status: u16,
        /// Redacted upstream body.
        body: String,
    },

    /// No active session exists for the shop.
    #[error("Shop not installed")]
    NotInstalled,

    /// Anything unclassified.
    #[error("Internal Server Error")]
    Internal,
}

impl GatewayError {
    /// Returns the HTTP status code this error is reported with.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidShop
            | Self::InvalidSignature
            | Self::MissingParameter { .. }
            | Self::StateMismatch => 400,
            Self::NotInstalled => 404,
            Self::StoreUnavailable(_) => 503,
            Self::UpstreamToken { .. } => 502,
            Self::TokenResponseMalformed { .. } | Self::TokenMissing | Self::Internal => 500,
            Self::UpstreamApi { status, .. } => *status,
        }
    }

    /// Returns `true` for errors caused by the caller's input.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidShop
                | Self::InvalidSignature
                | Self::MissingParameter { .. }
                | Self::StateMismatch
        )
    }
}

impl From<StoreError> for GatewayError {
    fn from(err: StoreError) -> Self {
        Self::StoreUnavailable(err)
    }
}
