//! Outbound calls to the platform.
//!
//! The flow controller and the resource proxy talk to the platform through
//! the narrow [`PlatformApi`] interface, so both can be tested against
//! in-memory fakes. [`ShopifyHttpClient`] is the production implementation.
//!
//! # Overview
//!
//! - [`PlatformApi`]: `post_token` and `get_resource`
//! - [`TokenRequest`]: JSON body of the code exchange
//! - [`ShopifyHttpClient`]: reqwest-backed implementation
//! - [`HttpResponse`]: status, headers and raw body of any response
//! - [`HttpError`]: a request that produced no response

mod errors;
mod http_client;
mod http_response;

pub use errors::HttpError;
pub use http_client::{ShopifyHttpClient, ACCESS_TOKEN_HEADER, GATEWAY_VERSION};
pub use http_response::HttpResponse;

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

use crate::config::ShopDomain;

/// Body of the authorization-code exchange.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct TokenRequest {
    /// The app's client id.
    pub client_id: String,
    /// The app's client secret.
    pub client_secret: String,
    /// The authorization code from the callback.
    pub code: String,
}

impl fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRequest")
            .field("client_id", &self.client_id)
            .field("client_secret", &"*****")
            .field("code", &self.code)
            .finish()
    }
}

/// The platform's endpoints used by the gateway.
///
/// Implementations return every completed response, whatever its status,
/// and fail only when no response was received.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// POSTs `request` as JSON to the shop's token endpoint.
    async fn post_token(
        &self,
        shop: &ShopDomain,
        request: &TokenRequest,
    ) -> Result<HttpResponse, HttpError>;

    /// GETs `path` on the shop's Admin API with `access_token`.
    async fn get_resource(
        &self,
        shop: &ShopDomain,
        access_token: &str,
        path: &str,
    ) -> Result<HttpResponse, HttpError>;
}
