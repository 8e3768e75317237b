//! reqwest-backed client for the platform's OAuth and Admin endpoints.

use async_trait::async_trait;

use crate::clients::errors::HttpError;
use crate::clients::http_response::HttpResponse;
use crate::clients::{PlatformApi, TokenRequest};
use crate::config::{AppConfig, HostUrl, ShopDomain};

/// Crate version from Cargo.toml.
pub const GATEWAY_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Header carrying the shop's access token on Admin API calls.
pub const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// HTTP client for the platform.
///
/// Requests go to `https://<shop>` unless an API host override is
/// configured, in which case they go to the override and the `Host` header
/// still names the shop.
///
/// # Thread Safety
///
/// `ShopifyHttpClient` is `Send + Sync` and cheap to share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct ShopifyHttpClient {
    client: reqwest::Client,
    api_host: Option<HostUrl>,
    user_agent: String,
}

// Verify ShopifyHttpClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ShopifyHttpClient>();
};

impl ShopifyHttpClient {
    /// Creates a client for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Transport`] if the TLS backend cannot be
    /// initialized.
    pub fn new(config: &AppConfig) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder().use_rustls_tls().build()?;
        let rust_version = env!("CARGO_PKG_RUST_VERSION");

        Ok(Self {
            client,
            api_host: config.api_host().cloned(),
            user_agent: format!("Shopify App Gateway v{GATEWAY_VERSION} | Rust {rust_version}"),
        })
    }

    /// Returns the base URI requests for `shop` are sent to.
    #[must_use]
    pub fn base_uri(&self, shop: &ShopDomain) -> String {
        self.api_host.as_ref().map_or_else(
            || format!("https://{}", shop.as_ref()),
            |host| host.as_ref().trim_end_matches('/').to_string(),
        )
    }

    fn request(
        &self,
        method: reqwest::Method,
        shop: &ShopDomain,
        path: &str,
    ) -> reqwest::RequestBuilder {
        let url = format!("{}{path}", self.base_uri(shop));
        let builder = self
            .client
            .request(method, url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .header(reqwest::header::ACCEPT, "application/json");

        if self.api_host.is_some() {
            builder.header(reqwest::header::HOST, shop.as_ref())
        } else {
            builder
        }
    }

    async fn send(
        builder: reqwest::RequestBuilder,
        path: &str,
    ) -> Result<HttpResponse, HttpError> {
        let res = builder.send().await?;
        let code = res.status().as_u16();
        let headers = HttpResponse::collect_headers(res.headers());
        let body = res.text().await?;

        let response = HttpResponse::new(code, headers, body);

        if let Some(reason) = response.deprecation_reason() {
            tracing::warn!(path, reason, "deprecated request to Shopify API");
        }
        tracing::debug!(
            path,
            status = code,
            request_id = response.request_id(),
            "Shopify API responded"
        );

        Ok(response)
    }
}

#[async_trait]
impl PlatformApi for ShopifyHttpClient {
    async fn post_token(
        &self,
        shop: &ShopDomain,
        request: &TokenRequest,
    ) -> Result<HttpResponse, HttpError> {
        let path = "/admin/oauth/access_token";
        let builder = self
            .request(reqwest::Method::POST, shop, path)
            .json(request);
        Self::send(builder, path).await
    }

    async fn get_resource(
        &self,
        shop: &ShopDomain,
        access_token: &str,
        path: &str,
    ) -> Result<HttpResponse, HttpError> {
        let builder = self
            .request(reqwest::Method::GET, shop, path)
            .header(ACCESS_TOKEN_HEADER, access_token);
        Self::send(builder, path).await
    }
}
