//! Authenticated resource proxy.
//!
//! Looks up the shop's stored credential and relays one Admin API resource.
//! Upstream errors pass through with their status; successful bodies are
//! parsed as JSON and returned untouched.

use std::sync::Arc;

use serde_json::Value;
use tracing::instrument;

use crate::auth::oauth::CallbackQuery;
use crate::clients::PlatformApi;
use crate::config::AppConfig;
use crate::error::GatewayError;
use crate::store::SessionStore;

/// Resource relayed by `/products`.
pub const PRODUCTS_RESOURCE: &str = "products.json";

/// The resource proxy.
#[derive(Clone)]
pub struct ResourceProxy {
    config: Arc<AppConfig>,
    store: SessionStore,
    platform: Arc<dyn PlatformApi>,
}

impl std::fmt::Debug for ResourceProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceProxy")
            .field("api_version", self.config.api_version())
            .finish_non_exhaustive()
    }
}

impl ResourceProxy {
    /// Creates a proxy over its injected dependencies.
    #[must_use]
    pub fn new(
        config: Arc<AppConfig>,
        store: SessionStore,
        platform: Arc<dyn PlatformApi>,
    ) -> Self {
        Self {
            config,
            store,
            platform,
        }
    }

    /// Fetches the shop's product list.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidShop`] if `shop` is absent or malformed
    /// - [`GatewayError::NotInstalled`] if no active session exists; the
    ///   platform is not called
    /// - [`GatewayError::StoreUnavailable`] if the session cannot be read
    /// - [`GatewayError::UpstreamApi`] with the upstream status for a
    ///   non-2xx answer, or 502 when the platform is unreachable or answers
    ///   2xx with a body that is not JSON
    #[instrument(skip_all, fields(shop))]
    pub async fn products(&self, query: &CallbackQuery) -> Result<Value, GatewayError> {
        let shop = query.shop()?;
        tracing::Span::current().record("shop", tracing::field::display(&shop));

        let session = match self.store.get_session(&shop).await? {
            Some(session) if session.is_active() => session,
            _ => return Err(GatewayError::NotInstalled),
        };

        let path = self.config.api_version().resource_path(PRODUCTS_RESOURCE);
        let secret = self.config.api_secret_key();

        let response = self
            .platform
            .get_resource(&shop, &session.access_token, &path)
            .await
            .map_err(|e| GatewayError::UpstreamApi {
                status: 502,
                body: secret.redact(&e.to_string()),
            })?;

        if !response.is_ok() {
            tracing::warn!(status = response.code, "Shopify API returned an error");
            return Err(GatewayError::UpstreamApi {
                status: response.code,
                body: secret.redact(&response.body),
            });
        }

        response.json().map_err(|e| {
            tracing::warn!(error = %e, "Shopify API returned a non-JSON body");
            GatewayError::UpstreamApi {
                status: 502,
                body: secret.redact(&response.body),
            }
        })
    }
}
