//! HTTP surface.
//!
//! A single fallback handler matches the request path against [`Route`] and
//! hands the parsed query to the flow controller or the resource proxy.
//!
//! | Path | Handler |
//! |---|---|
//! | `/` | [`InstallFlow::status`] |
//! | `/auth` | [`InstallFlow::authorize`] |
//! | `/callback` | [`InstallFlow::callback`] |
//! | `/products` | [`ResourceProxy::products`] |
//!
//! `/` and `/products` answer `GET` and `HEAD`. `/auth` and `/callback`
//! change stored state and answer `GET` only. Any other method on a known
//! path is a 405; unknown paths are a 404 for every method.

pub mod response;

use std::sync::Arc;

use axum::extract::State;
use axum::http::{Method, Uri};
use axum::response::Response;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::auth::oauth::{CallbackQuery, InstallFlow, StatusOutcome};
use crate::clients::PlatformApi;
use crate::config::{AppConfig, EnvVarStatus};
use crate::error::ConfigError;
use crate::proxy::ResourceProxy;
use crate::store::SessionStore;

/// Route kinds of the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    /// `/`: install status.
    Status,
    /// `/auth`: start authorization.
    Auth,
    /// `/callback`: OAuth return trip.
    Callback,
    /// `/products`: resource proxy.
    Products,
    /// Anything else.
    NotFound,
}

impl Route {
    /// Matches a request path exactly.
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        match path {
            "/" | "" => Self::Status,
            "/auth" => Self::Auth,
            "/callback" => Self::Callback,
            "/products" => Self::Products,
            _ => Self::NotFound,
        }
    }

    /// Value of the `Allow` header for this route.
    #[must_use]
    pub const fn allowed_methods(self) -> &'static str {
        match self {
            Self::Status | Self::Products => "GET, HEAD",
            Self::Auth | Self::Callback => "GET",
            Self::NotFound => "",
        }
    }

    /// Returns `true` if `method` may be dispatched to this route.
    #[must_use]
    pub fn allows(self, method: &Method) -> bool {
        match self {
            Self::Status | Self::Products => method == Method::GET || method == Method::HEAD,
            Self::Auth | Self::Callback => method == Method::GET,
            Self::NotFound => false,
        }
    }
}

/// Shared handler state.
#[derive(Clone, Debug)]
pub struct AppState {
    flow: InstallFlow,
    proxy: ResourceProxy,
}

impl AppState {
    /// Wires the flow controller and the proxy to the same dependencies.
    #[must_use]
    pub fn new(
        config: Arc<AppConfig>,
        store: SessionStore,
        platform: Arc<dyn PlatformApi>,
    ) -> Self {
        Self {
            flow: InstallFlow::new(Arc::clone(&config), store.clone(), Arc::clone(&platform)),
            proxy: ResourceProxy::new(config, store, platform),
        }
    }
}

/// Builds the gateway router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .fallback(dispatch)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(response::panic_response)),
        )
        .with_state(state)
}

/// Builds the router served when configuration failed.
///
/// Every request gets the same diagnostic page.
pub fn misconfigured_router(error: ConfigError, variables: Vec<EnvVarStatus>) -> Router {
    let diagnostic = Arc::new((error, variables));
    Router::new()
        .fallback(move || {
            let diagnostic = Arc::clone(&diagnostic);
            async move { response::configuration_error(&diagnostic.0, &diagnostic.1) }
        })
        .layer(TraceLayer::new_for_http())
}

async fn dispatch(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    let route = Route::from_path(uri.path());
    if route == Route::NotFound {
        return response::not_found();
    }
    if !route.allows(&method) {
        return response::method_not_allowed(route.allowed_methods());
    }

    let query = CallbackQuery::parse(uri.query().unwrap_or_default());

    match route {
        Route::Status => match state.flow.status(&query).await {
            Ok(StatusOutcome::Landing) => response::landing(),
            Ok(StatusOutcome::Redirect { location }) => response::redirect(&location),
            Ok(StatusOutcome::Installed(session)) => response::installed(&session),
            Err(e) => response::status_page_error(&e),
        },
        Route::Auth => match state.flow.authorize(&query).await {
            Ok(result) => response::redirect(&result.auth_url),
            Err(e) => response::error(&e),
        },
        Route::Callback => match state.flow.callback(&query).await {
            Ok(_) => response::installed_message(),
            Err(e) => response::error(&e),
        },
        Route::Products => match state.proxy.products(&query).await {
            Ok(payload) => response::json(payload),
            Err(e) => response::error(&e),
        },
        Route::NotFound => response::not_found(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_from_path() {
        assert_eq!(Route::from_path("/"), Route::Status);
        assert_eq!(Route::from_path("/auth"), Route::Auth);
        assert_eq!(Route::from_path("/callback"), Route::Callback);
        assert_eq!(Route::from_path("/products"), Route::Products);
    }

    #[test]
    fn test_route_match_is_exact() {
        assert_eq!(Route::from_path("/auth/"), Route::NotFound);
        assert_eq!(Route::from_path("/Auth"), Route::NotFound);
        assert_eq!(Route::from_path("/products.json"), Route::NotFound);
        assert_eq!(Route::from_path("/favicon.ico"), Route::NotFound);
    }

    #[test]
    fn test_head_only_on_read_only_routes() {
        assert!(Route::Status.allows(&Method::HEAD));
        assert!(Route::Products.allows(&Method::HEAD));
        assert!(!Route::Auth.allows(&Method::HEAD));
        assert!(!Route::Callback.allows(&Method::HEAD));
        assert!(Route::Callback.allows(&Method::GET));
        assert!(!Route::Status.allows(&Method::POST));
        assert_eq!(Route::Auth.allowed_methods(), "GET");
    }
}
