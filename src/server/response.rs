//! Response rendering.
//!
//! Status pages are minimal HTML; everything else is plain text, a
//! redirect, or JSON. Every interpolated value goes through [`escape_html`].

use std::any::Any;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde_json::Value;

use crate::auth::session::Session;
use crate::config::EnvVarStatus;
use crate::error::{ConfigError, GatewayError};

const PAGE_STYLE: &str = "body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #f6f6f7; color: #202223; }\n\
.card { background: white; border: 1px solid #e1e3e5; border-radius: 8px; padding: 20px; max-width: 600px; margin: 40px auto; box-shadow: 0 4px 6px -1px rgba(0, 0, 0, 0.1); }\n\
table { width: 100%; border-collapse: collapse; }\n\
td { padding: 8px 0; border-bottom: 1px solid #e1e3e5; }\n\
td:first-child { font-weight: 600; width: 40%; }\n\
.active { color: #008060; font-weight: 600; }";

/// Escapes text for inclusion in HTML element content or attributes.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(status: StatusCode, title: &str, body: &str) -> Response {
    let html = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>\n{PAGE_STYLE}\n</style>\n</head>\n<body>\n<div class=\"card\">\n{body}\n</div>\n</body>\n</html>\n",
        title = escape_html(title),
    );
    (status, Html(html)).into_response()
}

fn text(status: StatusCode, body: impl Into<String>) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body.into(),
    )
        .into_response()
}

fn status_of(error: &GatewayError) -> StatusCode {
    StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::BAD_GATEWAY)
}

/// Generic page shown when `/` is opened without a shop.
#[must_use]
pub fn landing() -> Response {
    page(
        StatusCode::OK,
        "Shopify App Status",
        "<h1>Shopify App Status</h1>\n<p>Please open this app from the Shopify Admin.</p>",
    )
}

/// Installed-status view of a session. The access token is never rendered.
#[must_use]
pub fn installed(session: &Session) -> Response {
    let installed_at = session.installed_at.format("%Y-%m-%d %H:%M:%S UTC").to_string();
    let scope = if session.scope.is_empty() {
        "(none)"
    } else {
        session.scope.as_str()
    };
    let body = format!(
        "<h1>App Status</h1>\n<table>\n<tr><td>Shop Domain</td><td>{shop}</td></tr>\n<tr><td>Installed At</td><td>{installed_at}</td></tr>\n<tr><td>Scopes</td><td>{scope}</td></tr>\n<tr><td>Status</td><td class=\"active\">Active</td></tr>\n</table>",
        shop = escape_html(session.shop.as_ref()),
        installed_at = escape_html(&installed_at),
        scope = escape_html(scope),
    );
    page(StatusCode::OK, "App Status", &body)
}

/// 302 to `location`.
#[must_use]
pub fn redirect(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(header::LOCATION, value)]).into_response(),
        Err(_) => {
            tracing::error!("redirect location is not a valid header value");
            internal_error()
        }
    }
}

/// Success message of the callback.
#[must_use]
pub fn installed_message() -> Response {
    text(StatusCode::OK, "App installed successfully")
}

/// JSON payload relayed from the platform.
#[must_use]
pub fn json(value: Value) -> Response {
    (StatusCode::OK, Json(value)).into_response()
}

/// Error page of the status route.
#[must_use]
pub fn status_page_error(error: &GatewayError) -> Response {
    let status = status_of(error);
    match error {
        GatewayError::InvalidSignature => page(
            status,
            "Security Error",
            "<h1>Security Error</h1>\n<p>Invalid HMAC signature.</p>",
        ),
        GatewayError::StoreUnavailable(_) => page(
            status,
            "Database Error",
            "<h1>Database Error</h1>\n<p>Could not verify installation status.</p>",
        ),
        other => page(
            status,
            "Error",
            &format!("<h1>Error</h1>\n<p>{}</p>", escape_html(&other.to_string())),
        ),
    }
}

/// Plain error response of the API routes.
///
/// Upstream resource errors relay the upstream body as-is, typed JSON when
/// it parses as JSON.
#[must_use]
pub fn error(error: &GatewayError) -> Response {
    let status = status_of(error);
    match error {
        GatewayError::UpstreamApi { body, .. } => {
            if serde_json::from_str::<Value>(body).is_ok() {
                (
                    status,
                    [(header::CONTENT_TYPE, "application/json")],
                    body.clone(),
                )
                    .into_response()
            } else {
                text(status, body.clone())
            }
        }
        other => text(status, other.to_string()),
    }
}

/// 404 for unknown paths.
#[must_use]
pub fn not_found() -> Response {
    text(StatusCode::NOT_FOUND, "Not Found")
}

/// 405 for a known path with an unsupported method.
#[must_use]
pub fn method_not_allowed(allow: &'static str) -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, allow)],
        "Method Not Allowed",
    )
        .into_response()
}

/// Generic 500.
#[must_use]
pub fn internal_error() -> Response {
    text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}

/// Response for a panic caught in a handler.
#[allow(clippy::needless_pass_by_value)]
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_default();
    tracing::error!(%detail, "handler panicked");
    internal_error()
}

/// Diagnostic page served for every request when configuration failed.
///
/// Lists whether each required variable is set, never its value.
#[must_use]
pub fn configuration_error(error: &ConfigError, variables: &[EnvVarStatus]) -> Response {
    let rows: String = variables
        .iter()
        .map(|var| {
            format!(
                "{}: {}\n",
                escape_html(var.name),
                if var.present { "OK" } else { "MISSING" }
            )
        })
        .collect();

    let hint = match error {
        ConfigError::PlaceholderRedirectUri { .. } => {
            "<p>The <code>REDIRECT_URI</code> environment variable appears to be a placeholder. Set it to this app's public URL followed by <code>/callback</code>.</p>\n"
        }
        _ => "",
    };

    let body = format!(
        "<h1>Configuration Error</h1>\n<p>{message}</p>\n{hint}<pre>\n{rows}</pre>",
        message = escape_html(&error.to_string()),
    );
    page(StatusCode::INTERNAL_SERVER_ERROR, "Configuration Error", &body)
}
