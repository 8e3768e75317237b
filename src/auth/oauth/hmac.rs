//! HMAC verification of platform-signed query parameters.
//!
//! The platform signs the callback (and any signed link back into the app)
//! with HMAC-SHA256 over the canonical parameter string, keyed by the app's
//! client secret, and sends the digest as lowercase hex in `hmac`.
//!
//! # Security
//!
//! Digests are compared in constant time after a length check. A missing,
//! malformed or wrongly sized `hmac` fails closed.
//!
//! # Example
//!
//! ```rust
//! use shopify_app_gateway::auth::oauth::hmac::{compute_signature, verify};
//! use shopify_app_gateway::auth::oauth::CallbackQuery;
//!
//! let mut query = CallbackQuery::parse("code=abc&shop=my-store.myshopify.com&timestamp=1");
//! let signature = compute_signature(&query.to_signable_string(), "my-secret");
//! query.insert("hmac", signature);
//!
//! assert!(verify(&query, "my-secret"));
//! assert!(!verify(&query, "other-secret"));
//! ```

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::auth::oauth::CallbackQuery;

type HmacSha256 = Hmac<Sha256>;

const DIGEST_LEN: usize = 32;

fn digest(message: &str, secret: &str) -> [u8; DIGEST_LEN] {
    #[allow(clippy::expect_used)] // HMAC accepts keys of any length
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

/// Computes the lowercase hex HMAC-SHA256 of `message` under `secret`.
///
/// ```rust
/// use shopify_app_gateway::auth::oauth::hmac::compute_signature;
///
/// let sig = compute_signature("message", "key");
/// assert_eq!(sig, "6e9ef29b75fffc5b7abae527d58fdadb2fe42e7219011976917343065f58ed4a");
/// ```
#[must_use]
pub fn compute_signature(message: &str, secret: &str) -> String {
    hex::encode(digest(message, secret))
}

/// Performs constant-time comparison of two strings.
///
/// Used for nonce comparison as well as digests.
#[must_use]
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    // ConstantTimeEq handles different lengths securely
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Verifies the `hmac` parameter of `query` against `secret`.
///
/// Returns `false` when `hmac` is absent, is not hex, does not decode to a
/// 32-byte digest, or does not match. Never panics.
#[must_use]
pub fn verify(query: &CallbackQuery, secret: &str) -> bool {
    let Some(received) = query.get("hmac") else {
        return false;
    };

    let Ok(received) = hex::decode(received) else {
        return false;
    };

    if received.len() != DIGEST_LEN {
        return false;
    }

    let expected = digest(&query.to_signable_string(), secret);
    received.as_slice().ct_eq(&expected).into()
}
