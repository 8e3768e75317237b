//! OAuth 2.0 authorization-code grant for a single offline credential.
//!
//! # Handshake
//!
//! 1. `/` checks whether the shop already has an active session and, if
//!    not, redirects into `/auth`.
//! 2. `/auth` issues a [`StateParam`] nonce and redirects the merchant to
//!    the platform's authorization page ([`begin_auth`]).
//! 3. `/callback` verifies the HMAC of the returned parameters
//!    ([`hmac::verify`]), checks the nonce, exchanges the code for an
//!    access token, and upserts the session.
//!
//! [`InstallFlow`] drives all three steps; [`FlowState`] is the state machine
//! it logs transitions of.
//!
//! # Security
//!
//! - Every signature and nonce comparison is constant-time
//! - The shop domain is validated before any store or network call
//! - The client secret never appears in a surfaced error body
//!
//! # Example
//!
//! ```rust
//! use shopify_app_gateway::auth::oauth::{hmac, CallbackQuery};
//!
//! let mut query = CallbackQuery::parse("shop=my-store.myshopify.com&code=abc&timestamp=1700000000");
//! let signature = hmac::compute_signature(&query.to_signable_string(), "secret");
//! query.insert("hmac", signature);
//!
//! assert!(hmac::verify(&query, "secret"));
//! assert!(!hmac::verify(&query, "other-secret"));
//! ```

mod begin_auth;
mod flow;
pub mod hmac;
mod query;
mod state;

pub use begin_auth::{begin_auth, BeginAuthResult};
pub use flow::{auth_location, FlowEvent, FlowState, InstallFlow, StatusOutcome};
pub use hmac::{compute_signature, constant_time_compare};
pub use query::CallbackQuery;
pub use state::StateParam;
