//! Install handshake and the records it persists.
//!
//! - [`oauth`]: HMAC verification, the authorization redirect, and the
//!   [`InstallFlow`](oauth::InstallFlow) controller
//! - [`Session`]: the offline credential of one shop
//! - [`PendingAuthorization`]: the outstanding `state` nonce of one shop
//!
//! # Example
//!
//! ```rust
//! use shopify_app_gateway::{Session, ShopDomain};
//!
//! let shop = ShopDomain::new("my-store.myshopify.com").unwrap();
//! let session = Session::offline(shop, "access-token".to_string(), "read_products".to_string());
//!
//! assert_eq!(session.id, "offline_my-store.myshopify.com");
//! assert!(session.is_active());
//! ```

pub mod oauth;
pub mod session;

pub use session::{PendingAuthorization, Session};
