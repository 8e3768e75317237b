//! `state` nonce for binding an authorization redirect to its callback.
//!
//! Each call to `/auth` issues a fresh [`StateParam`]: 16 bytes from the
//! thread-local CSPRNG, encoded as 32 lowercase hex characters.
//!
//! # Example
//!
//! ```rust
//! use shopify_app_gateway::auth::oauth::StateParam;
//!
//! let state = StateParam::new();
//! assert_eq!(state.as_ref().len(), 32);
//! assert!(state.as_ref().chars().all(|c| c.is_ascii_hexdigit()));
//! ```

use rand::RngCore;
use std::fmt;

/// OAuth `state` parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateParam(String);

// Verify StateParam is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<StateParam>();
};

impl StateParam {
    /// Number of random bytes in a nonce.
    pub const NONCE_BYTES: usize = 16;

    /// Generates a new random nonce.
    #[must_use]
    pub fn new() -> Self {
        let mut bytes = [0u8; Self::NONCE_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }
}

impl Default for StateParam {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<str> for StateParam {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
