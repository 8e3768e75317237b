//! Persisted records of the install flow.
//!
//! - [`Session`]: the offline credential of an installed shop, keyed by
//!   `offline_<shop>`.
//! - [`PendingAuthorization`]: the `state` nonce issued by `/auth`, keyed by
//!   `state_<shop>`.
//!
//! Both serialize to the camelCase item layout of the session table.

use crate::auth::oauth::StateParam;
use crate::config::ShopDomain;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The offline access credential of one installed shop.
///
/// At most one session exists per shop; a re-install overwrites it.
/// A session is active if and only if its access token is non-empty.
///
/// # Example
///
/// ```rust
/// use shopify_app_gateway::{Session, ShopDomain};
///
/// let shop = ShopDomain::new("my-store.myshopify.com").unwrap();
/// let session = Session::offline(shop, "shpat_123".to_string(), "read_products".to_string());
///
/// assert_eq!(session.id, "offline_my-store.myshopify.com");
/// assert!(session.is_active());
/// assert!(!format!("{session:?}").contains("shpat_123"));
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Store key, `offline_<shop>`.
    pub id: String,

    /// The shop this session is for.
    pub shop: ShopDomain,

    /// Access token for the Admin API.
    #[serde(default)]
    pub access_token: String,

    /// Scope list recorded at install time.
    #[serde(default)]
    pub scope: String,

    /// When the exchange completed.
    #[serde(with = "epoch_millis")]
    pub installed_at: DateTime<Utc>,
}

impl Session {
    /// Creates the offline session of `shop`, installed now.
    #[must_use]
    pub fn offline(shop: ShopDomain, access_token: String, scope: String) -> Self {
        Self {
            id: shop.offline_session_id(),
            shop,
            access_token,
            scope,
            installed_at: Utc::now(),
        }
    }

    /// Returns `true` if this session carries an access token.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.access_token.is_empty()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("shop", &self.shop)
            .field("access_token", &"*****")
            .field("scope", &self.scope)
            .field("installed_at", &self.installed_at)
            .finish()
    }
}

// Verify Session is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Session>();
};

/// The `state` nonce issued for a shop's most recent authorization redirect.
///
/// An empty nonce means the last issued nonce has already been used.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingAuthorization {
    /// Store key, `state_<shop>`.
    pub id: String,

    /// The shop being authorized.
    pub shop: ShopDomain,

    /// The issued nonce.
    #[serde(default)]
    pub nonce: String,

    /// When the nonce was issued.
    #[serde(with = "epoch_millis")]
    pub issued_at: DateTime<Utc>,
}

impl PendingAuthorization {
    /// Records `state` as the outstanding nonce of `shop`.
    #[must_use]
    pub fn issue(shop: ShopDomain, state: &StateParam) -> Self {
        Self {
            id: Self::key_for(&shop),
            shop,
            nonce: state.as_ref().to_string(),
            issued_at: Utc::now(),
        }
    }

    /// Returns the store key of `shop`'s pending authorization.
    #[must_use]
    pub fn key_for(shop: &ShopDomain) -> String {
        format!("state_{shop}")
    }

    /// Returns the same record with its nonce cleared.
    #[must_use]
    pub fn consumed(self) -> Self {
        Self {
            nonce: String::new(),
            issued_at: Utc::now(),
            ..self
        }
    }

    /// How long an issued nonce stays valid.
    pub const MAX_AGE_SECS: i64 = 600;

    /// Returns `true` while the nonce is unused and younger than
    /// [`Self::MAX_AGE_SECS`].
    #[must_use]
    pub fn is_outstanding(&self) -> bool {
        self.is_outstanding_at(Utc::now())
    }

    /// [`Self::is_outstanding`] evaluated at `now`.
    #[must_use]
    pub fn is_outstanding_at(&self, now: DateTime<Utc>) -> bool {
        !self.nonce.is_empty() && now - self.issued_at <= Duration::seconds(Self::MAX_AGE_SECS)
    }
}

/// Timestamps are written as epoch milliseconds. Reads also accept RFC 3339.
mod epoch_millis {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(value.timestamp_millis())
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(i64),
        Float(f64),
        Text(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Raw::deserialize(deserializer)? {
            Raw::Millis(ms) => from_millis(ms),
            #[allow(clippy::cast_possible_truncation)]
            Raw::Float(ms) => from_millis(ms as i64),
            Raw::Text(text) => DateTime::parse_from_rfc3339(&text)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| de::Error::custom(format!("invalid timestamp '{text}': {e}"))),
        }
    }

    fn from_millis<E: de::Error>(ms: i64) -> Result<DateTime<Utc>, E> {
        Utc.timestamp_millis_opt(ms)
            .single()
            .ok_or_else(|| E::custom(format!("timestamp out of range: {ms}")))
    }
}
