//! Inbound query parameters of the install routes.
//!
//! [`CallbackQuery`] holds the full decoded parameter set of a request. The
//! HMAC check needs every parameter the platform signed, not just the ones a
//! route uses, so nothing is dropped during parsing.

use std::collections::BTreeMap;

use crate::config::ShopDomain;
use crate::error::GatewayError;

/// Decoded query parameters, ordered by key.
///
/// A key repeated in the query string keeps all of its values, joined with
/// `,` in order of appearance.
///
/// # Example
///
/// ```rust
/// use shopify_app_gateway::auth::oauth::CallbackQuery;
///
/// let query = CallbackQuery::parse("shop=my-store.myshopify.com&code=abc&hmac=ff");
/// assert_eq!(query.get("code"), Some("abc"));
/// assert_eq!(query.to_signable_string(), "code=abc&shop=my-store.myshopify.com");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallbackQuery {
    params: BTreeMap<String, String>,
}

impl CallbackQuery {
    /// Parses a raw, percent-encoded query string (without the leading `?`).
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        url::form_urlencoded::parse(raw.as_bytes()).collect()
    }

    /// Returns the value of `name`, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Returns the value of `name`, treating an empty value as absent.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MissingParameter`] when absent or empty.
    pub fn require(&self, name: &'static str) -> Result<&str, GatewayError> {
        self.get(name)
            .filter(|v| !v.is_empty())
            .ok_or(GatewayError::MissingParameter { name })
    }

    /// Returns the validated `shop` parameter.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidShop`] when `shop` is absent or does not
    /// match the shop domain format.
    pub fn shop(&self) -> Result<ShopDomain, GatewayError> {
        self.get("shop")
            .and_then(|shop| ShopDomain::new(shop).ok())
            .ok_or(GatewayError::InvalidShop)
    }

    /// Returns `true` if `name` is present, even with an empty value.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// Sets a parameter, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.insert(name.into(), value.into());
    }

    /// Builds the message the platform signs: every parameter except
    /// `hmac`, sorted byte-wise by key, as `key=value` pairs joined by `&`.
    ///
    /// Values are used decoded, exactly as received.
    #[must_use]
    pub fn to_signable_string(&self) -> String {
        self.params
            .iter()
            .filter(|(key, _)| key.as_str() != "hmac")
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K, V> FromIterator<(K, V)> for CallbackQuery
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params: BTreeMap<String, String> = BTreeMap::new();
        for (key, value) in iter {
            let value = value.into();
            params
                .entry(key.into())
                .and_modify(|existing| {
                    existing.push(',');
                    existing.push_str(&value);
                })
                .or_insert(value);
        }
        Self { params }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decodes_percent_encoding() {
        let query = CallbackQuery::parse("shop=my-store.myshopify.com&host=YWRtaW4%3D&x=a+b");
        assert_eq!(query.get("host"), Some("YWRtaW4="));
        assert_eq!(query.get("x"), Some("a b"));
    }

    #[test]
    fn test_repeated_keys_are_joined_with_comma() {
        let query = CallbackQuery::parse("ids=1&ids=2&ids=3");
        assert_eq!(query.get("ids"), Some("1,2,3"));
    }

    #[test]
    fn test_signable_string_excludes_hmac_and_sorts_keys() {
        let query = CallbackQuery::from_iter([
            ("timestamp", "1337178173"),
            ("hmac", "deadbeef"),
            ("shop", "some-shop.myshopify.com"),
            ("code", "0907a61c0c8d55e99db179b68161bc00"),
        ]);

        assert_eq!(
            query.to_signable_string(),
            "code=0907a61c0c8d55e99db179b68161bc00&shop=some-shop.myshopify.com&timestamp=1337178173"
        );
    }

    #[test]
    fn test_signable_string_uses_byte_order() {
        let query = CallbackQuery::from_iter([("b", "1"), ("B", "2"), ("a_", "3"), ("a", "4")]);
        assert_eq!(query.to_signable_string(), "B=2&a=4&a_=3&b=1");
    }

    #[test]
    fn test_require_treats_empty_as_missing() {
        let query = CallbackQuery::parse("shop=&code=abc");
        assert!(matches!(
            query.require("shop"),
            Err(GatewayError::MissingParameter { name: "shop" })
        ));
        assert!(matches!(
            query.require("hmac"),
            Err(GatewayError::MissingParameter { name: "hmac" })
        ));
        assert_eq!(query.require("code").unwrap(), "abc");
        assert!(query.contains("shop"));
    }

    #[test]
    fn test_shop_rejects_invalid_domain() {
        let query = CallbackQuery::parse("shop=evil.com");
        assert!(matches!(query.shop(), Err(GatewayError::InvalidShop)));

        let query = CallbackQuery::parse("");
        assert!(matches!(query.shop(), Err(GatewayError::InvalidShop)));

        let query = CallbackQuery::parse("shop=good-shop.myshopify.com");
        assert_eq!(query.shop().unwrap().as_ref(), "good-shop.myshopify.com");
    }
}
