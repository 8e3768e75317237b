//! Raw responses from the platform.
//!
//! The gateway relays upstream bodies verbatim, so [`HttpResponse`] keeps the
//! body as received and leaves parsing to the caller.

use std::collections::HashMap;

/// A response from one of the platform's endpoints, of any status.
///
/// # Example
///
/// ```rust
/// use shopify_app_gateway::clients::HttpResponse;
///
/// let response = HttpResponse::new(200, Default::default(), r#"{"products":[]}"#.to_string());
/// assert!(response.is_ok());
/// assert!(response.json().unwrap()["products"].is_array());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub code: u16,
    /// Response headers, lowercase names, all values kept.
    pub headers: HashMap<String, Vec<String>>,
    /// Body text as received.
    pub body: String,
}

impl HttpResponse {
    /// Creates a response.
    #[must_use]
    pub const fn new(code: u16, headers: HashMap<String, Vec<String>>, body: String) -> Self {
        Self {
            code,
            headers,
            body,
        }
    }

    /// Returns `true` for a 2xx status.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code >= 200 && self.code <= 299
    }

    /// Returns the `X-Request-Id` header, if present.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.header("x-request-id")
    }

    /// Returns the `X-Shopify-API-Deprecated-Reason` header, if present.
    #[must_use]
    pub fn deprecation_reason(&self) -> Option<&str> {
        self.header("x-shopify-api-deprecated-reason")
    }

    /// Returns the first value of header `name` (lowercase).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Parses the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns the decoder error for a body that is not valid JSON.
    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    pub(crate) fn collect_headers(
        headers: &reqwest::header::HeaderMap,
    ) -> HashMap<String, Vec<String>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            result.entry(key).or_default().push(value);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_header(name: &str, value: &str) -> HashMap<String, Vec<String>> {
        let mut headers = HashMap::new();
        headers.insert(name.to_string(), vec![value.to_string()]);
        headers
    }

    #[test]
    fn test_is_ok_only_for_2xx() {
        assert!(HttpResponse::new(200, HashMap::new(), String::new()).is_ok());
        assert!(HttpResponse::new(204, HashMap::new(), String::new()).is_ok());
        assert!(!HttpResponse::new(302, HashMap::new(), String::new()).is_ok());
        assert!(!HttpResponse::new(401, HashMap::new(), String::new()).is_ok());
        assert!(!HttpResponse::new(503, HashMap::new(), String::new()).is_ok());
    }

    #[test]
    fn test_request_id_extraction() {
        let response = HttpResponse::new(200, with_header("x-request-id", "abc-123"), String::new());
        assert_eq!(response.request_id(), Some("abc-123"));
    }

    #[test]
    fn test_deprecation_reason_extraction() {
        let response = HttpResponse::new(
            200,
            with_header("x-shopify-api-deprecated-reason", "sunset"),
            String::new(),
        );
        assert_eq!(response.deprecation_reason(), Some("sunset"));
    }

    #[test]
    fn test_json_rejects_non_json_body() {
        let response = HttpResponse::new(200, HashMap::new(), "<html>".to_string());
        assert!(response.json().is_err());
    }
}
