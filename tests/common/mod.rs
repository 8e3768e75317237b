//! Shared fakes for the integration tests.
//!
//! Each test binary pulls in only what it needs.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use shopify_app_gateway::auth::oauth::{hmac, CallbackQuery};
use shopify_app_gateway::server::{self, AppState};
use shopify_app_gateway::{
    ApiKey, ApiSecretKey, AppConfig, HttpError, HttpResponse, Item, KeyValueStore, MemoryStore,
    PlatformApi, RedirectUri, SessionStore, ShopDomain, StoreError, TableName, TokenRequest,
};

pub const CLIENT_ID: &str = "test-client-id";
pub const CLIENT_SECRET: &str = "test-client-secret";
pub const SCOPES: &str = "read_products,write_orders";
pub const REDIRECT_URI: &str = "https://app.mycompany.io/callback";

/// Creates a configuration with the given state-verification setting.
pub fn test_config(verify_state: bool) -> AppConfig {
    test_config_with_scopes(verify_state, SCOPES)
}

pub fn test_config_with_scopes(verify_state: bool, scopes: &str) -> AppConfig {
    AppConfig::builder()
        .api_key(ApiKey::new(CLIENT_ID).unwrap())
        .api_secret_key(ApiSecretKey::new(CLIENT_SECRET).unwrap())
        .scopes(scopes)
        .redirect_uri(RedirectUri::new(REDIRECT_URI).unwrap())
        .table_name(TableName::new("sessions").unwrap())
        .verify_state(verify_state)
        .build()
        .unwrap()
}

pub fn shop(domain: &str) -> ShopDomain {
    ShopDomain::new(domain).unwrap()
}

/// Builds a query string signed with `secret`, `hmac` appended last.
pub fn signed_query(params: &[(&str, &str)], secret: &str) -> String {
    let query: CallbackQuery = params
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    let signature = hmac::compute_signature(&query.to_signable_string(), secret);

    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (k, v) in params {
        serializer.append_pair(k, v);
    }
    serializer.append_pair("hmac", &signature);
    serializer.finish()
}

/// A [`KeyValueStore`] over a [`MemoryStore`] that records every call and
/// can be switched to fail.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    gets: AtomicUsize,
    put_keys: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl CountingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn put_keys(&self) -> Vec<String> {
        self.put_keys.lock().unwrap().clone()
    }

    /// Number of writes of session records.
    pub fn session_puts(&self) -> usize {
        self.put_keys()
            .iter()
            .filter(|k| k.starts_with("offline_"))
            .count()
    }

    pub async fn len(&self) -> usize {
        self.inner.len().await
    }

    pub async fn raw(&self, key: &str) -> Option<Item> {
        self.inner.get(key).await.unwrap()
    }
}

#[async_trait]
impl KeyValueStore for CountingStore {
    async fn get(&self, key: &str) -> Result<Option<Item>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                message: "ProvisionedThroughputExceededException".to_string(),
            });
        }
        self.inner.get(key).await
    }

    async fn put(&self, item: Item) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                message: "ProvisionedThroughputExceededException".to_string(),
            });
        }
        if let Some(key) = item.get("id").and_then(|v| v.as_str()) {
            self.put_keys.lock().unwrap().push(key.to_string());
        }
        self.inner.put(item).await
    }
}

/// A canned reply of [`FakePlatform`]; `None` simulates a transport failure.
type Reply = Option<(u16, String)>;

/// A [`PlatformApi`] answering with canned replies and recording requests.
pub struct FakePlatform {
    token_reply: Mutex<Reply>,
    resource_reply: Mutex<Reply>,
    token_requests: Mutex<Vec<TokenRequest>>,
    resource_requests: Mutex<Vec<(String, String)>>,
}

impl FakePlatform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            token_reply: Mutex::new(Some((200, r#"{"access_token":"tok123","scope":"read_products,write_orders"}"#.to_string()))),
            resource_reply: Mutex::new(Some((200, r#"{"products":[{"id":1,"title":"Hat"}]}"#.to_string()))),
            token_requests: Mutex::new(Vec::new()),
            resource_requests: Mutex::new(Vec::new()),
        })
    }

    pub fn set_token_reply(&self, status: u16, body: &str) {
        *self.token_reply.lock().unwrap() = Some((status, body.to_string()));
    }

    pub fn fail_token_transport(&self) {
        *self.token_reply.lock().unwrap() = None;
    }

    pub fn set_resource_reply(&self, status: u16, body: &str) {
        *self.resource_reply.lock().unwrap() = Some((status, body.to_string()));
    }

    pub fn token_calls(&self) -> usize {
        self.token_requests.lock().unwrap().len()
    }

    pub fn token_requests(&self) -> Vec<TokenRequest> {
        self.token_requests.lock().unwrap().clone()
    }

    pub fn resource_calls(&self) -> usize {
        self.resource_requests.lock().unwrap().len()
    }

    /// `(access_token, path)` of each resource request.
    pub fn resource_requests(&self) -> Vec<(String, String)> {
        self.resource_requests.lock().unwrap().clone()
    }
}

fn reply(canned: &Reply) -> Result<HttpResponse, HttpError> {
    canned.as_ref().map_or_else(
        || {
            Err(HttpError::Transport {
                message: "connection refused".to_string(),
            })
        },
        |(status, body)| Ok(HttpResponse::new(*status, Default::default(), body.clone())),
    )
}

#[async_trait]
impl PlatformApi for FakePlatform {
    async fn post_token(
        &self,
        _shop: &ShopDomain,
        request: &TokenRequest,
    ) -> Result<HttpResponse, HttpError> {
        self.token_requests.lock().unwrap().push(request.clone());
        reply(&self.token_reply.lock().unwrap())
    }

    async fn get_resource(
        &self,
        _shop: &ShopDomain,
        access_token: &str,
        path: &str,
    ) -> Result<HttpResponse, HttpError> {
        self.resource_requests
            .lock()
            .unwrap()
            .push((access_token.to_string(), path.to_string()));
        reply(&self.resource_reply.lock().unwrap())
    }
}

/// A router over the given fakes.
pub fn test_router(
    config: AppConfig,
    store: &Arc<CountingStore>,
    platform: &Arc<FakePlatform>,
) -> axum::Router {
    let state = AppState::new(
        Arc::new(config),
        SessionStore::new(store.clone()),
        platform.clone(),
    );
    server::router(state)
}
