//! The install handshake.
//!
//! [`InstallFlow`] drives the three externally visible steps of the
//! authorization-code grant for one shop at a time:
//!
//! 1. **Status** ([`InstallFlow::status`]): landing page, redirect into
//!    authorization, or the installed view.
//! 2. **Authorize** ([`InstallFlow::authorize`]): issue a nonce and build the
//!    platform's authorization URL.
//! 3. **Callback** ([`InstallFlow::callback`]): verify the signed return
//!    trip, exchange the code for an offline token, persist the session.
//!
//! Client-input checks run before any store or network call. The flow holds
//! no mutable state between requests; everything durable goes through the
//! [`SessionStore`].
//!
//! # State machine
//!
//! ```text
//! Unknown --AuthorizeRequested--> Authorizing --CallbackReceived--> Exchanging
//! Exchanging --CredentialPersisted--> Installed
//! any --Rejected--> Failed --Restart--> Unknown
//! ```

use std::sync::Arc;

use serde::Deserialize;

use crate::auth::oauth::begin_auth::{begin_auth, BeginAuthResult};
use crate::auth::oauth::hmac::{self, constant_time_compare};
use crate::auth::oauth::query::CallbackQuery;
use crate::auth::session::{PendingAuthorization, Session};
use crate::clients::{PlatformApi, TokenRequest};
use crate::config::{AppConfig, ShopDomain};
use crate::error::GatewayError;
use crate::store::SessionStore;

/// Handshake state of one shop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowState {
    /// No request seen yet.
    Unknown,
    /// Redirect to the authorization page issued.
    Authorizing,
    /// Callback received, token exchange in flight.
    Exchanging,
    /// Credential persisted.
    Installed,
    /// A validation or dependency error ended the attempt.
    Failed,
}

/// Input to [`FlowState::on`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowEvent {
    /// `/auth` accepted a shop.
    AuthorizeRequested,
    /// `/callback` passed its input checks.
    CallbackReceived,
    /// The session record was written.
    CredentialPersisted,
    /// Any error.
    Rejected,
    /// The merchant starts over.
    Restart,
}

impl FlowState {
    /// Returns the state after `event`.
    ///
    /// Events that do not apply to the current state leave it unchanged.
    #[must_use]
    pub const fn on(self, event: FlowEvent) -> Self {
        match (self, event) {
            (_, FlowEvent::Rejected) => Self::Failed,
            (Self::Failed, FlowEvent::Restart) => Self::Unknown,
            (Self::Unknown | Self::Authorizing | Self::Installed, FlowEvent::AuthorizeRequested) => {
                Self::Authorizing
            }
            (Self::Authorizing, FlowEvent::CallbackReceived) => Self::Exchanging,
            (Self::Exchanging, FlowEvent::CredentialPersisted) => Self::Installed,
            (state, _) => state,
        }
    }
}

/// Per-request record of the state machine, logged at each transition.
struct FlowTrace<'a> {
    shop: &'a str,
    state: FlowState,
}

impl<'a> FlowTrace<'a> {
    const fn start(shop: &'a str, state: FlowState) -> Self {
        Self { shop, state }
    }

    fn advance(&mut self, event: FlowEvent) {
        let next = self.state.on(event);
        tracing::info!(shop = self.shop, from = ?self.state, to = ?next, ?event, "install flow transition");
        self.state = next;
    }

    fn fail(&mut self, error: &GatewayError) {
        if error.is_client_error() {
            tracing::info!(shop = self.shop, error = %error, "install flow rejected");
        } else {
            tracing::warn!(shop = self.shop, error = %error, "install flow failed");
        }
        self.advance(FlowEvent::Rejected);
    }
}

/// Outcome of the status step.
#[derive(Clone, Debug)]
pub enum StatusOutcome {
    /// No shop given: show the generic landing page.
    Landing,
    /// Not installed: send the browser to this location.
    Redirect {
        /// Relative redirect target, `/auth?shop=<shop>`.
        location: String,
    },
    /// Installed: show the session.
    Installed(Session),
}

/// Token endpoint response. Extra fields are ignored.
#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

/// The OAuth flow controller.
#[derive(Clone)]
pub struct InstallFlow {
    config: Arc<AppConfig>,
    store: SessionStore,
    platform: Arc<dyn PlatformApi>,
}

impl std::fmt::Debug for InstallFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallFlow")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl InstallFlow {
    /// Creates a controller over its injected dependencies.
    #[must_use]
    pub fn new(
        config: Arc<AppConfig>,
        store: SessionStore,
        platform: Arc<dyn PlatformApi>,
    ) -> Self {
        Self {
            config,
            store,
            platform,
        }
    }

    /// Status step (`/`).
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidSignature`] if `hmac` is present and does not verify
    /// - [`GatewayError::InvalidShop`] if `shop` is malformed
    /// - [`GatewayError::StoreUnavailable`] if the session cannot be read
    pub async fn status(&self, query: &CallbackQuery) -> Result<StatusOutcome, GatewayError> {
        if query.get("shop").map_or(true, str::is_empty) {
            return Ok(StatusOutcome::Landing);
        }

        if query.contains("hmac") && !hmac::verify(query, self.config.api_secret_key().as_ref()) {
            tracing::warn!("signed link rejected: invalid HMAC");
            return Err(GatewayError::InvalidSignature);
        }

        let shop = query.shop()?;

        match self.store.get_session(&shop).await? {
            Some(session) if session.is_active() => Ok(StatusOutcome::Installed(session)),
            _ => Ok(StatusOutcome::Redirect {
                location: auth_location(&shop),
            }),
        }
    }

    /// Authorize step (`/auth`).
    ///
    /// When state verification is on, the nonce is recorded before the URL
    /// is returned.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidShop`] if `shop` is absent or malformed
    /// - [`GatewayError::StoreUnavailable`] if the nonce cannot be recorded
    pub async fn authorize(&self, query: &CallbackQuery) -> Result<BeginAuthResult, GatewayError> {
        let shop = query.shop()?;
        let mut trace = FlowTrace::start(shop.as_ref(), FlowState::Unknown);

        let result = begin_auth(&self.config, &shop);

        if self.config.verify_state() {
            let pending = PendingAuthorization::issue(shop.clone(), &result.state);
            if let Err(e) = self.store.put_authorization(&pending).await {
                let error = GatewayError::from(e);
                trace.fail(&error);
                return Err(error);
            }
        }

        trace.advance(FlowEvent::AuthorizeRequested);
        Ok(result)
    }

    /// Callback step (`/callback`).
    ///
    /// # Errors
    ///
    /// - [`GatewayError::MissingParameter`] if `shop`, `code` or `hmac` is absent
    /// - [`GatewayError::InvalidSignature`] if the HMAC does not verify
    /// - [`GatewayError::InvalidShop`] if `shop` is malformed
    /// - [`GatewayError::StateMismatch`] if state verification is on and the
    ///   nonce is absent, unknown or already used
    /// - [`GatewayError::UpstreamToken`], [`GatewayError::TokenResponseMalformed`],
    ///   [`GatewayError::TokenMissing`] for a failed exchange
    /// - [`GatewayError::StoreUnavailable`] if the session cannot be written
    pub async fn callback(&self, query: &CallbackQuery) -> Result<Session, GatewayError> {
        query.require("shop")?;
        let code = query.require("code")?;
        query.require("hmac")?;

        if !hmac::verify(query, self.config.api_secret_key().as_ref()) {
            tracing::warn!("callback rejected: invalid HMAC");
            return Err(GatewayError::InvalidSignature);
        }

        let shop = query.shop()?;
        let mut trace = FlowTrace::start(shop.as_ref(), FlowState::Authorizing);

        match self.exchange(&shop, code, query, &mut trace).await {
            Ok(session) => Ok(session),
            Err(error) => {
                trace.fail(&error);
                Err(error)
            }
        }
    }

    async fn exchange(
        &self,
        shop: &ShopDomain,
        code: &str,
        query: &CallbackQuery,
        trace: &mut FlowTrace<'_>,
    ) -> Result<Session, GatewayError> {
        let pending = if self.config.verify_state() {
            Some(self.check_state(shop, query.get("state")).await?)
        } else {
            None
        };

        trace.advance(FlowEvent::CallbackReceived);

        let secret = self.config.api_secret_key();
        let request = TokenRequest {
            client_id: self.config.api_key().as_ref().to_string(),
            client_secret: secret.as_ref().to_string(),
            code: code.to_string(),
        };

        let response = self
            .platform
            .post_token(shop, &request)
            .await
            .map_err(|e| GatewayError::UpstreamToken {
                status: None,
                body: secret.redact(&e.to_string()),
            })?;

        if !response.is_ok() {
            return Err(GatewayError::UpstreamToken {
                status: Some(response.code),
                body: secret.redact(&response.body),
            });
        }

        let token: AccessTokenResponse =
            serde_json::from_str(&response.body).map_err(|_| {
                GatewayError::TokenResponseMalformed {
                    body: secret.redact(&response.body),
                }
            })?;

        let access_token = token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(GatewayError::TokenMissing)?;

        if let Some(granted) = token.scope.as_deref() {
            if granted != self.config.scopes() {
                tracing::debug!(shop = %shop, granted, "granted scope differs from requested");
            }
        }

        let session = Session::offline(
            shop.clone(),
            access_token,
            self.config.scopes().to_string(),
        );
        self.store.put_session(&session).await?;
        trace.advance(FlowEvent::CredentialPersisted);

        if let Some(pending) = pending {
            if let Err(e) = self.store.put_authorization(&pending.consumed()).await {
                tracing::warn!(shop = %shop, error = %e, "failed to clear used state nonce");
            }
        }

        Ok(session)
    }

    async fn check_state(
        &self,
        shop: &ShopDomain,
        received: Option<&str>,
    ) -> Result<PendingAuthorization, GatewayError> {
        let received = received
            .filter(|s| !s.is_empty())
            .ok_or(GatewayError::StateMismatch)?;

        match self.store.get_authorization(shop).await? {
            Some(pending)
                if pending.is_outstanding() && constant_time_compare(&pending.nonce, received) =>
            {
                Ok(pending)
            }
            _ => Err(GatewayError::StateMismatch),
        }
    }
}

/// Location of the authorize step for `shop`.
#[must_use]
pub fn auth_location(shop: &ShopDomain) -> String {
    format!("/auth?shop={}", urlencoding::encode(shop.as_ref()))
}
