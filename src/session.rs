//! # Login Session (OAuth 2.0 Authorization Code + PKCE)
//!
//! The client cannot keep a secret, so each login binds the authorization
//! code to a one-time code verifier that only this client knows.
//!
//! ## Lifecycle
//!
//! ```text
//! Unauthenticated --begin_login--> PendingExchange --complete_login--> Authenticated
//!                 <--cancel_login / failed exchange--
//! ```
//!
//! The flow is split across a browser redirect, so [`AuthSession::begin_login`]
//! and [`AuthSession::complete_login`] are separate entry points that share
//! nothing but the durable [`SessionStore`]:
//!
//! 1. `begin_login` stores a fresh verifier and returns the authorize URL.
//! 2. The user approves access in a browser and lands on the redirect URI.
//! 3. [`CallbackOutcome::from_redirect`] pulls the `code` (or `error`) out of
//!    that URL, possibly in a different process.
//! 4. `complete_login` trades code + verifier for tokens and drops the verifier.

use crate::error::{Error, Result};
use crate::store::{SessionStore, ACCESS_TOKEN, CODE_VERIFIER, REFRESH_TOKEN};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use log::{debug, info, warn};
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;
use reqwest::Url;
use serde::Deserialize;
use sha2::{Digest, Sha256};

/// Length of generated code verifiers (RFC 7636 allows 43..=128)
pub const VERIFIER_LENGTH: usize = 64;

/// OAuth client settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub client_id: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    /// Authorization server base, e.g. `https://accounts.spotify.com`
    pub accounts_url: String,
}

impl AuthConfig {
    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.accounts_url.trim_end_matches('/'))
    }
}

/// A PKCE verifier and its S256 challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pkce {
    pub verifier: String,
    pub challenge: String,
}

impl Pkce {
    /// Fresh random verifier from the OS CSPRNG.
    pub fn generate() -> Self {
        let verifier: String = OsRng
            .sample_iter(&Alphanumeric)
            .take(VERIFIER_LENGTH)
            .map(char::from)
            .collect();
        Self::from_verifier(verifier)
    }

    pub fn from_verifier(verifier: String) -> Self {
        let challenge = code_challenge(&verifier);
        Self { verifier, challenge }
    }
}

/// base64url(SHA-256(verifier)) without padding.
pub fn code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Where to send the user to approve access.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: Url,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    PendingExchange,
    Authenticated,
}

/// What the provider sent back to the redirect URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Code(String),
    Denied(String),
}

impl CallbackOutcome {
    /// Parse the redirect target. Accepts a full URL or just its query string.
    pub fn from_redirect(input: &str) -> Result<Self> {
        let input = input.trim();
        let url = Url::parse(input)
            .or_else(|_| Url::parse(&format!("http://localhost/?{}", input.trim_start_matches('?'))))
            .map_err(|e| Error::InvalidCallback(e.to_string()))?;

        let param = |name: &str| {
            url.query_pairs()
                .find(|(key, value)| key == name && !value.is_empty())
                .map(|(_, value)| value.into_owned())
        };

        if let Some(error) = param("error") {
            return Ok(Self::Denied(error));
        }
        param("code")
            .map(Self::Code)
            .ok_or_else(|| Error::InvalidCallback("no 'code' or 'error' parameter".to_string()))
    }
}

/// Session state as recorded in `store`. Needs no client settings.
pub fn session_state<S: SessionStore + ?Sized>(store: &S) -> Result<SessionState> {
    if store.get(ACCESS_TOKEN)?.is_some() {
        Ok(SessionState::Authenticated)
    } else if store.get(CODE_VERIFIER)?.is_some() {
        Ok(SessionState::PendingExchange)
    } else {
        Ok(SessionState::Unauthenticated)
    }
}

/// Delete every persisted auth field from `store`.
pub fn clear_session<S: SessionStore + ?Sized>(store: &mut S) -> Result<()> {
    for key in [ACCESS_TOKEN, REFRESH_TOKEN, CODE_VERIFIER] {
        store.delete(key)?;
    }
    info!("Logged out");
    Ok(())
}

/// Token endpoint reply, success or failure.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Issued tokens
#[derive(Debug, Clone, PartialEq, Eq)]
struct Tokens {
    access_token: String,
    refresh_token: Option<String>,
}

/// Owns the login state and the store it lives in.
pub struct AuthSession<S: SessionStore> {
    config: AuthConfig,
    store: S,
    http: reqwest::Client,
}

impl<S: SessionStore> AuthSession<S> {
    pub fn new(config: AuthConfig, store: S, http: reqwest::Client) -> Self {
        Self { config, store, http }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn state(&self) -> Result<SessionState> {
        session_state(&self.store)
    }

    /// Start a login: store a new verifier and build the authorize URL.
    ///
    /// Any previous tokens are discarded first.
    pub fn begin_login(&mut self) -> Result<AuthorizationRequest> {
        let pkce = Pkce::generate();

        self.store.delete(ACCESS_TOKEN)?;
        self.store.delete(REFRESH_TOKEN)?;
        self.store.set(CODE_VERIFIER, &pkce.verifier)?;

        let scope = self.config.scopes.join(" ");
        let url = Url::parse_with_params(
            &self.config.endpoint("authorize"),
            &[
                ("client_id", self.config.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("scope", scope.as_str()),
                ("code_challenge_method", "S256"),
                ("code_challenge", pkce.challenge.as_str()),
                ("show_dialog", "true"),
            ],
        )
        .map_err(|e| Error::Config(format!("invalid accounts URL '{}': {e}", self.config.accounts_url)))?;

        info!("Login started; waiting for authorization callback");
        Ok(AuthorizationRequest { url })
    }

    /// Finish a login with the authorization `code` from the callback.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingVerifier`] if no login is pending
    /// - [`Error::ExchangeFailed`] if the token endpoint refuses; the pending
    ///   login is cancelled
    pub async fn complete_login(&mut self, code: &str) -> Result<()> {
        let verifier = self
            .store
            .get(CODE_VERIFIER)?
            .ok_or(Error::MissingVerifier)?;

        match self.exchange(code, &verifier).await {
            Ok(tokens) => {
                self.store.set(ACCESS_TOKEN, &tokens.access_token)?;
                match &tokens.refresh_token {
                    Some(refresh) => self.store.set(REFRESH_TOKEN, refresh)?,
                    None => self.store.delete(REFRESH_TOKEN)?,
                }
                self.store.delete(CODE_VERIFIER)?;
                info!("Login complete");
                Ok(())
            }
            Err(e) => {
                warn!("Token exchange failed, cancelling pending login: {e}");
                self.store.delete(CODE_VERIFIER)?;
                Err(e)
            }
        }
    }

    /// Abandon a pending login.
    pub fn cancel_login(&mut self) -> Result<()> {
        debug!("Cancelling pending login");
        self.store.delete(CODE_VERIFIER)
    }

    pub fn current_access_token(&self) -> Result<Option<String>> {
        self.store.get(ACCESS_TOKEN)
    }

    /// Forget every persisted auth field.
    pub fn logout(&mut self) -> Result<()> {
        clear_session(&mut self.store)
    }

    async fn exchange(&self, code: &str, verifier: &str) -> Result<Tokens> {
        let endpoint = self.config.endpoint("api/token");
        debug!("Exchanging authorization code at {endpoint}");

        let response = self
            .http
            .post(&endpoint)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("code_verifier", verifier),
            ])
            .send()
            .await
            .map_err(|e| Error::ExchangeFailed(e.to_string()))?;

        let status = response.status();
        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::ExchangeFailed(format!("HTTP {status}, unreadable body: {e}")))?;

        match body.access_token {
            Some(access_token) if status.is_success() && !access_token.is_empty() => Ok(Tokens {
                access_token,
                refresh_token: body.refresh_token.filter(|t| !t.is_empty()),
            }),
            _ => {
                let reason = body
                    .error_description
                    .or(body.error)
                    .unwrap_or_else(|| format!("HTTP {status} without an access token"));
                Err(Error::ExchangeFailed(reason))
            }
        }
    }
}
