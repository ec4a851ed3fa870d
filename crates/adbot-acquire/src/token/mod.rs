//! Bearer-token lifecycle for the search API.
//!
//! Tokens live in a caller-owned [`TokenSession`]; the [`TokenManager`] only
//! knows how to check and refresh one. Refresh is lazy: [`TokenManager::ensure_valid`]
//! exchanges credentials only when the session holds no token or the token is
//! inside the refresh buffer. For sharing tokens between sessions see
//! [`cache::TokenCache`].

pub mod cache;

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::Deserialize;

use crate::error::AcquireError;
use crate::http::{parse_url, HttpClient};
use crate::pacing::Pacer;

pub use cache::TokenCache;

/// Default safety margin subtracted from a token's nominal lifetime.
pub const DEFAULT_REFRESH_BUFFER_SECS: u64 = 300;

#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    access_token: String,
    obtained_at: DateTime<Utc>,
    expires_in_secs: i64,
}

impl AccessToken {
    #[must_use]
    pub fn new(access_token: impl Into<String>, obtained_at: DateTime<Utc>, expires_in_secs: u64) -> Self {
        Self {
            access_token: access_token.into(),
            obtained_at,
            expires_in_secs: i64::try_from(expires_in_secs).unwrap_or(i64::MAX),
        }
    }

    #[must_use]
    pub fn secret(&self) -> &str {
        &self.access_token
    }

    #[must_use]
    pub fn obtained_at(&self) -> DateTime<Utc> {
        self.obtained_at
    }

    #[must_use]
    pub fn expires_in_secs(&self) -> i64 {
        self.expires_in_secs
    }

    /// `true` once `now` reaches `obtained_at + expires_in - buffer`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>, buffer: chrono::Duration) -> bool {
        let lifetime = chrono::Duration::try_seconds(self.expires_in_secs)
            .unwrap_or(chrono::Duration::MAX);
        match self
            .obtained_at
            .checked_add_signed(lifetime)
            .and_then(|t| t.checked_sub_signed(buffer))
        {
            Some(refresh_at) => refresh_at <= now,
            // Overflowing the calendar means the token effectively never expires.
            None => false,
        }
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"[redacted]")
            .field("obtained_at", &self.obtained_at)
            .field("expires_in_secs", &self.expires_in_secs)
            .finish()
    }
}

/// Per-caller token state.
#[derive(Debug, Clone, Default)]
pub struct TokenSession {
    token: Option<AccessToken>,
}

impl TokenSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(token: AccessToken) -> Self {
        Self { token: Some(token) }
    }

    #[must_use]
    pub fn token(&self) -> Option<&AccessToken> {
        self.token.as_ref()
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.token.as_ref().map(AccessToken::secret)
    }

    pub fn set(&mut self, token: AccessToken) {
        self.token = Some(token);
    }

    pub fn clear(&mut self) {
        self.token = None;
    }
}

/// Client-credentials grant parameters.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub scope: String,
}

impl Credentials {
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: scope.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("scope", &self.scope)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct TokenManager {
    http: HttpClient,
    token_url: Url,
    credentials: Credentials,
    refresh_buffer: chrono::Duration,
    exchange_timeout: Duration,
    pacer: Pacer,
}

impl TokenManager {
    /// `exchange_timeout_secs` bounds each token request, replacing the
    /// client-wide timeout for that call.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError::InvalidRequest`] if `token_url` is not a valid
    /// absolute URL or `exchange_timeout_secs` is zero.
    pub fn new(
        http: HttpClient,
        token_url: &str,
        credentials: Credentials,
        refresh_buffer_secs: u64,
        exchange_timeout_secs: u64,
        pacer: Pacer,
    ) -> Result<Self, AcquireError> {
        if exchange_timeout_secs == 0 {
            return Err(AcquireError::InvalidRequest(
                "token exchange timeout must be at least 1s".to_owned(),
            ));
        }
        let refresh_buffer = i64::try_from(refresh_buffer_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| {
                AcquireError::InvalidRequest(format!(
                    "refresh buffer of {refresh_buffer_secs}s is out of range"
                ))
            })?;
        Ok(Self {
            http,
            token_url: parse_url(token_url)?,
            credentials,
            refresh_buffer,
            exchange_timeout: Duration::from_secs(exchange_timeout_secs),
            pacer,
        })
    }

    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    #[must_use]
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    #[must_use]
    pub fn exchange_timeout(&self) -> Duration {
        self.exchange_timeout
    }

    #[must_use]
    pub fn refresh_buffer(&self) -> chrono::Duration {
        self.refresh_buffer
    }

    /// `true` if the session has no token or its token is inside the refresh
    /// buffer at `now`.
    #[must_use]
    pub fn is_expired(&self, session: &TokenSession, now: DateTime<Utc>) -> bool {
        session
            .token()
            .is_none_or(|t| t.is_expired_at(now, self.refresh_buffer))
    }

    /// Makes sure `session` holds a usable token, exchanging credentials only
    /// when needed.
    ///
    /// # Errors
    ///
    /// Propagates the classified failure from [`Self::refresh`]; the session's
    /// token is cleared in that case.
    pub async fn ensure_valid(&self, session: &mut TokenSession) -> Result<(), AcquireError> {
        if !self.is_expired(session, Utc::now()) {
            tracing::debug!("current access token is still valid");
            return Ok(());
        }
        tracing::info!(client_id = %self.credentials.client_id, "requesting new access token");
        self.refresh(session).await
    }

    /// Performs a client-credentials exchange and stores the result in
    /// `session`.
    ///
    /// # Errors
    ///
    /// - [`AcquireError::Auth`] when the response lacks a usable
    ///   `access_token`/`expires_in`.
    /// - [`AcquireError::Transport`] on timeout or connection failure.
    /// - [`AcquireError::HttpStatus`] on a non-2xx status.
    ///
    /// The session's token is cleared on every error.
    pub async fn refresh(&self, session: &mut TokenSession) -> Result<(), AcquireError> {
        match self.exchange().await {
            Ok(token) => {
                tracing::info!(
                    expires_in_secs = token.expires_in_secs(),
                    "obtained access token via client credentials"
                );
                session.set(token);
                Ok(())
            }
            Err(err) => {
                session.clear();
                tracing::error!(kind = %err.kind(), error = %err, "access token exchange failed");
                Err(err)
            }
        }
    }

    async fn exchange(&self) -> Result<AccessToken, AcquireError> {
        self.pacer.pace().await;

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("scope", self.credentials.scope.as_str()),
        ];
        let request = self
            .http
            .post(self.token_url.clone())
            .timeout(self.exchange_timeout)
            .form(&form);

        let response = self.http.send(request).await?;
        let body = response.text().await?;
        let obtained_at = Utc::now();

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| AcquireError::Auth(format!("token response is not valid JSON: {e}")))?;

        let access_token = parsed
            .access_token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AcquireError::Auth("response is missing access_token".to_owned()))?;
        let expires_in = parsed
            .expires_in
            .and_then(|secs| u64::try_from(secs).ok())
            .ok_or_else(|| {
                AcquireError::Auth("response is missing a valid expires_in".to_owned())
            })?;

        Ok(AccessToken::new(access_token, obtained_at, expires_in))
    }
}

#[cfg(test)]
#[path = "token_test.rs"]
mod tests;
