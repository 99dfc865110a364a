//! Token-lease cache for the meeting provider.

use classline_domain::{ClasslineError, ProviderConfig, Result, TokenLease};
use reqwest::Method;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::types::TokenResponse;
use crate::errors::InfraError;
use crate::http::HttpClient;

/// Process-wide cache for the provider bearer token.
///
/// One lease is shared across all API calls and replaced when it nears
/// expiry or when a call comes back 401. Leases live in memory only.
pub struct TokenCache {
    http: HttpClient,
    config: ProviderConfig,
    lease: RwLock<Option<TokenLease>>,
}

impl TokenCache {
    pub fn new(http: HttpClient, config: ProviderConfig) -> Self {
        Self { http, config, lease: RwLock::new(None) }
    }

    /// Return a valid access token, fetching a fresh lease if the cached
    /// one is missing or inside the refresh margin.
    #[instrument(skip(self))]
    pub async fn get(&self) -> Result<String> {
        let margin = self.config.token_refresh_margin_secs;

        if let Some(lease) = self.lease.read().await.as_ref() {
            if !lease.is_expired(margin) {
                return Ok(lease.access_token.clone());
            }
        }

        let mut guard = self.lease.write().await;
        // Another task may have refreshed while we waited for the write lock.
        if let Some(lease) = guard.as_ref() {
            if !lease.is_expired(margin) {
                return Ok(lease.access_token.clone());
            }
        }

        let lease = self.request_token().await?;
        let token = lease.access_token.clone();
        *guard = Some(lease);
        Ok(token)
    }

    /// Drop the cached lease so the next [`get`](TokenCache::get) fetches
    /// a fresh one.
    pub async fn invalidate(&self) {
        *self.lease.write().await = None;
    }

    async fn request_token(&self) -> Result<TokenLease> {
        let url = format!("{}/oauth/token", self.config.auth_base_url.trim_end_matches('/'));
        debug!(%url, account_id = %self.config.account_id, "requesting provider token");

        let builder = self
            .http
            .request(Method::POST, &url)
            .query(&[
                ("grant_type", "account_credentials"),
                ("account_id", self.config.account_id.as_str()),
            ])
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret));

        let response = self.http.send(builder).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClasslineError::Auth(format!(
                "token endpoint returned {status} for account {}",
                self.config.account_id
            )));
        }

        let body: TokenResponse =
            response.json().await.map_err(|err| ClasslineError::from(InfraError::from(err)))?;
        Ok(TokenLease::new(body.access_token, body.expires_in))
    }
}
