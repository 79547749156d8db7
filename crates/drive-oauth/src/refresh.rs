use crate::{OAuthConfig, OAuthError, OAuthToken, request_token};
use tokio::sync::Mutex;

/// Mints access tokens from a long-lived refresh token.
///
/// The current access token is cached until it is about to expire. The lock
/// is held across a refresh so concurrent callers wait for one token request
/// instead of racing their own.
pub struct RefreshTokenSource {
    config: OAuthConfig,
    refresh_token: String,
    client: reqwest::Client,
    current: Mutex<Option<OAuthToken>>,
}

impl RefreshTokenSource {
    /// Create a token source for the given client identity and refresh token
    pub fn new(config: OAuthConfig, refresh_token: String) -> Self {
        Self {
            config,
            refresh_token,
            client: reqwest::Client::new(),
            current: Mutex::new(None),
        }
    }

    /// Get valid access token, refreshing if necessary
    pub async fn access_token(&self) -> Result<String, OAuthError> {
        let mut current = self.current.lock().await;

        if let Some(token) = current.as_ref().filter(|token| !token.is_expired()) {
            return Ok(token.access_token.clone());
        }

        let token = self.refresh().await?;
        let access_token = token.access_token.clone();
        *current = Some(token);

        Ok(access_token)
    }

    /// Drop the cached access token so the next call refreshes
    pub async fn invalidate(&self) {
        *self.current.lock().await = None;
    }

    async fn refresh(&self) -> Result<OAuthToken, OAuthError> {
        tracing::debug!("refreshing OAuth access token");

        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", self.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let token = request_token(&self.client, &self.config.token_url, &params)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "failed to refresh OAuth token"))?;

        tracing::info!("OAuth access token refreshed");

        Ok(token)
    }
}

impl std::fmt::Debug for RefreshTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshTokenSource")
            .field("client_id", &self.config.client_id)
            .field("token_url", &self.config.token_url)
            .finish_non_exhaustive()
    }
}
