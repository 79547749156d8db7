use serde::Deserialize;
use std::time::{Duration, Instant};

mod error;
mod refresh;

pub use error::OAuthError;
pub use refresh::RefreshTokenSource;

/// Google's OAuth 2.0 authorization endpoint
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Google's OAuth 2.0 token endpoint
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Full read/write access to the user's Drive, including shared drives
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

/// Loopback redirect registered for installed-app clients
pub const LOOPBACK_REDIRECT_URI: &str = "http://localhost";

/// Tokens are treated as expired this long before Google says they are.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// OAuth 2.0 token information
#[derive(Debug, Clone)]
pub struct OAuthToken {
    /// Access token for API requests
    pub access_token: String,
    /// Refresh token for getting new access tokens. Google only issues one
    /// on a consent exchange, never on a refresh.
    pub refresh_token: Option<String>,
    /// Token type (usually "Bearer")
    pub token_type: String,
    /// When the access token stops being usable
    pub expires_at: Instant,
}

impl OAuthToken {
    /// Check if the token is expired or will expire soon (within 60 seconds)
    pub fn is_expired(&self) -> bool {
        Instant::now() + EXPIRY_MARGIN >= self.expires_at
    }
}

/// OAuth configuration
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Redirect URI sent with both the consent URL and the code exchange
    pub redirect_uri: String,
    /// OAuth scope(s)
    pub scope: String,
    /// Consent page base URL
    pub auth_url: String,
    /// Token endpoint URL
    pub token_url: String,
}

impl OAuthConfig {
    /// Create new OAuth configuration with Google Drive defaults
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri: LOOPBACK_REDIRECT_URI.to_string(),
            scope: DRIVE_SCOPE.to_string(),
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
        }
    }

    /// Point the token exchange at a different endpoint
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    /// Request a different scope than full Drive access
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }
}

/// Successful token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    token_type: Option<String>,
    expires_in: Option<u64>,
}

/// Error body returned by the token endpoint
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    error_description: Option<String>,
}

impl TokenResponse {
    fn into_token(self) -> Result<OAuthToken, OAuthError> {
        let access_token = self
            .access_token
            .ok_or(OAuthError::MissingField("access_token"))?;
        let expires_in = self
            .expires_in
            .ok_or(OAuthError::MissingField("expires_in"))?;

        Ok(OAuthToken {
            access_token,
            refresh_token: self.refresh_token,
            token_type: self.token_type.unwrap_or_else(|| "Bearer".to_string()),
            expires_at: Instant::now() + Duration::from_secs(expires_in),
        })
    }
}

/// POST a form to the token endpoint and decode the token it returns.
async fn request_token(
    client: &reqwest::Client,
    token_url: &str,
    params: &[(&str, &str)],
) -> Result<OAuthToken, OAuthError> {
    let response = client.post(token_url).form(params).send().await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await?;
        let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
            Ok(err) => match err.error_description {
                Some(description) => format!("{}: {}", err.error, description),
                None => err.error,
            },
            Err(_) => body,
        };
        return Err(OAuthError::Rejected { status, message });
    }

    let token_response: TokenResponse = response.json().await?;
    token_response.into_token()
}

/// Generate PKCE verifier and challenge
pub fn generate_pkce() -> (String, String) {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use rand::Rng;
    use rand::distributions::Alphanumeric;
    use sha2::{Digest, Sha256};

    // Generate random verifier (43-128 characters) using cryptographically secure RNG
    let verifier: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();

    // Generate challenge: base64url(SHA256(verifier))
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    let hash = hasher.finalize();
    let challenge = URL_SAFE_NO_PAD.encode(hash);

    (verifier, challenge)
}

/// Generate authorization URL.
///
/// Requests offline access with forced re-consent so Google always issues a
/// fresh refresh token. Returns the URL and the PKCE verifier that must be
/// passed to [`exchange_code`].
pub fn generate_auth_url(config: &OAuthConfig) -> (String, String) {
    let (verifier, challenge) = generate_pkce();

    let auth_url = format!(
        "{}?\
        client_id={}&\
        redirect_uri={}&\
        response_type=code&\
        scope={}&\
        code_challenge={}&\
        code_challenge_method=S256&\
        access_type=offline&\
        prompt=consent",
        config.auth_url,
        urlencoding::encode(&config.client_id),
        urlencoding::encode(&config.redirect_uri),
        urlencoding::encode(&config.scope),
        urlencoding::encode(&challenge),
    );

    (auth_url, verifier)
}

/// Exchange authorization code for tokens
pub async fn exchange_code(
    config: &OAuthConfig,
    code: &str,
    verifier: &str,
) -> Result<OAuthToken, OAuthError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(OAuthError::EmptyCode);
    }

    tracing::debug!(token_url = %config.token_url, "exchanging authorization code");

    let client = reqwest::Client::new();
    let params = [
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
        ("code", code),
        ("code_verifier", verifier),
        ("grant_type", "authorization_code"),
        ("redirect_uri", config.redirect_uri.as_str()),
    ];

    let token = request_token(&client, &config.token_url, &params).await?;

    tracing::debug!("obtained OAuth tokens");

    Ok(token)
}

/// Exchange authorization code and keep only the long-lived refresh token
pub async fn obtain_refresh_token(
    config: &OAuthConfig,
    code: &str,
    verifier: &str,
) -> Result<String, OAuthError> {
    exchange_code(config, code, verifier)
        .await?
        .refresh_token
        .filter(|token| !token.is_empty())
        .ok_or(OAuthError::NoRefreshToken)
}
