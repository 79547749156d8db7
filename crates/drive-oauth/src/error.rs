use thiserror::Error;

/// Errors raised while talking to the OAuth token endpoint
#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("token request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("token endpoint rejected the request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("token response is missing `{0}`")]
    MissingField(&'static str),

    #[error("authorization code is empty")]
    EmptyCode,

    #[error("no refresh token was issued; revoke the app's access and consent again")]
    NoRefreshToken,
}
