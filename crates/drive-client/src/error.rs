use drive_oauth::OAuthError;
use serde::Deserialize;
use thiserror::Error;

/// Errors returned by Drive operations
#[derive(Debug, Error)]
pub enum DriveError {
    #[error("authorization failed: {0}")]
    Auth(#[from] OAuthError),

    #[error("Drive request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to read upload content: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode file metadata: {0}")]
    Encode(#[from] serde_json::Error),

    /// Drive answered with a non-success status
    #[error("{message}")]
    Api { status: u16, message: String },
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl DriveError {
    /// Build an API error from a response body, keeping Google's message when present
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        let message = match serde_json::from_str::<ApiErrorBody>(body) {
            Ok(parsed) => parsed.error.message,
            Err(_) if body.trim().is_empty() => format!("Drive returned status {status}"),
            Err(_) => body.trim().to_string(),
        };
        DriveError::Api { status, message }
    }

    /// HTTP status Drive answered with, if the error came from Drive itself
    pub fn status(&self) -> Option<u16> {
        match self {
            DriveError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
