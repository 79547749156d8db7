use crate::views::{self, UploadFailed};
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use drive_client::DriveError;
use thiserror::Error;

/// Everything that can go wrong while handling a request
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file uploaded")]
    NoFile,

    #[error("Unexpected field: only one file may be uploaded")]
    UnexpectedField,

    #[error("Invalid upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error("File too large (max: {max_bytes} bytes)")]
    TooLarge { max_bytes: u64 },

    #[error("Could not store upload: {0}")]
    Staging(#[from] std::io::Error),

    /// Folder check or file creation failed; reported identically
    #[error(transparent)]
    Drive(#[from] DriveError),

    #[error("Could not render page: {0}")]
    Render(#[from] askama::Error),
}

impl UploadError {
    /// Status Drive answered with, when the failure came from Drive itself
    pub fn drive_status(&self) -> Option<u16> {
        match self {
            UploadError::Drive(e) => e.status(),
            _ => None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            UploadError::NoFile | UploadError::UnexpectedField => StatusCode::BAD_REQUEST,
            UploadError::Multipart(e) => e.status(),
            UploadError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            UploadError::Staging(_) | UploadError::Drive(_) | UploadError::Render(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(error = ?self, drive_status = ?self.drive_status(), "upload failed");
        } else {
            tracing::warn!(%status, error = %message, "upload rejected");
        }

        match views::render(&UploadFailed { message: &message }) {
            Ok(page) => (status, page).into_response(),
            // The failure page itself could not be rendered; fall back to bare text
            Err(_) => (status, Html(format!("Upload failed: {}", status))).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(UploadError::NoFile.status(), StatusCode::BAD_REQUEST);
        assert_eq!(UploadError::UnexpectedField.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            UploadError::TooLarge { max_bytes: 1 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn drive_errors_map_to_500_with_drive_message() {
        let err = UploadError::from(DriveError::Api {
            status: 404,
            message: "File not found: FOLDER.".to_string(),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.drive_status(), Some(404));
        assert_eq!(err.to_string(), "File not found: FOLDER.");

        assert_eq!(UploadError::NoFile.drive_status(), None);
    }
}
