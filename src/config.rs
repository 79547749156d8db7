use clap::Parser;
use drive_oauth::{GOOGLE_TOKEN_URL, OAuthConfig};
use std::path::PathBuf;

/// Largest file accepted by the upload route
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Drive Uploader - Serves an upload form and forwards files to a Google Drive folder
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Port the HTTP server listens on
    #[arg(long, env = "PORT", default_value = "3031")]
    pub port: u16,

    /// OAuth client ID
    #[arg(long, env = "CLIENT_ID")]
    pub client_id: String,

    /// OAuth client secret
    #[arg(long, env = "CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: String,

    /// Refresh token obtained with drive-oauth-helper
    #[arg(long, env = "REFRESH_TOKEN", hide_env_values = true)]
    pub refresh_token: String,

    /// Drive folder every upload is placed in
    #[arg(long, env = "FOLDER_ID")]
    pub folder_id: String,

    /// Directory where uploads are staged while they are forwarded
    #[arg(long, env = "UPLOAD_DIR", default_value = "uploads")]
    pub upload_dir: PathBuf,

    /// Google APIs address (override for testing)
    #[arg(long, env = "DRIVE_API_ADDRESS", default_value = drive_client::DEFAULT_API_ADDRESS)]
    pub drive_api_address: String,

    /// OAuth token endpoint (override for testing)
    #[arg(long, env = "OAUTH_TOKEN_URL", default_value = GOOGLE_TOKEN_URL)]
    pub token_url: String,
}

/// Per-request settings shared read-only by the handlers
#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub folder_id: String,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: u64,
}

impl Config {
    pub fn oauth(&self) -> OAuthConfig {
        OAuthConfig::new(self.client_id.clone(), self.client_secret.clone())
            .with_token_url(self.token_url.clone())
    }

    pub fn upload_settings(&self) -> UploadSettings {
        UploadSettings {
            folder_id: self.folder_id.clone(),
            upload_dir: self.upload_dir.clone(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }
}
