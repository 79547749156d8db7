//! Drive Uploader
//!
//! Serves a browser upload form and forwards each posted file to a single
//! Google Drive folder.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use drive_client::DriveStorage;
use std::sync::Arc;

pub mod config;
mod error;
pub mod handlers;
pub mod staging;
mod views;

pub use config::{Config, MAX_UPLOAD_BYTES, UploadSettings};
pub use error::UploadError;

/// Room for multipart boundaries and part headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// State shared by every request
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<UploadSettings>,
    pub storage: Arc<dyn DriveStorage>,
}

impl AppState {
    pub fn new(settings: UploadSettings, storage: Arc<dyn DriveStorage>) -> Self {
        Self {
            settings: Arc::new(settings),
            storage,
        }
    }
}

/// Build the HTTP router serving the form and the upload endpoint.
pub fn build_router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.settings.max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/", get(handlers::upload_form))
        .route("/upload", post(handlers::upload))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
