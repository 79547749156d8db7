//! Minimal Google Drive v3 client.
//!
//! Only the two calls the uploader needs are implemented: a metadata lookup
//! used to confirm a folder is reachable, and a multipart file creation that
//! streams the content from disk.

use async_trait::async_trait;
use drive_oauth::RefreshTokenSource;
use futures::{StreamExt, stream};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio_util::bytes::Bytes;
use tokio_util::io::ReaderStream;

mod error;

pub use error::DriveError;

/// Default Google APIs host
pub const DEFAULT_API_ADDRESS: &str = "https://www.googleapis.com";

/// Minimal folder metadata returned by the access check
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FolderMetadata {
    pub id: String,
    pub name: String,
}

/// A file that was created on Drive
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedFile {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Metadata for a file about to be created
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFile {
    pub name: String,
    pub mime_type: String,
    #[serde(rename = "parents", serialize_with = "single_parent")]
    pub parent_id: String,
}

fn single_parent<S: serde::Serializer>(parent: &str, serializer: S) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeSeq;
    let mut seq = serializer.serialize_seq(Some(1))?;
    seq.serialize_element(parent)?;
    seq.end()
}

/// The remote operations the upload flow depends on
#[async_trait]
pub trait DriveStorage: Send + Sync {
    /// Look up a folder by id, failing if it does not exist or is not accessible
    async fn verify_folder(&self, folder_id: &str) -> Result<FolderMetadata, DriveError>;

    /// Create a new file, streaming its bytes from `content`
    async fn create_file(&self, file: &NewFile, content: &Path) -> Result<CreatedFile, DriveError>;
}

pub struct DriveClient {
    http: reqwest::Client,
    api_address: String,
    tokens: RefreshTokenSource,
}

impl DriveClient {
    pub fn new(api_address: impl Into<String>, tokens: RefreshTokenSource) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_address: api_address.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    /// Turn a non-success response into a `DriveError::Api` carrying Google's message
    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response, DriveError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.tokens.invalidate().await;
        }

        let body = response.text().await?;
        Err(DriveError::from_response(status.as_u16(), &body))
    }
}

#[async_trait]
impl DriveStorage for DriveClient {
    async fn verify_folder(&self, folder_id: &str) -> Result<FolderMetadata, DriveError> {
        let access_token = self.tokens.access_token().await?;

        let url = format!(
            "{}/drive/v3/files/{}",
            self.api_address,
            urlencoding::encode(folder_id)
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(&access_token)
            .query(&[("fields", "id,name"), ("supportsAllDrives", "true")])
            .send()
            .await?;

        let folder: FolderMetadata = self.check(response).await?.json().await?;
        tracing::debug!(folder_id = %folder.id, folder_name = %folder.name, "folder is accessible");

        Ok(folder)
    }

    async fn create_file(&self, file: &NewFile, content: &Path) -> Result<CreatedFile, DriveError> {
        let access_token = self.tokens.access_token().await?;

        let source = tokio::fs::File::open(content).await?;
        let content_len = source.metadata().await?.len();

        let boundary = multipart_boundary();
        let metadata = serde_json::to_string(file)?;
        let head = format!(
            "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n\
             --{boundary}\r\nContent-Type: {}\r\n\r\n",
            file.mime_type
        );
        let tail = format!("\r\n--{boundary}--\r\n");
        let total_len = head.len() as u64 + content_len + tail.len() as u64;

        // Metadata part, then the media part read straight from disk
        let body = stream::once(async move { Ok::<_, std::io::Error>(Bytes::from(head)) })
            .chain(ReaderStream::new(source))
            .chain(stream::once(async move { Ok(Bytes::from(tail)) }));

        tracing::debug!(name = %file.name, bytes = content_len, "uploading file");

        let response = self
            .http
            .post(format!("{}/upload/drive/v3/files", self.api_address))
            .bearer_auth(&access_token)
            .query(&[
                ("uploadType", "multipart"),
                ("supportsAllDrives", "true"),
                ("fields", "id,name"),
            ])
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .header(reqwest::header::CONTENT_LENGTH, total_len)
            .body(reqwest::Body::wrap_stream(body))
            .send()
            .await?;

        let created: CreatedFile = self.check(response).await?.json().await?;
        tracing::info!(file_id = %created.id, name = %file.name, "file created on Drive");

        Ok(created)
    }
}

fn multipart_boundary() -> String {
    use rand::Rng;
    use rand::distributions::Alphanumeric;

    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    format!("drive_uploader_{suffix}")
}
