//! Temporary on-disk copies of uploaded files.
//!
//! A [`StagedFile`] owns its path for the duration of one request. Calling
//! [`StagedFile::remove`] deletes it on the normal path; dropping the guard
//! without doing so deletes it synchronously, which covers early returns,
//! staging errors and unwinding.

use crate::error::UploadError;
use axum::body::Bytes;
use futures::{Stream, StreamExt};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

#[derive(Debug)]
pub struct StagedFile {
    original_name: String,
    mime_type: String,
    size: u64,
    path: PathBuf,
    removed: bool,
}

impl StagedFile {
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the staged bytes. Failures are logged, never returned.
    ///
    /// If this future is dropped before the delete resolves, `Drop` still
    /// removes the file.
    pub async fn remove(mut self) {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => tracing::debug!(path = %self.path.display(), "removed staged upload"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to remove staged upload")
            }
        }
        self.removed = true;
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "removed staged upload on drop"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to remove staged upload")
            }
        }
    }
}

/// Write `chunks` to a new randomly named file under `dir`.
///
/// Fails with [`UploadError::TooLarge`] as soon as more than `max_bytes`
/// arrive; whatever was written is removed before returning.
pub async fn stage<S, E>(
    dir: &Path,
    original_name: String,
    mime_type: String,
    max_bytes: u64,
    chunks: S,
) -> Result<StagedFile, UploadError>
where
    S: Stream<Item = Result<Bytes, E>>,
    UploadError: From<E>,
{
    tokio::fs::create_dir_all(dir).await?;

    // Guard first so the file handle below is dropped before the guard
    let mut staged = StagedFile {
        original_name,
        mime_type,
        size: 0,
        path: dir.join(staged_name()),
        removed: false,
    };
    let mut file = tokio::fs::File::create(&staged.path).await?;

    let mut chunks = std::pin::pin!(chunks);
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        staged.size += chunk.len() as u64;
        if staged.size > max_bytes {
            return Err(UploadError::TooLarge { max_bytes });
        }
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    tracing::debug!(
        name = %staged.original_name,
        bytes = staged.size,
        path = %staged.path.display(),
        "staged upload"
    );

    Ok(staged)
}

fn staged_name() -> String {
    use rand::Rng;
    use rand::distributions::Alphanumeric;

    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn chunks(parts: &[&'static [u8]]) -> impl Stream<Item = Result<Bytes, std::io::Error>> + use<> {
        stream::iter(
            parts
                .iter()
                .copied()
                .map(|p| Ok(Bytes::from_static(p)))
                .collect::<Vec<_>>(),
        )
    }

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn stages_all_chunks_under_a_fresh_name() {
        let dir = tempfile::tempdir().unwrap();

        let staged = stage(
            dir.path(),
            "a.txt".to_string(),
            "text/plain".to_string(),
            1024,
            chunks(&[b"hello ", b"world"]),
        )
        .await
        .unwrap();

        assert_eq!(staged.original_name(), "a.txt");
        assert_eq!(staged.mime_type(), "text/plain");
        assert_eq!(staged.size(), 11);
        assert_ne!(staged.path().file_name().unwrap(), "a.txt");
        assert_eq!(std::fs::read(staged.path()).unwrap(), b"hello world");

        staged.remove().await;
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected_and_removed() {
        let dir = tempfile::tempdir().unwrap();

        let err = stage(
            dir.path(),
            "big.bin".to_string(),
            "application/octet-stream".to_string(),
            8,
            chunks(&[b"12345", b"67890"]),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, UploadError::TooLarge { max_bytes: 8 }));
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn stream_error_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let broken = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::new(ErrorKind::ConnectionReset, "client went away")),
        ]);

        let err = stage(dir.path(), "a".to_string(), "text/plain".to_string(), 1024, broken)
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Staging(_)));
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn dropping_the_guard_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let staged = stage(dir.path(), "a".to_string(), "text/plain".to_string(), 1024, chunks(&[b"x"]))
            .await
            .unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());

        drop(staged);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn removing_an_already_deleted_file_is_quiet() {
        let dir = tempfile::tempdir().unwrap();
        let staged = stage(dir.path(), "a".to_string(), "text/plain".to_string(), 1024, chunks(&[b"x"]))
            .await
            .unwrap();

        std::fs::remove_file(staged.path()).unwrap();
        staged.remove().await;
    }

    #[tokio::test]
    async fn cancelled_remove_still_deletes_the_file() {
        use futures::FutureExt;

        let dir = tempfile::tempdir().unwrap();
        let staged = stage(dir.path(), "a".to_string(), "text/plain".to_string(), 1024, chunks(&[b"x"]))
            .await
            .unwrap();
        let path = staged.path().to_path_buf();

        // Poll once and drop, as when the request future is abandoned mid-delete
        let _ = staged.remove().now_or_never();

        assert!(!path.exists());
    }

    #[tokio::test]
    async fn creates_missing_upload_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("uploads");

        let staged = stage(&nested, "a".to_string(), "text/plain".to_string(), 1024, chunks(&[b"x"]))
            .await
            .unwrap();

        assert!(staged.path().starts_with(&nested));
    }
}
