use crate::AppState;
use crate::error::UploadError;
use crate::staging::{self, StagedFile};
use crate::views::{self, UploadForm, UploadSucceeded};
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::response::Html;
use drive_client::{CreatedFile, DriveError, DriveStorage, NewFile};

/// Multipart field the form uploads the file under
pub const FILE_FIELD: &str = "file";

pub async fn upload_form(State(state): State<AppState>) -> Result<Html<String>, UploadError> {
    views::render(&UploadForm {
        max_upload_mib: state.settings.max_upload_bytes / (1024 * 1024),
    })
}

/// Stage the posted file, verify the folder, upload, then remove the staged copy.
#[tracing::instrument(skip_all)]
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Html<String>, UploadError> {
    let multipart = multipart.map_err(|rejection| {
        tracing::debug!(%rejection, "upload request is not multipart");
        UploadError::NoFile
    })?;

    let staged = receive_file(&state, multipart)
        .await?
        .ok_or(UploadError::NoFile)?;

    tracing::info!(
        name = %staged.original_name(),
        mime_type = %staged.mime_type(),
        bytes = staged.size(),
        "received upload"
    );

    let outcome = forward(state.storage.as_ref(), &state.settings.folder_id, &staged).await;
    let file_name = staged.original_name().to_string();
    staged.remove().await;

    let created = outcome?;
    tracing::info!(
        file_id = %created.id,
        drive_name = created.name.as_deref().unwrap_or(&file_name),
        "upload forwarded"
    );
    views::render(&UploadSucceeded {
        file_name: &file_name,
        file_id: &created.id,
    })
}

/// Read the multipart body, staging the single `file` part if one was sent.
async fn receive_file(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<Option<StagedFile>, UploadError> {
    let mut staged: Option<StagedFile> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        // Browsers send an empty part with no filename when nothing was chosen
        let Some(file_name) = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
        else {
            continue;
        };

        if staged.is_some() {
            return Err(UploadError::UnexpectedField);
        }

        let mime_type = field
            .content_type()
            .map(str::to_owned)
            .or_else(|| mime_guess::from_path(&file_name).first().map(|m| m.to_string()))
            .unwrap_or_else(|| "application/octet-stream".to_string());

        staged = Some(
            staging::stage(
                &state.settings.upload_dir,
                file_name,
                mime_type,
                state.settings.max_upload_bytes,
                field,
            )
            .await?,
        );
    }

    Ok(staged)
}

/// Confirm the destination folder is reachable, then create the file in it.
async fn forward(
    storage: &dyn DriveStorage,
    folder_id: &str,
    staged: &StagedFile,
) -> Result<CreatedFile, DriveError> {
    let folder = storage.verify_folder(folder_id).await?;
    tracing::debug!(folder_id = %folder.id, folder_name = %folder.name, "destination folder verified");

    let file = NewFile {
        name: staged.original_name().to_string(),
        mime_type: staged.mime_type().to_string(),
        parent_id: folder_id.to_string(),
    };

    storage.create_file(&file, staged.path()).await
}
