use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::Json;
use std::path::Path;

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::models::requests::UploadResponse;

/// Base name of an uploaded file, or `None` if nothing usable is left.
pub fn upload_file_name(raw: &str) -> Option<String> {
    // Browsers on Windows may send full paths with backslashes.
    let last = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    Path::new(last)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty() && *n != "." && *n != "..")
        .map(str::to_string)
}

pub fn is_pdf(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// POST /api/upload: Store one or more PDFs from the multipart field `files`.
///
/// Every file is checked before anything is written, so a rejected request
/// leaves the upload directory untouched.
pub async fn upload_pdfs(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut accepted: Vec<(String, Bytes)> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("files") {
            continue;
        }

        let raw_name = field.file_name().unwrap_or_default().to_string();
        let file_name = upload_file_name(&raw_name)
            .ok_or_else(|| ApiError::validation("Uploaded file has no name"))?;
        if !is_pdf(&file_name) {
            return Err(ApiError::validation(format!("File {raw_name} is not a PDF")));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(format!("Failed to read {file_name}: {e}")))?;
        accepted.push((file_name, data));
    }

    if accepted.is_empty() {
        return Err(ApiError::validation("No files uploaded"));
    }

    tokio::fs::create_dir_all(state.upload_dir.as_path())
        .await
        .map_err(|e| ApiError::Persistence(format!("Failed to create upload directory: {e}")))?;

    let mut saved = Vec::with_capacity(accepted.len());
    for (file_name, data) in accepted {
        let path = state.upload_dir.join(&file_name);
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| ApiError::Persistence(format!("Failed to save {file_name}: {e}")))?;

        tracing::info!(file = %file_name, bytes = data.len(), "PDF uploaded");
        saved.push(path.display().to_string());
    }

    Ok(Json(UploadResponse {
        message: format!("Successfully uploaded {} files", saved.len()),
        files: saved,
    }))
}
