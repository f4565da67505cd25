//! Download of processed results: whole job as ZIP, or one file.

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::IntoResponse;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::archive::zip_dir;

/// ZIP of the whole output directory. The archive is built on first
/// request and cached until the job is reprocessed or deleted.
pub async fn download_zip(
    State(ctx): State<ApiContext>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let job = ctx.store.job(&job_id)?;
    if !job.output_dir.is_dir() {
        return Err(ApiError::NotFound(format!(
            "Job {job_id} has not been processed yet"
        )));
    }

    let zip_path = job.download_zip_path();
    if !zip_path.is_file() {
        let count = zip_dir(&job.output_dir, &zip_path)?;
        tracing::info!(job_id = %job.id, entries = count, "download archive built");
    }
    let bytes = std::fs::read(&zip_path)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/zip"),
    );
    let disposition = format!("attachment; filename=\"{job_id}_processed.zip\"");
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .map_err(|e| ApiError::Storage(e.to_string()))?,
    );
    Ok((headers, bytes))
}

/// One processed file, with a content type guessed from its name.
pub async fn download_file(
    State(ctx): State<ApiContext>,
    Path((job_id, file)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let job = ctx.store.job(&job_id)?;
    let path = job.output_path(&file)?;
    if !path.is_file() {
        return Err(ApiError::NotFound(format!("File not found: {file}")));
    }
    let bytes = std::fs::read(&path)?;

    let mime = mime_guess::from_path(&path).first_or_text_plain();
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(mime.as_ref())
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    let name = file.rsplit('/').next().unwrap_or(&file);
    let disposition = format!("attachment; filename=\"{name}\"");
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .map_err(|e| ApiError::Storage(e.to_string()))?,
    );
    Ok((headers, bytes))
}
