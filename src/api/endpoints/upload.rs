//! Job creation from a multipart upload.
//!
//! Accepts any mix of `.py` files and `.zip` archives. Archives are
//! expanded into the job's input directory and then discarded; anything
//! else is rejected before the job is kept.

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::archive::extract_zip;

#[derive(Serialize)]
pub struct UploadResponse {
    pub job_id: String,
    pub files: Vec<String>,
    pub count: usize,
}

pub async fn upload(
    State(ctx): State<ApiContext>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let job = ctx.store.create_job()?;

    let result = store_parts(&job, &mut multipart).await;
    let files = match result {
        Ok(files) if !files.is_empty() => files,
        Ok(_) => {
            ctx.store.delete_job(&job.id)?;
            return Err(ApiError::InvalidInput(
                "Upload contains no Python files".to_string(),
            ));
        }
        Err(err) => {
            // Reject the whole upload, leave no half-created job behind.
            ctx.store.delete_job(&job.id)?;
            return Err(err);
        }
    };

    tracing::info!(job_id = %job.id, count = files.len(), "job created");
    Ok(Json(UploadResponse {
        job_id: job.id,
        count: files.len(),
        files,
    }))
}

async fn store_parts(
    job: &crate::store::Job,
    multipart: &mut Multipart,
) -> Result<Vec<String>, ApiError> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidInput(format!("Malformed multipart body: {e}")))?
    {
        let Some(filename) = field.file_name().map(String::from) else {
            continue;
        };
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidInput(format!("Failed to read upload: {e}")))?;

        let lower = filename.to_lowercase();
        if lower.ends_with(".py") {
            let path = job.input_path(&filename)?;
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, &data)?;
            files.push(filename);
        } else if lower.ends_with(".zip") {
            let extracted = extract_zip(&data, &job.input_dir)?;
            if extracted.is_empty() {
                return Err(ApiError::InvalidInput(format!(
                    "Archive {filename} contains no Python files"
                )));
            }
            files.extend(extracted);
        } else {
            return Err(ApiError::InvalidInput(format!(
                "Unsupported file type: {filename} (only .py and .zip are accepted)"
            )));
        }
    }

    files.sort();
    Ok(files)
}
