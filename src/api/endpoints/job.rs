//! Job deletion.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct DeleteResponse {
    pub deleted: String,
}

/// Remove everything the job owns. Deleting an already-deleted (or never
/// created) job is a 404, so clients can tell the two apart.
pub async fn delete(
    State(ctx): State<ApiContext>,
    Path(job_id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let removed = ctx.store.delete_job(&job_id)?;
    if !removed {
        return Err(ApiError::NotFound(format!("Job not found: {job_id}")));
    }
    tracing::info!(job_id, "job deleted");
    Ok(Json(DeleteResponse { deleted: job_id }))
}
