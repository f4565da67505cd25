//! Side-by-side preview of one file's original and corrected text.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::analysis::analyze_source;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct PreviewResponse {
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_before: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_after: Option<u8>,
}

pub async fn preview(
    State(ctx): State<ApiContext>,
    Path((job_id, file)): Path<(String, String)>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let job = ctx.store.job(&job_id)?;

    let original = read_optional(&job.input_path(&file)?)?;
    let corrected = read_optional(&job.output_path(&file)?)?;
    if original.is_none() && corrected.is_none() {
        return Err(ApiError::NotFound(format!("File not found: {file}")));
    }

    let score_before = original.as_deref().map(|code| analyze_source(code).score);
    let score_after = corrected.as_deref().map(|code| analyze_source(code).score);

    Ok(Json(PreviewResponse {
        filename: file,
        original,
        corrected,
        score_before,
        score_after,
    }))
}

fn read_optional(path: &std::path::Path) -> Result<Option<String>, ApiError> {
    if path.is_file() {
        Ok(Some(std::fs::read_to_string(path)?))
    } else {
        Ok(None)
    }
}
