//! Run the processing pipeline on a job.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::pipeline::{process_job, ProcessOptions, ProcessedFile};

/// Raw query flags. A bare flag (`?docstrings`) counts as enabled; only
/// an explicit `false`/`0`/`no` disables one.
#[derive(Debug, Default, Deserialize)]
pub struct ProcessQuery {
    pub pep8: Option<String>,
    pub docstrings: Option<String>,
    pub profiling: Option<String>,
    pub dependency_graph: Option<String>,
}

fn flag(value: &Option<String>, default: bool) -> bool {
    match value.as_deref() {
        None => default,
        Some(v) => !matches!(v.to_lowercase().as_str(), "false" | "0" | "no"),
    }
}

impl ProcessQuery {
    fn options(&self) -> ProcessOptions {
        ProcessOptions {
            format: flag(&self.pep8, true),
            docstrings: flag(&self.docstrings, false),
            profiling: flag(&self.profiling, false),
            dependency_graph: flag(&self.dependency_graph, false),
        }
    }
}

#[derive(Serialize)]
pub struct ProcessResponse {
    pub job_id: String,
    pub processed: Vec<ProcessedFile>,
    pub count: usize,
}

pub async fn process(
    State(ctx): State<ApiContext>,
    Path(job_id): Path<String>,
    Query(query): Query<ProcessQuery>,
) -> Result<Json<ProcessResponse>, ApiError> {
    let job = ctx.store.job(&job_id)?;
    if job.source_files()?.is_empty() {
        return Err(ApiError::NotFound(format!(
            "Job {job_id} has no Python files"
        )));
    }

    let opts = query.options();
    tracing::info!(job_id = %job.id, ?opts, "processing job");
    let processed = process_job(&job, opts, &ctx.llm).await?;

    Ok(Json(ProcessResponse {
        job_id,
        count: processed.len(),
        processed,
    }))
}
