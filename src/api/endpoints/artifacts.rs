//! Pre-rendered HTML artifacts: reports and dependency graphs.
//!
//! These pages are written by the pipeline at process time; here they are
//! only read back, so an artifact that was never generated is a 404.

use axum::extract::{Path, State};
use axum::response::Html;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::pipeline::artifact_name;
use crate::store::Job;

pub async fn global_report(
    State(ctx): State<ApiContext>,
    Path(job_id): Path<String>,
) -> Result<Html<String>, ApiError> {
    let job = ctx.store.job(&job_id)?;
    serve_artifact(&job, "_global_report.html", "Global report")
}

pub async fn file_report(
    State(ctx): State<ApiContext>,
    Path((job_id, file)): Path<(String, String)>,
) -> Result<Html<String>, ApiError> {
    let job = ctx.store.job(&job_id)?;
    serve_artifact(&job, &artifact_name(&file, "html"), "Report")
}

pub async fn global_graph(
    State(ctx): State<ApiContext>,
    Path(job_id): Path<String>,
) -> Result<Html<String>, ApiError> {
    let job = ctx.store.job(&job_id)?;
    serve_artifact(&job, "_dependency_graph.html", "Dependency graph")
}

pub async fn file_graph(
    State(ctx): State<ApiContext>,
    Path((job_id, file)): Path<(String, String)>,
) -> Result<Html<String>, ApiError> {
    let job = ctx.store.job(&job_id)?;
    serve_artifact(&job, &artifact_name(&file, "graph.html"), "Dependency graph")
}

pub async fn file_profile(
    State(ctx): State<ApiContext>,
    Path((job_id, file)): Path<(String, String)>,
) -> Result<Html<String>, ApiError> {
    let job = ctx.store.job(&job_id)?;
    serve_artifact(&job, &artifact_name(&file, "profile.html"), "Profiling report")
}

fn serve_artifact(job: &Job, relative: &str, kind: &str) -> Result<Html<String>, ApiError> {
    let path = job.output_path(relative)?;
    if !path.is_file() {
        return Err(ApiError::NotFound(format!(
            "{kind} not generated yet for job {}",
            job.id
        )));
    }
    Ok(Html(std::fs::read_to_string(path)?))
}
