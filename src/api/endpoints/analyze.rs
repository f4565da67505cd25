//! Read-only quality analysis of an uploaded job.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::analysis::{analyze_source, StyleIssue};
use crate::api::error::ApiError;
use crate::api::types::ApiContext;

/// Issue details are capped per file; the count still covers them all.
const MAX_ISSUE_DETAILS: usize = 10;

#[derive(Serialize)]
pub struct FileMetrics {
    pub file: String,
    pub score: u8,
    pub total_lines: usize,
    pub code_lines: usize,
    pub comment_lines: usize,
    pub functions: Vec<String>,
    pub classes: Vec<String>,
    pub issues: usize,
    pub issue_details: Vec<StyleIssue>,
    pub avg_complexity: f64,
    pub max_complexity: u32,
    pub doc_coverage: f64,
    pub comment_ratio: f64,
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub job_id: String,
    pub created_at: String,
    pub files: Vec<FileMetrics>,
    pub total_files: usize,
    pub average_score: u8,
}

pub async fn analyze(
    State(ctx): State<ApiContext>,
    Path(job_id): Path<String>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let job = ctx.store.job(&job_id)?;
    let sources = job.source_files()?;
    if sources.is_empty() {
        return Err(ApiError::NotFound(format!(
            "Job {job_id} has no Python files"
        )));
    }

    let mut files = Vec::with_capacity(sources.len());
    let mut score_sum = 0u32;
    for relative in &sources {
        let relative = relative.to_string_lossy().replace('\\', "/");
        let code = std::fs::read_to_string(job.input_path(&relative)?)?;
        let analysis = analyze_source(&code);
        score_sum += u32::from(analysis.score);
        let issue_details = analysis
            .issues
            .iter()
            .take(MAX_ISSUE_DETAILS)
            .cloned()
            .collect();
        files.push(FileMetrics {
            file: relative,
            score: analysis.score,
            total_lines: analysis.scan.total_lines,
            code_lines: analysis.scan.code_lines,
            comment_lines: analysis.scan.comment_lines,
            functions: analysis.scan.function_names(),
            classes: analysis.scan.class_names(),
            issues: analysis.issues.len(),
            issue_details,
            avg_complexity: analysis.avg_complexity,
            max_complexity: analysis.max_complexity,
            doc_coverage: analysis.doc_coverage,
            comment_ratio: analysis.comment_ratio,
        });
    }

    let average_score = (score_sum / files.len() as u32) as u8;
    Ok(Json(AnalyzeResponse {
        job_id,
        created_at: job.created_at()?.to_rfc3339(),
        total_files: files.len(),
        average_score,
        files,
    }))
}
