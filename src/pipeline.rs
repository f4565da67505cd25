//! Per-job processing pipeline.
//!
//! Runs every source file of a job through the enabled steps and writes
//! the corrected sources plus the HTML artifacts into the job's output
//! directory. One file failing never aborts the batch; the failure is
//! recorded on that file's result and processing moves on.

use serde::Serialize;

use crate::analysis::analyze_source;
use crate::docstrings::generate_docstrings;
use crate::format::correct_source;
use crate::graph::{file_graph, project_graph, render_graph_html};
use crate::llm::LlmBackend;
use crate::profiling::{profile_file, render_profile_html};
use crate::report::{build_file_report, render_file_report, render_global_report, FileReport};
use crate::store::{Job, StoreError};

/// Which steps to run. Formatting defaults on, the rest are opt-in.
#[derive(Debug, Clone, Copy)]
pub struct ProcessOptions {
    pub format: bool,
    pub docstrings: bool,
    pub profiling: bool,
    pub dependency_graph: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            format: true,
            docstrings: false,
            profiling: false,
            dependency_graph: false,
        }
    }
}

/// Outcome for one file, serialized straight into the process response.
#[derive(Debug, Serialize)]
pub struct ProcessedFile {
    pub file: String,
    pub status: &'static str,
    pub score_before: u8,
    pub score_after: u8,
    pub has_docstrings: bool,
    pub profiled: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessedFile {
    fn failed(file: String, error: String) -> Self {
        Self {
            file,
            status: "error",
            score_before: 0,
            score_after: 0,
            has_docstrings: false,
            profiled: false,
            warnings: Vec::new(),
            error: Some(error),
        }
    }
}

/// Process every source file of `job` with the given options.
///
/// The output directory is rebuilt from scratch, so reprocessing a job
/// replaces earlier results, and any cached download archive is dropped.
pub async fn process_job(
    job: &Job,
    opts: ProcessOptions,
    llm: &LlmBackend,
) -> Result<Vec<ProcessedFile>, StoreError> {
    if job.output_dir.exists() {
        std::fs::remove_dir_all(&job.output_dir)?;
    }
    std::fs::create_dir_all(&job.output_dir)?;
    let stale_zip = job.download_zip_path();
    if stale_zip.exists() {
        std::fs::remove_file(&stale_zip)?;
    }

    let sources = job.source_files()?;
    let mut results = Vec::with_capacity(sources.len());
    let mut reports: Vec<FileReport> = Vec::new();
    let mut corrected_sources: Vec<(String, String)> = Vec::new();

    for relative in sources {
        let relative = relative.to_string_lossy().replace('\\', "/");
        match process_one(job, &relative, opts, llm).await {
            Ok((processed, report, corrected)) => {
                results.push(processed);
                reports.push(report);
                corrected_sources.push((relative, corrected));
            }
            Err(err) => {
                tracing::error!(file = %relative, error = %err, "file processing failed");
                results.push(ProcessedFile::failed(relative, err.to_string()));
            }
        }
    }

    write_artifact(
        job,
        "_global_report.html",
        &render_global_report(&job.id, &reports),
    )?;
    if opts.dependency_graph {
        let graph = project_graph(&corrected_sources);
        write_artifact(
            job,
            "_dependency_graph.html",
            &render_graph_html(&graph, &job.id),
        )?;
    }

    tracing::info!(
        job_id = %job.id,
        files = results.len(),
        errors = results.iter().filter(|r| r.error.is_some()).count(),
        "job processed"
    );
    Ok(results)
}

async fn process_one(
    job: &Job,
    relative: &str,
    opts: ProcessOptions,
    llm: &LlmBackend,
) -> Result<(ProcessedFile, FileReport, String), StoreError> {
    let input_path = job.input_path(relative)?;
    let original = std::fs::read_to_string(&input_path)?;
    let before = analyze_source(&original);

    let mut warnings = Vec::new();
    let mut corrected = if opts.format {
        correct_source(&original)
    } else {
        original.clone()
    };

    let mut has_docstrings = false;
    if opts.docstrings {
        match generate_docstrings(llm, &corrected).await {
            Ok(documented) => {
                // Output cleaning trims, so compare and restore modulo the
                // final newline.
                has_docstrings = documented.trim_end() != corrected.trim_end();
                corrected = documented;
                if !corrected.is_empty() && !corrected.ends_with('\n') {
                    corrected.push('\n');
                }
            }
            Err(err) => {
                tracing::warn!(file = %relative, error = %err, "docstring generation failed");
                warnings.push(format!("docstrings skipped: {err}"));
            }
        }
    }

    let output_path = job.output_path(relative)?;
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&output_path, &corrected)?;

    let after = analyze_source(&corrected);
    let report = build_file_report(relative, &original, &corrected, before, after, has_docstrings);
    write_artifact(job, &artifact_name(relative, "html"), &render_file_report(&report))?;

    let mut profiled = false;
    if opts.profiling {
        match profile_file(&input_path).await {
            Ok(stats) => {
                profiled = stats.success;
                if let Some(err) = &stats.error {
                    warnings.push(format!("profiling ran with errors: {err}"));
                }
                write_artifact(
                    job,
                    &artifact_name(relative, "profile.html"),
                    &render_profile_html(&stats, relative),
                )?;
            }
            Err(err) => {
                tracing::warn!(file = %relative, error = %err, "profiling failed");
                warnings.push(format!("profiling skipped: {err}"));
            }
        }
    }

    if opts.dependency_graph {
        let graph = file_graph(&corrected);
        write_artifact(
            job,
            &artifact_name(relative, "graph.html"),
            &render_graph_html(&graph, relative),
        )?;
    }

    let processed = ProcessedFile {
        file: relative.to_string(),
        status: "ok",
        score_before: report.score_before,
        score_after: report.score_after,
        has_docstrings,
        profiled,
        warnings,
        error: None,
    };
    Ok((processed, report, corrected))
}

/// Artifact path next to the corrected file: `pkg/mod.py` with suffix
/// `html` becomes `pkg/mod.html`.
pub fn artifact_name(relative: &str, suffix: &str) -> String {
    let stem = relative.strip_suffix(".py").unwrap_or(relative);
    format!("{stem}.{suffix}")
}

fn write_artifact(job: &Job, relative: &str, content: &str) -> Result<(), StoreError> {
    let path = job.output_path(relative)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}
