//! pypolish: a local web service that standardizes uploaded Python code.
//!
//! Upload `.py` files or a ZIP, get style analysis with a quality score,
//! then run a processing pipeline (PEP8-style correction, LLM-generated
//! docstrings, execution profiling, dependency graphs) and download the
//! corrected code plus HTML reports as a ZIP.

pub mod analysis;
pub mod api;
pub mod archive;
pub mod config;
pub mod docstrings;
pub mod format;
pub mod graph;
pub mod llm;
pub mod pipeline;
pub mod profiling;
pub mod report;
pub mod store;

use tracing_subscriber::EnvFilter;

use crate::api::server::start_server;
use crate::api::types::ApiContext;
use crate::llm::LlmBackend;
use crate::store::JobStore;

/// Initialize logging, open the job store, pick the LLM backend, and
/// serve the API until the process is interrupted.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    let data_dir = config::data_dir();
    let store = JobStore::open(&data_dir)?;
    tracing::info!(data_dir = %data_dir.display(), "job store ready");

    let llm_config = config::LlmConfig::from_env();
    let llm = LlmBackend::from_config(&llm_config);
    tracing::info!(
        backend = llm.info().backend,
        model = llm.model(),
        "LLM backend selected"
    );

    let ctx = ApiContext::new(store, llm);
    let mut server = start_server(ctx, config::bind_addr()).await?;
    tracing::info!(addr = %server.addr, "listening");

    tokio::signal::ctrl_c().await?;
    tracing::info!("interrupt received, shutting down");
    server.shutdown();
    Ok(())
}
