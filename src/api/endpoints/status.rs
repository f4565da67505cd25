//! Service status and active LLM backend.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;
use crate::config::APP_VERSION;
use crate::llm::LlmInfo;

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub llm: LlmInfo,
}

pub async fn status(State(ctx): State<ApiContext>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok",
        version: APP_VERSION,
        llm: ctx.llm.info(),
    })
}
