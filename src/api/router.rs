//! HTTP route table.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`. Handlers get `ApiContext` via
//! `State`; the body limit and CORS sit as outer layers.
//!
//! NOTE: path params use `:param` / `*file` syntax (matchit 0.7 / axum 0.7).

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::config::MAX_UPLOAD_BYTES;

pub fn api_router(ctx: ApiContext) -> Router {
    let routes = Router::new()
        .route("/status", get(endpoints::status::status))
        .route("/upload", post(endpoints::upload::upload))
        .route("/analyze/:job_id", get(endpoints::analyze::analyze))
        .route("/process/:job_id", post(endpoints::process::process))
        .route("/preview/:job_id/*file", get(endpoints::preview::preview))
        .route("/report/:job_id", get(endpoints::artifacts::global_report))
        .route(
            "/report/:job_id/*file",
            get(endpoints::artifacts::file_report),
        )
        .route("/graph/:job_id", get(endpoints::artifacts::global_graph))
        .route("/graph/:job_id/*file", get(endpoints::artifacts::file_graph))
        .route(
            "/profile/:job_id/*file",
            get(endpoints::artifacts::file_profile),
        )
        .route("/download/:job_id", get(endpoints::download::download_zip))
        .route(
            "/download/:job_id/*file",
            get(endpoints::download::download_file),
        )
        .route("/job/:job_id", delete(endpoints::job::delete))
        .with_state(ctx);

    Router::new()
        .nest("/api", routes)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
}
