use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all PVL endpoints.
pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route("/v1/chain", get(handler::chain_handler))
        .route("/v1/chain/validate", get(handler::validate_handler))
        .route("/v1/chain/audit", get(handler::audit_handler))
        .route("/v1/records/:position", get(handler::record_handler))
        .route(
            "/v1/records/by-digest/:digest",
            get(handler::record_by_digest_handler),
        )
        .route("/v1/search", get(handler::search_handler))
        .route("/v1/files", post(handler::register_file_handler))
        .route("/v1/certificates", post(handler::issue_certificate_handler))
        .route("/v1/verify", post(handler::verify_handler))
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
