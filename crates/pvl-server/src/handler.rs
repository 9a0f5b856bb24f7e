use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use bytes::Bytes;
use pvl_ledger::{LedgerReader, ValidationReport};
use pvl_provenance::{Attestation, CertificateRequest, Verification};
use pvl_types::{Digest, Position, RecordView};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

/// Health check handler.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// Info handler.
pub async fn info_handler(State(state): State<AppState>) -> ServerResult<Json<Value>> {
    let (count, head) = state
        .blocking(|s| Ok((s.ledger.len()?, s.ledger.head()?)))
        .await?;
    Ok(Json(json!({
        "name": "pvl-server",
        "version": env!("CARGO_PKG_VERSION"),
        "record_count": count,
        "head": head.map(|r| json!({ "position": r.position, "digest": r.digest })),
    })))
}

pub async fn chain_handler(State(state): State<AppState>) -> ServerResult<Json<Vec<RecordView>>> {
    let chain = state.blocking(|s| Ok(s.ledger.chain()?)).await?;
    Ok(Json(chain))
}

pub async fn validate_handler(State(state): State<AppState>) -> ServerResult<Json<Value>> {
    let valid = state.blocking(|s| Ok(s.ledger.validate_chain()?)).await?;
    Ok(Json(json!({ "valid": valid })))
}

pub async fn audit_handler(
    State(state): State<AppState>,
) -> ServerResult<Json<ValidationReport>> {
    let report = state.blocking(|s| Ok(s.ledger.audit()?)).await?;
    Ok(Json(report))
}

pub async fn record_handler(
    State(state): State<AppState>,
    Path(position): Path<Position>,
) -> ServerResult<Json<RecordView>> {
    let record = state
        .blocking(move |s| Ok(s.ledger.get_by_position(position)?))
        .await?;
    Ok(Json(record.to_view()))
}

pub async fn record_by_digest_handler(
    State(state): State<AppState>,
    Path(digest): Path<String>,
) -> ServerResult<Json<RecordView>> {
    let digest =
        Digest::from_hex(&digest).map_err(|e| ServerError::BadRequest(e.to_string()))?;
    let record = state
        .blocking(move |s| Ok(s.ledger.get_by_digest(&digest)?))
        .await?;
    Ok(Json(record.to_view()))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub key: String,
    pub value: String,
    pub limit: Option<usize>,
}

/// Most-recent-first records whose payload has `key == value`.
pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ServerResult<Json<Vec<RecordView>>> {
    if params.key.is_empty() {
        return Err(ServerError::BadRequest("key must not be empty".into()));
    }
    let found = state
        .blocking(move |s| {
            let search = s
                .ledger
                .find_by_payload_field(&params.key, params.value)?;
            let mut found = Vec::new();
            for record in search.take(params.limit.unwrap_or(usize::MAX)) {
                found.push(record?.to_view());
            }
            Ok(found)
        })
        .await?;
    Ok(Json(found))
}

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub owner_id: String,
    #[serde(default)]
    pub filename: String,
}

/// Register the raw request body as a file owned by `owner_id`.
pub async fn register_file_handler(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> ServerResult<(StatusCode, Json<Attestation>)> {
    let attestation = state
        .blocking(move |s| {
            Ok(s.provenance
                .register_file(&body, &params.owner_id, &params.filename)?)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(attestation)))
}

pub async fn issue_certificate_handler(
    State(state): State<AppState>,
    Json(request): Json<CertificateRequest>,
) -> ServerResult<(StatusCode, Json<Attestation>)> {
    let attestation = state
        .blocking(move |s| Ok(s.provenance.issue_certificate(request)?))
        .await?;
    Ok((StatusCode::CREATED, Json(attestation)))
}

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    pub position: Position,
}

/// Check the raw request body against the record at `position`.
pub async fn verify_handler(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
    body: Bytes,
) -> ServerResult<Json<Verification>> {
    let outcome = state
        .blocking(move |s| Ok(s.provenance.verify_file(&body, params.position)?))
        .await?;
    Ok(Json(outcome))
}
