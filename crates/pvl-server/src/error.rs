use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use pvl_ledger::LedgerError;
use pvl_provenance::ProvenanceError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("store error: {0}")]
    Store(#[from] pvl_store::StoreError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unavailable(_) | Self::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<LedgerError> for ServerError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(_) | LedgerError::DigestNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            LedgerError::StoreConflict(_) => Self::Conflict(err.to_string()),
            LedgerError::StoreUnavailable(_) => Self::Unavailable(err.to_string()),
            LedgerError::Decode { .. } | LedgerError::Serialization(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<ProvenanceError> for ServerError {
    fn from(err: ProvenanceError) -> Self {
        match err {
            ProvenanceError::Ledger(inner) => inner.into(),
            ProvenanceError::InvalidInput(msg) => Self::BadRequest(msg),
            ProvenanceError::Io(inner) => Self::BadRequest(inner.to_string()),
            ProvenanceError::Serialization(inner) => Self::Internal(inner.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
