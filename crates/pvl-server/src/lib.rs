//! HTTP server for the Provenance Ledger.
//!
//! Exposes chain inspection, validation, file registration, certificate
//! issuance, and content verification as a JSON REST API. Ledger work runs
//! on the blocking pool; errors map to `404`/`409`/`503`/`400` with an
//! `{"error": ...}` body.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use config::{ServerConfig, StorageConfig, DEFAULT_MAX_UPLOAD_BYTES};
pub use error::{ServerError, ServerResult};
pub use server::PvlServer;
pub use state::{AppState, DynStore};

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use pvl_ledger::LedgerReader;
    use pvl_store::InMemoryRecordStore;
    use pvl_types::{Digest, Record};
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    fn app_with(config: ServerConfig) -> (AppState, Router) {
        let state =
            AppState::with_store(config, Box::new(InMemoryRecordStore::new())).unwrap();
        let app = router::build_router(state.clone());
        (state, app)
    }

    fn app() -> (AppState, Router) {
        app_with(ServerConfig::default())
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
        send(
            app,
            Request::builder().uri(uri).body(Body::empty()).unwrap(),
        )
        .await
    }

    async fn post(app: &Router, uri: &str, body: impl Into<Body>) -> (StatusCode, Value) {
        send(
            app,
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .body(body.into())
                .unwrap(),
        )
        .await
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (_, app) = app();
        let (status, body) = get(&app, "/v1/health").await;
        assert_eq!(status, 200);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn info_endpoint() {
        let (_, app) = app();
        let (status, body) = get(&app, "/v1/info").await;
        assert_eq!(status, 200);
        assert_eq!(body["name"], "pvl-server");
        assert_eq!(body["record_count"], 1);
        assert_eq!(body["head"]["position"], 0);
    }

    #[tokio::test]
    async fn chain_starts_with_genesis() {
        let (_, app) = app();
        let (status, body) = get(&app, "/v1/chain").await;
        assert_eq!(status, 200);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["previous_digest"], "0");
        assert_eq!(body[0]["payload"]["message"], "Genesis Block");
    }

    #[tokio::test]
    async fn upload_then_verify() {
        let (_, app) = app();
        let (status, attestation) =
            post(&app, "/v1/files?owner_id=u1&filename=a.txt", "hello").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(attestation["block_index"], 1);
        assert_eq!(attestation["entry"]["type"], "file");

        let (status, outcome) = post(&app, "/v1/verify?position=1", "hello").await;
        assert_eq!(status, 200);
        assert_eq!(outcome["outcome"], "verified");

        let (_, outcome) = post(&app, "/v1/verify?position=1", "hellO").await;
        assert_eq!(outcome["outcome"], "tampered");

        let (_, outcome) = post(&app, "/v1/verify?position=7", "hello").await;
        assert_eq!(outcome["outcome"], "broken_reference");
    }

    #[tokio::test]
    async fn upload_requires_owner() {
        let (_, app) = app();
        let (status, _) = post(&app, "/v1/files?filename=a.txt", "hello").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = post(&app, "/v1/files?owner_id=%20&filename=a", "x").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("owner_id"));
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let (state, app) = app_with(ServerConfig {
            max_upload_bytes: 8,
            ..ServerConfig::default()
        });
        let (status, _) = post(&app, "/v1/files?owner_id=u1", vec![0u8; 64]).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(state.ledger.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn certificate_issue() {
        let (_, app) = app();
        let filehash = Digest::from_bytes([0xcd; 32]);
        let request = Request::builder()
            .method(Method::POST)
            .uri("/v1/certificates")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({"filehash": filehash, "filename": "deed.pdf", "owner": "u1"})
                    .to_string(),
            ))
            .unwrap();

        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["entry"]["type"], "certificate");
        assert_eq!(body["entry"]["filehash"], json!(filehash.as_str()));
        assert!(body["entry"]["cert_id"].is_string());
    }

    #[tokio::test]
    async fn record_lookups() {
        let (state, app) = app();
        post(&app, "/v1/files?owner_id=u1&filename=a", "abc").await;
        let record = state.ledger.get_by_position(1).unwrap();

        let (status, body) = get(&app, "/v1/records/1").await;
        assert_eq!(status, 200);
        assert_eq!(body["digest"], json!(record.digest.as_str()));

        let uri = format!("/v1/records/by-digest/{}", record.digest);
        let (status, body) = get(&app, &uri).await;
        assert_eq!(status, 200);
        assert_eq!(body["position"], 1);
    }

    #[tokio::test]
    async fn missing_records_are_not_found() {
        let (_, app) = app();
        let (status, body) = get(&app, "/v1/records/99").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());

        let uri = format!("/v1/records/by-digest/{}", "ab".repeat(32));
        let (status, _) = get(&app, &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_digest_is_bad_request() {
        let (_, app) = app();
        let (status, _) = get(&app, "/v1/records/by-digest/xyz").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn search_by_owner() {
        let (_, app) = app();
        post(&app, "/v1/files?owner_id=alice&filename=a", "1").await;
        post(&app, "/v1/files?owner_id=bob&filename=b", "2").await;
        post(&app, "/v1/files?owner_id=alice&filename=c", "3").await;

        let (status, body) = get(&app, "/v1/search?key=owner_id&value=alice").await;
        assert_eq!(status, 200);
        let positions: Vec<u64> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["position"].as_u64().unwrap())
            .collect();
        assert_eq!(positions, vec![3, 1]);

        let (_, body) = get(&app, "/v1/search?key=owner_id&value=alice&limit=1").await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn validate_and_audit_detect_tampering() {
        // Keep a handle on the concrete store so a record can be forged.
        let store = std::sync::Arc::new(InMemoryRecordStore::new());
        let state = AppState::with_store(
            ServerConfig::default(),
            Box::new(std::sync::Arc::clone(&store)),
        )
        .unwrap();
        let app = router::build_router(state.clone());
        post(&app, "/v1/files?owner_id=u1&filename=a", "abc").await;

        let (_, body) = get(&app, "/v1/chain/validate").await;
        assert_eq!(body, json!({"valid": true}));

        let mut forged: Record = state.ledger.get_by_position(1).unwrap();
        forged.payload = r#"{"filehash":"00","type":"file"}"#.into();
        assert!(store.replace_unchecked(forged).unwrap());

        let (_, body) = get(&app, "/v1/chain/validate").await;
        assert_eq!(body, json!({"valid": false}));

        let (status, report) = get(&app, "/v1/chain/audit").await;
        assert_eq!(status, 200);
        assert_eq!(report["record_count"], 2);
        assert_eq!(report["violations"][0]["position"], 1);
        assert_eq!(report["violations"][0]["kind"], "digest_mismatch");
    }
}
