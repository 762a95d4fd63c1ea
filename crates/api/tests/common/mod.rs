//! Shared test harness for API integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use errata_api::config::{ServerConfig, StoreBackend};
use errata_api::router::build_app_router;
use errata_api::state::{self, AppState};
use errata_core::identity::IdentityMode;
use errata_db::store::{AnnotationStore, MemoryStore};

pub const COLLECTION: &str = "whisper";

pub const UNITS_JSON: &str = r#"[
    {
        "utterance_id": "u1",
        "human_transcript": "take two tablets daily",
        "asr_transcript": "take tablets weekly",
        "asr_reconstructed": "take [DEL:two] tablets [SUB:daily->weekly]",
        "speaker": "S1"
    },
    {
        "utterance_id": "u2",
        "human_transcript": "ok x ok",
        "asr_transcript": "x",
        "asr_reconstructed": "[DEL:ok] x [DEL:ok]"
    },
    {
        "utterance_id": "u3",
        "human_transcript": "no errors here",
        "asr_transcript": "no errors here",
        "asr_reconstructed": "no errors here"
    }
]"#;

pub const ROSTER_JSON: &str = r#"{"annotators": [
    {"annotatorId": "A1", "name": "Ada", "email": "ada@example.org", "affiliation": "Clinic"},
    {"annotatorId": "A2", "name": "Grace", "email": "grace@example.org"}
]}"#;

/// Build a test `ServerConfig` rooted at `dir`.
pub fn test_config(dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        store: StoreBackend::Memory {
            snapshot_path: None,
        },
        identity_mode: IdentityMode::Opaque,
        require_tags_for_severity: true,
        annotation_data_dir: dir.join("annotation_data"),
        annotators_file: dir.join("annotators.json"),
    }
}

/// Application with a volatile memory store, the A1/A2 roster and a
/// `whisper` data file on disk (not yet imported). Keep the dir alive.
pub async fn build_test_app() -> (Router, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());

    std::fs::create_dir_all(&config.annotation_data_dir).unwrap();
    std::fs::write(
        config
            .annotation_data_dir
            .join(format!("{COLLECTION}_annotation_data.json")),
        UNITS_JSON,
    )
    .unwrap();
    std::fs::write(&config.annotators_file, ROSTER_JSON).unwrap();

    let store: Arc<dyn AnnotationStore> = Arc::new(MemoryStore::new());
    state::load_roster(store.as_ref(), &config.annotators_file)
        .await
        .unwrap();

    let app = build_app_router(AppState::new(store, config.clone()), &config);
    (app, dir)
}

/// [`build_test_app`] with the `whisper` collection imported.
pub async fn build_seeded_app() -> (Router, TempDir) {
    let (app, dir) = build_test_app().await;
    let response = post_json(
        app.clone(),
        &format!("/api/v1/collections/{COLLECTION}/import"),
        serde_json::json!({}),
    )
    .await;
    assert!(response.status().is_success());
    (app, dir)
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    annotator: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(id) = annotator {
        builder = builder.header("x-annotator-id", id);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).unwrap())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

/// GET without an annotator header.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

/// GET as `annotator`.
pub async fn get_as(app: Router, uri: &str, annotator: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(annotator), None).await
}

/// POST a JSON body without an annotator header.
pub async fn post_json(app: Router, uri: &str, json: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(json)).await
}

/// POST a JSON body as `annotator`.
pub async fn post_json_as(
    app: Router,
    uri: &str,
    annotator: &str,
    json: serde_json::Value,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(annotator), Some(json)).await
}

/// POST raw bytes labelled as JSON, for bodies `serde_json` would not emit.
pub async fn post_raw_as(app: Router, uri: &str, annotator: &str, body: &'static str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("x-annotator-id", annotator)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Error identity of the `n`th span of `unit_id`, read through the API.
pub async fn identity_of(app: &Router, unit_id: &str, n: usize) -> String {
    let json = body_json(get(app.clone(), &format!("/api/v1/collections/{COLLECTION}/units")).await).await;
    let unit = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["unit_id"] == unit_id)
        .unwrap()
        .clone();
    unit["spans"][n]["identity"].as_str().unwrap().to_string()
}

/// Submit a judgment on an occurrence named by identity.
pub async fn annotate(
    app: &Router,
    annotator: &str,
    unit_id: &str,
    identity: &str,
    severity: i32,
    tags: &[&str],
) -> Response<Body> {
    post_json_as(
        app.clone(),
        &format!("/api/v1/collections/{COLLECTION}/annotations"),
        annotator,
        serde_json::json!({
            "unit_id": unit_id,
            "error_identity": identity,
            "severity": severity,
            "taxonomy_tags": tags,
        }),
    )
    .await
}
