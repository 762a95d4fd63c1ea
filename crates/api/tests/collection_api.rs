//! HTTP-level tests for collection listing, import and unit navigation.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, get_as, post_json, COLLECTION};
use serde_json::json;

// ---------------------------------------------------------------------------
// Annotator identification
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_annotator_header_returns_400() {
    let (app, _dir) = common::build_test_app().await;
    let response = get(app, "/api/v1/collections").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn unknown_annotator_returns_404() {
    let (app, _dir) = common::build_test_app().await;
    let response = get_as(app, "/api/v1/collections", "A9").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Annotator 'A9' not found");
}

// ---------------------------------------------------------------------------
// Listing and import
// ---------------------------------------------------------------------------

#[tokio::test]
async fn data_file_is_listed_before_import() {
    let (app, _dir) = common::build_test_app().await;
    let json = body_json(get_as(app, "/api/v1/collections", "a1").await).await;

    let collections = json["data"].as_array().unwrap();
    assert_eq!(collections.len(), 1);
    assert_eq!(collections[0]["name"], COLLECTION);
    assert_eq!(collections[0]["data_file_present"], true);
    assert_eq!(collections[0]["imported_units"], 0);
}

#[tokio::test]
async fn import_is_idempotent() {
    let (app, _dir) = common::build_test_app().await;
    let uri = format!("/api/v1/collections/{COLLECTION}/import");

    let first = post_json(app.clone(), &uri, json!({})).await;
    assert_eq!(first.status(), StatusCode::OK);
    let first = body_json(first).await;
    assert_eq!(first["data"]["loaded"], 3);
    assert_eq!(first["data"]["skipped"], 0);
    assert_eq!(first["data"]["total"], 3);

    let second = body_json(post_json(app.clone(), &uri, json!({})).await).await;
    assert_eq!(second["data"]["loaded"], 0);
    assert_eq!(second["data"]["skipped"], 3);
    assert_eq!(second["data"]["total"], 3);

    let listed = body_json(get_as(app, "/api/v1/collections", "A1").await).await;
    assert_eq!(listed["data"][0]["imported_units"], 3);
    assert_eq!(listed["data"][0]["error_occurrences"], 4);
    assert_eq!(listed["data"][0]["my_annotations"], 0);
}

#[tokio::test]
async fn import_without_data_file_returns_404() {
    let (app, _dir) = common::build_test_app().await;
    let response = post_json(app, "/api/v1/collections/phi4/import", json!({})).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn import_rejects_invalid_collection_name() {
    let (app, _dir) = common::build_test_app().await;
    let response = post_json(app, "/api/v1/collections/.hidden/import", json!({})).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

#[tokio::test]
async fn units_keep_import_order_and_spans() {
    let (app, _dir) = common::build_seeded_app().await;
    let json = body_json(get(app, &format!("/api/v1/collections/{COLLECTION}/units")).await).await;

    let units = json["data"].as_array().unwrap();
    let ids: Vec<&str> = units.iter().map(|u| u["unit_id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["u1", "u2", "u3"]);

    assert_eq!(units[0]["metadata"]["speaker"], "S1");
    assert_eq!(units[0]["spans"][1]["error_type"], "SUB");
    assert_eq!(units[0]["spans"][1]["full_match"], "[SUB:daily->weekly]");
    assert_eq!(units[1]["error_count"], 2);
    assert_eq!(units[2]["spans"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn unit_at_position() {
    let (app, _dir) = common::build_seeded_app().await;

    let response = get_as(
        app.clone(),
        &format!("/api/v1/collections/{COLLECTION}/units/1"),
        "A1",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["unit_id"], "u2");
    assert_eq!(json["data"]["position"], 1);
    assert_eq!(json["data"]["total_units"], 3);
    assert_eq!(json["data"]["annotations"], json!([]));

    let past_end = get_as(app, &format!("/api/v1/collections/{COLLECTION}/units/7"), "A1").await;
    assert_eq!(past_end.status(), StatusCode::NOT_FOUND);
}
