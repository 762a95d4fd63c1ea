//! Handlers for submitting and listing annotations.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use errata_core::annotation::UpsertAction;
use errata_db::models::annotation::AnnotationSubmission;
use errata_db::workflow;

use crate::error::AppResult;
use crate::middleware::annotator::CurrentAnnotator;
use crate::middleware::json::ValidJson;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /collections/{name}/annotations
///
/// The caller's annotations in a collection, oldest first.
pub async fn list_annotations(
    annotator: CurrentAnnotator,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<impl IntoResponse> {
    let annotations = state
        .store
        .annotations_for(&annotator.annotator_id, Some(&name))
        .await?;
    Ok(Json(DataResponse { data: annotations }))
}

/// POST /collections/{name}/annotations
///
/// Create or revise the caller's judgment on one error occurrence. Responds
/// 201 on first submission and 200 on revision.
pub async fn submit_annotation(
    annotator: CurrentAnnotator,
    State(state): State<AppState>,
    Path(name): Path<String>,
    ValidJson(input): ValidJson<AnnotationSubmission>,
) -> AppResult<impl IntoResponse> {
    let receipt = workflow::submit_annotation(
        state.store.as_ref(),
        &state.policy,
        &annotator.annotator_id,
        &name,
        &input,
    )
    .await?;

    tracing::info!(
        annotator_id = %annotator.annotator_id,
        collection = %name,
        unit_id = %input.unit_id,
        action = receipt.action.as_str(),
        "Annotation submitted"
    );

    let status = match receipt.action {
        UpsertAction::Created => StatusCode::CREATED,
        UpsertAction::Updated => StatusCode::OK,
    };
    Ok((status, Json(DataResponse { data: receipt })))
}
