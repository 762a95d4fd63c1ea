//! Export of an annotator's judgments.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use errata_core::types::Timestamp;
use errata_db::models::annotation::Annotation;

use crate::error::AppResult;
use crate::middleware::annotator::CurrentAnnotator;
use crate::query::ExportParams;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AnnotationExport {
    pub exported_at: Timestamp,
    pub annotator_id: String,
    pub annotator_name: String,
    pub annotator_email: String,
    /// Collection name, or `all`.
    pub collection_filter: String,
    pub total_annotations: usize,
    pub annotations: Vec<Annotation>,
}

/// GET /export
///
/// All of the caller's annotations, optionally restricted with `?collection=`.
pub async fn export_annotations(
    annotator: CurrentAnnotator,
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
) -> AppResult<impl IntoResponse> {
    let collection = params.collection();
    let annotations = state
        .store
        .annotations_for(&annotator.annotator_id, collection)
        .await?;

    tracing::info!(
        annotator_id = %annotator.annotator_id,
        collection = collection.unwrap_or("all"),
        count = annotations.len(),
        "Annotations exported"
    );

    Ok(Json(DataResponse {
        data: AnnotationExport {
            exported_at: Utc::now(),
            collection_filter: collection.unwrap_or("all").to_string(),
            total_annotations: annotations.len(),
            annotator_id: annotator.annotator_id,
            annotator_name: annotator.display_name,
            annotator_email: annotator.email,
            annotations,
        },
    }))
}
