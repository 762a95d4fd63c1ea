//! Read-only aggregate views over a collection.
//!
//! Everything here is recomputed from current store state on each request.

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use errata_core::aggregate::{self, TypedAnnotation, UnitSummary};
use errata_core::error::CoreError;
use errata_core::progress::progress_percent;

use crate::error::AppResult;
use crate::middleware::annotator::CurrentAnnotator;
use crate::query::AnnotatorFilter;
use crate::response::DataResponse;
use crate::state::AppState;

/* --------------------------------------------------------------------------
   Response types
   -------------------------------------------------------------------------- */

#[derive(Debug, Serialize)]
pub struct CollectionStats {
    pub collection_name: String,
    pub total_units: i64,
    pub total_error_occurrences: i64,
    pub total_annotations_by_annotator: i64,
    pub current_index: i64,
    pub progress_percent: f64,
}

/// A unit with its merged annotations.
#[derive(Debug, Serialize)]
pub struct ReconciledUnit {
    pub unit_id: String,
    pub position: i64,
    pub reference_text: String,
    pub raw_transcript: String,
    pub marked_text: String,
    pub summary: UnitSummary,
    pub annotations_by_type: BTreeMap<String, Vec<TypedAnnotation>>,
}

#[derive(Debug, Serialize)]
pub struct UnitSummaryView {
    pub unit_id: String,
    #[serde(flatten)]
    pub summary: UnitSummary,
}

/* --------------------------------------------------------------------------
   Handlers
   -------------------------------------------------------------------------- */

/// GET /collections/{name}/stats
///
/// The caller's counts and position in a collection. Read-only: a caller
/// who never opened the collection is reported at index 0.
pub async fn get_stats(
    annotator: CurrentAnnotator,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<impl IntoResponse> {
    let total_units = state.store.count_units(&name).await?;
    let total_error_occurrences = state.store.count_error_occurrences(&name).await?;
    let total_annotations_by_annotator = state
        .store
        .count_for_annotator(&annotator.annotator_id, &name)
        .await?;
    let current_index = state
        .store
        .find_progress(&annotator.annotator_id, &name)
        .await?
        .map_or(0, |p| p.current_index);

    Ok(Json(DataResponse {
        data: CollectionStats {
            collection_name: name,
            total_units,
            total_error_occurrences,
            total_annotations_by_annotator,
            current_index,
            progress_percent: progress_percent(
                total_annotations_by_annotator,
                total_error_occurrences,
            ),
        },
    }))
}

/// GET /collections/{name}/reconciliation
///
/// Every unit in import order with its annotation summary and the
/// annotations grouped by error type. `?annotator_id=` restricts to one
/// annotator.
pub async fn get_reconciliation(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(filter): Query<AnnotatorFilter>,
) -> AppResult<impl IntoResponse> {
    let annotator_id = filter.normalized();
    let units = state.store.list_units(&name).await?;
    let annotations = state
        .store
        .annotations_in_collection(&name, annotator_id.as_deref())
        .await?;

    let merged = aggregate::reconcile(
        units.iter().map(|u| u.unit_id.as_str()),
        annotations.iter().map(|a| a.judgment()),
    );

    let data: Vec<ReconciledUnit> = units
        .into_iter()
        .zip(merged)
        .map(|(unit, rec)| ReconciledUnit {
            unit_id: rec.unit_id,
            position: unit.position,
            reference_text: unit.reference_text,
            raw_transcript: unit.raw_transcript,
            marked_text: unit.marked_text,
            summary: rec.summary,
            annotations_by_type: rec.annotations_by_type,
        })
        .collect();

    Ok(Json(DataResponse { data }))
}

/// GET /collections/{name}/breakdown
///
/// Distribution of annotations over error types, taxonomy tags and severity.
pub async fn get_breakdown(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(filter): Query<AnnotatorFilter>,
) -> AppResult<impl IntoResponse> {
    let annotator_id = filter.normalized();
    let annotations = state
        .store
        .annotations_in_collection(&name, annotator_id.as_deref())
        .await?;
    let data = aggregate::breakdown(annotations.iter().map(|a| a.judgment()));
    Ok(Json(DataResponse { data }))
}

/// GET /collections/{name}/summaries/{unit_id}
pub async fn get_unit_summary(
    State(state): State<AppState>,
    Path((name, unit_id)): Path<(String, String)>,
    Query(filter): Query<AnnotatorFilter>,
) -> AppResult<impl IntoResponse> {
    if state.store.find_unit(&name, &unit_id).await?.is_none() {
        return Err(CoreError::not_found("SourceUnit", unit_id).into());
    }

    let annotator_id = filter.normalized();
    let annotations = state
        .store
        .annotations_for_unit(&name, &unit_id, annotator_id.as_deref())
        .await?;
    let summary = aggregate::summarize(annotations.iter().map(|a| a.judgment()));

    Ok(Json(DataResponse {
        data: UnitSummaryView { unit_id, summary },
    }))
}
