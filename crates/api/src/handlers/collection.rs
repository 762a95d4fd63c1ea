//! Handlers for collections and their source units.

use std::collections::BTreeSet;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use errata_core::error::CoreError;
use errata_core::import::{discover_collections, load_collection_file, validate_collection_name};
use errata_db::models::annotation::Annotation;
use errata_db::models::source_unit::SourceUnit;
use errata_db::workflow;

use crate::error::AppResult;
use crate::middleware::annotator::CurrentAnnotator;
use crate::response::DataResponse;
use crate::state::AppState;

/* --------------------------------------------------------------------------
   Response types
   -------------------------------------------------------------------------- */

/// One entry of the collection listing.
#[derive(Debug, Serialize)]
pub struct CollectionSummary {
    pub name: String,
    /// A data file for this collection exists in the data directory.
    pub data_file_present: bool,
    pub imported_units: i64,
    pub error_occurrences: i64,
    /// Annotations the caller has made in this collection.
    pub my_annotations: i64,
}

/// A unit addressed by position, with the caller's annotations on it.
#[derive(Debug, Serialize)]
pub struct UnitDetail {
    #[serde(flatten)]
    pub unit: SourceUnit,
    pub total_units: i64,
    pub annotations: Vec<Annotation>,
}

/* --------------------------------------------------------------------------
   Handlers
   -------------------------------------------------------------------------- */

/// GET /collections
///
/// Collections with a data file or imported units, with the caller's counts.
pub async fn list_collections(
    annotator: CurrentAnnotator,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let on_disk: BTreeSet<String> = discover_collections(&state.config.annotation_data_dir)?
        .into_iter()
        .collect();
    let imported = state.store.list_collections().await?;

    let names: BTreeSet<&String> = on_disk.iter().chain(imported.iter()).collect();
    let mut summaries = Vec::with_capacity(names.len());
    for name in names {
        summaries.push(CollectionSummary {
            name: name.clone(),
            data_file_present: on_disk.contains(name),
            imported_units: state.store.count_units(name).await?,
            error_occurrences: state.store.count_error_occurrences(name).await?,
            my_annotations: state
                .store
                .count_for_annotator(&annotator.annotator_id, name)
                .await?,
        });
    }

    Ok(Json(DataResponse { data: summaries }))
}

/// POST /collections/{name}/import
///
/// Import `<name>_annotation_data.json` from the data directory. Re-importing
/// only adds units that are not there yet.
pub async fn import_collection(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<impl IntoResponse> {
    validate_collection_name(&name)?;
    let _guard = state.import_lock.lock().await;

    let parsed = load_collection_file(&state.config.annotation_data_dir, &name)?;
    let outcome =
        workflow::import_collection(state.store.as_ref(), &state.assigner, &name, parsed).await?;

    Ok(Json(DataResponse { data: outcome }))
}

/// GET /collections/{name}/units
pub async fn list_units(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<impl IntoResponse> {
    let units = state.store.list_units(&name).await?;
    Ok(Json(DataResponse { data: units }))
}

/// GET /collections/{name}/units/{index}
///
/// Unit at a 0-based position plus the caller's annotations on it.
pub async fn get_unit_at(
    annotator: CurrentAnnotator,
    State(state): State<AppState>,
    Path((name, index)): Path<(String, i64)>,
) -> AppResult<impl IntoResponse> {
    let unit = state
        .store
        .unit_at(&name, index)
        .await?
        .ok_or_else(|| CoreError::not_found("SourceUnit", format!("{name}#{index}")))?;

    let annotations = state
        .store
        .annotations_for_unit(&name, &unit.unit_id, Some(&annotator.annotator_id))
        .await?;
    let total_units = state.store.count_units(&name).await?;

    Ok(Json(DataResponse {
        data: UnitDetail {
            unit,
            total_units,
            annotations,
        },
    }))
}
