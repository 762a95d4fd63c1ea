//! Handlers for annotator navigation progress.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

use errata_core::progress::ProgressReport;
use errata_db::workflow;

use crate::error::AppResult;
use crate::middleware::annotator::CurrentAnnotator;
use crate::middleware::json::ValidJson;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /collections/{name}/progress
///
/// Returns the caller's progress, starting it at index 0 on first access.
/// Collections without imported units are 404.
pub async fn get_progress(
    annotator: CurrentAnnotator,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<impl IntoResponse> {
    let progress =
        workflow::open_progress(state.store.as_ref(), &annotator.annotator_id, &name).await?;
    Ok(Json(DataResponse { data: progress }))
}

/// POST /collections/{name}/progress
///
/// Partial update: omitted fields keep their stored value.
pub async fn report_progress(
    annotator: CurrentAnnotator,
    State(state): State<AppState>,
    Path(name): Path<String>,
    ValidJson(report): ValidJson<ProgressReport>,
) -> AppResult<impl IntoResponse> {
    let progress =
        workflow::record_progress(state.store.as_ref(), &annotator.annotator_id, &name, &report)
            .await?;

    tracing::debug!(
        annotator_id = %annotator.annotator_id,
        collection = %name,
        current_index = progress.current_index,
        completed = progress.completed_unit_ids.len(),
        "Progress reported"
    );
    Ok(Json(DataResponse { data: progress }))
}
