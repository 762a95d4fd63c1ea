//! Route definitions for the `/collections` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{analysis, annotation, collection, progress};
use crate::state::AppState;

/// Routes mounted at `/collections`.
///
/// ```text
/// GET    /                                  -> list_collections
/// POST   /{name}/import                     -> import_collection
/// GET    /{name}/units                      -> list_units
/// GET    /{name}/units/{index}              -> get_unit_at
/// GET    /{name}/annotations                -> list_annotations
/// POST   /{name}/annotations                -> submit_annotation
/// GET    /{name}/progress                   -> get_progress
/// POST   /{name}/progress                   -> report_progress
/// GET    /{name}/stats                      -> get_stats
/// GET    /{name}/reconciliation             -> get_reconciliation (?annotator_id)
/// GET    /{name}/breakdown                  -> get_breakdown (?annotator_id)
/// GET    /{name}/summaries/{unit_id}        -> get_unit_summary (?annotator_id)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(collection::list_collections))
        .route("/{name}/import", post(collection::import_collection))
        .route("/{name}/units", get(collection::list_units))
        .route("/{name}/units/{index}", get(collection::get_unit_at))
        .route(
            "/{name}/annotations",
            get(annotation::list_annotations).post(annotation::submit_annotation),
        )
        .route(
            "/{name}/progress",
            get(progress::get_progress).post(progress::report_progress),
        )
        .route("/{name}/stats", get(analysis::get_stats))
        .route("/{name}/reconciliation", get(analysis::get_reconciliation))
        .route("/{name}/breakdown", get(analysis::get_breakdown))
        .route("/{name}/summaries/{unit_id}", get(analysis::get_unit_summary))
}
