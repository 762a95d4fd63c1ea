pub mod collection;
pub mod health;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /collections                                     list collections
/// /collections/{name}/import                       import data file (POST)
/// /collections/{name}/units                        list units
/// /collections/{name}/units/{index}                unit by position
/// /collections/{name}/annotations                  list, submit
/// /collections/{name}/progress                     get, report
/// /collections/{name}/stats                        caller's counts
/// /collections/{name}/reconciliation               annotations merged onto units
/// /collections/{name}/breakdown                    type, tag, severity distribution
/// /collections/{name}/summaries/{unit_id}          one unit's summary
///
/// /export                                          caller's annotations (?collection)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/collections", collection::router())
        .route("/export", get(handlers::export::export_annotations))
}
