//! Annotator identification extractor for Axum handlers.
//!
//! The header only identifies the caller against the roster; it is not
//! authentication.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use errata_core::error::CoreError;
use errata_core::roster::{normalize_annotator_id, validate_annotator_id};

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the caller's annotator id.
pub const ANNOTATOR_HEADER: &str = "x-annotator-id";

/// Roster entry of the calling annotator.
///
/// ```ignore
/// async fn my_handler(annotator: CurrentAnnotator) -> AppResult<Json<()>> {
///     tracing::info!(annotator_id = %annotator.annotator_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentAnnotator {
    pub annotator_id: String,
    pub display_name: String,
    pub email: String,
}

impl FromRequestParts<AppState> for CurrentAnnotator {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(ANNOTATOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::BadRequest(format!("Missing {ANNOTATOR_HEADER} header")))?;

        let annotator_id = normalize_annotator_id(raw);
        validate_annotator_id(&annotator_id)?;

        let annotator = state
            .store
            .find_annotator(&annotator_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Annotator", &annotator_id))?;

        Ok(CurrentAnnotator {
            annotator_id: annotator.annotator_id,
            display_name: annotator.display_name,
            email: annotator.email,
        })
    }
}
