//! Shared query parameter types for API handlers.

use errata_core::roster::normalize_annotator_id;
use serde::Deserialize;

/// Optional `?annotator_id=` filter for aggregate views.
///
/// Absent or blank means every annotator.
#[derive(Debug, Default, Deserialize)]
pub struct AnnotatorFilter {
    pub annotator_id: Option<String>,
}

impl AnnotatorFilter {
    /// The filter in canonical form.
    pub fn normalized(&self) -> Option<String> {
        self.annotator_id
            .as_deref()
            .map(normalize_annotator_id)
            .filter(|id| !id.is_empty())
    }
}

/// `?collection=` parameter of the export endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ExportParams {
    pub collection: Option<String>,
}

impl ExportParams {
    /// Collection to restrict to. `all` or absent means no restriction.
    pub fn collection(&self) -> Option<&str> {
        self.collection
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"))
    }
}
