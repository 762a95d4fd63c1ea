//! Request extractors.
//!
//! - [`annotator::CurrentAnnotator`] -- Resolves the calling annotator from the
//!   `x-annotator-id` header.
//! - [`json::ValidJson`] -- JSON body extractor with `AppError` rejections.

pub mod annotator;
pub mod json;
