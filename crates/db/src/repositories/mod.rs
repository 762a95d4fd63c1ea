//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&SqlitePool` as the first argument. Timestamps are always bound
//! from the caller so every backend stamps rows the same way.

pub mod annotation_repo;
pub mod annotator_repo;
pub mod progress_repo;
pub mod source_unit_repo;

pub use annotation_repo::AnnotationRepo;
pub use annotator_repo::AnnotatorRepo;
pub use progress_repo::ProgressRepo;
pub use source_unit_repo::SourceUnitRepo;
