//! Row models and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the table row
//! - The insert DTO the stores accept

pub mod annotation;
pub mod annotator;
pub mod progress;
pub mod source_unit;
