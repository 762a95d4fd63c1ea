//! Domain logic for error-occurrence annotation.
//!
//! Everything here is free of persistence and transport concerns: span
//! extraction from inline markup, identity assignment, judgment validation,
//! progress reports, aggregation, and parsing of the roster and import files.

pub mod aggregate;
pub mod annotation;
pub mod error;
pub mod identity;
pub mod import;
pub mod markup;
pub mod progress;
pub mod roster;
pub mod types;
