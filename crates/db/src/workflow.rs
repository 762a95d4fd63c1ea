//! Store-agnostic workflows: import, submission and progress reporting.
//!
//! These run the core validation in front of any [`AnnotationStore`] so
//! both backends accept and reject exactly the same inputs.

use chrono::Utc;
use errata_core::annotation::{normalize_tags, validate_judgment, ValidationPolicy};
use errata_core::error::CoreError;
use errata_core::identity::{resolve, IdentityAssigner, IdentityRef};
use errata_core::import::{validate_collection_name, ParsedImport};
use errata_core::progress::ProgressReport;

use crate::models::annotation::{AnnotationSubmission, NewAnnotation, SubmissionReceipt};
use crate::models::progress::AnnotatorProgress;
use crate::models::source_unit::{ImportOutcome, NewSourceUnit};
use crate::store::{AnnotationStore, StoreResult};

/// Identify the spans of every parsed record and import them.
///
/// Records the parser skipped count towards `skipped`.
pub async fn import_collection(
    store: &dyn AnnotationStore,
    assigner: &IdentityAssigner,
    collection_name: &str,
    parsed: ParsedImport,
) -> StoreResult<ImportOutcome> {
    validate_collection_name(collection_name)?;

    let units: Vec<NewSourceUnit> = parsed
        .records
        .into_iter()
        .map(|record| NewSourceUnit::from_record(assigner, collection_name, record))
        .collect();

    let mut outcome = store.import_units(collection_name, units).await?;
    outcome.skipped += parsed.skipped;

    tracing::info!(
        collection = %collection_name,
        loaded = outcome.loaded,
        skipped = outcome.skipped,
        total = outcome.total,
        identity_mode = assigner.mode().as_str(),
        "Imported collection"
    );
    Ok(outcome)
}

/// Validate a submission and upsert it.
///
/// Order of checks: annotator, judgment, identity reference, unit, span.
/// The stored span's `error_type` and `full_match` are authoritative; a
/// submission that names different ones is rejected.
pub async fn submit_annotation(
    store: &dyn AnnotationStore,
    policy: &ValidationPolicy,
    annotator_id: &str,
    collection_name: &str,
    submission: &AnnotationSubmission,
) -> StoreResult<SubmissionReceipt> {
    if store.find_annotator(annotator_id).await?.is_none() {
        return Err(CoreError::not_found("Annotator", annotator_id).into());
    }

    let tags = normalize_tags(&submission.taxonomy_tags);
    let severity = validate_judgment(policy, submission.severity, &tags)?;

    let reference = IdentityRef::from_parts(
        submission.error_identity.as_deref(),
        &submission.unit_id,
        submission.error_type.as_deref(),
        submission.full_match.as_deref(),
        submission.occurrence_index,
    )?;

    let unit = store
        .find_unit(collection_name, &submission.unit_id)
        .await?
        .ok_or_else(|| CoreError::not_found("SourceUnit", &submission.unit_id))?;

    let span = resolve(&unit.spans, &unit.unit_id, &reference).ok_or_else(|| {
        CoreError::Validation(format!(
            "No error occurrence in unit '{}' matches the submitted identity",
            unit.unit_id
        ))
    })?;

    if let Some(error_type) = submission.error_type.as_deref() {
        if error_type != span.span.error_type {
            return Err(CoreError::Validation(format!(
                "error_type '{error_type}' does not match the occurrence ('{}')",
                span.span.error_type
            ))
            .into());
        }
    }
    if let Some(full_match) = submission.full_match.as_deref() {
        if full_match != span.span.full_match {
            return Err(CoreError::Validation(format!(
                "full_match '{full_match}' does not match the occurrence ('{}')",
                span.span.full_match
            ))
            .into());
        }
    }

    let new = NewAnnotation {
        annotator_id: annotator_id.to_string(),
        collection_name: collection_name.to_string(),
        unit_id: unit.unit_id.clone(),
        error_identity: span.identity.clone(),
        error_type: span.span.error_type.clone(),
        full_match: span.span.full_match.clone(),
        taxonomy_tags: tags,
        severity,
        context: submission.context(),
        submitted_at: Utc::now(),
    };

    let outcome = store.upsert_annotation(new).await?;
    let total = store
        .count_for_annotator(annotator_id, collection_name)
        .await?;

    tracing::debug!(
        annotator_id = %annotator_id,
        collection = %collection_name,
        error_identity = %outcome.annotation.error_identity,
        action = outcome.action.as_str(),
        revision = outcome.annotation.revision,
        "Annotation stored"
    );

    Ok(SubmissionReceipt {
        action: outcome.action,
        error_identity: outcome.annotation.error_identity,
        revision: outcome.annotation.revision,
        total_for_annotator_and_collection: total,
    })
}

/// Fail with `NotFound` unless the collection has imported units.
pub async fn require_collection(
    store: &dyn AnnotationStore,
    collection_name: &str,
) -> StoreResult<i64> {
    let units = store.count_units(collection_name).await?;
    if units == 0 {
        return Err(CoreError::not_found("Collection", collection_name).into());
    }
    Ok(units)
}

/// Progress of an annotator in an imported collection, created on first access.
pub async fn open_progress(
    store: &dyn AnnotationStore,
    annotator_id: &str,
    collection_name: &str,
) -> StoreResult<AnnotatorProgress> {
    require_collection(store, collection_name).await?;
    store
        .get_or_create_progress(annotator_id, collection_name)
        .await
}

/// Validate and apply a progress report to an imported collection.
pub async fn record_progress(
    store: &dyn AnnotationStore,
    annotator_id: &str,
    collection_name: &str,
    report: &ProgressReport,
) -> StoreResult<AnnotatorProgress> {
    let report = report.normalized()?;
    require_collection(store, collection_name).await?;
    store
        .report_progress(annotator_id, collection_name, &report)
        .await
}
