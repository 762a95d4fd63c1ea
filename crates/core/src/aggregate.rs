//! Reconciliation of annotations back onto source units.
//!
//! All functions here are pure and work over borrowed [`ErrorJudgment`]
//! views, so callers recompute results from current store state on every
//! read instead of caching them.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::annotation::{MAX_SEVERITY, MIN_SEVERITY, SEVERITY_LABELS};
use crate::markup::CANONICAL_ERROR_TYPES;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Borrowed view of one stored annotation, enough to aggregate it.
#[derive(Debug, Clone, Copy)]
pub struct ErrorJudgment<'a> {
    pub unit_id: &'a str,
    pub error_type: &'a str,
    pub full_match: &'a str,
    pub taxonomy_tags: &'a [String],
    pub severity: i32,
}

/// Per-unit summary of matched annotations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitSummary {
    pub total_errors: usize,
    pub average_severity: f64,
    pub taxonomy_tags: Vec<String>,
}

impl UnitSummary {
    pub fn empty() -> Self {
        Self {
            total_errors: 0,
            average_severity: 0.0,
            taxonomy_tags: Vec::new(),
        }
    }
}

/// One annotation as listed under its error type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypedAnnotation {
    pub text: String,
    pub taxonomy: Vec<String>,
    pub severity: i32,
}

/// Summary plus type partition for one unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitReconciliation {
    pub unit_id: String,
    pub summary: UnitSummary,
    pub annotations_by_type: BTreeMap<String, Vec<TypedAnnotation>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeverityBucket {
    pub severity: i32,
    pub label: &'static str,
    pub count: usize,
    pub percent: f64,
}

/// Distribution of a set of annotations by type, tag and severity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationBreakdown {
    pub total_annotations: usize,
    pub by_error_type: BTreeMap<String, usize>,
    pub taxonomy: Vec<TagCount>,
    pub severity: Vec<SeverityBucket>,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn percent_of(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_to(count as f64 / total as f64 * 100.0, 1)
}

/// Count, mean severity (2 decimals) and sorted tag union.
pub fn summarize<'a, I>(judgments: I) -> UnitSummary
where
    I: IntoIterator<Item = ErrorJudgment<'a>>,
{
    let mut total = 0usize;
    let mut severity_sum = 0i64;
    let mut tags: BTreeSet<&str> = BTreeSet::new();

    for j in judgments {
        total += 1;
        severity_sum += i64::from(j.severity);
        tags.extend(j.taxonomy_tags.iter().map(String::as_str));
    }

    if total == 0 {
        return UnitSummary::empty();
    }

    UnitSummary {
        total_errors: total,
        average_severity: round_to(severity_sum as f64 / total as f64, 2),
        taxonomy_tags: tags.into_iter().map(str::to_string).collect(),
    }
}

/// Group annotations by error type, preserving input order within a type.
pub fn partition_by_type<'a, I>(judgments: I) -> BTreeMap<String, Vec<TypedAnnotation>>
where
    I: IntoIterator<Item = ErrorJudgment<'a>>,
{
    let mut out: BTreeMap<String, Vec<TypedAnnotation>> = BTreeMap::new();
    for j in judgments {
        out.entry(j.error_type.to_string())
            .or_default()
            .push(TypedAnnotation {
                text: j.full_match.to_string(),
                taxonomy: j.taxonomy_tags.to_vec(),
                severity: j.severity,
            });
    }
    out
}

/// Merge annotations back onto units.
///
/// Every unit gets an entry, in the order given, even with no annotations.
/// Annotations whose unit is not listed are ignored.
pub fn reconcile<'a, U, J>(unit_ids: U, judgments: J) -> Vec<UnitReconciliation>
where
    U: IntoIterator<Item = &'a str>,
    J: IntoIterator<Item = ErrorJudgment<'a>>,
{
    let mut by_unit: HashMap<&str, Vec<ErrorJudgment<'a>>> = HashMap::new();
    for j in judgments {
        by_unit.entry(j.unit_id).or_default().push(j);
    }

    unit_ids
        .into_iter()
        .map(|unit_id| {
            let matched = by_unit.remove(unit_id).unwrap_or_default();
            UnitReconciliation {
                unit_id: unit_id.to_string(),
                summary: summarize(matched.iter().copied()),
                annotations_by_type: partition_by_type(matched),
            }
        })
        .collect()
}

/// Distribution over error types, taxonomy tags and severities.
///
/// Canonical error types are always present. Tags are ordered by descending
/// count, then name. Severities outside 0..=5 are counted in the total only.
pub fn breakdown<'a, I>(judgments: I) -> AnnotationBreakdown
where
    I: IntoIterator<Item = ErrorJudgment<'a>>,
{
    let mut total = 0usize;
    let mut by_error_type: BTreeMap<String, usize> = CANONICAL_ERROR_TYPES
        .iter()
        .map(|t| (t.to_string(), 0))
        .collect();
    let mut tag_counts: HashMap<&str, usize> = HashMap::new();
    let mut severity_counts = [0usize; SEVERITY_LABELS.len()];

    for j in judgments {
        total += 1;
        *by_error_type.entry(j.error_type.to_string()).or_default() += 1;
        for tag in j.taxonomy_tags {
            *tag_counts.entry(tag.as_str()).or_default() += 1;
        }
        if let Some(slot) = usize::try_from(j.severity)
            .ok()
            .and_then(|i| severity_counts.get_mut(i))
        {
            *slot += 1;
        }
    }

    let mut taxonomy: Vec<TagCount> = tag_counts
        .into_iter()
        .map(|(tag, count)| TagCount {
            tag: tag.to_string(),
            count,
            percent: percent_of(count, total),
        })
        .collect();
    taxonomy.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));

    let severity = (MIN_SEVERITY..=MAX_SEVERITY)
        .zip(severity_counts)
        .zip(SEVERITY_LABELS)
        .map(|((severity, count), label)| SeverityBucket {
            severity,
            label,
            count,
            percent: percent_of(count, total),
        })
        .collect();

    AnnotationBreakdown {
        total_annotations: total,
        by_error_type,
        taxonomy,
        severity,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
