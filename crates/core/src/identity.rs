//! Stable identities for error occurrences.
//!
//! An [`ErrorIdentity`] is what an annotation is keyed on, so the same
//! occurrence must keep the same identity across sessions. Identities are
//! assigned once, when a unit is imported, and stored next to the unit's
//! spans; reads never mint new ones.
//!
//! Two modes are available:
//!
//! - [`IdentityMode::Stable`]: a SHA-256 digest of the collection name and
//!   the composite key `(unit_id, error_type, full_match, occurrence_index)`.
//!   Re-importing the same text reproduces the same identities.
//! - [`IdentityMode::Opaque`]: a random UUID v4 token.
//!
//! Clients that do not hold a token can still address an occurrence through
//! its composite key; [`resolve`] maps either form to the stored span.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CoreError;
use crate::markup::{self, ErrorSpan};

/// Field separator for the stable digest input (ASCII unit separator).
const KEY_SEPARATOR: char = '\u{1f}';

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Opaque identity of one error occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorIdentity(String);

impl ErrorIdentity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ErrorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Composite natural key of an occurrence inside one unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompositeKey {
    pub unit_id: String,
    pub error_type: String,
    pub full_match: String,
    pub occurrence_index: usize,
}

impl CompositeKey {
    pub fn from_span(unit_id: &str, span: &ErrorSpan) -> Self {
        Self {
            unit_id: unit_id.to_string(),
            error_type: span.error_type.clone(),
            full_match: span.full_match.clone(),
            occurrence_index: span.occurrence_index,
        }
    }

    /// Whether `span` of unit `unit_id` is the occurrence this key names.
    pub fn matches(&self, unit_id: &str, span: &ErrorSpan) -> bool {
        self.unit_id == unit_id
            && self.occurrence_index == span.occurrence_index
            && self.error_type == span.error_type
            && self.full_match == span.full_match
    }
}

/// How identities are produced at import time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityMode {
    /// Deterministic digest of the composite key.
    Stable,
    /// Random token minted once and persisted.
    #[default]
    Opaque,
}

impl IdentityMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Opaque => "opaque",
        }
    }
}

impl FromStr for IdentityMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stable" => Ok(Self::Stable),
            "opaque" => Ok(Self::Opaque),
            other => Err(CoreError::Validation(format!(
                "Invalid identity mode '{other}'. Must be one of: stable, opaque"
            ))),
        }
    }
}

/// An extracted span together with its assigned identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifiedSpan {
    pub identity: ErrorIdentity,
    #[serde(flatten)]
    pub span: ErrorSpan,
}

// ---------------------------------------------------------------------------
// Assignment
// ---------------------------------------------------------------------------

/// Deterministic identity for a composite key within a collection.
///
/// The collection name is part of the digest because the same unit id may
/// exist in several collections with identical markup.
pub fn stable_identity(collection_name: &str, key: &CompositeKey) -> ErrorIdentity {
    let mut hasher = Sha256::new();
    for part in [
        collection_name,
        key.unit_id.as_str(),
        key.error_type.as_str(),
        key.full_match.as_str(),
    ] {
        hasher.update(part.as_bytes());
        hasher.update(KEY_SEPARATOR.to_string().as_bytes());
    }
    hasher.update(key.occurrence_index.to_string().as_bytes());
    ErrorIdentity(format!("{:x}", hasher.finalize()))
}

/// Mint a fresh random identity. Only ever called at import time.
pub fn mint_opaque_identity() -> ErrorIdentity {
    ErrorIdentity(uuid::Uuid::new_v4().to_string())
}

/// Assigns identities to freshly extracted spans according to a mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityAssigner {
    mode: IdentityMode,
}

impl IdentityAssigner {
    pub fn new(mode: IdentityMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> IdentityMode {
        self.mode
    }

    pub fn assign(&self, collection_name: &str, key: &CompositeKey) -> ErrorIdentity {
        match self.mode {
            IdentityMode::Stable => stable_identity(collection_name, key),
            IdentityMode::Opaque => mint_opaque_identity(),
        }
    }

    /// Extract the spans of `marked_text` and give each one an identity.
    pub fn identify_spans(
        &self,
        collection_name: &str,
        unit_id: &str,
        marked_text: &str,
    ) -> Vec<IdentifiedSpan> {
        markup::extract(marked_text)
            .map(|span| {
                let key = CompositeKey::from_span(unit_id, &span);
                IdentifiedSpan {
                    identity: self.assign(collection_name, &key),
                    span,
                }
            })
            .collect()
    }
}

/// Return the first identity that appears more than once, if any.
pub fn find_duplicate_identity<'a, I>(identities: I) -> Option<&'a ErrorIdentity>
where
    I: IntoIterator<Item = &'a ErrorIdentity>,
{
    let mut seen = HashSet::new();
    identities.into_iter().find(|id| !seen.insert(*id))
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// How a client refers to an occurrence when submitting a judgment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityRef {
    Explicit(ErrorIdentity),
    Composite(CompositeKey),
}

impl IdentityRef {
    /// Build a reference from the optional fields of a submission.
    ///
    /// A non-empty explicit identity wins. Otherwise the composite key needs
    /// `error_type`, `full_match` and `occurrence_index` all present.
    pub fn from_parts(
        explicit: Option<&str>,
        unit_id: &str,
        error_type: Option<&str>,
        full_match: Option<&str>,
        occurrence_index: Option<usize>,
    ) -> Result<Self, CoreError> {
        if let Some(id) = explicit.map(str::trim).filter(|id| !id.is_empty()) {
            return Ok(Self::Explicit(ErrorIdentity::new(id)));
        }

        match (error_type, full_match, occurrence_index) {
            (Some(error_type), Some(full_match), Some(occurrence_index)) => {
                Ok(Self::Composite(CompositeKey {
                    unit_id: unit_id.to_string(),
                    error_type: error_type.to_string(),
                    full_match: full_match.to_string(),
                    occurrence_index,
                }))
            }
            _ => Err(CoreError::Validation(
                "error_identity is required (or error_type, full_match and \
                 occurrence_index together)"
                    .to_string(),
            )),
        }
    }
}

/// Find the stored span of unit `unit_id` that `reference` names.
pub fn resolve<'a>(
    spans: &'a [IdentifiedSpan],
    unit_id: &str,
    reference: &IdentityRef,
) -> Option<&'a IdentifiedSpan> {
    match reference {
        IdentityRef::Explicit(identity) => spans.iter().find(|s| &s.identity == identity),
        IdentityRef::Composite(key) => spans.iter().find(|s| key.matches(unit_id, &s.span)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const TEXT: &str = "[DEL:ok] x [DEL:ok] [SUB:a->b]";

    #[test]
    fn stable_mode_is_reproducible() {
        let assigner = IdentityAssigner::new(IdentityMode::Stable);
        let first = assigner.identify_spans("whisper", "u1", TEXT);
        let second = assigner.identify_spans("whisper", "u1", TEXT);
        assert_eq!(first, second);
    }

    #[test]
    fn repeated_markup_gets_distinct_stable_identities() {
        let assigner = IdentityAssigner::new(IdentityMode::Stable);
        let spans = assigner.identify_spans("whisper", "u1", TEXT);
        assert_eq!(spans.len(), 3);
        assert_ne!(spans[0].identity, spans[1].identity);
        assert!(find_duplicate_identity(spans.iter().map(|s| &s.identity)).is_none());
    }

    #[test]
    fn stable_identity_depends_on_collection() {
        let key = CompositeKey {
            unit_id: "u1".into(),
            error_type: "DEL".into(),
            full_match: "[DEL:ok]".into(),
            occurrence_index: 0,
        };
        assert_ne!(stable_identity("whisper", &key), stable_identity("phi4", &key));
        assert_eq!(stable_identity("whisper", &key).as_str().len(), 64);
    }

    #[test]
    fn stable_identity_fields_do_not_run_together() {
        let a = CompositeKey {
            unit_id: "u1".into(),
            error_type: "DEL".into(),
            full_match: "x".into(),
            occurrence_index: 1,
        };
        let b = CompositeKey {
            unit_id: "u1D".into(),
            error_type: "EL".into(),
            full_match: "x".into(),
            occurrence_index: 1,
        };
        assert_ne!(stable_identity("c", &a), stable_identity("c", &b));
    }

    #[test]
    fn opaque_mode_mints_distinct_tokens() {
        let assigner = IdentityAssigner::new(IdentityMode::Opaque);
        let spans = assigner.identify_spans("whisper", "u1", TEXT);
        assert_eq!(spans.len(), 3);
        assert!(find_duplicate_identity(spans.iter().map(|s| &s.identity)).is_none());
        assert!(uuid::Uuid::parse_str(spans[0].identity.as_str()).is_ok());
    }

    #[test]
    fn resolve_explicit_identity() {
        let spans = IdentityAssigner::new(IdentityMode::Opaque).identify_spans("c", "u1", TEXT);
        let wanted = spans[1].identity.clone();
        let found = resolve(&spans, "u1", &IdentityRef::Explicit(wanted)).unwrap();
        assert_eq!(found.span.occurrence_index, 1);
    }

    #[test]
    fn resolve_composite_key_to_persisted_identity() {
        let spans = IdentityAssigner::new(IdentityMode::Opaque).identify_spans("c", "u1", TEXT);
        let reference = IdentityRef::Composite(CompositeKey {
            unit_id: "u1".into(),
            error_type: "DEL".into(),
            full_match: "[DEL:ok]".into(),
            occurrence_index: 1,
        });
        let found = resolve(&spans, "u1", &reference).unwrap();
        assert_eq!(found.identity, spans[1].identity);
    }

    #[test]
    fn resolve_rejects_mismatched_composite() {
        let spans = IdentityAssigner::new(IdentityMode::Stable).identify_spans("c", "u1", TEXT);
        let wrong_position = IdentityRef::Composite(CompositeKey {
            unit_id: "u1".into(),
            error_type: "DEL".into(),
            full_match: "[DEL:ok]".into(),
            occurrence_index: 2,
        });
        assert!(resolve(&spans, "u1", &wrong_position).is_none());

        let wrong_unit = IdentityRef::Composite(CompositeKey {
            unit_id: "u2".into(),
            error_type: "DEL".into(),
            full_match: "[DEL:ok]".into(),
            occurrence_index: 0,
        });
        assert!(resolve(&spans, "u1", &wrong_unit).is_none());
    }

    #[test]
    fn resolve_unknown_explicit_identity() {
        let spans = IdentityAssigner::new(IdentityMode::Stable).identify_spans("c", "u1", TEXT);
        let reference = IdentityRef::Explicit(ErrorIdentity::new("nope"));
        assert!(resolve(&spans, "u1", &reference).is_none());
    }

    #[test]
    fn reference_prefers_explicit_identity() {
        let reference =
            IdentityRef::from_parts(Some("abc"), "u1", Some("DEL"), Some("[DEL:x]"), Some(0))
                .unwrap();
        assert_eq!(reference, IdentityRef::Explicit(ErrorIdentity::new("abc")));
    }

    #[test]
    fn reference_falls_back_to_composite_key() {
        let reference =
            IdentityRef::from_parts(Some("  "), "u1", Some("DEL"), Some("[DEL:x]"), Some(0))
                .unwrap();
        assert_matches!(reference, IdentityRef::Composite(key) if key.occurrence_index == 0);
    }

    #[test]
    fn reference_without_identity_is_rejected() {
        let err = IdentityRef::from_parts(None, "u1", Some("DEL"), Some("[DEL:x]"), None)
            .unwrap_err();
        assert!(err.to_string().contains("error_identity is required"));
    }

    #[test]
    fn identity_mode_parsing() {
        assert_eq!("stable".parse::<IdentityMode>().unwrap(), IdentityMode::Stable);
        assert_eq!(" OPAQUE ".parse::<IdentityMode>().unwrap(), IdentityMode::Opaque);
        assert!("random".parse::<IdentityMode>().is_err());
    }

    #[test]
    fn identified_span_serializes_flat() {
        let spans = IdentityAssigner::new(IdentityMode::Stable).identify_spans("c", "u1", "[INS:a]");
        let json = serde_json::to_value(&spans[0]).unwrap();
        assert!(json["identity"].is_string());
        assert_eq!(json["error_type"], "INS");
        assert_eq!(json["occurrence_index"], 0);
    }
}
