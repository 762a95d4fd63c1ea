//! Shared fixtures for store integration tests.

#![allow(dead_code)]

use errata_core::identity::{IdentityAssigner, IdentityMode};
use errata_core::import::parse_import_records;
use errata_core::roster::parse_roster;
use errata_db::models::annotation::AnnotationSubmission;
use errata_db::models::annotator::CreateAnnotator;
use errata_db::store::{AnnotationStore, MemoryStore, SqlStore};
use errata_db::workflow::import_collection;
use tempfile::TempDir;

pub const COLLECTION: &str = "whisper";

pub const UNITS_JSON: &str = r#"[
    {
        "utterance_id": "u1",
        "human_transcript": "take two tablets daily",
        "asr_transcript": "take tablets weekly",
        "asr_reconstructed": "take [DEL:two] tablets [SUB:daily->weekly]",
        "speaker": "S1"
    },
    {
        "utterance_id": "u2",
        "human_transcript": "ok x ok",
        "asr_transcript": "x",
        "asr_reconstructed": "[DEL:ok] x [DEL:ok]"
    },
    {
        "utterance_id": "u3",
        "human_transcript": "no errors here",
        "asr_transcript": "no errors here",
        "asr_reconstructed": "no errors here"
    }
]"#;

pub const ROSTER_JSON: &str = r#"{"annotators": [
    {"annotatorId": "A1", "name": "Ada", "email": "ada@example.org", "affiliation": "Clinic"},
    {"annotatorId": "A2", "name": "Grace", "email": "grace@example.org"}
]}"#;

pub fn memory_store() -> MemoryStore {
    MemoryStore::new()
}

/// SQLite store on a fresh file inside a temp dir. Keep the dir alive.
pub async fn sqlite_store() -> (SqlStore, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("errata.db").display());
    let store = SqlStore::connect(&url).await.unwrap();
    (store, dir)
}

pub fn roster() -> Vec<CreateAnnotator> {
    parse_roster(ROSTER_JSON)
        .unwrap()
        .into_iter()
        .map(CreateAnnotator::from)
        .collect()
}

/// Load the roster and import the fixture collection with opaque identities.
pub async fn seed(store: &dyn AnnotationStore) {
    store.load_roster(roster()).await.unwrap();
    let parsed = parse_import_records(UNITS_JSON).unwrap();
    import_collection(
        store,
        &IdentityAssigner::new(IdentityMode::Opaque),
        COLLECTION,
        parsed,
    )
    .await
    .unwrap();
}

/// Submission naming an occurrence by its explicit identity.
pub fn submission(unit_id: &str, identity: &str, severity: i64, tags: &[&str]) -> AnnotationSubmission {
    AnnotationSubmission {
        unit_id: unit_id.to_string(),
        error_identity: Some(identity.to_string()),
        taxonomy_tags: tags.iter().map(|t| t.to_string()).collect(),
        severity,
        ..Default::default()
    }
}

/// Identity of the `n`th span of a unit.
pub async fn identity_of(store: &dyn AnnotationStore, unit_id: &str, n: usize) -> String {
    let unit = store.find_unit(COLLECTION, unit_id).await.unwrap().unwrap();
    unit.spans[n].identity.as_str().to_string()
}
