//! Import records for source units.
//!
//! A collection is shipped as `<collection>_annotation_data.json` in the
//! annotation data directory: a JSON array of objects carrying at least an
//! utterance id and the marked-up transcript. Known fields are mapped onto
//! [`ImportRecord`]; every other field is kept as opaque metadata.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::types::Metadata;

/// File name suffix of a collection data file.
pub const DATA_FILE_SUFFIX: &str = "_annotation_data.json";

/// Maximum length of a collection name.
pub const MAX_COLLECTION_NAME_LENGTH: usize = 50;

const UNIT_ID_KEYS: &[&str] = &["utterance_id", "unit_id"];
const REFERENCE_KEYS: &[&str] = &["human_transcript", "reference_text"];
const RAW_TRANSCRIPT_KEYS: &[&str] = &["asr_transcript", "raw_transcript"];
const MARKED_TEXT_KEYS: &[&str] = &["asr_reconstructed", "marked_text"];

/// One source unit as delivered by the import adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub unit_id: String,
    pub reference_text: String,
    pub raw_transcript: String,
    pub marked_text: String,
    pub metadata: Metadata,
}

/// Records parsed from one data file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedImport {
    pub records: Vec<ImportRecord>,
    /// Items without a usable unit id.
    pub skipped: usize,
}

/// Validate a collection name: 1..=50 chars of `[A-Za-z0-9_.-]`.
pub fn validate_collection_name(name: &str) -> Result<(), CoreError> {
    if name.is_empty() || name.len() > MAX_COLLECTION_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "collection name must be 1 to {MAX_COLLECTION_NAME_LENGTH} characters"
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(CoreError::Validation(format!(
            "Invalid collection name '{name}'. Use letters, digits, '_', '-' or '.'"
        )));
    }
    if name.starts_with('.') {
        return Err(CoreError::Validation(format!(
            "Invalid collection name '{name}'. Must not start with '.'"
        )));
    }
    Ok(())
}

/// Path of the data file for `collection` inside `data_dir`.
pub fn data_file_path(data_dir: &Path, collection: &str) -> PathBuf {
    data_dir.join(format!("{collection}{DATA_FILE_SUFFIX}"))
}

/// Collection name encoded in a data file path, if it follows the naming rule.
pub fn collection_name_from_path(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let name = file_name.strip_suffix(DATA_FILE_SUFFIX)?;
    validate_collection_name(name).ok()?;
    Some(name.to_string())
}

/// List the collections that have a data file in `data_dir`, sorted.
///
/// A missing directory yields no collections.
pub fn discover_collections(data_dir: &Path) -> Result<Vec<String>, CoreError> {
    let entries = match std::fs::read_dir(data_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(CoreError::Internal(format!(
                "Failed to read data directory {}: {e}",
                data_dir.display()
            )))
        }
    };

    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| collection_name_from_path(&entry.path()))
        .collect();
    names.sort();
    Ok(names)
}

fn take_text(obj: &mut Metadata, keys: &[&str]) -> Option<String> {
    let mut found = None;
    for key in keys {
        if let Some(value) = obj.remove(*key) {
            if found.is_none() {
                found = match value {
                    Value::String(s) => Some(s),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                };
            }
        }
    }
    found
}

/// Parse the JSON array of a data file into import records.
///
/// Items that are not objects or carry no unit id are skipped and counted.
pub fn parse_import_records(json: &str) -> Result<ParsedImport, CoreError> {
    let items: Vec<Value> = serde_json::from_str(json)
        .map_err(|e| CoreError::Validation(format!("Invalid import data: {e}")))?;

    let mut records = Vec::with_capacity(items.len());
    let mut skipped = 0;

    for item in items {
        let Value::Object(mut obj) = item else {
            skipped += 1;
            continue;
        };
        let Some(unit_id) = take_text(&mut obj, UNIT_ID_KEYS)
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
        else {
            skipped += 1;
            continue;
        };

        records.push(ImportRecord {
            unit_id,
            reference_text: take_text(&mut obj, REFERENCE_KEYS).unwrap_or_default(),
            raw_transcript: take_text(&mut obj, RAW_TRANSCRIPT_KEYS).unwrap_or_default(),
            marked_text: take_text(&mut obj, MARKED_TEXT_KEYS).unwrap_or_default(),
            metadata: obj,
        });
    }

    Ok(ParsedImport { records, skipped })
}

/// Read and parse the data file of `collection` in `data_dir`.
pub fn load_collection_file(data_dir: &Path, collection: &str) -> Result<ParsedImport, CoreError> {
    validate_collection_name(collection)?;
    let path = data_file_path(data_dir, collection);
    let json = match std::fs::read_to_string(&path) {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CoreError::not_found("CollectionDataFile", collection));
        }
        Err(e) => {
            return Err(CoreError::Internal(format!(
                "Failed to read {}: {e}",
                path.display()
            )))
        }
    };
    parse_import_records(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn maps_known_fields_and_keeps_the_rest() {
        let json = r#"[{
            "utterance_id": "utt-1",
            "human_transcript": "take two tablets",
            "asr_transcript": "take tablets",
            "asr_reconstructed": "take [DEL:two] tablets",
            "speaker": "S1",
            "wer": 0.25
        }]"#;
        let parsed = parse_import_records(json).unwrap();
        assert_eq!(parsed.skipped, 0);
        let rec = &parsed.records[0];
        assert_eq!(rec.unit_id, "utt-1");
        assert_eq!(rec.reference_text, "take two tablets");
        assert_eq!(rec.raw_transcript, "take tablets");
        assert_eq!(rec.marked_text, "take [DEL:two] tablets");
        assert_eq!(rec.metadata.len(), 2);
        assert_eq!(rec.metadata["speaker"], "S1");
    }

    #[test]
    fn numeric_ids_become_strings() {
        let parsed = parse_import_records(r#"[{"utterance_id": 42, "asr_reconstructed": ""}]"#)
            .unwrap();
        assert_eq!(parsed.records[0].unit_id, "42");
    }

    #[test]
    fn items_without_id_are_skipped() {
        let json = r#"[{"asr_reconstructed": "x"}, {"utterance_id": " "}, 7, {"unit_id": "u"}]"#;
        let parsed = parse_import_records(json).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.skipped, 3);
    }

    #[test]
    fn non_array_is_invalid() {
        assert_matches!(parse_import_records("{}"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn collection_name_rules() {
        assert!(validate_collection_name("whisper").is_ok());
        assert!(validate_collection_name("phi4-mini_v1.2").is_ok());
        assert!(validate_collection_name("").is_err());
        assert!(validate_collection_name("../etc").is_err());
        assert!(validate_collection_name(".hidden").is_err());
        assert!(validate_collection_name("a b").is_err());
    }

    #[test]
    fn name_from_path() {
        let path = Path::new("/data/whisper_annotation_data.json");
        assert_eq!(collection_name_from_path(path), Some("whisper".to_string()));
        assert_eq!(collection_name_from_path(Path::new("/data/notes.json")), None);
    }

    #[test]
    fn discovers_data_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(data_file_path(dir.path(), "whisper"), "[]").unwrap();
        std::fs::write(data_file_path(dir.path(), "phi4"), "[]").unwrap();
        std::fs::write(dir.path().join("readme.txt"), "").unwrap();
        assert_eq!(discover_collections(dir.path()).unwrap(), vec!["phi4", "whisper"]);
        assert!(discover_collections(&dir.path().join("missing")).unwrap().is_empty());
    }

    #[test]
    fn missing_data_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        assert_matches!(
            load_collection_file(dir.path(), "whisper"),
            Err(CoreError::NotFound { .. })
        );
    }
}
