//! In-memory store with optional snapshot journaling.
//!
//! Without a journal every mutation is applied directly under the state
//! write lock. With a journal, writers are serialized through the journal
//! lock: the change is applied to a copy of the state, the copy is written
//! to a temp file next to the snapshot and renamed over it, and only then is
//! the copy published. A failed write therefore leaves both the file and
//! the in-memory state as they were.
//!
//! Cost: with a journal every write clones the whole state and rewrites the
//! whole snapshot, so a write is O(store size) and writes on unrelated keys
//! queue behind each other. Use the SQLite backend for large collections.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use errata_core::annotation::UpsertAction;
use errata_core::error::CoreError;
use errata_core::progress::ProgressReport;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use crate::models::annotation::{Annotation, NewAnnotation, UpsertOutcome};
use crate::models::annotator::{Annotator, CreateAnnotator};
use crate::models::progress::AnnotatorProgress;
use crate::models::source_unit::{ImportOutcome, NewSourceUnit, SourceUnit};
use crate::store::{AnnotationStore, StoreResult};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Everything the store holds. This is also the snapshot file format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MemoryState {
    #[serde(default)]
    units: BTreeMap<String, Vec<SourceUnit>>,
    #[serde(default)]
    annotators: BTreeMap<String, Annotator>,
    /// Insertion order is creation order.
    #[serde(default)]
    annotations: Vec<Annotation>,
    #[serde(default)]
    progress: Vec<AnnotatorProgress>,
    /// `(annotator_id, error_identity)` -> position in `annotations`.
    #[serde(skip)]
    index: HashMap<(String, String), usize>,
}

impl MemoryState {
    fn rebuild_index(&mut self) {
        self.index = self
            .annotations
            .iter()
            .enumerate()
            .map(|(i, a)| ((a.annotator_id.clone(), a.error_identity.clone()), i))
            .collect();
    }

    fn units(&self, collection_name: &str) -> &[SourceUnit] {
        self.units
            .get(collection_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn find_unit(&self, collection_name: &str, unit_id: &str) -> Option<&SourceUnit> {
        self.units(collection_name).iter().find(|u| u.unit_id == unit_id)
    }

    fn progress_mut(
        &mut self,
        annotator_id: &str,
        collection_name: &str,
    ) -> &mut AnnotatorProgress {
        let pos = self
            .progress
            .iter()
            .position(|p| p.annotator_id == annotator_id && p.collection_name == collection_name);
        let pos = match pos {
            Some(pos) => pos,
            None => {
                self.progress
                    .push(AnnotatorProgress::start(annotator_id, collection_name, Utc::now()));
                self.progress.len() - 1
            }
        };
        &mut self.progress[pos]
    }
}

/// Snapshot file plus the lock that serializes writers.
#[derive(Debug)]
struct Journal {
    path: PathBuf,
    lock: tokio::sync::Mutex<()>,
}

// ---------------------------------------------------------------------------
// Snapshot I/O
// ---------------------------------------------------------------------------

/// Write `bytes` to `path` atomically via a temp file in the same directory.
fn write_snapshot(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Read a snapshot. A missing file is an empty state; an unreadable one is
/// moved aside to `<path>.bak` and replaced by an empty state.
fn read_snapshot(path: &Path) -> StoreResult<MemoryState> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(MemoryState::default()),
        Err(e) => return Err(e.into()),
    };

    match serde_json::from_slice::<MemoryState>(&bytes) {
        Ok(mut state) => {
            state.rebuild_index();
            Ok(state)
        }
        Err(e) => {
            let mut backup = path.as_os_str().to_owned();
            backup.push(".bak");
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Snapshot is corrupt, moving it aside and starting empty"
            );
            std::fs::rename(path, &backup)?;
            Ok(MemoryState::default())
        }
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Store holding all state in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    journal: Option<Journal>,
}

impl MemoryStore {
    /// Volatile store. Nothing survives the process.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store journaled to `path`, loading the existing snapshot if any.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let state = read_snapshot(&path)?;
        tracing::info!(
            path = %path.display(),
            annotations = state.annotations.len(),
            "Memory store loaded snapshot"
        );
        Ok(Self {
            state: RwLock::new(state),
            journal: Some(Journal {
                path,
                lock: tokio::sync::Mutex::new(()),
            }),
        })
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.journal.as_ref().map(|j| j.path.as_path())
    }

    fn read_state(&self) -> StoreResult<RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|_| CoreError::Internal("memory store lock poisoned".to_string()).into())
    }

    fn write_state(&self) -> StoreResult<RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|_| CoreError::Internal("memory store lock poisoned".to_string()).into())
    }

    /// Apply `f` as one atomic mutation, persisting first when journaled.
    ///
    /// `f` must leave the state untouched when it returns an error.
    async fn mutate<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send,
        F: FnOnce(&mut MemoryState) -> StoreResult<T> + Send,
    {
        let Some(journal) = &self.journal else {
            let mut state = self.write_state()?;
            return f(&mut *state);
        };

        let _guard = journal.lock.lock().await;
        let mut draft = self.read_state()?.clone();
        let out = f(&mut draft)?;

        let bytes = serde_json::to_vec_pretty(&draft)?;
        let path = journal.path.clone();
        tokio::task::spawn_blocking(move || write_snapshot(&path, &bytes))
            .await
            .map_err(std::io::Error::other)??;

        *self.write_state()? = draft;
        Ok(out)
    }
}

#[async_trait]
impl AnnotationStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.read_state().map(|_| ())
    }

    async fn import_units(
        &self,
        collection_name: &str,
        units: Vec<NewSourceUnit>,
    ) -> StoreResult<ImportOutcome> {
        let now = Utc::now();
        self.mutate(move |state| {
            let stored = state.units.entry(collection_name.to_string()).or_default();
            let mut seen: HashSet<String> = stored.iter().map(|u| u.unit_id.clone()).collect();
            let offered = units.len();
            let mut loaded = 0;

            for unit in units {
                if !seen.insert(unit.unit_id.clone()) {
                    continue;
                }
                let position = stored.len() as i64;
                stored.push(unit.into_unit(position, now));
                loaded += 1;
            }

            let total = stored.len() as i64;
            if stored.is_empty() {
                state.units.remove(collection_name);
            }

            Ok(ImportOutcome {
                collection_name: collection_name.to_string(),
                loaded,
                skipped: offered - loaded,
                total,
            })
        })
        .await
    }

    async fn list_collections(&self) -> StoreResult<Vec<String>> {
        let state = self.read_state()?;
        Ok(state.units.keys().cloned().collect())
    }

    async fn list_units(&self, collection_name: &str) -> StoreResult<Vec<SourceUnit>> {
        Ok(self.read_state()?.units(collection_name).to_vec())
    }

    async fn unit_at(
        &self,
        collection_name: &str,
        index: i64,
    ) -> StoreResult<Option<SourceUnit>> {
        let state = self.read_state()?;
        let unit = usize::try_from(index)
            .ok()
            .and_then(|i| state.units(collection_name).get(i))
            .cloned();
        Ok(unit)
    }

    async fn find_unit(
        &self,
        collection_name: &str,
        unit_id: &str,
    ) -> StoreResult<Option<SourceUnit>> {
        Ok(self.read_state()?.find_unit(collection_name, unit_id).cloned())
    }

    async fn count_units(&self, collection_name: &str) -> StoreResult<i64> {
        Ok(self.read_state()?.units(collection_name).len() as i64)
    }

    async fn count_error_occurrences(&self, collection_name: &str) -> StoreResult<i64> {
        let state = self.read_state()?;
        Ok(state.units(collection_name).iter().map(|u| u.error_count).sum())
    }

    async fn load_roster(&self, annotators: Vec<CreateAnnotator>) -> StoreResult<usize> {
        let now = Utc::now();
        self.mutate(move |state| {
            let mut emails: HashMap<String, String> = state
                .annotators
                .values()
                .map(|a| (a.email.clone(), a.annotator_id.clone()))
                .collect();

            let mut fresh = Vec::new();
            for input in annotators {
                if state.annotators.contains_key(&input.annotator_id)
                    || fresh.iter().any(|a: &Annotator| a.annotator_id == input.annotator_id)
                {
                    continue;
                }
                if let Some(owner) = emails.get(&input.email) {
                    return Err(CoreError::Conflict(format!(
                        "Email '{}' is already registered to annotator '{owner}'",
                        input.email
                    ))
                    .into());
                }
                emails.insert(input.email.clone(), input.annotator_id.clone());
                fresh.push(Annotator {
                    annotator_id: input.annotator_id,
                    display_name: input.display_name,
                    email: input.email,
                    affiliation: input.affiliation,
                    created_at: now,
                });
            }

            let added = fresh.len();
            for annotator in fresh {
                state
                    .annotators
                    .insert(annotator.annotator_id.clone(), annotator);
            }
            Ok(added)
        })
        .await
    }

    async fn find_annotator(&self, annotator_id: &str) -> StoreResult<Option<Annotator>> {
        Ok(self.read_state()?.annotators.get(annotator_id).cloned())
    }

    async fn upsert_annotation(&self, new: NewAnnotation) -> StoreResult<UpsertOutcome> {
        self.mutate(move |state| {
            if !state.annotators.contains_key(&new.annotator_id) {
                return Err(CoreError::not_found("Annotator", &new.annotator_id).into());
            }
            if state.find_unit(&new.collection_name, &new.unit_id).is_none() {
                return Err(CoreError::not_found("SourceUnit", &new.unit_id).into());
            }

            let key = (
                new.annotator_id.clone(),
                new.error_identity.as_str().to_string(),
            );
            match state.index.get(&key).copied() {
                Some(i) => {
                    let existing = &mut state.annotations[i];
                    existing.revise(new);
                    Ok(UpsertOutcome {
                        action: UpsertAction::Updated,
                        annotation: existing.clone(),
                    })
                }
                None => {
                    let annotation = Annotation::create(new);
                    state.index.insert(key, state.annotations.len());
                    state.annotations.push(annotation.clone());
                    Ok(UpsertOutcome {
                        action: UpsertAction::Created,
                        annotation,
                    })
                }
            }
        })
        .await
    }

    async fn annotations_for(
        &self,
        annotator_id: &str,
        collection_name: Option<&str>,
    ) -> StoreResult<Vec<Annotation>> {
        let state = self.read_state()?;
        Ok(state
            .annotations
            .iter()
            .filter(|a| a.annotator_id == annotator_id)
            .filter(|a| collection_name.map_or(true, |c| a.collection_name == c))
            .cloned()
            .collect())
    }

    async fn annotations_for_unit(
        &self,
        collection_name: &str,
        unit_id: &str,
        annotator_id: Option<&str>,
    ) -> StoreResult<Vec<Annotation>> {
        let state = self.read_state()?;
        Ok(state
            .annotations
            .iter()
            .filter(|a| a.collection_name == collection_name && a.unit_id == unit_id)
            .filter(|a| annotator_id.map_or(true, |id| a.annotator_id == id))
            .cloned()
            .collect())
    }

    async fn annotations_in_collection(
        &self,
        collection_name: &str,
        annotator_id: Option<&str>,
    ) -> StoreResult<Vec<Annotation>> {
        let state = self.read_state()?;
        Ok(state
            .annotations
            .iter()
            .filter(|a| a.collection_name == collection_name)
            .filter(|a| annotator_id.map_or(true, |id| a.annotator_id == id))
            .cloned()
            .collect())
    }

    async fn count_for(&self, collection_name: &str) -> StoreResult<i64> {
        let state = self.read_state()?;
        let count = state
            .annotations
            .iter()
            .filter(|a| a.collection_name == collection_name)
            .count();
        Ok(count as i64)
    }

    async fn count_for_annotator(
        &self,
        annotator_id: &str,
        collection_name: &str,
    ) -> StoreResult<i64> {
        let state = self.read_state()?;
        let count = state
            .annotations
            .iter()
            .filter(|a| a.annotator_id == annotator_id && a.collection_name == collection_name)
            .count();
        Ok(count as i64)
    }

    async fn find_progress(
        &self,
        annotator_id: &str,
        collection_name: &str,
    ) -> StoreResult<Option<AnnotatorProgress>> {
        let state = self.read_state()?;
        Ok(state
            .progress
            .iter()
            .find(|p| p.annotator_id == annotator_id && p.collection_name == collection_name)
            .cloned())
    }

    async fn get_or_create_progress(
        &self,
        annotator_id: &str,
        collection_name: &str,
    ) -> StoreResult<AnnotatorProgress> {
        if let Some(found) = self.find_progress(annotator_id, collection_name).await? {
            return Ok(found);
        }
        self.mutate(|state| Ok(state.progress_mut(annotator_id, collection_name).clone()))
            .await
    }

    async fn report_progress(
        &self,
        annotator_id: &str,
        collection_name: &str,
        report: &ProgressReport,
    ) -> StoreResult<AnnotatorProgress> {
        let now = Utc::now();
        self.mutate(|state| {
            let progress = state.progress_mut(annotator_id, collection_name);
            if let Some(index) = report.current_index {
                progress.current_index = index;
            }
            if let Some(completed) = &report.completed_unit_ids {
                progress.completed_unit_ids = Json(completed.clone());
            }
            progress.last_accessed = now;
            Ok(progress.clone())
        })
        .await
    }
}

