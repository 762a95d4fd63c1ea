use std::path::Path;
use std::sync::Arc;

use errata_core::annotation::ValidationPolicy;
use errata_core::identity::IdentityAssigner;
use errata_core::roster::load_roster_file;
use errata_db::models::annotator::CreateAnnotator;
use errata_db::store::{AnnotationStore, MemoryStore, SqlStore, StoreResult};

use crate::config::{ServerConfig, StoreBackend};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is `Copy`).
#[derive(Clone)]
pub struct AppState {
    /// The annotation store selected by configuration.
    pub store: Arc<dyn AnnotationStore>,
    pub config: Arc<ServerConfig>,
    /// Mints identities for imported units.
    pub assigner: IdentityAssigner,
    /// Rules applied to every submitted judgment.
    pub policy: ValidationPolicy,
    /// Serializes collection imports so positions are assigned in one pass.
    pub import_lock: Arc<tokio::sync::Mutex<()>>,
}

impl AppState {
    pub fn new(store: Arc<dyn AnnotationStore>, config: ServerConfig) -> Self {
        Self {
            store,
            assigner: IdentityAssigner::new(config.identity_mode),
            policy: ValidationPolicy {
                require_tags_for_severity: config.require_tags_for_severity,
            },
            config: Arc::new(config),
            import_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }
}

/// Open the store described by `backend`.
pub async fn open_store(backend: &StoreBackend) -> StoreResult<Arc<dyn AnnotationStore>> {
    let store: Arc<dyn AnnotationStore> = match backend {
        StoreBackend::Sqlite { database_url } => Arc::new(SqlStore::connect(database_url).await?),
        StoreBackend::Memory {
            snapshot_path: Some(path),
        } => Arc::new(MemoryStore::open(path)?),
        StoreBackend::Memory {
            snapshot_path: None,
        } => {
            tracing::warn!("Memory store has no SNAPSHOT_PATH, annotations will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };
    Ok(store)
}

/// Register every annotator of the roster file. Known ids are skipped.
pub async fn load_roster(store: &dyn AnnotationStore, path: &Path) -> StoreResult<usize> {
    let entries = load_roster_file(path)?;
    let offered = entries.len();
    let added = store
        .load_roster(entries.into_iter().map(CreateAnnotator::from).collect())
        .await?;
    tracing::info!(path = %path.display(), offered, added, "Roster loaded");
    Ok(added)
}
