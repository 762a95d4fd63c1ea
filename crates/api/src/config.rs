use std::path::PathBuf;

use errata_core::identity::IdentityMode;

/// Which [`AnnotationStore`](errata_db::store::AnnotationStore) backs the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Relational store in an SQLite database.
    Sqlite { database_url: String },
    /// In-process store, journaled to `snapshot_path` when set.
    Memory { snapshot_path: Option<PathBuf> },
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long in-flight requests may drain after a shutdown signal (default: `30`).
    pub shutdown_timeout_secs: u64,
    pub store: StoreBackend,
    /// How identities are minted at import (default: opaque).
    pub identity_mode: IdentityMode,
    /// Reject judgments with severity above zero and no tags (default: `true`).
    pub require_tags_for_severity: bool,
    /// Directory holding `<collection>_annotation_data.json` files.
    pub annotation_data_dir: PathBuf,
    /// Roster file loaded at startup.
    pub annotators_file: PathBuf,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                        |
    /// |-----------------------------|--------------------------------|
    /// | `HOST`                      | `0.0.0.0`                      |
    /// | `PORT`                      | `3000`                         |
    /// | `CORS_ORIGINS`              | `http://localhost:5173`        |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                           |
    /// | `SHUTDOWN_TIMEOUT_SECS`     | `30`                           |
    /// | `STORE_BACKEND`             | `sqlite` (or `memory`)         |
    /// | `DATABASE_URL`              | `sqlite://errata.db?mode=rwc`  |
    /// | `SNAPSHOT_PATH`             | unset (memory store only)      |
    /// | `IDENTITY_MODE`             | `opaque` (or `stable`)         |
    /// | `REQUIRE_TAGS_FOR_SEVERITY` | `true`                         |
    /// | `ANNOTATION_DATA_DIR`       | `data/annotation_data`         |
    /// | `ANNOTATORS_FILE`           | `data/annotators.json`         |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let store = match std::env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "sqlite".into())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "sqlite" => StoreBackend::Sqlite {
                database_url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite://errata.db?mode=rwc".into()),
            },
            "memory" => StoreBackend::Memory {
                snapshot_path: std::env::var("SNAPSHOT_PATH")
                    .ok()
                    .filter(|p| !p.trim().is_empty())
                    .map(PathBuf::from),
            },
            other => panic!("STORE_BACKEND must be 'sqlite' or 'memory', got '{other}'"),
        };

        let identity_mode: IdentityMode = std::env::var("IDENTITY_MODE")
            .unwrap_or_else(|_| "opaque".into())
            .parse()
            .expect("IDENTITY_MODE must be 'stable' or 'opaque'");

        let require_tags_for_severity = parse_bool(
            &std::env::var("REQUIRE_TAGS_FOR_SEVERITY").unwrap_or_else(|_| "true".into()),
        )
        .expect("REQUIRE_TAGS_FOR_SEVERITY must be true or false");

        let annotation_data_dir = std::env::var("ANNOTATION_DATA_DIR")
            .unwrap_or_else(|_| "data/annotation_data".into())
            .into();

        let annotators_file = std::env::var("ANNOTATORS_FILE")
            .unwrap_or_else(|_| "data/annotators.json".into())
            .into();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            store,
            identity_mode,
            require_tags_for_severity,
            annotation_data_dir,
            annotators_file,
        }
    }
}

/// Accepts `true/false`, `1/0`, `yes/no`, case-insensitive.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_values() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" 0 "), Some(false));
        assert_eq!(parse_bool("no"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
