use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use pvl_provenance::DEFAULT_APPEND_ATTEMPTS;
use pvl_store::{FileRecordStore, FileStoreConfig, InMemoryRecordStore, RecordStore, SyncMode};
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Largest accepted upload body.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub storage: StorageConfig,
    pub max_upload_bytes: usize,
    pub append_attempts: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            storage: StorageConfig::Memory,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            append_attempts: DEFAULT_APPEND_ATTEMPTS,
        }
    }
}

impl ServerConfig {
    /// Read a TOML config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }
}

/// Where records are kept.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StorageConfig {
    #[default]
    Memory,
    File {
        path: PathBuf,
        #[serde(default)]
        sync: SyncMode,
    },
}

impl StorageConfig {
    pub fn open(&self) -> ServerResult<Box<dyn RecordStore>> {
        match self {
            Self::Memory => Ok(Box::new(InMemoryRecordStore::new())),
            Self::File { path, sync } => {
                let store = FileRecordStore::open(path, FileStoreConfig { sync_mode: *sync })?;
                Ok(Box::new(store))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(c.storage, StorageConfig::Memory);
        assert_eq!(c.max_upload_bytes, 50 * 1024 * 1024);
        assert_eq!(c.append_attempts, 3);
    }

    #[test]
    fn parses_file_storage() {
        let c = ServerConfig::from_toml(
            r#"
            bind_addr = "0.0.0.0:9000"
            max_upload_bytes = 1024

            [storage]
            backend = "file"
            path = "/var/lib/pvl/ledger.log"
            sync = "os_default"
            "#,
        )
        .unwrap();

        assert_eq!(c.bind_addr.port(), 9000);
        assert_eq!(c.max_upload_bytes, 1024);
        assert_eq!(c.append_attempts, 3);
        assert_eq!(
            c.storage,
            StorageConfig::File {
                path: "/var/lib/pvl/ledger.log".into(),
                sync: SyncMode::OsDefault,
            }
        );
    }

    #[test]
    fn file_sync_defaults_to_every_write() {
        let c = ServerConfig::from_toml(
            r#"
            [storage]
            backend = "file"
            path = "ledger.log"
            "#,
        )
        .unwrap();
        assert!(matches!(
            c.storage,
            StorageConfig::File {
                sync: SyncMode::EveryWrite,
                ..
            }
        ));
    }

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(ServerConfig::from_toml("").unwrap(), ServerConfig::default());
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let err = ServerConfig::from_toml("[storage]\nbackend = \"s3\"\n").unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pvl.toml");
        std::fs::write(&path, "append_attempts = 7\n").unwrap();
        assert_eq!(ServerConfig::load(&path).unwrap().append_attempts, 7);
        assert!(ServerConfig::load(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn opens_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageConfig::File {
            path: dir.path().join("ledger.log"),
            sync: SyncMode::OsDefault,
        };
        let store = storage.open().unwrap();
        assert!(store.is_empty().unwrap());
    }
}
