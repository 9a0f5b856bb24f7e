use std::sync::Arc;

use pvl_ledger::{Ledger, LedgerWriter};
use pvl_provenance::ProvenanceService;
use pvl_store::RecordStore;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// Store handle the server runs on; the backend is picked by config.
pub type DynStore = Box<dyn RecordStore>;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger<DynStore>>,
    pub provenance: Arc<ProvenanceService<DynStore>>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Open the configured store and make sure it has a genesis record.
    pub fn open(config: ServerConfig) -> ServerResult<Self> {
        let store = config.storage.open()?;
        Self::with_store(config, store)
    }

    pub fn with_store(config: ServerConfig, store: DynStore) -> ServerResult<Self> {
        let ledger = Arc::new(Ledger::new(store));
        ledger.ensure_genesis().map_err(ServerError::from)?;
        let provenance = ProvenanceService::new(Arc::clone(&ledger))
            .with_append_attempts(config.append_attempts);
        Ok(Self {
            ledger,
            provenance: Arc::new(provenance),
            config: Arc::new(config),
        })
    }

    /// Run blocking ledger work off the async executor.
    pub async fn blocking<T, F>(&self, f: F) -> ServerResult<T>
    where
        F: FnOnce(&Self) -> ServerResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let state = self.clone();
        tokio::task::spawn_blocking(move || f(&state))
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?
    }
}
