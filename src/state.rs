use std::sync::Arc;

use crate::config::{AppConfig, StoreBackend};
use crate::database::store::Store;
use crate::database::{DatabaseError, DatabaseManager, MemoryStore, PgStore};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: AppConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Connect the backend selected by `config.server.store`
    pub async fn from_config(config: AppConfig) -> Result<Self, DatabaseError> {
        let store: Arc<dyn Store> = match config.server.store {
            StoreBackend::Postgres => {
                let pool = DatabaseManager::connect(&config.database).await?;
                Arc::new(PgStore::new(pool))
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store; data is lost on shutdown");
                Arc::new(MemoryStore::new())
            }
        };
        Ok(Self::new(store, config))
    }
}
