use std::sync::Arc;

use cashpoint_infra::{AppConfig, AtmConfig, AtmService, AtmStore, InMemoryAtmStore};

pub type SharedStore = Arc<dyn AtmStore>;

/// Everything handlers need, shared behind an `Arc` extension.
pub struct AppServices {
    atms: AtmService<SharedStore>,
}

impl AppServices {
    pub fn new(store: SharedStore, config: AtmConfig) -> Self {
        Self {
            atms: AtmService::new(store, config),
        }
    }

    pub fn in_memory(config: AtmConfig) -> Self {
        Self::new(Arc::new(InMemoryAtmStore::new()), config)
    }

    pub fn atms(&self) -> &AtmService<SharedStore> {
        &self.atms
    }
}

/// Pick the store backend from configuration.
///
/// Postgres is used when `DATABASE_URL` is set and the crate was built with the
/// `postgres` feature; otherwise state lives in memory for the process lifetime.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    #[cfg(feature = "postgres")]
    if let Some(url) = config.database_url.as_deref() {
        let store = cashpoint_infra::store::postgres::PostgresAtmStore::connect(url).await?;
        store.migrate().await?;
        tracing::info!("using postgres atm store");
        return Ok(AppServices::new(Arc::new(store), config.atm.clone()));
    }

    #[cfg(not(feature = "postgres"))]
    if config.database_url.is_some() {
        tracing::warn!("DATABASE_URL set but built without the `postgres` feature; ignoring it");
    }

    tracing::info!("using in-memory atm store");
    Ok(AppServices::in_memory(config.atm.clone()))
}
