//! Store selection and service wiring.

use std::sync::Arc;

use anyhow::Context;

use stockledger_infra::{
    AppConfig, Catalog, HistoryQuery, InMemoryInventoryStore, InventoryStore, MovementService,
    PostgresInventoryStore,
};

type DynStore = Arc<dyn InventoryStore>;

/// Everything the handlers need, sharing one store.
#[derive(Clone)]
pub struct AppServices {
    pub movements: MovementService<DynStore>,
    pub history: HistoryQuery<DynStore>,
    pub catalog: Catalog<DynStore>,
}

impl AppServices {
    pub fn new(store: DynStore, movement_max_retries: u32) -> Self {
        Self {
            movements: MovementService::new(store.clone()).with_max_retries(movement_max_retries),
            history: HistoryQuery::new(store.clone()),
            catalog: Catalog::new(store),
        }
    }

    /// In-memory wiring (dev/test).
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryInventoryStore::new()),
            stockledger_infra::movement::DEFAULT_MAX_RETRIES,
        )
    }
}

/// Postgres when `DATABASE_URL` is set, otherwise in-memory.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let Some(url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set; using in-memory store (data is lost on exit)");
        return Ok(AppServices::new(
            Arc::new(InMemoryInventoryStore::new()),
            config.movement_max_retries,
        ));
    };

    let store = PostgresInventoryStore::connect(url, config.max_db_connections)
        .await
        .context("failed to connect to Postgres")?;
    store.migrate().await.context("failed to apply schema")?;
    tracing::info!(max_connections = config.max_db_connections, "using Postgres store");

    Ok(AppServices::new(Arc::new(store), config.movement_max_retries))
}
