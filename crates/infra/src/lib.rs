//! Infrastructure layer: storage, movement orchestration, queries and config.

pub mod catalog;
pub mod config;
pub mod history;
pub mod movement;
pub mod store;

pub use catalog::{Catalog, CatalogError};
pub use config::{AppConfig, ConfigError};
pub use history::{HistoryError, HistoryQuery};
pub use movement::{ApplyError, ApplyMovement, Clock, MovementService};
pub use store::{InMemoryInventoryStore, InventoryStore, PostgresInventoryStore, StoreError, StoreTransaction};
