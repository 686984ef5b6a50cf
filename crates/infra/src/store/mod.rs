//! Persistence boundary for items, actors and the movement ledger.
//!
//! The Movement Service only talks to storage through these traits, so the
//! same orchestration runs against Postgres in production and the in-memory
//! store in tests.
//!
//! ## Transactions
//!
//! Every quantity change goes through a [`StoreTransaction`]. Implementations
//! must guarantee that, for a given item, the read done by
//! [`StoreTransaction::item_for_update`] and the later writes are serialized
//! against every other transaction touching the same item, and that nothing
//! written through the transaction is visible unless
//! [`StoreTransaction::commit`] succeeds.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use stockledger_core::{ActorId, EntryId, ItemId};
use stockledger_inventory::{Actor, HistoryFilter, Item, LedgerEntry};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryInventoryStore;
pub use postgres::PostgresInventoryStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The transaction lost a serialization race; retrying may succeed.
    #[error("transaction conflict: {0}")]
    Conflict(String),

    #[error("duplicate record: {0}")]
    Duplicate(String),

    /// A stored row could not be mapped back into the domain model.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Storage for items, actors and ledger history.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Open a transaction for a quantity-changing operation.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError>;

    async fn insert_item(&self, item: &Item) -> Result<(), StoreError>;
    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, StoreError>;
    /// Most recently created first.
    async fn list_items(&self) -> Result<Vec<Item>, StoreError>;
    /// Returns the updated item, or `None` if it does not exist.
    async fn update_label(&self, id: ItemId, label: &str) -> Result<Option<Item>, StoreError>;
    /// Remove an item record. Ledger entries that reference it are kept.
    /// Returns `false` if it did not exist.
    async fn delete_item(&self, id: ItemId) -> Result<bool, StoreError>;

    async fn insert_actor(&self, actor: &Actor) -> Result<(), StoreError>;
    async fn get_actor(&self, id: ActorId) -> Result<Option<Actor>, StoreError>;
    async fn list_actors(&self) -> Result<Vec<Actor>, StoreError>;

    /// Committed entries matching `filter`, newest first.
    async fn list_entries(&self, filter: &HistoryFilter) -> Result<Vec<LedgerEntry>, StoreError>;
    async fn get_entry(&self, id: EntryId) -> Result<Option<LedgerEntry>, StoreError>;
}

/// One atomic unit of work against the store.
///
/// Dropping a transaction without committing discards its writes.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Load an item and lock it until the transaction ends.
    async fn item_for_update(&mut self, id: ItemId) -> Result<Option<Item>, StoreError>;
    async fn actor_exists(&mut self, id: ActorId) -> Result<bool, StoreError>;
    async fn write_quantity(&mut self, id: ItemId, quantity: u64) -> Result<(), StoreError>;
    async fn append_entry(&mut self, entry: &LedgerEntry) -> Result<(), StoreError>;
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        (**self).begin().await
    }

    async fn insert_item(&self, item: &Item) -> Result<(), StoreError> {
        (**self).insert_item(item).await
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        (**self).get_item(id).await
    }

    async fn list_items(&self) -> Result<Vec<Item>, StoreError> {
        (**self).list_items().await
    }

    async fn update_label(&self, id: ItemId, label: &str) -> Result<Option<Item>, StoreError> {
        (**self).update_label(id, label).await
    }

    async fn delete_item(&self, id: ItemId) -> Result<bool, StoreError> {
        (**self).delete_item(id).await
    }

    async fn insert_actor(&self, actor: &Actor) -> Result<(), StoreError> {
        (**self).insert_actor(actor).await
    }

    async fn get_actor(&self, id: ActorId) -> Result<Option<Actor>, StoreError> {
        (**self).get_actor(id).await
    }

    async fn list_actors(&self) -> Result<Vec<Actor>, StoreError> {
        (**self).list_actors().await
    }

    async fn list_entries(&self, filter: &HistoryFilter) -> Result<Vec<LedgerEntry>, StoreError> {
        (**self).list_entries(filter).await
    }

    async fn get_entry(&self, id: EntryId) -> Result<Option<LedgerEntry>, StoreError> {
        (**self).get_entry(id).await
    }
}
