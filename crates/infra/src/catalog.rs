//! Item and actor registry operations.
//!
//! Nothing here can change an item's quantity after creation; that is the
//! Movement Service's job.

use chrono::Utc;
use thiserror::Error;
use tracing::{info, instrument};

use stockledger_core::{ActorId, DomainError, Entity, ItemId};
use stockledger_inventory::{Actor, Item};

use crate::store::{InventoryStore, StoreError};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error("item {0} not found")]
    ItemNotFound(ItemId),

    #[error("actor {0} not found")]
    ActorNotFound(ActorId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct Catalog<S> {
    store: S,
}

impl<S> Catalog<S>
where
    S: InventoryStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[instrument(skip(self, label), err)]
    pub async fn create_item(&self, label: &str, initial_quantity: u64) -> Result<Item, CatalogError> {
        let item = Item::new(ItemId::new(), label, initial_quantity, Utc::now())?;
        self.store.insert_item(&item).await?;
        info!(item_id = %item.id(), initial_quantity, "item created");
        Ok(item)
    }

    pub async fn get_item(&self, id: ItemId) -> Result<Item, CatalogError> {
        self.store
            .get_item(id)
            .await?
            .ok_or(CatalogError::ItemNotFound(id))
    }

    pub async fn list_items(&self) -> Result<Vec<Item>, CatalogError> {
        Ok(self.store.list_items().await?)
    }

    #[instrument(skip(self, label), err)]
    pub async fn rename_item(&self, id: ItemId, label: &str) -> Result<Item, CatalogError> {
        let mut item = self.get_item(id).await?;
        item.rename(label)?;
        self.store
            .update_label(id, item.label())
            .await?
            .ok_or(CatalogError::ItemNotFound(id))
    }

    /// Remove an item. Its movement history stays queryable.
    #[instrument(skip(self), err)]
    pub async fn delete_item(&self, id: ItemId) -> Result<(), CatalogError> {
        if !self.store.delete_item(id).await? {
            return Err(CatalogError::ItemNotFound(id));
        }
        info!(item_id = %id, "item deleted");
        Ok(())
    }

    /// Register an actor under a caller-chosen id (typically a token subject).
    #[instrument(skip(self, name), err)]
    pub async fn register_actor(&self, id: ActorId, name: &str) -> Result<Actor, CatalogError> {
        let actor = Actor::new(id, name, Utc::now())?;
        self.store.insert_actor(&actor).await?;
        info!(actor_id = %id, "actor registered");
        Ok(actor)
    }

    pub async fn get_actor(&self, id: ActorId) -> Result<Actor, CatalogError> {
        self.store
            .get_actor(id)
            .await?
            .ok_or(CatalogError::ActorNotFound(id))
    }

    pub async fn list_actors(&self) -> Result<Vec<Actor>, CatalogError> {
        Ok(self.store.list_actors().await?)
    }
}
