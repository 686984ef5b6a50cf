use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use stockledger_core::{ActorId, Entity, EntryId, ItemId};
use stockledger_inventory::{Actor, HistoryFilter, Item, LedgerEntry, sort_most_recent_first};

use super::{InventoryStore, StoreError, StoreTransaction};

#[derive(Debug, Default)]
struct State {
    items: HashMap<ItemId, Item>,
    actors: HashMap<ActorId, Actor>,
    /// Append order.
    ledger: Vec<LedgerEntry>,
}

/// In-memory inventory store.
///
/// Intended for tests/dev. A single mutex guards all state and a transaction
/// holds it until it ends, so movements are fully serialized.
#[derive(Debug, Default, Clone)]
pub struct InMemoryInventoryStore {
    state: Arc<Mutex<State>>,
    fail_next_append: Arc<AtomicBool>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next ledger append fail with `StoreError::Unavailable`.
    ///
    /// Lets tests exercise a failure between the quantity write and the
    /// ledger write.
    pub fn fail_next_append(&self) {
        self.fail_next_append.store(true, Ordering::SeqCst);
    }
}

fn insert_unique<E>(table: &mut HashMap<E::Id, E>, entity: &E, kind: &str) -> Result<(), StoreError>
where
    E: Entity + Clone,
    E::Id: Eq + Hash + core::fmt::Display,
{
    let id = entity.id();
    if table.contains_key(&id) {
        return Err(StoreError::Duplicate(format!("{kind} {id} already exists")));
    }
    table.insert(id, entity.clone());
    Ok(())
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let guard = self.state.clone().lock_owned().await;
        Ok(Box::new(InMemoryTransaction {
            guard,
            staged_quantities: HashMap::new(),
            staged_entries: Vec::new(),
            fail_next_append: self.fail_next_append.clone(),
        }))
    }

    async fn insert_item(&self, item: &Item) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        insert_unique(&mut state.items, item, "item")
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        Ok(self.state.lock().await.items.get(&id).cloned())
    }

    async fn list_items(&self) -> Result<Vec<Item>, StoreError> {
        let state = self.state.lock().await;
        let mut items: Vec<Item> = state.items.values().cloned().collect();
        items.sort_by(|a, b| b.created_at().cmp(&a.created_at()).then(b.id().cmp(&a.id())));
        Ok(items)
    }

    async fn update_label(&self, id: ItemId, label: &str) -> Result<Option<Item>, StoreError> {
        let mut state = self.state.lock().await;
        let Some(item) = state.items.get_mut(&id) else {
            return Ok(None);
        };
        *item = Item::restore(id, label.to_string(), item.quantity(), item.created_at());
        Ok(Some(item.clone()))
    }

    async fn delete_item(&self, id: ItemId) -> Result<bool, StoreError> {
        Ok(self.state.lock().await.items.remove(&id).is_some())
    }

    async fn insert_actor(&self, actor: &Actor) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        insert_unique(&mut state.actors, actor, "actor")
    }

    async fn get_actor(&self, id: ActorId) -> Result<Option<Actor>, StoreError> {
        Ok(self.state.lock().await.actors.get(&id).cloned())
    }

    async fn list_actors(&self) -> Result<Vec<Actor>, StoreError> {
        let state = self.state.lock().await;
        let mut actors: Vec<Actor> = state.actors.values().cloned().collect();
        actors.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(actors)
    }

    async fn list_entries(&self, filter: &HistoryFilter) -> Result<Vec<LedgerEntry>, StoreError> {
        let state = self.state.lock().await;
        let mut entries: Vec<LedgerEntry> = state
            .ledger
            .iter()
            .rev()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        sort_most_recent_first(&mut entries);
        Ok(entries)
    }

    async fn get_entry(&self, id: EntryId) -> Result<Option<LedgerEntry>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.ledger.iter().find(|e| e.id == id).cloned())
    }
}

struct InMemoryTransaction {
    guard: OwnedMutexGuard<State>,
    staged_quantities: HashMap<ItemId, u64>,
    staged_entries: Vec<LedgerEntry>,
    fail_next_append: Arc<AtomicBool>,
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    async fn item_for_update(&mut self, id: ItemId) -> Result<Option<Item>, StoreError> {
        let Some(item) = self.guard.items.get(&id) else {
            return Ok(None);
        };
        let quantity = self
            .staged_quantities
            .get(&id)
            .copied()
            .unwrap_or(item.quantity());
        Ok(Some(Item::restore(
            id,
            item.label().to_string(),
            quantity,
            item.created_at(),
        )))
    }

    async fn actor_exists(&mut self, id: ActorId) -> Result<bool, StoreError> {
        Ok(self.guard.actors.contains_key(&id))
    }

    async fn write_quantity(&mut self, id: ItemId, quantity: u64) -> Result<(), StoreError> {
        if !self.guard.items.contains_key(&id) {
            return Err(StoreError::Corrupt(format!("item {id} vanished mid-transaction")));
        }
        self.staged_quantities.insert(id, quantity);
        Ok(())
    }

    async fn append_entry(&mut self, entry: &LedgerEntry) -> Result<(), StoreError> {
        if self.fail_next_append.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected ledger failure".to_string()));
        }
        self.staged_entries.push(entry.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let InMemoryTransaction {
            mut guard,
            staged_quantities,
            staged_entries,
            ..
        } = *self;

        for (id, quantity) in staged_quantities {
            if let Some(item) = guard.items.get_mut(&id) {
                *item = Item::restore(id, item.label().to_string(), quantity, item.created_at());
            }
        }
        guard.ledger.extend(staged_entries);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}
