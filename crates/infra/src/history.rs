//! Read-only access to the movement ledger.

use thiserror::Error;
use tracing::instrument;

use stockledger_core::EntryId;
use stockledger_inventory::{HistoryFilter, LedgerEntry, sort_most_recent_first};

use crate::store::{InventoryStore, StoreError};

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("ledger entry {0} not found")]
    NotFound(EntryId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Query facade over committed ledger entries. Has no write path.
#[derive(Debug, Clone)]
pub struct HistoryQuery<S> {
    store: S,
}

impl<S> HistoryQuery<S>
where
    S: InventoryStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Entries matching every supplied filter, most recent first.
    #[instrument(skip(self), err)]
    pub async fn list_history(&self, filter: &HistoryFilter) -> Result<Vec<LedgerEntry>, HistoryError> {
        let mut entries = self.store.list_entries(filter).await?;

        // Stores already filter and order; enforce both regardless of backend.
        entries.retain(|e| filter.matches(e));
        sort_most_recent_first(&mut entries);
        Ok(entries)
    }

    #[instrument(skip(self), err)]
    pub async fn get_history_entry(&self, id: EntryId) -> Result<LedgerEntry, HistoryError> {
        self.store
            .get_entry(id)
            .await?
            .ok_or(HistoryError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use stockledger_core::{ActorId, Entity, ItemId};
    use stockledger_inventory::{Actor, Item, Operation, RawQuantity};

    use super::*;
    use crate::movement::{ApplyMovement, MovementService};
    use crate::store::InMemoryInventoryStore;

    struct Seeded {
        query: HistoryQuery<InMemoryInventoryStore>,
        widget: ItemId,
        bolt: ItemId,
        maria: ActorId,
        joao: ActorId,
    }

    /// widget: +5 (maria), -2 (joao); bolt: +1 (joao)
    async fn seeded() -> Seeded {
        let store = InMemoryInventoryStore::new();
        let widget = Item::new(ItemId::new(), "Widget", 0, Utc::now()).unwrap();
        let bolt = Item::new(ItemId::new(), "Bolt", 0, Utc::now()).unwrap();
        let maria = Actor::new(ActorId::new(), "Maria", Utc::now()).unwrap();
        let joao = Actor::new(ActorId::new(), "Joao", Utc::now()).unwrap();
        for item in [&widget, &bolt] {
            store.insert_item(item).await.unwrap();
        }
        for actor in [&maria, &joao] {
            store.insert_actor(actor).await.unwrap();
        }

        let service = MovementService::new(store.clone());
        let mv = |item_id, actor_id, q: u64| ApplyMovement {
            item_id,
            actor_id,
            quantity: RawQuantity::from(q),
        };
        service.apply_entry(mv(widget.id(), maria.id, 5)).await.unwrap();
        service.apply_exit(mv(widget.id(), joao.id, 2)).await.unwrap();
        service.apply_entry(mv(bolt.id(), joao.id, 1)).await.unwrap();

        Seeded {
            query: HistoryQuery::new(store),
            widget: widget.id(),
            bolt: bolt.id(),
            maria: maria.id,
            joao: joao.id,
        }
    }

    #[tokio::test]
    async fn unfiltered_history_is_most_recent_first() {
        let s = seeded().await;
        let all = s.query.list_history(&HistoryFilter::default()).await.unwrap();

        assert_eq!(all.len(), 3);
        assert_eq!(all[0].item_id, s.bolt);
        assert_eq!(all[1].operation, Operation::Exit);
        assert_eq!(all[2].operation, Operation::Entry);
        assert!(all.windows(2).all(|w| w[0].recorded_at >= w[1].recorded_at));
    }

    #[tokio::test]
    async fn filters_are_conjunctive() {
        let s = seeded().await;

        let by_item = HistoryFilter {
            item_id: Some(s.widget),
            ..Default::default()
        };
        assert_eq!(s.query.list_history(&by_item).await.unwrap().len(), 2);

        let by_item_and_op = HistoryFilter {
            operation: Some(Operation::Entry),
            ..by_item
        };
        let hits = s.query.list_history(&by_item_and_op).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].actor_id, s.maria);

        let by_actor = HistoryFilter {
            actor_id: Some(s.joao),
            ..Default::default()
        };
        assert_eq!(s.query.list_history(&by_actor).await.unwrap().len(), 2);

        let nothing = HistoryFilter {
            actor_id: Some(s.maria),
            item_id: Some(s.bolt),
            ..Default::default()
        };
        assert!(s.query.list_history(&nothing).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_operation_filter_is_ignored() {
        let s = seeded().await;
        let filter = HistoryFilter::from_params(None, Some("transfer"), None).unwrap();
        assert_eq!(s.query.list_history(&filter).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn entries_are_fetched_by_id() {
        let s = seeded().await;
        let first = s.query.list_history(&HistoryFilter::default()).await.unwrap()[0].clone();

        assert_eq!(s.query.get_history_entry(first.id).await.unwrap(), first);

        let missing = EntryId::new();
        assert!(matches!(
            s.query.get_history_entry(missing).await,
            Err(HistoryError::NotFound(id)) if id == missing
        ));
    }
}
