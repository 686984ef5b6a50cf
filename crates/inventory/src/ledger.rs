//! Append-only movement ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_core::{ActorId, DomainResult, Entity, EntryId, ItemId};

use crate::movement::Operation;
use crate::quantity::Quantity;

/// One recorded stock movement. Never updated or deleted once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub item_id: ItemId,
    pub actor_id: ActorId,
    pub operation: Operation,
    pub quantity: Quantity,
    pub recorded_at: DateTime<Utc>,
}

impl Entity for LedgerEntry {
    type Id = EntryId;

    fn id(&self) -> EntryId {
        self.id
    }
}

/// Conjunctive filter over ledger history. `None` fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryFilter {
    pub item_id: Option<ItemId>,
    pub operation: Option<Operation>,
    pub actor_id: Option<ActorId>,
}

impl HistoryFilter {
    /// Build a filter from loosely-typed query parameters.
    ///
    /// Empty strings are treated as absent and an unrecognised operation is
    /// ignored. Malformed ids are an error.
    pub fn from_params(
        item_id: Option<&str>,
        operation: Option<&str>,
        actor_id: Option<&str>,
    ) -> DomainResult<Self> {
        Ok(Self {
            item_id: non_empty(item_id).map(str::parse::<ItemId>).transpose()?,
            operation: non_empty(operation).and_then(Operation::parse),
            actor_id: non_empty(actor_id).map(str::parse::<ActorId>).transpose()?,
        })
    }

    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        self.item_id.is_none_or(|id| entry.item_id == id)
            && self.operation.is_none_or(|op| entry.operation == op)
            && self.actor_id.is_none_or(|id| entry.actor_id == id)
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Order entries most recent first.
///
/// The sort is stable: entries with equal timestamps keep their relative
/// order, so a store that lists them newest-append-first stays that way.
pub fn sort_most_recent_first(entries: &mut [LedgerEntry]) {
    entries.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(item_id: ItemId, actor_id: ActorId, operation: Operation, at: DateTime<Utc>) -> LedgerEntry {
        LedgerEntry {
            id: EntryId::new(),
            item_id,
            actor_id,
            operation,
            quantity: Quantity::new(1).unwrap(),
            recorded_at: at,
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let e = entry(ItemId::new(), ActorId::new(), Operation::Exit, Utc::now());
        assert!(HistoryFilter::default().matches(&e));
    }

    #[test]
    fn filters_are_conjunctive() {
        let item = ItemId::new();
        let actor = ActorId::new();
        let e = entry(item, actor, Operation::Entry, Utc::now());

        let both = HistoryFilter {
            item_id: Some(item),
            operation: Some(Operation::Entry),
            actor_id: None,
        };
        assert!(both.matches(&e));

        let wrong_actor = HistoryFilter {
            actor_id: Some(ActorId::new()),
            ..both
        };
        assert!(!wrong_actor.matches(&e));
    }

    #[test]
    fn unknown_operation_and_blank_params_are_ignored() {
        let f = HistoryFilter::from_params(Some(""), Some("transfer"), Some("  ")).unwrap();
        assert_eq!(f, HistoryFilter::default());
    }

    #[test]
    fn malformed_item_id_is_rejected() {
        assert!(HistoryFilter::from_params(Some("42x"), None, None).is_err());
    }

    #[test]
    fn params_parse_into_typed_filter() {
        let item = ItemId::new();
        let f = HistoryFilter::from_params(Some(&item.to_string()), Some("EXIT"), None).unwrap();
        assert_eq!(f.item_id, Some(item));
        assert_eq!(f.operation, Some(Operation::Exit));
    }

    #[test]
    fn sorting_puts_latest_first_and_keeps_ties_stable() {
        let now = Utc::now();
        let item = ItemId::new();
        let actor = ActorId::new();
        let old = entry(item, actor, Operation::Entry, now - Duration::seconds(10));
        let tie_a = entry(item, actor, Operation::Entry, now);
        let tie_b = entry(item, actor, Operation::Exit, now);

        let mut entries = vec![old.clone(), tie_a.clone(), tie_b.clone()];
        sort_most_recent_first(&mut entries);

        assert_eq!(entries, vec![tie_a, tie_b, old]);
    }
}
