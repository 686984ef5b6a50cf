//! Stock movement decision logic (entry/exit).
//!
//! [`plan_movement`] is pure: it takes the current item and a validated
//! quantity and returns the updated item plus the ledger entry to append, or
//! the reason the movement must be rejected. Applying the plan atomically is
//! the caller's job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockledger_core::{ActorId, Entity, EntryId, ItemId};

use crate::item::Item;
use crate::ledger::LedgerEntry;
use crate::quantity::{MAX_STOCK, Quantity};

/// Direction of a stock movement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Inbound stock.
    Entry,
    /// Outbound stock.
    Exit,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Entry => "entry",
            Operation::Exit => "exit",
        }
    }

    /// Lenient parse (case-insensitive). Unknown values yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "entry" => Some(Operation::Entry),
            "exit" => Some(Operation::Exit),
            _ => None,
        }
    }
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a movement was rejected. None of these leave any state behind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MovementError {
    #[error("item {0} not found")]
    NotFound(ItemId),

    #[error("field '{0}' is required")]
    MissingField(&'static str),

    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { available: u64, requested: u64 },

    #[error("actor {0} is not registered")]
    UnknownActor(ActorId),
}

/// Result of a committed movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementOutcome {
    pub entry_id: EntryId,
    pub item_id: ItemId,
    pub operation: Operation,
    pub quantity: Quantity,
    pub new_total: u64,
}

/// The writes a movement needs: the item's new state and the entry to append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementPlan {
    pub item: Item,
    pub entry: LedgerEntry,
}

impl MovementPlan {
    pub fn outcome(&self) -> MovementOutcome {
        MovementOutcome {
            entry_id: self.entry.id,
            item_id: self.entry.item_id,
            operation: self.entry.operation,
            quantity: self.entry.quantity,
            new_total: self.item.quantity(),
        }
    }
}

/// Decide the effect of moving `quantity` units of `item`.
///
/// The stock guard runs here, before anything is written: an exit larger than
/// the current quantity is rejected with the available amount attached.
pub fn plan_movement(
    item: &Item,
    operation: Operation,
    quantity: Quantity,
    actor_id: ActorId,
    recorded_at: DateTime<Utc>,
) -> Result<MovementPlan, MovementError> {
    let current = item.quantity();
    let units = quantity.get();

    let new_total = match operation {
        Operation::Entry => current
            .checked_add(units)
            .filter(|total| *total <= MAX_STOCK)
            .ok_or_else(|| {
                MovementError::InvalidQuantity(format!("stock would exceed {MAX_STOCK} units"))
            })?,
        Operation::Exit => current.checked_sub(units).ok_or(MovementError::InsufficientStock {
            available: current,
            requested: units,
        })?,
    };

    Ok(MovementPlan {
        item: item.with_quantity(new_total),
        entry: LedgerEntry {
            id: EntryId::new(),
            item_id: item.id(),
            actor_id,
            operation,
            quantity,
            recorded_at,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn item_with(quantity: u64) -> Item {
        Item::new(ItemId::new(), "Widget", quantity, Utc::now()).unwrap()
    }

    fn qty(units: u64) -> Quantity {
        Quantity::new(units).unwrap()
    }

    #[test]
    fn entry_adds_to_stock_and_records_entry() {
        let item = item_with(10);
        let actor = ActorId::new();

        let plan = plan_movement(&item, Operation::Entry, qty(5), actor, Utc::now()).unwrap();

        assert_eq!(plan.item.quantity(), 15);
        assert_eq!(plan.entry.operation, Operation::Entry);
        assert_eq!(plan.entry.quantity.get(), 5);
        assert_eq!(plan.entry.item_id, item.id());
        assert_eq!(plan.entry.actor_id, actor);
        assert_eq!(plan.outcome().new_total, 15);
    }

    #[test]
    fn exit_beyond_stock_reports_available_amount() {
        let item = item_with(15);
        let err = plan_movement(&item, Operation::Exit, qty(20), ActorId::new(), Utc::now()).unwrap_err();
        assert_eq!(
            err,
            MovementError::InsufficientStock {
                available: 15,
                requested: 20
            }
        );
    }

    #[test]
    fn exit_of_entire_stock_reaches_zero() {
        let item = item_with(15);
        let plan = plan_movement(&item, Operation::Exit, qty(15), ActorId::new(), Utc::now()).unwrap();
        assert_eq!(plan.item.quantity(), 0);
    }

    #[test]
    fn entry_past_max_stock_is_invalid() {
        let item = item_with(MAX_STOCK);
        let err = plan_movement(&item, Operation::Entry, qty(1), ActorId::new(), Utc::now()).unwrap_err();
        assert!(matches!(err, MovementError::InvalidQuantity(_)));

        let item = item_with(MAX_STOCK - 1);
        let plan = plan_movement(&item, Operation::Entry, qty(1), ActorId::new(), Utc::now()).unwrap();
        assert_eq!(plan.item.quantity(), MAX_STOCK);
    }

    #[test]
    fn planning_does_not_touch_the_input_item() {
        let item = item_with(3);
        let _ = plan_movement(&item, Operation::Exit, qty(2), ActorId::new(), Utc::now()).unwrap();
        assert_eq!(item.quantity(), 3);
    }

    #[test]
    fn operation_parse_is_lenient() {
        assert_eq!(Operation::parse(" Entry "), Some(Operation::Entry));
        assert_eq!(Operation::parse("exit"), Some(Operation::Exit));
        assert_eq!(Operation::parse("saida"), None);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: an entry followed by an exit of the same amount restores the quantity.
        #[test]
        fn entry_then_exit_round_trips(start in 0u64..1_000_000, units in 1u64..1_000_000) {
            let actor = ActorId::new();
            let item = item_with(start);

            let after_entry = plan_movement(&item, Operation::Entry, qty(units), actor, Utc::now()).unwrap();
            let after_exit = plan_movement(&after_entry.item, Operation::Exit, qty(units), actor, Utc::now()).unwrap();

            prop_assert_eq!(after_exit.item.quantity(), start);
        }

        /// Property: an exit larger than the stock is always rejected.
        #[test]
        fn oversized_exit_is_rejected(start in 0u64..1_000_000, extra in 1u64..1_000_000) {
            let item = item_with(start);
            let requested = start + extra;

            let err = plan_movement(&item, Operation::Exit, qty(requested), ActorId::new(), Utc::now()).unwrap_err();

            prop_assert_eq!(err, MovementError::InsufficientStock { available: start, requested });
        }

        /// Property: whatever sequence of movements is applied, stock never goes negative
        /// and always equals entries minus accepted exits.
        #[test]
        fn stock_tracks_accepted_movements(moves in prop::collection::vec((any::<bool>(), 1u64..500), 1..40)) {
            let mut item = item_with(0);
            let mut expected: u64 = 0;

            for (is_entry, units) in moves {
                let op = if is_entry { Operation::Entry } else { Operation::Exit };
                match plan_movement(&item, op, qty(units), ActorId::new(), Utc::now()) {
                    Ok(plan) => {
                        if is_entry { expected += units } else { expected -= units }
                        item = plan.item;
                    }
                    Err(MovementError::InsufficientStock { available, requested }) => {
                        prop_assert!(!is_entry);
                        prop_assert!(requested > available);
                    }
                    Err(other) => prop_assert!(false, "unexpected error {:?}", other),
                }
                prop_assert_eq!(item.quantity(), expected);
            }
        }
    }
}
