//! Inventory domain module.
//!
//! Business rules for stock items and the movement ledger, implemented as
//! deterministic domain logic (no IO, no HTTP, no storage). Persistence and
//! transaction handling live in `stockledger-infra`.

pub mod actor;
pub mod item;
pub mod ledger;
pub mod movement;
pub mod quantity;

pub use actor::Actor;
pub use item::Item;
pub use ledger::{HistoryFilter, LedgerEntry, sort_most_recent_first};
pub use movement::{MovementError, MovementOutcome, MovementPlan, Operation, plan_movement};
pub use quantity::{MAX_STOCK, Quantity, RawQuantity};
