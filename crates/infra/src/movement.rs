//! Movement execution pipeline.
//!
//! ```text
//! ApplyMovement
//!   ↓
//! 1. Begin store transaction
//!   ↓
//! 2. Load + lock item (NotFound)
//!   ↓
//! 3. Validate quantity (MissingField / InvalidQuantity)
//!   ↓
//! 4. Resolve actor (UnknownActor)
//!   ↓
//! 5. Stamp `recorded_at`, plan movement (InsufficientStock)
//!   ↓
//! 6. Write quantity, append ledger entry, commit
//! ```
//!
//! Any failure before the commit rolls the transaction back, so the item and
//! the ledger are either both updated or both untouched. Serialization
//! conflicts reported by the store are retried a bounded number of times.
//!
//! The ledger timestamp is read while the item is locked and again on every
//! retry, so for a given item `recorded_at` order is commit order.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, instrument, warn};

use stockledger_core::{ActorId, ItemId};
use stockledger_inventory::{MovementError, MovementOutcome, Operation, RawQuantity, plan_movement};

use crate::store::{InventoryStore, StoreError, StoreTransaction};

pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// A request to move stock in or out of an item.
#[derive(Debug, Clone)]
pub struct ApplyMovement {
    pub item_id: ItemId,
    /// Already-authenticated acting identity.
    pub actor_id: ActorId,
    pub quantity: RawQuantity,
}

/// Source of ledger timestamps.
pub type Clock = fn() -> DateTime<Utc>;

#[derive(Debug, Error)]
pub enum ApplyError {
    /// The request was invalid for the current state. Nothing was written.
    #[error(transparent)]
    Rejected(#[from] MovementError),

    /// Storage failed. The transaction was rolled back.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Applies entries and exits against an [`InventoryStore`].
#[derive(Debug, Clone)]
pub struct MovementService<S> {
    store: S,
    max_retries: u32,
    clock: Clock,
}

impl<S> MovementService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            max_retries: DEFAULT_MAX_RETRIES,
            clock: Utc::now,
        }
    }

    /// Replace the wall clock used to stamp ledger entries.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Number of times a serialization conflict is retried before giving up.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S> MovementService<S>
where
    S: InventoryStore,
{
    pub async fn apply_entry(&self, cmd: ApplyMovement) -> Result<MovementOutcome, ApplyError> {
        self.apply(Operation::Entry, cmd).await
    }

    pub async fn apply_exit(&self, cmd: ApplyMovement) -> Result<MovementOutcome, ApplyError> {
        self.apply(Operation::Exit, cmd).await
    }

    #[instrument(
        skip(self, cmd),
        fields(
            operation = %operation,
            item_id = %cmd.item_id,
            actor_id = %cmd.actor_id
        ),
        err
    )]
    pub async fn apply(
        &self,
        operation: Operation,
        cmd: ApplyMovement,
    ) -> Result<MovementOutcome, ApplyError> {
        let mut attempt = 0;
        loop {
            match self.try_apply(operation, &cmd).await {
                Err(ApplyError::Store(StoreError::Conflict(msg))) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!(attempt, %msg, "movement hit a serialization conflict; retrying");
                }
                Ok(outcome) => {
                    info!(
                        entry_id = %outcome.entry_id,
                        quantity = outcome.quantity.get(),
                        new_total = outcome.new_total,
                        "movement committed"
                    );
                    return Ok(outcome);
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_apply(
        &self,
        operation: Operation,
        cmd: &ApplyMovement,
    ) -> Result<MovementOutcome, ApplyError> {
        let mut tx = self.store.begin().await?;

        match decide_and_write(tx.as_mut(), operation, cmd, self.clock).await {
            Ok(outcome) => {
                tx.commit().await?;
                Ok(outcome)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "rollback failed");
                }
                Err(e)
            }
        }
    }
}

async fn decide_and_write(
    tx: &mut dyn StoreTransaction,
    operation: Operation,
    cmd: &ApplyMovement,
    clock: Clock,
) -> Result<MovementOutcome, ApplyError> {
    let item = tx
        .item_for_update(cmd.item_id)
        .await?
        .ok_or(MovementError::NotFound(cmd.item_id))?;

    let quantity = cmd.quantity.parse()?;

    if !tx.actor_exists(cmd.actor_id).await? {
        return Err(MovementError::UnknownActor(cmd.actor_id).into());
    }

    let plan = plan_movement(&item, operation, quantity, cmd.actor_id, clock())?;

    tx.write_quantity(cmd.item_id, plan.item.quantity()).await?;
    tx.append_entry(&plan.entry).await?;

    Ok(plan.outcome())
}
