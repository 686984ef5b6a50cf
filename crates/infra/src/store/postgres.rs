//! Postgres-backed inventory store.
//!
//! ## Transactions
//!
//! Movement transactions run at `SERIALIZABLE` isolation and lock the item row
//! with `SELECT ... FOR UPDATE`, so two exits against the same item can never
//! both read the same starting quantity.
//!
//! ## Error Mapping
//!
//! | SQLSTATE | StoreError | Scenario |
//! |----------|------------|----------|
//! | `40001` | `Conflict` | serialization failure, caller may retry |
//! | `40P01` | `Conflict` | deadlock detected, caller may retry |
//! | `23505` | `Duplicate` | unique violation (item/actor id reused) |
//! | other / pool errors | `Unavailable` | network, pool closed, etc. |

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use stockledger_core::{ActorId, Entity, EntryId, ItemId};
use stockledger_inventory::{Actor, HistoryFilter, Item, LedgerEntry, Operation, Quantity};

use super::{InventoryStore, StoreError, StoreTransaction};

const SCHEMA: &str = include_str!("../../migrations/0001_inventory.sql");

#[derive(Debug, Clone)]
pub struct PostgresInventoryStore {
    pool: Arc<PgPool>,
}

impl PostgresInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a connection pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create tables and indexes if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }
}

#[async_trait]
impl InventoryStore for PostgresInventoryStore {
    #[instrument(skip(self), err)]
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("set_isolation", e))?;

        Ok(Box::new(PostgresTransaction { tx }))
    }

    #[instrument(skip(self, item), fields(item_id = %item.id()), err)]
    async fn insert_item(&self, item: &Item) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO items (item_id, label, quantity, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(item.id().as_uuid())
        .bind(item.label())
        .bind(to_db_quantity(item.quantity())?)
        .bind(item.created_at())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_item", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT item_id, label, quantity, created_at
            FROM items
            WHERE item_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_item", e))?;

        row.as_ref().map(item_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_items(&self) -> Result<Vec<Item>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT item_id, label, quantity, created_at
            FROM items
            ORDER BY created_at DESC, item_id DESC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_items", e))?;

        rows.iter().map(item_from_row).collect()
    }

    #[instrument(skip(self, label), err)]
    async fn update_label(&self, id: ItemId, label: &str) -> Result<Option<Item>, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE items
            SET label = $2
            WHERE item_id = $1
            RETURNING item_id, label, quantity, created_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(label)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_label", e))?;

        row.as_ref().map(item_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn delete_item(&self, id: ItemId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM items WHERE item_id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_item", e))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, actor), fields(actor_id = %actor.id), err)]
    async fn insert_actor(&self, actor: &Actor) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO actors (actor_id, name, created_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(actor.id.as_uuid())
        .bind(&actor.name)
        .bind(actor.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_actor", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn get_actor(&self, id: ActorId) -> Result<Option<Actor>, StoreError> {
        let row = sqlx::query("SELECT actor_id, name, created_at FROM actors WHERE actor_id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_actor", e))?;

        row.as_ref().map(actor_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_actors(&self) -> Result<Vec<Actor>, StoreError> {
        let rows = sqlx::query("SELECT actor_id, name, created_at FROM actors ORDER BY name, actor_id")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_actors", e))?;

        rows.iter().map(actor_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn list_entries(&self, filter: &HistoryFilter) -> Result<Vec<LedgerEntry>, StoreError> {
        // NULL parameters disable the corresponding predicate.
        let rows = sqlx::query(
            r#"
            SELECT entry_id, item_id, actor_id, operation, quantity, recorded_at
            FROM ledger_entries
            WHERE ($1::uuid IS NULL OR item_id = $1)
              AND ($2::text IS NULL OR operation = $2)
              AND ($3::uuid IS NULL OR actor_id = $3)
            ORDER BY recorded_at DESC, seq DESC
            "#,
        )
        .bind(filter.item_id.map(Uuid::from))
        .bind(filter.operation.map(Operation::as_str))
        .bind(filter.actor_id.map(Uuid::from))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_entries", e))?;

        rows.iter().map(entry_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn get_entry(&self, id: EntryId) -> Result<Option<LedgerEntry>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT entry_id, item_id, actor_id, operation, quantity, recorded_at
            FROM ledger_entries
            WHERE entry_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_entry", e))?;

        row.as_ref().map(entry_from_row).transpose()
    }
}

struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PostgresTransaction {
    async fn item_for_update(&mut self, id: ItemId) -> Result<Option<Item>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT item_id, label, quantity, created_at
            FROM items
            WHERE item_id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("item_for_update", e))?;

        row.as_ref().map(item_from_row).transpose()
    }

    async fn actor_exists(&mut self, id: ActorId) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 FROM actors WHERE actor_id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("actor_exists", e))?;
        Ok(row.is_some())
    }

    async fn write_quantity(&mut self, id: ItemId, quantity: u64) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE items SET quantity = $2 WHERE item_id = $1")
            .bind(id.as_uuid())
            .bind(to_db_quantity(quantity)?)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("write_quantity", e))?;

        if result.rows_affected() != 1 {
            return Err(StoreError::Corrupt(format!("item {id} vanished mid-transaction")));
        }
        Ok(())
    }

    async fn append_entry(&mut self, entry: &LedgerEntry) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO ledger_entries (
                entry_id,
                item_id,
                actor_id,
                operation,
                quantity,
                recorded_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.item_id.as_uuid())
        .bind(entry.actor_id.as_uuid())
        .bind(entry.operation.as_str())
        .bind(to_db_quantity(entry.quantity.get())?)
        .bind(entry.recorded_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("append_entry", e))?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback", e))
    }
}

fn to_db_quantity(quantity: u64) -> Result<i64, StoreError> {
    i64::try_from(quantity)
        .map_err(|_| StoreError::Unavailable(format!("quantity {quantity} exceeds BIGINT range")))
}

fn from_db_quantity(column: &str, value: i64) -> Result<u64, StoreError> {
    u64::try_from(value).map_err(|_| StoreError::Corrupt(format!("negative {column}: {value}")))
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name)
        .map_err(|e| StoreError::Corrupt(format!("failed to read column '{name}': {e}")))
}

fn item_from_row(row: &PgRow) -> Result<Item, StoreError> {
    let id: Uuid = column(row, "item_id")?;
    let label: String = column(row, "label")?;
    let quantity: i64 = column(row, "quantity")?;
    let created_at: DateTime<Utc> = column(row, "created_at")?;
    Ok(Item::restore(
        ItemId::from_uuid(id),
        label,
        from_db_quantity("quantity", quantity)?,
        created_at,
    ))
}

fn actor_from_row(row: &PgRow) -> Result<Actor, StoreError> {
    let id: Uuid = column(row, "actor_id")?;
    Ok(Actor {
        id: ActorId::from_uuid(id),
        name: column(row, "name")?,
        created_at: column(row, "created_at")?,
    })
}

fn entry_from_row(row: &PgRow) -> Result<LedgerEntry, StoreError> {
    let operation: String = column(row, "operation")?;
    let operation = Operation::parse(&operation)
        .ok_or_else(|| StoreError::Corrupt(format!("unknown operation '{operation}'")))?;
    let quantity: i64 = column(row, "quantity")?;
    let quantity = Quantity::new(from_db_quantity("quantity", quantity)?)
        .ok_or_else(|| StoreError::Corrupt("ledger entry with zero quantity".to_string()))?;

    Ok(LedgerEntry {
        id: EntryId::from_uuid(column(row, "entry_id")?),
        item_id: ItemId::from_uuid(column(row, "item_id")?),
        actor_id: ActorId::from_uuid(column(row, "actor_id")?),
        operation,
        quantity,
        recorded_at: column(row, "recorded_at")?,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("40001") | Some("40P01") => StoreError::Conflict(msg),
                Some("23505") => StoreError::Duplicate(msg),
                _ => StoreError::Unavailable(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool timed out in {}", operation))
        }
        other => StoreError::Unavailable(format!("error in {}: {}", operation, other)),
    }
}
