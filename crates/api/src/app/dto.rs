use serde::Deserialize;
use serde_json::{Value, json};

use stockledger_core::Entity;
use stockledger_inventory::{Actor, Item, LedgerEntry, RawQuantity};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub label: String,
    #[serde(default)]
    pub quantity: u64,
}

#[derive(Debug, Deserialize)]
pub struct RenameItemRequest {
    pub label: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterActorRequest {
    /// Defaults to a fresh id. Use the token subject to let that principal move stock.
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub item_id: Option<String>,
    pub operation: Option<String>,
    pub actor_id: Option<String>,
}

/// Pull `quantity` out of a movement body without judging its type.
///
/// An empty body, a non-object body and an object without the key all mean
/// the field is missing.
pub fn movement_quantity(body: Option<Value>) -> RawQuantity {
    match body {
        Some(Value::Object(mut fields)) => RawQuantity::from_json(fields.remove("quantity")),
        _ => RawQuantity::missing(),
    }
}

// -------------------------
// Response mapping
// -------------------------

pub fn item_to_json(item: &Item) -> Value {
    json!({
        "id": item.id().to_string(),
        "label": item.label(),
        "quantity": item.quantity(),
        "created_at": item.created_at().to_rfc3339(),
    })
}

pub fn actor_to_json(actor: &Actor) -> Value {
    json!({
        "id": actor.id.to_string(),
        "name": actor.name,
        "created_at": actor.created_at.to_rfc3339(),
    })
}

pub fn entry_to_json(entry: &LedgerEntry) -> Value {
    json!({
        "id": entry.id.to_string(),
        "item_id": entry.item_id.to_string(),
        "actor_id": entry.actor_id.to_string(),
        "operation": entry.operation.as_str(),
        "quantity": entry.quantity.get(),
        "recorded_at": entry.recorded_at.to_rfc3339(),
    })
}
