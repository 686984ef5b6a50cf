use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_core::{DomainError, DomainResult, Entity, ItemId};

use crate::quantity::MAX_STOCK;

/// A stock item.
///
/// `quantity` is unsigned, so the non-negative invariant holds by construction.
/// Once created, the quantity only changes through [`crate::plan_movement`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    label: String,
    quantity: u64,
    created_at: DateTime<Utc>,
}

impl Item {
    /// Create a new item with an opening quantity.
    pub fn new(
        id: ItemId,
        label: impl Into<String>,
        initial_quantity: u64,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let label = normalize_label(label.into())?;
        if initial_quantity > MAX_STOCK {
            return Err(DomainError::validation(format!(
                "initial quantity cannot exceed {MAX_STOCK}"
            )));
        }
        Ok(Self {
            id,
            label,
            quantity: initial_quantity,
            created_at,
        })
    }

    /// Rebuild an item from persisted state. Stores only.
    pub fn restore(id: ItemId, label: String, quantity: u64, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            label,
            quantity,
            created_at,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn rename(&mut self, label: impl Into<String>) -> DomainResult<()> {
        self.label = normalize_label(label.into())?;
        Ok(())
    }

    pub(crate) fn with_quantity(&self, quantity: u64) -> Self {
        Self {
            quantity,
            ..self.clone()
        }
    }
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> ItemId {
        self.id
    }
}

fn normalize_label(label: String) -> DomainResult<String> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("label cannot be empty"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_item_keeps_opening_quantity() {
        let item = Item::new(ItemId::new(), "Bolts", 12, Utc::now()).unwrap();
        assert_eq!(item.quantity(), 12);
        assert_eq!(item.label(), "Bolts");
    }

    #[test]
    fn blank_label_is_rejected() {
        let err = Item::new(ItemId::new(), "   ", 0, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn opening_quantity_is_capped() {
        assert!(Item::new(ItemId::new(), "Bolts", MAX_STOCK, Utc::now()).is_ok());
        let err = Item::new(ItemId::new(), "Bolts", MAX_STOCK + 1, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn rename_trims_and_validates() {
        let mut item = Item::new(ItemId::new(), "Bolts", 0, Utc::now()).unwrap();
        item.rename("  Nuts ").unwrap();
        assert_eq!(item.label(), "Nuts");
        assert!(item.rename("").is_err());
        assert_eq!(item.label(), "Nuts");
    }
}
