use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bims_core::{DomainError, DomainResult, ItemId};

/// Tracked inventory item.
///
/// `quantity` is mutated only by the ledger applier, never directly.
/// Deletion is soft (`deleted_at`) so movement history keeps a valid target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub name: String,
    pub category: String,
    /// Unit of measure ("pc", "box", "ream", ...).
    pub unit: String,
    pub quantity: i64,
    /// Reorder threshold; `quantity <= min_stock` flags the item as low.
    pub min_stock: i64,
    pub location: Option<String>,
    pub qr_code: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub category: String,
    pub unit: String,
    #[serde(default)]
    pub initial_quantity: i64,
    #[serde(default)]
    pub min_stock: i64,
    pub location: Option<String>,
    pub qr_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub min_stock: Option<i64>,
    pub location: Option<Option<String>>,
    pub qr_code: Option<Option<String>>,
}

impl InventoryItem {
    pub fn create(id: ItemId, new: NewItem, now: DateTime<Utc>) -> DomainResult<Self> {
        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if new.initial_quantity < 0 {
            return Err(DomainError::validation("initial_quantity cannot be negative"));
        }
        if new.min_stock < 0 {
            return Err(DomainError::validation("min_stock cannot be negative"));
        }

        Ok(Self {
            id,
            name,
            category: new.category.trim().to_string(),
            unit: new.unit.trim().to_string(),
            quantity: new.initial_quantity,
            min_stock: new.min_stock,
            location: new.location,
            qr_code: new.qr_code,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_update(&mut self, update: ItemUpdate, now: DateTime<Utc>) -> DomainResult<()> {
        if self.deleted_at.is_some() {
            return Err(DomainError::not_found());
        }
        if let Some(v) = update.name {
            let v = v.trim().to_string();
            if v.is_empty() {
                return Err(DomainError::validation("name cannot be empty"));
            }
            self.name = v;
        }
        if let Some(v) = update.category {
            self.category = v.trim().to_string();
        }
        if let Some(v) = update.unit {
            self.unit = v.trim().to_string();
        }
        if let Some(v) = update.min_stock {
            if v < 0 {
                return Err(DomainError::validation("min_stock cannot be negative"));
            }
            self.min_stock = v;
        }
        if let Some(v) = update.location {
            self.location = v;
        }
        if let Some(v) = update.qr_code {
            self.qr_code = v;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_stock
    }

    pub fn mark_deleted(&mut self, now: DateTime<Utc>) {
        self.deleted_at = Some(now);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_item() -> NewItem {
        NewItem {
            name: "Monobloc chair".to_string(),
            category: "furniture".to_string(),
            unit: "pc".to_string(),
            initial_quantity: 10,
            min_stock: 5,
            location: Some("storage room".to_string()),
            qr_code: None,
        }
    }

    #[test]
    fn create_rejects_negative_initial_quantity() {
        let mut new = new_item();
        new.initial_quantity = -1;
        let err = InventoryItem::create(ItemId::new(), new, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn low_stock_boundary_is_inclusive() {
        let mut item = InventoryItem::create(ItemId::new(), new_item(), Utc::now()).unwrap();
        assert!(!item.is_low_stock());
        item.quantity = 5;
        assert!(item.is_low_stock());
    }

    #[test]
    fn deleted_item_rejects_updates() {
        let mut item = InventoryItem::create(ItemId::new(), new_item(), Utc::now()).unwrap();
        item.mark_deleted(Utc::now());
        let err = item.apply_update(ItemUpdate::default(), Utc::now()).unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }
}
