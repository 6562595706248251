//! Cart aggregate
//!
//! One cart per user. Lines carry no price snapshot: the cart is priced live
//! from the catalog at read time, so a displayed total can move with the
//! catalog until checkout freezes it into an order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, Result};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cart {
    user_id: Uuid,
    items: Vec<CartItem>,
    updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CartItem {
    pub id: Uuid,
    pub variant_id: Uuid,
    pub quantity: u32,
    pub is_preorder: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Result of a quantity update: the line either survived with a new quantity
/// or was deleted because the quantity dropped to zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuantityChange {
    Updated,
    Removed,
}

impl Cart {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            items: vec![],
            updated_at: Utc::now(),
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, item_id: Uuid) -> Option<&CartItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    /// Quantity already in the cart for a (variant, preorder) combination.
    /// The stock ceiling applies to existing + requested, not requested alone.
    pub fn quantity_of(&self, variant_id: Uuid, is_preorder: bool) -> u32 {
        self.items
            .iter()
            .filter(|i| i.variant_id == variant_id && i.is_preorder == is_preorder)
            .map(|i| i.quantity)
            .sum()
    }

    /// Adds a line, merging into an existing (variant, preorder) row if one
    /// exists. At most one row per combination ever exists.
    pub fn add_item(
        &mut self,
        variant_id: Uuid,
        quantity: u32,
        is_preorder: bool,
        notes: Option<String>,
    ) -> Result<&CartItem> {
        if quantity < 1 {
            return Err(EngineError::InvalidQuantity);
        }
        let pos = self
            .items
            .iter()
            .position(|i| i.variant_id == variant_id && i.is_preorder == is_preorder);
        let idx = match pos {
            Some(idx) => {
                let existing = &mut self.items[idx];
                existing.quantity += quantity;
                if notes.is_some() {
                    existing.notes = notes;
                }
                idx
            }
            None => {
                self.items.push(CartItem {
                    id: Uuid::new_v4(),
                    variant_id,
                    quantity,
                    is_preorder,
                    notes,
                    created_at: Utc::now(),
                });
                self.items.len() - 1
            }
        };
        self.touch();
        Ok(&self.items[idx])
    }

    /// Sets an absolute quantity. Zero (callers clamp negatives to zero)
    /// deletes the line, same as `remove_item`.
    pub fn set_quantity(&mut self, item_id: Uuid, quantity: u32) -> Result<QuantityChange> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or(EngineError::NotFound)?;
        let change = if quantity == 0 {
            self.items.retain(|i| i.id != item_id);
            QuantityChange::Removed
        } else {
            item.quantity = quantity;
            QuantityChange::Updated
        };
        self.touch();
        Ok(change)
    }

    pub fn remove_item(&mut self, item_id: Uuid) -> Result<()> {
        let before = self.items.len();
        self.items.retain(|i| i.id != item_id);
        if self.items.len() == before {
            return Err(EngineError::NotFound);
        }
        self.touch();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
