//! Ledger entry types for the two shared mutable stock ledgers.
//!
//! All mutations to these entries happen through the fulfillment workflow or
//! order deduction, always inside a storage transaction.

use serde::{Deserialize, Serialize};

use stockline_core::{DomainError, DomainResult, LocationId, WarehouseId};

use crate::{IngredientId, MaterialId};

/// Physical ingredient stock held by a location (one entry per ingredient).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientStock {
    pub location_id: LocationId,
    pub ingredient_id: IngredientId,
    pub quantity: f64,
    /// At or below this level the location is notified to restock.
    pub low_stock_threshold: f64,
}

impl IngredientStock {
    pub fn credit(&mut self, quantity: f64) {
        self.quantity += quantity;
    }

    pub fn deduct(&mut self, quantity: f64) -> DomainResult<()> {
        if self.quantity < quantity {
            return Err(DomainError::insufficient_stock(format!(
                "ingredient {} at location {}: required {quantity:.2}, available {:.2}",
                self.ingredient_id, self.location_id, self.quantity
            )));
        }
        self.quantity -= quantity;
        Ok(())
    }

    pub fn is_low(&self) -> bool {
        self.quantity <= self.low_stock_threshold
    }
}

/// Material stock held by a central warehouse (one entry per material).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarehouseStock {
    pub warehouse_id: WarehouseId,
    pub material_id: MaterialId,
    pub quantity: f64,
}

impl WarehouseStock {
    pub fn credit(&mut self, quantity: f64) {
        self.quantity += quantity;
    }

    pub fn deduct(&mut self, quantity: f64) -> DomainResult<()> {
        if self.quantity < quantity {
            return Err(DomainError::insufficient_stock(format!(
                "material {} at warehouse {}: required {quantity:.2}, available {:.2}",
                self.material_id, self.warehouse_id, self.quantity
            )));
        }
        self.quantity -= quantity;
        Ok(())
    }
}
