//! Transaction view over a working copy of the world state.
//!
//! A `Transaction` owns a clone of the committed state; every port read and
//! write operates on that clone. The engine swaps the clone back in only
//! when the whole operation succeeds, which gives the rollback guarantee
//! the lifecycle and recalculation operations rely on.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use stockline_availability::{
    AvailabilityStore, ChangedEntities, RecalculationOutcome, RecalculationPipeline, Recalculator,
};
use stockline_catalog::{
    Addon, AddonId, LocationAddon, LocationAddonId, LocationProduct, LocationProductId, Variant,
    VariantId,
};
use stockline_core::{DomainError, DomainResult, LocationId, WarehouseId};
use stockline_fulfillment::{FulfillmentStore, StockRequest, StockRequestId};
use stockline_orders::{Order, OrderId};
use stockline_stock::{
    IngredientId, IngredientStock, Material, MaterialId, ProvisionId, WarehouseStock,
};

use super::world::WorldState;

pub struct Transaction {
    world: WorldState,
}

impl Transaction {
    pub(super) fn new(world: WorldState) -> Self {
        Self { world }
    }

    pub(super) fn into_world(self) -> WorldState {
        self.world
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut WorldState {
        &mut self.world
    }

    pub fn order(&self, id: OrderId) -> DomainResult<Order> {
        self.world.orders.get(&id).cloned().ok_or(DomainError::NotFound)
    }

    pub fn save_order(&mut self, order: Order) {
        self.world.orders.insert(order.id, order);
    }

    /// Deduct location ingredient stock, returning the entry after the
    /// deduction for low-stock checks.
    pub fn deduct_ingredient_stock(
        &mut self,
        location_id: LocationId,
        ingredient_id: IngredientId,
        quantity: f64,
    ) -> DomainResult<IngredientStock> {
        let entry = self
            .world
            .ingredient_stock
            .entry((location_id, ingredient_id))
            .or_insert(IngredientStock {
                location_id,
                ingredient_id,
                quantity: 0.0,
                low_stock_threshold: 0.0,
            });
        entry.deduct(quantity)?;
        Ok(entry.clone())
    }

    /// Drain `volume` of a provision from the location's eligible batches,
    /// oldest first. Fully drained batches are marked empty. Fails when the
    /// eligible batches cannot cover the volume.
    pub fn drain_provision(
        &mut self,
        location_id: LocationId,
        provision_id: ProvisionId,
        volume: f64,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let mut batch_ids: Vec<_> = self
            .world
            .provision_batches
            .values()
            .filter(|b| {
                b.location_id == location_id
                    && b.provision_id == provision_id
                    && b.is_eligible(now)
            })
            .map(|b| (b.created_at, b.id))
            .collect();
        batch_ids.sort_by_key(|(created_at, _)| *created_at);

        let mut remaining = volume;
        for (_, batch_id) in batch_ids {
            if remaining <= 0.0 {
                break;
            }
            if let Some(batch) = self.world.provision_batches.get_mut(&batch_id) {
                remaining -= batch.drain(remaining);
            }
        }
        if remaining > 0.0 {
            return Err(DomainError::insufficient_stock(format!(
                "provision {provision_id} at location {location_id}: short {remaining:.2} of {volume:.2}"
            )));
        }
        Ok(())
    }
}

impl AvailabilityStore for Transaction {
    fn location_products(&self, location_id: LocationId) -> DomainResult<Vec<LocationProduct>> {
        Ok(self
            .world
            .location_products
            .values()
            .filter(|p| p.location_id == location_id)
            .cloned()
            .collect())
    }

    fn location_addons(&self, location_id: LocationId) -> DomainResult<Vec<LocationAddon>> {
        Ok(self
            .world
            .location_addons
            .values()
            .filter(|a| a.location_id == location_id)
            .cloned()
            .collect())
    }

    fn location_product(&self, id: LocationProductId) -> DomainResult<LocationProduct> {
        self.world
            .location_products
            .get(&id)
            .cloned()
            .ok_or(DomainError::NotFound)
    }

    fn location_addon(&self, id: LocationAddonId) -> DomainResult<LocationAddon> {
        self.world
            .location_addons
            .get(&id)
            .cloned()
            .ok_or(DomainError::NotFound)
    }

    fn variant(&self, id: VariantId) -> DomainResult<Variant> {
        self.world.variants.get(&id).cloned().ok_or(DomainError::NotFound)
    }

    fn addon(&self, id: AddonId) -> DomainResult<Addon> {
        self.world.addons.get(&id).cloned().ok_or(DomainError::NotFound)
    }

    fn active_orders(&self, location_id: LocationId) -> DomainResult<Vec<Order>> {
        Ok(self
            .world
            .orders
            .values()
            .filter(|o| o.location_id == location_id && !o.status.is_terminal())
            .cloned()
            .collect())
    }

    fn ingredient_stock_levels(
        &self,
        location_id: LocationId,
        ids: &HashSet<IngredientId>,
    ) -> DomainResult<HashMap<IngredientId, f64>> {
        Ok(ids
            .iter()
            .filter_map(|id| {
                self.world
                    .ingredient_stock
                    .get(&(location_id, *id))
                    .map(|s| (*id, s.quantity))
            })
            .collect())
    }

    fn eligible_provision_volumes(
        &self,
        location_id: LocationId,
        ids: &HashSet<ProvisionId>,
        now: DateTime<Utc>,
    ) -> DomainResult<HashMap<ProvisionId, f64>> {
        let mut volumes = HashMap::new();
        for batch in self.world.provision_batches.values() {
            if batch.location_id == location_id
                && ids.contains(&batch.provision_id)
                && batch.is_eligible(now)
            {
                *volumes.entry(batch.provision_id).or_insert(0.0) += batch.volume;
            }
        }
        Ok(volumes)
    }

    fn set_product_flags(
        &mut self,
        ids: &HashSet<LocationProductId>,
        out_of_stock: bool,
    ) -> DomainResult<Vec<LocationProductId>> {
        let mut changed = Vec::new();
        for id in ids {
            let product = self
                .world
                .location_products
                .get_mut(id)
                .ok_or(DomainError::NotFound)?;
            if product.out_of_stock != out_of_stock {
                product.out_of_stock = out_of_stock;
                changed.push(*id);
            }
        }
        Ok(changed)
    }

    fn set_addon_flags(
        &mut self,
        ids: &HashSet<LocationAddonId>,
        out_of_stock: bool,
    ) -> DomainResult<Vec<LocationAddonId>> {
        let mut changed = Vec::new();
        for id in ids {
            let addon = self
                .world
                .location_addons
                .get_mut(id)
                .ok_or(DomainError::NotFound)?;
            if addon.out_of_stock != out_of_stock {
                addon.out_of_stock = out_of_stock;
                changed.push(*id);
            }
        }
        Ok(changed)
    }
}

impl FulfillmentStore for Transaction {
    fn stock_request(&self, id: StockRequestId) -> DomainResult<StockRequest> {
        self.world
            .stock_requests
            .get(&id)
            .cloned()
            .ok_or(DomainError::NotFound)
    }

    fn save_stock_request(&mut self, request: &StockRequest) -> DomainResult<()> {
        self.world.stock_requests.insert(request.id, request.clone());
        Ok(())
    }

    fn delete_stock_request(&mut self, id: StockRequestId) -> DomainResult<()> {
        self.world
            .stock_requests
            .remove(&id)
            .ok_or(DomainError::NotFound)?;
        Ok(())
    }

    fn open_request(&self, location_id: LocationId) -> DomainResult<Option<StockRequest>> {
        Ok(self
            .world
            .stock_requests
            .values()
            .find(|r| r.location_id == location_id && !r.status.is_terminal())
            .cloned())
    }

    fn last_request_created_at(
        &self,
        location_id: LocationId,
    ) -> DomainResult<Option<DateTime<Utc>>> {
        Ok(self
            .world
            .stock_requests
            .values()
            .filter(|r| r.location_id == location_id)
            .map(|r| r.created_at)
            .max())
    }

    fn material(&self, id: MaterialId) -> DomainResult<Material> {
        self.world.materials.get(&id).cloned().ok_or(DomainError::NotFound)
    }

    fn deduct_warehouse_stock(
        &mut self,
        warehouse_id: WarehouseId,
        material_id: MaterialId,
        quantity: f64,
    ) -> DomainResult<f64> {
        let entry = self
            .world
            .warehouse_stock
            .entry((warehouse_id, material_id))
            .or_insert(WarehouseStock {
                warehouse_id,
                material_id,
                quantity: 0.0,
            });
        entry.deduct(quantity)?;
        Ok(entry.quantity)
    }

    fn credit_warehouse_stock(
        &mut self,
        warehouse_id: WarehouseId,
        material_id: MaterialId,
        quantity: f64,
    ) -> DomainResult<f64> {
        let entry = self
            .world
            .warehouse_stock
            .entry((warehouse_id, material_id))
            .or_insert(WarehouseStock {
                warehouse_id,
                material_id,
                quantity: 0.0,
            });
        entry.credit(quantity);
        Ok(entry.quantity)
    }

    fn credit_ingredient_stock(
        &mut self,
        location_id: LocationId,
        ingredient_id: IngredientId,
        quantity: f64,
    ) -> DomainResult<f64> {
        let entry = self
            .world
            .ingredient_stock
            .entry((location_id, ingredient_id))
            .or_insert(IngredientStock {
                location_id,
                ingredient_id,
                quantity: 0.0,
                low_stock_threshold: 0.0,
            });
        entry.credit(quantity);
        Ok(entry.quantity)
    }
}

impl Recalculator for Transaction {
    fn recalculate(
        &mut self,
        location_id: LocationId,
        changed: &ChangedEntities,
        now: DateTime<Utc>,
    ) -> DomainResult<RecalculationOutcome> {
        RecalculationPipeline::run(self, location_id, changed, now)
    }
}
