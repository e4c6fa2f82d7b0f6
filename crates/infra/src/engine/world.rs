//! The complete persisted state backing the in-memory engine.

use std::collections::HashMap;

use stockline_catalog::{
    Addon, AddonId, LocationAddon, LocationAddonId, LocationProduct, LocationProductId, Variant,
    VariantId,
};
use stockline_core::{LocationId, WarehouseId};
use stockline_fulfillment::{StockRequest, StockRequestId};
use stockline_orders::{Order, OrderId};
use stockline_stock::{
    Ingredient, IngredientId, IngredientStock, Material, MaterialId, Provision, ProvisionBatch,
    ProvisionBatchId, ProvisionId, WarehouseStock,
};

/// Every table the engine persists. Cloning the whole state is what gives
/// transactions their rollback: a failed operation's working copy is simply
/// dropped.
#[derive(Debug, Clone, Default)]
pub struct WorldState {
    pub ingredients: HashMap<IngredientId, Ingredient>,
    pub provisions: HashMap<ProvisionId, Provision>,
    pub materials: HashMap<MaterialId, Material>,
    pub variants: HashMap<VariantId, Variant>,
    pub addons: HashMap<AddonId, Addon>,
    pub location_products: HashMap<LocationProductId, LocationProduct>,
    pub location_addons: HashMap<LocationAddonId, LocationAddon>,
    pub orders: HashMap<OrderId, Order>,
    pub ingredient_stock: HashMap<(LocationId, IngredientId), IngredientStock>,
    pub warehouse_stock: HashMap<(WarehouseId, MaterialId), WarehouseStock>,
    pub provision_batches: HashMap<ProvisionBatchId, ProvisionBatch>,
    pub stock_requests: HashMap<StockRequestId, StockRequest>,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    // Seed helpers, mostly for tests and benches.

    pub fn put_ingredient(&mut self, ingredient: Ingredient) {
        self.ingredients.insert(ingredient.id, ingredient);
    }

    pub fn put_provision(&mut self, provision: Provision) {
        self.provisions.insert(provision.id, provision);
    }

    pub fn put_material(&mut self, material: Material) {
        self.materials.insert(material.id, material);
    }

    pub fn put_variant(&mut self, variant: Variant) {
        self.variants.insert(variant.id, variant);
    }

    pub fn put_addon(&mut self, addon: Addon) {
        self.addons.insert(addon.id, addon);
    }

    pub fn put_location_product(&mut self, product: LocationProduct) {
        self.location_products.insert(product.id, product);
    }

    pub fn put_location_addon(&mut self, addon: LocationAddon) {
        self.location_addons.insert(addon.id, addon);
    }

    pub fn put_order(&mut self, order: Order) {
        self.orders.insert(order.id, order);
    }

    pub fn put_batch(&mut self, batch: ProvisionBatch) {
        self.provision_batches.insert(batch.id, batch);
    }

    pub fn set_ingredient_stock(
        &mut self,
        location_id: LocationId,
        ingredient_id: IngredientId,
        quantity: f64,
        low_stock_threshold: f64,
    ) {
        self.ingredient_stock.insert(
            (location_id, ingredient_id),
            IngredientStock {
                location_id,
                ingredient_id,
                quantity,
                low_stock_threshold,
            },
        );
    }

    pub fn set_warehouse_stock(
        &mut self,
        warehouse_id: WarehouseId,
        material_id: MaterialId,
        quantity: f64,
    ) {
        self.warehouse_stock.insert(
            (warehouse_id, material_id),
            WarehouseStock {
                warehouse_id,
                material_id,
                quantity,
            },
        );
    }

    pub fn ingredient_quantity(&self, location_id: LocationId, ingredient_id: IngredientId) -> f64 {
        self.ingredient_stock
            .get(&(location_id, ingredient_id))
            .map(|s| s.quantity)
            .unwrap_or(0.0)
    }

    pub fn warehouse_quantity(&self, warehouse_id: WarehouseId, material_id: MaterialId) -> f64 {
        self.warehouse_stock
            .get(&(warehouse_id, material_id))
            .map(|s| s.quantity)
            .unwrap_or(0.0)
    }
}
