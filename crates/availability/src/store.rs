//! Storage port for the recalculation pipeline.
//!
//! Implementations must serve every read from the same transaction/snapshot
//! that will apply the flag writes; otherwise a concurrently completing order
//! can produce a stale flag.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use stockline_catalog::{
    Addon, AddonId, LocationAddon, LocationAddonId, LocationProduct, LocationProductId, Variant,
    VariantId,
};
use stockline_core::{DomainResult, LocationId};
use stockline_orders::Order;
use stockline_stock::{IngredientId, ProvisionId};

use crate::changed::ChangedEntities;
use crate::pipeline::RecalculationOutcome;

/// Transaction-scoped reads and flag writes used by the pipeline.
pub trait AvailabilityStore {
    // Catalog reads.
    fn location_products(&self, location_id: LocationId) -> DomainResult<Vec<LocationProduct>>;
    fn location_addons(&self, location_id: LocationId) -> DomainResult<Vec<LocationAddon>>;
    fn location_product(&self, id: LocationProductId) -> DomainResult<LocationProduct>;
    fn location_addon(&self, id: LocationAddonId) -> DomainResult<LocationAddon>;
    fn variant(&self, id: VariantId) -> DomainResult<Variant>;
    fn addon(&self, id: AddonId) -> DomainResult<Addon>;

    // Order reads.
    /// Orders at the location whose status is non-terminal, with their lines.
    fn active_orders(&self, location_id: LocationId) -> DomainResult<Vec<Order>>;

    // Stock reads.
    /// Physical quantity per ingredient. Missing entries mean zero stock.
    fn ingredient_stock_levels(
        &self,
        location_id: LocationId,
        ids: &HashSet<IngredientId>,
    ) -> DomainResult<HashMap<IngredientId, f64>>;

    /// Summed volume of eligible (completed, unexpired at `now`) batches per
    /// provision. Missing entries mean zero available volume.
    fn eligible_provision_volumes(
        &self,
        location_id: LocationId,
        ids: &HashSet<ProvisionId>,
        now: DateTime<Utc>,
    ) -> DomainResult<HashMap<ProvisionId, f64>>;

    // Flag writes.
    /// Bulk-set `out_of_stock` on the given product wrappers, returning the
    /// IDs whose persisted flag actually changed. Must be idempotent.
    fn set_product_flags(
        &mut self,
        ids: &HashSet<LocationProductId>,
        out_of_stock: bool,
    ) -> DomainResult<Vec<LocationProductId>>;

    /// Bulk-set `out_of_stock` on the given add-on wrappers, returning the
    /// IDs whose persisted flag actually changed. Must be idempotent.
    fn set_addon_flags(
        &mut self,
        ids: &HashSet<LocationAddonId>,
        out_of_stock: bool,
    ) -> DomainResult<Vec<LocationAddonId>>;
}

/// Entry point for collaborators that need to refresh availability as part
/// of their own transaction (order status changes, stock receipts, catalog
/// edits).
pub trait Recalculator {
    fn recalculate(
        &mut self,
        location_id: LocationId,
        changed: &ChangedEntities,
        now: DateTime<Utc>,
    ) -> DomainResult<RecalculationOutcome>;
}
