//! Storage port for the request lifecycle.

use chrono::{DateTime, Utc};

use stockline_core::{DomainResult, LocationId, WarehouseId};
use stockline_stock::{IngredientId, Material, MaterialId};

use crate::request::{StockRequest, StockRequestId};

/// Transaction-scoped reads and writes used by the cart and lifecycle
/// services. Ledger mutations must be atomic with the request save that
/// accompanies them.
pub trait FulfillmentStore {
    fn stock_request(&self, id: StockRequestId) -> DomainResult<StockRequest>;
    fn save_stock_request(&mut self, request: &StockRequest) -> DomainResult<()>;
    fn delete_stock_request(&mut self, id: StockRequestId) -> DomainResult<()>;

    /// The location's current non-terminal request, if any. At most one can
    /// exist per location.
    fn open_request(&self, location_id: LocationId) -> DomainResult<Option<StockRequest>>;

    /// Creation timestamp of the most recently created request for the
    /// location, across all statuses. Drives the rate limit.
    fn last_request_created_at(
        &self,
        location_id: LocationId,
    ) -> DomainResult<Option<DateTime<Utc>>>;

    /// Material → backing ingredient and shelf-life lookup.
    fn material(&self, id: MaterialId) -> DomainResult<Material>;

    /// Deduct from the warehouse ledger, returning the remaining quantity.
    /// Fails with `InsufficientStock` when the ledger holds less than
    /// `quantity`.
    fn deduct_warehouse_stock(
        &mut self,
        warehouse_id: WarehouseId,
        material_id: MaterialId,
        quantity: f64,
    ) -> DomainResult<f64>;

    /// Credit the warehouse ledger, returning the new quantity.
    fn credit_warehouse_stock(
        &mut self,
        warehouse_id: WarehouseId,
        material_id: MaterialId,
        quantity: f64,
    ) -> DomainResult<f64>;

    /// Credit the location's ingredient ledger, returning the new quantity.
    fn credit_ingredient_stock(
        &mut self,
        location_id: LocationId,
        ingredient_id: IngredientId,
        quantity: f64,
    ) -> DomainResult<f64>;
}
