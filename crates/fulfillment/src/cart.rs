//! Cart operations: everything a location can do to a request before it is
//! submitted to the warehouse.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use stockline_core::{DomainError, DomainResult, LocationId, WarehouseId};
use stockline_stock::MaterialId;

use crate::request::{StockRequest, StockRequestId, StockRequestLine, ensure_positive_quantity};
use crate::status::StockRequestStatus;
use crate::store::FulfillmentStore;

/// Minimum delay between two `create` calls for the same location.
pub const CREATE_RATE_LIMIT: Duration = Duration::hours(24);

/// Caller-supplied line input; the backing ingredient is resolved from the
/// material catalog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RequestedLine {
    pub material_id: MaterialId,
    pub quantity: f64,
}

pub struct CartService;

impl CartService {
    /// Create a request in `CREATED`. Refused when the location already has
    /// a non-terminal request, or created one within the rate-limit window.
    pub fn create<S: FulfillmentStore + ?Sized>(
        store: &mut S,
        location_id: LocationId,
        warehouse_id: WarehouseId,
        lines: &[RequestedLine],
        now: DateTime<Utc>,
    ) -> DomainResult<StockRequest> {
        if let Some(open) = store.open_request(location_id)? {
            return Err(DomainError::conflict(format!(
                "location {location_id} already has an open stock request {} in status {}",
                open.id, open.status
            )));
        }
        if let Some(last) = store.last_request_created_at(location_id)?
            && now - last < CREATE_RATE_LIMIT
        {
            return Err(DomainError::conflict(format!(
                "a stock request for location {location_id} was already created at {last}"
            )));
        }

        let mut request = StockRequest::new(location_id, warehouse_id, now);
        for line in lines {
            request.add_line(Self::resolve(store, line)?)?;
        }
        store.save_stock_request(&request)?;
        info!(request = %request.id, location = %location_id, lines = request.lines.len(), "stock request created");
        Ok(request)
    }

    /// Merge a quantity into the cart, adding a line for a new material.
    pub fn add_line<S: FulfillmentStore + ?Sized>(
        store: &mut S,
        request_id: StockRequestId,
        line: RequestedLine,
        now: DateTime<Utc>,
    ) -> DomainResult<StockRequest> {
        let mut request = store.stock_request(request_id)?;
        request.add_line(Self::resolve(store, &line)?)?;
        request.updated_at = now;
        store.save_stock_request(&request)?;
        Ok(request)
    }

    /// Replace the whole line set of an unsubmitted cart.
    pub fn replace_lines<S: FulfillmentStore + ?Sized>(
        store: &mut S,
        request_id: StockRequestId,
        lines: &[RequestedLine],
        now: DateTime<Utc>,
    ) -> DomainResult<StockRequest> {
        let mut request = store.stock_request(request_id)?;
        let resolved = lines
            .iter()
            .map(|line| Self::resolve(store, line))
            .collect::<DomainResult<Vec<_>>>()?;
        request.replace_lines(resolved)?;
        request.updated_at = now;
        store.save_stock_request(&request)?;
        Ok(request)
    }

    /// Delete an unsubmitted cart. Requests that ever left `CREATED` are
    /// kept for their history.
    pub fn delete<S: FulfillmentStore + ?Sized>(
        store: &mut S,
        request_id: StockRequestId,
    ) -> DomainResult<()> {
        let request = store.stock_request(request_id)?;
        if request.status != StockRequestStatus::Created {
            return Err(DomainError::invariant(format!(
                "stock request {} in status {} cannot be deleted",
                request.id, request.status
            )));
        }
        store.delete_stock_request(request_id)
    }

    fn resolve<S: FulfillmentStore + ?Sized>(
        store: &S,
        line: &RequestedLine,
    ) -> DomainResult<StockRequestLine> {
        ensure_positive_quantity(line.quantity)?;
        let material = store.material(line.material_id)?;
        Ok(StockRequestLine::new(
            material.id,
            material.ingredient_id,
            line.quantity,
        ))
    }
}
