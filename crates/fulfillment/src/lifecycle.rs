//! Lifecycle manager: status transitions and their ledger side effects.
//!
//! Every operation here must run inside one storage transaction. Any error
//! leaves the request in its prior status because the caller rolls the
//! whole transaction back; this module never applies partial effects on the
//! assumption that a failed run is discarded.

use chrono::{DateTime, Utc};
use tracing::info;

use stockline_availability::{ChangedEntities, RecalculationOutcome, Recalculator};
use stockline_core::{DomainError, DomainResult, UserId};
use stockline_stock::MaterialId;

use crate::request::{StockRequest, StockRequestId};
use crate::status::StockRequestStatus;
use crate::store::FulfillmentStore;

/// Result of one lifecycle transition, consumed by audit and notification
/// sinks after the transaction commits.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
    pub request: StockRequest,
    pub previous_status: StockRequestStatus,
    pub actor: UserId,
    /// Warehouse quantity remaining per material touched by this
    /// transition, for safety-threshold checks.
    pub warehouse_levels: Vec<(MaterialId, f64)>,
    pub recalculation: Option<RecalculationOutcome>,
}

pub struct LifecycleManager;

impl LifecycleManager {
    /// Submit the cart to the warehouse: `CREATED → PROCESSED`, also the
    /// resubmission path out of both rejected states.
    pub fn submit<S: FulfillmentStore + ?Sized>(
        store: &mut S,
        request_id: StockRequestId,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<TransitionOutcome> {
        let mut request = store.stock_request(request_id)?;
        if request.lines.is_empty() {
            return Err(DomainError::validation(format!(
                "stock request {request_id} has no line items"
            )));
        }
        let previous = request.status;
        request.transition_to(StockRequestStatus::Processed, now)?;
        store.save_stock_request(&request)?;
        log_transition(&request, previous);
        Ok(TransitionOutcome {
            request,
            previous_status: previous,
            actor,
            warehouse_levels: Vec::new(),
            recalculation: None,
        })
    }

    /// `PROCESSED → IN_DELIVERY`. Deducts the full requested quantity of
    /// every line from the warehouse ledger; insufficiency on any line
    /// refuses the transition.
    pub fn begin_delivery<S: FulfillmentStore + ?Sized>(
        store: &mut S,
        request_id: StockRequestId,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<TransitionOutcome> {
        let mut request = store.stock_request(request_id)?;
        let previous = request.status;
        request.transition_to(StockRequestStatus::InDelivery, now)?;

        let mut warehouse_levels = Vec::with_capacity(request.lines.len());
        for line in &request.lines {
            let remaining = store.deduct_warehouse_stock(
                request.warehouse_id,
                line.material_id,
                line.quantity,
            )?;
            warehouse_levels.push((line.material_id, remaining));
        }

        store.save_stock_request(&request)?;
        log_transition(&request, previous);
        Ok(TransitionOutcome {
            request,
            previous_status: previous,
            actor,
            warehouse_levels,
            recalculation: None,
        })
    }

    /// `IN_DELIVERY → COMPLETED`. Stamps delivery/expiration dates, credits
    /// the location ledger with every requested quantity, and recalculates
    /// availability for the affected ingredients.
    pub fn complete<S: FulfillmentStore + Recalculator + ?Sized>(
        store: &mut S,
        request_id: StockRequestId,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<TransitionOutcome> {
        let mut request = store.stock_request(request_id)?;
        let previous = request.status;
        request.transition_to(StockRequestStatus::Completed, now)?;

        let mut changed = ChangedEntities::default();
        for line in &mut request.lines {
            let material = store.material(line.material_id)?;
            line.delivered_at = Some(now);
            line.expires_at = Some(material.expiration_from(now));
            store.credit_ingredient_stock(
                request.location_id,
                material.ingredient_id,
                line.quantity,
            )?;
            changed.ingredient_ids.insert(material.ingredient_id);
        }

        store.save_stock_request(&request)?;
        let recalculation = store.recalculate(request.location_id, &changed, now)?;
        log_transition(&request, previous);
        Ok(TransitionOutcome {
            request,
            previous_status: previous,
            actor,
            warehouse_levels: Vec::new(),
            recalculation: Some(recalculation),
        })
    }

    /// `IN_DELIVERY → REJECTED_BY_STORE`. Records the store's comment; no
    /// ledger mutation.
    pub fn reject_by_store<S: FulfillmentStore + ?Sized>(
        store: &mut S,
        request_id: StockRequestId,
        actor: UserId,
        comment: Option<&str>,
        now: DateTime<Utc>,
    ) -> DomainResult<TransitionOutcome> {
        Self::reject(store, request_id, actor, comment, now, StockRequestStatus::RejectedByStore)
    }

    /// `PROCESSED → REJECTED_BY_WAREHOUSE`. Records the warehouse's
    /// comment; no ledger mutation.
    pub fn reject_by_warehouse<S: FulfillmentStore + ?Sized>(
        store: &mut S,
        request_id: StockRequestId,
        actor: UserId,
        comment: Option<&str>,
        now: DateTime<Utc>,
    ) -> DomainResult<TransitionOutcome> {
        Self::reject(
            store,
            request_id,
            actor,
            comment,
            now,
            StockRequestStatus::RejectedByWarehouse,
        )
    }

    fn reject<S: FulfillmentStore + ?Sized>(
        store: &mut S,
        request_id: StockRequestId,
        actor: UserId,
        comment: Option<&str>,
        now: DateTime<Utc>,
        target: StockRequestStatus,
    ) -> DomainResult<TransitionOutcome> {
        let mut request = store.stock_request(request_id)?;
        let previous = request.status;
        request.transition_to(target, now)?;
        if let Some(comment) = comment {
            match target {
                StockRequestStatus::RejectedByStore => request.append_store_comment(comment),
                _ => request.append_warehouse_comment(comment),
            }
        }
        store.save_stock_request(&request)?;
        log_transition(&request, previous);
        Ok(TransitionOutcome {
            request,
            previous_status: previous,
            actor,
            warehouse_levels: Vec::new(),
            recalculation: None,
        })
    }
}

fn log_transition(request: &StockRequest, previous: StockRequestStatus) {
    info!(
        request = %request.id,
        location = %request.location_id,
        from = %previous,
        to = %request.status,
        "stock request transitioned"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use stockline_core::{LocationId, WarehouseId};
    use stockline_stock::Material;

    use crate::request::StockRequestLine;
    use crate::testing::FakeStore;

    struct Fixture {
        store: FakeStore,
        request_id: StockRequestId,
        location: LocationId,
        warehouse: WarehouseId,
        material: Material,
        actor: UserId,
    }

    /// A request for 10 units of one material, in the given status, with the
    /// warehouse holding `warehouse_quantity`.
    fn fixture(status: StockRequestStatus, warehouse_quantity: f64) -> Fixture {
        let mut store = FakeStore::default();
        let location = LocationId::new();
        let warehouse = WarehouseId::new();
        let material = store.add_material("Whole milk 1L", 30);
        store
            .warehouse
            .insert((warehouse, material.id), warehouse_quantity);

        let mut request = crate::request::StockRequest::new(location, warehouse, Utc::now());
        request
            .add_line(StockRequestLine::new(material.id, material.ingredient_id, 10.0))
            .unwrap();
        request.status = status;
        let request_id = request.id;
        store.requests.insert(request_id, request);

        Fixture {
            store,
            request_id,
            location,
            warehouse,
            material,
            actor: UserId::new(),
        }
    }

    #[test]
    fn submit_requires_line_items() {
        let mut f = fixture(StockRequestStatus::Created, 0.0);
        f.store.requests.get_mut(&f.request_id).unwrap().lines.clear();

        let err = LifecycleManager::submit(&mut f.store, f.request_id, f.actor, Utc::now())
            .expect_err("empty cart");
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(
            f.store.requests[&f.request_id].status,
            StockRequestStatus::Created
        );
    }

    #[test]
    fn begin_delivery_deducts_the_warehouse_ledger() {
        let mut f = fixture(StockRequestStatus::Processed, 10.0);

        let outcome =
            LifecycleManager::begin_delivery(&mut f.store, f.request_id, f.actor, Utc::now())
                .unwrap();

        assert_eq!(outcome.request.status, StockRequestStatus::InDelivery);
        assert_eq!(f.store.warehouse_quantity(f.warehouse, f.material.id), 0.0);
        assert_eq!(outcome.warehouse_levels, vec![(f.material.id, 0.0)]);
    }

    #[test]
    fn insufficient_warehouse_stock_refuses_delivery() {
        let mut f = fixture(StockRequestStatus::Processed, 4.0);

        let err =
            LifecycleManager::begin_delivery(&mut f.store, f.request_id, f.actor, Utc::now())
                .expect_err("10 requested, 4 held");
        assert!(matches!(err, DomainError::InsufficientStock(_)));
        assert_eq!(
            f.store.requests[&f.request_id].status,
            StockRequestStatus::Processed
        );
    }

    #[test]
    fn complete_stamps_expiry_and_credits_the_location() {
        let mut f = fixture(StockRequestStatus::InDelivery, 0.0);
        let now = Utc::now();

        let outcome =
            LifecycleManager::complete(&mut f.store, f.request_id, f.actor, now).unwrap();

        let line = &outcome.request.lines[0];
        assert_eq!(line.delivered_at, Some(now));
        assert_eq!(line.expires_at, Some(now + Duration::days(30)));
        assert_eq!(
            f.store.location_quantity(f.location, f.material.ingredient_id),
            10.0
        );
        assert_eq!(f.store.recalculations.len(), 1);
        assert!(
            f.store.recalculations[0]
                .ingredient_ids
                .contains(&f.material.ingredient_id)
        );
    }

    #[test]
    fn rejections_record_comments_without_ledger_moves() {
        let mut f = fixture(StockRequestStatus::InDelivery, 7.0);

        let outcome = LifecycleManager::reject_by_store(
            &mut f.store,
            f.request_id,
            f.actor,
            Some("arrived spoiled"),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(outcome.request.status, StockRequestStatus::RejectedByStore);
        assert_eq!(outcome.request.store_comment.as_deref(), Some("arrived spoiled"));
        assert_eq!(f.store.warehouse_quantity(f.warehouse, f.material.id), 7.0);
        assert_eq!(
            f.store.location_quantity(f.location, f.material.ingredient_id),
            0.0
        );
    }

    #[test]
    fn rejected_requests_can_be_resubmitted() {
        let mut f = fixture(StockRequestStatus::RejectedByWarehouse, 0.0);

        let outcome =
            LifecycleManager::submit(&mut f.store, f.request_id, f.actor, Utc::now()).unwrap();
        assert_eq!(outcome.previous_status, StockRequestStatus::RejectedByWarehouse);
        assert_eq!(outcome.request.status, StockRequestStatus::Processed);
    }

    #[test]
    fn completed_requests_refuse_further_transitions() {
        let mut f = fixture(StockRequestStatus::Completed, 0.0);

        let err = LifecycleManager::submit(&mut f.store, f.request_id, f.actor, Utc::now())
            .expect_err("terminal status");
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
