//! Stock request entry points: cart editing, lifecycle transitions and
//! reconciliation, each wrapped in an engine transaction with post-commit
//! audit/notification publication.

use chrono::{DateTime, Utc};

use stockline_core::{LocationId, UserId, WarehouseId};
use stockline_fulfillment::{
    AcceptedLine, CartService, FulfillmentStore, LifecycleManager, ReconciliationHandler,
    RequestedLine, StockRequest, StockRequestId, TransitionOutcome,
};

use crate::audit::AuditSink;
use crate::engine::{EngineResult, Transaction};
use crate::notify::{Notification, NotificationSink};

use super::StocklineService;

impl<A: AuditSink, N: NotificationSink> StocklineService<A, N> {
    pub fn create_stock_request(
        &self,
        location_id: LocationId,
        warehouse_id: WarehouseId,
        lines: &[RequestedLine],
        now: DateTime<Utc>,
    ) -> EngineResult<StockRequest> {
        self.engine()
            .execute(|tx| CartService::create(tx, location_id, warehouse_id, lines, now))
    }

    pub fn add_request_line(
        &self,
        request_id: StockRequestId,
        line: RequestedLine,
        now: DateTime<Utc>,
    ) -> EngineResult<StockRequest> {
        self.engine()
            .execute(|tx| CartService::add_line(tx, request_id, line, now))
    }

    pub fn replace_request_lines(
        &self,
        request_id: StockRequestId,
        lines: &[RequestedLine],
        now: DateTime<Utc>,
    ) -> EngineResult<StockRequest> {
        self.engine()
            .execute(|tx| CartService::replace_lines(tx, request_id, lines, now))
    }

    pub fn delete_stock_request(&self, request_id: StockRequestId) -> EngineResult<()> {
        self.engine().execute(|tx| CartService::delete(tx, request_id))
    }

    /// The location's current non-terminal request, if any. At most one can
    /// exist per location.
    pub fn open_stock_request(
        &self,
        location_id: LocationId,
    ) -> EngineResult<Option<StockRequest>> {
        self.engine().read(|w| {
            w.stock_requests
                .values()
                .find(|r| r.location_id == location_id && !r.status.is_terminal())
                .cloned()
        })
    }

    pub fn submit_request(
        &self,
        request_id: StockRequestId,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> EngineResult<TransitionOutcome> {
        let outcome = self
            .engine()
            .execute(|tx| LifecycleManager::submit(tx, request_id, actor, now))?;
        self.publish_transition("submit", &outcome, Vec::new(), now);
        Ok(outcome)
    }

    pub fn begin_request_delivery(
        &self,
        request_id: StockRequestId,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> EngineResult<TransitionOutcome> {
        let (outcome, notifications) = self.engine().execute(|tx| {
            let outcome = LifecycleManager::begin_delivery(tx, request_id, actor, now)?;
            let notifications = warehouse_threshold_notifications(tx, &outcome)?;
            Ok((outcome, notifications))
        })?;
        self.publish_transition("begin_delivery", &outcome, notifications, now);
        Ok(outcome)
    }

    pub fn complete_request(
        &self,
        request_id: StockRequestId,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> EngineResult<TransitionOutcome> {
        let outcome = self
            .engine()
            .execute(|tx| LifecycleManager::complete(tx, request_id, actor, now))?;
        let mut notifications = Vec::new();
        if let Some(recalculation) = &outcome.recalculation {
            notifications =
                self.wrapper_notifications(outcome.request.location_id, recalculation);
        }
        self.publish_transition("complete", &outcome, notifications, now);
        Ok(outcome)
    }

    pub fn reject_request_by_store(
        &self,
        request_id: StockRequestId,
        actor: UserId,
        comment: Option<&str>,
        now: DateTime<Utc>,
    ) -> EngineResult<TransitionOutcome> {
        let outcome = self.engine().execute(|tx| {
            LifecycleManager::reject_by_store(tx, request_id, actor, comment, now)
        })?;
        self.publish_transition("reject_by_store", &outcome, Vec::new(), now);
        Ok(outcome)
    }

    pub fn reject_request_by_warehouse(
        &self,
        request_id: StockRequestId,
        actor: UserId,
        comment: Option<&str>,
        now: DateTime<Utc>,
    ) -> EngineResult<TransitionOutcome> {
        let outcome = self.engine().execute(|tx| {
            LifecycleManager::reject_by_warehouse(tx, request_id, actor, comment, now)
        })?;
        self.publish_transition("reject_by_warehouse", &outcome, Vec::new(), now);
        Ok(outcome)
    }

    pub fn accept_request_with_change(
        &self,
        request_id: StockRequestId,
        accepted: &[AcceptedLine],
        store_comment: Option<&str>,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> EngineResult<TransitionOutcome> {
        let (outcome, mut notifications) = self.engine().execute(|tx| {
            let outcome = ReconciliationHandler::accept_with_change(
                tx,
                request_id,
                accepted,
                store_comment,
                actor,
                now,
            )?;
            let notifications = warehouse_threshold_notifications(tx, &outcome)?;
            Ok((outcome, notifications))
        })?;
        if let Some(recalculation) = &outcome.recalculation {
            notifications.extend(
                self.wrapper_notifications(outcome.request.location_id, recalculation),
            );
        }
        self.publish_transition("accept_with_change", &outcome, notifications, now);
        Ok(outcome)
    }
}

/// Safety-threshold checks for every warehouse level a transition touched.
fn warehouse_threshold_notifications(
    tx: &Transaction,
    outcome: &TransitionOutcome,
) -> stockline_core::DomainResult<Vec<Notification>> {
    let mut notifications = Vec::new();
    for (material_id, remaining) in &outcome.warehouse_levels {
        let material = tx.material(*material_id)?;
        if *remaining < material.safety_threshold {
            notifications.push(Notification::WarehouseBelowSafetyThreshold {
                warehouse_id: outcome.request.warehouse_id,
                material_id: *material_id,
                quantity: *remaining,
                threshold: material.safety_threshold,
            });
        }
    }
    Ok(notifications)
}
