//! Application services: the entry points the surrounding CRUD API calls.
//!
//! Each operation runs inside one engine transaction; audit records and
//! notifications are published only after the transaction commits.

use chrono::{DateTime, Utc};

use stockline_availability::{ChangedEntities, RecalculationOutcome, Recalculator};
use stockline_core::LocationId;
use stockline_fulfillment::TransitionOutcome;

use crate::audit::{self, AuditRecord, AuditSink};
use crate::engine::{EngineResult, InMemoryEngine};
use crate::notify::{self, Notification, NotificationSink};

mod orders;
mod replenishment;

pub struct StocklineService<A: AuditSink, N: NotificationSink> {
    engine: InMemoryEngine,
    audit: A,
    notifications: N,
}

impl<A: AuditSink, N: NotificationSink> StocklineService<A, N> {
    pub fn new(engine: InMemoryEngine, audit: A, notifications: N) -> Self {
        Self {
            engine,
            audit,
            notifications,
        }
    }

    pub fn engine(&self) -> &InMemoryEngine {
        &self.engine
    }

    pub fn audit_sink(&self) -> &A {
        &self.audit
    }

    pub fn notification_sink(&self) -> &N {
        &self.notifications
    }

    /// Catalog edits (bill-of-materials or composition changes) feed the
    /// recalculation pipeline directly.
    pub fn composition_changed(
        &self,
        location_id: LocationId,
        changed: &ChangedEntities,
        now: DateTime<Utc>,
    ) -> EngineResult<RecalculationOutcome> {
        let outcome = self
            .engine
            .execute(|tx| tx.recalculate(location_id, changed, now))?;
        self.dispatch(self.wrapper_notifications(location_id, &outcome));
        Ok(outcome)
    }

    /// Register a freshly prepared provision batch and refresh availability
    /// for its provision.
    pub fn receive_provision_batch(
        &self,
        batch: stockline_stock::ProvisionBatch,
        now: DateTime<Utc>,
    ) -> EngineResult<RecalculationOutcome> {
        let location_id = batch.location_id;
        let changed = ChangedEntities::for_provisions([batch.provision_id]);
        let outcome = self.engine.execute(|tx| {
            tx.world_mut().put_batch(batch);
            tx.recalculate(location_id, &changed, now)
        })?;
        self.dispatch(self.wrapper_notifications(location_id, &outcome));
        Ok(outcome)
    }

    pub(crate) fn publish_transition(
        &self,
        operation: &'static str,
        outcome: &TransitionOutcome,
        notifications: Vec<Notification>,
        now: DateTime<Utc>,
    ) {
        audit::publish(&self.audit, &AuditRecord::for_transition(operation, outcome, now));
        self.dispatch(notifications);
    }

    pub(crate) fn dispatch(&self, notifications: Vec<Notification>) {
        notify::dispatch(&self.notifications, &notifications);
    }

    /// Out-of-stock notifications for wrappers whose flag just flipped.
    pub(crate) fn wrapper_notifications(
        &self,
        location_id: LocationId,
        outcome: &RecalculationOutcome,
    ) -> Vec<Notification> {
        let mut notifications = Vec::new();
        for id in &outcome.newly_out_products {
            notifications.push(Notification::ProductOutOfStock {
                location_id,
                location_product_id: *id,
            });
        }
        for id in &outcome.newly_out_addons {
            notifications.push(Notification::AddonOutOfStock {
                location_id,
                location_addon_id: *id,
            });
        }
        notifications
    }
}
