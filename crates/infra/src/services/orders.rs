//! Order entry points: placing orders, preparing and completing lines.
//!
//! Placing and preparing only move statuses; completion is the moment a
//! line's materials physically leave the location's stock and its
//! reservation is released, inside the same transaction. The composition
//! deducted is the same one the frozen-inventory aggregation counts
//! (variant bill-of-materials plus the line's attached add-ons), keeping
//! the two views of a line consistent.

use chrono::{DateTime, Utc};

use stockline_availability::{
    AvailabilityStore, ChangedEntities, RecalculationOutcome, Recalculator,
};
use stockline_core::{DomainError, DomainResult};
use stockline_orders::{Order, OrderId, OrderLineId, OrderLineStatus, OrderStatus};

use crate::audit::AuditSink;
use crate::engine::{EngineResult, Transaction};
use crate::notify::{Notification, NotificationSink};

use super::StocklineService;

impl<A: AuditSink, N: NotificationSink> StocklineService<A, N> {
    /// Persist a new order and refresh availability: its active lines hold
    /// reservations from the moment it is placed.
    pub fn place_order(
        &self,
        order: Order,
        now: DateTime<Utc>,
    ) -> EngineResult<RecalculationOutcome> {
        let location_id = order.location_id;
        let outcome = self.engine().execute(|tx| {
            let changed = changed_for_order(tx, &order)?;
            tx.save_order(order);
            tx.recalculate(location_id, &changed, now)
        })?;
        self.dispatch(self.wrapper_notifications(location_id, &outcome));
        Ok(outcome)
    }

    /// Move a pending line to PREPARING. Reservations and stock are
    /// untouched; both states reserve equally.
    pub fn prepare_order_line(&self, order_id: OrderId, line_id: OrderLineId) -> EngineResult<()> {
        self.engine().execute(|tx| {
            let mut order = tx.order(order_id)?;
            let line = find_line_mut(&mut order, line_id)?;
            if line.status != OrderLineStatus::Pending {
                return Err(DomainError::invariant(format!(
                    "order line {line_id} is not pending"
                )));
            }
            line.status = OrderLineStatus::Preparing;
            if order.status == OrderStatus::Pending {
                order.status = OrderStatus::Preparing;
            }
            tx.save_order(order);
            Ok(())
        })
    }

    /// Complete a line: consume its materials from location stock
    /// (ingredients from the ledger, provisions by draining eligible
    /// batches oldest-first), release its reservation, and refresh
    /// availability. Completing the last line completes the order.
    pub fn complete_order_line(
        &self,
        order_id: OrderId,
        line_id: OrderLineId,
        now: DateTime<Utc>,
    ) -> EngineResult<RecalculationOutcome> {
        let (location_id, outcome, notifications) = self.engine().execute(|tx| {
            let mut order = tx.order(order_id)?;
            let location_id = order.location_id;
            let line = find_line_mut(&mut order, line_id)?;
            if line.status == OrderLineStatus::Completed {
                return Err(DomainError::invariant(format!(
                    "order line {line_id} is already completed"
                )));
            }
            line.status = OrderLineStatus::Completed;
            let line = line.clone();
            if order
                .lines
                .iter()
                .all(|l| l.status == OrderLineStatus::Completed)
            {
                order.status = OrderStatus::Completed;
            }

            let (ingredients, provisions, changed) = line_composition(tx, &line)?;
            let mut notifications = Vec::new();
            for (ingredient_id, quantity) in ingredients {
                let entry = tx.deduct_ingredient_stock(location_id, ingredient_id, quantity)?;
                if entry.is_low() {
                    notifications.push(Notification::LowIngredientStock {
                        location_id,
                        ingredient_id,
                        quantity: entry.quantity,
                        threshold: entry.low_stock_threshold,
                    });
                }
            }
            for (provision_id, volume) in provisions {
                tx.drain_provision(location_id, provision_id, volume, now)?;
            }

            tx.save_order(order);
            let outcome = tx.recalculate(location_id, &changed, now)?;
            Ok((location_id, outcome, notifications))
        })?;
        let mut notifications = notifications;
        notifications.extend(self.wrapper_notifications(location_id, &outcome));
        self.dispatch(notifications);
        Ok(outcome)
    }
}

fn find_line_mut(
    order: &mut Order,
    line_id: OrderLineId,
) -> DomainResult<&mut stockline_orders::OrderLine> {
    order
        .lines
        .iter_mut()
        .find(|l| l.id == line_id)
        .ok_or(DomainError::NotFound)
}

/// Changed-entity set for a whole order: every line's variant plus its
/// attached add-ons.
fn changed_for_order(tx: &Transaction, order: &Order) -> DomainResult<ChangedEntities> {
    let mut changed = ChangedEntities::default();
    for line in &order.lines {
        let product = tx.location_product(line.location_product_id)?;
        changed.variant_ids.insert(product.variant_id);
        for line_addon in &line.addons {
            let location_addon = tx.location_addon(line_addon.location_addon_id)?;
            changed.addon_ids.insert(location_addon.addon_id);
        }
    }
    Ok(changed)
}

/// Materials one line consumes, mirroring the frozen-inventory aggregation:
/// the variant's own bill-of-materials plus each attached add-on's.
fn line_composition(
    tx: &Transaction,
    line: &stockline_orders::OrderLine,
) -> DomainResult<(
    Vec<(stockline_stock::IngredientId, f64)>,
    Vec<(stockline_stock::ProvisionId, f64)>,
    ChangedEntities,
)> {
    let product = tx.location_product(line.location_product_id)?;
    let variant = tx.variant(product.variant_id)?;

    let mut ingredients: Vec<_> = variant.bom.ingredients().collect();
    let mut provisions: Vec<_> = variant.bom.provisions().collect();
    let mut changed = ChangedEntities::for_variants([variant.id]);

    for line_addon in &line.addons {
        let location_addon = tx.location_addon(line_addon.location_addon_id)?;
        let addon = tx.addon(location_addon.addon_id)?;
        ingredients.extend(addon.bom.ingredients());
        provisions.extend(addon.bom.provisions());
        changed.addon_ids.insert(addon.id);
    }

    Ok((ingredients, provisions, changed))
}
