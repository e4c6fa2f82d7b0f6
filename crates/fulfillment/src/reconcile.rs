//! Reconciliation: accepting a delivery that differs from the request.
//!
//! The warehouse ledger was already debited for the full requested
//! quantities when the request entered `IN_DELIVERY`, so acceptance only
//! settles the difference: shortfalls go back to the warehouse, increases
//! and substitutions are debited on top. Net effect per material equals the
//! accepted quantity, and the location ledger is credited by exactly the
//! accepted quantities.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use stockline_availability::{ChangedEntities, Recalculator};
use stockline_core::{DomainError, DomainResult, UserId};
use stockline_stock::MaterialId;

use crate::lifecycle::TransitionOutcome;
use crate::request::{LineChange, StockRequestId, StockRequestLine};
use crate::status::StockRequestStatus;
use crate::store::FulfillmentStore;

/// One actually-delivered material and quantity. Zero means the material
/// was requested but nothing arrived.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcceptedLine {
    pub material_id: MaterialId,
    pub quantity: f64,
}

pub struct ReconciliationHandler;

impl ReconciliationHandler {
    /// `IN_DELIVERY → ACCEPTED_WITH_CHANGE`.
    ///
    /// Settles the warehouse ledger against the accepted quantities,
    /// credits the location ledger, records a change-log entry per
    /// discrepancy, replaces the request's lines with the accepted set and
    /// recalculates availability for the touched ingredients.
    pub fn accept_with_change<S: FulfillmentStore + Recalculator + ?Sized>(
        store: &mut S,
        request_id: StockRequestId,
        accepted: &[AcceptedLine],
        store_comment: Option<&str>,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<TransitionOutcome> {
        let mut request = store.stock_request(request_id)?;
        let previous = request.status;
        request
            .status
            .ensure_transition(StockRequestStatus::AcceptedWithChange)?;

        let accepted = merge_accepted(accepted)?;
        let mut changes: Vec<LineChange> = Vec::new();
        let mut new_lines: Vec<StockRequestLine> = Vec::new();
        let mut changed = ChangedEntities::default();
        let mut warehouse_levels: Vec<(MaterialId, f64)> = Vec::new();

        // Requested lines first: settle shortfalls and increases.
        for line in &request.lines {
            let actual = accepted.get(&line.material_id).copied().unwrap_or(0.0);
            if actual < line.quantity {
                store.credit_warehouse_stock(
                    request.warehouse_id,
                    line.material_id,
                    line.quantity - actual,
                )?;
            } else if actual > line.quantity {
                let remaining = store.deduct_warehouse_stock(
                    request.warehouse_id,
                    line.material_id,
                    actual - line.quantity,
                )?;
                warehouse_levels.push((line.material_id, remaining));
            }
            if actual != line.quantity {
                changes.push(LineChange {
                    material_id: line.material_id,
                    requested_quantity: Some(line.quantity),
                    actual_quantity: actual,
                });
            }
        }

        // Substituted materials that were never requested.
        for (&material_id, &actual) in &accepted {
            if request.line_for_material(material_id).is_none() {
                let remaining =
                    store.deduct_warehouse_stock(request.warehouse_id, material_id, actual)?;
                warehouse_levels.push((material_id, remaining));
                changes.push(LineChange {
                    material_id,
                    requested_quantity: None,
                    actual_quantity: actual,
                });
            }
        }

        // Credit the location with everything that actually arrived.
        for (&material_id, &actual) in &accepted {
            if actual <= 0.0 {
                continue;
            }
            let material = store.material(material_id)?;
            let mut line = StockRequestLine::new(material.id, material.ingredient_id, actual);
            line.delivered_at = Some(now);
            line.expires_at = Some(material.expiration_from(now));
            store.credit_ingredient_stock(request.location_id, material.ingredient_id, actual)?;
            changed.ingredient_ids.insert(material.ingredient_id);
            new_lines.push(line);
        }

        if let Some(summary) = render_summary(store, &changes)? {
            request.append_store_comment(&summary);
        }
        if let Some(comment) = store_comment {
            request.append_store_comment(comment);
        }
        request.change_log.extend(changes);
        request.lines = new_lines;
        request.transition_to(StockRequestStatus::AcceptedWithChange, now)?;
        store.save_stock_request(&request)?;

        let recalculation = store.recalculate(request.location_id, &changed, now)?;
        info!(
            request = %request.id,
            location = %request.location_id,
            discrepancies = request.change_log.len(),
            "stock request reconciled"
        );
        Ok(TransitionOutcome {
            request,
            previous_status: previous,
            actor,
            warehouse_levels,
            recalculation: Some(recalculation),
        })
    }
}

fn merge_accepted(accepted: &[AcceptedLine]) -> DomainResult<HashMap<MaterialId, f64>> {
    let mut merged = HashMap::with_capacity(accepted.len());
    for line in accepted {
        if line.quantity < 0.0 {
            return Err(DomainError::validation(format!(
                "accepted quantity must be non-negative, got {}",
                line.quantity
            )));
        }
        *merged.entry(line.material_id).or_insert(0.0) += line.quantity;
    }
    Ok(merged)
}

/// Human-readable summary of the discrepancies, appended to the request's
/// store comment alongside the structured change log.
fn render_summary<S: FulfillmentStore + ?Sized>(
    store: &S,
    changes: &[LineChange],
) -> DomainResult<Option<String>> {
    if changes.is_empty() {
        return Ok(None);
    }
    let mut parts = Vec::with_capacity(changes.len());
    for change in changes {
        let name = store.material(change.material_id)?.name;
        match change.requested_quantity {
            Some(requested) => parts.push(format!(
                "{name}: requested {requested}, accepted {}",
                change.actual_quantity
            )),
            None => parts.push(format!(
                "{name}: not requested, accepted {}",
                change.actual_quantity
            )),
        }
    }
    Ok(Some(format!(
        "quantities adjusted at delivery: {}",
        parts.join("; ")
    )))
}
