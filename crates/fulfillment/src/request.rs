//! The stock request entity: a replenishment cart moving materials from a
//! warehouse to a location.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockline_core::{AggregateId, DomainError, DomainResult, Entity, LocationId, WarehouseId};
use stockline_stock::{IngredientId, MaterialId};

use crate::status::StockRequestStatus;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockRequestId(pub AggregateId);

impl StockRequestId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for StockRequestId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// One requested material and quantity. Delivery/expiration stamps are set
/// by the transition that delivers the line, never by the cart editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRequestLine {
    pub material_id: MaterialId,
    pub ingredient_id: IngredientId,
    pub quantity: f64,
    pub delivered_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl StockRequestLine {
    pub fn new(material_id: MaterialId, ingredient_id: IngredientId, quantity: f64) -> Self {
        Self {
            material_id,
            ingredient_id,
            quantity,
            delivered_at: None,
            expires_at: None,
        }
    }
}

/// Change-log entry recorded by reconciliation. `requested_quantity` is
/// `None` when the warehouse substituted a material that was never
/// requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineChange {
    pub material_id: MaterialId,
    pub requested_quantity: Option<f64>,
    pub actual_quantity: f64,
}

/// A replenishment request.
///
/// Line items are mutable only while the status is `Created`; after that
/// every mutation happens through a lifecycle transition's side effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRequest {
    pub id: StockRequestId,
    pub location_id: LocationId,
    pub warehouse_id: WarehouseId,
    pub status: StockRequestStatus,
    pub lines: Vec<StockRequestLine>,
    pub change_log: Vec<LineChange>,
    pub store_comment: Option<String>,
    pub warehouse_comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockRequest {
    pub fn new(
        location_id: LocationId,
        warehouse_id: WarehouseId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: StockRequestId::new(AggregateId::new()),
            location_id,
            warehouse_id,
            status: StockRequestStatus::Created,
            lines: Vec::new(),
            change_log: Vec::new(),
            store_comment: None,
            warehouse_comment: None,
            created_at,
            updated_at: created_at,
        }
    }

    /// Add a line, merging the quantity into an existing line for the same
    /// material. Only allowed while the cart has not been submitted.
    pub fn add_line(&mut self, line: StockRequestLine) -> DomainResult<()> {
        self.ensure_editable()?;
        ensure_positive_quantity(line.quantity)?;
        match self
            .lines
            .iter_mut()
            .find(|existing| existing.material_id == line.material_id)
        {
            Some(existing) => existing.quantity += line.quantity,
            None => self.lines.push(line),
        }
        Ok(())
    }

    /// Replace the whole line set. Only allowed while the cart has not been
    /// submitted.
    pub fn replace_lines(&mut self, lines: Vec<StockRequestLine>) -> DomainResult<()> {
        self.ensure_editable()?;
        for line in &lines {
            ensure_positive_quantity(line.quantity)?;
        }
        self.lines = lines;
        Ok(())
    }

    /// Validate and apply a status transition. Side effects (ledger moves,
    /// date stamping) belong to the lifecycle manager, not here.
    pub fn transition_to(
        &mut self,
        target: StockRequestStatus,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.status.ensure_transition(target)?;
        self.status = target;
        self.updated_at = now;
        Ok(())
    }

    pub fn line_for_material(&self, material_id: MaterialId) -> Option<&StockRequestLine> {
        self.lines.iter().find(|l| l.material_id == material_id)
    }

    pub fn append_store_comment(&mut self, comment: &str) {
        append_comment(&mut self.store_comment, comment);
    }

    pub fn append_warehouse_comment(&mut self, comment: &str) {
        append_comment(&mut self.warehouse_comment, comment);
    }

    fn ensure_editable(&self) -> DomainResult<()> {
        if self.status == StockRequestStatus::Created {
            Ok(())
        } else {
            Err(DomainError::invariant(format!(
                "stock request {} is not editable in status {}",
                self.id, self.status
            )))
        }
    }
}

impl Entity for StockRequest {
    type Id = StockRequestId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn append_comment(slot: &mut Option<String>, comment: &str) {
    if comment.is_empty() {
        return;
    }
    match slot {
        Some(existing) => {
            existing.push('\n');
            existing.push_str(comment);
        }
        None => *slot = Some(comment.to_string()),
    }
}

pub(crate) fn ensure_positive_quantity(quantity: f64) -> DomainResult<()> {
    if quantity > 0.0 {
        Ok(())
    } else {
        Err(DomainError::validation(format!(
            "quantity must be positive, got {quantity}"
        )))
    }
}
