use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockline_catalog::{LocationAddonId, LocationProductId};
use stockline_core::{AggregateId, Entity, LocationId};

/// Order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub AggregateId);

impl OrderId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Order line identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderLineId(pub AggregateId);

impl OrderLineId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for OrderLineId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Order status. PENDING and PREPARING are non-terminal and hold a
/// reservation; COMPLETED releases it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Completed,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        self == OrderStatus::Completed
    }
}

/// Per-line status; a line reserves materials only while PENDING or PREPARING.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderLineStatus {
    Pending,
    Preparing,
    Completed,
}

impl OrderLineStatus {
    pub fn is_active(self) -> bool {
        matches!(self, OrderLineStatus::Pending | OrderLineStatus::Preparing)
    }
}

/// An add-on chosen on a specific order line.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineAddon {
    pub location_addon_id: LocationAddonId,
}

/// One sellable item inside an order, snapshotting the location product it
/// was ordered as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub location_product_id: LocationProductId,
    pub status: OrderLineStatus,
    pub addons: Vec<OrderLineAddon>,
}

/// A customer purchase at a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub location_id: LocationId,
    pub status: OrderStatus,
    pub lines: Vec<OrderLine>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Lines currently holding a reservation.
    pub fn active_lines(&self) -> impl Iterator<Item = &OrderLine> {
        self.lines.iter().filter(|line| line.status.is_active())
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
