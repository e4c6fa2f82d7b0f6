//! Post-commit notifications.
//!
//! Best effort and decoupled: a sink failure is logged and swallowed, never
//! propagated into the transaction that produced the notification.

use std::sync::RwLock;

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use stockline_catalog::{LocationAddonId, LocationProductId};
use stockline_core::{LocationId, WarehouseId};
use stockline_stock::{IngredientId, MaterialId};

/// Delivery failure of an audit or notification sink.
#[derive(Debug, Error)]
#[error("sink unavailable: {0}")]
pub struct SinkError(pub String);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    ProductOutOfStock {
        location_id: LocationId,
        location_product_id: LocationProductId,
    },
    AddonOutOfStock {
        location_id: LocationId,
        location_addon_id: LocationAddonId,
    },
    LowIngredientStock {
        location_id: LocationId,
        ingredient_id: IngredientId,
        quantity: f64,
        threshold: f64,
    },
    WarehouseBelowSafetyThreshold {
        warehouse_id: WarehouseId,
        material_id: MaterialId,
        quantity: f64,
        threshold: f64,
    },
}

pub trait NotificationSink {
    fn send(&self, notification: &Notification) -> Result<(), SinkError>;
}

/// Fire-and-forget dispatch: failures are logged, never returned.
pub fn dispatch<N: NotificationSink + ?Sized>(sink: &N, notifications: &[Notification]) {
    for notification in notifications {
        if let Err(e) = sink.send(notification) {
            warn!(error = %e, ?notification, "notification dropped");
        }
    }
}

/// Collects notifications for assertions in tests and local runs.
#[derive(Debug, Default)]
pub struct InMemoryNotificationSink {
    sent: RwLock<Vec<Notification>>,
}

impl InMemoryNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.read().map(|s| s.clone()).unwrap_or_default()
    }
}

impl NotificationSink for InMemoryNotificationSink {
    fn send(&self, notification: &Notification) -> Result<(), SinkError> {
        self.sent
            .write()
            .map_err(|_| SinkError("notification buffer poisoned".to_string()))?
            .push(notification.clone());
        Ok(())
    }
}

/// Emits each notification as a structured log event.
#[derive(Debug, Default)]
pub struct TracingNotificationSink;

impl NotificationSink for TracingNotificationSink {
    fn send(&self, notification: &Notification) -> Result<(), SinkError> {
        tracing::info!(?notification, "notification");
        Ok(())
    }
}
