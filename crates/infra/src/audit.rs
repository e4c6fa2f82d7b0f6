//! Structured audit records for lifecycle transitions and reconciliations.
//!
//! Consumed fire-and-forget: a sink failure is logged and must never roll
//! back the transaction the record describes.

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use stockline_core::UserId;
use stockline_fulfillment::TransitionOutcome;

use crate::notify::SinkError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRecord {
    pub component: &'static str,
    pub operation: &'static str,
    pub actor: UserId,
    pub subject: String,
    pub status_before: String,
    pub status_after: String,
    pub details: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Record for a stock request transition or reconciliation run.
    pub fn for_transition(
        operation: &'static str,
        outcome: &TransitionOutcome,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            component: "stock_request",
            operation,
            actor: outcome.actor,
            subject: outcome.request.id.to_string(),
            status_before: outcome.previous_status.to_string(),
            status_after: outcome.request.status.to_string(),
            details: json!({
                "location_id": outcome.request.location_id,
                "warehouse_id": outcome.request.warehouse_id,
                "line_count": outcome.request.lines.len(),
                "change_log_entries": outcome.request.change_log.len(),
            }),
            occurred_at,
        }
    }
}

pub trait AuditSink {
    fn record(&self, record: &AuditRecord) -> Result<(), SinkError>;
}

/// Fire-and-forget publication: failures are logged, never returned.
pub fn publish<A: AuditSink + ?Sized>(sink: &A, record: &AuditRecord) {
    if let Err(e) = sink.record(record) {
        warn!(error = %e, operation = record.operation, subject = %record.subject, "audit record dropped");
    }
}

#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    records: RwLock<Vec<AuditRecord>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.read().map(|r| r.clone()).unwrap_or_default()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, record: &AuditRecord) -> Result<(), SinkError> {
        self.records
            .write()
            .map_err(|_| SinkError("audit buffer poisoned".to_string()))?
            .push(record.clone());
        Ok(())
    }
}

/// Emits each record as a structured log event.
#[derive(Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, record: &AuditRecord) -> Result<(), SinkError> {
        tracing::info!(
            component = record.component,
            operation = record.operation,
            subject = %record.subject,
            from = %record.status_before,
            to = %record.status_after,
            "audit"
        );
        Ok(())
    }
}
