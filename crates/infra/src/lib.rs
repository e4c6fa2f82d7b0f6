//! `stockline-infra` — transactional storage engine, application services
//! and the audit/notification edges.
//!
//! The domain crates define storage ports; this crate provides the
//! in-memory transactional implementation ([`engine`]) and the service
//! layer ([`services`]) that runs each operation inside a transaction and
//! publishes [`audit`] records and [`notify`] notifications after commit.

pub mod audit;
pub mod engine;
pub mod notify;
pub mod services;

pub use audit::{AuditRecord, AuditSink, InMemoryAuditSink, TracingAuditSink};
pub use engine::{EngineError, EngineResult, InMemoryEngine, Transaction, WorldState};
pub use notify::{
    InMemoryNotificationSink, Notification, NotificationSink, SinkError, TracingNotificationSink,
};
pub use services::StocklineService;

#[cfg(test)]
mod integration_tests;
