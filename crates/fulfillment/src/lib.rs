//! `stockline-fulfillment` — the stock replenishment request lifecycle.
//!
//! A location assembles a cart of materials ([`cart`]), submits it to its
//! warehouse, and the request then moves through a fixed status machine
//! ([`status`]) whose transitions carry the ledger side effects
//! ([`lifecycle`]): warehouse debit on delivery start, location credit and
//! expiration stamping on completion. Deliveries that differ from the
//! request settle through [`reconcile`].
//!
//! All operations go through the [`store::FulfillmentStore`] port and are
//! transaction-scoped; completion and reconciliation additionally run the
//! availability pipeline via the [`Recalculator`] seam.
//!
//! [`Recalculator`]: stockline_availability::Recalculator

pub mod cart;
pub mod lifecycle;
pub mod reconcile;
pub mod request;
pub mod status;
pub mod store;

pub use cart::{CartService, RequestedLine, CREATE_RATE_LIMIT};
pub use lifecycle::{LifecycleManager, TransitionOutcome};
pub use reconcile::{AcceptedLine, ReconciliationHandler};
pub use request::{LineChange, StockRequest, StockRequestId, StockRequestLine};
pub use status::StockRequestStatus;
pub use store::FulfillmentStore;
