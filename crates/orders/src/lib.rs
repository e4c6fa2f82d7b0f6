//! `stockline-orders` — customer purchases.
//!
//! Orders matter to the availability engine only through reservations: a
//! non-terminal order line holds its variant's (and attached add-ons')
//! materials frozen until the line completes.

pub mod order;

pub use order::{
    Order, OrderId, OrderLine, OrderLineAddon, OrderLineId, OrderLineStatus, OrderStatus,
};
