//! `stockline-availability` — the out-of-stock recalculation pipeline.
//!
//! Any mutation to stock, the active-order set, or catalog composition runs
//! the same read-side consistency pipeline:
//!
//! 1. [`resolver`] — map changed ingredient/provision/variant/add-on IDs to
//!    the affected location wrappers.
//! 2. [`frozen`] — sum materials reserved by non-terminal order lines.
//! 3. [`evaluator`] — compare (physical − reserved) against per-unit
//!    requirements, per material class.
//! 4. flag update — bulk-persist the `out_of_stock` flag for wrappers whose
//!    computed status changed.
//!
//! The pipeline performs no I/O of its own; it reads and writes through the
//! [`store::AvailabilityStore`] port, and the caller is responsible for
//! running it inside the same storage transaction as the triggering write.

pub mod changed;
pub mod evaluator;
pub mod frozen;
pub mod pipeline;
pub mod resolver;
pub mod store;

pub use changed::{AffectedWrappers, ChangedEntities};
pub use evaluator::StockView;
pub use frozen::{FrozenFilter, FrozenInventory};
pub use pipeline::{RecalculationOutcome, RecalculationPipeline};
pub use store::{AvailabilityStore, Recalculator};
