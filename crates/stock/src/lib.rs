//! `stockline-stock` — raw-material domain.
//!
//! Two material classes exist:
//! - [`Ingredient`]: atomic, discretely-tracked raw material.
//! - [`Provision`]: batch-tracked semi-prepared material; only batches that are
//!   completed and unexpired count toward available volume.
//!
//! [`Material`] is the warehouse-tracked purchasable unit (1:1 with an
//! ingredient) carrying the shelf life used to stamp expiry on receipt.

pub mod ingredient;
pub mod ledger;
pub mod material;
pub mod provision;

pub use ingredient::{Ingredient, IngredientId, UnitOfMeasure};
pub use ledger::{IngredientStock, WarehouseStock};
pub use material::{Material, MaterialId};
pub use provision::{BatchStatus, Provision, ProvisionBatch, ProvisionBatchId, ProvisionId};
