//! `stockline-catalog` — sellable catalog composition.
//!
//! A [`Variant`] (sellable size of a product) and an [`Addon`] (optional or
//! auto-included attachment) each carry a [`BillOfMaterials`]. Location-scoped
//! wrappers ([`LocationProduct`], [`LocationAddon`]) are the sellable entities
//! carrying the mutable `out_of_stock` flag — the primary output of the
//! availability engine.

pub mod addon;
pub mod bom;
pub mod variant;
pub mod wrapper;

pub use addon::{Addon, AddonId};
pub use bom::{BillOfMaterials, HasBillOfMaterials, MaterialRef, Requirement};
pub use variant::{AddonLink, Variant, VariantId};
pub use wrapper::{LocationAddon, LocationAddonId, LocationProduct, LocationProductId};
