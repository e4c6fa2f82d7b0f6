use serde::{Deserialize, Serialize};

use stockline_core::ValueObject;
use stockline_stock::{IngredientId, ProvisionId};

/// Tagged reference to either material class.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "id")]
pub enum MaterialRef {
    Ingredient(IngredientId),
    Provision(ProvisionId),
}

/// One required material for a single unit of a variant or add-on.
///
/// `quantity` is in the ingredient's unit of measure for ingredients and in
/// volume for provisions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub material: MaterialRef,
    pub quantity: f64,
}

impl ValueObject for Requirement {}

/// The set of required ingredient/provision quantities for one unit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BillOfMaterials {
    requirements: Vec<Requirement>,
}

impl BillOfMaterials {
    pub fn new(requirements: Vec<Requirement>) -> Self {
        Self { requirements }
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Ingredient requirements only.
    pub fn ingredients(&self) -> impl Iterator<Item = (IngredientId, f64)> + '_ {
        self.requirements.iter().filter_map(|r| match r.material {
            MaterialRef::Ingredient(id) => Some((id, r.quantity)),
            MaterialRef::Provision(_) => None,
        })
    }

    /// Provision requirements only.
    pub fn provisions(&self) -> impl Iterator<Item = (ProvisionId, f64)> + '_ {
        self.requirements.iter().filter_map(|r| match r.material {
            MaterialRef::Provision(id) => Some((id, r.quantity)),
            MaterialRef::Ingredient(_) => None,
        })
    }

    pub fn references_ingredient(&self, id: IngredientId) -> bool {
        self.ingredients().any(|(i, _)| i == id)
    }

    pub fn references_provision(&self, id: ProvisionId) -> bool {
        self.provisions().any(|(p, _)| p == id)
    }
}

/// Capability interface for anything that consumes materials per unit sold.
///
/// Implemented by [`crate::Variant`] and [`crate::Addon`] so composition
/// traversal is written once instead of per type.
pub trait HasBillOfMaterials {
    fn bill_of_materials(&self) -> &BillOfMaterials;
}
