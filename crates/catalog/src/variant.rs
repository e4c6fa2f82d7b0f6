use serde::{Deserialize, Serialize};

use stockline_core::{AggregateId, Entity};

use crate::addon::AddonId;
use crate::bom::{BillOfMaterials, HasBillOfMaterials};

/// Variant identifier (a sellable size of a product).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantId(pub AggregateId);

impl VariantId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for VariantId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Attachment of an add-on to a variant.
///
/// A default add-on is auto-included with every unit sold, so its materials
/// also count toward the parent variant's availability.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddonLink {
    pub addon_id: AddonId,
    pub is_default: bool,
}

/// Sellable size of a product: direct bill-of-materials plus add-on links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    pub name: String,
    pub bom: BillOfMaterials,
    pub addons: Vec<AddonLink>,
}

impl Variant {
    pub fn default_addon_ids(&self) -> impl Iterator<Item = AddonId> + '_ {
        self.addons
            .iter()
            .filter(|link| link.is_default)
            .map(|link| link.addon_id)
    }

    pub fn has_default_addon(&self, addon_id: AddonId) -> bool {
        self.default_addon_ids().any(|id| id == addon_id)
    }
}

impl Entity for Variant {
    type Id = VariantId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl HasBillOfMaterials for Variant {
    fn bill_of_materials(&self) -> &BillOfMaterials {
        &self.bom
    }
}
