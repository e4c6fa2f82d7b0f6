use serde::{Deserialize, Serialize};

use stockline_core::{AggregateId, Entity};

use crate::bom::{BillOfMaterials, HasBillOfMaterials};

/// Add-on (additive) identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddonId(pub AggregateId);

impl AddonId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for AddonId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// An attachment to a variant (e.g. an extra shot), with its own
/// bill-of-materials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Addon {
    pub id: AddonId,
    pub name: String,
    pub bom: BillOfMaterials,
}

impl Entity for Addon {
    type Id = AddonId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl HasBillOfMaterials for Addon {
    fn bill_of_materials(&self) -> &BillOfMaterials {
        &self.bom
    }
}
