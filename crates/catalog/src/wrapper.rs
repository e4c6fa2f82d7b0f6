//! Location-scoped sellable wrappers.
//!
//! Wrappers are created and destroyed with their parent catalog entities; the
//! availability engine mutates only their `out_of_stock` flag.

use serde::{Deserialize, Serialize};

use stockline_core::{AggregateId, Entity, LocationId};

use crate::{AddonId, VariantId};

/// Location product wrapper identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationProductId(pub AggregateId);

impl LocationProductId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for LocationProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Location add-on wrapper identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationAddonId(pub AggregateId);

impl LocationAddonId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for LocationAddonId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A variant offered for sale at a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationProduct {
    pub id: LocationProductId,
    pub location_id: LocationId,
    pub variant_id: VariantId,
    pub out_of_stock: bool,
}

impl Entity for LocationProduct {
    type Id = LocationProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// An add-on offered at a location, evaluated independently using only its
/// own bill-of-materials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationAddon {
    pub id: LocationAddonId,
    pub location_id: LocationId,
    pub addon_id: AddonId,
    pub out_of_stock: bool,
}

impl Entity for LocationAddon {
    type Id = LocationAddonId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
