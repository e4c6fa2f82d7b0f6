use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use stockline_catalog::{AddonId, LocationAddonId, LocationProductId, VariantId};
use stockline_stock::{IngredientId, ProvisionId};

/// The set of catalog/stock entities a mutation touched.
///
/// Any subset may be empty. Collaborating subsystems (orders, catalog,
/// receiving) build one of these and hand it to the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedEntities {
    pub ingredient_ids: HashSet<IngredientId>,
    pub provision_ids: HashSet<ProvisionId>,
    pub variant_ids: HashSet<VariantId>,
    pub addon_ids: HashSet<AddonId>,
}

impl ChangedEntities {
    pub fn is_empty(&self) -> bool {
        self.ingredient_ids.is_empty()
            && self.provision_ids.is_empty()
            && self.variant_ids.is_empty()
            && self.addon_ids.is_empty()
    }

    pub fn for_ingredients(ids: impl IntoIterator<Item = IngredientId>) -> Self {
        Self {
            ingredient_ids: ids.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn for_provisions(ids: impl IntoIterator<Item = ProvisionId>) -> Self {
        Self {
            provision_ids: ids.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn for_variants(ids: impl IntoIterator<Item = VariantId>) -> Self {
        Self {
            variant_ids: ids.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn for_addons(ids: impl IntoIterator<Item = AddonId>) -> Self {
        Self {
            addon_ids: ids.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn merge(&mut self, other: ChangedEntities) {
        self.ingredient_ids.extend(other.ingredient_ids);
        self.provision_ids.extend(other.provision_ids);
        self.variant_ids.extend(other.variant_ids);
        self.addon_ids.extend(other.addon_ids);
    }
}

/// Wrappers whose availability must be re-evaluated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AffectedWrappers {
    pub products: HashSet<LocationProductId>,
    pub addons: HashSet<LocationAddonId>,
}

impl AffectedWrappers {
    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.addons.is_empty()
    }
}
