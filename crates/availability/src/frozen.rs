//! Frozen inventory: materials reserved by in-flight orders.

use std::collections::{HashMap, HashSet};

use stockline_core::{DomainResult, LocationId};
use stockline_stock::{IngredientId, ProvisionId};

use crate::resolver::lookup;
use crate::store::AvailabilityStore;

/// Restricts the aggregation to specific materials. An empty set means
/// "consider all" for that material class.
#[derive(Debug, Clone, Default)]
pub struct FrozenFilter {
    pub ingredient_ids: HashSet<IngredientId>,
    pub provision_ids: HashSet<ProvisionId>,
}

impl FrozenFilter {
    pub fn wants_ingredient(&self, id: IngredientId) -> bool {
        self.ingredient_ids.is_empty() || self.ingredient_ids.contains(&id)
    }

    pub fn wants_provision(&self, id: ProvisionId) -> bool {
        self.provision_ids.is_empty() || self.provision_ids.contains(&id)
    }
}

/// Per-material quantities held by non-terminal order lines at one location.
///
/// This is a pure aggregation — no writes — but it must be computed inside
/// the same transaction as the subsequent evaluation to avoid racing with
/// concurrent order-status changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrozenInventory {
    pub ingredients: HashMap<IngredientId, f64>,
    pub provisions: HashMap<ProvisionId, f64>,
}

impl FrozenInventory {
    /// Aggregate reserved quantities for every active line (and its attached
    /// add-ons) at the location.
    pub fn calculate<S: AvailabilityStore + ?Sized>(
        store: &S,
        location_id: LocationId,
        filter: &FrozenFilter,
    ) -> DomainResult<Self> {
        let mut frozen = Self::default();

        for order in store.active_orders(location_id)? {
            for line in order.active_lines() {
                let Some(product) = lookup(store.location_product(line.location_product_id))?
                else {
                    continue;
                };
                if let Some(variant) = lookup(store.variant(product.variant_id))? {
                    frozen.reserve_ingredients(variant.bom.ingredients(), filter);
                    frozen.reserve_provisions(variant.bom.provisions(), filter);
                }

                for line_addon in &line.addons {
                    let Some(location_addon) =
                        lookup(store.location_addon(line_addon.location_addon_id))?
                    else {
                        continue;
                    };
                    if let Some(addon) = lookup(store.addon(location_addon.addon_id))? {
                        frozen.reserve_ingredients(addon.bom.ingredients(), filter);
                        frozen.reserve_provisions(addon.bom.provisions(), filter);
                    }
                }
            }
        }

        Ok(frozen)
    }

    pub fn reserved_ingredient(&self, id: IngredientId) -> f64 {
        self.ingredients.get(&id).copied().unwrap_or(0.0)
    }

    pub fn reserved_provision(&self, id: ProvisionId) -> f64 {
        self.provisions.get(&id).copied().unwrap_or(0.0)
    }

    fn reserve_ingredients(
        &mut self,
        rows: impl Iterator<Item = (IngredientId, f64)>,
        filter: &FrozenFilter,
    ) {
        for (id, quantity) in rows {
            if filter.wants_ingredient(id) {
                *self.ingredients.entry(id).or_insert(0.0) += quantity;
            }
        }
    }

    fn reserve_provisions(
        &mut self,
        rows: impl Iterator<Item = (ProvisionId, f64)>,
        filter: &FrozenFilter,
    ) {
        for (id, volume) in rows {
            if filter.wants_provision(id) {
                *self.provisions.entry(id).or_insert(0.0) += volume;
            }
        }
    }
}
