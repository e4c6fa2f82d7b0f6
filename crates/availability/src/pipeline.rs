//! The read-side consistency pipeline: resolver → frozen → evaluator → flags.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::info;

use stockline_catalog::{LocationAddonId, LocationProductId};
use stockline_core::{DomainResult, LocationId};
use stockline_stock::{IngredientId, ProvisionId};

use crate::changed::ChangedEntities;
use crate::evaluator::{StockView, WrapperRequirements, split_by_sufficiency};
use crate::frozen::{FrozenFilter, FrozenInventory};
use crate::resolver::{CompositionResolver, lookup, variant_requirement_rows};
use crate::store::AvailabilityStore;

/// Result of one pipeline run. The four sets are disjoint per wrapper kind
/// and cover exactly the affected wrappers; `newly_out_*` lists wrappers
/// whose persisted flag flipped to out-of-stock (input for post-commit
/// notifications).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecalculationOutcome {
    pub products_out: HashSet<LocationProductId>,
    pub products_in: HashSet<LocationProductId>,
    pub addons_out: HashSet<LocationAddonId>,
    pub addons_in: HashSet<LocationAddonId>,
    pub newly_out_products: Vec<LocationProductId>,
    pub newly_out_addons: Vec<LocationAddonId>,
}

impl RecalculationOutcome {
    pub fn affected_count(&self) -> usize {
        self.products_out.len() + self.products_in.len() + self.addons_out.len() + self.addons_in.len()
    }
}

pub struct RecalculationPipeline;

impl RecalculationPipeline {
    /// Recompute out-of-stock flags for every wrapper affected by `changed`.
    ///
    /// Must run inside the storage transaction of the triggering mutation;
    /// any error aborts with no partial flag updates (the caller rolls the
    /// transaction back).
    pub fn run<S: AvailabilityStore + ?Sized>(
        store: &mut S,
        location_id: LocationId,
        changed: &ChangedEntities,
        now: DateTime<Utc>,
    ) -> DomainResult<RecalculationOutcome> {
        if changed.is_empty() {
            return Ok(RecalculationOutcome::default());
        }

        let changed = CompositionResolver::expand_changed(store, changed)?;
        let affected = CompositionResolver::resolve(store, location_id, &changed)?;
        if affected.is_empty() {
            return Ok(RecalculationOutcome::default());
        }

        // Requirement rows per affected wrapper. Products inherit their
        // default add-ons' rows; add-on wrappers stand alone.
        let mut product_requirements: Vec<WrapperRequirements<LocationProductId>> = Vec::new();
        for product_id in &affected.products {
            let mut req = WrapperRequirements {
                owner: *product_id,
                ingredients: vec![],
                provisions: vec![],
            };
            if let Some(product) = lookup(store.location_product(*product_id))?
                && let Some(variant) = lookup(store.variant(product.variant_id))?
            {
                (req.ingredients, req.provisions) = variant_requirement_rows(store, &variant)?;
            }
            product_requirements.push(req);
        }

        let mut addon_requirements: Vec<WrapperRequirements<LocationAddonId>> = Vec::new();
        for addon_wrapper_id in &affected.addons {
            let mut req = WrapperRequirements {
                owner: *addon_wrapper_id,
                ingredients: vec![],
                provisions: vec![],
            };
            if let Some(location_addon) = lookup(store.location_addon(*addon_wrapper_id))?
                && let Some(addon) = lookup(store.addon(location_addon.addon_id))?
            {
                req.ingredients = addon.bom.ingredients().collect();
                req.provisions = addon.bom.provisions().collect();
            }
            addon_requirements.push(req);
        }

        // Scope frozen reservations and stock reads to every material any
        // affected wrapper requires, not just the changed IDs, so the
        // sufficiency comparison always sees the full reservation.
        let needed_ingredients: HashSet<IngredientId> = product_requirements
            .iter()
            .flat_map(|r| r.ingredients.iter().map(|(id, _)| *id))
            .chain(
                addon_requirements
                    .iter()
                    .flat_map(|r| r.ingredients.iter().map(|(id, _)| *id)),
            )
            .collect();
        let needed_provisions: HashSet<ProvisionId> = product_requirements
            .iter()
            .flat_map(|r| r.provisions.iter().map(|(id, _)| *id))
            .chain(
                addon_requirements
                    .iter()
                    .flat_map(|r| r.provisions.iter().map(|(id, _)| *id)),
            )
            .collect();

        let frozen = FrozenInventory::calculate(
            store,
            location_id,
            &FrozenFilter {
                ingredient_ids: needed_ingredients.clone(),
                provision_ids: needed_provisions.clone(),
            },
        )?;
        let physical = store.ingredient_stock_levels(location_id, &needed_ingredients)?;
        let eligible = store.eligible_provision_volumes(location_id, &needed_provisions, now)?;

        let view = StockView::build(
            &physical,
            &eligible,
            &frozen,
            needed_ingredients.iter().copied(),
            needed_provisions.iter().copied(),
        );

        let (products_out, products_in) = split_by_sufficiency(&product_requirements, &view);
        let (addons_out, addons_in) = split_by_sufficiency(&addon_requirements, &view);

        let newly_out_products = store.set_product_flags(&products_out, true)?;
        store.set_product_flags(&products_in, false)?;
        let newly_out_addons = store.set_addon_flags(&addons_out, true)?;
        store.set_addon_flags(&addons_in, false)?;

        let outcome = RecalculationOutcome {
            products_out,
            products_in,
            addons_out,
            addons_in,
            newly_out_products,
            newly_out_addons,
        };

        info!(
            location = %location_id,
            affected = outcome.affected_count(),
            products_out = outcome.products_out.len(),
            addons_out = outcome.addons_out.len(),
            "availability recalculated"
        );

        Ok(outcome)
    }
}
