//! Composition resolver: changed entity IDs → affected wrappers.
//!
//! Traverses variant → direct materials and variant → default add-on →
//! materials. All lookups are set unions; ordering is irrelevant. The only
//! error conditions are storage-layer failures, which abort the whole
//! recalculation.

use stockline_catalog::{Addon, HasBillOfMaterials, Variant};
use stockline_core::{DomainError, DomainResult, LocationId};
use stockline_stock::{IngredientId, ProvisionId};

use crate::changed::{AffectedWrappers, ChangedEntities};
use crate::store::AvailabilityStore;

pub struct CompositionResolver;

impl CompositionResolver {
    /// Expand changed variant and add-on IDs into the ingredient/provision
    /// sets their composition consumes (direct plus default add-ons), so the
    /// frozen maps and sufficiency checks are scoped to everything the
    /// change can touch.
    pub fn expand_changed<S: AvailabilityStore + ?Sized>(
        store: &S,
        changed: &ChangedEntities,
    ) -> DomainResult<ChangedEntities> {
        let mut expanded = changed.clone();

        for variant_id in &changed.variant_ids {
            let Some(variant) = lookup(store.variant(*variant_id))? else {
                continue;
            };
            collect_variant_materials(store, &variant, &mut expanded)?;
        }
        for addon_id in &changed.addon_ids {
            let Some(addon) = lookup(store.addon(*addon_id))? else {
                continue;
            };
            expanded
                .ingredient_ids
                .extend(addon.bom.ingredients().map(|(id, _)| id));
            expanded
                .provision_ids
                .extend(addon.bom.provisions().map(|(id, _)| id));
        }

        Ok(expanded)
    }

    /// Union of affected product and add-on wrappers at a location.
    pub fn resolve<S: AvailabilityStore + ?Sized>(
        store: &S,
        location_id: LocationId,
        changed: &ChangedEntities,
    ) -> DomainResult<AffectedWrappers> {
        let mut affected = AffectedWrappers::default();

        for product in store.location_products(location_id)? {
            if changed.variant_ids.contains(&product.variant_id) {
                affected.products.insert(product.id);
                continue;
            }
            let Some(variant) = lookup(store.variant(product.variant_id))? else {
                continue;
            };
            if Self::variant_uses_changed_materials(store, &variant, changed)? {
                affected.products.insert(product.id);
            }
        }

        for location_addon in store.location_addons(location_id)? {
            if changed.addon_ids.contains(&location_addon.addon_id) {
                affected.addons.insert(location_addon.id);
                continue;
            }
            let Some(addon) = lookup(store.addon(location_addon.addon_id))? else {
                continue;
            };
            if addon_uses_changed_materials(&addon, changed) {
                affected.addons.insert(location_addon.id);
            }
        }

        Ok(affected)
    }

    fn variant_uses_changed_materials<S: AvailabilityStore + ?Sized>(
        store: &S,
        variant: &Variant,
        changed: &ChangedEntities,
    ) -> DomainResult<bool> {
        if bom_uses_changed_materials(variant.bill_of_materials(), changed) {
            return Ok(true);
        }
        // Default add-ons are auto-included, so their materials gate the
        // parent variant as well.
        for addon_id in variant.default_addon_ids() {
            let Some(addon) = lookup(store.addon(addon_id))? else {
                continue;
            };
            if addon_uses_changed_materials(&addon, changed) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Requirement rows for one unit of a variant: its direct bill-of-materials
/// plus every default add-on's bill-of-materials, one row per requirement.
pub(crate) fn variant_requirement_rows<S: AvailabilityStore + ?Sized>(
    store: &S,
    variant: &Variant,
) -> DomainResult<(Vec<(IngredientId, f64)>, Vec<(ProvisionId, f64)>)> {
    let mut ingredients: Vec<(IngredientId, f64)> = variant.bom.ingredients().collect();
    let mut provisions: Vec<(ProvisionId, f64)> = variant.bom.provisions().collect();

    for addon_id in variant.default_addon_ids() {
        let Some(addon) = lookup(store.addon(addon_id))? else {
            continue;
        };
        ingredients.extend(addon.bom.ingredients());
        provisions.extend(addon.bom.provisions());
    }

    Ok((ingredients, provisions))
}

fn collect_variant_materials<S: AvailabilityStore + ?Sized>(
    store: &S,
    variant: &Variant,
    into: &mut ChangedEntities,
) -> DomainResult<()> {
    let (ingredients, provisions) = variant_requirement_rows(store, variant)?;
    into.ingredient_ids.extend(ingredients.into_iter().map(|(id, _)| id));
    into.provision_ids.extend(provisions.into_iter().map(|(id, _)| id));
    Ok(())
}

fn addon_uses_changed_materials(addon: &Addon, changed: &ChangedEntities) -> bool {
    bom_uses_changed_materials(addon.bill_of_materials(), changed)
}

fn bom_uses_changed_materials(
    bom: &stockline_catalog::BillOfMaterials,
    changed: &ChangedEntities,
) -> bool {
    changed
        .ingredient_ids
        .iter()
        .any(|id| bom.references_ingredient(*id))
        || changed
            .provision_ids
            .iter()
            .any(|id| bom.references_provision(*id))
}

/// Catalog rows can disappear between the triggering mutation and the
/// recalculation read; treat a missing row like an empty join result.
pub(crate) fn lookup<T>(result: DomainResult<T>) -> DomainResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(DomainError::NotFound) => Ok(None),
        Err(e) => Err(e),
    }
}
