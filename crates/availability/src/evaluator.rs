//! Availability evaluator: sufficiency checks per wrapper.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use stockline_stock::{IngredientId, ProvisionId};

use crate::frozen::FrozenInventory;

/// Frozen-adjusted stock visible to the evaluator.
///
/// Ingredient availability may go negative (over-reservation simply fails
/// every comparison); provision availability is floored at 0 so rounding or
/// concurrent updates never produce a negative volume input.
#[derive(Debug, Clone, Default)]
pub struct StockView {
    ingredient_available: HashMap<IngredientId, f64>,
    provision_available: HashMap<ProvisionId, f64>,
}

impl StockView {
    pub fn build(
        physical: &HashMap<IngredientId, f64>,
        eligible_volumes: &HashMap<ProvisionId, f64>,
        frozen: &FrozenInventory,
        ingredients: impl IntoIterator<Item = IngredientId>,
        provisions: impl IntoIterator<Item = ProvisionId>,
    ) -> Self {
        let mut view = Self::default();
        for id in ingredients {
            let quantity = physical.get(&id).copied().unwrap_or(0.0);
            view.ingredient_available
                .insert(id, quantity - frozen.reserved_ingredient(id));
        }
        for id in provisions {
            let volume = eligible_volumes.get(&id).copied().unwrap_or(0.0);
            view.provision_available
                .insert(id, (volume - frozen.reserved_provision(id)).max(0.0));
        }
        view
    }

    pub fn ingredient_available(&self, id: IngredientId) -> f64 {
        self.ingredient_available.get(&id).copied().unwrap_or(0.0)
    }

    pub fn provision_available(&self, id: ProvisionId) -> f64 {
        self.provision_available.get(&id).copied().unwrap_or(0.0)
    }
}

/// Requirement rows for one wrapper. Rows are kept distinct (a variant and
/// its default add-on may each require the same ingredient); every row must
/// be satisfied independently.
#[derive(Debug, Clone)]
pub struct WrapperRequirements<W> {
    pub owner: W,
    pub ingredients: Vec<(IngredientId, f64)>,
    pub provisions: Vec<(ProvisionId, f64)>,
}

impl<W> WrapperRequirements<W> {
    /// A wrapper with zero requirements of a class is trivially satisfied
    /// for that class.
    pub fn is_satisfied_by(&self, view: &StockView) -> bool {
        self.ingredients
            .iter()
            .all(|(id, required)| view.ingredient_available(*id) >= *required)
            && self
                .provisions
                .iter()
                .all(|(id, required)| view.provision_available(*id) >= *required)
    }
}

/// Split wrappers into (out-of-stock, in-stock) — disjoint sets covering
/// exactly the evaluated wrappers.
pub fn split_by_sufficiency<W: Copy + Eq + Hash>(
    requirements: &[WrapperRequirements<W>],
    view: &StockView,
) -> (HashSet<W>, HashSet<W>) {
    let mut out_of_stock = HashSet::new();
    let mut in_stock = HashSet::new();

    for req in requirements {
        if req.is_satisfied_by(view) {
            in_stock.insert(req.owner);
        } else {
            out_of_stock.insert(req.owner);
        }
    }

    (out_of_stock, in_stock)
}
