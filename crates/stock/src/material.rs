use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use stockline_core::{AggregateId, Entity};

use crate::IngredientId;

/// Stock material identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialId(pub AggregateId);

impl MaterialId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for MaterialId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Warehouse-tracked purchasable unit, 1:1 with an ingredient.
///
/// The shelf life (in days) stamps the expiration date on delivered line
/// items; the safety threshold drives low-warehouse-stock notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: MaterialId,
    pub ingredient_id: IngredientId,
    pub name: String,
    pub shelf_life_days: i64,
    pub safety_threshold: f64,
}

impl Material {
    /// Expiration timestamp for stock delivered at `delivered_at` (UTC).
    pub fn expiration_from(&self, delivered_at: DateTime<Utc>) -> DateTime<Utc> {
        delivered_at + Duration::days(self.shelf_life_days)
    }
}

impl Entity for Material {
    type Id = MaterialId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
