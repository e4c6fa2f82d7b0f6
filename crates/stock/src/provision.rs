use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockline_core::{AggregateId, Entity, LocationId};

/// Provision identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProvisionId(pub AggregateId);

impl ProvisionId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProvisionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Provision batch identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProvisionBatchId(pub AggregateId);

impl ProvisionBatchId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProvisionBatchId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Batch-tracked semi-prepared material (e.g. a syrup base prepared on site).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provision {
    pub id: ProvisionId,
    pub name: String,
    pub unit: crate::UnitOfMeasure,
}

impl Entity for Provision {
    type Id = ProvisionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Completion status of a provision batch.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Preparing,
    Completed,
    Empty,
}

/// One prepared batch of a provision at a location.
///
/// Only batches with status [`BatchStatus::Completed`] and an expiry in the
/// future (or none) count toward available volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisionBatch {
    pub id: ProvisionBatchId,
    pub location_id: LocationId,
    pub provision_id: ProvisionId,
    pub volume: f64,
    pub status: BatchStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ProvisionBatch {
    /// Whether the batch counts toward available volume at `now`.
    pub fn is_eligible(&self, now: DateTime<Utc>) -> bool {
        self.status == BatchStatus::Completed
            && self.expires_at.map(|exp| exp > now).unwrap_or(true)
    }

    /// Drain up to `requested` volume from the batch, returning the amount
    /// actually taken. A fully drained batch is marked [`BatchStatus::Empty`].
    pub fn drain(&mut self, requested: f64) -> f64 {
        let taken = requested.min(self.volume).max(0.0);
        self.volume -= taken;
        if self.volume <= 0.0 {
            self.volume = 0.0;
            self.status = BatchStatus::Empty;
        }
        taken
    }
}

impl Entity for ProvisionBatch {
    type Id = ProvisionBatchId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
