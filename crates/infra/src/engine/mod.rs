//! In-memory transactional engine.
//!
//! Holds the committed [`WorldState`] behind a `RwLock`. Writes run against
//! a clone of the state and are swapped in atomically on success; the write
//! lock is held for the whole operation, which serializes concurrent
//! recalculations for the same state as required for last-write-wins flag
//! consistency.

use std::sync::RwLock;

use thiserror::Error;

use stockline_core::DomainError;

mod transaction;
mod world;

pub use transaction::Transaction;
pub use world::WorldState;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("engine state lock poisoned")]
    LockPoisoned,
}

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Default)]
pub struct InMemoryEngine {
    world: RwLock<WorldState>,
}

impl InMemoryEngine {
    pub fn new(world: WorldState) -> Self {
        Self {
            world: RwLock::new(world),
        }
    }

    /// Run `op` in a transaction. On `Ok` the working copy becomes the
    /// committed state; on `Err` it is dropped and nothing changes.
    pub fn execute<T>(
        &self,
        op: impl FnOnce(&mut Transaction) -> Result<T, DomainError>,
    ) -> EngineResult<T> {
        let mut committed = self.world.write().map_err(|_| EngineError::LockPoisoned)?;
        let mut tx = Transaction::new(committed.clone());
        let value = op(&mut tx)?;
        *committed = tx.into_world();
        Ok(value)
    }

    /// Read from the committed state.
    pub fn read<T>(&self, op: impl FnOnce(&WorldState) -> T) -> EngineResult<T> {
        let committed = self.world.read().map_err(|_| EngineError::LockPoisoned)?;
        Ok(op(&committed))
    }
}
