//! Entity repositories.
//!
//! The domain crates only take and return values; storing them is the job of
//! a [`Repository`]. Saves carry an [`ExpectedVersion`] so two writers racing
//! on the same entity cannot silently overwrite each other.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::warn;

use tradeflow_core::{DomainError, DomainResult, Entity, ExpectedVersion};
use tradeflow_financial::{CardReconciliation, Commission, FinancialAccount};
use tradeflow_logistics::Load;
use tradeflow_purchasing::{Purchase, ensure_unique_nfe_key};
use tradeflow_sales::Order;

/// Versioned key/value storage for one entity kind.
pub trait Repository<E: Entity>: Send + Sync {
    fn get(&self, id: E::Id) -> DomainResult<Option<E>>;

    /// Store `entity`, failing with `Conflict` when the stored version does
    /// not match `expected`.
    fn save(&self, entity: E, expected: ExpectedVersion) -> DomainResult<()>;

    fn list(&self) -> DomainResult<Vec<E>>;
}

impl<E, S> Repository<E> for Arc<S>
where
    E: Entity,
    S: Repository<E> + ?Sized,
{
    fn get(&self, id: E::Id) -> DomainResult<Option<E>> {
        (**self).get(id)
    }

    fn save(&self, entity: E, expected: ExpectedVersion) -> DomainResult<()> {
        (**self).save(entity, expected)
    }

    fn list(&self) -> DomainResult<Vec<E>> {
        (**self).list()
    }
}

/// An entity the in-memory repository can hold.
pub trait Stored: Entity + Clone + Send + Sync {
    /// Uniqueness rules spanning entities, checked against every other stored
    /// entity of the kind before a save.
    fn check_unique<'a>(&self, _existing: impl Iterator<Item = &'a Self>) -> DomainResult<()>
    where
        Self: 'a,
    {
        Ok(())
    }
}

impl Stored for Purchase {
    fn check_unique<'a>(&self, existing: impl Iterator<Item = &'a Self>) -> DomainResult<()>
    where
        Self: 'a,
    {
        ensure_unique_nfe_key(self, existing)
    }
}

impl Stored for Order {}
impl Stored for Load {}
impl Stored for FinancialAccount {}
impl Stored for Commission {}
impl Stored for CardReconciliation {}

/// In-memory repository for tests/dev.
#[derive(Debug)]
pub struct InMemoryRepository<E: Entity> {
    inner: RwLock<HashMap<E::Id, E>>,
}

impl<E: Entity> InMemoryRepository<E> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<E: Entity> Default for InMemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Repository<E> for InMemoryRepository<E>
where
    E: Stored,
    E::Id: Send + Sync,
{
    fn get(&self, id: E::Id) -> DomainResult<Option<E>> {
        let map = self
            .inner
            .read()
            .map_err(|_| DomainError::conflict("repository lock poisoned"))?;
        Ok(map.get(&id).cloned())
    }

    fn save(&self, entity: E, expected: ExpectedVersion) -> DomainResult<()> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::conflict("repository lock poisoned"))?;

        let id = entity.id();
        let stored = map.get(&id).map(Entity::version);
        if let Err(err) = expected.check(stored) {
            warn!(%id, ?expected, ?stored, "stale save rejected");
            return Err(err);
        }
        entity.check_unique(map.iter().filter(|(k, _)| **k != id).map(|(_, v)| v))?;

        map.insert(id, entity);
        Ok(())
    }

    fn list(&self) -> DomainResult<Vec<E>> {
        let map = self
            .inner
            .read()
            .map_err(|_| DomainError::conflict("repository lock poisoned"))?;
        Ok(map.values().cloned().collect())
    }
}
