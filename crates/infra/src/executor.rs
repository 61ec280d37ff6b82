//! Serialized transition execution.
//!
//! Every write to an entity goes through [`TransitionExecutor`], which holds a
//! per-entity mutex across load → validate → save. Two callers racing on the
//! same entity are applied one after the other; the second one sees the first
//! one's result. The repository's version check backs this up for writers
//! that bypass the executor.
//!
//! ```text
//! lock(id)
//!   ↓
//! 1. Load the current version from the repository
//!   ↓
//! 2. Run the operation (transition or edit) on it; the domain returns a copy
//!   ↓
//! 3. Derive the settlement events for the change
//!   ↓
//! 4. Save with ExpectedVersion::Exact(current)
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use tradeflow_core::{DomainError, DomainResult, Entity, ExpectedVersion};
use tradeflow_financial::{CardReconciliation, Commission, FinancialAccount};
use tradeflow_logistics::Load;
use tradeflow_purchasing::Purchase;
use tradeflow_sales::Order;
use tradeflow_settlement::{DomainEvent, Transitioned, events_for, load_assembled};
use tradeflow_workflow::{Lifecycle, StatusKey, transition};

use crate::repository::{Repository, Stored};

/// An entity kind whose changes may request follow-up work elsewhere.
pub trait Linked: Lifecycle + Stored {
    /// Events requested by a newly stored entity.
    fn created_events(&self) -> Vec<DomainEvent> {
        Vec::new()
    }

    /// Events requested by a change that left status `from`.
    fn changed_events(&self, _from: Self::Status) -> DomainResult<Vec<DomainEvent>> {
        Ok(Vec::new())
    }
}

impl Linked for Purchase {
    fn changed_events(&self, from: Self::Status) -> DomainResult<Vec<DomainEvent>> {
        events_for(Transitioned::Purchase {
            purchase: self,
            from,
        })
    }
}

impl Linked for Order {
    fn changed_events(&self, from: Self::Status) -> DomainResult<Vec<DomainEvent>> {
        events_for(Transitioned::Order { order: self, from })
    }
}

impl Linked for Load {
    fn created_events(&self) -> Vec<DomainEvent> {
        load_assembled(self)
    }

    fn changed_events(&self, from: Self::Status) -> DomainResult<Vec<DomainEvent>> {
        events_for(Transitioned::Load { load: self, from })
    }
}

impl Linked for FinancialAccount {}
impl Linked for Commission {}
impl Linked for CardReconciliation {}

/// Outcome of a successful executor write.
#[derive(Debug, Clone)]
pub struct Executed<E: Lifecycle> {
    /// The entity as saved.
    pub entity: E,
    /// Status before the write.
    pub from: E::Status,
    pub events: Vec<DomainEvent>,
}

/// Applies writes to one entity kind, one at a time per entity.
pub struct TransitionExecutor<E: Entity, R> {
    repo: R,
    locks: Mutex<HashMap<E::Id, Arc<Mutex<()>>>>,
}

impl<E, R> TransitionExecutor<E, R>
where
    E: Linked,
    R: Repository<E>,
{
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn get(&self, id: E::Id) -> DomainResult<E> {
        self.repo.get(id)?.ok_or_else(DomainError::not_found)
    }

    /// Store a new entity; fails with `Conflict` if the id is taken.
    pub fn create(&self, entity: E) -> DomainResult<Vec<DomainEvent>> {
        let id = entity.id();
        self.serialized(id, || {
            let events = entity.created_events();
            let kind = entity.kind();
            let status = entity.status();
            self.repo.save(entity, ExpectedVersion::New)?;

            info!(
                kind = kind.as_str(),
                %id,
                status = status.key(),
                events = events.len(),
                "entity created"
            );
            Ok(events)
        })
    }

    /// Move the stored entity to `target`.
    pub fn execute(
        &self,
        id: E::Id,
        target: E::Status,
        ctx: &E::Context,
        at: DateTime<Utc>,
    ) -> DomainResult<Executed<E>> {
        self.apply(id, |current| transition(current, target, ctx, at))
    }

    /// Run `op` on the stored entity and save its result.
    ///
    /// `op` gets the current version and returns the replacement; the
    /// repository is untouched when it fails.
    pub fn apply<F>(&self, id: E::Id, op: F) -> DomainResult<Executed<E>>
    where
        F: FnOnce(&E) -> DomainResult<E>,
    {
        self.serialized(id, || {
            let current = self.get(id)?;
            let from = current.status();
            let kind = current.kind();

            let next = match op(&current) {
                Ok(next) => next,
                Err(err) => {
                    warn!(
                        kind = kind.as_str(),
                        %id,
                        status = from.key(),
                        code = err.code(),
                        error = %err,
                        "entity change rejected"
                    );
                    return Err(err);
                }
            };

            let events = next.changed_events(from)?;
            self.repo
                .save(next.clone(), ExpectedVersion::Exact(current.version()))?;

            info!(
                kind = kind.as_str(),
                %id,
                from = from.key(),
                to = next.status().key(),
                version = next.version(),
                events = events.len(),
                "entity updated"
            );
            Ok(Executed {
                entity: next,
                from,
                events,
            })
        })
    }

    /// Run `f` holding the lock of entity `id`.
    ///
    /// The lock is dropped from the table once no other caller holds or
    /// waits on it.
    fn serialized<T>(&self, id: E::Id, f: impl FnOnce() -> DomainResult<T>) -> DomainResult<T> {
        let lock = self.lock_for(id)?;
        let result = match lock.lock() {
            Ok(_guard) => f(),
            Err(_) => Err(DomainError::conflict("entity lock poisoned")),
        };
        drop(lock);
        self.release(id);
        result
    }

    fn lock_for(&self, id: E::Id) -> DomainResult<Arc<Mutex<()>>> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| DomainError::conflict("lock table poisoned"))?;
        Ok(Arc::clone(locks.entry(id).or_default()))
    }

    fn release(&self, id: E::Id) {
        let Ok(mut locks) = self.locks.lock() else {
            return;
        };
        if locks.get(&id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    use chrono::NaiveDate;
    use tradeflow_core::{AggregateId, Money, PaymentCondition, ProductId, SupplierId};
    use tradeflow_purchasing::{NewPurchase, PurchaseId, PurchaseItem};
    use tradeflow_workflow::PurchaseStatus;

    use crate::repository::InMemoryRepository;

    type Purchases = TransitionExecutor<Purchase, Arc<InMemoryRepository<Purchase>>>;

    fn test_time() -> DateTime<Utc> {
        DateTime::from_timestamp(1_717_236_000, 0).unwrap()
    }

    fn purchase_id() -> PurchaseId {
        PurchaseId::new(AggregateId::from_u128(1))
    }

    fn seeded() -> Purchases {
        let executor = TransitionExecutor::new(Arc::new(InMemoryRepository::new()));
        let purchase = Purchase::create(
            NewPurchase {
                id: purchase_id(),
                supplier_id: SupplierId::new(AggregateId::from_u128(900)),
                purchase_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                payment_condition: PaymentCondition::Net30,
                custom_payment_days: None,
                nfe_key: Some("35240612345678000190550010000012341000012345".to_string()),
                items: vec![PurchaseItem {
                    product_id: ProductId::new(AggregateId::from_u128(10)),
                    description: "Pneu 295/80R22.5".to_string(),
                    quantity: 20,
                    unit_cost: Money::parse("320").unwrap(),
                    freight_per_tire: Money::parse("15").unwrap(),
                }],
            },
            test_time(),
        )
        .unwrap();
        assert!(executor.create(purchase).unwrap().is_empty());
        executor
    }

    #[test]
    fn execute_saves_the_new_version() {
        let executor = seeded();
        let done = executor
            .execute(purchase_id(), PurchaseStatus::AwaitingDelivery, &(), test_time())
            .unwrap();

        assert_eq!(done.from, PurchaseStatus::Created);
        assert!(done.events.is_empty());
        let stored = executor.get(purchase_id()).unwrap();
        assert_eq!(stored, done.entity);
        assert_eq!(stored.version(), 2);
    }

    #[test]
    fn rejected_transition_leaves_the_store_untouched() {
        let executor = seeded();
        let before = executor.get(purchase_id()).unwrap();

        let err = executor
            .execute(purchase_id(), PurchaseStatus::Received, &(), test_time())
            .unwrap_err();
        assert!(matches!(err, DomainError::IllegalTransition { .. }));
        assert_eq!(executor.get(purchase_id()).unwrap(), before);
    }

    #[test]
    fn unknown_entities_are_not_found() {
        let executor = seeded();
        let missing = PurchaseId::new(AggregateId::from_u128(2));
        assert!(matches!(
            executor.execute(missing, PurchaseStatus::Cancelled, &(), test_time()),
            Err(DomainError::NotFound)
        ));
    }

    #[test]
    fn duplicate_create_conflicts() {
        let executor = seeded();
        let existing = executor.get(purchase_id()).unwrap();
        assert!(matches!(executor.create(existing), Err(DomainError::Conflict(_))));
    }

    #[test]
    fn apply_derives_settlement_events() {
        let executor = seeded();
        executor
            .apply(purchase_id(), |p| {
                p.record_delivery(NaiveDate::from_ymd_opt(2024, 6, 5).unwrap(), None, test_time())
            })
            .unwrap();

        let done = executor
            .apply(purchase_id(), |p| p.confirm_stock_entry(test_time()))
            .unwrap();
        assert_eq!(done.from, PurchaseStatus::Created);
        assert_eq!(done.entity.status(), PurchaseStatus::Received);
        let kinds: Vec<_> = done.events.iter().map(DomainEvent::event_type).collect();
        assert_eq!(
            kinds,
            vec![
                "purchasing.purchase.stock_entry_requested",
                "financial.payable.creation_requested"
            ]
        );
    }

    #[test]
    fn concurrent_writers_are_serialized() {
        let executor = Arc::new(seeded());

        // Both threads race to cancel; exactly one wins, the other sees the
        // cancelled purchase and hits a terminal status.
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let executor = Arc::clone(&executor);
                thread::spawn(move || {
                    executor
                        .execute(purchase_id(), PurchaseStatus::Cancelled, &(), test_time())
                        .is_ok()
                })
            })
            .collect();
        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(wins, 1);
        let stored = executor.get(purchase_id()).unwrap();
        assert_eq!(stored.status(), PurchaseStatus::Cancelled);
        assert_eq!(stored.version(), 2);
        assert!(executor.locks.lock().unwrap().is_empty());
    }

    #[test]
    fn lock_table_only_holds_entities_in_use() {
        let executor = seeded();
        assert!(executor.locks.lock().unwrap().is_empty());

        executor
            .execute(purchase_id(), PurchaseStatus::AwaitingDelivery, &(), test_time())
            .unwrap();
        let _ = executor.execute(purchase_id(), PurchaseStatus::Received, &(), test_time());
        let _ = executor.execute(
            PurchaseId::new(AggregateId::from_u128(2)),
            PurchaseStatus::Cancelled,
            &(),
            test_time(),
        );
        assert!(executor.locks.lock().unwrap().is_empty());

        // held while the write runs
        executor
            .apply(purchase_id(), |p| {
                assert_eq!(executor.locks.lock().unwrap().len(), 1);
                Ok(p.clone())
            })
            .unwrap();
        assert!(executor.locks.lock().unwrap().is_empty());
    }
}
