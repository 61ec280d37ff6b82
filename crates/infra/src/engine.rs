//! In-process settlement orchestrator.
//!
//! Wires one executor per entity kind over in-memory repositories and
//! fulfils the [`DomainEvent`]s the settlement linker emits: orders join,
//! leave and complete loads; receivables, payables and commissions are
//! opened. Stock entries and NF-e emission have no in-process consumer and
//! are handed back to the caller.
//!
//! Handlers are idempotent: redelivering an event whose work is already done
//! is a no-op. Accounts and commissions get ids derived from the document
//! they settle, so concurrent redeliveries collide on creation and only the
//! first one opens anything.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info};

use tradeflow_cashflow::{CashFlowProjection, project_within};
use tradeflow_core::{
    AggregateId, DomainError, DomainResult, Entity, LoadId, Money, due_date, utc_day,
};
use tradeflow_financial::{
    AccountDirection, AccountId, CardReconciliation, Commission, CommissionId, FinancialAccount,
    NewAccount, split_installments,
};
use tradeflow_logistics::Load;
use tradeflow_purchasing::Purchase;
use tradeflow_sales::{Order, OrderContext, OrderId};
use tradeflow_settlement::DomainEvent;
use tradeflow_workflow::{Lifecycle, OrderStatus};

use crate::config::EngineConfig;
use crate::executor::{Linked, TransitionExecutor};
use crate::repository::{InMemoryRepository, Repository};

pub type InMemoryExecutor<E> = TransitionExecutor<E, Arc<InMemoryRepository<E>>>;

fn in_memory<E: Linked>() -> InMemoryExecutor<E>
where
    E::Id: Send + Sync,
{
    TransitionExecutor::new(Arc::new(InMemoryRepository::new()))
}

/// Result of running a batch of events through [`Engine::settle`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settlement {
    /// Every event handled in-process, in handling order (follow-ups included).
    pub applied: Vec<DomainEvent>,
    /// Events left for external consumers (stock, NF-e).
    pub forwarded: Vec<DomainEvent>,
}

pub struct Engine {
    config: EngineConfig,
    purchases: InMemoryExecutor<Purchase>,
    orders: InMemoryExecutor<Order>,
    loads: InMemoryExecutor<Load>,
    accounts: InMemoryExecutor<FinancialAccount>,
    commissions: InMemoryExecutor<Commission>,
    cards: InMemoryExecutor<CardReconciliation>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            purchases: in_memory(),
            orders: in_memory(),
            loads: in_memory(),
            accounts: in_memory(),
            commissions: in_memory(),
            cards: in_memory(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn purchases(&self) -> &InMemoryExecutor<Purchase> {
        &self.purchases
    }

    pub fn orders(&self) -> &InMemoryExecutor<Order> {
        &self.orders
    }

    pub fn loads(&self) -> &InMemoryExecutor<Load> {
        &self.loads
    }

    pub fn accounts(&self) -> &InMemoryExecutor<FinancialAccount> {
        &self.accounts
    }

    pub fn commissions(&self) -> &InMemoryExecutor<Commission> {
        &self.commissions
    }

    pub fn cards(&self) -> &InMemoryExecutor<CardReconciliation> {
        &self.cards
    }

    /// Handle `events` and every follow-up they cause, breadth first.
    ///
    /// Stops at the first failing handler; work already applied stays applied
    /// and can be completed by redelivering the remaining events.
    pub fn settle(&self, events: Vec<DomainEvent>) -> DomainResult<Settlement> {
        let mut queue: VecDeque<DomainEvent> = events.into();
        let mut settlement = Settlement::default();

        while let Some(event) = queue.pop_front() {
            match event {
                DomainEvent::StockEntryRequested { .. } | DomainEvent::NfeEmissionRequested { .. } => {
                    info!(event_type = event.event_type(), "event forwarded");
                    settlement.forwarded.push(event);
                }
                _ => {
                    let follow_ups = self.handle(&event)?;
                    debug!(
                        event_type = event.event_type(),
                        follow_ups = follow_ups.len(),
                        "event applied"
                    );
                    queue.extend(follow_ups);
                    settlement.applied.push(event);
                }
            }
        }
        Ok(settlement)
    }

    /// Fulfil one event, returning the events the resulting changes request.
    pub fn handle(&self, event: &DomainEvent) -> DomainResult<Vec<DomainEvent>> {
        match event {
            DomainEvent::OrderLoadAssignmentRequested {
                order_id,
                load_id,
                occurred_at,
            } => self.move_order(
                *order_id,
                OrderStatus::InLoad,
                OrderContext::for_load(*load_id),
                *occurred_at,
            ),
            DomainEvent::OrderDeliveryRequested {
                order_id,
                load_id,
                amount,
                occurred_at,
            } => self.move_order(
                *order_id,
                OrderStatus::Delivered,
                OrderContext::delivered_by(*load_id, *amount),
                *occurred_at,
            ),
            DomainEvent::OrderReleaseRequested {
                order_id,
                load_id,
                occurred_at,
            } => self.move_order(
                *order_id,
                OrderStatus::Pending,
                OrderContext::for_load(*load_id),
                *occurred_at,
            ),
            DomainEvent::ReceivableCreationRequested {
                order_id,
                load_id,
                amount,
                occurred_at,
            } => self.open_receivable(*order_id, *load_id, *amount, *occurred_at),
            DomainEvent::PayableCreationRequested {
                purchase_id,
                supplier_id,
                amount,
                due_date,
                occurred_at,
            } => {
                let document_id = purchase_id.as_aggregate_id();
                let id = AccountId::new(AggregateId::derived("payable", &[document_id]));
                if self.accounts.repository().get(id)?.is_some() {
                    debug!(%purchase_id, "payable already open");
                    return Ok(Vec::new());
                }
                let account = NewAccount {
                    id,
                    direction: AccountDirection::Payable,
                    counterparty_id: supplier_id.as_aggregate_id(),
                    document_id: Some(document_id),
                    description: format!("Payable for purchase {purchase_id}"),
                    installments: split_installments(*amount, 1, *due_date, 0)?,
                };
                self.open_account(account, *occurred_at)
            }
            DomainEvent::CommissionAccrualRequested {
                sale_id,
                seller_id,
                sale_amount,
                rate,
                occurred_at,
            } => {
                let sale = sale_id.as_aggregate_id();
                let id = CommissionId::new(AggregateId::derived("commission", &[sale]));
                if self.commissions.repository().get(id)?.is_some() {
                    debug!(%sale_id, "commission already accrued");
                    return Ok(Vec::new());
                }
                let commission =
                    Commission::accrue(id, sale, *seller_id, *sale_amount, *rate, *occurred_at)?;
                create_once(&self.commissions, commission)
            }
            DomainEvent::StockEntryRequested { .. } | DomainEvent::NfeEmissionRequested { .. } => {
                Ok(Vec::new())
            }
        }
    }

    /// Project the cash flow of every stored account as of `as_of`.
    pub fn project_cash_flow(&self, as_of: NaiveDate) -> DomainResult<CashFlowProjection> {
        let accounts = self.accounts.repository().list()?;
        let params = self.config.projection_params(as_of);
        let projection =
            project_within(&accounts, &params, self.config.cashflow_max_horizon_days)?;
        info!(
            %as_of,
            accounts = accounts.len(),
            days = projection.days.len(),
            final_balance = %projection.final_balance,
            min_balance = %projection.min_balance,
            "cash flow projected"
        );
        Ok(projection)
    }

    fn move_order(
        &self,
        order_id: OrderId,
        target: OrderStatus,
        ctx: OrderContext,
        at: DateTime<Utc>,
    ) -> DomainResult<Vec<DomainEvent>> {
        let order = self.orders.get(order_id)?;
        let already = order.status() == target
            && (target == OrderStatus::Pending || order.load_id() == ctx.load_id);
        if already {
            debug!(%order_id, status = ?target, "order already moved");
            return Ok(Vec::new());
        }
        let done = self.orders.execute(order_id, target, &ctx, at)?;
        Ok(done.events)
    }

    fn open_receivable(
        &self,
        order_id: OrderId,
        load_id: LoadId,
        amount: Money,
        at: DateTime<Utc>,
    ) -> DomainResult<Vec<DomainEvent>> {
        let document_id = order_id.as_aggregate_id();
        let id = AccountId::new(AggregateId::derived(
            "receivable",
            &[load_id.as_aggregate_id(), document_id],
        ));
        if self.accounts.repository().get(id)?.is_some() {
            debug!(%order_id, %load_id, "receivable already open");
            return Ok(Vec::new());
        }
        if !amount.is_positive() {
            debug!(%order_id, "nothing loaded for order, no receivable");
            return Ok(Vec::new());
        }

        let order = self.orders.get(order_id)?;
        let due = due_date(
            utc_day(at),
            order.payment_condition(),
            order.custom_payment_days(),
        )?;
        let account = NewAccount {
            id,
            direction: AccountDirection::Receivable,
            counterparty_id: order.customer_id().as_aggregate_id(),
            document_id: Some(document_id),
            description: format!("Receivable for order {order_id}"),
            installments: split_installments(amount, 1, due, 0)?,
        };
        self.open_account(account, at)
    }

    fn open_account(&self, new: NewAccount, at: DateTime<Utc>) -> DomainResult<Vec<DomainEvent>> {
        let direction = new.direction;
        let account = FinancialAccount::create(new, at)?;
        info!(
            direction = ?direction,
            account_id = %account.id(),
            amount = %account.totals().total_amount,
            "account opened"
        );
        create_once(&self.accounts, account)
    }
}

/// Store `entity` unless a concurrent delivery of the same event stored it
/// first; that one already returned the creation's events.
fn create_once<E: Linked>(
    executor: &InMemoryExecutor<E>,
    entity: E,
) -> DomainResult<Vec<DomainEvent>>
where
    E::Id: Send + Sync,
{
    let id = entity.id();
    match executor.create(entity) {
        Err(DomainError::Conflict(reason)) if executor.repository().get(id)?.is_some() => {
            debug!(%id, %reason, "already created");
            Ok(Vec::new())
        }
        other => other,
    }
}
