use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use tradeflow_core::{DomainError, DomainResult, Entity, LoadId, Money, Timestamps};
use tradeflow_sales::{Order, OrderId};
use tradeflow_workflow::{EntityKind, Lifecycle, LoadStatus, OrderStatus, require};

use crate::item::{LoadItem, check_loaded_quantity};
use crate::totals::{LoadTotals, calculate_load_totals, sum_loaded};

/// Truck and route information recorded with the load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadDetails {
    pub vehicle_plate: Option<String>,
    pub driver_name: Option<String>,
    pub departure_date: Option<NaiveDate>,
}

/// Counted quantity for one load item, keyed by order and line position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConferenceEntry {
    pub order_id: OrderId,
    /// Index of the line in the order's items.
    pub line: usize,
    pub loaded_quantity: i64,
}

/// A delivery run carrying one or more orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Load {
    id: LoadId,
    status: LoadStatus,
    details: LoadDetails,
    order_ids: Vec<OrderId>,
    items: Vec<LoadItem>,
    totals: LoadTotals,
    /// Totals frozen when the load leaves for delivery.
    dispatched_totals: Option<LoadTotals>,
    version: u64,
    timestamps: Timestamps,
}

impl Load {
    /// Build a load from pending orders, copying their lines.
    pub fn assemble(
        id: LoadId,
        details: LoadDetails,
        orders: &[Order],
        at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let (order_ids, items) = collect_orders(orders)?;
        let totals = calculate_load_totals(&items)?;

        Ok(Self {
            id,
            status: LoadStatus::Pending,
            details,
            order_ids,
            items,
            totals,
            dispatched_totals: None,
            version: 1,
            timestamps: Timestamps::created(at),
        })
    }

    pub fn details(&self) -> &LoadDetails {
        &self.details
    }

    pub fn order_ids(&self) -> &[OrderId] {
        &self.order_ids
    }

    pub fn items(&self) -> &[LoadItem] {
        &self.items
    }

    pub fn totals(&self) -> &LoadTotals {
        &self.totals
    }

    pub fn dispatched_totals(&self) -> Option<&LoadTotals> {
        self.dispatched_totals.as_ref()
    }

    /// Replace the carried orders. Only while the load is `pending`.
    pub fn with_orders(&self, orders: &[Order], at: DateTime<Utc>) -> DomainResult<Self> {
        require(
            EntityKind::Load,
            self.status == LoadStatus::Pending,
            "orders can only change while the load is pending",
        )?;
        let (order_ids, items) = collect_orders(orders)?;
        let totals = calculate_load_totals(&items)?;

        let mut next = self.clone();
        next.order_ids = order_ids;
        next.items = items;
        next.totals = totals;
        next.bump(at);
        Ok(next)
    }

    /// Record counted quantities. Only legal while `loading`.
    ///
    /// Every entry must match an item of the load and name it once;
    /// `0 <= loaded <= ordered`.
    pub fn confer(&self, entries: &[ConferenceEntry], at: DateTime<Utc>) -> DomainResult<Self> {
        require(
            EntityKind::Load,
            self.status == LoadStatus::Loading,
            "conference happens while the load is loading",
        )?;

        let mut items = self.items.clone();
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in entries {
            if !seen.insert((entry.order_id, entry.line)) {
                return Err(DomainError::invalid_line_item(format!(
                    "order {} line {} is conferred twice",
                    entry.order_id, entry.line
                )));
            }
            let item = items
                .iter_mut()
                .find(|i| i.order_id == entry.order_id && i.line == entry.line)
                .ok_or_else(|| {
                    DomainError::invalid_line_item(format!(
                        "load {} has no item for order {} line {}",
                        self.id, entry.order_id, entry.line
                    ))
                })?;
            check_loaded_quantity(&item.description, item.ordered_quantity, entry.loaded_quantity)?;
            item.loaded_quantity = Some(entry.loaded_quantity);
        }
        let totals = calculate_load_totals(&items)?;

        let mut next = self.clone();
        next.items = items;
        next.totals = totals;
        next.bump(at);
        Ok(next)
    }

    /// Sale value carried for each order, on loaded quantities, in load order.
    pub fn value_by_order(&self) -> DomainResult<Vec<(OrderId, Money)>> {
        self.order_ids
            .iter()
            .map(|order_id| {
                let value = Money::sum(
                    self.items
                        .iter()
                        .filter(|i| i.order_id == *order_id)
                        .map(LoadItem::sale_value)
                        .collect::<DomainResult<Vec<_>>>()?,
                )?;
                Ok((*order_id, value))
            })
            .collect()
    }

    /// Units of `order_id` on the truck (ordered units before conference).
    pub fn loaded_units(&self, order_id: OrderId) -> DomainResult<i64> {
        sum_loaded(self.items.iter().filter(|i| i.order_id == order_id))
    }

    fn bump(&mut self, at: DateTime<Utc>) {
        self.version += 1;
        self.timestamps.touch(at);
    }
}

fn collect_orders(orders: &[Order]) -> DomainResult<(Vec<OrderId>, Vec<LoadItem>)> {
    let mut order_ids = Vec::with_capacity(orders.len());
    let mut items = Vec::new();

    for order in orders {
        let order_id = order.id();
        if order_ids.contains(&order_id) {
            return Err(DomainError::duplicate_reference(format!("order {order_id}")));
        }
        require(
            EntityKind::Load,
            order.status() == OrderStatus::Pending,
            &format!("order {order_id} is pending"),
        )?;
        order_ids.push(order_id);
        items.extend(
            order
                .items()
                .iter()
                .enumerate()
                .map(|(line, item)| LoadItem::from_order_item(order_id, line, item)),
        );
    }

    Ok((order_ids, items))
}

impl Entity for Load {
    type Id = LoadId;

    fn id(&self) -> LoadId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }
}

impl Lifecycle for Load {
    type Status = LoadStatus;
    type Context = ();

    fn kind(&self) -> EntityKind {
        EntityKind::Load
    }

    fn status(&self) -> LoadStatus {
        self.status
    }

    fn check_guards(&self, target: LoadStatus, _ctx: &()) -> DomainResult<()> {
        let kind = EntityKind::Load;
        if self.status == LoadStatus::Pending && target != LoadStatus::Cancelled {
            require(kind, !self.items.is_empty(), "load has at least one item")?;
        }
        if target == LoadStatus::InTransit {
            require(
                kind,
                self.items.iter().all(LoadItem::is_conferred),
                "every item has a loaded quantity",
            )?;
            require(
                kind,
                self.items.iter().any(|i| i.effective_quantity() > 0),
                "at least one unit is loaded",
            )?;
        }
        Ok(())
    }

    fn enter(&mut self, target: LoadStatus, _ctx: &(), at: DateTime<Utc>) -> DomainResult<()> {
        self.totals = calculate_load_totals(&self.items)?;
        if target == LoadStatus::InTransit {
            self.dispatched_totals = Some(self.totals);
            self.timestamps.finalize(at);
        }
        self.status = target;
        self.bump(at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradeflow_core::{AggregateId, CustomerId, PaymentCondition, ProductId};
    use tradeflow_sales::{NewOrder, OrderContext, OrderItem};
    use tradeflow_workflow::{StatusKey, transition};

    fn test_time() -> DateTime<Utc> {
        DateTime::from_timestamp(1_717_236_000, 0).unwrap()
    }

    fn product(n: u128) -> ProductId {
        ProductId::new(AggregateId::from_u128(1_000 + n))
    }

    fn order(n: u128, quantity: i64) -> Order {
        Order::create(
            NewOrder {
                id: OrderId::new(AggregateId::from_u128(n)),
                customer_id: CustomerId::new(AggregateId::from_u128(77)),
                order_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                payment_condition: PaymentCondition::Cash,
                custom_payment_days: None,
                seller: None,
                items: vec![OrderItem {
                    product_id: product(n),
                    description: format!("Pneu {n}"),
                    quantity,
                    sale_price: Money::parse("500.00").unwrap(),
                    purchase_cost: Money::parse("380.00").unwrap(),
                    freight_per_tire: Money::parse("10.00").unwrap(),
                }],
            },
            test_time(),
        )
        .unwrap()
    }

    fn pending_load() -> Load {
        Load::assemble(
            LoadId::new(AggregateId::from_u128(900)),
            LoadDetails::default(),
            &[order(1, 10), order(2, 5)],
            test_time(),
        )
        .unwrap()
    }

    fn loading_load() -> Load {
        transition(&pending_load(), LoadStatus::Loading, &(), test_time()).unwrap()
    }

    fn entry(n: u128, loaded: i64) -> ConferenceEntry {
        line_entry(n, 0, loaded)
    }

    fn line_entry(n: u128, line: usize, loaded: i64) -> ConferenceEntry {
        ConferenceEntry {
            order_id: OrderId::new(AggregateId::from_u128(n)),
            line,
            loaded_quantity: loaded,
        }
    }

    fn conferred_load() -> Load {
        loading_load()
            .confer(&[entry(1, 8), entry(2, 5)], test_time())
            .unwrap()
    }

    fn load_in(status: LoadStatus) -> Load {
        match status {
            LoadStatus::Pending => pending_load(),
            LoadStatus::Loading => conferred_load(),
            LoadStatus::InTransit => {
                transition(&conferred_load(), LoadStatus::InTransit, &(), test_time()).unwrap()
            }
            LoadStatus::Delivered => {
                let transit =
                    transition(&conferred_load(), LoadStatus::InTransit, &(), test_time()).unwrap();
                transition(&transit, LoadStatus::Delivered, &(), test_time()).unwrap()
            }
            LoadStatus::Cancelled => {
                transition(&pending_load(), LoadStatus::Cancelled, &(), test_time()).unwrap()
            }
        }
    }

    #[test]
    fn assemble_copies_order_lines() {
        let load = pending_load();
        assert_eq!(load.order_ids().len(), 2);
        assert_eq!(load.items().len(), 2);
        assert_eq!(load.totals().total_ordered, 15);
        assert_eq!(load.totals().total_freight.to_string(), "150.00");
        assert!(load.items().iter().all(|i| i.loaded_quantity.is_none()));
    }

    #[test]
    fn assemble_rejects_orders_already_in_a_load() {
        let in_load = transition(
            &order(1, 10),
            OrderStatus::InLoad,
            &OrderContext::for_load(LoadId::new(AggregateId::from_u128(1))),
            test_time(),
        )
        .unwrap();
        let err = Load::assemble(
            LoadId::new(AggregateId::from_u128(900)),
            LoadDetails::default(),
            &[in_load],
            test_time(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::GuardFailed { .. }));

        let err = Load::assemble(
            LoadId::new(AggregateId::from_u128(900)),
            LoadDetails::default(),
            &[order(1, 10), order(1, 10)],
            test_time(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::DuplicateReference(_)));
    }

    #[test]
    fn conference_recomputes_freight_on_loaded_quantities() {
        let load = conferred_load();
        assert_eq!(load.totals().total_loaded, 13);
        assert_eq!(load.totals().total_freight.to_string(), "130.00");
        assert!(load.totals().has_discrepancy);
        assert_eq!(load.items()[0].discrepancy(), Some(-2));

        let values = load.value_by_order().unwrap();
        assert_eq!(values[0].1.to_string(), "4000.00");
        assert_eq!(values[1].1.to_string(), "2500.00");
    }

    #[test]
    fn conference_is_only_legal_while_loading() {
        let err = pending_load().confer(&[entry(1, 8)], test_time()).unwrap_err();
        assert!(matches!(err, DomainError::GuardFailed { .. }));

        let transit = load_in(LoadStatus::InTransit);
        assert!(transit.confer(&[entry(1, 8)], test_time()).is_err());
    }

    #[test]
    fn conference_rejects_over_loading_and_unknown_items() {
        let loading = loading_load();
        assert!(matches!(
            loading.confer(&[entry(1, 11)], test_time()),
            Err(DomainError::InvalidLineItem(_))
        ));
        assert!(matches!(
            loading.confer(&[entry(3, 1)], test_time()),
            Err(DomainError::InvalidLineItem(_))
        ));
        // the rejected conference left nothing behind
        assert!(loading.items().iter().all(|i| i.loaded_quantity.is_none()));
    }

    #[test]
    fn repeated_product_lines_are_conferred_separately() {
        let mut two_lines = order(7, 4);
        let mut second = two_lines.items()[0].clone();
        second.quantity = 2;
        two_lines = two_lines
            .with_items(vec![two_lines.items()[0].clone(), second], test_time())
            .unwrap();

        let pending = Load::assemble(
            LoadId::new(AggregateId::from_u128(901)),
            LoadDetails::default(),
            &[two_lines],
            test_time(),
        )
        .unwrap();
        assert_eq!(pending.items()[0].product_id, pending.items()[1].product_id);
        assert_eq!(pending.items()[1].line, 1);

        let loading = transition(&pending, LoadStatus::Loading, &(), test_time()).unwrap();
        let conferred = loading
            .confer(&[line_entry(7, 0, 4), line_entry(7, 1, 2)], test_time())
            .unwrap();
        let loaded: Vec<_> = conferred.items().iter().map(|i| i.loaded_quantity).collect();
        assert_eq!(loaded, vec![Some(4), Some(2)]);
        assert!(transition(&conferred, LoadStatus::InTransit, &(), test_time()).is_ok());

        // the same line twice is a mistake, not an overwrite
        assert!(matches!(
            loading.confer(&[line_entry(7, 0, 4), line_entry(7, 0, 3)], test_time()),
            Err(DomainError::InvalidLineItem(_))
        ));
        assert!(matches!(
            loading.confer(&[line_entry(7, 2, 1)], test_time()),
            Err(DomainError::InvalidLineItem(_))
        ));
    }

    #[test]
    fn loaded_units_follow_the_conference() {
        let load = conferred_load();
        assert_eq!(load.loaded_units(OrderId::new(AggregateId::from_u128(1))).unwrap(), 8);
        assert_eq!(load.loaded_units(OrderId::new(AggregateId::from_u128(2))).unwrap(), 5);

        let short = loading_load()
            .confer(&[entry(1, 0), entry(2, 5)], test_time())
            .unwrap();
        assert_eq!(short.loaded_units(OrderId::new(AggregateId::from_u128(1))).unwrap(), 0);
        assert_eq!(short.value_by_order().unwrap()[0].1, Money::ZERO);
    }

    #[test]
    fn dispatch_requires_a_complete_conference() {
        let partial = loading_load().confer(&[entry(1, 8)], test_time()).unwrap();
        assert!(matches!(
            transition(&partial, LoadStatus::InTransit, &(), test_time()),
            Err(DomainError::GuardFailed { .. })
        ));

        let nothing = loading_load()
            .confer(&[entry(1, 0), entry(2, 0)], test_time())
            .unwrap();
        assert!(matches!(
            transition(&nothing, LoadStatus::InTransit, &(), test_time()),
            Err(DomainError::GuardFailed { .. })
        ));
    }

    #[test]
    fn dispatch_snapshots_totals_and_stamps_finalized_at() {
        let transit = load_in(LoadStatus::InTransit);
        assert_eq!(transit.dispatched_totals(), Some(transit.totals()));
        assert_eq!(transit.timestamps().finalized_at, Some(test_time()));
    }

    #[test]
    fn transition_succeeds_exactly_on_graph_edges() {
        for from in LoadStatus::ALL {
            for to in LoadStatus::ALL {
                let load = load_in(*from);
                let result = transition(&load, *to, &(), test_time());
                assert_eq!(
                    result.is_ok(),
                    from.successors().contains(to),
                    "{from:?} -> {to:?}: {result:?}"
                );
            }
        }
    }
}
