use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use tradeflow_core::{
    CustomerId, DomainResult, Entity, LoadId, Money, PaymentCondition, Percent, SellerId,
    Timestamps, entity_id, payment_term_days,
};
use tradeflow_workflow::{EntityKind, Lifecycle, OrderStatus, require};

use crate::item::OrderItem;
use crate::totals::{OrderTotals, calculate_order_totals};

entity_id!(OrderId, "Customer order (sale) identifier.");

/// Salesperson credited with the sale and the commission rate they earn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerCommission {
    pub seller_id: SellerId,
    pub rate: Percent,
}

/// Input for [`Order::create`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub order_date: NaiveDate,
    pub payment_condition: PaymentCondition,
    pub custom_payment_days: Option<u32>,
    pub seller: Option<SellerCommission>,
    pub items: Vec<OrderItem>,
}

/// Extra input for order transitions: the load the order joins, leaves or
/// is delivered by, and on delivery the value billed for what was loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderContext {
    pub load_id: Option<LoadId>,
    pub billed_amount: Option<Money>,
}

impl OrderContext {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn for_load(load_id: LoadId) -> Self {
        Self {
            load_id: Some(load_id),
            billed_amount: None,
        }
    }

    pub fn delivered_by(load_id: LoadId, billed_amount: Money) -> Self {
        Self {
            load_id: Some(load_id),
            billed_amount: Some(billed_amount),
        }
    }
}

/// A customer order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    customer_id: CustomerId,
    status: OrderStatus,
    order_date: NaiveDate,
    payment_condition: PaymentCondition,
    custom_payment_days: Option<u32>,
    seller: Option<SellerCommission>,
    load_id: Option<LoadId>,
    items: Vec<OrderItem>,
    totals: OrderTotals,
    /// Value of the quantities actually delivered; set on `delivered`.
    billed_amount: Option<Money>,
    version: u64,
    timestamps: Timestamps,
}

impl Order {
    pub fn create(new: NewOrder, at: DateTime<Utc>) -> DomainResult<Self> {
        payment_term_days(new.payment_condition, new.custom_payment_days)?;
        if let Some(seller) = &new.seller {
            seller.rate.ensure_non_negative("commission rate")?;
        }
        let totals = calculate_order_totals(&new.items)?;

        Ok(Self {
            id: new.id,
            customer_id: new.customer_id,
            status: OrderStatus::Pending,
            order_date: new.order_date,
            payment_condition: new.payment_condition,
            custom_payment_days: new.custom_payment_days,
            seller: new.seller,
            load_id: None,
            items: new.items,
            totals,
            billed_amount: None,
            version: 1,
            timestamps: Timestamps::created(at),
        })
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn order_date(&self) -> NaiveDate {
        self.order_date
    }

    pub fn payment_condition(&self) -> PaymentCondition {
        self.payment_condition
    }

    pub fn custom_payment_days(&self) -> Option<u32> {
        self.custom_payment_days
    }

    pub fn seller(&self) -> Option<SellerCommission> {
        self.seller
    }

    /// Load currently carrying the order (`in_load` / `delivered`).
    pub fn load_id(&self) -> Option<LoadId> {
        self.load_id
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn totals(&self) -> &OrderTotals {
        &self.totals
    }

    /// What the customer is billed and the seller commissioned on: the value
    /// of the loaded quantities, which a short load makes lower than the
    /// ordered total.
    pub fn billed_amount(&self) -> Option<Money> {
        self.billed_amount
    }

    /// Items can be edited while the order is `pending`.
    pub fn is_modifiable(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    pub fn with_items(&self, items: Vec<OrderItem>, at: DateTime<Utc>) -> DomainResult<Self> {
        require(
            EntityKind::Order,
            self.is_modifiable(),
            "items can only be edited while the order is pending",
        )?;
        let totals = calculate_order_totals(&items)?;

        let mut next = self.clone();
        next.items = items;
        next.totals = totals;
        next.version += 1;
        next.timestamps.touch(at);
        Ok(next)
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> OrderId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }
}

impl Lifecycle for Order {
    type Status = OrderStatus;
    type Context = OrderContext;

    fn kind(&self) -> EntityKind {
        EntityKind::Order
    }

    fn status(&self) -> OrderStatus {
        self.status
    }

    fn check_guards(&self, target: OrderStatus, ctx: &OrderContext) -> DomainResult<()> {
        let kind = EntityKind::Order;
        match (self.status, target) {
            (OrderStatus::Pending, OrderStatus::InLoad) => {
                require(kind, ctx.load_id.is_some(), "a load is given")?;
                require(kind, !self.items.is_empty(), "order has at least one item")
            }
            (OrderStatus::InLoad, OrderStatus::Pending) => require(
                kind,
                ctx.load_id.is_some() && ctx.load_id == self.load_id,
                "release comes from the load carrying the order",
            ),
            (OrderStatus::InLoad, OrderStatus::Delivered) => {
                require(
                    kind,
                    ctx.load_id.is_some() && ctx.load_id == self.load_id,
                    "delivery comes from the load carrying the order",
                )?;
                require(
                    kind,
                    ctx.billed_amount.is_some_and(|billed| {
                        !billed.is_negative() && billed <= self.totals.total_amount
                    }),
                    "billed amount is within the order total",
                )
            }
            _ => Ok(()),
        }
    }

    fn enter(
        &mut self,
        target: OrderStatus,
        ctx: &OrderContext,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.totals = calculate_order_totals(&self.items)?;
        match target {
            OrderStatus::InLoad => {
                self.load_id = ctx.load_id;
            }
            OrderStatus::Pending => {
                self.load_id = None;
            }
            OrderStatus::Delivered => {
                self.billed_amount = ctx.billed_amount;
                self.timestamps.finalize(at);
            }
            OrderStatus::Cancelled => {
                self.timestamps.finalize(at);
            }
        }
        self.status = target;
        self.version += 1;
        self.timestamps.touch(at);
        Ok(())
    }
}
