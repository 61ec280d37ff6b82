use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use tradeflow_core::{LoadId, Money, Percent, ProductId, SellerId, SupplierId};
use tradeflow_purchasing::PurchaseId;
use tradeflow_sales::OrderId;

/// Product and landed unit cost entering stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEntryLine {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_cost: Money,
}

/// Follow-up work requested by a transition.
///
/// `occurred_at` is the `updated_at` of the entity that transitioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum DomainEvent {
    /// Order should move to `in_load`: it was included in a saved load.
    OrderLoadAssignmentRequested {
        order_id: OrderId,
        load_id: LoadId,
        occurred_at: DateTime<Utc>,
    },
    NfeEmissionRequested {
        load_id: LoadId,
        occurred_at: DateTime<Utc>,
    },
    /// Amount is the order's value on loaded quantities.
    ReceivableCreationRequested {
        order_id: OrderId,
        load_id: LoadId,
        amount: Money,
        occurred_at: DateTime<Utc>,
    },
    /// Order should move to `delivered`; amount is the value delivered.
    OrderDeliveryRequested {
        order_id: OrderId,
        load_id: LoadId,
        amount: Money,
        occurred_at: DateTime<Utc>,
    },
    /// Order should go back to `pending`: its load was cancelled or
    /// delivered without any of its units.
    OrderReleaseRequested {
        order_id: OrderId,
        load_id: LoadId,
        occurred_at: DateTime<Utc>,
    },
    StockEntryRequested {
        purchase_id: PurchaseId,
        items: Vec<StockEntryLine>,
        occurred_at: DateTime<Utc>,
    },
    PayableCreationRequested {
        purchase_id: PurchaseId,
        supplier_id: SupplierId,
        amount: Money,
        due_date: NaiveDate,
        occurred_at: DateTime<Utc>,
    },
    CommissionAccrualRequested {
        sale_id: OrderId,
        seller_id: SellerId,
        sale_amount: Money,
        rate: Percent,
        occurred_at: DateTime<Utc>,
    },
}

impl DomainEvent {
    /// Stable dotted name, for logs and routing.
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::OrderLoadAssignmentRequested { .. } => "sales.order.load_assignment_requested",
            DomainEvent::NfeEmissionRequested { .. } => "logistics.load.nfe_emission_requested",
            DomainEvent::ReceivableCreationRequested { .. } => {
                "financial.receivable.creation_requested"
            }
            DomainEvent::OrderDeliveryRequested { .. } => "sales.order.delivery_requested",
            DomainEvent::OrderReleaseRequested { .. } => "sales.order.release_requested",
            DomainEvent::StockEntryRequested { .. } => "purchasing.purchase.stock_entry_requested",
            DomainEvent::PayableCreationRequested { .. } => "financial.payable.creation_requested",
            DomainEvent::CommissionAccrualRequested { .. } => {
                "financial.commission.accrual_requested"
            }
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            DomainEvent::OrderLoadAssignmentRequested { occurred_at, .. }
            | DomainEvent::NfeEmissionRequested { occurred_at, .. }
            | DomainEvent::ReceivableCreationRequested { occurred_at, .. }
            | DomainEvent::OrderDeliveryRequested { occurred_at, .. }
            | DomainEvent::OrderReleaseRequested { occurred_at, .. }
            | DomainEvent::StockEntryRequested { occurred_at, .. }
            | DomainEvent::PayableCreationRequested { occurred_at, .. }
            | DomainEvent::CommissionAccrualRequested { occurred_at, .. } => *occurred_at,
        }
    }
}
