use tracing::debug;

use tradeflow_core::{DomainResult, Entity, due_date};
use tradeflow_logistics::Load;
use tradeflow_purchasing::{Purchase, calculate_purchase_item};
use tradeflow_sales::Order;
use tradeflow_workflow::{Lifecycle, LoadStatus, OrderStatus, PurchaseStatus};

use crate::event::{DomainEvent, StockEntryLine};

/// A completed transition: the entity as it is now and the status it left.
#[derive(Debug, Clone, Copy)]
pub enum Transitioned<'a> {
    Purchase {
        purchase: &'a Purchase,
        from: PurchaseStatus,
    },
    Order {
        order: &'a Order,
        from: OrderStatus,
    },
    Load {
        load: &'a Load,
        from: LoadStatus,
    },
}

/// Events requested by a saved load: each carried order joins the load.
pub fn load_assembled(load: &Load) -> Vec<DomainEvent> {
    let occurred_at = load.timestamps().updated_at;
    load.order_ids()
        .iter()
        .map(|order_id| DomainEvent::OrderLoadAssignmentRequested {
            order_id: *order_id,
            load_id: load.id(),
            occurred_at,
        })
        .collect()
}

/// Events implied by a completed transition. Transitions with no follow-up
/// work (and non-transitions, where `from` equals the current status) yield
/// nothing.
pub fn events_for(transition: Transitioned<'_>) -> DomainResult<Vec<DomainEvent>> {
    let events = match transition {
        Transitioned::Purchase { purchase, from } => purchase_events(purchase, from)?,
        Transitioned::Order { order, from } => order_events(order, from),
        Transitioned::Load { load, from } => load_events(load, from)?,
    };
    debug!(count = events.len(), "settlement events derived");
    Ok(events)
}

fn purchase_events(purchase: &Purchase, from: PurchaseStatus) -> DomainResult<Vec<DomainEvent>> {
    if purchase.status() != PurchaseStatus::Received || from == PurchaseStatus::Received {
        return Ok(Vec::new());
    }
    let occurred_at = purchase.timestamps().updated_at;
    let purchase_id = purchase.id();

    let items = purchase
        .items()
        .iter()
        .map(|item| {
            calculate_purchase_item(item).map(|costs| StockEntryLine {
                product_id: item.product_id,
                quantity: item.quantity,
                unit_cost: costs.total_unit_cost,
            })
        })
        .collect::<DomainResult<Vec<_>>>()?;

    let due = due_date(
        purchase.purchase_date(),
        purchase.payment_condition(),
        purchase.custom_payment_days(),
    )?;
    debug!(%purchase_id, %due, "purchase received");

    Ok(vec![
        DomainEvent::StockEntryRequested {
            purchase_id,
            items,
            occurred_at,
        },
        DomainEvent::PayableCreationRequested {
            purchase_id,
            supplier_id: purchase.supplier_id(),
            amount: purchase.totals().total_cost,
            due_date: due,
            occurred_at,
        },
    ])
}

fn order_events(order: &Order, from: OrderStatus) -> Vec<DomainEvent> {
    if order.status() != OrderStatus::Delivered || from == OrderStatus::Delivered {
        return Vec::new();
    }
    let (Some(seller), Some(billed)) = (order.seller(), order.billed_amount()) else {
        return Vec::new();
    };
    vec![DomainEvent::CommissionAccrualRequested {
        sale_id: order.id(),
        seller_id: seller.seller_id,
        sale_amount: billed,
        rate: seller.rate,
        occurred_at: order.timestamps().updated_at,
    }]
}

fn load_events(load: &Load, from: LoadStatus) -> DomainResult<Vec<DomainEvent>> {
    let status = load.status();
    if status == from {
        return Ok(Vec::new());
    }
    let load_id = load.id();
    let occurred_at = load.timestamps().updated_at;
    debug!(%load_id, from = ?from, to = ?status, "load transitioned");

    let events = match status {
        LoadStatus::InTransit => {
            let mut events = vec![DomainEvent::NfeEmissionRequested {
                load_id,
                occurred_at,
            }];
            for (order_id, amount) in load.value_by_order()? {
                if !amount.is_positive() {
                    debug!(%order_id, "nothing billed for order, no receivable");
                    continue;
                }
                events.push(DomainEvent::ReceivableCreationRequested {
                    order_id,
                    load_id,
                    amount,
                    occurred_at,
                });
            }
            events
        }
        LoadStatus::Delivered => {
            let mut events = Vec::with_capacity(load.order_ids().len());
            for (order_id, amount) in load.value_by_order()? {
                // an order none of whose units left goes back to the queue
                if load.loaded_units(order_id)? == 0 {
                    events.push(DomainEvent::OrderReleaseRequested {
                        order_id,
                        load_id,
                        occurred_at,
                    });
                } else {
                    events.push(DomainEvent::OrderDeliveryRequested {
                        order_id,
                        load_id,
                        amount,
                        occurred_at,
                    });
                }
            }
            events
        }
        LoadStatus::Cancelled => load
            .order_ids()
            .iter()
            .map(|order_id| DomainEvent::OrderReleaseRequested {
                order_id: *order_id,
                load_id,
                occurred_at,
            })
            .collect(),
        LoadStatus::Pending | LoadStatus::Loading => Vec::new(),
    };
    Ok(events)
}
