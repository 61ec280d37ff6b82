//! End-to-end run of the engine over an in-memory store.
//!
//! Buys tires, sells them on two orders, ships them on one load and prints
//! every settlement event (one JSON object per line) followed by the cash-flow
//! projection.

use anyhow::Context;
use chrono::Utc;

use tradeflow_auth::{Action, ModuleId, Permission, authorize};
use tradeflow_core::{
    AggregateId, CustomerId, Entity, Money, PaymentCondition, Percent, ProductId, SellerId,
    SupplierId, utc_day,
};
use tradeflow_infra::{Engine, EngineConfig};
use tradeflow_logistics::{ConferenceEntry, Load, LoadDetails, LoadId};
use tradeflow_purchasing::{NewPurchase, Purchase, PurchaseId, PurchaseItem};
use tradeflow_sales::{NewOrder, Order, OrderId, OrderItem, SellerCommission};
use tradeflow_settlement::DomainEvent;
use tradeflow_workflow::LoadStatus;

fn main() -> anyhow::Result<()> {
    tradeflow_observability::init();

    let config = EngineConfig::load().context("loading engine config")?;
    let engine = Engine::new(config);
    let now = Utc::now();
    let today = utc_day(now);

    let actor = vec![
        Permission::new("purchases.*"),
        Permission::new("orders.*"),
        Permission::new("loads.*"),
        Permission::new("cash_flow.view"),
    ];
    let tire = ProductId::generate();

    // Purchase: 20 tires, delivered with their NF-e.
    authorize(&actor, ModuleId::Purchases, Action::Create)?;
    let purchase = Purchase::create(
        NewPurchase {
            id: PurchaseId::generate(),
            supplier_id: SupplierId::generate(),
            purchase_date: today,
            payment_condition: PaymentCondition::Net30,
            custom_payment_days: None,
            nfe_key: None,
            items: vec![PurchaseItem {
                product_id: tire,
                description: "Pneu 295/80R22.5".to_string(),
                quantity: 20,
                unit_cost: Money::parse("320.00")?,
                freight_per_tire: Money::parse("15.00")?,
            }],
        },
        now,
    )?;
    let purchase_id = purchase.id();
    engine.purchases().create(purchase)?;
    engine.purchases().apply(purchase_id, |p| {
        p.record_delivery(
            today,
            Some("35240612345678000190550010000012341000012345".to_string()),
            now,
        )
    })?;
    authorize(&actor, ModuleId::Purchases, Action::Transition)?;
    let received = engine
        .purchases()
        .apply(purchase_id, |p| p.confirm_stock_entry(now))?;
    print_events(&received.events)?;
    engine.settle(received.events)?;

    // Two orders on one load.
    authorize(&actor, ModuleId::Orders, Action::Create)?;
    let orders = [(10, true), (5, false)]
        .into_iter()
        .map(|(quantity, with_seller)| {
            Order::create(
                NewOrder {
                    id: OrderId::generate(),
                    customer_id: CustomerId::generate(),
                    order_date: today,
                    payment_condition: PaymentCondition::Net28,
                    custom_payment_days: None,
                    seller: with_seller.then(|| SellerCommission {
                        seller_id: SellerId::generate(),
                        rate: Percent::from_bps(250),
                    }),
                    items: vec![OrderItem {
                        product_id: tire,
                        description: "Pneu 295/80R22.5".to_string(),
                        quantity,
                        sale_price: Money::from_major(500)?,
                        purchase_cost: Money::parse("335.00")?,
                        freight_per_tire: Money::parse("10.00")?,
                    }],
                },
                now,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;
    for order in &orders {
        engine.orders().create(order.clone())?;
    }

    authorize(&actor, ModuleId::Loads, Action::Create)?;
    let load_id = LoadId::new(AggregateId::new());
    let load = Load::assemble(load_id, LoadDetails::default(), &orders, now)?;
    let assembled = engine.loads().create(load)?;
    print_events(&assembled)?;
    engine.settle(assembled)?;

    // Conference: the first order is short two tires.
    authorize(&actor, ModuleId::Loads, Action::Transition)?;
    engine
        .loads()
        .execute(load_id, LoadStatus::Loading, &(), now)?;
    let counted: Vec<_> = orders
        .iter()
        .enumerate()
        .map(|(idx, order)| ConferenceEntry {
            order_id: order.id(),
            line: 0,
            loaded_quantity: if idx == 0 { 8 } else { 5 },
        })
        .collect();
    engine
        .loads()
        .apply(load_id, |load| load.confer(&counted, now))?;

    for target in [LoadStatus::InTransit, LoadStatus::Delivered] {
        let done = engine.loads().execute(load_id, target, &(), now)?;
        let settlement = engine.settle(done.events)?;
        print_events(&settlement.applied)?;
        print_events(&settlement.forwarded)?;
    }

    authorize(&actor, ModuleId::CashFlow, Action::View)?;
    let projection = engine.project_cash_flow(today)?;
    println!("{}", serde_json::to_string_pretty(&projection)?);
    Ok(())
}

fn print_events(events: &[DomainEvent]) -> anyhow::Result<()> {
    for event in events {
        println!("{}", serde_json::to_string(event)?);
    }
    Ok(())
}
