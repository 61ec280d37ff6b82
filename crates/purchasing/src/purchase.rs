use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use tradeflow_core::{
    DomainError, DomainResult, Entity, PaymentCondition, SupplierId, Timestamps, entity_id,
    payment_term_days,
};
use tradeflow_workflow::{
    EntityKind, Lifecycle, PurchaseStatus, ensure_not_frozen, require, transition,
};

use crate::item::PurchaseItem;
use crate::totals::{PurchaseTotals, calculate_purchase_totals};

entity_id!(PurchaseId, "Purchase order identifier.");

/// Length of an NF-e access key (chave de acesso).
const NFE_KEY_LEN: usize = 44;

/// Input for [`Purchase::create`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPurchase {
    pub id: PurchaseId,
    pub supplier_id: SupplierId,
    pub purchase_date: NaiveDate,
    pub payment_condition: PaymentCondition,
    pub custom_payment_days: Option<u32>,
    pub nfe_key: Option<String>,
    pub items: Vec<PurchaseItem>,
}

/// A supplier purchase order.
///
/// Every mutation returns a new value; totals are re-derived from the items on
/// each change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    id: PurchaseId,
    supplier_id: SupplierId,
    status: PurchaseStatus,
    purchase_date: NaiveDate,
    payment_condition: PaymentCondition,
    custom_payment_days: Option<u32>,
    nfe_key: Option<String>,
    delivery_date: Option<NaiveDate>,
    items: Vec<PurchaseItem>,
    totals: PurchaseTotals,
    version: u64,
    timestamps: Timestamps,
}

impl Purchase {
    pub fn create(new: NewPurchase, at: DateTime<Utc>) -> DomainResult<Self> {
        // Validate the payment terms up front so payable creation cannot fail later.
        payment_term_days(new.payment_condition, new.custom_payment_days)?;
        if let Some(key) = &new.nfe_key {
            validate_nfe_key(key)?;
        }
        let totals = calculate_purchase_totals(&new.items)?;

        Ok(Self {
            id: new.id,
            supplier_id: new.supplier_id,
            status: PurchaseStatus::Created,
            purchase_date: new.purchase_date,
            payment_condition: new.payment_condition,
            custom_payment_days: new.custom_payment_days,
            nfe_key: new.nfe_key,
            delivery_date: None,
            items: new.items,
            totals,
            version: 1,
            timestamps: Timestamps::created(at),
        })
    }

    pub fn supplier_id(&self) -> SupplierId {
        self.supplier_id
    }

    pub fn purchase_date(&self) -> NaiveDate {
        self.purchase_date
    }

    pub fn payment_condition(&self) -> PaymentCondition {
        self.payment_condition
    }

    pub fn custom_payment_days(&self) -> Option<u32> {
        self.custom_payment_days
    }

    pub fn nfe_key(&self) -> Option<&str> {
        self.nfe_key.as_deref()
    }

    pub fn delivery_date(&self) -> Option<NaiveDate> {
        self.delivery_date
    }

    pub fn items(&self) -> &[PurchaseItem] {
        &self.items
    }

    pub fn totals(&self) -> &PurchaseTotals {
        &self.totals
    }

    /// Replace the item list. Only allowed while the purchase is `created`.
    pub fn with_items(&self, items: Vec<PurchaseItem>, at: DateTime<Utc>) -> DomainResult<Self> {
        require(
            EntityKind::Purchase,
            self.status == PurchaseStatus::Created,
            "items can only be edited while the purchase is created",
        )?;
        let totals = calculate_purchase_totals(&items)?;

        let mut next = self.clone();
        next.items = items;
        next.totals = totals;
        next.bump(at);
        Ok(next)
    }

    /// Record the physical delivery and the invoice (NF-e) that came with it.
    pub fn record_delivery(
        &self,
        delivery_date: NaiveDate,
        nfe_key: Option<String>,
        at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        ensure_not_frozen(EntityKind::Purchase, self.status)?;
        if let Some(key) = &nfe_key {
            validate_nfe_key(key)?;
        }

        let mut next = self.clone();
        next.delivery_date = Some(delivery_date);
        if nfe_key.is_some() {
            next.nfe_key = nfe_key;
        }
        next.bump(at);
        Ok(next)
    }

    /// Confirm the stock entry: move the purchase to `received`.
    ///
    /// From `created` this takes both steps (`awaiting_delivery`, then
    /// `received`); if the second step is rejected nothing changes.
    pub fn confirm_stock_entry(&self, at: DateTime<Utc>) -> DomainResult<Self> {
        if self.status == PurchaseStatus::Created {
            let awaiting = transition(self, PurchaseStatus::AwaitingDelivery, &(), at)?;
            return transition(&awaiting, PurchaseStatus::Received, &(), at);
        }
        transition(self, PurchaseStatus::Received, &(), at)
    }

    fn bump(&mut self, at: DateTime<Utc>) {
        self.version += 1;
        self.timestamps.touch(at);
    }
}

impl Entity for Purchase {
    type Id = PurchaseId;

    fn id(&self) -> PurchaseId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }
}

impl Lifecycle for Purchase {
    type Status = PurchaseStatus;
    type Context = ();

    fn kind(&self) -> EntityKind {
        EntityKind::Purchase
    }

    fn status(&self) -> PurchaseStatus {
        self.status
    }

    fn check_guards(&self, target: PurchaseStatus, _ctx: &()) -> DomainResult<()> {
        let kind = EntityKind::Purchase;
        if self.status == PurchaseStatus::Created && target != PurchaseStatus::Cancelled {
            require(kind, !self.items.is_empty(), "purchase has at least one item")?;
        }
        if target == PurchaseStatus::Received {
            require(kind, self.delivery_date.is_some(), "delivery has been recorded")?;
            require(kind, self.nfe_key.is_some(), "NF-e key has been recorded")?;
        }
        Ok(())
    }

    fn enter(&mut self, target: PurchaseStatus, _ctx: &(), at: DateTime<Utc>) -> DomainResult<()> {
        self.totals = calculate_purchase_totals(&self.items)?;
        self.status = target;
        match target {
            PurchaseStatus::Received => self.timestamps.confirm(at),
            PurchaseStatus::Cancelled => self.timestamps.finalize(at),
            PurchaseStatus::Created | PurchaseStatus::AwaitingDelivery => {}
        }
        self.bump(at);
        Ok(())
    }
}

/// An NF-e access key is exactly 44 ASCII digits.
pub fn validate_nfe_key(key: &str) -> DomainResult<()> {
    if key.len() == NFE_KEY_LEN && key.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(DomainError::invalid_id(format!(
            "NF-e key must be {NFE_KEY_LEN} digits (got '{key}')"
        )))
    }
}

/// Fail with `DuplicateReference` when another live purchase already carries
/// `candidate`'s NF-e key. Cancelled purchases release their key.
pub fn ensure_unique_nfe_key<'a, I>(candidate: &Purchase, existing: I) -> DomainResult<()>
where
    I: IntoIterator<Item = &'a Purchase>,
{
    let Some(key) = candidate.nfe_key() else {
        return Ok(());
    };

    let clash = existing.into_iter().any(|other| {
        other.id != candidate.id
            && other.status != PurchaseStatus::Cancelled
            && other.nfe_key() == Some(key)
    });

    if clash {
        return Err(DomainError::duplicate_reference(format!("NF-e key {key}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradeflow_core::{AggregateId, Money, ProductId};
    use tradeflow_workflow::StatusKey;

    const NFE: &str = "35240612345678000190550010000012341000012345";

    fn test_time() -> DateTime<Utc> {
        DateTime::from_timestamp(1_717_236_000, 0).unwrap()
    }

    fn test_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn test_item() -> PurchaseItem {
        PurchaseItem {
            product_id: ProductId::new(AggregateId::from_u128(10)),
            description: "Pneu 275/80R22.5".to_string(),
            quantity: 20,
            unit_cost: Money::parse("320.00").unwrap(),
            freight_per_tire: Money::parse("15.00").unwrap(),
        }
    }

    fn new_purchase(id: u128, items: Vec<PurchaseItem>) -> NewPurchase {
        NewPurchase {
            id: PurchaseId::new(AggregateId::from_u128(id)),
            supplier_id: SupplierId::new(AggregateId::from_u128(99)),
            purchase_date: test_date(),
            payment_condition: PaymentCondition::Net30,
            custom_payment_days: None,
            nfe_key: None,
            items,
        }
    }

    fn created() -> Purchase {
        Purchase::create(new_purchase(1, vec![test_item()]), test_time()).unwrap()
    }

    fn delivered() -> Purchase {
        created()
            .record_delivery(test_date(), Some(NFE.to_string()), test_time())
            .unwrap()
    }

    /// A purchase in `status` whose guards for every next step are satisfied.
    fn purchase_in(status: PurchaseStatus) -> Purchase {
        let base = delivered();
        match status {
            PurchaseStatus::Created => base,
            PurchaseStatus::AwaitingDelivery => {
                transition(&base, PurchaseStatus::AwaitingDelivery, &(), test_time()).unwrap()
            }
            PurchaseStatus::Received => base.confirm_stock_entry(test_time()).unwrap(),
            PurchaseStatus::Cancelled => {
                transition(&base, PurchaseStatus::Cancelled, &(), test_time()).unwrap()
            }
        }
    }

    #[test]
    fn create_derives_totals_from_items() {
        let purchase = created();
        assert_eq!(purchase.status(), PurchaseStatus::Created);
        assert_eq!(purchase.totals().total_cost.to_string(), "6700.00");
        assert_eq!(purchase.totals().average_cost_per_tire.to_string(), "335.00");
        assert_eq!(purchase.version(), 1);
    }

    #[test]
    fn create_rejects_custom_terms_without_days() {
        let mut new = new_purchase(1, vec![test_item()]);
        new.payment_condition = PaymentCondition::Custom;
        assert!(matches!(
            Purchase::create(new, test_time()),
            Err(DomainError::InvalidAmount(_))
        ));
    }

    #[test]
    fn skipping_awaiting_delivery_is_illegal() {
        let err = transition(&delivered(), PurchaseStatus::Received, &(), test_time()).unwrap_err();
        assert_eq!(
            err,
            DomainError::IllegalTransition {
                kind: "purchase".to_string(),
                from: "created".to_string(),
                to: "received".to_string(),
                allowed: vec!["awaiting_delivery".to_string(), "cancelled".to_string()],
            }
        );
    }

    #[test]
    fn empty_purchase_cannot_leave_created() {
        let purchase = Purchase::create(new_purchase(1, vec![]), test_time()).unwrap();
        let err =
            transition(&purchase, PurchaseStatus::AwaitingDelivery, &(), test_time()).unwrap_err();
        assert!(matches!(err, DomainError::GuardFailed { .. }));

        // cancelling an empty purchase is fine
        assert!(transition(&purchase, PurchaseStatus::Cancelled, &(), test_time()).is_ok());
    }

    #[test]
    fn receiving_requires_delivery_and_nfe() {
        let awaiting = transition(&created(), PurchaseStatus::AwaitingDelivery, &(), test_time())
            .unwrap();
        let err = transition(&awaiting, PurchaseStatus::Received, &(), test_time()).unwrap_err();
        assert!(matches!(err, DomainError::GuardFailed { .. }));

        let dated = awaiting.record_delivery(test_date(), None, test_time()).unwrap();
        let err = transition(&dated, PurchaseStatus::Received, &(), test_time()).unwrap_err();
        match err {
            DomainError::GuardFailed { condition, .. } => assert!(condition.contains("NF-e")),
            other => panic!("expected GuardFailed, got {other:?}"),
        }
    }

    #[test]
    fn confirm_stock_entry_from_created_takes_both_steps() {
        let later = test_time() + chrono::Duration::hours(2);
        let before = delivered();
        let received = before.confirm_stock_entry(later).unwrap();

        assert_eq!(received.status(), PurchaseStatus::Received);
        assert_eq!(received.timestamps().confirmed_at, Some(later));
        assert_eq!(received.version(), before.version() + 2);
    }

    #[test]
    fn confirm_stock_entry_is_all_or_nothing() {
        // no NF-e recorded: the second step fails, so the first is discarded too
        let purchase = created().record_delivery(test_date(), None, test_time()).unwrap();
        let err = purchase.confirm_stock_entry(test_time()).unwrap_err();
        assert!(matches!(err, DomainError::GuardFailed { .. }));
        assert_eq!(purchase.status(), PurchaseStatus::Created);
    }

    #[test]
    fn items_are_frozen_outside_created() {
        let awaiting = purchase_in(PurchaseStatus::AwaitingDelivery);
        let err = awaiting.with_items(vec![], test_time()).unwrap_err();
        assert!(matches!(err, DomainError::GuardFailed { .. }));

        let received = purchase_in(PurchaseStatus::Received);
        assert!(received.record_delivery(test_date(), None, test_time()).is_err());
    }

    #[test]
    fn editing_items_recomputes_totals() {
        let mut extra = test_item();
        extra.quantity = 4;
        extra.unit_cost = Money::parse("100.00").unwrap();
        extra.freight_per_tire = Money::ZERO;

        let purchase = created().with_items(vec![test_item(), extra], test_time()).unwrap();
        assert_eq!(purchase.totals().total_cost.to_string(), "7100.00");
        assert_eq!(purchase.totals().total_quantity, 24);
        assert_eq!(purchase.version(), 2);
    }

    #[test]
    fn transition_succeeds_exactly_on_graph_edges() {
        for from in PurchaseStatus::ALL {
            for to in PurchaseStatus::ALL {
                let purchase = purchase_in(*from);
                let result = transition(&purchase, *to, &(), test_time());
                assert_eq!(
                    result.is_ok(),
                    from.successors().contains(to),
                    "{from:?} -> {to:?}: {result:?}"
                );
                if let Err(err) = result {
                    assert!(matches!(err, DomainError::IllegalTransition { .. }));
                }
            }
        }
    }

    #[test]
    fn malformed_nfe_key_is_rejected() {
        assert!(validate_nfe_key(NFE).is_ok());
        assert!(matches!(validate_nfe_key("1234"), Err(DomainError::InvalidId(_))));
        let mut new = new_purchase(1, vec![test_item()]);
        new.nfe_key = Some(format!("{}X", &NFE[..43]));
        assert!(Purchase::create(new, test_time()).is_err());
    }

    #[test]
    fn nfe_key_must_be_unique_among_live_purchases() {
        let mut first = new_purchase(1, vec![test_item()]);
        first.nfe_key = Some(NFE.to_string());
        let first = Purchase::create(first, test_time()).unwrap();

        let mut second = new_purchase(2, vec![test_item()]);
        second.nfe_key = Some(NFE.to_string());
        let second = Purchase::create(second, test_time()).unwrap();

        let err = ensure_unique_nfe_key(&second, [&first]).unwrap_err();
        assert!(matches!(err, DomainError::DuplicateReference(_)));

        // re-saving the same purchase is not a clash
        assert!(ensure_unique_nfe_key(&first, [&first]).is_ok());

        let cancelled = transition(&first, PurchaseStatus::Cancelled, &(), test_time()).unwrap();
        assert!(ensure_unique_nfe_key(&second, [&cancelled]).is_ok());
    }
}
