use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tradeflow_core::{
    AggregateId, DomainResult, Entity, Money, Percent, SellerId, Timestamps, apply_percent,
    entity_id,
};
use tradeflow_workflow::{CommissionStatus, EntityKind, Lifecycle};

entity_id!(CommissionId, "Sales commission identifier.");

/// Commission owed to a seller for one completed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commission {
    id: CommissionId,
    sale_id: AggregateId,
    seller_id: SellerId,
    sale_amount: Money,
    rate: Percent,
    commission_amount: Money,
    status: CommissionStatus,
    version: u64,
    timestamps: Timestamps,
}

impl Commission {
    /// `commission_amount = apply_percent(sale_amount, rate)`.
    pub fn accrue(
        id: CommissionId,
        sale_id: AggregateId,
        seller_id: SellerId,
        sale_amount: Money,
        rate: Percent,
        at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        sale_amount.ensure_non_negative("sale amount")?;
        rate.ensure_non_negative("commission rate")?;
        let commission_amount = apply_percent(sale_amount, rate)?;

        Ok(Self {
            id,
            sale_id,
            seller_id,
            sale_amount,
            rate,
            commission_amount,
            status: CommissionStatus::Pending,
            version: 1,
            timestamps: Timestamps::created(at),
        })
    }

    pub fn sale_id(&self) -> AggregateId {
        self.sale_id
    }

    pub fn seller_id(&self) -> SellerId {
        self.seller_id
    }

    pub fn sale_amount(&self) -> Money {
        self.sale_amount
    }

    pub fn rate(&self) -> Percent {
        self.rate
    }

    pub fn commission_amount(&self) -> Money {
        self.commission_amount
    }
}

impl Entity for Commission {
    type Id = CommissionId;

    fn id(&self) -> CommissionId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }
}

impl Lifecycle for Commission {
    type Status = CommissionStatus;
    type Context = ();

    fn kind(&self) -> EntityKind {
        EntityKind::Commission
    }

    fn status(&self) -> CommissionStatus {
        self.status
    }

    fn check_guards(&self, _target: CommissionStatus, _ctx: &()) -> DomainResult<()> {
        Ok(())
    }

    fn enter(&mut self, target: CommissionStatus, _ctx: &(), at: DateTime<Utc>) -> DomainResult<()> {
        self.commission_amount = apply_percent(self.sale_amount, self.rate)?;
        match target {
            CommissionStatus::Approved => self.timestamps.confirm(at),
            CommissionStatus::Paid => self.timestamps.finalize(at),
            CommissionStatus::Pending | CommissionStatus::Cancelled => {}
        }
        self.status = target;
        self.version += 1;
        self.timestamps.touch(at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradeflow_core::DomainError;
    use tradeflow_workflow::{StatusKey, transition};

    fn test_time() -> DateTime<Utc> {
        DateTime::from_timestamp(1_717_236_000, 0).unwrap()
    }

    fn accrue(sale: &str, rate: &str) -> DomainResult<Commission> {
        Commission::accrue(
            CommissionId::new(AggregateId::from_u128(1)),
            AggregateId::from_u128(2),
            SellerId::new(AggregateId::from_u128(3)),
            Money::parse(sale).unwrap(),
            Percent::parse(rate).unwrap(),
            test_time(),
        )
    }

    #[test]
    fn amount_is_rate_applied_to_sale() {
        let c = accrue("2000.00", "2.5").unwrap();
        assert_eq!(c.commission_amount().to_string(), "50.00");

        // 0.5 cent rounds up
        let c = accrue("0.30", "5").unwrap();
        assert_eq!(c.commission_amount(), Money::from_cents(2));
    }

    #[test]
    fn negative_rate_is_rejected() {
        assert!(matches!(accrue("100.00", "-1"), Err(DomainError::InvalidAmount(_))));
    }

    #[test]
    fn approve_then_pay_stamps_both_timestamps() {
        let c = accrue("1000.00", "3").unwrap();
        let approved = transition(&c, CommissionStatus::Approved, &(), test_time()).unwrap();
        assert_eq!(approved.timestamps().confirmed_at, Some(test_time()));
        let paid = transition(&approved, CommissionStatus::Paid, &(), test_time()).unwrap();
        assert_eq!(paid.timestamps().finalized_at, Some(test_time()));
        assert_eq!(paid.version(), 3);
    }

    #[test]
    fn transition_succeeds_exactly_on_graph_edges() {
        let pending = accrue("1000.00", "3").unwrap();
        let approved = transition(&pending, CommissionStatus::Approved, &(), test_time()).unwrap();
        let paid = transition(&approved, CommissionStatus::Paid, &(), test_time()).unwrap();
        let cancelled = transition(&pending, CommissionStatus::Cancelled, &(), test_time()).unwrap();

        for from in [&pending, &approved, &paid, &cancelled] {
            for to in CommissionStatus::ALL {
                let result = transition(from, *to, &(), test_time());
                assert_eq!(result.is_ok(), from.status().can_transition_to(*to));
            }
        }
    }
}
