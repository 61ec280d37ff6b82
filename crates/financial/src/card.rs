use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use tradeflow_core::{
    AggregateId, DomainError, DomainResult, Entity, Money, Percent, Timestamps, add_days,
    apply_percent, entity_id,
};
use tradeflow_workflow::{CardReconciliationStatus, EntityKind, Lifecycle, require};

entity_id!(CardReconciliationId, "Card sale reconciliation identifier.");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    Credit,
    Debit,
}

impl CardType {
    /// Default acquirer settlement delay: debit D+1, credit D+30.
    pub fn settlement_days(self) -> u32 {
        match self {
            CardType::Debit => 1,
            CardType::Credit => 30,
        }
    }
}

/// Input for [`CardReconciliation::create`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCardSale {
    pub id: CardReconciliationId,
    pub sale_id: Option<AggregateId>,
    pub card_type: CardType,
    pub gross_amount: Money,
    /// Acquirer fee (MDR).
    pub fee_rate: Percent,
    pub transaction_date: NaiveDate,
    /// Overrides the card type's default settlement delay.
    pub settlement_days: Option<u32>,
}

/// A card sale waiting for the acquirer to settle it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardReconciliation {
    id: CardReconciliationId,
    sale_id: Option<AggregateId>,
    card_type: CardType,
    gross_amount: Money,
    fee_rate: Percent,
    fee_amount: Money,
    net_amount: Money,
    transaction_date: NaiveDate,
    expected_settlement_date: NaiveDate,
    statement_amount: Option<Money>,
    status: CardReconciliationStatus,
    version: u64,
    timestamps: Timestamps,
}

impl CardReconciliation {
    pub fn create(new: NewCardSale, at: DateTime<Utc>) -> DomainResult<Self> {
        new.gross_amount.ensure_positive("gross amount")?;
        new.fee_rate.ensure_non_negative("fee rate")?;
        let fee_amount = apply_percent(new.gross_amount, new.fee_rate)?;
        let net_amount = new.gross_amount.checked_sub(fee_amount)?;
        let days = new
            .settlement_days
            .unwrap_or_else(|| new.card_type.settlement_days());
        let expected_settlement_date = add_days(new.transaction_date, days)?;

        Ok(Self {
            id: new.id,
            sale_id: new.sale_id,
            card_type: new.card_type,
            gross_amount: new.gross_amount,
            fee_rate: new.fee_rate,
            fee_amount,
            net_amount: net_amount.ensure_non_negative("net amount")?,
            transaction_date: new.transaction_date,
            expected_settlement_date,
            statement_amount: None,
            status: CardReconciliationStatus::PendingReconciliation,
            version: 1,
            timestamps: Timestamps::created(at),
        })
    }

    pub fn sale_id(&self) -> Option<AggregateId> {
        self.sale_id
    }

    pub fn card_type(&self) -> CardType {
        self.card_type
    }

    pub fn gross_amount(&self) -> Money {
        self.gross_amount
    }

    pub fn fee_amount(&self) -> Money {
        self.fee_amount
    }

    pub fn net_amount(&self) -> Money {
        self.net_amount
    }

    pub fn transaction_date(&self) -> NaiveDate {
        self.transaction_date
    }

    pub fn expected_settlement_date(&self) -> NaiveDate {
        self.expected_settlement_date
    }

    pub fn statement_amount(&self) -> Option<Money> {
        self.statement_amount
    }

    /// Record the amount the acquirer statement shows for this sale.
    pub fn record_statement(&self, amount: Money, at: DateTime<Utc>) -> DomainResult<Self> {
        require(
            EntityKind::CardReconciliation,
            self.status == CardReconciliationStatus::PendingReconciliation,
            "statement is recorded before reconciliation",
        )?;
        amount.ensure_non_negative("statement amount")?;

        let mut next = self.clone();
        next.statement_amount = Some(amount);
        next.version += 1;
        next.timestamps.touch(at);
        Ok(next)
    }
}

impl Entity for CardReconciliation {
    type Id = CardReconciliationId;

    fn id(&self) -> CardReconciliationId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }
}

impl Lifecycle for CardReconciliation {
    type Status = CardReconciliationStatus;
    type Context = ();

    fn kind(&self) -> EntityKind {
        EntityKind::CardReconciliation
    }

    fn status(&self) -> CardReconciliationStatus {
        self.status
    }

    fn check_guards(&self, target: CardReconciliationStatus, _ctx: &()) -> DomainResult<()> {
        if target != CardReconciliationStatus::Reconciled {
            return Ok(());
        }
        match self.statement_amount {
            None => Err(DomainError::guard_failed(
                EntityKind::CardReconciliation.as_str(),
                "statement amount has been recorded",
            )),
            Some(statement) => require(
                EntityKind::CardReconciliation,
                statement == self.net_amount,
                &format!("statement {statement} matches net amount {}", self.net_amount),
            ),
        }
    }

    fn enter(
        &mut self,
        target: CardReconciliationStatus,
        _ctx: &(),
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        match target {
            CardReconciliationStatus::Reconciled => self.timestamps.confirm(at),
            CardReconciliationStatus::Received => self.timestamps.finalize(at),
            _ => {}
        }
        self.status = target;
        self.version += 1;
        self.timestamps.touch(at);
        Ok(())
    }
}
