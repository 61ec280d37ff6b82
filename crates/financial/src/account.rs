use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tradeflow_core::{
    AggregateId, DomainError, DomainResult, Entity, Money, Timestamps, entity_id,
};
use tradeflow_workflow::{
    AccountStatus, EntityKind, Lifecycle, ensure_not_frozen, require, transition,
};

use crate::installment::{Installment, InstallmentStatus};
use crate::totals::{AccountTotals, calculate_account_totals};

entity_id!(AccountId, "Receivable or payable identifier.");

/// Which side of the cash flow an account sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountDirection {
    /// Money owed to the franchise (customer sales).
    Receivable,
    /// Money the franchise owes (supplier purchases).
    Payable,
}

impl AccountDirection {
    pub fn kind(self) -> EntityKind {
        match self {
            AccountDirection::Receivable => EntityKind::Receivable,
            AccountDirection::Payable => EntityKind::Payable,
        }
    }
}

/// Input for [`FinancialAccount::create`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    pub id: AccountId,
    pub direction: AccountDirection,
    /// Customer or supplier.
    pub counterparty_id: AggregateId,
    /// Sale or purchase that gave rise to the account.
    pub document_id: Option<AggregateId>,
    pub description: String,
    pub installments: Vec<Installment>,
}

/// A receivable or payable, settled installment by installment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialAccount {
    id: AccountId,
    direction: AccountDirection,
    status: AccountStatus,
    counterparty_id: AggregateId,
    document_id: Option<AggregateId>,
    description: String,
    installments: Vec<Installment>,
    totals: AccountTotals,
    version: u64,
    timestamps: Timestamps,
}

impl FinancialAccount {
    pub fn create(new: NewAccount, at: DateTime<Utc>) -> DomainResult<Self> {
        if new.installments.is_empty() {
            return Err(DomainError::invalid_amount("account needs at least one installment"));
        }
        for (idx, inst) in new.installments.iter().enumerate() {
            if new.installments[..idx].iter().any(|i| i.number == inst.number) {
                return Err(DomainError::invalid_line_item(format!(
                    "installment number {} is repeated",
                    inst.number
                )));
            }
            if inst.status != InstallmentStatus::Pending || !inst.paid_amount.is_zero() {
                return Err(DomainError::invalid_line_item(format!(
                    "installment {} must start pending and unpaid",
                    inst.number
                )));
            }
        }
        let totals = calculate_account_totals(&new.installments)?;

        Ok(Self {
            id: new.id,
            direction: new.direction,
            status: AccountStatus::Pending,
            counterparty_id: new.counterparty_id,
            document_id: new.document_id,
            description: new.description,
            installments: new.installments,
            totals,
            version: 1,
            timestamps: Timestamps::created(at),
        })
    }

    pub fn direction(&self) -> AccountDirection {
        self.direction
    }

    pub fn counterparty_id(&self) -> AggregateId {
        self.counterparty_id
    }

    pub fn document_id(&self) -> Option<AggregateId> {
        self.document_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn installments(&self) -> &[Installment] {
        &self.installments
    }

    pub fn totals(&self) -> &AccountTotals {
        &self.totals
    }

    /// Apply a payment to one installment and move the account status along.
    ///
    /// Overpaying an installment, paying a cancelled one and paying a closed
    /// account are all rejected.
    pub fn register_payment(
        &self,
        installment_number: u32,
        amount: Money,
        at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let kind = self.direction.kind();
        ensure_not_frozen(kind, self.status)?;
        amount.ensure_positive("payment amount")?;

        let mut next = self.clone();
        let inst = next
            .installments
            .iter_mut()
            .find(|i| i.number == installment_number)
            .ok_or_else(|| {
                DomainError::invalid_line_item(format!(
                    "{kind} {} has no installment {installment_number}",
                    self.id
                ))
            })?;

        require(
            kind,
            inst.status != InstallmentStatus::Cancelled,
            &format!("installment {installment_number} is not cancelled"),
        )?;
        let remaining = inst.remaining()?;
        if amount > remaining {
            return Err(DomainError::invalid_amount(format!(
                "payment {amount} exceeds remaining {remaining} of installment {installment_number}"
            )));
        }

        inst.paid_amount = inst.paid_amount.checked_add(amount)?;
        if inst.paid_amount == inst.amount {
            inst.status = InstallmentStatus::Paid;
            inst.paid_at = Some(at);
        }
        next.totals = calculate_account_totals(&next.installments)?;

        let target = if next.totals.remaining_amount.is_zero() {
            AccountStatus::Paid
        } else {
            AccountStatus::PartiallyPaid
        };
        if target == next.status {
            next.bump(at);
            return Ok(next);
        }
        transition(&next, target, &(), at)
    }

    /// Cancel one unpaid installment (e.g. a renegotiated plan). If nothing
    /// else is open the account becomes paid.
    pub fn cancel_installment(
        &self,
        installment_number: u32,
        at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let kind = self.direction.kind();
        ensure_not_frozen(kind, self.status)?;

        let mut next = self.clone();
        let inst = next
            .installments
            .iter_mut()
            .find(|i| i.number == installment_number)
            .ok_or_else(|| {
                DomainError::invalid_line_item(format!("no installment {installment_number}"))
            })?;
        require(
            kind,
            inst.is_open() && inst.paid_amount.is_zero(),
            &format!("installment {installment_number} is open and unpaid"),
        )?;
        inst.status = InstallmentStatus::Cancelled;
        next.totals = calculate_account_totals(&next.installments)?;

        require(
            kind,
            !next.totals.total_amount.is_zero(),
            "at least one installment stays active",
        )?;
        if next.totals.remaining_amount.is_zero() {
            return transition(&next, AccountStatus::Paid, &(), at);
        }
        next.bump(at);
        Ok(next)
    }

    fn bump(&mut self, at: DateTime<Utc>) {
        self.version += 1;
        self.timestamps.touch(at);
    }
}

impl Entity for FinancialAccount {
    type Id = AccountId;

    fn id(&self) -> AccountId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }
}

impl Lifecycle for FinancialAccount {
    type Status = AccountStatus;
    type Context = ();

    fn kind(&self) -> EntityKind {
        self.direction.kind()
    }

    fn status(&self) -> AccountStatus {
        self.status
    }

    fn check_guards(&self, target: AccountStatus, _ctx: &()) -> DomainResult<()> {
        let kind = self.direction.kind();
        let totals = calculate_account_totals(&self.installments)?;
        match target {
            AccountStatus::PartiallyPaid => require(
                kind,
                totals.paid_amount.is_positive() && totals.paid_amount < totals.total_amount,
                "0 < paid < total",
            ),
            AccountStatus::Paid => {
                require(kind, totals.remaining_amount.is_zero(), "nothing remains open")
            }
            AccountStatus::Cancelled => {
                require(kind, totals.paid_amount.is_zero(), "nothing has been paid")
            }
            AccountStatus::Pending => Ok(()),
        }
    }

    fn enter(&mut self, target: AccountStatus, _ctx: &(), at: DateTime<Utc>) -> DomainResult<()> {
        if target == AccountStatus::Cancelled {
            for inst in &mut self.installments {
                inst.status = InstallmentStatus::Cancelled;
            }
        }
        self.totals = calculate_account_totals(&self.installments)?;
        if matches!(target, AccountStatus::Paid | AccountStatus::Cancelled) {
            self.timestamps.finalize(at);
        }
        self.status = target;
        self.bump(at);
        Ok(())
    }
}
