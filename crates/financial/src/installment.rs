use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use tradeflow_core::{DomainError, DomainResult, Money, add_days};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    Pending,
    Paid,
    Cancelled,
}

/// One due amount of a receivable or payable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    /// 1-based position within the account.
    pub number: u32,
    pub due_date: NaiveDate,
    pub amount: Money,
    pub paid_amount: Money,
    pub status: InstallmentStatus,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Installment {
    pub fn new(number: u32, due_date: NaiveDate, amount: Money) -> Self {
        Self {
            number,
            due_date,
            amount,
            paid_amount: Money::ZERO,
            status: InstallmentStatus::Pending,
            paid_at: None,
        }
    }

    /// Amount still open; zero for cancelled installments.
    pub fn remaining(&self) -> DomainResult<Money> {
        if self.status == InstallmentStatus::Cancelled {
            return Ok(Money::ZERO);
        }
        self.amount.checked_sub(self.paid_amount)
    }

    pub fn is_open(&self) -> bool {
        self.status == InstallmentStatus::Pending
    }

    pub fn validate(&self) -> DomainResult<()> {
        self.amount.ensure_positive("installment amount")?;
        self.paid_amount.ensure_non_negative("installment paid amount")?;
        if self.paid_amount > self.amount {
            return Err(DomainError::invalid_amount(format!(
                "installment {}: paid {} exceeds amount {}",
                self.number, self.paid_amount, self.amount
            )));
        }
        Ok(())
    }
}

/// Split `total` into `count` installments, `interval_days` apart.
///
/// Every installment gets `total / count` cents; the division remainder goes
/// on the first one.
pub fn split_installments(
    total: Money,
    count: u32,
    first_due: NaiveDate,
    interval_days: u32,
) -> DomainResult<Vec<Installment>> {
    total.ensure_positive("installment total")?;
    if count == 0 {
        return Err(DomainError::invalid_amount("installment count must be positive"));
    }
    let count_i64 = i64::from(count);
    if total.cents() < count_i64 {
        return Err(DomainError::invalid_amount(format!(
            "cannot split {total} into {count} installments"
        )));
    }

    let base = total.cents() / count_i64;
    let remainder = total.cents() % count_i64;

    (0..count)
        .map(|i| {
            let offset = i.checked_mul(interval_days).ok_or_else(|| {
                DomainError::invalid_amount("installment schedule overflows the calendar")
            })?;
            let cents = if i == 0 { base + remainder } else { base };
            Ok(Installment::new(
                i + 1,
                add_days(first_due, offset)?,
                Money::from_cents(cents),
            ))
        })
        .collect()
}
