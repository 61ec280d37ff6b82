use serde::{Deserialize, Serialize};

use tradeflow_core::{DomainResult, Money};

use crate::installment::{Installment, InstallmentStatus};

/// Account totals, always re-derived from the installments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountTotals {
    /// Σ amount of non-cancelled installments.
    pub total_amount: Money,
    pub paid_amount: Money,
    pub remaining_amount: Money,
    pub open_installments: usize,
}

pub fn calculate_account_totals(installments: &[Installment]) -> DomainResult<AccountTotals> {
    let mut totals = AccountTotals::default();

    for inst in installments {
        inst.validate()?;
        totals.paid_amount = totals.paid_amount.checked_add(inst.paid_amount)?;
        if inst.status == InstallmentStatus::Cancelled {
            continue;
        }
        totals.total_amount = totals.total_amount.checked_add(inst.amount)?;
        totals.remaining_amount = totals.remaining_amount.checked_add(inst.remaining()?)?;
        if inst.is_open() {
            totals.open_installments += 1;
        }
    }

    Ok(totals)
}
