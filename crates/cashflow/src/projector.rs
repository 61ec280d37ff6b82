use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tradeflow_core::{DomainError, DomainResult, Money, add_days};
use tradeflow_financial::{AccountDirection, FinancialAccount, InstallmentStatus};
use tradeflow_workflow::{AccountStatus, Lifecycle};

/// Longest horizon [`project`] accepts.
pub const DEFAULT_MAX_HORIZON_DAYS: u32 = 365;

/// Projection window and opening balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionParams {
    /// First projected day (UTC calendar day).
    pub as_of: NaiveDate,
    pub horizon_days: u32,
    pub starting_balance: Money,
}

impl ProjectionParams {
    pub fn new(as_of: NaiveDate, horizon_days: u32, starting_balance: Money) -> Self {
        Self {
            as_of,
            horizon_days,
            starting_balance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowDay {
    pub date: NaiveDate,
    pub expected_income: Money,
    pub expected_expenses: Money,
    pub running_balance: Money,
}

/// Open amounts already past due at `as_of`; kept out of the daily buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverdueSummary {
    pub overdue_income: Money,
    pub overdue_expenses: Money,
    pub overdue_installments: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowProjection {
    pub as_of: NaiveDate,
    pub starting_balance: Money,
    pub days: Vec<CashFlowDay>,
    pub total_expected_income: Money,
    pub total_expected_expenses: Money,
    pub final_balance: Money,
    pub min_balance: Money,
    /// First day the minimum balance is reached.
    pub min_balance_date: NaiveDate,
    pub overdue: OverdueSummary,
}

/// Project expected cash movement over `params.horizon_days` days, at most
/// [`DEFAULT_MAX_HORIZON_DAYS`].
///
/// Only non-cancelled, non-paid installments of non-cancelled accounts count,
/// each with its remaining amount on its due date.
pub fn project(
    accounts: &[FinancialAccount],
    params: &ProjectionParams,
) -> DomainResult<CashFlowProjection> {
    project_within(accounts, params, DEFAULT_MAX_HORIZON_DAYS)
}

/// [`project`] with an operator-configured horizon limit.
pub fn project_within(
    accounts: &[FinancialAccount],
    params: &ProjectionParams,
    max_horizon_days: u32,
) -> DomainResult<CashFlowProjection> {
    if params.horizon_days == 0 || params.horizon_days > max_horizon_days {
        return Err(DomainError::invalid_amount(format!(
            "horizon must be between 1 and {max_horizon_days} days (got {})",
            params.horizon_days
        )));
    }
    let horizon = params.horizon_days as usize;

    let mut income = vec![Money::ZERO; horizon];
    let mut expenses = vec![Money::ZERO; horizon];
    let mut overdue = OverdueSummary::default();

    for account in accounts {
        if account.status() == AccountStatus::Cancelled {
            continue;
        }
        let direction = account.direction();
        for inst in account.installments() {
            if inst.status != InstallmentStatus::Pending {
                continue;
            }
            let remaining = inst.remaining()?;
            if remaining.is_zero() {
                continue;
            }

            let offset = (inst.due_date - params.as_of).num_days();
            if offset < 0 {
                overdue.overdue_installments += 1;
                let slot = match direction {
                    AccountDirection::Receivable => &mut overdue.overdue_income,
                    AccountDirection::Payable => &mut overdue.overdue_expenses,
                };
                *slot = slot.checked_add(remaining)?;
                continue;
            }
            let Ok(idx) = usize::try_from(offset) else {
                continue;
            };
            if idx >= horizon {
                continue;
            }
            let bucket = match direction {
                AccountDirection::Receivable => &mut income[idx],
                AccountDirection::Payable => &mut expenses[idx],
            };
            *bucket = bucket.checked_add(remaining)?;
        }
    }

    let mut days = Vec::with_capacity(horizon);
    let mut balance = params.starting_balance;
    let mut total_income = Money::ZERO;
    let mut total_expenses = Money::ZERO;
    let mut min_balance: Option<(Money, NaiveDate)> = None;

    for (i, (day_income, day_expenses)) in income.into_iter().zip(expenses).enumerate() {
        // i < horizon_days, which is a u32
        let date = add_days(params.as_of, i as u32)?;
        balance = balance.checked_add(day_income)?.checked_sub(day_expenses)?;
        total_income = total_income.checked_add(day_income)?;
        total_expenses = total_expenses.checked_add(day_expenses)?;

        if min_balance.is_none_or(|(min, _)| balance < min) {
            min_balance = Some((balance, date));
        }
        days.push(CashFlowDay {
            date,
            expected_income: day_income,
            expected_expenses: day_expenses,
            running_balance: balance,
        });
    }

    let (min_balance, min_balance_date) =
        min_balance.unwrap_or((params.starting_balance, params.as_of));
    debug!(
        as_of = %params.as_of,
        horizon = params.horizon_days,
        accounts = accounts.len(),
        %balance,
        "cash flow projected"
    );

    Ok(CashFlowProjection {
        as_of: params.as_of,
        starting_balance: params.starting_balance,
        days,
        total_expected_income: total_income,
        total_expected_expenses: total_expenses,
        final_balance: balance,
        min_balance,
        min_balance_date,
        overdue,
    })
}
