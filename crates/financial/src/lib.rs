//! Financial domain module.
//!
//! Receivables and payables paid in installments, sales commissions and card
//! sale reconciliations. Pure domain logic: no IO, no storage.

pub mod account;
pub mod card;
pub mod commission;
pub mod installment;
pub mod totals;

pub use account::{AccountDirection, AccountId, FinancialAccount, NewAccount};
pub use card::{CardReconciliation, CardReconciliationId, CardType, NewCardSale};
pub use commission::{Commission, CommissionId};
pub use installment::{Installment, InstallmentStatus, split_installments};
pub use totals::{AccountTotals, calculate_account_totals};
