//! Commercial payment terms.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::add_days;
use crate::error::{DomainError, DomainResult};

/// Payment condition negotiated on a purchase or sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentCondition {
    #[serde(rename = "cash")]
    Cash,
    #[serde(rename = "net_7")]
    Net7,
    #[serde(rename = "net_14")]
    Net14,
    #[serde(rename = "net_21")]
    Net21,
    #[serde(rename = "net_28")]
    Net28,
    #[serde(rename = "net_30")]
    Net30,
    #[serde(rename = "net_45")]
    Net45,
    #[serde(rename = "net_60")]
    Net60,
    #[serde(rename = "net_90")]
    Net90,
    /// Days given separately (`custom_days`).
    #[serde(rename = "custom")]
    Custom,
}

/// Days between the document date and the payment due date.
pub fn payment_term_days(condition: PaymentCondition, custom_days: Option<u32>) -> DomainResult<u32> {
    Ok(match condition {
        PaymentCondition::Cash => 0,
        PaymentCondition::Net7 => 7,
        PaymentCondition::Net14 => 14,
        PaymentCondition::Net21 => 21,
        PaymentCondition::Net28 => 28,
        PaymentCondition::Net30 => 30,
        PaymentCondition::Net45 => 45,
        PaymentCondition::Net60 => 60,
        PaymentCondition::Net90 => 90,
        PaymentCondition::Custom => custom_days.ok_or_else(|| {
            DomainError::invalid_amount("custom payment condition requires custom_days")
        })?,
    })
}

/// `base + payment_term_days(condition, custom_days)`.
pub fn due_date(
    base: NaiveDate,
    condition: PaymentCondition,
    custom_days: Option<u32>,
) -> DomainResult<NaiveDate> {
    add_days(base, payment_term_days(condition, custom_days)?)
}
