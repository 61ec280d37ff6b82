//! Calendar-day conventions.
//!
//! Due dates are `NaiveDate` values interpreted as UTC calendar days. Any
//! timestamp that has to be compared against a due date is first reduced to
//! its UTC day with [`utc_day`].

use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::error::{DomainError, DomainResult};

/// The UTC calendar day a timestamp falls on.
pub fn utc_day(at: DateTime<Utc>) -> NaiveDate {
    at.date_naive()
}

/// `date + days`, failing with `InvalidAmount` outside chrono's range.
pub fn add_days(date: NaiveDate, days: u32) -> DomainResult<NaiveDate> {
    date.checked_add_days(Days::new(u64::from(days)))
        .ok_or_else(|| DomainError::invalid_amount(format!("{date} + {days} days is out of range")))
}
