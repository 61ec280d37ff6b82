//! Fixed-point money and percentage primitives.
//!
//! Every monetary value in the engine is an integer count of minor units
//! (cents). Decimal strings and floats only appear at the boundary
//! (`Money::parse`, `Money::from_f64`, `Display`). Rates are basis points
//! (hundredths of a percent) so `2.5%` is `Percent::from_bps(250)`.
//!
//! Rounding is "round half up": `floor(x + 1/2)`, so ties go toward positive
//! infinity. This is the same rule the UI applies with `Math.round`, which
//! keeps exported totals identical to the engine's.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

const CENTS_PER_UNIT: i64 = 100;
const BPS_PER_PERCENT: i64 = 100;
const BPS_SCALE: i128 = 10_000;

/// Integer division rounding half up (`floor(num / den + 1/2)`).
///
/// `den` must be non-zero; a negative denominator flips both signs first.
pub fn round_half_up(num: i128, den: i128) -> i128 {
    debug_assert!(den != 0, "round_half_up called with zero denominator");
    let (num, den) = if den < 0 { (-num, -den) } else { (num, den) };
    (2 * num + den).div_euclid(2 * den)
}

/// Monetary amount in minor units (cents).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(0);

    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Whole currency units (e.g. `from_major(320)` is `320.00`).
    pub fn from_major(units: i64) -> DomainResult<Self> {
        units
            .checked_mul(CENTS_PER_UNIT)
            .map(Money)
            .ok_or_else(|| DomainError::invalid_amount(format!("{units} overflows")))
    }

    /// Convert a boundary float, rounding half up to the cent.
    pub fn from_f64(value: f64) -> DomainResult<Self> {
        if !value.is_finite() {
            return Err(DomainError::invalid_amount(format!("{value} is not finite")));
        }
        let cents = (value * CENTS_PER_UNIT as f64 + 0.5).floor();
        if cents < i64::MIN as f64 || cents > i64::MAX as f64 {
            return Err(DomainError::invalid_amount(format!("{value} overflows")));
        }
        Ok(Money(cents as i64))
    }

    /// Lossy conversion for display purposes only.
    pub fn to_f64(&self) -> f64 {
        self.0 as f64 / CENTS_PER_UNIT as f64
    }

    /// Parse a decimal string such as `"320"`, `"320.5"`, `"-15.00"` or `"15,90"`.
    ///
    /// At most two fractional digits are accepted.
    pub fn parse(input: &str) -> DomainResult<Self> {
        let (negative, whole, frac) = split_decimal(input)?;
        if frac.len() > 2 {
            return Err(DomainError::invalid_amount(format!(
                "'{input}' has more than two decimal places"
            )));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| DomainError::invalid_amount(format!("'{input}' is out of range")))?
        };
        let frac_cents: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().unwrap_or(0) * 10,
            _ => frac.parse::<i64>().unwrap_or(0),
        };

        let cents = whole
            .checked_mul(CENTS_PER_UNIT)
            .and_then(|c| c.checked_add(frac_cents))
            .ok_or_else(|| DomainError::invalid_amount(format!("'{input}' is out of range")))?;

        Ok(Money(if negative { -cents } else { cents }))
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Money) -> DomainResult<Money> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or_else(|| DomainError::invalid_amount("money addition overflow"))
    }

    pub fn checked_sub(self, other: Money) -> DomainResult<Money> {
        self.0
            .checked_sub(other.0)
            .map(Money)
            .ok_or_else(|| DomainError::invalid_amount("money subtraction overflow"))
    }

    /// Multiply by an item quantity.
    pub fn checked_mul_qty(self, quantity: i64) -> DomainResult<Money> {
        self.0
            .checked_mul(quantity)
            .map(Money)
            .ok_or_else(|| DomainError::invalid_amount("money multiplication overflow"))
    }

    /// Divide by a positive count, rounding half up (e.g. average cost per unit).
    pub fn divide_round(self, divisor: i64) -> DomainResult<Money> {
        if divisor <= 0 {
            return Err(DomainError::invalid_amount("divisor must be positive"));
        }
        Ok(Money(
            round_half_up(self.0 as i128, divisor as i128) as i64,
        ))
    }

    /// Sum an iterator of amounts with overflow checking.
    pub fn sum<I>(amounts: I) -> DomainResult<Money>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |acc, m| acc.checked_add(m))
    }

    /// Reject negative amounts, naming the offending field.
    pub fn ensure_non_negative(self, field: &str) -> DomainResult<Money> {
        if self.is_negative() {
            return Err(DomainError::invalid_amount(format!(
                "{field} must not be negative (got {self})"
            )));
        }
        Ok(self)
    }

    /// Reject zero and negative amounts, naming the offending field.
    pub fn ensure_positive(self, field: &str) -> DomainResult<Money> {
        if !self.is_positive() {
            return Err(DomainError::invalid_amount(format!(
                "{field} must be positive (got {self})"
            )));
        }
        Ok(self)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(
            f,
            "{sign}{}.{:02}",
            abs / CENTS_PER_UNIT as u64,
            abs % CENTS_PER_UNIT as u64
        )
    }
}

impl FromStr for Money {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse(s)
    }
}

/// A rate expressed in basis points (`1% == 100 bps`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Percent(i64);

impl ValueObject for Percent {}

impl Percent {
    pub const ZERO: Percent = Percent(0);

    #[inline]
    pub const fn from_bps(bps: i64) -> Self {
        Percent(bps)
    }

    /// Whole percent (e.g. `from_whole(20)` is `20.00%`).
    #[inline]
    pub const fn from_whole(percent: i64) -> Self {
        Percent(percent * BPS_PER_PERCENT)
    }

    #[inline]
    pub const fn bps(&self) -> i64 {
        self.0
    }

    /// Parse `"2.5"`, `"20"`, `"12,75"` (at most two decimal places).
    pub fn parse(input: &str) -> DomainResult<Self> {
        // Same grammar as money: percent points with two decimals.
        let as_money = Money::parse(input)
            .map_err(|_| DomainError::invalid_amount(format!("'{input}' is not a valid rate")))?;
        Ok(Percent(as_money.cents()))
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / BPS_PER_PERCENT as f64
    }

    pub fn ensure_non_negative(self, field: &str) -> DomainResult<Percent> {
        if self.0 < 0 {
            return Err(DomainError::invalid_amount(format!(
                "{field} must not be negative (got {self}%)"
            )));
        }
        Ok(self)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&Money::from_cents(self.0), f)
    }
}

/// `round_half_up(base * pct / 100)`, in cents.
pub fn apply_percent(base: Money, pct: Percent) -> DomainResult<Money> {
    let raw = round_half_up(base.cents() as i128 * pct.bps() as i128, BPS_SCALE);
    i64::try_from(raw)
        .map(Money::from_cents)
        .map_err(|_| DomainError::invalid_amount("percentage application overflow"))
}

/// `part / whole * 100`, rounded half up to a basis point. Zero when `whole` is zero.
pub fn ratio_percent(part: Money, whole: Money) -> Percent {
    if whole.is_zero() {
        return Percent::ZERO;
    }
    let bps = round_half_up(part.cents() as i128 * BPS_SCALE, whole.cents() as i128);
    Percent(bps.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
}

/// Reject non-positive quantities.
pub fn ensure_positive_quantity(quantity: i64, field: &str) -> DomainResult<i64> {
    if quantity <= 0 {
        return Err(DomainError::invalid_amount(format!(
            "{field} must be positive (got {quantity})"
        )));
    }
    Ok(quantity)
}

fn split_decimal(input: &str) -> DomainResult<(bool, &str, &str)> {
    let trimmed = input.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let (whole, frac) = match body.find(['.', ',']) {
        Some(pos) => (&body[..pos], &body[pos + 1..]),
        None => (body, ""),
    };

    let digits_ok = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !digits_ok(whole) || !digits_ok(frac) {
        return Err(DomainError::invalid_amount(format!(
            "'{input}' is not a decimal amount"
        )));
    }

    Ok((negative, whole, frac))
}
