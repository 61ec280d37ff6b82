use serde::{Deserialize, Serialize};

use tradeflow_core::{DomainError, DomainResult, Money};

use crate::item::LoadItem;

/// Load-level totals, always re-derived from the items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoadTotals {
    pub total_items: usize,
    pub total_ordered: i64,
    pub total_loaded: i64,
    pub total_freight: Money,
    /// Sale value of what is (or will be) on the truck.
    pub total_value: Money,
    /// Some conferred item diverges from its ordered quantity.
    pub has_discrepancy: bool,
}

/// Σ freight contribution, on loaded quantities.
pub fn calculate_load_freight(items: &[LoadItem]) -> DomainResult<Money> {
    Money::sum(
        items
            .iter()
            .map(LoadItem::freight_contribution)
            .collect::<DomainResult<Vec<_>>>()?,
    )
}

/// Σ loaded quantity (ordered quantity for items not yet conferred).
pub fn calculate_total_loaded_items(items: &[LoadItem]) -> DomainResult<i64> {
    sum_loaded(items)
}

pub(crate) fn sum_loaded<'a>(items: impl IntoIterator<Item = &'a LoadItem>) -> DomainResult<i64> {
    items
        .into_iter()
        .try_fold(0, |acc, item| checked_qty(acc, item.effective_quantity()))
}

pub fn calculate_load_totals(items: &[LoadItem]) -> DomainResult<LoadTotals> {
    let mut totals = LoadTotals {
        total_items: items.len(),
        ..LoadTotals::default()
    };

    for item in items {
        item.validate()?;
        totals.total_ordered = checked_qty(totals.total_ordered, item.ordered_quantity)?;
        totals.total_loaded = checked_qty(totals.total_loaded, item.effective_quantity())?;
        totals.total_freight = totals.total_freight.checked_add(item.freight_contribution()?)?;
        totals.total_value = totals.total_value.checked_add(item.sale_value()?)?;
        totals.has_discrepancy |= item.discrepancy().is_some_and(|d| d != 0);
    }

    Ok(totals)
}

fn checked_qty(acc: i64, qty: i64) -> DomainResult<i64> {
    acc.checked_add(qty)
        .ok_or_else(|| DomainError::invalid_amount("load quantity overflow"))
}
