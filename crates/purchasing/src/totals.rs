use serde::{Deserialize, Serialize};

use tradeflow_core::{DomainError, DomainResult, Money};

use crate::item::{PurchaseItem, calculate_purchase_item};

/// Purchase-level totals, always re-derived from the items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PurchaseTotals {
    pub total_items: usize,
    pub total_quantity: i64,
    pub total_cost: Money,
    pub average_cost_per_tire: Money,
}

pub fn calculate_purchase_totals(items: &[PurchaseItem]) -> DomainResult<PurchaseTotals> {
    let mut total_quantity: i64 = 0;
    let mut total_cost = Money::ZERO;

    for item in items {
        let costs = calculate_purchase_item(item)?;
        total_quantity = total_quantity
            .checked_add(item.quantity)
            .ok_or_else(|| DomainError::invalid_amount("purchase quantity overflow"))?;
        total_cost = total_cost.checked_add(costs.total_cost)?;
    }

    let average_cost_per_tire = if total_quantity == 0 {
        Money::ZERO
    } else {
        total_cost.divide_round(total_quantity)?
    };

    Ok(PurchaseTotals {
        total_items: items.len(),
        total_quantity,
        total_cost,
        average_cost_per_tire,
    })
}
