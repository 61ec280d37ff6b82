use serde::{Deserialize, Serialize};

use tradeflow_core::{DomainError, DomainResult, Money, ProductId};

/// One product line of a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseItem {
    pub product_id: ProductId,
    pub description: String,
    pub quantity: i64,
    pub unit_cost: Money,
    /// Freight apportioned to each unit.
    pub freight_per_tire: Money,
}

/// Per-line cost derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseItemCosts {
    /// Landed cost of one unit (`unit_cost + freight_per_tire`).
    pub total_unit_cost: Money,
    pub total_cost: Money,
}

impl PurchaseItem {
    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity <= 0 {
            return Err(DomainError::invalid_line_item(format!(
                "purchase item '{}': quantity must be positive (got {})",
                self.description, self.quantity
            )));
        }
        if self.unit_cost.is_negative() {
            return Err(DomainError::invalid_line_item(format!(
                "purchase item '{}': unit_cost must not be negative",
                self.description
            )));
        }
        if self.freight_per_tire.is_negative() {
            return Err(DomainError::invalid_line_item(format!(
                "purchase item '{}': freight_per_tire must not be negative",
                self.description
            )));
        }
        Ok(())
    }

    pub fn costs(&self) -> DomainResult<PurchaseItemCosts> {
        calculate_purchase_item(self)
    }
}

/// Derive the landed unit cost and line total of a purchase item.
pub fn calculate_purchase_item(item: &PurchaseItem) -> DomainResult<PurchaseItemCosts> {
    item.validate()?;
    let total_unit_cost = item.unit_cost.checked_add(item.freight_per_tire)?;
    let total_cost = total_unit_cost.checked_mul_qty(item.quantity)?;
    Ok(PurchaseItemCosts {
        total_unit_cost,
        total_cost,
    })
}
