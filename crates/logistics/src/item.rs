use serde::{Deserialize, Serialize};

use tradeflow_core::{DomainError, DomainResult, Money, ProductId};
use tradeflow_sales::{OrderId, OrderItem};

/// An order line as carried by a load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadItem {
    pub order_id: OrderId,
    /// Position of the line within its order; an order may repeat a product.
    pub line: usize,
    pub product_id: ProductId,
    pub description: String,
    pub ordered_quantity: i64,
    /// Set by the conference; `None` until the item has been counted.
    pub loaded_quantity: Option<i64>,
    pub freight_per_tire: Money,
    pub sale_price: Money,
}

impl LoadItem {
    pub fn from_order_item(order_id: OrderId, line: usize, item: &OrderItem) -> Self {
        Self {
            order_id,
            line,
            product_id: item.product_id,
            description: item.description.clone(),
            ordered_quantity: item.quantity,
            loaded_quantity: None,
            freight_per_tire: item.freight_per_tire,
            sale_price: item.sale_price,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.ordered_quantity <= 0 {
            return Err(DomainError::invalid_line_item(format!(
                "load item '{}': ordered quantity must be positive",
                self.description
            )));
        }
        if let Some(loaded) = self.loaded_quantity {
            check_loaded_quantity(&self.description, self.ordered_quantity, loaded)?;
        }
        if self.freight_per_tire.is_negative() || self.sale_price.is_negative() {
            return Err(DomainError::invalid_line_item(format!(
                "load item '{}': prices must not be negative",
                self.description
            )));
        }
        Ok(())
    }

    /// Quantity freight and value are computed on: loaded once conferred,
    /// ordered before that.
    pub fn effective_quantity(&self) -> i64 {
        self.loaded_quantity.unwrap_or(self.ordered_quantity)
    }

    pub fn is_conferred(&self) -> bool {
        self.loaded_quantity.is_some()
    }

    pub fn freight_contribution(&self) -> DomainResult<Money> {
        self.freight_per_tire.checked_mul_qty(self.effective_quantity())
    }

    pub fn sale_value(&self) -> DomainResult<Money> {
        self.sale_price.checked_mul_qty(self.effective_quantity())
    }

    /// `loaded - ordered` (negative when short-loaded); `None` before conference.
    pub fn discrepancy(&self) -> Option<i64> {
        self.loaded_quantity.map(|loaded| loaded - self.ordered_quantity)
    }
}

pub(crate) fn check_loaded_quantity(description: &str, ordered: i64, loaded: i64) -> DomainResult<()> {
    if loaded < 0 {
        return Err(DomainError::invalid_line_item(format!(
            "load item '{description}': loaded quantity must not be negative"
        )));
    }
    if loaded > ordered {
        return Err(DomainError::invalid_line_item(format!(
            "load item '{description}': loaded {loaded} exceeds ordered {ordered}"
        )));
    }
    Ok(())
}
