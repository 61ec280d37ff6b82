use serde::{Deserialize, Serialize};

use tradeflow_core::{DomainError, DomainResult, Money, Percent, ProductId, ratio_percent};

/// One product line of a customer order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub description: String,
    pub quantity: i64,
    pub sale_price: Money,
    /// Unit cost paid to the supplier.
    pub purchase_cost: Money,
    pub freight_per_tire: Money,
}

/// Per-line revenue and margin derivation. Margins may be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemDerivation {
    pub item_total: Money,
    pub margin_per_unit: Money,
    pub total_margin: Money,
    pub margin_percentage: Percent,
}

impl OrderItem {
    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity <= 0 {
            return Err(DomainError::invalid_line_item(format!(
                "order item '{}': quantity must be positive (got {})",
                self.description, self.quantity
            )));
        }
        for (field, value) in [
            ("sale_price", self.sale_price),
            ("purchase_cost", self.purchase_cost),
            ("freight_per_tire", self.freight_per_tire),
        ] {
            if value.is_negative() {
                return Err(DomainError::invalid_line_item(format!(
                    "order item '{}': {field} must not be negative",
                    self.description
                )));
            }
        }
        Ok(())
    }

    /// Unit margin: sale price minus landed cost.
    pub fn margin_per_unit(&self) -> DomainResult<Money> {
        self.sale_price
            .checked_sub(self.purchase_cost)?
            .checked_sub(self.freight_per_tire)
    }

    /// Derivation for an arbitrary quantity (loads value orders on loaded units).
    pub fn derive_for_quantity(&self, quantity: i64) -> DomainResult<OrderItemDerivation> {
        let item_total = self.sale_price.checked_mul_qty(quantity)?;
        let margin_per_unit = self.margin_per_unit()?;
        let total_margin = margin_per_unit.checked_mul_qty(quantity)?;
        Ok(OrderItemDerivation {
            item_total,
            margin_per_unit,
            total_margin,
            margin_percentage: ratio_percent(total_margin, item_total),
        })
    }
}

pub fn calculate_order_item(item: &OrderItem) -> DomainResult<OrderItemDerivation> {
    item.validate()?;
    item.derive_for_quantity(item.quantity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradeflow_core::AggregateId;

    fn item(quantity: i64, sale: &str, cost: &str, freight: &str) -> OrderItem {
        OrderItem {
            product_id: ProductId::new(AggregateId::from_u128(3)),
            description: "Pneu 11.00R22".to_string(),
            quantity,
            sale_price: Money::parse(sale).unwrap(),
            purchase_cost: Money::parse(cost).unwrap(),
            freight_per_tire: Money::parse(freight).unwrap(),
        }
    }

    #[test]
    fn margin_is_price_minus_landed_cost() {
        let d = calculate_order_item(&item(5, "400", "300", "20")).unwrap();
        assert_eq!(d.margin_per_unit.to_string(), "80.00");
        assert_eq!(d.total_margin.to_string(), "400.00");
        assert_eq!(d.item_total.to_string(), "2000.00");
        assert_eq!(d.margin_percentage, Percent::from_whole(20));
    }

    #[test]
    fn selling_below_cost_gives_negative_margin() {
        let d = calculate_order_item(&item(2, "300", "300", "20")).unwrap();
        assert_eq!(d.total_margin, Money::parse("-40.00").unwrap());
        assert!(d.margin_percentage.bps() < 0);
    }

    #[test]
    fn free_line_has_zero_margin_percentage() {
        let d = calculate_order_item(&item(1, "0", "0", "0")).unwrap();
        assert_eq!(d.item_total, Money::ZERO);
        assert_eq!(d.margin_percentage, Percent::ZERO);
    }

    #[test]
    fn invalid_lines_are_rejected() {
        assert!(matches!(
            calculate_order_item(&item(0, "400", "300", "20")),
            Err(DomainError::InvalidLineItem(_))
        ));
        assert!(matches!(
            calculate_order_item(&item(1, "400", "-1", "20")),
            Err(DomainError::InvalidLineItem(_))
        ));
    }
}
