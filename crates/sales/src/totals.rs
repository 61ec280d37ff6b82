use serde::{Deserialize, Serialize};

use tradeflow_core::{DomainError, DomainResult, Money, Percent, ratio_percent};

use crate::item::{OrderItem, calculate_order_item};

/// Order-level totals, always re-derived from the items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderTotals {
    pub total_items: usize,
    pub total_quantity: i64,
    pub total_amount: Money,
    pub total_margin: Money,
    /// Margin over revenue; 0 for an order without revenue.
    pub margin_percentage: Percent,
}

pub fn calculate_order_totals(items: &[OrderItem]) -> DomainResult<OrderTotals> {
    let mut totals = OrderTotals {
        total_items: items.len(),
        ..OrderTotals::default()
    };

    for item in items {
        let d = calculate_order_item(item)?;
        totals.total_quantity = totals
            .total_quantity
            .checked_add(item.quantity)
            .ok_or_else(|| DomainError::invalid_amount("order quantity overflow"))?;
        totals.total_amount = totals.total_amount.checked_add(d.item_total)?;
        totals.total_margin = totals.total_margin.checked_add(d.total_margin)?;
    }

    totals.margin_percentage = ratio_percent(totals.total_margin, totals.total_amount);
    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tradeflow_core::{AggregateId, ProductId};

    fn item(n: u128, quantity: i64, sale: i64, cost: i64, freight: i64) -> OrderItem {
        OrderItem {
            product_id: ProductId::new(AggregateId::from_u128(n)),
            description: format!("item {n}"),
            quantity,
            sale_price: Money::from_cents(sale),
            purchase_cost: Money::from_cents(cost),
            freight_per_tire: Money::from_cents(freight),
        }
    }

    #[test]
    fn margin_percentage_is_weighted_by_revenue() {
        // 2000.00 revenue / 400.00 margin + 1000.00 revenue / 0 margin
        let items = vec![
            item(1, 5, 40_000, 30_000, 2_000),
            item(2, 10, 10_000, 9_000, 1_000),
        ];
        let totals = calculate_order_totals(&items).unwrap();
        assert_eq!(totals.total_amount.to_string(), "3000.00");
        assert_eq!(totals.total_margin.to_string(), "400.00");
        // 400 / 3000 = 13.333% -> 13.33%
        assert_eq!(totals.margin_percentage, Percent::from_bps(1333));
        assert_eq!(totals.total_quantity, 15);
    }

    #[test]
    fn empty_order_has_zero_totals() {
        assert_eq!(calculate_order_totals(&[]).unwrap(), OrderTotals::default());
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 256, .. ProptestConfig::default() })]

        #[test]
        fn totals_equal_sum_of_item_derivations(
            lines in prop::collection::vec(
                (1i64..200, 0i64..100_000, 0i64..100_000, 0i64..5_000),
                0..10,
            )
        ) {
            let items: Vec<_> = lines
                .iter()
                .enumerate()
                .map(|(i, (q, s, c, f))| item(i as u128, *q, *s, *c, *f))
                .collect();

            let totals = calculate_order_totals(&items).unwrap();
            let amount: i64 = lines.iter().map(|(q, s, _, _)| q * s).sum();
            let margin: i64 = lines.iter().map(|(q, s, c, f)| q * (s - c - f)).sum();

            prop_assert_eq!(totals.total_amount.cents(), amount);
            prop_assert_eq!(totals.total_margin.cents(), margin);
            prop_assert_eq!(calculate_order_totals(&items).unwrap(), totals);
        }
    }
}
