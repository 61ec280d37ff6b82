//! Sales domain module (customer orders).
//!
//! Order line margins, order totals and the order lifecycle
//! (`pending -> in_load -> delivered`). Pure domain logic: no IO, no storage.

pub mod item;
pub mod order;
pub mod totals;

pub use item::{OrderItem, OrderItemDerivation, calculate_order_item};
pub use order::{NewOrder, Order, OrderContext, OrderId, SellerCommission};
pub use totals::{OrderTotals, calculate_order_totals};
