//! Purchasing domain module (supplier purchase orders).
//!
//! Line-item cost derivation, purchase totals and the purchase lifecycle
//! (`created -> awaiting_delivery -> received`). Pure domain logic: no IO, no
//! storage.

pub mod item;
pub mod purchase;
pub mod totals;

pub use item::{PurchaseItem, PurchaseItemCosts, calculate_purchase_item};
pub use purchase::{NewPurchase, Purchase, PurchaseId, ensure_unique_nfe_key, validate_nfe_key};
pub use totals::{PurchaseTotals, calculate_purchase_totals};
