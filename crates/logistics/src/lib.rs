//! Logistics domain module (loads / delivery runs).
//!
//! A load groups pending orders onto one truck. Its items copy the order
//! lines with an independent `loaded_quantity` filled in during the
//! conference, and freight and value follow what was actually loaded.

pub mod item;
pub mod load;
pub mod totals;

pub use item::LoadItem;
pub use load::{ConferenceEntry, Load, LoadDetails};
pub use totals::{
    LoadTotals, calculate_load_freight, calculate_load_totals, calculate_total_loaded_items,
};
pub use tradeflow_core::LoadId;
