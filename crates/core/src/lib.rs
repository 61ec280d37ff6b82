//! `tradeflow-core`: domain foundation building blocks.
//!
//! Money and percentage primitives, identifiers, the shared error taxonomy and
//! the entity contract. This crate contains **pure domain** code (no
//! infrastructure concerns).

pub mod calendar;
pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod terms;
pub mod value_object;

pub use calendar::{add_days, utc_day};
pub use entity::{Entity, ExpectedVersion, Timestamps};
pub use error::{DomainError, DomainResult};
pub use id::{AggregateId, CustomerId, LoadId, ProductId, SellerId, SupplierId};
pub use money::{Money, Percent, apply_percent, ensure_positive_quantity, ratio_percent};
pub use terms::{PaymentCondition, due_date, payment_term_days};
pub use value_object::ValueObject;
