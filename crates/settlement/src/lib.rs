//! Cross-entity settlement linker.
//!
//! Turns a completed status transition into the follow-up work it implies for
//! other entities (stock entries, payables, receivables, NF-e emission,
//! commissions). The linker only *describes* that work as [`DomainEvent`]s;
//! an orchestrator outside the domain fulfils them. Output is a pure function
//! of the transition, so redelivering the same transition yields the same
//! events and consumers can deduplicate on them.

pub mod event;
pub mod linker;

pub use event::{DomainEvent, StockEntryLine};
pub use linker::{Transitioned, events_for, load_assembled};
