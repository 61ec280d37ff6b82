//! Cash-flow projector.
//!
//! Projects day-by-day expected income and expenses from the open
//! installments of receivables and payables, with a running balance.

pub mod projector;

pub use projector::{
    CashFlowDay, CashFlowProjection, DEFAULT_MAX_HORIZON_DAYS, OverdueSummary, ProjectionParams,
    project, project_within,
};
