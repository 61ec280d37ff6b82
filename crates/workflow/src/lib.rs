//! `tradeflow-workflow`: status lifecycles shared by every entity kind.
//!
//! - [`registry`]: ordered steps and labels per entity kind (rendering).
//! - [`status`]: typed statuses and their one-step transition graphs.
//! - [`lifecycle`]: the generic transition driver (edge check, guards, apply).

pub mod kind;
pub mod lifecycle;
pub mod registry;
pub mod status;

pub use kind::EntityKind;
pub use lifecycle::{Lifecycle, allowed_targets, ensure_edge, ensure_not_frozen, require, transition};
pub use registry::{
    StatusFlowConfig, StatusLabel, StatusStep, StepProgress, StepState, index_of, is_after,
    is_before, is_cancellation, is_terminal, progress, step, step_of, steps_for,
};
pub use status::{
    AccountStatus, CardReconciliationStatus, CommissionStatus, LoadStatus, OrderStatus,
    PurchaseStatus, StatusKey,
};
