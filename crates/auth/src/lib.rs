//! `tradeflow-auth`: permission policy collaborator.
//!
//! Answers "may this actor perform this action on this module?" from a flat
//! list of permission strings. Pure: no IO, no storage, no domain calls.

pub mod authorize;
pub mod permissions;

pub use authorize::{AuthzError, authorize, can_perform};
pub use permissions::{Action, ModuleId, Permission};
