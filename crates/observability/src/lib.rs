//! Process-wide tracing setup for binaries embedding the engine.
//!
//! Domain crates only emit `tracing` events; installing a subscriber is left
//! to the process, through [`init`] or [`init_with`].

pub mod tracing;

pub use crate::tracing::{LogFormat, LogSettings, init, init_with};
