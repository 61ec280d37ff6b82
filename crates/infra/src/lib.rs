//! Infrastructure layer: storage, serialized execution, config.
//!
//! The domain crates are pure; this crate owns the process state around
//! them. Repositories hold entity versions, the executor serializes writes
//! per entity, and the engine fulfils the settlement events those writes
//! request.

pub mod config;
pub mod engine;
pub mod executor;
pub mod repository;


pub use config::{ConfigError, EngineConfig};
pub use engine::{Engine, InMemoryExecutor, Settlement};
pub use executor::{Executed, Linked, TransitionExecutor};
pub use repository::{InMemoryRepository, Repository, Stored};
