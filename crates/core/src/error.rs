//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every failure the workflow engine can report is a recoverable value of this
/// type. Nothing here is fatal to the process: the worst outcome is a rejected
/// transition, and a rejected transition never alters the entity it was
/// attempted on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A monetary amount or quantity is out of range (negative where a
    /// non-negative value is required, zero where a positive one is, overflow).
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// A line item is malformed (negative cost, non-positive quantity, ...).
    #[error("invalid line item: {0}")]
    InvalidLineItem(String),

    /// A status key is not part of the entity kind's registry.
    #[error("unknown status '{status}' for {kind}")]
    UnknownStatus { kind: String, status: String },

    /// The requested transition is not an edge of the kind's graph.
    #[error("illegal {kind} transition from '{from}' to '{to}' (allowed: [{}])", .allowed.join(", "))]
    IllegalTransition {
        kind: String,
        from: String,
        to: String,
        allowed: Vec<String>,
    },

    /// The transition is in the graph but a precondition does not hold.
    #[error("{kind} guard failed: {condition}")]
    GuardFailed { kind: String, condition: String },

    /// A reference that must be unique (e.g. an NF-e access key) is reused.
    #[error("duplicate reference: {0}")]
    DuplicateReference(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested entity was not found.
    #[error("not found")]
    NotFound,

    /// A conflict occurred (e.g. stale version on save).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::InvalidAmount(msg.into())
    }

    pub fn invalid_line_item(msg: impl Into<String>) -> Self {
        Self::InvalidLineItem(msg.into())
    }

    pub fn unknown_status(kind: impl Into<String>, status: impl Into<String>) -> Self {
        Self::UnknownStatus {
            kind: kind.into(),
            status: status.into(),
        }
    }

    pub fn guard_failed(kind: impl Into<String>, condition: impl Into<String>) -> Self {
        Self::GuardFailed {
            kind: kind.into(),
            condition: condition.into(),
        }
    }

    pub fn duplicate_reference(reference: impl Into<String>) -> Self {
        Self::DuplicateReference(reference.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// Short machine-readable name of the error category.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::InvalidAmount(_) => "invalid_amount",
            DomainError::InvalidLineItem(_) => "invalid_line_item",
            DomainError::UnknownStatus { .. } => "unknown_status",
            DomainError::IllegalTransition { .. } => "illegal_transition",
            DomainError::GuardFailed { .. } => "guard_failed",
            DomainError::DuplicateReference(_) => "duplicate_reference",
            DomainError::InvalidId(_) => "invalid_id",
            DomainError::NotFound => "not_found",
            DomainError::Conflict(_) => "conflict",
        }
    }
}
