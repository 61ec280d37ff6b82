//! Value object trait: equality by value, not identity.
//!
//! `Money` and `Percent` are value objects: two instances with the same
//! fields are interchangeable, and "changing" one means building a new one.

/// Marker trait for value objects.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
