//! Domain model for person records.
//!
//! # Responsibility
//! - Define the plain value types moved between storage and callers.
//!
//! # Invariants
//! - A person's identity is its storage-assigned row id, nothing else.

pub mod person;
