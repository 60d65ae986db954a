//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into transactional units of work.
//! - Keep console/UI layers decoupled from storage details.

pub mod session;
pub mod transaction;
