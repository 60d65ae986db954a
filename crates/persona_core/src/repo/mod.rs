//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repositories never open transactions; transaction scope belongs to the
//!   caller that supplies the connection.

pub mod person_repo;
