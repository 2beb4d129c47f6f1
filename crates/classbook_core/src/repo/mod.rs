//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define collection-oriented data access contracts.
//! - Isolate SQLite and JSON details from resolver orchestration.
//!
//! # Invariants
//! - The repository is the only write path into the document store.
//! - Repository APIs return semantic errors (`NotFound`, `DuplicateName`) in
//!   addition to store transport errors.

pub mod document_repo;
