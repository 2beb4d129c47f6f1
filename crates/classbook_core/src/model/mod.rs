//! Domain model for jobs, features and their cross-references.
//!
//! # Responsibility
//! - Define the document bodies persisted per collection.
//! - Define the API-facing records built from those documents.
//! - Define the typed inputs accepted by mutations.
//!
//! # Invariants
//! - Persisted documents reference other documents by `DocumentKey` only.
//! - API records reference other records by `Identifier` only.
//! - Every persisted document carries a `name`, unique within its collection.

use serde::de::DeserializeOwned;
use serde::Serialize;

pub mod feature;
pub mod job;

/// Named document collection inside the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Jobs,
    Features,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jobs => "jobs",
            Self::Features => "features",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document body stored in one collection and deduplicated by `name`.
pub trait NamedDocument: Serialize + DeserializeOwned {
    const COLLECTION: Collection;

    fn name(&self) -> &str;
}
