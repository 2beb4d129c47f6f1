//! Core domain logic for classbook.
//! Jobs, features and dice behind a typed operation API, persisted in a
//! SQLite-backed document store.

pub mod api;
pub mod codec;
pub mod config;
pub mod db;
pub mod dice;
pub mod logging;
pub mod model;
pub mod repo;
pub mod resolver;

pub use api::{execute, execute_json, Operation, Request, Response};
pub use codec::{decode, encode, DocumentKey, Identifier, IdentifierError};
pub use config::{AppConfig, ConfigError, LogConfig, StoreConfig};
pub use db::Store;
pub use dice::{DiceError, RandomDie};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::feature::{Feature, FeatureInput};
pub use model::job::{FeatureRef, Job, JobInput};
pub use repo::document_repo::{
    Document, DocumentRepository, RepoError, RepoResult, SqliteDocumentRepository, UpsertOutcome,
    Upserted,
};
pub use resolver::{
    dice as dice_query, ErrorKind, FeatureResolver, JobLookup, JobResolver, JobsQuery,
    ResolverError, ResolverResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
