//! Resolver layer: one entry point per API operation.
//!
//! # Responsibility
//! - Decode and check typed inputs at the boundary.
//! - Orchestrate repository calls and shape results into API records.
//!
//! # Invariants
//! - Resolvers hold no state across calls.
//! - Each store-backed call acquires its own session and releases it on
//!   every exit path.
//! - Client identifiers are decoded before any store access.

pub mod dice_resolver;
pub mod error;
pub mod feature_resolver;
pub mod job_resolver;

pub use dice_resolver::dice;
pub use error::{ErrorKind, ResolverError, ResolverResult};
pub use feature_resolver::FeatureResolver;
pub use job_resolver::{JobLookup, JobResolver, JobsQuery};

fn required_name(name: Option<&str>) -> ResolverResult<String> {
    match name.map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => Ok(trimmed.to_string()),
        _ => Err(ResolverError::InvalidArgument(
            "input.name is required".to_string(),
        )),
    }
}
