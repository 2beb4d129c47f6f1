//! `dice` query: builds a transient die for the requested side count.
//!
//! # Invariants
//! - Never touches the store.

use super::ResolverResult;
use crate::dice::{RandomDie, DEFAULT_NUM_SIDES};

/// Builds a die for the `dice` query; `num_sides` defaults to six.
pub fn dice(num_sides: Option<i64>) -> ResolverResult<RandomDie> {
    Ok(RandomDie::new(num_sides.unwrap_or(DEFAULT_NUM_SIDES))?)
}
