//! Operation-level error taxonomy.
//!
//! # Invariants
//! - Every lower-layer error converts into exactly one `ResolverError`.
//! - Store failures always reject the operation; none are swallowed.

use crate::codec::IdentifierError;
use crate::db::DbError;
use crate::dice::DiceError;
use crate::repo::document_repo::RepoError;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ResolverResult<T> = Result<T, ResolverError>;

/// Stable, caller-visible error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    MalformedIdentifier,
    StoreUnavailable,
    EmptyReduction,
    DuplicateName,
    InvalidData,
    /// Permanent store failure: schema mismatch, constraint or SQL error.
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::NotFound => "NOT_FOUND",
            Self::MalformedIdentifier => "MALFORMED_IDENTIFIER",
            Self::StoreUnavailable => "STORE_UNAVAILABLE",
            Self::EmptyReduction => "EMPTY_REDUCTION",
            Self::DuplicateName => "DUPLICATE_NAME",
            Self::InvalidData => "INVALID_DATA",
            Self::Internal => "INTERNAL",
        }
    }

    /// Whether repeating the same operation later may succeed.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::StoreUnavailable)
    }
}

#[derive(Debug)]
pub enum ResolverError {
    InvalidArgument(String),
    NotFound(String),
    MalformedIdentifier(IdentifierError),
    /// Store could not be reached or timed out waiting on a lock.
    StoreUnavailable(String),
    EmptyReduction,
    DuplicateName(String),
    /// A persisted document could not be decoded.
    InvalidData(String),
    Internal(String),
}

impl ResolverError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::MalformedIdentifier(_) => ErrorKind::MalformedIdentifier,
            Self::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            Self::EmptyReduction => ErrorKind::EmptyReduction,
            Self::DuplicateName(_) => ErrorKind::DuplicateName,
            Self::InvalidData(_) => ErrorKind::InvalidData,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl Display for ResolverError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::NotFound(message) => write!(f, "{message}"),
            Self::MalformedIdentifier(err) => write!(f, "{err}"),
            Self::StoreUnavailable(message) => write!(f, "store unavailable: {message}"),
            Self::EmptyReduction => write!(f, "cannot sum an empty roll"),
            Self::DuplicateName(message) => write!(f, "{message}"),
            Self::InvalidData(message) => write!(f, "{message}"),
            Self::Internal(message) => write!(f, "internal store error: {message}"),
        }
    }
}

impl Error for ResolverError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MalformedIdentifier(err) => Some(err),
            _ => None,
        }
    }
}

impl From<IdentifierError> for ResolverError {
    fn from(value: IdentifierError) -> Self {
        Self::MalformedIdentifier(value)
    }
}

impl From<DiceError> for ResolverError {
    fn from(value: DiceError) -> Self {
        match value {
            DiceError::InvalidArgument(message) => Self::InvalidArgument(message),
            DiceError::EmptyReduction => Self::EmptyReduction,
        }
    }
}

impl From<DbError> for ResolverError {
    fn from(value: DbError) -> Self {
        if value.is_transient() {
            Self::StoreUnavailable(value.to_string())
        } else {
            Self::Internal(value.to_string())
        }
    }
}

impl From<RepoError> for ResolverError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Db(err) => err.into(),
            err @ RepoError::NotFound { .. } => Self::NotFound(err.to_string()),
            err @ RepoError::DuplicateName { .. } => Self::DuplicateName(err.to_string()),
            err @ RepoError::Contended { .. } => Self::StoreUnavailable(err.to_string()),
            RepoError::InvalidData(message) => Self::InvalidData(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::ffi;

    fn sqlite_failure(code: i32) -> DbError {
        DbError::Sqlite(rusqlite::Error::SqliteFailure(ffi::Error::new(code), None))
    }

    #[test]
    fn busy_and_locked_stores_are_retryable() {
        for code in [ffi::SQLITE_BUSY, ffi::SQLITE_LOCKED, ffi::SQLITE_CANTOPEN] {
            let err = ResolverError::from(sqlite_failure(code));
            assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
            assert!(err.kind().is_retryable());
        }
    }

    #[test]
    fn permanent_store_failures_are_internal() {
        let schema = ResolverError::from(DbError::UnsupportedSchemaVersion {
            db_version: 9,
            latest_supported: 1,
        });
        let constraint = ResolverError::from(sqlite_failure(ffi::SQLITE_CONSTRAINT_CHECK));
        let repo = ResolverError::from(RepoError::Db(sqlite_failure(ffi::SQLITE_ERROR)));

        for err in [schema, constraint, repo] {
            assert_eq!(err.kind(), ErrorKind::Internal);
            assert!(!err.kind().is_retryable());
        }
    }

    #[test]
    fn kind_serializes_in_screaming_case() {
        let value = serde_json::to_value(ErrorKind::Internal).unwrap();
        assert_eq!(value, serde_json::json!("INTERNAL"));
    }
}
