//! Managed handle to the document store.
//!
//! # Responsibility
//! - Remember where the store lives and how long operations may wait.
//! - Hand out one scoped session (`Connection`) per operation.
//!
//! # Invariants
//! - Migrations are applied once at `Store` open, before any session exists.
//! - A session is released by drop on every exit path of its operation.
//! - In-memory stores keep one anchor connection alive so sessions share data.
//! - In-memory sessions lock like file sessions, so contention waits up to
//!   the busy timeout instead of failing with a table lock.

use super::open::{open_db, open_db_memdb, DEFAULT_BUSY_TIMEOUT};
use super::DbResult;
use crate::config::StoreConfig;
use log::debug;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone)]
enum StoreTarget {
    File(PathBuf),
    Memdb(String),
}

/// Entry point for per-operation store sessions; shareable across threads.
pub struct Store {
    target: StoreTarget,
    busy_timeout: Duration,
    _anchor: Option<Mutex<Connection>>,
}

impl Store {
    /// Opens the store described by `config`.
    ///
    /// A missing `db_path` selects a private in-memory store.
    pub fn open(config: &StoreConfig) -> DbResult<Self> {
        match config.db_path.as_deref() {
            Some(path) => Self::open_file(path, config.busy_timeout),
            None => Self::open_memory_with_timeout(config.busy_timeout),
        }
    }

    /// Opens (creating when missing) a file-backed store.
    pub fn open_file(path: impl AsRef<Path>, busy_timeout: Duration) -> DbResult<Self> {
        let path = path.as_ref().to_path_buf();
        // Bootstrap once so later sessions skip the migration write.
        drop(open_db(&path, busy_timeout)?);
        Ok(Self {
            target: StoreTarget::File(path),
            busy_timeout,
            _anchor: None,
        })
    }

    /// Opens a private in-memory store that lives as long as this handle.
    pub fn open_in_memory() -> DbResult<Self> {
        Self::open_memory_with_timeout(DEFAULT_BUSY_TIMEOUT)
    }

    fn open_memory_with_timeout(busy_timeout: Duration) -> DbResult<Self> {
        // The leading `/` makes the memdb database visible to every
        // connection in this process that opens the same name.
        let uri = format!("file:/classbook-{}?vfs=memdb", Uuid::new_v4().simple());
        let anchor = open_db_memdb(&uri, busy_timeout)?;
        Ok(Self {
            target: StoreTarget::Memdb(uri),
            busy_timeout,
            _anchor: Some(Mutex::new(anchor)),
        })
    }

    /// Acquires a fresh session for one operation.
    ///
    /// Dropping the returned connection releases it.
    pub fn session(&self) -> DbResult<Connection> {
        debug!("event=session_open module=db status=start");
        match &self.target {
            StoreTarget::File(path) => open_db(path, self.busy_timeout),
            StoreTarget::Memdb(uri) => open_db_memdb(uri, self.busy_timeout),
        }
    }

    /// Returns the busy timeout applied to every session.
    pub fn busy_timeout(&self) -> Duration {
        self.busy_timeout
    }

    /// Returns the backing file path, or `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        match &self.target {
            StoreTarget::File(path) => Some(path.as_path()),
            StoreTarget::Memdb(_) => None,
        }
    }
}
