//! Generic document repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide lookup, upsert-by-name and edit APIs for one
//!   collection of the `documents` table.
//! - Keep SQL and JSON encoding details inside the persistence boundary.
//!
//! # Invariants
//! - At most one document per `(collection, name)`; enforced by a unique
//!   index and resolved by the store in a single statement on upsert.
//! - Upsert payloads merge field-by-field: fields absent from the payload
//!   keep their stored value.
//! - Read paths reject undecodable persisted documents instead of skipping.
//! - Callers pass native keys; identifier decoding happens above this layer.

use crate::codec::DocumentKey;
use crate::db::{is_unique_violation, DbError};
use crate::model::{Collection, NamedDocument};
use log::{debug, info, warn};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;
use std::time::Instant;
use uuid::Uuid;

const DOCUMENT_SELECT_SQL: &str = "SELECT id, value FROM documents";
const MAX_EDIT_ATTEMPTS: usize = 5;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for document persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound {
        collection: Collection,
        key: DocumentKey,
    },
    DuplicateName {
        collection: Collection,
        name: String,
    },
    /// Concurrent writers kept changing the document during an edit.
    Contended {
        collection: Collection,
        key: DocumentKey,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { collection, key } => {
                write!(f, "no document {key} in collection `{collection}`")
            }
            Self::DuplicateName { collection, name } => write!(
                f,
                "collection `{collection}` already has a document named `{name}`"
            ),
            Self::Contended { collection, key } => write!(
                f,
                "document {key} in collection `{collection}` changed concurrently; retry"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted document: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// A stored document together with its native key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document<T> {
    pub key: DocumentKey,
    pub value: T,
}

/// Which branch an upsert took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

impl UpsertOutcome {
    fn as_str(self) -> &'static str {
        match self {
            Self::Inserted => "inserted",
            Self::Updated => "updated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upserted<T> {
    pub document: Document<T>,
    pub outcome: UpsertOutcome,
}

/// Repository interface for one document collection.
pub trait DocumentRepository<T: NamedDocument> {
    /// Returns every document in insertion order.
    fn find_all(&self) -> RepoResult<Vec<Document<T>>>;

    /// Returns one document or `RepoError::NotFound`.
    fn find_by_id(&self, key: DocumentKey) -> RepoResult<Document<T>>;

    /// Returns the documents that exist among `keys`; missing keys are
    /// omitted without error.
    fn find_by_ids(&self, keys: &BTreeSet<DocumentKey>) -> RepoResult<Vec<Document<T>>>;

    /// Returns documents whose top-level `field` holds any of `keys`, in one
    /// query.
    fn find_referencing(
        &self,
        field: &str,
        keys: &BTreeSet<DocumentKey>,
    ) -> RepoResult<Vec<Document<T>>>;

    /// Inserts a document named `name`, or merges `patch` into the existing
    /// one, atomically.
    ///
    /// `patch` must serialize to a JSON object. Its `null` members are
    /// dropped, so they keep stored values rather than clearing them.
    fn upsert_by_name<P: Serialize + ?Sized>(
        &self,
        name: &str,
        patch: &P,
    ) -> RepoResult<Upserted<T>>;

    /// Applies `edit` to the stored value and writes it back if nothing else
    /// changed the document in between; retries a bounded number of times.
    fn edit_by_id<F>(&self, key: DocumentKey, edit: F) -> RepoResult<Document<T>>
    where
        F: FnMut(&mut T);
}

/// SQLite-backed document repository for collection `T::COLLECTION`.
pub struct SqliteDocumentRepository<'conn, T> {
    conn: &'conn Connection,
    _document: PhantomData<fn() -> T>,
}

impl<'conn, T: NamedDocument> SqliteDocumentRepository<'conn, T> {
    /// Binds a repository to a migrated session.
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            _document: PhantomData,
        }
    }

    fn collection(&self) -> Collection {
        T::COLLECTION
    }

    fn query_documents(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<Document<T>>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            documents.push(parse_document_row(row, self.collection())?);
        }
        Ok(documents)
    }

    fn find_raw(&self, key: DocumentKey) -> RepoResult<String> {
        self.conn
            .query_row(
                "SELECT value FROM documents WHERE collection = ?1 AND id = ?2;",
                params![self.collection().as_str(), key_to_db(key)],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .ok_or(RepoError::NotFound {
                collection: self.collection(),
                key,
            })
    }

    fn map_write_error(&self, err: rusqlite::Error, name: &str) -> RepoError {
        if is_unique_violation(&err) {
            RepoError::DuplicateName {
                collection: self.collection(),
                name: name.to_string(),
            }
        } else {
            err.into()
        }
    }
}

impl<T: NamedDocument> DocumentRepository<T> for SqliteDocumentRepository<'_, T> {
    fn find_all(&self) -> RepoResult<Vec<Document<T>>> {
        self.query_documents(
            &format!("{DOCUMENT_SELECT_SQL} WHERE collection = ?1 ORDER BY rowid ASC;"),
            vec![Value::Text(self.collection().as_str().to_string())],
        )
    }

    fn find_by_id(&self, key: DocumentKey) -> RepoResult<Document<T>> {
        let raw = self.find_raw(key)?;
        Ok(Document {
            key,
            value: parse_value(&raw, self.collection())?,
        })
    }

    fn find_by_ids(&self, keys: &BTreeSet<DocumentKey>) -> RepoResult<Vec<Document<T>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; keys.len()].join(", ");
        let mut bind_values = Vec::with_capacity(keys.len() + 1);
        bind_values.push(Value::Text(self.collection().as_str().to_string()));
        bind_values.extend(keys.iter().map(|key| Value::Text(key_to_db(*key))));

        self.query_documents(
            &format!(
                "{DOCUMENT_SELECT_SQL}
                 WHERE collection = ?
                   AND id IN ({placeholders})
                 ORDER BY rowid ASC;"
            ),
            bind_values,
        )
    }

    fn find_referencing(
        &self,
        field: &str,
        keys: &BTreeSet<DocumentKey>,
    ) -> RepoResult<Vec<Document<T>>> {
        if field.is_empty() || !field.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
            return Err(RepoError::InvalidData(format!(
                "unsupported reference field `{field}`"
            )));
        }
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; keys.len()].join(", ");
        let mut bind_values = Vec::with_capacity(keys.len() + 2);
        bind_values.push(Value::Text(self.collection().as_str().to_string()));
        bind_values.push(Value::Text(format!("$.{field}")));
        bind_values.extend(keys.iter().map(|key| Value::Text(key_to_db(*key))));

        self.query_documents(
            &format!(
                "{DOCUMENT_SELECT_SQL}
                 WHERE collection = ?
                   AND json_extract(value, ?) IN ({placeholders})
                 ORDER BY rowid ASC;"
            ),
            bind_values,
        )
    }

    fn upsert_by_name<P: Serialize + ?Sized>(
        &self,
        name: &str,
        patch: &P,
    ) -> RepoResult<Upserted<T>> {
        let started_at = Instant::now();
        let payload = build_payload(name, patch)?;
        let candidate = DocumentKey::generate();

        // One statement: the unique index turns a lost insert race into the
        // update branch instead of a second row.
        let (id_text, raw_value) = self.conn.query_row(
            "INSERT INTO documents (collection, id, name, value)
             VALUES (?1, ?2, ?3, json(?4))
             ON CONFLICT (collection, name) DO UPDATE SET
                value = json_patch(documents.value, excluded.value),
                updated_at = (strftime('%s', 'now') * 1000)
             RETURNING id, value;",
            params![
                self.collection().as_str(),
                key_to_db(candidate),
                name,
                payload
            ],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        )?;

        let key = parse_key(&id_text)?;
        let outcome = if key == candidate {
            UpsertOutcome::Inserted
        } else {
            UpsertOutcome::Updated
        };
        let value = parse_value(&raw_value, self.collection())?;

        info!(
            "event=document_upsert module=repo status=ok collection={} outcome={} duration_ms={}",
            self.collection(),
            outcome.as_str(),
            started_at.elapsed().as_millis()
        );

        Ok(Upserted {
            document: Document { key, value },
            outcome,
        })
    }

    fn edit_by_id<F>(&self, key: DocumentKey, mut edit: F) -> RepoResult<Document<T>>
    where
        F: FnMut(&mut T),
    {
        for attempt in 1..=MAX_EDIT_ATTEMPTS {
            let previous_raw = self.find_raw(key)?;
            let mut value: T = parse_value(&previous_raw, self.collection())?;
            edit(&mut value);
            let payload = serde_json::to_string(&value)
                .map_err(|err| RepoError::InvalidData(format!("unencodable document: {err}")))?;

            // Compare-and-swap on the exact text read above.
            let changed = self
                .conn
                .execute(
                    "UPDATE documents
                     SET
                        name = ?3,
                        value = json(?4),
                        updated_at = (strftime('%s', 'now') * 1000)
                     WHERE collection = ?1
                       AND id = ?2
                       AND value = ?5;",
                    params![
                        self.collection().as_str(),
                        key_to_db(key),
                        value.name(),
                        payload,
                        previous_raw
                    ],
                )
                .map_err(|err| self.map_write_error(err, value.name()))?;

            if changed == 1 {
                debug!(
                    "event=document_edit module=repo status=ok collection={} attempt={}",
                    self.collection(),
                    attempt
                );
                return self.find_by_id(key);
            }
        }

        warn!(
            "event=document_edit module=repo status=error collection={} error_code=contended attempts={}",
            self.collection(),
            MAX_EDIT_ATTEMPTS
        );
        Err(RepoError::Contended {
            collection: self.collection(),
            key,
        })
    }
}

fn build_payload<P: Serialize + ?Sized>(name: &str, patch: &P) -> RepoResult<String> {
    let value = serde_json::to_value(patch)
        .map_err(|err| RepoError::InvalidData(format!("unencodable upsert payload: {err}")))?;
    let serde_json::Value::Object(mut fields) = value else {
        return Err(RepoError::InvalidData(
            "upsert payload must be a JSON object".to_string(),
        ));
    };

    fields.retain(|_, field| !field.is_null());
    fields.insert(
        "name".to_string(),
        serde_json::Value::String(name.to_string()),
    );

    serde_json::to_string(&fields)
        .map_err(|err| RepoError::InvalidData(format!("unencodable upsert payload: {err}")))
}

fn parse_document_row<T: NamedDocument>(
    row: &Row<'_>,
    collection: Collection,
) -> RepoResult<Document<T>> {
    let id_text: String = row.get("id")?;
    let raw_value: String = row.get("value")?;
    Ok(Document {
        key: parse_key(&id_text)?,
        value: parse_value(&raw_value, collection)?,
    })
}

fn parse_key(text: &str) -> RepoResult<DocumentKey> {
    Uuid::parse_str(text)
        .map(DocumentKey::from_uuid)
        .map_err(|_| RepoError::InvalidData(format!("invalid key `{text}` in documents.id")))
}

fn parse_value<T: NamedDocument>(raw: &str, collection: Collection) -> RepoResult<T> {
    serde_json::from_str(raw).map_err(|err| {
        RepoError::InvalidData(format!(
            "undecodable value in collection `{collection}`: {err}"
        ))
    })
}

fn key_to_db(key: DocumentKey) -> String {
    key.as_uuid().hyphenated().to_string()
}
