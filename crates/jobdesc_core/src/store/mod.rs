//! Document-store contracts and the embedded SQLite implementation.
//!
//! # Responsibility
//! - Define the storage seam the repository talks to: idempotent container
//!   provisioning, parameterized queries, point upsert/delete, full scans.
//! - Keep SQL and JSON-path details out of repository code.
//!
//! # Invariants
//! - Documents are flat JSON objects carrying a string `id`.
//! - A document's partition key is read from the document itself at the
//!   container's partition key path and never changes for a stored `id`.
//! - Declared unique keys are enforced by storage, per partition.
//! - Storage errors are returned as-is; nothing here retries.

use crate::db::DbError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

mod path;
mod query;
mod sqlite;

pub use path::{json_path, validate_container_id};
pub use query::{DocumentQuery, Filter, QueryScope};
pub use sqlite::{SqliteContainer, SqliteDocumentDatabase, TIMESTAMP_PROPERTY};

/// One stored document: a flat JSON object.
pub type Document = serde_json::Map<String, serde_json::Value>;

pub type StoreResult<T> = Result<T, StoreError>;

/// Set of document paths that must be jointly unique within a partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueKey {
    pub paths: Vec<String>,
}

/// Container provisioning request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub id: String,
    /// Path in `/field` form, e.g. `/user_id`.
    pub partition_key_path: String,
    pub unique_keys: Vec<UniqueKey>,
}

impl ContainerSpec {
    pub fn new(id: impl Into<String>, partition_key_path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            partition_key_path: partition_key_path.into(),
            unique_keys: Vec::new(),
        }
    }

    /// Declares one more unique key over the given paths.
    pub fn with_unique_key(mut self, paths: &[&str]) -> Self {
        self.unique_keys.push(UniqueKey {
            paths: paths.iter().map(|path| (*path).to_string()).collect(),
        });
        self
    }
}

/// Handle able to provision containers.
pub trait DocumentDatabase {
    type Container: DocumentContainer;

    /// Returns the container, creating it (and its unique keys) on first use.
    ///
    /// # Errors
    /// - `ContainerDefinitionMismatch` when the container already exists with a
    ///   different partition key or unique keys.
    fn create_container_if_not_exists(&self, spec: &ContainerSpec)
        -> StoreResult<Self::Container>;
}

/// One provisioned container of documents.
pub trait DocumentContainer {
    fn id(&self) -> &str;

    /// Returns documents matching every filter of `query`, in storage order.
    fn query_items(&self, query: &DocumentQuery, scope: &QueryScope)
        -> StoreResult<Vec<Document>>;

    /// Creates or replaces the document with the same `id` in its partition.
    ///
    /// Returns the document as stored, including storage-managed properties.
    fn upsert_item(&self, document: Document) -> StoreResult<Document>;

    /// Deletes one document.
    ///
    /// # Errors
    /// - `NotFound` when no document has this `id` in this partition.
    fn delete_item(&self, id: &str, partition_key: &str) -> StoreResult<()>;

    /// Returns every document of the container, across all partitions.
    fn read_all_items(&self) -> StoreResult<Vec<Document>>;
}

/// Storage-layer failure.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Sqlite(rusqlite::Error),
    Json(serde_json::Error),
    InvalidContainerId(String),
    InvalidPath(String),
    ContainerDefinitionMismatch { container: String },
    MissingId,
    MissingPartitionKey { path: String },
    UnsupportedFilterValue { path: String },
    NotFound { id: String, partition_key: String },
    LockPoisoned,
}

impl StoreError {
    /// Whether a uniqueness constraint (unique key or `id`) rejected a write.
    pub fn is_conflict(&self) -> bool {
        let sqlite_err = match self {
            Self::Sqlite(err) | Self::Db(DbError::Sqlite(err)) => err,
            _ => return false,
        };
        matches!(
            sqlite_err,
            rusqlite::Error::SqliteFailure(failure, _)
                if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "invalid document json: {err}"),
            Self::InvalidContainerId(id) => write!(f, "invalid container id `{id}`"),
            Self::InvalidPath(path) => write!(f, "invalid document path `{path}`"),
            Self::ContainerDefinitionMismatch { container } => write!(
                f,
                "container `{container}` already exists with a different definition"
            ),
            Self::MissingId => write!(f, "document has no string `id`"),
            Self::MissingPartitionKey { path } => {
                write!(f, "document has no string partition key at `{path}`")
            }
            Self::UnsupportedFilterValue { path } => {
                write!(f, "filter on `{path}` must compare against a scalar value")
            }
            Self::NotFound { id, partition_key } => write!(
                f,
                "document `{id}` not found in partition `{partition_key}`"
            ),
            Self::LockPoisoned => write!(f, "document store connection lock is poisoned"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Sqlite(err) => Some(err),
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
