//! SQLite-backed document store.
//!
//! # Responsibility
//! - Emulate a partitioned document container on top of the `documents`
//!   table created by `db` migrations.
//! - Turn declared unique keys into partial expression UNIQUE indexes.
//!
//! # Invariants
//! - `(container, partition_key, id)` addresses one document.
//! - `id` is unique per container across partitions.
//! - Every stored body carries the storage timestamp `_ts`.
//! - All caller-provided values reach SQL as bound parameters.

use super::path::{json_path, segments, validate_container_id};
use super::{
    ContainerSpec, Document, DocumentContainer, DocumentDatabase, DocumentQuery, QueryScope,
    StoreError, StoreResult, UniqueKey,
};
use crate::db::{open_db, open_db_in_memory};
use log::{debug, info};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, TransactionBehavior};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

/// Storage-managed property holding the last write time in unix seconds.
pub const TIMESTAMP_PROPERTY: &str = "_ts";

/// Database handle shared by every container it provisions.
#[derive(Clone)]
pub struct SqliteDocumentDatabase {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDocumentDatabase {
    /// Opens (or creates) a file-backed database through [`open_db`].
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::wrap(open_db(path)?))
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::wrap(open_db_in_memory()?))
    }

    /// Only takes connections already bootstrapped by `db::open`.
    fn wrap(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }
}

impl DocumentDatabase for SqliteDocumentDatabase {
    type Container = SqliteContainer;

    fn create_container_if_not_exists(&self, spec: &ContainerSpec) -> StoreResult<SqliteContainer> {
        validate_container_id(&spec.id)?;
        json_path(&spec.partition_key_path)?;
        let index_columns = spec
            .unique_keys
            .iter()
            .map(unique_index_columns)
            .collect::<StoreResult<Vec<_>>>()?;
        let unique_keys_json = serde_json::to_string(&spec.unique_keys)?;

        let mut conn = lock(&self.conn)?;
        // Take the write lock up front so concurrent provisioners wait on busy_timeout.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let existing = tx
            .query_row(
                "SELECT partition_key_path, unique_keys FROM containers WHERE id = ?1;",
                [spec.id.as_str()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        let created = match existing {
            Some((partition_key_path, stored_unique_keys)) => {
                let stored: Vec<UniqueKey> = serde_json::from_str(&stored_unique_keys)?;
                if partition_key_path != spec.partition_key_path || stored != spec.unique_keys {
                    return Err(StoreError::ContainerDefinitionMismatch {
                        container: spec.id.clone(),
                    });
                }
                false
            }
            None => {
                tx.execute(
                    "INSERT INTO containers (id, partition_key_path, unique_keys)
                     VALUES (?1, ?2, ?3);",
                    params![spec.id, spec.partition_key_path, unique_keys_json],
                )?;
                for (index, columns) in index_columns.iter().enumerate() {
                    // Identifiers were validated above; DDL cannot bind parameters.
                    tx.execute_batch(&format!(
                        "CREATE UNIQUE INDEX IF NOT EXISTS ux_{id}_{index}
                         ON documents (partition_key, {columns})
                         WHERE container = '{id}';",
                        id = spec.id,
                    ))?;
                }
                true
            }
        };
        tx.commit()?;

        info!(
            "event=container_provision module=store status=ok container={} created={} unique_keys={}",
            spec.id,
            created,
            spec.unique_keys.len()
        );

        Ok(SqliteContainer {
            conn: Arc::clone(&self.conn),
            id: spec.id.clone(),
            partition_key_path: spec.partition_key_path.clone(),
        })
    }
}

/// One provisioned container. Cheap to clone; clones share the connection.
#[derive(Clone)]
pub struct SqliteContainer {
    conn: Arc<Mutex<Connection>>,
    id: String,
    partition_key_path: String,
}

impl SqliteContainer {
    fn partition_key_of(&self, document: &Document) -> StoreResult<String> {
        let mut current: Option<&Value> = None;
        for segment in segments(&self.partition_key_path) {
            current = match current {
                None => document.get(segment),
                Some(value) => value.get(segment),
            };
        }
        current
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| StoreError::MissingPartitionKey {
                path: self.partition_key_path.clone(),
            })
    }

    fn select_bodies(&self, sql: &str, binds: Vec<SqlValue>) -> StoreResult<Vec<Document>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            let body: String = row.get(0)?;
            documents.push(serde_json::from_str(&body)?);
        }
        Ok(documents)
    }
}

impl DocumentContainer for SqliteContainer {
    fn id(&self) -> &str {
        &self.id
    }

    fn query_items(&self, query: &DocumentQuery, scope: &QueryScope) -> StoreResult<Vec<Document>> {
        let started_at = Instant::now();
        let mut sql = String::from("SELECT body FROM documents WHERE container = ?");
        let mut binds = vec![SqlValue::Text(self.id.clone())];

        if let QueryScope::Partition(partition_key) = scope {
            sql.push_str(" AND partition_key = ?");
            binds.push(SqlValue::Text(partition_key.clone()));
        }

        for filter in query.filters() {
            let path = json_path(filter.path())?;
            match filter.value() {
                Value::Null => {
                    sql.push_str(" AND json_type(body, ?) = 'null'");
                    binds.push(SqlValue::Text(path));
                }
                Value::Bool(flag) => {
                    // json_type reports booleans as the text 'true' / 'false'.
                    sql.push_str(" AND json_type(body, ?) = ?");
                    binds.push(SqlValue::Text(path));
                    binds.push(SqlValue::Text(flag.to_string()));
                }
                Value::String(text) => {
                    sql.push_str(" AND json_type(body, ?) = 'text' AND json_extract(body, ?) = ?");
                    binds.push(SqlValue::Text(path.clone()));
                    binds.push(SqlValue::Text(path));
                    binds.push(SqlValue::Text(text.clone()));
                }
                Value::Number(number) => {
                    sql.push_str(
                        " AND json_type(body, ?) IN ('integer', 'real') AND json_extract(body, ?) = ?",
                    );
                    binds.push(SqlValue::Text(path.clone()));
                    binds.push(SqlValue::Text(path));
                    binds.push(match number.as_i64() {
                        Some(integer) => SqlValue::Integer(integer),
                        None => SqlValue::Real(number.as_f64().unwrap_or(f64::NAN)),
                    });
                }
                Value::Array(_) | Value::Object(_) => {
                    return Err(StoreError::UnsupportedFilterValue {
                        path: filter.path().to_string(),
                    });
                }
            }
        }
        sql.push_str(" ORDER BY seq;");

        let documents = self.select_bodies(&sql, binds)?;
        debug!(
            "event=query_items module=store status=ok container={} cross_partition={} query=\"{}\" count={} duration_ms={}",
            self.id,
            matches!(scope, QueryScope::CrossPartition),
            query,
            documents.len(),
            started_at.elapsed().as_millis()
        );
        Ok(documents)
    }

    fn upsert_item(&self, mut document: Document) -> StoreResult<Document> {
        let id = document
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(StoreError::MissingId)?;
        let partition_key = self.partition_key_of(&document)?;

        let ts = chrono::Utc::now().timestamp();
        document.insert(TIMESTAMP_PROPERTY.to_string(), Value::from(ts));
        let body = serde_json::to_string(&document)?;

        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT INTO documents (container, partition_key, id, body, ts)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (container, partition_key, id)
             DO UPDATE SET body = excluded.body, ts = excluded.ts;",
            params![self.id, partition_key, id, body, ts],
        )?;

        debug!(
            "event=upsert_item module=store status=ok container={} id={}",
            self.id, id
        );
        Ok(document)
    }

    fn delete_item(&self, id: &str, partition_key: &str) -> StoreResult<()> {
        let conn = lock(&self.conn)?;
        let changed = conn.execute(
            "DELETE FROM documents WHERE container = ?1 AND partition_key = ?2 AND id = ?3;",
            params![self.id, partition_key, id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                id: id.to_string(),
                partition_key: partition_key.to_string(),
            });
        }

        debug!(
            "event=delete_item module=store status=ok container={} id={}",
            self.id, id
        );
        Ok(())
    }

    fn read_all_items(&self) -> StoreResult<Vec<Document>> {
        self.select_bodies(
            "SELECT body FROM documents WHERE container = ?1 ORDER BY seq;",
            vec![SqlValue::Text(self.id.clone())],
        )
    }
}

fn lock(conn: &Mutex<Connection>) -> StoreResult<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|_| StoreError::LockPoisoned)
}

fn unique_index_columns(key: &UniqueKey) -> StoreResult<String> {
    let columns = key
        .paths
        .iter()
        .map(|path| json_path(path).map(|json| format!("json_extract(body, '{json}')")))
        .collect::<StoreResult<Vec<_>>>()?;
    if columns.is_empty() {
        return Err(StoreError::InvalidPath(String::new()));
    }
    Ok(columns.join(", "))
}

#[cfg(test)]
mod tests {
    use super::SqliteDocumentDatabase;

    fn pragma(db: &SqliteDocumentDatabase, name: &str) -> i64 {
        let conn = db.conn.lock().unwrap();
        conn.pragma_query_value(None, name, |row| row.get(0)).unwrap()
    }

    #[test]
    fn handles_carry_the_db_bootstrap() {
        let memory = SqliteDocumentDatabase::open_in_memory().unwrap();
        assert_eq!(pragma(&memory, "foreign_keys"), 1);

        let dir = tempfile::tempdir().unwrap();
        let file = SqliteDocumentDatabase::open(dir.path().join("docs.db")).unwrap();
        assert_eq!(pragma(&file, "foreign_keys"), 1);
        assert_eq!(pragma(&file, "busy_timeout"), 5000);
    }

    #[test]
    fn documents_require_a_provisioned_container() {
        let db = SqliteDocumentDatabase::open_in_memory().unwrap();
        let conn = db.conn.lock().unwrap();
        let err = conn
            .execute(
                "INSERT INTO documents (container, partition_key, id, body, ts)
                 VALUES ('ghost', 'p', 'd1', '{}', 0);",
                [],
            )
            .unwrap_err();
        assert!(err.to_string().contains("FOREIGN KEY"));
    }
}
