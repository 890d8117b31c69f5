#![allow(dead_code)]

use jobdesc_core::{
    container_spec, Document, DocumentContainer, DocumentDatabase, DocumentQuery,
    JobDescriptionRepository, QueryScope, SqliteContainer, SqliteDocumentDatabase, StoreError,
    StoreResult,
};
use serde_json::{json, Value};
use uuid::Uuid;

pub const SAMPLE_ID: &str = "123e4567-e89b-12d3-a456-426614174000";
pub const INJECTED_FAILURE: &str = "injected failure";

pub fn fresh_repo() -> (
    SqliteDocumentDatabase,
    JobDescriptionRepository<SqliteContainer>,
) {
    let db = SqliteDocumentDatabase::open_in_memory().unwrap();
    let repo = JobDescriptionRepository::new(&db).unwrap();
    (db, repo)
}

pub fn random_user() -> String {
    Uuid::new_v4().to_string()
}

/// Payload shaped like an API model dump: every field present, optionals null.
pub fn sample_payload(user_id: &str) -> Value {
    json!({
        "id": SAMPLE_ID,
        "user_id": user_id,
        "title": "Software Engineer",
        "company": "Test Company",
        "location": null,
        "description": "Test job description",
        "requirements": ["Python", "Azure"],
        "skills": [],
        "experience_level": null,
        "salary_range": null,
        "employment_type": null,
        "created_at": "2024-01-01T00:00:00",
        "updated_at": "2024-01-01T00:00:00",
        "is_active": true,
        "metadata": null
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    Query,
    Upsert,
    Delete,
    Everything,
}

/// Delegates to a real container but fails the chosen operation.
pub struct FailingContainer {
    inner: SqliteContainer,
    fail_on: FailOn,
    calls: std::cell::Cell<usize>,
}

impl FailingContainer {
    pub fn new(inner: SqliteContainer, fail_on: FailOn) -> Self {
        Self {
            inner,
            fail_on,
            calls: std::cell::Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    fn check(&self, op: FailOn) -> StoreResult<()> {
        self.calls.set(self.calls.get() + 1);
        if self.fail_on == op || self.fail_on == FailOn::Everything {
            return Err(injected_error());
        }
        Ok(())
    }
}

impl DocumentContainer for FailingContainer {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn query_items(&self, query: &DocumentQuery, scope: &QueryScope) -> StoreResult<Vec<Document>> {
        self.check(FailOn::Query)?;
        self.inner.query_items(query, scope)
    }

    fn upsert_item(&self, document: Document) -> StoreResult<Document> {
        self.check(FailOn::Upsert)?;
        self.inner.upsert_item(document)
    }

    fn delete_item(&self, id: &str, partition_key: &str) -> StoreResult<()> {
        self.check(FailOn::Delete)?;
        self.inner.delete_item(id, partition_key)
    }

    fn read_all_items(&self) -> StoreResult<Vec<Document>> {
        self.check(FailOn::Query)?;
        self.inner.read_all_items()
    }
}

pub fn failing_repo(
    db: &SqliteDocumentDatabase,
    fail_on: FailOn,
) -> JobDescriptionRepository<FailingContainer> {
    let inner = db.create_container_if_not_exists(&container_spec()).unwrap();
    JobDescriptionRepository::from_container(FailingContainer::new(inner, fail_on))
}

pub fn injected_error() -> StoreError {
    StoreError::Sqlite(rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_IOERR),
        Some(INJECTED_FAILURE.to_string()),
    ))
}

pub fn is_injected(err: &StoreError) -> bool {
    matches!(
        err,
        StoreError::Sqlite(rusqlite::Error::SqliteFailure(_, Some(message)))
            if message == INJECTED_FAILURE
    )
}
