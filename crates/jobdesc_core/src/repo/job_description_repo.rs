//! Job description repository.
//!
//! # Responsibility
//! - Provision the `job_descriptions` container (partitioned by owner, unique
//!   on `(user_id, title, company)`).
//! - Upsert by natural key, list per owner, and look up / delete by id with
//!   ownership checks.
//!
//! # Invariants
//! - An upsert that finds an existing natural key reuses that record's `id`.
//! - The natural-key lookup and the write are separate storage calls. Two
//!   racing creates for one new key are settled by the container's unique key;
//!   the loser's conflict error is returned untouched.
//! - A record found by id but owned by someone else yields `PermissionDenied`,
//!   never "absent".

use super::persisted::{encode_is_active, from_document, to_document};
use super::{RepoError, RepoResult};
use crate::model::job_description::{JobDescription, JobDescriptionId};
use crate::store::{ContainerSpec, DocumentContainer, DocumentDatabase, DocumentQuery, QueryScope};
use log::{info, warn};
use serde_json::Value;
use std::time::Instant;

pub const CONTAINER_ID: &str = "job_descriptions";
pub const PARTITION_KEY_PATH: &str = "/user_id";
pub const NATURAL_KEY_PATHS: [&str; 3] = ["/user_id", "/title", "/company"];

/// Provisioning request for the job descriptions container.
pub fn container_spec() -> ContainerSpec {
    ContainerSpec::new(CONTAINER_ID, PARTITION_KEY_PATH).with_unique_key(&NATURAL_KEY_PATHS)
}

/// Repository over one provisioned job descriptions container.
pub struct JobDescriptionRepository<C: DocumentContainer> {
    container: C,
}

impl<C: DocumentContainer> JobDescriptionRepository<C> {
    /// Provisions the container (idempotently) and binds the repository to it.
    pub fn new<D>(db: &D) -> RepoResult<Self>
    where
        D: DocumentDatabase<Container = C>,
    {
        let container = db.create_container_if_not_exists(&container_spec())?;
        Ok(Self { container })
    }

    /// Binds to a container the caller already provisioned with
    /// [`container_spec`].
    pub fn from_container(container: C) -> Self {
        Self { container }
    }

    pub fn container(&self) -> &C {
        &self.container
    }

    /// Creates the record for the payload's natural key, or overwrites the
    /// existing one in place keeping its `id`.
    ///
    /// # Errors
    /// - `Validation` before any storage call when the payload is malformed.
    /// - `Store` for lookup/write failures, including unique-key conflicts.
    pub fn upsert(&self, payload: &Value) -> RepoResult<JobDescription> {
        let started_at = Instant::now();
        let result = JobDescription::from_payload(payload)
            .map_err(RepoError::from)
            .and_then(|record| self.write_by_natural_key(record, started_at));
        log_failure("jd_upsert", started_at, result)
    }

    /// Typed form of [`JobDescriptionRepository::upsert`].
    pub fn upsert_record(&self, record: &JobDescription) -> RepoResult<JobDescription> {
        self.upsert(&record.to_payload())
    }

    /// Lists a user's records, optionally only active or only inactive ones.
    pub fn list(&self, user_id: &str, is_active: Option<bool>) -> RepoResult<Vec<JobDescription>> {
        let started_at = Instant::now();
        let mut query = DocumentQuery::all().where_eq("/user_id", user_id);
        if let Some(flag) = is_active {
            query = query.where_eq("/is_active", encode_is_active(flag));
        }

        let result: RepoResult<Vec<JobDescription>> = self
            .container
            .query_items(&query, &QueryScope::Partition(user_id.to_string()))
            .map_err(RepoError::from)
            .and_then(|documents| documents.into_iter().map(from_document).collect());

        if let Ok(records) = &result {
            info!(
                "event=jd_list module=repo status=ok active_filter={} count={} duration_ms={}",
                is_active.map_or("any", encode_is_active),
                records.len(),
                started_at.elapsed().as_millis()
            );
        }
        log_failure("jd_list", started_at, result)
    }

    /// Returns the record with this id when `user_id` owns it.
    ///
    /// # Errors
    /// - `PermissionDenied` when the record belongs to another user.
    pub fn get_by_id(
        &self,
        user_id: &str,
        id: impl Into<JobDescriptionId>,
    ) -> RepoResult<Option<JobDescription>> {
        let started_at = Instant::now();
        let id = id.into();
        let result = self.find_owned(user_id, &id);
        log_failure("jd_get", started_at, result)
    }

    /// Deletes the record with this id when `user_id` owns it.
    ///
    /// Returns `false` when no record has this id.
    ///
    /// # Errors
    /// - `PermissionDenied` when the record belongs to another user.
    pub fn delete(&self, user_id: &str, id: impl Into<JobDescriptionId>) -> RepoResult<bool> {
        let started_at = Instant::now();
        let id = id.into();
        let result = self.find_owned(user_id, &id).and_then(|found| match found {
            None => Ok(false),
            Some(record) => {
                self.container.delete_item(&record.id, &record.user_id)?;
                info!(
                    "event=jd_delete module=repo status=ok id={} duration_ms={}",
                    record.id,
                    started_at.elapsed().as_millis()
                );
                Ok(true)
            }
        });
        log_failure("jd_delete", started_at, result)
    }

    /// Deletes every record of every user. Administrative use only.
    ///
    /// Returns how many records were deleted.
    pub fn delete_all(&self) -> RepoResult<usize> {
        let started_at = Instant::now();
        let result = self.wipe();
        if let Ok(count) = &result {
            warn!(
                "event=jd_delete_all module=repo status=ok count={} duration_ms={}",
                count,
                started_at.elapsed().as_millis()
            );
        }
        log_failure("jd_delete_all", started_at, result)
    }

    fn write_by_natural_key(
        &self,
        mut record: JobDescription,
        started_at: Instant,
    ) -> RepoResult<JobDescription> {
        let query = DocumentQuery::all()
            .where_eq("/user_id", record.user_id.as_str())
            .where_eq("/title", record.title.as_str())
            .where_eq("/company", record.company.as_str());
        let existing = self
            .container
            .query_items(&query, &QueryScope::Partition(record.user_id.clone()))?;

        let existing_id = existing
            .first()
            .and_then(|document| document.get("id"))
            .and_then(Value::as_str);
        let mode = match existing_id {
            Some(id) => {
                record.id = id.to_string();
                "replace"
            }
            None => "create",
        };

        let stored = self.container.upsert_item(to_document(&record))?;
        let stored = from_document(stored)?;
        info!(
            "event=jd_upsert module=repo status=ok mode={} id={} duration_ms={}",
            mode,
            stored.id,
            started_at.elapsed().as_millis()
        );
        Ok(stored)
    }

    /// Looks the id up across all partitions, then checks ownership.
    fn find_owned(&self, user_id: &str, id: &JobDescriptionId) -> RepoResult<Option<JobDescription>> {
        let query = DocumentQuery::all().where_eq("/id", id.as_str());
        let documents = self
            .container
            .query_items(&query, &QueryScope::CrossPartition)?;

        let Some(document) = documents.into_iter().next() else {
            return Ok(None);
        };
        let record = from_document(document)?;
        if record.user_id != user_id {
            warn!(
                "event=jd_ownership module=repo status=denied id={}",
                record.id
            );
            return Err(RepoError::PermissionDenied { id: record.id });
        }
        Ok(Some(record))
    }

    fn wipe(&self) -> RepoResult<usize> {
        let documents = self.container.read_all_items()?;
        let mut deleted = 0;
        for document in documents {
            let id = document.get("id").and_then(Value::as_str);
            let owner = document.get("user_id").and_then(Value::as_str);
            let (Some(id), Some(owner)) = (id, owner) else {
                return Err(RepoError::InvalidData(
                    "stored document lacks `id` or `user_id`".to_string(),
                ));
            };
            self.container.delete_item(id, owner)?;
            deleted += 1;
        }
        Ok(deleted)
    }
}

fn log_failure<T>(event: &str, started_at: Instant, result: RepoResult<T>) -> RepoResult<T> {
    if let Err(err) = &result {
        if !err.is_permission_denied() {
            warn!(
                "event={} module=repo status=error duration_ms={} error_code={} error={}",
                event,
                started_at.elapsed().as_millis(),
                err.code(),
                err
            );
        }
    }
    result
}
