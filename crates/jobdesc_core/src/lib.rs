//! Job description storage for a managed document database.
//!
//! Records are partitioned by owning user, deduplicated on
//! `(user_id, title, company)`, and only readable or deletable by their owner.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::job_description::{
    canonical_timestamp, FieldIssue, FieldProblem, JobDescription, JobDescriptionId,
    JobDescriptionValidationError,
};
pub use repo::job_description_repo::{container_spec, JobDescriptionRepository};
pub use repo::{RepoError, RepoResult};
pub use store::{
    ContainerSpec, Document, DocumentContainer, DocumentDatabase, DocumentQuery, QueryScope,
    SqliteContainer, SqliteDocumentDatabase, StoreError, StoreResult,
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
