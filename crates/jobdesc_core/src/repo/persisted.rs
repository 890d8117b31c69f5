//! Persisted document form of job description records.
//!
//! The only place that knows `is_active` is stored as the lowercase strings
//! `"true"` / `"false"`, which keeps it filterable as plain text.

use super::{RepoError, RepoResult};
use crate::model::job_description::JobDescription;
use crate::store::Document;
use serde_json::Value;

/// Stored encoding of the active flag, also used as the filter parameter.
pub fn encode_is_active(is_active: bool) -> &'static str {
    if is_active {
        "true"
    } else {
        "false"
    }
}

pub fn to_document(record: &JobDescription) -> Document {
    let mut document = record.to_fields();
    document.insert(
        "is_active".to_string(),
        Value::from(encode_is_active(record.is_active)),
    );
    document
}

/// Rebuilds a record from a stored document, accepting either `is_active`
/// encoding and ignoring storage-managed properties.
pub fn from_document(document: Document) -> RepoResult<JobDescription> {
    JobDescription::from_payload(&Value::Object(document)).map_err(|err| {
        RepoError::InvalidData(format!("stored job description does not validate: {err}"))
    })
}
