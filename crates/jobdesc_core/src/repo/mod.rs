//! Repository layer over the document store.
//!
//! # Responsibility
//! - Own the `job_descriptions` container and its natural-key semantics.
//! - Enforce per-record ownership on identifier-based reads and deletes.
//!
//! # Invariants
//! - Writes validate the full payload before any storage call.
//! - Storage errors are carried unchanged inside `RepoError::Store`.
//! - "Not found" is a normal return value, never an error.

use crate::model::job_description::JobDescriptionValidationError;
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod job_description_repo;
pub mod persisted;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Validation(JobDescriptionValidationError),
    /// The record exists but belongs to another user.
    PermissionDenied {
        id: String,
    },
    Store(StoreError),
    InvalidData(String),
}

impl RepoError {
    /// The storage collaborator's error, exactly as it was raised.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }

    /// Short stable code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::PermissionDenied { .. } => "permission_denied",
            Self::Store(err) if err.is_conflict() => "store_conflict",
            Self::Store(_) => "store_failed",
            Self::InvalidData(_) => "invalid_data",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::PermissionDenied { id } => write!(
                f,
                "you don't have permission to access job description {id}"
            ),
            Self::Store(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted job description: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::PermissionDenied { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<JobDescriptionValidationError> for RepoError {
    fn from(value: JobDescriptionValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}
