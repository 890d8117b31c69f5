//! Container id and document path validation.
//!
//! Both end up embedded in DDL (index names, JSON paths), so they are
//! restricted to a conservative identifier alphabet.

use super::{StoreError, StoreResult};
use once_cell::sync::Lazy;
use regex::Regex;

static CONTAINER_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]{0,62}$").expect("valid container id regex"));
static DOCUMENT_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(/[A-Za-z_][A-Za-z0-9_]*)+$").expect("valid document path regex")
});

pub fn validate_container_id(id: &str) -> StoreResult<()> {
    if CONTAINER_ID_RE.is_match(id) {
        Ok(())
    } else {
        Err(StoreError::InvalidContainerId(id.to_string()))
    }
}

/// Converts a `/a/b` document path into the SQLite JSON path `$.a.b`.
pub fn json_path(path: &str) -> StoreResult<String> {
    if !DOCUMENT_PATH_RE.is_match(path) {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(format!("${}", path.replace('/', ".")))
}

/// Path segments of an already validated `/a/b` path.
pub(crate) fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}
