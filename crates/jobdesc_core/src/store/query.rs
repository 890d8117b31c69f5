//! Parameterized document queries.

use serde_json::Value;
use std::fmt::{Display, Formatter};

/// Where a query is allowed to look.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryScope {
    /// Only documents whose partition key equals this value.
    Partition(String),
    /// Every partition of the container.
    CrossPartition,
}

/// One `c.<path> = @<param>` equality condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    path: String,
    value: Value,
}

impl Filter {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Parameter name this filter binds, e.g. `@user_id` for `/user_id`.
    pub fn parameter(&self) -> String {
        let joined = self
            .path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("_");
        format!("@{joined}")
    }
}

/// Conjunction of equality filters. An empty query matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentQuery {
    filters: Vec<Filter>,
}

impl DocumentQuery {
    pub fn all() -> Self {
        Self::default()
    }

    /// Adds `c.<path> = @<param>`; `path` uses the `/field` form.
    pub fn where_eq(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            path: path.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }
}

/// Renders the query text with parameter placeholders, never values.
impl Display for DocumentQuery {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SELECT * FROM c")?;
        for (index, filter) in self.filters.iter().enumerate() {
            let keyword = if index == 0 { "WHERE" } else { "AND" };
            let field = filter
                .path
                .split('/')
                .filter(|segment| !segment.is_empty())
                .collect::<Vec<_>>()
                .join(".");
            write!(f, " {keyword} c.{field} = {}", filter.parameter())?;
        }
        Ok(())
    }
}
