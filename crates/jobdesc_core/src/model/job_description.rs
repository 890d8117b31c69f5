//! Job description record schema.
//!
//! # Responsibility
//! - Define the validated shape of a job description record.
//! - Turn loosely structured payloads into records, reporting every offending
//!   field at once.
//!
//! # Invariants
//! - `id` is generated (UUID v4 string) when a payload omits it and never
//!   changes afterwards.
//! - `(user_id, title, company)` is the natural key.
//! - Absent optional fields are `None`, never empty strings.
//! - `is_active` is a native boolean here; string encodings exist only in
//!   persisted documents.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const PAYLOAD_FIELD: &str = "<payload>";

/// Validated job description record.
///
/// Serializes to the flat payload shape (optional fields as `null`) and
/// deserializes through [`JobDescription::from_payload`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct JobDescription {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub description: String,
    pub requirements: Vec<String>,
    pub skills: Vec<String>,
    pub experience_level: Option<String>,
    pub salary_range: Option<String>,
    pub employment_type: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub is_active: bool,
    /// Caller-defined extension fields.
    pub metadata: Option<Map<String, Value>>,
}

impl JobDescription {
    /// Creates an active record with a fresh id and both timestamps set to now.
    pub fn new(
        user_id: impl Into<String>,
        title: impl Into<String>,
        company: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let now = canonical_timestamp(Utc::now());
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            title: title.into(),
            company: company.into(),
            location: None,
            description: description.into(),
            requirements: Vec::new(),
            skills: Vec::new(),
            experience_level: None,
            salary_range: None,
            employment_type: None,
            created_at: now.clone(),
            updated_at: now,
            is_active: true,
            metadata: None,
        }
    }

    /// Validates a payload and builds a record from it.
    ///
    /// Unknown keys are ignored.
    ///
    /// # Errors
    /// - Returns every missing or wrongly shaped field in one error.
    pub fn from_payload(payload: &Value) -> Result<Self, JobDescriptionValidationError> {
        let Some(object) = payload.as_object() else {
            return Err(JobDescriptionValidationError::single(
                PAYLOAD_FIELD,
                FieldProblem::WrongType { expected: "object" },
            ));
        };

        let mut reader = PayloadReader::new(object);
        // Field order here is the order issues are reported in.
        let record = Self {
            id: reader.id(),
            user_id: reader.required_string("user_id"),
            title: reader.required_string("title"),
            company: reader.required_string("company"),
            location: reader.optional_string("location"),
            description: reader.required_string("description"),
            requirements: reader.string_list("requirements"),
            skills: reader.string_list("skills"),
            experience_level: reader.optional_string("experience_level"),
            salary_range: reader.optional_string("salary_range"),
            employment_type: reader.optional_string("employment_type"),
            created_at: reader.required_string("created_at"),
            updated_at: reader.required_string("updated_at"),
            is_active: reader.is_active(),
            metadata: reader.metadata(),
        };

        if reader.issues.is_empty() {
            Ok(record)
        } else {
            Err(JobDescriptionValidationError {
                issues: reader.issues,
            })
        }
    }

    /// Domain-shaped payload accepted by [`JobDescription::from_payload`].
    pub fn to_payload(&self) -> Value {
        Value::Object(self.to_fields())
    }

    /// Same as [`JobDescription::to_payload`], as a JSON object map.
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("id".into(), self.id.clone().into());
        fields.insert("user_id".into(), self.user_id.clone().into());
        fields.insert("title".into(), self.title.clone().into());
        fields.insert("company".into(), self.company.clone().into());
        fields.insert("location".into(), self.location.clone().into());
        fields.insert("description".into(), self.description.clone().into());
        fields.insert("requirements".into(), self.requirements.clone().into());
        fields.insert("skills".into(), self.skills.clone().into());
        fields.insert("experience_level".into(), self.experience_level.clone().into());
        fields.insert("salary_range".into(), self.salary_range.clone().into());
        fields.insert("employment_type".into(), self.employment_type.clone().into());
        fields.insert("created_at".into(), self.created_at.clone().into());
        fields.insert("updated_at".into(), self.updated_at.clone().into());
        fields.insert("is_active".into(), self.is_active.into());
        fields.insert("metadata".into(), self.metadata.clone().into());
        fields
    }
}

impl TryFrom<Value> for JobDescription {
    type Error = JobDescriptionValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_payload(&value)
    }
}

impl From<JobDescription> for Value {
    fn from(value: JobDescription) -> Self {
        value.to_payload()
    }
}

/// Formats a timestamp the way records store `created_at` / `updated_at`.
pub fn canonical_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Identifier used to look a record up.
///
/// A `Uuid` normalizes to its lowercase hyphenated form; strings are used
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobDescriptionId(String);

impl JobDescriptionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for JobDescriptionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Uuid> for JobDescriptionId {
    fn from(value: Uuid) -> Self {
        Self(value.hyphenated().to_string())
    }
}

impl From<&Uuid> for JobDescriptionId {
    fn from(value: &Uuid) -> Self {
        Self::from(*value)
    }
}

impl From<String> for JobDescriptionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&String> for JobDescriptionId {
    fn from(value: &String) -> Self {
        Self(value.clone())
    }
}

impl From<&str> for JobDescriptionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// What is wrong with one payload field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldProblem {
    Missing,
    Empty,
    WrongType { expected: &'static str },
}

impl Display for FieldProblem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "field required"),
            Self::Empty => write!(f, "must not be empty"),
            Self::WrongType { expected } => write!(f, "expected {expected}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: &'static str,
    pub problem: FieldProblem,
}

/// Payload does not match the record schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptionValidationError {
    issues: Vec<FieldIssue>,
}

impl JobDescriptionValidationError {
    fn single(field: &'static str, problem: FieldProblem) -> Self {
        Self {
            issues: vec![FieldIssue { field, problem }],
        }
    }

    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    /// Names of the offending fields, in schema order.
    pub fn fields(&self) -> Vec<&'static str> {
        self.issues.iter().map(|issue| issue.field).collect()
    }
}

impl Display for JobDescriptionValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid job description:")?;
        for (index, issue) in self.issues.iter().enumerate() {
            let separator = if index == 0 { " " } else { "; " };
            write!(f, "{separator}{}: {}", issue.field, issue.problem)?;
        }
        Ok(())
    }
}

impl Error for JobDescriptionValidationError {}

struct PayloadReader<'a> {
    object: &'a Map<String, Value>,
    issues: Vec<FieldIssue>,
}

impl<'a> PayloadReader<'a> {
    fn new(object: &'a Map<String, Value>) -> Self {
        Self {
            object,
            issues: Vec::new(),
        }
    }

    fn flag(&mut self, field: &'static str, problem: FieldProblem) {
        self.issues.push(FieldIssue { field, problem });
    }

    /// Present and not `null`.
    fn present(&self, field: &str) -> Option<&'a Value> {
        self.object.get(field).filter(|value| !value.is_null())
    }

    // Rejected fields yield a placeholder; callers discard the record when
    // any issue was flagged.

    fn id(&mut self) -> String {
        match self.present("id") {
            None => Uuid::new_v4().to_string(),
            Some(Value::String(id)) if id.is_empty() => {
                self.flag("id", FieldProblem::Empty);
                String::new()
            }
            Some(Value::String(id)) => id.clone(),
            Some(_) => {
                self.flag("id", FieldProblem::WrongType { expected: "string" });
                String::new()
            }
        }
    }

    fn required_string(&mut self, field: &'static str) -> String {
        match self.present(field) {
            Some(Value::String(text)) => text.clone(),
            Some(_) => {
                self.flag(field, FieldProblem::WrongType { expected: "string" });
                String::new()
            }
            None => {
                self.flag(field, FieldProblem::Missing);
                String::new()
            }
        }
    }

    fn optional_string(&mut self, field: &'static str) -> Option<String> {
        match self.present(field) {
            None => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(_) => {
                self.flag(field, FieldProblem::WrongType { expected: "string" });
                None
            }
        }
    }

    fn string_list(&mut self, field: &'static str) -> Vec<String> {
        const EXPECTED: FieldProblem = FieldProblem::WrongType {
            expected: "array of strings",
        };
        match self.present(field) {
            Some(Value::Array(items)) => {
                let strings = items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>();
                strings.unwrap_or_else(|| {
                    self.flag(field, EXPECTED);
                    Vec::new()
                })
            }
            Some(_) => {
                self.flag(field, EXPECTED);
                Vec::new()
            }
            None => {
                self.flag(field, FieldProblem::Missing);
                Vec::new()
            }
        }
    }

    fn is_active(&mut self) -> bool {
        let Some(value) = self.object.get("is_active") else {
            return true;
        };
        match value {
            Value::Bool(flag) => *flag,
            Value::String(text) if text == "true" => true,
            Value::String(text) if text == "false" => false,
            _ => {
                self.flag(
                    "is_active",
                    FieldProblem::WrongType {
                        expected: "boolean or \"true\"/\"false\"",
                    },
                );
                true
            }
        }
    }

    fn metadata(&mut self) -> Option<Map<String, Value>> {
        match self.present("metadata") {
            None => None,
            Some(Value::Object(map)) => Some(map.clone()),
            Some(_) => {
                self.flag("metadata", FieldProblem::WrongType { expected: "object" });
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{canonical_timestamp, FieldProblem, JobDescription, JobDescriptionId};
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use uuid::Uuid;

    fn minimal_payload() -> serde_json::Value {
        json!({
            "user_id": "u1",
            "title": "Engineer",
            "company": "Acme",
            "description": "Build things",
            "requirements": ["Rust"],
            "skills": [],
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    #[test]
    fn missing_id_is_generated_as_uuid() {
        let record = JobDescription::from_payload(&minimal_payload()).unwrap();
        assert!(Uuid::parse_str(&record.id).is_ok());
        assert!(record.is_active);
        assert_eq!(record.location, None);
        assert_eq!(record.metadata, None);
    }

    #[test]
    fn null_id_is_generated_too() {
        let mut payload = minimal_payload();
        payload["id"] = serde_json::Value::Null;
        let record = JobDescription::from_payload(&payload).unwrap();
        assert!(!record.id.is_empty());
    }

    #[test]
    fn is_active_accepts_bool_and_lowercase_string() {
        let mut payload = minimal_payload();
        payload["is_active"] = json!("false");
        assert!(!JobDescription::from_payload(&payload).unwrap().is_active);

        payload["is_active"] = json!(false);
        assert!(!JobDescription::from_payload(&payload).unwrap().is_active);

        payload["is_active"] = json!("true");
        assert!(JobDescription::from_payload(&payload).unwrap().is_active);

        payload["is_active"] = json!("yes");
        let err = JobDescription::from_payload(&payload).unwrap_err();
        assert_eq!(err.fields(), vec!["is_active"]);
    }

    #[test]
    fn every_offending_field_is_reported() {
        let payload = json!({
            "user_id": "u1",
            "company": 42,
            "description": "d",
            "requirements": "Rust",
            "skills": ["ok", 1],
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
            "metadata": []
        });
        let err = JobDescription::from_payload(&payload).unwrap_err();
        assert_eq!(
            err.fields(),
            vec!["title", "company", "requirements", "skills", "metadata"]
        );
        assert_eq!(err.issues()[0].problem, FieldProblem::Missing);
        assert!(err.to_string().contains("requirements: expected array of strings"));
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let err = JobDescription::from_payload(&json!(["not", "an", "object"])).unwrap_err();
        assert_eq!(err.fields(), vec!["<payload>"]);
    }

    #[test]
    fn serialization_keeps_null_optionals() {
        let record = JobDescription::from_payload(&minimal_payload()).unwrap();
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("location").unwrap().is_null());
        assert!(value.get("salary_range").unwrap().is_null());
        assert_eq!(value["is_active"], json!(true));

        let back: JobDescription = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn uuid_and_string_ids_normalize_identically() {
        let uuid = Uuid::parse_str("123e4567-e89b-12d3-a456-426614174000").unwrap();
        assert_eq!(
            JobDescriptionId::from(uuid),
            JobDescriptionId::from("123e4567-e89b-12d3-a456-426614174000")
        );
    }

    #[test]
    fn canonical_timestamp_is_rfc3339_utc_seconds() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 8, 30, 0).unwrap();
        assert_eq!(canonical_timestamp(at), "2024-01-01T08:30:00Z");
    }
}
