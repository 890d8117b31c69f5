//! Domain model for stored job descriptions.
//!
//! # Responsibility
//! - Define the record shape shared by the repository and its callers.
//! - Own payload validation so no unvalidated record reaches storage.
//!
//! # Invariants
//! - Records are owned by exactly one `user_id` for their whole lifetime.

pub mod job_description;
