//! Student roster repository trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::RepositoryResult;
use crate::api::StudentId;
use crate::models::{Student, StudentDraft};

/// How a student's subject must relate to an exam's.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum SubjectMatch {
    #[default]
    Any,
    /// Exact subject code.
    Code(String),
    /// Case-insensitive substring of the subject name.
    NameContains(String),
}

impl SubjectMatch {
    pub fn matches(&self, subject: &str, subject_code: &str) -> bool {
        match self {
            SubjectMatch::Any => true,
            SubjectMatch::Code(code) => subject_code == code,
            SubjectMatch::NameContains(fragment) => subject
                .to_lowercase()
                .contains(&fragment.to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StudentFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semester: Option<String>,
    pub active_only: bool,
    pub subject: SubjectMatch,
}

impl StudentFilter {
    pub fn active() -> Self {
        Self {
            active_only: true,
            ..Default::default()
        }
    }

    pub fn matches(&self, student: &Student) -> bool {
        (!self.active_only || student.active)
            && self
                .department
                .as_ref()
                .is_none_or(|d| &student.department == d)
            && self.semester.as_ref().is_none_or(|s| &student.semester == s)
            && self.subject.matches(&student.subject, &student.subject_code)
    }
}

/// Result of upserting a batch by registration number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentUpsertOutcome {
    pub inserted: Vec<Student>,
    /// Existing students whose fields changed (or that were reactivated).
    pub updated: Vec<Student>,
    /// Existing students the batch matched exactly.
    pub unchanged: usize,
    /// Registration numbers repeated within the batch; the first row wins.
    pub duplicates: Vec<String>,
}

#[async_trait]
pub trait StudentRepository: Send + Sync {
    async fn find_student(&self, id: StudentId) -> RepositoryResult<Option<Student>>;

    /// Students matching the filter, ordered by ascending registration number.
    async fn find_students(&self, filter: &StudentFilter) -> RepositoryResult<Vec<Student>>;

    /// # Errors
    /// * `ConstraintViolation(DuplicateRegistration)` - If the registration number exists
    async fn create_student(&self, draft: &StudentDraft) -> RepositoryResult<Student>;

    /// Replace a student's fields; the active flag is kept.
    ///
    /// # Errors
    /// * `NotFound` - If no student has this id
    /// * `ConstraintViolation(DuplicateRegistration)` - If another student has the number
    async fn update_student(&self, id: StudentId, draft: &StudentDraft)
        -> RepositoryResult<Student>;

    async fn deactivate_student(&self, id: StudentId) -> RepositoryResult<Student>;

    /// Insert unseen registration numbers and overwrite (and reactivate)
    /// existing ones, atomically.
    async fn upsert_students(&self, drafts: &[StudentDraft])
        -> RepositoryResult<StudentUpsertOutcome>;
}
