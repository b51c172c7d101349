//! Exam schedule repository trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::RepositoryResult;
use crate::api::ExamId;
use crate::models::{CalendarDay, Exam, ExamDraft, ExamSession};

/// Selection over the exam collection. Unset fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExamFilter {
    pub active_only: bool,
    /// Exams whose stored date resolves to this day; unresolvable dates never match.
    pub day: Option<CalendarDay>,
    pub time: Option<ExamSession>,
    pub exclude: Option<ExamId>,
}

impl ExamFilter {
    pub fn active() -> Self {
        Self {
            active_only: true,
            ..Default::default()
        }
    }

    /// Active exams held in the given slot.
    pub fn slot(day: CalendarDay, time: ExamSession) -> Self {
        Self {
            active_only: true,
            day: Some(day),
            time: Some(time),
            exclude: None,
        }
    }

    pub fn excluding(mut self, exam: ExamId) -> Self {
        self.exclude = Some(exam);
        self
    }
}

/// Counts from a bulk exam upsert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExamUpsertSummary {
    pub inserted: Vec<Exam>,
    pub reactivated: Vec<Exam>,
    pub updated: usize,
}

/// Repository trait for the exam schedule collection.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait ExamRepository: Send + Sync {
    /// Check if the store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Look up one exam. Inactive exams are returned too.
    ///
    /// # Returns
    /// * `Ok(None)` - If no exam has this id
    async fn find_exam(&self, id: ExamId) -> RepositoryResult<Option<Exam>>;

    /// Exams matching the filter, ordered by calendar day, then session, then id.
    async fn find_exams(&self, filter: &ExamFilter) -> RepositoryResult<Vec<Exam>>;

    /// Insert a new exam.
    ///
    /// # Errors
    /// * `ConstraintViolation(DuplicateExamSlot)` - If an active exam has the same key
    async fn create_exam(&self, draft: &ExamDraft) -> RepositoryResult<Exam>;

    /// Replace an exam's fields; the active flag is kept.
    ///
    /// # Errors
    /// * `NotFound` - If no exam has this id
    /// * `ConstraintViolation(DuplicateExamSlot)` - If another active exam has the new key
    async fn update_exam(&self, id: ExamId, draft: &ExamDraft) -> RepositoryResult<Exam>;

    /// Soft-delete an exam.
    ///
    /// # Errors
    /// * `NotFound` - If no exam has this id
    async fn deactivate_exam(&self, id: ExamId) -> RepositoryResult<Exam>;

    /// Apply a batch atomically: unknown keys are inserted, inactive matches
    /// reactivated with the new fields, active matches updated in place.
    async fn upsert_exams(&self, drafts: &[ExamDraft]) -> RepositoryResult<ExamUpsertSummary>;
}
