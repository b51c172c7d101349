//! Invigilation duty and attendance repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{ExamId, FacultyAllocationId, StudentId};
use crate::models::{Attendance, AttendanceUpdate, FacultyAllocation, NewFacultyAllocation};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacultyAllocationFilter {
    pub faculty_id: Option<String>,
    pub exams: Option<Vec<ExamId>>,
}

impl FacultyAllocationFilter {
    pub fn matches(&self, duty: &FacultyAllocation) -> bool {
        self.faculty_id
            .as_ref()
            .is_none_or(|f| &duty.faculty_id == f)
            && self
                .exams
                .as_ref()
                .is_none_or(|exams| exams.contains(&duty.exam))
    }
}

#[async_trait]
pub trait DutyRepository: Send + Sync {
    /// Duties matching the filter, in insertion order.
    async fn find_faculty_allocations(
        &self,
        filter: &FacultyAllocationFilter,
    ) -> RepositoryResult<Vec<FacultyAllocation>>;

    /// # Errors
    /// * `ConstraintViolation(DuplicateFacultyDuty)` - If the faculty already has a duty for the exam
    async fn create_faculty_allocation(
        &self,
        duty: &NewFacultyAllocation,
    ) -> RepositoryResult<FacultyAllocation>;

    /// # Errors
    /// * `NotFound` - If no duty has this id
    /// * `ConstraintViolation(DuplicateFacultyDuty)` - If the change collides with another duty
    async fn update_faculty_allocation(
        &self,
        id: FacultyAllocationId,
        duty: &NewFacultyAllocation,
    ) -> RepositoryResult<FacultyAllocation>;

    async fn delete_faculty_allocation(
        &self,
        id: FacultyAllocationId,
    ) -> RepositoryResult<FacultyAllocation>;

    /// Remove every duty for the given exams, returning how many were removed.
    async fn delete_faculty_allocations_for_exams(
        &self,
        exams: &[ExamId],
    ) -> RepositoryResult<usize>;

    /// Attendance records of one exam, optionally limited to some students.
    async fn find_attendance(
        &self,
        exam: ExamId,
        students: Option<&[StudentId]>,
    ) -> RepositoryResult<Vec<Attendance>>;

    /// Insert or update the record keyed by (student, exam).
    async fn upsert_attendance(&self, update: &AttendanceUpdate) -> RepositoryResult<Attendance>;
}
