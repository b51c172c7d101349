//! Seat allocation repository trait.
//!
//! The collection enforces two uniqueness rules on every write:
//! (exam, room, seat_number) and (student, exam).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::RepositoryResult;
use crate::api::{ExamId, RoomId, SeatAllocationId};
use crate::models::{NewSeatAllocation, SeatAllocation};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationFilter {
    /// Restrict to allocations of these exams. `Some(vec![])` matches nothing.
    pub exams: Option<Vec<ExamId>>,
    pub room: Option<RoomId>,
}

impl AllocationFilter {
    pub fn for_exam(exam: ExamId) -> Self {
        Self {
            exams: Some(vec![exam]),
            room: None,
        }
    }

    pub fn for_exams(exams: impl IntoIterator<Item = ExamId>) -> Self {
        Self {
            exams: Some(exams.into_iter().collect()),
            room: None,
        }
    }

    pub fn in_room(mut self, room: RoomId) -> Self {
        self.room = Some(room);
        self
    }

    pub fn matches(&self, allocation: &SeatAllocation) -> bool {
        self.exams
            .as_ref()
            .is_none_or(|exams| exams.contains(&allocation.exam))
            && self.room.is_none_or(|room| allocation.room == room)
    }
}

/// What an atomic replace removed and wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceOutcome {
    pub deleted: usize,
    pub inserted: Vec<SeatAllocation>,
}

#[async_trait]
pub trait SeatAllocationRepository: Send + Sync {
    /// Allocations matching the filter, in insertion order.
    async fn find_allocations(
        &self,
        filter: &AllocationFilter,
    ) -> RepositoryResult<Vec<SeatAllocation>>;

    /// Insert a batch; all or nothing.
    ///
    /// # Errors
    /// * `ConstraintViolation(DuplicateSeat)` - A seat is taken or repeated in the batch
    /// * `ConstraintViolation(DuplicateStudentAssignment)` - A student already has a seat for the exam
    async fn insert_allocations(
        &self,
        records: &[NewSeatAllocation],
    ) -> RepositoryResult<Vec<SeatAllocation>>;

    /// Remove every allocation of an exam and return how many were removed.
    async fn delete_allocations_for_exam(&self, exam: ExamId) -> RepositoryResult<usize>;

    /// # Errors
    /// * `NotFound` - If no allocation has this id
    async fn delete_allocation(&self, id: SeatAllocationId) -> RepositoryResult<SeatAllocation>;

    /// Delete all allocations of `exam` and insert `records` as one unit.
    ///
    /// Constraints are checked against the post-delete state before anything
    /// changes; on violation the previous plan is left intact.
    async fn replace_allocations_for_exam(
        &self,
        exam: ExamId,
        records: &[NewSeatAllocation],
    ) -> RepositoryResult<ReplaceOutcome>;
}
