//! Repository trait definitions for store operations.
//!
//! This module provides a collection of focused repository traits that abstract
//! the document store. Each trait covers one collection, so implementations
//! stay focused and testable.
//!
//! # Module Organization
//!
//! - [`error`]: Error types for repository operations
//! - [`exam`]: Exam schedule collection
//! - [`room`]: Room inventory collection
//! - [`student`]: Student roster collection
//! - [`seat_allocation`]: Seat allocation collection and its uniqueness rules
//! - [`duty`]: Invigilation duty and attendance collections
//!
//! # Convenience Trait Bound
//!
//! For functions that need all repository capabilities, use the [`FullRepository`] trait bound:
//!
//! ```ignore
//! async fn allocate<R: FullRepository + ?Sized>(repo: &R, exam: ExamId) -> RepositoryResult<()> {
//!     let exam = repo.find_exam(exam).await?;
//!     let rooms = repo.find_rooms(&RoomFilter::active()).await?;
//!     Ok(())
//! }
//! ```

pub mod duty;
pub mod error;
pub mod exam;
pub mod room;
pub mod seat_allocation;
pub mod student;

// Re-export error types
pub use error::{ConstraintKind, ErrorContext, RepositoryError, RepositoryResult};

// Re-export all traits and their filters
pub use duty::{DutyRepository, FacultyAllocationFilter};
pub use exam::{ExamFilter, ExamRepository, ExamUpsertSummary};
pub use room::{BulkRoomOutcome, RoomFilter, RoomRepository};
pub use seat_allocation::{AllocationFilter, ReplaceOutcome, SeatAllocationRepository};
pub use student::{StudentFilter, StudentRepository, StudentUpsertOutcome, SubjectMatch};

/// Composite trait bound for a complete repository implementation.
///
/// This trait is automatically implemented for any type that implements
/// all collection traits.
pub trait FullRepository:
    ExamRepository + RoomRepository + StudentRepository + SeatAllocationRepository + DutyRepository
{
}

// Blanket implementation: any type implementing all collection traits automatically implements FullRepository
impl<T> FullRepository for T where
    T: ExamRepository
        + RoomRepository
        + StudentRepository
        + SeatAllocationRepository
        + DutyRepository
{
}
