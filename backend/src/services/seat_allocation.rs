//! Seat allocation pipeline.
//!
//! One run for one exam:
//! 1. resolve the eligible students (department, semester, subject, exam day)
//! 2. collect the active rooms of the requested type not committed to another
//!    exam in the same slot, smallest first
//! 3. plan seats first-fit
//! 4. replace the exam's previous plan with the new one in a single store write
//!
//! Runs for the same exam are serialized through [`ExamLocks`]; nothing is
//! written unless every step succeeds.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::exam_locks::ExamLocks;
use crate::algorithms::{
    occupied_room_ids, plan_seats, resolve_eligible, seat_index, select_rooms,
    student_filter_for, CapacityShortfall, RoomShortage,
};
use crate::api::{
    AllocationResult, AllocationStats, ConflictingExam, ExamDetails, ExamId, RoomId,
    RoomSummary, SeatAllocationId, SeatAssignment, StudentId, StudentSummary,
};
use crate::db::repository::{
    AllocationFilter, ConstraintKind, ExamFilter, FullRepository, RepositoryError, RoomFilter,
    StudentFilter,
};
use crate::models::{
    supported_formats, CalendarDay, ExamSession, LooseText, NewSeatAllocation, Room, RoomType,
    SeatAllocation, Student,
};

/// Category of an allocation failure, as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AllocationErrorKind {
    ValidationError,
    NotFound,
    Empty,
    MissingRoomType,
    AllOccupied,
    InsufficientCapacity,
    DuplicateSeat,
    DuplicateStudentAssignment,
    StoreUnavailable,
}

impl AllocationErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "ValidationError",
            Self::NotFound => "NotFound",
            Self::Empty => "Empty",
            Self::MissingRoomType => "MissingRoomType",
            Self::AllOccupied => "AllOccupied",
            Self::InsufficientCapacity => "InsufficientCapacity",
            Self::DuplicateSeat => "DuplicateSeat",
            Self::DuplicateStudentAssignment => "DuplicateStudentAssignment",
            Self::StoreUnavailable => "StoreUnavailable",
        }
    }
}

/// Exam identity echoed in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamSnapshot {
    pub subject: String,
    pub subject_code: String,
    pub department: String,
    pub semester: String,
    pub date: CalendarDay,
    pub time: ExamSession,
}

#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    #[error("{message}")]
    Validation {
        message: String,
        missing: Vec<&'static str>,
    },

    #[error("Exam {exam_id} not found")]
    ExamNotFound { exam_id: ExamId },

    #[error("Exam {exam_id} has an unparseable date '{received}'")]
    UnparseableExamDate { exam_id: ExamId, received: String },

    #[error("No eligible students found matching the criteria")]
    NoEligibleStudents {
        exam: ExamSnapshot,
        query: StudentFilter,
        candidates: usize,
        after_date_filter: usize,
    },

    #[error("No {room_type} rooms available")]
    MissingRoomType { room_type: RoomType },

    #[error("No available {room_type} rooms for {date} at {time}")]
    AllOccupied {
        room_type: RoomType,
        date: CalendarDay,
        time: ExamSession,
        occupied_rooms: Vec<RoomSummary>,
        conflicting_exams: Vec<ConflictingExam>,
    },

    #[error("Insufficient {room_type} room capacity: {} students, {} seats", .shortfall.students, .shortfall.available_capacity)]
    InsufficientCapacity {
        room_type: RoomType,
        shortfall: CapacityShortfall,
    },

    #[error("Duplicate seat: {0}")]
    DuplicateSeat(String),

    #[error("Duplicate student assignment: {0}")]
    DuplicateStudentAssignment(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[source] RepositoryError),
}

impl AllocationError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            missing: Vec::new(),
        }
    }

    pub fn kind(&self) -> AllocationErrorKind {
        match self {
            Self::Validation { .. } => AllocationErrorKind::ValidationError,
            Self::ExamNotFound { .. } | Self::UnparseableExamDate { .. } => {
                AllocationErrorKind::NotFound
            }
            Self::NoEligibleStudents { .. } => AllocationErrorKind::Empty,
            Self::MissingRoomType { .. } => AllocationErrorKind::MissingRoomType,
            Self::AllOccupied { .. } => AllocationErrorKind::AllOccupied,
            Self::InsufficientCapacity { .. } => AllocationErrorKind::InsufficientCapacity,
            Self::DuplicateSeat(_) => AllocationErrorKind::DuplicateSeat,
            Self::DuplicateStudentAssignment(_) => AllocationErrorKind::DuplicateStudentAssignment,
            Self::StoreUnavailable(_) => AllocationErrorKind::StoreUnavailable,
        }
    }

    /// Structured context for operators; `Value::Null` when there is none.
    pub fn diagnostics(&self) -> Value {
        match self {
            Self::Validation { missing, .. } if !missing.is_empty() => {
                json!({ "required_fields": missing })
            }
            Self::Validation { .. } => Value::Null,
            Self::ExamNotFound { exam_id } => json!({
                "exam_id": exam_id,
                "suggestion": "Verify the exam ID exists",
            }),
            Self::UnparseableExamDate { exam_id, received } => json!({
                "exam_id": exam_id,
                "received_date": received,
                "acceptable_formats": supported_formats(),
            }),
            Self::NoEligibleStudents {
                exam,
                query,
                candidates,
                after_date_filter,
            } => json!({
                "exam": exam,
                "query": query,
                "potential_students": candidates,
                "after_date_filter": after_date_filter,
                "filtered_out": candidates - after_date_filter,
            }),
            Self::MissingRoomType { room_type } => json!({
                "room_type": room_type,
                "suggestion": "Try a different room type or add more rooms",
            }),
            Self::AllOccupied {
                room_type,
                date,
                time,
                occupied_rooms,
                conflicting_exams,
            } => json!({
                "room_type": room_type,
                "date": date,
                "time": time,
                "occupied_rooms": occupied_rooms,
                "conflicting_exams": conflicting_exams,
                "suggestion": "Consider changing exam time or using different room types",
            }),
            Self::InsufficientCapacity {
                room_type,
                shortfall,
            } => json!({
                "room_type": room_type,
                "students": shortfall.students,
                "available_capacity": shortfall.available_capacity,
                "required_additional": shortfall.shortfall,
                "rooms_needed": shortfall.additional_rooms_needed,
            }),
            Self::DuplicateSeat(_) | Self::DuplicateStudentAssignment(_) => Value::Null,
            Self::StoreUnavailable(e) => json!({ "retryable": e.is_retryable() }),
        }
    }
}

impl From<RepositoryError> for AllocationError {
    fn from(e: RepositoryError) -> Self {
        match e.constraint_kind() {
            Some(ConstraintKind::DuplicateSeat) => Self::DuplicateSeat(e.to_string()),
            Some(ConstraintKind::DuplicateStudentAssignment) => {
                Self::DuplicateStudentAssignment(e.to_string())
            }
            _ => Self::StoreUnavailable(e),
        }
    }
}

/// Body of an allocation request, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllocationRequest {
    #[serde(default, alias = "examId")]
    pub exam_id: Option<LooseText>,
    #[serde(default, alias = "roomType")]
    pub room_type: Option<String>,
}

impl AllocationRequest {
    /// Both fields are required; checked before any store access.
    pub fn validate(&self) -> Result<(ExamId, RoomType), AllocationError> {
        let exam_id = self.exam_id.as_ref().filter(|v| !v.normalized().is_empty());
        let room_type = self
            .room_type
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty());

        let (Some(exam_id), Some(room_type)) = (exam_id, room_type) else {
            let mut missing = Vec::new();
            if exam_id.is_none() {
                missing.push("exam_id");
            }
            if room_type.is_none() {
                missing.push("room_type");
            }
            return Err(AllocationError::Validation {
                message: "Both exam_id and room_type are required".to_string(),
                missing,
            });
        };

        let exam_id = exam_id.as_i64().map(ExamId::new).ok_or_else(|| {
            AllocationError::validation(format!(
                "exam_id must be an integer, got '{}'",
                exam_id.normalized()
            ))
        })?;
        let room_type = room_type.parse().map_err(AllocationError::validation)?;
        Ok((exam_id, room_type))
    }
}

/// Orchestrates allocation runs over a shared repository.
#[derive(Clone)]
pub struct SeatingService {
    repo: Arc<dyn FullRepository>,
    locks: ExamLocks,
}

impl SeatingService {
    pub fn new(repo: Arc<dyn FullRepository>) -> Self {
        Self {
            repo,
            locks: ExamLocks::new(),
        }
    }

    pub fn repository(&self) -> &Arc<dyn FullRepository> {
        &self.repo
    }

    /// Allocate seats for one exam in rooms of one type, replacing any
    /// previous plan for that exam.
    pub async fn allocate(
        &self,
        exam_id: ExamId,
        room_type: RoomType,
    ) -> Result<AllocationResult, AllocationError> {
        let _guard = self.locks.acquire(exam_id).await;
        info!("Seat allocation started: exam {} in {} rooms", exam_id, room_type);

        let result = self.allocate_locked(exam_id, room_type).await;
        match &result {
            Ok(outcome) => info!(
                "Seat allocation completed: exam {} - {} seats in {} rooms",
                exam_id, outcome.stats.seats_allocated, outcome.stats.rooms_used
            ),
            Err(
                e @ (AllocationError::DuplicateSeat(_)
                | AllocationError::DuplicateStudentAssignment(_)),
            ) => error!("Seat allocation invariant breach for exam {}: {}", exam_id, e),
            Err(e) => warn!("Seat allocation failed for exam {}: {}", exam_id, e),
        }
        result
    }

    async fn allocate_locked(
        &self,
        exam_id: ExamId,
        room_type: RoomType,
    ) -> Result<AllocationResult, AllocationError> {
        let repo = self.repo.as_ref();

        let exam = repo
            .find_exam(exam_id)
            .await?
            .ok_or(AllocationError::ExamNotFound { exam_id })?;
        let day = exam
            .calendar_day()
            .map_err(|_| AllocationError::UnparseableExamDate {
                exam_id,
                received: exam.date.to_string(),
            })?;
        debug!(
            "Exam {}: {} ({}) {} sem {} on {} {}",
            exam.id, exam.subject, exam.subject_code, exam.department, exam.semester, day, exam.time
        );

        // Eligible students
        let query = student_filter_for(&exam);
        let candidates = repo.find_students(&query).await?;
        info!("Found {} potential students before date filtering", candidates.len());
        let eligibility = resolve_eligible(day, &query, candidates);
        info!(
            "After date filtering: {} students ({} unique)",
            eligibility.on_day,
            eligibility.students.len()
        );
        if eligibility.is_empty() {
            return Err(AllocationError::NoEligibleStudents {
                exam: ExamSnapshot {
                    subject: exam.subject.clone(),
                    subject_code: exam.subject_code.clone(),
                    department: exam.department.clone(),
                    semester: exam.semester.clone(),
                    date: day,
                    time: exam.time,
                },
                query,
                candidates: eligibility.candidates,
                after_date_filter: eligibility.on_day,
            });
        }

        // Non-conflicting rooms
        let rooms = repo
            .find_rooms(&RoomFilter::active_of_type(room_type))
            .await?;
        let conflicting = repo
            .find_exams(&ExamFilter::slot(day, exam.time).excluding(exam.id))
            .await?;
        let occupied = if conflicting.is_empty() {
            Default::default()
        } else {
            let allocations = repo
                .find_allocations(&AllocationFilter::for_exams(conflicting.iter().map(|e| e.id)))
                .await?;
            occupied_room_ids(&allocations)
        };
        let available = select_rooms(rooms, &occupied).map_err(|shortage| match shortage {
            RoomShortage::MissingRoomType => AllocationError::MissingRoomType { room_type },
            RoomShortage::AllOccupied { occupied } => AllocationError::AllOccupied {
                room_type,
                date: day,
                time: exam.time,
                occupied_rooms: occupied.iter().map(RoomSummary::from).collect(),
                conflicting_exams: conflicting.iter().map(ConflictingExam::from).collect(),
            },
        })?;
        info!(
            "Available {} rooms after conflict check: {} ({} occupied in slot)",
            room_type,
            available.len(),
            occupied.len()
        );

        // Plan and persist
        let student_ids: Vec<StudentId> = eligibility.students.iter().map(|s| s.id).collect();
        let plan = plan_seats(&student_ids, &available).map_err(|shortfall| {
            AllocationError::InsufficientCapacity {
                room_type,
                shortfall,
            }
        })?;

        let records: Vec<NewSeatAllocation> = plan
            .seats
            .iter()
            .map(|seat| NewSeatAllocation {
                student: seat.student,
                exam: exam.id,
                room: seat.room,
                seat_number: seat.seat_number.clone(),
            })
            .collect();
        let outcome = repo.replace_allocations_for_exam(exam.id, &records).await?;
        info!(
            "Cleared {} existing allocations, created {}",
            outcome.deleted,
            outcome.inserted.len()
        );

        let students: HashMap<StudentId, &Student> =
            eligibility.students.iter().map(|s| (s.id, s)).collect();
        let rooms: HashMap<RoomId, &Room> = available.iter().map(|r| (r.id, r)).collect();
        let mut allocations = join_assignments(&outcome.inserted, &students, &rooms);
        sort_by_room_and_seat(&mut allocations);

        Ok(AllocationResult {
            exam_id: exam.id,
            stats: AllocationStats {
                total_students: eligibility.on_day,
                unique_students: eligibility.students.len(),
                rooms_used: plan.rooms_used,
                seats_allocated: outcome.inserted.len(),
                remaining_capacity: plan.remaining_capacity(),
            },
            exam_details: ExamDetails::new(&exam, day),
            allocations,
        })
    }

    /// Stored allocations, optionally for one exam, joined with their student
    /// and room. Allocations whose student or room no longer exists are skipped.
    pub async fn allocations(
        &self,
        exam: Option<ExamId>,
    ) -> Result<Vec<SeatAssignment>, AllocationError> {
        let repo = self.repo.as_ref();
        let filter = exam.map(AllocationFilter::for_exam).unwrap_or_default();
        let stored = repo.find_allocations(&filter).await?;

        let mut students = HashMap::new();
        let mut rooms = HashMap::new();
        for allocation in &stored {
            if let std::collections::hash_map::Entry::Vacant(slot) =
                students.entry(allocation.student)
            {
                if let Some(student) = repo.find_student(allocation.student).await? {
                    slot.insert(student);
                }
            }
            if let std::collections::hash_map::Entry::Vacant(slot) = rooms.entry(allocation.room)
            {
                if let Some(room) = repo.find_room(allocation.room).await? {
                    slot.insert(room);
                }
            }
        }

        let students: HashMap<StudentId, &Student> =
            students.iter().map(|(id, s)| (*id, s)).collect();
        let rooms: HashMap<RoomId, &Room> = rooms.iter().map(|(id, r)| (*id, r)).collect();
        Ok(join_assignments(&stored, &students, &rooms))
    }

    /// Remove every allocation of an exam; serialized with allocation runs.
    pub async fn clear_exam(&self, exam_id: ExamId) -> Result<usize, AllocationError> {
        let _guard = self.locks.acquire(exam_id).await;
        let deleted = self.repo.delete_allocations_for_exam(exam_id).await?;
        info!("Cleared {} allocations for exam {}", deleted, exam_id);
        Ok(deleted)
    }

    /// Remove one allocation.
    pub async fn delete_allocation(
        &self,
        id: SeatAllocationId,
    ) -> Result<SeatAllocation, RepositoryError> {
        let removed = self.repo.delete_allocation(id).await?;
        info!(
            "Deleted allocation {} (exam {}, seat {})",
            removed.id, removed.exam, removed.seat_number
        );
        Ok(removed)
    }
}

fn join_assignments(
    stored: &[SeatAllocation],
    students: &HashMap<StudentId, &Student>,
    rooms: &HashMap<RoomId, &Room>,
) -> Vec<SeatAssignment> {
    stored
        .iter()
        .filter_map(|a| {
            let (Some(student), Some(room)) = (students.get(&a.student), rooms.get(&a.room))
            else {
                warn!(
                    "Allocation {} references a missing student or room; skipped",
                    a.id
                );
                return None;
            };
            Some(SeatAssignment {
                id: a.id,
                exam: a.exam,
                student: StudentSummary::from(*student),
                room: RoomSummary::from(*room),
                seat_number: a.seat_number.clone(),
            })
        })
        .collect()
}

/// Labels that do not parse sort after every valid label.
fn seat_position(label: &str) -> usize {
    seat_index(label).unwrap_or(usize::MAX)
}

/// Room number, then seat position (A1, A2, ..., A10, B1).
fn sort_by_room_and_seat(assignments: &mut [SeatAssignment]) {
    assignments.sort_by(|a, b| {
        a.room
            .room_no
            .cmp(&b.room.room_no)
            .then_with(|| seat_position(&a.seat_number).cmp(&seat_position(&b.seat_number)))
    });
}
