//! In-memory local repository implementation.
//!
//! This module provides a local implementation of all repository traits
//! suitable for unit testing and local development. Collections live in
//! ordered maps and vectors behind a single `RwLock`, so every multi-record
//! write is applied under one guard and is atomic for readers.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::api::{
    AttendanceId, ExamId, FacultyAllocationId, RoomId, SeatAllocationId, StudentId,
};
use crate::db::repository::*;
use crate::models::{
    Attendance, AttendanceUpdate, Exam, ExamDraft, FacultyAllocation, NewFacultyAllocation,
    NewSeatAllocation, Room, RoomDraft, SeatAllocation, Student, StudentDraft,
};

/// In-memory local repository.
///
/// Cloning is cheap and clones share the same data.
///
/// # Example
/// ```
/// use exam_seating::db::repositories::LocalRepository;
/// use exam_seating::db::repository::{RoomFilter, RoomRepository};
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// let rooms = rt
///     .block_on(async { LocalRepository::new().find_rooms(&RoomFilter::active()).await })
///     .unwrap();
/// assert!(rooms.is_empty());
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    exams: BTreeMap<ExamId, Exam>,
    rooms: BTreeMap<RoomId, Room>,
    students: BTreeMap<StudentId, Student>,
    allocations: Vec<SeatAllocation>,
    faculty_allocations: Vec<FacultyAllocation>,
    attendance: Vec<Attendance>,

    // ID counters
    next_exam_id: i64,
    next_room_id: i64,
    next_student_id: i64,
    next_allocation_id: i64,
    next_faculty_allocation_id: i64,
    next_attendance_id: i64,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            exams: BTreeMap::new(),
            rooms: BTreeMap::new(),
            students: BTreeMap::new(),
            allocations: Vec::new(),
            faculty_allocations: Vec::new(),
            attendance: Vec::new(),
            next_exam_id: 1,
            next_room_id: 1,
            next_student_id: 1,
            next_allocation_id: 1,
            next_faculty_allocation_id: 1,
            next_attendance_id: 1,
            is_healthy: true,
        }
    }
}

fn take_id(counter: &mut i64) -> i64 {
    let id = *counter;
    *counter += 1;
    id
}

impl LocalData {
    fn next_exam(&mut self) -> ExamId {
        ExamId::new(take_id(&mut self.next_exam_id))
    }

    fn next_room(&mut self) -> RoomId {
        RoomId::new(take_id(&mut self.next_room_id))
    }

    fn next_student(&mut self) -> StudentId {
        StudentId::new(take_id(&mut self.next_student_id))
    }

    fn next_allocation(&mut self) -> SeatAllocationId {
        SeatAllocationId::new(take_id(&mut self.next_allocation_id))
    }

    /// Exam matching a draft's key, preferring an active one.
    fn exam_with_key(&self, draft: &ExamDraft) -> Option<ExamId> {
        let key = draft.key();
        let mut matching = self
            .exams
            .values()
            .filter(|e| e.key().as_ref() == Some(&key));
        let first = matching.next()?;
        if first.active {
            return Some(first.id);
        }
        Some(
            matching
                .find(|e| e.active)
                .map(|e| e.id)
                .unwrap_or(first.id),
        )
    }

    fn room_no_taken(&self, room_no: &str) -> bool {
        self.rooms.values().any(|r| r.room_no == room_no)
    }

    fn student_with_reg_no(&self, reg_no: &str) -> Option<StudentId> {
        self.students
            .values()
            .find(|s| s.reg_no == reg_no)
            .map(|s| s.id)
    }

    fn push_allocations(&mut self, records: &[NewSeatAllocation]) -> Vec<SeatAllocation> {
        let now = Utc::now();
        let mut inserted = Vec::with_capacity(records.len());
        for record in records {
            let stored = SeatAllocation {
                id: self.next_allocation(),
                student: record.student,
                exam: record.exam,
                room: record.room,
                seat_number: record.seat_number.clone(),
                allocated_at: now,
            };
            inserted.push(stored.clone());
            self.allocations.push(stored);
        }
        inserted
    }
}

/// Check a batch against the allocations that will remain beside it.
///
/// Both uniqueness rules are enforced across `existing` and within the batch.
fn check_allocation_constraints<'a>(
    existing: impl Iterator<Item = &'a SeatAllocation>,
    records: &[NewSeatAllocation],
) -> RepositoryResult<()> {
    let mut seats: HashSet<(ExamId, RoomId, String)> = HashSet::new();
    let mut students: HashSet<(StudentId, ExamId)> = HashSet::new();
    for a in existing {
        seats.insert((a.exam, a.room, a.seat_number.clone()));
        students.insert((a.student, a.exam));
    }

    for record in records {
        if !students.insert((record.student, record.exam)) {
            return Err(RepositoryError::constraint(
                ConstraintKind::DuplicateStudentAssignment,
                format!(
                    "student {} already holds a seat for exam {}",
                    record.student, record.exam
                ),
            )
            .with_entity("student", record.student));
        }
        if !seats.insert((record.exam, record.room, record.seat_number.clone())) {
            return Err(RepositoryError::constraint(
                ConstraintKind::DuplicateSeat,
                format!(
                    "seat {} in room {} is already taken for exam {}",
                    record.seat_number, record.room, record.exam
                ),
            )
            .with_entity("room", record.room));
        }
    }
    Ok(())
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }

    /// Store an exam document as-is, bypassing validation.
    ///
    /// Used to load legacy records (e.g. dates that no longer parse). The id
    /// is overwritten.
    pub fn insert_exam_record(&self, mut exam: Exam) -> ExamId {
        let mut data = self.data.write();
        exam.id = data.next_exam();
        let id = exam.id;
        data.exams.insert(id, exam);
        id
    }

    /// Store a student document as-is, bypassing validation and uniqueness.
    pub fn insert_student_record(&self, mut student: Student) -> StudentId {
        let mut data = self.data.write();
        student.id = data.next_student();
        let id = student.id;
        data.students.insert(id, student);
        id
    }

    /// Get the number of seat allocations stored.
    pub fn allocation_count(&self) -> usize {
        self.data.read().allocations.len()
    }

    /// Helper to check health and return error if unhealthy.
    fn check_health(&self) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::connection("Store is not healthy"));
        }
        Ok(())
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

// ==================== Exams ====================

#[async_trait]
impl ExamRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn find_exam(&self, id: ExamId) -> RepositoryResult<Option<Exam>> {
        self.check_health()?;
        Ok(self.data.read().exams.get(&id).cloned())
    }

    async fn find_exams(&self, filter: &ExamFilter) -> RepositoryResult<Vec<Exam>> {
        self.check_health()?;
        let data = self.data.read();
        let mut exams: Vec<Exam> = data
            .exams
            .values()
            .filter(|e| !filter.active_only || e.active)
            .filter(|e| filter.exclude != Some(e.id))
            .filter(|e| filter.time.is_none_or(|t| e.time == t))
            .filter(|e| {
                filter
                    .day
                    .is_none_or(|day| e.calendar_day().ok() == Some(day))
            })
            .cloned()
            .collect();
        exams.sort_by_key(|e| {
            let day = e.calendar_day().ok();
            (day.is_none(), day, e.time, e.id)
        });
        Ok(exams)
    }

    async fn create_exam(&self, draft: &ExamDraft) -> RepositoryResult<Exam> {
        self.check_health()?;
        let mut data = self.data.write();
        let key = draft.key();
        if data
            .exams
            .values()
            .any(|e| e.active && e.key().as_ref() == Some(&key))
        {
            return Err(RepositoryError::constraint(
                ConstraintKind::DuplicateExamSlot,
                format!("an active exam already exists for {}", key),
            )
            .with_operation("create_exam"));
        }
        let id = data.next_exam();
        let exam = draft.clone().into_exam(id);
        data.exams.insert(id, exam.clone());
        Ok(exam)
    }

    async fn update_exam(&self, id: ExamId, draft: &ExamDraft) -> RepositoryResult<Exam> {
        self.check_health()?;
        let mut data = self.data.write();
        let key = draft.key();
        if data
            .exams
            .values()
            .any(|e| e.id != id && e.active && e.key().as_ref() == Some(&key))
        {
            return Err(RepositoryError::constraint(
                ConstraintKind::DuplicateExamSlot,
                format!("an active exam already exists for {}", key),
            )
            .with_operation("update_exam"));
        }
        let exam = data.exams.get_mut(&id).ok_or_else(|| {
            RepositoryError::not_found(format!("Exam {} not found", id))
                .with_entity("exam", id)
        })?;
        let active = exam.active;
        *exam = Exam {
            active,
            ..draft.clone().into_exam(id)
        };
        Ok(exam.clone())
    }

    async fn deactivate_exam(&self, id: ExamId) -> RepositoryResult<Exam> {
        self.check_health()?;
        let mut data = self.data.write();
        let exam = data.exams.get_mut(&id).ok_or_else(|| {
            RepositoryError::not_found(format!("Exam {} not found", id))
                .with_entity("exam", id)
        })?;
        exam.active = false;
        Ok(exam.clone())
    }

    async fn upsert_exams(&self, drafts: &[ExamDraft]) -> RepositoryResult<ExamUpsertSummary> {
        self.check_health()?;
        let mut data = self.data.write();
        let mut summary = ExamUpsertSummary::default();

        for draft in drafts {
            match data.exam_with_key(draft) {
                None => {
                    let id = data.next_exam();
                    let exam = draft.clone().into_exam(id);
                    data.exams.insert(id, exam.clone());
                    summary.inserted.push(exam);
                }
                Some(id) => {
                    let Some(exam) = data.exams.get_mut(&id) else {
                        return Err(RepositoryError::internal(format!(
                            "exam {} vanished during upsert",
                            id
                        )));
                    };
                    let was_active = exam.active;
                    exam.subject = draft.subject.clone();
                    exam.exam_type = draft.exam_type;
                    exam.active = true;
                    if was_active {
                        summary.updated += 1;
                    } else {
                        summary.reactivated.push(exam.clone());
                    }
                }
            }
        }
        Ok(summary)
    }
}

// ==================== Rooms ====================

#[async_trait]
impl RoomRepository for LocalRepository {
    async fn find_room(&self, id: RoomId) -> RepositoryResult<Option<Room>> {
        self.check_health()?;
        Ok(self.data.read().rooms.get(&id).cloned())
    }

    async fn find_rooms(&self, filter: &RoomFilter) -> RepositoryResult<Vec<Room>> {
        self.check_health()?;
        let data = self.data.read();
        let mut rooms: Vec<Room> = data
            .rooms
            .values()
            .filter(|r| !filter.active_only || r.active)
            .filter(|r| filter.room_type.is_none_or(|t| r.room_type == t))
            .cloned()
            .collect();
        rooms.sort_by(|a, b| a.room_no.cmp(&b.room_no).then(a.id.cmp(&b.id)));
        Ok(rooms)
    }

    async fn create_room(&self, draft: &RoomDraft) -> RepositoryResult<Room> {
        self.check_health()?;
        let mut data = self.data.write();
        if data.room_no_taken(&draft.room_no) {
            return Err(RepositoryError::constraint(
                ConstraintKind::DuplicateRoomNumber,
                format!("room number {} already exists", draft.room_no),
            )
            .with_operation("create_room"));
        }
        let id = data.next_room();
        let room = draft.clone().into_room(id);
        data.rooms.insert(id, room.clone());
        Ok(room)
    }

    async fn create_rooms(&self, drafts: &[RoomDraft]) -> RepositoryResult<BulkRoomOutcome> {
        self.check_health()?;
        let mut data = self.data.write();
        let mut outcome = BulkRoomOutcome::default();
        for draft in drafts {
            if data.room_no_taken(&draft.room_no) {
                outcome.duplicates.push(draft.room_no.clone());
                continue;
            }
            let id = data.next_room();
            let room = draft.clone().into_room(id);
            data.rooms.insert(id, room.clone());
            outcome.created.push(room);
        }
        Ok(outcome)
    }

    async fn update_room(&self, id: RoomId, draft: &RoomDraft) -> RepositoryResult<Room> {
        self.check_health()?;
        let mut data = self.data.write();
        if data
            .rooms
            .values()
            .any(|r| r.id != id && r.room_no == draft.room_no)
        {
            return Err(RepositoryError::constraint(
                ConstraintKind::DuplicateRoomNumber,
                format!("room number {} already exists", draft.room_no),
            )
            .with_operation("update_room"));
        }
        let room = data.rooms.get_mut(&id).ok_or_else(|| {
            RepositoryError::not_found(format!("Room {} not found", id)).with_entity("room", id)
        })?;
        let active = room.active;
        *room = Room {
            active,
            ..draft.clone().into_room(id)
        };
        Ok(room.clone())
    }

    async fn deactivate_room(&self, id: RoomId) -> RepositoryResult<Room> {
        self.check_health()?;
        let mut data = self.data.write();
        let room = data.rooms.get_mut(&id).ok_or_else(|| {
            RepositoryError::not_found(format!("Room {} not found", id)).with_entity("room", id)
        })?;
        room.active = false;
        Ok(room.clone())
    }
}

// ==================== Students ====================

#[async_trait]
impl StudentRepository for LocalRepository {
    async fn find_student(&self, id: StudentId) -> RepositoryResult<Option<Student>> {
        self.check_health()?;
        Ok(self.data.read().students.get(&id).cloned())
    }

    async fn find_students(&self, filter: &StudentFilter) -> RepositoryResult<Vec<Student>> {
        self.check_health()?;
        let data = self.data.read();
        let mut students: Vec<Student> = data
            .students
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        students.sort_by(|a, b| a.reg_no.cmp(&b.reg_no).then(a.id.cmp(&b.id)));
        Ok(students)
    }

    async fn create_student(&self, draft: &StudentDraft) -> RepositoryResult<Student> {
        self.check_health()?;
        let mut data = self.data.write();
        if data.student_with_reg_no(&draft.reg_no).is_some() {
            return Err(RepositoryError::constraint(
                ConstraintKind::DuplicateRegistration,
                format!("registration number {} already exists", draft.reg_no),
            )
            .with_operation("create_student"));
        }
        let id = data.next_student();
        let student = draft.clone().into_student(id);
        data.students.insert(id, student.clone());
        Ok(student)
    }

    async fn update_student(
        &self,
        id: StudentId,
        draft: &StudentDraft,
    ) -> RepositoryResult<Student> {
        self.check_health()?;
        let mut data = self.data.write();
        if data
            .student_with_reg_no(&draft.reg_no)
            .is_some_and(|other| other != id)
        {
            return Err(RepositoryError::constraint(
                ConstraintKind::DuplicateRegistration,
                format!("registration number {} already exists", draft.reg_no),
            )
            .with_operation("update_student"));
        }
        let student = data.students.get_mut(&id).ok_or_else(|| {
            RepositoryError::not_found(format!("Student {} not found", id))
                .with_entity("student", id)
        })?;
        let active = student.active;
        *student = Student {
            active,
            ..draft.clone().into_student(id)
        };
        Ok(student.clone())
    }

    async fn deactivate_student(&self, id: StudentId) -> RepositoryResult<Student> {
        self.check_health()?;
        let mut data = self.data.write();
        let student = data.students.get_mut(&id).ok_or_else(|| {
            RepositoryError::not_found(format!("Student {} not found", id))
                .with_entity("student", id)
        })?;
        student.active = false;
        Ok(student.clone())
    }

    async fn upsert_students(
        &self,
        drafts: &[StudentDraft],
    ) -> RepositoryResult<StudentUpsertOutcome> {
        self.check_health()?;
        let mut data = self.data.write();
        let mut outcome = StudentUpsertOutcome::default();
        let mut seen: HashSet<&str> = HashSet::new();
        for draft in drafts {
            if !seen.insert(draft.reg_no.as_str()) {
                outcome.duplicates.push(draft.reg_no.clone());
                continue;
            }
            match data.student_with_reg_no(&draft.reg_no) {
                None => {
                    let id = data.next_student();
                    let student = draft.clone().into_student(id);
                    data.students.insert(id, student.clone());
                    outcome.inserted.push(student);
                }
                Some(id) => {
                    let replacement = draft.clone().into_student(id);
                    let Some(student) = data.students.get_mut(&id) else {
                        return Err(RepositoryError::internal(format!(
                            "student {} vanished during upsert",
                            id
                        )));
                    };
                    if *student == replacement {
                        outcome.unchanged += 1;
                    } else {
                        *student = replacement;
                        outcome.updated.push(student.clone());
                    }
                }
            }
        }
        Ok(outcome)
    }
}

// ==================== Seat allocations ====================

#[async_trait]
impl SeatAllocationRepository for LocalRepository {
    async fn find_allocations(
        &self,
        filter: &AllocationFilter,
    ) -> RepositoryResult<Vec<SeatAllocation>> {
        self.check_health()?;
        Ok(self
            .data
            .read()
            .allocations
            .iter()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect())
    }

    async fn insert_allocations(
        &self,
        records: &[NewSeatAllocation],
    ) -> RepositoryResult<Vec<SeatAllocation>> {
        self.check_health()?;
        let mut data = self.data.write();
        check_allocation_constraints(data.allocations.iter(), records)
            .map_err(|e| e.with_operation("insert_allocations"))?;
        Ok(data.push_allocations(records))
    }

    async fn delete_allocations_for_exam(&self, exam: ExamId) -> RepositoryResult<usize> {
        self.check_health()?;
        let mut data = self.data.write();
        let before = data.allocations.len();
        data.allocations.retain(|a| a.exam != exam);
        Ok(before - data.allocations.len())
    }

    async fn delete_allocation(&self, id: SeatAllocationId) -> RepositoryResult<SeatAllocation> {
        self.check_health()?;
        let mut data = self.data.write();
        let index = data
            .allocations
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| {
                RepositoryError::not_found(format!("Seat allocation {} not found", id))
                    .with_entity("seat_allocation", id)
            })?;
        Ok(data.allocations.remove(index))
    }

    async fn replace_allocations_for_exam(
        &self,
        exam: ExamId,
        records: &[NewSeatAllocation],
    ) -> RepositoryResult<ReplaceOutcome> {
        self.check_health()?;
        if let Some(stray) = records.iter().find(|r| r.exam != exam) {
            return Err(RepositoryError::validation(format!(
                "record for exam {} in a replace for exam {}",
                stray.exam, exam
            ))
            .with_operation("replace_allocations_for_exam"));
        }

        let mut data = self.data.write();
        check_allocation_constraints(
            data.allocations.iter().filter(|a| a.exam != exam),
            records,
        )
        .map_err(|e| e.with_operation("replace_allocations_for_exam"))?;

        let before = data.allocations.len();
        data.allocations.retain(|a| a.exam != exam);
        let deleted = before - data.allocations.len();
        let inserted = data.push_allocations(records);
        Ok(ReplaceOutcome { deleted, inserted })
    }
}

// ==================== Duty & attendance ====================

#[async_trait]
impl DutyRepository for LocalRepository {
    async fn find_faculty_allocations(
        &self,
        filter: &FacultyAllocationFilter,
    ) -> RepositoryResult<Vec<FacultyAllocation>> {
        self.check_health()?;
        Ok(self
            .data
            .read()
            .faculty_allocations
            .iter()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect())
    }

    async fn create_faculty_allocation(
        &self,
        duty: &NewFacultyAllocation,
    ) -> RepositoryResult<FacultyAllocation> {
        self.check_health()?;
        let mut data = self.data.write();
        if data
            .faculty_allocations
            .iter()
            .any(|d| d.faculty_id == duty.faculty_id && d.exam == duty.exam)
        {
            return Err(RepositoryError::constraint(
                ConstraintKind::DuplicateFacultyDuty,
                format!(
                    "faculty {} is already allocated to exam {}",
                    duty.faculty_id, duty.exam
                ),
            )
            .with_operation("create_faculty_allocation"));
        }
        let stored = FacultyAllocation {
            id: FacultyAllocationId::new(take_id(&mut data.next_faculty_allocation_id)),
            faculty_id: duty.faculty_id.clone(),
            faculty_name: duty.faculty_name.clone(),
            designation: duty.designation,
            role: duty.role,
            email: duty.email.clone(),
            exam: duty.exam,
            room: duty.room,
            allocated_at: Utc::now(),
        };
        data.faculty_allocations.push(stored.clone());
        Ok(stored)
    }

    async fn update_faculty_allocation(
        &self,
        id: FacultyAllocationId,
        duty: &NewFacultyAllocation,
    ) -> RepositoryResult<FacultyAllocation> {
        self.check_health()?;
        let mut data = self.data.write();
        if data
            .faculty_allocations
            .iter()
            .any(|d| d.id != id && d.faculty_id == duty.faculty_id && d.exam == duty.exam)
        {
            return Err(RepositoryError::constraint(
                ConstraintKind::DuplicateFacultyDuty,
                format!(
                    "faculty {} is already allocated to exam {}",
                    duty.faculty_id, duty.exam
                ),
            )
            .with_operation("update_faculty_allocation"));
        }
        let stored = data
            .faculty_allocations
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| {
                RepositoryError::not_found(format!("Faculty allocation {} not found", id))
                    .with_entity("faculty_allocation", id)
            })?;
        stored.faculty_id = duty.faculty_id.clone();
        stored.faculty_name = duty.faculty_name.clone();
        stored.designation = duty.designation;
        stored.role = duty.role;
        stored.email = duty.email.clone();
        stored.exam = duty.exam;
        stored.room = duty.room;
        Ok(stored.clone())
    }

    async fn delete_faculty_allocations_for_exams(
        &self,
        exams: &[ExamId],
    ) -> RepositoryResult<usize> {
        self.check_health()?;
        let mut data = self.data.write();
        let before = data.faculty_allocations.len();
        data.faculty_allocations
            .retain(|d| !exams.contains(&d.exam));
        Ok(before - data.faculty_allocations.len())
    }

    async fn delete_faculty_allocation(
        &self,
        id: FacultyAllocationId,
    ) -> RepositoryResult<FacultyAllocation> {
        self.check_health()?;
        let mut data = self.data.write();
        let index = data
            .faculty_allocations
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| {
                RepositoryError::not_found(format!("Faculty allocation {} not found", id))
                    .with_entity("faculty_allocation", id)
            })?;
        Ok(data.faculty_allocations.remove(index))
    }

    async fn find_attendance(
        &self,
        exam: ExamId,
        students: Option<&[StudentId]>,
    ) -> RepositoryResult<Vec<Attendance>> {
        self.check_health()?;
        Ok(self
            .data
            .read()
            .attendance
            .iter()
            .filter(|a| a.exam == exam)
            .filter(|a| students.is_none_or(|ids| ids.contains(&a.student)))
            .cloned()
            .collect())
    }

    async fn upsert_attendance(&self, update: &AttendanceUpdate) -> RepositoryResult<Attendance> {
        self.check_health()?;
        let mut data = self.data.write();
        let now = Utc::now();

        if let Some(record) = data
            .attendance
            .iter_mut()
            .find(|a| a.student == update.student && a.exam == update.exam)
        {
            record.room = update.room;
            record.invigilator = update.invigilator.clone();
            record.exam_day = update.exam_day;
            record.exam_time = update.exam_time;
            if let Some(status) = update.status {
                record.status = status;
            }
            if let Some(malpractice) = &update.malpractice {
                record.malpractice = malpractice.clone();
            }
            record.marked_at = now;
            return Ok(record.clone());
        }

        let record = Attendance {
            id: AttendanceId::new(take_id(&mut data.next_attendance_id)),
            student: update.student,
            exam: update.exam,
            room: update.room,
            invigilator: update.invigilator.clone(),
            status: update.status.unwrap_or_default(),
            malpractice: update.malpractice.clone().unwrap_or_default(),
            exam_day: update.exam_day,
            exam_time: update.exam_time,
            marked_at: now,
        };
        data.attendance.push(record.clone());
        Ok(record)
    }
}
