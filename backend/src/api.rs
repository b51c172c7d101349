//! Public API surface for the seating backend.
//!
//! This file consolidates identifier types and the result types returned by
//! the service layer. All types derive Serialize/Deserialize for JSON.

use serde::{Deserialize, Serialize};

use crate::define_id_type;
use crate::models::{
    Attendance, AttendanceStatus, CalendarDay, DutyRole, Exam, ExamSession, Malpractice, Room,
    RoomType, Student,
};

define_id_type!(i64, ExamId);
define_id_type!(i64, RoomId);
define_id_type!(i64, StudentId);
define_id_type!(i64, SeatAllocationId);
define_id_type!(i64, FacultyAllocationId);
define_id_type!(i64, AttendanceId);

// =============================================================================
// Seat allocation
// =============================================================================

/// Student fields echoed back with a seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentSummary {
    pub id: StudentId,
    pub name: String,
    pub reg_no: String,
    pub department: String,
    pub semester: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl From<&Student> for StudentSummary {
    fn from(student: &Student) -> Self {
        Self {
            id: student.id,
            name: student.name.clone(),
            reg_no: student.reg_no.clone(),
            department: student.department.clone(),
            semester: student.semester.clone(),
            email: student.email.clone(),
        }
    }
}

/// Room fields echoed back with a seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub id: RoomId,
    pub room_no: String,
    pub block: String,
    pub floor_no: i32,
    pub capacity: u32,
    pub room_type: RoomType,
}

impl From<&Room> for RoomSummary {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id,
            room_no: room.room_no.clone(),
            block: room.block.clone(),
            floor_no: room.floor_no,
            capacity: room.capacity,
            room_type: room.room_type,
        }
    }
}

/// A persisted seat joined with its student and room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatAssignment {
    pub id: SeatAllocationId,
    pub exam: ExamId,
    pub student: StudentSummary,
    pub room: RoomSummary,
    pub seat_number: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationStats {
    /// Eligible students before de-duplication.
    pub total_students: usize,
    /// Eligible students after de-duplication by registration number.
    pub unique_students: usize,
    pub rooms_used: usize,
    pub seats_allocated: usize,
    /// Total capacity of the available rooms minus seats allocated.
    pub remaining_capacity: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamDetails {
    pub subject: String,
    pub subject_code: String,
    pub date: CalendarDay,
    pub time: ExamSession,
}

impl ExamDetails {
    pub fn new(exam: &Exam, date: CalendarDay) -> Self {
        Self {
            subject: exam.subject.clone(),
            subject_code: exam.subject_code.clone(),
            date,
            time: exam.time,
        }
    }
}

/// Outcome of a successful `allocate` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub exam_id: ExamId,
    pub allocations: Vec<SeatAssignment>,
    pub stats: AllocationStats,
    pub exam_details: ExamDetails,
}

// =============================================================================
// Room availability
// =============================================================================

/// Exam identity shown to operators when rooms are contested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictingExam {
    pub id: ExamId,
    pub subject: String,
    pub subject_code: String,
    pub department: String,
    pub semester: String,
}

impl From<&Exam> for ConflictingExam {
    fn from(exam: &Exam) -> Self {
        Self {
            id: exam.id,
            subject: exam.subject.clone(),
            subject_code: exam.subject_code.clone(),
            department: exam.department.clone(),
            semester: exam.semester.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomGroup {
    pub count: usize,
    pub total_capacity: u64,
    pub rooms: Vec<RoomSummary>,
}

impl RoomGroup {
    pub fn from_rooms<'a>(rooms: impl IntoIterator<Item = &'a Room>) -> Self {
        let rooms: Vec<RoomSummary> = rooms.into_iter().map(RoomSummary::from).collect();
        Self {
            count: rooms.len(),
            total_capacity: rooms.iter().map(|r| u64::from(r.capacity)).sum(),
            rooms,
        }
    }
}

/// Availability of every active room for one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomAvailabilityReport {
    pub date: CalendarDay,
    pub time: ExamSession,
    pub total_rooms: usize,
    pub available_rooms: RoomGroup,
    pub occupied_rooms: RoomGroup,
    pub conflicting_exams: Vec<ConflictingExam>,
}

// =============================================================================
// Invigilation
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacultyInfo {
    pub faculty_id: String,
    pub faculty_name: String,
    pub role: DutyRole,
}

/// Attendance as shown on the roster; defaults to present when unmarked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterAttendance {
    pub status: AttendanceStatus,
    pub malpractice: Malpractice,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<AttendanceId>,
}

impl From<&Attendance> for RosterAttendance {
    fn from(a: &Attendance) -> Self {
        Self {
            status: a.status,
            malpractice: a.malpractice.clone(),
            record: Some(a.id),
        }
    }
}

impl Default for RosterAttendance {
    fn default() -> Self {
        Self {
            status: AttendanceStatus::Present,
            malpractice: Malpractice::default(),
            record: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub allocation: SeatAllocationId,
    pub student: StudentSummary,
    pub seat_number: String,
    pub attendance: RosterAttendance,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSummary {
    pub total_students: usize,
    pub present_count: usize,
    pub absent_count: usize,
    pub malpractice_count: usize,
}

/// Room roster for an invigilator's duty in one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvigilatorRoster {
    pub faculty: FacultyInfo,
    pub exam: ExamDetails,
    pub exam_id: ExamId,
    pub room: RoomSummary,
    pub students: Vec<RosterEntry>,
    pub summary: RosterSummary,
    pub date: CalendarDay,
    pub time: ExamSession,
}

/// Attendance totals of one exam held in a slot.
///
/// Seated students without a record count as present, as on the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAttendance {
    pub exam_id: ExamId,
    pub subject_code: String,
    pub department: String,
    pub semester: String,
    pub summary: RosterSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_types() {
        let id = ExamId::new(42);
        assert_eq!(id.value(), 42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        let back: ExamId = serde_json::from_str("42").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_room_group_totals() {
        let rooms = vec![
            Room {
                id: RoomId::new(1),
                room_no: "A1".into(),
                floor_no: 0,
                block: "A".into(),
                capacity: 20,
                room_type: RoomType::Classroom,
                active: true,
            },
            Room {
                id: RoomId::new(2),
                room_no: "A2".into(),
                floor_no: 0,
                block: "A".into(),
                capacity: 35,
                room_type: RoomType::Classroom,
                active: true,
            },
        ];
        let group = RoomGroup::from_rooms(&rooms);
        assert_eq!(group.count, 2);
        assert_eq!(group.total_capacity, 55);
    }
}
