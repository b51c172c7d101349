//! Seat, invigilation duty and attendance records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::calendar::CalendarDay;
use super::exam::ExamSession;
use crate::api::{
    AttendanceId, ExamId, FacultyAllocationId, RoomId, SeatAllocationId, StudentId,
};

/// One student seated in one room for one exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatAllocation {
    pub id: SeatAllocationId,
    pub student: StudentId,
    pub exam: ExamId,
    pub room: RoomId,
    pub seat_number: String,
    pub allocated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NewSeatAllocation {
    pub student: StudentId,
    pub exam: ExamId,
    pub room: RoomId,
    pub seat_number: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DutyRole {
    #[default]
    Invigilator,
    ChiefInvigilator,
    Supervisor,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Designation {
    #[default]
    #[serde(alias = "Faculty")]
    Faculty,
    #[serde(alias = "lab technician", alias = "Lab Technician")]
    LabTechnician,
}

/// A faculty member's invigilation duty in one room for one exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacultyAllocation {
    pub id: FacultyAllocationId,
    pub faculty_id: String,
    pub faculty_name: String,
    pub designation: Designation,
    pub role: DutyRole,
    pub email: String,
    pub exam: ExamId,
    pub room: RoomId,
    pub allocated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFacultyAllocation {
    pub faculty_id: String,
    pub faculty_name: String,
    #[serde(default)]
    pub designation: Designation,
    #[serde(default)]
    pub role: DutyRole,
    pub email: String,
    pub exam: ExamId,
    pub room: RoomId,
}

/// Partial update of a duty; absent fields keep their stored values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacultyAllocationPatch {
    #[serde(default)]
    pub faculty_id: Option<String>,
    #[serde(default)]
    pub faculty_name: Option<String>,
    #[serde(default)]
    pub designation: Option<Designation>,
    #[serde(default)]
    pub role: Option<DutyRole>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub exam: Option<ExamId>,
    #[serde(default)]
    pub room: Option<RoomId>,
}

impl FacultyAllocationPatch {
    pub fn apply_to(&self, duty: &FacultyAllocation) -> NewFacultyAllocation {
        NewFacultyAllocation {
            faculty_id: self
                .faculty_id
                .clone()
                .unwrap_or_else(|| duty.faculty_id.clone()),
            faculty_name: self
                .faculty_name
                .clone()
                .unwrap_or_else(|| duty.faculty_name.clone()),
            designation: self.designation.unwrap_or(duty.designation),
            role: self.role.unwrap_or(duty.role),
            email: self.email.clone().unwrap_or_else(|| duty.email.clone()),
            exam: self.exam.unwrap_or(duty.exam),
            room: self.room.unwrap_or(duty.room),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    #[default]
    Present,
    Absent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Malpractice {
    pub reported: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reported_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invigilator {
    pub faculty_id: String,
    pub faculty_name: String,
}

/// Outcome for one student at one exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendance {
    pub id: AttendanceId,
    pub student: StudentId,
    pub exam: ExamId,
    pub room: RoomId,
    pub invigilator: Invigilator,
    pub status: AttendanceStatus,
    pub malpractice: Malpractice,
    pub exam_day: CalendarDay,
    pub exam_time: ExamSession,
    pub marked_at: DateTime<Utc>,
}

/// Upsert payload keyed by (student, exam).
///
/// `status` and `malpractice` are only overwritten when provided, so a
/// malpractice report does not reset a previously marked absence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceUpdate {
    pub student: StudentId,
    pub exam: ExamId,
    pub room: RoomId,
    pub invigilator: Invigilator,
    pub status: Option<AttendanceStatus>,
    pub malpractice: Option<Malpractice>,
    pub exam_day: CalendarDay,
    pub exam_time: ExamSession,
}
