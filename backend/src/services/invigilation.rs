//! Invigilator rosters, attendance marking and malpractice reports.

use std::collections::HashMap;

use chrono::{DateTime, Timelike, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::algorithms::seat_index;
use crate::api::{
    ExamDetails, ExamId, FacultyInfo, InvigilatorRoster, RoomId, RoomSummary, RosterAttendance,
    RosterEntry, RosterSummary, SlotAttendance, StudentId, StudentSummary,
};
use crate::db::repository::{
    AllocationFilter, ExamFilter, FacultyAllocationFilter, FullRepository, RepositoryError,
};
use crate::models::{
    Attendance, AttendanceStatus, AttendanceUpdate, CalendarDay, Exam, ExamSession, Invigilator,
    Malpractice,
};

#[derive(Debug, thiserror::Error)]
pub enum DutyError {
    #[error("{0}")]
    Invalid(String),

    #[error("{message}")]
    NotFound { message: String, details: Value },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl DutyError {
    fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            details: Value::Null,
        }
    }

    pub fn details(&self) -> Value {
        match self {
            Self::NotFound { details, .. } => details.clone(),
            _ => Value::Null,
        }
    }
}

/// Body of a mark-attendance request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttendanceRequest {
    #[serde(default, alias = "studentId")]
    pub student_id: Option<StudentId>,
    #[serde(default, alias = "examId")]
    pub exam_id: Option<ExamId>,
    #[serde(default, alias = "roomId")]
    pub room_id: Option<RoomId>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "facultyId")]
    pub faculty_id: Option<String>,
    #[serde(default, alias = "facultyName")]
    pub faculty_name: Option<String>,
}

/// Body of a malpractice report. `room_id` may be omitted when the student
/// is seated for the exam or already has an attendance record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MalpracticeRequest {
    #[serde(default, alias = "studentId")]
    pub student_id: Option<StudentId>,
    #[serde(default, alias = "examId")]
    pub exam_id: Option<ExamId>,
    #[serde(default, alias = "roomId")]
    pub room_id: Option<RoomId>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "facultyId")]
    pub faculty_id: Option<String>,
    #[serde(default, alias = "facultyName")]
    pub faculty_name: Option<String>,
}

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_status(raw: &str) -> Result<AttendanceStatus, DutyError> {
    match raw.trim().to_lowercase().as_str() {
        "present" => Ok(AttendanceStatus::Present),
        "absent" => Ok(AttendanceStatus::Absent),
        other => Err(DutyError::Invalid(format!(
            "status must be 'present' or 'absent', got '{}'",
            other
        ))),
    }
}

async fn exam_with_day<R: FullRepository + ?Sized>(
    repo: &R,
    id: ExamId,
) -> Result<(Exam, CalendarDay), DutyError> {
    let exam = repo
        .find_exam(id)
        .await?
        .ok_or_else(|| DutyError::not_found("Exam not found"))?;
    let day = exam.calendar_day().map_err(|e| {
        DutyError::Invalid(format!("Exam {} has an unusable date: {}", exam.id, e))
    })?;
    Ok((exam, day))
}

/// Build the room roster for a faculty member's duty in one slot.
///
/// `day` defaults to the UTC date of `now`; `time` to the session in progress
/// at `now`.
pub async fn invigilator_roster<R: FullRepository + ?Sized>(
    repo: &R,
    faculty_id: &str,
    day: Option<CalendarDay>,
    time: Option<ExamSession>,
    now: DateTime<Utc>,
) -> Result<InvigilatorRoster, DutyError> {
    let faculty_id = faculty_id.trim();
    if faculty_id.is_empty() {
        return Err(DutyError::Invalid("Faculty ID is required".to_string()));
    }
    let day = day.unwrap_or_else(|| CalendarDay::from(now.date_naive()));
    let time = time.unwrap_or_else(|| ExamSession::for_hour(now.hour()));
    debug!("Roster lookup: faculty {} on {} {}", faculty_id, day, time);

    let duties = repo
        .find_faculty_allocations(&FacultyAllocationFilter {
            faculty_id: Some(faculty_id.to_string()),
            exams: None,
        })
        .await?;

    let mut known = Vec::with_capacity(duties.len());
    let mut matched = None;
    for duty in &duties {
        let exam = repo.find_exam(duty.exam).await?;
        let room = repo.find_room(duty.room).await?;
        let exam_day = exam.as_ref().and_then(|e| e.calendar_day().ok());
        known.push(json!({
            "subject": exam.as_ref().map(|e| e.subject.clone()),
            "date": exam_day.map_or_else(|| "No date".to_string(), |d| d.to_string()),
            "time": exam.as_ref().map(|e| e.time),
            "room": room.as_ref().map(|r| r.room_no.clone()),
        }));
        if matched.is_some() {
            continue;
        }
        if let (Some(exam), Some(room)) = (exam, room) {
            if exam_day == Some(day) && exam.time == time {
                matched = Some((duty, exam, room));
            }
        }
    }

    let Some((duty, exam, room)) = matched else {
        warn!(
            "No duty for faculty {} on {} {} ({} duties on record)",
            faculty_id,
            day,
            time,
            duties.len()
        );
        return Err(DutyError::NotFound {
            message: "No room allocation found for this faculty on the specified date and time"
                .to_string(),
            details: json!({
                "faculty_id": faculty_id,
                "date": day,
                "time": time,
                "total_allocations": duties.len(),
                "available_allocations": known,
            }),
        });
    };

    let mut seats = repo
        .find_allocations(&AllocationFilter::for_exam(exam.id).in_room(room.id))
        .await?;
    seats.sort_by(|a, b| {
        seat_index(&a.seat_number)
            .unwrap_or(usize::MAX)
            .cmp(&seat_index(&b.seat_number).unwrap_or(usize::MAX))
            .then_with(|| a.seat_number.cmp(&b.seat_number))
    });

    let student_ids: Vec<StudentId> = seats.iter().map(|s| s.student).collect();
    let attendance: HashMap<StudentId, Attendance> = repo
        .find_attendance(exam.id, Some(student_ids.as_slice()))
        .await?
        .into_iter()
        .map(|a| (a.student, a))
        .collect();

    let mut students = Vec::with_capacity(seats.len());
    for seat in &seats {
        let Some(student) = repo.find_student(seat.student).await? else {
            warn!(
                "Seat {} in room {} references missing student {}",
                seat.seat_number, room.room_no, seat.student
            );
            continue;
        };
        students.push(RosterEntry {
            allocation: seat.id,
            student: StudentSummary::from(&student),
            seat_number: seat.seat_number.clone(),
            attendance: attendance
                .get(&seat.student)
                .map(RosterAttendance::from)
                .unwrap_or_default(),
        });
    }

    let summary = RosterSummary {
        total_students: students.len(),
        present_count: students
            .iter()
            .filter(|s| s.attendance.status == AttendanceStatus::Present)
            .count(),
        absent_count: students
            .iter()
            .filter(|s| s.attendance.status == AttendanceStatus::Absent)
            .count(),
        malpractice_count: students
            .iter()
            .filter(|s| s.attendance.malpractice.reported)
            .count(),
    };
    info!(
        "Roster for faculty {}: exam {} room {} - {} students",
        faculty_id, exam.id, room.room_no, summary.total_students
    );

    Ok(InvigilatorRoster {
        faculty: FacultyInfo {
            faculty_id: duty.faculty_id.clone(),
            faculty_name: duty.faculty_name.clone(),
            role: duty.role,
        },
        exam: ExamDetails::new(&exam, day),
        exam_id: exam.id,
        room: RoomSummary::from(&room),
        students,
        summary,
        date: day,
        time,
    })
}

/// Record a student's presence or absence; one record per (student, exam).
pub async fn mark_attendance<R: FullRepository + ?Sized>(
    repo: &R,
    request: &AttendanceRequest,
) -> Result<Attendance, DutyError> {
    let (
        Some(student),
        Some(exam_id),
        Some(room),
        Some(status),
        Some(faculty_id),
        Some(faculty_name),
    ) = (
        request.student_id,
        request.exam_id,
        request.room_id,
        present(&request.status),
        present(&request.faculty_id),
        present(&request.faculty_name),
    ) else {
        return Err(DutyError::Invalid("All fields are required".to_string()));
    };
    let status = parse_status(&status)?;
    let (exam, day) = exam_with_day(repo, exam_id).await?;

    let record = repo
        .upsert_attendance(&AttendanceUpdate {
            student,
            exam: exam.id,
            room,
            invigilator: Invigilator {
                faculty_id,
                faculty_name,
            },
            status: Some(status),
            malpractice: None,
            exam_day: day,
            exam_time: exam.time,
        })
        .await?;
    info!(
        "Attendance marked: student {} exam {} {:?}",
        record.student, record.exam, record.status
    );
    Ok(record)
}

/// Flag malpractice for a student; a missing attendance record is created as
/// present, an existing one keeps its status.
pub async fn report_malpractice<R: FullRepository + ?Sized>(
    repo: &R,
    request: &MalpracticeRequest,
    now: DateTime<Utc>,
) -> Result<Attendance, DutyError> {
    let (
        Some(student),
        Some(exam_id),
        Some(description),
        Some(faculty_id),
        Some(faculty_name),
    ) = (
        request.student_id,
        request.exam_id,
        present(&request.description),
        present(&request.faculty_id),
        present(&request.faculty_name),
    ) else {
        return Err(DutyError::Invalid("All fields are required".to_string()));
    };
    let (exam, day) = exam_with_day(repo, exam_id).await?;

    let existing = repo
        .find_attendance(exam.id, Some(std::slice::from_ref(&student)))
        .await?
        .into_iter()
        .next();
    let room = match (request.room_id, &existing) {
        (Some(room), _) => room,
        (None, Some(record)) => record.room,
        (None, None) => repo
            .find_allocations(&AllocationFilter::for_exam(exam.id))
            .await?
            .into_iter()
            .find(|a| a.student == student)
            .map(|a| a.room)
            .ok_or_else(|| {
                DutyError::Invalid(format!(
                    "room_id is required: student {} has no seat for exam {}",
                    student, exam.id
                ))
            })?,
    };

    let record = repo
        .upsert_attendance(&AttendanceUpdate {
            student,
            exam: exam.id,
            room,
            invigilator: Invigilator {
                faculty_id,
                faculty_name,
            },
            status: None,
            malpractice: Some(Malpractice {
                reported: true,
                description,
                reported_at: Some(now),
            }),
            exam_day: day,
            exam_time: exam.time,
        })
        .await?;
    warn!(
        "Malpractice reported: student {} exam {} by {}",
        record.student, record.exam, record.invigilator.faculty_id
    );
    Ok(record)
}

/// Attendance records marked by a faculty member, newest exam day first.
///
/// Covers the exams the faculty member has duties for, or only `exam` when
/// given. `slot` narrows to one exam day and session.
pub async fn attendance_report<R: FullRepository + ?Sized>(
    repo: &R,
    faculty_id: &str,
    exam: Option<ExamId>,
    slot: Option<(CalendarDay, ExamSession)>,
) -> Result<Vec<Attendance>, DutyError> {
    let exams: Vec<ExamId> = match exam {
        Some(exam) => vec![exam],
        None => {
            let mut exams: Vec<ExamId> = repo
                .find_faculty_allocations(&FacultyAllocationFilter {
                    faculty_id: Some(faculty_id.to_string()),
                    exams: None,
                })
                .await?
                .into_iter()
                .map(|d| d.exam)
                .collect();
            exams.sort();
            exams.dedup();
            exams
        }
    };

    let mut records = Vec::new();
    for exam in exams {
        records.extend(
            repo.find_attendance(exam, None)
                .await?
                .into_iter()
                .filter(|a| a.invigilator.faculty_id == faculty_id)
                .filter(|a| slot.is_none_or(|(d, t)| a.exam_day == d && a.exam_time == t)),
        );
    }
    records.sort_by(|a, b| {
        b.exam_day
            .cmp(&a.exam_day)
            .then(a.exam_time.cmp(&b.exam_time))
            .then(a.student.cmp(&b.student))
    });
    Ok(records)
}

/// Present, absent and malpractice counts for every active exam in a slot.
pub async fn slot_attendance<R: FullRepository + ?Sized>(
    repo: &R,
    day: CalendarDay,
    time: ExamSession,
) -> Result<Vec<SlotAttendance>, DutyError> {
    let exams = repo.find_exams(&ExamFilter::slot(day, time)).await?;
    let mut totals = Vec::with_capacity(exams.len());
    for exam in exams {
        let seated = repo
            .find_allocations(&AllocationFilter::for_exam(exam.id))
            .await?;
        let records = repo.find_attendance(exam.id, None).await?;
        let absent_count = records
            .iter()
            .filter(|r| r.status == AttendanceStatus::Absent)
            .count();
        let summary = RosterSummary {
            total_students: seated.len(),
            present_count: seated.len().saturating_sub(absent_count),
            absent_count,
            malpractice_count: records.iter().filter(|r| r.malpractice.reported).count(),
        };
        totals.push(SlotAttendance {
            exam_id: exam.id,
            subject_code: exam.subject_code,
            department: exam.department,
            semester: exam.semester,
            summary,
        });
    }
    debug!("Attendance for {} {}: {} exams", day, time, totals.len());
    Ok(totals)
}
