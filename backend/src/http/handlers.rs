//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer for business logic.

use std::collections::BTreeMap;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::Utc;

use super::dto::{
    AllocationRequest, AllocationResult, AttendanceReportQuery, AttendanceRequest,
    ClearAllocationsResponse, ClearFacultyRequest, DepartmentQuery, DepartmentStats,
    ExamBulkReport, ExamQuery, FacultyBulkResponse, HealthResponse, InvigilatorRoster,
    MalpracticeRequest, MessageResponse, RoomAvailabilityReport, RoomBulkReport, RosterQuery,
    SeatAssignment, SlotAttendance, SlotQuery, StudentBulkReport,
};
use super::error::AppError;
use super::state::AppState;
use crate::api::{ExamId, FacultyAllocationId, RoomId, SeatAllocationId, StudentId};
use crate::db::services as db_services;
use crate::models::{
    Attendance, CalendarDay, DateInput, Exam, ExamInput, ExamSession, FacultyAllocation,
    FacultyAllocationPatch, NewFacultyAllocation, Room, RoomInput, SeatAllocation, Student,
    StudentInput,
};
use crate::services;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Result type for handlers that create resources.
pub type CreatedResult<T> = Result<(StatusCode, Json<T>), AppError>;

fn parse_day(raw: &str) -> Result<CalendarDay, AppError> {
    DateInput::from_query(raw)
        .calendar_day()
        .map_err(|e| AppError::BadRequest(format!("Invalid date: {}", e)))
}

fn parse_session(raw: &str) -> Result<ExamSession, AppError> {
    raw.parse().map_err(AppError::BadRequest)
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the store is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Seating
// =============================================================================

/// POST /v1/seating/allocate
///
/// Allocate seats for an exam in rooms of one type, replacing any previous plan.
pub async fn allocate_seats(
    State(state): State<AppState>,
    payload: Result<Json<AllocationRequest>, JsonRejection>,
) -> CreatedResult<AllocationResult> {
    let Json(request) = payload?;
    let (exam_id, room_type) = request.validate()?;
    let result = state.seating.allocate(exam_id, room_type).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// GET /v1/seating/allocations
pub async fn list_allocations(
    State(state): State<AppState>,
    query: Result<Query<ExamQuery>, QueryRejection>,
) -> HandlerResult<Vec<SeatAssignment>> {
    let Query(query) = query?;
    Ok(Json(state.seating.allocations(query.exam_id).await?))
}

/// DELETE /v1/seating/allocations/{id}
pub async fn delete_allocation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<MessageResponse<SeatAllocation>> {
    let removed = state
        .seating
        .delete_allocation(SeatAllocationId::new(id))
        .await?;
    Ok(Json(MessageResponse::new(
        "Allocation deleted successfully",
        removed,
    )))
}

/// DELETE /v1/seating/allocations/exam/{exam_id}
pub async fn clear_exam_allocations(
    State(state): State<AppState>,
    Path(exam_id): Path<i64>,
) -> HandlerResult<ClearAllocationsResponse> {
    let deleted_count = state.seating.clear_exam(ExamId::new(exam_id)).await?;
    Ok(Json(ClearAllocationsResponse {
        message: format!("Deleted {} allocations for exam", deleted_count),
        deleted_count,
    }))
}

/// GET /v1/seating/room-availability?date=&time=
pub async fn room_availability(
    State(state): State<AppState>,
    query: Result<Query<SlotQuery>, QueryRejection>,
) -> HandlerResult<RoomAvailabilityReport> {
    let Query(query) = query?;
    let (Some(date), Some(time)) = (query.date, query.time) else {
        return Err(AppError::BadRequest(
            "Date and time are required".to_string(),
        ));
    };
    let time = parse_session(&time)?;
    let report =
        services::room_availability(state.repository.as_ref(), &DateInput::from_query(&date), time)
            .await?;
    Ok(Json(report))
}

// =============================================================================
// Rooms
// =============================================================================

/// GET /v1/rooms
pub async fn list_rooms(State(state): State<AppState>) -> HandlerResult<Vec<Room>> {
    Ok(Json(db_services::list_rooms(state.repository.as_ref()).await?))
}

/// GET /v1/rooms/{id}
pub async fn get_room(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<Room> {
    let room = db_services::get_room(state.repository.as_ref(), RoomId::new(id)).await?;
    Ok(Json(room))
}

/// POST /v1/rooms
pub async fn create_room(
    State(state): State<AppState>,
    payload: Result<Json<RoomInput>, JsonRejection>,
) -> CreatedResult<Room> {
    let Json(input) = payload?;
    let room = db_services::create_room(state.repository.as_ref(), &input).await?;
    Ok((StatusCode::CREATED, Json(room)))
}

/// POST /v1/rooms/bulk
pub async fn create_rooms_bulk(
    State(state): State<AppState>,
    payload: Result<Json<Vec<RoomInput>>, JsonRejection>,
) -> CreatedResult<RoomBulkReport> {
    let Json(rows) = payload?;
    let report = db_services::create_rooms_bulk(state.repository.as_ref(), &rows).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// PUT /v1/rooms/{id}
///
/// Fields left out of the body keep their stored values.
pub async fn update_room(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<RoomInput>, JsonRejection>,
) -> HandlerResult<Room> {
    let Json(input) = payload?;
    let room = db_services::update_room(state.repository.as_ref(), RoomId::new(id), &input).await?;
    Ok(Json(room))
}

/// DELETE /v1/rooms/{id}
///
/// Soft delete: the room stays on record but is no longer offered.
pub async fn delete_room(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<MessageResponse<Room>> {
    let room = db_services::deactivate_room(state.repository.as_ref(), RoomId::new(id)).await?;
    Ok(Json(MessageResponse::new("Room deleted successfully", room)))
}

// =============================================================================
// Exams
// =============================================================================

/// GET /v1/exams
pub async fn list_exams(State(state): State<AppState>) -> HandlerResult<Vec<Exam>> {
    Ok(Json(db_services::list_exams(state.repository.as_ref()).await?))
}

/// GET /v1/exams/{id}
pub async fn get_exam(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<Exam> {
    let exam = db_services::get_exam(state.repository.as_ref(), ExamId::new(id)).await?;
    Ok(Json(exam))
}

/// POST /v1/exams
pub async fn create_exam(
    State(state): State<AppState>,
    payload: Result<Json<ExamInput>, JsonRejection>,
) -> CreatedResult<Exam> {
    let Json(input) = payload?;
    let exam = db_services::create_exam(state.repository.as_ref(), &input).await?;
    Ok((StatusCode::CREATED, Json(exam)))
}

/// POST /v1/exams/bulk
pub async fn create_exams_bulk(
    State(state): State<AppState>,
    payload: Result<Json<Vec<ExamInput>>, JsonRejection>,
) -> CreatedResult<ExamBulkReport> {
    let Json(rows) = payload?;
    if rows.is_empty() {
        return Err(AppError::BadRequest(
            "Expected a non-empty array of exams".to_string(),
        ));
    }
    let report = db_services::create_exams_bulk(state.repository.as_ref(), &rows).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// PUT /v1/exams/{id}
pub async fn update_exam(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<ExamInput>, JsonRejection>,
) -> HandlerResult<Exam> {
    let Json(input) = payload?;
    let exam = db_services::update_exam(state.repository.as_ref(), ExamId::new(id), &input).await?;
    Ok(Json(exam))
}

/// DELETE /v1/exams/{id}
pub async fn delete_exam(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<MessageResponse<Exam>> {
    let exam = db_services::deactivate_exam(state.repository.as_ref(), ExamId::new(id)).await?;
    Ok(Json(MessageResponse::new("Exam deleted successfully", exam)))
}

// =============================================================================
// Students
// =============================================================================

/// GET /v1/students
pub async fn list_students(State(state): State<AppState>) -> HandlerResult<Vec<Student>> {
    Ok(Json(
        db_services::list_students(state.repository.as_ref()).await?,
    ))
}

/// GET /v1/students/{id}
pub async fn get_student(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<Student> {
    let student = db_services::get_student(state.repository.as_ref(), StudentId::new(id)).await?;
    Ok(Json(student))
}

/// POST /v1/students
pub async fn create_student(
    State(state): State<AppState>,
    payload: Result<Json<StudentInput>, JsonRejection>,
) -> CreatedResult<Student> {
    let Json(input) = payload?;
    let student = db_services::create_student(state.repository.as_ref(), &input).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

/// POST /v1/students/bulk
pub async fn create_students_bulk(
    State(state): State<AppState>,
    payload: Result<Json<Vec<StudentInput>>, JsonRejection>,
) -> CreatedResult<StudentBulkReport> {
    let Json(rows) = payload?;
    let report = db_services::create_students_bulk(state.repository.as_ref(), &rows).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// PUT /v1/students/{id}
pub async fn update_student(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<StudentInput>, JsonRejection>,
) -> HandlerResult<Student> {
    let Json(input) = payload?;
    let student =
        db_services::update_student(state.repository.as_ref(), StudentId::new(id), &input).await?;
    Ok(Json(student))
}

/// DELETE /v1/students/{id}
///
/// Soft delete; a later bulk upload with the same registration number
/// reactivates the student.
pub async fn delete_student(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<MessageResponse<Student>> {
    let student =
        db_services::deactivate_student(state.repository.as_ref(), StudentId::new(id)).await?;
    Ok(Json(MessageResponse::new(
        "Student deleted successfully",
        student,
    )))
}

/// GET /v1/students/stats
pub async fn student_stats(
    State(state): State<AppState>,
) -> HandlerResult<BTreeMap<String, DepartmentStats>> {
    Ok(Json(
        db_services::department_stats(state.repository.as_ref()).await?,
    ))
}

/// GET /v1/students/by-dept-sem?department=&semester=
pub async fn students_by_department(
    State(state): State<AppState>,
    query: Result<Query<DepartmentQuery>, QueryRejection>,
) -> HandlerResult<Vec<Student>> {
    let Query(query) = query?;
    let students = db_services::list_students_by_department(
        state.repository.as_ref(),
        query.department.as_deref(),
        query.semester.as_deref(),
    )
    .await?;
    Ok(Json(students))
}

// =============================================================================
// Faculty duty
// =============================================================================

/// GET /v1/faculty-allocations?exam_id=
pub async fn list_faculty_allocations(
    State(state): State<AppState>,
    query: Result<Query<ExamQuery>, QueryRejection>,
) -> HandlerResult<Vec<FacultyAllocation>> {
    let Query(query) = query?;
    let duties =
        db_services::list_faculty_allocations(state.repository.as_ref(), query.exam_id).await?;
    Ok(Json(duties))
}

/// POST /v1/faculty-allocations
pub async fn create_faculty_allocation(
    State(state): State<AppState>,
    payload: Result<Json<NewFacultyAllocation>, JsonRejection>,
) -> CreatedResult<FacultyAllocation> {
    let Json(duty) = payload?;
    let stored = db_services::create_faculty_allocation(state.repository.as_ref(), &duty).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// POST /v1/faculty-allocations/bulk
pub async fn create_faculty_allocations_bulk(
    State(state): State<AppState>,
    payload: Result<Json<Vec<NewFacultyAllocation>>, JsonRejection>,
) -> CreatedResult<FacultyBulkResponse> {
    let Json(duties) = payload?;
    let report =
        db_services::create_faculty_allocations_bulk(state.repository.as_ref(), &duties).await?;
    Ok((StatusCode::CREATED, Json(report.into())))
}

/// POST /v1/faculty-allocations/clear
pub async fn clear_faculty_allocations(
    State(state): State<AppState>,
    payload: Result<Json<ClearFacultyRequest>, JsonRejection>,
) -> HandlerResult<ClearAllocationsResponse> {
    let Json(request) = payload?;
    let deleted_count =
        db_services::clear_faculty_allocations(state.repository.as_ref(), &request.exam_ids)
            .await?;
    Ok(Json(ClearAllocationsResponse {
        message: format!("Deleted {} faculty allocations", deleted_count),
        deleted_count,
    }))
}

/// PUT /v1/faculty-allocations/{id}
pub async fn update_faculty_allocation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<FacultyAllocationPatch>, JsonRejection>,
) -> HandlerResult<FacultyAllocation> {
    let Json(patch) = payload?;
    let updated = db_services::update_faculty_allocation(
        state.repository.as_ref(),
        FacultyAllocationId::new(id),
        &patch,
    )
    .await?;
    Ok(Json(updated))
}

/// DELETE /v1/faculty-allocations/{id}
pub async fn delete_faculty_allocation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<MessageResponse<FacultyAllocation>> {
    let removed = db_services::delete_faculty_allocation(
        state.repository.as_ref(),
        FacultyAllocationId::new(id),
    )
    .await?;
    Ok(Json(MessageResponse::new(
        "Faculty allocation deleted successfully",
        removed,
    )))
}

// =============================================================================
// Attendance
// =============================================================================

/// GET /v1/attendance/invigilator/{faculty_id}?date=&time=
pub async fn invigilator_roster(
    State(state): State<AppState>,
    Path(faculty_id): Path<String>,
    query: Result<Query<RosterQuery>, QueryRejection>,
) -> HandlerResult<InvigilatorRoster> {
    let Query(query) = query?;
    let day = query.date.as_deref().map(parse_day).transpose()?;
    let time = query.time.as_deref().map(parse_session).transpose()?;
    let roster = services::invigilator_roster(
        state.repository.as_ref(),
        &faculty_id,
        day,
        time,
        Utc::now(),
    )
    .await?;
    Ok(Json(roster))
}

/// POST /v1/attendance/mark
pub async fn mark_attendance(
    State(state): State<AppState>,
    payload: Result<Json<AttendanceRequest>, JsonRejection>,
) -> HandlerResult<MessageResponse<Attendance>> {
    let Json(request) = payload?;
    let record = services::mark_attendance(state.repository.as_ref(), &request).await?;
    Ok(Json(MessageResponse::new(
        "Attendance marked successfully",
        record,
    )))
}

/// POST /v1/attendance/malpractice
pub async fn report_malpractice(
    State(state): State<AppState>,
    payload: Result<Json<MalpracticeRequest>, JsonRejection>,
) -> HandlerResult<MessageResponse<Attendance>> {
    let Json(request) = payload?;
    let record =
        services::report_malpractice(state.repository.as_ref(), &request, Utc::now()).await?;
    Ok(Json(MessageResponse::new(
        "Malpractice reported successfully",
        record,
    )))
}

/// GET /v1/attendance/report/{faculty_id}?exam_id=&date=&time=
///
/// The slot filter applies only when both date and time are given.
pub async fn attendance_report(
    State(state): State<AppState>,
    Path(faculty_id): Path<String>,
    query: Result<Query<AttendanceReportQuery>, QueryRejection>,
) -> HandlerResult<Vec<Attendance>> {
    let Query(query) = query?;
    let slot = match (query.date.as_deref(), query.time.as_deref()) {
        (Some(date), Some(time)) => Some((parse_day(date)?, parse_session(time)?)),
        _ => None,
    };
    let records =
        services::attendance_report(state.repository.as_ref(), &faculty_id, query.exam_id, slot)
            .await?;
    Ok(Json(records))
}

/// GET /v1/attendance/summary?date=&time=
///
/// Present, absent and malpractice counts for every exam in the slot.
pub async fn attendance_summary(
    State(state): State<AppState>,
    query: Result<Query<SlotQuery>, QueryRejection>,
) -> HandlerResult<Vec<SlotAttendance>> {
    let Query(query) = query?;
    let (Some(date), Some(time)) = (query.date, query.time) else {
        return Err(AppError::BadRequest(
            "Date and time are required".to_string(),
        ));
    };
    let summary = services::slot_attendance(
        state.repository.as_ref(),
        parse_day(&date)?,
        parse_session(&time)?,
    )
    .await?;
    Ok(Json(summary))
}
