//! Data Transfer Objects for the HTTP API.
//!
//! Result types already serializable in [`crate::api`] are re-exported; this
//! module adds query strings and the small envelopes only the HTTP surface uses.

use serde::{Deserialize, Serialize};

pub use crate::api::{
    AllocationResult, InvigilatorRoster, RoomAvailabilityReport, SeatAssignment, SlotAttendance,
};
pub use crate::db::services::{
    DepartmentStats, ExamBulkReport, FacultyBulkReport, RoomBulkReport, StudentBulkReport,
};
pub use crate::services::{AllocationRequest, AttendanceRequest, MalpracticeRequest};

use crate::api::ExamId;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

/// `?exam_id=` filter used by listing endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExamQuery {
    #[serde(default, alias = "examId")]
    pub exam_id: Option<ExamId>,
}

/// Slot selector for room availability.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlotQuery {
    pub date: Option<String>,
    pub time: Option<String>,
}

/// Optional slot for the invigilator roster; missing parts default to now.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RosterQuery {
    pub date: Option<String>,
    pub time: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendanceReportQuery {
    #[serde(default, alias = "examId")]
    pub exam_id: Option<ExamId>,
    pub date: Option<String>,
    pub time: Option<String>,
}

/// `?department=&semester=` selector for student listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepartmentQuery {
    pub department: Option<String>,
    pub semester: Option<String>,
}

/// Body of a faculty duty clear request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClearFacultyRequest {
    #[serde(default, alias = "examIds")]
    pub exam_ids: Vec<ExamId>,
}

/// Summary of a bulk faculty duty upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacultyBulkResponse {
    pub message: String,
    pub success_count: usize,
    pub error_count: usize,
    #[serde(flatten)]
    pub report: FacultyBulkReport,
}

impl From<FacultyBulkReport> for FacultyBulkResponse {
    fn from(report: FacultyBulkReport) -> Self {
        Self {
            message: format!("Created {} faculty allocations", report.created.len()),
            success_count: report.created.len(),
            error_count: report.errors.len(),
            report,
        }
    }
}

/// Response for clearing an exam's allocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearAllocationsResponse {
    pub message: String,
    pub deleted_count: usize,
}

/// Confirmation message with the affected record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse<T> {
    pub message: String,
    pub record: T,
}

impl<T> MessageResponse<T> {
    pub fn new(message: impl Into<String>, record: T) -> Self {
        Self {
            message: message.into(),
            record,
        }
    }
}
