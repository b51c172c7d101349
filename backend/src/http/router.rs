//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // Permissive CORS; the browser front end is served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Seating
        .route("/seating/allocate", post(handlers::allocate_seats))
        .route("/seating/allocations", get(handlers::list_allocations))
        .route(
            "/seating/allocations/{id}",
            delete(handlers::delete_allocation),
        )
        .route(
            "/seating/allocations/exam/{exam_id}",
            delete(handlers::clear_exam_allocations),
        )
        .route(
            "/seating/room-availability",
            get(handlers::room_availability),
        )
        // Rooms
        .route(
            "/rooms",
            get(handlers::list_rooms).post(handlers::create_room),
        )
        .route("/rooms/bulk", post(handlers::create_rooms_bulk))
        .route(
            "/rooms/{id}",
            get(handlers::get_room)
                .put(handlers::update_room)
                .delete(handlers::delete_room),
        )
        // Exams
        .route(
            "/exams",
            get(handlers::list_exams).post(handlers::create_exam),
        )
        .route("/exams/bulk", post(handlers::create_exams_bulk))
        .route(
            "/exams/{id}",
            get(handlers::get_exam)
                .put(handlers::update_exam)
                .delete(handlers::delete_exam),
        )
        // Students
        .route(
            "/students",
            get(handlers::list_students).post(handlers::create_student),
        )
        .route("/students/bulk", post(handlers::create_students_bulk))
        .route("/students/stats", get(handlers::student_stats))
        .route(
            "/students/by-dept-sem",
            get(handlers::students_by_department),
        )
        .route(
            "/students/{id}",
            get(handlers::get_student)
                .put(handlers::update_student)
                .delete(handlers::delete_student),
        )
        // Faculty duty
        .route(
            "/faculty-allocations",
            get(handlers::list_faculty_allocations).post(handlers::create_faculty_allocation),
        )
        .route(
            "/faculty-allocations/bulk",
            post(handlers::create_faculty_allocations_bulk),
        )
        .route(
            "/faculty-allocations/clear",
            post(handlers::clear_faculty_allocations),
        )
        .route(
            "/faculty-allocations/{id}",
            put(handlers::update_faculty_allocation).delete(handlers::delete_faculty_allocation),
        )
        // Attendance
        .route(
            "/attendance/invigilator/{faculty_id}",
            get(handlers::invigilator_roster),
        )
        .route("/attendance/summary", get(handlers::attendance_summary))
        .route("/attendance/mark", post(handlers::mark_attendance))
        .route("/attendance/malpractice", post(handlers::report_malpractice))
        .route(
            "/attendance/report/{faculty_id}",
            get(handlers::attendance_report),
        );

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        // Bulk uploads of spreadsheet exports can be large
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::FullRepository;
    use std::sync::Arc;

    #[test]
    fn test_router_creation() {
        let repo = Arc::new(LocalRepository::new()) as Arc<dyn FullRepository>;
        let state = AppState::new(repo);
        let _router = create_router(state);
    }
}
