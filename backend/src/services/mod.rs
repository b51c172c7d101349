//! Service layer for seat allocation and invigilation.
//!
//! Services sit between the HTTP handlers and the repositories. They read
//! through the repository traits, hand the records to the pure kernels in
//! [`crate::algorithms`], and persist what the kernels decide.

pub mod exam_locks;
pub mod invigilation;
pub mod room_availability;
pub mod seat_allocation;

pub use exam_locks::{ExamGuard, ExamLocks};
pub use invigilation::{
    attendance_report, invigilator_roster, mark_attendance, report_malpractice, slot_attendance,
    AttendanceRequest, DutyError, MalpracticeRequest,
};
pub use room_availability::room_availability;
pub use seat_allocation::{
    AllocationError, AllocationErrorKind, AllocationRequest, ExamSnapshot, SeatingService,
};
