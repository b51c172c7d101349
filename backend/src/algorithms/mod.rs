//! Seat allocation kernels.
//!
//! Pure functions with no store access; the service layer feeds them the
//! records it read and persists what they return.
//!
//! # Components
//!
//! - [`eligibility`]: Which students must sit an exam
//! - [`conflicts`]: Which rooms are free in an exam's slot
//! - [`seating`]: First-fit seat planning and seat labels
//!
//! # Example
//!
//! ```
//! use exam_seating::algorithms::seat_label;
//!
//! assert_eq!(seat_label(0), "A1");
//! assert_eq!(seat_label(23), "C4");
//! ```

pub mod conflicts;
pub mod eligibility;
pub mod seating;

pub use conflicts::{occupied_room_ids, select_rooms, RoomShortage};
pub use eligibility::{resolve_eligible, student_filter_for, Eligibility};
pub use seating::{plan_seats, seat_index, seat_label, CapacityShortfall, PlannedSeat, SeatPlan};
