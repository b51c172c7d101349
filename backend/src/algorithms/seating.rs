//! First-fit seat planning.
//!
//! Rooms are filled in the order given, each to capacity, before moving on.
//! Seat indices restart at 0 in every room and map to labels `A1..A10`,
//! `B1..B10` and so on.

use serde::{Deserialize, Serialize};

use crate::api::{RoomId, StudentId};
use crate::models::Room;

const SEATS_PER_ROW: usize = 10;

/// Label of the seat at `index` within its room.
///
/// ```
/// use exam_seating::algorithms::seat_label;
///
/// assert_eq!(seat_label(9), "A10");
/// assert_eq!(seat_label(10), "B1");
/// ```
pub fn seat_label(index: usize) -> String {
    let row = u32::try_from(index / SEATS_PER_ROW)
        .ok()
        .and_then(|r| char::from_u32(u32::from(b'A') + r))
        .unwrap_or('?');
    format!("{}{}", row, index % SEATS_PER_ROW + 1)
}

/// Inverse of [`seat_label`]; `None` for labels it never produces.
pub fn seat_index(label: &str) -> Option<usize> {
    let mut chars = label.chars();
    let row = chars.next()?;
    let column: usize = chars.as_str().parse().ok()?;
    if !(1..=SEATS_PER_ROW).contains(&column) {
        return None;
    }
    let row = (row as u32).checked_sub(u32::from(b'A'))? as usize;
    Some(row * SEATS_PER_ROW + column - 1)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedSeat {
    pub student: StudentId,
    pub room: RoomId,
    pub seat_index: usize,
    pub seat_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatPlan {
    /// In assignment order: room by room, seat index ascending.
    pub seats: Vec<PlannedSeat>,
    /// Rooms that received at least one student.
    pub rooms_used: usize,
    /// Sum of the capacities of all rooms offered to the planner.
    pub total_capacity: u64,
}

impl SeatPlan {
    pub fn remaining_capacity(&self) -> u64 {
        self.total_capacity.saturating_sub(self.seats.len() as u64)
    }
}

/// Not enough seats across the offered rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityShortfall {
    pub students: usize,
    pub available_capacity: u64,
    pub shortfall: u64,
    /// `ceil(shortfall / largest room capacity)`, treating a largest capacity of 0 as 1.
    pub additional_rooms_needed: u64,
}

/// Seat `students` (already ordered) across `rooms` (already ordered).
///
/// Fails without producing any seats when total capacity is below the number
/// of students.
pub fn plan_seats(students: &[StudentId], rooms: &[Room]) -> Result<SeatPlan, CapacityShortfall> {
    let total_capacity: u64 = rooms.iter().map(|r| u64::from(r.capacity)).sum();
    let needed = students.len() as u64;
    if needed > total_capacity {
        let shortfall = needed - total_capacity;
        let largest = rooms
            .iter()
            .map(|r| u64::from(r.capacity))
            .max()
            .unwrap_or(0)
            .max(1);
        return Err(CapacityShortfall {
            students: students.len(),
            available_capacity: total_capacity,
            shortfall,
            additional_rooms_needed: shortfall.div_ceil(largest),
        });
    }

    let mut seats = Vec::with_capacity(students.len());
    let mut remaining = students;
    let mut rooms_used = 0;
    for room in rooms {
        if remaining.is_empty() {
            break;
        }
        let take = remaining.len().min(room.capacity as usize);
        let (here, rest) = remaining.split_at(take);
        seats.extend(here.iter().enumerate().map(|(seat_index, student)| PlannedSeat {
            student: *student,
            room: room.id,
            seat_index,
            seat_number: seat_label(seat_index),
        }));
        if take > 0 {
            rooms_used += 1;
        }
        remaining = rest;
    }

    Ok(SeatPlan {
        seats,
        rooms_used,
        total_capacity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoomType;

    fn room(id: i64, capacity: u32) -> Room {
        Room {
            id: RoomId::new(id),
            room_no: format!("R{}", id),
            floor_no: 0,
            block: "A".to_string(),
            capacity,
            room_type: RoomType::Classroom,
            active: true,
        }
    }

    fn students(n: i64) -> Vec<StudentId> {
        (1..=n).map(StudentId::new).collect()
    }

    #[test]
    fn test_seat_labels() {
        assert_eq!(seat_label(0), "A1");
        assert_eq!(seat_label(9), "A10");
        assert_eq!(seat_label(10), "B1");
        assert_eq!(seat_label(23), "C4");
        assert_eq!(seat_label(259), "Z10");
    }

    #[test]
    fn test_seat_index_inverts_label() {
        for index in [0, 9, 10, 23, 259] {
            assert_eq!(seat_index(&seat_label(index)), Some(index));
        }
        assert_eq!(seat_index("A0"), None);
        assert_eq!(seat_index("A11"), None);
        assert_eq!(seat_index(""), None);
    }

    #[test]
    fn test_first_fit_restarts_seat_index_per_room() {
        let plan = plan_seats(&students(4), &[room(1, 2), room(2, 3)]).unwrap();
        let layout: Vec<_> = plan
            .seats
            .iter()
            .map(|s| (s.room.value(), s.seat_number.as_str()))
            .collect();
        assert_eq!(layout, vec![(1, "A1"), (1, "A2"), (2, "A1"), (2, "A2")]);
        assert_eq!(plan.rooms_used, 2);
        assert_eq!(plan.total_capacity, 5);
        assert_eq!(plan.remaining_capacity(), 1);
    }

    #[test]
    fn test_exact_fill_does_not_count_next_room() {
        let plan = plan_seats(&students(2), &[room(1, 2), room(2, 3)]).unwrap();
        assert_eq!(plan.rooms_used, 1);
        assert_eq!(plan.seats.len(), 2);
    }

    #[test]
    fn test_insufficient_capacity() {
        let err = plan_seats(&students(10), &[room(1, 3), room(2, 4)]).unwrap_err();
        assert_eq!(err.available_capacity, 7);
        assert_eq!(err.shortfall, 3);
        assert_eq!(err.additional_rooms_needed, 1);

        let err = plan_seats(&students(20), &[room(1, 3), room(2, 4)]).unwrap_err();
        assert_eq!(err.shortfall, 13);
        assert_eq!(err.additional_rooms_needed, 4);
    }

    #[test]
    fn test_plan_is_deterministic() {
        let rooms = [room(1, 12), room(2, 12)];
        let first = plan_seats(&students(15), &rooms).unwrap();
        let second = plan_seats(&students(15), &rooms).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.seats[11].seat_number, "B2");
        assert_eq!(first.seats[12].seat_number, "A1");
    }
}
