//! Room conflict detection for an exam slot.

use std::collections::BTreeSet;

use crate::api::RoomId;
use crate::models::{Room, SeatAllocation};

/// Why no room can be offered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomShortage {
    /// No active room of the requested type exists at all.
    MissingRoomType,
    /// Rooms of the type exist but every one is committed in the slot.
    AllOccupied { occupied: Vec<Room> },
}

/// Rooms referenced by the given allocations.
pub fn occupied_room_ids<'a>(
    allocations: impl IntoIterator<Item = &'a SeatAllocation>,
) -> BTreeSet<RoomId> {
    allocations.into_iter().map(|a| a.room).collect()
}

/// Remove occupied rooms and order the rest by ascending capacity.
///
/// Ties on capacity fall back to room number then id, so the order is total.
/// Small rooms are filled first and large rooms stay free for later exams.
pub fn select_rooms(
    rooms_of_type: Vec<Room>,
    occupied: &BTreeSet<RoomId>,
) -> Result<Vec<Room>, RoomShortage> {
    if rooms_of_type.is_empty() {
        return Err(RoomShortage::MissingRoomType);
    }

    let (taken, mut available): (Vec<Room>, Vec<Room>) = rooms_of_type
        .into_iter()
        .partition(|room| occupied.contains(&room.id));
    if available.is_empty() {
        return Err(RoomShortage::AllOccupied { occupied: taken });
    }

    available.sort_by(|a, b| {
        a.capacity
            .cmp(&b.capacity)
            .then_with(|| a.room_no.cmp(&b.room_no))
            .then_with(|| a.id.cmp(&b.id))
    });
    Ok(available)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoomType;

    fn room(id: i64, no: &str, capacity: u32) -> Room {
        Room {
            id: RoomId::new(id),
            room_no: no.to_string(),
            floor_no: 0,
            block: "A".to_string(),
            capacity,
            room_type: RoomType::Classroom,
            active: true,
        }
    }

    #[test]
    fn test_rooms_sorted_by_capacity_then_number() {
        let rooms = vec![room(1, "C1", 30), room(2, "B1", 10), room(3, "A1", 30)];
        let selected = select_rooms(rooms, &BTreeSet::new()).unwrap();
        let order: Vec<_> = selected.iter().map(|r| r.room_no.as_str()).collect();
        assert_eq!(order, vec!["B1", "A1", "C1"]);
    }

    #[test]
    fn test_occupied_rooms_are_excluded() {
        let occupied = BTreeSet::from([RoomId::new(2)]);
        let selected = select_rooms(vec![room(1, "A1", 20), room(2, "A2", 5)], &occupied).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, RoomId::new(1));
    }

    #[test]
    fn test_missing_type_differs_from_all_occupied() {
        assert_eq!(
            select_rooms(vec![], &BTreeSet::new()),
            Err(RoomShortage::MissingRoomType)
        );

        let occupied = BTreeSet::from([RoomId::new(1)]);
        match select_rooms(vec![room(1, "A1", 20)], &occupied) {
            Err(RoomShortage::AllOccupied { occupied }) => assert_eq!(occupied.len(), 1),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
