//! Room availability for one exam slot.

use log::{debug, info};

use super::seat_allocation::AllocationError;
use crate::algorithms::occupied_room_ids;
use crate::api::{ConflictingExam, RoomAvailabilityReport, RoomGroup};
use crate::db::repository::{AllocationFilter, ExamFilter, FullRepository, RoomFilter};
use crate::models::{supported_formats, DateInput, ExamSession, Room};

/// Split every active room into available and occupied for the slot.
///
/// A room is occupied when any active exam in the slot has a seat allocated
/// in it. Both groups are ordered by room number.
pub async fn room_availability<R: FullRepository + ?Sized>(
    repo: &R,
    date: &DateInput,
    time: ExamSession,
) -> Result<RoomAvailabilityReport, AllocationError> {
    let day = date.calendar_day().map_err(|e| {
        AllocationError::validation(format!(
            "{} (accepted formats: {})",
            e,
            supported_formats().join(", ")
        ))
    })?;

    let rooms = repo.find_rooms(&RoomFilter::active()).await?;
    let exams = repo.find_exams(&ExamFilter::slot(day, time)).await?;
    let occupied = if exams.is_empty() {
        Default::default()
    } else {
        let allocations = repo
            .find_allocations(&AllocationFilter::for_exams(exams.iter().map(|e| e.id)))
            .await?;
        occupied_room_ids(&allocations)
    };
    debug!(
        "Slot {} {}: {} exams, {} rooms in use",
        day,
        time,
        exams.len(),
        occupied.len()
    );

    let (taken, free): (Vec<&Room>, Vec<&Room>) =
        rooms.iter().partition(|room| occupied.contains(&room.id));
    let report = RoomAvailabilityReport {
        date: day,
        time,
        total_rooms: rooms.len(),
        available_rooms: RoomGroup::from_rooms(free),
        occupied_rooms: RoomGroup::from_rooms(taken),
        conflicting_exams: exams.iter().map(ConflictingExam::from).collect(),
    };
    info!(
        "Room availability for {} {}: {} available, {} occupied",
        day, time, report.available_rooms.count, report.occupied_rooms.count
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::StudentId;
    use crate::services::seat_allocation::AllocationErrorKind;
    use crate::db::repository::{ExamRepository, RoomRepository, SeatAllocationRepository};
    use crate::db::LocalRepository;
    use crate::models::{CalendarDay, ExamDraft, ExamType, NewSeatAllocation, RoomDraft, RoomType};

    fn room(no: &str, capacity: u32) -> RoomDraft {
        RoomDraft {
            room_no: no.into(),
            floor_no: 1,
            block: "A".into(),
            capacity,
            room_type: RoomType::Classroom,
        }
    }

    fn exam(code: &str, day: CalendarDay) -> ExamDraft {
        ExamDraft {
            day,
            time: ExamSession::Forenoon,
            subject: format!("Subject {}", code),
            subject_code: code.into(),
            department: "CSE".into(),
            semester: "3".into(),
            exam_type: ExamType::Regular,
        }
    }

    #[tokio::test]
    async fn test_rooms_split_by_slot_allocations() {
        let repo = LocalRepository::new();
        let day = CalendarDay::from_ymd(2024, 5, 2).unwrap();
        let r1 = repo.create_room(&room("B2", 30)).await.unwrap();
        let r2 = repo.create_room(&room("A1", 20)).await.unwrap();
        let e1 = repo.create_exam(&exam("CS301", day)).await.unwrap();
        repo.insert_allocations(&[NewSeatAllocation {
            student: StudentId::new(1),
            exam: e1.id,
            room: r1.id,
            seat_number: "A1".into(),
        }])
        .await
        .unwrap();

        let report = room_availability(&repo, &DateInput::from("2024-05-02"), ExamSession::Forenoon)
            .await
            .unwrap();
        assert_eq!(report.total_rooms, 2);
        assert_eq!(report.available_rooms.count, 1);
        assert_eq!(report.available_rooms.rooms[0].id, r2.id);
        assert_eq!(report.occupied_rooms.rooms[0].id, r1.id);
        assert_eq!(report.occupied_rooms.total_capacity, 30);
        assert_eq!(report.conflicting_exams.len(), 1);
        assert_eq!(report.conflicting_exams[0].id, e1.id);

        // Same day written as DD-MM-YYYY, other session
        let other = room_availability(&repo, &DateInput::from("02-05-2024"), ExamSession::Afternoon)
            .await
            .unwrap();
        assert_eq!(other.available_rooms.count, 2);
        assert_eq!(other.available_rooms.rooms[0].room_no, "A1");
        assert!(other.conflicting_exams.is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_date_is_rejected() {
        let repo = LocalRepository::new();
        let err = room_availability(&repo, &DateInput::from("someday"), ExamSession::Forenoon)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), AllocationErrorKind::ValidationError);
    }
}
