mod support;

use std::collections::HashSet;
use std::sync::Arc;

use exam_seating::api::{AllocationResult, ExamId};
use exam_seating::db::repositories::LocalRepository;
use exam_seating::db::repository::{
    AllocationFilter, ExamRepository, FullRepository, RoomRepository, SeatAllocationRepository,
    StudentRepository,
};
use exam_seating::models::{DateInput, Exam, ExamSession, ExamType, RoomType};
use exam_seating::services::{AllocationErrorKind, SeatingService};
use serde_json::json;

use support::*;

fn service(repo: &LocalRepository) -> SeatingService {
    SeatingService::new(Arc::new(repo.clone()) as Arc<dyn FullRepository>)
}

/// (registration number, room number, seat) triples of a result.
fn plan_of(result: &AllocationResult) -> Vec<(String, String, String)> {
    result
        .allocations
        .iter()
        .map(|a| {
            (
                a.student.reg_no.clone(),
                a.room.room_no.clone(),
                a.seat_number.clone(),
            )
        })
        .collect()
}

async fn setup(students: usize, capacities: &[u32]) -> (LocalRepository, ExamId) {
    let repo = LocalRepository::new();
    for (i, capacity) in capacities.iter().enumerate() {
        repo.create_room(&room(&format!("R{}", i + 1), *capacity, RoomType::Classroom))
            .await
            .unwrap();
    }
    seed_students(&repo, "21cs", students, CODE, exam_day()).await;
    let exam = repo.create_exam(&default_exam()).await.unwrap();
    (repo, exam.id)
}

#[tokio::test]
async fn test_allocation_is_deterministic() {
    let (repo, exam) = setup(25, &[10, 30, 12]).await;
    let seating = service(&repo);

    let first = seating.allocate(exam, RoomType::Classroom).await.unwrap();
    seating.clear_exam(exam).await.unwrap();
    let second = seating.allocate(exam, RoomType::Classroom).await.unwrap();

    assert_eq!(plan_of(&first), plan_of(&second));
    assert_eq!(first.stats, second.stats);
}

#[tokio::test]
async fn test_capacity_invariant_and_stats() {
    let (repo, exam) = setup(25, &[10, 30, 12]).await;
    let result = service(&repo)
        .allocate(exam, RoomType::Classroom)
        .await
        .unwrap();

    // Smallest rooms first: 10 + 12 seats cover 22 students, the rest go to R2
    assert_eq!(result.stats.total_students, 25);
    assert_eq!(result.stats.unique_students, 25);
    assert_eq!(result.stats.seats_allocated, 25);
    assert_eq!(result.stats.rooms_used, 3);
    assert_eq!(result.stats.remaining_capacity, 52 - 25);
    assert_eq!(repo.allocation_count(), 25);

    let per_room = |room_no: &str| {
        result
            .allocations
            .iter()
            .filter(|a| a.room.room_no == room_no)
            .count()
    };
    assert_eq!(per_room("R1"), 10);
    assert_eq!(per_room("R3"), 12);
    assert_eq!(per_room("R2"), 3);
    assert_eq!(result.exam_details.subject_code, CODE);
    assert_eq!(result.exam_details.date, exam_day());
}

#[tokio::test]
async fn test_no_duplicate_seats_or_students() {
    let (repo, exam) = setup(40, &[15, 15, 15]).await;
    let result = service(&repo)
        .allocate(exam, RoomType::Classroom)
        .await
        .unwrap();

    let seats: HashSet<_> = result
        .allocations
        .iter()
        .map(|a| (a.room.id, a.seat_number.clone()))
        .collect();
    let students: HashSet<_> = result.allocations.iter().map(|a| a.student.id).collect();
    assert_eq!(seats.len(), 40);
    assert_eq!(students.len(), 40);
}

#[tokio::test]
async fn test_first_fit_restarts_seat_index_per_room() {
    let (repo, exam) = setup(4, &[2, 3]).await;
    let result = service(&repo)
        .allocate(exam, RoomType::Classroom)
        .await
        .unwrap();

    assert_eq!(
        plan_of(&result),
        vec![
            ("21cs001".into(), "R1".into(), "A1".into()),
            ("21cs002".into(), "R1".into(), "A2".into()),
            ("21cs003".into(), "R2".into(), "A1".into()),
            ("21cs004".into(), "R2".into(), "A2".into()),
        ]
    );
}

#[tokio::test]
async fn test_result_ordered_by_room_then_seat_position() {
    let (repo, exam) = setup(12, &[40]).await;
    let result = service(&repo)
        .allocate(exam, RoomType::Classroom)
        .await
        .unwrap();

    let labels: Vec<&str> = result
        .allocations
        .iter()
        .map(|a| a.seat_number.as_str())
        .collect();
    assert_eq!(
        labels,
        vec!["A1", "A2", "A3", "A4", "A5", "A6", "A7", "A8", "A9", "A10", "B1", "B2"]
    );
}

#[tokio::test]
async fn test_rerun_replaces_previous_plan() {
    let (repo, exam) = setup(5, &[20]).await;
    let seating = service(&repo);

    let first = seating.allocate(exam, RoomType::Classroom).await.unwrap();
    seed_students(&repo, "22cs", 3, CODE, exam_day()).await;
    let second = seating.allocate(exam, RoomType::Classroom).await.unwrap();

    assert_eq!(second.stats.seats_allocated, 8);
    let stored = repo
        .find_allocations(&AllocationFilter::for_exam(exam))
        .await
        .unwrap();
    assert_eq!(stored.len(), 8);

    let first_ids: HashSet<_> = first.allocations.iter().map(|a| a.id).collect();
    assert!(stored.iter().all(|a| !first_ids.contains(&a.id)));
    let second_ids: HashSet<_> = second.allocations.iter().map(|a| a.id).collect();
    assert!(stored.iter().all(|a| second_ids.contains(&a.id)));
}

#[tokio::test]
async fn test_rooms_taken_in_same_slot_are_excluded() {
    let repo = LocalRepository::new();
    let small = repo
        .create_room(&room("A101", 10, RoomType::Classroom))
        .await
        .unwrap();
    let large = repo
        .create_room(&room("B201", 30, RoomType::Classroom))
        .await
        .unwrap();
    seed_students(&repo, "21cs", 6, CODE, exam_day()).await;
    seed_students(&repo, "21ee", 4, "EE501", exam_day()).await;

    let x = repo.create_exam(&default_exam()).await.unwrap();
    let y = repo
        .create_exam(&exam("EE501", exam_day(), ExamSession::Forenoon))
        .await
        .unwrap();
    let z = repo
        .create_exam(&exam("EE501", exam_day(), ExamSession::Afternoon))
        .await
        .unwrap();

    let seating = service(&repo);
    let for_y = seating.allocate(y.id, RoomType::Classroom).await.unwrap();
    assert!(for_y.allocations.iter().all(|a| a.room.id == small.id));

    // Same slot as Y: the small room is committed, so X lands in the large one
    let for_x = seating.allocate(x.id, RoomType::Classroom).await.unwrap();
    assert!(for_x.allocations.iter().all(|a| a.room.id == large.id));

    // Other session: the small room is free again
    let for_z = seating.allocate(z.id, RoomType::Classroom).await.unwrap();
    assert!(for_z.allocations.iter().all(|a| a.room.id == small.id));
}

#[tokio::test]
async fn test_all_occupied_and_missing_room_type() {
    let repo = LocalRepository::new();
    repo.create_room(&room("A101", 10, RoomType::Classroom))
        .await
        .unwrap();
    seed_students(&repo, "21cs", 3, CODE, exam_day()).await;
    seed_students(&repo, "21ee", 3, "EE501", exam_day()).await;
    let x = repo.create_exam(&default_exam()).await.unwrap();
    let y = repo
        .create_exam(&exam("EE501", exam_day(), ExamSession::Forenoon))
        .await
        .unwrap();

    let seating = service(&repo);
    seating.allocate(y.id, RoomType::Classroom).await.unwrap();

    let err = seating.allocate(x.id, RoomType::Classroom).await.unwrap_err();
    assert_eq!(err.kind(), AllocationErrorKind::AllOccupied);
    let details = err.diagnostics();
    assert_eq!(details["conflicting_exams"][0]["subject_code"], json!("EE501"));
    assert_eq!(details["occupied_rooms"][0]["room_no"], json!("A101"));

    let err = seating.allocate(x.id, RoomType::Lab).await.unwrap_err();
    assert_eq!(err.kind(), AllocationErrorKind::MissingRoomType);
}

#[tokio::test]
async fn test_insufficient_capacity_writes_nothing() {
    let (repo, exam) = setup(10, &[3, 4]).await;
    let err = service(&repo)
        .allocate(exam, RoomType::Classroom)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), AllocationErrorKind::InsufficientCapacity);
    let details = err.diagnostics();
    assert_eq!(details["required_additional"], json!(3));
    assert_eq!(details["available_capacity"], json!(7));
    assert_eq!(details["rooms_needed"], json!(1));
    assert_eq!(repo.allocation_count(), 0);
}

#[tokio::test]
async fn test_failed_rerun_keeps_previous_plan() {
    let (repo, exam) = setup(10, &[4, 8]).await;
    let seating = service(&repo);
    seating.allocate(exam, RoomType::Classroom).await.unwrap();

    let large = repo
        .find_rooms(&Default::default())
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.capacity == 8)
        .unwrap();
    repo.deactivate_room(large.id).await.unwrap();

    let err = seating.allocate(exam, RoomType::Classroom).await.unwrap_err();
    assert_eq!(err.kind(), AllocationErrorKind::InsufficientCapacity);
    assert_eq!(repo.allocation_count(), 10);
}

#[tokio::test]
async fn test_students_on_other_days_or_bad_dates_are_skipped() {
    let (repo, exam) = setup(2, &[10]).await;
    seed_students(
        &repo,
        "21xx",
        2,
        CODE,
        exam_day().as_naive().succ_opt().unwrap().into(),
    )
    .await;
    // 45414 is the spreadsheet serial of 2024-05-02
    repo.insert_student_record(student_record("21cs900", Some(DateInput::Serial(45414.0))));
    repo.insert_student_record(student_record("21cs901", Some(DateInput::from("02-05-2024"))));
    repo.insert_student_record(student_record("21cs902", Some(DateInput::from("next week"))));
    repo.insert_student_record(student_record("21cs903", None));

    let result = service(&repo)
        .allocate(exam, RoomType::Classroom)
        .await
        .unwrap();
    let regs: Vec<String> = result
        .allocations
        .iter()
        .map(|a| a.student.reg_no.clone())
        .collect();
    assert_eq!(regs, vec!["21cs001", "21cs002", "21cs900", "21cs901"]);
}

#[tokio::test]
async fn test_duplicate_registrations_seated_once() {
    let (repo, exam) = setup(2, &[10]).await;
    repo.insert_student_record(student_record("21cs001", Some(DateInput::from(exam_day()))));

    let result = service(&repo)
        .allocate(exam, RoomType::Classroom)
        .await
        .unwrap();
    assert_eq!(result.stats.total_students, 3);
    assert_eq!(result.stats.unique_students, 2);
    assert_eq!(result.stats.seats_allocated, 2);
}

#[tokio::test]
async fn test_subject_name_used_when_code_missing() {
    let repo = LocalRepository::new();
    repo.create_room(&room("A101", 10, RoomType::Lab))
        .await
        .unwrap();
    seed_students(&repo, "21cs", 2, CODE, exam_day()).await;
    repo.insert_student_record(student_record("21cs500", Some(DateInput::from(exam_day()))));

    let exam = repo.insert_exam_record(Exam {
        id: ExamId::new(0),
        date: DateInput::from(exam_day()),
        time: ExamSession::Forenoon,
        subject: "compiler".to_string(),
        subject_code: String::new(),
        department: DEPT.to_string(),
        semester: SEM.to_string(),
        exam_type: ExamType::Regular,
        active: true,
    });

    // Only the record whose subject name contains "compiler" matches
    let result = service(&repo).allocate(exam, RoomType::Lab).await.unwrap();
    assert_eq!(result.allocations.len(), 1);
    assert_eq!(result.allocations[0].student.reg_no, "21cs500");
}

#[tokio::test]
async fn test_empty_and_not_found_outcomes() {
    let repo = LocalRepository::new();
    repo.create_room(&room("A101", 10, RoomType::Classroom))
        .await
        .unwrap();
    let lonely = repo.create_exam(&default_exam()).await.unwrap();
    let seating = service(&repo);

    let err = seating
        .allocate(lonely.id, RoomType::Classroom)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), AllocationErrorKind::Empty);
    assert_eq!(err.diagnostics()["potential_students"], json!(0));

    let err = seating
        .allocate(ExamId::new(404), RoomType::Classroom)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), AllocationErrorKind::NotFound);

    let legacy = repo.insert_exam_record(Exam {
        date: DateInput::from("sometime in May"),
        ..lonely
    });
    let err = seating
        .allocate(legacy, RoomType::Classroom)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), AllocationErrorKind::NotFound);
    assert_eq!(
        err.diagnostics()["received_date"],
        json!("sometime in May")
    );
}

#[tokio::test]
async fn test_unhealthy_store_is_unavailable() {
    let (repo, exam) = setup(2, &[10]).await;
    repo.set_healthy(false);
    let err = service(&repo)
        .allocate(exam, RoomType::Classroom)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), AllocationErrorKind::StoreUnavailable);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_runs_for_same_exam_do_not_interleave() {
    let (repo, exam) = setup(30, &[12, 12, 12]).await;
    let seating = service(&repo);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let seating = seating.clone();
            tokio::spawn(async move { seating.allocate(exam, RoomType::Classroom).await })
        })
        .collect();
    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.stats.seats_allocated, 30);
    }

    let stored = repo
        .find_allocations(&AllocationFilter::for_exam(exam))
        .await
        .unwrap();
    assert_eq!(stored.len(), 30);
    let students: HashSet<_> = stored.iter().map(|a| a.student).collect();
    assert_eq!(students.len(), 30);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_different_exams_allocate_in_parallel() {
    let repo = LocalRepository::new();
    for i in 0..4 {
        repo.create_room(&room(&format!("L{}", i), 10, RoomType::Lab))
            .await
            .unwrap();
    }
    seed_students(&repo, "21cs", 5, CODE, exam_day()).await;
    seed_students(&repo, "21ee", 5, "EE501", exam_day()).await;
    let a = repo.create_exam(&default_exam()).await.unwrap();
    let b = repo
        .create_exam(&exam("EE501", exam_day(), ExamSession::Afternoon))
        .await
        .unwrap();

    let seating = service(&repo);
    let (ra, rb) = tokio::join!(
        seating.allocate(a.id, RoomType::Lab),
        seating.allocate(b.id, RoomType::Lab)
    );
    assert_eq!(ra.unwrap().stats.seats_allocated, 5);
    assert_eq!(rb.unwrap().stats.seats_allocated, 5);
    assert_eq!(repo.allocation_count(), 10);
}

#[tokio::test]
async fn test_listing_and_deleting_allocations() {
    let (repo, exam) = setup(3, &[10]).await;
    let seating = service(&repo);
    seating.allocate(exam, RoomType::Classroom).await.unwrap();

    let listed = seating.allocations(Some(exam)).await.unwrap();
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0].student.reg_no, "21cs001");

    seating.delete_allocation(listed[0].id).await.unwrap();
    assert_eq!(seating.allocations(None).await.unwrap().len(), 2);

    assert_eq!(seating.clear_exam(exam).await.unwrap(), 2);
    assert!(seating.allocations(Some(exam)).await.unwrap().is_empty());
    assert!(repo.find_student(listed[0].student.id).await.unwrap().is_some());
}
