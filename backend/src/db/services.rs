//! High-level directory service layer.
//!
//! Repository-agnostic operations over rooms, exams, students and duties.
//! Raw input rows are normalized here before they reach a repository, so every
//! backend stores the same canonical shapes.
//!
//! # Usage
//!
//! ```no_run
//! use exam_seating::db::{services, repositories::LocalRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = LocalRepository::new();
//!     let rooms = services::list_rooms(&repo).await?;
//!     println!("Found {} rooms", rooms.len());
//!     Ok(())
//! }
//! ```

use std::collections::BTreeMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::repository::{
    ExamFilter, ExamUpsertSummary, FacultyAllocationFilter, FullRepository, RepositoryError,
    RepositoryResult, RoomFilter, StudentFilter,
};
use crate::api::{ExamId, FacultyAllocationId, RoomId, StudentId};
use crate::models::{
    Exam, ExamInput, FacultyAllocation, FacultyAllocationPatch, InputError, NewFacultyAllocation,
    Room, RoomInput, Student, StudentInput,
};

fn invalid_input(e: InputError) -> RepositoryError {
    RepositoryError::validation(e.to_string())
}

fn invalid_row(index: usize, e: InputError) -> RepositoryError {
    RepositoryError::validation(format!("Row {}: {}", index + 1, e))
}

// ==================== Health ====================

/// Check if the store is healthy.
pub async fn health_check<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<bool> {
    repo.health_check().await
}

// ==================== Rooms ====================

/// Active rooms ordered by room number.
pub async fn list_rooms<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<Vec<Room>> {
    repo.find_rooms(&RoomFilter::active()).await
}

pub async fn get_room<R: FullRepository + ?Sized>(repo: &R, id: RoomId) -> RepositoryResult<Room> {
    repo.find_room(id).await?.ok_or_else(|| {
        RepositoryError::not_found(format!("Room {} not found", id)).with_entity("room", id)
    })
}

pub async fn create_room<R: FullRepository + ?Sized>(
    repo: &R,
    input: &RoomInput,
) -> RepositoryResult<Room> {
    let draft = input.normalize().map_err(invalid_input)?;
    let room = repo.create_room(&draft).await?;
    info!("Created room {} (capacity {})", room.room_no, room.capacity);
    Ok(room)
}

/// Result of a bulk room upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomBulkReport {
    pub created: Vec<Room>,
    pub skipped: usize,
    pub duplicates: Vec<String>,
}

/// Insert a batch of rooms. One invalid row rejects the whole batch; rows
/// whose room number already exists are skipped and reported.
pub async fn create_rooms_bulk<R: FullRepository + ?Sized>(
    repo: &R,
    rows: &[RoomInput],
) -> RepositoryResult<RoomBulkReport> {
    let drafts = rows
        .iter()
        .enumerate()
        .map(|(index, row)| row.normalize().map_err(|e| invalid_row(index, e)))
        .collect::<RepositoryResult<Vec<_>>>()?;

    let outcome = repo.create_rooms(&drafts).await?;
    info!(
        "Bulk room upload: {} created, {} duplicates",
        outcome.created.len(),
        outcome.duplicates.len()
    );
    Ok(RoomBulkReport {
        skipped: drafts.len() - outcome.created.len(),
        created: outcome.created,
        duplicates: outcome.duplicates,
    })
}

/// Apply a partial update; fields missing from `input` keep their stored values.
pub async fn update_room<R: FullRepository + ?Sized>(
    repo: &R,
    id: RoomId,
    input: &RoomInput,
) -> RepositoryResult<Room> {
    let stored = get_room(repo, id).await?;
    let draft = input.merged_over(&stored).normalize().map_err(invalid_input)?;
    let room = repo.update_room(id, &draft).await?;
    info!("Updated room {} (capacity {})", room.room_no, room.capacity);
    Ok(room)
}

pub async fn deactivate_room<R: FullRepository + ?Sized>(
    repo: &R,
    id: RoomId,
) -> RepositoryResult<Room> {
    let room = repo.deactivate_room(id).await?;
    info!("Deactivated room {}", room.room_no);
    Ok(room)
}

// ==================== Exams ====================

/// Active exams ordered by date, then session.
pub async fn list_exams<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<Vec<Exam>> {
    repo.find_exams(&ExamFilter::active()).await
}

pub async fn get_exam<R: FullRepository + ?Sized>(repo: &R, id: ExamId) -> RepositoryResult<Exam> {
    repo.find_exam(id).await?.ok_or_else(|| {
        RepositoryError::not_found(format!("Exam {} not found", id)).with_entity("exam", id)
    })
}

pub async fn create_exam<R: FullRepository + ?Sized>(
    repo: &R,
    input: &ExamInput,
) -> RepositoryResult<Exam> {
    let draft = input.normalize().map_err(invalid_input)?;
    let exam = repo.create_exam(&draft).await?;
    info!("Scheduled exam {} ({})", exam.id, draft.key());
    Ok(exam)
}

/// Result of a bulk exam upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExamBulkReport {
    pub received: usize,
    pub inserted: usize,
    pub reactivated: usize,
    pub updated: usize,
    /// Exams that were inserted or reactivated.
    pub exams: Vec<Exam>,
}

impl ExamBulkReport {
    fn from_summary(received: usize, summary: ExamUpsertSummary) -> Self {
        let inserted = summary.inserted.len();
        let reactivated = summary.reactivated.len();
        let mut exams = summary.inserted;
        exams.extend(summary.reactivated);
        Self {
            received,
            inserted,
            reactivated,
            updated: summary.updated,
            exams,
        }
    }
}

/// Validate every row, then insert, reactivate or update them as one batch.
///
/// Any invalid row rejects the whole upload with its 1-based row number.
pub async fn create_exams_bulk<R: FullRepository + ?Sized>(
    repo: &R,
    rows: &[ExamInput],
) -> RepositoryResult<ExamBulkReport> {
    let drafts = rows
        .iter()
        .enumerate()
        .map(|(index, row)| row.normalize().map_err(|e| invalid_row(index, e)))
        .collect::<RepositoryResult<Vec<_>>>()?;

    let summary = repo.upsert_exams(&drafts).await?;
    let report = ExamBulkReport::from_summary(rows.len(), summary);
    info!(
        "Bulk exam upload: {} received, {} inserted, {} reactivated, {} updated",
        report.received, report.inserted, report.reactivated, report.updated
    );
    Ok(report)
}

/// Apply a partial update; fields missing from `input` keep their stored values.
pub async fn update_exam<R: FullRepository + ?Sized>(
    repo: &R,
    id: ExamId,
    input: &ExamInput,
) -> RepositoryResult<Exam> {
    let stored = get_exam(repo, id).await?;
    let draft = input.merged_over(&stored).normalize().map_err(invalid_input)?;
    let exam = repo.update_exam(id, &draft).await?;
    info!("Updated exam {} ({})", exam.id, draft.key());
    Ok(exam)
}

pub async fn deactivate_exam<R: FullRepository + ?Sized>(
    repo: &R,
    id: ExamId,
) -> RepositoryResult<Exam> {
    let exam = repo.deactivate_exam(id).await?;
    info!("Deactivated exam {}", exam.id);
    Ok(exam)
}

// ==================== Students ====================

/// Active students ordered by department, semester, then registration number.
pub async fn list_students<R: FullRepository + ?Sized>(
    repo: &R,
) -> RepositoryResult<Vec<Student>> {
    let mut students = repo.find_students(&StudentFilter::active()).await?;
    students.sort_by(|a, b| {
        a.department
            .cmp(&b.department)
            .then_with(|| a.semester.cmp(&b.semester))
            .then_with(|| a.reg_no.cmp(&b.reg_no))
    });
    Ok(students)
}

pub async fn get_student<R: FullRepository + ?Sized>(
    repo: &R,
    id: StudentId,
) -> RepositoryResult<Student> {
    repo.find_student(id).await?.ok_or_else(|| {
        RepositoryError::not_found(format!("Student {} not found", id))
            .with_entity("student", id)
    })
}

pub async fn create_student<R: FullRepository + ?Sized>(
    repo: &R,
    input: &StudentInput,
) -> RepositoryResult<Student> {
    let draft = input.normalize().map_err(invalid_input)?;
    repo.create_student(&draft).await
}

/// Apply a partial update; fields missing from `input` keep their stored values.
pub async fn update_student<R: FullRepository + ?Sized>(
    repo: &R,
    id: StudentId,
    input: &StudentInput,
) -> RepositoryResult<Student> {
    let stored = get_student(repo, id).await?;
    let draft = input
        .merged_over(&stored)
        .normalize()
        .map_err(invalid_input)?;
    let student = repo.update_student(id, &draft).await?;
    info!("Updated student {}", student.reg_no);
    Ok(student)
}

pub async fn deactivate_student<R: FullRepository + ?Sized>(
    repo: &R,
    id: StudentId,
) -> RepositoryResult<Student> {
    let student = repo.deactivate_student(id).await?;
    info!("Deactivated student {}", student.reg_no);
    Ok(student)
}

/// Active students of a department and/or semester, by registration number.
///
/// The department is matched upper-cased, as it is stored.
pub async fn list_students_by_department<R: FullRepository + ?Sized>(
    repo: &R,
    department: Option<&str>,
    semester: Option<&str>,
) -> RepositoryResult<Vec<Student>> {
    fn clean(raw: Option<&str>) -> Option<&str> {
        raw.map(str::trim).filter(|s| !s.is_empty())
    }
    repo.find_students(&StudentFilter {
        department: clean(department).map(str::to_uppercase),
        semester: clean(semester).map(str::to_string),
        ..StudentFilter::active()
    })
    .await
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentStats {
    pub total: usize,
    /// Student count per semester.
    pub semesters: BTreeMap<String, usize>,
}

/// Active student counts per department, split by semester.
pub async fn department_stats<R: FullRepository + ?Sized>(
    repo: &R,
) -> RepositoryResult<BTreeMap<String, DepartmentStats>> {
    let students = repo.find_students(&StudentFilter::active()).await?;
    let mut stats: BTreeMap<String, DepartmentStats> = BTreeMap::new();
    for student in &students {
        let entry = stats.entry(student.department.clone()).or_default();
        entry.total += 1;
        *entry.semesters.entry(student.semester.clone()).or_default() += 1;
    }
    Ok(stats)
}

/// A rejected row of a bulk upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    /// 0-based position in the uploaded array.
    pub index: usize,
    pub error: String,
}

/// Result of a bulk student upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentBulkReport {
    pub received: usize,
    pub valid: usize,
    /// Valid rows left after dropping repeated registration numbers.
    pub unique: usize,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub duplicates: Vec<String>,
    pub invalid: Vec<RowError>,
    /// Active students on the roster after the upload.
    pub total_students: usize,
    pub department_distribution: BTreeMap<String, usize>,
}

/// Upsert every valid row by registration number.
///
/// Existing students are overwritten with the row and reactivated, which is
/// how a roster moves on to its next exam. Invalid rows are reported with
/// their index instead of failing the upload.
pub async fn create_students_bulk<R: FullRepository + ?Sized>(
    repo: &R,
    rows: &[StudentInput],
) -> RepositoryResult<StudentBulkReport> {
    if rows.is_empty() {
        return Err(RepositoryError::validation(
            "Expected a non-empty array of students",
        ));
    }

    let mut drafts = Vec::with_capacity(rows.len());
    let mut invalid = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        match row.normalize() {
            Ok(draft) => drafts.push(draft),
            Err(e) => {
                debug!("Student row {} rejected: {}", index, e);
                invalid.push(RowError {
                    index,
                    error: e.to_string(),
                });
            }
        }
    }

    let outcome = repo.upsert_students(&drafts).await?;
    let stats = department_stats(repo).await?;
    let report = StudentBulkReport {
        received: rows.len(),
        valid: drafts.len(),
        unique: drafts.len() - outcome.duplicates.len(),
        inserted: outcome.inserted.len(),
        updated: outcome.updated.len(),
        unchanged: outcome.unchanged,
        duplicates: outcome.duplicates,
        invalid,
        total_students: stats.values().map(|d| d.total).sum(),
        department_distribution: stats
            .into_iter()
            .map(|(department, d)| (department, d.total))
            .collect(),
    };
    info!(
        "Bulk student upload: {} received, {} inserted, {} updated, {} invalid",
        report.received,
        report.inserted,
        report.updated,
        report.invalid.len()
    );
    Ok(report)
}

// ==================== Faculty duty ====================

pub async fn list_faculty_allocations<R: FullRepository + ?Sized>(
    repo: &R,
    exam: Option<ExamId>,
) -> RepositoryResult<Vec<FacultyAllocation>> {
    repo.find_faculty_allocations(&FacultyAllocationFilter {
        faculty_id: None,
        exams: exam.map(|e| vec![e]),
    })
    .await
}

/// The exam and room a duty refers to; both must exist and be active.
async fn duty_targets<R: FullRepository + ?Sized>(
    repo: &R,
    duty: &NewFacultyAllocation,
) -> RepositoryResult<(Exam, Room)> {
    if duty.faculty_id.trim().is_empty() || duty.faculty_name.trim().is_empty() {
        return Err(RepositoryError::validation(
            "faculty_id and faculty_name are required",
        ));
    }
    let exam = get_exam(repo, duty.exam).await?;
    let room = get_room(repo, duty.room).await?;
    if !exam.active || !room.active {
        return Err(RepositoryError::validation(format!(
            "exam {} and room {} must both be active",
            exam.id, room.room_no
        )));
    }
    Ok((exam, room))
}

/// Assign a faculty member to an (exam, room) duty.
///
/// The exam and room must exist and be active.
pub async fn create_faculty_allocation<R: FullRepository + ?Sized>(
    repo: &R,
    duty: &NewFacultyAllocation,
) -> RepositoryResult<FacultyAllocation> {
    let (exam, room) = duty_targets(repo, duty).await?;
    let stored = repo.create_faculty_allocation(duty).await?;
    info!(
        "Faculty {} assigned to exam {} in room {}",
        stored.faculty_id, exam.id, room.room_no
    );
    Ok(stored)
}

/// A duty row the bulk upload could not create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacultyRowError {
    pub faculty_id: String,
    pub faculty_name: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacultyBulkReport {
    pub created: Vec<FacultyAllocation>,
    pub errors: Vec<FacultyRowError>,
}

/// True when the faculty member already has a duty in the exam's slot.
async fn has_slot_duty<R: FullRepository + ?Sized>(
    repo: &R,
    faculty_id: &str,
    exam: &Exam,
) -> RepositoryResult<bool> {
    let Ok(day) = exam.calendar_day() else {
        return Ok(false);
    };
    let duties = repo
        .find_faculty_allocations(&FacultyAllocationFilter {
            faculty_id: Some(faculty_id.to_string()),
            exams: None,
        })
        .await?;
    for duty in duties {
        if let Some(other) = repo.find_exam(duty.exam).await? {
            if other.time == exam.time && other.calendar_day().ok() == Some(day) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Create a batch of duties row by row.
///
/// A row with a blank faculty id, name or email rejects the whole batch.
/// Otherwise each row is created independently; a faculty member already on
/// duty in the same slot, or any other failure, is reported for that row.
pub async fn create_faculty_allocations_bulk<R: FullRepository + ?Sized>(
    repo: &R,
    duties: &[NewFacultyAllocation],
) -> RepositoryResult<FacultyBulkReport> {
    if duties.is_empty() {
        return Err(RepositoryError::validation(
            "Expected a non-empty array of faculty allocations",
        ));
    }
    let incomplete = duties
        .iter()
        .filter(|d| {
            d.faculty_id.trim().is_empty()
                || d.faculty_name.trim().is_empty()
                || d.email.trim().is_empty()
        })
        .count();
    if incomplete > 0 {
        return Err(RepositoryError::validation(format!(
            "{} allocation(s) missing faculty_id, faculty_name or email",
            incomplete
        )));
    }

    let mut report = FacultyBulkReport::default();
    for duty in duties {
        let duty = NewFacultyAllocation {
            faculty_id: duty.faculty_id.trim().to_string(),
            faculty_name: duty.faculty_name.trim().to_string(),
            email: duty.email.trim().to_string(),
            ..duty.clone()
        };
        let result = match get_exam(repo, duty.exam).await {
            Ok(exam) => {
                if has_slot_duty(repo, &duty.faculty_id, &exam).await? {
                    Err(format!("Already allocated on {} {}", exam.date, exam.time))
                } else {
                    create_faculty_allocation(repo, &duty)
                        .await
                        .map_err(|e| e.to_string())
                }
            }
            Err(e) => Err(e.to_string()),
        };
        match result {
            Ok(stored) => report.created.push(stored),
            Err(error) => report.errors.push(FacultyRowError {
                faculty_id: duty.faculty_id,
                faculty_name: duty.faculty_name,
                error,
            }),
        }
    }
    info!(
        "Bulk faculty allocation: {} created, {} failed",
        report.created.len(),
        report.errors.len()
    );
    Ok(report)
}

/// Apply a partial update to a duty. The resulting exam and room must exist
/// and be active.
pub async fn update_faculty_allocation<R: FullRepository + ?Sized>(
    repo: &R,
    id: FacultyAllocationId,
    patch: &FacultyAllocationPatch,
) -> RepositoryResult<FacultyAllocation> {
    let stored = repo
        .find_faculty_allocations(&FacultyAllocationFilter::default())
        .await?
        .into_iter()
        .find(|d| d.id == id)
        .ok_or_else(|| {
            RepositoryError::not_found(format!("Faculty allocation {} not found", id))
                .with_entity("faculty_allocation", id)
        })?;
    let duty = patch.apply_to(&stored);
    duty_targets(repo, &duty).await?;
    let updated = repo.update_faculty_allocation(id, &duty).await?;
    info!("Updated faculty allocation {}", updated.id);
    Ok(updated)
}

pub async fn delete_faculty_allocation<R: FullRepository + ?Sized>(
    repo: &R,
    id: FacultyAllocationId,
) -> RepositoryResult<FacultyAllocation> {
    repo.delete_faculty_allocation(id).await
}

/// Remove every duty of the given exams.
pub async fn clear_faculty_allocations<R: FullRepository + ?Sized>(
    repo: &R,
    exams: &[ExamId],
) -> RepositoryResult<usize> {
    if exams.is_empty() {
        return Err(RepositoryError::validation("exam_ids array is required"));
    }
    let deleted = repo.delete_faculty_allocations_for_exams(exams).await?;
    info!("Cleared {} faculty allocations for {} exams", deleted, exams.len());
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::models::DateInput;

    fn exam_row(date: &str, code: &str) -> ExamInput {
        ExamInput {
            date: Some(DateInput::from(date)),
            time: Some("FN".into()),
            subject: Some("Algorithms".into()),
            subject_code: Some(code.into()),
            department: Some("CSE".into()),
            semester: Some("5".into()),
            exam_type: None,
        }
    }

    #[tokio::test]
    async fn test_exam_bulk_rejects_whole_batch_on_bad_row() {
        let repo = LocalRepository::new();
        let rows = vec![exam_row("2024-05-10", "CS501"), exam_row("not a date", "CS502")];
        let err = create_exams_bulk(&repo, &rows).await.unwrap_err();
        assert!(err.to_string().contains("Row 2"));
        assert!(list_exams(&repo).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_exam_bulk_reports_counts() {
        let repo = LocalRepository::new();
        create_exams_bulk(&repo, &[exam_row("2024-05-10", "CS501")])
            .await
            .unwrap();
        let report = create_exams_bulk(
            &repo,
            &[exam_row("10-05-2024", "CS501"), exam_row("2024-05-11", "CS502")],
        )
        .await
        .unwrap();
        assert_eq!(report.received, 2);
        assert_eq!(report.inserted, 1);
        assert_eq!(report.updated, 1);
        assert_eq!(report.exams.len(), 1);
    }

    #[tokio::test]
    async fn test_student_bulk_reports_invalid_and_duplicates() {
        let repo = LocalRepository::new();
        let row = |reg: &str| StudentInput {
            name: Some("Ravi".into()),
            reg_no: Some(reg.into()),
            department: Some("ece".into()),
            semester: Some("2".into()),
            ..Default::default()
        };
        let mut missing = row("x");
        missing.name = None;

        let report = create_students_bulk(&repo, &[row("R1"), missing, row("r1"), row("R2")])
            .await
            .unwrap();
        assert_eq!(report.received, 4);
        assert_eq!(report.valid, 3);
        assert_eq!(report.unique, 2);
        assert_eq!(report.inserted, 2);
        assert_eq!(report.duplicates, vec!["r1".to_string()]);
        assert_eq!(report.invalid.len(), 1);
        assert_eq!(report.invalid[0].index, 1);
        assert_eq!(report.total_students, 2);
        assert_eq!(report.department_distribution.get("ECE"), Some(&2));

        let mut moved = row("R2");
        moved.semester = Some("4".into());
        let report = create_students_bulk(&repo, &[row("R1"), moved]).await.unwrap();
        assert_eq!(report.inserted, 0);
        assert_eq!(report.updated, 1);
        assert_eq!(report.unchanged, 1);

        let stats = department_stats(&repo).await.unwrap();
        assert_eq!(stats["ECE"].total, 2);
        assert_eq!(stats["ECE"].semesters.get("4"), Some(&1));
        let fourth = list_students_by_department(&repo, Some(" ece "), Some("4"))
            .await
            .unwrap();
        assert_eq!(fourth.len(), 1);
        assert_eq!(fourth[0].reg_no, "r2");
    }

    async fn seeded_slot(repo: &LocalRepository) -> (Exam, Exam, Room) {
        create_exams_bulk(
            repo,
            &[exam_row("2024-05-10", "CS501"), exam_row("10-05-2024", "EC501")],
        )
        .await
        .unwrap();
        let exams = list_exams(repo).await.unwrap();
        let room = create_room(
            repo,
            &RoomInput {
                room_no: Some("A101".into()),
                floor_no: Some(1i64.into()),
                block: Some("A".into()),
                capacity: Some(30i64.into()),
                room_type: Some("Classroom".into()),
            },
        )
        .await
        .unwrap();
        (exams[0].clone(), exams[1].clone(), room)
    }

    fn duty(faculty_id: &str, exam: ExamId, room: RoomId) -> NewFacultyAllocation {
        NewFacultyAllocation {
            faculty_id: faculty_id.into(),
            faculty_name: format!("Faculty {}", faculty_id),
            designation: Default::default(),
            role: Default::default(),
            email: format!("{}@college.edu", faculty_id.to_lowercase()),
            exam,
            room,
        }
    }

    #[tokio::test]
    async fn test_faculty_bulk_reports_slot_conflicts_per_row() {
        let repo = LocalRepository::new();
        let (cs, ec, room) = seeded_slot(&repo).await;

        let report = create_faculty_allocations_bulk(
            &repo,
            &[
                duty("F1", cs.id, room.id),
                duty("F1", ec.id, room.id),
                duty("F2", ExamId::new(99), room.id),
                duty("F3", ec.id, room.id),
            ],
        )
        .await
        .unwrap();
        assert_eq!(report.created.len(), 2);
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.errors[0].faculty_id, "F1");
        assert!(report.errors[0].error.contains("Already allocated"));
        assert_eq!(report.errors[1].faculty_id, "F2");

        let mut blank = duty("F4", cs.id, room.id);
        blank.email = " ".into();
        let err = create_faculty_allocations_bulk(&repo, &[duty("F5", cs.id, room.id), blank])
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
        assert_eq!(list_faculty_allocations(&repo, None).await.unwrap().len(), 2);

        assert_eq!(clear_faculty_allocations(&repo, &[ec.id]).await.unwrap(), 1);
        assert!(clear_faculty_allocations(&repo, &[]).await.is_err());
        assert_eq!(list_faculty_allocations(&repo, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_faculty_update_rechecks_targets() {
        let repo = LocalRepository::new();
        let (cs, _, room) = seeded_slot(&repo).await;
        let stored = create_faculty_allocation(&repo, &duty("F1", cs.id, room.id))
            .await
            .unwrap();

        let renamed = update_faculty_allocation(
            &repo,
            stored.id,
            &FacultyAllocationPatch {
                faculty_name: Some("Dr. Rao".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(renamed.faculty_name, "Dr. Rao");
        assert_eq!(renamed.exam, cs.id);

        let err = update_faculty_allocation(
            &repo,
            stored.id,
            &FacultyAllocationPatch {
                room: Some(RoomId::new(404)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));

        deactivate_room(&repo, room.id).await.unwrap();
        let err = update_faculty_allocation(&repo, stored.id, &FacultyAllocationPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn test_faculty_allocation_requires_existing_exam() {
        let repo = LocalRepository::new();
        let err = create_faculty_allocation(
            &repo,
            &NewFacultyAllocation {
                faculty_id: "F1".into(),
                faculty_name: "Dr. Rao".into(),
                designation: Default::default(),
                role: Default::default(),
                email: "rao@college.edu".into(),
                exam: ExamId::new(1),
                room: RoomId::new(1),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }
}
