#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use exam_seating::api::StudentId;
use exam_seating::db::repositories::LocalRepository;
use exam_seating::db::repository::StudentRepository;
use exam_seating::models::{
    CalendarDay, DateInput, ExamDraft, ExamSession, ExamType, RoomDraft, RoomType, Student,
    StudentDraft, StudentType,
};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub const DEPT: &str = "CSE";
pub const SEM: &str = "5";
pub const CODE: &str = "CS501";
pub const SUBJECT: &str = "Compiler Design";

pub fn exam_day() -> CalendarDay {
    CalendarDay::from_ymd(2024, 5, 2).unwrap()
}

pub fn room(room_no: &str, capacity: u32, room_type: RoomType) -> RoomDraft {
    RoomDraft {
        room_no: room_no.to_string(),
        floor_no: 1,
        block: room_no.chars().take(1).collect(),
        capacity,
        room_type,
    }
}

pub fn exam(subject_code: &str, day: CalendarDay, time: ExamSession) -> ExamDraft {
    ExamDraft {
        day,
        time,
        subject: format!("Subject {}", subject_code),
        subject_code: subject_code.to_string(),
        department: DEPT.to_string(),
        semester: SEM.to_string(),
        exam_type: ExamType::Regular,
    }
}

/// The default exam: CS501, 2024-05-02 forenoon.
pub fn default_exam() -> ExamDraft {
    ExamDraft {
        subject: SUBJECT.to_string(),
        ..exam(CODE, exam_day(), ExamSession::Forenoon)
    }
}

pub fn student(reg_no: &str, subject_code: &str, day: CalendarDay) -> StudentDraft {
    StudentDraft {
        name: format!("Student {}", reg_no),
        reg_no: reg_no.to_string(),
        department: DEPT.to_string(),
        semester: SEM.to_string(),
        email: None,
        exam_day: Some(day),
        subject: format!("Subject {}", subject_code),
        subject_code: subject_code.to_string(),
        student_type: StudentType::Regular,
    }
}

/// A stored student document with a raw (possibly legacy) exam date.
pub fn student_record(reg_no: &str, exam_date: Option<DateInput>) -> Student {
    Student {
        id: StudentId::new(0),
        name: format!("Student {}", reg_no),
        reg_no: reg_no.to_string(),
        department: DEPT.to_string(),
        semester: SEM.to_string(),
        email: None,
        exam_date,
        subject: SUBJECT.to_string(),
        subject_code: CODE.to_string(),
        student_type: StudentType::Regular,
        active: true,
    }
}

/// `count` students sitting `subject_code` on `day`, registration numbers
/// `{prefix}001`, `{prefix}002`, ...
pub async fn seed_students(
    repo: &LocalRepository,
    prefix: &str,
    count: usize,
    subject_code: &str,
    day: CalendarDay,
) -> Vec<Student> {
    let mut created = Vec::with_capacity(count);
    for i in 1..=count {
        let reg_no = format!("{}{:03}", prefix, i);
        created.push(
            repo.create_student(&student(&reg_no, subject_code, day))
                .await
                .unwrap(),
        );
    }
    created
}
