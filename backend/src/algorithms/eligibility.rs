//! Eligible-student resolution for one exam.

use std::collections::HashSet;

use log::warn;

use crate::db::repository::{StudentFilter, SubjectMatch};
use crate::models::{CalendarDay, Exam, Student};

/// Store query selecting an exam's candidate students.
///
/// Subject code wins over subject name; with neither, any subject matches.
pub fn student_filter_for(exam: &Exam) -> StudentFilter {
    let code = exam.subject_code.trim();
    let name = exam.subject.trim();
    let subject = if !code.is_empty() {
        SubjectMatch::Code(code.to_string())
    } else if !name.is_empty() {
        SubjectMatch::NameContains(name.to_string())
    } else {
        SubjectMatch::Any
    };

    StudentFilter {
        department: Some(exam.department.clone()),
        semester: Some(exam.semester.clone()),
        active_only: true,
        subject,
    }
}

/// Students who must sit an exam, with the counts seen along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Eligibility {
    /// Unique by registration number, ascending.
    pub students: Vec<Student>,
    /// Candidates matching the query, before the date filter.
    pub candidates: usize,
    /// Candidates whose exam date falls on the exam day, before de-duplication.
    pub on_day: usize,
    /// Registration numbers skipped because their exam date did not parse.
    pub unparseable_dates: Vec<String>,
}

impl Eligibility {
    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}

/// Narrow `candidates` to students sitting on `exam_day`.
///
/// The first occurrence of a registration number (in `candidates` order)
/// wins. Candidates failing `filter` are dropped before counting.
pub fn resolve_eligible(
    exam_day: CalendarDay,
    filter: &StudentFilter,
    candidates: Vec<Student>,
) -> Eligibility {
    let candidates: Vec<Student> = candidates.into_iter().filter(|s| filter.matches(s)).collect();
    let candidate_count = candidates.len();

    let mut unparseable_dates = Vec::new();
    let mut on_day = Vec::new();
    for student in candidates {
        let Some(date) = &student.exam_date else {
            continue;
        };
        match date.calendar_day() {
            Ok(day) if day == exam_day => on_day.push(student),
            Ok(_) => {}
            Err(e) => {
                warn!(
                    "Student {} has an unparseable exam date '{}': {}",
                    student.reg_no, date, e
                );
                unparseable_dates.push(student.reg_no.clone());
            }
        }
    }
    let on_day_count = on_day.len();

    let mut seen = HashSet::new();
    let mut students: Vec<Student> = on_day
        .into_iter()
        .filter(|s| seen.insert(s.reg_no.clone()))
        .collect();
    students.sort_by(|a, b| a.reg_no.cmp(&b.reg_no));

    Eligibility {
        students,
        candidates: candidate_count,
        on_day: on_day_count,
        unparseable_dates,
    }
}
