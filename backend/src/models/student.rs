//! Student roster records.

use serde::{Deserialize, Serialize};

use super::calendar::{CalendarDay, DateInput};
use super::{required_text, InputError, LooseText};
use crate::api::StudentId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentType {
    #[default]
    Regular,
    Supply,
    Improvement,
}

impl StudentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudentType::Regular => "regular",
            StudentType::Supply => "supply",
            StudentType::Improvement => "improvement",
        }
    }

    pub fn parse_or_default(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("supply") => StudentType::Supply,
            Some("improvement") => StudentType::Improvement,
            _ => StudentType::Regular,
        }
    }
}

/// One student's enrolment for a specific exam occurrence.
///
/// The occurrence is identified indirectly by (department, semester,
/// subject_code, exam_date) matching an [`Exam`](super::Exam).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    /// Lower-cased registration number, unique across the roster.
    pub reg_no: String,
    pub department: String,
    pub semester: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub exam_date: Option<DateInput>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub subject_code: String,
    #[serde(default)]
    pub student_type: StudentType,
    pub active: bool,
}

impl Student {
    /// Calendar day of the assigned exam, if present and resolvable.
    pub fn exam_day(&self) -> Option<CalendarDay> {
        self.exam_date.as_ref().and_then(|d| d.calendar_day().ok())
    }
}

/// Raw student row from a request body or bulk upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentInput {
    #[serde(default)]
    pub name: Option<LooseText>,
    #[serde(default, alias = "regNo")]
    pub reg_no: Option<LooseText>,
    #[serde(default)]
    pub department: Option<LooseText>,
    #[serde(default)]
    pub semester: Option<LooseText>,
    #[serde(default)]
    pub email: Option<LooseText>,
    #[serde(default, alias = "examDate")]
    pub exam_date: Option<DateInput>,
    #[serde(default)]
    pub subject: Option<LooseText>,
    #[serde(default, alias = "subjectCode")]
    pub subject_code: Option<LooseText>,
    #[serde(default, rename = "type")]
    pub student_type: Option<LooseText>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentDraft {
    pub name: String,
    pub reg_no: String,
    pub department: String,
    pub semester: String,
    pub email: Option<String>,
    pub exam_day: Option<CalendarDay>,
    pub subject: String,
    pub subject_code: String,
    pub student_type: StudentType,
}

impl StudentDraft {
    pub fn into_student(self, id: StudentId) -> Student {
        Student {
            id,
            name: self.name,
            reg_no: self.reg_no,
            department: self.department,
            semester: self.semester,
            email: self.email,
            exam_date: self.exam_day.map(DateInput::from),
            subject: self.subject,
            subject_code: self.subject_code,
            student_type: self.student_type,
            active: true,
        }
    }
}

impl StudentInput {
    /// Fill the fields an update body leaves out from the stored student.
    pub fn merged_over(&self, student: &Student) -> StudentInput {
        let text = |field: &Option<LooseText>, stored: &str| {
            field.clone().or_else(|| Some(stored.into()))
        };
        StudentInput {
            name: text(&self.name, &student.name),
            reg_no: text(&self.reg_no, &student.reg_no),
            department: text(&self.department, &student.department),
            semester: text(&self.semester, &student.semester),
            email: self
                .email
                .clone()
                .or_else(|| student.email.as_deref().map(LooseText::from)),
            exam_date: self.exam_date.clone().or_else(|| student.exam_date.clone()),
            subject: text(&self.subject, &student.subject),
            subject_code: text(&self.subject_code, &student.subject_code),
            student_type: text(&self.student_type, student.student_type.as_str()),
        }
    }

    /// Registration number lower-cased, department and subject code upper-cased,
    /// exam date resolved to a calendar day.
    pub fn normalize(&self) -> Result<StudentDraft, InputError> {
        let name = required_text(&self.name);
        let reg_no = required_text(&self.reg_no);
        let department = required_text(&self.department);
        let semester = required_text(&self.semester);

        let mut missing = Vec::new();
        if name.is_none() {
            missing.push("name");
        }
        if reg_no.is_none() {
            missing.push("reg_no");
        }
        if department.is_none() {
            missing.push("department");
        }
        if semester.is_none() {
            missing.push("semester");
        }
        let (Some(name), Some(reg_no), Some(department), Some(semester)) =
            (name, reg_no, department, semester)
        else {
            return Err(InputError::MissingFields(missing));
        };

        let email = required_text(&self.email).map(|e| e.to_lowercase());
        if let Some(email) = &email {
            let valid = email
                .split_once('@')
                .is_some_and(|(user, domain)| !user.is_empty() && domain.contains('.'));
            if !valid {
                return Err(InputError::invalid("email", email.clone()));
            }
        }

        let exam_day = match &self.exam_date {
            Some(date) => Some(
                date.calendar_day()
                    .map_err(|e| InputError::invalid("exam_date", format!("{} ({})", e, date)))?,
            ),
            None => None,
        };

        Ok(StudentDraft {
            name,
            reg_no: reg_no.to_lowercase(),
            department: department.to_uppercase(),
            semester,
            email,
            exam_day,
            subject: required_text(&self.subject).unwrap_or_default(),
            subject_code: required_text(&self.subject_code)
                .map(|c| c.to_uppercase())
                .unwrap_or_default(),
            student_type: StudentType::parse_or_default(
                self.student_type.as_ref().map(LooseText::normalized).as_deref(),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_student_input() {
        let input: StudentInput = serde_json::from_value(serde_json::json!({
            "name": " Asha ",
            "regNo": " 21CS001 ",
            "department": "cse",
            "semester": 3,
            "email": "Asha@College.EDU",
            "examDate": "2024-05-10T00:00:00.000Z",
            "subjectCode": "cs201",
            "type": "Supply"
        }))
        .unwrap();

        let draft = input.normalize().unwrap();
        assert_eq!(draft.name, "Asha");
        assert_eq!(draft.reg_no, "21cs001");
        assert_eq!(draft.department, "CSE");
        assert_eq!(draft.semester, "3");
        assert_eq!(draft.email.as_deref(), Some("asha@college.edu"));
        assert_eq!(draft.exam_day, CalendarDay::from_ymd(2024, 5, 10));
        assert_eq!(draft.subject_code, "CS201");
        assert_eq!(draft.student_type, StudentType::Supply);
    }

    #[test]
    fn test_invalid_email_rejected() {
        let input = StudentInput {
            name: Some("A".into()),
            reg_no: Some("r1".into()),
            department: Some("CSE".into()),
            semester: Some("1".into()),
            email: Some("not-an-email".into()),
            ..Default::default()
        };
        assert!(matches!(
            input.normalize(),
            Err(InputError::Invalid { field: "email", .. })
        ));
    }

    #[test]
    fn test_merged_over_moves_student_to_next_exam() {
        let stored = StudentInput {
            name: Some("Asha".into()),
            reg_no: Some("21CS001".into()),
            department: Some("cse".into()),
            semester: Some("5".into()),
            email: Some("asha@college.edu".into()),
            exam_date: Some(DateInput::from("2024-05-02")),
            subject_code: Some("CS501".into()),
            ..Default::default()
        }
        .normalize()
        .unwrap()
        .into_student(StudentId::new(7));

        let patch = StudentInput {
            exam_date: Some(DateInput::from("09-05-2024")),
            subject_code: Some("cs502".into()),
            ..Default::default()
        };
        let draft = patch.merged_over(&stored).normalize().unwrap();
        assert_eq!(draft.reg_no, "21cs001");
        assert_eq!(draft.email.as_deref(), Some("asha@college.edu"));
        assert_eq!(draft.exam_day, CalendarDay::from_ymd(2024, 5, 9));
        assert_eq!(draft.subject_code, "CS502");
    }

    #[test]
    fn test_exam_day_of_unparseable_stored_date() {
        let draft = StudentInput {
            name: Some("A".into()),
            reg_no: Some("r1".into()),
            department: Some("CSE".into()),
            semester: Some("1".into()),
            ..Default::default()
        }
        .normalize()
        .unwrap();
        let mut student = draft.into_student(StudentId::new(1));
        assert_eq!(student.exam_day(), None);

        student.exam_date = Some(DateInput::from("garbage"));
        assert_eq!(student.exam_day(), None);
    }
}
