//! Exam schedule records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::calendar::{CalendarDay, DateInput, DateParseError};
use super::{required_text, InputError, LooseText};
use crate::api::ExamId;

/// Half-day session of an exam slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExamSession {
    /// Forenoon
    #[serde(rename = "FN")]
    Forenoon,
    /// Afternoon
    #[serde(rename = "AN")]
    Afternoon,
}

impl ExamSession {
    /// Session in progress at the given hour of day (afternoon starts at 14:00).
    pub fn for_hour(hour: u32) -> Self {
        if hour < 14 {
            ExamSession::Forenoon
        } else {
            ExamSession::Afternoon
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ExamSession::Forenoon => "FN",
            ExamSession::Afternoon => "AN",
        }
    }
}

impl fmt::Display for ExamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ExamSession {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "FN" => Ok(ExamSession::Forenoon),
            "AN" => Ok(ExamSession::Afternoon),
            other => Err(format!("time must be either 'FN' or 'AN', got '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamType {
    #[default]
    Regular,
    Supply,
}

impl ExamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExamType::Regular => "regular",
            ExamType::Supply => "supply",
        }
    }

    /// Lenient parse; anything unrecognized is a regular exam.
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("supply") => ExamType::Supply,
            _ => ExamType::Regular,
        }
    }
}

/// A stored exam occurrence.
///
/// `date` keeps the representation found in the store; it is resolved to a
/// calendar day only when needed, and may fail to resolve for legacy records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exam {
    pub id: ExamId,
    pub date: DateInput,
    pub time: ExamSession,
    pub subject: String,
    pub subject_code: String,
    pub department: String,
    pub semester: String,
    pub exam_type: ExamType,
    pub active: bool,
}

impl Exam {
    pub fn calendar_day(&self) -> Result<CalendarDay, DateParseError> {
        self.date.calendar_day()
    }

    /// Uniqueness key, or `None` when the stored date cannot be resolved.
    pub fn key(&self) -> Option<ExamKey> {
        self.calendar_day().ok().map(|day| ExamKey {
            day,
            time: self.time,
            subject_code: self.subject_code.clone(),
            department: self.department.clone(),
            semester: self.semester.clone(),
        })
    }
}

/// The (date, time, subjectCode, department, semester) identity of an exam.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExamKey {
    pub day: CalendarDay,
    pub time: ExamSession,
    pub subject_code: String,
    pub department: String,
    pub semester: String,
}

impl fmt::Display for ExamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}_{}",
            self.day, self.time, self.subject_code, self.department, self.semester
        )
    }
}

/// Raw exam row from a request body or bulk upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExamInput {
    #[serde(default)]
    pub date: Option<DateInput>,
    #[serde(default)]
    pub time: Option<LooseText>,
    #[serde(default)]
    pub subject: Option<LooseText>,
    #[serde(default, alias = "subjectCode")]
    pub subject_code: Option<LooseText>,
    #[serde(default)]
    pub department: Option<LooseText>,
    #[serde(default)]
    pub semester: Option<LooseText>,
    #[serde(default, rename = "type")]
    pub exam_type: Option<LooseText>,
}

/// Validated exam ready for insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamDraft {
    pub day: CalendarDay,
    pub time: ExamSession,
    pub subject: String,
    pub subject_code: String,
    pub department: String,
    pub semester: String,
    pub exam_type: ExamType,
}

impl ExamDraft {
    pub fn key(&self) -> ExamKey {
        ExamKey {
            day: self.day,
            time: self.time,
            subject_code: self.subject_code.clone(),
            department: self.department.clone(),
            semester: self.semester.clone(),
        }
    }

    pub fn into_exam(self, id: ExamId) -> Exam {
        Exam {
            id,
            date: DateInput::from(self.day),
            time: self.time,
            subject: self.subject,
            subject_code: self.subject_code,
            department: self.department,
            semester: self.semester,
            exam_type: self.exam_type,
            active: true,
        }
    }
}

impl ExamInput {
    /// Fill the fields an update body leaves out from the stored exam.
    pub fn merged_over(&self, exam: &Exam) -> ExamInput {
        ExamInput {
            date: self.date.clone().or_else(|| Some(exam.date.clone())),
            time: self.time.clone().or_else(|| Some(exam.time.code().into())),
            subject: self
                .subject
                .clone()
                .or_else(|| Some(exam.subject.as_str().into())),
            subject_code: self
                .subject_code
                .clone()
                .or_else(|| Some(exam.subject_code.as_str().into())),
            department: self
                .department
                .clone()
                .or_else(|| Some(exam.department.as_str().into())),
            semester: self
                .semester
                .clone()
                .or_else(|| Some(exam.semester.as_str().into())),
            exam_type: self
                .exam_type
                .clone()
                .or_else(|| Some(exam.exam_type.as_str().into())),
        }
    }

    /// Validate and normalize: date resolved to a calendar day, session FN/AN,
    /// subject code and department upper-cased, semester within 1-8.
    pub fn normalize(&self) -> Result<ExamDraft, InputError> {
        let subject = required_text(&self.subject);
        let subject_code = required_text(&self.subject_code);
        let department = required_text(&self.department);
        let semester = required_text(&self.semester);
        let time = required_text(&self.time);

        let mut missing = Vec::new();
        if self.date.is_none() {
            missing.push("date");
        }
        if time.is_none() {
            missing.push("time");
        }
        if subject.is_none() {
            missing.push("subject");
        }
        if subject_code.is_none() {
            missing.push("subject_code");
        }
        if department.is_none() {
            missing.push("department");
        }
        if semester.is_none() {
            missing.push("semester");
        }
        let (Some(date), Some(time), Some(subject), Some(subject_code), Some(department), Some(semester)) =
            (&self.date, time, subject, subject_code, department, semester)
        else {
            return Err(InputError::MissingFields(missing));
        };

        let day = date
            .calendar_day()
            .map_err(|e| InputError::invalid("date", format!("{} ({})", e, date)))?;
        let time: ExamSession = time
            .parse()
            .map_err(|e: String| InputError::invalid("time", e))?;
        if !matches!(semester.parse::<u8>(), Ok(1..=8)) {
            return Err(InputError::invalid(
                "semester",
                format!("must be between 1-8, got '{}'", semester),
            ));
        }

        Ok(ExamDraft {
            day,
            time,
            subject,
            subject_code: subject_code.to_uppercase(),
            department: department.to_uppercase(),
            semester,
            exam_type: ExamType::parse_or_default(
                self.exam_type.as_ref().map(LooseText::normalized).as_deref(),
            ),
        })
    }
}
