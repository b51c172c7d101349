//! Start-up seed documents for the local store.
//!
//! A seed file is a JSON object with optional `rooms`, `exams` and `students`
//! arrays, each row in the same loose shape accepted by the bulk endpoints.

use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::repository::{FullRepository, RepositoryError, RepositoryResult};
use crate::models::{ExamInput, RoomInput, StudentInput};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub rooms: Vec<RoomInput>,
    #[serde(default)]
    pub exams: Vec<ExamInput>,
    #[serde(default)]
    pub students: Vec<StudentInput>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedSummary {
    pub rooms: usize,
    pub exams: usize,
    /// Students inserted or overwritten; identical re-seeds count zero.
    pub students: usize,
    /// Rows rejected by validation or uniqueness, one message each.
    pub skipped: Vec<String>,
}

impl SeedData {
    pub fn from_file<P: AsRef<Path>>(path: P) -> RepositoryResult<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            RepositoryError::configuration(format!(
                "Failed to read seed file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            RepositoryError::configuration(format!("Failed to parse seed file: {}", e))
        })
    }
}

/// Load seed rows into any repository. Invalid rows are skipped and reported.
pub async fn apply_seed<R: FullRepository + ?Sized>(
    repo: &R,
    seed: &SeedData,
) -> RepositoryResult<SeedSummary> {
    let mut summary = SeedSummary::default();

    let mut rooms = Vec::new();
    for (index, row) in seed.rooms.iter().enumerate() {
        match row.normalize() {
            Ok(draft) => rooms.push(draft),
            Err(e) => summary.skipped.push(format!("rooms[{}]: {}", index, e)),
        }
    }
    let room_outcome = repo.create_rooms(&rooms).await?;
    summary.rooms = room_outcome.created.len();
    summary.skipped.extend(
        room_outcome
            .duplicates
            .iter()
            .map(|no| format!("room {} already exists", no)),
    );

    let mut exams = Vec::new();
    for (index, row) in seed.exams.iter().enumerate() {
        match row.normalize() {
            Ok(draft) => exams.push(draft),
            Err(e) => summary.skipped.push(format!("exams[{}]: {}", index, e)),
        }
    }
    let exam_summary = repo.upsert_exams(&exams).await?;
    summary.exams = exam_summary.inserted.len() + exam_summary.reactivated.len();

    let mut students = Vec::new();
    for (index, row) in seed.students.iter().enumerate() {
        match row.normalize() {
            Ok(draft) => students.push(draft),
            Err(e) => summary.skipped.push(format!("students[{}]: {}", index, e)),
        }
    }
    let student_outcome = repo.upsert_students(&students).await?;
    summary.students = student_outcome.inserted.len() + student_outcome.updated.len();
    summary.skipped.extend(
        student_outcome
            .duplicates
            .iter()
            .map(|reg| format!("student {} repeated in seed", reg)),
    );

    for skipped in &summary.skipped {
        warn!("Seed row skipped: {}", skipped);
    }
    info!(
        "Seed loaded: {} rooms, {} exams, {} students ({} skipped)",
        summary.rooms,
        summary.exams,
        summary.students,
        summary.skipped.len()
    );
    Ok(summary)
}
