//! Room inventory repository trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::RepositoryResult;
use crate::api::RoomId;
use crate::models::{Room, RoomDraft, RoomType};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomFilter {
    pub active_only: bool,
    pub room_type: Option<RoomType>,
}

impl RoomFilter {
    pub fn active() -> Self {
        Self {
            active_only: true,
            room_type: None,
        }
    }

    pub fn active_of_type(room_type: RoomType) -> Self {
        Self {
            active_only: true,
            room_type: Some(room_type),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkRoomOutcome {
    pub created: Vec<Room>,
    /// Room numbers that already existed and were left untouched.
    pub duplicates: Vec<String>,
}

#[async_trait]
pub trait RoomRepository: Send + Sync {
    async fn find_room(&self, id: RoomId) -> RepositoryResult<Option<Room>>;

    /// Rooms matching the filter, ordered by room number.
    async fn find_rooms(&self, filter: &RoomFilter) -> RepositoryResult<Vec<Room>>;

    /// # Errors
    /// * `ConstraintViolation(DuplicateRoomNumber)` - If the room number exists
    async fn create_room(&self, draft: &RoomDraft) -> RepositoryResult<Room>;

    /// Insert every draft whose room number is new; existing numbers are reported.
    async fn create_rooms(&self, drafts: &[RoomDraft]) -> RepositoryResult<BulkRoomOutcome>;

    /// Replace a room's fields; the active flag is kept.
    ///
    /// # Errors
    /// * `NotFound` - If no room has this id
    /// * `ConstraintViolation(DuplicateRoomNumber)` - If another room has the number
    async fn update_room(&self, id: RoomId, draft: &RoomDraft) -> RepositoryResult<Room>;

    async fn deactivate_room(&self, id: RoomId) -> RepositoryResult<Room>;
}
