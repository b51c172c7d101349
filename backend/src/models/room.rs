//! Room inventory records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{required_text, InputError, LooseText};
use crate::api::RoomId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    Classroom,
    Lab,
    #[serde(rename = "drawinghall")]
    DrawingHall,
}

impl RoomType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomType::Classroom => "classroom",
            RoomType::Lab => "lab",
            RoomType::DrawingHall => "drawinghall",
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "classroom" => Ok(RoomType::Classroom),
            "lab" => Ok(RoomType::Lab),
            "drawinghall" | "drawing_hall" | "drawing hall" => Ok(RoomType::DrawingHall),
            other => Err(format!(
                "unknown room type '{}' (expected classroom, lab or drawinghall)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub room_no: String,
    pub floor_no: i32,
    pub block: String,
    pub capacity: u32,
    pub room_type: RoomType,
    pub active: bool,
}

/// Raw room row from a request body or bulk upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomInput {
    #[serde(default)]
    pub room_no: Option<LooseText>,
    #[serde(default)]
    pub floor_no: Option<LooseText>,
    #[serde(default)]
    pub block: Option<LooseText>,
    #[serde(default)]
    pub capacity: Option<LooseText>,
    #[serde(default)]
    pub room_type: Option<LooseText>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomDraft {
    pub room_no: String,
    pub floor_no: i32,
    pub block: String,
    pub capacity: u32,
    pub room_type: RoomType,
}

impl RoomDraft {
    pub fn into_room(self, id: RoomId) -> Room {
        Room {
            id,
            room_no: self.room_no,
            floor_no: self.floor_no,
            block: self.block,
            capacity: self.capacity,
            room_type: self.room_type,
            active: true,
        }
    }
}

impl RoomInput {
    /// Fill the fields an update body leaves out from the stored room.
    pub fn merged_over(&self, room: &Room) -> RoomInput {
        RoomInput {
            room_no: self
                .room_no
                .clone()
                .or_else(|| Some(room.room_no.as_str().into())),
            floor_no: self
                .floor_no
                .clone()
                .or_else(|| Some(i64::from(room.floor_no).into())),
            block: self.block.clone().or_else(|| Some(room.block.as_str().into())),
            capacity: self
                .capacity
                .clone()
                .or_else(|| Some(i64::from(room.capacity).into())),
            room_type: self
                .room_type
                .clone()
                .or_else(|| Some(room.room_type.as_str().into())),
        }
    }

    pub fn normalize(&self) -> Result<RoomDraft, InputError> {
        let room_no = required_text(&self.room_no);
        let block = required_text(&self.block);
        let room_type = required_text(&self.room_type);

        let mut missing = Vec::new();
        if room_no.is_none() {
            missing.push("room_no");
        }
        if self.floor_no.is_none() {
            missing.push("floor_no");
        }
        if block.is_none() {
            missing.push("block");
        }
        if self.capacity.is_none() {
            missing.push("capacity");
        }
        if room_type.is_none() {
            missing.push("room_type");
        }
        let (Some(room_no), Some(floor), Some(block), Some(capacity), Some(room_type)) =
            (room_no, &self.floor_no, block, &self.capacity, room_type)
        else {
            return Err(InputError::MissingFields(missing));
        };

        let floor_no = floor
            .as_i64()
            .and_then(|f| i32::try_from(f).ok())
            .ok_or_else(|| InputError::invalid("floor_no", floor.normalized()))?;
        let capacity = capacity
            .as_i64()
            .and_then(|c| u32::try_from(c).ok())
            .filter(|c| *c >= 1)
            .ok_or_else(|| {
                InputError::invalid(
                    "capacity",
                    format!("must be a positive integer, got '{}'", capacity.normalized()),
                )
            })?;
        let room_type = room_type
            .parse()
            .map_err(|e: String| InputError::invalid("room_type", e))?;

        Ok(RoomDraft {
            room_no,
            floor_no,
            block,
            capacity,
            room_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_type_round_trip_names() {
        assert_eq!("DrawingHall".parse::<RoomType>().unwrap(), RoomType::DrawingHall);
        assert_eq!(
            serde_json::to_string(&RoomType::DrawingHall).unwrap(),
            "\"drawinghall\""
        );
        assert!("auditorium".parse::<RoomType>().is_err());
    }

    #[test]
    fn test_normalize_room_input() {
        let input = RoomInput {
            room_no: Some(" A-101 ".into()),
            floor_no: Some("1".into()),
            block: Some("A".into()),
            capacity: Some(30i64.into()),
            room_type: Some("Classroom".into()),
        };
        let draft = input.normalize().unwrap();
        assert_eq!(draft.room_no, "A-101");
        assert_eq!(draft.floor_no, 1);
        assert_eq!(draft.capacity, 30);
        assert_eq!(draft.room_type, RoomType::Classroom);
    }

    #[test]
    fn test_capacity_must_be_positive() {
        let input = RoomInput {
            room_no: Some("L1".into()),
            floor_no: Some(0i64.into()),
            block: Some("B".into()),
            capacity: Some(0i64.into()),
            room_type: Some("lab".into()),
        };
        assert!(matches!(
            input.normalize(),
            Err(InputError::Invalid { field: "capacity", .. })
        ));
    }

    #[test]
    fn test_merged_over_keeps_stored_fields() {
        let stored = RoomDraft {
            room_no: "A101".to_string(),
            floor_no: 1,
            block: "A".to_string(),
            capacity: 30,
            room_type: RoomType::Classroom,
        }
        .into_room(RoomId::new(4));
        let patch = RoomInput {
            capacity: Some("45".into()),
            room_type: Some("Lab".into()),
            ..Default::default()
        };
        let draft = patch.merged_over(&stored).normalize().unwrap();
        assert_eq!(draft.room_no, "A101");
        assert_eq!(draft.block, "A");
        assert_eq!(draft.capacity, 45);
        assert_eq!(draft.room_type, RoomType::Lab);

        let zero = RoomInput {
            capacity: Some(0i64.into()),
            ..Default::default()
        };
        assert!(zero.merged_over(&stored).normalize().is_err());
    }
}
