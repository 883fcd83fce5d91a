//! Rooms, room categories and room status.

use std::fmt;

use chrono::{DateTime, Utc};
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Room category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSql, FromSql)]
#[postgres(name = "room_type")]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    #[postgres(name = "single")]
    Single,
    #[postgres(name = "double")]
    Double,
    #[postgres(name = "suite")]
    Suite,
    #[postgres(name = "deluxe")]
    Deluxe,
}

impl RoomType {
    pub fn as_str(self) -> &'static str {
        match self {
            RoomType::Single => "single",
            RoomType::Double => "double",
            RoomType::Suite => "suite",
            RoomType::Deluxe => "deluxe",
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current status of a room.
///
/// `Available` and `Occupied` are derived from the active reservation set;
/// `Maintenance` and `OutOfService` are staff-authored and stick until
/// cleared by staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSql, FromSql)]
#[postgres(name = "room_status")]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    #[postgres(name = "available")]
    Available,
    #[postgres(name = "occupied")]
    Occupied,
    #[postgres(name = "maintenance")]
    Maintenance,
    #[postgres(name = "out_of_service")]
    OutOfService,
}

impl RoomStatus {
    /// Staff-authored states that status derivation must not overwrite.
    pub fn is_staff_override(self) -> bool {
        matches!(self, RoomStatus::Maintenance | RoomStatus::OutOfService)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RoomStatus::Available => "available",
            RoomStatus::Occupied => "occupied",
            RoomStatus::Maintenance => "maintenance",
            RoomStatus::OutOfService => "out_of_service",
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A hotel room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: Uuid,
    /// Human-facing room number, unique across the hotel.
    pub number: String,
    pub room_type: RoomType,
    pub floor: i32,
    pub capacity: i32,
    pub price_per_night: Decimal,
    pub description: Option<String>,
    /// Derived/cached status; see [`RoomStatus`].
    pub status: RoomStatus,
    /// Soft-delete flag; deleted rooms are invisible to every lookup.
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Room {
    /// Create a room with a fresh id and timestamps, starting available.
    pub fn new(
        number: impl Into<String>,
        room_type: RoomType,
        floor: i32,
        capacity: i32,
        price_per_night: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            number: number.into(),
            room_type,
            floor,
            capacity,
            price_per_night,
            description: None,
            status: RoomStatus::Available,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the room can take bookings at all: it exists, is not
    /// soft-deleted and is not under a staff override.
    pub fn is_bookable(&self) -> bool {
        !self.deleted && !self.status.is_staff_override()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_staff_override_states() {
        assert!(RoomStatus::Maintenance.is_staff_override());
        assert!(RoomStatus::OutOfService.is_staff_override());
        assert!(!RoomStatus::Available.is_staff_override());
        assert!(!RoomStatus::Occupied.is_staff_override());
    }

    #[test]
    fn test_bookable() {
        let mut room = Room::new("101", RoomType::Double, 1, 2, dec!(120.00));
        assert!(room.is_bookable());

        room.status = RoomStatus::Maintenance;
        assert!(!room.is_bookable());

        room.status = RoomStatus::Occupied;
        assert!(room.is_bookable());

        room.deleted = true;
        assert!(!room.is_bookable());
    }
}
