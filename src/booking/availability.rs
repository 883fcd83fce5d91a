//! Read-side availability queries.

use crate::booking::conflict::find_conflict;
use crate::domain::{Room, RoomType, StayRange};
use crate::error::BookingResult;
use crate::store::HotelStore;

/// Optional narrowing for [`available_rooms`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RoomFilter {
    pub room_type: Option<RoomType>,
    pub min_capacity: Option<i32>,
    pub floor: Option<i32>,
}

impl RoomFilter {
    pub fn with_room_type(mut self, room_type: RoomType) -> Self {
        self.room_type = Some(room_type);
        self
    }

    pub fn with_min_capacity(mut self, min_capacity: i32) -> Self {
        self.min_capacity = Some(min_capacity);
        self
    }

    pub fn with_floor(mut self, floor: i32) -> Self {
        self.floor = Some(floor);
        self
    }

    fn matches(&self, room: &Room) -> bool {
        self.room_type.is_none_or(|t| room.room_type == t)
            && self.min_capacity.is_none_or(|c| room.capacity >= c)
            && self.floor.is_none_or(|f| room.floor == f)
    }
}

/// All bookable rooms with no active reservation overlapping `range`.
///
/// Always computed against the full active-reservation set; a stale answer
/// here would quietly permit a double booking. Soft-deleted rooms and rooms
/// under a staff override (maintenance, out of service) are never offered.
pub async fn available_rooms(
    store: &dyn HotelStore,
    range: StayRange,
    filter: RoomFilter,
) -> BookingResult<Vec<Room>> {
    let mut out = Vec::new();
    for room in store.list_rooms().await? {
        if !room.is_bookable() || !filter.matches(&room) {
            continue;
        }
        let active = store.active_reservations_for_room(room.id).await?;
        if find_conflict(&active, &range, None).is_none() {
            out.push(room);
        }
    }
    Ok(out)
}
