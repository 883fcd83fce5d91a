//! Guest and room management.
//!
//! Administrative CRUD with uniform soft deletion: deleted guests and rooms
//! disappear from every lookup, conflict check and availability computation.
//! Staff status overrides (maintenance, out of service) live here too; the
//! booking core never authors those states.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{Guest, Room, RoomStatus, RoomType};
use crate::error::{BookingError, BookingResult};
use crate::store::HotelStore;

/// Input for registering a guest.
#[derive(Debug, Clone)]
pub struct NewGuest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl NewGuest {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phone: None,
            address: None,
            city: None,
            country: None,
        }
    }
}

/// Field-wise guest update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateGuest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub notes: Option<String>,
}

/// Input for registering a room.
#[derive(Debug, Clone)]
pub struct NewRoom {
    pub number: String,
    pub room_type: RoomType,
    pub floor: i32,
    pub capacity: i32,
    pub price_per_night: Decimal,
    pub description: Option<String>,
}

impl NewRoom {
    pub fn new(
        number: impl Into<String>,
        room_type: RoomType,
        floor: i32,
        capacity: i32,
        price_per_night: Decimal,
    ) -> Self {
        Self {
            number: number.into(),
            room_type,
            floor,
            capacity,
            price_per_night,
            description: None,
        }
    }
}

/// Field-wise room update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateRoom {
    pub number: Option<String>,
    pub room_type: Option<RoomType>,
    pub floor: Option<i32>,
    pub capacity: Option<i32>,
    pub price_per_night: Option<Decimal>,
    pub description: Option<String>,
}

/// Administrative CRUD over guests and rooms.
pub struct HotelRegistry {
    store: Arc<dyn HotelStore>,
}

impl HotelRegistry {
    pub fn new(store: Arc<dyn HotelStore>) -> Self {
        Self { store }
    }

    // --- Guests ---

    pub async fn create_guest(&self, input: NewGuest) -> BookingResult<Guest> {
        let email = input.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(BookingError::Validation(format!(
                "invalid email: {:?}",
                input.email
            )));
        }
        if self.store.get_guest_by_email(email).await?.is_some() {
            return Err(BookingError::Validation(format!(
                "a guest with email {email} already exists"
            )));
        }

        let mut guest = Guest::new(input.first_name, input.last_name, email);
        guest.phone = input.phone;
        guest.address = input.address;
        guest.city = input.city;
        guest.country = input.country;

        self.store.insert_guest(&guest).await?;
        tracing::debug!(guest = %guest.full_name(), "guest registered");
        Ok(guest)
    }

    pub async fn get_guest(&self, id: Uuid) -> BookingResult<Guest> {
        self.store
            .get_guest(id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("guest {id}")))
    }

    pub async fn list_guests(&self) -> BookingResult<Vec<Guest>> {
        Ok(self.store.list_guests().await?)
    }

    pub async fn update_guest(&self, id: Uuid, changes: UpdateGuest) -> BookingResult<Guest> {
        let mut guest = self.get_guest(id).await?;

        if let Some(email) = changes.email {
            if email != guest.email {
                if self.store.get_guest_by_email(&email).await?.is_some() {
                    return Err(BookingError::Validation(format!(
                        "a guest with email {email} already exists"
                    )));
                }
                guest.email = email;
            }
        }
        if let Some(v) = changes.first_name {
            guest.first_name = v;
        }
        if let Some(v) = changes.last_name {
            guest.last_name = v;
        }
        if let Some(v) = changes.phone {
            guest.phone = Some(v);
        }
        if let Some(v) = changes.address {
            guest.address = Some(v);
        }
        if let Some(v) = changes.city {
            guest.city = Some(v);
        }
        if let Some(v) = changes.country {
            guest.country = Some(v);
        }
        if let Some(v) = changes.notes {
            guest.notes = Some(v);
        }
        guest.updated_at = Utc::now();

        self.store.update_guest(&guest).await?;
        Ok(guest)
    }

    /// Soft-delete a guest; their history remains but they vanish from reads.
    pub async fn delete_guest(&self, id: Uuid) -> BookingResult<()> {
        let mut guest = self.get_guest(id).await?;
        guest.deleted = true;
        guest.updated_at = Utc::now();
        self.store.update_guest(&guest).await?;
        tracing::debug!(guest_id = %id, "guest soft-deleted");
        Ok(())
    }

    // --- Rooms ---

    pub async fn create_room(&self, input: NewRoom) -> BookingResult<Room> {
        if input.capacity <= 0 {
            return Err(BookingError::Validation(format!(
                "room capacity must be positive, got {}",
                input.capacity
            )));
        }
        if self.store.get_room_by_number(&input.number).await?.is_some() {
            return Err(BookingError::Validation(format!(
                "a room with number {} already exists",
                input.number
            )));
        }

        let mut room = Room::new(
            input.number,
            input.room_type,
            input.floor,
            input.capacity,
            input.price_per_night,
        );
        room.description = input.description;

        self.store.insert_room(&room).await?;
        tracing::debug!(room = %room.number, kind = %room.room_type, "room registered");
        Ok(room)
    }

    pub async fn get_room(&self, id: Uuid) -> BookingResult<Room> {
        self.store
            .get_room(id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("room {id}")))
    }

    pub async fn list_rooms(&self) -> BookingResult<Vec<Room>> {
        Ok(self.store.list_rooms().await?)
    }

    pub async fn update_room(&self, id: Uuid, changes: UpdateRoom) -> BookingResult<Room> {
        let mut room = self.get_room(id).await?;

        if let Some(number) = changes.number {
            if number != room.number {
                if self.store.get_room_by_number(&number).await?.is_some() {
                    return Err(BookingError::Validation(format!(
                        "a room with number {number} already exists"
                    )));
                }
                room.number = number;
            }
        }
        if let Some(v) = changes.room_type {
            room.room_type = v;
        }
        if let Some(v) = changes.floor {
            room.floor = v;
        }
        if let Some(v) = changes.capacity {
            if v <= 0 {
                return Err(BookingError::Validation(format!(
                    "room capacity must be positive, got {v}"
                )));
            }
            room.capacity = v;
        }
        if let Some(v) = changes.price_per_night {
            room.price_per_night = v;
        }
        if let Some(v) = changes.description {
            room.description = Some(v);
        }
        room.updated_at = Utc::now();

        self.store.update_room(&room).await?;
        Ok(room)
    }

    /// Staff override for maintenance / out-of-service, or clearing it back
    /// to available. The booking coordinator re-derives occupied/available
    /// on its next mutation of the room.
    pub async fn set_room_status(&self, id: Uuid, status: RoomStatus) -> BookingResult<Room> {
        let mut room = self.get_room(id).await?;
        room.status = status;
        room.updated_at = Utc::now();
        self.store.update_room(&room).await?;
        tracing::info!(room = %room.number, status = %status, "room status set by staff");
        Ok(room)
    }

    /// Soft-delete a room; it vanishes from listings and availability.
    pub async fn delete_room(&self, id: Uuid) -> BookingResult<()> {
        let mut room = self.get_room(id).await?;
        room.deleted = true;
        room.updated_at = Utc::now();
        self.store.update_room(&room).await?;
        tracing::debug!(room = %room.number, "room soft-deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;

    fn registry() -> HotelRegistry {
        HotelRegistry::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_duplicate_guest_email_rejected() {
        let registry = registry();
        registry
            .create_guest(NewGuest::new("Ada", "Lovelace", "ada@example.com"))
            .await
            .unwrap();

        let err = registry
            .create_guest(NewGuest::new("Ada", "Byron", "ada@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }

    #[tokio::test]
    async fn test_invalid_email_rejected() {
        let registry = registry();
        let err = registry
            .create_guest(NewGuest::new("No", "Email", "not-an-email"))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }

    #[tokio::test]
    async fn test_duplicate_room_number_rejected() {
        let registry = registry();
        registry
            .create_room(NewRoom::new("101", RoomType::Single, 1, 1, dec!(80.00)))
            .await
            .unwrap();

        let err = registry
            .create_room(NewRoom::new("101", RoomType::Suite, 1, 4, dec!(300.00)))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }

    #[tokio::test]
    async fn test_soft_deleted_guest_is_gone() {
        let registry = registry();
        let guest = registry
            .create_guest(NewGuest::new("Ada", "Lovelace", "ada@example.com"))
            .await
            .unwrap();

        registry.delete_guest(guest.id).await.unwrap();

        let err = registry.get_guest(guest.id).await.unwrap_err();
        assert!(matches!(err, BookingError::NotFound(_)));
        assert!(registry.list_guests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_room_reprices() {
        let registry = registry();
        let room = registry
            .create_room(NewRoom::new("301", RoomType::Deluxe, 3, 2, dec!(250.00)))
            .await
            .unwrap();

        let updated = registry
            .update_room(
                room.id,
                UpdateRoom {
                    price_per_night: Some(dec!(275.00)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price_per_night, dec!(275.00));
        assert_eq!(updated.number, "301");
    }
}
