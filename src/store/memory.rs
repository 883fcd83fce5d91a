//! In-memory store for tests and embedded use.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{Guest, Reservation, ReservationStatus, Room, RoomStatus};
use crate::error::DatabaseError;
use crate::store::HotelStore;

/// HashMap-backed [`HotelStore`].
#[derive(Default)]
pub struct MemoryStore {
    guests: RwLock<HashMap<Uuid, Guest>>,
    rooms: RwLock<HashMap<Uuid, Room>>,
    reservations: RwLock<HashMap<Uuid, Reservation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HotelStore for MemoryStore {
    async fn insert_guest(&self, guest: &Guest) -> Result<(), DatabaseError> {
        self.guests.write().await.insert(guest.id, guest.clone());
        Ok(())
    }

    async fn get_guest(&self, id: Uuid) -> Result<Option<Guest>, DatabaseError> {
        Ok(self
            .guests
            .read()
            .await
            .get(&id)
            .filter(|g| !g.deleted)
            .cloned())
    }

    async fn get_guest_by_email(&self, email: &str) -> Result<Option<Guest>, DatabaseError> {
        Ok(self
            .guests
            .read()
            .await
            .values()
            .find(|g| !g.deleted && g.email == email)
            .cloned())
    }

    async fn update_guest(&self, guest: &Guest) -> Result<(), DatabaseError> {
        self.guests.write().await.insert(guest.id, guest.clone());
        Ok(())
    }

    async fn list_guests(&self) -> Result<Vec<Guest>, DatabaseError> {
        let mut guests: Vec<Guest> = self
            .guests
            .read()
            .await
            .values()
            .filter(|g| !g.deleted)
            .cloned()
            .collect();
        guests.sort_by(|a, b| (&a.last_name, &a.first_name).cmp(&(&b.last_name, &b.first_name)));
        Ok(guests)
    }

    async fn insert_room(&self, room: &Room) -> Result<(), DatabaseError> {
        self.rooms.write().await.insert(room.id, room.clone());
        Ok(())
    }

    async fn get_room(&self, id: Uuid) -> Result<Option<Room>, DatabaseError> {
        Ok(self
            .rooms
            .read()
            .await
            .get(&id)
            .filter(|r| !r.deleted)
            .cloned())
    }

    async fn get_room_by_number(&self, number: &str) -> Result<Option<Room>, DatabaseError> {
        Ok(self
            .rooms
            .read()
            .await
            .values()
            .find(|r| !r.deleted && r.number == number)
            .cloned())
    }

    async fn update_room(&self, room: &Room) -> Result<(), DatabaseError> {
        self.rooms.write().await.insert(room.id, room.clone());
        Ok(())
    }

    async fn update_room_status(&self, id: Uuid, status: RoomStatus) -> Result<(), DatabaseError> {
        if let Some(room) = self.rooms.write().await.get_mut(&id) {
            room.status = status;
            room.updated_at = chrono::Utc::now();
        }
        Ok(())
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, DatabaseError> {
        let mut rooms: Vec<Room> = self
            .rooms
            .read()
            .await
            .values()
            .filter(|r| !r.deleted)
            .cloned()
            .collect();
        rooms.sort_by(|a, b| a.number.cmp(&b.number));
        Ok(rooms)
    }

    async fn insert_reservation(&self, reservation: &Reservation) -> Result<(), DatabaseError> {
        self.reservations
            .write()
            .await
            .insert(reservation.id, reservation.clone());
        Ok(())
    }

    async fn get_reservation(&self, id: Uuid) -> Result<Option<Reservation>, DatabaseError> {
        Ok(self.reservations.read().await.get(&id).cloned())
    }

    async fn get_reservation_by_number(
        &self,
        number: &str,
    ) -> Result<Option<Reservation>, DatabaseError> {
        Ok(self
            .reservations
            .read()
            .await
            .values()
            .find(|r| r.reservation_number == number)
            .cloned())
    }

    async fn update_reservation(&self, reservation: &Reservation) -> Result<(), DatabaseError> {
        self.reservations
            .write()
            .await
            .insert(reservation.id, reservation.clone());
        Ok(())
    }

    async fn active_reservations_for_room(
        &self,
        room_id: Uuid,
    ) -> Result<Vec<Reservation>, DatabaseError> {
        let mut out: Vec<Reservation> = self
            .reservations
            .read()
            .await
            .values()
            .filter(|r| r.room_id == room_id && r.status.is_active())
            .cloned()
            .collect();
        out.sort_by_key(|r| r.stay.check_in());
        Ok(out)
    }

    async fn reservations_for_guest(
        &self,
        guest_id: Uuid,
    ) -> Result<Vec<Reservation>, DatabaseError> {
        let mut out: Vec<Reservation> = self
            .reservations
            .read()
            .await
            .values()
            .filter(|r| r.guest_id == guest_id)
            .cloned()
            .collect();
        out.sort_by_key(|r| r.created_at);
        Ok(out)
    }

    async fn list_reservations(
        &self,
        status: Option<ReservationStatus>,
    ) -> Result<Vec<Reservation>, DatabaseError> {
        let mut out: Vec<Reservation> = self
            .reservations
            .read()
            .await
            .values()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        out.sort_by_key(|r| r.created_at);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RoomType;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_soft_deleted_rooms_are_invisible() {
        let store = MemoryStore::new();
        let mut room = Room::new("101", RoomType::Single, 1, 1, dec!(80.00));
        store.insert_room(&room).await.unwrap();

        assert!(store.get_room(room.id).await.unwrap().is_some());
        assert_eq!(store.list_rooms().await.unwrap().len(), 1);

        room.deleted = true;
        store.update_room(&room).await.unwrap();

        assert!(store.get_room(room.id).await.unwrap().is_none());
        assert!(store.get_room_by_number("101").await.unwrap().is_none());
        assert!(store.list_rooms().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_guest_email_lookup_skips_deleted() {
        let store = MemoryStore::new();
        let mut guest = Guest::new("Ada", "Lovelace", "ada@example.com");
        store.insert_guest(&guest).await.unwrap();

        assert!(
            store
                .get_guest_by_email("ada@example.com")
                .await
                .unwrap()
                .is_some()
        );

        guest.deleted = true;
        store.update_guest(&guest).await.unwrap();

        assert!(
            store
                .get_guest_by_email("ada@example.com")
                .await
                .unwrap()
                .is_none()
        );
    }
}
