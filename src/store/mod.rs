//! Storage boundary for hotel state.
//!
//! The booking core talks to guests, rooms and reservations only through
//! [`HotelStore`]. Two implementations ship: an in-memory one for tests and
//! embedded use, and a Postgres one for deployments.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Guest, Reservation, ReservationStatus, Room, RoomStatus};
use crate::error::DatabaseError;

/// Storage abstraction over guests, rooms and reservations.
///
/// Soft-deleted guests and rooms are invisible through every read here;
/// reads never resurrect them. Individual methods are atomic, but
/// check-then-write sequences are not — the booking coordinator serializes
/// those per room.
#[async_trait]
pub trait HotelStore: Send + Sync {
    // --- Guests ---

    async fn insert_guest(&self, guest: &Guest) -> Result<(), DatabaseError>;

    async fn get_guest(&self, id: Uuid) -> Result<Option<Guest>, DatabaseError>;

    async fn get_guest_by_email(&self, email: &str) -> Result<Option<Guest>, DatabaseError>;

    async fn update_guest(&self, guest: &Guest) -> Result<(), DatabaseError>;

    async fn list_guests(&self) -> Result<Vec<Guest>, DatabaseError>;

    // --- Rooms ---

    async fn insert_room(&self, room: &Room) -> Result<(), DatabaseError>;

    async fn get_room(&self, id: Uuid) -> Result<Option<Room>, DatabaseError>;

    async fn get_room_by_number(&self, number: &str) -> Result<Option<Room>, DatabaseError>;

    async fn update_room(&self, room: &Room) -> Result<(), DatabaseError>;

    /// Refresh only the derived status column.
    async fn update_room_status(&self, id: Uuid, status: RoomStatus) -> Result<(), DatabaseError>;

    async fn list_rooms(&self) -> Result<Vec<Room>, DatabaseError>;

    // --- Reservations ---

    async fn insert_reservation(&self, reservation: &Reservation) -> Result<(), DatabaseError>;

    async fn get_reservation(&self, id: Uuid) -> Result<Option<Reservation>, DatabaseError>;

    async fn get_reservation_by_number(
        &self,
        number: &str,
    ) -> Result<Option<Reservation>, DatabaseError>;

    async fn update_reservation(&self, reservation: &Reservation) -> Result<(), DatabaseError>;

    /// Reservations still holding a claim on the room (non-terminal status).
    async fn active_reservations_for_room(
        &self,
        room_id: Uuid,
    ) -> Result<Vec<Reservation>, DatabaseError>;

    async fn reservations_for_guest(
        &self,
        guest_id: Uuid,
    ) -> Result<Vec<Reservation>, DatabaseError>;

    async fn list_reservations(
        &self,
        status: Option<ReservationStatus>,
    ) -> Result<Vec<Reservation>, DatabaseError>;
}
