//! Booking operations serialized per room.
//!
//! "Check availability, then reserve" must be atomic with respect to other
//! callers touching the same room. This module owns a lock table keyed by
//! room id and runs every check-then-write sequence inside the room's lock,
//! so at most one of two racing overlapping requests can win. The rest of
//! the core stays lock-unaware.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::booking::availability::{self, RoomFilter};
use crate::booking::conflict::find_conflict;
use crate::booking::lifecycle::{derive_room_status, ensure_check_in_window, ensure_transition};
use crate::domain::{
    CreateReservation, Guest, Reservation, ReservationStatus, Room, RoomStatus, StayRange,
};
use crate::error::{BookingError, BookingResult, DatabaseError};
use crate::store::HotelStore;

/// Requested changes to an existing reservation; `None` leaves the
/// corresponding aspect untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModifyReservation {
    pub new_range: Option<StayRange>,
    pub new_status: Option<ReservationStatus>,
}

impl ModifyReservation {
    pub fn range(new_range: StayRange) -> Self {
        Self {
            new_range: Some(new_range),
            new_status: None,
        }
    }

    pub fn status(new_status: ReservationStatus) -> Self {
        Self {
            new_range: None,
            new_status: Some(new_status),
        }
    }
}

/// Per-room mutual exclusion for check-then-write sequences.
struct RoomLocks {
    locks: RwLock<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl RoomLocks {
    fn new() -> Self {
        Self {
            locks: RwLock::new(HashMap::new()),
        }
    }

    /// Get or create the lock for a room.
    async fn for_room(&self, room_id: Uuid) -> Arc<Mutex<()>> {
        // Fast path: lock already exists
        {
            let locks = self.locks.read().await;
            if let Some(lock) = locks.get(&room_id) {
                return Arc::clone(lock);
            }
        }

        let mut locks = self.locks.write().await;
        // Double-check after acquiring write lock
        if let Some(lock) = locks.get(&room_id) {
            return Arc::clone(lock);
        }

        let lock = Arc::new(Mutex::new(()));
        locks.insert(room_id, Arc::clone(&lock));
        lock
    }
}

/// Serialized entry point for everything that books, moves or releases rooms.
pub struct BookingCoordinator {
    store: Arc<dyn HotelStore>,
    locks: RoomLocks,
}

impl BookingCoordinator {
    pub fn new(store: Arc<dyn HotelStore>) -> Self {
        Self {
            store,
            locks: RoomLocks::new(),
        }
    }

    /// The underlying store, for read-only callers.
    pub fn store(&self) -> &Arc<dyn HotelStore> {
        &self.store
    }

    /// Create a reservation for a guest.
    ///
    /// Validation happens before the room lock is taken; the conflict scan
    /// and the insert happen inside it. On conflict, nothing is mutated.
    pub async fn create_reservation(&self, req: CreateReservation) -> BookingResult<Reservation> {
        self.create_reservation_at(req, Utc::now().date_naive())
            .await
    }

    // Date-pinned variant so unit tests control "today".
    pub(crate) async fn create_reservation_at(
        &self,
        req: CreateReservation,
        today: NaiveDate,
    ) -> BookingResult<Reservation> {
        let stay = StayRange::new(req.check_in, req.check_out)?;
        if req.check_in < today {
            return Err(BookingError::Validation(format!(
                "check-in {} is in the past",
                req.check_in
            )));
        }
        if !matches!(
            req.initial_status,
            ReservationStatus::Pending | ReservationStatus::Confirmed
        ) {
            return Err(BookingError::Validation(format!(
                "a reservation cannot be created in status {}",
                req.initial_status
            )));
        }

        let guest = self.fetch_guest(req.guest_id).await?;
        let room = self.fetch_room(req.room_id).await?;
        if room.status.is_staff_override() {
            return Err(BookingError::Validation(format!(
                "room {} is {} and cannot be booked",
                room.number, room.status
            )));
        }

        let lock = self.locks.for_room(room.id).await;
        let _guard = lock.lock().await;

        let existing = self.store.active_reservations_for_room(room.id).await?;
        if let Some(conflicting) = find_conflict(&existing, &stay, None) {
            return Err(BookingError::Conflict {
                room_id: room.id,
                requested: stay,
                conflicting_reservation_id: Some(conflicting),
            });
        }

        let now = Utc::now();
        let reservation = Reservation {
            id: Uuid::new_v4(),
            reservation_number: Reservation::generate_number(today),
            guest_id: guest.id,
            room_id: room.id,
            stay,
            status: req.initial_status,
            total_amount: room.price_per_night * Decimal::from(stay.nights()),
            deposit_amount: req.deposit_amount,
            special_requests: req.special_requests,
            cancellation_reason: None,
            cancelled_at: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };

        self.insert_guarded(&reservation).await?;
        self.refresh_room_status(room.id, today).await?;

        tracing::info!(
            reservation = %reservation.reservation_number,
            room = %room.number,
            guest = %guest.full_name(),
            stay = %stay,
            "reservation created"
        );
        Ok(reservation)
    }

    /// Apply a date-range and/or status change to a reservation.
    ///
    /// Dates may only change while pending or confirmed, and are re-checked
    /// for conflicts (excluding the reservation itself) inside the room
    /// lock. Status changes follow the lifecycle table; check-in is also
    /// gated on today falling inside the stay.
    pub async fn modify_reservation(
        &self,
        id: Uuid,
        changes: ModifyReservation,
    ) -> BookingResult<Reservation> {
        self.modify_reservation_at(id, changes, Utc::now().date_naive())
            .await
    }

    pub(crate) async fn modify_reservation_at(
        &self,
        id: Uuid,
        changes: ModifyReservation,
        today: NaiveDate,
    ) -> BookingResult<Reservation> {
        let probe = self.fetch_reservation(id).await?;
        let room = self.fetch_room(probe.room_id).await?;

        let lock = self.locks.for_room(room.id).await;
        let _guard = lock.lock().await;

        // Re-read inside the lock; another caller may have moved it.
        let mut reservation = self.fetch_reservation(id).await?;

        if let Some(new_range) = changes.new_range {
            if !matches!(
                reservation.status,
                ReservationStatus::Pending | ReservationStatus::Confirmed
            ) {
                return Err(BookingError::Validation(format!(
                    "dates can only change while pending or confirmed, not {}",
                    reservation.status
                )));
            }
            let existing = self.store.active_reservations_for_room(room.id).await?;
            if let Some(conflicting) = find_conflict(&existing, &new_range, Some(reservation.id)) {
                return Err(BookingError::Conflict {
                    room_id: room.id,
                    requested: new_range,
                    conflicting_reservation_id: Some(conflicting),
                });
            }
            reservation.stay = new_range;
            reservation.total_amount = room.price_per_night * Decimal::from(new_range.nights());
        }

        if let Some(next) = changes.new_status {
            ensure_transition(reservation.status, next)?;
            if next == ReservationStatus::CheckedIn {
                ensure_check_in_window(&reservation, today)?;
            }
            if next == ReservationStatus::Cancelled {
                reservation.cancelled_at = Some(Utc::now());
            }
            reservation.status = next;
        }

        reservation.updated_at = Utc::now();
        self.update_guarded(&reservation).await?;
        self.refresh_room_status(room.id, today).await?;

        tracing::info!(
            reservation = %reservation.reservation_number,
            status = %reservation.status,
            "reservation updated"
        );
        Ok(reservation)
    }

    /// Cancel a reservation with a reason. Legal from any non-terminal state.
    pub async fn cancel_reservation(
        &self,
        id: Uuid,
        reason: impl Into<String>,
    ) -> BookingResult<Reservation> {
        self.cancel_reservation_at(id, reason.into(), Utc::now().date_naive())
            .await
    }

    pub(crate) async fn cancel_reservation_at(
        &self,
        id: Uuid,
        reason: String,
        today: NaiveDate,
    ) -> BookingResult<Reservation> {
        let probe = self.fetch_reservation(id).await?;
        let room = self.fetch_room(probe.room_id).await?;

        let lock = self.locks.for_room(room.id).await;
        let _guard = lock.lock().await;

        let mut reservation = self.fetch_reservation(id).await?;
        ensure_transition(reservation.status, ReservationStatus::Cancelled)?;

        reservation.status = ReservationStatus::Cancelled;
        reservation.cancellation_reason = Some(reason);
        reservation.cancelled_at = Some(Utc::now());
        reservation.updated_at = Utc::now();

        self.update_guarded(&reservation).await?;
        self.refresh_room_status(room.id, today).await?;

        tracing::info!(
            reservation = %reservation.reservation_number,
            room = %room.number,
            "reservation cancelled"
        );
        Ok(reservation)
    }

    /// Shorthand for the pending → confirmed transition.
    pub async fn confirm(&self, id: Uuid) -> BookingResult<Reservation> {
        self.modify_reservation(id, ModifyReservation::status(ReservationStatus::Confirmed))
            .await
    }

    /// Check the guest in; only permitted while today is inside the stay.
    pub async fn check_in(&self, id: Uuid) -> BookingResult<Reservation> {
        self.modify_reservation(id, ModifyReservation::status(ReservationStatus::CheckedIn))
            .await
    }

    /// Check the guest out, freeing the room for the rest of the stay.
    pub async fn check_out(&self, id: Uuid) -> BookingResult<Reservation> {
        self.modify_reservation(id, ModifyReservation::status(ReservationStatus::CheckedOut))
            .await
    }

    /// Look up a reservation by id.
    pub async fn reservation(&self, id: Uuid) -> BookingResult<Reservation> {
        self.fetch_reservation(id).await
    }

    /// Look up a reservation by its human-readable number.
    pub async fn reservation_by_number(&self, number: &str) -> BookingResult<Reservation> {
        self.store
            .get_reservation_by_number(number)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("reservation {number}")))
    }

    /// Every reservation a guest has ever made, oldest first.
    ///
    /// Unknown or soft-deleted guests surface as not-found rather than an
    /// empty history.
    pub async fn guest_reservations(&self, guest_id: Uuid) -> BookingResult<Vec<Reservation>> {
        self.fetch_guest(guest_id).await?;
        Ok(self.store.reservations_for_guest(guest_id).await?)
    }

    /// Rooms free for the whole of `range`, with optional filters.
    pub async fn available_rooms(
        &self,
        range: StayRange,
        filter: RoomFilter,
    ) -> BookingResult<Vec<Room>> {
        availability::available_rooms(self.store.as_ref(), range, filter).await
    }

    /// Derived status for one room, recomputed from the live reservation set.
    pub async fn room_status(&self, room_id: Uuid) -> BookingResult<RoomStatus> {
        self.room_status_at(room_id, Utc::now().date_naive()).await
    }

    pub(crate) async fn room_status_at(
        &self,
        room_id: Uuid,
        today: NaiveDate,
    ) -> BookingResult<RoomStatus> {
        let room = self.fetch_room(room_id).await?;
        let active = self.store.active_reservations_for_room(room_id).await?;
        Ok(derive_room_status(room.status, &active, today))
    }

    async fn fetch_guest(&self, id: Uuid) -> BookingResult<Guest> {
        self.store
            .get_guest(id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("guest {id}")))
    }

    async fn fetch_room(&self, id: Uuid) -> BookingResult<Room> {
        self.store
            .get_room(id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("room {id}")))
    }

    async fn fetch_reservation(&self, id: Uuid) -> BookingResult<Reservation> {
        self.store
            .get_reservation(id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("reservation {id}")))
    }

    /// Insert, translating a commit-time exclusion-constraint race into a
    /// booking conflict rather than leaking a storage error.
    async fn insert_guarded(&self, reservation: &Reservation) -> BookingResult<()> {
        match self.store.insert_reservation(reservation).await {
            Err(DatabaseError::ExclusionViolation(_)) => Err(BookingError::Conflict {
                room_id: reservation.room_id,
                requested: reservation.stay,
                conflicting_reservation_id: None,
            }),
            other => Ok(other?),
        }
    }

    async fn update_guarded(&self, reservation: &Reservation) -> BookingResult<()> {
        match self.store.update_reservation(reservation).await {
            Err(DatabaseError::ExclusionViolation(_)) => Err(BookingError::Conflict {
                room_id: reservation.room_id,
                requested: reservation.stay,
                conflicting_reservation_id: None,
            }),
            other => Ok(other?),
        }
    }

    /// Re-derive and persist the room's cached status.
    async fn refresh_room_status(&self, room_id: Uuid, today: NaiveDate) -> BookingResult<()> {
        let room = self.fetch_room(room_id).await?;
        let active = self.store.active_reservations_for_room(room_id).await?;
        let derived = derive_room_status(room.status, &active, today);
        if derived != room.status {
            self.store.update_room_status(room_id, derived).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RoomType;
    use crate::store::MemoryStore;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn setup() -> (BookingCoordinator, Guest, Room) {
        let store = Arc::new(MemoryStore::new());
        let guest = Guest::new("Grace", "Hopper", "grace@example.com");
        let room = Room::new("204", RoomType::Double, 2, 2, dec!(150.00));
        store.insert_guest(&guest).await.unwrap();
        store.insert_room(&room).await.unwrap();
        (BookingCoordinator::new(store), guest, room)
    }

    #[tokio::test]
    async fn test_create_rejects_past_check_in() {
        let (coordinator, guest, room) = setup().await;
        let req = CreateReservation::new(guest.id, room.id, date(2024, 3, 10), date(2024, 3, 12));

        let err = coordinator
            .create_reservation_at(req, date(2024, 3, 11))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_guest() {
        let (coordinator, _guest, room) = setup().await;
        let req =
            CreateReservation::new(Uuid::new_v4(), room.id, date(2024, 3, 10), date(2024, 3, 12));

        let err = coordinator
            .create_reservation_at(req, date(2024, 3, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_terminal_initial_status() {
        let (coordinator, guest, room) = setup().await;
        let mut req =
            CreateReservation::new(guest.id, room.id, date(2024, 3, 10), date(2024, 3, 12));
        req.initial_status = ReservationStatus::CheckedIn;

        let err = coordinator
            .create_reservation_at(req, date(2024, 3, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }

    #[tokio::test]
    async fn test_overlapping_create_conflicts() {
        let (coordinator, guest, room) = setup().await;
        let today = date(2024, 3, 1);

        let first = coordinator
            .create_reservation_at(
                CreateReservation::new(guest.id, room.id, date(2024, 3, 15), date(2024, 3, 17)),
                today,
            )
            .await
            .unwrap();

        let err = coordinator
            .create_reservation_at(
                CreateReservation::new(guest.id, room.id, date(2024, 3, 16), date(2024, 3, 18)),
                today,
            )
            .await
            .unwrap_err();

        match err {
            BookingError::Conflict {
                room_id,
                conflicting_reservation_id,
                ..
            } => {
                assert_eq!(room_id, room.id);
                assert_eq!(conflicting_reservation_id, Some(first.id));
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_total_amount_is_nights_times_price() {
        let (coordinator, guest, room) = setup().await;
        let reservation = coordinator
            .create_reservation_at(
                CreateReservation::new(guest.id, room.id, date(2024, 3, 15), date(2024, 3, 18)),
                date(2024, 3, 1),
            )
            .await
            .unwrap();

        assert_eq!(reservation.total_amount, dec!(450.00));
    }

    #[tokio::test]
    async fn test_check_in_outside_window_rejected() {
        let (coordinator, guest, room) = setup().await;
        let today = date(2024, 3, 1);
        let reservation = coordinator
            .create_reservation_at(
                CreateReservation::new(guest.id, room.id, date(2024, 3, 15), date(2024, 3, 17))
                    .confirmed(),
                today,
            )
            .await
            .unwrap();

        // Arriving two weeks early is not a check-in.
        let err = coordinator
            .modify_reservation_at(
                reservation.id,
                ModifyReservation::status(ReservationStatus::CheckedIn),
                today,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));

        let checked_in = coordinator
            .modify_reservation_at(
                reservation.id,
                ModifyReservation::status(ReservationStatus::CheckedIn),
                date(2024, 3, 15),
            )
            .await
            .unwrap();
        assert_eq!(checked_in.status, ReservationStatus::CheckedIn);
    }

    #[tokio::test]
    async fn test_date_change_excludes_self_and_reprices() {
        let (coordinator, guest, room) = setup().await;
        let today = date(2024, 3, 1);
        let reservation = coordinator
            .create_reservation_at(
                CreateReservation::new(guest.id, room.id, date(2024, 3, 15), date(2024, 3, 17)),
                today,
            )
            .await
            .unwrap();

        let shifted = coordinator
            .modify_reservation_at(
                reservation.id,
                ModifyReservation::range(
                    StayRange::new(date(2024, 3, 16), date(2024, 3, 20)).unwrap(),
                ),
                today,
            )
            .await
            .unwrap();

        assert_eq!(shifted.stay.check_out(), date(2024, 3, 20));
        assert_eq!(shifted.total_amount, dec!(600.00));
    }

    #[tokio::test]
    async fn test_date_change_after_check_in_rejected() {
        let (coordinator, guest, room) = setup().await;
        let reservation = coordinator
            .create_reservation_at(
                CreateReservation::new(guest.id, room.id, date(2024, 3, 15), date(2024, 3, 17))
                    .confirmed(),
                date(2024, 3, 1),
            )
            .await
            .unwrap();
        coordinator
            .modify_reservation_at(
                reservation.id,
                ModifyReservation::status(ReservationStatus::CheckedIn),
                date(2024, 3, 15),
            )
            .await
            .unwrap();

        let err = coordinator
            .modify_reservation_at(
                reservation.id,
                ModifyReservation::range(
                    StayRange::new(date(2024, 3, 16), date(2024, 3, 19)).unwrap(),
                ),
                date(2024, 3, 15),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }

    #[tokio::test]
    async fn test_cancel_checked_out_reservation_rejected() {
        let (coordinator, guest, room) = setup().await;
        let reservation = coordinator
            .create_reservation_at(
                CreateReservation::new(guest.id, room.id, date(2024, 3, 15), date(2024, 3, 17))
                    .confirmed(),
                date(2024, 3, 1),
            )
            .await
            .unwrap();
        coordinator
            .modify_reservation_at(
                reservation.id,
                ModifyReservation::status(ReservationStatus::CheckedIn),
                date(2024, 3, 15),
            )
            .await
            .unwrap();
        coordinator
            .modify_reservation_at(
                reservation.id,
                ModifyReservation::status(ReservationStatus::CheckedOut),
                date(2024, 3, 17),
            )
            .await
            .unwrap();

        let err = coordinator
            .cancel_reservation_at(reservation.id, "changed plans".into(), date(2024, 3, 17))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BookingError::InvalidTransition {
                from: ReservationStatus::CheckedOut,
                to: ReservationStatus::Cancelled,
            }
        ));
    }

    #[tokio::test]
    async fn test_room_status_follows_lifecycle() {
        let (coordinator, guest, room) = setup().await;
        let today = date(2024, 3, 15);
        let reservation = coordinator
            .create_reservation_at(
                CreateReservation::new(guest.id, room.id, date(2024, 3, 15), date(2024, 3, 17))
                    .confirmed(),
                today,
            )
            .await
            .unwrap();

        // The stay covers today, so the room already reads occupied.
        assert_eq!(
            coordinator.room_status_at(room.id, today).await.unwrap(),
            RoomStatus::Occupied
        );

        coordinator
            .modify_reservation_at(
                reservation.id,
                ModifyReservation::status(ReservationStatus::CheckedIn),
                today,
            )
            .await
            .unwrap();
        coordinator
            .modify_reservation_at(
                reservation.id,
                ModifyReservation::status(ReservationStatus::CheckedOut),
                date(2024, 3, 16),
            )
            .await
            .unwrap();

        assert_eq!(
            coordinator
                .room_status_at(room.id, date(2024, 3, 16))
                .await
                .unwrap(),
            RoomStatus::Available
        );
        let stored = coordinator.store().get_room(room.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RoomStatus::Available);
    }

    #[tokio::test]
    async fn test_booking_maintenance_room_rejected() {
        let (coordinator, guest, room) = setup().await;
        coordinator
            .store()
            .update_room_status(room.id, RoomStatus::Maintenance)
            .await
            .unwrap();

        let err = coordinator
            .create_reservation_at(
                CreateReservation::new(guest.id, room.id, date(2024, 3, 15), date(2024, 3, 17)),
                date(2024, 3, 1),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }

    #[tokio::test]
    async fn test_occupied_today_does_not_block_future_range() {
        // The cached status says occupied, but the requested range is free;
        // conflicts decide, the cache does not.
        let (coordinator, guest, room) = setup().await;
        let today = date(2024, 3, 15);
        coordinator
            .create_reservation_at(
                CreateReservation::new(guest.id, room.id, date(2024, 3, 15), date(2024, 3, 17))
                    .confirmed(),
                today,
            )
            .await
            .unwrap();

        let future = coordinator
            .create_reservation_at(
                CreateReservation::new(guest.id, room.id, date(2024, 4, 1), date(2024, 4, 5)),
                today,
            )
            .await
            .unwrap();
        assert_eq!(future.status, ReservationStatus::Pending);
    }
}
