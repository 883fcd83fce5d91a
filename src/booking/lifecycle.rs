//! Reservation lifecycle rules and derived room status.

use chrono::NaiveDate;

use crate::domain::{Reservation, ReservationStatus, RoomStatus};
use crate::error::{BookingError, BookingResult};

/// Check that `from → to` is a legal lifecycle move.
pub(crate) fn ensure_transition(
    from: ReservationStatus,
    to: ReservationStatus,
) -> BookingResult<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(BookingError::InvalidTransition { from, to })
    }
}

/// Check-in is only permitted while `today` falls inside the stay.
pub(crate) fn ensure_check_in_window(
    reservation: &Reservation,
    today: NaiveDate,
) -> BookingResult<()> {
    if reservation.stay.contains(today) {
        Ok(())
    } else {
        Err(BookingError::Validation(format!(
            "check-in on {today} is outside the stay {}",
            reservation.stay
        )))
    }
}

/// Compute the status a room should show, given its active reservations.
///
/// Maintenance and out-of-service are staff-authored and pass through
/// untouched; otherwise the room is occupied exactly when an active
/// reservation covers `today`. The stored status column is a cache of this
/// value, never an independent fact.
pub fn derive_room_status(
    current: RoomStatus,
    active: &[Reservation],
    today: NaiveDate,
) -> RoomStatus {
    if current.is_staff_override() {
        return current;
    }
    let covered = active
        .iter()
        .any(|r| r.status.is_active() && r.stay.contains(today));
    if covered {
        RoomStatus::Occupied
    } else {
        RoomStatus::Available
    }
}
