//! Conflict detection over a room's reservations.

use uuid::Uuid;

use crate::domain::{Reservation, StayRange};

/// Find the first active reservation whose stay overlaps `candidate`.
///
/// `exclude` skips the reservation being modified, so a date change never
/// collides with itself. Terminal reservations (checked out, cancelled) no
/// longer claim the room and never conflict. Returns the conflicting
/// reservation's id.
pub fn find_conflict(
    existing: &[Reservation],
    candidate: &StayRange,
    exclude: Option<Uuid>,
) -> Option<Uuid> {
    existing
        .iter()
        .filter(|r| r.status.is_active())
        .filter(|r| Some(r.id) != exclude)
        .find(|r| r.stay.overlaps(candidate))
        .map(|r| r.id)
}
