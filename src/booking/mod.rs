//! The booking core: conflict detection, lifecycle transitions, availability
//! queries, and the per-room serialized coordinator that ties them together.

mod availability;
mod conflict;
mod coordinator;
mod lifecycle;

pub use availability::{RoomFilter, available_rooms};
pub use conflict::find_conflict;
pub use coordinator::{BookingCoordinator, ModifyReservation};
pub use lifecycle::derive_room_status;
