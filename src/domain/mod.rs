//! Domain model: guests, rooms, reservations and stay ranges.

mod dates;
mod guest;
mod reservation;
mod room;

pub use dates::StayRange;
pub use guest::Guest;
pub use reservation::{CreateReservation, Reservation, ReservationStatus};
pub use room::{Room, RoomStatus, RoomType};
