//! Hotel booking core.
//!
//! Conflict-safe reservations for a small hotel: half-open stay ranges,
//! a reservation lifecycle state machine, per-room serialized booking, and
//! availability queries that are always computed from the live reservation
//! set.
//!
//! The crate is transport-agnostic. Callers talk to three entry points:
//!
//! - [`BookingCoordinator`] — create/modify/cancel reservations, check
//!   guests in and out, query availability and derived room status;
//! - [`HotelRegistry`] — administrative CRUD for guests and rooms with
//!   uniform soft deletion;
//! - [`store::HotelStore`] — the storage boundary, implemented in memory
//!   ([`store::MemoryStore`]) and over PostgreSQL ([`store::PgStore`]).

pub mod booking;
pub mod config;
pub mod domain;
pub mod error;
pub mod registry;
pub mod store;

pub use booking::{BookingCoordinator, ModifyReservation, RoomFilter};
pub use error::{BookingError, BookingResult, DatabaseError};
pub use registry::HotelRegistry;
