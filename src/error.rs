//! Error types for the booking core.

use uuid::Uuid;

use crate::domain::{ReservationStatus, StayRange};

/// Errors surfaced by booking, lifecycle and availability operations.
///
/// All four domain variants are expected, recoverable-by-caller conditions;
/// none of them leaves partial state behind.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    /// Request was malformed and rejected before any state was touched.
    #[error("invalid request: {0}")]
    Validation(String),

    /// An active reservation already claims part of the requested range.
    #[error("room {room_id} is unavailable for {requested}")]
    Conflict {
        room_id: Uuid,
        requested: StayRange,
        /// Filled when the application-level scan found the overlap.
        /// `None` when the database exclusion constraint caught the race at
        /// commit time, where the winning row's id is not in hand.
        conflicting_reservation_id: Option<Uuid>,
    },

    /// The requested lifecycle move is not legal.
    #[error("cannot move reservation from {from} to {to}")]
    InvalidTransition {
        from: ReservationStatus,
        to: ReservationStatus,
    },

    /// Referenced guest, room or reservation is absent or soft-deleted.
    #[error("{0} not found")]
    NotFound(String),

    /// Storage failure unrelated to booking semantics.
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Result type for booking operations.
pub type BookingResult<T> = std::result::Result<T, BookingError>;

/// Errors from the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Connection pool failure.
    #[error("connection pool error: {0}")]
    Pool(String),

    /// Query or connection error from Postgres.
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// Schema migration failure.
    #[error("migration error: {0}")]
    Migration(#[from] Box<refinery::Error>),

    /// The reservation exclusion constraint rejected an overlapping write.
    ///
    /// Callers translate this into [`BookingError::Conflict`] rather than
    /// leaking it as a storage failure.
    #[error("overlapping reservation rejected by the database: {0}")]
    ExclusionViolation(String),
}

impl From<deadpool_postgres::PoolError> for DatabaseError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        DatabaseError::Pool(err.to_string())
    }
}

impl From<refinery::Error> for DatabaseError {
    fn from(err: refinery::Error) -> Self {
        DatabaseError::Migration(Box::new(err))
    }
}
