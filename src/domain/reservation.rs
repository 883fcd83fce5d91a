//! Reservations and their lifecycle states.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::StayRange;

/// Lifecycle state of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSql, FromSql)]
#[postgres(name = "reservation_status")]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    #[postgres(name = "pending")]
    Pending,
    #[postgres(name = "confirmed")]
    Confirmed,
    #[postgres(name = "checked_in")]
    CheckedIn,
    #[postgres(name = "checked_out")]
    CheckedOut,
    #[postgres(name = "cancelled")]
    Cancelled,
}

impl ReservationStatus {
    /// Whether this state still claims the room and counts toward conflict
    /// and availability checks.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            ReservationStatus::Pending | ReservationStatus::Confirmed | ReservationStatus::CheckedIn
        )
    }

    /// Terminal states free the room and freeze the reservation.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ReservationStatus::CheckedOut | ReservationStatus::Cancelled
        )
    }

    /// Legal lifecycle moves: pending → confirmed → checked_in →
    /// checked_out, plus cancellation from any non-terminal state.
    pub fn can_transition_to(self, next: ReservationStatus) -> bool {
        use ReservationStatus::{Cancelled, CheckedIn, CheckedOut, Confirmed, Pending};
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Confirmed, CheckedIn)
                | (CheckedIn, CheckedOut)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
                | (CheckedIn, Cancelled)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::CheckedIn => "checked_in",
            ReservationStatus::CheckedOut => "checked_out",
            ReservationStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A booking of one room for one guest over a stay range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    /// Unique human-readable number, e.g. `RES-20240315-9F1C02AB`.
    pub reservation_number: String,
    pub guest_id: Uuid,
    pub room_id: Uuid,
    pub stay: StayRange,
    pub status: ReservationStatus,
    /// Nights × the room's nightly price at booking time.
    pub total_amount: Decimal,
    pub deposit_amount: Option<Decimal>,
    pub special_requests: Option<String>,
    pub cancellation_reason: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// Generate a reservation number for a booking made on `date`.
    pub fn generate_number(date: NaiveDate) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!(
            "RES-{}-{}",
            date.format("%Y%m%d"),
            suffix[..8].to_uppercase()
        )
    }
}

/// Input for creating a reservation.
#[derive(Debug, Clone)]
pub struct CreateReservation {
    pub guest_id: Uuid,
    pub room_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    /// `Pending` unless the caller books straight into `Confirmed`.
    pub initial_status: ReservationStatus,
    pub deposit_amount: Option<Decimal>,
    pub special_requests: Option<String>,
}

impl CreateReservation {
    pub fn new(guest_id: Uuid, room_id: Uuid, check_in: NaiveDate, check_out: NaiveDate) -> Self {
        Self {
            guest_id,
            room_id,
            check_in,
            check_out,
            initial_status: ReservationStatus::Pending,
            deposit_amount: None,
            special_requests: None,
        }
    }

    /// Book directly into `Confirmed` instead of `Pending`.
    pub fn confirmed(mut self) -> Self {
        self.initial_status = ReservationStatus::Confirmed;
        self
    }

    pub fn with_deposit(mut self, deposit: Decimal) -> Self {
        self.deposit_amount = Some(deposit);
        self
    }

    pub fn with_special_requests(mut self, requests: impl Into<String>) -> Self {
        self.special_requests = Some(requests.into());
        self
    }
}
