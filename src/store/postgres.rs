//! PostgreSQL store for hotel state.

use async_trait::async_trait;
use deadpool_postgres::{Config, Pool, Runtime};
use tokio_postgres::error::SqlState;
use tokio_postgres::{NoTls, Row};
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::domain::{Guest, Reservation, ReservationStatus, Room, RoomStatus, StayRange};
use crate::error::DatabaseError;
use crate::store::HotelStore;

mod embedded {
    refinery::embed_migrations!("migrations");
}

const GUEST_COLUMNS: &str = "id, first_name, last_name, email, phone, address, city, country, \
     notes, deleted, created_at, updated_at";

const ROOM_COLUMNS: &str = "id, number, room_type, floor, capacity, price_per_night, description, \
     status, deleted, created_at, updated_at";

const RESERVATION_COLUMNS: &str =
    "id, reservation_number, guest_id, room_id, check_in, check_out, status, total_amount, \
     deposit_amount, special_requests, cancellation_reason, cancelled_at, notes, created_at, \
     updated_at";

/// deadpool-backed [`HotelStore`] over PostgreSQL.
///
/// The schema's exclusion constraint over `(room_id, daterange)` backstops
/// the coordinator's in-process serialization: a race that slips past both
/// surfaces as [`DatabaseError::ExclusionViolation`].
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    /// Create a store and verify connectivity.
    pub async fn new(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let mut cfg = Config::new();
        cfg.url = Some(config.url().to_string());
        cfg.pool = Some(deadpool_postgres::PoolConfig {
            max_size: config.pool_size,
            ..Default::default()
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| DatabaseError::Pool(e.to_string()))?;

        // Test connection
        let _ = pool.get().await?;

        Ok(Self { pool })
    }

    /// Apply embedded schema migrations.
    pub async fn run_migrations(&self) -> Result<(), DatabaseError> {
        let mut conn = self.pool.get().await?;
        let report = embedded::migrations::runner().run_async(&mut **conn).await?;
        tracing::info!(
            applied = report.applied_migrations().len(),
            "database schema up to date"
        );
        Ok(())
    }

    async fn conn(&self) -> Result<deadpool_postgres::Object, DatabaseError> {
        Ok(self.pool.get().await?)
    }
}

/// Map write errors, picking out the overlap exclusion constraint.
fn map_write_err(err: tokio_postgres::Error) -> DatabaseError {
    if err.code() == Some(&SqlState::EXCLUSION_VIOLATION) {
        DatabaseError::ExclusionViolation(err.to_string())
    } else {
        DatabaseError::Postgres(err)
    }
}

fn guest_from_row(row: &Row) -> Guest {
    Guest {
        id: row.get("id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        phone: row.get("phone"),
        address: row.get("address"),
        city: row.get("city"),
        country: row.get("country"),
        notes: row.get("notes"),
        deleted: row.get("deleted"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn room_from_row(row: &Row) -> Room {
    Room {
        id: row.get("id"),
        number: row.get("number"),
        room_type: row.get("room_type"),
        floor: row.get("floor"),
        capacity: row.get("capacity"),
        price_per_night: row.get("price_per_night"),
        description: row.get("description"),
        status: row.get("status"),
        deleted: row.get("deleted"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn reservation_from_row(row: &Row) -> Reservation {
    Reservation {
        id: row.get("id"),
        reservation_number: row.get("reservation_number"),
        guest_id: row.get("guest_id"),
        room_id: row.get("room_id"),
        stay: StayRange::from_storage(row.get("check_in"), row.get("check_out")),
        status: row.get("status"),
        total_amount: row.get("total_amount"),
        deposit_amount: row.get("deposit_amount"),
        special_requests: row.get("special_requests"),
        cancellation_reason: row.get("cancellation_reason"),
        cancelled_at: row.get("cancelled_at"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl HotelStore for PgStore {
    async fn insert_guest(&self, guest: &Guest) -> Result<(), DatabaseError> {
        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO guests (id, first_name, last_name, email, phone, address, city, \
             country, notes, deleted, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            &[
                &guest.id,
                &guest.first_name,
                &guest.last_name,
                &guest.email,
                &guest.phone,
                &guest.address,
                &guest.city,
                &guest.country,
                &guest.notes,
                &guest.deleted,
                &guest.created_at,
                &guest.updated_at,
            ],
        )
        .await?;
        Ok(())
    }

    async fn get_guest(&self, id: Uuid) -> Result<Option<Guest>, DatabaseError> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt(
                format!("SELECT {GUEST_COLUMNS} FROM guests WHERE id = $1 AND NOT deleted").as_str(),
                &[&id],
            )
            .await?;
        Ok(row.as_ref().map(guest_from_row))
    }

    async fn get_guest_by_email(&self, email: &str) -> Result<Option<Guest>, DatabaseError> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt(
                format!("SELECT {GUEST_COLUMNS} FROM guests WHERE email = $1 AND NOT deleted").as_str(),
                &[&email],
            )
            .await?;
        Ok(row.as_ref().map(guest_from_row))
    }

    async fn update_guest(&self, guest: &Guest) -> Result<(), DatabaseError> {
        let conn = self.conn().await?;
        conn.execute(
            "UPDATE guests SET first_name = $2, last_name = $3, email = $4, phone = $5, \
             address = $6, city = $7, country = $8, notes = $9, deleted = $10, updated_at = $11 \
             WHERE id = $1",
            &[
                &guest.id,
                &guest.first_name,
                &guest.last_name,
                &guest.email,
                &guest.phone,
                &guest.address,
                &guest.city,
                &guest.country,
                &guest.notes,
                &guest.deleted,
                &guest.updated_at,
            ],
        )
        .await?;
        Ok(())
    }

    async fn list_guests(&self) -> Result<Vec<Guest>, DatabaseError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                format!(
                    "SELECT {GUEST_COLUMNS} FROM guests WHERE NOT deleted \
                     ORDER BY last_name, first_name"
                )
                .as_str(),
                &[],
            )
            .await?;
        Ok(rows.iter().map(guest_from_row).collect())
    }

    async fn insert_room(&self, room: &Room) -> Result<(), DatabaseError> {
        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO rooms (id, number, room_type, floor, capacity, price_per_night, \
             description, status, deleted, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            &[
                &room.id,
                &room.number,
                &room.room_type,
                &room.floor,
                &room.capacity,
                &room.price_per_night,
                &room.description,
                &room.status,
                &room.deleted,
                &room.created_at,
                &room.updated_at,
            ],
        )
        .await?;
        Ok(())
    }

    async fn get_room(&self, id: Uuid) -> Result<Option<Room>, DatabaseError> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt(
                format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1 AND NOT deleted").as_str(),
                &[&id],
            )
            .await?;
        Ok(row.as_ref().map(room_from_row))
    }

    async fn get_room_by_number(&self, number: &str) -> Result<Option<Room>, DatabaseError> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt(
                format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE number = $1 AND NOT deleted").as_str(),
                &[&number],
            )
            .await?;
        Ok(row.as_ref().map(room_from_row))
    }

    async fn update_room(&self, room: &Room) -> Result<(), DatabaseError> {
        let conn = self.conn().await?;
        conn.execute(
            "UPDATE rooms SET number = $2, room_type = $3, floor = $4, capacity = $5, \
             price_per_night = $6, description = $7, status = $8, deleted = $9, updated_at = $10 \
             WHERE id = $1",
            &[
                &room.id,
                &room.number,
                &room.room_type,
                &room.floor,
                &room.capacity,
                &room.price_per_night,
                &room.description,
                &room.status,
                &room.deleted,
                &room.updated_at,
            ],
        )
        .await?;
        Ok(())
    }

    async fn update_room_status(&self, id: Uuid, status: RoomStatus) -> Result<(), DatabaseError> {
        let conn = self.conn().await?;
        conn.execute(
            "UPDATE rooms SET status = $2, updated_at = NOW() WHERE id = $1",
            &[&id, &status],
        )
        .await?;
        Ok(())
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, DatabaseError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE NOT deleted ORDER BY number").as_str(),
                &[],
            )
            .await?;
        Ok(rows.iter().map(room_from_row).collect())
    }

    async fn insert_reservation(&self, reservation: &Reservation) -> Result<(), DatabaseError> {
        let conn = self.conn().await?;
        let check_in = reservation.stay.check_in();
        let check_out = reservation.stay.check_out();
        conn.execute(
            "INSERT INTO reservations (id, reservation_number, guest_id, room_id, check_in, \
             check_out, status, total_amount, deposit_amount, special_requests, \
             cancellation_reason, cancelled_at, notes, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
            &[
                &reservation.id,
                &reservation.reservation_number,
                &reservation.guest_id,
                &reservation.room_id,
                &check_in,
                &check_out,
                &reservation.status,
                &reservation.total_amount,
                &reservation.deposit_amount,
                &reservation.special_requests,
                &reservation.cancellation_reason,
                &reservation.cancelled_at,
                &reservation.notes,
                &reservation.created_at,
                &reservation.updated_at,
            ],
        )
        .await
        .map_err(map_write_err)?;
        Ok(())
    }

    async fn get_reservation(&self, id: Uuid) -> Result<Option<Reservation>, DatabaseError> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt(
                format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1").as_str(),
                &[&id],
            )
            .await?;
        Ok(row.as_ref().map(reservation_from_row))
    }

    async fn get_reservation_by_number(
        &self,
        number: &str,
    ) -> Result<Option<Reservation>, DatabaseError> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt(
                format!(
                    "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE reservation_number = $1",
                ).as_str(),
                &[&number],
            )
            .await?;
        Ok(row.as_ref().map(reservation_from_row))
    }

    async fn update_reservation(&self, reservation: &Reservation) -> Result<(), DatabaseError> {
        let conn = self.conn().await?;
        let check_in = reservation.stay.check_in();
        let check_out = reservation.stay.check_out();
        conn.execute(
            "UPDATE reservations SET check_in = $2, check_out = $3, status = $4, \
             total_amount = $5, deposit_amount = $6, special_requests = $7, \
             cancellation_reason = $8, cancelled_at = $9, notes = $10, updated_at = $11 \
             WHERE id = $1",
            &[
                &reservation.id,
                &check_in,
                &check_out,
                &reservation.status,
                &reservation.total_amount,
                &reservation.deposit_amount,
                &reservation.special_requests,
                &reservation.cancellation_reason,
                &reservation.cancelled_at,
                &reservation.notes,
                &reservation.updated_at,
            ],
        )
        .await
        .map_err(map_write_err)?;
        Ok(())
    }

    async fn active_reservations_for_room(
        &self,
        room_id: Uuid,
    ) -> Result<Vec<Reservation>, DatabaseError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                format!(
                    "SELECT {RESERVATION_COLUMNS} FROM reservations \
                     WHERE room_id = $1 AND status IN ('pending', 'confirmed', 'checked_in') \
                     ORDER BY check_in"
                )
                .as_str(),
                &[&room_id],
            )
            .await?;
        Ok(rows.iter().map(reservation_from_row).collect())
    }

    async fn reservations_for_guest(
        &self,
        guest_id: Uuid,
    ) -> Result<Vec<Reservation>, DatabaseError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                format!(
                    "SELECT {RESERVATION_COLUMNS} FROM reservations \
                     WHERE guest_id = $1 ORDER BY created_at"
                )
                .as_str(),
                &[&guest_id],
            )
            .await?;
        Ok(rows.iter().map(reservation_from_row).collect())
    }

    async fn list_reservations(
        &self,
        status: Option<ReservationStatus>,
    ) -> Result<Vec<Reservation>, DatabaseError> {
        let conn = self.conn().await?;
        let rows = match status {
            Some(status) => {
                conn.query(
                    format!(
                        "SELECT {RESERVATION_COLUMNS} FROM reservations \
                         WHERE status = $1 ORDER BY created_at"
                    )
                    .as_str(),
                    &[&status],
                )
                .await?
            }
            None => {
                conn.query(
                    format!(
                        "SELECT {RESERVATION_COLUMNS} FROM reservations ORDER BY created_at",
                    ).as_str(),
                    &[],
                )
                .await?
            }
        };
        Ok(rows.iter().map(reservation_from_row).collect())
    }
}
