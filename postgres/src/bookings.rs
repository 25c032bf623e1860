//! PostgreSQL booking store.
//!
//! The two lifecycle writes that touch both the booking and its slot run
//! as explicit transactions with conditional updates, so a lost race rolls
//! everything back and the loser sees a normal error outcome.

use crate::db_err;
use parkline_core::error::{ParkingError, Result};
use parkline_core::providers::{BookingStore, NewBooking};
use parkline_core::state::{
    Booking, BookingAdminView, BookingDetails, BookingId, BookingStatus, ParkingSlot, Role,
    SlotId, UserId, UserProfile, Vehicle, VehicleId, VehicleType,
};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

const BOOKING_COLUMNS: &str =
    "id, slot_id, vehicle_id, start_time, expected_end_time, actual_end_time, status";

const DETAILED_SELECT: &str = r"
    SELECT
        b.id AS b_id, b.slot_id AS b_slot_id, b.vehicle_id AS b_vehicle_id,
        b.start_time AS b_start_time, b.expected_end_time AS b_expected_end_time,
        b.actual_end_time AS b_actual_end_time, b.status AS b_status,
        s.id AS s_id, s.number AS s_number, s.floor AS s_floor,
        s.is_available AS s_is_available, s.vehicle_id AS s_vehicle_id,
        v.id AS v_id, v.plate_number AS v_plate_number,
        v.vehicle_type AS v_vehicle_type, v.owner_id AS v_owner_id
    FROM bookings b
    JOIN parking_slots s ON s.id = b.slot_id
    JOIN vehicles v ON v.id = b.vehicle_id
";

const ADMIN_SELECT: &str = r"
    SELECT
        b.id AS b_id, b.slot_id AS b_slot_id, b.vehicle_id AS b_vehicle_id,
        b.start_time AS b_start_time, b.expected_end_time AS b_expected_end_time,
        b.actual_end_time AS b_actual_end_time, b.status AS b_status,
        s.id AS s_id, s.number AS s_number, s.floor AS s_floor,
        s.is_available AS s_is_available, s.vehicle_id AS s_vehicle_id,
        v.id AS v_id, v.plate_number AS v_plate_number,
        v.vehicle_type AS v_vehicle_type, v.owner_id AS v_owner_id,
        u.id AS u_id, u.first_name AS u_first_name, u.last_name AS u_last_name,
        u.email AS u_email, u.role AS u_role
    FROM bookings b
    JOIN parking_slots s ON s.id = b.slot_id
    JOIN vehicles v ON v.id = b.vehicle_id
    JOIN users u ON u.id = v.owner_id
";

fn row_to_booking(row: &PgRow) -> Result<Booking> {
    let status: String = row.get("status");
    Ok(Booking {
        id: BookingId(row.get("id")),
        slot_id: SlotId(row.get("slot_id")),
        vehicle_id: VehicleId(row.get("vehicle_id")),
        start_time: row.get("start_time"),
        expected_end_time: row.get("expected_end_time"),
        actual_end_time: row.get("actual_end_time"),
        status: BookingStatus::parse(&status)?,
    })
}

fn row_to_details(row: &PgRow) -> Result<BookingDetails> {
    let status: String = row.get("b_status");
    let vehicle_type: String = row.get("v_vehicle_type");
    Ok(BookingDetails {
        booking: Booking {
            id: BookingId(row.get("b_id")),
            slot_id: SlotId(row.get("b_slot_id")),
            vehicle_id: VehicleId(row.get("b_vehicle_id")),
            start_time: row.get("b_start_time"),
            expected_end_time: row.get("b_expected_end_time"),
            actual_end_time: row.get("b_actual_end_time"),
            status: BookingStatus::parse(&status)?,
        },
        slot: ParkingSlot {
            id: SlotId(row.get("s_id")),
            number: row.get("s_number"),
            floor: row.get("s_floor"),
            is_available: row.get("s_is_available"),
            vehicle_id: row
                .get::<Option<uuid::Uuid>, _>("s_vehicle_id")
                .map(VehicleId),
        },
        vehicle: Vehicle {
            id: VehicleId(row.get("v_id")),
            plate_number: row.get("v_plate_number"),
            vehicle_type: VehicleType::parse(&vehicle_type)?,
            owner_id: UserId(row.get("v_owner_id")),
        },
    })
}

fn row_to_admin_view(row: &PgRow) -> Result<BookingAdminView> {
    let details = row_to_details(row)?;
    let role: String = row.get("u_role");
    Ok(BookingAdminView {
        booking: details.booking,
        slot: details.slot,
        vehicle: details.vehicle,
        owner: UserProfile {
            id: UserId(row.get("u_id")),
            first_name: row.get("u_first_name"),
            last_name: row.get("u_last_name"),
            email: row.get("u_email"),
            role: Role::parse(&role)?,
        },
    })
}

/// PostgreSQL-backed [`BookingStore`].
#[derive(Debug, Clone)]
pub struct PostgresBookingStore {
    pool: PgPool,
}

impl PostgresBookingStore {
    /// Create a booking store over the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl BookingStore for PostgresBookingStore {
    async fn insert_active_claiming_slot(&self, booking: NewBooking) -> Result<Booking> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_err("failed to start transaction", &e))?;

        // Conditional claim first: of two concurrent transactions, the
        // loser sees zero rows affected and rolls back without writing.
        let claimed = sqlx::query(
            r"
            UPDATE parking_slots
            SET is_available = FALSE, vehicle_id = $2
            WHERE id = $1 AND is_available = TRUE
            ",
        )
        .bind(booking.slot_id.0)
        .bind(booking.vehicle_id.0)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_err("failed to claim slot", &e))?;

        if claimed.rows_affected() == 0 {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM parking_slots WHERE id = $1)")
                    .bind(booking.slot_id.0)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(|e| db_err("failed to check slot", &e))?;
            let _ = tx.rollback().await;
            if exists {
                tracing::debug!(slot_id = %booking.slot_id, "slot claim lost to a concurrent booking");
                metrics::counter!("parking.bookings.claim_conflicts").increment(1);
            }
            return Err(if exists {
                ParkingError::Unavailable
            } else {
                ParkingError::NotFound("parking slot")
            });
        }

        let id = BookingId::new();
        sqlx::query(
            r"
            INSERT INTO bookings (id, slot_id, vehicle_id, start_time, status)
            VALUES ($1, $2, $3, $4, 'ACTIVE')
            ",
        )
        .bind(id.0)
        .bind(booking.slot_id.0)
        .bind(booking.vehicle_id.0)
        .bind(booking.start_time)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            // The partial unique index backs up the claim: a concurrent
            // ACTIVE booking on the slot surfaces here.
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return ParkingError::Unavailable;
                }
            }
            db_err("failed to insert booking", &e)
        })?;

        tx.commit()
            .await
            .map_err(|e| db_err("failed to commit booking", &e))?;

        Ok(Booking {
            id,
            slot_id: booking.slot_id,
            vehicle_id: booking.vehicle_id,
            start_time: booking.start_time,
            expected_end_time: None,
            actual_end_time: None,
            status: BookingStatus::Active,
        })
    }

    async fn finish_releasing_slot(
        &self,
        id: BookingId,
        status: BookingStatus,
        ended_at: DateTime<Utc>,
    ) -> Result<Booking> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_err("failed to start transaction", &e))?;

        let row = sqlx::query(&format!(
            r"
            UPDATE bookings
            SET status = $2, actual_end_time = $3
            WHERE id = $1 AND status = 'ACTIVE'
            RETURNING {BOOKING_COLUMNS}
            "
        ))
        .bind(id.0)
        .bind(status.as_str())
        .bind(ended_at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_err("failed to finish booking", &e))?;

        let Some(row) = row else {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM bookings WHERE id = $1)")
                    .bind(id.0)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(|e| db_err("failed to check booking", &e))?;
            let _ = tx.rollback().await;
            return Err(if exists {
                ParkingError::InvalidState("booking is not active")
            } else {
                ParkingError::NotFound("booking")
            });
        };
        let booking = row_to_booking(&row)?;

        sqlx::query(
            r"
            UPDATE parking_slots
            SET is_available = TRUE, vehicle_id = NULL
            WHERE id = $1
            ",
        )
        .bind(booking.slot_id.0)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_err("failed to release slot", &e))?;

        tx.commit()
            .await
            .map_err(|e| db_err("failed to commit booking finish", &e))?;
        Ok(booking)
    }

    async fn set_expected_end(
        &self,
        id: BookingId,
        expected_end: DateTime<Utc>,
    ) -> Result<Booking> {
        let row = sqlx::query(&format!(
            r"
            UPDATE bookings
            SET expected_end_time = $2
            WHERE id = $1 AND status = 'ACTIVE'
            RETURNING {BOOKING_COLUMNS}
            "
        ))
        .bind(id.0)
        .bind(expected_end)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("failed to set expected end", &e))?;

        match row {
            Some(row) => row_to_booking(&row),
            None => {
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM bookings WHERE id = $1)")
                        .bind(id.0)
                        .fetch_one(&self.pool)
                        .await
                        .map_err(|e| db_err("failed to check booking", &e))?;
                Err(if exists {
                    ParkingError::InvalidState("booking is not active")
                } else {
                    ParkingError::NotFound("booking")
                })
            }
        }
    }

    async fn get(&self, id: BookingId) -> Result<Booking> {
        let row = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("failed to get booking", &e))?
        .ok_or(ParkingError::NotFound("booking"))?;

        row_to_booking(&row)
    }

    async fn get_detailed(&self, id: BookingId) -> Result<BookingDetails> {
        let row = sqlx::query(&format!("{DETAILED_SELECT} WHERE b.id = $1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_err("failed to get booking", &e))?
            .ok_or(ParkingError::NotFound("booking"))?;

        row_to_details(&row)
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<BookingDetails>> {
        let rows = sqlx::query(&format!(
            "{DETAILED_SELECT} WHERE v.owner_id = $1 ORDER BY b.start_time DESC"
        ))
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("failed to list user bookings", &e))?;

        rows.iter().map(row_to_details).collect()
    }

    async fn list_all_admin(&self) -> Result<Vec<BookingAdminView>> {
        let rows = sqlx::query(&format!("{ADMIN_SELECT} ORDER BY b.start_time DESC"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_err("failed to list bookings", &e))?;

        rows.iter().map(row_to_admin_view).collect()
    }

    async fn list_expired_active(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Booking>> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {BOOKING_COLUMNS} FROM bookings
            WHERE status = 'ACTIVE'
              AND expected_end_time IS NOT NULL
              AND expected_end_time < $1
            ORDER BY expected_end_time ASC
            LIMIT $2
            "
        ))
        .bind(now)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("failed to list expired bookings", &e))?;

        rows.iter().map(row_to_booking).collect()
    }

    async fn mark_overstayed(&self, id: BookingId) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE bookings
            SET status = 'OVERSTAY'
            WHERE id = $1 AND status = 'ACTIVE'
            ",
        )
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("failed to mark booking overstayed", &e))?;

        Ok(result.rows_affected() == 1)
    }
}
