//! PostgreSQL slot store.

use crate::db_err;
use parkline_core::error::{ParkingError, Result};
use parkline_core::providers::{NewSlot, SlotStore};
use parkline_core::state::{ParkingSlot, SlotId, VehicleId};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

const SLOT_COLUMNS: &str = "id, number, floor, is_available, vehicle_id";

pub(crate) fn row_to_slot(row: &PgRow) -> ParkingSlot {
    ParkingSlot {
        id: SlotId(row.get("id")),
        number: row.get("number"),
        floor: row.get("floor"),
        is_available: row.get("is_available"),
        vehicle_id: row
            .get::<Option<uuid::Uuid>, _>("vehicle_id")
            .map(VehicleId),
    }
}

/// PostgreSQL-backed [`SlotStore`].
#[derive(Debug, Clone)]
pub struct PostgresSlotStore {
    pool: PgPool,
}

impl PostgresSlotStore {
    /// Create a slot store over the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl SlotStore for PostgresSlotStore {
    async fn insert(&self, slot: NewSlot) -> Result<ParkingSlot> {
        let id = SlotId::new();
        sqlx::query(
            r"
            INSERT INTO parking_slots (id, number, floor, is_available)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(id.0)
        .bind(&slot.number)
        .bind(slot.floor)
        .bind(slot.is_available)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return ParkingError::DuplicateNumber(vec![slot.number.clone()]);
                }
            }
            db_err("failed to insert slot", &e)
        })?;

        Ok(ParkingSlot {
            id,
            number: slot.number,
            floor: slot.floor,
            is_available: slot.is_available,
            vehicle_id: None,
        })
    }

    async fn insert_bulk(&self, slots: Vec<NewSlot>) -> Result<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_err("failed to start transaction", &e))?;

        // Report every collision at once, the numbers already present plus
        // duplicates inside the batch itself.
        let numbers: Vec<String> = slots.iter().map(|s| s.number.clone()).collect();
        let existing: Vec<String> = sqlx::query_scalar(
            r"
            SELECT number FROM parking_slots WHERE number = ANY($1)
            ",
        )
        .bind(&numbers)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| db_err("failed to check slot numbers", &e))?;

        let mut collisions = existing;
        let mut seen = std::collections::HashSet::new();
        for number in &numbers {
            if !seen.insert(number.clone()) {
                collisions.push(number.clone());
            }
        }
        if !collisions.is_empty() {
            return Err(ParkingError::DuplicateNumber(collisions));
        }

        let mut count = 0;
        for slot in &slots {
            sqlx::query(
                r"
                INSERT INTO parking_slots (id, number, floor, is_available)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(SlotId::new().0)
            .bind(&slot.number)
            .bind(slot.floor)
            .bind(slot.is_available)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_err("failed to insert slot batch", &e))?;
            count += 1;
        }

        tx.commit()
            .await
            .map_err(|e| db_err("failed to commit slot batch", &e))?;
        Ok(count)
    }

    async fn get(&self, id: SlotId) -> Result<ParkingSlot> {
        let row = sqlx::query(&format!(
            "SELECT {SLOT_COLUMNS} FROM parking_slots WHERE id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("failed to get slot", &e))?
        .ok_or(ParkingError::NotFound("parking slot"))?;

        Ok(row_to_slot(&row))
    }

    async fn list(&self) -> Result<Vec<ParkingSlot>> {
        let rows = sqlx::query(&format!(
            "SELECT {SLOT_COLUMNS} FROM parking_slots ORDER BY number"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("failed to list slots", &e))?;

        Ok(rows.iter().map(row_to_slot).collect())
    }

    async fn list_available(&self) -> Result<Vec<ParkingSlot>> {
        let rows = sqlx::query(&format!(
            "SELECT {SLOT_COLUMNS} FROM parking_slots WHERE is_available ORDER BY number"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("failed to list available slots", &e))?;

        Ok(rows.iter().map(row_to_slot).collect())
    }

    async fn claim(&self, id: SlotId, vehicle_id: VehicleId) -> Result<bool> {
        // Single conditional update: of two concurrent claims, exactly one
        // sees is_available = TRUE and flips it.
        let result = sqlx::query(
            r"
            UPDATE parking_slots
            SET is_available = FALSE, vehicle_id = $2
            WHERE id = $1 AND is_available = TRUE
            ",
        )
        .bind(id.0)
        .bind(vehicle_id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("failed to claim slot", &e))?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM parking_slots WHERE id = $1)")
                .bind(id.0)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| db_err("failed to check slot", &e))?;
        if exists {
            Ok(false)
        } else {
            Err(ParkingError::NotFound("parking slot"))
        }
    }

    async fn release(&self, id: SlotId) -> Result<()> {
        let result = sqlx::query(
            r"
            UPDATE parking_slots
            SET is_available = TRUE, vehicle_id = NULL
            WHERE id = $1
            ",
        )
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("failed to release slot", &e))?;

        if result.rows_affected() == 0 {
            return Err(ParkingError::NotFound("parking slot"));
        }
        Ok(())
    }
}
