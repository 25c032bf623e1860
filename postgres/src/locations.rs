//! PostgreSQL parking location store.

use crate::db_err;
use parkline_core::error::{ParkingError, Result};
use parkline_core::providers::{LocationStore, LocationUpdate, NewLocation};
use parkline_core::state::{LocationId, ParkingLocation};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

const LOCATION_COLUMNS: &str =
    "id, code, name, address, total_spaces, available_spaces, fee_per_hour";

pub(crate) fn row_to_location(row: &PgRow) -> ParkingLocation {
    ParkingLocation {
        id: LocationId(row.get("id")),
        code: row.get("code"),
        name: row.get("name"),
        address: row.get("address"),
        total_spaces: row.get("total_spaces"),
        available_spaces: row.get("available_spaces"),
        fee_per_hour: row.get("fee_per_hour"),
    }
}

/// PostgreSQL-backed [`LocationStore`].
#[derive(Debug, Clone)]
pub struct PostgresLocationStore {
    pool: PgPool,
}

impl PostgresLocationStore {
    /// Create a location store over the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl LocationStore for PostgresLocationStore {
    async fn insert(&self, location: NewLocation) -> Result<ParkingLocation> {
        let id = LocationId::new();
        sqlx::query(
            r"
            INSERT INTO parking_locations
                (id, code, name, address, total_spaces, available_spaces, fee_per_hour)
            VALUES ($1, $2, $3, $4, $5, $5, $6)
            ",
        )
        .bind(id.0)
        .bind(&location.code)
        .bind(&location.name)
        .bind(&location.address)
        .bind(location.total_spaces)
        .bind(location.fee_per_hour)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return ParkingError::DuplicateCode(location.code.clone());
                }
            }
            db_err("failed to insert location", &e)
        })?;

        Ok(ParkingLocation {
            id,
            code: location.code,
            name: location.name,
            address: location.address,
            total_spaces: location.total_spaces,
            available_spaces: location.total_spaces,
            fee_per_hour: location.fee_per_hour,
        })
    }

    async fn get(&self, id: LocationId) -> Result<ParkingLocation> {
        let row = sqlx::query(&format!(
            "SELECT {LOCATION_COLUMNS} FROM parking_locations WHERE id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("failed to get location", &e))?
        .ok_or(ParkingError::NotFound("parking location"))?;

        Ok(row_to_location(&row))
    }

    async fn get_by_code(&self, code: &str) -> Result<ParkingLocation> {
        let row = sqlx::query(&format!(
            "SELECT {LOCATION_COLUMNS} FROM parking_locations WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("failed to get location by code", &e))?
        .ok_or(ParkingError::NotFound("parking location"))?;

        Ok(row_to_location(&row))
    }

    async fn list(&self) -> Result<Vec<ParkingLocation>> {
        let rows = sqlx::query(&format!(
            "SELECT {LOCATION_COLUMNS} FROM parking_locations ORDER BY code"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("failed to list locations", &e))?;

        Ok(rows.iter().map(row_to_location).collect())
    }

    async fn update(&self, id: LocationId, update: LocationUpdate) -> Result<ParkingLocation> {
        let row = sqlx::query(&format!(
            r"
            UPDATE parking_locations
            SET code = COALESCE($2, code),
                name = COALESCE($3, name),
                address = COALESCE($4, address),
                fee_per_hour = COALESCE($5, fee_per_hour)
            WHERE id = $1
            RETURNING {LOCATION_COLUMNS}
            "
        ))
        .bind(id.0)
        .bind(update.code.as_deref())
        .bind(update.name.as_deref())
        .bind(update.address.as_deref())
        .bind(update.fee_per_hour)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return ParkingError::DuplicateCode(update.code.clone().unwrap_or_default());
                }
            }
            db_err("failed to update location", &e)
        })?
        .ok_or(ParkingError::NotFound("parking location"))?;

        Ok(row_to_location(&row))
    }

    async fn delete(&self, id: LocationId) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_err("failed to start transaction", &e))?;

        let occupied: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS(
                SELECT 1 FROM parking_activities
                WHERE location_id = $1 AND exit_time IS NULL
            )
            ",
        )
        .bind(id.0)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| db_err("failed to check location activity", &e))?;

        if occupied {
            let _ = tx.rollback().await;
            return Err(ParkingError::InvalidState(
                "cannot delete a parking location with vehicles inside",
            ));
        }

        let result = sqlx::query("DELETE FROM parking_locations WHERE id = $1")
            .bind(id.0)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_err("failed to delete location", &e))?;

        if result.rows_affected() == 0 {
            let _ = tx.rollback().await;
            return Err(ParkingError::NotFound("parking location"));
        }

        tx.commit()
            .await
            .map_err(|e| db_err("failed to commit location delete", &e))?;
        Ok(())
    }

    async fn adjust_spaces(&self, id: LocationId, delta: i32) -> Result<ParkingLocation> {
        // Single conditional update; the WHERE clause is what makes two
        // concurrent decrements of the last space resolve to one winner.
        let row = sqlx::query(&format!(
            r"
            UPDATE parking_locations
            SET available_spaces = available_spaces + $2
            WHERE id = $1
              AND available_spaces + $2 >= 0
              AND available_spaces + $2 <= total_spaces
            RETURNING {LOCATION_COLUMNS}
            "
        ))
        .bind(id.0)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("failed to adjust spaces", &e))?;

        match row {
            Some(row) => Ok(row_to_location(&row)),
            None => {
                let exists: bool = sqlx::query_scalar(
                    "SELECT EXISTS(SELECT 1 FROM parking_locations WHERE id = $1)",
                )
                .bind(id.0)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| db_err("failed to check location", &e))?;
                Err(if !exists {
                    ParkingError::NotFound("parking location")
                } else if delta < 0 {
                    ParkingError::NoCapacity
                } else {
                    ParkingError::BoundsError
                })
            }
        }
    }
}
